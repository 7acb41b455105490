//! Cache keys, storage and cross-phase state
//!
//! Keys are derived from the toolchain sources, so a restored toolchain is
//! only reused when `tools/` and `toolchain/` are unchanged.
//!
//! # Key Layout
//!
//! | Segment | Present when | Example |
//! |---------|--------------|---------|
//! | mixkey | input set | `arm64` |
//! | namespace | always | `cache-openwrt` |
//! | toolchain hash | `toolchain=true` | `abc1234` |
//! | timestamp | `ccache=true` | `1750000000` |

pub mod archive;
pub mod key;
pub mod state;
pub mod store;

pub use key::{base_key, build as build_key_plan, Clock, FixedClock, KeyPlan, SystemClock, NAMESPACE};
pub use state::{CacheState, HandoffState, StateFile};
pub use store::{paths_version, BlobStore, LocalStore, StoreEntry, StoreIndex};
