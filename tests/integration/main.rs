//! Integration tests for openwrt-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const INPUT_VARS: &[&str] = &[
        "INPUT_MIXKEY",
        "INPUT_PREFIX",
        "INPUT_CLEAN",
        "INPUT_TOOLCHAIN",
        "INPUT_SKIP",
        "INPUT_CCACHE",
        "INPUT_SKIP_SAVING",
        "RUST_LOG",
    ];

    fn openwrt_cache() -> Command {
        cargo_bin_cmd!("openwrt-cache")
    }

    /// Command isolated from the host: its own config, store, state and
    /// output file under `dir`, run from `dir/work`.
    fn isolated(dir: &Path) -> Command {
        let work = dir.join("work");
        fs::create_dir_all(&work).unwrap();

        let mut cmd = openwrt_cache();
        for var in INPUT_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(work)
            .env("OPENWRT_CACHE_CONFIG", dir.join("config.toml"))
            .env("OPENWRT_CACHE_STORE", dir.join("store"))
            .env("OPENWRT_CACHE_STATE", dir.join("state.json"))
            .env("GITHUB_OUTPUT", dir.join("github_output"));
        cmd
    }

    fn github_output(dir: &Path) -> String {
        fs::read_to_string(dir.join("github_output")).unwrap_or_default()
    }

    fn build_tree(work: &Path) {
        fs::create_dir_all(work.join("staging_dir/host/bin")).unwrap();
        fs::write(work.join("staging_dir/host/bin/mkhash"), "elf").unwrap();
        fs::create_dir_all(work.join(".ccache/0")).unwrap();
        fs::write(work.join(".ccache/0/stats"), "42").unwrap();
    }

    #[test]
    fn help_displays() {
        openwrt_cache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("OpenWrt"))
            .stdout(predicate::str::contains("restore"))
            .stdout(predicate::str::contains("save"));
    }

    #[test]
    fn version_displays() {
        openwrt_cache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("openwrt-cache"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[toolchain]"))
            .stdout(predicate::str::contains(".toolchain.hash"));
    }

    #[test]
    fn invalid_config_fails_restore_but_not_save() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[general\n").unwrap();

        isolated(dir.path())
            .args(["restore", "--toolchain", "false"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));

        isolated(dir.path())
            .args(["save", "--toolchain", "false", "--skip-saving", "true"])
            .assert()
            .success();
    }

    #[test]
    fn key_prints_plan() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["key", "--mixkey", "arm64", "--toolchain", "false"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"primary\": \"arm64-cache-openwrt\""));
    }

    #[test]
    fn key_save_phase_uses_hash_file() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join(".toolchain.hash"), "abc123\n").unwrap();

        isolated(dir.path())
            .args(["key", "--phase", "save", "--mixkey", "arm64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("arm64-cache-openwrt-abc123"));
    }

    #[test]
    fn restore_clean_skips() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["restore", "--clean", "true"])
            .assert()
            .success();

        assert!(!github_output(dir.path()).contains("hit="));
    }

    #[test]
    fn restore_clean_drops_leftover_hit() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("state.json"),
            r#"{"state":"hit","matched_key":"cache-openwrt","primary_key":"cache-openwrt","recorded_at":"2025-06-15T12:00:00Z"}"#,
        )
        .unwrap();
        build_tree(&dir.path().join("work"));

        isolated(dir.path())
            .args(["restore", "--clean", "true"])
            .assert()
            .success();
        assert!(!dir.path().join("state.json").exists());

        isolated(dir.path())
            .args(["save", "--toolchain", "false", "--ccache", "true"])
            .assert()
            .success();
        assert!(dir.path().join("store").join("index.json").exists());
    }

    #[test]
    fn restore_missing_prefix_fails() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["restore", "--prefix", "openwrt", "--toolchain", "false"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Build directory not accessible"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn restore_outside_git_fails() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .arg("restore")
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("toolchain hash")
                    .or(predicate::str::contains("Command failed")),
            );
    }

    #[test]
    fn restore_empty_store_is_miss() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["restore", "--toolchain", "false"])
            .assert()
            .success();

        assert!(github_output(dir.path()).contains("hit=0"));
        assert!(!dir.path().join("state.json").exists());
    }

    #[test]
    fn save_after_hit_saves_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("state.json"),
            r#"{"state":"hit","matched_key":"cache-openwrt","primary_key":"cache-openwrt","recorded_at":"2025-06-15T12:00:00Z"}"#,
        )
        .unwrap();
        build_tree(&dir.path().join("work"));

        isolated(dir.path())
            .args(["save", "--toolchain", "false"])
            .assert()
            .success();

        assert!(!dir.path().join("store").join("index.json").exists());
        assert!(!dir.path().join("state.json").exists());
    }

    #[test]
    fn save_with_nothing_to_save_still_succeeds() {
        let dir = TempDir::new().unwrap();
        isolated(dir.path())
            .args(["save", "--toolchain", "false", "--ccache", "true"])
            .assert()
            .success();
    }

    #[test]
    fn save_then_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        build_tree(&work);

        isolated(dir.path())
            .args(["save", "--toolchain", "false", "--ccache", "true"])
            .assert()
            .success();
        assert!(dir.path().join("store").join("index.json").exists());

        fs::remove_dir_all(work.join("staging_dir")).unwrap();
        fs::remove_dir_all(work.join(".ccache")).unwrap();

        isolated(dir.path())
            .args(["restore", "--toolchain", "false", "--ccache", "true"])
            .assert()
            .success();

        // Without toolchain caching only the compiler cache is archived
        assert!(!work.join("staging_dir").exists());
        assert_eq!(fs::read_to_string(work.join(".ccache/0/stats")).unwrap(), "42");
        let output = github_output(dir.path());
        assert!(output.contains("hit=1"));
        assert!(output.contains("key=cache-openwrt-"));
        assert!(dir.path().join("state.json").exists());

        // The hit is consumed by the next save
        isolated(dir.path())
            .args(["save", "--toolchain", "false", "--ccache", "true"])
            .assert()
            .success();
        assert!(!dir.path().join("state.json").exists());
    }
}
