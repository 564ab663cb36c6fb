//! Integration tests for rescache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Isolated config file and cache root per test
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
            }
        }

        fn root(&self) -> PathBuf {
            self.temp.path().join("Codable")
        }

        fn config_path(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        fn rescache(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("rescache");
            cmd.env("RESCACHE_CONFIG", self.config_path())
                .env("RESCACHE_ROOT", self.root())
                .env("CI", "1");
            cmd
        }
    }

    #[test]
    fn help_displays() {
        Sandbox::new()
            .rescache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("persistent JSON resource cache"));
    }

    #[test]
    fn version_displays() {
        Sandbox::new()
            .rescache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rescache"));
    }

    #[test]
    fn get_untouched_is_miss() {
        Sandbox::new()
            .rescache()
            .args(["get", "movie"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached value for movie"));
    }

    #[test]
    fn put_get_delete_cycle() {
        let sandbox = Sandbox::new();

        sandbox
            .rescache()
            .args(["put", "user_42", r#"{"title":"Inception"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("Saved user_42"));

        sandbox
            .rescache()
            .args(["get", "user_42"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""title": "Inception""#));

        sandbox
            .rescache()
            .args(["delete", "user_42"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted user_42"));

        sandbox
            .rescache()
            .args(["get", "user_42"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached value"));
    }

    #[test]
    fn put_rejects_invalid_json() {
        Sandbox::new()
            .rescache()
            .args(["put", "movie", "{not json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("JSON error"));
    }

    #[test]
    fn invalid_resource_name_fails() {
        Sandbox::new()
            .rescache()
            .args(["get", "a@b"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid resource id"));
    }

    #[test]
    fn user_scope_is_separate_from_global() {
        let sandbox = Sandbox::new();

        sandbox
            .rescache()
            .args(["put", "history", "[1,2,3]", "--user", "alice"])
            .assert()
            .success();

        sandbox
            .rescache()
            .args(["get", "history"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached value for history"));

        sandbox
            .rescache()
            .args(["get", "history", "--user", "alice"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1"));
    }

    #[test]
    fn path_is_percent_encoded_under_root() {
        let sandbox = Sandbox::new();
        let expected = sandbox.root().join("history%40user_42");

        sandbox
            .rescache()
            .args(["path", "history", "--user", "user_42"])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected.display().to_string()));
    }

    #[test]
    fn list_reports_entries() {
        let sandbox = Sandbox::new();

        sandbox
            .rescache()
            .args(["list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache is empty"));

        sandbox
            .rescache()
            .args(["put", "movies", "[]"])
            .assert()
            .success();

        sandbox
            .rescache()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""resource": "movies""#));

        sandbox
            .rescache()
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("movies"));
    }

    #[test]
    fn clear_requires_confirmation_without_tty() {
        let sandbox = Sandbox::new();
        sandbox
            .rescache()
            .args(["put", "movies", "[]"])
            .assert()
            .success();

        sandbox
            .rescache()
            .args(["clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache not cleared"));
        assert!(sandbox.root().join("movies").exists());

        sandbox
            .rescache()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleaned"));
        assert!(!sandbox.root().exists());
    }

    #[test]
    fn clear_on_empty_cache_succeeds() {
        Sandbox::new()
            .rescache()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already empty"));
    }

    #[test]
    fn config_path() {
        Sandbox::new()
            .rescache()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        Sandbox::new()
            .rescache()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_init_and_set() {
        let sandbox = Sandbox::new();

        sandbox
            .rescache()
            .args(["config", "init"])
            .assert()
            .success();
        assert!(sandbox.config_path().exists());

        sandbox
            .rescache()
            .args(["config", "set", "session.user_id", "user_42"])
            .assert()
            .success();

        // The configured scope now applies by default
        sandbox
            .rescache()
            .args(["path", "history"])
            .assert()
            .success()
            .stdout(predicate::str::contains("history%40user_42"));

        sandbox
            .rescache()
            .args(["config", "set", "cache.ttl", "60"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn settings_set_get_unset() {
        let sandbox = Sandbox::new();

        sandbox
            .rescache()
            .args(["settings", "get", "tos_accepted"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tos_accepted is not set"));

        sandbox
            .rescache()
            .args(["settings", "set", "tos_accepted", "true"])
            .assert()
            .success();

        sandbox
            .rescache()
            .args(["settings", "get", "tos_accepted"])
            .assert()
            .success()
            .stdout(predicate::str::contains("true"));

        sandbox
            .rescache()
            .args(["settings", "unset", "tos_accepted"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed tos_accepted"));

        assert!(sandbox.temp.path().join("settings.toml").exists());
    }
}
