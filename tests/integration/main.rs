//! Integration tests for shellcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Origin nothing listens on; connections are refused immediately
    const DEAD_ORIGIN: &str = "http://127.0.0.1:9";

    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn state_dir(&self) -> PathBuf {
            self.dir.path().join("state")
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn configure(&self, version: u64, seeds: &[&str]) {
            let seeds: Vec<String> = seeds.iter().map(|s| format!("\"{}\"", s)).collect();
            let toml = format!(
                "[agent]\napp_id = \"a1\"\norigin = \"{}\"\nversion = {}\nseeds = [{}]\n",
                DEAD_ORIGIN,
                version,
                seeds.join(", ")
            );
            std::fs::write(self.config_path(), toml).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("shellcache");
            cmd.env("SHELLCACHE_STATE_DIR", self.state_dir())
                .env_remove("SHELLCACHE_CONFIG")
                .arg("-c")
                .arg(self.config_path());
            cmd
        }

        fn stores(&self) -> String {
            let output = self
                .cmd()
                .args(["list", "--all", "--format", "plain"])
                .output()
                .unwrap();
            assert!(output.status.success());
            String::from_utf8(output.stdout).unwrap()
        }
    }

    fn store_dir(state: &Path, name: &str) -> PathBuf {
        state.join("caches").join(name)
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline cache agent"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path_honours_flag() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[agent]"))
            .stdout(predicate::str::contains("https://pufferfishes.net"));
    }

    #[test]
    fn config_init_writes_file() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success();
        assert!(sandbox.config_path().exists());
    }

    #[test]
    fn list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores"));
    }

    #[test]
    fn list_json_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn install_requires_app_id() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("agent.app_id"));
    }

    #[test]
    fn status_without_config_succeeds() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("agent.app_id"));
    }

    #[test]
    fn install_activates_and_deletes_stale_generation() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated pufferfishes-app-a1-v1"));

        std::fs::create_dir_all(store_dir(&sandbox.state_dir(), "pufferfishes-app-b7-v1")).unwrap();

        sandbox.configure(2, &[]);
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted stale generation pufferfishes-app-a1-v1"));

        let stores = sandbox.stores();
        assert!(stores.contains("pufferfishes-app-a1-v2"));
        assert!(stores.contains("pufferfishes-app-b7-v1"));
        assert!(!stores.contains("pufferfishes-app-a1-v1"));

        let audit = std::fs::read_to_string(sandbox.state_dir().join("audit.log")).unwrap();
        assert!(audit.contains(r#""event":"activated""#));
        assert!(audit.contains(r#""event":"generation_deleted""#));
    }

    #[test]
    fn failed_install_leaves_no_store() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &["/apps/a1/index.html"]);
        sandbox
            .cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Seed fetch failed"));

        assert!(!store_dir(&sandbox.state_dir(), "pufferfishes-app-a1-v1").exists());
        assert_eq!(sandbox.stores(), "");
    }

    #[test]
    fn no_activate_leaves_generation_waiting() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox
            .cmd()
            .args(["install", "--no-activate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("waiting"));

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("installed"));

        sandbox
            .cmd()
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated pufferfishes-app-a1-v1"));

        sandbox
            .cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No generation is waiting"));
    }

    #[test]
    fn skip_waiting_message_activates() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox
            .cmd()
            .args(["install", "--no-activate"])
            .assert()
            .success();

        sandbox
            .cmd()
            .args(["message", r#"{"type":"SKIP_WAITING"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated pufferfishes-app-a1-v1"));
    }

    #[test]
    fn unknown_message_is_ignored() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox
            .cmd()
            .args(["message", r#"{"type":"PING"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("Message ignored"));
    }

    #[test]
    fn offline_fetch_without_fallback_fails() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox.cmd().arg("install").assert().success();

        sandbox
            .cmd()
            .args(["fetch", &format!("{}/apps/a1/main.js", DEAD_ORIGIN)])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request"));
    }

    #[test]
    fn fetch_rejects_bad_url() {
        let sandbox = Sandbox::new();
        sandbox.configure(1, &[]);
        sandbox
            .cmd()
            .args(["fetch", "not a url"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid URL"));
    }
}
