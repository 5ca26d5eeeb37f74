//! Integration tests for pipedb

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command isolated from the user's config and workflow directory
    fn pipedb(scratch: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("pipedb");
        cmd.env("PIPEDB_CONFIG", scratch.join("config.toml"))
            .env("PIPEDB_WORKFLOW_DIR", scratch.join("work"))
            .env_remove("CI");
        cmd
    }

    #[test]
    fn help_displays() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Record the chunks of a split"));
    }

    #[test]
    fn version_displays() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pipedb"));
    }

    #[test]
    fn config_path_follows_env() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(scratch.path().join("config.toml").is_file());

        pipedb(scratch.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[workflow]"))
            .stdout(predicate::str::contains("temps_suffix"));
    }

    #[test]
    fn invalid_config_is_reported_with_hint() {
        let scratch = TempDir::new().unwrap();
        std::fs::write(scratch.path().join("config.toml"), "[workflow\n").unwrap();
        pipedb(scratch.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn split_then_list_nodes() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["split", "sample", "-k", "B", "-k", "A", "-k", "A"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Recorded 3 chunk key(s)"));

        pipedb(scratch.path())
            .args(["nodes", "sample", "--format", "plain"])
            .assert()
            .success()
            .stdout("/sample:A\n/sample:B\n");

        assert!(scratch.path().join("work/nodes/sample.chunks").is_file());
        assert!(!scratch.path().join("work/locks/_lock").exists());
    }

    #[test]
    fn nested_split_lists_chunk_tuples() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args([
                "--instance", "run1", "split", "sample", "region", "-k", "A,1", "-k", "A,2", "-k",
                "B,1",
            ])
            .assert()
            .success();

        pipedb(scratch.path())
            .args(["-i", "run1", "chunks", "sample", "region", "--format", "plain"])
            .assert()
            .success()
            .stdout("A,1\nA,2\nB,1\n");

        pipedb(scratch.path())
            .args(["-i", "run1", "nodes", "sample", "region", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"/sample:B/region:1\""))
            .stdout(predicate::str::contains("sample/B/region/1"));
    }

    #[test]
    fn unsplit_axis_lists_placeholder_node() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["nodes", "sample", "--format", "plain"])
            .assert()
            .success()
            .stdout("/sample:_\n");
    }

    #[test]
    fn split_without_chunks_is_rejected() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["split", "sample"])
            .assert()
            .failure();
    }

    #[test]
    fn arity_mismatch_leaves_no_chunk_file() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .args(["split", "sample", "region", "-k", "A"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Chunk #0"));
        assert!(!scratch.path().join("work/nodes/sample.chunks").exists());
        assert!(!scratch.path().join("work/locks/_lock").exists());
    }

    #[test]
    fn held_lock_blocks_split_until_unlocked() {
        let scratch = TempDir::new().unwrap();
        let lock = scratch.path().join("work/locks/_lock");
        std::fs::create_dir_all(&lock).unwrap();

        pipedb(scratch.path())
            .args(["lock", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("locked"))
            .stdout(predicate::str::contains("unknown"));

        pipedb(scratch.path())
            .args(["split", "sample", "-k", "A"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("locked by another run"))
            .stderr(predicate::str::contains("pipedb unlock"));

        pipedb(scratch.path())
            .arg("unlock")
            .assert()
            .success()
            .stdout(predicate::str::contains("Lock removed"));
        assert!(!lock.exists());

        pipedb(scratch.path())
            .args(["lock", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("unlocked"));

        pipedb(scratch.path())
            .args(["split", "sample", "-k", "A"])
            .assert()
            .success();
    }

    #[test]
    fn unlock_without_lock_is_harmless() {
        let scratch = TempDir::new().unwrap();
        pipedb(scratch.path())
            .arg("unlock")
            .assert()
            .success()
            .stdout(predicate::str::contains("No lock held"));
    }
}
