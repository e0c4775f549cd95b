//! Integration tests for filecache

mod engine_tests {
    use filecache::cache::{BackendOptions, FileBackend, SerializationFormat};
    use filecache::CacheError;
    use tempfile::TempDir;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn set_freeze_flush_scenario() {
        let temp = TempDir::new().unwrap();
        let mut backend = FileBackend::open(BackendOptions::new(temp.path())).unwrap();

        backend
            .set("a", b"payload1", &tags(&["t1"]), Some(3600))
            .unwrap();
        assert!(backend.has("a").unwrap());

        backend.freeze().unwrap();
        assert!(matches!(
            backend.set("b", b"payload2", &[], None),
            Err(CacheError::Frozen { .. })
        ));
        assert_eq!(backend.get("a").unwrap(), Some(b"payload1".to_vec()));

        backend.flush().unwrap();
        assert!(!backend.is_frozen());
        assert!(!backend.has("a").unwrap());
    }

    #[test]
    fn second_instance_sees_freeze_on_open() {
        let temp = TempDir::new().unwrap();
        let mut first = FileBackend::open(BackendOptions::new(temp.path())).unwrap();
        first.set("a", b"1", &[], None).unwrap();

        let second = FileBackend::open(BackendOptions::new(temp.path())).unwrap();
        first.freeze().unwrap();

        // Opened before the freeze: still mutable in this process
        assert!(!second.is_frozen());

        let third = FileBackend::open(BackendOptions::new(temp.path())).unwrap();
        assert!(third.is_frozen());
        assert!(matches!(
            third.remove("a"),
            Err(CacheError::Frozen { .. })
        ));
    }

    #[test]
    fn binary_format_with_suffix() {
        let temp = TempDir::new().unwrap();
        let mut options = BackendOptions::new(temp.path());
        options.entry_suffix = ".cache".to_string();
        options.format = SerializationFormat::Binary;
        let backend = FileBackend::open(options).unwrap();

        backend.set("x", b"one", &tags(&["red"]), None).unwrap();
        backend.set("y", b"two", &tags(&["blue"]), None).unwrap();

        assert!(temp.path().join("x.cache").is_file());
        assert_eq!(backend.find_identifiers_by_tag("red"), vec!["x".to_string()]);
        assert_eq!(backend.flush_by_tags(&tags(&["red", "blue"])).unwrap(), 2);
        assert!(backend.enumerate().unwrap().is_empty());
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated to a temp root and a config file that does not exist
    fn filecache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("filecache");
        cmd.env_remove("FILECACHE_ROOT")
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--root")
            .arg(temp.path().join("data"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("file-backed cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("filecache"));
    }

    #[test]
    fn set_then_get() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["set", "greeting", "hello", "--tag", "t1"])
            .assert()
            .success();

        filecache(&temp)
            .args(["get", "greeting"])
            .assert()
            .success()
            .stdout("hello");

        assert!(temp.path().join("data").join("default").join("greeting").is_file());
    }

    #[test]
    fn set_reads_stdin() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["set", "piped"])
            .write_stdin("from stdin")
            .assert()
            .success();

        filecache(&temp)
            .args(["get", "piped"])
            .assert()
            .success()
            .stdout("from stdin");
    }

    #[test]
    fn get_missing_fails() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["get", "nothing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No live cache entry"));
    }

    #[test]
    fn invalid_identifier_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["set", "../escape", "x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path segment"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn parent_cache_name_cannot_flush_outside_root() {
        let temp = TempDir::new().unwrap();
        let sibling = temp.path().join("keep.txt");
        std::fs::write(&sibling, "keep").unwrap();
        std::fs::create_dir_all(temp.path().join("data")).unwrap();

        filecache(&temp)
            .args(["--cache", "..", "flush"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid cache name"));

        assert!(sibling.is_file());
        assert!(temp.path().join("data").is_dir());
    }

    #[test]
    fn nested_cache_name_is_rejected() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["--cache", "a/b", "set", "k", "v"])
            .assert()
            .code(2);
        assert!(!temp.path().join("data").join("a").exists());
    }

    #[test]
    fn find_and_flush_by_tag() {
        let temp = TempDir::new().unwrap();
        filecache(&temp).args(["set", "a", "1", "-t", "x"]).assert().success();
        filecache(&temp).args(["set", "b", "2", "-t", "y"]).assert().success();

        filecache(&temp)
            .args(["find", "x"])
            .assert()
            .success()
            .stdout("a\n");

        filecache(&temp)
            .args(["flush-tag", "x", "y"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 2 entries"));

        filecache(&temp)
            .args(["has", "a"])
            .assert()
            .success()
            .stdout("false\n");
    }

    #[test]
    fn freeze_blocks_writes_until_flush() {
        let temp = TempDir::new().unwrap();
        filecache(&temp).args(["set", "a", "1"]).assert().success();
        filecache(&temp).arg("freeze").assert().success();

        filecache(&temp)
            .args(["set", "b", "2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is frozen"));

        filecache(&temp)
            .arg("freeze")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already frozen"));

        filecache(&temp)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"frozen\": true"));

        filecache(&temp).arg("flush").assert().success();
        filecache(&temp).args(["set", "b", "2"]).assert().success();
    }

    #[test]
    fn gc_reports_counts() {
        let temp = TempDir::new().unwrap();
        filecache(&temp).args(["set", "a", "1", "--lifetime", "0"]).assert().success();

        filecache(&temp)
            .arg("gc")
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 0 expired entries, kept 1"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["config", "set", "cache.default_lifetime", "0"])
            .assert()
            .success();

        let saved = std::fs::read_to_string(temp.path().join("config.toml")).unwrap();
        assert!(saved.contains("default_lifetime = 0"));
        assert!(!saved.contains("root"));
    }
}
