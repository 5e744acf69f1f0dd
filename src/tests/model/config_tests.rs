    use super::*;

    #[test]
    fn parses_numeric_project_id_and_fills_defaults() {
        let cfg: SourceConfig = serde_json::from_value(serde_json::json!({
            "api_host": "https://gitlab.example.com",
            "project_id": 42
        }))
        .expect("parse config");
        assert_eq!(cfg.project_id, "42");
        assert_eq!(cfg.timeout_secs, 300);
        assert_eq!(cfg.retries, 3);
        assert_eq!(cfg.max_depth, 256);
        assert!(!cfg.parallel);
        assert!(cfg.token.is_none());
        cfg.validate().expect("valid config");
    }

    #[test]
    fn token_is_never_serialized() {
        let cfg = SourceConfig::new("https://gitlab.example.com", "7")
            .with_token(Some("secret".to_string()));
        let text = serde_json::to_string(&cfg).expect("serialize config");
        assert!(!text.contains("secret"));
        assert!(!text.contains("token"));
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let cfg = SourceConfig::new("https://gitlab.example.com", "7").with_token(Some(String::new()));
        assert!(cfg.token.is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(matches!(
            SourceConfig::new("not a url", "1").validate(),
            Err(Error::Config(_))
        ));
        assert!(SourceConfig::new("ftp://example.com", "1").validate().is_err());
        assert!(SourceConfig::new("https://example.com", " ").validate().is_err());

        let mut cfg = SourceConfig::new("https://example.com", "1");
        cfg.retries = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = SourceConfig::new("https://example.com", "1");
        cfg.timeout_secs = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(msg)) if msg.contains("timeout_secs")));

        cfg.timeout_secs = 1;
        cfg.validate().expect("one second is a valid deadline");
    }

    #[test]
    fn load_reads_json_file() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            br#"{"api_host": "http://127.0.0.1:9", "project_id": "group%2Frepo", "token": "t", "parallel": true}"#,
        )
        .expect("write config");

        let cfg = SourceConfig::load(&path).expect("load config");
        assert_eq!(cfg.project_id, "group%2Frepo");
        assert_eq!(cfg.token.as_deref(), Some("t"));
        assert!(cfg.parallel);
        assert_eq!(cfg.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let err = SourceConfig::load(Path::new("/definitely/missing/config.json"))
            .expect_err("missing config");
        assert!(err.is_not_found());
    }
