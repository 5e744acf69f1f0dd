    use super::*;

    #[test]
    fn rejects_empty_and_blank_revisions() {
        assert!(matches!(
            RevisionHandle::new(""),
            Err(Error::InvalidRevision(_))
        ));
        assert!(matches!(
            RevisionHandle::new("   "),
            Err(Error::InvalidRevision(_))
        ));
        assert!(RevisionHandle::new("main\n").is_err());
    }

    #[test]
    fn staging_key_is_a_single_safe_component() {
        for raw in ["../../etc/passwd", "feature/login", "/abs", ".hidden", "a\\b", "v1.2.3"] {
            let rev = RevisionHandle::new(raw).expect("valid revision");
            let key = rev.staging_key();
            assert!(!key.contains('/'), "{key}");
            assert!(!key.contains('\\'), "{key}");
            assert!(!key.starts_with('.'), "{key}");
            assert_ne!(key, "..");
        }
    }

    #[test]
    fn staging_key_is_deterministic() {
        let a = RevisionHandle::new("abc123").expect("valid revision");
        let b = RevisionHandle::new("abc123").expect("valid revision");
        assert_eq!(a.staging_key(), b.staging_key());
        assert!(a.staging_key().starts_with("abc123-"));
    }

    #[test]
    fn similar_revisions_get_distinct_keys() {
        let pairs = [
            ("feature/x", "feature_x"),
            ("feature/x", "feature:x"),
            ("Main", "main"),
            ("a", "a "),
            (".x", "_x"),
        ];
        for (a, b) in pairs {
            let a = RevisionHandle::new(a).expect("valid revision");
            let b = RevisionHandle::new(b).expect("valid revision");
            assert_ne!(a.staging_key(), b.staging_key(), "{a} vs {b}");
        }
    }

    #[test]
    fn long_revisions_are_truncated_in_the_prefix() {
        let rev = RevisionHandle::new("x".repeat(500)).expect("valid revision");
        assert!(rev.staging_key().len() <= KEY_PREFIX_MAX + 1 + KEY_HASH_LEN);
    }

    #[test]
    fn serde_roundtrip_validates() {
        let rev: RevisionHandle = serde_json::from_str("\"v2\"").expect("parse revision");
        assert_eq!(rev.as_str(), "v2");
        assert!(serde_json::from_str::<RevisionHandle>("\"\"").is_err());
    }
