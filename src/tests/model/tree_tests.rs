    use super::*;

    fn sample() -> DirectoryNode {
        DirectoryNode {
            name: String::new(),
            path: String::new(),
            directories: vec![DirectoryNode {
                name: "src".to_string(),
                path: "src".to_string(),
                directories: vec![DirectoryNode {
                    name: "bin".to_string(),
                    path: "src/bin".to_string(),
                    directories: Vec::new(),
                    files: vec![FileNode {
                        name: "tool.txt".to_string(),
                        path: "src/bin/tool.txt".to_string(),
                        content: "t".to_string(),
                    }],
                }],
                files: vec![FileNode {
                    name: "main.txt".to_string(),
                    path: "src/main.txt".to_string(),
                    content: "code".to_string(),
                }],
            }],
            files: vec![FileNode {
                name: "README.md".to_string(),
                path: "README.md".to_string(),
                content: "hello".to_string(),
            }],
        }
    }

    #[test]
    fn child_path_joins_with_slash() {
        assert_eq!(child_path("", "a"), "a");
        assert_eq!(child_path("a", "b"), "a/b");
        assert_eq!(child_path("a/b", "c.txt"), "a/b/c.txt");
    }

    #[test]
    fn flatten_lists_every_file_sorted() {
        let flat = sample().flatten();
        assert_eq!(
            flat,
            vec![
                ("README.md".to_string(), "hello".to_string()),
                ("src/bin/tool.txt".to_string(), "t".to_string()),
                ("src/main.txt".to_string(), "code".to_string()),
            ]
        );
    }

    #[test]
    fn stats_count_descendants() {
        let stats = sample().stats();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.dirs, 2);
        assert_eq!(stats.bytes, 10);
    }

    #[test]
    fn find_by_relative_path() {
        let tree = sample();
        assert_eq!(tree.find_dir("").map(|d| d.path.as_str()), Some(""));
        assert_eq!(
            tree.find_dir("src/bin").map(|d| d.name.as_str()),
            Some("bin")
        );
        assert_eq!(
            tree.find_file("src/main.txt").map(|f| f.content.as_str()),
            Some("code")
        );
        assert_eq!(
            tree.find_file("README.md").map(|f| f.content.as_str()),
            Some("hello")
        );
        assert!(tree.find_file("src/missing.txt").is_none());
        assert!(tree.find_dir("nope").is_none());
    }

    #[test]
    fn empty_directory_reports_empty() {
        assert!(DirectoryNode::default().is_empty());
        assert!(!sample().is_empty());
    }
