    use super::*;

    use std::io::Read;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes));
        archive
            .entries()
            .expect("read entries")
            .map(|e| {
                let e = e.expect("entry");
                e.path().expect("entry path").display().to_string()
            })
            .collect()
    }

    #[test]
    fn wraps_everything_in_one_directory() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        fs::create_dir_all(tmp.path().join("src")).expect("create src");
        fs::write(tmp.path().join("README.md"), b"hello").expect("write readme");
        fs::write(tmp.path().join("src/main.txt"), b"code").expect("write main");

        let bytes = pack_dir_to_vec(tmp.path(), "proj-abc123").expect("pack");
        let names = entry_names(&bytes);
        assert_eq!(names.first().map(|n| n.trim_end_matches('/')), Some("proj-abc123"));
        assert!(names.iter().all(|n| n.starts_with("proj-abc123")));
        assert!(names.iter().any(|n| n == "proj-abc123/src/main.txt"));
    }

    #[test]
    fn output_is_gzip_and_deterministic() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        fs::write(tmp.path().join("a.txt"), b"a").expect("write file");

        let one = pack_dir_to_vec(tmp.path(), "w").expect("pack");
        let two = pack_dir_to_vec(tmp.path(), "w").expect("pack again");
        assert_eq!(&one[..2], &[0x1f, 0x8b]);
        assert_eq!(one, two);
    }

    #[test]
    fn pack_to_file_writes_readable_archive() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).expect("create src");
        fs::write(src.join("a.txt"), b"abc").expect("write file");
        let dest = tmp.path().join("out.tar.gz");

        pack_dir_to_file(&src, "w", &dest).expect("pack");

        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(
            fs::File::open(&dest).expect("open archive"),
        ));
        let mut found = String::new();
        for e in archive.entries().expect("entries") {
            let mut e = e.expect("entry");
            if e.path().expect("path").ends_with("a.txt") {
                e.read_to_string(&mut found).expect("read entry");
            }
        }
        assert_eq!(found, "abc");
    }
