//! Tests for archive directory resolution

use super::*;
use std::path::{Path, PathBuf};

fn extensions() -> Vec<String> {
    vec!["so".into(), "dylib".into(), "dll".into()]
}

mod archive_dir_tests {
    use super::*;

    #[test]
    fn test_defaults_to_connector_name() {
        let dir = archive_dir(Path::new("/opt/dlink/lib/connector"), "MySQL", None);
        assert_eq!(dir, PathBuf::from("/opt/dlink/lib/connector/MySQL"));
    }

    #[test]
    fn test_relative_search_path_is_a_version_dir() {
        let dir = archive_dir(Path::new("/opt/dlink/lib/connector"), "MySQL", Some("mysql-8.0"));
        assert_eq!(dir, PathBuf::from("/opt/dlink/lib/connector/mysql-8.0"));
    }

    #[test]
    fn test_existing_absolute_search_path_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let absolute = tmp.path().to_str().unwrap().to_string();
        let dir = archive_dir(Path::new("/opt/dlink/lib/connector"), "MySQL", Some(&absolute));
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn test_blank_search_path_is_ignored() {
        let dir = archive_dir(Path::new("/root"), "Hive", Some("  "));
        assert_eq!(dir, PathBuf::from("/root/Hive"));
    }
}

mod list_archives_tests {
    use super::*;

    #[test]
    fn test_missing_directory_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("Oracle");
        let err = list_archives(&missing, &extensions()).unwrap_err();
        assert!(matches!(err, LinkError::Configuration(_)));
        assert!(err.to_string().contains("Oracle"));
    }

    #[test]
    fn test_directory_without_archives() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("README.txt"), "docs").unwrap();
        let err = list_archives(tmp.path(), &extensions()).unwrap_err();
        assert!(matches!(err, LinkError::Configuration(_)));
        assert!(err.to_string().contains("no archives"));
    }

    #[test]
    fn test_lists_only_archives_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["libz.so", "liba.DLL", "notes.md", "libm.dylib"] {
            std::fs::write(tmp.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested.so")).unwrap();

        let archives = list_archives(tmp.path(), &extensions()).unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["liba.DLL", "libm.dylib", "libz.so"]);
    }
}
