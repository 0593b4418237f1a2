// tests/fs_ops.rs

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use foundation::errors::FoundationError;
use foundation::fs::ops::{
    copy_directory, copy_file, copy_file_or_directory, create_directory_safely, directory_size,
    ensure_directory_exists, file_size, find_files_by_pattern, find_path_up_to_boundary,
    is_file_empty, remove_directory, rename_subdirectory, replace_text_in_files,
    update_file_content,
};

fn io_kind(err: &FoundationError) -> Option<ErrorKind> {
    match err {
        FoundationError::IoError(e) => Some(e.kind()),
        _ => None,
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn copy_file_respects_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("nested/deeper/b.txt");
    write(&src, "first");

    copy_file(&src, &dst, false).unwrap();
    assert_eq!(fs::read_to_string(&dst).unwrap(), "first");

    write(&src, "second");
    let err = copy_file(&src, &dst, false).unwrap_err();
    assert_eq!(io_kind(&err), Some(ErrorKind::AlreadyExists));

    copy_file(&src, &dst, true).unwrap();
    assert_eq!(fs::read_to_string(&dst).unwrap(), "second");
}

#[test]
fn copy_missing_source_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = copy_file_or_directory(dir.path().join("ghost"), dir.path().join("x"), false, &[])
        .unwrap_err();
    assert_eq!(io_kind(&err), Some(ErrorKind::NotFound));
}

#[test]
fn copy_directory_skips_ignored_names() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("keep.rs"), "fn main() {}");
    write(&src.join("skip.pyc"), "junk");
    write(&src.join("__pycache__/cached.txt"), "junk");
    write(&src.join("sub/also.rs"), "");

    let dst = dir.path().join("dst");
    copy_directory(&src, &dst, &["*.pyc".to_string(), "__pycache__".to_string()]).unwrap();

    assert!(dst.join("keep.rs").is_file());
    assert!(dst.join("sub/also.rs").is_file());
    assert!(!dst.join("skip.pyc").exists());
    assert!(!dst.join("__pycache__").exists());
}

#[test]
fn sizes_add_up() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a"), "12345");
    write(&dir.path().join("sub/b"), "123");

    assert_eq!(file_size(dir.path().join("a")).unwrap(), 5);
    assert_eq!(directory_size(dir.path()).unwrap(), 8);
}

#[test]
fn create_directory_safely_handles_existing() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out");
    create_directory_safely(&target, false).unwrap();
    write(&target.join("stale.txt"), "old");

    let err = create_directory_safely(&target, false).unwrap_err();
    assert_eq!(io_kind(&err), Some(ErrorKind::AlreadyExists));

    create_directory_safely(&target, true).unwrap();
    assert!(!target.join("stale.txt").exists());
}

#[test]
fn rename_subdirectory_moves_contents() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("old/file.txt"), "data");
    ensure_directory_exists(dir.path().join("taken")).unwrap();

    let err = rename_subdirectory(dir.path(), "old", "taken", false).unwrap_err();
    assert_eq!(io_kind(&err), Some(ErrorKind::AlreadyExists));

    rename_subdirectory(dir.path(), "old", "new", false).unwrap();
    assert!(!dir.path().join("old").exists());
    assert_eq!(fs::read_to_string(dir.path().join("new/file.txt")).unwrap(), "data");
}

#[test]
fn replace_text_skips_binary_and_tool_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.py"), "import old_name");
    write(&dir.path().join("b.txt"), "old_name here");
    write(&dir.path().join(".git/config"), "old_name");
    fs::write(dir.path().join("bin.py"), b"old_name\0\x01").unwrap();

    let changed =
        replace_text_in_files(&[dir.path()], "old_name", "new_name", Some(&["py"][..])).unwrap();

    assert_eq!(changed, 1);
    assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "import new_name");
    assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "old_name here");
    assert_eq!(fs::read_to_string(dir.path().join(".git/config")).unwrap(), "old_name");
}

#[test]
fn find_files_by_pattern_supports_recursion_and_case() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("Top.TXT"), "");
    write(&dir.path().join("nested/inner.txt"), "");

    let shallow = find_files_by_pattern(dir.path(), "*.txt", false, false).unwrap();
    assert_eq!(shallow, vec![dir.path().join("Top.TXT")]);

    let deep = find_files_by_pattern(dir.path(), "*.txt", true, true).unwrap();
    assert_eq!(deep, vec![dir.path().join("nested/inner.txt")]);
}

#[test]
fn remove_directory_can_ignore_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    assert!(remove_directory(&missing, true).is_ok());
    assert!(remove_directory(&missing, false).is_err());
}

#[test]
fn nested_tool_directories_are_skipped_but_a_root_named_like_one_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("target");
    write(&root.join("top.py"), "old_name");
    write(&root.join("pkg/__pycache__/cached.py"), "old_name");
    write(&root.join("pkg/mod.py"), "old_name");

    let changed = replace_text_in_files(&[&root], "old_name", "new_name", None).unwrap();

    assert_eq!(changed, 2);
    assert_eq!(fs::read_to_string(root.join("pkg/__pycache__/cached.py")).unwrap(), "old_name");
}

#[test]
fn directory_size_of_missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = directory_size(dir.path().join("ghost")).unwrap_err();
    assert_eq!(io_kind(&err), Some(ErrorKind::NotFound));
}

#[test]
fn find_path_up_to_boundary_walks_parents() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    write(&project.join("Foundation.toml"), "");
    write(&project.join("src/deep/file.rs"), "");

    let found = find_path_up_to_boundary(project.join("src/deep/file.rs"), "Foundation.toml", Some(dir.path()))
        .unwrap()
        .unwrap();
    assert_eq!(found, project.join("Foundation.toml").canonicalize().unwrap());

    let bounded = find_path_up_to_boundary(project.join("src/deep"), "Foundation.toml", Some(&project.join("src")))
        .unwrap();
    assert_eq!(bounded, None);
}

#[test]
fn is_file_empty_rejects_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("empty"), "");
    write(&dir.path().join("full"), "x");

    assert!(is_file_empty(dir.path().join("empty")).unwrap());
    assert!(!is_file_empty(dir.path().join("full")).unwrap());
    assert_eq!(io_kind(&is_file_empty(dir.path()).unwrap_err()), Some(ErrorKind::InvalidInput));
}

#[test]
fn update_file_content_honours_condition_and_equality() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    write(&path, "version = 1");

    assert!(!update_file_content(&path, "version = 1", None).unwrap());

    let only_v2: &dyn Fn(&str) -> bool = &|current| current.contains("version = 2");
    assert!(!update_file_content(&path, "version = 3", Some(only_v2)).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "version = 1");

    assert!(update_file_content(&path, "v", None).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "v");
}
