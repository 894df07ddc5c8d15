use std::collections::BTreeSet;
use std::fs::{create_dir_all, write};

use tempfile::tempdir;
use webotron_core::walk::{TreeWalker, WalkEntry};

fn collect_ok(root: &std::path::Path) -> Vec<WalkEntry> {
    TreeWalker::walk(root)
        .expect("root should be walkable")
        .map(|entry| entry.expect("no walk errors expected"))
        .collect()
}

#[test]
fn empty_directory_produces_no_entries() {
    let tmp = tempdir().unwrap();
    assert!(collect_ok(tmp.path()).is_empty());
}

#[test]
fn nested_tree_produces_one_entry_per_file() {
    let tmp = tempdir().unwrap();
    let files = [
        "root.txt",
        "a/one.html",
        "a/b/two.css",
        "a/b/c/three.js",
        "d/four.png",
        "d/e/five.jpg",
    ];
    // Empty directories contribute nothing.
    create_dir_all(tmp.path().join("empty/also-empty")).unwrap();
    for rel in files {
        let path = tmp.path().join(rel);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(&path, rel).unwrap();
    }

    let entries = collect_ok(tmp.path());

    assert_eq!(entries.len(), files.len());
    let keys: BTreeSet<_> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, files.iter().copied().collect());

    let root = std::fs::canonicalize(tmp.path()).unwrap();
    for entry in &entries {
        assert!(!entry.key.contains('\\'), "keys use forward slashes: {}", entry.key);
        let rebuilt = entry.key.split('/').fold(root.clone(), |p, seg| p.join(seg));
        assert_eq!(rebuilt, entry.path, "key should rebuild the file path");
        assert!(rebuilt.is_file());
    }
}

#[test]
fn walking_again_yields_the_same_entries() {
    let tmp = tempdir().unwrap();
    create_dir_all(tmp.path().join("x/y")).unwrap();
    write(tmp.path().join("x/y/z.txt"), "z").unwrap();
    write(tmp.path().join("w.txt"), "w").unwrap();

    let first: BTreeSet<_> = collect_ok(tmp.path()).into_iter().map(|e| e.key).collect();
    let second: BTreeSet<_> = collect_ok(tmp.path()).into_iter().map(|e| e.key).collect();
    assert_eq!(first, second);
}

#[test]
fn root_that_is_a_file_is_rejected() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("plain.txt");
    write(&file, "x").unwrap();

    assert!(TreeWalker::walk(&file).is_err());
}

#[test]
fn missing_root_is_rejected() {
    let tmp = tempdir().unwrap();
    let err = TreeWalker::walk(tmp.path().join("missing")).unwrap_err();
    assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_followed() {
    use std::os::unix::fs::symlink;

    let site = tempdir().unwrap();
    let shared = tempdir().unwrap();
    write(shared.path().join("shared.css"), "x").unwrap();
    symlink(shared.path(), site.path().join("assets")).unwrap();

    let keys: Vec<_> = collect_ok(site.path()).into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["assets/shared.css"]);
}

#[cfg(unix)]
#[test]
fn symlink_cycle_terminates() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    create_dir_all(tmp.path().join("a/b")).unwrap();
    write(tmp.path().join("a/b/file.txt"), "x").unwrap();
    symlink(tmp.path(), tmp.path().join("a/b/back-to-root")).unwrap();
    symlink("..", tmp.path().join("a/up")).unwrap();

    let keys: Vec<_> = collect_ok(tmp.path()).into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["a/b/file.txt"]);
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_is_yielded_as_error_and_walk_continues() {
    use std::fs::{set_permissions, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    create_dir_all(tmp.path().join("locked")).unwrap();
    write(tmp.path().join("locked/secret.txt"), "x").unwrap();
    write(tmp.path().join("open.txt"), "x").unwrap();
    set_permissions(tmp.path().join("locked"), Permissions::from_mode(0o000)).unwrap();
    if std::fs::read_dir(tmp.path().join("locked")).is_ok() {
        // Permissions are not enforced for this user (e.g. root).
        set_permissions(tmp.path().join("locked"), Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let items: Vec<_> = TreeWalker::walk(tmp.path()).unwrap().collect();
    set_permissions(tmp.path().join("locked"), Permissions::from_mode(0o755)).unwrap();

    let oks: Vec<_> = items.iter().filter_map(|i| i.as_ref().ok()).map(|e| e.key.as_str()).collect();
    let errs: Vec<_> = items.iter().filter_map(|i| i.as_ref().err()).collect();
    assert_eq!(oks, vec!["open.txt"]);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].path.ends_with("locked"));
}

#[cfg(unix)]
#[test]
fn dangling_symlink_is_yielded_as_error_and_walk_continues() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    write(tmp.path().join("real.txt"), "x").unwrap();
    symlink(tmp.path().join("gone.txt"), tmp.path().join("broken.txt")).unwrap();

    let items: Vec<_> = TreeWalker::walk(tmp.path()).unwrap().collect();

    let oks: Vec<_> = items.iter().filter_map(|i| i.as_ref().ok()).map(|e| e.key.as_str()).collect();
    let errs: Vec<_> = items.iter().filter_map(|i| i.as_ref().err()).collect();
    assert_eq!(oks, vec!["real.txt"]);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].path.ends_with("broken.txt"));
    assert_eq!(errs[0].source.kind(), std::io::ErrorKind::NotFound);
}
