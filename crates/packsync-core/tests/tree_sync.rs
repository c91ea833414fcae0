use std::fs;

use tempfile::TempDir;

use packsync_core::fs::{mirror, purge};

#[test]
fn mirror_onto_empty_destination_copies_tree() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    fs::create_dir_all(src.join("a")).unwrap();
    fs::write(src.join("a/b.txt"), "bee").unwrap();
    fs::write(src.join("c.txt"), "sea").unwrap();

    mirror(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("a/b.txt")).unwrap(), "bee");
    assert_eq!(fs::read_to_string(dst.join("c.txt")).unwrap(), "sea");
}

#[cfg(unix)]
#[test]
fn mirror_follows_file_links_and_skips_the_rest() {
    use std::os::unix::fs::symlink;

    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    let outside = temp.path().join("outside");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("shared.toml"), "shared").unwrap();
    symlink(outside.join("shared.toml"), src.join("linked.toml")).unwrap();
    symlink(&outside, src.join("linked-dir")).unwrap();
    symlink(temp.path().join("missing"), src.join("dangling")).unwrap();
    fs::write(src.join("sub/z.txt"), "zed").unwrap();

    let stats = mirror(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("linked.toml")).unwrap(), "shared");
    assert!(!fs::symlink_metadata(dst.join("linked.toml")).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(dst.join("sub/z.txt")).unwrap(), "zed");
    assert!(!dst.join("linked-dir").exists());
    assert!(!dst.join("dangling").exists());
    assert_eq!(stats.files_copied, 2);
    assert_eq!(stats.entries_skipped, 2);
}

#[test]
fn mirror_never_deletes_destination_files() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    fs::create_dir_all(src.join("a")).unwrap();
    fs::write(src.join("a/b.txt"), "bee").unwrap();
    fs::write(src.join("c.txt"), "sea").unwrap();
    mirror(&src, &dst).unwrap();

    fs::remove_file(src.join("c.txt")).unwrap();
    fs::write(src.join("a/b.txt"), "bee v2").unwrap();
    mirror(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("a/b.txt")).unwrap(), "bee v2");
    assert_eq!(fs::read_to_string(dst.join("c.txt")).unwrap(), "sea");
}

#[test]
fn purge_then_mirror_replaces_contents() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source/config");
    let dst = temp.path().join("server/config");
    fs::create_dir_all(src.join("jei")).unwrap();
    fs::write(src.join("jei/jei-client.toml"), "new").unwrap();
    fs::create_dir_all(dst.join("legacy")).unwrap();
    fs::write(dst.join("legacy/unrelated.cfg"), "old").unwrap();
    fs::write(dst.join("stale.toml"), "old").unwrap();

    assert!(purge(&dst).unwrap());
    mirror(&src, &dst).unwrap();

    assert_eq!(
        fs::read_to_string(dst.join("jei/jei-client.toml")).unwrap(),
        "new"
    );
    assert!(!dst.join("legacy").exists());
    assert!(!dst.join("stale.toml").exists());
}

#[test]
fn purge_of_missing_directory_is_success() {
    let temp = TempDir::new().unwrap();
    assert!(!purge(&temp.path().join("never-created")).unwrap());
}
