//! Checks on the workspace this crate is built in.

use std::path::Path;

#[test]
fn test_crate_is_a_member_of_the_crates_workspace() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace = manifest_dir.parent().unwrap().join("Cargo.toml");
    let content = std::fs::read_to_string(&workspace).unwrap();

    assert!(content.contains("[workspace]"));
    assert!(content.contains("\"core\""));
}
