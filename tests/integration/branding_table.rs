//! rules/branding.toml against a mock RustDesk tree.

use super::{acme, load_table, read, write};
use rebrand_patcher::{apply_all, check_all, resolve, FileStore, SourceRoot};
use tempfile::TempDir;

const FILES: &[&str] = &[
    "Cargo.toml",
    "libs/hbb_common/src/config.rs",
    "src/platform/windows.rs",
    "res/rustdesk.desktop",
    "flatpak/com.rustdesk.RustDesk.metainfo.xml",
];

fn setup_mock_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "Cargo.toml",
        r#"[package]
name = "rustdesk"
authors = ["rustdesk <info@rustdesk.com>"]
description = "RustDesk Remote Desktop"
default-run = "rustdesk"

[package.metadata.winres]
ProductName = "RustDesk"
FileDescription = "RustDesk Remote Desktop"
OriginalFilename = "rustdesk.exe"
LegalCopyright = "Copyright © 2025 Purslane Ltd. All rights reserved."

[package.metadata.bundle]
name = "RustDesk"
identifier = "com.carriez.rustdesk"
"#,
    );

    write(
        root,
        "libs/hbb_common/src/config.rs",
        r#"pub const APP_NAME: &str = "RustDesk";
pub const RENDEZVOUS_SERVERS: &[&str] = &["rs-ny.rustdesk.com"];
pub const RS_PUB_KEY: &str = "OeVuKk5nlHiXp+APNn0Y3pC1Iwpwn44JGqrQCsWqmBw=";
pub const ORG: &str = "com.carriez";

pub fn is_incoming_only() -> bool {
    HARD_SETTINGS
        .read()
        .unwrap()
        .get("conn-type")
        .map_or(false, |x| x == ("incoming"))
}
"#,
    );

    write(
        root,
        "res/rustdesk.desktop",
        "[Desktop Entry]\nName=RustDesk\nGenericName=Remote Desktop\nComment=Remote Desktop\n",
    );

    write(
        root,
        "flatpak/com.rustdesk.RustDesk.metainfo.xml",
        r#"<component type="desktop-application">
  <id>com.rustdesk.RustDesk</id>
  <name>RustDesk</name>
  <developer id="com.rustdesk">
    <name>RustDesk</name>
  </developer>
</component>
"#,
    );

    // src/platform/windows.rs is absent: its only rule is disabled by `debug`
    dir
}

#[test]
fn test_branding_table_applies_cleanly() {
    let dir = setup_mock_tree();
    let rules = load_table("branding.toml", FILES);
    assert_eq!(rules.groups.len(), 6);

    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();

    assert!(report.is_clean(), "mismatches: {report:?}");
    assert_eq!(report.skipped(), 1);

    assert_eq!(
        read(dir.path(), "Cargo.toml"),
        r#"[package]
name = "rustdesk"
authors = ["Acme BV <info@acme.example>"]
description = "Acme Remote Desktop App"
default-run = "rustdesk"

[package.metadata.winres]
ProductName = "Acme Remote"
FileDescription = "Acme Remote Desktop App"
OriginalFilename = "rustdesk.exe"
LegalCopyright = "Copyright © 2030 Purslane Ltd. & Acme BV. All rights reserved."

[package.metadata.bundle]
name = "Acme Remote"
identifier = "com.acme.remote"
"#
    );

    let config = read(dir.path(), "libs/hbb_common/src/config.rs");
    assert!(config.contains("pub fn is_incoming_only() -> bool {\n    true\n}\n"));
    assert!(config.contains(r#"APP_NAME: &str = "Acme Remote";"#));
    assert!(config.contains(r#"&["rs.acme.example"]"#));
    assert!(config.contains(r#""c2VjcmV0LWtleQ==""#));
    assert!(config.contains(r#"ORG: &str = "com.acme";"#));

    assert_eq!(
        read(dir.path(), "res/rustdesk.desktop"),
        "[Desktop Entry]\nName=Acme Remote\nGenericName=Acme Remote Desktop App\nComment=Acme Remote Desktop App\n"
    );

    assert_eq!(
        read(dir.path(), "flatpak/com.rustdesk.RustDesk.metainfo.xml"),
        r#"<component type="desktop-application">
  <id>com.acme.remote</id>
  <name>Acme Remote</name>
  <developer id="com.acme">
    <name>Acme BV</name>
  </developer>
</component>
"#
    );
}

#[test]
fn test_branding_table_reports_upstream_drift() {
    let dir = setup_mock_tree();
    // Upstream added a third "=Remote Desktop" line
    write(
        dir.path(),
        "res/rustdesk.desktop",
        "[Desktop Entry]\nName=RustDesk\nGenericName=Remote Desktop\nComment=Remote Desktop\nKeywords=Remote Desktop\n",
    );

    let rules = load_table("branding.toml", &["res/rustdesk.desktop"]);
    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();

    assert_eq!(report.total_mismatch(), 1);
    let mismatches: Vec<_> = report.groups[0].mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].0, 1);
    assert_eq!(mismatches[0].1.actual, 3);
    // Every occurrence is still replaced
    assert!(!read(dir.path(), "res/rustdesk.desktop").contains("=Remote Desktop"));
}

#[test]
fn test_check_matches_apply() {
    let dir = setup_mock_tree();
    let rules = load_table("branding.toml", FILES);
    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();

    let before = read(dir.path(), "Cargo.toml");
    let checked = check_all(&groups, &mut ()).unwrap();
    assert_eq!(read(dir.path(), "Cargo.toml"), before);

    let applied = apply_all(&mut FileStore, &groups, &mut ()).unwrap();
    assert_eq!(checked, applied);
}
