//! rules/ui_edits.toml against a mock RustDesk tree.

use super::{acme, load_table, read, write};
use rebrand_patcher::{apply_all, resolve, FileStore, SourceRoot};
use tempfile::TempDir;

const LANG_RS: &str = r#"mod ar;
mod de;
mod nl;
mod vn;

pub const LANGS: &[(&str, &str)] = &[
    ("en", "English"),
    ("de", "Deutsch"),
    ("nl", "Nederlands"),
];

pub fn translate_locale(name: String, locale: &str) -> String {
    let lang = locale.to_lowercase();
    let m = match lang.as_str() {
        "de" => de::T.deref(),
        "nl" => nl::T.deref(),
        _ => en::T.deref(),
    };
    let s = m.get(&name).unwrap_or(&name).to_string();
    if s.contains("RustDesk") {
        return s.replace("RustDesk", &crate::get_app_name());
    }
    s
}
"#;

const EN_RS: &str = r#"lazy_static::lazy_static! {
pub static ref T: std::collections::HashMap<&'static str, &'static str> =
    [
        ("ID/Relay Server", "ID/Relay server"),
        ("empty_recent_tip", "Oops, no recent sessions!\nTime to plan a new one."),
        ("empty_favorite_tip", "No favorite peers yet?\nLet's find someone to connect with."),
        ("empty_lan_tip", "Oh no, it seems that we haven't discovered any peers yet."),
        ("upgrade_rustdesk_server_pro_to_{}_tip", "Please upgrade RustDesk Server Pro to version {} or newer!"),
        ("id_input_tip", "You can input an ID, a direct IP, or a domain with a port (<domain>:<port>)."),
        ("web_id_input_tip", "You can input an ID in the same server."),
    ].iter().cloned().collect();
}
"#;

#[test]
fn test_language_trimming() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/lang.rs", LANG_RS);
    write(dir.path(), "src/lang/en.rs", EN_RS);

    let rules = load_table("ui_edits.toml", &["src/lang.rs", "src/lang/en.rs"]);
    assert_eq!(rules.groups.len(), 3);

    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();
    assert!(report.is_clean(), "mismatches: {report:?}");

    let lang = read(dir.path(), "src/lang.rs");
    assert!(lang.starts_with("mod en;\nmod nl;\n\n"));
    assert!(lang.contains(
        "pub const LANGS: &[(&str, &str)] = &[\n    (\"en\", \"English\"),\n    (\"nl\", \"Nederlands\"),\n];"
    ));
    assert!(lang.contains("\"nl\" => nl::T.deref(),\n        _ => en::T.deref(),\n    };\n"));
    assert!(!lang.contains("de::T"));
    assert!(lang.contains("    if true {\n"));

    let en = read(dir.path(), "src/lang/en.rs");
    assert!(en.contains(r#"("ID/Relay Server", "Alternative ID/Relay server"),"#));
    assert!(en.contains(r#"("empty_recent_tip", "No recent sessions."),"#));
    assert!(en.contains(r#"("empty_favorite_tip", "No favourite peers yet."),"#));
    assert!(en.contains(r#"("empty_lan_tip", "No peers detected on this LAN."),"#));
    assert!(en.contains(
        r#"("upgrade_rustdesk_server_pro_to_{}_tip", "This feature is not yet supported."),"#
    ));
    assert!(en.contains(
        r#"("id_input_tip", "You can input an ID, a direct IP, or a domain with a port (<domain>:<port>).\n\nIf you want to access a device on another server"#
    ));
    assert!(en.contains(
        r#"("web_id_input_tip", "You can input an ID in the same server, direct IP access is not supported in web client.\n\n"#
    ));
    // The web tip is not swallowed by the plain id tip pattern
    assert_eq!(
        en.matches("?key=5Qbwsde3unUcJBtrx9ZkvUmwFNoExHzpryHuPUdqlWM=\"),")
            .count(),
        2
    );
}

#[test]
fn test_removal_rules() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "flutter/lib/desktop/pages/connection_page.dart",
        "        children: [\n          if (!isIncomingOnly) setupServerWidget(),\n        ],\n",
    );

    let rules = load_table(
        "ui_edits.toml",
        &["flutter/lib/desktop/pages/connection_page.dart"],
    );
    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();

    assert!(report.is_clean());
    assert_eq!(
        read(dir.path(), "flutter/lib/desktop/pages/connection_page.dart"),
        "        children: [\n          \n        ],\n"
    );
}


const NL_RS: &str = r#"lazy_static::lazy_static! {
pub static ref T: std::collections::HashMap<&'static str, &'static str> =
    [
        ("Desktop", "Bureaublad"),
        ("Remote Desktop", "Extern Bureaublad"),
        ("Desktop icon", "Bureaubladpictogram"),
        ("Create desktop shortcut", "Snelkoppeling op bureaublad maken"),
        ("Share screen", "Deel uw bureaublad"),
        ("Locked", "Het bureaublad is vergrendeld"),
        ("View", "Bekijk het bureaublad"),
        ("Shared", "bureaublad gedeeld"),
        ("Not found", "Geen bureaublad gevonden"),
        ("Waiting", "Wacht op het bureaublad"),
        ("Close", "Sluit het bureaublad"),
        ("ID/Relay Server", "ID-/Relayserver"),
        ("empty_recent_tip", "Oeps, geen recente sessies!\nTijd om een nieuwe te plannen."),
        ("empty_favorite_tip", "Nog geen favorieten?\nLaten we iemand zoeken."),
        ("empty_lan_tip", "Oh nee, we hebben nog geen peers ontdekt."),
        ("upgrade_rustdesk_server_pro_to_{}_tip", "Upgrade RustDesk Server Pro naar versie {} of nieuwer!"),
        ("id_input_tip", "U kunt een ID invoeren."),
        ("web_id_input_tip", "U kunt een ID invoeren in de webclient."),
    ].iter().cloned().collect();
}
"#;

#[test]
fn test_dutch_translation() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/lang/nl.rs", NL_RS);

    let rules = load_table("ui_edits.toml", &["src/lang/nl.rs"]);
    assert_eq!(rules.rule_count(), 11);

    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();
    assert!(report.is_clean(), "mismatches: {report:?}");

    let nl = read(dir.path(), "src/lang/nl.rs");
    assert!(nl.contains(r#"("Desktop", "Apparaat"),"#));
    assert!(nl.contains(r#"("Remote Desktop", "Extern Apparaat"),"#));
    assert!(nl.contains(r#"("Share screen", "Deel uw apparaat"),"#));
    // Restored after the blanket rename
    assert!(nl.contains(r#"("Desktop icon", "Bureaubladpictogram"),"#));
    assert!(nl.contains(r#"("Create desktop shortcut", "Snelkoppeling op bureaublad maken"),"#));
    assert!(nl.contains(r#"("ID/Relay Server", "Alternatieve ID-/Relayserver"),"#));
    assert!(nl.contains(r#"("empty_recent_tip", "Geen recente sessies."),"#));
    assert!(nl.contains(r#"("empty_favorite_tip", "Nog geen favoriete apparaten."),"#));
    assert!(nl.contains(r#"("empty_lan_tip", "Nog geen apparaten ontdekt op dit LAN."),"#));
    assert!(nl.contains(
        r#"("upgrade_rustdesk_server_pro_to_{}_tip", "Deze functionaliteit is nog niet ondersteund."),"#
    ));
    assert!(nl.contains(
        r#"("id_input_tip", "U kunt een ID, een direct IP of een hostname met poort (<hostname>:<poort>) invoeren.\n\nAls u toegang wilt"#
    ));
    assert!(nl.contains(
        r#"("web_id_input_tip", "U kunt een ID invoeren op dezelfde server, directe IP-toegang wordt niet ondersteund in de webclient.\n\n"#
    ));
}

const DESKTOP_SETTING_PAGE: &str = r#"  List<SettingsTabKey> _settingTabs() {
    final List<SettingsTabKey> settingTabs = <SettingsTabKey>[
      SettingsTabKey.general,
    if (!bind.isDisableAccount()) SettingsTabKey.account,
      SettingsTabKey.about,
    ];
    return settingTabs;
  }

  Widget _about() {
    return Column(children: [
                _Card(title: 'ID', children: [changeId()]),
              InkWell(
                  onTap: () {
                    launchUrlString('https://rustdesk.com/privacy.html');
                  },
                  child: Text(
                    translate('Privacy Statement'),
                    style: linkStyle,
                  ).marginSymmetric(vertical: 4.0)),
              InkWell(
                  onTap: () {
                    launchUrlString('https://rustdesk.com');
                  },
                  child: Text(
                    translate('Website'),
                    style: linkStyle,
                  ).marginSymmetric(vertical: 4.0)),
                        child: Column(children: [
                          Text(
                            translate('Slogan_tip'),
                            style: TextStyle(
                                fontWeight: FontWeight.w800,
                                color: Colors.white),
                          )
                        ]),
    ]);
  }
"#;

const SERVER_PAGE: &str = r#"    if (bind.mainGetLocalOption(key: "show-scam-warning") != "N") {
      showScamWarning(context, serverModel);
    }
    final showWarning = bind.mainGetLocalOption(key: "show-scam-warning") != "N";
"#;

const MOBILE_SETTINGS_PAGE: &str = r#"    final List<AbstractSettingsTile> enhancementsTiles = [];
    return SettingsList(
      sections: [
        if (!bind.isDisableAccount())
          SettingsSection(title: Text(translate('Account'))),
      ],
    );
        if (bind.isCustomClient())
          Align(
            alignment: Alignment.center,
            child: loadPowered(context),
          ),
        SettingsTile(title: Text(translate('Version: ') + version)),
"#;

#[test]
fn test_settings_and_attribution() {
    let dir = TempDir::new().unwrap();
    let desktop = "flutter/lib/desktop/pages/desktop_setting_page.dart";
    let server = "flutter/lib/mobile/pages/server_page.dart";
    let mobile = "flutter/lib/mobile/pages/settings_page.dart";
    write(dir.path(), desktop, DESKTOP_SETTING_PAGE);
    write(dir.path(), server, SERVER_PAGE);
    write(dir.path(), mobile, MOBILE_SETTINGS_PAGE);

    let rules = load_table("ui_edits.toml", &[desktop, server, mobile]);
    assert_eq!(rules.groups.len(), 6);

    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();
    assert!(report.is_clean(), "mismatches: {report:?}");

    let desktop = read(dir.path(), desktop);
    assert!(!desktop.contains("SettingsTabKey.account"));
    assert!(!desktop.contains("changeId()"));
    assert!(!desktop.contains("rustdesk.com"));
    assert!(desktop.contains("'https://www.gnu.org/licenses/agpl-3.0.html');"));
    assert!(desktop.contains("launchUrlString('https://github.com/ANB5Dev/rustdesk/');"));
    assert!(desktop.contains("translate('License'),"));
    assert!(desktop.contains("translate('Source'),"));
    assert!(!desktop.contains("Slogan_tip"));
    assert!(desktop.contains("child: Column(children: [\n                        ]),"));

    let server = read(dir.path(), server);
    assert!(!server.contains("mainGetLocalOption"));
    assert!(server.contains("final showWarning = \"N\" != \"N\";"));

    let mobile = read(dir.path(), mobile);
    assert!(mobile.contains("        if (false)\n          SettingsSection("));
    assert!(!mobile.contains("loadPowered"));
    assert!(mobile.ends_with(
        "      ],\n    );\n        SettingsTile(title: Text(translate('Version: ') + version)),\n"
    ));
}

/// A `windows.rs` with `reg_lines` line-leading `reg` commands and seven
/// quoted `sc` commands.
fn windows_rs(reg_lines: usize) -> String {
    let mut source = String::from("fn install_commands() -> String {\n");
    source.push_str(&"reg delete HKEY_CURRENT_USER\\Software\\Acme /f\n".repeat(reg_lines));
    source.push_str(&"    \"sc stop {app_name} && echo\";\n".repeat(7));
    source.push_str(
        r#"    let ext = format!("cmd /c reg add HKEY_CLASSES_ROOT\\.{ext} /f");
    let a = format!("taskkill /F /IM {broker_exe}");
    let b = format!("taskkill /F /IM {broker_exe}");
    let c = format!("taskkill /F /IM {app_name}.exe{filter}");
    let d = format!("taskkill /F /IM {app_name}.exe{filter}");
    let e = format!("taskkill /F /IM {app_name}.exe{filter}");
    let f = format!("taskkill /F /IM {}", exe);
    let g = format!("taskkill /F /IM {process_exe}");
    let size = meta.len() / 1024;
}
"#,
    );
    source
}

#[test]
fn test_windows_installer_quoting() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/platform/windows.rs", &windows_rs(40));

    let rules = load_table("ui_edits.toml", &["src/platform/windows.rs"]);
    assert_eq!(rules.rule_count(), 7);

    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();
    assert!(report.is_clean(), "mismatches: {report:?}");

    let windows = read(dir.path(), "src/platform/windows.rs");
    assert_eq!(
        windows
            .matches(r#"reg delete \"HKEY_CURRENT_USER\Software\Acme\" /f"#)
            .count(),
        40
    );
    assert_eq!(windows.matches(r#""sc stop \"{app_name}\" && echo";"#).count(), 7);
    assert!(windows.contains(r#"cmd /c reg add \"HKEY_CLASSES_ROOT\.{ext}\" /f"#));
    assert_eq!(windows.matches(r#"taskkill /F /IM \"{broker_exe}\""#).count(), 2);
    assert_eq!(
        windows
            .matches(r#"taskkill /F /IM \"{app_name}.exe\"{filter}"#)
            .count(),
        3
    );
    assert!(windows.contains(r#"format!("taskkill /F /IM \"{}\"", exe);"#));
    assert!(windows.contains(r#"format!("taskkill /F /IM \"{process_exe}\"");"#));
    assert!(windows.contains("let size = 54080;"));
}

#[test]
fn test_windows_installer_count_drift() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/platform/windows.rs", &windows_rs(39));

    let rules = load_table("ui_edits.toml", &["src/platform/windows.rs"]);
    let root = SourceRoot::new(dir.path()).unwrap();
    let groups = resolve(&rules, &acme(), &root).unwrap();
    let report = apply_all(&mut FileStore, &groups, &mut ()).unwrap();

    assert_eq!(report.total_mismatch(), 1);
    // Every rule still ran
    assert!(read(dir.path(), "src/platform/windows.rs").contains("let size = 54080;"));
}
