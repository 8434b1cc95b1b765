use std::path::PathBuf;

use serde_json::json;

use gamesetup::{
    config::Settings,
    installer::{
        extras::ExtraPath, validate_scripts, InstallerWizard, ShortcutKind, SimulatedFactory, WizardEvent,
        WizardState, XdgShortcuts,
    },
    SetupError,
};

fn quake() -> serde_json::Value {
    json!({
        "name": "Quake",
        "version": "GOG",
        "runner": "linux",
        "description": "GOG release",
        "script": {
            "files": [{"setup": "https://example.com/setup_quake.exe"}],
            "extras": {"GOG": [{"id": "manual", "name": "Manual", "total_size": 2048, "type": "pdf"}]},
            "installer": [
                {"input_menu": {"id": "lang", "options": [{"en": "English"}, {"fr": "French"}], "preselect": "en"}},
                {"extract": {"file": "setup"}}
            ]
        }
    })
}

fn factory(games: &std::path::Path, installed: &[&str]) -> SimulatedFactory {
    SimulatedFactory {
        installed_games: installed.iter().map(|s| s.to_string()).collect(),
        cache_dir: games.join("cache"),
        game_path: games.to_path_buf(),
    }
}

fn shortcuts(games: &std::path::Path) -> XdgShortcuts {
    XdgShortcuts {
        desktop_dir: games.join("Desktop"),
        menu_dir: games.join("applications"),
        exec: "lutris lutris:rungameid/{game_id}".into(),
    }
}

#[test]
fn dry_run_walks_every_screen() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = validate_scripts(vec![quake()]).unwrap();
    let mut wizard = InstallerWizard::new(
        scripts,
        factory(dir.path(), &[]),
        shortcuts(dir.path()),
        &Settings::default(),
        false,
    )
    .unwrap();
    assert_eq!(wizard.title(), "Install Quake");

    wizard.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
    assert_eq!(wizard.state(), &WizardState::SelectDestination);
    assert_eq!(wizard.title(), "Installing Quake");

    let target = dir.path().join("quake");
    wizard
        .on_event(WizardEvent::TargetChanged(target.display().to_string()))
        .unwrap();
    wizard
        .on_event(WizardEvent::ShortcutToggled(ShortcutKind::Desktop, true))
        .unwrap();
    wizard.on_event(WizardEvent::InstallClicked).unwrap();
    wizard.pump().unwrap();
    assert_eq!(wizard.state(), &WizardState::SelectExtras);
    assert_eq!(wizard.status(), "This game has extra content. Select which one you want and click 'Continue'");

    wizard.on_event(WizardEvent::ExtraToggled(ExtraPath::Source(0))).unwrap();
    wizard.on_event(WizardEvent::ExtrasConfirmed).unwrap();
    assert_eq!(wizard.state(), &WizardState::ReviewFiles);
    assert!(wizard.can_continue());

    wizard.on_event(WizardEvent::FilesConfirmed).unwrap();
    assert_eq!(wizard.state(), &WizardState::Downloading);
    wizard.pump().unwrap();
    assert_eq!(wizard.state(), &WizardState::AwaitingInput);
    assert_eq!(wizard.pending_input().unwrap().alias, "lang");

    wizard.on_event(WizardEvent::InputChosen("fr".into())).unwrap();
    wizard.pump().unwrap();
    assert_eq!(wizard.state(), &WizardState::Finished);
    assert_eq!(wizard.status(), "Simulating extract");
    assert_eq!(wizard.game_id(), None);

    let launcher: PathBuf = dir.path().join("Desktop").join("quake-0.desktop");
    assert!(launcher.exists());
    assert!(!dir.path().join("applications").exists());

    wizard.on_event(WizardEvent::Close).unwrap();
    assert_eq!(wizard.state(), &WizardState::Closed);
}

#[test]
fn missing_dependency_ends_the_walk() {
    let dir = tempfile::tempdir().unwrap();
    let mut addon = quake();
    addon["name"] = json!("Quake Mission Pack");
    addon["requires"] = json!("quake");

    let scripts = validate_scripts(vec![addon.clone()]).unwrap();
    let mut wizard = InstallerWizard::new(
        scripts,
        factory(dir.path(), &[]),
        shortcuts(dir.path()),
        &Settings::default(),
        false,
    )
    .unwrap();
    wizard.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
    assert_eq!(wizard.state(), &WizardState::DependencyRequired("quake".into()));

    // Once the base game is installed the add-on goes straight to the runners.
    let scripts = validate_scripts(vec![addon]).unwrap();
    let mut wizard = InstallerWizard::new(
        scripts,
        factory(dir.path(), &["quake"]),
        shortcuts(dir.path()),
        &Settings::default(),
        false,
    )
    .unwrap();
    wizard.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
    assert_eq!(wizard.state(), &WizardState::InstallingRunners);
}

#[test]
fn closing_mid_install_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = validate_scripts(vec![quake()]).unwrap();
    let mut wizard = InstallerWizard::new(
        scripts,
        factory(dir.path(), &[]),
        shortcuts(dir.path()),
        &Settings::default(),
        false,
    )
    .unwrap();
    wizard.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
    wizard.on_event(WizardEvent::InstallClicked).unwrap();

    assert!(matches!(
        wizard.on_event(WizardEvent::Close),
        Err(SetupError::InstallInProgress)
    ));
    wizard
        .on_event(WizardEvent::Cancel { remove_game_files: false })
        .unwrap();
    assert_eq!(wizard.state(), &WizardState::Cancelled);
}
