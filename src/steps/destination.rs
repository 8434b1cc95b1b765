use dialoguer::{Input, MultiSelect, Select};

use gamesetup::{
    error::SetupError,
    installer::{Interpreter, InterpreterFactory, ShortcutCreator, ShortcutKind, WizardEvent},
    ui,
};

use super::{cancel, dispatch, Wizard};

/// Installation folder and shortcut choices, then "Install".
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    let current = wizard
        .interpreter()
        .and_then(|i| i.target_path())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let target: String = Input::new()
        .with_prompt("Select installation directory")
        .default(current)
        .interact_text()?;
    dispatch(wizard, WizardEvent::TargetChanged(target))?;

    let mut kinds = vec![
        (ShortcutKind::Desktop, "Create desktop shortcut"),
        (ShortcutKind::Menu, "Create application menu shortcut"),
    ];
    if wizard.library_available() {
        kinds.push((ShortcutKind::Library, "Create game library shortcut"));
    }
    let labels: Vec<&str> = kinds.iter().map(|(_, label)| *label).collect();
    let picked = MultiSelect::new()
        .with_prompt("Shortcuts (space to toggle)")
        .items(&labels)
        .interact()?;
    for (i, (kind, _)) in kinds.iter().enumerate() {
        dispatch(wizard, WizardEvent::ShortcutToggled(*kind, picked.contains(&i)))?;
    }

    loop {
        let action = Select::new()
            .with_prompt("Ready to install")
            .items(&["Install", "View install script", "Cancel"])
            .default(0)
            .interact()?;
        match action {
            0 => return dispatch(wizard, WizardEvent::InstallClicked),
            1 => {
                let source = wizard.interpreter().map(|i| i.script_source()).unwrap_or_default();
                println!("{}", source);
            }
            _ => {
                cancel::run(wizard, true)?;
                if wizard.state().is_terminal() {
                    return Ok(());
                }
                ui::print_info("Installation not cancelled.");
            }
        }
    }
}
