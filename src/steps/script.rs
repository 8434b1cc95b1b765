use console::style;
use dialoguer::Select;

use gamesetup::{
    error::SetupError,
    installer::{InterpreterFactory, ShortcutCreator, WizardEvent},
    ui,
};

use super::{cancel, dispatch, Wizard};

/// Lists the script versions and selects one.
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    let mut labels: Vec<String> = wizard
        .scripts()
        .iter()
        .map(|s| {
            if s.description.is_empty() {
                format!("{}", style(&s.version).cyan().bold())
            } else {
                format!("{}  {}", style(&s.version).cyan().bold(), style(&s.description).dim())
            }
        })
        .collect();
    labels.push("Cancel".to_string());

    for script in wizard.scripts().iter().filter(|s| !s.notes.is_empty()) {
        ui::print_info(&format!("{}: {}", script.version, script.notes));
    }

    let idx = Select::new()
        .with_prompt("Select the version to install")
        .items(&labels)
        .default(0)
        .interact()?;

    match wizard.scripts().get(idx) {
        Some(script) => {
            let version = script.version.clone();
            dispatch(wizard, WizardEvent::ScriptSelected(version))
        }
        None => cancel::run(wizard, true),
    }
}
