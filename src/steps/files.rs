use dialoguer::Select;

use gamesetup::{
    error::SetupError,
    installer::{Interpreter, InterpreterFactory, ShortcutCreator, WizardEvent},
    ui,
};

use super::{cancel, dispatch, Wizard, POLL};

/// Lists the files the script needs and starts fetching them.
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    if let Some(interp) = wizard.interpreter() {
        let rows: Vec<(String, String)> = interp
            .files()
            .iter()
            .map(|f| (f.id.clone(), f.filename.clone()))
            .collect();
        let rows: Vec<(&str, &str)> = rows.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        ui::print_kv_box("Files", &rows);
    }
    if !wizard.status().is_empty() {
        ui::print_info(wizard.status());
    }

    let items = if wizard.can_continue() {
        ["Continue", "Cancel"]
    } else {
        ui::print_warning("Some files are not available yet.");
        ["Check again", "Cancel"]
    };
    let action = Select::new().items(&items).default(0).interact()?;

    match (action, wizard.can_continue()) {
        (0, true) => dispatch(wizard, WizardEvent::FilesConfirmed),
        (0, false) => {
            wizard.wait_for_interpreter(POLL)?;
            Ok(())
        }
        _ => cancel::run(wizard, true),
    }
}
