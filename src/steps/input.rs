use std::path::PathBuf;

use dialoguer::{Input, Select};

use gamesetup::{
    error::SetupError,
    installer::{InterpreterFactory, ShortcutCreator, WizardEvent},
    ui,
};

use super::{cancel, dispatch, Wizard};

/// Answers an `input_menu` request of the script.
pub fn choose<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    let Some(request) = wizard.pending_input().cloned() else {
        return Ok(());
    };

    let mut labels: Vec<String> = request.options.iter().map(|c| c.label.clone()).collect();
    labels.push("Cancel installation".to_string());
    let preselect = request
        .preselect
        .as_deref()
        .and_then(|p| request.options.iter().position(|c| c.value == p))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt(&request.alias)
        .items(&labels)
        .default(preselect)
        .interact()?;

    match request.options.get(idx) {
        Some(choice) => dispatch(wizard, WizardEvent::InputChosen(choice.value.clone())),
        None => cancel::run(wizard, true),
    }
}

/// Asks for the disc the script needs.
pub fn disc<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    let Some(request) = wizard.pending_disc().cloned() else {
        return Ok(());
    };
    ui::print_info(&request.message);

    let action = Select::new()
        .items(&["Autodetect", "Browse…", "Cancel installation"])
        .default(0)
        .interact()?;

    match action {
        0 => dispatch(wizard, WizardEvent::DiscLocated(None)),
        1 => {
            let folder: String = Input::new()
                .with_prompt("Select the folder where the disc is mounted")
                .interact_text()?;
            dispatch(wizard, WizardEvent::DiscLocated(Some(PathBuf::from(folder))))
        }
        _ => cancel::run(wizard, true),
    }
}
