use dialoguer::Confirm;
use log::debug;

use gamesetup::{
    error::SetupError,
    installer::{InterpreterFactory, ShortcutCreator, WizardEvent},
};

use super::{dispatch, Wizard};

/// Cancels the install, offering to remove the target when that is safe.
/// With `confirm`, the user is asked first.
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>, confirm: bool) -> Result<(), SetupError> {
    if confirm
        && !Confirm::new()
            .with_prompt("Are you sure you want to cancel the installation?")
            .default(false)
            .interact()?
    {
        debug!("User aborted installation cancellation");
        return Ok(());
    }

    let prompt = wizard
        .removable_target()
        .map(|path| format!("Remove game files in {}?", path.display()));
    let remove_game_files = match prompt {
        Some(prompt) => Confirm::new()
            .with_prompt(prompt)
            .default(wizard.game_dir_created())
            .interact()?,
        None => false,
    };

    dispatch(wizard, WizardEvent::Cancel { remove_game_files })
}
