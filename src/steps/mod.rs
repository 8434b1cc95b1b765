//! Terminal screens driving the installer wizard, one file per screen.

pub mod cancel;
pub mod destination;
pub mod extras;
pub mod files;
pub mod input;
pub mod script;

use std::time::Duration;

use gamesetup::{
    error::SetupError,
    installer::{InstallerWizard, Interpreter, InterpreterFactory, ShortcutCreator, WizardEvent, WizardState},
    ui,
};

pub type Wizard<F, S> = InstallerWizard<F, S>;

const POLL: Duration = Duration::from_millis(100);

/// Shows screens until the wizard is closed.
pub fn run<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    ui::print_banner(wizard.title());
    let mut screen = 0;

    loop {
        let state = wizard.state().clone();
        match state {
            WizardState::ChooseScript => {
                screen += 1;
                ui::print_step(screen, "Choose an installer");
                script::run(wizard)?;
            }
            WizardState::SelectDestination => {
                screen += 1;
                ui::print_step(screen, wizard.title());
                destination::run(wizard)?;
            }
            WizardState::SelectExtras => {
                screen += 1;
                ui::print_step(screen, "Extras");
                extras::run(wizard)?;
            }
            WizardState::ReviewFiles => {
                screen += 1;
                ui::print_step(screen, "Installer files");
                files::run(wizard)?;
            }
            WizardState::AwaitingInput => input::choose(wizard)?,
            WizardState::AwaitingDisc => input::disc(wizard)?,
            WizardState::InstallingRunners | WizardState::Downloading | WizardState::RunningCommands => {
                wait(wizard)?;
            }
            WizardState::Finished => {
                ui::print_success(&format!("{} installed.", game_name(wizard)));
                dispatch(wizard, WizardEvent::Close)?;
            }
            WizardState::Errored(message) => {
                ui::print_error(&message);
                ui::print_info("The installation has to be cancelled.");
                cancel::run(wizard, false)?;
            }
            WizardState::DependencyRequired(slug) => {
                ui::print_warning(&format!("This game requires {}. Install it first.", slug));
                dispatch(wizard, WizardEvent::Close)?;
            }
            WizardState::Cancelled => {
                ui::print_warning("Installation cancelled.");
                dispatch(wizard, WizardEvent::Close)?;
            }
            WizardState::Closed => return Ok(()),
        }
    }
}

/// Feeds `event`, reporting script errors instead of giving up on them.
pub fn dispatch<F: InterpreterFactory, S: ShortcutCreator>(
    wizard: &mut Wizard<F, S>,
    event: WizardEvent,
) -> Result<(), SetupError> {
    match wizard.on_event(event) {
        Ok(_) => Ok(()),
        Err(SetupError::Scripting(message)) => {
            ui::print_error(&message);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Spins until the interpreter moves the wizard to another state.
fn wait<F: InterpreterFactory, S: ShortcutCreator>(wizard: &mut Wizard<F, S>) -> Result<(), SetupError> {
    let pb = ui::spinner(waiting_message(wizard));
    loop {
        match wizard.wait_for_interpreter(POLL)? {
            Some(t) if t.changed() => break,
            Some(_) => pb.set_message(waiting_message(wizard)),
            None => {}
        }
    }
    pb.finish_and_clear();
    Ok(())
}

fn waiting_message<F: InterpreterFactory, S: ShortcutCreator>(wizard: &Wizard<F, S>) -> String {
    if wizard.status().is_empty() {
        format!("{}…", capitalize(&wizard.state().to_string()))
    } else {
        wizard.status().to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn game_name<F: InterpreterFactory, S: ShortcutCreator>(wizard: &Wizard<F, S>) -> String {
    wizard
        .interpreter()
        .map(|i| i.game_name().to_string())
        .unwrap_or_default()
}
