//! Installing a game from an install script.

pub mod extras;
pub mod interpreter;
pub mod paths;
pub mod script;
pub mod shortcuts;
pub mod simulate;
pub mod wizard;

pub use interpreter::{Interpreter, InterpreterEvent, InterpreterFactory};
pub use script::{load_scripts, validate_scripts, InstallerScript};
pub use shortcuts::{ShortcutCreator, XdgShortcuts};
pub use simulate::SimulatedFactory;
pub use wizard::{InstallerWizard, ShortcutKind, Transition, WizardEvent, WizardState};
