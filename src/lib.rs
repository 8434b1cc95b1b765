//! Launch options and game installation for a desktop game launcher.

pub mod cmd;
pub mod config;
pub mod error;
pub mod installer;
pub mod options;
pub mod probe;
pub mod ui;

pub use error::SetupError;
