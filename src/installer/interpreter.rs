//! The contract between the installer wizard and the script interpreter
//! that does the actual work (runner installation, downloads, commands).

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::SetupError, options::Choice};

use super::script::InstallerScript;

// ── Records ───────────────────────────────────────────────────────────────────

/// A file the script needs before its commands can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerFile {
    pub id: String,
    pub url: String,
    pub filename: String,
}

impl InstallerFile {
    /// Reads one `files` entry: `{"id": "url"}` or
    /// `{"id": {"url": "...", "filename": "..."}}`.
    pub fn from_script_entry(entry: &Value) -> Result<Self, SetupError> {
        let invalid = || SetupError::Scripting(format!("Invalid file entry: {}", entry));
        let obj = entry.as_object().ok_or_else(invalid)?;
        let (id, source) = obj.iter().next().ok_or_else(invalid)?;

        let (url, filename) = match source {
            Value::String(url) => (url.clone(), None),
            Value::Object(o) => (
                o.get("url").and_then(Value::as_str).ok_or_else(invalid)?.to_string(),
                o.get("filename").and_then(Value::as_str).map(str::to_string),
            ),
            _ => return Err(invalid()),
        };
        let filename = filename.unwrap_or_else(|| {
            url.rsplit('/')
                .find(|s| !s.is_empty())
                .unwrap_or(id)
                .to_string()
        });

        Ok(InstallerFile {
            id: id.clone(),
            url,
            filename,
        })
    }
}

/// Optional bonus content offered next to the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub total_size: Option<u64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Extras grouped by the store or source offering them.
pub type ExtrasBySource = IndexMap<String, Vec<Extra>>;

/// The script asks the user to pick one of several values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub alias: String,
    pub options: Vec<Choice>,
    pub preselect: Option<String>,
}

/// The script needs a disc mounted somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscRequest {
    pub message: String,
    /// File the disc must contain.
    pub requires: String,
}

/// Notifications the interpreter sends back once asynchronous work ends.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterEvent {
    RunnersInstalled,
    FilesReady(bool),
    FilesAvailable(IndexMap<String, PathBuf>),
    Status(String),
    InputRequested(InputRequest),
    DiscRequested(DiscRequest),
    InstallFinished { game_id: Option<i64> },
    InstallError(String),
}

pub type EventSender = Sender<InterpreterEvent>;

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Script interpreter as seen from the wizard.
///
/// Methods returning `Result` start work; completion is reported through
/// the [`EventSender`] handed to [`InterpreterFactory::create`].
pub trait Interpreter {
    fn game_name(&self) -> &str;
    fn game_slug(&self) -> &str;
    /// Known once the game has been saved.
    fn game_id(&self) -> Option<i64>;
    fn creates_game_folder(&self) -> bool;
    fn default_target(&self) -> PathBuf;
    fn target_path(&self) -> Option<&Path>;
    fn set_target_path(&mut self, path: PathBuf);
    fn game_dir_created(&self) -> bool;
    fn script_source(&self) -> String;

    /// Installs the runners; answers with `RunnersInstalled`.
    fn launch_install(&mut self) -> Result<(), SetupError>;

    /// `None` until the user has been asked.
    fn extras(&self) -> Option<&[String]>;
    fn set_extras(&mut self, ids: Vec<String>);
    fn get_extras(&mut self) -> Result<ExtrasBySource, SetupError>;

    /// Resolves the files to fetch; `patch_version` is set for updates.
    fn prepare_game_files(&mut self, patch_version: Option<&str>) -> Result<(), SetupError>;
    fn files(&self) -> &[InstallerFile];
    /// All files are already available locally.
    fn files_ready(&self) -> bool;
    /// Starts fetching; answers with `FilesAvailable`.
    fn start_downloads(&mut self) -> Result<(), SetupError>;
    /// Called on every cancel, downloads running or not.
    fn stop_downloads(&mut self);
    fn set_game_files(&mut self, files: IndexMap<String, PathBuf>);

    /// Runs the script's commands; answers with `InstallFinished`,
    /// `InstallError`, or an input / disc request.
    fn launch_installer_commands(&mut self) -> Result<(), SetupError>;
    fn answer_input(&mut self, alias: &str, value: &str) -> Result<(), SetupError>;
    /// `None` asks the interpreter to look for the disc itself.
    fn disc_located(&mut self, requires: &str, path: Option<PathBuf>) -> Result<(), SetupError>;

    fn revert(&mut self, remove_game_dir: bool) -> Result<(), SetupError>;
    /// Drops temporary downloads. Always safe to call.
    fn cleanup(&mut self);
}

pub trait InterpreterFactory {
    type Interpreter: Interpreter;

    /// Fails with [`SetupError::MissingGameDependency`] when the script
    /// needs a game that is not installed.
    fn create(
        &self,
        script: &InstallerScript,
        events: EventSender,
    ) -> Result<Self::Interpreter, SetupError>;
}
