use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{0}' not found. Is it installed?")]
    CommandNotFound(String),

    #[error("Command '{0}' did not finish within {1}s")]
    Timeout(String, u64),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Invalid settings file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not find the home directory")]
    NoHomeDirectory,

    #[error("No installer available")]
    NoInstaller,

    #[error("Missing field \"{0}\" in install script")]
    MissingField(String),

    #[error("{0}")]
    Scripting(String),

    #[error("This game requires {0}")]
    MissingGameDependency(String),

    #[error("No installer script with version '{0}'")]
    UnknownVersion(String),

    #[error("Option '{0}' is declared more than once")]
    DuplicateOption(String),

    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    #[error("Event '{event}' is not valid while {state}")]
    UnexpectedEvent { event: String, state: String },

    #[error("The installation is still in progress. Cancel it first")]
    InstallInProgress,

    #[error("No script interpreter is available. Rerun with --dry-run to walk through the installer")]
    InterpreterUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_as_sentences() {
        let io: SetupError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.to_string(), "I/O error: gone");
        assert_eq!(
            SetupError::CommandNotFound("lspci".into()).to_string(),
            "Command 'lspci' not found. Is it installed?"
        );
        assert_eq!(SetupError::NoHomeDirectory.to_string(), "Could not find the home directory");
        assert_eq!(
            SetupError::UnexpectedEvent {
                event: "files-ready".into(),
                state: "downloading".into()
            }
            .to_string(),
            "Event 'files-ready' is not valid while downloading"
        );
    }
}
