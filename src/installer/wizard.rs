//! The installer as an explicit state machine.
//!
//! The wizard owns the interpreter built for the chosen script and the
//! receiving end of its notification channel. Front ends feed user actions
//! through [`InstallerWizard::on_event`] and interpreter notifications
//! through [`InstallerWizard::pump`] or
//! [`InstallerWizard::wait_for_interpreter`].

use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::{
    config::{InstallChoices, Settings},
    error::SetupError,
};

use super::{
    extras::{ExtraPath, ExtrasSelection},
    interpreter::{DiscRequest, EventSender, InputRequest, Interpreter, InterpreterEvent, InterpreterFactory},
    paths::{expand_user, is_removable},
    script::{validate_scripts, InstallerScript},
    shortcuts::{ShortcutCreator, ShortcutEntry, ShortcutTarget},
};

const REVIEW_FILES_STATUS: &str = "Please review the files needed for the installation then click 'Continue'";
const EXTRAS_STATUS: &str = "This game has extra content. Select which one you want and click 'Continue'";

// ── States and events ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    ChooseScript,
    SelectDestination,
    InstallingRunners,
    SelectExtras,
    ReviewFiles,
    Downloading,
    RunningCommands,
    AwaitingInput,
    AwaitingDisc,
    Finished,
    Errored(String),
    /// The script needs this game installed first.
    DependencyRequired(String),
    Cancelled,
    Closed,
}

impl WizardState {
    /// Nothing is left to do but close.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WizardState::Finished
                | WizardState::DependencyRequired(_)
                | WizardState::Cancelled
                | WizardState::Closed
        )
    }

    /// The interpreter is working or waiting on the user mid-install.
    fn is_installing(&self) -> bool {
        matches!(
            self,
            WizardState::InstallingRunners
                | WizardState::SelectExtras
                | WizardState::ReviewFiles
                | WizardState::Downloading
                | WizardState::RunningCommands
                | WizardState::AwaitingInput
                | WizardState::AwaitingDisc
        )
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardState::ChooseScript => write!(f, "choosing a script"),
            WizardState::SelectDestination => write!(f, "selecting the destination"),
            WizardState::InstallingRunners => write!(f, "installing runners"),
            WizardState::SelectExtras => write!(f, "selecting extras"),
            WizardState::ReviewFiles => write!(f, "reviewing files"),
            WizardState::Downloading => write!(f, "downloading"),
            WizardState::RunningCommands => write!(f, "running installer commands"),
            WizardState::AwaitingInput => write!(f, "waiting for input"),
            WizardState::AwaitingDisc => write!(f, "waiting for a disc"),
            WizardState::Finished => write!(f, "finished"),
            WizardState::Errored(_) => write!(f, "in error"),
            WizardState::DependencyRequired(slug) => write!(f, "waiting for {}", slug),
            WizardState::Cancelled => write!(f, "cancelled"),
            WizardState::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    Desktop,
    Menu,
    Library,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    ScriptSelected(String),
    /// Raw text of the destination entry; `~` is expanded.
    TargetChanged(String),
    ShortcutToggled(ShortcutKind, bool),
    InstallClicked,
    RunnersInstalled,
    ExtraToggled(ExtraPath),
    ExtrasConfirmed,
    FilesReady(bool),
    FilesConfirmed,
    FilesAvailable(IndexMap<String, PathBuf>),
    InputRequested(InputRequest),
    InputChosen(String),
    DiscRequested(DiscRequest),
    /// `None` asks for autodetection.
    DiscLocated(Option<PathBuf>),
    Status(String),
    InstallFinished(Option<i64>),
    InstallError(String),
    Cancel { remove_game_files: bool },
    Close,
}

impl WizardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WizardEvent::ScriptSelected(_) => "script-selected",
            WizardEvent::TargetChanged(_) => "target-changed",
            WizardEvent::ShortcutToggled(..) => "shortcut-toggled",
            WizardEvent::InstallClicked => "install-clicked",
            WizardEvent::RunnersInstalled => "runners-installed",
            WizardEvent::ExtraToggled(_) => "extra-toggled",
            WizardEvent::ExtrasConfirmed => "extras-confirmed",
            WizardEvent::FilesReady(_) => "files-ready",
            WizardEvent::FilesConfirmed => "files-confirmed",
            WizardEvent::FilesAvailable(_) => "files-available",
            WizardEvent::InputRequested(_) => "input-requested",
            WizardEvent::InputChosen(_) => "input-chosen",
            WizardEvent::DiscRequested(_) => "disc-requested",
            WizardEvent::DiscLocated(_) => "disc-located",
            WizardEvent::Status(_) => "status",
            WizardEvent::InstallFinished(_) => "install-finished",
            WizardEvent::InstallError(_) => "install-error",
            WizardEvent::Cancel { .. } => "cancel",
            WizardEvent::Close => "close",
        }
    }
}

impl From<InterpreterEvent> for WizardEvent {
    fn from(event: InterpreterEvent) -> Self {
        match event {
            InterpreterEvent::RunnersInstalled => WizardEvent::RunnersInstalled,
            InterpreterEvent::FilesReady(ready) => WizardEvent::FilesReady(ready),
            InterpreterEvent::FilesAvailable(files) => WizardEvent::FilesAvailable(files),
            InterpreterEvent::Status(text) => WizardEvent::Status(text),
            InterpreterEvent::InputRequested(req) => WizardEvent::InputRequested(req),
            InterpreterEvent::DiscRequested(req) => WizardEvent::DiscRequested(req),
            InterpreterEvent::InstallFinished { game_id } => WizardEvent::InstallFinished(game_id),
            InterpreterEvent::InstallError(message) => WizardEvent::InstallError(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: WizardState,
    pub to: WizardState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

// ── Wizard ────────────────────────────────────────────────────────────────────

pub struct InstallerWizard<F: InterpreterFactory, S: ShortcutCreator> {
    scripts: Vec<InstallerScript>,
    factory: F,
    shortcuts: S,
    game_path: PathBuf,
    is_update: bool,
    selected: Option<usize>,
    interpreter: Option<F::Interpreter>,
    sender: EventSender,
    receiver: Receiver<InterpreterEvent>,
    state: WizardState,
    title: String,
    status: String,
    choices: InstallChoices,
    extras: Option<ExtrasSelection>,
    pending_input: Option<InputRequest>,
    pending_disc: Option<DiscRequest>,
    can_continue: bool,
    game_id: Option<i64>,
}

impl<F: InterpreterFactory, S: ShortcutCreator> InstallerWizard<F, S> {
    pub fn new(
        scripts: Vec<InstallerScript>,
        factory: F,
        shortcuts: S,
        settings: &Settings,
        is_update: bool,
    ) -> Result<Self, SetupError> {
        let first = scripts.first().ok_or(SetupError::NoInstaller)?;
        let title = format!("Install {}", first.name);
        let (sender, receiver) = crossbeam_channel::unbounded();

        Ok(InstallerWizard {
            scripts,
            factory,
            shortcuts,
            game_path: expand_user(&settings.game_path),
            is_update,
            selected: None,
            interpreter: None,
            sender,
            receiver,
            state: WizardState::ChooseScript,
            title,
            status: String::new(),
            choices: InstallChoices::default(),
            extras: None,
            pending_input: None,
            pending_disc: None,
            can_continue: false,
            game_id: None,
        })
    }

    /// Validates raw JSON scripts before building the wizard.
    pub fn from_json(
        raw: Vec<Value>,
        factory: F,
        shortcuts: S,
        settings: &Settings,
        is_update: bool,
    ) -> Result<Self, SetupError> {
        Self::new(validate_scripts(raw)?, factory, shortcuts, settings, is_update)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn scripts(&self) -> &[InstallerScript] {
        &self.scripts
    }

    pub fn selected_script(&self) -> Option<&InstallerScript> {
        self.selected.and_then(|i| self.scripts.get(i))
    }

    pub fn interpreter(&self) -> Option<&F::Interpreter> {
        self.interpreter.as_ref()
    }

    pub fn choices(&self) -> InstallChoices {
        self.choices
    }

    pub fn extras(&self) -> Option<&ExtrasSelection> {
        self.extras.as_ref()
    }

    pub fn pending_input(&self) -> Option<&InputRequest> {
        self.pending_input.as_ref()
    }

    pub fn pending_disc(&self) -> Option<&DiscRequest> {
        self.pending_disc.as_ref()
    }

    /// Whether the "Continue" action is enabled on the files screen.
    pub fn can_continue(&self) -> bool {
        self.can_continue
    }

    pub fn game_id(&self) -> Option<i64> {
        self.game_id
    }

    pub fn library_available(&self) -> bool {
        self.shortcuts.library_available()
    }

    /// The current target, when cancelling may offer to delete it.
    pub fn removable_target(&self) -> Option<&Path> {
        self.interpreter
            .as_ref()
            .and_then(|i| i.target_path())
            .filter(|p| is_removable(p, &self.game_path))
    }

    /// Default for the "remove game files" answer on cancel.
    pub fn game_dir_created(&self) -> bool {
        self.interpreter.as_ref().is_some_and(|i| i.game_dir_created())
    }

    // ── Interpreter notifications ─────────────────────────────────────────────

    /// Applies every notification already queued by the interpreter.
    /// Notifications that no longer apply to the current state are dropped.
    pub fn pump(&mut self) -> Result<Vec<Transition>, SetupError> {
        let mut transitions = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            transitions.extend(self.on_notification(event)?);
        }
        Ok(transitions)
    }

    /// Blocks until the interpreter reports something, or `timeout` expires.
    pub fn wait_for_interpreter(&mut self, timeout: Duration) -> Result<Option<Transition>, SetupError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => self.on_notification(event),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            // The wizard holds a sender, so this cannot happen.
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn on_notification(&mut self, event: InterpreterEvent) -> Result<Option<Transition>, SetupError> {
        match self.on_event(event.into()) {
            Ok(t) => Ok(Some(t)),
            Err(SetupError::UnexpectedEvent { event, state }) => {
                debug!("Dropping stale {} notification while {}", event, state);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Feeds one event. An event that does not apply to the current state
    /// is rejected and the state is left as it was.
    pub fn on_event(&mut self, event: WizardEvent) -> Result<Transition, SetupError> {
        let from = self.state.clone();
        debug!("Installer event {} while {}", event.name(), from);

        let to = match (from.clone(), event) {
            (WizardState::ChooseScript, WizardEvent::ScriptSelected(version)) => self.select_script(&version)?,

            (WizardState::SelectDestination, WizardEvent::TargetChanged(text)) => {
                self.interp()?.set_target_path(expand_user(&text));
                WizardState::SelectDestination
            }

            (state, WizardEvent::ShortcutToggled(kind, on)) if !state.is_terminal() => {
                match kind {
                    ShortcutKind::Desktop => self.choices.create_desktop_shortcut = on,
                    ShortcutKind::Menu => self.choices.create_menu_shortcut = on,
                    ShortcutKind::Library => self.choices.create_library_shortcut = on,
                }
                from.clone()
            }

            (WizardState::SelectDestination, WizardEvent::InstallClicked) => {
                self.interp()?.launch_install()?;
                WizardState::InstallingRunners
            }

            (WizardState::InstallingRunners, WizardEvent::RunnersInstalled) => self.on_runners_ready()?,

            (WizardState::SelectExtras, WizardEvent::ExtraToggled(path)) => {
                if let Some(extras) = self.extras.as_mut() {
                    extras.toggle(path);
                }
                WizardState::SelectExtras
            }

            (WizardState::SelectExtras, WizardEvent::ExtrasConfirmed) => {
                let ids = self.extras.as_ref().map(ExtrasSelection::selected_ids).unwrap_or_default();
                info!("Selected extras: {:?}", ids);
                self.interp()?.set_extras(ids);
                self.on_runners_ready()?
            }

            (WizardState::ReviewFiles, WizardEvent::FilesReady(ready)) => {
                self.can_continue = ready;
                WizardState::ReviewFiles
            }

            (WizardState::ReviewFiles, WizardEvent::FilesConfirmed) if self.can_continue => self.confirm_files()?,

            (WizardState::ReviewFiles | WizardState::Downloading, WizardEvent::FilesAvailable(files)) => {
                info!("All files are available, continuing install");
                let interp = self.interp()?;
                interp.set_game_files(files);
                interp.launch_installer_commands()?;
                WizardState::RunningCommands
            }

            (WizardState::RunningCommands, WizardEvent::InputRequested(request)) => {
                self.pending_input = Some(request);
                WizardState::AwaitingInput
            }

            (WizardState::AwaitingInput, WizardEvent::InputChosen(value)) => {
                if value.is_empty() {
                    return Err(SetupError::Scripting("No option selected".to_string()));
                }
                let alias = self.pending_input.as_ref().map(|r| r.alias.clone()).unwrap_or_default();
                self.interp()?.answer_input(&alias, &value)?;
                self.pending_input = None;
                WizardState::RunningCommands
            }

            (WizardState::RunningCommands, WizardEvent::DiscRequested(request)) => {
                self.pending_disc = Some(request);
                WizardState::AwaitingDisc
            }

            (WizardState::AwaitingDisc, WizardEvent::DiscLocated(path)) => {
                let requires = self.pending_disc.as_ref().map(|r| r.requires.clone()).unwrap_or_default();
                self.interp()?.disc_located(&requires, path)?;
                self.pending_disc = None;
                WizardState::RunningCommands
            }

            (state, WizardEvent::Status(text)) if state != WizardState::Closed => {
                self.status = text;
                from.clone()
            }

            (WizardState::RunningCommands, WizardEvent::InstallFinished(game_id)) => {
                self.on_install_finished(game_id);
                WizardState::Finished
            }

            (state, WizardEvent::InstallError(message)) if state.is_installing() => {
                error!("Install failed: {}", message);
                self.status = message.clone();
                WizardState::Errored(message)
            }

            (state, WizardEvent::Cancel { remove_game_files }) if !state.is_terminal() => {
                self.cancel(remove_game_files);
                WizardState::Cancelled
            }

            (state, WizardEvent::Close)
                if state != WizardState::Closed && (state.is_terminal() || state == WizardState::ChooseScript) =>
            {
                if let Some(interp) = self.interpreter.as_mut() {
                    interp.cleanup();
                }
                WizardState::Closed
            }

            (state, WizardEvent::Close) if state != WizardState::Closed => {
                return Err(SetupError::InstallInProgress);
            }

            (state, event) => {
                warn!("Ignoring {} while {}", event.name(), state);
                return Err(SetupError::UnexpectedEvent {
                    event: event.name().to_string(),
                    state: state.to_string(),
                });
            }
        };

        if to != from {
            info!("Installer: {} -> {}", from, to);
        }
        self.state = to.clone();
        Ok(Transition { from, to })
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    fn interp(&mut self) -> Result<&mut F::Interpreter, SetupError> {
        self.interpreter.as_mut().ok_or(SetupError::NoInstaller)
    }

    fn select_script(&mut self, version: &str) -> Result<WizardState, SetupError> {
        let index = self
            .scripts
            .iter()
            .rposition(|s| s.version == version)
            .ok_or_else(|| SetupError::UnknownVersion(version.to_string()))?;

        let mut interp = match self.factory.create(&self.scripts[index], self.sender.clone()) {
            Ok(interp) => interp,
            Err(SetupError::MissingGameDependency(slug)) => {
                warn!("{} requires {}", self.scripts[index].name, slug);
                self.selected = Some(index);
                return Ok(WizardState::DependencyRequired(slug));
            }
            Err(e) => return Err(e),
        };
        let folderless = !interp.creates_game_folder();
        if folderless {
            if let Err(e) = interp.launch_install() {
                interp.cleanup();
                return Err(e);
            }
        }
        self.selected = Some(index);
        self.title = format!("Installing {}", interp.game_name());
        let interp = self.interpreter.insert(interp);
        if folderless {
            return Ok(WizardState::InstallingRunners);
        }
        let target = interp.default_target();
        interp.set_target_path(target);
        self.status = "Select installation directory".to_string();
        Ok(WizardState::SelectDestination)
    }

    fn on_runners_ready(&mut self) -> Result<WizardState, SetupError> {
        let patch_version = match self.selected_script() {
            Some(script) if self.is_update => Some(script.version.clone()),
            _ => None,
        };
        let interp = self.interpreter.as_mut().ok_or(SetupError::NoInstaller)?;

        if interp.extras().is_none() {
            let all = interp.get_extras()?;
            if !all.is_empty() {
                self.extras = Some(ExtrasSelection::new(&all));
                self.status = EXTRAS_STATUS.to_string();
                return Ok(WizardState::SelectExtras);
            }
        }

        interp.prepare_game_files(patch_version.as_deref())?;
        if interp.files().is_empty() {
            debug!("Installer doesn't require files");
            interp.launch_installer_commands()?;
            return Ok(WizardState::RunningCommands);
        }
        self.can_continue = interp.files_ready();
        self.status = REVIEW_FILES_STATUS.to_string();
        Ok(WizardState::ReviewFiles)
    }

    fn confirm_files(&mut self) -> Result<WizardState, SetupError> {
        self.status.clear();
        self.can_continue = false;
        let interp = self.interpreter.as_mut().ok_or(SetupError::NoInstaller)?;
        match interp.start_downloads() {
            Ok(()) => Ok(WizardState::Downloading),
            Err(SetupError::Io(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                self.can_continue = true;
                Err(SetupError::Scripting(format!("Unable to get files: {}", e)))
            }
            Err(e) => {
                self.can_continue = true;
                Err(e)
            }
        }
    }

    fn on_install_finished(&mut self, game_id: Option<i64>) {
        self.game_id = game_id;
        let Some(interp) = self.interpreter.as_ref() else {
            return;
        };
        let entry = ShortcutEntry {
            game_id: game_id.unwrap_or_default(),
            game_slug: interp.game_slug().to_string(),
            game_name: interp.game_name().to_string(),
        };

        let wanted = [
            (self.choices.create_desktop_shortcut, ShortcutTarget::Desktop),
            (self.choices.create_menu_shortcut, ShortcutTarget::Menu),
        ];
        for (_, target) in wanted.iter().filter(|(on, _)| *on) {
            if let Err(e) = self.shortcuts.create_launcher(&entry, *target) {
                error!("Could not create {:?} shortcut: {}", target, e);
            }
        }

        if game_id.is_some() && self.choices.create_library_shortcut && self.shortcuts.library_available() {
            if let Err(e) = self.shortcuts.create_library_shortcut(&entry) {
                error!("Could not create library shortcut: {}", e);
            }
        }
    }

    /// Stops any download, reverts, then releases the interpreter.
    fn cancel(&mut self, remove_game_files: bool) {
        let remove = remove_game_files && self.removable_target().is_some();
        let Some(interp) = self.interpreter.as_mut() else {
            return;
        };
        interp.stop_downloads();
        if let Err(e) = interp.revert(remove) {
            error!("Could not revert the installation: {}", e);
        }
        interp.cleanup();
    }
}

impl<F: InterpreterFactory, S: ShortcutCreator> Drop for InstallerWizard<F, S> {
    fn drop(&mut self) {
        if self.state == WizardState::Finished {
            if let Some(interp) = self.interpreter.as_mut() {
                interp.cleanup();
            }
        } else if !self.state.is_terminal() && self.interpreter.is_some() {
            warn!("Installer dropped while {}, cancelling", self.state);
            self.cancel(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use serde_json::json;

    use super::*;
    use crate::installer::interpreter::{Extra, ExtrasBySource, InstallerFile};
    use crate::options::Choice;

    type Calls = Rc<RefCell<Vec<String>>>;

    #[derive(Clone, Default)]
    struct Behaviour {
        no_folder: bool,
        extras: ExtrasBySource,
        files: Vec<InstallerFile>,
        files_ready: bool,
        deny_downloads: bool,
        dir_created: bool,
        fail_launch: bool,
    }

    struct MockInterpreter {
        calls: Calls,
        behaviour: Behaviour,
        events: EventSender,
        target: Option<PathBuf>,
        extras: Option<Vec<String>>,
        files: Vec<InstallerFile>,
    }

    impl MockInterpreter {
        fn record(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }
    }

    impl Interpreter for MockInterpreter {
        fn game_name(&self) -> &str {
            "Quake"
        }
        fn game_slug(&self) -> &str {
            "quake"
        }
        fn game_id(&self) -> Option<i64> {
            None
        }
        fn creates_game_folder(&self) -> bool {
            !self.behaviour.no_folder
        }
        fn default_target(&self) -> PathBuf {
            PathBuf::from("/games/quake")
        }
        fn target_path(&self) -> Option<&Path> {
            self.target.as_deref()
        }
        fn set_target_path(&mut self, path: PathBuf) {
            self.record(format!("target {}", path.display()));
            self.target = Some(path);
        }
        fn game_dir_created(&self) -> bool {
            self.behaviour.dir_created
        }
        fn script_source(&self) -> String {
            "{}".into()
        }
        fn launch_install(&mut self) -> Result<(), SetupError> {
            self.record("launch_install");
            if self.behaviour.fail_launch {
                return Err(SetupError::Scripting("runner linux is not installed".into()));
            }
            self.events.send(InterpreterEvent::RunnersInstalled).unwrap();
            Ok(())
        }
        fn extras(&self) -> Option<&[String]> {
            self.extras.as_deref()
        }
        fn set_extras(&mut self, ids: Vec<String>) {
            self.record(format!("extras {}", ids.join(",")));
            self.extras = Some(ids);
        }
        fn get_extras(&mut self) -> Result<ExtrasBySource, SetupError> {
            Ok(self.behaviour.extras.clone())
        }
        fn prepare_game_files(&mut self, patch_version: Option<&str>) -> Result<(), SetupError> {
            self.record(format!("prepare {:?}", patch_version));
            self.files = self.behaviour.files.clone();
            Ok(())
        }
        fn files(&self) -> &[InstallerFile] {
            &self.files
        }
        fn files_ready(&self) -> bool {
            self.behaviour.files_ready
        }
        fn start_downloads(&mut self) -> Result<(), SetupError> {
            self.record("start_downloads");
            if self.behaviour.deny_downloads {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only cache").into());
            }
            Ok(())
        }
        fn stop_downloads(&mut self) {
            self.record("stop_downloads");
        }
        fn set_game_files(&mut self, files: IndexMap<String, PathBuf>) {
            self.record(format!("game_files {}", files.len()));
        }
        fn launch_installer_commands(&mut self) -> Result<(), SetupError> {
            self.record("commands");
            Ok(())
        }
        fn answer_input(&mut self, alias: &str, value: &str) -> Result<(), SetupError> {
            self.record(format!("input {}={}", alias, value));
            Ok(())
        }
        fn disc_located(&mut self, requires: &str, path: Option<PathBuf>) -> Result<(), SetupError> {
            self.record(format!("disc {} {:?}", requires, path));
            Ok(())
        }
        fn revert(&mut self, remove_game_dir: bool) -> Result<(), SetupError> {
            self.record(format!("revert {}", remove_game_dir));
            Ok(())
        }
        fn cleanup(&mut self) {
            self.record("cleanup");
        }
    }

    struct MockFactory {
        calls: Calls,
        behaviour: Behaviour,
        missing: Option<String>,
    }

    impl InterpreterFactory for MockFactory {
        type Interpreter = MockInterpreter;

        fn create(&self, _script: &InstallerScript, events: EventSender) -> Result<MockInterpreter, SetupError> {
            if let Some(slug) = &self.missing {
                return Err(SetupError::MissingGameDependency(slug.clone()));
            }
            Ok(MockInterpreter {
                calls: self.calls.clone(),
                behaviour: self.behaviour.clone(),
                events,
                target: None,
                extras: None,
                files: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct MockShortcuts {
        created: RefCell<Vec<ShortcutTarget>>,
    }

    impl ShortcutCreator for MockShortcuts {
        fn create_launcher(&self, entry: &ShortcutEntry, target: ShortcutTarget) -> Result<PathBuf, SetupError> {
            self.created.borrow_mut().push(target);
            Ok(PathBuf::from(format!("{}-{}.desktop", entry.game_slug, entry.game_id)))
        }
        fn library_available(&self) -> bool {
            false
        }
        fn create_library_shortcut(&self, _entry: &ShortcutEntry) -> Result<(), SetupError> {
            Ok(())
        }
    }

    type Wizard = InstallerWizard<MockFactory, MockShortcuts>;

    fn scripts() -> Vec<Value> {
        vec![
            json!({"name": "Quake", "version": "GOG", "runner": "linux"}),
            json!({"name": "Quake", "version": "Steam", "runner": "linux"}),
        ]
    }

    fn wizard_with(behaviour: Behaviour, is_update: bool) -> (Wizard, Calls) {
        let calls = Calls::default();
        let factory = MockFactory {
            calls: calls.clone(),
            behaviour,
            missing: None,
        };
        let wizard = Wizard::from_json(scripts(), factory, MockShortcuts::default(), &Settings::default(), is_update)
            .unwrap();
        (wizard, calls)
    }

    fn file(id: &str) -> InstallerFile {
        InstallerFile {
            id: id.into(),
            url: format!("https://example.com/{}", id),
            filename: id.into(),
        }
    }

    fn calls(c: &Calls) -> Vec<String> {
        c.borrow().clone()
    }

    #[test]
    fn invalid_scripts_abort_construction() {
        let factory = MockFactory {
            calls: Calls::default(),
            behaviour: Behaviour::default(),
            missing: None,
        };
        let err = Wizard::from_json(
            vec![json!({"name": "Quake", "runner": "linux"})],
            factory,
            MockShortcuts::default(),
            &Settings::default(),
            false,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "Missing field \"version\" in install script");
    }

    #[test]
    fn plain_install_runs_to_finished() {
        let (mut w, c) = wizard_with(Behaviour::default(), false);
        assert_eq!(w.title(), "Install Quake");

        let t = w.on_event(WizardEvent::ScriptSelected("Steam".into())).unwrap();
        assert_eq!(t.to, WizardState::SelectDestination);
        assert_eq!(w.title(), "Installing Quake");
        assert_eq!(w.selected_script().unwrap().version, "Steam");
        assert_eq!(calls(&c), vec!["target /games/quake"]);

        w.on_event(WizardEvent::TargetChanged("/srv/quake".into())).unwrap();
        w.on_event(WizardEvent::ShortcutToggled(ShortcutKind::Menu, true)).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        assert_eq!(w.state(), &WizardState::InstallingRunners);

        let t = w.pump().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(w.state(), &WizardState::RunningCommands);

        w.on_event(WizardEvent::InstallFinished(Some(7))).unwrap();
        assert_eq!(w.state(), &WizardState::Finished);
        assert_eq!(w.game_id(), Some(7));
        assert_eq!(*w.shortcuts.created.borrow(), vec![ShortcutTarget::Menu]);
        assert_eq!(
            calls(&c),
            vec!["target /games/quake", "target /srv/quake", "launch_install", "prepare None", "commands"]
        );

        w.on_event(WizardEvent::Close).unwrap();
        assert_eq!(w.state(), &WizardState::Closed);
        assert_eq!(calls(&c).last().unwrap(), "cleanup");
    }

    #[test]
    fn script_without_folder_installs_immediately() {
        let behaviour = Behaviour {
            no_folder: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        let t = w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        assert_eq!(t.to, WizardState::InstallingRunners);
        assert_eq!(calls(&c), vec!["launch_install"]);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let (mut w, _) = wizard_with(Behaviour::default(), false);
        assert!(matches!(
            w.on_event(WizardEvent::ScriptSelected("Epic".into())),
            Err(SetupError::UnknownVersion(_))
        ));
        assert_eq!(w.state(), &WizardState::ChooseScript);
    }

    #[test]
    fn missing_dependency_stops_the_install() {
        let factory = MockFactory {
            calls: Calls::default(),
            behaviour: Behaviour::default(),
            missing: Some("quake".into()),
        };
        let mut w = Wizard::from_json(scripts(), factory, MockShortcuts::default(), &Settings::default(), false)
            .unwrap();
        let t = w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        assert_eq!(t.to, WizardState::DependencyRequired("quake".into()));
        assert!(w.on_event(WizardEvent::Close).is_ok());
    }

    #[test]
    fn extras_are_offered_once() {
        let mut extras = ExtrasBySource::new();
        extras.insert(
            "GOG".into(),
            vec![Extra {
                id: "manual".into(),
                name: "Manual".into(),
                total_size: None,
                kind: None,
            }],
        );
        let behaviour = Behaviour {
            extras,
            files: vec![file("setup")],
            files_ready: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, true);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();
        assert_eq!(w.state(), &WizardState::SelectExtras);

        w.on_event(WizardEvent::ExtraToggled(ExtraPath::Source(0))).unwrap();
        let t = w.on_event(WizardEvent::ExtrasConfirmed).unwrap();
        assert_eq!(t.to, WizardState::ReviewFiles);
        assert!(w.can_continue());
        assert!(calls(&c).contains(&"extras manual".to_string()));
        assert!(calls(&c).contains(&"prepare Some(\"GOG\")".to_string()));
    }

    #[test]
    fn files_are_downloaded_then_commands_run() {
        let behaviour = Behaviour {
            files: vec![file("setup")],
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();
        assert_eq!(w.state(), &WizardState::ReviewFiles);
        assert!(!w.can_continue());

        assert!(matches!(
            w.on_event(WizardEvent::FilesConfirmed),
            Err(SetupError::UnexpectedEvent { .. })
        ));
        w.on_event(WizardEvent::FilesReady(true)).unwrap();
        w.on_event(WizardEvent::FilesConfirmed).unwrap();
        assert_eq!(w.state(), &WizardState::Downloading);

        let mut files = IndexMap::new();
        files.insert("setup".to_string(), PathBuf::from("/cache/setup"));
        w.on_event(WizardEvent::FilesAvailable(files)).unwrap();
        assert_eq!(w.state(), &WizardState::RunningCommands);
        assert!(calls(&c).ends_with(&["start_downloads".to_string(), "game_files 1".to_string(), "commands".to_string()]));
    }

    #[test]
    fn permission_failure_keeps_continue_enabled() {
        let behaviour = Behaviour {
            files: vec![file("setup")],
            files_ready: true,
            deny_downloads: true,
            ..Behaviour::default()
        };
        let (mut w, _) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();

        let err = w.on_event(WizardEvent::FilesConfirmed).unwrap_err();
        assert_eq!(err.to_string(), "Unable to get files: read-only cache");
        assert_eq!(w.state(), &WizardState::ReviewFiles);
        assert!(w.can_continue());
    }

    #[test]
    fn cancel_after_permission_failure_stops_downloads() {
        let behaviour = Behaviour {
            files: vec![file("setup"), file("patch")],
            files_ready: true,
            deny_downloads: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();
        assert!(w.on_event(WizardEvent::FilesConfirmed).is_err());

        w.on_event(WizardEvent::Cancel { remove_game_files: false }).unwrap();
        assert_eq!(
            calls(&c),
            vec![
                "target /games/quake",
                "launch_install",
                "prepare None",
                "start_downloads",
                "stop_downloads",
                "revert false",
                "cleanup"
            ]
        );
    }

    #[test]
    fn failed_launch_leaves_selection_untouched() {
        let behaviour = Behaviour {
            no_folder: true,
            fail_launch: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        let err = w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap_err();
        assert_eq!(err.to_string(), "runner linux is not installed");
        assert_eq!(w.state(), &WizardState::ChooseScript);
        assert_eq!(w.title(), "Install Quake");
        assert!(w.selected_script().is_none());
        assert!(w.interpreter().is_none());
        assert_eq!(calls(&c), vec!["launch_install", "cleanup"]);
    }

    #[test]
    fn stale_notifications_are_dropped() {
        let behaviour = Behaviour {
            files: vec![file("setup")],
            files_ready: true,
            ..Behaviour::default()
        };
        let (mut w, _) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.pump().unwrap();
        w.on_event(WizardEvent::FilesConfirmed).unwrap();
        assert_eq!(w.state(), &WizardState::Downloading);

        w.sender.send(InterpreterEvent::FilesReady(true)).unwrap();
        w.sender.send(InterpreterEvent::Status("Downloading setup".into())).unwrap();
        let t = w.pump().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(w.state(), &WizardState::Downloading);
        assert_eq!(w.status(), "Downloading setup");

        w.sender.send(InterpreterEvent::RunnersInstalled).unwrap();
        assert_eq!(w.wait_for_interpreter(Duration::from_millis(10)).unwrap(), None);
        assert_eq!(w.state(), &WizardState::Downloading);
    }

    #[test]
    fn dropping_mid_install_cancels() {
        let behaviour = Behaviour {
            files: vec![file("setup")],
            files_ready: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();
        w.on_event(WizardEvent::FilesConfirmed).unwrap();
        assert_eq!(w.state(), &WizardState::Downloading);

        drop(w);
        assert!(calls(&c).ends_with(&[
            "start_downloads".to_string(),
            "stop_downloads".to_string(),
            "revert false".to_string(),
            "cleanup".to_string()
        ]));
    }

    #[test]
    fn dropping_after_cancel_or_finish_does_not_revert() {
        let (mut w, c) = wizard_with(Behaviour::default(), false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::Cancel { remove_game_files: false }).unwrap();
        let before = calls(&c);
        drop(w);
        assert_eq!(calls(&c), before);

        let (mut w, c) = wizard_with(Behaviour::default(), false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.pump().unwrap();
        w.on_event(WizardEvent::InstallFinished(Some(3))).unwrap();
        drop(w);
        assert_eq!(calls(&c).last().unwrap(), "cleanup");
        assert!(!calls(&c).iter().any(|call| call.starts_with("revert")));
    }

    #[test]
    fn input_and_disc_requests_round_trip() {
        let (mut w, c) = wizard_with(Behaviour::default(), false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();

        w.on_event(WizardEvent::InputRequested(InputRequest {
            alias: "lang".into(),
            options: vec![Choice::new("English", "en"), Choice::new("French", "fr")],
            preselect: Some("en".into()),
        }))
        .unwrap();
        assert_eq!(w.state(), &WizardState::AwaitingInput);
        assert!(w.on_event(WizardEvent::InputChosen(String::new())).is_err());
        w.on_event(WizardEvent::InputChosen("fr".into())).unwrap();
        assert_eq!(w.state(), &WizardState::RunningCommands);

        w.on_event(WizardEvent::DiscRequested(DiscRequest {
            message: "Insert disc 1".into(),
            requires: "setup.exe".into(),
        }))
        .unwrap();
        assert_eq!(w.state(), &WizardState::AwaitingDisc);
        w.on_event(WizardEvent::DiscLocated(None)).unwrap();
        assert_eq!(w.state(), &WizardState::RunningCommands);

        let c = calls(&c);
        assert!(c.contains(&"input lang=fr".to_string()));
        assert!(c.contains(&"disc setup.exe None".to_string()));
    }

    #[test]
    fn interpreter_error_requires_cancel() {
        let (mut w, c) = wizard_with(Behaviour::default(), false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::InstallError("wine crashed".into())).unwrap();
        assert_eq!(w.state(), &WizardState::Errored("wine crashed".into()));
        assert_eq!(w.status(), "wine crashed");

        assert!(matches!(w.on_event(WizardEvent::Close), Err(SetupError::InstallInProgress)));
        w.on_event(WizardEvent::Cancel { remove_game_files: true }).unwrap();
        assert_eq!(w.state(), &WizardState::Cancelled);
        // /games/quake does not exist, so nothing is removed.
        assert!(calls(&c).ends_with(&["revert false".to_string(), "cleanup".to_string()]));
    }

    #[test]
    fn cancel_while_downloading_stops_and_removes() {
        let games = tempfile::tempdir().unwrap();
        let target = games.path().join("quake");
        std::fs::create_dir(&target).unwrap();

        let behaviour = Behaviour {
            files: vec![file("setup")],
            files_ready: true,
            dir_created: true,
            ..Behaviour::default()
        };
        let (mut w, c) = wizard_with(behaviour, false);
        w.on_event(WizardEvent::ScriptSelected("GOG".into())).unwrap();
        w.on_event(WizardEvent::TargetChanged(target.display().to_string())).unwrap();
        w.on_event(WizardEvent::InstallClicked).unwrap();
        w.on_event(WizardEvent::RunnersInstalled).unwrap();
        w.on_event(WizardEvent::FilesConfirmed).unwrap();

        assert!(w.removable_target().is_some());
        assert!(w.game_dir_created());
        w.on_event(WizardEvent::Cancel { remove_game_files: true }).unwrap();
        assert!(calls(&c).ends_with(&[
            "stop_downloads".to_string(),
            "revert true".to_string(),
            "cleanup".to_string()
        ]));
    }

    #[test]
    fn events_out_of_order_leave_state_alone() {
        let (mut w, _) = wizard_with(Behaviour::default(), false);
        let err = w.on_event(WizardEvent::InstallClicked).unwrap_err();
        assert!(matches!(err, SetupError::UnexpectedEvent { ref event, .. } if event == "install-clicked"));
        assert_eq!(w.state(), &WizardState::ChooseScript);

        w.on_event(WizardEvent::Cancel { remove_game_files: false }).unwrap();
        assert!(w.on_event(WizardEvent::Cancel { remove_game_files: false }).is_err());
        w.on_event(WizardEvent::Close).unwrap();
        assert!(w.on_event(WizardEvent::Close).is_err());
    }

    #[test]
    fn wait_times_out_without_news() {
        let (mut w, _) = wizard_with(Behaviour::default(), false);
        assert_eq!(w.wait_for_interpreter(Duration::from_millis(10)).unwrap(), None);
    }
}
