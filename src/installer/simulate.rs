//! A stand-in interpreter for `--dry-run`: it walks a script's stages and
//! reports them like the real one would, without downloading or running
//! anything.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;

use crate::{error::SetupError, options::Choice};

use super::{
    interpreter::{
        DiscRequest, EventSender, ExtrasBySource, InputRequest, InstallerFile, Interpreter, InterpreterEvent,
        InterpreterFactory,
    },
    script::InstallerScript,
};

const DISC_MESSAGE: &str = "Insert or mount game disc and click Autodetect or\n\
                            use Browse if the disc is mounted on a non standard location.";

pub struct SimulatedFactory {
    /// Slugs treated as installed when a script `requires` another game.
    pub installed_games: Vec<String>,
    /// Files are reported as available under `<cache_dir>/<slug>/`.
    pub cache_dir: PathBuf,
    /// Parent of the default installation folder.
    pub game_path: PathBuf,
}

impl InterpreterFactory for SimulatedFactory {
    type Interpreter = SimulatedInterpreter;

    fn create(&self, script: &InstallerScript, events: EventSender) -> Result<SimulatedInterpreter, SetupError> {
        if let Some(slug) = &script.requires {
            if !self.installed_games.contains(slug) {
                return Err(SetupError::MissingGameDependency(slug.clone()));
            }
        }
        let commands = script
            .raw
            .get("script")
            .and_then(|s| s.get("installer"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(SimulatedInterpreter {
            script: script.clone(),
            events,
            default_target: self.game_path.join(&script.game_slug),
            cache_dir: self.cache_dir.join(&script.game_slug),
            target: None,
            extras: None,
            files: Vec::new(),
            game_files: IndexMap::new(),
            commands,
            cursor: 0,
        })
    }
}

pub struct SimulatedInterpreter {
    script: InstallerScript,
    events: EventSender,
    default_target: PathBuf,
    cache_dir: PathBuf,
    target: Option<PathBuf>,
    extras: Option<Vec<String>>,
    files: Vec<InstallerFile>,
    game_files: IndexMap<String, PathBuf>,
    commands: Vec<Value>,
    cursor: usize,
}

impl SimulatedInterpreter {
    fn emit(&self, event: InterpreterEvent) {
        if self.events.send(event).is_err() {
            debug!("Installer went away, dropping notification");
        }
    }

    /// Steps through the script's commands until one needs the user.
    fn run_commands(&mut self) {
        while let Some(command) = self.commands.get(self.cursor).cloned() {
            self.cursor += 1;
            let Some((name, params)) = command.as_object().and_then(|o| o.iter().next()) else {
                continue;
            };
            match name.as_str() {
                "input_menu" => {
                    self.emit(InterpreterEvent::InputRequested(input_request(params)));
                    return;
                }
                "insert-disc" => {
                    let text = |key: &str| params.get(key).and_then(Value::as_str).map(str::to_string);
                    self.emit(InterpreterEvent::DiscRequested(DiscRequest {
                        message: text("message").unwrap_or_else(|| DISC_MESSAGE.to_string()),
                        requires: text("requires").unwrap_or_default(),
                    }));
                    return;
                }
                other => self.emit(InterpreterEvent::Status(format!("Simulating {}", other))),
            }
        }
        info!("Simulated install of {} finished", self.script.game_slug);
        self.emit(InterpreterEvent::InstallFinished { game_id: None });
    }
}

/// `{"id": "lang", "options": [{"en": "English"}], "preselect": "en"}`
fn input_request(params: &Value) -> InputRequest {
    let options = params
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|o| o.as_object()?.iter().next())
                .map(|(value, label)| Choice::new(label.as_str().unwrap_or(value), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    InputRequest {
        alias: params.get("id").and_then(Value::as_str).unwrap_or("input").to_string(),
        options,
        preselect: params.get("preselect").and_then(Value::as_str).map(str::to_string),
    }
}

impl Interpreter for SimulatedInterpreter {
    fn game_name(&self) -> &str {
        &self.script.name
    }

    fn game_slug(&self) -> &str {
        &self.script.game_slug
    }

    fn game_id(&self) -> Option<i64> {
        None
    }

    fn creates_game_folder(&self) -> bool {
        self.script.creates_game_folder
    }

    fn default_target(&self) -> PathBuf {
        self.default_target.clone()
    }

    fn target_path(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    fn set_target_path(&mut self, path: PathBuf) {
        self.target = Some(path);
    }

    fn game_dir_created(&self) -> bool {
        false
    }

    fn script_source(&self) -> String {
        self.script.source()
    }

    fn launch_install(&mut self) -> Result<(), SetupError> {
        self.emit(InterpreterEvent::Status(format!("Installing runner {}", self.script.runner)));
        self.emit(InterpreterEvent::RunnersInstalled);
        Ok(())
    }

    fn extras(&self) -> Option<&[String]> {
        self.extras.as_deref()
    }

    fn set_extras(&mut self, ids: Vec<String>) {
        self.extras = Some(ids);
    }

    fn get_extras(&mut self) -> Result<ExtrasBySource, SetupError> {
        Ok(self.script.extras.clone())
    }

    fn prepare_game_files(&mut self, patch_version: Option<&str>) -> Result<(), SetupError> {
        if let Some(version) = patch_version {
            debug!("Preparing {} as an update to {}", self.script.game_slug, version);
        }
        self.files = self.script.files.clone();
        Ok(())
    }

    fn files(&self) -> &[InstallerFile] {
        &self.files
    }

    fn files_ready(&self) -> bool {
        true
    }

    fn start_downloads(&mut self) -> Result<(), SetupError> {
        let files = self
            .files
            .iter()
            .map(|f| (f.id.clone(), self.cache_dir.join(&f.filename)))
            .collect();
        self.emit(InterpreterEvent::FilesAvailable(files));
        Ok(())
    }

    fn stop_downloads(&mut self) {
        debug!("Stopping simulated downloads");
    }

    fn set_game_files(&mut self, files: IndexMap<String, PathBuf>) {
        self.game_files = files;
    }

    fn launch_installer_commands(&mut self) -> Result<(), SetupError> {
        self.cursor = 0;
        self.run_commands();
        Ok(())
    }

    fn answer_input(&mut self, alias: &str, value: &str) -> Result<(), SetupError> {
        debug!("Input {} = {}", alias, value);
        self.run_commands();
        Ok(())
    }

    fn disc_located(&mut self, requires: &str, path: Option<PathBuf>) -> Result<(), SetupError> {
        match path {
            Some(p) => debug!("Looking for {} in {}", requires, p.display()),
            None => debug!("Autodetecting disc with {}", requires),
        }
        self.run_commands();
        Ok(())
    }

    fn revert(&mut self, remove_game_dir: bool) -> Result<(), SetupError> {
        info!("Reverting simulated install (remove game dir: {})", remove_game_dir);
        Ok(())
    }

    fn cleanup(&mut self) {
        self.game_files.clear();
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::installer::script::validate_scripts;

    fn factory() -> SimulatedFactory {
        SimulatedFactory {
            installed_games: vec!["quake".into()],
            cache_dir: PathBuf::from("/cache"),
            game_path: PathBuf::from("/games"),
        }
    }

    fn script(extra: Value) -> InstallerScript {
        let mut raw = json!({"name": "Quake", "version": "GOG", "runner": "linux"});
        if let (Some(obj), Value::Object(more)) = (raw.as_object_mut(), extra) {
            obj.extend(more);
        }
        validate_scripts(vec![raw]).unwrap().remove(0)
    }

    #[test]
    fn unmet_requirement_is_reported() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let s = script(json!({"requires": "doom"}));
        assert!(matches!(
            factory().create(&s, tx),
            Err(SetupError::MissingGameDependency(ref slug)) if slug == "doom"
        ));

        let (tx, _rx) = crossbeam_channel::unbounded();
        assert!(factory().create(&script(json!({"requires": "quake"})), tx).is_ok());
    }

    #[test]
    fn files_come_from_the_cache() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let s = script(json!({"script": {"files": [{"pak": "https://example.com/pak0.pak"}]}}));
        let mut interp = factory().create(&s, tx).unwrap();
        assert_eq!(interp.default_target(), PathBuf::from("/games/quake"));

        interp.prepare_game_files(None).unwrap();
        interp.start_downloads().unwrap();
        match rx.try_recv().unwrap() {
            InterpreterEvent::FilesAvailable(files) => {
                assert_eq!(files["pak"], PathBuf::from("/cache/quake/pak0.pak"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn commands_pause_on_input_and_disc() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let s = script(json!({"script": {"installer": [
            {"input_menu": {"id": "lang", "options": [{"en": "English"}, {"fr": "French"}], "preselect": "en"}},
            {"extract": {"file": "pak"}},
            {"insert-disc": {"requires": "setup.exe"}},
        ]}}));
        let mut interp = factory().create(&s, tx).unwrap();

        interp.launch_installer_commands().unwrap();
        match rx.try_recv().unwrap() {
            InterpreterEvent::InputRequested(req) => {
                assert_eq!(req.alias, "lang");
                assert_eq!(req.options[1], Choice::new("French", "fr"));
                assert_eq!(req.preselect.as_deref(), Some("en"));
            }
            other => panic!("unexpected {:?}", other),
        }

        interp.answer_input("lang", "fr").unwrap();
        assert_eq!(rx.try_recv().unwrap(), InterpreterEvent::Status("Simulating extract".into()));
        assert!(matches!(rx.try_recv().unwrap(), InterpreterEvent::DiscRequested(ref d) if d.requires == "setup.exe"));

        interp.disc_located("setup.exe", None).unwrap();
        assert_eq!(rx.try_recv().unwrap(), InterpreterEvent::InstallFinished { game_id: None });
        assert!(rx.try_recv().is_err());
    }
}
