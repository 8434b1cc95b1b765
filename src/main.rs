mod cli;
mod steps;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use log::{debug, LevelFilter};

use gamesetup::{
    config::Settings,
    error::SetupError,
    installer::{
        load_scripts,
        paths::expand_user,
        shortcuts::{ShortcutEntry, ShortcutTarget},
        InstallerWizard, ShortcutCreator, SimulatedFactory, XdgShortcuts,
    },
    options::{runner::with_runner_overrides, runner::RunnerRegistry, system::system_options, OptionList},
    probe::Host,
    ui,
};

use cli::{Args, Cmd};

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(args) {
        println!();
        ui::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), SetupError> {
    let settings = Settings::load(args.config.as_deref())?;

    match args.sub {
        Cmd::Options { runner, all, json } => list_options(&settings, runner.as_deref(), all, json),
        Cmd::Choices { option, runner } => list_choices(&settings, &option, runner.as_deref()),
        Cmd::Install { script, update } => install(&settings, script, update, args.dry_run),
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

fn runner_options(settings: &Settings, runner: Option<&str>) -> Result<OptionList, SetupError> {
    let host = Arc::new(Host::detect(settings));
    let base = system_options(host, settings)?;
    Ok(match runner {
        Some(slug) => with_runner_overrides(&base, &RunnerRegistry::from_settings(settings), slug),
        None => base,
    })
}

fn list_options(settings: &Settings, runner: Option<&str>, all: bool, json: bool) -> Result<(), SetupError> {
    let list = runner_options(settings, runner)?;
    let shown: Vec<_> = list
        .iter()
        .filter(|d| all || (d.is_available() && !d.advanced))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let rows: Vec<(String, String)> = shown
        .iter()
        .map(|d| {
            let value = match &d.default {
                Some(default) => format!("{} = {}", d.label, default.display()),
                None => d.label.clone(),
            };
            (d.option.clone(), value)
        })
        .collect();
    let rows: Vec<(&str, &str)> = rows.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let title = match runner {
        Some(slug) => format!("System options ({})", slug),
        None => "System options".to_string(),
    };
    ui::print_kv_box(&title, &rows);
    Ok(())
}

fn list_choices(settings: &Settings, option: &str, runner: Option<&str>) -> Result<(), SetupError> {
    let list = runner_options(settings, runner)?;
    let desc = list
        .get(option)
        .ok_or_else(|| SetupError::UnknownOption(option.to_string()))?;

    let choices = desc.resolve_choices();
    if choices.is_empty() {
        ui::print_info(&format!("'{}' has no choices", option));
        return Ok(());
    }
    let rows: Vec<(&str, &str)> = choices
        .iter()
        .map(|c| (c.label.as_str(), c.value.as_str()))
        .collect();
    ui::print_kv_box(&desc.label, &rows);
    Ok(())
}

// ── Installer ─────────────────────────────────────────────────────────────────

fn install(settings: &Settings, script: PathBuf, update: bool, dry_run: bool) -> Result<(), SetupError> {
    if !dry_run {
        return Err(SetupError::InterpreterUnavailable);
    }
    ui::print_warning("DRY-RUN MODE: nothing is downloaded, run or written.");

    let scripts = load_scripts(&script)?;
    let factory = SimulatedFactory {
        installed_games: settings.installed_games.clone(),
        cache_dir: dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("gamesetup"),
        game_path: expand_user(&settings.game_path),
    };
    let shortcuts = DryRunShortcuts(XdgShortcuts::new(&settings.shortcut_exec)?);

    let mut wizard = InstallerWizard::new(scripts, factory, shortcuts, settings, update)?;
    steps::run(&mut wizard)
}

/// Reports the launchers it would write.
struct DryRunShortcuts(XdgShortcuts);

impl ShortcutCreator for DryRunShortcuts {
    fn create_launcher(&self, entry: &ShortcutEntry, target: ShortcutTarget) -> Result<PathBuf, SetupError> {
        let dir = match target {
            ShortcutTarget::Desktop => &self.0.desktop_dir,
            ShortcutTarget::Menu => &self.0.menu_dir,
        };
        let path = dir.join(XdgShortcuts::file_name(entry));
        debug!("Launcher contents:\n{}", self.0.desktop_entry(entry));
        ui::print_info(&format!("Would create {}", path.display()));
        Ok(path)
    }

    fn library_available(&self) -> bool {
        self.0.library_available()
    }

    fn create_library_shortcut(&self, entry: &ShortcutEntry) -> Result<(), SetupError> {
        self.0.create_library_shortcut(entry)
    }
}
