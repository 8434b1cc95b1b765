use indexmap::IndexMap;
use log::debug;

use crate::config::Settings;

use super::{merge, OptionList, OptionOverride, OptionValue};

/// An execution backend and the system options it adjusts.
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    pub slug: String,
    pub human_name: String,
    pub system_options_override: Vec<OptionOverride>,
}

impl Runner {
    fn new(slug: &str, human_name: &str) -> Self {
        Runner {
            slug: slug.to_string(),
            human_name: human_name.to_string(),
            system_options_override: Vec::new(),
        }
    }

    fn overriding(mut self, ov: OptionOverride) -> Self {
        self.system_options_override.push(ov);
        self
    }
}

/// Runners known to this installation, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct RunnerRegistry {
    runners: IndexMap<String, Runner>,
}

impl RunnerRegistry {
    pub fn builtin() -> Self {
        let runners = [
            Runner::new("linux", "Linux"),
            Runner::new("wine", "Wine").overriding(
                OptionOverride::new("disable_runtime").with_default(OptionValue::Bool(true)),
            ),
            Runner::new("steam", "Steam"),
            Runner::new("dosbox", "DOSBox"),
            Runner::new("libretro", "Libretro"),
            Runner::new("scummvm", "ScummVM"),
            Runner::new("mame", "MAME"),
            Runner::new("mednafen", "Mednafen"),
            Runner::new("dolphin", "Dolphin"),
            Runner::new("pcsx2", "PCSX2"),
            Runner::new("ppsspp", "PPSSPP"),
            Runner::new("rpcs3", "RPCS3"),
            Runner::new("flatpak", "Flatpak"),
            Runner::new("web", "Web"),
        ];
        RunnerRegistry {
            runners: runners.into_iter().map(|r| (r.slug.clone(), r)).collect(),
        }
    }

    /// Built-in runners plus the `[runners.<slug>]` tables of the settings
    /// file. Configured overrides apply after a built-in runner's own.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::builtin();
        for (slug, cfg) in &settings.runners {
            let runner = registry
                .runners
                .entry(slug.clone())
                .or_insert_with(|| Runner::new(slug, slug));
            runner
                .system_options_override
                .extend(cfg.system_options_override.iter().cloned());
        }
        registry
    }

    pub fn get(&self, slug: &str) -> Option<&Runner> {
        self.runners.get(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.runners.keys().map(String::as_str)
    }
}

/// System options as seen by games using `slug`.
/// An unknown runner leaves the options untouched.
pub fn with_runner_overrides(base: &OptionList, registry: &RunnerRegistry, slug: &str) -> OptionList {
    match registry.get(slug) {
        None => {
            debug!("Unknown runner '{}', using plain system options", slug);
            base.clone()
        }
        Some(runner) if runner.system_options_override.is_empty() => base.clone(),
        Some(runner) => merge(base, &runner.system_options_override),
    }
}
