use std::{fs, path::PathBuf};

use log::{info, warn};

use crate::error::SetupError;

/// Identifies the game a shortcut starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub game_id: i64,
    pub game_slug: String,
    pub game_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutTarget {
    Desktop,
    Menu,
}

/// Creates launchers for an installed game.
pub trait ShortcutCreator {
    fn create_launcher(&self, entry: &ShortcutEntry, target: ShortcutTarget) -> Result<PathBuf, SetupError>;

    /// Whether a platform game library (e.g. Steam) can take a shortcut.
    fn library_available(&self) -> bool;

    fn create_library_shortcut(&self, entry: &ShortcutEntry) -> Result<(), SetupError>;
}

/// freedesktop.org `.desktop` launchers.
#[derive(Debug, Clone)]
pub struct XdgShortcuts {
    pub desktop_dir: PathBuf,
    pub menu_dir: PathBuf,
    /// `Exec=` template; `{game_id}` is substituted.
    pub exec: String,
}

impl XdgShortcuts {
    /// Uses the XDG desktop directory and `<data dir>/applications`.
    pub fn new(exec: &str) -> Result<Self, SetupError> {
        Self::locate(dirs::home_dir(), dirs::desktop_dir(), dirs::data_dir(), exec)
    }

    fn locate(
        home: Option<PathBuf>,
        desktop: Option<PathBuf>,
        data: Option<PathBuf>,
        exec: &str,
    ) -> Result<Self, SetupError> {
        let home = home.ok_or(SetupError::NoHomeDirectory)?;
        Ok(XdgShortcuts {
            desktop_dir: desktop.unwrap_or_else(|| home.join("Desktop")),
            menu_dir: data
                .unwrap_or_else(|| home.join(".local").join("share"))
                .join("applications"),
            exec: exec.to_string(),
        })
    }

    pub fn file_name(entry: &ShortcutEntry) -> String {
        format!("{}-{}.desktop", entry.game_slug, entry.game_id)
    }

    pub fn desktop_entry(&self, entry: &ShortcutEntry) -> String {
        let exec = self.exec.replace("{game_id}", &entry.game_id.to_string());
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={}\n\
             Icon=lutris_{}\n\
             Exec={}\n\
             Categories=Game\n",
            entry.game_name, entry.game_slug, exec
        )
    }
}

impl ShortcutCreator for XdgShortcuts {
    fn create_launcher(&self, entry: &ShortcutEntry, target: ShortcutTarget) -> Result<PathBuf, SetupError> {
        let dir = match target {
            ShortcutTarget::Desktop => &self.desktop_dir,
            ShortcutTarget::Menu => &self.menu_dir,
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(entry));
        fs::write(&path, self.desktop_entry(entry))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        info!("Created {:?} launcher {}", target, path.display());
        Ok(path)
    }

    fn library_available(&self) -> bool {
        false
    }

    fn create_library_shortcut(&self, entry: &ShortcutEntry) -> Result<(), SetupError> {
        warn!("No game library to add {} to", entry.game_slug);
        Ok(())
    }
}
