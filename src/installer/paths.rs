use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory.
pub fn expand_user(path: &str) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(h) => h,
        None => return PathBuf::from(path),
    };
    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Whether the installer may offer to delete `path` on cancel.
///
/// Never the filesystem root, the home directory or the default games
/// folder itself, and only something that exists.
pub fn is_removable(path: &Path, game_path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    let path = normalize(path);
    if path == Path::new("/") {
        return false;
    }
    if dirs::home_dir().is_some_and(|h| normalize(&h) == path) {
        return false;
    }
    normalize(game_path) != path
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
