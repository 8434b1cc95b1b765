use crate::options::Choice;

use super::Host;

/// Terminal emulators tried for text-mode games, in preference order.
pub const TERMINAL_CANDIDATES: &[&str] = &[
    "xterm",
    "gnome-terminal",
    "konsole",
    "xfce4-terminal",
    "pantheon-terminal",
    "terminator",
    "mate-terminal",
    "urxvt",
    "cool-retro-term",
    "Eterm",
    "guake",
    "lilyterm",
    "lxterminal",
    "roxterm",
    "rxvt",
    "aterm",
    "sakura",
    "st",
    "terminology",
    "termite",
    "tilix",
    "wterm",
    "kitty",
    "yakuake",
    "qterminal",
    "alacritty",
];

/// Installed terminal emulators.
pub fn terminal_apps(host: &Host) -> Vec<String> {
    TERMINAL_CANDIDATES
        .iter()
        .filter(|t| host.has_executable(t))
        .map(|t| t.to_string())
        .collect()
}

pub fn terminal_choices(host: &Host) -> Vec<Choice> {
    terminal_apps(host)
        .into_iter()
        .map(|t| Choice::new(t.clone(), t))
        .collect()
}

/// The first installed candidate, if any.
pub fn default_terminal(host: &Host) -> Option<String> {
    let found = terminal_apps(host).into_iter().next();
    if found.is_none() {
        log::warn!("Couldn't find a terminal emulator");
    }
    found
}
