use crate::options::Choice;

use super::Host;

// ── Data types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String, // HDMI-1
    pub primary: bool,
}

// ── xrandr parser ─────────────────────────────────────────────────────────────
//
// Output lines look like:   HDMI-1 connected primary 1920x1080+0+0 (normal …) 527mm x 296mm
// Mode lines look like:        1920x1080     60.00*+  50.00    59.94

/// Connected outputs, in xrandr order.
pub fn parse_outputs(xrandr: &str) -> Vec<Output> {
    xrandr
        .lines()
        .filter(|l| !l.starts_with(char::is_whitespace))
        .filter_map(|l| {
            let mut tokens = l.split_whitespace();
            let name = tokens.next()?;
            if tokens.next()? != "connected" {
                return None;
            }
            Some(Output {
                name: name.to_string(),
                primary: tokens.next() == Some("primary"),
            })
        })
        .collect()
}

/// Every advertised mode, deduplicated, widest first.
pub fn parse_resolutions(xrandr: &str) -> Vec<String> {
    let mut modes: Vec<(u32, u32)> = xrandr
        .lines()
        .filter(|l| l.starts_with("  "))
        .filter_map(|l| parse_mode(l.split_whitespace().next()?))
        .collect();

    modes.sort_unstable_by(|a, b| b.cmp(a));
    modes.dedup();
    modes
        .into_iter()
        .map(|(w, h)| format!("{}x{}", w, h))
        .collect()
}

fn parse_mode(token: &str) -> Option<(u32, u32)> {
    // Interlaced modes carry a suffix: 1920x1080i
    let token = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let (w, h) = token.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

// ── Choice builders ───────────────────────────────────────────────────────────

fn query(host: &Host) -> String {
    host.capture("xrandr", &["-q"], &[]).unwrap_or_default()
}

/// `Keep current` followed by every available resolution.
pub fn resolution_choices(host: &Host) -> Vec<Choice> {
    let mut choices = vec![Choice::new("Keep current", "off")];
    choices.extend(
        parse_resolutions(&query(host))
            .into_iter()
            .map(|r| Choice::new(r.clone(), r)),
    );
    choices
}

/// Outputs the game may keep enabled while the others are turned off.
pub fn output_choices(host: &Host) -> Vec<Choice> {
    let mut choices = vec![Choice::new("Off", "off"), Choice::new("Primary", "primary")];
    choices.extend(
        parse_outputs(&query(host))
            .into_iter()
            .map(|o| Choice::new(o.name.clone(), o.name)),
    );
    choices
}

/// Outputs by index, as SDL 1.2 expects in `SDL_VIDEO_FULLSCREEN`.
pub fn output_list(host: &Host) -> Vec<Choice> {
    let mut choices = vec![Choice::new("Off", "off")];
    choices.extend(
        parse_outputs(&query(host))
            .into_iter()
            .enumerate()
            .map(|(i, o)| Choice::new(o.name, i.to_string())),
    );
    choices
}
