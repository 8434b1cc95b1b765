use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn term_width() -> usize {
    Term::stdout().size().1.max(60) as usize
}

fn rule() -> String {
    style("─".repeat(term_width().min(60))).dim().to_string()
}

// ── Banner ────────────────────────────────────────────────────────────────────

pub fn print_banner(title: &str) {
    println!();
    println!("  {}", style(title).cyan().bold());
    println!(
        "  {}",
        style(format!("gamesetup  ·  v{}", env!("CARGO_PKG_VERSION")))
            .dim()
            .italic()
    );
    println!("{}", rule());
}

// ── Step header ───────────────────────────────────────────────────────────────

/// Prints a numbered header for one installer screen.
pub fn print_step(step: usize, title: &str) {
    println!();
    let tag = style(format!(" {} ", step)).black().on_cyan().bold();
    let heading = style(format!("  {}", title)).white().bold();
    println!("{}{}", tag, heading);
    println!("{}", rule());
}

// ── Feedback messages ─────────────────────────────────────────────────────────

/// Green ✓: operation completed successfully.
pub fn print_success(msg: &str) {
    println!("  {}  {}", style("✓").green().bold(), style(msg).green());
}

/// Blue →: neutral info / progress note.
pub fn print_info(msg: &str) {
    println!("  {}  {}", style("→").blue().bold(), msg);
}

/// Yellow ⚠ : non-fatal notice.
pub fn print_warning(msg: &str) {
    println!("  {}  {}", style("⚠").yellow().bold(), style(msg).yellow());
}

/// Red ✗: error (written to stderr).
pub fn print_error(msg: &str) {
    eprintln!("  {}  {}", style("✗").red().bold(), style(msg).red());
}

// ── Info box ──────────────────────────────────────────────────────────────────

/// Renders a bordered key→value box, keys padded to the longest one.
///
/// ```text
/// ┌─ Files ───────────────────────────────┐
/// │  setup      setup_quake.exe           │
/// │  patch      quake_patch_1.1.zip       │
/// └───────────────────────────────────────┘
/// ```
pub fn print_kv_box(title: &str, rows: &[(&str, &str)]) {
    const BOX_INNER: usize = 38;

    let key_width = rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        .max(11)
        + 2;

    let dashes = "─".repeat(BOX_INNER.saturating_sub(title.chars().count() + 2));
    println!(
        "  ┌─ {} {}┐",
        style(title).white().bold(),
        style(&dashes).dim()
    );

    for (key, val) in rows {
        println!(
            "  │  {}{}",
            style(format!("{:<width$}", key, width = key_width)).dim(),
            style(*val).white().bold()
        );
    }

    println!("  └{}┘", style("─".repeat(BOX_INNER + 2)).dim());
}

// ── Spinner ───────────────────────────────────────────────────────────────────

/// Returns a running braille spinner; call `pb.finish_and_clear()` when done.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("  {spinner:.cyan.bold}  {msg}") {
        pb.set_style(spinner_style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

