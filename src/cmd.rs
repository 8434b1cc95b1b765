use std::{
    ffi::OsStr,
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::debug;

use crate::error::SetupError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// ── Internal helpers ──────────────────────────────────────────────────────────

fn not_found_or_io(program: &str, err: io::Error) -> SetupError {
    if err.kind() == io::ErrorKind::NotFound {
        SetupError::CommandNotFound(program.to_string())
    } else {
        SetupError::Io(err)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Resolves `program` to an executable path.
///
/// With `search_path` set, only those directories are searched (same
/// syntax as `$PATH`); otherwise the process `$PATH` is used.
pub fn find_executable(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let found = match search_path {
        Some(paths) => which::which_in(program, Some(paths), Path::new("/")),
        None => which::which(program),
    };
    found.ok()
}

/// Runs a command with extra environment variables and captures its stdout.
///
/// The child is killed once `timeout` elapses. A non-zero exit status is
/// not an error: whatever the program printed is returned.
pub fn capture_with_timeout(
    program: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
    timeout: Duration,
) -> Result<String, SetupError> {
    let name = program.display().to_string();
    let mut child = Command::new(program)
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| not_found_or_io(&name, e))?;

    // Drain stdout on a separate thread so a chatty child never blocks
    // on a full pipe while we poll for its exit.
    let mut stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(ref mut out) = stdout {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SetupError::Timeout(name, timeout.as_secs()));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let bytes = reader.join().unwrap_or_default();
    if !status.success() {
        debug!("{} exited with {:?}; keeping its output", name, status.code());
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
