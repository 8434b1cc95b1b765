//! Host probing.
//!
//! Every probe here degrades: a missing executable, an unreadable
//! directory, a timeout or a failing command only shrinks the result.
//! Nothing in this module returns an error to its caller.

pub mod display;
pub mod gpu;
pub mod terminal;

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;

use crate::{cmd, config::Settings};

/// Directories scanned for Vulkan ICD loader manifests (`<dir>/icd.d/*.json`).
pub const VULKAN_DATA_DIRS: &[&str] = &[
    "/usr/local/etc/vulkan",
    "/usr/local/share/vulkan",
    "/etc/vulkan",
    "/usr/share/vulkan",
    "/usr/lib/x86_64-linux-gnu/GL/vulkan",
    "/usr/lib/i386-linux-gnu/GL/vulkan",
    "/opt/amdgpu-pro/etc/vulkan",
];

const GAMEMODE_LIB_DIRS: &[&str] = &[
    "/usr/lib",
    "/usr/lib64",
    "/usr/lib/x86_64-linux-gnu",
    "/usr/local/lib",
];

const NVIDIA_VERSION_FILE: &str = "/proc/driver/nvidia/version";

/// First NVIDIA driver branch that runs gamescope.
const NVIDIA_GAMESCOPE_MIN: u32 = 515;

// ── Probe context ─────────────────────────────────────────────────────────────

/// What the probes look at: where executables are searched, which
/// directories hold Vulkan manifests, and how long a probe command may run.
#[derive(Debug, Clone)]
pub struct Host {
    /// `None` means the process `$PATH`.
    pub search_path: Option<OsString>,
    pub vulkan_data_dirs: Vec<PathBuf>,
    pub timeout: Duration,
    pub wayland: bool,
    /// Forces the discrete-GPU preference; `None` asks `lspci`.
    pub prefer_dri_prime: Option<bool>,
    pub nvidia_version_file: PathBuf,
    /// Searched for `libgamemodeauto.so.0`.
    pub gamemode_lib_dirs: Vec<PathBuf>,
}

impl Host {
    /// Probes the machine we are running on, tuned by `settings`.
    pub fn detect(settings: &Settings) -> Self {
        Host {
            search_path: None,
            vulkan_data_dirs: settings.vulkan_data_dirs.clone(),
            timeout: Duration::from_secs(settings.probe_timeout_secs),
            wayland: session_is_wayland(),
            prefer_dri_prime: settings.prefer_dri_prime,
            nvidia_version_file: PathBuf::from(NVIDIA_VERSION_FILE),
            gamemode_lib_dirs: GAMEMODE_LIB_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    /// A host that finds nothing: empty search path, no Vulkan directories.
    /// Useful as a base for tests that add only what they need.
    pub fn isolated(search_dir: &Path) -> Self {
        Host {
            search_path: Some(search_dir.as_os_str().to_owned()),
            vulkan_data_dirs: Vec::new(),
            timeout: Duration::from_secs(2),
            wayland: false,
            prefer_dri_prime: Some(false),
            nvidia_version_file: search_dir.join("nvidia-version"),
            gamemode_lib_dirs: vec![search_dir.to_path_buf()],
        }
    }

    pub fn find_executable(&self, program: &str) -> Option<PathBuf> {
        cmd::find_executable(program, self.search_path.as_deref())
    }

    pub fn has_executable(&self, program: &str) -> bool {
        self.find_executable(program).is_some()
    }

    /// Runs a probe command; any failure is logged and yields `None`.
    pub fn capture(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Option<String> {
        let path = match self.find_executable(program) {
            Some(p) => p,
            None => {
                debug!("{} not found, skipping probe", program);
                return None;
            }
        };
        match cmd::capture_with_timeout(&path, args, envs, self.timeout) {
            Ok(out) => Some(out),
            Err(e) => {
                debug!("probe {} failed: {}", program, e);
                None
            }
        }
    }

    // ── Feature facts ─────────────────────────────────────────────────────────

    /// More than one graphics adapter: route games to the discrete one.
    pub fn use_dri_prime(&self) -> bool {
        if let Some(forced) = self.prefer_dri_prime {
            return forced;
        }
        self.capture("lspci", &[], &[])
            .map(|out| count_graphics_adapters(&out) > 1)
            .unwrap_or(false)
    }

    pub fn gamemode_available(&self) -> bool {
        self.has_executable("gamemoded")
            || self
                .gamemode_lib_dirs
                .iter()
                .any(|dir| dir.join("libgamemodeauto.so.0").exists())
    }

    /// Gamescope needs NVIDIA 515+; without an NVIDIA driver it is fine.
    pub fn nvidia_gamescope_support(&self) -> bool {
        match fs::read_to_string(&self.nvidia_version_file) {
            Ok(text) => nvidia_driver_major(&text).map_or(true, |v| v >= NVIDIA_GAMESCOPE_MIN),
            Err(_) => true,
        }
    }

    /// A screen saver can only be inhibited over a session bus.
    pub fn screen_saver_inhibitor(&self) -> bool {
        env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some_and(|v| !v.is_empty())
    }

    pub fn is_wayland(&self) -> bool {
        self.wayland
    }
}

fn session_is_wayland() -> bool {
    env::var_os("WAYLAND_DISPLAY").is_some()
        || env::var("XDG_SESSION_TYPE").is_ok_and(|t| t == "wayland")
}

/// Counts `VGA compatible controller` / `3D controller` lines of `lspci`.
pub fn count_graphics_adapters(lspci: &str) -> usize {
    lspci
        .lines()
        .filter(|l| l.contains("VGA compatible controller") || l.contains("3D controller"))
        .count()
}

/// Parses the major version out of `/proc/driver/nvidia/version`:
///
/// ```text
/// NVRM version: NVIDIA UNIX x86_64 Kernel Module  535.113.01  Tue Sep 12 19:41:24 UTC 2023
/// ```
pub fn nvidia_driver_major(text: &str) -> Option<u32> {
    let line = text.lines().find(|l| l.contains("Kernel Module"))?;
    let after = line.split("Kernel Module").nth(1)?;
    let version = after.split_whitespace().next()?;
    version.split('.').next()?.parse().ok()
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    /// Drops an executable shell script named `name` into `dir`.
    pub fn fake_executable(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
