use std::{fs, path::PathBuf};

use log::debug;

use crate::options::Choice;

use super::Host;

pub const NO_LOADER_LABEL: &str = "Auto: WARNING -- No Vulkan Loader detected!";

// ── Data types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuVendor {
    Intel,
    Amd,
    Nvidia,
}

/// ICD manifests found on disk, bucketed by driver family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcdLoaders {
    pub intel: Vec<PathBuf>,
    pub radv: Vec<PathBuf>,
    pub nvidia: Vec<PathBuf>,
    pub amdvlk: Vec<PathBuf>,
    pub amdvlk_pro: Vec<PathBuf>,
}

impl IcdLoaders {
    /// Files a loader should try, in the `VK_ICD_FILENAMES` format.
    fn joined(files: &[PathBuf]) -> String {
        files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }

    fn add(&mut self, path: PathBuf) {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_ascii_lowercase(),
            None => return,
        };
        if name.contains("intel") {
            self.intel.push(path);
        } else if name.contains("radeon") {
            self.radv.push(path);
        } else if name.contains("nvidia") {
            self.nvidia.push(path);
        } else if name.contains("amd") {
            if name.contains("pro") {
                self.amdvlk_pro.push(path);
            } else {
                self.amdvlk.push(path);
            }
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Scans `<dir>/icd.d/*.json` under every configured Vulkan data directory.
pub fn discover_icd_loaders(host: &Host) -> IcdLoaders {
    let mut loaders = IcdLoaders::default();
    for dir in &host.vulkan_data_dirs {
        let icd_dir = dir.join("icd.d");
        let entries = match fs::read_dir(&icd_dir) {
            Ok(e) => e,
            Err(_) => continue,
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        for file in files {
            loaders.add(file);
        }
    }
    loaders
}

/// Picks the vendor out of `glxinfo` output. Only the OpenGL vendor line
/// is considered.
pub fn parse_gl_vendor(glxinfo: &str) -> Option<GpuVendor> {
    let line = glxinfo.lines().find(|l| {
        let lower = l.to_ascii_lowercase();
        lower.contains("opengl") && lower.contains("vendor")
    })?;
    if line.contains("Intel") {
        Some(GpuVendor::Intel)
    } else if line.contains("AMD") {
        Some(GpuVendor::Amd)
    } else if line.contains("NVIDIA") {
        Some(GpuVendor::Nvidia)
    } else {
        None
    }
}

/// Asks `glxinfo` which vendor renders by default.
///
/// With NVIDIA loaders installed the NVIDIA GLX vendor library is forced;
/// otherwise discrete graphics are selected when that is preferred.
pub fn detect_gl_vendor(host: &Host, has_nvidia_loader: bool) -> Option<GpuVendor> {
    let envs: &[(&str, &str)] = if has_nvidia_loader {
        &[("__GLX_VENDOR_LIBRARY_NAME", "nvidia")]
    } else if host.use_dri_prime() {
        &[("DRI_PRIME", "1")]
    } else {
        &[]
    };
    let out = host.capture("glxinfo", &[], envs)?;
    let vendor = parse_gl_vendor(&out);
    debug!("OpenGL vendor detected: {:?}", vendor);
    vendor
}

// ── Choice builders ───────────────────────────────────────────────────────────

/// Vulkan loader choices: the auto entry first, then every driver family
/// that has at least one manifest.
pub fn vk_icd_choices(host: &Host) -> Vec<Choice> {
    let loaders = discover_icd_loaders(host);
    let intel = IcdLoaders::joined(&loaders.intel);
    let radv = IcdLoaders::joined(&loaders.radv);
    let nvidia = IcdLoaders::joined(&loaders.nvidia);
    let amdvlk = IcdLoaders::joined(&loaders.amdvlk);
    let amdvlk_pro = IcdLoaders::joined(&loaders.amdvlk_pro);

    let auto = match detect_gl_vendor(host, !nvidia.is_empty()) {
        Some(GpuVendor::Intel) => Choice::new("Auto: Intel Open Source (MESA: ANV)", intel.clone()),
        Some(GpuVendor::Amd) => Choice::new("Auto: AMD RADV Open Source (MESA: RADV)", radv.clone()),
        Some(GpuVendor::Nvidia) => Choice::new("Auto: Nvidia Proprietary", nvidia.clone()),
        None => Choice::new(NO_LOADER_LABEL, ""),
    };

    let mut choices = vec![auto];
    if !intel.is_empty() {
        choices.push(Choice::new("Intel Open Source (MESA: ANV)", intel));
    }
    if !radv.is_empty() {
        choices.push(Choice::new("AMD RADV Open Source (MESA: RADV)", radv));
    }
    if !nvidia.is_empty() {
        choices.push(Choice::new("Nvidia Proprietary", nvidia));
    }
    if !amdvlk.is_empty() {
        let label = if amdvlk_pro.is_empty() {
            "AMDVLK/AMDGPU-PRO Proprietary"
        } else {
            "AMDVLK Open source"
        };
        choices.push(Choice::new(label, amdvlk));
    }
    if !amdvlk_pro.is_empty() {
        choices.push(Choice::new("AMDGPU-PRO Proprietary", amdvlk_pro));
    }
    choices
}

/// Optimus launchers (bumblebee / primus) that are installed.
pub fn optimus_choices(host: &Host) -> Vec<Choice> {
    let mut choices = vec![Choice::new("Off", "off")];
    if host.has_executable("primusrun") {
        choices.push(Choice::new("primusrun", "primusrun"));
    }
    if host.has_executable("optirun") {
        choices.push(Choice::new("optirun/virtualgl", "optirun"));
    }
    if host.has_executable("pvkrun") {
        choices.push(Choice::new("primus vk", "pvkrun"));
    }
    choices
}
