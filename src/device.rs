//! Compute device detection

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Files that only exist when an NVIDIA driver is loaded
const NVIDIA_MARKERS: &[&str] = &["/proc/driver/nvidia/version", "/dev/nvidia0"];

/// Compute device available for local inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Metal,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Metal => write!(f, "metal"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// Requested device from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cpu,
    Cuda,
    Metal,
}

impl FromStr for DevicePreference {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            _ => Err(Error::Config(format!(
                "Unknown device '{}'; expected auto, cpu, cuda or metal",
                value
            ))),
        }
    }
}

/// What the host offers
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCapabilities {
    pub cuda: bool,
    pub metal: bool,
}

impl HostCapabilities {
    /// Probe the running host
    pub fn probe() -> Self {
        Self::probe_with(|path| path.exists())
    }

    /// Probe using a custom existence check
    pub fn probe_with(exists: impl Fn(&Path) -> bool) -> Self {
        let cuda = NVIDIA_MARKERS.iter().any(|marker| exists(Path::new(marker)));
        let metal = cfg!(all(target_os = "macos", target_arch = "aarch64"));
        Self { cuda, metal }
    }
}

impl Device {
    /// Pick the best device for the host, honoring the preference when possible
    pub fn detect(preference: DevicePreference) -> Self {
        Self::select(preference, HostCapabilities::probe())
    }

    /// Selection logic, separated from host probing
    pub fn select(preference: DevicePreference, host: HostCapabilities) -> Self {
        let device = match preference {
            DevicePreference::Cpu => Device::Cpu,
            DevicePreference::Cuda if host.cuda => Device::Cuda,
            DevicePreference::Metal if host.metal => Device::Metal,
            DevicePreference::Cuda | DevicePreference::Metal => {
                debug!("Requested device {:?} not available, falling back to cpu", preference);
                Device::Cpu
            }
            DevicePreference::Auto if host.cuda => Device::Cuda,
            DevicePreference::Auto if host.metal => Device::Metal,
            DevicePreference::Auto => Device::Cpu,
        };
        debug!("Selected device {}", device);
        device
    }

    /// Whether this is an accelerator rather than the general-purpose CPU
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }
}
