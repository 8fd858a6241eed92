//! Compute device and precision selection.

use std::fmt;
use std::str::FromStr;

/// Compute devices a model can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Dedicated accelerator (discrete GPU).
    Cuda,
    /// Unified-memory accelerator (Apple silicon).
    Metal,
    /// General-purpose processor fallback.
    Cpu,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Metal => "metal",
            Self::Cpu => "cpu",
        }
    }
}

impl FromStr for Device {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cuda" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            "cpu" => Ok(Self::Cpu),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight precision paired with the selected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Bf16,
    F32,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bf16 => "bf16",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the device/precision pair for a load from the probed capabilities.
///
/// Preference order: cuda, then metal, then cpu. Accelerators run bf16;
/// f16's narrower exponent range overflows on these models, while bf16
/// keeps the f32 exponent at half the width. The CPU path stays f32.
pub fn select_device(available: &[Device]) -> (Device, Precision) {
    if available.contains(&Device::Cuda) {
        (Device::Cuda, Precision::Bf16)
    } else if available.contains(&Device::Metal) {
        (Device::Metal, Precision::Bf16)
    } else {
        (Device::Cpu, Precision::F32)
    }
}
