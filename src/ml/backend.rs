// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on an Autodiff backend so gradients can flow;
// validation and scoring run on the matching inner backend with
// no autodiff overhead (model.valid()).
//
//   wgpu → Autodiff<Wgpu>     GPU through WebGPU (default)
//   cpu  → Autodiff<NdArray>  portable CPU fallback
//
// Use cases match on DeviceKind once and call a generic function
// with the concrete backend, so the rest of the code stays generic.

use std::{fmt, str::FromStr};

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};

pub type WgpuTrainBackend = Autodiff<Wgpu>;
pub type CpuTrainBackend  = Autodiff<NdArray>;

pub type WgpuInferBackend = Wgpu;
pub type CpuInferBackend  = NdArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Wgpu,
    Cpu,
}

impl DeviceKind {
    pub fn wgpu_device() -> WgpuDevice {
        WgpuDevice::default()
    }

    pub fn cpu_device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            "cpu" | "ndarray" => Ok(Self::Cpu),
            other => Err(format!("unknown device '{other}' (expected 'wgpu' or 'cpu')")),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wgpu => write!(f, "wgpu"),
            Self::Cpu  => write!(f, "cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("CPU".parse::<DeviceKind>(), Ok(DeviceKind::Cpu));
        assert_eq!("wgpu".parse::<DeviceKind>(), Ok(DeviceKind::Wgpu));
        assert!("tpu".parse::<DeviceKind>().is_err());
        assert_eq!(DeviceKind::Cpu.to_string(), "cpu");
    }
}
