//! Host sequence: report one platform, report one device, open a queue.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::error::ProbeError;
use crate::opencl::DeviceType;
use crate::report::{self, CapabilityReport, InfoSource};

/// The runtime operations the host sequence needs.
pub trait ComputeRuntime {
    type Platform: InfoSource;
    type Device: InfoSource;

    fn platforms(&self) -> Result<Vec<Self::Platform>, ProbeError>;

    fn devices(
        &self,
        platform: &Self::Platform,
        device_type: DeviceType,
    ) -> Result<Vec<Self::Device>, ProbeError>;

    /// Create a context bound to `device` and a command queue on it, then release both.
    fn open_queue(&self, device: &Self::Device) -> Result<(), ProbeError>;
}

#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    pub platform_index: usize,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub platform: CapabilityReport,
    pub device: CapabilityReport,
}

pub fn run<R, W>(
    runtime: &R,
    options: &ProbeOptions,
    out: &mut W,
) -> Result<ProbeReport, ProbeError>
where
    R: ComputeRuntime,
    W: Write + ?Sized,
{
    let platforms = runtime.platforms()?;
    let available = platforms.len();
    let platform = platforms
        .into_iter()
        .nth(options.platform_index)
        .ok_or(ProbeError::NoPlatform {
            index: options.platform_index,
            available,
        })?;
    info!(index = options.platform_index, available, "reporting platform");
    let platform_report = report::platform(&platform, out)?;

    let device = runtime
        .devices(&platform, options.device_type)?
        .into_iter()
        .next()
        .ok_or(ProbeError::NoDevice {
            device_type: options.device_type,
        })?;
    info!(device_type = %options.device_type, "reporting device");
    let device_report = report::device(&device, out)?;

    runtime.open_queue(&device)?;

    Ok(ProbeReport {
        platform: platform_report,
        device: device_report,
    })
}
