//! accelprobe -- compute-accelerator capability reporter.
//!
//! Enumerates OpenCL platforms and devices, prints their capability fields,
//! and opens a context plus command queue on the selected device. On Linux it
//! also exposes a small helper for hardware performance counters.

pub mod config;
pub mod error;
pub mod opencl;
#[cfg(target_os = "linux")]
pub mod perf;
pub mod probe;
pub mod report;

pub use error::ProbeError;
