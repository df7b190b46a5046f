use std::panic::Location;

use thiserror::Error;

use crate::opencl::{DeviceType, Status};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(
        "OpenCL error in file {} line {}, error code {status} (querying {attribute})",
        .location.file(),
        .location.line()
    )]
    Query {
        attribute: &'static str,
        status: Status,
        location: &'static Location<'static>,
    },

    #[error(
        "OpenCL error in file {} line {}, error code {status} (creating {object})",
        .location.file(),
        .location.line()
    )]
    Create {
        object: &'static str,
        status: Status,
        location: &'static Location<'static>,
    },

    #[error("OpenCL runtime not found (tried: {tried})")]
    LibraryNotFound { tried: String },

    #[error("OpenCL runtime is missing entry point {name}")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("no OpenCL platform at index {index} ({available} available)")]
    NoPlatform { index: usize, available: usize },

    #[error("no device of type {device_type} found on the selected platform")]
    NoDevice { device_type: DeviceType },

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Status code behind an API failure, if this error came from one.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Query { status, .. } | Self::Create { status, .. } => Some(*status),
            _ => None,
        }
    }
}
