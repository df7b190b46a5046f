//! OpenCL status codes and their diagnostic names.

use std::fmt;
use std::panic::Location;

use super::cl_int;
use crate::error::ProbeError;

/// Name reported for any status code outside the known set.
pub const UNKNOWN_ERROR: &str = "UNKNOWN ERROR CODE";

macro_rules! status_codes {
    ($($name:ident = $code:expr),+ $(,)?) => {
        $(pub const $name: cl_int = $code;)+

        /// Every status code with a stable diagnostic name.
        pub const KNOWN_CODES: &[cl_int] = &[$($name),+];

        /// Translate a status code to its constant name.
        ///
        /// Total over `cl_int`: codes outside [`KNOWN_CODES`] map to
        /// [`UNKNOWN_ERROR`].
        pub const fn error_to_str(code: cl_int) -> &'static str {
            match code {
                $($name => stringify!($name),)+
                _ => UNKNOWN_ERROR,
            }
        }
    };
}

status_codes! {
    CL_SUCCESS = 0,
    CL_DEVICE_NOT_FOUND = -1,
    CL_DEVICE_NOT_AVAILABLE = -2,
    CL_INVALID_VALUE = -30,
    CL_OUT_OF_HOST_MEMORY = -6,
    CL_INVALID_PLATFORM = -32,
    CL_INVALID_PROPERTY = -64,
    CL_INVALID_DEVICE = -33,
    CL_INVALID_OPERATION = -59,
    CL_INVALID_PROGRAM = -44,
    CL_INVALID_PROGRAM_EXECUTABLE = -45,
    CL_INVALID_KERNEL_NAME = -46,
    CL_INVALID_KERNEL_DEFINITION = -47,
    CL_INVALID_CONTEXT = -34,
    CL_INVALID_QUEUE_PROPERTIES = -35,
    CL_OUT_OF_RESOURCES = -5,
    CL_INVALID_BUFFER_SIZE = -61,
    CL_INVALID_HOST_PTR = -37,
    CL_MEM_OBJECT_ALLOCATION_FAILURE = -4,
    CL_INVALID_DEVICE_TYPE = -31,
    CL_INVALID_COMMAND_QUEUE = -36,
    CL_INVALID_MEM_OBJECT = -38,
    CL_INVALID_EVENT_WAIT_LIST = -57,
    CL_MISALIGNED_SUB_BUFFER_OFFSET = -13,
    CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST = -14,
}

/// Raw status returned by an OpenCL entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub cl_int);

impl Status {
    pub const SUCCESS: Self = Self(CL_SUCCESS);

    pub const fn is_success(self) -> bool {
        self.0 == CL_SUCCESS
    }

    pub const fn code(self) -> cl_int {
        self.0
    }

    pub const fn name(self) -> &'static str {
        error_to_str(self.0)
    }

    pub fn check(self) -> Result<(), Self> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Check the status of an attribute query, recording the caller's location.
    #[track_caller]
    pub fn check_query(self, attribute: &'static str) -> Result<(), ProbeError> {
        let location = Location::caller();
        self.check().map_err(|status| ProbeError::Query {
            attribute,
            status,
            location,
        })
    }

    /// Check the status of an object creation, recording the caller's location.
    #[track_caller]
    pub fn check_create(self, object: &'static str) -> Result<(), ProbeError> {
        let location = Location::caller();
        self.check().map_err(|status| ProbeError::Create {
            object,
            status,
            location,
        })
    }
}

impl From<cl_int> for Status {
    fn from(code: cl_int) -> Self {
        Self(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
