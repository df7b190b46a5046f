//! Attribute queries against platform and device handles.

use std::panic::Location;

use crate::error::ProbeError;
use crate::opencl::{cl_uint, Status};

/// Anything that answers `clGet*Info`-style attribute queries.
///
/// `raw_info` mirrors the C entry points: when `value` is `None` it only
/// reports the byte size of the attribute; otherwise it fills `value` and
/// returns the size that was written.
pub trait InfoSource {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status>;
}

impl<T: InfoSource + ?Sized> InfoSource for &T {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status> {
        (**self).raw_info(param, value)
    }
}

/// Fetch a variable-length attribute: discover its size, allocate, fetch.
///
/// The buffer belongs to the caller once returned; on failure it is dropped
/// before the error propagates.
#[track_caller]
pub fn query_bytes<S: InfoSource + ?Sized>(
    source: &S,
    param: cl_uint,
    attribute: &'static str,
) -> Result<Vec<u8>, ProbeError> {
    let location = Location::caller();
    let failed = |status| ProbeError::Query {
        attribute,
        status,
        location,
    };

    let size = source.raw_info(param, None).map_err(failed)?;
    if size == 0 {
        return Ok(Vec::new());
    }
    let mut buffer = vec![0u8; size];
    source.raw_info(param, Some(&mut buffer)).map_err(failed)?;
    Ok(buffer)
}

/// Fetch a fixed-size attribute straight into an `N`-byte buffer.
#[track_caller]
pub fn query_fixed<const N: usize, S: InfoSource + ?Sized>(
    source: &S,
    param: cl_uint,
    attribute: &'static str,
) -> Result<[u8; N], ProbeError> {
    let location = Location::caller();
    let mut buffer = [0u8; N];
    source
        .raw_info(param, Some(&mut buffer))
        .map_err(|status| ProbeError::Query {
            attribute,
            status,
            location,
        })?;
    Ok(buffer)
}

/// Decode a NUL-terminated string attribute.
pub fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
