//! OpenCL entry points resolved from the ICD loader at run time.
//!
//! The library is opened with `libloading` so the binary runs (and reports a
//! clean error) on machines without an OpenCL runtime installed.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use tracing::{debug, info};

use super::status::CL_DEVICE_NOT_FOUND;
use super::{
    cl_bitfield, cl_command_queue, cl_context, cl_device_id, cl_int, cl_platform_id, cl_uint,
    DeviceType, Status,
};
use crate::error::ProbeError;
use crate::probe::ComputeRuntime;
use crate::report::InfoSource;

type GetPlatformIds = unsafe extern "C" fn(cl_uint, *mut cl_platform_id, *mut cl_uint) -> cl_int;
type GetPlatformInfo =
    unsafe extern "C" fn(cl_platform_id, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
type GetDeviceIds = unsafe extern "C" fn(
    cl_platform_id,
    cl_bitfield,
    cl_uint,
    *mut cl_device_id,
    *mut cl_uint,
) -> cl_int;
type GetDeviceInfo =
    unsafe extern "C" fn(cl_device_id, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
type ContextNotify = unsafe extern "C" fn(*const c_char, *const c_void, usize, *mut c_void);
type CreateContext = unsafe extern "C" fn(
    *const isize,
    cl_uint,
    *const cl_device_id,
    Option<ContextNotify>,
    *mut c_void,
    *mut cl_int,
) -> cl_context;
type CreateCommandQueue =
    unsafe extern "C" fn(cl_context, cl_device_id, cl_bitfield, *mut cl_int) -> cl_command_queue;
type Release = unsafe extern "C" fn(*mut c_void) -> cl_int;

#[cfg(target_os = "macos")]
const DEFAULT_LIBRARY_PATHS: &[&str] = &["/System/Library/Frameworks/OpenCL.framework/OpenCL"];

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARY_PATHS: &[&str] = &["OpenCL.dll"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_LIBRARY_PATHS: &[&str] = &[
    "libOpenCL.so.1",
    "libOpenCL.so",
    "/usr/lib/x86_64-linux-gnu/libOpenCL.so.1",
    "/usr/lib/aarch64-linux-gnu/libOpenCL.so.1",
    "/usr/lib/arm-linux-gnueabihf/libOpenCL.so.1",
    "/usr/lib64/libOpenCL.so.1",
    "/usr/lib/libOpenCL.so.1",
    "/lib/libOpenCL.so",
    "/lib64/libOpenCL.so",
];

/// Candidate library locations used when none are configured.
pub fn default_library_paths() -> Vec<PathBuf> {
    DEFAULT_LIBRARY_PATHS.iter().map(PathBuf::from).collect()
}

/// A loaded OpenCL runtime.
pub struct OpenCl {
    clGetPlatformIDs: GetPlatformIds,
    clGetPlatformInfo: GetPlatformInfo,
    clGetDeviceIDs: GetDeviceIds,
    clGetDeviceInfo: GetDeviceInfo,
    clCreateContext: CreateContext,
    clCreateCommandQueue: CreateCommandQueue,
    clReleaseContext: Release,
    clReleaseCommandQueue: Release,
    path: PathBuf,
    // Keeps the entry points above valid; dropped last.
    _library: Library,
}

impl std::fmt::Debug for OpenCl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenCl").field("path", &self.path).finish_non_exhaustive()
    }
}

impl OpenCl {
    /// Open the first loadable library among `paths` (or the built-in list when empty).
    pub fn load(paths: &[PathBuf]) -> Result<Self, ProbeError> {
        let candidates = if paths.is_empty() {
            default_library_paths()
        } else {
            paths.to_vec()
        };

        for path in &candidates {
            match unsafe { Library::new(path) } {
                Ok(library) => {
                    info!(path = %path.display(), "loaded OpenCL runtime");
                    return Self::bind(library, path);
                }
                Err(e) => debug!(path = %path.display(), error = %e, "OpenCL runtime not loadable"),
            }
        }

        Err(ProbeError::LibraryNotFound {
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn bind(library: Library, path: &Path) -> Result<Self, ProbeError> {
        Ok(Self {
            clGetPlatformIDs: symbol(&library, "clGetPlatformIDs")?,
            clGetPlatformInfo: symbol(&library, "clGetPlatformInfo")?,
            clGetDeviceIDs: symbol(&library, "clGetDeviceIDs")?,
            clGetDeviceInfo: symbol(&library, "clGetDeviceInfo")?,
            clCreateContext: symbol(&library, "clCreateContext")?,
            clCreateCommandQueue: symbol(&library, "clCreateCommandQueue")?,
            clReleaseContext: symbol(&library, "clReleaseContext")?,
            clReleaseCommandQueue: symbol(&library, "clReleaseCommandQueue")?,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All platforms exposed by the ICD loader.
    pub fn platforms(&self) -> Result<Vec<Platform<'_>>, ProbeError> {
        let mut count: cl_uint = 0;
        Status(unsafe { (self.clGetPlatformIDs)(0, ptr::null_mut(), &mut count) })
            .check_query("platform count")?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut ids: Vec<cl_platform_id> = vec![ptr::null_mut(); count as usize];
        Status(unsafe { (self.clGetPlatformIDs)(count, ids.as_mut_ptr(), ptr::null_mut()) })
            .check_query("platform IDs")?;
        Ok(ids.into_iter().map(|id| Platform { api: self, id }).collect())
    }

    /// Devices of `device_type` on `platform`; empty when the platform has none.
    pub fn devices(
        &self,
        platform: &Platform<'_>,
        device_type: DeviceType,
    ) -> Result<Vec<Device<'_>>, ProbeError> {
        let mut count: cl_uint = 0;
        let status = Status(unsafe {
            (self.clGetDeviceIDs)(
                platform.id,
                device_type.bits(),
                0,
                ptr::null_mut(),
                &mut count,
            )
        });
        if status.code() == CL_DEVICE_NOT_FOUND || (status.is_success() && count == 0) {
            return Ok(Vec::new());
        }
        status.check_query("device count")?;

        let mut ids: Vec<cl_device_id> = vec![ptr::null_mut(); count as usize];
        Status(unsafe {
            (self.clGetDeviceIDs)(
                platform.id,
                device_type.bits(),
                count,
                ids.as_mut_ptr(),
                ptr::null_mut(),
            )
        })
        .check_query("device IDs")?;
        Ok(ids.into_iter().map(|id| Device { api: self, id }).collect())
    }

    /// Create a context bound to a single device.
    pub fn create_context(&self, device: &Device<'_>) -> Result<Context<'_>, ProbeError> {
        let mut status: cl_int = 0;
        let raw = unsafe {
            (self.clCreateContext)(
                ptr::null(),
                1,
                &device.id,
                None,
                ptr::null_mut(),
                &mut status,
            )
        };
        Status(status).check_create("context")?;
        Ok(Context { api: self, raw })
    }

    /// Create an in-order command queue on `device` within `context`.
    pub fn create_command_queue<'cl>(
        &'cl self,
        context: &Context<'cl>,
        device: &Device<'cl>,
    ) -> Result<CommandQueue<'cl>, ProbeError> {
        let mut status: cl_int = 0;
        let raw = unsafe { (self.clCreateCommandQueue)(context.raw, device.id, 0, &mut status) };
        Status(status).check_create("command queue")?;
        Ok(CommandQueue { api: self, raw })
    }
}

fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, ProbeError> {
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|source| ProbeError::MissingSymbol { name, source })
}

#[derive(Debug, Clone, Copy)]
pub struct Platform<'cl> {
    api: &'cl OpenCl,
    id: cl_platform_id,
}

impl InfoSource for Platform<'_> {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status> {
        let (len, buf) = out_buffer(value);
        let mut size = 0usize;
        Status(unsafe { (self.api.clGetPlatformInfo)(self.id, param, len, buf, &mut size) })
            .check()
            .map(|()| size)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Device<'cl> {
    api: &'cl OpenCl,
    id: cl_device_id,
}

impl InfoSource for Device<'_> {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status> {
        let (len, buf) = out_buffer(value);
        let mut size = 0usize;
        Status(unsafe { (self.api.clGetDeviceInfo)(self.id, param, len, buf, &mut size) })
            .check()
            .map(|()| size)
    }
}

fn out_buffer(value: Option<&mut [u8]>) -> (usize, *mut c_void) {
    match value {
        Some(buf) if !buf.is_empty() => (buf.len(), buf.as_mut_ptr().cast()),
        _ => (0, ptr::null_mut()),
    }
}

/// Owned `cl_context`, released on drop.
#[derive(Debug)]
pub struct Context<'cl> {
    api: &'cl OpenCl,
    raw: cl_context,
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        let status = Status(unsafe { (self.api.clReleaseContext)(self.raw) });
        if let Err(status) = status.check() {
            tracing::warn!(%status, "failed to release OpenCL context");
        }
    }
}

/// Owned `cl_command_queue`, released on drop.
#[derive(Debug)]
pub struct CommandQueue<'cl> {
    api: &'cl OpenCl,
    raw: cl_command_queue,
}

impl Drop for CommandQueue<'_> {
    fn drop(&mut self) {
        let status = Status(unsafe { (self.api.clReleaseCommandQueue)(self.raw) });
        if let Err(status) = status.check() {
            tracing::warn!(%status, "failed to release OpenCL command queue");
        }
    }
}

impl<'cl> ComputeRuntime for &'cl OpenCl {
    type Platform = Platform<'cl>;
    type Device = Device<'cl>;

    fn platforms(&self) -> Result<Vec<Self::Platform>, ProbeError> {
        OpenCl::platforms(*self)
    }

    fn devices(
        &self,
        platform: &Self::Platform,
        device_type: DeviceType,
    ) -> Result<Vec<Self::Device>, ProbeError> {
        OpenCl::devices(*self, platform, device_type)
    }

    fn open_queue(&self, device: &Self::Device) -> Result<(), ProbeError> {
        let context = OpenCl::create_context(*self, device)?;
        let _queue = OpenCl::create_command_queue(*self, &context, device)?;
        info!("context and command queue created");
        Ok(())
    }
}
