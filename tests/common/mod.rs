//! In-memory stand-ins for an OpenCL runtime.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use accelprobe::opencl::status::{CL_INVALID_VALUE, CL_OUT_OF_RESOURCES};
use accelprobe::opencl::*;
use accelprobe::probe::ComputeRuntime;
use accelprobe::report::InfoSource;
use accelprobe::ProbeError;

/// Attribute store that answers queries the way `clGet*Info` does and logs
/// every call as `(param, Some(buffer len))` or `(param, None)` for size probes.
#[derive(Debug, Default)]
pub struct MockSource {
    values: HashMap<cl_uint, Vec<u8>>,
    failures: HashMap<cl_uint, Status>,
    pub calls: RefCell<Vec<(cl_uint, Option<usize>)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, param: cl_uint, bytes: &[u8]) -> Self {
        self.values.insert(param, bytes.to_vec());
        self
    }

    /// NUL-terminated string, as the runtime returns it.
    pub fn text(self, param: cl_uint, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.raw(param, &bytes)
    }

    pub fn ulong(self, param: cl_uint, value: u64) -> Self {
        self.raw(param, &value.to_ne_bytes())
    }

    pub fn uint(self, param: cl_uint, value: u32) -> Self {
        self.raw(param, &value.to_ne_bytes())
    }

    pub fn int(self, param: cl_uint, value: i32) -> Self {
        self.raw(param, &value.to_ne_bytes())
    }

    pub fn size(self, param: cl_uint, value: usize) -> Self {
        self.raw(param, &value.to_ne_bytes())
    }

    pub fn sizes(self, param: cl_uint, values: &[usize]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        self.raw(param, &bytes)
    }

    pub fn failing(mut self, param: cl_uint, status: cl_int) -> Self {
        self.failures.insert(param, Status(status));
        self
    }

    pub fn queried(&self) -> Vec<cl_uint> {
        let mut params: Vec<cl_uint> = Vec::new();
        for (param, _) in self.calls.borrow().iter() {
            if params.last() != Some(param) {
                params.push(*param);
            }
        }
        params
    }
}

impl InfoSource for MockSource {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status> {
        self.calls
            .borrow_mut()
            .push((param, value.as_ref().map(|buf| buf.len())));

        if let Some(status) = self.failures.get(&param) {
            return Err(*status);
        }
        let data = self.values.get(&param).ok_or(Status(CL_INVALID_VALUE))?;
        match value {
            None => Ok(data.len()),
            Some(buf) if buf.len() < data.len() => Err(Status(CL_INVALID_VALUE)),
            Some(buf) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
        }
    }
}

pub fn full_platform() -> MockSource {
    MockSource::new()
        .text(CL_PLATFORM_PROFILE, "FULL_PROFILE")
        .text(CL_PLATFORM_VERSION, "OpenCL 1.2")
        .text(CL_PLATFORM_NAME, "Mock Platform")
        .text(CL_PLATFORM_VENDOR, "Mock Vendor")
        .text(CL_PLATFORM_EXTENSIONS, "cl_khr_icd")
}

pub fn full_device() -> MockSource {
    MockSource::new()
        .text(CL_DEVICE_NAME, "Mock Accelerator")
        .text(CL_DEVICE_VERSION, "OpenCL 1.2 mock")
        .text(CL_DRIVER_VERSION, "1.0.0")
        .text(CL_DEVICE_PROFILE, "EMBEDDED_PROFILE")
        .text(CL_DEVICE_EXTENSIONS, "")
        .ulong(CL_DEVICE_GLOBAL_MEM_CACHE_SIZE, 262_144)
        .uint(CL_DEVICE_GLOBAL_MEM_CACHE_TYPE, CL_READ_WRITE_CACHE)
        .int(CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE, 64)
        .ulong(CL_DEVICE_MAX_CONSTANT_BUFFER_SIZE, 65_536)
        .uint(CL_DEVICE_MAX_CONSTANT_ARGS, 8)
        .ulong(CL_DEVICE_LOCAL_MEM_SIZE, 32_768)
        .uint(CL_DEVICE_LOCAL_MEM_TYPE, CL_LOCAL)
        .size(CL_DEVICE_MAX_WORK_GROUP_SIZE, 256)
        .sizes(CL_DEVICE_MAX_WORK_ITEM_SIZES, &[256, 256, 64])
        .uint(CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS, 3)
        .uint(CL_DEVICE_ADDRESS_BITS, 64)
        .ulong(CL_DEVICE_MAX_MEM_ALLOC_SIZE, 1 << 30)
        .size(CL_DEVICE_MAX_PARAMETER_SIZE, 1024)
        .uint(CL_DEVICE_ENDIAN_LITTLE, CL_TRUE)
        .uint(CL_DEVICE_IMAGE_SUPPORT, CL_FALSE)
}

/// Handle returned by [`MockRuntime`]; shares the call log with the runtime.
#[derive(Debug, Clone)]
pub struct MockHandle {
    pub index: usize,
    pub source: Rc<MockSource>,
}

impl InfoSource for MockHandle {
    fn raw_info(&self, param: cl_uint, value: Option<&mut [u8]>) -> Result<usize, Status> {
        self.source.raw_info(param, value)
    }
}

#[derive(Debug, Default)]
pub struct MockRuntime {
    pub platforms: Vec<Rc<MockSource>>,
    /// Devices per platform index.
    pub devices: Vec<Vec<Rc<MockSource>>>,
    pub queue_failure: Option<cl_int>,
    pub requested: RefCell<Vec<(usize, DeviceType)>>,
    pub queue_opened: Cell<bool>,
}

impl MockRuntime {
    pub fn single(platform: MockSource, device: MockSource) -> Self {
        Self {
            platforms: vec![Rc::new(platform)],
            devices: vec![vec![Rc::new(device)]],
            ..Self::default()
        }
    }

    pub fn failing_queue(mut self) -> Self {
        self.queue_failure = Some(CL_OUT_OF_RESOURCES);
        self
    }
}

impl ComputeRuntime for MockRuntime {
    type Platform = MockHandle;
    type Device = MockHandle;

    fn platforms(&self) -> Result<Vec<MockHandle>, ProbeError> {
        Ok(self
            .platforms
            .iter()
            .enumerate()
            .map(|(index, source)| MockHandle {
                index,
                source: Rc::clone(source),
            })
            .collect())
    }

    fn devices(
        &self,
        platform: &MockHandle,
        device_type: DeviceType,
    ) -> Result<Vec<MockHandle>, ProbeError> {
        self.requested.borrow_mut().push((platform.index, device_type));
        Ok(self
            .devices
            .get(platform.index)
            .map(|devices| {
                devices
                    .iter()
                    .enumerate()
                    .map(|(index, source)| MockHandle {
                        index,
                        source: Rc::clone(source),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn open_queue(&self, _device: &MockHandle) -> Result<(), ProbeError> {
        if let Some(code) = self.queue_failure {
            Status(code).check_create("command queue")?;
        }
        self.queue_opened.set(true);
        Ok(())
    }
}
