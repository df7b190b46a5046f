mod common;

use accelprobe::opencl::status::{CL_INVALID_DEVICE, CL_INVALID_PLATFORM};
use accelprobe::opencl::*;
use accelprobe::report::{self, CacheType, Value};

use common::{full_device, full_platform, MockSource};

fn render<F>(f: F) -> (String, Result<report::CapabilityReport, accelprobe::ProbeError>)
where
    F: FnOnce(&mut Vec<u8>) -> Result<report::CapabilityReport, accelprobe::ProbeError>,
{
    let mut out = Vec::new();
    let result = f(&mut out);
    (String::from_utf8(out).unwrap(), result)
}

#[test]
fn test_platform_report_text() {
    let source = full_platform();
    let (text, result) = render(|out| report::platform(&source, out));
    result.unwrap();

    assert_eq!(
        text,
        "\n\n\nPlatform Info\n\n\
         Profile: FULL_PROFILE\n\
         Version: OpenCL 1.2\n\
         Name: Mock Platform\n\
         Vendor: Mock Vendor\n\
         Extensions: cl_khr_icd\n"
    );
}

#[test]
fn test_version_string_is_sized_then_fetched() {
    let source = full_platform();
    let (text, result) = render(|out| report::platform(&source, out));
    let report = result.unwrap();

    assert!(text.contains("Version: OpenCL 1.2\n"));
    assert_eq!(
        report.get("Platform Info", "Version"),
        Some(&Value::Text("OpenCL 1.2".into()))
    );

    // Size probe, then a fetch into a buffer of exactly that size (10 chars + NUL).
    let calls = source.calls.borrow();
    let version_calls: Vec<_> = calls
        .iter()
        .filter(|(param, _)| *param == CL_PLATFORM_VERSION)
        .map(|(_, len)| *len)
        .collect();
    assert_eq!(version_calls, vec![None, Some(11)]);
}

#[test]
fn test_platform_queries_in_order() {
    let source = full_platform();
    let (_, result) = render(|out| report::platform(&source, out));
    result.unwrap();

    assert_eq!(
        source.queried(),
        vec![
            CL_PLATFORM_PROFILE,
            CL_PLATFORM_VERSION,
            CL_PLATFORM_NAME,
            CL_PLATFORM_VENDOR,
            CL_PLATFORM_EXTENSIONS,
        ]
    );
}

#[test]
fn test_read_write_cache_type() {
    let source = full_device();
    let (text, result) = render(|out| report::device(&source, out));
    let report = result.unwrap();

    assert!(text.contains("\n\tType: READ/WRITE\n"));
    assert_eq!(
        report.get("Global Memory Cache", "Type"),
        Some(&Value::CacheType(CacheType::ReadWrite))
    );
}

#[test]
fn test_unrecognized_cache_type() {
    let source = full_device().uint(CL_DEVICE_GLOBAL_MEM_CACHE_TYPE, 9);
    let (text, result) = render(|out| report::device(&source, out));
    result.unwrap();
    assert!(text.contains("\n\tType: no type was found.\n"));
}

#[test]
fn test_work_item_sizes_print_values() {
    let source = full_device();
    let (text, result) = render(|out| report::device(&source, out));
    let report = result.unwrap();

    assert!(text.contains("\n\tMaximum Work-item Sizes: 256 , 256, 64\n"));
    assert_eq!(
        report.get("Other Device Info", "Maximum Work-item Sizes"),
        Some(&Value::Extent([256, 256, 64]))
    );
}

#[test]
fn test_device_report_text() {
    let source = full_device();
    let (text, result) = render(|out| report::device(&source, out));
    result.unwrap();

    let expected = "\n\nDevice Info\n\
        Name: Mock Accelerator\n\
        Version: OpenCL 1.2 mock\n\
        Driver Version: 1.0.0\n\
        Profile: EMBEDDED_PROFILE\n\
        Extensions: \n\
        \n\nGlobal Memory Cache\n\
        \n\tSize: 262144\n\
        \n\tType: READ/WRITE\n\
        \n\tCacheline Size: 64\n\
        \n\nConstant Memory\n\
        \n\tMax Constant Buffer Size: 65536\n\
        \n\tMaximum number of constant arguments: 8\n\
        \n\nLocal Memory\n\
        \n\tSize: 32768\n\
        \n\tType: CL_LOCAL\n\
        \nOther Device Info\n\
        \n\tMaximum Work-group Size: 256\n\
        \n\tMaximum Work-item Sizes: 256 , 256, 64\n\
        \n\tMax Work-item Dimensions: 3\n\
        \n\tAddress Space: 64\n\
        \n\tMax Size of Memory Object Allocation: 1073741824\n\
        \n\tMaximum Parameter Size: 1024\n\
        \n\tLittle Endian\n\
        \n\tImages NOT Supported\n\
        \n\n\n";
    assert_eq!(text, expected);
}

#[test]
fn test_failed_query_stops_report() {
    let source = full_device().failing(CL_DEVICE_GLOBAL_MEM_CACHE_TYPE, CL_INVALID_DEVICE);
    let (text, result) = render(|out| report::device(&source, out));
    let err = result.unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("OpenCL error in file "), "{message}");
    assert!(message.contains("mod.rs line "), "{message}");
    assert!(message.contains("error code CL_INVALID_DEVICE"), "{message}");
    assert_eq!(err.status(), Some(Status(CL_INVALID_DEVICE)));

    // Nothing after the failing attribute was queried.
    assert_eq!(source.queried().last(), Some(&CL_DEVICE_GLOBAL_MEM_CACHE_TYPE));
    assert!(!source.queried().contains(&CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE));

    // What was printed before the failure stays printed.
    assert!(text.contains("\n\tSize: 262144\n"));
    assert!(!text.contains("Cacheline Size"));
}

#[test]
fn test_failed_size_probe_stops_platform_report() {
    let source = full_platform().failing(CL_PLATFORM_NAME, CL_INVALID_PLATFORM);
    let (text, result) = render(|out| report::platform(&source, out));
    let err = result.unwrap_err();

    assert!(err.to_string().contains("CL_INVALID_PLATFORM"));
    assert!(text.contains("Version: OpenCL 1.2\n"));
    assert!(!text.contains("Name:"));
    assert_eq!(
        source.queried(),
        vec![CL_PLATFORM_PROFILE, CL_PLATFORM_VERSION, CL_PLATFORM_NAME]
    );
}

#[test]
fn test_missing_dimensions_read_as_zero() {
    let source = full_device().sizes(CL_DEVICE_MAX_WORK_ITEM_SIZES, &[128]);
    let (text, result) = render(|out| report::device(&source, out));
    result.unwrap();
    assert!(text.contains("Maximum Work-item Sizes: 128 , 0, 0\n"));
}

#[test]
fn test_report_serializes_to_json() {
    let source = MockSource::new()
        .text(CL_PLATFORM_PROFILE, "FULL_PROFILE")
        .text(CL_PLATFORM_VERSION, "OpenCL 3.0")
        .text(CL_PLATFORM_NAME, "n")
        .text(CL_PLATFORM_VENDOR, "v")
        .text(CL_PLATFORM_EXTENSIONS, "");
    let (_, result) = render(|out| report::platform(&source, out));
    let json = serde_json::to_value(result.unwrap()).unwrap();

    assert_eq!(json["name"], "platform");
    assert_eq!(json["sections"][0]["title"], "Platform Info");
    assert_eq!(json["sections"][0]["entries"][1]["label"], "Version");
    assert_eq!(json["sections"][0]["entries"][1]["value"], "OpenCL 3.0");
}

#[test]
fn test_cacheline_size_is_signed() {
    let source = full_device().uint(CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE, u32::MAX);
    let (text, result) = render(|out| report::device(&source, out));
    let report = result.unwrap();

    assert!(text.contains("\n\tCacheline Size: -1\n"));
    assert_eq!(
        report.get("Global Memory Cache", "Cacheline Size"),
        Some(&Value::Signed(-1))
    );
}
