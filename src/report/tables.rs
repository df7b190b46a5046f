//! Attribute tables for the platform and device reports.

use super::{Layout, Query, ReportSpec, SectionSpec, ValueKind};
use crate::opencl::*;

pub static PLATFORM: ReportSpec = ReportSpec {
    name: "platform",
    sections: &[SectionSpec {
        title: "Platform Info",
        heading: "\n\n\nPlatform Info\n\n",
        layout: Layout::Inline,
        queries: &[
            Query::new(CL_PLATFORM_PROFILE, "Profile", ValueKind::Text),
            Query::new(CL_PLATFORM_VERSION, "Version", ValueKind::Text),
            Query::new(CL_PLATFORM_NAME, "Name", ValueKind::Text),
            Query::new(CL_PLATFORM_VENDOR, "Vendor", ValueKind::Text),
            Query::new(CL_PLATFORM_EXTENSIONS, "Extensions", ValueKind::Text),
        ],
    }],
    trailer: "",
};

pub static DEVICE: ReportSpec = ReportSpec {
    name: "device",
    sections: &[
        SectionSpec {
            title: "Device Info",
            heading: "\n\nDevice Info\n",
            layout: Layout::Inline,
            queries: &[
                Query::new(CL_DEVICE_NAME, "Name", ValueKind::Text),
                Query::new(CL_DEVICE_VERSION, "Version", ValueKind::Text),
                Query::new(CL_DRIVER_VERSION, "Driver Version", ValueKind::Text),
                Query::new(CL_DEVICE_PROFILE, "Profile", ValueKind::Text),
                Query::new(CL_DEVICE_EXTENSIONS, "Extensions", ValueKind::Text),
            ],
        },
        SectionSpec {
            title: "Global Memory Cache",
            heading: "\n\nGlobal Memory Cache\n",
            layout: Layout::Block,
            queries: &[
                Query::new(CL_DEVICE_GLOBAL_MEM_CACHE_SIZE, "Size", ValueKind::Ulong),
                Query::new(CL_DEVICE_GLOBAL_MEM_CACHE_TYPE, "Type", ValueKind::CacheType),
                Query::new(
                    CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE,
                    "Cacheline Size",
                    ValueKind::Int,
                ),
            ],
        },
        SectionSpec {
            title: "Constant Memory",
            heading: "\n\nConstant Memory\n",
            layout: Layout::Block,
            queries: &[
                Query::new(
                    CL_DEVICE_MAX_CONSTANT_BUFFER_SIZE,
                    "Max Constant Buffer Size",
                    ValueKind::Ulong,
                ),
                Query::new(
                    CL_DEVICE_MAX_CONSTANT_ARGS,
                    "Maximum number of constant arguments",
                    ValueKind::Uint,
                ),
            ],
        },
        SectionSpec {
            title: "Local Memory",
            heading: "\n\nLocal Memory\n",
            layout: Layout::Block,
            queries: &[
                Query::new(CL_DEVICE_LOCAL_MEM_SIZE, "Size", ValueKind::Ulong),
                Query::new(CL_DEVICE_LOCAL_MEM_TYPE, "Type", ValueKind::LocalMemType),
            ],
        },
        SectionSpec {
            title: "Other Device Info",
            heading: "\nOther Device Info\n",
            layout: Layout::Block,
            queries: &[
                Query::new(
                    CL_DEVICE_MAX_WORK_GROUP_SIZE,
                    "Maximum Work-group Size",
                    ValueKind::Size,
                ),
                Query::new(
                    CL_DEVICE_MAX_WORK_ITEM_SIZES,
                    "Maximum Work-item Sizes",
                    ValueKind::WorkItemSizes,
                ),
                Query::new(
                    CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS,
                    "Max Work-item Dimensions",
                    ValueKind::Uint,
                ),
                Query::new(CL_DEVICE_ADDRESS_BITS, "Address Space", ValueKind::Uint),
                Query::new(
                    CL_DEVICE_MAX_MEM_ALLOC_SIZE,
                    "Max Size of Memory Object Allocation",
                    ValueKind::Ulong,
                ),
                Query::new(
                    CL_DEVICE_MAX_PARAMETER_SIZE,
                    "Maximum Parameter Size",
                    ValueKind::Size,
                ),
                Query::new(CL_DEVICE_ENDIAN_LITTLE, "Endianness", ValueKind::Endianness),
                Query::new(CL_DEVICE_IMAGE_SUPPORT, "Image Support", ValueKind::ImageSupport),
            ],
        },
    ],
    trailer: "\n\n\n",
};
