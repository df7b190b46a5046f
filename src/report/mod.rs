//! Capability reporter.
//!
//! A report is driven by a [`ReportSpec`]: an ordered table of sections, each
//! an ordered list of attribute queries. Every value is written to the output
//! as soon as it is fetched and is also collected into a [`CapabilityReport`]
//! so callers can serialize the same data.

pub mod query;
pub mod tables;

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::error::ProbeError;
use crate::opencl::{
    cl_int, cl_uint, CL_LOCAL, CL_NONE, CL_READ_ONLY_CACHE, CL_READ_WRITE_CACHE, CL_TRUE,
};

pub use query::{decode_text, query_bytes, query_fixed, InfoSource};

/// How the raw bytes of an attribute are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// NUL-terminated string, size discovered first.
    Text,
    /// `cl_ulong`
    Ulong,
    /// `cl_uint`
    Uint,
    /// `cl_int`
    Int,
    /// `size_t`
    Size,
    CacheType,
    LocalMemType,
    /// `size_t[]`, one entry per work-item dimension.
    WorkItemSizes,
    Endianness,
    ImageSupport,
}

#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub param: cl_uint,
    pub label: &'static str,
    pub kind: ValueKind,
}

impl Query {
    pub const fn new(param: cl_uint, label: &'static str, kind: ValueKind) -> Self {
        Self { param, label, kind }
    }
}

/// Console layout of the entries in a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `label: value` on consecutive lines.
    Inline,
    /// Each entry in its own tab-indented block.
    Block,
}

#[derive(Debug)]
pub struct SectionSpec {
    pub title: &'static str,
    /// Raw text written before the first entry.
    pub heading: &'static str,
    pub layout: Layout,
    pub queries: &'static [Query],
}

#[derive(Debug)]
pub struct ReportSpec {
    pub name: &'static str,
    pub sections: &'static [SectionSpec],
    /// Raw text written after the last section.
    pub trailer: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    None,
    ReadOnly,
    ReadWrite,
    Unknown(cl_uint),
}

impl CacheType {
    pub const fn from_raw(raw: cl_uint) -> Self {
        match raw {
            CL_NONE => Self::None,
            CL_READ_ONLY_CACHE => Self::ReadOnly,
            CL_READ_WRITE_CACHE => Self::ReadWrite,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "CL_NONE",
            Self::ReadOnly => "READ ONLY",
            Self::ReadWrite => "READ/WRITE",
            Self::Unknown(_) => "no type was found.",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalMemType {
    /// Dedicated local memory.
    Local,
    /// Local memory is carved out of global memory.
    Global,
}

impl LocalMemType {
    pub const fn from_raw(raw: cl_uint) -> Self {
        if raw == CL_LOCAL {
            Self::Local
        } else {
            Self::Global
        }
    }
}

impl fmt::Display for LocalMemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "CL_LOCAL",
            Self::Global => "CL_GLOBAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub const fn from_raw(raw: cl_uint) -> Self {
        if raw == CL_TRUE {
            Self::Little
        } else {
            Self::Big
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Little => "Little Endian",
            Self::Big => "Big Endian",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSupport {
    Supported,
    NotSupported,
}

impl ImageSupport {
    pub const fn from_raw(raw: cl_uint) -> Self {
        if raw == CL_TRUE {
            Self::Supported
        } else {
            Self::NotSupported
        }
    }
}

impl fmt::Display for ImageSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Supported => "Images Supported",
            Self::NotSupported => "Images NOT Supported",
        })
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Extent([usize; 3]),
    CacheType(CacheType),
    LocalMemType(LocalMemType),
    Endianness(Endianness),
    ImageSupport(ImageSupport),
}

impl Value {
    /// Binary flags print as a bare phrase rather than `label: value`.
    pub const fn is_labelled(&self) -> bool {
        !matches!(self, Self::Endianness(_) | Self::ImageSupport(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Signed(n) => write!(f, "{n}"),
            Self::Extent([x, y, z]) => write!(f, "{x} , {y}, {z}"),
            Self::CacheType(t) => fmt::Display::fmt(t, f),
            Self::LocalMemType(t) => fmt::Display::fmt(t, f),
            Self::Endianness(e) => fmt::Display::fmt(e, f),
            Self::ImageSupport(i) => fmt::Display::fmt(i, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub label: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub entries: Vec<Entry>,
}

/// Everything a report printed, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    pub name: &'static str,
    pub sections: Vec<Section>,
}

impl CapabilityReport {
    pub fn get(&self, section: &str, label: &str) -> Option<&Value> {
        self.sections
            .iter()
            .find(|s| s.title == section)?
            .entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.value)
    }
}

/// Report the platform attributes: profile, version, name, vendor, extensions.
pub fn platform<S, W>(source: &S, out: &mut W) -> Result<CapabilityReport, ProbeError>
where
    S: InfoSource + ?Sized,
    W: Write + ?Sized,
{
    run(source, &tables::PLATFORM, out)
}

/// Report device identity, memory hierarchy, and work-group limits.
pub fn device<S, W>(source: &S, out: &mut W) -> Result<CapabilityReport, ProbeError>
where
    S: InfoSource + ?Sized,
    W: Write + ?Sized,
{
    run(source, &tables::DEVICE, out)
}

/// Walk `spec` in order, stopping at the first failed query.
///
/// Output already written before a failure is left in place.
pub fn run<S, W>(
    source: &S,
    spec: &ReportSpec,
    out: &mut W,
) -> Result<CapabilityReport, ProbeError>
where
    S: InfoSource + ?Sized,
    W: Write + ?Sized,
{
    let mut report = CapabilityReport {
        name: spec.name,
        sections: Vec::with_capacity(spec.sections.len()),
    };

    for section in spec.sections {
        out.write_all(section.heading.as_bytes())?;
        let mut entries = Vec::with_capacity(section.queries.len());
        for query in section.queries {
            debug!(
                report = spec.name,
                section = section.title,
                attribute = query.label,
                param = query.param,
                "querying attribute"
            );
            let entry = Entry {
                label: query.label,
                value: fetch(source, query)?,
            };
            write_entry(out, section.layout, &entry)?;
            entries.push(entry);
        }
        report.sections.push(Section {
            title: section.title,
            entries,
        });
    }

    out.write_all(spec.trailer.as_bytes())?;
    out.flush()?;
    Ok(report)
}

fn fetch<S: InfoSource + ?Sized>(source: &S, query: &Query) -> Result<Value, ProbeError> {
    let (param, attribute) = (query.param, query.label);
    let uint = || query_fixed(source, param, attribute).map(cl_uint::from_ne_bytes);

    let value = match query.kind {
        ValueKind::Text => Value::Text(decode_text(&query_bytes(source, param, attribute)?)),
        ValueKind::Ulong => {
            Value::Unsigned(u64::from_ne_bytes(query_fixed(source, param, attribute)?))
        }
        ValueKind::Uint => Value::Unsigned(uint()?.into()),
        ValueKind::Int => {
            Value::Signed(cl_int::from_ne_bytes(query_fixed(source, param, attribute)?).into())
        }
        ValueKind::Size => {
            Value::Unsigned(usize::from_ne_bytes(query_fixed(source, param, attribute)?) as u64)
        }
        ValueKind::CacheType => Value::CacheType(CacheType::from_raw(uint()?)),
        ValueKind::LocalMemType => Value::LocalMemType(LocalMemType::from_raw(uint()?)),
        ValueKind::WorkItemSizes => {
            Value::Extent(decode_extent(&query_bytes(source, param, attribute)?))
        }
        ValueKind::Endianness => Value::Endianness(Endianness::from_raw(uint()?)),
        ValueKind::ImageSupport => Value::ImageSupport(ImageSupport::from_raw(uint()?)),
    };
    Ok(value)
}

/// First three `size_t` entries of a work-item size array; missing dimensions read as 0.
fn decode_extent(bytes: &[u8]) -> [usize; 3] {
    let mut extent = [0usize; 3];
    for (slot, chunk) in extent
        .iter_mut()
        .zip(bytes.chunks_exact(std::mem::size_of::<usize>()))
    {
        *slot = chunk.try_into().map(usize::from_ne_bytes).unwrap_or(0);
    }
    extent
}

fn write_entry<W: Write + ?Sized>(
    out: &mut W,
    layout: Layout,
    entry: &Entry,
) -> std::io::Result<()> {
    match layout {
        Layout::Inline => writeln!(out, "{}: {}", entry.label, entry.value),
        Layout::Block if entry.value.is_labelled() => {
            write!(out, "\n\t{}: {}\n", entry.label, entry.value)
        }
        Layout::Block => write!(out, "\n\t{}\n", entry.value),
    }
}
