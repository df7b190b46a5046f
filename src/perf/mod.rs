//! Hardware performance counters through `perf_event_open(2)`.
//!
//! Only the first 64 bytes of `perf_event_attr` (`PERF_ATTR_SIZE_VER0`) are
//! laid out here; the kernel accepts that size from every release since 2.6.31.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use libc::{c_int, c_long, c_ulong, pid_t};
use serde::Serialize;
use tracing::{debug, warn};

pub const PERF_TYPE_HARDWARE: u32 = 0;
pub const PERF_ATTR_SIZE_VER0: u32 = 64;

pub const PERF_COUNT_HW_CPU_CYCLES: u64 = 0;
pub const PERF_COUNT_HW_INSTRUCTIONS: u64 = 1;
pub const PERF_COUNT_HW_CACHE_REFERENCES: u64 = 2;
pub const PERF_COUNT_HW_CACHE_MISSES: u64 = 3;

pub const PERF_FLAG_FD_CLOEXEC: c_ulong = 1 << 3;

const PERF_EVENT_IOC_ENABLE: c_ulong = 0x2400;
const PERF_EVENT_IOC_DISABLE: c_ulong = 0x2401;
const PERF_EVENT_IOC_RESET: c_ulong = 0x2403;
const PERF_IOC_FLAG_GROUP: c_ulong = 1;

const ATTR_DISABLED: u64 = 1 << 0;
const ATTR_EXCLUDE_KERNEL: u64 = 1 << 5;
const ATTR_EXCLUDE_HV: u64 = 1 << 6;

/// The generic hardware events this helper knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Cycles,
    Instructions,
    CacheReferences,
    CacheMisses,
}

impl CounterKind {
    pub const ALL: [CounterKind; 4] = [
        Self::Cycles,
        Self::Instructions,
        Self::CacheReferences,
        Self::CacheMisses,
    ];

    pub const fn config(self) -> u64 {
        match self {
            Self::Cycles => PERF_COUNT_HW_CPU_CYCLES,
            Self::Instructions => PERF_COUNT_HW_INSTRUCTIONS,
            Self::CacheReferences => PERF_COUNT_HW_CACHE_REFERENCES,
            Self::CacheMisses => PERF_COUNT_HW_CACHE_MISSES,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Cycles => "cycles",
            Self::Instructions => "instructions",
            Self::CacheReferences => "cache-references",
            Self::CacheMisses => "cache-misses",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// `struct perf_event_attr`, truncated to `PERF_ATTR_SIZE_VER0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct EventAttr {
    pub type_: u32,
    pub size: u32,
    pub config: u64,
    pub sample_period: u64,
    pub sample_type: u64,
    pub read_format: u64,
    /// The `disabled:1, inherit:1, pinned:1, ...` bitfield.
    pub flags: u64,
    pub wakeup_events: u32,
    pub bp_type: u32,
    pub config1: u64,
}

impl EventAttr {
    /// User-space-only hardware event, created disabled.
    pub fn for_kind(kind: CounterKind) -> Self {
        Self {
            type_: PERF_TYPE_HARDWARE,
            size: PERF_ATTR_SIZE_VER0,
            config: kind.config(),
            flags: ATTR_DISABLED | ATTR_EXCLUDE_KERNEL | ATTR_EXCLUDE_HV,
            ..Self::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.flags & ATTR_DISABLED != 0
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.flags |= ATTR_DISABLED;
        } else {
            self.flags &= !ATTR_DISABLED;
        }
    }
}

/// Raw `perf_event_open(2)`. Returns the new descriptor, or -1 with `errno` set.
pub fn perf_event_open(
    attr: &mut EventAttr,
    pid: pid_t,
    cpu: c_int,
    group_fd: c_int,
    flags: c_ulong,
) -> c_long {
    unsafe {
        libc::syscall(
            libc::SYS_perf_event_open,
            attr as *mut EventAttr,
            pid,
            cpu,
            group_fd,
            flags,
        )
    }
}

/// An open counter descriptor. Closed on drop.
#[derive(Debug)]
pub struct Counter {
    kind: CounterKind,
    fd: OwnedFd,
}

impl Counter {
    /// Open `kind` for `pid` (0 = this process) on `cpu` (-1 = any).
    ///
    /// A counter opened without `group` is a disabled group leader. Members are
    /// opened enabled and start counting when the leader is enabled.
    pub fn open(
        kind: CounterKind,
        pid: pid_t,
        cpu: c_int,
        group: Option<&Counter>,
    ) -> io::Result<Self> {
        let mut attr = EventAttr::for_kind(kind);
        attr.set_disabled(group.is_none());
        let group_fd = group.map_or(-1, |leader| leader.fd.as_raw_fd());

        let ret = perf_event_open(&mut attr, pid, cpu, group_fd, PERF_FLAG_FD_CLOEXEC);
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(counter = %kind, fd = ret, group_fd, "opened perf counter");
        // The kernel handed us a fresh descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(ret as c_int) };
        Ok(Self { kind, fd })
    }

    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    pub fn enable(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_ENABLE, 0)
    }

    pub fn disable(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_DISABLE, 0)
    }

    pub fn reset(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_RESET, 0)
    }

    /// Enable this counter and every member of its group.
    pub fn enable_group(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_ENABLE, PERF_IOC_FLAG_GROUP)
    }

    pub fn disable_group(&self) -> io::Result<()> {
        self.ioctl(PERF_EVENT_IOC_DISABLE, PERF_IOC_FLAG_GROUP)
    }

    /// Current count (default `read_format`: a single u64).
    pub fn read(&self) -> io::Result<u64> {
        let mut buf = [0u8; mem::size_of::<u64>()];
        let n = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short read from perf counter: {n} bytes"),
            ));
        }
        Ok(u64::from_ne_bytes(buf))
    }

    /// Close the descriptor, reporting the result of `close(2)`.
    pub fn close(self) -> io::Result<()> {
        let raw = std::os::fd::IntoRawFd::into_raw_fd(self.fd);
        if unsafe { libc::close(raw) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn ioctl(&self, request: c_ulong, arg: c_ulong) -> io::Result<()> {
        if unsafe { libc::ioctl(self.fd.as_raw_fd(), request as _, arg) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Outcome of opening and reading one counter kind.
#[derive(Debug, Clone, Serialize)]
pub struct CounterProbe {
    pub kind: CounterKind,
    pub value: Option<u64>,
    pub error: Option<String>,
}

impl CounterProbe {
    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Open every [`CounterKind`] as one group, enable it, and read each member once.
///
/// Kinds the kernel refuses (no PMU, `perf_event_paranoid`, seccomp) are
/// reported as unavailable rather than failing the whole probe.
pub fn probe_all(pid: pid_t, cpu: c_int) -> Vec<CounterProbe> {
    let mut opened: Vec<Counter> = Vec::new();
    let mut results = Vec::with_capacity(CounterKind::ALL.len());

    for kind in CounterKind::ALL {
        match Counter::open(kind, pid, cpu, opened.first()) {
            Ok(counter) => opened.push(counter),
            Err(e) => {
                warn!(counter = %kind, error = %e, "perf counter unavailable");
                results.push(CounterProbe {
                    kind,
                    value: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if let Some(leader) = opened.first() {
        let started = leader.reset().and_then(|()| leader.enable_group());
        if let Err(e) = started {
            warn!(error = %e, "failed to enable perf counter group");
        }
    }

    for counter in &opened {
        let probe = match counter.read() {
            Ok(value) => CounterProbe {
                kind: counter.kind(),
                value: Some(value),
                error: None,
            },
            Err(e) => CounterProbe {
                kind: counter.kind(),
                value: None,
                error: Some(e.to_string()),
            },
        };
        results.push(probe);
    }

    if let Some(leader) = opened.first() {
        if let Err(e) = leader.disable_group() {
            warn!(error = %e, "failed to disable perf counter group");
        }
    }

    results.sort_by_key(|p| CounterKind::ALL.iter().position(|k| *k == p.kind));
    results
}
