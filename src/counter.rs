//! Cycle and memory-stall instrumentation for timed invocations.
//!
//! # Scope
//! One `PerfCounter` exists per run. It wraps two channels:
//! - a free-running cycle counter (`rdtsc` on x86_64, `cntvct_el0` on
//!   aarch64, a monotonic-clock fallback elsewhere), and
//! - a memory-stall channel, a Linux perf_event hardware counter for
//!   backend stall cycles. The stall register is logically 8-bit; callers
//!   mask elapsed stall deltas with [`STALL_MASK`].
//!
//! # Invariants
//! - `enable` arms the channels at most once per process; a second call
//!   returns a counter whose stall channel is absent rather than
//!   re-arming or resetting a live channel.
//! - The stall channel may be unavailable (non-Linux host, missing PMU,
//!   permission denied). Stall samples then read 0 and
//!   `stalls_supported` is false; strict callers surface
//!   [`CounterError::StallChannel`] instead.
//!
//! # Known limitation
//! `elapsed` is a wrapping difference. A counter that wraps during a very
//! long sweep produces a deceptively small elapsed value; this mirrors
//! the narrow hardware counters the harness was built around and is not
//! corrected.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// The stall register is logically 8 bits wide; elapsed stall deltas are
/// masked to this width by consumers.
pub const STALL_MASK: u64 = 0xFF;

/// One arming per process. A second `enable` must not reset a live
/// stall channel mid-measurement.
static ARMED: AtomicBool = AtomicBool::new(false);

/// Errors surfaced while arming the counter.
#[derive(Debug)]
pub enum CounterError {
    /// The memory-stall channel could not be opened and the caller
    /// required it.
    StallChannel(io::Error),
}

impl std::fmt::Display for CounterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StallChannel(err) => write!(f, "stall channel unavailable: {err}"),
        }
    }
}

impl std::error::Error for CounterError {}

/// Owned handle over the cycle counter and the memory-stall channel.
///
/// Single-writer discipline: the counter is passed by shared reference
/// and only sampled; the stall channel is armed once by `enable` and
/// never mutated during a measurement.
#[derive(Debug)]
pub struct PerfCounter {
    stalls: StallChannel,
}

impl PerfCounter {
    /// Arm the cycle counter and the stall channel, resetting the stall
    /// channel to zero. Call once before any measurement.
    ///
    /// If `strict_stalls` is set and the stall channel cannot be opened,
    /// returns [`CounterError::StallChannel`]; otherwise the counter
    /// comes up with the stall channel absent and stall samples read 0.
    ///
    /// A second call in the same process does not re-arm: it yields a
    /// counter without a stall channel (the cycle counter is free-running
    /// hardware state and needs no arming).
    pub fn enable(strict_stalls: bool) -> Result<Self, CounterError> {
        if ARMED.swap(true, Ordering::SeqCst) {
            if strict_stalls {
                return Err(CounterError::StallChannel(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "stall channel already armed by an earlier enable",
                )));
            }
            return Ok(Self {
                stalls: StallChannel::absent(),
            });
        }

        match StallChannel::open() {
            Ok(stalls) => Ok(Self { stalls }),
            Err(err) if strict_stalls => Err(CounterError::StallChannel(err)),
            Err(_) => Ok(Self {
                stalls: StallChannel::absent(),
            }),
        }
    }

    /// Current raw cycle-counter value.
    #[inline]
    pub fn sample_cycles(&self) -> u64 {
        read_cycles()
    }

    /// Current raw stall-counter value; 0 when the channel is absent.
    #[inline]
    pub fn sample_stalls(&self) -> u64 {
        self.stalls.read()
    }

    /// Whether the stall channel is live on this host.
    pub fn stalls_supported(&self) -> bool {
        self.stalls.is_open()
    }

    /// Wrapping difference between two raw samples.
    ///
    /// Correct across a single counter wrap; a wrap during a very long
    /// measurement still yields a deceptively small value (documented
    /// limitation).
    #[inline]
    pub fn elapsed(start: u64, stop: u64) -> u64 {
        stop.wrapping_sub(start)
    }
}

/// Current value of the platform cycle counter.
#[inline(always)]
fn read_cycles() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        // Unserialized on purpose: the harness brackets a whole routine
        // call, where fence overhead would dominate small moves.
        unsafe { core::arch::x86_64::_rdtsc() }
    }

    #[cfg(target_arch = "aarch64")]
    {
        // CNTVCT_EL0: fixed-frequency virtual timer, userspace-readable.
        let val: u64;
        unsafe {
            core::arch::asm!("mrs {}, cntvct_el0", out(reg) val);
        }
        val
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        use std::sync::OnceLock;
        use std::time::Instant;
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_nanos() as u64
    }
}

/// Linux perf_event channel counting backend memory-pipeline stalls.
///
/// Falls back gracefully when the counter is unavailable (non-Linux host,
/// permission denied, unsupported PMU).
#[cfg(target_os = "linux")]
#[derive(Debug)]
struct StallChannel {
    fd: std::os::unix::io::RawFd,
}

#[cfg(target_os = "linux")]
impl StallChannel {
    fn open() -> io::Result<Self> {
        let mut attr = PerfEventAttr::new();
        attr.type_ = PERF_TYPE_HARDWARE;
        attr.config = PERF_COUNT_HW_STALLED_CYCLES_BACKEND;
        let fd = perf_event_open(&attr);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // Reset to zero and start counting before the first case runs.
        unsafe {
            libc::ioctl(fd, PERF_EVENT_IOC_RESET, 0);
            libc::ioctl(fd, PERF_EVENT_IOC_ENABLE, 0);
        }
        Ok(Self { fd })
    }

    fn absent() -> Self {
        Self { fd: -1 }
    }

    fn is_open(&self) -> bool {
        self.fd >= 0
    }

    fn read(&self) -> u64 {
        if self.fd < 0 {
            return 0;
        }
        let mut value: u64 = 0;
        let bytes = unsafe {
            libc::read(
                self.fd,
                &mut value as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if bytes == std::mem::size_of::<u64>() as isize {
            value
        } else {
            0
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for StallChannel {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
struct StallChannel;

#[cfg(not(target_os = "linux"))]
impl StallChannel {
    fn open() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "perf_event stall counters require Linux",
        ))
    }

    fn absent() -> Self {
        Self
    }

    fn is_open(&self) -> bool {
        false
    }

    fn read(&self) -> u64 {
        0
    }
}

// =============================================================================
// Linux perf_event plumbing
// See: https://man7.org/linux/man-pages/man2/perf_event_open.2.html
// =============================================================================

/// Attribute structure for the perf_event_open syscall.
///
/// Matches the kernel's `struct perf_event_attr` layout.
#[cfg(target_os = "linux")]
#[repr(C)]
#[derive(Clone, Copy)]
struct PerfEventAttr {
    type_: u32,
    size: u32,
    config: u64,
    sample_period_or_freq: u64,
    sample_type: u64,
    read_format: u64,
    flags: u64,
    wakeup_events: u32,
    bp_type: u32,
    config1: u64,
    config2: u64,
}

#[cfg(target_os = "linux")]
impl PerfEventAttr {
    fn new() -> Self {
        let mut attr = Self {
            type_: 0,
            size: std::mem::size_of::<Self>() as u32,
            config: 0,
            sample_period_or_freq: 0,
            sample_type: 0,
            read_format: 0,
            flags: 0,
            wakeup_events: 0,
            bp_type: 0,
            config1: 0,
            config2: 0,
        };
        attr.flags |= PERF_ATTR_FLAG_DISABLED;
        attr.flags |= PERF_ATTR_FLAG_EXCLUDE_KERNEL;
        attr.flags |= PERF_ATTR_FLAG_EXCLUDE_HV;
        attr
    }
}

#[cfg(target_os = "linux")]
const PERF_TYPE_HARDWARE: u32 = 0;
#[cfg(target_os = "linux")]
const PERF_COUNT_HW_STALLED_CYCLES_BACKEND: u64 = 8;

#[cfg(target_os = "linux")]
const PERF_ATTR_FLAG_DISABLED: u64 = 1 << 0;
#[cfg(target_os = "linux")]
const PERF_ATTR_FLAG_EXCLUDE_KERNEL: u64 = 1 << 5;
#[cfg(target_os = "linux")]
const PERF_ATTR_FLAG_EXCLUDE_HV: u64 = 1 << 6;

#[cfg(target_os = "linux")]
const IOC_NRBITS: u64 = 8;
#[cfg(target_os = "linux")]
const IOC_TYPEBITS: u64 = 8;
#[cfg(target_os = "linux")]
const IOC_SIZEBITS: u64 = 14;

#[cfg(target_os = "linux")]
const IOC_NRSHIFT: u64 = 0;
#[cfg(target_os = "linux")]
const IOC_TYPESHIFT: u64 = IOC_NRSHIFT + IOC_NRBITS;
#[cfg(target_os = "linux")]
const IOC_SIZESHIFT: u64 = IOC_TYPESHIFT + IOC_TYPEBITS;
#[cfg(target_os = "linux")]
const IOC_DIRSHIFT: u64 = IOC_SIZESHIFT + IOC_SIZEBITS;
#[cfg(target_os = "linux")]
const IOC_NONE: u64 = 0;

#[cfg(target_os = "linux")]
const fn ioc(dir: u64, type_: u64, nr: u64, size: u64) -> u64 {
    (dir << IOC_DIRSHIFT) | (type_ << IOC_TYPESHIFT) | (nr << IOC_NRSHIFT) | (size << IOC_SIZESHIFT)
}

#[cfg(target_os = "linux")]
const fn io(type_: u64, nr: u64) -> u64 {
    ioc(IOC_NONE, type_, nr, 0)
}

#[cfg(target_os = "linux")]
const PERF_EVENT_IOC_ENABLE: libc::c_ulong = io(b'$' as u64, 0) as libc::c_ulong;
#[cfg(target_os = "linux")]
const PERF_EVENT_IOC_RESET: libc::c_ulong = io(b'$' as u64, 3) as libc::c_ulong;

/// Opens a perf event counter for the calling thread. Returns the fd on
/// success, -1 on failure.
#[cfg(target_os = "linux")]
fn perf_event_open(attr: &PerfEventAttr) -> std::os::unix::io::RawFd {
    let ret = unsafe {
        libc::syscall(
            libc::SYS_perf_event_open,
            attr as *const PerfEventAttr,
            0 as libc::c_int,
            -1 as libc::c_int,
            -1 as libc::c_int,
            0 as libc::c_ulong,
        )
    };
    if ret < 0 {
        -1
    } else {
        ret as std::os::unix::io::RawFd
    }
}
