//! Tick sources for measuring candidate calls.
//!
//! Provides:
//! - `CycleClock`: hardware counter (`lfence; rdtsc` on x86_64, `isb; mrs cntvct_el0`
//!   on aarch64, monotonic nanoseconds elsewhere)
//! - `MonotonicClock`: nanoseconds since first use, via `std::time::Instant`
//! - `ManualClock`: deterministic, test-driven clock that also counts reads
//!
//! A dispatcher reads its clock exactly twice per timed call and never for
//! untimed calls, so the clock only has to be cheap, not cheap *and* rare.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Instant;

use crate::selector::Ticks;

/// A monotonic source of [`Ticks`].
pub trait Clock {
    /// Current reading. Only differences between readings are meaningful.
    fn now(&self) -> Ticks;
}

impl<K: Clock + ?Sized> Clock for &K {
    #[inline]
    fn now(&self) -> Ticks {
        (**self).now()
    }
}

/// Hardware cycle counter.
///
/// Ticks are CPU timestamp-counter cycles on x86_64 and virtual timer counts on
/// aarch64 (a fixed-frequency counter, not core cycles). Other targets fall back
/// to [`MonotonicClock`] nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleClock;

impl CycleClock {
    /// Create a cycle clock.
    pub fn new() -> Self {
        CycleClock
    }

    /// Name of the underlying counter, for diagnostics.
    pub fn name(&self) -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            "rdtsc"
        }
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            "instant"
        }
    }
}

impl Clock for CycleClock {
    #[inline(always)]
    fn now(&self) -> Ticks {
        Ticks(read_cycles())
    }
}

/// Read the hardware counter with enough serialization that the candidate's
/// instructions are not reordered across the reading.
#[inline(always)]
pub fn read_cycles() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        read_cycles_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        read_cycles_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        monotonic_nanos()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles_x86_64() -> u64 {
    use core::arch::x86_64::{_mm_lfence, _rdtsc};
    // SAFETY: lfence and rdtsc are available on every x86_64 CPU and touch no memory.
    unsafe {
        // Wait for prior instructions to retire before reading the counter
        _mm_lfence();
        let cycles = _rdtsc();
        _mm_lfence();
        cycles
    }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles_aarch64() -> u64 {
    let cycles: u64;
    // SAFETY: cntvct_el0 is readable from EL0 on every aarch64 OS we target.
    unsafe {
        core::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }
    cycles
}

/// Nanoseconds elapsed since the first call in this process.
#[inline]
pub fn monotonic_nanos() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

/// Monotonic wall-clock nanoseconds.
///
/// Portable and comparable across machines, at the cost of a slower read than
/// [`CycleClock`] on x86_64.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Ticks {
        Ticks(monotonic_nanos())
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Cell<u64>,
    reads: Cell<u64>,
}

/// Deterministic clock advanced by hand.
///
/// Clones share the same time and read counter, so a test can hand one clone
/// to a dispatcher and advance another from inside the candidates:
///
/// ```ignore
/// let clock = ManualClock::new();
/// let c0 = clock.clone();
/// let c1 = clock.clone();
/// let mut d = AdaptiveDispatcher::with_clock(
///     (move |()| c0.advance(30), move |()| c1.advance(10)),
///     clock.clone(),
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    state: Rc<ManualState>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, ticks: u64) {
        let state = &self.state;
        state.now.set(state.now.get().saturating_add(ticks));
    }

    /// Current time without counting it as a read.
    pub fn peek(&self) -> Ticks {
        Ticks(self.state.now.get())
    }

    /// Number of times [`Clock::now`] was called on this clock or its clones.
    pub fn reads(&self) -> u64 {
        self.state.reads.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        let state = &self.state;
        state.reads.set(state.reads.get() + 1);
        Ticks(state.now.get())
    }
}
