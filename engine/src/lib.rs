//! Core of a GPIO bit-banged tester for 4164/41256 asynchronous DRAM.
//!
//! Runs March C− over every cell of the installed part, or, in the
//! alternate mode, measures access-time headroom along the address
//! diagonal. Platform-independent: a board supplies the GPIO and delay
//! primitives through [`bus::DramPort`], the LEDs through
//! [`indicator::StatusLeds`] and, for measurement mode, an input-capture
//! timer through [`measure::CaptureTimer`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
extern crate std;

// MUST be the first module listed
mod fmt;

pub mod prelude;

pub mod bus;
pub mod indicator;
pub mod march;
pub mod measure;
pub mod probe;
pub mod sim;

use embedded_hal::delay::DelayNs;

use bus::{DramBus, DramPort};
use indicator::{Indicator, StatusLeds};
use probe::ChipKind;

/// Bias-generator settle time after power-up. The datasheet asks for
/// 100 us; 500 us is the customary margin.
pub const POWER_UP_SETTLE_US: u32 = 500;

/// The whole tester: bus driver, LED latch, blocking delay, and the probed
/// geometry. One value, owned by the entry point; there is no other state.
pub struct Tester<P: DramPort, L: StatusLeds, D: DelayNs> {
    bus: DramBus<P>,
    indicator: Indicator<L>,
    delay: D,
    kind: ChipKind,
    faults: u32,
}

impl<P: DramPort, L: StatusLeds, D: DelayNs> Tester<P, L, D> {
    /// Wire up the tester. The part geometry defaults to 64K until
    /// [`probe`](Self::probe) has run.
    pub fn new(port: P, leds: L, delay: D) -> Self {
        Self {
            bus: DramBus::new(port),
            indicator: Indicator::new(leds),
            delay,
            kind: ChipKind::Dram64K,
            faults: 0,
        }
    }

    /// Power-up sequence: wait out the bias generator, then wake the part
    /// with RAS-only cycles.
    pub fn power_up(&mut self) {
        trace!("power-up: settle {} us, then wake", POWER_UP_SETTLE_US);
        self.delay.delay_us(POWER_UP_SETTLE_US);
        self.bus.wake();
    }

    /// Geometry selected by the probe (64K before the probe has run).
    pub fn kind(&self) -> ChipKind {
        self.kind
    }

    /// Skip the probe and pin the geometry, for rigs that already know
    /// what is socketed.
    pub fn assume_kind(&mut self, kind: ChipKind) {
        self.kind = kind;
    }

    /// Total verification mismatches observed since power-up.
    pub fn faults(&self) -> u32 {
        self.faults
    }
}
