//! Port traits: the boundary between driver logic and the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Driver (pure logic, host-testable)
//! ```
//!
//! Peripheral adapters (ESP-IDF timers, ADC channels, the I2C controller,
//! ESP-NOW) implement these traits.  Drivers consume them via generics,
//! so every state machine in [`drivers`](crate::drivers) runs unchanged
//! against the mocks in the test suite.
//!
//! GPIO and I2C go through `embedded-hal` 1.0 directly; the traits here
//! cover what `embedded-hal` does not.

use crate::error::{I2cError, RadioError, Result};

// ───────────────────────────────────────────────────────────────
// One-shot timer (hold detection, ADC settle time)
// ───────────────────────────────────────────────────────────────

/// Single-shot scheduled callback.
///
/// The callback runs in the same cooperative context as the bus (from
/// the main loop's timer tick), never from an interrupt.
pub trait OneShotTimer {
    /// Schedule `on_expiry` to run once after `duration_ms`.
    /// Arming again replaces any schedule still pending.  Fails if the
    /// backing timer has no room; nothing is scheduled then.
    fn arm(&mut self, duration_ms: u32, on_expiry: Box<dyn FnOnce()>) -> Result<()>;

    /// Drop the pending schedule, if any.  After this returns the
    /// callback will not run.
    fn cancel(&mut self);

    /// True while a schedule is pending.
    fn is_armed(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Light sensing (display matrix used as a photodiode array)
// ───────────────────────────────────────────────────────────────

/// Analog access to the display columns used for light sensing.
pub trait LightSensePort {
    type Error: core::fmt::Debug;

    /// Take over the pin for `channel` and start charging it as an input.
    fn start(&mut self, channel: usize);

    /// Sample the channel selected by the last [`start`](Self::start).
    fn read_raw(&mut self) -> core::result::Result<u16, Self::Error>;

    /// Hand the pin back to the display driver.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// I2C bus recovery
// ───────────────────────────────────────────────────────────────

/// Resets a wedged I2C controller between retries (power-cycle the
/// peripheral, clock out a stuck slave, etc.).
pub trait BusRecovery {
    fn recover(&mut self) -> core::result::Result<(), I2cError>;
}

// ───────────────────────────────────────────────────────────────
// Radio
// ───────────────────────────────────────────────────────────────

/// Broadcast transmit side of a short-range radio.
pub trait RadioPort {
    /// Transmit one frame to every board in range.
    fn send(&mut self, frame: &[u8]) -> core::result::Result<(), RadioError>;
}
