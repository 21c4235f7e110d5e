//! Board HAL library: event bus, timers and input drivers.
//!
//! Exposes the pure-logic modules for integration testing and the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.
//!
//! ```text
//!  Button A ──┐                          ┌──▶ listeners on A
//!  Button B ──┼──▶ MessageBus ──▶ MultiButton (A+B) ──▶ listeners on AB
//!  Display  ──┘        │   ▲
//!   strobe             ▼   │
//!               LightSensor RadioEventRelay ◀──▶ ESP-NOW
//! ```

#![deny(unused_must_use)]

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod ports;
pub mod timer;

pub mod adapters;
pub mod drivers;
pub mod pins;

mod esp_link_shims;

pub use bus::{Delivery, ListenerId, MessageBus};
pub use error::{Error, Result};
pub use events::{ButtonEvent, Event};
pub use timer::{SoftTimer, TimerService};
