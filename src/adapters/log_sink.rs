//! Bus event log sink.
//!
//! Registers a wildcard listener that writes every bus event to the
//! logger (UART / USB-CDC in production), with button values decoded.

use std::rc::Rc;

use log::info;

use crate::bus::{ListenerId, MessageBus};
use crate::error::Result;
use crate::events::{ANY, Event};

/// Logs every event published on the bus while alive.
pub struct BusLogSink {
    bus: Rc<MessageBus>,
    id: ListenerId,
}

impl BusLogSink {
    pub fn attach(bus: Rc<MessageBus>) -> Result<Self> {
        let id = bus.listen(ANY, ANY, |event| info!("EVENT | {}", describe(event)))?;
        Ok(Self { bus, id })
    }
}

impl Drop for BusLogSink {
    fn drop(&mut self) {
        self.bus.ignore(self.id);
    }
}

/// One-line human-readable form of an event.
pub fn describe(event: Event) -> String {
    match event.button_event() {
        Some(b) => format!("src={} {:?}", event.source, b),
        None => format!("src={} value={}", event.source, event.value),
    }
}
