//! Synchronous publish/subscribe notification bus.
//!
//! Drivers publish [`Event`]s; listeners registered for a matching
//! `(source, value)` filter are called **immediately**, on the
//! publisher's stack.  There is no queue between publish and delivery,
//! so a listener that publishes in turn is re-entered before the outer
//! `publish` returns.
//!
//! ```text
//!  publish(e) ──▶ interceptors (source, value) ──▶ Forward? ──▶ listeners
//!                        │
//!                        └── Withhold ──▶ plain listeners skipped
//! ```
//!
//! Interceptors exist so a component that consumes another component's
//! notifications (the multi-button) can keep them from reaching that
//! component's ordinary listeners.  Interceptors always see the event,
//! even when another interceptor withholds it.
//!
//! The bus is single-threaded by construction (`Rc` + `RefCell`); share it
//! by passing an `Rc<MessageBus>` to every driver that needs it.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, trace};

use crate::error::{BusError, Result};
use crate::events::Event;

/// Maximum number of simultaneous registrations (listeners + interceptors).
pub const MAX_LISTENERS: usize = 32;

/// Handle returned by [`MessageBus::listen`] / [`MessageBus::intercept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Verdict of an interceptor on a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Let plain listeners see the event.
    Forward,
    /// Keep the event from plain listeners.
    Withhold,
}

enum Handler {
    Listen(Box<dyn Fn(Event)>),
    Intercept(Box<dyn Fn(Event) -> Delivery>),
}

struct Registration {
    id: ListenerId,
    source: u16,
    value: u16,
    /// Cleared by `ignore`; a registration snapshotted by an in-flight
    /// publish is skipped once this is false.
    active: Cell<bool>,
    handler: Handler,
}

/// The notification bus.
pub struct MessageBus {
    registrations: RefCell<heapless::Vec<Rc<Registration>, MAX_LISTENERS>>,
    next_id: Cell<u32>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(heapless::Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register `handler` for events matching `(source, value)`.
    /// Either half may be [`ANY`](crate::events::ANY).
    pub fn listen<F>(&self, source: u16, value: u16, handler: F) -> Result<ListenerId>
    where
        F: Fn(Event) + 'static,
    {
        self.register(source, value, Handler::Listen(Box::new(handler)))
    }

    /// Register an interceptor.  It runs before every plain listener and
    /// may withhold the event from them.
    pub fn intercept<F>(&self, source: u16, value: u16, handler: F) -> Result<ListenerId>
    where
        F: Fn(Event) -> Delivery + 'static,
    {
        self.register(source, value, Handler::Intercept(Box::new(handler)))
    }

    /// Remove a registration.  Returns `false` if it was already gone.
    ///
    /// Safe to call from inside a handler: once this returns, the removed
    /// handler is never invoked again, not even by a publish that is
    /// already in flight further up the stack.
    pub fn ignore(&self, id: ListenerId) -> bool {
        let removed = {
            let mut regs = self.registrations.borrow_mut();
            regs.iter()
                .position(|r| r.id == id)
                .map(|idx| regs.remove(idx))
        };
        // The table borrow is released before the handler is dropped, in
        // case dropping it releases something that touches the bus.
        match removed {
            Some(reg) => {
                reg.active.set(false);
                debug!("bus: ignore #{} ({}, {})", id.0, reg.source, reg.value);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` synchronously.
    ///
    /// Returns the number of plain listeners that received it (zero when
    /// an interceptor withheld it).
    pub fn publish(&self, event: Event) -> usize {
        // Snapshot the matching registrations so handlers are free to
        // listen, ignore or publish while we iterate.
        let matching: heapless::Vec<Rc<Registration>, MAX_LISTENERS> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| event.matches(r.source, r.value))
            .cloned()
            .collect();

        let mut withheld = false;
        for reg in &matching {
            if let Handler::Intercept(handler) = &reg.handler {
                if reg.active.get() && handler(event) == Delivery::Withhold {
                    withheld = true;
                }
            }
        }

        if withheld {
            trace!("bus: ({}, {}) withheld", event.source, event.value);
            return 0;
        }

        let mut delivered = 0;
        for reg in &matching {
            if let Handler::Listen(handler) = &reg.handler {
                if reg.active.get() {
                    handler(event);
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Number of live registrations.
    pub fn listener_count(&self) -> usize {
        self.registrations.borrow().len()
    }

    // ── Internal ──────────────────────────────────────────────

    fn register(&self, source: u16, value: u16, handler: Handler) -> Result<ListenerId> {
        let id = ListenerId(self.next_id.get());
        let reg = Rc::new(Registration {
            id,
            source,
            value,
            active: Cell::new(true),
            handler,
        });

        self.registrations
            .borrow_mut()
            .push(reg)
            .map_err(|_| BusError::Full)?;
        self.next_id.set(self.next_id.get().wrapping_add(1));
        debug!("bus: listen #{} ({}, {})", id.0, source, value);
        Ok(id)
    }
}
