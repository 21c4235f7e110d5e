//! Bus events over the radio.
//!
//! [`RadioEventRelay`] mirrors selected local bus events to every board
//! in the same radio group, and republishes events received from them on
//! the local bus.
//!
//! Wire format (one radio packet per event):
//! ```text
//! ┌─────┬─────────┬───────┬──────────┬──────────────────────────┐
//! │ len │ version │ group │ protocol │ postcard-encoded Event   │
//! │ u8  │ u8 (=1) │ u8    │ u8       │ (varint source, value)   │
//! └─────┴─────────┴───────┴──────────┴──────────────────────────┘
//! ```
//! `len` counts every byte after itself.
//!
//! Received events are published with forwarding suppressed, so a board
//! listening on the same ids does not echo them back into the air.

use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, trace, warn};

use crate::bus::{ListenerId, MessageBus};
use crate::config::RadioConfig;
use crate::error::{BusError, RadioError, Result};
use crate::events::Event;
use crate::ports::RadioPort;

/// Frame format revision.
pub const FRAME_VERSION: u8 = 1;

/// Protocol byte for relayed bus events.
pub const PROTOCOL_EVENT_BUS: u8 = 2;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest frame the relay builds or accepts.
pub const MAX_FRAME: usize = 32;

/// Maximum number of `(source, value)` filters forwarded to the radio.
pub const MAX_FORWARDS: usize = 8;

/// Raw packet as handed over by the radio driver.
pub type RadioPacket = heapless::Vec<u8, MAX_FRAME>;

/// Packets received by the radio driver's callback, drained by the main
/// loop into [`RadioEventRelay::packet_received`].
pub static RADIO_RX_CHANNEL: Channel<CriticalSectionRawMutex, RadioPacket, 8> = Channel::new();

/// A decoded event frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioFrame {
    pub group: u8,
    pub event: Event,
}

/// Build the radio frame carrying `event` for `group`.
pub fn encode_frame(event: &Event, group: u8) -> Result<RadioPacket> {
    let mut buf = [0u8; MAX_FRAME];
    let payload_len = postcard::to_slice(event, &mut buf[HEADER_SIZE..])
        .map_err(|_| RadioError::Codec)?
        .len();
    let total = HEADER_SIZE + payload_len;

    buf[0] = (total - 1) as u8;
    buf[1] = FRAME_VERSION;
    buf[2] = group;
    buf[3] = PROTOCOL_EVENT_BUS;

    Ok(RadioPacket::from_slice(&buf[..total]).map_err(|_| RadioError::Codec)?)
}

/// Parse a received radio frame.  Never panics on malformed input.
pub fn decode_frame(bytes: &[u8]) -> Result<RadioFrame> {
    if bytes.len() < HEADER_SIZE || usize::from(bytes[0]) + 1 != bytes.len() {
        return Err(RadioError::Truncated.into());
    }
    if bytes[1] != FRAME_VERSION {
        return Err(RadioError::BadVersion(bytes[1]).into());
    }
    if bytes[3] != PROTOCOL_EVENT_BUS {
        return Err(RadioError::WrongProtocol(bytes[3]).into());
    }
    let event: Event =
        postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|_| RadioError::Codec)?;
    Ok(RadioFrame {
        group: bytes[2],
        event,
    })
}

struct Forward {
    source: u16,
    value: u16,
    id: ListenerId,
}

pub struct RadioEventRelay<R: RadioPort + 'static> {
    inner: Rc<Inner<R>>,
}

struct Inner<R: RadioPort> {
    me: Weak<Inner<R>>,
    bus: Rc<MessageBus>,
    radio: RefCell<R>,
    group: u8,
    /// Set while a received event is being republished.
    suppress_forwarding: Cell<bool>,
    forwards: RefCell<heapless::Vec<Forward, MAX_FORWARDS>>,
}

impl<R: RadioPort + 'static> RadioEventRelay<R> {
    pub fn new(bus: Rc<MessageBus>, radio: R, config: &RadioConfig) -> Self {
        let inner = Rc::new_cyclic(|me| Inner {
            me: me.clone(),
            bus,
            radio: RefCell::new(radio),
            group: config.group,
            suppress_forwarding: Cell::new(false),
            forwards: RefCell::new(heapless::Vec::new()),
        });
        Self { inner }
    }

    pub fn group(&self) -> u8 {
        self.inner.group
    }

    /// Forward local bus events matching `(source, value)` to the radio.
    /// Wildcards follow the bus rules.
    pub fn listen(&self, source: u16, value: u16) -> Result<ListenerId> {
        let inner = &self.inner;
        if inner.forwards.borrow().is_full() {
            return Err(BusError::Full.into());
        }

        let me = inner.me.clone();
        let id = inner.bus.listen(source, value, move |event| {
            if let Some(inner) = me.upgrade() {
                inner.forward(event);
            }
        })?;
        // Capacity checked above.
        let _ = inner.forwards.borrow_mut().push(Forward { source, value, id });
        debug!("Radio: forwarding ({}, {}) on group {}", source, value, inner.group);
        Ok(id)
    }

    /// Stop forwarding `(source, value)`.  Returns `false` if it was not
    /// being forwarded.
    pub fn ignore(&self, source: u16, value: u16) -> bool {
        let removed = {
            let mut forwards = self.inner.forwards.borrow_mut();
            forwards
                .iter()
                .position(|f| f.source == source && f.value == value)
                .map(|idx| forwards.swap_remove(idx))
        };
        match removed {
            Some(f) => self.inner.bus.ignore(f.id),
            None => false,
        }
    }

    /// Handle one packet from the radio: decode it and republish the event
    /// locally.  Frames for other groups are dropped silently.
    pub fn packet_received(&self, bytes: &[u8]) -> Result<()> {
        let frame = decode_frame(bytes).inspect_err(|e| {
            warn!("Radio: dropped frame ({}): {:02x?}", e, bytes);
        })?;
        if frame.group != self.inner.group {
            trace!("Radio: frame for group {} ignored", frame.group);
            return Ok(());
        }

        let previous = self.inner.suppress_forwarding.replace(true);
        self.inner.bus.publish(frame.event);
        self.inner.suppress_forwarding.set(previous);
        Ok(())
    }

    /// Feed every packet queued on [`RADIO_RX_CHANNEL`] through
    /// [`packet_received`](Self::packet_received).  Returns how many were
    /// taken off the queue.
    pub fn drain_received(&self) -> usize {
        let mut count = 0;
        while let Ok(packet) = RADIO_RX_CHANNEL.try_receive() {
            let _ = self.packet_received(&packet);
            count += 1;
        }
        count
    }
}

impl<R: RadioPort + 'static> Drop for RadioEventRelay<R> {
    fn drop(&mut self) {
        let forwards = core::mem::take(&mut *self.inner.forwards.borrow_mut());
        for f in forwards {
            self.inner.bus.ignore(f.id);
        }
    }
}

impl<R: RadioPort> Inner<R> {
    fn forward(&self, event: Event) {
        if self.suppress_forwarding.get() {
            return;
        }
        let sent = encode_frame(&event, self.group)
            .and_then(|frame| Ok(self.radio.borrow_mut().send(&frame)?));
        if let Err(e) = sent {
            warn!("Radio: forward of {:?} failed: {}", event, e);
        }
    }
}
