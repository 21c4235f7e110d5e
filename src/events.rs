//! Event model and interrupt-side event queue.
//!
//! Every notification on the board is an [`Event`]: a `(source, value)`
//! pair.  `source` names the component that raised it (a button, the
//! display, the radio), `value` says what happened.
//!
//! Events are produced by:
//! - Drivers ticked from the main loop (buttons, light sensor)
//! - GPIO ISRs and timer callbacks, through [`push_event`]
//! - Composite components re-publishing derived events (multi-button)
//! - The radio relay, for events received from other boards
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐     ┌───────────┐
//! │ GPIO ISR    │────▶│  ISR queue   │────▶│  Main loop   │────▶│           │
//! │ Timer ISR   │────▶│  (lock-free) │     │  drain       │     │ MessageBus│
//! └─────────────┘     └──────────────┘     └──────────────┘     │ (sync     │
//! ┌─────────────┐                                               │  publish) │
//! │ Drivers     │──────────────────────────────────────────────▶│           │
//! └─────────────┘                                               └───────────┘
//! ```

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Wildcard for either half of a listener filter.
pub const ANY: u16 = 0;

// ── Source identifiers ────────────────────────────────────────

/// Left push button.
pub const ID_BUTTON_A: u16 = 1;
/// Right push button.
pub const ID_BUTTON_B: u16 = 2;
/// LED matrix display (raises the light-sense strobe).
pub const ID_DISPLAY: u16 = 6;
/// Light sensor sampler.
pub const ID_LIGHT_SENSOR: u16 = 17;
/// Composite "both buttons" virtual button.
pub const ID_BUTTON_AB: u16 = 26;
/// Radio relay.
pub const ID_RADIO: u16 = 29;

// ── Value codes ───────────────────────────────────────────────

/// Display strobe asking the light sensor to sample its next channel.
pub const DISPLAY_EVT_LIGHT_SENSE: u16 = 4;

/// Values published by physical and virtual buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ButtonEvent {
    Down = 1,
    Up = 2,
    Click = 3,
    LongClick = 4,
    Hold = 5,
    /// Reserved; no driver in this crate synthesizes it.
    DoubleClick = 6,
}

impl ButtonEvent {
    /// Raw bus value for this event.
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Decode a raw bus value.
    pub fn from_value(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::Down),
            2 => Some(Self::Up),
            3 => Some(Self::Click),
            4 => Some(Self::LongClick),
            5 => Some(Self::Hold),
            6 => Some(Self::DoubleClick),
            _ => None,
        }
    }
}

/// A single notification travelling over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub source: u16,
    pub value: u16,
}

impl Event {
    pub const fn new(source: u16, value: u16) -> Self {
        Self { source, value }
    }

    /// Shorthand for a button notification.
    pub const fn button(source: u16, event: ButtonEvent) -> Self {
        Self::new(source, event.value())
    }

    /// The value decoded as a button event, if it is one.
    pub fn button_event(&self) -> Option<ButtonEvent> {
        ButtonEvent::from_value(self.value)
    }

    /// True if this event passes a `(source, value)` filter where either
    /// half may be [`ANY`].
    pub fn matches(&self, source: u16, value: u16) -> bool {
        (source == ANY || source == self.source) && (value == ANY || value == self.value)
    }

    const fn pack(self) -> u32 {
        ((self.source as u32) << 16) | self.value as u32
    }

    const fn unpack(raw: u32) -> Self {
        Self::new((raw >> 16) as u16, raw as u16)
    }
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// ISRs write (produce), main loop reads (consume) and forwards into the
// bus.  Each slot holds a packed `Event` so no `static mut` is needed.

/// Maximum number of pending interrupt-side events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 32;

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
static EVENT_SLOTS: [AtomicU32; EVENT_QUEUE_CAP] = [const { AtomicU32::new(0) }; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from ISR context (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full, drop event.
    }

    EVENT_SLOTS[head as usize].store(event.pack(), Ordering::Relaxed);
    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None;
    }

    let raw = EVENT_SLOTS[tail as usize].load(Ordering::Relaxed);
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    Some(Event::unpack(raw))
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

/// Number of pending events.
pub fn queue_len() -> usize {
    let head = EVENT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = EVENT_TAIL.load(Ordering::Relaxed) as usize;
    (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
}
