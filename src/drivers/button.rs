//! Debounced GPIO push-button driver.
//!
//! ## Hardware
//!
//! Momentary switch on any `embedded_hal::digital::InputPin`.  Active-low
//! with a pull-up by default.  The driver polls: `tick()` is called from
//! the main loop at the board tick rate, samples the pin and runs the
//! debounce + gesture state machine, publishing onto the bus under the
//! button's own id.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                                 | Event              |
//! |-------------|-------------------------------------------|--------------------|
//! | Press       | Level stable for `debounce_ms`            | `Down`             |
//! | Hold        | Still pressed after `hold_ms` (once)      | `Hold`             |
//! | Release     | Level stable for `debounce_ms`            | `Up`               |
//! | Click       | Released before `long_click_ms`           | `Click`            |
//! | Long click  | Released at or after `long_click_ms`      | `LongClick`        |
//!
//! `Hold`, `Click` and `LongClick` are only published with
//! [`EventConfiguration::AllEvents`].

use std::rc::Rc;

use embedded_hal::digital::InputPin;
use log::warn;

use crate::bus::MessageBus;
use crate::config::{ButtonConfig, EventConfiguration};
use crate::events::{ButtonEvent, Event};

/// Internal state machine for press detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Released,
    DebouncePress { since_ms: u32 },
    Pressed { since_ms: u32, hold_fired: bool },
    DebounceRelease { since_ms: u32, pressed_ms: u32, hold_fired: bool },
}

pub struct Button<P> {
    id: u16,
    pin: P,
    bus: Rc<MessageBus>,
    config: ButtonConfig,
    state: PressState,
}

impl<P: InputPin> Button<P> {
    /// Caller must configure the pin (pull-up/down) before handing it over.
    pub fn new(id: u16, pin: P, bus: Rc<MessageBus>, config: ButtonConfig) -> Self {
        Self {
            id,
            pin,
            bus,
            config,
            state: PressState::Released,
        }
    }

    /// Bus id this button publishes under.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Debounced press state.
    pub fn is_pressed(&self) -> bool {
        matches!(
            self.state,
            PressState::Pressed { .. } | PressState::DebounceRelease { .. }
        )
    }

    pub fn set_event_configuration(&mut self, events: EventConfiguration) {
        self.config.events = events;
    }

    /// Call from the main loop at each board tick.
    /// `now_ms` is the current monotonic time in milliseconds.
    /// Returns the press-level event published this tick, if any.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let level = match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Button {}: pin read failed ({:?}), sample skipped", self.id, e);
                return None;
            }
        };
        let raw_pressed = level == self.config.active_low;
        let debounce = self.config.debounce_ms;
        let all_events = self.config.events == EventConfiguration::AllEvents;

        match self.state {
            PressState::Released => {
                if raw_pressed {
                    self.state = PressState::DebouncePress { since_ms: now_ms };
                }
                None
            }

            PressState::DebouncePress { since_ms } => {
                if !raw_pressed {
                    self.state = PressState::Released;
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) < debounce {
                    return None;
                }
                self.state = PressState::Pressed {
                    since_ms,
                    hold_fired: false,
                };
                self.publish(ButtonEvent::Down);
                Some(ButtonEvent::Down)
            }

            PressState::Pressed { since_ms, hold_fired } => {
                if !raw_pressed {
                    self.state = PressState::DebounceRelease {
                        since_ms: now_ms,
                        pressed_ms: since_ms,
                        hold_fired,
                    };
                    return None;
                }
                if !hold_fired && now_ms.wrapping_sub(since_ms) >= self.config.hold_ms {
                    self.state = PressState::Pressed {
                        since_ms,
                        hold_fired: true,
                    };
                    if all_events {
                        self.publish(ButtonEvent::Hold);
                        return Some(ButtonEvent::Hold);
                    }
                }
                None
            }

            PressState::DebounceRelease {
                since_ms,
                pressed_ms,
                hold_fired,
            } => {
                if raw_pressed {
                    // Contact bounce: still the same press.
                    self.state = PressState::Pressed {
                        since_ms: pressed_ms,
                        hold_fired,
                    };
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) < debounce {
                    return None;
                }
                self.state = PressState::Released;
                self.publish(ButtonEvent::Up);
                if all_events {
                    let held_ms = since_ms.wrapping_sub(pressed_ms);
                    self.publish(if held_ms >= self.config.long_click_ms {
                        ButtonEvent::LongClick
                    } else {
                        ButtonEvent::Click
                    });
                }
                Some(ButtonEvent::Up)
            }
        }
    }

    fn publish(&self, event: ButtonEvent) {
        self.bus.publish(Event::button(self.id, event));
    }
}
