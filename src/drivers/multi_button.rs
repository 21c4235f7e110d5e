//! Virtual button synthesized from two physical buttons.
//!
//! A `MultiButton` watches the DOWN/UP notifications of two constituent
//! buttons (A and B) and reports a third, composite button that is
//! "pressed" exactly while both constituents are held.
//!
//! ## Gesture detection
//!
//! | Transition                    | Composite events                         |
//! |-------------------------------|------------------------------------------|
//! | at most one held → both held  | `Down`, hold timer armed                 |
//! | hold timer expires, both held | `Hold` (all-events only)                 |
//! | both held → one released      | `Up`, then `Click` or `LongClick` (all-events only) |
//!
//! ## Suppression
//!
//! While a composite gesture is active, the constituents' own
//! notifications are withheld from listeners registered on their ids:
//! the composite already reports the equivalent gesture.  The
//! notification that completes the gesture and the one that ends it are
//! withheld as well; DOWN/UP forwarding resumes with the next one.
//!
//! A constituent that took part in a gesture keeps its HOLD, CLICK and
//! LONG_CLICK withheld until it is pressed again, so the click a physical
//! button reports after its release never doubles the composite's.
//!
//! ```text
//!  A: DOWN ──────────────────── UP(withheld), CLICK(withheld)
//!  B:        DOWN(withheld) ──────────────────── UP ─▶ forwarded, CLICK(withheld)
//! AB:        DOWN ─── (HOLD) ── UP, CLICK|LONG_CLICK
//! ```
//!
//! The release reports LONG_CLICK if the composite HOLD fired, or if both
//! constituents reported their own HOLD before it.

use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use crate::bus::{Delivery, ListenerId, MessageBus};
use crate::config::{EventConfiguration, MultiButtonConfig};
use crate::error::{Error, Result};
use crate::events::{ANY, ButtonEvent, Event};
use crate::ports::OneShotTimer;

/// One of the two physical buttons feeding a [`MultiButton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constituent {
    A,
    B,
}

/// Last known state of one constituent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubButton {
    pressed: bool,
    /// The constituent's own HOLD fired during its current press.
    hold_triggered: bool,
    /// Its notifications are being withheld from its direct listeners.
    suppressed: bool,
    /// Took part in a gesture since its last press began; its click-class
    /// notifications stay withheld.
    chorded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MultiState {
    a: SubButton,
    b: SubButton,
    /// Composite HOLD already fired in the current gesture.
    hold_fired: bool,
}

impl MultiState {
    fn sub(&self, which: Constituent) -> &SubButton {
        match which {
            Constituent::A => &self.a,
            Constituent::B => &self.b,
        }
    }

    fn sub_mut(&mut self, which: Constituent) -> &mut SubButton {
        match which {
            Constituent::A => &mut self.a,
            Constituent::B => &mut self.b,
        }
    }

    fn both_pressed(&self) -> bool {
        self.a.pressed && self.b.pressed
    }
}

/// Composite button over two constituent button ids.
///
/// Registers itself on the bus at construction and deregisters on drop.
pub struct MultiButton<T: OneShotTimer + 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: OneShotTimer> {
    me: Weak<Inner<T>>,
    id: u16,
    button_a: u16,
    button_b: u16,
    bus: Rc<MessageBus>,
    hold_timer: RefCell<T>,
    hold_threshold_ms: u32,
    /// Bumped on every arm/cancel; a hold callback carrying a stale value
    /// is ignored.
    hold_generation: Cell<u32>,
    state: Cell<MultiState>,
    events: Cell<EventConfiguration>,
    /// Bus registrations for A and B; `Some` while attached.
    listeners: Cell<Option<[ListenerId; 2]>>,
}

impl<T: OneShotTimer + 'static> MultiButton<T> {
    /// Create the composite button `id` over `button_a` and `button_b`
    /// and attach it to `bus`.
    ///
    /// Fails with [`Error::Config`] if both constituents are the same
    /// button, or with a bus error if there is no room for the listeners.
    pub fn new(
        bus: Rc<MessageBus>,
        id: u16,
        button_a: u16,
        button_b: u16,
        hold_timer: T,
        config: MultiButtonConfig,
    ) -> Result<Self> {
        if button_a == button_b {
            return Err(Error::Config("multi-button constituents must be distinct"));
        }
        if id == button_a || id == button_b {
            return Err(Error::Config("multi-button id must differ from its constituents"));
        }

        let inner = Rc::new_cyclic(|me| Inner {
            me: me.clone(),
            id,
            button_a,
            button_b,
            bus,
            hold_timer: RefCell::new(hold_timer),
            hold_threshold_ms: config.hold_threshold_ms,
            hold_generation: Cell::new(0),
            state: Cell::new(MultiState::default()),
            events: Cell::new(config.events),
            listeners: Cell::new(None),
        });

        let button = Self { inner };
        button.attach()?;
        info!(
            "MultiButton {}: combining {} + {} (hold {}ms)",
            id, button_a, button_b, config.hold_threshold_ms
        );
        Ok(button)
    }

    /// True iff both constituents are currently pressed.
    pub fn is_pressed(&self) -> bool {
        self.inner.state.get().both_pressed()
    }

    /// Takes effect from the next evaluated transition.
    pub fn set_event_configuration(&self, events: EventConfiguration) {
        self.inner.events.set(events);
        debug!("MultiButton {}: event configuration {:?}", self.inner.id, events);
    }

    pub fn event_configuration(&self) -> EventConfiguration {
        self.inner.events.get()
    }

    /// Id this button publishes under.
    pub fn id(&self) -> u16 {
        self.inner.id
    }

    /// `(button_a, button_b)` ids.
    pub fn constituents(&self) -> (u16, u16) {
        (self.inner.button_a, self.inner.button_b)
    }

    /// Last known press state of one constituent.
    pub fn is_constituent_pressed(&self, which: Constituent) -> bool {
        self.inner.state.get().sub(which).pressed
    }

    /// Whether the constituent's own HOLD fired during its current press.
    pub fn is_constituent_held(&self, which: Constituent) -> bool {
        self.inner.state.get().sub(which).hold_triggered
    }

    pub fn is_attached(&self) -> bool {
        self.inner.listeners.get().is_some()
    }

    /// Register on the bus.  No-op when already attached.
    pub fn attach(&self) -> Result<()> {
        if self.is_attached() {
            return Ok(());
        }

        let inner = &self.inner;
        let first = inner.bus.intercept(inner.button_a, ANY, Self::handler(&inner.me))?;
        let second = match inner.bus.intercept(inner.button_b, ANY, Self::handler(&inner.me)) {
            Ok(id) => id,
            Err(e) => {
                inner.bus.ignore(first);
                return Err(e);
            }
        };
        inner.listeners.set(Some([first, second]));
        Ok(())
    }

    /// Deregister from the bus and forget all constituent state.  No
    /// callback reaches this button after it returns.
    pub fn detach(&self) {
        let Some(ids) = self.inner.listeners.take() else {
            return;
        };
        for id in ids {
            self.inner.bus.ignore(id);
        }
        self.inner.cancel_hold();
        self.inner.state.set(MultiState::default());
        debug!("MultiButton {}: detached", self.inner.id);
    }

    fn handler(me: &Weak<Inner<T>>) -> impl Fn(Event) -> Delivery + 'static {
        let me = me.clone();
        move |event| {
            me.upgrade()
                .map_or(Delivery::Forward, |inner| inner.on_constituent_event(event))
        }
    }
}

impl<T: OneShotTimer + 'static> Drop for MultiButton<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<T: OneShotTimer + 'static> Inner<T> {
    fn constituent_of(&self, source: u16) -> Option<Constituent> {
        if source == self.button_a {
            Some(Constituent::A)
        } else if source == self.button_b {
            Some(Constituent::B)
        } else {
            None
        }
    }

    /// Bus interceptor for both constituents.  Never fails; ids and
    /// values it does not know are forwarded untouched.
    fn on_constituent_event(&self, event: Event) -> Delivery {
        let Some(which) = self.constituent_of(event.source) else {
            return Delivery::Forward;
        };

        let before = self.state.get();
        let mut state = before;
        {
            let sub = state.sub_mut(which);
            match event.button_event() {
                Some(ButtonEvent::Down) => {
                    if !sub.pressed {
                        sub.hold_triggered = false;
                        sub.chorded = false;
                    }
                    sub.pressed = true;
                }
                Some(ButtonEvent::Up) => {
                    sub.pressed = false;
                    sub.hold_triggered = false;
                }
                Some(ButtonEvent::Hold) if sub.pressed => sub.hold_triggered = true,
                _ => {}
            }
        }

        let started = !before.both_pressed() && state.both_pressed();
        let ended = before.both_pressed() && !state.both_pressed();

        if started {
            state.a.suppressed = true;
            state.b.suppressed = true;
            state.a.chorded = true;
            state.b.chorded = true;
            state.hold_fired = false;
        }
        // The releasing constituent's hold flag is already cleared in `state`.
        let long_click = ended
            && (before.hold_fired || (before.a.hold_triggered && before.b.hold_triggered));
        if ended {
            state.a.suppressed = false;
            state.b.suppressed = false;
            state.hold_fired = false;
        }

        let click_class = matches!(
            event.button_event(),
            Some(
                ButtonEvent::Hold
                    | ButtonEvent::Click
                    | ButtonEvent::LongClick
                    | ButtonEvent::DoubleClick
            )
        );
        let delivery = if before.sub(which).suppressed
            || state.sub(which).suppressed
            || (click_class && state.sub(which).chorded)
        {
            Delivery::Withhold
        } else {
            Delivery::Forward
        };

        // Commit before publishing: a downstream listener may re-enter.
        self.state.set(state);

        if started {
            self.arm_hold();
            debug!("MultiButton {}: down", self.id);
            self.publish(ButtonEvent::Down);
        } else if ended {
            self.cancel_hold();
            debug!("MultiButton {}: up (long={})", self.id, long_click);
            self.publish(ButtonEvent::Up);
            if self.events.get() == EventConfiguration::AllEvents {
                self.publish(if long_click {
                    ButtonEvent::LongClick
                } else {
                    ButtonEvent::Click
                });
            }
        }

        delivery
    }

    fn on_hold_expired(&self, generation: u32) {
        if generation != self.hold_generation.get() {
            return;
        }
        let mut state = self.state.get();
        if !state.both_pressed() || state.hold_fired {
            return;
        }
        state.hold_fired = true;
        self.state.set(state);

        debug!("MultiButton {}: hold", self.id);
        if self.events.get() == EventConfiguration::AllEvents {
            self.publish(ButtonEvent::Hold);
        }
    }

    fn arm_hold(&self) {
        let generation = self.hold_generation.get().wrapping_add(1);
        self.hold_generation.set(generation);

        let me = self.me.clone();
        let armed = self.hold_timer.borrow_mut().arm(
            self.hold_threshold_ms,
            Box::new(move || {
                if let Some(inner) = me.upgrade() {
                    inner.on_hold_expired(generation);
                }
            }),
        );
        if let Err(e) = armed {
            warn!("MultiButton {}: no hold for this gesture ({})", self.id, e);
        }
    }

    fn cancel_hold(&self) {
        self.hold_generation
            .set(self.hold_generation.get().wrapping_add(1));
        self.hold_timer.borrow_mut().cancel();
    }

    fn publish(&self, event: ButtonEvent) {
        self.bus.publish(Event::button(self.id, event));
    }
}
