//! Physical buttons driven from mock pins, with and without the
//! composite button on top.

use std::rc::Rc;

use boardhal::config::{ButtonConfig, EventConfiguration, MultiButtonConfig};
use boardhal::drivers::button::Button;
use boardhal::drivers::multi_button::MultiButton;
use boardhal::events::{ButtonEvent, ID_BUTTON_A, ID_BUTTON_AB, ID_BUTTON_B};
use boardhal::{MessageBus, SoftTimer, TimerService};

use crate::mock_hw::{MockPin, record};

use ButtonEvent::{Click, Down, Hold, LongClick, Up};

/// Two buttons and the A+B composite on one bus, stepped at 6 ms ticks.
struct Board {
    timers: Rc<TimerService>,
    pin_a: MockPin,
    pin_b: MockPin,
    button_a: Button<MockPin>,
    button_b: Button<MockPin>,
    _ab: MultiButton<SoftTimer>,
    now: u32,
}

impl Board {
    fn new(bus: &Rc<MessageBus>) -> Self {
        Self::with_composite(bus, MultiButtonConfig::default())
    }

    fn with_composite(bus: &Rc<MessageBus>, composite: MultiButtonConfig) -> Self {
        let timers = Rc::new(TimerService::new());
        let pin_a = MockPin::new();
        let pin_b = MockPin::new();
        let button_a = Button::new(ID_BUTTON_A, pin_a.clone(), bus.clone(), ButtonConfig::default());
        let button_b = Button::new(ID_BUTTON_B, pin_b.clone(), bus.clone(), ButtonConfig::default());
        let ab = MultiButton::new(
            bus.clone(),
            ID_BUTTON_AB,
            ID_BUTTON_A,
            ID_BUTTON_B,
            SoftTimer::new(timers.clone()),
            composite,
        )
        .unwrap();
        Self { timers, pin_a, pin_b, button_a, button_b, _ab: ab, now: 0 }
    }

    /// Advance the main loop by `ms`, one tick at a time.
    fn run(&mut self, ms: u32) {
        let end = self.now + ms;
        while self.now < end {
            self.now += 6;
            self.button_a.tick(self.now);
            self.button_b.tick(self.now);
            self.timers.tick(self.now);
        }
    }
}

#[test]
fn single_button_click_reaches_its_listeners() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let ab = record(&bus, ID_BUTTON_AB);
    let mut board = Board::new(&bus);

    board.pin_a.press();
    board.run(200);
    board.pin_a.release();
    board.run(100);

    assert_eq!(*a.borrow(), vec![Down, Up, Click]);
    assert!(ab.borrow().is_empty());
}

#[test]
fn chord_click_is_reported_once_by_the_composite() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let b = record(&bus, ID_BUTTON_B);
    let ab = record(&bus, ID_BUTTON_AB);
    let mut board = Board::new(&bus);

    board.pin_a.press();
    board.run(100);
    board.pin_b.press();
    board.run(300);
    board.pin_a.release();
    board.run(100);
    board.pin_b.release();
    board.run(100);

    assert_eq!(*ab.borrow(), vec![Down, Up, Click]);
    // A pressed alone first, so its DOWN got through.  Its UP ended the
    // chord and was withheld, and so was the CLICK right behind it.
    assert_eq!(*a.borrow(), vec![Down]);
    // B's DOWN completed the chord; its UP came after and is forwarded,
    // its CLICK is not.
    assert_eq!(*b.borrow(), vec![Up]);
}

#[test]
fn chord_released_in_either_order_never_clicks_a_constituent() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let b = record(&bus, ID_BUTTON_B);
    let ab = record(&bus, ID_BUTTON_AB);
    let mut board = Board::new(&bus);

    board.pin_a.press();
    board.run(100);
    board.pin_b.press();
    board.run(300);
    board.pin_b.release();
    board.run(100);
    board.pin_a.release();
    board.run(100);

    assert_eq!(*ab.borrow(), vec![Down, Up, Click]);
    assert_eq!(*a.borrow(), vec![Down, Up]);
    assert!(b.borrow().is_empty());
}

#[test]
fn solo_press_after_a_chord_clicks_again() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let mut board = Board::new(&bus);

    board.pin_a.press();
    board.pin_b.press();
    board.run(200);
    board.pin_a.release();
    board.pin_b.release();
    board.run(100);
    assert_eq!(*a.borrow(), vec![Down]);

    board.pin_a.press();
    board.run(200);
    board.pin_a.release();
    board.run(100);
    assert_eq!(*a.borrow(), vec![Down, Down, Up, Click]);
}

#[test]
fn constituent_holds_make_the_chord_long() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let b = record(&bus, ID_BUTTON_B);
    let ab = record(&bus, ID_BUTTON_AB);
    // Composite threshold out of reach, so only the buttons' own HOLDs fire.
    let mut board = Board::with_composite(
        &bus,
        MultiButtonConfig { hold_threshold_ms: 10_000, ..MultiButtonConfig::default() },
    );

    board.pin_a.press();
    board.run(100);
    board.pin_b.press();
    board.run(2_000);
    board.pin_a.release();
    board.run(100);
    board.pin_b.release();
    board.run(100);

    assert_eq!(*ab.borrow(), vec![Down, Up, LongClick]);
    assert_eq!(*a.borrow(), vec![Down]);
    assert_eq!(*b.borrow(), vec![Up]);
}

#[test]
fn chord_held_long_reports_hold_and_long_click() {
    let bus = Rc::new(MessageBus::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let a = record(&bus, ID_BUTTON_A);
    let mut board = Board::new(&bus);

    board.pin_a.press();
    board.pin_b.press();
    board.run(2_000);
    board.pin_a.release();
    board.pin_b.release();
    board.run(100);

    assert_eq!(*ab.borrow(), vec![Down, Hold, Up, LongClick]);
    // Same-tick presses: A's DOWN is handled first and gets through.
    // HOLD and LONG_CLICK from either button are withheld.
    assert_eq!(*a.borrow(), vec![Down]);
}

#[test]
fn pin_fault_skips_samples_without_events() {
    let bus = Rc::new(MessageBus::new());
    let a = record(&bus, ID_BUTTON_A);
    let mut board = Board::new(&bus);

    board.pin_a.set_faulty(true);
    board.pin_a.press();
    board.run(200);
    assert!(a.borrow().is_empty());
    assert!(!board.button_a.is_pressed());

    board.pin_a.set_faulty(false);
    board.run(60);
    assert!(board.button_a.is_pressed());
    assert_eq!(*a.borrow(), vec![Down]);
}

#[test]
fn simple_events_button_feeds_composite_all_the_same() {
    let bus = Rc::new(MessageBus::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let mut board = Board::new(&bus);
    board.button_a.set_event_configuration(EventConfiguration::SimpleEvents);
    board.button_b.set_event_configuration(EventConfiguration::SimpleEvents);

    board.pin_a.press();
    board.pin_b.press();
    board.run(100);
    board.pin_b.release();
    board.run(100);

    assert_eq!(*ab.borrow(), vec![Down, Up, Click]);
}
