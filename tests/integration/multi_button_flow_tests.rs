//! Composite button flows at the bus level: ordering against other
//! listeners, re-entrancy, timers and lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use boardhal::config::{EventConfiguration, MultiButtonConfig};
use boardhal::drivers::multi_button::{Constituent, MultiButton};
use boardhal::events::{ButtonEvent, Event, ID_BUTTON_A, ID_BUTTON_AB, ID_BUTTON_B};
use boardhal::{MessageBus, SoftTimer, TimerService};

use crate::mock_hw::record;

use ButtonEvent::{Click, Down, Hold, LongClick, Up};

fn composite(bus: &Rc<MessageBus>, timers: &Rc<TimerService>) -> MultiButton<SoftTimer> {
    MultiButton::new(
        bus.clone(),
        ID_BUTTON_AB,
        ID_BUTTON_A,
        ID_BUTTON_B,
        SoftTimer::new(timers.clone()),
        MultiButtonConfig::default(),
    )
    .unwrap()
}

fn send(bus: &MessageBus, source: u16, event: ButtonEvent) {
    bus.publish(Event::button(source, event));
}

#[test]
fn listeners_registered_first_are_still_suppressed() {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let b = record(&bus, ID_BUTTON_B);
    let _ab = composite(&bus, &timers);

    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_B, Down);
    send(&bus, ID_BUTTON_B, Hold);
    assert!(b.borrow().is_empty());
}

#[test]
fn handler_releasing_inside_composite_down_sees_consistent_state() {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let button = Rc::new(composite(&bus, &timers));

    // Release B from inside the composite DOWN handler.
    let inner_bus = bus.clone();
    let observed = Rc::new(RefCell::new(Vec::new()));
    let obs = observed.clone();
    let watched = button.clone();
    bus.listen(ID_BUTTON_AB, Down.value(), move |_| {
        obs.borrow_mut().push(watched.is_pressed());
        send(&inner_bus, ID_BUTTON_B, Up);
        obs.borrow_mut().push(watched.is_pressed());
    })
    .unwrap();

    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_B, Down);

    assert_eq!(*observed.borrow(), vec![true, false]);
    assert_eq!(*ab.borrow(), vec![Down, Up, Click]);
    assert_eq!(timers.pending(), 0, "hold timer cancelled by the nested release");
}

#[test]
fn hold_threshold_comes_from_config() {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let _button = MultiButton::new(
        bus.clone(),
        ID_BUTTON_AB,
        ID_BUTTON_A,
        ID_BUTTON_B,
        SoftTimer::new(timers.clone()),
        MultiButtonConfig { hold_threshold_ms: 400, events: EventConfiguration::AllEvents },
    )
    .unwrap();

    timers.tick(1000);
    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_B, Down);
    timers.tick(1399);
    assert_eq!(*ab.borrow(), vec![Down]);
    timers.tick(1400);
    assert_eq!(*ab.borrow(), vec![Down, Hold]);
    send(&bus, ID_BUTTON_A, Up);
    assert_eq!(*ab.borrow(), vec![Down, Hold, Up, LongClick]);
}

#[test]
fn detach_mid_gesture_forgets_it() {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let a = record(&bus, ID_BUTTON_A);
    let button = composite(&bus, &timers);

    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_B, Down);
    button.detach();
    assert!(!button.is_attached());
    assert!(!button.is_pressed());
    assert_eq!(timers.pending(), 0);

    // Unsuppressed while detached.
    send(&bus, ID_BUTTON_A, Up);
    assert_eq!(*a.borrow(), vec![Down, Up]);

    button.attach().unwrap();
    send(&bus, ID_BUTTON_A, Down);
    assert!(button.is_constituent_pressed(Constituent::A));
    assert!(!button.is_constituent_pressed(Constituent::B));
    assert_eq!(*ab.borrow(), vec![Down]);
}

#[test]
fn two_composites_share_a_constituent() {
    const ID_BUTTON_AC: u16 = 40;
    const ID_BUTTON_C: u16 = 41;

    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let ac = record(&bus, ID_BUTTON_AC);
    let _ab_button = composite(&bus, &timers);
    let _ac_button = MultiButton::new(
        bus.clone(),
        ID_BUTTON_AC,
        ID_BUTTON_A,
        ID_BUTTON_C,
        SoftTimer::new(timers.clone()),
        MultiButtonConfig::default(),
    )
    .unwrap();

    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_C, Down);
    send(&bus, ID_BUTTON_C, Up);

    assert!(ab.borrow().is_empty());
    assert_eq!(*ac.borrow(), vec![Down, Up, Click]);
}

#[test]
fn drop_stops_all_callbacks() {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = record(&bus, ID_BUTTON_AB);
    let before = bus.listener_count();
    let button = composite(&bus, &timers);

    send(&bus, ID_BUTTON_A, Down);
    send(&bus, ID_BUTTON_B, Down);
    drop(button);

    assert_eq!(bus.listener_count(), before);
    timers.tick(10_000);
    send(&bus, ID_BUTTON_A, Up);
    assert_eq!(*ab.borrow(), vec![Down]);
}
