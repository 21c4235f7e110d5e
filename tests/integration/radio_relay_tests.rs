//! Two boards linked by a mock radio: composite gestures on one show up
//! on the other's bus, and nothing bounces back.

use std::rc::Rc;

use boardhal::config::{MultiButtonConfig, RadioConfig};
use boardhal::drivers::multi_button::MultiButton;
use boardhal::drivers::radio_event::{RadioEventRelay, decode_frame};
use boardhal::error::{Error, RadioError};
use boardhal::events::{ANY, ButtonEvent, Event, ID_BUTTON_A, ID_BUTTON_AB, ID_BUTTON_B};
use boardhal::{MessageBus, SoftTimer, TimerService};

use crate::mock_hw::{MockRadio, record};

use ButtonEvent::{Click, Down, Up};

struct Node {
    bus: Rc<MessageBus>,
    radio: MockRadio,
    relay: RadioEventRelay<MockRadio>,
    _timers: Rc<TimerService>,
    _ab: MultiButton<SoftTimer>,
}

fn node(group: u8) -> Node {
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    let ab = MultiButton::new(
        bus.clone(),
        ID_BUTTON_AB,
        ID_BUTTON_A,
        ID_BUTTON_B,
        SoftTimer::new(timers.clone()),
        MultiButtonConfig::default(),
    )
    .unwrap();
    let radio = MockRadio::default();
    let relay = RadioEventRelay::new(bus.clone(), radio.clone(), &RadioConfig { group });
    relay.listen(ID_BUTTON_AB, ANY).unwrap();
    Node { bus, radio, relay, _timers: timers, _ab: ab }
}

/// Deliver everything `from` sent to `to`.
fn deliver(from: &Node, to: &Node) {
    for frame in from.radio.take_sent() {
        let _ = to.relay.packet_received(&frame);
    }
}

#[test]
fn composite_gesture_crosses_the_air() {
    let sender = node(4);
    let receiver = node(4);
    let remote = record(&receiver.bus, ID_BUTTON_AB);

    sender.bus.publish(Event::button(ID_BUTTON_A, Down));
    sender.bus.publish(Event::button(ID_BUTTON_B, Down));
    sender.bus.publish(Event::button(ID_BUTTON_B, Up));

    let frames = sender.radio.sent.borrow().clone();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|f| decode_frame(f).unwrap().group == 4));

    deliver(&sender, &receiver);
    assert_eq!(*remote.borrow(), vec![Down, Up, Click]);
    assert!(receiver.radio.sent.borrow().is_empty(), "received events are not re-broadcast");
}

#[test]
fn different_group_is_ignored() {
    let sender = node(1);
    let receiver = node(2);
    let remote = record(&receiver.bus, ID_BUTTON_AB);

    sender.bus.publish(Event::button(ID_BUTTON_A, Down));
    sender.bus.publish(Event::button(ID_BUTTON_B, Down));
    deliver(&sender, &receiver);

    assert!(remote.borrow().is_empty());
}

#[test]
fn send_failure_does_not_disturb_local_delivery() {
    let sender = node(0);
    let local = record(&sender.bus, ID_BUTTON_AB);
    sender.radio.fail.set(true);

    sender.bus.publish(Event::button(ID_BUTTON_A, Down));
    sender.bus.publish(Event::button(ID_BUTTON_B, Down));

    assert_eq!(*local.borrow(), vec![Down]);
    assert!(sender.radio.sent.borrow().is_empty());
}

#[test]
fn garbage_is_reported_not_published() {
    let receiver = node(0);
    let seen = record(&receiver.bus, ANY);

    assert_eq!(
        receiver.relay.packet_received(&[3, 1, 0, 7]),
        Err(Error::Radio(RadioError::WrongProtocol(7)))
    );
    assert!(receiver.relay.packet_received(&[0xFF]).is_err());
    assert!(seen.borrow().is_empty());
}
