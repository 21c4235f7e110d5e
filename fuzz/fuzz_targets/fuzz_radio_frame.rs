//! Fuzz target: `decode_frame` and `RadioEventRelay::packet_received`
//!
//! Drives arbitrary bytes into the radio frame decoder and the relay and
//! asserts that neither panics, that anything accepted re-encodes to the
//! same event, and that a rejected frame never reaches the bus.
//!
//! cargo fuzz run fuzz_radio_frame

#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use boardhal::MessageBus;
use boardhal::config::RadioConfig;
use boardhal::drivers::radio_event::{RadioEventRelay, decode_frame, encode_frame};
use boardhal::error::RadioError;
use boardhal::events::ANY;
use boardhal::ports::RadioPort;
use libfuzzer_sys::fuzz_target;

struct NullRadio;

impl RadioPort for NullRadio {
    fn send(&mut self, _frame: &[u8]) -> Result<(), RadioError> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let decoded = decode_frame(data);

    if let Ok(frame) = decoded {
        let again = encode_frame(&frame.event, frame.group).expect("decoded event re-encodes");
        assert_eq!(decode_frame(&again).ok(), Some(frame));
    }

    let group = data.get(2).copied().unwrap_or(0);
    let bus = Rc::new(MessageBus::new());
    let seen = Rc::new(Cell::new(0u32));
    let s = seen.clone();
    bus.listen(ANY, ANY, move |_| s.set(s.get() + 1)).expect("empty bus has room");
    let relay = RadioEventRelay::new(bus, NullRadio, &RadioConfig { group });

    let accepted = relay.packet_received(data).is_ok();
    assert_eq!(accepted, decoded.is_ok());
    if !accepted {
        assert_eq!(seen.get(), 0, "rejected frame reached the bus");
    }
});
