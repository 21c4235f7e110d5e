//! Light sensor driven the way the firmware drives it: strobes queued by
//! the timer side, drained onto the bus by the main loop.

use std::rc::Rc;

use boardhal::config::LightSensorConfig;
use boardhal::drivers::hw_timer;
use boardhal::drivers::light_sensor::LightSensor;
use boardhal::events;
use boardhal::{MessageBus, SoftTimer, TimerService};

use crate::mock_hw::{MockLightSense, SenseCall};

struct Loop {
    bus: Rc<MessageBus>,
    timers: Rc<TimerService>,
    now: u32,
}

impl Loop {
    /// One strobe period: queue a strobe, drain it, let the settle time pass.
    fn strobe_period(&mut self, config: &LightSensorConfig) {
        assert!(hw_timer::strobe_now());
        events::drain_events(|e| {
            self.bus.publish(e);
        });
        self.now += config.settle_ms;
        self.timers.tick(self.now);
        self.now += config.strobe_interval_ms - config.settle_ms;
        self.timers.tick(self.now);
    }
}

#[test]
fn full_rotation_averages_all_columns() {
    let config = LightSensorConfig::default();
    let port = MockLightSense::new([100, 200, 300]);
    let mut main = Loop {
        bus: Rc::new(MessageBus::new()),
        timers: Rc::new(TimerService::new()),
        now: 0,
    };
    let sensor = LightSensor::new(
        main.bus.clone(),
        port.clone(),
        SoftTimer::new(main.timers.clone()),
        config,
    )
    .unwrap();

    for _ in 0..3 {
        main.strobe_period(&config);
    }

    assert_eq!(sensor.raw_results(), [100, 200, 300]);
    // Average 200 on a 75..338 window, inverted: (338 - 200) * 255 / 263.
    assert_eq!(sensor.read(), 133);
    assert_eq!(
        *port.calls.borrow(),
        vec![
            SenseCall::Start(0),
            SenseCall::Read(0),
            SenseCall::Release,
            SenseCall::Start(1),
            SenseCall::Read(1),
            SenseCall::Release,
            SenseCall::Start(2),
            SenseCall::Read(2),
            SenseCall::Release,
        ]
    );

    // Darkness on every column drives the level to zero.
    *port.raw.borrow_mut() = [900, 900, 900];
    for _ in 0..3 {
        main.strobe_period(&config);
    }
    assert_eq!(sensor.read(), 0);
}
