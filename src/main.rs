//! Board firmware: main entry point.
//!
//! Single cooperative loop.  Everything below runs on the main task; the
//! only other contexts are the strobe timer (ISR queue) and the WiFi task
//! (ESP-NOW receive channel), both drained here.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ loop every tick_interval_ms                                  │
//! │                                                              │
//! │  Button A/B tick ──▶ MessageBus ──▶ MultiButton (A+B)        │
//! │  ISR queue drain ──▶ MessageBus ──▶ LightSensor              │
//! │  TimerService tick ─▶ hold / settle callbacks                │
//! │  ESP-NOW rx drain ─▶ RadioEventRelay ──▶ MessageBus          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::rc::Rc;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig as HalI2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};
use embedded_hal::i2c::I2c;
use log::{info, warn};

use boardhal::adapters::espnow::EspNowRadio;
use boardhal::adapters::hardware::{AdcLightSense, I2cClockOut};
use boardhal::adapters::log_sink::BusLogSink;
use boardhal::adapters::time::BoardClock;
use boardhal::config::BoardConfig;
use boardhal::drivers::button::Button;
use boardhal::drivers::i2c::RetryingI2c;
use boardhal::drivers::light_sensor::LightSensor;
use boardhal::drivers::multi_button::MultiButton;
use boardhal::drivers::radio_event::RadioEventRelay;
use boardhal::drivers::{hw_init, hw_timer};
use boardhal::events::{self, ANY, ID_BUTTON_A, ID_BUTTON_AB, ID_BUTTON_B};
use boardhal::pins;
use boardhal::{MessageBus, SoftTimer, TimerService};

/// Accelerometer address probed at boot.
const ACCEL_ADDR: u8 = 0x1D;
/// WHO_AM_I register of the accelerometer.
const ACCEL_WHO_AM_I: u8 = 0x0D;
/// How often the light level is logged.
const LIGHT_LOG_INTERVAL_MS: u32 = 5_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("boardhal v{}", env!("CARGO_PKG_VERSION"));

    let config = match option_env!("BOARDHAL_CONFIG_JSON") {
        Some(json) => BoardConfig::from_json(json)?,
        None => BoardConfig::default(),
    };
    config.validate()?;

    let peripherals = Peripherals::take()?;
    hw_init::init_peripherals()?;

    // ── 2. Shared services ────────────────────────────────────
    let clock = BoardClock::new();
    let bus = Rc::new(MessageBus::new());
    let timers = Rc::new(TimerService::new());
    timers.tick(clock.uptime_ms());
    let _log_sink = BusLogSink::attach(bus.clone())?;

    // ── 3. Buttons ────────────────────────────────────────────
    // SAFETY: each GPIO number is claimed exactly once, here.
    let mut pin_a = PinDriver::input(unsafe { AnyInputPin::new(pins::BUTTON_A_GPIO) })?;
    pin_a.set_pull(Pull::Up)?;
    let mut pin_b = PinDriver::input(unsafe { AnyInputPin::new(pins::BUTTON_B_GPIO) })?;
    pin_b.set_pull(Pull::Up)?;

    let mut button_a = Button::new(ID_BUTTON_A, pin_a, bus.clone(), config.button);
    let mut button_b = Button::new(ID_BUTTON_B, pin_b, bus.clone(), config.button);
    let _button_ab = MultiButton::new(
        bus.clone(),
        ID_BUTTON_AB,
        ID_BUTTON_A,
        ID_BUTTON_B,
        SoftTimer::new(timers.clone()),
        config.multi_button,
    )?;

    // ── 4. Light sensor ───────────────────────────────────────
    let light = LightSensor::new(
        bus.clone(),
        AdcLightSense::new(),
        SoftTimer::new(timers.clone()),
        config.light_sensor,
    )?;
    hw_timer::start_strobe(config.light_sensor.strobe_interval_ms);

    // ── 5. I2C ────────────────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        // SAFETY: SDA/SCL are not claimed anywhere else.
        unsafe { AnyIOPin::new(pins::I2C_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C_SCL_GPIO) },
        &HalI2cConfig::new().baudrate(Hertz(config.i2c.frequency_hz)),
    )?;
    let mut i2c = RetryingI2c::new(i2c, I2cClockOut, &config.i2c);
    let mut who_am_i = [0u8; 1];
    match i2c.write_read(ACCEL_ADDR, &[ACCEL_WHO_AM_I], &mut who_am_i) {
        Ok(()) => info!("I2C: accelerometer WHO_AM_I=0x{:02x}", who_am_i[0]),
        Err(e) => warn!("I2C: accelerometer probe failed: {}", e),
    }

    // ── 6. Radio ──────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
    wifi.start()?;
    let relay = RadioEventRelay::new(bus.clone(), EspNowRadio::new()?, &config.radio);
    relay.listen(ID_BUTTON_AB, ANY)?;

    info!("System ready. Entering main loop.");

    // ── 7. Main loop ──────────────────────────────────────────
    let mut last_light_log = clock.uptime_ms();
    loop {
        let now = clock.uptime_ms();

        button_a.tick(now);
        button_b.tick(now);
        events::drain_events(|event| {
            bus.publish(event);
        });
        timers.tick(now);
        relay.drain_received();

        if now.wrapping_sub(last_light_log) >= LIGHT_LOG_INTERVAL_MS {
            info!("Light level {}", light.read());
            last_light_log = now;
        }

        FreeRtos::delay_ms(config.tick_interval_ms);
    }
}
