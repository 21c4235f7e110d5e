//! Ambient light sensing through the LED matrix.
//!
//! The display periodically publishes `(ID_DISPLAY, DISPLAY_EVT_LIGHT_SENSE)`
//! in a gap of its refresh cycle.  Each strobe the sensor borrows one of
//! three column pins, lets it charge for `settle_ms`, samples it and hands
//! it back.  Channels rotate, so a full picture takes three strobes.
//!
//! ```text
//!  strobe ─▶ start(chan) ─▶ [settle_ms] ─▶ read_raw ─▶ release ─▶ chan+1
//! ```
//!
//! Higher raw readings mean less light.  [`LightSensor::read`] averages
//! the three channels, clamps to the calibration window and inverts it
//! onto 0 (dark) ..= 255 (bright).

use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};

use crate::bus::{ListenerId, MessageBus};
use crate::config::LightSensorConfig;
use crate::error::{Error, Result};
use crate::events::{DISPLAY_EVT_LIGHT_SENSE, ID_DISPLAY};
use crate::ports::{LightSensePort, OneShotTimer};

/// Number of display columns sampled.
pub const CHANNELS: usize = 3;

pub struct LightSensor<P, T>
where
    P: LightSensePort + 'static,
    T: OneShotTimer + 'static,
{
    inner: Rc<Inner<P, T>>,
}

struct Inner<P: LightSensePort, T: OneShotTimer> {
    me: Weak<Inner<P, T>>,
    bus: Rc<MessageBus>,
    port: RefCell<P>,
    settle_timer: RefCell<T>,
    config: LightSensorConfig,
    results: Cell<[u16; CHANNELS]>,
    chan: Cell<usize>,
    /// A channel is charging; strobes arriving meanwhile are dropped.
    sensing: Cell<bool>,
    listener: Cell<Option<ListenerId>>,
}

impl<P, T> LightSensor<P, T>
where
    P: LightSensePort + 'static,
    T: OneShotTimer + 'static,
{
    pub fn new(
        bus: Rc<MessageBus>,
        port: P,
        settle_timer: T,
        config: LightSensorConfig,
    ) -> Result<Self> {
        if config.min_raw >= config.max_raw {
            return Err(Error::Config("light sensor min_raw must be below max_raw"));
        }

        let inner = Rc::new_cyclic(|me| Inner {
            me: me.clone(),
            bus,
            port: RefCell::new(port),
            settle_timer: RefCell::new(settle_timer),
            config,
            results: Cell::new([0; CHANNELS]),
            chan: Cell::new(0),
            sensing: Cell::new(false),
            listener: Cell::new(None),
        });

        let me = inner.me.clone();
        let id = inner.bus.listen(ID_DISPLAY, DISPLAY_EVT_LIGHT_SENSE, move |_| {
            if let Some(inner) = me.upgrade() {
                inner.start_sensing();
            }
        })?;
        inner.listener.set(Some(id));

        debug!(
            "LightSensor: calibrated {}..{} raw, settle {}ms",
            config.min_raw, config.max_raw, config.settle_ms
        );
        Ok(Self { inner })
    }

    /// Light level, 0 (dark) ..= 255 (bright).
    ///
    /// Channels that have not been sampled yet count as raw 0, so a fresh
    /// sensor reads fully bright until the first rotation completes.
    pub fn read(&self) -> u8 {
        let results = self.inner.results.get();
        let sum: u32 = results.iter().map(|&r| u32::from(r)).sum();
        scale(sum / CHANNELS as u32, &self.inner.config)
    }

    /// Last raw reading per channel.
    pub fn raw_results(&self) -> [u16; CHANNELS] {
        self.inner.results.get()
    }

    /// Channel the next strobe will sample.
    pub fn channel(&self) -> usize {
        self.inner.chan.get()
    }

    pub fn is_sensing(&self) -> bool {
        self.inner.sensing.get()
    }
}

impl<P, T> Drop for LightSensor<P, T>
where
    P: LightSensePort + 'static,
    T: OneShotTimer + 'static,
{
    fn drop(&mut self) {
        if let Some(id) = self.inner.listener.take() {
            self.inner.bus.ignore(id);
        }
        self.inner.settle_timer.borrow_mut().cancel();
        if self.inner.sensing.replace(false) {
            self.inner.port.borrow_mut().release();
        }
    }
}

impl<P: LightSensePort + 'static, T: OneShotTimer + 'static> Inner<P, T> {
    fn start_sensing(&self) {
        if self.sensing.replace(true) {
            trace!("LightSensor: strobe while sensing, skipped");
            return;
        }
        self.port.borrow_mut().start(self.chan.get());

        let me = self.me.clone();
        let armed = self.settle_timer.borrow_mut().arm(
            self.config.settle_ms,
            Box::new(move || {
                if let Some(inner) = me.upgrade() {
                    inner.analog_ready();
                }
            }),
        );
        if let Err(e) = armed {
            // Give the column back; the next strobe retries this channel.
            warn!("LightSensor: chan {} not sampled ({})", self.chan.get(), e);
            self.port.borrow_mut().release();
            self.sensing.set(false);
        }
    }

    fn analog_ready(&self) {
        if !self.sensing.get() {
            return;
        }
        let chan = self.chan.get();
        let sample = self.port.borrow_mut().read_raw();
        match sample {
            Ok(raw) => {
                let mut results = self.results.get();
                results[chan] = raw;
                self.results.set(results);
                trace!("LightSensor: chan {} raw {}", chan, raw);
            }
            Err(e) => warn!("LightSensor: chan {} read failed: {:?}", chan, e),
        }
        self.port.borrow_mut().release();
        self.sensing.set(false);
        self.chan.set((chan + 1) % CHANNELS);
    }
}

fn scale(raw: u32, config: &LightSensorConfig) -> u8 {
    let min = u32::from(config.min_raw);
    let max = u32::from(config.max_raw);
    let clamped = raw.clamp(min, max);
    ((max - clamped) * 255 / (max - min)) as u8
}
