//! Hardware adapter: bridges board peripherals to the driver port traits.
//!
//! | Adapter          | Implements       | Connects to                  |
//! |------------------|------------------|------------------------------|
//! | `AdcLightSense`  | LightSensePort   | Display columns on ADC1      |
//! | `I2cClockOut`    | BusRecovery      | SCL bit-bang via raw GPIO    |
//!
//! The register work lives in [`hw_init`](crate::drivers::hw_init); on
//! host targets it is stubbed, so these adapters run (trivially) there.

use log::warn;

use crate::drivers::hw_init;
use crate::error::I2cError;
use crate::pins;
use crate::ports::{BusRecovery, LightSensePort};

/// ADC read failed on the selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcReadError {
    pub channel: usize,
}

/// Light sensing on the display columns listed in [`pins::LIGHT_SENSE_GPIOS`].
#[derive(Debug, Default)]
pub struct AdcLightSense {
    active: Option<usize>,
}

impl AdcLightSense {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LightSensePort for AdcLightSense {
    type Error = AdcReadError;

    fn start(&mut self, channel: usize) {
        let channel = channel % pins::LIGHT_SENSE_GPIOS.len();
        hw_init::column_to_input(pins::LIGHT_SENSE_GPIOS[channel]);
        self.active = Some(channel);
    }

    fn read_raw(&mut self) -> Result<u16, AdcReadError> {
        let channel = self.active.unwrap_or(0);
        hw_init::adc1_read(pins::LIGHT_SENSE_ADC_CHANNELS[channel])
            .ok_or(AdcReadError { channel })
    }

    fn release(&mut self) {
        if let Some(channel) = self.active.take() {
            hw_init::column_to_output(pins::LIGHT_SENSE_GPIOS[channel]);
        }
    }
}

/// Frees a slave stuck mid-byte by clocking SCL until SDA is released.
#[derive(Debug, Default, Clone, Copy)]
pub struct I2cClockOut;

impl BusRecovery for I2cClockOut {
    fn recover(&mut self) -> Result<(), I2cError> {
        if hw_init::i2c_clock_out() {
            Ok(())
        } else {
            warn!("I2C: SDA still held low after {} clocks", pins::I2C_RECOVERY_PULSES);
            Err(I2cError::RecoveryFailed)
        }
    }
}
