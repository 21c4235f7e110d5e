//! Board configuration parameters
//!
//! All tunable timing and calibration values for the board drivers.
//! Values live in RAM only; a board that wants different values parses
//! them with [`BoardConfig::from_json`] at boot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which notifications a button synthesizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventConfiguration {
    /// DOWN, UP, HOLD, CLICK and LONG_CLICK.
    #[default]
    AllEvents,
    /// DOWN and UP only; clicks and holds are left to another service.
    SimpleEvents,
}

/// Physical push-button timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Level must be stable this long before a press or release counts.
    pub debounce_ms: u32,
    /// Press duration at or above which release reports LONG_CLICK.
    pub long_click_ms: u32,
    /// Press duration after which HOLD fires (once per press).
    pub hold_ms: u32,
    /// Pin reads low when the button is pressed (pull-up wiring).
    pub active_low: bool,
    pub events: EventConfiguration,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 30,
            long_click_ms: 1000,
            hold_ms: 1500,
            active_low: true,
            events: EventConfiguration::AllEvents,
        }
    }
}

/// Composite (two-button) virtual button.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiButtonConfig {
    /// Both constituents held this long fires composite HOLD.
    pub hold_threshold_ms: u32,
    pub events: EventConfiguration,
}

impl Default for MultiButtonConfig {
    fn default() -> Self {
        Self {
            hold_threshold_ms: 1500,
            events: EventConfiguration::AllEvents,
        }
    }
}

/// Light sensor calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSensorConfig {
    /// Time the column pin charges before it is sampled.
    pub settle_ms: u32,
    /// Raw reading in full daylight (clamps to 255).
    pub min_raw: u16,
    /// Raw reading in the dark (clamps to 0).
    pub max_raw: u16,
    /// Period of the display's light-sense strobe.
    pub strobe_interval_ms: u32,
}

impl Default for LightSensorConfig {
    fn default() -> Self {
        Self {
            settle_ms: 4,
            min_raw: 75,
            max_raw: 338,
            strobe_interval_ms: 30,
        }
    }
}

/// I2C transaction recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct I2cConfig {
    pub frequency_hz: u32,
    /// Recovery-and-retry cycles allowed before a transaction fails.
    pub max_retries: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 100_000,
            max_retries: 9,
        }
    }
}

/// Radio event relay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Frames from other groups are ignored.
    pub group: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self { group: 0 }
    }
}

/// Everything the board drivers need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub button: ButtonConfig,
    pub multi_button: MultiButtonConfig,
    pub light_sensor: LightSensorConfig,
    pub i2c: I2cConfig,
    pub radio: RadioConfig,
    /// Main loop period (driver tick rate).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
}

fn default_tick_interval_ms() -> u32 {
    6
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            button: ButtonConfig::default(),
            multi_button: MultiButtonConfig::default(),
            light_sensor: LightSensorConfig::default(),
            i2c: I2cConfig::default(),
            radio: RadioConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl BoardConfig {
    /// Parse and validate a JSON configuration blob.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed board config"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a driver misbehave.
    pub fn validate(&self) -> Result<()> {
        let b = &self.button;
        if b.debounce_ms == 0 || b.debounce_ms >= b.long_click_ms {
            return Err(Error::Config("button debounce must be non-zero and below long_click_ms"));
        }
        if b.long_click_ms > b.hold_ms {
            return Err(Error::Config("button long_click_ms must not exceed hold_ms"));
        }
        if self.multi_button.hold_threshold_ms == 0 {
            return Err(Error::Config("multi-button hold threshold must be non-zero"));
        }
        let l = &self.light_sensor;
        if l.min_raw >= l.max_raw {
            return Err(Error::Config("light sensor min_raw must be below max_raw"));
        }
        if l.settle_ms == 0 || l.settle_ms >= l.strobe_interval_ms {
            return Err(Error::Config("light sensor settle time must fit inside the strobe period"));
        }
        if self.i2c.frequency_hz == 0 {
            return Err(Error::Config("i2c frequency must be non-zero"));
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms > b.debounce_ms {
            return Err(Error::Config("tick interval must be non-zero and no longer than debounce"));
        }
        Ok(())
    }
}
