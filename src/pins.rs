//! GPIO / peripheral pin assignments for the board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Push buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Left button, published as `ID_BUTTON_A`.
pub const BUTTON_A_GPIO: i32 = 0;
/// Right button, published as `ID_BUTTON_B`.
pub const BUTTON_B_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// LED matrix columns doubling as light sensors (ADC1)
// ---------------------------------------------------------------------------

/// Column GPIOs sampled in rotation, one per light-sense channel.
pub const LIGHT_SENSE_GPIOS: [i32; 3] = [4, 5, 6];
/// ADC1 channel for each entry of [`LIGHT_SENSE_GPIOS`] (ESP32-S3: GPIOn = CH(n-1)).
pub const LIGHT_SENSE_ADC_CHANNELS: [u32; 3] = [3, 4, 5];

// ---------------------------------------------------------------------------
// I²C bus (accelerometer / compass)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Clock pulses sent to free a slave holding SDA low.
pub const I2C_RECOVERY_PULSES: u32 = 9;
