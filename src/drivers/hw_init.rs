//! One-shot peripheral setup and raw pin access.
//!
//! Configures the ADC unit used for light sensing using raw ESP-IDF sys
//! calls, and exposes the handful of register-level
//! helpers the hardware adapters need (ADC sampling, column pin hand-over,
//! I2C clock-out).  Called once from `main()` before the loop starts.
//! On host targets every helper is a no-op stub.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe {
        init_adc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the init path or the main loop.
/// `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 10-bit keeps raw readings on the same scale as the light calibration.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_10,
    };
    for &channel in &pins::LIGHT_SENSE_ADC_CHANNELS {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured for {} light-sense columns", pins::LIGHT_SENSE_ADC_CHANNELS.len());
    Ok(())
}

/// Sample one ADC1 channel.  `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    Some(0)
}

// ── Display column hand-over ──────────────────────────────────

/// Float a display column so it can charge as a photodiode.
#[cfg(target_os = "espidf")]
pub fn column_to_input(pin: i32) {
    // SAFETY: direction change on a pin owned by the display/light-sense
    // pair, both driven from the main loop.
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn column_to_input(_pin: i32) {}

/// Return a display column to push-pull output, driven low.
#[cfg(target_os = "espidf")]
pub fn column_to_output(pin: i32) {
    // SAFETY: see column_to_input().
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_OUTPUT);
        gpio_set_level(pin, 0);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn column_to_output(_pin: i32) {}

// ── I2C bus recovery ──────────────────────────────────────────

/// Clock SCL by hand until a stuck slave lets go of SDA, then hand both
/// pins back to the I2C controller.  Returns `true` if SDA is high after.
#[cfg(target_os = "espidf")]
pub fn i2c_clock_out() -> bool {
    // SAFETY: only called between failed transactions from the main loop,
    // while the I2C driver is idle.
    unsafe {
        gpio_set_direction(pins::I2C_SCL_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT_OD);
        for _ in 0..pins::I2C_RECOVERY_PULSES {
            if gpio_get_level(pins::I2C_SDA_GPIO) != 0 {
                break;
            }
            gpio_set_level(pins::I2C_SCL_GPIO, 0);
            esp_rom_delay_us(5);
            gpio_set_level(pins::I2C_SCL_GPIO, 1);
            esp_rom_delay_us(5);
        }
        let released = gpio_get_level(pins::I2C_SDA_GPIO) != 0;
        i2c_set_pin(
            i2c_port_t_I2C_NUM_0,
            pins::I2C_SDA_GPIO,
            pins::I2C_SCL_GPIO,
            true,
            true,
            i2c_mode_t_I2C_MODE_MASTER,
        );
        released
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_clock_out() -> bool {
    true
}
