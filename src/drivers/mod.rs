//! Button, sensor and radio drivers, plus raw peripheral setup.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod i2c;
pub mod light_sensor;
pub mod multi_button;
pub mod radio_event;
