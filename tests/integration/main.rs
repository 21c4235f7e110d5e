//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock hardware.  All tests run on the host (x86_64) with no
//! real hardware required.

mod button_tests;
mod i2c_tests;
mod light_sensor_tests;
mod multi_button_flow_tests;
mod radio_relay_tests;
