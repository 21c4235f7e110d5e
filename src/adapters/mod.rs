//! Adapters: concrete implementations of the driver port traits.
//!
//! | Adapter     | Implements                   | Connects to              |
//! |-------------|------------------------------|--------------------------|
//! | `hardware`  | LightSensePort, BusRecovery  | ADC1, raw GPIO           |
//! | `log_sink`  | bus listener                 | Serial log output        |
//! | `time`      | board clock                  | ESP32 system timer       |
//! | `espnow`    | RadioPort                    | ESP-NOW broadcast        |

#[cfg(target_os = "espidf")]
pub mod espnow;
pub mod hardware;
pub mod log_sink;
pub mod time;
