//! ESP-NOW radio adapter.
//!
//! Implements [`RadioPort`] by broadcasting frames over ESP-NOW, and
//! hands received frames to the main loop through
//! [`RADIO_RX_CHANNEL`](crate::drivers::radio_event::RADIO_RX_CHANNEL).
//! The receive callback runs in the WiFi task, so it only copies the
//! frame into the channel; decoding happens in the main loop.
//!
//! WiFi must be started (station mode, not connected) before
//! [`EspNowRadio::new`].

use esp_idf_svc::espnow::{BROADCAST, EspNow, PeerInfo};
use esp_idf_svc::sys::EspError;
use log::{info, warn};

use crate::drivers::radio_event::{RADIO_RX_CHANNEL, RadioPacket};
use crate::error::RadioError;
use crate::ports::RadioPort;

pub struct EspNowRadio {
    espnow: EspNow<'static>,
}

impl EspNowRadio {
    pub fn new() -> Result<Self, EspError> {
        let espnow = EspNow::take()?;
        espnow.add_peer(PeerInfo {
            peer_addr: BROADCAST,
            channel: 0,
            ifidx: esp_idf_svc::sys::wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        })?;
        espnow.register_recv_cb(|_info, data: &[u8]| {
            match RadioPacket::from_slice(data) {
                Ok(packet) => {
                    if RADIO_RX_CHANNEL.try_send(packet).is_err() {
                        warn!("ESP-NOW: rx queue full, frame dropped");
                    }
                }
                Err(()) => warn!("ESP-NOW: oversized frame ({} bytes) dropped", data.len()),
            }
        })?;
        info!("ESP-NOW: broadcast radio ready");
        Ok(Self { espnow })
    }
}

impl RadioPort for EspNowRadio {
    fn send(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        self.espnow.send(BROADCAST, frame).map_err(|e| {
            warn!("ESP-NOW: send failed: {}", e);
            RadioError::SendFailed
        })
    }
}
