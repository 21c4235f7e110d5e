//! Display strobe timer using ESP-IDF's esp_timer API.
//!
//! A periodic timer pushes the light-sense strobe
//! `(ID_DISPLAY, DISPLAY_EVT_LIGHT_SENSE)` into the lock-free ISR queue;
//! the main loop drains it onto the bus where the light sensor picks it up.
//! On host targets nothing is started and tests publish the strobe directly.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which only touches atomics.

use crate::events::{DISPLAY_EVT_LIGHT_SENSE, Event, ID_DISPLAY, push_event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut STROBE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// The strobe event as queued by the timer.
pub const fn strobe_event() -> Event {
    Event::new(ID_DISPLAY, DISPLAY_EVT_LIGHT_SENSE)
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn strobe_cb(_arg: *mut core::ffi::c_void) {
    // A full queue drops this strobe; the next one comes a period later.
    let _ = push_event(strobe_event());
}

/// Start the periodic light-sense strobe.
#[cfg(target_os = "espidf")]
pub fn start_strobe(period_ms: u32) {
    // SAFETY: STROBE_TIMER is written here once at boot from the single
    // main-task context before the callback can fire.  The callback only
    // calls push_event(), which is ISR-safe.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(strobe_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"strobe\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut STROBE_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: strobe timer create failed (rc={}), light sensor idle", ret);
            return;
        }
        let ret = esp_timer_start_periodic(STROBE_TIMER, u64::from(period_ms) * 1000);
        if ret != ESP_OK {
            log::error!("hw_timer: strobe timer start failed (rc={})", ret);
            return;
        }
        info!("hw_timer: light-sense strobe every {}ms", period_ms);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_strobe(period_ms: u32) {
    log::info!("hw_timer(sim): strobe not started ({}ms requested)", period_ms);
}

/// Stop the strobe timer.
#[cfg(target_os = "espidf")]
pub fn stop_strobe() {
    // SAFETY: STROBE_TIMER is a valid handle if start_strobe() succeeded;
    // the null check covers the failure path.  Main task only.
    unsafe {
        let t = STROBE_TIMER;
        if !t.is_null() {
            esp_timer_stop(t);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_strobe() {}

/// Queue one strobe by hand, as the timer would.
pub fn strobe_now() -> bool {
    push_event(strobe_event())
}
