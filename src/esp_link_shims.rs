//! `critical-section` provider for ESP-IDF builds.
//!
//! `embassy-sync` guards [`RADIO_RX_CHANNEL`] with a critical section; the
//! ESP-NOW receive callback (WiFi task) and the main loop both touch it.
//! Both run as FreeRTOS tasks, so a re-entrant process-wide mutex is
//! enough.  Host builds get their implementation from `critical-section`'s
//! `std` feature instead.
//!
//! [`RADIO_RX_CHANNEL`]: crate::drivers::radio_event::RADIO_RX_CHANNEL

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "espidf")]
static CS_MUTEX: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static CS_NESTING: Cell<u8> = const { Cell::new(0) };
    static CS_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

/// Enter the critical section; nested entries on the same task only bump
/// the nesting count.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CS_NESTING.with(|nesting| {
        let depth = nesting.get();
        if depth == 0 {
            let guard = CS_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
            CS_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));
        }
        let depth = depth.saturating_add(1);
        nesting.set(depth);
        depth
    })
}

/// Leave the critical section; the mutex is released with the outermost exit.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CS_NESTING.with(|nesting| match nesting.get() {
        0 => {}
        1 => {
            nesting.set(0);
            CS_GUARD.with(|slot| slot.borrow_mut().take());
        }
        depth => nesting.set(depth - 1),
    })
}
