//! Tick-driven software timers.
//!
//! The main loop owns the clock: it calls [`TimerService::tick`] with the
//! current uptime, and every schedule that has come due fires right
//! there, in order of due time.  Callbacks therefore run in the same
//! cooperative context as bus listeners and may freely publish, arm or
//! cancel.
//!
//! [`SoftTimer`] wraps one slot of the service behind the
//! [`OneShotTimer`] port so drivers never see the service directly.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{trace, warn};

use crate::error::{Result, TimerError};
use crate::ports::OneShotTimer;

/// Maximum number of pending schedules.  Each [`SoftTimer`] holds at
/// most one, so this bounds the number of timer-owning drivers.
pub const MAX_TIMERS: usize = 16;

/// Handle to a pending schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u32);

struct Slot {
    id: TimerId,
    due_ms: u32,
    callback: Box<dyn FnOnce()>,
}

/// Shared software timer service.
pub struct TimerService {
    now_ms: Cell<u32>,
    slots: RefCell<heapless::Vec<Slot, MAX_TIMERS>>,
    next_id: Cell<u32>,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    pub fn new() -> Self {
        Self {
            now_ms: Cell::new(0),
            slots: RefCell::new(heapless::Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Last time seen by [`tick`](Self::tick).
    pub fn now_ms(&self) -> u32 {
        self.now_ms.get()
    }

    /// Run `callback` once, `after_ms` from the last tick.
    pub fn schedule<F>(&self, after_ms: u32, callback: F) -> Result<TimerId>
    where
        F: FnOnce() + 'static,
    {
        let id = TimerId(self.next_id.get());
        let due_ms = self.now_ms.get().wrapping_add(after_ms);
        self.slots
            .borrow_mut()
            .push(Slot {
                id,
                due_ms,
                callback: Box::new(callback),
            })
            .map_err(|_| TimerError::Full)?;
        self.next_id.set(self.next_id.get().wrapping_add(1));
        trace!("timer: #{} due at {}ms", id.0, due_ms);
        Ok(id)
    }

    /// Drop a pending schedule.  Returns `false` if it already fired or
    /// was never scheduled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let removed = {
            let mut slots = self.slots.borrow_mut();
            slots
                .iter()
                .position(|s| s.id == id)
                .map(|idx| slots.swap_remove(idx))
        };
        removed.is_some()
    }

    /// Advance the clock to `now_ms` and fire everything due.
    ///
    /// `now_ms` is a wrapping millisecond counter; a schedule is due
    /// once `now_ms` is at or past its due time within half the range.
    pub fn tick(&self, now_ms: u32) {
        self.now_ms.set(now_ms);

        // Pop one due slot at a time: a callback may schedule or cancel,
        // so the table borrow must not be held while it runs.
        while let Some(slot) = self.take_next_due(now_ms) {
            trace!("timer: #{} fired at {}ms", slot.id.0, now_ms);
            (slot.callback)();
        }
    }

    /// Number of pending schedules.
    pub fn pending(&self) -> usize {
        self.slots.borrow().len()
    }

    fn take_next_due(&self, now_ms: u32) -> Option<Slot> {
        let mut slots = self.slots.borrow_mut();
        let idx = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| is_due(s.due_ms, now_ms))
            .min_by_key(|(_, s)| s.due_ms.wrapping_sub(now_ms) as i32)
            .map(|(i, _)| i)?;
        Some(slots.swap_remove(idx))
    }
}

fn is_due(due_ms: u32, now_ms: u32) -> bool {
    now_ms.wrapping_sub(due_ms) as i32 >= 0
}

// ───────────────────────────────────────────────────────────────
// SoftTimer: one OneShotTimer backed by the shared service
// ───────────────────────────────────────────────────────────────

/// A [`OneShotTimer`] holding at most one pending schedule on a shared
/// [`TimerService`].
pub struct SoftTimer {
    service: Rc<TimerService>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl SoftTimer {
    pub fn new(service: Rc<TimerService>) -> Self {
        Self {
            service,
            pending: Rc::new(Cell::new(None)),
        }
    }
}

impl OneShotTimer for SoftTimer {
    fn arm(&mut self, duration_ms: u32, on_expiry: Box<dyn FnOnce()>) -> Result<()> {
        self.cancel();

        let pending = self.pending.clone();
        let id = self
            .service
            .schedule(duration_ms, move || {
                pending.set(None);
                on_expiry();
            })
            .inspect_err(|e| warn!("SoftTimer: cannot arm for {}ms ({})", duration_ms, e))?;
        self.pending.set(Some(id));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            self.service.cancel(id);
        }
    }

    fn is_armed(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for SoftTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
