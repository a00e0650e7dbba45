//! Embassy platform glue
//!
//! Clock and one-shot timer implementations on top of embassy-time, and a critical-section protected
//! holder that lets an interrupt handler and a task share one [`LineMonitor`].
//!
//! ```ignore
//! static BUTTON: SharedLineMonitor<MyPin, SlotTimer, EmbassyClock> = SharedLineMonitor::new();
//! static BUTTON_TIMER: TimerSlot = TimerSlot::new();
//!
//! // Interrupt handler
//! BUTTON.on_interrupt();
//!
//! // Task owning the debounce expiry
//! BUTTON.run_debounce(&BUTTON_TIMER).await;
//! ```
use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_services::{trace, warn};

use crate::event::LineState;
use crate::hal::{Clock, LinePin, OneShotTimer, TimerService};
use crate::monitor::LineMonitor;

/// Clock backed by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_millis(&self) -> u64 {
        Instant::now().as_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The timer slot is already in use
pub struct SlotBusy;

#[derive(Default)]
struct SlotState {
    claimed: bool,
    deadline: Option<Instant>,
}

/// Storage for one one-shot timer
///
/// Timers are handed out by [`TimerService::create`] on `&'static TimerSlot`, one at a time. Expiry
/// is observed by a task awaiting [`TimerSlot::expired`].
pub struct TimerSlot {
    state: Mutex<CriticalSectionRawMutex, RefCell<SlotState>>,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl TimerSlot {
    /// Create an unclaimed slot
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SlotState {
                claimed: false,
                deadline: None,
            })),
            changed: Signal::new(),
        }
    }

    fn set_deadline(&self, deadline: Option<Instant>) {
        self.state.lock(|state| state.borrow_mut().deadline = deadline);
        self.changed.signal(());
    }

    fn deadline(&self) -> Option<Instant> {
        self.state.lock(|state| state.borrow().deadline)
    }

    /// Returns true while a timer is claimed from this slot
    pub fn is_claimed(&self) -> bool {
        self.state.lock(|state| state.borrow().claimed)
    }

    /// Wait until the armed timer expires
    ///
    /// Rearming or stopping the timer while waiting moves or cancels the expiry.
    pub async fn expired(&self) {
        loop {
            let Some(deadline) = self.deadline() else {
                self.changed.wait().await;
                continue;
            };

            if let Either::First(()) = select(Timer::at(deadline), self.changed.wait()).await {
                let fired = self.state.lock(|state| {
                    let mut state = state.borrow_mut();
                    if state.deadline == Some(deadline) {
                        state.deadline = None;
                        true
                    } else {
                        false
                    }
                });

                if fired {
                    return;
                }
            }
        }
    }
}

impl Default for TimerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for &'static TimerSlot {
    type Timer = SlotTimer;
    type Error = SlotBusy;

    fn create(&mut self) -> Result<SlotTimer, SlotBusy> {
        let slot: &'static TimerSlot = *self;
        slot.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.claimed {
                return Err(SlotBusy);
            }
            state.claimed = true;
            state.deadline = None;
            Ok(SlotTimer { slot })
        })
    }
}

/// One-shot timer claimed from a [`TimerSlot`], releases the slot on drop
pub struct SlotTimer {
    slot: &'static TimerSlot,
}

impl OneShotTimer for SlotTimer {
    type Error = core::convert::Infallible;

    fn start_once(&mut self, delay: Duration) -> Result<(), Self::Error> {
        self.slot.set_deadline(Some(Instant::now() + delay));
        Ok(())
    }

    fn stop(&mut self) {
        self.slot.set_deadline(None);
    }

    fn is_active(&self) -> bool {
        self.slot.deadline().is_some()
    }
}

impl Drop for SlotTimer {
    fn drop(&mut self) {
        self.slot.state.lock(|state| *state.borrow_mut() = SlotState::default());
        self.slot.changed.signal(());
    }
}

/// A [`LineMonitor`] shared between its interrupt handler and the task running its debounce expiry
pub struct SharedLineMonitor<P: LinePin, T: OneShotTimer, C: Clock> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<LineMonitor<P, T, C>>>>,
}

impl<P: LinePin, T: OneShotTimer, C: Clock> SharedLineMonitor<P, T, C> {
    /// Create an empty holder
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install an initialized monitor, returns the one it replaces
    pub fn install(&self, monitor: LineMonitor<P, T, C>) -> Option<LineMonitor<P, T, C>> {
        self.inner.lock(|inner| inner.borrow_mut().replace(monitor))
    }

    /// Take the monitor out, the interrupt handler becomes a no-op
    ///
    /// Dropping the returned monitor tears it down.
    pub fn remove(&self) -> Option<LineMonitor<P, T, C>> {
        self.inner.lock(|inner| inner.borrow_mut().take())
    }

    /// Run `f` on the installed monitor
    ///
    /// Returns `None` if no monitor is installed or the monitor is already in use, which is the case
    /// when called from the monitor's own callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut LineMonitor<P, T, C>) -> R) -> Option<R> {
        self.inner.lock(|inner| {
            let Ok(mut inner) = inner.try_borrow_mut() else {
                warn!("Line monitor is busy");
                return None;
            };
            inner.as_mut().map(f)
        })
    }

    /// Interrupt handler entry, returns true if a context switch should be requested
    pub fn on_interrupt(&self) -> bool {
        self.with(|monitor| monitor.on_interrupt()).unwrap_or(false)
    }

    /// Last recorded state, [`LineState::Unknown`] if no monitor is installed or it is in use
    pub fn state(&self) -> LineState {
        self.with(|monitor| monitor.state()).unwrap_or(LineState::Unknown)
    }

    /// Sample on demand and deliver the resulting events
    pub async fn read(&self) -> Option<LineState> {
        let update = self.with(|monitor| monitor.read())?;
        Some(update.dispatch().await)
    }

    /// Debounce expiry loop, run from a task
    pub async fn run_debounce(&self, slot: &TimerSlot) -> ! {
        loop {
            slot.expired().await;
            trace!("Debounce timer expired");

            if let Some(update) = self.with(|monitor| monitor.on_debounce()) {
                update.dispatch().await;
            }
        }
    }
}

impl<P: LinePin, T: OneShotTimer, C: Clock> Default for SharedLineMonitor<P, T, C> {
    fn default() -> Self {
        Self::new()
    }
}
