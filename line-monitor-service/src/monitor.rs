//! Line Monitor Definitions
//!
//! A [`LineMonitor`] has two entry points that share its state. [`LineMonitor::on_interrupt`] runs in
//! interrupt context on any edge of the line, [`LineMonitor::on_debounce`] runs in task context when the
//! debounce timer expires. While a debounce timer is pending the interrupt source is masked, so the
//! two entry points never sample the same line at the same time.
use embedded_hal::digital::PinState;
use embedded_services::{debug, error, info, trace, warn};

use crate::config::LineConfig;
use crate::dispatch::{DispatchTarget, Update};
use crate::event::{Callback, LineEventData, LineState, Press, Transition};
use crate::hal::{Clock, Edge, LinePin, OneShotTimer, Pull, TimerService};
use crate::{Error, PinId};

/// Debounced monitor of a single input line
pub struct LineMonitor<P: LinePin, T: OneShotTimer, C: Clock> {
    id: PinId,
    pin: P,
    clock: C,
    config: LineConfig,
    timer: Option<T>,
    state: LineState,
    /// Clock time of the last logical change, zero if there was none
    last_transition: u64,
    /// Interrupt source unmasked
    armed: bool,
    handler_attached: bool,
    target: DispatchTarget,
    callback: Option<Callback>,
}

impl<P: LinePin, T: OneShotTimer, C: Clock> LineMonitor<P, T, C> {
    /// Creates a new monitor. The hardware is untouched until [`LineMonitor::initialize`].
    pub fn new(id: PinId, pin: P, clock: C, config: LineConfig) -> Self {
        Self {
            id,
            pin,
            clock,
            config,
            timer: None,
            state: LineState::Unknown,
            last_transition: 0,
            armed: false,
            handler_attached: false,
            target: DispatchTarget::None,
            callback: None,
        }
    }

    /// Pin identifier
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Line configuration
    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Last recorded logical state, does not sample the line
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Returns true while the interrupt source is unmasked
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Clock time of the last logical change, zero if none was observed
    pub fn last_transition_ms(&self) -> u64 {
        self.last_transition
    }

    /// Returns true while a debounce timer is pending
    pub fn is_debouncing(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| timer.is_active())
    }

    /// Sets or clears the direct notification hook
    ///
    /// The hook runs while the line is being sampled, in interrupt context for edges without a debounce
    /// window. When the monitor lives in a [`crate::embassy::SharedLineMonitor`] the holder is busy for
    /// the duration of the call, so the hook gets [`LineState::Unknown`] and `None` from it.
    pub fn set_callback(&mut self, callback: Option<Callback>) {
        self.callback = callback;
    }

    /// Selects where events are delivered
    pub fn set_dispatch_target(&mut self, target: DispatchTarget) {
        self.target = target;
    }

    /// Configures the hardware and establishes the initial state
    ///
    /// Configures the pin, allocates the debounce timer if a window is set, registers and unmasks the
    /// interrupt if enabled and finally samples the line once. The initial sample never produces
    /// events. On failure nothing stays armed or registered.
    pub fn initialize<S>(&mut self, timers: &mut S) -> Result<LineState, Error>
    where
        S: TimerService<Timer = T>,
    {
        self.pin.configure_input(self.config.pull()).map_err(|_| {
            error!("Pin {}: failed to configure input", self.id.0);
            Error::PinConfigurationFailed
        })?;

        if self.config.interrupt_enabled {
            self.pin.set_interrupt_type(Edge::Any).map_err(|_| {
                error!("Pin {}: failed to set interrupt type", self.id.0);
                Error::PinConfigurationFailed
            })?;
        }

        if self.config.debounced() && self.timer.is_none() {
            let timer = timers.create().map_err(|_| {
                error!("Pin {}: failed to create debounce timer", self.id.0);
                Error::TimerCreationFailed
            })?;
            self.timer = Some(timer);
        }

        if self.config.interrupt_enabled && !self.armed {
            if let Err(e) = self.register_interrupt() {
                self.release_timer();
                return Err(e);
            }
        }

        info!("Pin {} initialized", self.id.0);

        // Re-initialization establishes the state again instead of reporting a change
        self.state = LineState::Unknown;
        let (state, _) = self.sample();
        Ok(state)
    }

    fn register_interrupt(&mut self) -> Result<(), Error> {
        if !self.handler_attached {
            self.pin.attach_handler().map_err(|_| {
                error!("Pin {}: failed to register interrupt handler", self.id.0);
                Error::InterruptRegistrationFailed
            })?;
            self.handler_attached = true;
        }

        if self.pin.enable_interrupt().is_err() {
            error!("Pin {}: failed to enable interrupt", self.id.0);
            self.pin.detach_handler();
            self.handler_attached = false;
            return Err(Error::InterruptRegistrationFailed);
        }

        self.armed = true;
        Ok(())
    }

    fn release_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            if timer.is_active() {
                timer.stop();
            }
        }
    }

    /// Interrupt entry point, call on any edge of the line
    ///
    /// Never blocks or allocates. With a debounce window the interrupt is masked and the timer (re)armed,
    /// otherwise the line is sampled and events are delivered right away. Returns true if a waiting task
    /// was made runnable and the caller should request a context switch.
    pub fn on_interrupt(&mut self) -> bool {
        if let Some(timer) = self.timer.as_mut() {
            if timer.is_active() {
                timer.stop();
            }

            // Mask before arming so the pending timer alone owns the next wake-up
            let masked = self.config.interrupt_enabled && self.armed && self.pin.disable_interrupt().is_ok();
            if masked {
                self.armed = false;
            }

            if timer.start_once(self.config.debounce).is_ok() {
                return false;
            }

            // No timer is pending now, the interrupt has to own the next wake-up. It may have been
            // masked by an earlier edge whose debounce was just stopped.
            warn!("Pin {}: failed to arm debounce timer, sampling now", self.id.0);
            if self.config.interrupt_enabled && !self.armed {
                self.armed = self.pin.enable_interrupt().is_ok();
                if !self.armed {
                    error!("Pin {}: failed to re-enable interrupt", self.id.0);
                }
            }
        }

        match self.sample() {
            (_, Some(transition)) => self.target.deliver_from_isr(&transition),
            (_, None) => false,
        }
    }

    /// Debounce timer expiry, call from task context
    ///
    /// Unmasks the interrupt and samples the line. If unmasking fails the line stays masked and
    /// [`LineMonitor::is_armed`] reports it.
    pub fn on_debounce(&mut self) -> Update {
        if let Some(timer) = self.timer.as_mut() {
            if timer.is_active() {
                timer.stop();
            }
        }

        if self.config.interrupt_enabled {
            self.armed = self.pin.enable_interrupt().is_ok();
            if !self.armed {
                error!("Pin {}: failed to re-enable interrupt after debounce", self.id.0);
            }
        }

        self.read()
    }

    /// Samples the line on demand
    pub fn read(&mut self) -> Update {
        let (state, transition) = self.sample();
        Update::new(state, transition, self.target, self.config.post_timeout)
    }

    /// Resumes monitoring
    ///
    /// Optionally restores the configured pull, unmasks the interrupt if it is masked and samples the
    /// line to catch changes missed while inactive.
    pub fn activate(&mut self, restore_pull: bool) -> Result<Update, Error> {
        if restore_pull {
            self.set_internal_pull(self.config.internal_pull)?;
        }

        if self.config.interrupt_enabled && !self.armed {
            self.pin.enable_interrupt().map_err(|_| {
                error!("Pin {}: failed to enable interrupt", self.id.0);
                Error::InterruptToggleFailed
            })?;
            self.armed = true;
        }

        Ok(self.read())
    }

    /// Suspends monitoring
    ///
    /// Optionally floats the input, cancels a pending debounce and masks the interrupt.
    pub fn deactivate(&mut self, clear_pull: bool) -> Result<(), Error> {
        if clear_pull {
            self.set_internal_pull(false)?;
        }

        if let Some(timer) = self.timer.as_mut() {
            if timer.is_active() {
                timer.stop();
            }
        }

        if self.config.interrupt_enabled && self.armed {
            self.pin.disable_interrupt().map_err(|_| {
                error!("Pin {}: failed to disable interrupt", self.id.0);
                Error::InterruptToggleFailed
            })?;
            self.armed = false;
        }

        Ok(())
    }

    /// Enables the pull matching the active level or floats the input
    pub fn set_internal_pull(&mut self, enabled: bool) -> Result<(), Error> {
        let pull = if enabled { self.config.active_pull() } else { Pull::None };

        self.pin.set_pull(pull).map_err(|_| {
            error!("Pin {}: failed to set pull {:?}", self.id.0, pull);
            Error::PullModeChangeFailed
        })
    }

    /// Masks the interrupt, removes the handler and releases the timer
    ///
    /// Safe to call any number of times, failures while tearing down are ignored.
    pub fn deinit(&mut self) {
        trace!("Pin {}: deinit", self.id.0);

        let _ = self.pin.disable_interrupt();
        self.armed = false;

        if self.handler_attached {
            self.pin.detach_handler();
            self.handler_attached = false;
        }

        self.release_timer();
    }

    fn sample(&mut self) -> (LineState, Option<Transition>) {
        let level = match self.pin.is_high() {
            Ok(high) => PinState::from(high),
            Err(_) => {
                warn!("Pin {}: failed to read level", self.id.0);
                return (self.state, None);
            }
        };

        let logical = LineState::from_level(level, self.config.active_level);
        if logical == self.state {
            return (logical, None);
        }

        let previous = self.state;
        self.state = logical;
        if previous == LineState::Unknown {
            debug!("Pin {}: initial state {:?}", self.id.0, logical);
            return (logical, None);
        }

        let now = self.clock.now_millis();
        let duration = if self.last_transition == 0 {
            0
        } else {
            now.saturating_sub(self.last_transition)
        };
        self.last_transition = now;

        let data = LineEventData {
            pin: self.id.0,
            active: logical.is_active(),
            duration_ms: u32::try_from(duration).unwrap_or(u32::MAX),
        };

        let press = if previous == LineState::Active {
            if duration < self.config.long_press_threshold.as_millis() {
                Some(Press::Short)
            } else {
                Some(Press::Long)
            }
        } else {
            None
        };

        debug!(
            "Pin {}: {:?} after {} ms, press {:?}",
            self.id.0, logical, data.duration_ms, press
        );

        if let Some(callback) = self.callback {
            callback(&data);
        }

        (logical, Some(Transition { data, press }))
    }
}

impl<P: LinePin, T: OneShotTimer, C: Clock> Drop for LineMonitor<P, T, C> {
    fn drop(&mut self) {
        self.deinit();
    }
}
