//! Simulated line, timer and clock for unit tests
extern crate std;

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Waker;
use std::boxed::Box;
use std::sync::Arc;
use std::task::Wake;

use embassy_time::Duration;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::hal::{Clock, Edge, LinePin, OneShotTimer, Pull, TimerService};

/// Leak a value for the lifetime of the test binary
pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Waker that records whether it was woken
#[derive(Default)]
pub struct WakeFlag(AtomicBool);

impl WakeFlag {
    pub fn waker() -> (Arc<Self>, Waker) {
        let flag = Arc::new(Self::default());
        (flag.clone(), Waker::from(flag))
    }

    pub fn woken(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Wake for WakeFlag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Shared state of the simulated hardware
#[derive(Default)]
pub struct Bench {
    now: Cell<u64>,
    high: Cell<bool>,
    pull: Cell<Option<Pull>>,
    edge: Cell<Option<Edge>>,
    handler: Cell<bool>,
    enabled: Cell<bool>,
    enables: Cell<u32>,
    detaches: Cell<u32>,
    timer_live: Cell<bool>,
    timer_deadline: Cell<Option<u64>>,
    timer_delay: Cell<Option<Duration>>,
    timer_starts: Cell<u32>,
    timer_stops: Cell<u32>,
    fail_configure: Cell<bool>,
    fail_pull: Cell<bool>,
    fail_read: Cell<bool>,
    fail_attach: Cell<bool>,
    fail_enable: Cell<bool>,
    fail_disable: Cell<bool>,
    fail_timer_create: Cell<bool>,
    fail_timer_start: Cell<bool>,
}

impl Bench {
    /// New bench with the line low and the clock at `now`
    pub fn new(now: u64) -> &'static Self {
        let bench = leak(Bench::default());
        bench.now.set(now);
        bench
    }

    pub fn line(&'static self) -> FakeLine {
        FakeLine(self)
    }

    pub fn clock(&'static self) -> FakeClock {
        FakeClock(self)
    }

    pub fn timers(&'static self) -> FakeTimers {
        FakeTimers(self)
    }

    pub fn set_level(&self, high: bool) {
        self.high.set(high);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn pull(&self) -> Option<Pull> {
        self.pull.get()
    }

    pub fn edge(&self) -> Option<Edge> {
        self.edge.get()
    }

    pub fn handler_attached(&self) -> bool {
        self.handler.get()
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// An edge on the line reaches the handler
    pub fn interrupt_live(&self) -> bool {
        self.handler.get() && self.enabled.get()
    }

    pub fn enable_count(&self) -> u32 {
        self.enables.get()
    }

    pub fn detach_count(&self) -> u32 {
        self.detaches.get()
    }

    pub fn timer_live(&self) -> bool {
        self.timer_live.get()
    }

    pub fn timer_deadline(&self) -> Option<u64> {
        self.timer_deadline.get()
    }

    pub fn timer_delay(&self) -> Option<Duration> {
        self.timer_delay.get()
    }

    pub fn timer_starts(&self) -> u32 {
        self.timer_starts.get()
    }

    pub fn timer_stops(&self) -> u32 {
        self.timer_stops.get()
    }

    pub fn timer_due(&self) -> bool {
        self.timer_deadline.get().is_some_and(|deadline| self.now.get() >= deadline)
    }

    /// Expire the one-shot timer, the caller then runs the expiry handler
    pub fn timer_fire(&self) {
        self.timer_deadline.set(None);
    }

    pub fn fail_configure(&self, fail: bool) {
        self.fail_configure.set(fail);
    }

    pub fn fail_pull(&self, fail: bool) {
        self.fail_pull.set(fail);
    }

    pub fn fail_read(&self, fail: bool) {
        self.fail_read.set(fail);
    }

    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.set(fail);
    }

    pub fn fail_enable(&self, fail: bool) {
        self.fail_enable.set(fail);
    }

    pub fn fail_disable(&self, fail: bool) {
        self.fail_disable.set(fail);
    }

    pub fn fail_timer_create(&self, fail: bool) {
        self.fail_timer_create.set(fail);
    }

    pub fn fail_timer_start(&self, fail: bool) {
        self.fail_timer_start.set(fail);
    }
}

fn check(fail: &Cell<bool>) -> Result<(), ErrorKind> {
    if fail.get() {
        Err(ErrorKind::Other)
    } else {
        Ok(())
    }
}

pub struct FakeLine(&'static Bench);

impl ErrorType for FakeLine {
    type Error = ErrorKind;
}

impl InputPin for FakeLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        check(&self.0.fail_read)?;
        Ok(self.0.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl LinePin for FakeLine {
    fn configure_input(&mut self, pull: Pull) -> Result<(), Self::Error> {
        check(&self.0.fail_configure)?;
        self.0.pull.set(Some(pull));
        Ok(())
    }

    fn set_pull(&mut self, pull: Pull) -> Result<(), Self::Error> {
        check(&self.0.fail_pull)?;
        self.0.pull.set(Some(pull));
        Ok(())
    }

    fn set_interrupt_type(&mut self, edge: Edge) -> Result<(), Self::Error> {
        check(&self.0.fail_configure)?;
        self.0.edge.set(Some(edge));
        Ok(())
    }

    fn attach_handler(&mut self) -> Result<(), Self::Error> {
        check(&self.0.fail_attach)?;
        self.0.handler.set(true);
        Ok(())
    }

    fn detach_handler(&mut self) {
        self.0.handler.set(false);
        self.0.detaches.set(self.0.detaches.get() + 1);
    }

    fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
        check(&self.0.fail_enable)?;
        self.0.enabled.set(true);
        self.0.enables.set(self.0.enables.get() + 1);
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        check(&self.0.fail_disable)?;
        self.0.enabled.set(false);
        Ok(())
    }
}

pub struct FakeClock(&'static Bench);

impl Clock for FakeClock {
    fn now_millis(&self) -> u64 {
        self.0.now.get()
    }
}

pub struct FakeTimer(&'static Bench);

impl OneShotTimer for FakeTimer {
    type Error = ();

    fn start_once(&mut self, delay: Duration) -> Result<(), ()> {
        if self.0.fail_timer_start.get() {
            return Err(());
        }
        self.0.timer_starts.set(self.0.timer_starts.get() + 1);
        self.0.timer_delay.set(Some(delay));
        self.0.timer_deadline.set(Some(self.0.now.get() + delay.as_millis()));
        Ok(())
    }

    fn stop(&mut self) {
        self.0.timer_stops.set(self.0.timer_stops.get() + 1);
        self.0.timer_deadline.set(None);
    }

    fn is_active(&self) -> bool {
        self.0.timer_deadline.get().is_some()
    }
}

impl Drop for FakeTimer {
    fn drop(&mut self) {
        self.0.timer_deadline.set(None);
        self.0.timer_live.set(false);
    }
}

pub struct FakeTimers(pub &'static Bench);

impl TimerService for FakeTimers {
    type Timer = FakeTimer;
    type Error = ();

    fn create(&mut self) -> Result<FakeTimer, ()> {
        if self.0.fail_timer_create.get() {
            return Err(());
        }
        self.0.timer_live.set(true);
        Ok(FakeTimer(self.0))
    }
}

/// Pin mock from embedded-hal-mock, only the level reads are recorded transactions
impl LinePin for embedded_hal_mock::eh1::digital::Mock {
    fn configure_input(&mut self, _pull: Pull) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_pull(&mut self, _pull: Pull) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_interrupt_type(&mut self, _edge: Edge) -> Result<(), Self::Error> {
        Ok(())
    }

    fn attach_handler(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn detach_handler(&mut self) {}

    fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
