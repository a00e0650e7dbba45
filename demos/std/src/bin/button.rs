use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::{Executor, Spawner};
use embassy_time::Timer;
use embedded_hal::digital::{ErrorType, InputPin, PinState};
use embedded_services::EventBus;
use line_monitor_service::config::kind;
use line_monitor_service::embassy::{EmbassyClock, SharedLineMonitor, SlotTimer, TimerSlot};
use line_monitor_service::hal::{Edge, LinePin, Pull};
use line_monitor_service::{BusRoute, DispatchTarget, LineConfig, LineEventData, LineMonitor, PinId};
use log::{info, warn};
use static_cell::StaticCell;

/// Simulated active-low push button wired to an interrupt capable pin
mod sim {
    use super::*;

    static LEVEL: AtomicBool = AtomicBool::new(true);
    static HANDLER: AtomicBool = AtomicBool::new(false);
    static ENABLED: AtomicBool = AtomicBool::new(false);

    pub struct Line;

    impl ErrorType for Line {
        type Error = Infallible;
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(LEVEL.load(Ordering::SeqCst))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!LEVEL.load(Ordering::SeqCst))
        }
    }

    impl LinePin for Line {
        fn configure_input(&mut self, pull: Pull) -> Result<(), Infallible> {
            info!("Configured input, pull {:?}", pull);
            Ok(())
        }

        fn set_pull(&mut self, pull: Pull) -> Result<(), Infallible> {
            info!("Pull set to {:?}", pull);
            Ok(())
        }

        fn set_interrupt_type(&mut self, edge: Edge) -> Result<(), Infallible> {
            info!("Interrupt on {:?} edge", edge);
            Ok(())
        }

        fn attach_handler(&mut self) -> Result<(), Infallible> {
            HANDLER.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn detach_handler(&mut self) {
            HANDLER.store(false, Ordering::SeqCst);
        }

        fn enable_interrupt(&mut self) -> Result<(), Infallible> {
            ENABLED.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn disable_interrupt(&mut self) -> Result<(), Infallible> {
            ENABLED.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Drive the line, raising the interrupt if it is unmasked
    pub fn drive(high: bool) {
        if LEVEL.swap(high, Ordering::SeqCst) != high
            && HANDLER.load(Ordering::SeqCst)
            && ENABLED.load(Ordering::SeqCst)
        {
            super::BUTTON.on_interrupt();
        }
    }
}

static BUS: EventBus = EventBus::new();
static BUTTON_TIMER: TimerSlot = TimerSlot::new();
static BUTTON: SharedLineMonitor<sim::Line, SlotTimer, EmbassyClock> = SharedLineMonitor::new();

const BUTTON_ID: PinId = PinId(0);

/// Contact bounce followed by a settled level
async fn bounce_to(high: bool) {
    for _ in 0..3 {
        sim::drive(high);
        Timer::after_millis(2).await;
        sim::drive(!high);
        Timer::after_millis(3).await;
    }
    sim::drive(high);
}

#[embassy_executor::task]
async fn stimulus() {
    loop {
        info!("Holding button for 1200 ms");
        bounce_to(false).await;
        Timer::after_millis(1200).await;
        bounce_to(true).await;
        Timer::after_secs(1).await;

        info!("Tapping button for 300 ms");
        bounce_to(false).await;
        Timer::after_millis(300).await;
        bounce_to(true).await;
        Timer::after_secs(2).await;
    }
}

#[embassy_executor::task]
async fn debounce() {
    BUTTON.run_debounce(&BUTTON_TIMER).await
}

#[embassy_executor::task]
async fn listener() {
    loop {
        let envelope = BUS.receive().await;
        let data: LineEventData = match envelope.decode() {
            Ok(data) => data,
            Err(e) => {
                warn!("Undecodable event: {:?}", e);
                continue;
            }
        };

        match envelope.kind {
            kind::LINE_CHANGE => info!(
                "Pin {} {} after {} ms",
                data.pin,
                if data.active { "active" } else { "inactive" },
                data.duration_ms
            ),
            kind::BUTTON => info!("Pin {} short press", data.pin),
            kind::LONG_BUTTON => info!("Pin {} long press", data.pin),
            other => warn!("Unknown event kind {}", other),
        }
    }
}

#[embassy_executor::task]
async fn run(spawner: Spawner) {
    let mut monitor = LineMonitor::new(
        BUTTON_ID,
        sim::Line,
        EmbassyClock,
        LineConfig::button(PinState::Low),
    );
    monitor.set_dispatch_target(DispatchTarget::Bus {
        bus: &BUS,
        route: BusRoute::default(),
    });

    let mut timers = &BUTTON_TIMER;
    match monitor.initialize(&mut timers) {
        Ok(state) => info!("Button initial state {:?}", state),
        Err(e) => {
            warn!("Button initialization failed: {:?}", e);
            return;
        }
    }
    BUTTON.install(monitor);

    spawner.must_spawn(listener());
    spawner.must_spawn(debounce());
    spawner.must_spawn(stimulus());
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    static EXECUTOR: StaticCell<Executor> = StaticCell::new();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(run(spawner));
    });
}
