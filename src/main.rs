//! SensorNode Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single event-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioOutput  AdcInput  Ds18b20Bus   NvsAdapter   Esp32Time     │
//! │  (OutputPin) (Analog)  (TempBus)    (Config+NVS) (uptime)      │
//! │  WifiAdapter  httpd + /ws  LogEventSink                        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  Registry · SyncEngine · Dispatcher · Connections      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · transport channel · watchdog    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::onewire::OWDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{debug, info, warn};

use sensornode::adapters::hardware::{AdcInput, GpioOutput};
use sensornode::adapters::http::{self, drain_transport_events};
use sensornode::adapters::log_sink::LogEventSink;
use sensornode::adapters::nvs::NvsAdapter;
use sensornode::adapters::onewire::{Ds18b20Bus, EspOneWire};
use sensornode::adapters::time::Esp32TimeAdapter;
use sensornode::adapters::wifi::{ConnectivityPort, WifiAdapter};
use sensornode::app::ports::{ConfigError, ConfigPort, ScheduleFiredKind, SchedulerDelegate};
use sensornode::app::service::NodeService;
use sensornode::config::NodeConfig;
use sensornode::drivers::{hw_init, watchdog::Watchdog};
use sensornode::element::{AnalogSensor, PageScaffold, TemperatureProbe, ToggleOutput};
use sensornode::events::{self, push_event, Event};
use sensornode::pins;
use sensornode::registry::Registry;
use sensornode::scheduler::{Schedule, ScheduleKind, Scheduler};

/// Idle time per loop iteration; keeps the idle task (and its watchdog) fed.
const LOOP_DELAY_MS: u32 = 10;

const WIFI_POLL_MS: u32 = 1_000;

const PAGE_TITLE: &str = "SensorNode";

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the event system)
// to the event queue: each label maps to one `Event`.

struct EventQueueDelegate;

impl SchedulerDelegate for EventQueueDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        let event = match label {
            "sync" => Event::SyncTick,
            "wifi" => Event::WifiPoll,
            other => {
                debug!("Schedule fired: '{}' ({:?}) has no event", other, kind);
                return;
            }
        };
        if !push_event(event) {
            debug!("event queue full, {:?} skipped", event);
        }
    }
}

// ── Element table ─────────────────────────────────────────────

type ProbeBus = Ds18b20Bus<EspOneWire, FreeRtos>;

/// Build the default board: scaffold, two LEDs, one DS18B20 probe and a
/// photoresistor.  A duplicate name aborts startup.
fn build_registry(config: &NodeConfig, bus: &Rc<RefCell<ProbeBus>>) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(Box::new(PageScaffold::new(PAGE_TITLE)))?;
    registry.register(Box::new(ToggleOutput::new(
        pins::LED1_GPIO,
        GpioOutput::new(pins::LED1_GPIO),
    )))?;
    registry.register(Box::new(ToggleOutput::new(
        pins::LED2_GPIO,
        GpioOutput::new(pins::LED2_GPIO),
    )))?;
    registry.register(Box::new(TemperatureProbe::new(Rc::clone(bus), pins::PROBE0_INDEX)))?;
    registry.register(Box::new(AnalogSensor::new(
        pins::PHOTO_ADC_GPIO,
        config.analog_max,
        AdcInput::new(pins::PHOTO_ADC_CHANNEL),
    )))?;
    Ok(registry)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SensorNode v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new()?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(ConfigError::Corrupted) => {
            warn!("NVS config corrupted, using defaults");
            NodeConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            NodeConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // Typed pin handle; must match `pins::ONEWIRE_GPIO`.
    let onewire = OWDriver::new(peripherals.pins.gpio5, peripherals.rmt.channel0)?;
    info!("DS18B20 bus on GPIO {}", pins::ONEWIRE_GPIO);
    let bus = Rc::new(RefCell::new(Ds18b20Bus::new(EspOneWire::new(onewire), FreeRtos)));

    // ── 4. Registry + service ─────────────────────────────────
    let registry = build_registry(&config, &bus)?;
    let mut log_sink = LogEventSink::new();
    let mut svc = NodeService::new(registry, &config, &nvs);
    svc.start(&mut log_sink);

    // ── 5. Network ────────────────────────────────────────────
    let mut wifi = WifiAdapter::from_config(&config)?;
    wifi.attach(BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), None)?,
        sysloop,
    )?);
    if config.has_credentials() {
        if let Err(e) = wifi.connect() {
            warn!("WiFi: initial connect failed ({}), will retry", e);
        }
    } else {
        warn!("WiFi: no credentials stored, staying offline");
    }

    let _server = http::start_server(svc.render_page(), config.http_port, config.max_sessions)?;

    // ── 6. Schedules ──────────────────────────────────────────
    let mut sched = Scheduler::new();
    let mut sched_delegate = EventQueueDelegate;
    sched.add(Schedule {
        label: "sync",
        kind: ScheduleKind::Periodic {
            interval_ms: config.sync_interval_ms,
        },
        enabled: true,
    });
    sched.add(Schedule {
        label: "wifi",
        kind: ScheduleKind::Periodic {
            interval_ms: WIFI_POLL_MS,
        },
        enabled: true,
    });

    let mut clock = Esp32TimeAdapter::new();
    let mut watchdog = Watchdog::new();

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    loop {
        let elapsed = clock.elapsed_ms();
        sched.tick(elapsed, &mut sched_delegate);

        drain_transport_events(|event| svc.handle(event, &mut nvs, &mut log_sink));

        events::drain_events(|event| match event {
            Event::SyncTick => {
                svc.tick(&mut log_sink);
            }
            Event::WifiPoll => wifi.poll(WIFI_POLL_MS),
        });

        svc.housekeeping(&mut log_sink);
        watchdog.feed();

        FreeRtos::delay_ms(LOOP_DELAY_MS);
    }
}
