#![no_std]
#![no_main]

mod bluetooth;
mod peripherals;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Core
use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    config::{Config, Debug, HfclkSource, LfclkSource},
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt, Priority},
    peripherals::SPI2,
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim,
};
use embassy_sync::{
    blocking_mutex::{raw::ThreadModeRawMutex, Mutex},
    channel::Channel,
};
use embassy_time::{Duration, Instant, Timer};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

// Crate
use bluetooth::Server;
use peripherals::{backlight::Backlight, battery::Battery, button::SideButton, display::Display};
use pellet_watchface::{
    config::{WatchfaceConfig, BUILD_UTC_EPOCH, EVENT_QUEUE_LEN},
    system::time::{secs_until_next_minute, TimeManager, TimeReference},
    ui::{dispatch, ClockFormat, DefaultWatchface, Event, WatchFace, WatchHost},
};

// Others
use chrono::NaiveDateTime;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

const CONFIG: WatchfaceConfig = WatchfaceConfig::DEFAULT;

// Communication channels
pub static EVENTS: Channel<ThreadModeRawMutex, Event, EVENT_QUEUE_LEN> = Channel::new();

// Latest state, read by the watchface on load and on ticks
pub static BATTERY_PERCENT: AtomicU8 = AtomicU8::new(0);
pub static BLUETOOTH_CONNECTED: AtomicBool = AtomicBool::new(false);
static CLOCK_24H: AtomicBool = AtomicBool::new(CONFIG.clock_format.is_24h());
pub static TIME: Mutex<ThreadModeRawMutex, RefCell<Option<TimeManager>>> =
    Mutex::new(RefCell::new(None));

static SERVER: StaticCell<Server> = StaticCell::new();

/// Environment seen by the watchface
struct FirmwareHost;

impl WatchHost for FirmwareHost {
    fn local_time(&self) -> NaiveDateTime {
        let uptime_us = Instant::now().as_micros();
        TIME.lock(|time| {
            time.borrow()
                .as_ref()
                .map(|manager| manager.local_time(uptime_us))
                .unwrap_or_default()
        })
    }

    fn clock_format(&self) -> ClockFormat {
        ClockFormat::from_24h_flag(CLOCK_24H.load(Ordering::Relaxed))
    }

    fn battery_percent(&self) -> u8 {
        BATTERY_PERCENT.load(Ordering::Relaxed)
    }

    fn bluetooth_connected(&self) -> bool {
        BLUETOOTH_CONNECTED.load(Ordering::Relaxed)
    }
}

/// System configuration
fn system_config() -> Config {
    // Generate default config, required because Config is set as
    // `non_exhaustive`
    let mut config = Config::default();

    // Set high-frequency and low-frequency clock sources to external
    config.hfclk_source = HfclkSource::ExternalXtal;
    config.lfclk_source = LfclkSource::ExternalXtal;

    // Enable DC/DC regulator to massively reduce runtime current consumption
    config.dcdc.reg1 = true;

    // Priorities 0, 1 and 4 are reserved for the SoftDevice
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;

    // Allow debugging
    config.debug = Debug::Allowed;

    config
}

/// Push a tick at every minute boundary.
#[embassy_executor::task]
async fn minute_tick() {
    loop {
        let wait = secs_until_next_minute(&FirmwareHost.local_time());
        Timer::after(Duration::from_secs(wait)).await;
        EVENTS.send(Event::Tick).await;
    }
}

/// Poll the battery and report changed percentages.
#[embassy_executor::task]
async fn battery_monitor(mut battery: Battery, server: &'static Server) {
    loop {
        Timer::after(Duration::from_secs(CONFIG.battery_poll_secs)).await;

        match battery.percent().await {
            Ok(percent) => {
                if BATTERY_PERCENT.swap(percent, Ordering::Relaxed) != percent {
                    defmt::info!(
                        "Battery status: {}% ({})",
                        percent,
                        if battery.is_charging() {
                            "charging"
                        } else {
                            "discharging"
                        }
                    );
                    if let Err(e) = bluetooth::set_battery_level(server, percent) {
                        defmt::warn!("Battery level not published: {}", e);
                    }
                    EVENTS.send(Event::BatteryChange(percent)).await;
                }
            }
            Err(e) => defmt::warn!("Battery measurement failed: {}", e),
        }
    }
}

/// Toggle between 12 and 24 hour format on each button press.
#[embassy_executor::task]
async fn button_monitor(mut button: SideButton) {
    loop {
        button.wait_for_press().await;
        let format = FirmwareHost.clock_format().toggled();
        defmt::info!("Clock format: {}", format);
        CLOCK_24H.store(format.is_24h(), Ordering::Relaxed);
        EVENTS.send(Event::Tick).await;
    }
}

/// Own the watchface: handle every event, then redraw the damaged areas.
#[embassy_executor::task]
async fn render(mut display: Display<SPI2>, _backlight: Backlight) {
    let host = FirmwareHost;
    let events = EVENTS.receiver();
    let mut face = DefaultWatchface::load(&host);
    loop {
        if face.draw(&mut display.canvas()).is_err() {
            defmt::warn!("Display update failed, redrawing on next event");
        }
        dispatch(&mut face, &events, &host).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(system_config());
    defmt::info!("Initializing");

    interrupt::SAADC.set_priority(Priority::P3);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::softdevice_config());
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(bluetooth::softdevice_task(sd)));

    // Start the clock from the build time
    let reference = unwrap!(TimeReference::from_timestamp(
        BUILD_UTC_EPOCH,
        Instant::now().as_micros()
    ));
    TIME.lock(|time| {
        time.replace(Some(TimeManager::init(reference, CONFIG.utc_offset_secs)));
    });

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // Set resolution to 12bit, necessary for correct battery status calculation
    saadc_config.resolution = Resolution::_12BIT;
    // Pin P0.31: Voltage level
    let channel_config = ChannelConfig::single_ended(p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel_config]);
    saadc.calibrate().await;

    // Initialize Battery
    let mut battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));
    match battery.percent().await {
        Ok(percent) => {
            BATTERY_PERCENT.store(percent, Ordering::Relaxed);
            if let Err(e) = bluetooth::set_battery_level(server, percent) {
                defmt::warn!("Battery level not published: {}", e);
            }
        }
        Err(e) => defmt::warn!("Initial battery measurement failed: {}", e),
    }

    // Initialize Button
    let button = SideButton::init(
        Input::new(p.P0_13, Pull::None),
        Output::new(p.P0_15, Level::Low, OutputDrive::Standard),
    );

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;

    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
    ));

    // Initialize Backlight
    let mut backlight = Backlight::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
    );
    unwrap!(backlight.set(CONFIG.backlight_level));

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(render(display, backlight)));
    unwrap!(spawner.spawn(minute_tick()));
    unwrap!(spawner.spawn(battery_monitor(battery, server)));
    unwrap!(spawner.spawn(button_monitor(button)));
    unwrap!(spawner.spawn(bluetooth::bluetooth_task(sd, server)));
}
