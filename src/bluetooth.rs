//! Bluetooth module

use core::{cell::RefCell, mem, sync::atomic::Ordering};

use embassy_sync::blocking_mutex::{raw::ThreadModeRawMutex, Mutex};
use embassy_time::{Duration, Instant, Timer};
use nrf_softdevice::{
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
            ServiceUuid16,
        },
        gatt_server, peripheral, Connection,
    },
    raw, Config, Softdevice,
};

use pellet_watchface::{
    system::{
        power::LevelNotifier,
        time::{TimeReference, CTS_LEN},
    },
    ui::Event,
    Error,
};

use crate::{BATTERY_PERCENT, BLUETOOTH_CONNECTED, EVENTS, TIME};

const DEVICE_NAME: &[u8] = b"Pellet";

/// Pause before advertising again after a failure
const RETRY_DELAY: Duration = Duration::from_secs(1);

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Complete,
        &[ServiceUuid16::BATTERY, ServiceUuid16::CURRENT_TIME],
    )
    .full_name("Pellet")
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(
        ServiceList::Complete,
        &[ServiceUuid16::BATTERY, ServiceUuid16::CURRENT_TIME],
    )
    .build();

/// Live connection and its battery notification state
struct Link {
    conn: Option<Connection>,
    battery: LevelNotifier,
}

impl Link {
    const fn new(conn: Option<Connection>) -> Self {
        Self {
            conn,
            battery: LevelNotifier::new(),
        }
    }
}

static LINK: Mutex<ThreadModeRawMutex, RefCell<Link>> =
    Mutex::new(RefCell::new(Link::new(None)));

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bas: BatteryService,
    pub cts: CurrentTimeService,
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", read, write)]
    pub current_time: [u8; CTS_LEN],
}

/// SoftDevice configuration
pub fn softdevice_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Store a new battery level and notify a subscribed client.
pub fn set_battery_level(server: &Server, percent: u8) -> Result<(), Error> {
    server
        .bas
        .battery_level_set(&percent)
        .map_err(|_| Error::Bluetooth)?;
    LINK.lock(|link| {
        let mut link = link.borrow_mut();
        let Link { conn, battery } = &mut *link;
        match (conn.as_ref(), battery.next(percent)) {
            (Some(conn), Some(level)) => server
                .bas
                .battery_level_notify(conn, &level)
                .map_err(|_| Error::Bluetooth),
            _ => Ok(()),
        }
    })
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, serve one connection at a time and report connection changes.
#[embassy_executor::task]
pub async fn bluetooth_task(sd: &'static Softdevice, server: &'static Server) {
    let config = peripheral::Config::default();
    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::warn!("Advertising failed: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
        };

        defmt::info!("Bluetooth connected");
        LINK.lock(|link| link.replace(Link::new(Some(conn.clone()))));
        set_connected(true).await;

        let reason = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                defmt::debug!("Battery notifications: {}", notifications);
                LINK.lock(|link| link.borrow_mut().battery.set_subscribed(notifications));
                if notifications {
                    let percent = BATTERY_PERCENT.load(Ordering::Relaxed);
                    if let Err(e) = set_battery_level(server, percent) {
                        defmt::warn!("Battery level not notified: {}", e);
                    }
                }
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
                apply_current_time(&bytes);
            }
        })
        .await;

        defmt::info!("Bluetooth disconnected: {:?}", reason);
        LINK.lock(|link| link.replace(Link::new(None)));
        set_connected(false).await;
    }
}

async fn set_connected(connected: bool) {
    BLUETOOTH_CONNECTED.store(connected, Ordering::Relaxed);
    EVENTS.send(Event::BluetoothChange(connected)).await;
}

/// Reset the clock from a Current Time characteristic write.
fn apply_current_time(bytes: &[u8]) {
    let reference = match TimeReference::from_cts_bytes(bytes, Instant::now().as_micros()) {
        Ok(reference) => reference,
        Err(e) => {
            defmt::warn!("Rejected current time: {}", e);
            return;
        }
    };
    TIME.lock(|time| {
        if let Some(manager) = time.borrow_mut().as_mut() {
            manager.set_time(reference);
        }
    });
    // Redraw with the new time. A full queue already holds a pending redraw.
    if EVENTS.try_send(Event::Tick).is_err() {
        defmt::debug!("Event queue full, time update deferred");
    }
}
