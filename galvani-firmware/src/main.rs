//! Galvani - Battery telemetry node firmware
//!
//! Main firmware binary for RP2040-based power monitor boards
//! (Waveshare RP2040-Zero and friends). An INA226 on I2C0 watches the
//! battery rail; the host talks JSON over USB CDC; calibration thresholds
//! persist in the last flash sector.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler as UsbInterruptHandler};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use galvani_core::{Dispatcher, SettingsStore};
use galvani_drivers::power::{Ina226, Ina226Config};
use galvani_hal_rp2040::flash::Rp2040SettingsFlash;
use galvani_hal_rp2040::i2c::Rp2040I2cBus;

mod tasks;

use crate::tasks::serve::NodeDispatcher;

/// Version tag answered for the `fw` query field
pub const FIRMWARE_TAG: &str = concat!("galvani-", env!("CARGO_PKG_VERSION"));

/// USB identity. The host-side discovery helper matches the product string
/// against the system device listing, so these must stay stable.
pub const USB_VID: u16 = 0x16c0;
pub const USB_PID: u16 = 0x27dd;
pub const USB_MANUFACTURER: &str = "galvani";
pub const USB_PRODUCT: &str = "Galvani Power Monitor";

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => UsbInterruptHandler<USB>;
});

// Static buffers for the USB stack (must live forever)
static USB_CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static USB_CDC_STATE: StaticCell<State> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Galvani firmware starting ({})", FIRMWARE_TAG);

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Settings live in the last flash sector; load (and migrate) at boot
    let store = SettingsStore::new(Rp2040SettingsFlash::new(p.FLASH));

    // I2C0 on GPIO0 (SDA) / GPIO1 (SCL), 100 kHz
    let i2c_config = i2c::Config::default();
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, i2c_config);
    let bus = Rp2040I2cBus::new(i2c);

    // INA226 with a 0.1 ohm shunt and 2 A full-scale. A missing or dead
    // sensor is not fatal: queries degrade instead of hanging so the host
    // can still read and tune thresholds.
    let sensor = match Ina226::init(bus, Ina226Config::default()) {
        Ok(sensor) => {
            info!("INA226 calibrated and converting");
            Some(sensor)
        }
        Err(error) => {
            warn!("INA226 init failed: {:?}, serving without sensor", error);
            None
        }
    };

    let dispatcher: NodeDispatcher = Dispatcher::new(sensor, store, FIRMWARE_TAG);
    info!(
        "Settings loaded: min_v={} max_v={} hrs_capacity={}",
        dispatcher.config().min_v,
        dispatcher.config().max_v,
        dispatcher.config().capacity_hours
    );

    // USB CDC device
    let driver = Driver::new(p.USB, Irqs);

    let mut usb_config = embassy_usb::Config::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some(USB_MANUFACTURER);
    usb_config.product = Some(USB_PRODUCT);
    usb_config.serial_number = Some("galvani-node");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;
    // Required for Windows support
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;
    usb_config.composite_with_iads = true;

    let mut builder = Builder::new(
        driver,
        usb_config,
        &mut USB_CONFIG_DESCRIPTOR.init([0; 256])[..],
        &mut USB_BOS_DESCRIPTOR.init([0; 256])[..],
        &mut [], // msos_descriptor
        &mut USB_CONTROL_BUF.init([0; 64])[..],
    );

    let class = CdcAcmClass::new(&mut builder, USB_CDC_STATE.init(State::new()), 64);
    let usb = builder.build();

    // Spawn tasks
    spawner.spawn(tasks::usb::usb_task(usb)).unwrap();
    spawner.spawn(tasks::serve::serve_task(class, dispatcher)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - the serve loop owns all state
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
