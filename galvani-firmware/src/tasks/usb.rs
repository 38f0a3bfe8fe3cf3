//! USB device task
//!
//! Runs the USB device event loop. Owns no application state; the CDC
//! class half lives with the serve loop.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::UsbDevice;

#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, Driver<'static, USB>>) -> ! {
    usb.run().await
}
