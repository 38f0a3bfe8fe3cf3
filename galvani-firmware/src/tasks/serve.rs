//! The serve loop
//!
//! One cooperative loop: poll the CDC endpoint for bytes (bounded, so the
//! loop never parks indefinitely), feed them to the framer, hand each
//! complete object to the dispatcher, write the reply. Sensor reads and
//! settings saves happen synchronously inside `dispatch` and block the
//! loop for their duration - there is never a second request in flight.

use defmt::*;
use embassy_rp::peripherals::{I2C0, USB};
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;

use galvani_core::Dispatcher;
use galvani_drivers::power::Ina226;
use galvani_hal_rp2040::flash::Rp2040SettingsFlash;
use galvani_hal_rp2040::i2c::Rp2040I2cBus;
use galvani_protocol::ObjectFramer;

/// How long one poll waits for host input before coming back around
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// USB bulk packet size
const PACKET_SIZE: usize = 64;

/// The node's concrete dispatcher type
pub type NodeDispatcher =
    Dispatcher<Ina226<Rp2040I2cBus<'static, I2C0>>, Rp2040SettingsFlash<'static>>;

/// Host link lost; surface to the connection loop
struct Disconnected;

impl From<EndpointError> for Disconnected {
    fn from(_: EndpointError) -> Self {
        Disconnected
    }
}

/// Serve task - the single request/reply loop
#[embassy_executor::task]
pub async fn serve_task(
    mut class: CdcAcmClass<'static, Driver<'static, USB>>,
    mut dispatcher: NodeDispatcher,
) -> ! {
    info!("Serve task started");

    let mut framer = ObjectFramer::new();

    loop {
        class.wait_connection().await;
        info!("Host connected");
        // A half-framed object from a previous connection is garbage now
        framer.reset();
        let _ = serve(&mut class, &mut dispatcher, &mut framer).await;
        info!("Host disconnected");
    }
}

async fn serve(
    class: &mut CdcAcmClass<'static, Driver<'static, USB>>,
    dispatcher: &mut NodeDispatcher,
    framer: &mut ObjectFramer,
) -> Result<(), Disconnected> {
    let mut buf = [0u8; PACKET_SIZE];

    loop {
        // Bounded poll: wait up to the interval for input, then come back
        // around. The loop stays responsive without a wakeup mechanism.
        let len = match with_timeout(POLL_INTERVAL, class.read_packet(&mut buf)).await {
            Err(_) => continue, // no input this interval
            Ok(result) => result?,
        };

        for &byte in &buf[..len] {
            if let Some(object) = framer.feed(byte) {
                trace!("Framed {} byte request", object.len());
                let reply = dispatcher.dispatch(&object);
                write_reply(class, reply.as_bytes()).await?;
            }
        }
    }
}

/// Send one reply line, chunked to the bulk packet size
async fn write_reply(
    class: &mut CdcAcmClass<'static, Driver<'static, USB>>,
    reply: &[u8],
) -> Result<(), Disconnected> {
    for chunk in reply.chunks(PACKET_SIZE) {
        class.write_packet(chunk).await?;
    }
    // A reply landing exactly on a packet boundary needs a zero-length
    // packet so the host knows the line is complete
    if reply.len() % PACKET_SIZE == 0 {
        class.write_packet(&[]).await?;
    }
    Ok(())
}
