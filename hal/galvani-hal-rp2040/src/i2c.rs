//! I2C bus driver for RP2040
//!
//! Wraps embassy-rp's blocking I2C master in the `galvani-hal` bus trait.
//! The INA226 is the only device on the bus and every transaction is
//! blocking; a failed transaction surfaces to the dispatcher as a read
//! error rather than being retried here.

use embassy_rp::i2c::{Blocking, Error, I2c, Instance};

use galvani_hal::I2cBus;

/// RP2040 blocking I2C bus
pub struct Rp2040I2cBus<'d, T: Instance> {
    i2c: I2c<'d, T, Blocking>,
}

impl<'d, T: Instance> Rp2040I2cBus<'d, T> {
    /// Wrap a configured blocking I2C peripheral
    pub fn new(i2c: I2c<'d, T, Blocking>) -> Self {
        Self { i2c }
    }
}

impl<T: Instance> I2cBus for Rp2040I2cBus<'_, T> {
    type Error = Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
        self.i2c.blocking_write(u16::from(address), data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.i2c.blocking_read(u16::from(address), buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Error> {
        self.i2c
            .blocking_write_read(u16::from(address), write_data, read_buf)
    }
}
