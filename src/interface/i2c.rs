//! I²C interface implementation built on top of `embedded-hal` `I2c` and `DelayNs`.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::Mlx90393Interface;
use crate::registers::DEFAULT_ADDRESS;

/// I²C-based interface implementation for the MLX90393 driver.
pub struct I2cInterface<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> I2cInterface<I2C, D> {
    /// Creates a new interface talking to the default address `0x0C`.
    pub const fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    /// Creates a new interface for a device strapped to another address.
    pub const fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Returns the 7-bit device address in use.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Provides mutable access to the wrapped I²C bus.
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consumes the interface and returns the owned bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> Mlx90393Interface for I2cInterface<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn write(&mut self, data: &[u8]) -> core::result::Result<(), Self::Error> {
        self.i2c.write(self.address, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.i2c.read(self.address, buf)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
