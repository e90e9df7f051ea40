//! Bus interface abstraction for the MLX90393 driver.

pub mod callback;
pub mod i2c;

/// Abstraction over the low-level bus access required by the driver.
///
/// Every device command is one [`write`](Self::write) of the command bytes
/// followed by one [`read`](Self::read) of the response.
pub trait Mlx90393Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Sends all bytes of `data` to the device.
    fn write(&mut self, data: &[u8]) -> core::result::Result<(), Self::Error>;

    /// Fills `buf` entirely with bytes from the device.
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error>;

    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Reports which of write, read and delay this interface can perform.
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }
}

/// Transport capabilities required by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Bus writes are available.
    pub write: bool,
    /// Bus reads are available.
    pub read: bool,
    /// Millisecond delays are available.
    pub delay: bool,
}

impl Capabilities {
    /// Every capability present.
    pub const ALL: Self = Self {
        write: true,
        read: true,
        delay: true,
    };

    /// Returns `true` when write, read and delay are all available.
    pub const fn is_complete(&self) -> bool {
        self.write && self.read && self.delay
    }
}

impl<T> Mlx90393Interface for &mut T
where
    T: Mlx90393Interface,
{
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> core::result::Result<(), Self::Error> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        (**self).read(buf)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }
}
