//! Function-pointer transport for hosts that expose the bus as plain callbacks.
//!
//! Each callback returns `0` on success and any other value on failure.
//! Missing callbacks are reported through [`Mlx90393Interface::capabilities`]
//! so [`Mlx90393::init`](crate::device::Mlx90393::init) and the measurement
//! paths can refuse the handle before touching the bus.

use super::{Capabilities, Mlx90393Interface};

/// Bus write callback: sends all of `data`.
pub type WriteFn<C> = fn(&mut C, &[u8]) -> i32;
/// Bus read callback: fills all of `buf`.
pub type ReadFn<C> = fn(&mut C, &mut [u8]) -> i32;
/// Blocking millisecond delay callback.
pub type DelayFn = fn(u32);

/// Errors reported by [`CallbackInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallbackError {
    /// The callback returned a non-zero status code.
    Status(i32),
    /// The required callback is not installed.
    Unsupported,
}

/// Interface built from optional callbacks and an opaque context value.
pub struct CallbackInterface<C> {
    context: C,
    write: Option<WriteFn<C>>,
    read: Option<ReadFn<C>>,
    delay: Option<DelayFn>,
}

impl<C> CallbackInterface<C> {
    /// Creates an interface with no callbacks installed.
    pub const fn new(context: C) -> Self {
        Self {
            context,
            write: None,
            read: None,
            delay: None,
        }
    }

    /// Installs the write callback.
    pub fn with_write(mut self, write: WriteFn<C>) -> Self {
        self.write = Some(write);
        self
    }

    /// Installs the read callback.
    pub fn with_read(mut self, read: ReadFn<C>) -> Self {
        self.read = Some(read);
        self
    }

    /// Installs the delay callback.
    pub fn with_delay(mut self, delay: DelayFn) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Provides mutable access to the callback context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consumes the interface and returns the context.
    pub fn release(self) -> C {
        self.context
    }
}

fn status(code: i32) -> core::result::Result<(), CallbackError> {
    match code {
        0 => Ok(()),
        code => Err(CallbackError::Status(code)),
    }
}

impl<C> Mlx90393Interface for CallbackInterface<C> {
    type Error = CallbackError;

    fn write(&mut self, data: &[u8]) -> core::result::Result<(), Self::Error> {
        let write = self.write.ok_or(CallbackError::Unsupported)?;
        status(write(&mut self.context, data))
    }

    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        let read = self.read.ok_or(CallbackError::Unsupported)?;
        status(read(&mut self.context, buf))
    }

    fn delay_ms(&mut self, ms: u32) {
        if let Some(delay) = self.delay {
            delay(ms);
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            write: self.write.is_some(),
            read: self.read.is_some(),
            delay: self.delay.is_some(),
        }
    }
}
