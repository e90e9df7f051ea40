//! Error handling primitives for the MLX90393 driver.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// An argument was malformed (axis mask, buffer length, register address).
    InvalidArgument,
    /// The bus interface lacks a write, read or delay capability.
    MissingCapability,
    /// Storage for the settings snapshot could not be reserved.
    Allocation,
    /// A measurement was requested before any settings were read or applied.
    NotInitialized,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
