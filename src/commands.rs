//! Command codec: one function per MLX90393 command.
//!
//! Every command is exactly one bus write of the command bytes followed by
//! exactly one bus read of the response. A failed write is returned as-is and
//! the read is never attempted.

use core::ops::BitOr;

use crate::error::{Error, Result};
use crate::interface::Mlx90393Interface;
use crate::registers::{
    address_byte,
    Status,
    CMD_EXIT,
    CMD_MEMORY_RECALL,
    CMD_MEMORY_STORE,
    CMD_NOP,
    CMD_READ_MEASUREMENT,
    CMD_READ_REGISTER,
    CMD_RESET,
    CMD_START_BURST,
    CMD_START_MEASUREMENT,
    CMD_START_WAKE_ON_CHANGE,
    CMD_WRITE_REGISTER,
    REG_MAX,
};

/// Number of channels (Z, Y, X, temperature) a measurement can select.
pub const MAX_CHANNELS: usize = 4;

// Status byte plus one word per channel.
const MAX_RESPONSE_BYTES: usize = 1 + 2 * MAX_CHANNELS;

/// Channel selector (`zyxt`) ORed into the measurement command opcodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(u8);

impl AxisMask {
    /// No channel selected.
    pub const NONE: Self = Self(0b0000);
    /// Temperature channel.
    pub const T: Self = Self(0b0001);
    /// X axis.
    pub const X: Self = Self(0b0010);
    /// Y axis.
    pub const Y: Self = Self(0b0100);
    /// Z axis.
    pub const Z: Self = Self(0b1000);
    /// All three magnetic axes.
    pub const XYZ: Self = Self(0b1110);
    /// All three magnetic axes and temperature.
    pub const ALL: Self = Self(0b1111);

    /// Builds a mask from raw `zyxt` bits, rejecting anything above bit 3.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Returns the raw `zyxt` bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when every channel of `other` is selected.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of selected channels.
    pub const fn channel_count(self) -> usize {
        count_set_bits(self.0) as usize
    }
}

impl BitOr for AxisMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Counts the set bits of a `zyxt` selector.
///
/// Returns `0` when more than four bits are set, since the device exposes at
/// most four channels.
pub const fn count_set_bits(zyxt: u8) -> u8 {
    let count = zyxt.count_ones() as u8;
    if count > MAX_CHANNELS as u8 { 0 } else { count }
}

fn transfer<IFACE>(interface: &mut IFACE, command: &[u8], response: &mut [u8]) -> Result<(), IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    trace!("mlx90393: command {=u8:#x}", command[0]);
    interface.write(command)?;
    interface.read(response)?;
    Ok(())
}

fn status_command<IFACE>(interface: &mut IFACE, opcode: u8) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    let mut status = [0u8; 1];
    transfer(interface, &[opcode], &mut status)?;
    Ok(Status::from(status[0]))
}

/// `EX`: leaves burst or wake-on-change mode.
pub fn exit<IFACE>(interface: &mut IFACE) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_EXIT)
}

/// `SB`: starts burst mode on the selected channels.
pub fn start_burst<IFACE>(interface: &mut IFACE, mask: AxisMask) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_START_BURST | mask.bits())
}

/// `SWOC`: starts wake-on-change mode on the selected channels.
pub fn start_wake_on_change<IFACE>(
    interface: &mut IFACE,
    mask: AxisMask,
) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_START_WAKE_ON_CHANGE | mask.bits())
}

/// `SM`: starts a single measurement on the selected channels.
pub fn start_measurement<IFACE>(
    interface: &mut IFACE,
    mask: AxisMask,
) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_START_MEASUREMENT | mask.bits())
}

/// `RM`: reads the selected channels.
///
/// Samples are copied to the front of `data` in device order (T, X, Y, Z for
/// the selected channels), each as a big-endian word. `data` must hold at
/// least two bytes per selected channel.
pub fn read_measurement<IFACE>(
    interface: &mut IFACE,
    mask: AxisMask,
    data: &mut [u8],
) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    let len = 2 * mask.channel_count();
    if data.len() < len {
        return Err(Error::InvalidArgument);
    }

    let mut response = [0u8; MAX_RESPONSE_BYTES];
    let response = &mut response[..1 + len];
    transfer(interface, &[CMD_READ_MEASUREMENT | mask.bits()], response)?;

    data[..len].copy_from_slice(&response[1..]);
    Ok(Status::from(response[0]))
}

/// `RR`: reads a 16-bit volatile register.
pub fn read_register<IFACE>(interface: &mut IFACE, register: u8) -> Result<(Status, u16), IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    if register > REG_MAX {
        return Err(Error::InvalidArgument);
    }

    let mut response = [0u8; 3];
    transfer(interface, &[CMD_READ_REGISTER, address_byte(register)], &mut response)?;
    Ok((
        Status::from(response[0]),
        u16::from_be_bytes([response[1], response[2]]),
    ))
}

/// `WR`: writes a 16-bit volatile register, high byte first.
pub fn write_register<IFACE>(
    interface: &mut IFACE,
    register: u8,
    value: u16,
) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    if register > REG_MAX {
        return Err(Error::InvalidArgument);
    }

    let [hi, lo] = value.to_be_bytes();
    let mut status = [0u8; 1];
    transfer(
        interface,
        &[CMD_WRITE_REGISTER, hi, lo, address_byte(register)],
        &mut status,
    )?;
    Ok(Status::from(status[0]))
}

/// `HR`: recalls non-volatile memory into the volatile registers.
pub fn memory_recall<IFACE>(interface: &mut IFACE) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_MEMORY_RECALL)
}

/// `HS`: stores the volatile registers into non-volatile memory.
pub fn memory_store<IFACE>(interface: &mut IFACE) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_MEMORY_STORE)
}

/// `RT`: resets the device.
pub fn reset<IFACE>(interface: &mut IFACE) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_RESET)
}

/// `NOP`: returns the status byte without side effects.
pub fn nop<IFACE>(interface: &mut IFACE) -> Result<Status, IFACE::Error>
where
    IFACE: Mlx90393Interface,
{
    status_command(interface, CMD_NOP)
}
