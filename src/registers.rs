//! Register map and command opcodes for the MLX90393 magnetometer.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{Filter, Gain, Oversampling, Resolution};

/// Default 7-bit I²C address (A1 = A0 = 0).
pub const DEFAULT_ADDRESS: u8 = 0x0C;

/// Register address of `CONF1` (gain, Hall configuration).
pub const REG_CONF1: u8 = 0x00;
/// Register address of `CONF3` (oversampling, filter, resolutions).
pub const REG_CONF3: u8 = 0x02;
/// Highest register address the `RR`/`WR` commands can encode.
pub const REG_MAX: u8 = 0x3F;

/// Bits of `CONF1` owned by the driver settings.
pub const CONF1_SETTINGS_MASK: u16 = 0x0070;
/// Bits of `CONF3` owned by the driver settings.
pub const CONF3_SETTINGS_MASK: u16 = 0x07FF;

/// Opcode of `EX` (exit burst/wake-on-change mode).
pub const CMD_EXIT: u8 = 0x80;
/// Opcode of `SB` (start burst mode), ORed with the axis mask.
pub const CMD_START_BURST: u8 = 0x10;
/// Opcode of `SWOC` (start wake-on-change mode), ORed with the axis mask.
pub const CMD_START_WAKE_ON_CHANGE: u8 = 0x20;
/// Opcode of `SM` (start single measurement), ORed with the axis mask.
pub const CMD_START_MEASUREMENT: u8 = 0x30;
/// Opcode of `RM` (read measurement), ORed with the axis mask.
pub const CMD_READ_MEASUREMENT: u8 = 0x40;
/// Opcode of `RR` (read register).
pub const CMD_READ_REGISTER: u8 = 0x50;
/// Opcode of `WR` (write register).
pub const CMD_WRITE_REGISTER: u8 = 0x60;
/// Opcode of `HR` (memory recall, NVRAM to RAM).
pub const CMD_MEMORY_RECALL: u8 = 0xD0;
/// Opcode of `HS` (memory store, RAM to NVRAM).
pub const CMD_MEMORY_STORE: u8 = 0xE0;
/// Opcode of `RT` (reset).
pub const CMD_RESET: u8 = 0xF0;
/// Opcode of `NOP`.
pub const CMD_NOP: u8 = 0x00;

/// Volatile 16-bit configuration register holding driver-owned fields.
pub trait ConfigRegister: Copy + From<u16> + Into<u16> {
    /// Address passed to `RR`/`WR` (before the `<< 2` shift).
    const ADDRESS: u8;
    /// Value after power-on with factory NVRAM contents.
    const POWER_ON: u16;
    /// Bits written from [`Settings`](crate::Settings).
    const SETTINGS_MASK: u16;
}

/// Status byte returned as the first byte of every command response.
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // Number of data words that follow in the response (bits 1:0).
    pub response_count: B2,
    // Device was reset since the last command (bit 2).
    pub reset: bool,
    // Single-bit ECC error corrected in memory (bit 3).
    pub single_error_detection: bool,
    // Command rejected or uncorrectable error (bit 4).
    pub error: bool,
    // Single measurement mode active (bit 5).
    pub sm_mode: bool,
    // Wake-on-change mode active (bit 6).
    pub woc_mode: bool,
    // Burst mode active (bit 7).
    pub burst_mode: bool,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value.into_bytes()[0]
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u8:#x})", u8::from(*self));
    }
}

/// Bitfield representation of the `CONF1` register (address `0x00`).
///
/// Only `GAIN_SEL` is driven by the settings API; the remaining bits are
/// carried through unchanged on every read-modify-write.
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conf1 {
    #[skip]
    __: B4,
    // Analog gain selection (bits 6:4).
    pub gain: Gain,
    #[skip]
    __: B9,
}

impl From<u16> for Conf1 {
    fn from(value: u16) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }
}

impl From<Conf1> for u16 {
    fn from(value: Conf1) -> Self {
        u16::from_le_bytes(value.into_bytes())
    }
}

/// Bitfield representation of the `CONF3` register (address `0x02`).
///
/// `res_y` sits in bits 8:7 and therefore straddles the low and high byte of
/// the register word as it travels over the bus.
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conf3 {
    // Oversampling ratio (bits 1:0).
    pub oversampling: Oversampling,
    // Digital filter (bits 4:2).
    pub filter: Filter,
    // X axis resolution (bits 6:5).
    pub res_x: Resolution,
    // Y axis resolution (bits 8:7).
    pub res_y: Resolution,
    // Z axis resolution (bits 10:9).
    pub res_z: Resolution,
    #[skip]
    __: B5,
}

impl From<u16> for Conf3 {
    fn from(value: u16) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }
}

impl From<Conf3> for u16 {
    fn from(value: Conf3) -> Self {
        u16::from_le_bytes(value.into_bytes())
    }
}

impl ConfigRegister for Conf1 {
    const ADDRESS: u8 = REG_CONF1;
    const POWER_ON: u16 = 0x007C;
    const SETTINGS_MASK: u16 = CONF1_SETTINGS_MASK;
}

impl ConfigRegister for Conf3 {
    const ADDRESS: u8 = REG_CONF3;
    const POWER_ON: u16 = 0x0000;
    const SETTINGS_MASK: u16 = CONF3_SETTINGS_MASK;
}

/// Register address byte as sent by `RR`/`WR`.
pub const fn address_byte(register: u8) -> u8 {
    register << 2
}
