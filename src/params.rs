//! Strongly typed parameter enumerations for the MLX90393 driver.
//!
//! These enums map directly to the datasheet field encodings of the `CONF1`
//! and `CONF3` registers and are used across [`Settings`](crate::config::Settings)
//! and the high-level driver APIs. Every bit pattern of every field maps to a
//! variant, so decoding a register can never yield an out-of-range value.
//!
//! # Examples
//!
//! ```rust
//! use mlx90393::params::{Axis, Filter, Gain, Oversampling, Resolution};
//!
//! let sens = Gain::X1.sensitivity(Resolution::Bits16, Axis::Z);
//! assert_eq!(sens, 0.294);
//! assert_eq!(Filter::Filter3.conversion_delay_ms(Oversampling::Osr2), 9);
//! ```

use modular_bitfield::prelude::Specifier;

/// Analog gain selection encoded in `CONF1.GAIN_SEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum Gain {
    /// 5x gain.
    X5 = 0b000,
    /// 4x gain.
    X4 = 0b001,
    /// 3x gain.
    X3 = 0b010,
    /// 2.5x gain.
    X2_5 = 0b011,
    /// 2x gain.
    X2 = 0b100,
    /// 1.67x gain.
    X1_67 = 0b101,
    /// 1.33x gain.
    X1_33 = 0b110,
    /// 1x gain.
    X1 = 0b111,
}

impl Gain {
    /// All gain selections in register order.
    pub const ALL: [Self; 8] = [
        Self::X5,
        Self::X4,
        Self::X3,
        Self::X2_5,
        Self::X2,
        Self::X1_67,
        Self::X1_33,
        Self::X1,
    ];

    /// Returns the magnetic sensitivity in µT/LSB for the given resolution and axis.
    pub const fn sensitivity(self, resolution: Resolution, axis: Axis) -> f32 {
        let column = match axis {
            Axis::X | Axis::Y => 0,
            Axis::Z => 1,
        };
        SENSITIVITY_UT_PER_LSB[self as usize][resolution as usize][column]
    }
}

/// ADC resolution selection, one per axis, encoded in `CONF3.RES_{X,Y,Z}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum Resolution {
    /// 16-bit output, signed.
    Bits16 = 0b00,
    /// 17-bit output, signed.
    Bits17 = 0b01,
    /// 18-bit output, offset by `0x8000`.
    Bits18 = 0b10,
    /// 19-bit output, offset by `0x4000`.
    Bits19 = 0b11,
}

impl Resolution {
    /// All resolution selections in register order.
    pub const ALL: [Self; 4] = [Self::Bits16, Self::Bits17, Self::Bits18, Self::Bits19];

    /// Returns the zero-field offset embedded in the raw sample.
    pub const fn offset(self) -> u16 {
        match self {
            Self::Bits16 | Self::Bits17 => 0,
            Self::Bits18 => 0x8000,
            Self::Bits19 => 0x4000,
        }
    }

    /// Removes the resolution-dependent offset from a raw big-endian sample.
    ///
    /// The subtraction wraps in 16 bits, matching the device's output coding.
    pub const fn correct(self, raw: u16) -> i16 {
        raw.wrapping_sub(self.offset()) as i16
    }
}

/// Digital filter selection encoded in `CONF3.DIG_FILT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum Filter {
    /// Digital filter 0.
    Filter0 = 0b000,
    /// Digital filter 1.
    Filter1 = 0b001,
    /// Digital filter 2.
    Filter2 = 0b010,
    /// Digital filter 3.
    Filter3 = 0b011,
    /// Digital filter 4.
    Filter4 = 0b100,
    /// Digital filter 5.
    Filter5 = 0b101,
    /// Digital filter 6.
    Filter6 = 0b110,
    /// Digital filter 7.
    Filter7 = 0b111,
}

impl Filter {
    /// All filter selections in register order.
    pub const ALL: [Self; 8] = [
        Self::Filter0,
        Self::Filter1,
        Self::Filter2,
        Self::Filter3,
        Self::Filter4,
        Self::Filter5,
        Self::Filter6,
        Self::Filter7,
    ];

    /// Nominal single-measurement conversion time in milliseconds.
    pub const fn conversion_time_ms(self, oversampling: Oversampling) -> f32 {
        CONVERSION_TIME_MS[self as usize][oversampling as usize]
    }

    /// Whole-millisecond wait before reading a measurement back.
    ///
    /// The nominal time is truncated and one millisecond is added so the read
    /// never races the end of the conversion.
    pub fn conversion_delay_ms(self, oversampling: Oversampling) -> u32 {
        self.conversion_time_ms(oversampling) as u32 + 1
    }
}

/// ADC oversampling ratio encoded in `CONF3.OSR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum Oversampling {
    /// Oversampling ratio 0.
    Osr0 = 0b00,
    /// Oversampling ratio 1.
    Osr1 = 0b01,
    /// Oversampling ratio 2.
    Osr2 = 0b10,
    /// Oversampling ratio 3.
    Osr3 = 0b11,
}

impl Oversampling {
    /// All oversampling selections in register order.
    pub const ALL: [Self; 4] = [Self::Osr0, Self::Osr1, Self::Osr2, Self::Osr3];
}

/// Magnetic measurement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

// µT/LSB indexed by [gain][resolution][xy, z] (HALLCONF = 0xC).
const SENSITIVITY_UT_PER_LSB: [[[f32; 2]; 4]; 8] = [
    [[0.805, 1.468], [1.610, 2.936], [3.220, 5.872], [6.440, 11.744]],
    [[0.644, 1.174], [1.288, 2.349], [2.576, 4.698], [5.152, 9.395]],
    [[0.483, 0.881], [0.966, 1.762], [1.932, 3.523], [3.864, 7.046]],
    [[0.403, 0.734], [0.805, 1.468], [1.610, 2.936], [3.220, 5.872]],
    [[0.322, 0.587], [0.644, 1.174], [1.288, 2.349], [2.576, 4.698]],
    [[0.268, 0.489], [0.537, 0.979], [1.073, 1.957], [2.147, 3.915]],
    [[0.215, 0.391], [0.429, 0.783], [0.859, 1.566], [1.717, 3.132]],
    [[0.161, 0.294], [0.322, 0.587], [0.644, 1.174], [1.288, 2.349]],
];

// Milliseconds indexed by [filter][oversampling].
const CONVERSION_TIME_MS: [[f32; 4]; 8] = [
    [1.27, 1.84, 3.00, 5.30],
    [1.46, 2.23, 3.76, 6.84],
    [1.84, 3.00, 5.30, 9.91],
    [2.61, 4.53, 8.37, 16.05],
    [4.15, 7.60, 14.52, 28.34],
    [7.22, 13.75, 26.80, 52.92],
    [13.36, 26.04, 51.38, 102.07],
    [25.65, 50.61, 100.53, 200.37],
];
