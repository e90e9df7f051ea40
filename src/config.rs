//! Settings snapshot for the MLX90393 driver.

use crate::params::{Axis, Filter, Gain, Oversampling, Resolution};
use crate::registers::{Conf1, Conf3};

/// Gain, resolution, filter and oversampling selection held in `CONF1`/`CONF3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Analog gain selection.
    pub gain: Gain,
    /// X axis resolution.
    pub resolution_x: Resolution,
    /// Y axis resolution.
    pub resolution_y: Resolution,
    /// Z axis resolution.
    pub resolution_z: Resolution,
    /// Digital filter selection.
    pub filter: Filter,
    /// Oversampling ratio.
    pub oversampling: Oversampling,
}

impl Settings {
    /// Begins building a [`Settings`] using the builder pattern.
    pub fn new() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Decodes a snapshot from raw `CONF1` and `CONF3` register values.
    pub fn from_registers(conf1: Conf1, conf3: Conf3) -> Self {
        Self {
            gain: conf1.gain(),
            resolution_x: conf3.res_x(),
            resolution_y: conf3.res_y(),
            resolution_z: conf3.res_z(),
            filter: conf3.filter(),
            oversampling: conf3.oversampling(),
        }
    }

    /// Inserts the gain into `conf1`, leaving every other bit as read.
    pub fn encode_conf1(&self, conf1: Conf1) -> Conf1 {
        conf1.with_gain(self.gain)
    }

    /// Inserts resolutions, filter and oversampling into `conf3`, leaving
    /// every other bit as read.
    pub fn encode_conf3(&self, conf3: Conf3) -> Conf3 {
        conf3
            .with_oversampling(self.oversampling)
            .with_filter(self.filter)
            .with_res_x(self.resolution_x)
            .with_res_y(self.resolution_y)
            .with_res_z(self.resolution_z)
    }

    /// Returns the resolution configured for `axis`.
    pub const fn resolution(&self, axis: Axis) -> Resolution {
        match axis {
            Axis::X => self.resolution_x,
            Axis::Y => self.resolution_y,
            Axis::Z => self.resolution_z,
        }
    }

    /// Returns the µT/LSB scale factor for `axis`.
    pub const fn sensitivity(&self, axis: Axis) -> f32 {
        self.gain.sensitivity(self.resolution(axis), axis)
    }

    /// Milliseconds to wait between starting and reading a single measurement.
    pub fn conversion_delay_ms(&self) -> u32 {
        self.filter.conversion_delay_ms(self.oversampling)
    }
}

/// Builder for [`Settings`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Creates a new builder seeded with [`Settings::default()`].
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Overrides the analog gain.
    pub fn gain(mut self, gain: Gain) -> Self {
        self.settings.gain = gain;
        self
    }

    /// Sets the same resolution on all three axes.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.settings.resolution_x = resolution;
        self.settings.resolution_y = resolution;
        self.settings.resolution_z = resolution;
        self
    }

    /// Overrides the X axis resolution.
    pub fn resolution_x(mut self, resolution: Resolution) -> Self {
        self.settings.resolution_x = resolution;
        self
    }

    /// Overrides the Y axis resolution.
    pub fn resolution_y(mut self, resolution: Resolution) -> Self {
        self.settings.resolution_y = resolution;
        self
    }

    /// Overrides the Z axis resolution.
    pub fn resolution_z(mut self, resolution: Resolution) -> Self {
        self.settings.resolution_z = resolution;
        self
    }

    /// Overrides the digital filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.settings.filter = filter;
        self
    }

    /// Overrides the oversampling ratio.
    pub fn oversampling(mut self, oversampling: Oversampling) -> Self {
        self.settings.oversampling = oversampling;
        self
    }

    /// Finalizes the builder and returns the [`Settings`].
    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gain: Gain::X1,
            resolution_x: Resolution::Bits16,
            resolution_y: Resolution::Bits16,
            resolution_z: Resolution::Bits16,
            filter: Filter::Filter0,
            oversampling: Oversampling::Osr0,
        }
    }
}
