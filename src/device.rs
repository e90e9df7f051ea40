//! High-level MLX90393 device driver implementation.

use crate::allocator::{InlineAllocator, SettingsAllocator};
use crate::commands::{self, AxisMask};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::interface::i2c::I2cInterface;
use crate::interface::Mlx90393Interface;
use crate::params::Axis;
use crate::registers::{Conf1, Conf3, ConfigRegister, Status};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

// Two bytes per magnetic axis.
const RAW_AXIS_BYTES: usize = 6;

/// High-level synchronous driver for the MLX90393 magnetometer.
///
/// The driver keeps a snapshot of the last settings read from or applied to
/// the device. Writing `CONF1`/`CONF3` directly through
/// [`write_register`](Self::write_register) bypasses that snapshot and leaves
/// it stale until the next [`get_settings`](Self::get_settings).
pub struct Mlx90393<IFACE, A = InlineAllocator>
where
    A: SettingsAllocator,
{
    interface: IFACE,
    allocator: A,
    settings: Option<A::Slot>,
}

impl<IFACE> Mlx90393<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance storing its settings inline.
    pub fn new(interface: IFACE) -> Self {
        Self::with_allocator(interface, InlineAllocator)
    }
}

impl<IFACE, A> Mlx90393<IFACE, A>
where
    A: SettingsAllocator,
{
    /// Creates a new driver instance reserving its settings through `allocator`.
    pub fn with_allocator(interface: IFACE, allocator: A) -> Self {
        Self {
            interface,
            allocator,
            settings: None,
        }
    }

    /// Releases the cached settings, then returns the owned interface and allocator.
    pub fn release(mut self) -> (IFACE, A) {
        self.clear_settings();
        (self.interface, self.allocator)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns the cached settings snapshot, if any.
    pub fn settings(&self) -> Option<Settings> {
        self.settings.as_deref().copied()
    }

    /// Hands the cached settings back to the allocator. No-op when nothing is cached.
    pub fn clear_settings(&mut self) {
        if let Some(slot) = self.settings.take() {
            self.allocator.release(slot);
        }
    }

    fn store_settings(&mut self, settings: Settings) {
        if let Some(slot) = self.settings.as_mut() {
            **slot = settings;
        }
    }
}

impl<I2C, D> Mlx90393<I2cInterface<I2C, D>>
where
    I2C: I2c,
    D: DelayNs,
{
    // ==================================================================
    // == I2C Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for I²C transports at the default address.
    pub fn new_i2c(i2c: I2C, delay: D) -> Self {
        Self::new(I2cInterface::new(i2c, delay))
    }

    /// Convenience constructor for I²C transports at a custom address.
    pub fn new_i2c_with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self::new(I2cInterface::with_address(i2c, delay, address))
    }

    /// Releases the driver, returning the I²C bus and delay provider.
    pub fn release_i2c(self) -> (I2C, D) {
        let (iface, _) = self.release();
        iface.release()
    }
}

impl<IFACE, A, CommE> Mlx90393<IFACE, A>
where
    IFACE: Mlx90393Interface<Error = CommE>,
    A: SettingsAllocator,
{
    // ==================================================================
    // == Initialization & Settings =====================================
    // ==================================================================
    /// Initializes the driver.
    ///
    /// With `None` the current settings are read back from the device; with
    /// `Some` they are written to it. Either way the snapshot is cached.
    pub fn init(&mut self, settings: Option<Settings>) -> Result<(), CommE> {
        self.check_capabilities()?;

        match settings {
            None => self.get_settings().map(|_| ()),
            Some(settings) => self.apply_settings(&settings),
        }
    }

    /// Reads `CONF1` and `CONF3` and caches the decoded settings.
    ///
    /// On a bus error the cached snapshot is left as it was.
    pub fn get_settings(&mut self) -> Result<Settings, CommE> {
        let reserved = self.reserve_settings()?;

        match self.read_settings() {
            Ok(settings) => {
                debug!("mlx90393: read settings {}", settings);
                self.store_settings(settings);
                Ok(settings)
            }
            Err(err) => {
                if reserved {
                    self.clear_settings();
                }
                Err(err)
            }
        }
    }

    /// Writes `settings` into `CONF1` and `CONF3`, preserving every bit the
    /// settings do not own.
    ///
    /// The cached snapshot is replaced with `settings` even when a register
    /// update fails, so it reflects the last request rather than the last
    /// confirmed device state. The first bus error is returned.
    pub fn apply_settings(&mut self, settings: &Settings) -> Result<(), CommE> {
        self.reserve_settings()?;
        debug!("mlx90393: applying settings {}", settings);

        let conf1 = self.update_register(|conf1: Conf1| settings.encode_conf1(conf1));
        let conf3 = self.update_register(|conf3: Conf3| settings.encode_conf3(conf3));

        self.store_settings(*settings);
        conf1.and(conf3)
    }

    // ==================================================================
    // == Measurement ===================================================
    // ==================================================================
    /// Milliseconds [`read_xyz`](Self::read_xyz) waits for the conversion.
    pub fn conversion_time_ms(&self) -> Result<u32, CommE> {
        Ok(self.cached_settings()?.conversion_delay_ms())
    }

    /// Runs a single XYZ measurement and returns offset-corrected raw counts.
    ///
    /// Fails with [`Error::MissingCapability`] before any I/O when the
    /// interface cannot write, read or delay.
    pub fn read_xyz_raw(&mut self) -> Result<[i16; 3], CommE> {
        let settings = self.cached_settings()?;
        self.measure(&settings)
    }

    /// Runs a single XYZ measurement and returns the field in µT.
    pub fn read_xyz(&mut self) -> Result<[f32; 3], CommE> {
        let settings = self.cached_settings()?;
        let [x, y, z] = self.measure(&settings)?;

        Ok([
            f32::from(x) * settings.sensitivity(Axis::X),
            f32::from(y) * settings.sensitivity(Axis::Y),
            f32::from(z) * settings.sensitivity(Axis::Z),
        ])
    }

    // ==================================================================
    // == Device Commands ===============================================
    // ==================================================================
    /// `EX`: leaves burst or wake-on-change mode.
    pub fn exit(&mut self) -> Result<Status, CommE> {
        commands::exit(&mut self.interface)
    }

    /// `SB`: starts burst mode on the selected channels.
    pub fn start_burst(&mut self, mask: AxisMask) -> Result<Status, CommE> {
        commands::start_burst(&mut self.interface, mask)
    }

    /// `SWOC`: starts wake-on-change mode on the selected channels.
    pub fn start_wake_on_change(&mut self, mask: AxisMask) -> Result<Status, CommE> {
        commands::start_wake_on_change(&mut self.interface, mask)
    }

    /// `SM`: starts a single measurement on the selected channels.
    pub fn start_measurement(&mut self, mask: AxisMask) -> Result<Status, CommE> {
        commands::start_measurement(&mut self.interface, mask)
    }

    /// `RM`: reads the selected channels into `data`.
    pub fn read_measurement(&mut self, mask: AxisMask, data: &mut [u8]) -> Result<Status, CommE> {
        commands::read_measurement(&mut self.interface, mask, data)
    }

    /// `RR`: reads a 16-bit volatile register.
    pub fn read_register(&mut self, register: u8) -> Result<(Status, u16), CommE> {
        commands::read_register(&mut self.interface, register)
    }

    /// `WR`: writes a 16-bit volatile register.
    pub fn write_register(&mut self, register: u8, value: u16) -> Result<Status, CommE> {
        commands::write_register(&mut self.interface, register, value)
    }

    /// `HR`: recalls non-volatile memory into the volatile registers.
    pub fn memory_recall(&mut self) -> Result<Status, CommE> {
        commands::memory_recall(&mut self.interface)
    }

    /// `HS`: stores the volatile registers into non-volatile memory.
    pub fn memory_store(&mut self) -> Result<Status, CommE> {
        commands::memory_store(&mut self.interface)
    }

    /// `RT`: resets the device.
    pub fn reset(&mut self) -> Result<Status, CommE> {
        commands::reset(&mut self.interface)
    }

    /// `NOP`: returns the status byte without side effects.
    pub fn nop(&mut self) -> Result<Status, CommE> {
        commands::nop(&mut self.interface)
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn cached_settings(&self) -> Result<Settings, CommE> {
        self.settings().ok_or(Error::NotInitialized)
    }

    fn reserve_settings(&mut self) -> Result<bool, CommE> {
        if self.settings.is_some() {
            return Ok(false);
        }

        match self.allocator.allocate(Settings::default()) {
            Some(slot) => {
                self.settings = Some(slot);
                Ok(true)
            }
            None => {
                warn!("mlx90393: settings allocation failed");
                Err(Error::Allocation)
            }
        }
    }

    fn read_settings(&mut self) -> Result<Settings, CommE> {
        let conf1 = self.read_config::<Conf1>()?;
        let conf3 = self.read_config::<Conf3>()?;
        Ok(Settings::from_registers(conf1, conf3))
    }

    fn read_config<R: ConfigRegister>(&mut self) -> Result<R, CommE> {
        let (_, raw) = self.read_register(R::ADDRESS)?;
        Ok(R::from(raw))
    }

    fn update_register<R, F>(&mut self, mutate: F) -> Result<(), CommE>
    where
        R: ConfigRegister,
        F: FnOnce(R) -> R,
    {
        let current = self.read_config::<R>()?;
        self.write_register(R::ADDRESS, mutate(current).into())?;
        Ok(())
    }

    fn check_capabilities(&self) -> Result<(), CommE> {
        let capabilities = self.interface.capabilities();
        if !capabilities.is_complete() {
            warn!("mlx90393: interface lacks a capability: {}", capabilities);
            return Err(Error::MissingCapability);
        }
        Ok(())
    }

    fn measure(&mut self, settings: &Settings) -> Result<[i16; 3], CommE> {
        // The conversion wait must not be skipped.
        self.check_capabilities()?;
        self.start_measurement(AxisMask::XYZ)?;
        self.interface.delay_ms(settings.conversion_delay_ms());

        let mut raw = [0u8; RAW_AXIS_BYTES];
        self.read_measurement(AxisMask::XYZ, &mut raw)?;

        Ok([
            settings.resolution_x.correct(u16::from_be_bytes([raw[0], raw[1]])),
            settings.resolution_y.correct(u16::from_be_bytes([raw[2], raw[3]])),
            settings.resolution_z.correct(u16::from_be_bytes([raw[4], raw[5]])),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::InlineSlot;
    use crate::commands::count_set_bits;
    use crate::interface::Capabilities;
    use crate::params::{Filter, Gain, Oversampling, Resolution};
    use crate::registers::{CONF1_SETTINGS_MASK, CONF3_SETTINGS_MASK, REG_CONF1, REG_CONF3};

    const STATUS: u8 = 0x00;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FakeError {
        Write,
        Read,
    }

    /// In-memory device that echoes register writes back on register reads.
    struct FakeDevice {
        registers: [u16; 64],
        measurement: [u8; 8],
        writes: Vec<Vec<u8>>,
        reads: usize,
        delays: Vec<u32>,
        pending: Vec<u8>,
        fail_write: Option<usize>,
        fail_read: Option<usize>,
        capabilities: Capabilities,
    }

    impl FakeDevice {
        fn new() -> Self {
            Self {
                registers: [0; 64],
                measurement: [0; 8],
                writes: Vec::new(),
                reads: 0,
                delays: Vec::new(),
                pending: Vec::new(),
                fail_write: None,
                fail_read: None,
                capabilities: Capabilities::ALL,
            }
        }

        fn with_registers(conf1: u16, conf3: u16) -> Self {
            let mut fake = Self::new();
            fake.registers[REG_CONF1 as usize] = conf1;
            fake.registers[REG_CONF3 as usize] = conf3;
            fake
        }

        fn opcodes(&self) -> Vec<u8> {
            self.writes.iter().map(|w| w[0]).collect()
        }
    }

    impl Mlx90393Interface for FakeDevice {
        type Error = FakeError;

        fn write(&mut self, data: &[u8]) -> core::result::Result<(), FakeError> {
            let index = self.writes.len();
            self.writes.push(data.to_vec());
            if self.fail_write == Some(index) {
                return Err(FakeError::Write);
            }

            self.pending = match data[0] & 0xF0 {
                0x40 => {
                    let len = 2 * count_set_bits(data[0] & 0x0F) as usize;
                    let mut response = vec![STATUS];
                    response.extend_from_slice(&self.measurement[..len]);
                    response
                }
                0x50 => {
                    let [hi, lo] = self.registers[(data[1] >> 2) as usize].to_be_bytes();
                    vec![STATUS, hi, lo]
                }
                0x60 => {
                    self.registers[(data[3] >> 2) as usize] = u16::from_be_bytes([data[1], data[2]]);
                    vec![STATUS]
                }
                _ => vec![STATUS],
            };
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> core::result::Result<(), FakeError> {
            let index = self.reads;
            self.reads += 1;
            if self.fail_read == Some(index) {
                return Err(FakeError::Read);
            }

            assert_eq!(buf.len(), self.pending.len(), "response length mismatch");
            buf.copy_from_slice(&self.pending);
            Ok(())
        }

        fn delay_ms(&mut self, ms: u32) {
            self.delays.push(ms);
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum AllocEvent {
        Allocate,
        Release,
    }

    #[derive(Default)]
    struct CountingAllocator {
        events: Vec<AllocEvent>,
        exhausted: bool,
    }

    impl SettingsAllocator for CountingAllocator {
        type Slot = InlineSlot;

        fn allocate(&mut self, initial: Settings) -> Option<InlineSlot> {
            if self.exhausted {
                return None;
            }
            self.events.push(AllocEvent::Allocate);
            Some(InlineSlot::new(initial))
        }

        fn release(&mut self, _slot: InlineSlot) {
            self.events.push(AllocEvent::Release);
        }
    }

    fn sample_settings() -> Settings {
        Settings::new()
            .gain(Gain::X1)
            .resolution_x(Resolution::Bits17)
            .resolution_y(Resolution::Bits17)
            .resolution_z(Resolution::Bits16)
            .filter(Filter::Filter3)
            .oversampling(Oversampling::Osr2)
            .build()
    }

    #[test]
    fn init_without_settings_reads_registers_once() {
        let fake = FakeDevice::with_registers(0x007C, 0x0000);
        let mut device = Mlx90393::new(fake);

        device.init(None).unwrap();

        assert_eq!(device.settings(), Some(Settings::default()));
        let (fake, _) = device.release();
        assert_eq!(fake.writes, vec![vec![0x50, 0x00], vec![0x50, 0x08]]);
        assert_eq!(fake.reads, 2);
    }

    #[test]
    fn init_with_settings_applies_them_once() {
        let mut device = Mlx90393::new(FakeDevice::new());

        device.init(Some(sample_settings())).unwrap();

        assert_eq!(device.settings(), Some(sample_settings()));
        let (fake, _) = device.release();
        assert_eq!(fake.opcodes(), vec![0x50, 0x60, 0x50, 0x60]);
        assert_eq!(fake.writes[1], vec![0x60, 0x00, 0x70, 0x00]);
        assert_eq!(fake.writes[3], vec![0x60, 0x00, 0xAE, 0x08]);
    }

    #[test]
    fn init_rejects_incomplete_interface() {
        let missing = [
            Capabilities { write: false, ..Capabilities::ALL },
            Capabilities { read: false, ..Capabilities::ALL },
            Capabilities { delay: false, ..Capabilities::ALL },
        ];

        for capabilities in missing {
            let mut fake = FakeDevice::new();
            fake.capabilities = capabilities;
            let mut device = Mlx90393::new(fake);

            assert_eq!(device.init(None), Err(Error::MissingCapability));
            assert_eq!(device.init(Some(sample_settings())), Err(Error::MissingCapability));
            assert!(device.interface_mut().writes.is_empty());
            assert_eq!(device.settings(), None);
        }
    }

    #[test]
    fn apply_then_get_round_trips_every_combination() {
        let mut device = Mlx90393::new(FakeDevice::new());

        for gain in Gain::ALL {
            for (x, y, z) in resolution_triples() {
                for filter in Filter::ALL {
                    for oversampling in Oversampling::ALL {
                        let settings = Settings::new()
                            .gain(gain)
                            .resolution_x(x)
                            .resolution_y(y)
                            .resolution_z(z)
                            .filter(filter)
                            .oversampling(oversampling)
                            .build();

                        device.apply_settings(&settings).unwrap();
                        device.clear_settings();
                        assert_eq!(device.get_settings(), Ok(settings));
                        assert_eq!(device.settings(), Some(settings));
                    }
                }
            }
        }
    }

    fn resolution_triples() -> impl Iterator<Item = (Resolution, Resolution, Resolution)> {
        Resolution::ALL.into_iter().flat_map(|x| {
            Resolution::ALL
                .into_iter()
                .flat_map(move |y| Resolution::ALL.into_iter().map(move |z| (x, y, z)))
        })
    }

    #[test]
    fn resolution_triples_cover_every_axis_combination() {
        let triples: Vec<_> = resolution_triples().collect();
        assert_eq!(triples.len(), 64);
        for (i, a) in triples.iter().enumerate() {
            assert!(!triples[i + 1..].contains(a));
        }
    }

    #[test]
    fn apply_preserves_bits_outside_owned_masks() {
        let fake = FakeDevice::with_registers(0xFF8F, 0xF800);
        let mut device = Mlx90393::new(fake);

        device.apply_settings(&sample_settings()).unwrap();

        let fake = device.interface_mut();
        let conf1 = fake.registers[REG_CONF1 as usize];
        let conf3 = fake.registers[REG_CONF3 as usize];
        assert_eq!(conf1 & !CONF1_SETTINGS_MASK, 0xFF8F);
        assert_eq!(conf3 & !CONF3_SETTINGS_MASK, 0xF800);
        assert_eq!(conf1, 0xFFFF);
        assert_eq!(conf3, 0xF8AE);
    }

    #[test]
    fn apply_clears_previous_field_values() {
        let fake = FakeDevice::with_registers(0x0070, 0x07FF);
        let mut device = Mlx90393::new(fake);

        device.apply_settings(&Settings::new().gain(Gain::X5).build()).unwrap();

        let fake = device.interface_mut();
        assert_eq!(fake.registers[REG_CONF1 as usize], 0x0000);
        assert_eq!(fake.registers[REG_CONF3 as usize], 0x0000);
    }

    #[test]
    fn get_decodes_resolution_y_across_bytes() {
        // res_y = 0b10: bit 8 set, bit 7 clear.
        let fake = FakeDevice::with_registers(0x0000, 0x0100);
        let mut device = Mlx90393::new(fake);

        let settings = device.get_settings().unwrap();
        assert_eq!(settings.resolution_y, Resolution::Bits18);
        assert_eq!(settings.resolution_x, Resolution::Bits16);
        assert_eq!(settings.resolution_z, Resolution::Bits16);
    }

    #[test]
    fn apply_keeps_requested_settings_when_write_fails() {
        let mut fake = FakeDevice::new();
        // Second write is the CONF1 `WR`.
        fake.fail_write = Some(1);
        let mut device = Mlx90393::new(fake);

        assert_eq!(
            device.apply_settings(&sample_settings()),
            Err(Error::Interface(FakeError::Write))
        );
        assert_eq!(device.settings(), Some(sample_settings()));

        // CONF3 is still updated after the CONF1 failure.
        let fake = device.interface_mut();
        assert_eq!(fake.opcodes(), vec![0x50, 0x60, 0x50, 0x60]);
        assert_eq!(fake.registers[REG_CONF3 as usize], 0x00AE);
    }

    #[test]
    fn apply_skips_write_when_register_read_fails() {
        let mut fake = FakeDevice::new();
        fake.fail_read = Some(0);
        let mut device = Mlx90393::new(fake);

        assert_eq!(
            device.apply_settings(&sample_settings()),
            Err(Error::Interface(FakeError::Read))
        );
        assert_eq!(device.interface_mut().opcodes(), vec![0x50, 0x50, 0x60]);
    }

    #[test]
    fn get_failure_releases_fresh_cache() {
        let mut fake = FakeDevice::new();
        fake.fail_read = Some(1);
        let mut allocator = CountingAllocator::default();
        let mut device = Mlx90393::with_allocator(fake, &mut allocator);

        assert_eq!(device.get_settings(), Err(Error::Interface(FakeError::Read)));
        assert_eq!(device.settings(), None);
        drop(device.release());

        assert_eq!(allocator.events, vec![AllocEvent::Allocate, AllocEvent::Release]);
    }

    #[test]
    fn get_failure_keeps_existing_cache() {
        let mut device = Mlx90393::new(FakeDevice::new());
        device.apply_settings(&sample_settings()).unwrap();
        let reads = device.interface_mut().reads;
        device.interface_mut().fail_read = Some(reads);

        assert_eq!(device.get_settings(), Err(Error::Interface(FakeError::Read)));
        assert_eq!(device.settings(), Some(sample_settings()));
    }

    #[test]
    fn allocation_failure_is_reported_before_io() {
        let allocator = CountingAllocator {
            exhausted: true,
            ..CountingAllocator::default()
        };
        let mut device = Mlx90393::with_allocator(FakeDevice::new(), allocator);

        assert_eq!(device.get_settings(), Err(Error::Allocation));
        assert_eq!(device.apply_settings(&sample_settings()), Err(Error::Allocation));
        assert_eq!(device.init(None), Err(Error::Allocation));
        assert_eq!(device.settings(), None);
        assert!(device.interface_mut().writes.is_empty());

        let (_, mut allocator) = device.release();
        allocator.exhausted = false;
        let mut device = Mlx90393::with_allocator(FakeDevice::new(), allocator);
        assert!(device.get_settings().is_ok());
    }

    #[test]
    fn cache_is_allocated_once() {
        let mut allocator = CountingAllocator::default();
        let mut device = Mlx90393::with_allocator(FakeDevice::new(), &mut allocator);

        device.init(Some(sample_settings())).unwrap();
        device.get_settings().unwrap();
        device.apply_settings(&Settings::default()).unwrap();
        drop(device.release());

        assert_eq!(allocator.events, vec![AllocEvent::Allocate, AllocEvent::Release]);
    }

    #[test]
    fn release_without_cache_does_not_touch_allocator() {
        let mut allocator = CountingAllocator::default();
        let device = Mlx90393::with_allocator(FakeDevice::new(), &mut allocator);
        let (fake, _) = device.release();

        assert!(fake.writes.is_empty());
        assert!(allocator.events.is_empty());
    }

    #[test]
    fn clear_settings_is_idempotent() {
        let mut allocator = CountingAllocator::default();
        let mut device = Mlx90393::with_allocator(FakeDevice::new(), &mut allocator);
        device.get_settings().unwrap();

        device.clear_settings();
        device.clear_settings();
        assert_eq!(device.settings(), None);
        drop(device.release());

        assert_eq!(allocator.events, vec![AllocEvent::Allocate, AllocEvent::Release]);
    }

    #[test]
    fn read_xyz_requires_settings() {
        let mut device = Mlx90393::new(FakeDevice::new());

        assert_eq!(device.read_xyz(), Err(Error::NotInitialized));
        assert_eq!(device.read_xyz_raw(), Err(Error::NotInitialized));
        assert_eq!(device.conversion_time_ms(), Err(Error::NotInitialized));
        assert!(device.interface_mut().writes.is_empty());
    }

    #[test]
    fn read_xyz_waits_for_conversion_time() {
        let mut device = Mlx90393::new(FakeDevice::new());
        device.init(Some(sample_settings())).unwrap();
        device.interface_mut().writes.clear();

        device.read_xyz().unwrap();

        assert_eq!(device.conversion_time_ms(), Ok(9));
        let fake = device.interface_mut();
        assert_eq!(fake.delays, vec![9]);
        assert_eq!(fake.writes, vec![vec![0x3E], vec![0x4E]]);
    }

    #[test]
    fn read_xyz_without_delay_fails_before_measuring() {
        let mut fake = FakeDevice::new();
        fake.capabilities = Capabilities { delay: false, ..Capabilities::ALL };
        let mut device = Mlx90393::new(fake);
        device.apply_settings(&Settings::default()).unwrap();
        device.interface_mut().writes.clear();

        assert_eq!(device.read_xyz(), Err(Error::MissingCapability));
        assert_eq!(device.read_xyz_raw(), Err(Error::MissingCapability));

        let fake = device.interface_mut();
        assert!(fake.writes.is_empty());
        assert!(fake.delays.is_empty());
    }

    #[test]
    fn read_xyz_scales_by_gain_and_resolution() {
        let mut fake = FakeDevice::new();
        fake.measurement = [0x00, 0x64, 0xFF, 0x9C, 0x00, 0x0A, 0x00, 0x00];
        let mut device = Mlx90393::new(fake);
        device.init(Some(sample_settings())).unwrap();

        let [x, y, z] = device.read_xyz().unwrap();

        // Gain 1x: 17-bit XY is 0.322 µT/LSB, 16-bit Z is 0.294 µT/LSB.
        assert!((x - 32.2).abs() < 1e-3);
        assert!((y + 32.2).abs() < 1e-3);
        assert!((z - 2.94).abs() < 1e-3);
    }

    #[test]
    fn read_xyz_removes_high_resolution_offsets() {
        let mut fake = FakeDevice::new();
        fake.measurement = [0x80, 0x00, 0x80, 0x00, 0x40, 0x00, 0x00, 0x00];
        let mut device = Mlx90393::new(fake);
        let settings = Settings::new()
            .resolution_x(Resolution::Bits18)
            .resolution_y(Resolution::Bits18)
            .resolution_z(Resolution::Bits19)
            .build();
        device.init(Some(settings)).unwrap();

        assert_eq!(device.read_xyz_raw(), Ok([0, 0, 0]));
        assert_eq!(device.read_xyz(), Ok([0.0, 0.0, 0.0]));
    }

    #[test]
    fn read_xyz_leaves_low_resolution_samples_signed() {
        let mut fake = FakeDevice::new();
        fake.measurement = [0x80, 0x00, 0x40, 0x00, 0xFF, 0xFF, 0x00, 0x00];
        let mut device = Mlx90393::new(fake);
        let settings = Settings::new()
            .resolution_x(Resolution::Bits16)
            .resolution_y(Resolution::Bits17)
            .resolution_z(Resolution::Bits16)
            .build();
        device.init(Some(settings)).unwrap();

        assert_eq!(device.read_xyz_raw(), Ok([i16::MIN, 0x4000, -1]));
    }

    #[test]
    fn read_xyz_stops_on_start_failure() {
        let mut device = Mlx90393::new(FakeDevice::new());
        device.init(Some(sample_settings())).unwrap();
        let writes = device.interface_mut().writes.len();
        device.interface_mut().fail_write = Some(writes);

        assert_eq!(device.read_xyz(), Err(Error::Interface(FakeError::Write)));

        let fake = device.interface_mut();
        assert!(fake.delays.is_empty());
        assert_eq!(fake.writes.len(), writes + 1);
    }

    #[test]
    fn read_xyz_propagates_read_failure() {
        let mut device = Mlx90393::new(FakeDevice::new());
        device.init(Some(sample_settings())).unwrap();
        // The `RM` response is the second read of the measurement cycle.
        let reads = device.interface_mut().reads;
        device.interface_mut().fail_read = Some(reads + 1);

        assert_eq!(device.read_xyz(), Err(Error::Interface(FakeError::Read)));
        assert_eq!(device.interface_mut().delays, vec![9]);
    }

    #[test]
    fn commands_are_forwarded_to_the_bus() {
        let mut device = Mlx90393::new(FakeDevice::new());

        device.exit().unwrap();
        device.start_burst(AxisMask::ALL).unwrap();
        device.start_wake_on_change(AxisMask::XYZ).unwrap();
        device.memory_recall().unwrap();
        device.memory_store().unwrap();
        device.reset().unwrap();
        device.nop().unwrap();
        device.write_register(0x05, 0xBEEF).unwrap();
        assert_eq!(device.read_register(0x05).unwrap().1, 0xBEEF);

        assert_eq!(
            device.interface_mut().opcodes(),
            vec![0x80, 0x1F, 0x2E, 0xD0, 0xE0, 0xF0, 0x00, 0x60, 0x50]
        );
    }

    #[test]
    fn i2c_driver_reads_settings_over_the_bus() {
        use embedded_hal_mock::eh1::delay::NoopDelay;
        use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

        let expectations = [
            I2cTrans::write(0x0C, vec![0x50, 0x00]),
            I2cTrans::read(0x0C, vec![0x00, 0x00, 0x7C]),
            I2cTrans::write(0x0C, vec![0x50, 0x08]),
            I2cTrans::read(0x0C, vec![0x00, 0x00, 0x00]),
        ];
        let mut device = Mlx90393::new_i2c(I2cMock::new(&expectations), NoopDelay);

        device.init(None).unwrap();
        assert_eq!(device.settings(), Some(Settings::default()));

        let (mut i2c, _) = device.release_i2c();
        i2c.done();
    }
}
