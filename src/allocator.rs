//! Storage for the cached settings snapshot.
//!
//! The driver never allocates on its own. The cache is reserved lazily through
//! a [`SettingsAllocator`] handed to the driver at construction, which lets a
//! target back it with a static pool or a heap and lets tests observe or fail
//! the reservation deterministically.

use core::ops::{Deref, DerefMut};

use crate::config::Settings;

/// Factory for the slot holding the driver's cached [`Settings`].
pub trait SettingsAllocator {
    /// Owned handle to a reserved snapshot.
    type Slot: DerefMut<Target = Settings>;

    /// Reserves a slot seeded with `initial`, or `None` when storage is exhausted.
    fn allocate(&mut self, initial: Settings) -> Option<Self::Slot>;

    /// Returns a slot previously produced by [`allocate`](Self::allocate).
    fn release(&mut self, slot: Self::Slot);
}

impl<A> SettingsAllocator for &mut A
where
    A: SettingsAllocator,
{
    type Slot = A::Slot;

    fn allocate(&mut self, initial: Settings) -> Option<Self::Slot> {
        (**self).allocate(initial)
    }

    fn release(&mut self, slot: Self::Slot) {
        (**self).release(slot)
    }
}

/// Allocator that stores the snapshot inline in the driver. Never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineAllocator;

/// Inline settings slot produced by [`InlineAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineSlot(Settings);

impl InlineSlot {
    /// Wraps a snapshot.
    pub const fn new(settings: Settings) -> Self {
        Self(settings)
    }
}

impl Deref for InlineSlot {
    type Target = Settings;

    fn deref(&self) -> &Settings {
        &self.0
    }
}

impl DerefMut for InlineSlot {
    fn deref_mut(&mut self) -> &mut Settings {
        &mut self.0
    }
}

impl SettingsAllocator for InlineAllocator {
    type Slot = InlineSlot;

    fn allocate(&mut self, initial: Settings) -> Option<InlineSlot> {
        Some(InlineSlot::new(initial))
    }

    fn release(&mut self, _slot: InlineSlot) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Gain;

    #[test]
    fn inline_allocator_seeds_slot() {
        let mut allocator = InlineAllocator;
        let initial = Settings::new().gain(Gain::X3).build();

        let mut slot = allocator.allocate(initial).expect("inline allocation");
        assert_eq!(*slot, initial);

        slot.gain = Gain::X4;
        assert_eq!(slot.gain, Gain::X4);
        allocator.release(slot);
    }

    fn allocate_and_release<A: SettingsAllocator>(mut allocator: A, initial: Settings) -> Settings {
        let slot = allocator.allocate(initial).expect("allocation");
        let copy = *slot;
        allocator.release(slot);
        copy
    }

    #[test]
    fn borrowed_allocator_forwards() {
        let mut allocator = InlineAllocator;
        let initial = Settings::new().gain(Gain::X2).build();
        assert_eq!(allocate_and_release(&mut allocator, initial), initial);
    }
}
