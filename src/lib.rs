#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log; // must precede the modules that log
mod error;

pub mod allocator;
pub mod commands;
pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;

pub use crate::allocator::{InlineAllocator, SettingsAllocator};
pub use crate::commands::AxisMask;
pub use crate::config::Settings;
pub use crate::device::Mlx90393;
pub use crate::error::{Error, Result};
