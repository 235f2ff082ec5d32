//! Controller Pak directory management.
//!
//! The crate keeps a cached view of the sixteen-slot note directory of a
//! Controller Pak and exposes create/read/delete operations on it. The pak
//! itself sits behind the [`StorageMedium`] trait; [`ControllerBus`] and
//! [`MemoryPak`] provide an emulated medium with the real on-pak layout.

pub mod core;

pub use crate::core::pak::{
    Accessory, AccessoryKind, ControllerBus, ControllerPort, ControllerStatus, DirectorySnapshot,
    Entry, MemoryPak, PakConfig, PakDirectory, PakError, PakResult, StorageMedium,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
