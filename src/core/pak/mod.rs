//! Controller Pak support.
//!
//! Directory manager, note records, the pak font code, the storage medium
//! contract and an emulated pak/controller bus that implements it.

pub mod bus;
pub mod charset;
pub mod config;
pub mod directory;
pub mod entry;
pub mod image;
pub mod medium;

// Re-export types
pub use bus::{Accessory, ControllerBus};
pub use config::PakConfig;
pub use directory::{DirectorySnapshot, PakDirectory};
pub use entry::{Entry, NoteRecord};
pub use image::MemoryPak;
pub use medium::{AccessoryKind, ControllerPort, ControllerStatus, StorageMedium};

/// Number of note slots in the directory
pub const MAX_ENTRIES: usize = 16;

/// Bytes per block (one pak page)
pub const BLOCK_SIZE: usize = 256;

/// Size of a full pak image (32 KiB)
pub const PAK_SIZE: usize = 32 * 1024;

/// Pages in a pak image
pub const TOTAL_PAGES: usize = PAK_SIZE / BLOCK_SIZE;

/// First page usable for note data; 0..5 hold the ID block, inode tables and note table
pub const FIRST_DATA_PAGE: usize = 5;

/// Data pages available on a freshly formatted pak
pub const DATA_PAGES: usize = TOTAL_PAGES - FIRST_DATA_PAGE;

/// Region byte written with new entries ('E', North America)
pub const DEFAULT_REGION: u8 = 0x45;

/// Controller Pak errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PakError {
    /// No Controller Pak inserted at the port
    NotPresent,
    /// Pak inserted but the ID block or inode table fails validation
    Invalid,
    /// Write attempted into a slot that already holds a note
    SlotOccupied(usize),
    /// Read attempted on a slot without a note
    EmptySlot(usize),
    /// Slot index outside 0..MAX_ENTRIES
    OutOfRange(usize),
    /// No valid note carries this name
    NotFound(String),
    /// Every directory slot is in use
    DirectoryFull,
    /// Not enough free pages for the payload
    NoSpace { needed: usize, free: usize },
    /// Name cannot be stored in the pak font code
    InvalidName(String),
    /// The page chain of a note is broken
    Corrupt(usize),
}

impl std::fmt::Display for PakError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PakError::NotPresent => write!(f, "no controller pak present"),
            PakError::Invalid => write!(f, "controller pak failed validation"),
            PakError::SlotOccupied(slot) => write!(f, "slot {} is occupied", slot),
            PakError::EmptySlot(slot) => write!(f, "slot {} holds no data", slot),
            PakError::OutOfRange(slot) => {
                write!(f, "slot {} out of range (0..{})", slot, MAX_ENTRIES)
            }
            PakError::NotFound(name) => write!(f, "no entry named {:?}", name),
            PakError::DirectoryFull => write!(f, "no free directory slot"),
            PakError::NoSpace { needed, free } => {
                write!(f, "need {} blocks, {} free", needed, free)
            }
            PakError::InvalidName(name) => write!(f, "invalid entry name {:?}", name),
            PakError::Corrupt(slot) => write!(f, "page chain of slot {} is corrupt", slot),
        }
    }
}

impl std::error::Error for PakError {}

/// Result type for Controller Pak operations
pub type PakResult<T> = Result<T, PakError>;

/// Checks a slot index, failing fast on anything outside the directory
pub fn check_slot(slot: usize) -> PakResult<usize> {
    if slot < MAX_ENTRIES {
        Ok(slot)
    } else {
        Err(PakError::OutOfRange(slot))
    }
}
