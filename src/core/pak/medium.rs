// pakdir/src/core/pak/medium.rs

//! Storage medium contract consumed by the directory manager.

use bitflags::bitflags;

use super::{Entry, PakError, PakResult};

/// One of the four controller ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerPort {
    One,
    Two,
    Three,
    Four,
}

impl ControllerPort {
    pub const ALL: [ControllerPort; 4] = [
        ControllerPort::One,
        ControllerPort::Two,
        ControllerPort::Three,
        ControllerPort::Four,
    ];

    /// Zero-based port index
    pub fn index(self) -> usize {
        match self {
            ControllerPort::One => 0,
            ControllerPort::Two => 1,
            ControllerPort::Three => 2,
            ControllerPort::Four => 3,
        }
    }
}

impl TryFrom<usize> for ControllerPort {
    type Error = PakError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        ControllerPort::ALL
            .get(index)
            .copied()
            .ok_or(PakError::OutOfRange(index))
    }
}

impl std::fmt::Display for ControllerPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {}", self.index() + 1)
    }
}

/// Accessory identified in a controller's expansion slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessoryKind {
    None,
    ControllerPak,
    RumblePak,
    TransferPak,
}

impl std::fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessoryKind::None => write!(f, "None"),
            AccessoryKind::ControllerPak => write!(f, "Controller Pak"),
            AccessoryKind::RumblePak => write!(f, "Rumble Pak"),
            AccessoryKind::TransferPak => write!(f, "Transfer Pak"),
        }
    }
}

bitflags! {
    /// Per-port status byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControllerStatus: u8 {
        /// Something is inserted in the expansion slot
        const ACCESSORY = 0x01;
        /// The expansion slot changed since the last status poll
        const ACCESSORY_CHANGED = 0x02;
        /// A controller answers on the port
        const CONNECTED = 0x80;
    }
}

/// Blocking access to the Controller Paks behind the four ports.
///
/// Queries never fail: an absent pak reports [`Entry::empty`] records and no
/// free space. Mutations report failures through [`PakResult`].
pub trait StorageMedium {
    /// Identify the accessory attached to `port`
    fn accessory(&mut self, port: ControllerPort) -> AccessoryKind;

    /// Check the ID block and inode table
    fn validate(&mut self, port: ControllerPort) -> bool;

    /// Read one directory slot
    fn entry(&mut self, port: ControllerPort, slot: usize) -> Entry;

    /// Free data blocks
    fn free_blocks(&mut self, port: ControllerPort) -> usize;

    /// Read `entry.blocks` pages of payload
    fn read_payload(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<Vec<u8>>;

    /// Allocate pages for `data` (at least `entry.blocks`), store it and write
    /// the note into `entry.slot`
    fn write_payload(
        &mut self,
        port: ControllerPort,
        entry: &Entry,
        data: &[u8],
    ) -> PakResult<()>;

    /// Release the note and its pages
    fn delete_entry(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<()>;

    /// Erase the whole directory
    fn format(&mut self, port: ControllerPort) -> PakResult<()>;
}

impl<T: StorageMedium + ?Sized> StorageMedium for &mut T {
    fn accessory(&mut self, port: ControllerPort) -> AccessoryKind {
        (**self).accessory(port)
    }

    fn validate(&mut self, port: ControllerPort) -> bool {
        (**self).validate(port)
    }

    fn entry(&mut self, port: ControllerPort, slot: usize) -> Entry {
        (**self).entry(port, slot)
    }

    fn free_blocks(&mut self, port: ControllerPort) -> usize {
        (**self).free_blocks(port)
    }

    fn read_payload(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<Vec<u8>> {
        (**self).read_payload(port, entry)
    }

    fn write_payload(
        &mut self,
        port: ControllerPort,
        entry: &Entry,
        data: &[u8],
    ) -> PakResult<()> {
        (**self).write_payload(port, entry, data)
    }

    fn delete_entry(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<()> {
        (**self).delete_entry(port, entry)
    }

    fn format(&mut self, port: ControllerPort) -> PakResult<()> {
        (**self).format(port)
    }
}
