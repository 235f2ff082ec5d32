// pakdir/src/core/pak/entry.rs

//! Directory records.
//!
//! [`Entry`] is the decoded view used by the directory cache and the medium
//! contract; [`NoteRecord`] is the raw 32-byte note as it sits in the note
//! table of a pak image.

use bytemuck::{Pod, Zeroable};

use super::charset::{decode_name, encode_name};
use super::{PakError, PakResult, BLOCK_SIZE};

/// Longest base name a note can hold
pub const NAME_LEN: usize = 16;

/// Status byte written for occupied notes
pub const STATUS_OCCUPIED: u8 = 0x02;

/// One directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Fixed position in the directory, never reassigned
    pub slot: usize,
    /// The slot holds live data
    pub valid: bool,
    /// "NAME" or "NAME.X"
    pub name: String,
    /// Pages occupied, at least 1 when valid
    pub blocks: usize,
    pub region: u8,
    pub vendor: [u8; 3],
    pub game_code: [u8; 2],
    /// First page of the data chain
    pub start_page: u16,
}

impl Entry {
    /// Record reported for a slot with nothing behind it
    pub fn empty(slot: usize) -> Self {
        Self {
            slot,
            valid: false,
            name: String::new(),
            blocks: 0,
            region: 0,
            vendor: [0; 3],
            game_code: [0; 2],
            start_page: 0,
        }
    }

    /// Bytes of payload behind this entry
    pub fn payload_len(&self) -> usize {
        self.blocks * BLOCK_SIZE
    }
}

/// Blocks needed to hold `len` bytes; an empty payload still takes one block
pub fn blocks_for(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE).max(1)
}

/// Split "NAME.X" into base and single-character extension.
///
/// A trailing part after the last '.' that is not exactly one character is
/// kept in the base name.
pub fn split_name(name: &str) -> PakResult<(&str, Option<char>)> {
    if name.is_empty() {
        return Err(PakError::InvalidName(name.to_string()));
    }

    if let Some((base, ext)) = name.rsplit_once('.') {
        let mut chars = ext.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !base.is_empty() {
                return Ok((base, Some(c)));
            }
        }
    }
    Ok((name, None))
}

/// `name` as it reads back from the pak once written: base and extension
/// passed through the font code, so lowercase comes back uppercase
pub fn stored_name(name: &str) -> PakResult<String> {
    let (base, ext) = split_name(name)?;

    let mut field = [0u8; NAME_LEN];
    encode_name(base, &mut field)?;
    let mut stored = decode_name(&field);

    if let Some(c) = ext {
        let mut buf = [0u8; 4];
        let mut code = [0u8; 1];
        encode_name(c.encode_utf8(&mut buf), &mut code)
            .map_err(|_| PakError::InvalidName(name.to_string()))?;
        stored.push('.');
        stored.push_str(&decode_name(&code));
    }
    Ok(stored)
}

/// Raw note table record (32 bytes, big-endian fields)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct NoteRecord {
    pub vendor: [u8; 3],
    pub region: u8,
    pub game_code: [u8; 2],
    pub start_page: [u8; 2],
    pub status: u8,
    pub reserved: u8,
    pub data_sum: [u8; 2],
    pub ext: [u8; 4],
    pub name: [u8; NAME_LEN],
}

impl NoteRecord {
    pub const SIZE: usize = std::mem::size_of::<NoteRecord>();

    /// Decode from a 32-byte note table slice
    pub fn parse(raw: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(&raw[..Self::SIZE])
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn start_page(&self) -> u16 {
        u16::from_be_bytes(self.start_page)
    }

    /// A note is in use when it carries a vendor code
    pub fn in_use(&self) -> bool {
        self.vendor != [0; 3]
    }

    /// Build the note for `entry`. The start page is filled in by the pak
    /// once pages are allocated.
    pub fn from_entry(entry: &Entry) -> PakResult<Self> {
        let (base, ext) = split_name(&entry.name)?;

        let mut note = NoteRecord::zeroed();
        note.vendor = entry.vendor;
        note.region = entry.region;
        note.game_code = entry.game_code;
        note.start_page = entry.start_page.to_be_bytes();
        note.status = STATUS_OCCUPIED;
        encode_name(base, &mut note.name)?;
        if let Some(c) = ext {
            let mut buf = [0u8; 4];
            let s = c.encode_utf8(&mut buf);
            encode_name(s, &mut note.ext[..1])
                .map_err(|_| PakError::InvalidName(entry.name.clone()))?;
        }
        Ok(note)
    }

    /// Decoded view of this note. `valid` only reflects the vendor code;
    /// block count and chain checks are the pak's job.
    pub fn to_entry(&self, slot: usize) -> Entry {
        let base = decode_name(&self.name);
        let ext = decode_name(&self.ext[..1]);
        let name = if ext.is_empty() {
            base
        } else {
            format!("{}.{}", base, ext)
        };

        Entry {
            slot,
            valid: self.in_use(),
            name,
            blocks: 0,
            region: self.region,
            vendor: self.vendor,
            game_code: self.game_code,
            start_page: self.start_page(),
        }
    }
}
