// pakdir/src/core/pak/image.rs

//! Emulated Controller Pak.
//!
//! A 32 KiB image split into 128 pages of 256 bytes:
//!
//! | page   | contents                                         |
//! |--------|--------------------------------------------------|
//! | 0      | ID block, repeated at 0x20, 0x60, 0x80 and 0xC0  |
//! | 1      | inode table                                      |
//! | 2      | inode table backup                               |
//! | 3, 4   | note table, 16 notes of 32 bytes                 |
//! | 5..128 | note data                                        |
//!
//! Each inode table slot is a big-endian u16 per page: `INODE_END` closes a
//! chain, `INODE_FREE` marks a free page, anything else is the next page.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use log::{debug, info, warn, error};

use super::entry::{blocks_for, NoteRecord};
use super::{
    check_slot, Entry, PakError, PakResult, BLOCK_SIZE, DATA_PAGES, FIRST_DATA_PAGE,
    MAX_ENTRIES, PAK_SIZE, TOTAL_PAGES,
};

/// Offsets of the ID block copies inside page 0
pub const ID_BLOCK_OFFSETS: [usize; 4] = [0x20, 0x60, 0x80, 0xC0];

/// Checksum plus inverted checksum always add up to this
const ID_CHECKSUM_TOTAL: u16 = 0xFFF2;

const INODE_PAGE: usize = 1;
const INODE_BACKUP_PAGE: usize = 2;
const NOTE_PAGE: usize = 3;

/// Inode value closing a chain
pub const INODE_END: u16 = 0x0001;
/// Inode value of a free page
pub const INODE_FREE: u16 = 0x0003;

/// Byte of the inode table holding its checksum
const INODE_CHECKSUM_BYTE: usize = 1;

/// ID block (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct IdBlock {
    pub serial: [u8; 24],
    pub device_id: [u8; 2],
    pub banks: u8,
    pub version: u8,
    pub checksum: [u8; 2],
    pub inverted: [u8; 2],
}

impl IdBlock {
    pub const SIZE: usize = std::mem::size_of::<IdBlock>();

    /// Fresh block as written by a format
    pub fn new() -> Self {
        let mut block = IdBlock::zeroed();
        block.device_id = 0x0001u16.to_be_bytes();
        block.banks = 0x01;
        block.seal();
        block
    }

    /// Wrapping sum of the first 14 big-endian words
    pub fn compute_checksum(&self) -> u16 {
        bytemuck::bytes_of(self)[..28]
            .chunks_exact(2)
            .fold(0u16, |sum, w| sum.wrapping_add(u16::from_be_bytes([w[0], w[1]])))
    }

    /// Store checksum and inverted checksum
    pub fn seal(&mut self) {
        let sum = self.compute_checksum();
        self.checksum = sum.to_be_bytes();
        self.inverted = ID_CHECKSUM_TOTAL.wrapping_sub(sum).to_be_bytes();
    }

    pub fn is_valid(&self) -> bool {
        let sum = self.compute_checksum();
        u16::from_be_bytes(self.checksum) == sum
            && u16::from_be_bytes(self.inverted) == ID_CHECKSUM_TOTAL.wrapping_sub(sum)
    }
}

impl Default for IdBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller Pak image with persistence
pub struct MemoryPak {
    data: Vec<u8>,
    pub dirty: bool,
    pub file_path: Option<PathBuf>,
}

impl MemoryPak {
    /// Unformatted pak (all zero); it fails validation until formatted
    pub fn new() -> Self {
        Self {
            data: vec![0; PAK_SIZE],
            dirty: false,
            file_path: None,
        }
    }

    /// Freshly formatted pak
    pub fn formatted() -> Self {
        let mut pak = Self::new();
        pak.format();
        pak.dirty = false;
        pak
    }

    /// Wrap a raw image dump
    pub fn from_image(image: Vec<u8>) -> io::Result<Self> {
        if image.len() != PAK_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("pak image must be {} bytes, got {}", PAK_SIZE, image.len()),
            ));
        }
        Ok(Self {
            data: image,
            dirty: false,
            file_path: None,
        })
    }

    /// Raw image
    pub fn image(&self) -> &[u8] {
        &self.data
    }

    /// Load an image from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut image = Vec::with_capacity(PAK_SIZE);
        file.read_to_end(&mut image)?;

        let mut pak = Self::from_image(image)?;
        pak.file_path = Some(path.to_path_buf());
        info!("Controller Pak loaded: {}", path.display());
        Ok(pak)
    }

    /// Save the image to a file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        file.write_all(&self.data)?;
        self.file_path = Some(path.to_path_buf());
        self.dirty = false;
        info!("Controller Pak saved: {}", path.display());
        Ok(())
    }

    /// Save to the last used file if anything changed
    pub fn auto_save(&mut self) {
        if !self.dirty {
            return;
        }
        if let Some(path) = self.file_path.clone() {
            if let Err(e) = self.save_to_file(&path) {
                error!("Failed to save Controller Pak: {}", e);
            }
        }
    }

    fn page(&self, page: usize) -> &[u8] {
        &self.data[page * BLOCK_SIZE..(page + 1) * BLOCK_SIZE]
    }

    fn page_mut(&mut self, page: usize) -> &mut [u8] {
        &mut self.data[page * BLOCK_SIZE..(page + 1) * BLOCK_SIZE]
    }

    fn id_block(&self, offset: usize) -> IdBlock {
        bytemuck::pod_read_unaligned(&self.data[offset..offset + IdBlock::SIZE])
    }

    /// Table readers go by: the primary unless only the backup checks out
    fn active_inode_table(&self) -> usize {
        if !self.inodes_valid(INODE_PAGE) && self.inodes_valid(INODE_BACKUP_PAGE) {
            INODE_BACKUP_PAGE
        } else {
            INODE_PAGE
        }
    }

    fn inode(&self, page: usize) -> u16 {
        let raw = self.page(self.active_inode_table());
        u16::from_be_bytes([raw[page * 2], raw[page * 2 + 1]])
    }

    /// Copy the good inode table over the bad one. Must run before any
    /// mutation, since mutations write and seal both tables.
    fn repair_inodes(&mut self) {
        let active = self.active_inode_table();
        let stale = if active == INODE_PAGE {
            INODE_BACKUP_PAGE
        } else {
            INODE_PAGE
        };
        if self.page(stale) != self.page(active) {
            warn!("Restoring inode table page {} from page {}", stale, active);
            self.data.copy_within(
                active * BLOCK_SIZE..(active + 1) * BLOCK_SIZE,
                stale * BLOCK_SIZE,
            );
        }
    }

    fn set_inode(&mut self, page: usize, value: u16) {
        let bytes = value.to_be_bytes();
        for table in [INODE_PAGE, INODE_BACKUP_PAGE] {
            let raw = self.page_mut(table);
            raw[page * 2..page * 2 + 2].copy_from_slice(&bytes);
        }
    }

    fn inode_checksum(&self, table: usize) -> u8 {
        self.page(table)[FIRST_DATA_PAGE * 2..]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b))
    }

    fn seal_inodes(&mut self) {
        let sum = self.inode_checksum(INODE_PAGE);
        for table in [INODE_PAGE, INODE_BACKUP_PAGE] {
            self.page_mut(table)[INODE_CHECKSUM_BYTE] = sum;
        }
    }

    fn inodes_valid(&self, table: usize) -> bool {
        self.page(table)[INODE_CHECKSUM_BYTE] == self.inode_checksum(table)
    }

    fn note_offset(slot: usize) -> usize {
        NOTE_PAGE * BLOCK_SIZE + slot * NoteRecord::SIZE
    }

    fn raw_note(&self, slot: usize) -> NoteRecord {
        NoteRecord::parse(&self.data[Self::note_offset(slot)..])
    }

    fn store_note(&mut self, slot: usize, note: &NoteRecord) {
        let offset = Self::note_offset(slot);
        self.data[offset..offset + NoteRecord::SIZE].copy_from_slice(note.as_bytes());
    }

    /// Pages of the chain starting at `start`, or None if it is broken
    fn chain(&self, start: u16) -> Option<Vec<usize>> {
        let mut pages = Vec::new();
        let mut page = start as usize;

        loop {
            if !(FIRST_DATA_PAGE..TOTAL_PAGES).contains(&page) || pages.len() >= DATA_PAGES {
                return None;
            }
            pages.push(page);

            match self.inode(page) {
                INODE_END => return Some(pages),
                next => page = next as usize,
            }
        }
    }

    /// Erase the directory and every page
    pub fn format(&mut self) {
        self.data.fill(0);

        let id = IdBlock::new();
        for offset in ID_BLOCK_OFFSETS {
            self.data[offset..offset + IdBlock::SIZE].copy_from_slice(bytemuck::bytes_of(&id));
        }
        for page in FIRST_DATA_PAGE..TOTAL_PAGES {
            self.set_inode(page, INODE_FREE);
        }
        self.seal_inodes();
        self.dirty = true;

        info!("Controller Pak formatted: {} free blocks", DATA_PAGES);
    }

    /// The primary ID block (or a backup copy) checks out and so does an inode table
    pub fn validate(&self) -> bool {
        let id_ok = ID_BLOCK_OFFSETS
            .iter()
            .any(|&offset| self.id_block(offset).is_valid());
        let inodes_ok = self.inodes_valid(INODE_PAGE) || self.inodes_valid(INODE_BACKUP_PAGE);

        if !id_ok || !inodes_ok {
            debug!("Controller Pak validation failed (id: {}, inodes: {})", id_ok, inodes_ok);
        }
        id_ok && inodes_ok
    }

    /// Free data pages
    pub fn free_pages(&self) -> usize {
        (FIRST_DATA_PAGE..TOTAL_PAGES)
            .filter(|&page| self.inode(page) == INODE_FREE)
            .count()
    }

    /// Decoded note for `slot`. A note with a broken chain is reported invalid.
    pub fn note(&self, slot: usize) -> Entry {
        if slot >= MAX_ENTRIES {
            return Entry::empty(slot);
        }

        let raw = self.raw_note(slot);
        let mut entry = raw.to_entry(slot);
        if entry.valid {
            match self.chain(raw.start_page()) {
                Some(pages) => entry.blocks = pages.len(),
                None => {
                    warn!("Note {} has a broken page chain", slot);
                    entry.valid = false;
                }
            }
        }
        entry
    }

    /// Payload of the note stored in `entry.slot`
    pub fn read(&self, entry: &Entry) -> PakResult<Vec<u8>> {
        let slot = check_slot(entry.slot)?;
        if !self.validate() {
            return Err(PakError::Invalid);
        }

        let note = self.raw_note(slot);
        if !note.in_use() {
            return Err(PakError::EmptySlot(slot));
        }
        let pages = self.chain(note.start_page()).ok_or(PakError::Corrupt(slot))?;

        let mut payload = Vec::with_capacity(pages.len() * BLOCK_SIZE);
        for page in pages {
            payload.extend_from_slice(self.page(page));
        }
        debug!("Read note {}: {} bytes", slot, payload.len());
        Ok(payload)
    }

    /// Store `data` as a new note in `entry.slot`. At least `entry.blocks`
    /// pages are allocated; the tail of the last page is zero-filled.
    pub fn write(&mut self, entry: &Entry, data: &[u8]) -> PakResult<()> {
        let slot = check_slot(entry.slot)?;
        if !self.validate() {
            return Err(PakError::Invalid);
        }
        if self.raw_note(slot).in_use() {
            return Err(PakError::SlotOccupied(slot));
        }
        self.repair_inodes();

        let needed = blocks_for(data.len()).max(entry.blocks);
        let free: Vec<usize> = (FIRST_DATA_PAGE..TOTAL_PAGES)
            .filter(|&page| self.inode(page) == INODE_FREE)
            .take(needed)
            .collect();
        if free.len() < needed {
            return Err(PakError::NoSpace {
                needed,
                free: self.free_pages(),
            });
        }

        let mut note = NoteRecord::from_entry(entry)?;
        note.start_page = (free[0] as u16).to_be_bytes();

        for (i, &page) in free.iter().enumerate() {
            let start = (i * BLOCK_SIZE).min(data.len());
            let chunk = &data[start..(start + BLOCK_SIZE).min(data.len())];
            let dst = self.page_mut(page);
            dst.fill(0);
            dst[..chunk.len()].copy_from_slice(chunk);

            let next = free.get(i + 1).map_or(INODE_END, |&p| p as u16);
            self.set_inode(page, next);
        }
        self.seal_inodes();
        self.store_note(slot, &note);
        self.dirty = true;

        debug!(
            "Wrote note {} ({:?}): {} blocks from page {}",
            slot, entry.name, needed, free[0]
        );
        Ok(())
    }

    /// Release the note in `entry.slot` and its pages
    pub fn delete(&mut self, entry: &Entry) -> PakResult<()> {
        let slot = check_slot(entry.slot)?;
        if !self.validate() {
            return Err(PakError::Invalid);
        }

        let note = self.raw_note(slot);
        if !note.in_use() {
            return Err(PakError::EmptySlot(slot));
        }
        self.repair_inodes();

        // Free whatever part of the chain is walkable
        let mut page = note.start_page() as usize;
        let mut freed = 0;
        while (FIRST_DATA_PAGE..TOTAL_PAGES).contains(&page) && freed < DATA_PAGES {
            let next = self.inode(page);
            if next == INODE_FREE {
                break;
            }
            self.set_inode(page, INODE_FREE);
            freed += 1;
            if next == INODE_END {
                break;
            }
            page = next as usize;
        }
        self.seal_inodes();
        self.store_note(slot, &NoteRecord::zeroed());
        self.dirty = true;

        debug!("Deleted note {}: {} blocks freed", slot, freed);
        Ok(())
    }
}

impl Default for MemoryPak {
    fn default() -> Self {
        Self::new()
    }
}
