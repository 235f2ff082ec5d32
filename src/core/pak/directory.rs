// pakdir/src/core/pak/directory.rs

//! Controller Pak directory manager.
//!
//! [`PakDirectory`] is bound to one controller port and keeps a snapshot of
//! the sixteen note slots plus the free block count. The pak is the only
//! source of truth: every operation that touches it ends by taking a new
//! snapshot, which replaces the old one as a whole.

use log::{debug, info, warn};

use super::entry::{blocks_for, stored_name};
use super::medium::{AccessoryKind, ControllerPort, StorageMedium};
use super::{check_slot, Entry, PakConfig, PakError, PakResult, MAX_ENTRIES};

/// Cached view of the pak directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: Vec<Entry>,
    valid_count: usize,
    free_blocks: usize,
}

impl DirectorySnapshot {
    /// Snapshot of a pak with nothing on it
    pub fn empty() -> Self {
        Self {
            entries: (0..MAX_ENTRIES).map(Entry::empty).collect(),
            valid_count: 0,
            free_blocks: 0,
        }
    }

    /// Read every slot and the free block count from the medium
    fn take<M: StorageMedium + ?Sized>(medium: &mut M, port: ControllerPort) -> Self {
        let entries: Vec<Entry> = (0..MAX_ENTRIES)
            .map(|slot| {
                let mut entry = medium.entry(port, slot);
                entry.slot = slot;
                entry
            })
            .collect();
        let valid_count = entries.iter().filter(|e| e.valid).count();
        let free_blocks = medium.free_blocks(port);

        Self {
            entries,
            valid_count,
            free_blocks,
        }
    }

    /// All sixteen slots in slot order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, slot: usize) -> Option<&Entry> {
        self.entries.get(slot)
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    /// Free blocks as reported by the pak
    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    /// Lowest slot without a note
    pub fn first_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.valid)
    }
}

impl Default for DirectorySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Directory of the Controller Pak on one port
pub struct PakDirectory<M: StorageMedium> {
    medium: M,
    port: ControllerPort,
    config: PakConfig,
    snapshot: DirectorySnapshot,
}

impl<M: StorageMedium> PakDirectory<M> {
    /// Bind to `port` and read the directory right away
    pub fn new(medium: M, port: ControllerPort, mut config: PakConfig) -> PakResult<Self> {
        config.normalize()?;

        let mut dir = Self {
            medium,
            port,
            config,
            snapshot: DirectorySnapshot::empty(),
        };
        dir.refresh();

        info!(
            "Pak directory on {}: {} notes, {} blocks free",
            port,
            dir.snapshot.valid_count,
            dir.snapshot.free_blocks
        );
        Ok(dir)
    }

    /// Bind with default metadata and `name` for new notes (e.g. "MEMPAK.Z")
    pub fn with_name(medium: M, port: ControllerPort, name: &str) -> PakResult<Self> {
        Self::new(medium, port, PakConfig::with_name(name))
    }

    /// Replace the cached directory with a fresh read of the pak
    pub fn refresh(&mut self) {
        self.snapshot = DirectorySnapshot::take(&mut self.medium, self.port);
        debug!(
            "Refreshed {}: {} notes, {} blocks free",
            self.port, self.snapshot.valid_count, self.snapshot.free_blocks
        );
    }

    /// A Controller Pak is inserted at the port
    pub fn is_present(&mut self) -> bool {
        self.medium.accessory(self.port) == AccessoryKind::ControllerPak
    }

    /// The pak is present and its ID block and inode table check out.
    /// Always false when no pak is present.
    pub fn is_valid(&mut self) -> bool {
        self.is_present() && self.medium.validate(self.port)
    }

    fn ensure_ready(&mut self) -> PakResult<()> {
        if !self.is_present() {
            return Err(PakError::NotPresent);
        }
        if !self.medium.validate(self.port) {
            return Err(PakError::Invalid);
        }
        Ok(())
    }

    /// Read the payload of `slot`. The buffer is `blocks * BLOCK_SIZE` long.
    pub fn read_entry(&mut self, slot: usize) -> PakResult<Vec<u8>> {
        let slot = check_slot(slot)?;
        self.ensure_ready()?;
        if !self.snapshot.entries[slot].valid {
            return Err(PakError::EmptySlot(slot));
        }

        // The cache may be stale; go by what the pak says now
        let entry = self.medium.entry(self.port, slot);
        if !entry.valid {
            return Err(PakError::EmptySlot(slot));
        }

        let payload = self.medium.read_payload(self.port, &entry)?;
        if payload.len() != entry.payload_len() {
            warn!(
                "Note {} returned {} bytes, expected {}",
                slot,
                payload.len(),
                entry.payload_len()
            );
            return Err(PakError::Corrupt(slot));
        }
        Ok(payload)
    }

    /// Delete the note in `slot`. An empty slot is left alone, including one
    /// the pak emptied since the last refresh; the directory is refreshed
    /// either way.
    pub fn delete_entry(&mut self, slot: usize) -> PakResult<()> {
        let slot = check_slot(slot)?;

        let entry = &self.snapshot.entries[slot];
        let result = if entry.valid {
            debug!("Deleting note {} ({:?})", slot, entry.name);
            let entry = entry.clone();
            match self.medium.delete_entry(self.port, &entry) {
                Err(PakError::EmptySlot(_)) => {
                    debug!("Note {} was already gone", slot);
                    Ok(())
                }
                other => other,
            }
        } else {
            Ok(())
        };

        self.refresh();
        result
    }

    /// Note stamped with the configured metadata
    fn new_entry(&self, slot: usize, blocks: usize) -> Entry {
        Entry {
            valid: true,
            name: self.config.default_name.clone(),
            blocks,
            region: self.config.region,
            vendor: self.config.vendor,
            game_code: self.config.game_code,
            ..Entry::empty(slot)
        }
    }

    /// Write `data` as a new note into `slot`, which must be empty
    pub fn write_entry(&mut self, slot: usize, data: &[u8]) -> PakResult<()> {
        let slot = check_slot(slot)?;
        self.ensure_ready()?;
        if self.snapshot.entries[slot].valid {
            warn!("Refusing to overwrite note {} on {}", slot, self.port);
            return Err(PakError::SlotOccupied(slot));
        }

        let blocks = blocks_for(data.len());
        if blocks > self.snapshot.free_blocks {
            return Err(PakError::NoSpace {
                needed: blocks,
                free: self.snapshot.free_blocks,
            });
        }

        let entry = self.new_entry(slot, blocks);
        debug!("Writing note {} ({:?}): {} blocks", slot, entry.name, blocks);
        let result = self.medium.write_payload(self.port, &entry, data);

        self.refresh();
        result
    }

    /// Write `data` into the lowest empty slot and return that slot
    pub fn write_any_entry(&mut self, data: &[u8]) -> PakResult<usize> {
        self.ensure_ready()?;

        match self.snapshot.first_free_slot() {
            Some(slot) => self.write_entry(slot, data).map(|_| slot),
            None => {
                self.refresh();
                warn!("No free note slot on {}", self.port);
                Err(PakError::DirectoryFull)
            }
        }
    }

    /// Slot of the first valid note named `name`. The name is compared in
    /// the form the pak stores it, so "save.a" finds "SAVE.A".
    pub fn find_first_entry_with(&self, name: &str) -> Option<usize> {
        let name = stored_name(name).ok()?;
        self.snapshot
            .entries
            .iter()
            .position(|e| e.valid && e.name == name)
    }

    /// Read the first note named `name`
    pub fn read_entry_with(&mut self, name: &str) -> PakResult<Vec<u8>> {
        let slot = self
            .find_first_entry_with(name)
            .ok_or_else(|| PakError::NotFound(name.to_string()))?;
        self.read_entry(slot)
    }

    /// Delete the first note named `name`
    pub fn delete_entry_with(&mut self, name: &str) -> PakResult<()> {
        let slot = self
            .find_first_entry_with(name)
            .ok_or_else(|| PakError::NotFound(name.to_string()))?;
        self.delete_entry(slot)
    }

    /// Erase the whole pak and refresh the directory
    pub fn format_medium(&mut self) -> PakResult<()> {
        let result = self.medium.format(self.port);
        self.refresh();

        if result.is_ok() {
            info!("Formatted pak on {}", self.port);
        }
        result
    }

    /// Cached record for `slot`
    pub fn entry(&self, slot: usize) -> PakResult<&Entry> {
        let slot = check_slot(slot)?;
        Ok(&self.snapshot.entries[slot])
    }

    /// Cached name of the note in `slot`
    pub fn entry_name(&self, slot: usize) -> PakResult<&str> {
        self.entry(slot).map(|e| e.name.as_str())
    }

    pub fn valid_count(&self) -> usize {
        self.snapshot.valid_count
    }

    pub fn free_blocks(&self) -> usize {
        self.snapshot.free_blocks
    }

    /// Name given to notes written by this directory
    pub fn default_name(&self) -> &str {
        &self.config.default_name
    }

    pub fn port(&self) -> ControllerPort {
        self.port
    }

    pub fn config(&self) -> &PakConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Direct access to the medium. Call [`PakDirectory::refresh`] after
    /// changing the pak through it.
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    pub fn into_medium(self) -> M {
        self.medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pak::bus::Accessory;
    use crate::core::pak::{ControllerBus, MemoryPak, BLOCK_SIZE, DATA_PAGES};

    const PORT: ControllerPort = ControllerPort::One;

    fn directory(name: &str) -> PakDirectory<ControllerBus> {
        let bus = ControllerBus::with_pak(PORT, MemoryPak::formatted());
        PakDirectory::with_name(bus, PORT, name).unwrap()
    }

    /// Counts snapshot reads on top of a real bus
    struct CountingMedium {
        bus: ControllerBus,
        refreshes: usize,
    }

    impl StorageMedium for CountingMedium {
        fn accessory(&mut self, port: ControllerPort) -> AccessoryKind {
            self.bus.accessory(port)
        }
        fn validate(&mut self, port: ControllerPort) -> bool {
            self.bus.validate(port)
        }
        fn entry(&mut self, port: ControllerPort, slot: usize) -> Entry {
            self.bus.entry(port, slot)
        }
        fn free_blocks(&mut self, port: ControllerPort) -> usize {
            self.refreshes += 1;
            self.bus.free_blocks(port)
        }
        fn read_payload(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<Vec<u8>> {
            self.bus.read_payload(port, entry)
        }
        fn write_payload(
            &mut self,
            port: ControllerPort,
            entry: &Entry,
            data: &[u8],
        ) -> PakResult<()> {
            self.bus.write_payload(port, entry, data)
        }
        fn delete_entry(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<()> {
            self.bus.delete_entry(port, entry)
        }
        fn format(&mut self, port: ControllerPort) -> PakResult<()> {
            self.bus.format(port)
        }
    }

    /// Reports every slot with a wrong index
    struct ScrambledMedium;

    impl StorageMedium for ScrambledMedium {
        fn accessory(&mut self, _port: ControllerPort) -> AccessoryKind {
            AccessoryKind::ControllerPak
        }
        fn validate(&mut self, _port: ControllerPort) -> bool {
            true
        }
        fn entry(&mut self, _port: ControllerPort, slot: usize) -> Entry {
            Entry {
                valid: slot % 2 == 0,
                ..Entry::empty(99 - slot)
            }
        }
        fn free_blocks(&mut self, _port: ControllerPort) -> usize {
            7
        }
        fn read_payload(&mut self, _port: ControllerPort, _entry: &Entry) -> PakResult<Vec<u8>> {
            Ok(vec![0; 3])
        }
        fn write_payload(
            &mut self,
            _port: ControllerPort,
            _entry: &Entry,
            _data: &[u8],
        ) -> PakResult<()> {
            Ok(())
        }
        fn delete_entry(&mut self, _port: ControllerPort, _entry: &Entry) -> PakResult<()> {
            Ok(())
        }
        fn format(&mut self, _port: ControllerPort) -> PakResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_new_directory() {
        let dir = directory("MEMPAK.Z");
        assert_eq!(dir.snapshot().entries().len(), MAX_ENTRIES);
        assert_eq!(dir.valid_count(), 0);
        assert_eq!(dir.free_blocks(), DATA_PAGES);
        assert_eq!(dir.default_name(), "MEMPAK.Z");
        assert_eq!(dir.port(), PORT);
    }

    #[test]
    fn test_invalid_default_name() {
        let bus = ControllerBus::with_pak(PORT, MemoryPak::formatted());
        assert!(matches!(
            PakDirectory::with_name(bus, PORT, "NO~PE"),
            Err(PakError::InvalidName(_))
        ));
    }

    #[test]
    fn test_slot_indices_normalized() {
        let dir = PakDirectory::with_name(ScrambledMedium, PORT, "A").unwrap();
        for (i, entry) in dir.snapshot().entries().iter().enumerate() {
            assert_eq!(entry.slot, i);
        }
        assert_eq!(dir.valid_count(), 8);
        assert_eq!(dir.free_blocks(), 7);
    }

    #[test]
    fn test_short_payload_rejected() {
        let mut dir = PakDirectory::with_name(ScrambledMedium, PORT, "A").unwrap();
        // ScrambledMedium claims 0 blocks but hands back 3 bytes
        assert_eq!(dir.read_entry(0), Err(PakError::Corrupt(0)));
    }

    #[test]
    fn test_scenario_hello() {
        let mut dir = directory("HELLO");

        assert_eq!(dir.write_any_entry(b"HELLO"), Ok(0));
        assert_eq!(dir.valid_count(), 1);
        assert_eq!(dir.entry_name(0), Ok("HELLO"));
        assert_eq!(dir.find_first_entry_with("HELLO"), Some(0));

        dir.delete_entry(0).unwrap();
        assert_eq!(dir.valid_count(), 0);
        assert!(!dir.entry(0).unwrap().valid);
        assert_eq!(dir.find_first_entry_with("HELLO"), None);
        assert_eq!(dir.free_blocks(), DATA_PAGES);
    }

    #[test]
    fn test_round_trip() {
        let mut dir = directory("SAVE.A");
        let data: Vec<u8> = (0..700u32).map(|i| (i * 7) as u8).collect();

        dir.write_entry(5, &data).unwrap();
        let entry = dir.entry(5).unwrap();
        assert!(entry.valid);
        assert_eq!(entry.blocks, 3);
        assert_eq!(entry.region, 0x45);
        assert_eq!(dir.free_blocks(), DATA_PAGES - 3);

        let payload = dir.read_entry(5).unwrap();
        assert_eq!(payload.len(), 3 * BLOCK_SIZE);
        assert_eq!(&payload[..data.len()], &data[..]);
    }

    #[test]
    fn test_write_occupied_slot_keeps_payload() {
        let mut dir = directory("SAVE.A");
        dir.write_entry(2, &[0x11; 32]).unwrap();

        assert_eq!(dir.write_entry(2, &[0x22; 32]), Err(PakError::SlotOccupied(2)));
        assert_eq!(dir.valid_count(), 1);
        assert_eq!(dir.read_entry(2).unwrap()[..32], [0x11; 32]);
    }

    #[test]
    fn test_write_any_picks_lowest_free() {
        let mut dir = directory("SAVE.A");
        dir.write_entry(0, &[1]).unwrap();
        dir.write_entry(1, &[2]).unwrap();
        dir.write_entry(3, &[3]).unwrap();

        assert_eq!(dir.write_any_entry(&[4]), Ok(2));
        assert_eq!(dir.valid_count(), 4);
        assert_eq!(dir.write_any_entry(&[5]), Ok(4));
        assert_eq!(dir.read_entry(2).unwrap()[0], 4);
    }

    #[test]
    fn test_write_any_directory_full() {
        let mut dir = directory("X");
        for slot in 0..MAX_ENTRIES {
            assert_eq!(dir.write_any_entry(&[slot as u8]), Ok(slot));
        }
        let before = dir.snapshot().clone();

        assert_eq!(dir.write_any_entry(&[0xFF]), Err(PakError::DirectoryFull));
        assert_eq!(dir.snapshot(), &before);
        assert_eq!(dir.free_blocks(), DATA_PAGES - MAX_ENTRIES);
    }

    #[test]
    fn test_no_space() {
        let mut dir = directory("BIG");
        let big = vec![0u8; 100 * BLOCK_SIZE];
        dir.write_entry(0, &big).unwrap();

        assert_eq!(
            dir.write_entry(1, &big),
            Err(PakError::NoSpace { needed: 100, free: DATA_PAGES - 100 })
        );
        assert!(!dir.entry(1).unwrap().valid);
    }

    #[test]
    fn test_out_of_range() {
        let mut dir = directory("X");
        assert_eq!(dir.read_entry(16), Err(PakError::OutOfRange(16)));
        assert_eq!(dir.write_entry(16, &[1]), Err(PakError::OutOfRange(16)));
        assert_eq!(dir.delete_entry(99), Err(PakError::OutOfRange(99)));
        assert!(dir.entry(16).is_err());
    }

    #[test]
    fn test_read_empty_slot() {
        let mut dir = directory("X");
        assert_eq!(dir.read_entry(7), Err(PakError::EmptySlot(7)));

        dir.write_entry(7, &[9; 4]).unwrap();
        dir.delete_entry(7).unwrap();
        assert_eq!(dir.read_entry(7), Err(PakError::EmptySlot(7)));
    }

    #[test]
    fn test_delete_empty_slot_is_noop() {
        let mut dir = directory("X");
        dir.write_entry(1, &[1]).unwrap();
        dir.delete_entry(4).unwrap();
        assert_eq!(dir.valid_count(), 1);
    }

    #[test]
    fn test_stale_cache_read() {
        let mut dir = directory("X");
        dir.write_entry(0, &[1; 8]).unwrap();

        // Delete behind the directory's back
        let entry = dir.entry(0).unwrap().clone();
        dir.medium_mut().delete_entry(PORT, &entry).unwrap();
        assert!(dir.entry(0).unwrap().valid);
        assert_eq!(dir.read_entry(0), Err(PakError::EmptySlot(0)));

        dir.refresh();
        assert_eq!(dir.valid_count(), 0);
    }

    #[test]
    fn test_delete_note_already_gone() {
        let mut dir = directory("X");
        dir.write_entry(0, &[1; 8]).unwrap();

        let entry = dir.entry(0).unwrap().clone();
        dir.medium_mut().delete_entry(PORT, &entry).unwrap();
        assert!(dir.entry(0).unwrap().valid);

        assert_eq!(dir.delete_entry(0), Ok(()));
        assert!(!dir.entry(0).unwrap().valid);
        assert_eq!(dir.valid_count(), 0);
        assert_eq!(dir.free_blocks(), DATA_PAGES);
    }

    #[test]
    fn test_not_present() {
        let mut dir = PakDirectory::with_name(ControllerBus::new(), PORT, "X").unwrap();
        assert!(!dir.is_present());
        assert!(!dir.is_valid());
        assert_eq!(dir.valid_count(), 0);
        assert_eq!(dir.free_blocks(), 0);
        assert!(dir.snapshot().entries().iter().all(|e| !e.valid));

        assert_eq!(dir.read_entry(0), Err(PakError::NotPresent));
        assert_eq!(dir.write_entry(0, &[1]), Err(PakError::NotPresent));
        assert_eq!(dir.write_any_entry(&[1]), Err(PakError::NotPresent));
        assert_eq!(dir.format_medium(), Err(PakError::NotPresent));
    }

    #[test]
    fn test_rumble_pak_is_not_present() {
        let mut bus = ControllerBus::new();
        bus.insert(PORT, Accessory::RumblePak);
        let mut dir = PakDirectory::with_name(bus, PORT, "X").unwrap();
        assert!(!dir.is_present());
        assert_eq!(dir.write_any_entry(&[1]), Err(PakError::NotPresent));
    }

    #[test]
    fn test_unformatted_pak() {
        let bus = ControllerBus::with_pak(PORT, MemoryPak::new());
        let mut dir = PakDirectory::with_name(bus, PORT, "X").unwrap();
        assert!(dir.is_present());
        assert!(!dir.is_valid());
        assert_eq!(dir.write_entry(0, &[1]), Err(PakError::Invalid));
        assert_eq!(dir.read_entry(0), Err(PakError::Invalid));

        dir.format_medium().unwrap();
        assert!(dir.is_valid());
        assert_eq!(dir.free_blocks(), DATA_PAGES);
        assert_eq!(dir.write_any_entry(&[1]), Ok(0));
    }

    #[test]
    fn test_format_refreshes() {
        let mut dir = directory("X");
        dir.write_any_entry(&[1]).unwrap();
        dir.write_any_entry(&[2]).unwrap();
        assert_eq!(dir.valid_count(), 2);

        dir.format_medium().unwrap();
        assert_eq!(dir.valid_count(), 0);
        assert_eq!(dir.free_blocks(), DATA_PAGES);
    }

    #[test]
    fn test_every_mutation_refreshes() {
        let medium = CountingMedium {
            bus: ControllerBus::with_pak(PORT, MemoryPak::formatted()),
            refreshes: 0,
        };
        let mut dir = PakDirectory::with_name(medium, PORT, "X").unwrap();
        assert_eq!(dir.medium().refreshes, 1);

        dir.write_entry(0, &[1]).unwrap();
        assert_eq!(dir.medium().refreshes, 2);
        dir.write_any_entry(&[2]).unwrap();
        assert_eq!(dir.medium().refreshes, 3);
        dir.delete_entry(0).unwrap();
        assert_eq!(dir.medium().refreshes, 4);
        dir.delete_entry(0).unwrap();
        assert_eq!(dir.medium().refreshes, 5);
        dir.format_medium().unwrap();
        assert_eq!(dir.medium().refreshes, 6);

        dir.read_entry(3).unwrap_err();
        assert_eq!(dir.medium().refreshes, 6);
    }

    #[test]
    fn test_named_lookup() {
        let mut dir = directory("GAME.Z");
        dir.write_entry(3, b"payload").unwrap();

        assert_eq!(dir.find_first_entry_with("GAME.Z"), Some(3));
        assert_eq!(dir.find_first_entry_with("GAME"), None);
        assert_eq!(&dir.read_entry_with("GAME.Z").unwrap()[..7], b"payload");
        assert_eq!(
            dir.read_entry_with("OTHER"),
            Err(PakError::NotFound("OTHER".to_string()))
        );

        dir.delete_entry_with("GAME.Z").unwrap();
        assert_eq!(dir.valid_count(), 0);
        assert!(matches!(dir.delete_entry_with("GAME.Z"), Err(PakError::NotFound(_))));
    }

    #[test]
    fn test_lookup_by_default_name() {
        let mut dir = directory("save.a");
        assert_eq!(dir.default_name(), "SAVE.A");

        assert_eq!(dir.write_any_entry(b"x"), Ok(0));
        assert_eq!(dir.entry_name(0), Ok(dir.default_name()));
        let name = dir.default_name().to_string();
        assert_eq!(dir.find_first_entry_with(&name), Some(0));
        assert_eq!(dir.find_first_entry_with("save.a"), Some(0));
        assert_eq!(dir.find_first_entry_with("no~pe"), None);
    }

    #[test]
    fn test_borrowed_bus_with_two_ports() {
        let mut bus = ControllerBus::with_pak(ControllerPort::One, MemoryPak::formatted());
        bus.insert(ControllerPort::Two, Accessory::ControllerPak(MemoryPak::formatted()));

        {
            let mut one = PakDirectory::with_name(&mut bus, ControllerPort::One, "ONE").unwrap();
            one.write_any_entry(&[1; 300]).unwrap();
        }
        {
            let mut two = PakDirectory::with_name(&mut bus, ControllerPort::Two, "TWO").unwrap();
            assert_eq!(two.valid_count(), 0);
            two.write_entry(9, &[2]).unwrap();
        }

        assert_eq!(bus.pak(ControllerPort::One).unwrap().free_pages(), DATA_PAGES - 2);
        assert_eq!(bus.entry(ControllerPort::Two, 9).name, "TWO");
    }

    #[test]
    fn test_pak_swapped_between_refreshes() {
        let mut dir = directory("X");
        dir.write_any_entry(&[1]).unwrap();

        dir.medium_mut().insert(PORT, Accessory::ControllerPak(MemoryPak::formatted()));
        dir.refresh();
        assert_eq!(dir.valid_count(), 0);

        dir.medium_mut().remove(PORT);
        dir.refresh();
        assert!(!dir.is_present());
        assert_eq!(dir.free_blocks(), 0);
    }
}
