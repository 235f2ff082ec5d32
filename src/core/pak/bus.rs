// pakdir/src/core/pak/bus.rs

//! Controller bus: four ports, each with an optional accessory.

use log::{debug, info};

use super::medium::{AccessoryKind, ControllerPort, ControllerStatus, StorageMedium};
use super::{Entry, MemoryPak, PakError, PakResult};

/// Accessory inserted in a controller's expansion slot
pub enum Accessory {
    ControllerPak(MemoryPak),
    RumblePak,
    TransferPak,
}

impl Accessory {
    pub fn kind(&self) -> AccessoryKind {
        match self {
            Accessory::ControllerPak(_) => AccessoryKind::ControllerPak,
            Accessory::RumblePak => AccessoryKind::RumblePak,
            Accessory::TransferPak => AccessoryKind::TransferPak,
        }
    }
}

#[derive(Default)]
struct PortState {
    connected: bool,
    accessory: Option<Accessory>,
    changed: bool,
}

/// The four controller ports
pub struct ControllerBus {
    ports: [PortState; 4],
}

impl ControllerBus {
    /// Bus with a controller on every port and no accessories
    pub fn new() -> Self {
        let mut bus = Self {
            ports: Default::default(),
        };
        for state in bus.ports.iter_mut() {
            state.connected = true;
        }
        bus
    }

    /// Bus with `pak` inserted on `port`
    pub fn with_pak(port: ControllerPort, pak: MemoryPak) -> Self {
        let mut bus = Self::new();
        bus.insert(port, Accessory::ControllerPak(pak));
        bus
    }

    pub fn connect(&mut self, port: ControllerPort) {
        self.ports[port.index()].connected = true;
    }

    /// Unplug the controller; the accessory stays in it
    pub fn disconnect(&mut self, port: ControllerPort) {
        self.ports[port.index()].connected = false;
    }

    /// Insert an accessory, returning whatever was in the slot before
    pub fn insert(&mut self, port: ControllerPort, accessory: Accessory) -> Option<Accessory> {
        info!("{} inserted on {}", accessory.kind(), port);
        let state = &mut self.ports[port.index()];
        state.changed = true;
        state.accessory.replace(accessory)
    }

    /// Pull the accessory out of the slot
    pub fn remove(&mut self, port: ControllerPort) -> Option<Accessory> {
        let state = &mut self.ports[port.index()];
        let removed = state.accessory.take();
        if let Some(accessory) = &removed {
            info!("{} removed from {}", accessory.kind(), port);
            state.changed = true;
        }
        removed
    }

    /// Status byte for `port`
    pub fn status(&self, port: ControllerPort) -> ControllerStatus {
        let state = &self.ports[port.index()];
        let mut status = ControllerStatus::empty();
        if !state.connected {
            return status;
        }

        status |= ControllerStatus::CONNECTED;
        status.set(ControllerStatus::ACCESSORY, state.accessory.is_some());
        status.set(ControllerStatus::ACCESSORY_CHANGED, state.changed);
        status
    }

    /// Whether the slot changed since the last call; clears the flag
    pub fn take_changes(&mut self, port: ControllerPort) -> bool {
        std::mem::take(&mut self.ports[port.index()].changed)
    }

    /// Controller Pak on a connected port
    pub fn pak(&self, port: ControllerPort) -> Option<&MemoryPak> {
        let state = &self.ports[port.index()];
        if !state.connected {
            return None;
        }
        match &state.accessory {
            Some(Accessory::ControllerPak(pak)) => Some(pak),
            _ => None,
        }
    }

    pub fn pak_mut(&mut self, port: ControllerPort) -> Option<&mut MemoryPak> {
        let state = &mut self.ports[port.index()];
        if !state.connected {
            return None;
        }
        match &mut state.accessory {
            Some(Accessory::ControllerPak(pak)) => Some(pak),
            _ => None,
        }
    }

    /// Controller Pak that passes validation
    fn valid_pak(&self, port: ControllerPort) -> Option<&MemoryPak> {
        self.pak(port).filter(|pak| pak.validate())
    }
}

impl Default for ControllerBus {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageMedium for ControllerBus {
    fn accessory(&mut self, port: ControllerPort) -> AccessoryKind {
        if !self.status(port).contains(ControllerStatus::CONNECTED | ControllerStatus::ACCESSORY) {
            return AccessoryKind::None;
        }
        self.ports[port.index()]
            .accessory
            .as_ref()
            .map_or(AccessoryKind::None, Accessory::kind)
    }

    fn validate(&mut self, port: ControllerPort) -> bool {
        self.pak(port).is_some_and(MemoryPak::validate)
    }

    fn entry(&mut self, port: ControllerPort, slot: usize) -> Entry {
        self.valid_pak(port)
            .map_or_else(|| Entry::empty(slot), |pak| pak.note(slot))
    }

    fn free_blocks(&mut self, port: ControllerPort) -> usize {
        self.valid_pak(port).map_or(0, MemoryPak::free_pages)
    }

    fn read_payload(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<Vec<u8>> {
        self.pak(port).ok_or(PakError::NotPresent)?.read(entry)
    }

    fn write_payload(
        &mut self,
        port: ControllerPort,
        entry: &Entry,
        data: &[u8],
    ) -> PakResult<()> {
        self.pak_mut(port).ok_or(PakError::NotPresent)?.write(entry, data)
    }

    fn delete_entry(&mut self, port: ControllerPort, entry: &Entry) -> PakResult<()> {
        self.pak_mut(port).ok_or(PakError::NotPresent)?.delete(entry)
    }

    fn format(&mut self, port: ControllerPort) -> PakResult<()> {
        debug!("Formatting Controller Pak on {}", port);
        self.pak_mut(port).ok_or(PakError::NotPresent)?.format();
        Ok(())
    }
}
