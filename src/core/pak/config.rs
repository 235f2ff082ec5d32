//! Directory configuration.

use super::entry::stored_name;
use super::{PakError, PakResult, DEFAULT_REGION};

/// Metadata stamped on every note the directory writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakConfig {
    /// Name given to new notes, "NAME" or "NAME.X"
    pub default_name: String,
    pub region: u8,
    /// Publisher code; must be non-zero for the note to count as used
    pub vendor: [u8; 3],
    pub game_code: [u8; 2],
}

impl Default for PakConfig {
    fn default() -> Self {
        Self {
            default_name: "MEMPAK.Z".to_string(),
            region: DEFAULT_REGION,
            vendor: *b"NDP",
            game_code: *b"ED",
        }
    }
}

impl PakConfig {
    /// Default metadata with a different note name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            default_name: name.into(),
            ..Self::default()
        }
    }

    /// Check that the default name fits the note name fields and that the
    /// vendor code marks notes as used
    pub fn validate(&self) -> PakResult<()> {
        stored_name(&self.default_name)?;

        if self.vendor == [0; 3] {
            return Err(PakError::InvalidName(format!(
                "{} (vendor code is zero)",
                self.default_name
            )));
        }
        Ok(())
    }

    /// Validate, then rewrite the default name in the form the pak stores
    /// it, so it compares equal to the names read back from written notes
    pub fn normalize(&mut self) -> PakResult<()> {
        self.validate()?;
        self.default_name = stored_name(&self.default_name)?;
        Ok(())
    }
}
