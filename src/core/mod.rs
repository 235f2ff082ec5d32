//! Core subsystems.

pub mod pak;
