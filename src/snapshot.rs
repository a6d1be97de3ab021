//! Whole-simulation (de)serialization: the entire `Memory` grid and
//! allocation bitmap, every `Organism` in queue order, the selected index
//! and the cycle counter, encoded with `bincode`.

use crate::error::FungeraError;
use crate::memory::Memory;
use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotData {
    pub cycle: u64,
    pub memory: Memory,
    pub organisms: Vec<Organism>,
    pub next_organism_id: u64,
    pub selected_index: Option<usize>,
}

impl SnapshotData {
    pub fn write_to(&self, path: &Path) -> Result<(), FungeraError> {
        let bytes = bincode::serialize(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(&bytes)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<SnapshotData, FungeraError> {
        let mut file = std::fs::File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let data = bincode::deserialize(&bytes)?;
        Ok(data)
    }
}
