//! Owns Memory and Queue exclusively, drives them one tick at a time, and
//! offers the read-only observer surface any UI collaborator needs.

use crate::config::EngineConfig;
use crate::error::FungeraError;
use crate::memory::Memory;
use crate::organism::Organism;
use crate::queue::Queue;
use crate::snapshot::SnapshotData;
use crate::vec2::Vec2;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

pub struct Engine {
    memory: Memory,
    queue: Queue,
    cycle: u64,
    running: bool,
    /// UI bypass: true for headless runs, where no collaborator re-reads
    /// state between steps.
    minimal: bool,
    config: EngineConfig,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let memory_size = config.memory_size_vec();
        let queue_config = (&config).into();
        Engine {
            memory: Memory::new(memory_size.row as usize, memory_size.col as usize),
            queue: Queue::new(queue_config),
            cycle: 0,
            running: false,
            minimal: true,
            config,
            rng,
        }
    }

    /// Load a genome (one row per line of the alphabet), centered on
    /// Memory, allocate its body region and construct the single ancestor
    /// organism pointing at it.
    pub fn load_ancestor(&mut self, genome: &[Vec<char>]) -> Result<(), FungeraError> {
        if genome.is_empty() || genome.iter().any(|row| row.is_empty()) {
            return Err(FungeraError::MalformedGenome {
                reason: "genome must have at least one non-empty row".to_string(),
            });
        }
        let rows = genome.len() as i64;
        let cols = genome.iter().map(|row| row.len()).max().unwrap() as i64;
        let memory_size = self.memory.size();
        if rows > memory_size.row || cols > memory_size.col {
            return Err(FungeraError::MalformedGenome {
                reason: format!(
                    "genome {}x{} does not fit in memory {}x{}",
                    rows, cols, memory_size.row, memory_size.col
                ),
            });
        }

        let origin = Vec2::new((memory_size.row - rows) / 2, (memory_size.col - cols) / 2);
        let size = Vec2::new(rows, cols);

        self.memory.load_genome(genome, origin);
        self.memory.allocate(origin, size);
        Organism::spawn(origin, size, None, &mut self.queue);
        info!("loaded ancestor genome ({}x{}) at {:?}", rows, cols, origin);
        Ok(())
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_minimal(&mut self, minimal: bool) {
        self.minimal = minimal;
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn select_next(&mut self) {
        self.queue.select_next();
    }

    pub fn select_previous(&mut self) {
        self.queue.select_previous();
    }

    /// Advance the simulation by exactly one tick, regardless of `running`
    /// — pausing is an external driver's decision about whether to *call*
    /// `step`, not something `step` itself checks.
    pub fn step(&mut self) {
        if self.config.random_rate > 0 && self.cycle % self.config.random_rate == 0 {
            self.memory.cycle(&mut self.rng);
        }

        if self.config.cycle_gap > 0
            && self.cycle % self.config.cycle_gap == 0
            && self.memory.is_time_to_kill(self.config.memory_full_ratio)
        {
            warn!(
                "memory pressure exceeded {:.2}; culling worst {:.0}% of population",
                self.config.memory_full_ratio,
                self.config.kill_organisms_ratio * 100.0
            );
            self.queue
                .kill_worst(self.config.kill_organisms_ratio, &mut self.memory);
        }

        self.queue.cycle_all(&mut self.memory);
        self.cycle += 1;

        if !self.minimal {
            self.queue.update_all();
        }
    }

    pub fn kill_all_worst(&mut self) {
        self.queue
            .kill_worst(self.config.kill_organisms_ratio, &mut self.memory);
    }

    pub fn save(&self, path: &Path) -> Result<(), FungeraError> {
        let data = SnapshotData {
            cycle: self.cycle,
            memory: self.memory.clone(),
            organisms: self.queue.organisms().to_vec(),
            next_organism_id: self.queue.next_id_counter(),
            selected_index: self.queue.selected_index(),
        };
        data.write_to(path)?;
        info!("saved snapshot to {}", path.display());
        Ok(())
    }

    /// Decode a snapshot and only swap it into `self` after the whole
    /// decode succeeds — a corrupt or truncated file never leaves the
    /// engine half-mutated.
    pub fn load(&mut self, path: &Path) -> Result<(), FungeraError> {
        let data = SnapshotData::read_from(path)?;
        let queue_config = (&self.config).into();
        let queue = Queue::from_parts(
            queue_config,
            data.organisms,
            data.next_organism_id,
            data.selected_index,
        );
        self.memory = data.memory;
        self.queue = queue;
        self.cycle = data.cycle;
        info!("loaded snapshot from {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> Vec<Vec<char>> {
        rows.iter().map(|r| r.chars().collect()).collect()
    }

    #[test]
    fn step_always_advances_cycle_even_when_paused() {
        let mut engine = Engine::new(EngineConfig {
            memory_size: (20, 20),
            ..EngineConfig::default()
        });
        engine.load_ancestor(&grid(&[">"])).unwrap();
        engine.set_running(false);
        engine.step();
        assert_eq!(engine.cycle(), 1);
    }

    #[test]
    fn s1_movement_end_to_end() {
        let mut engine = Engine::new(EngineConfig {
            memory_size: (20, 20),
            random_rate: 0,
            ..EngineConfig::default()
        });
        engine.load_ancestor(&grid(&[">"])).unwrap();
        engine.step();
        let org = engine.queue().get_selected().unwrap();
        assert_eq!(org.delta, Vec2::RIGHT);
        assert_eq!(org.errors, 0);
    }

    #[test]
    fn genome_too_large_for_memory_is_rejected() {
        let mut engine = Engine::new(EngineConfig {
            memory_size: (2, 2),
            ..EngineConfig::default()
        });
        let result = engine.load_ancestor(&grid(&[">>>>"]));
        assert!(result.is_err());
    }

    #[test]
    fn save_then_load_round_trips_cycle_and_population() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fungera.snapshot");

        let mut engine = Engine::new(EngineConfig {
            memory_size: (20, 20),
            random_rate: 0,
            ..EngineConfig::default()
        });
        engine.load_ancestor(&grid(&[">"])).unwrap();
        engine.step();
        engine.step();
        engine.save(&path).unwrap();

        let mut reloaded = Engine::new(EngineConfig {
            memory_size: (20, 20),
            ..EngineConfig::default()
        });
        reloaded.load(&path).unwrap();

        assert_eq!(reloaded.cycle(), engine.cycle());
        assert_eq!(reloaded.queue().len(), engine.queue().len());
    }

    #[test]
    fn load_of_truncated_snapshot_does_not_mutate_existing_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fungera-corrupt.snapshot");
        std::fs::write(&path, b"not a valid snapshot").unwrap();

        let mut engine = Engine::new(EngineConfig {
            memory_size: (20, 20),
            ..EngineConfig::default()
        });
        engine.load_ancestor(&grid(&[">"])).unwrap();
        engine.step();
        let cycle_before = engine.cycle();

        let result = engine.load(&path);
        assert!(result.is_err());
        assert_eq!(engine.cycle(), cycle_before);
    }
}
