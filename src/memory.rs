use crate::instruction;
use crate::vec2::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The 2D instruction "soup" where organisms live.
///
/// Memory is deliberately ignorant of organisms: it owns the grid and the
/// allocation bitmap and nothing else. Reads are total — an out-of-bounds
/// address is reported as "unknown" (`None`) rather than panicking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
    allocated: Vec<bool>,
}

impl Memory {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![instruction::NOP_SYMBOL; rows * cols],
            allocated: vec![false; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.rows as i64, self.cols as i64)
    }

    fn index(&self, addr: Vec2) -> Option<usize> {
        if addr.row < 0 || addr.col < 0 {
            return None;
        }
        let row = addr.row as usize;
        let col = addr.col as usize;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    /// Read the symbol at `addr`. Total: out-of-bounds addresses are
    /// "unknown" rather than an error.
    pub fn cell(&self, addr: Vec2) -> Option<char> {
        self.index(addr).map(|i| self.cells[i])
    }

    /// Write `symbol` at `addr`. Out-of-bounds writes are silently dropped —
    /// Memory has no way to signal failure to a caller that doesn't check.
    pub fn set_cell(&mut self, addr: Vec2, symbol: char) {
        if let Some(i) = self.index(addr) {
            self.cells[i] = symbol;
        }
    }

    /// Blit a rectangular subgrid into Memory starting at `origin`. Does
    /// *not* mark the region as allocated — that is the caller's
    /// responsibility, paired with constructing the owning Organism.
    pub fn load_genome(&mut self, genome: &[Vec<char>], origin: Vec2) {
        for (r, row) in genome.iter().enumerate() {
            for (c, &symbol) in row.iter().enumerate() {
                let addr = origin + Vec2::new(r as i64, c as i64);
                self.set_cell(addr, symbol);
            }
        }
    }

    /// Mark every cell in `[addr, addr+size)` as allocated. Cells outside
    /// bounds are silently skipped.
    pub fn allocate(&mut self, addr: Vec2, size: Vec2) {
        self.set_region(addr, size, true);
    }

    /// Clear the allocation bit for every cell in `[addr, addr+size)`.
    /// Lenient: an out-of-range slice is silently ignored, mirroring
    /// end-of-life cleanup that may be partially out of bounds.
    pub fn deallocate(&mut self, addr: Vec2, size: Vec2) {
        self.set_region(addr, size, false);
    }

    fn set_region(&mut self, addr: Vec2, size: Vec2, allocated: bool) {
        if size.row <= 0 || size.col <= 0 {
            return;
        }
        for r in 0..size.row {
            for c in 0..size.col {
                if let Some(i) = self.index(addr + Vec2::new(r, c)) {
                    self.allocated[i] = allocated;
                }
            }
        }
    }

    /// Single-cell allocation probe. Out-of-bounds addresses read as "not
    /// allocated".
    pub fn is_allocated(&self, addr: Vec2) -> bool {
        self.index(addr).map(|i| self.allocated[i]).unwrap_or(false)
    }

    /// Count allocated cells inside `[addr, addr+size)`. Returns `None` if
    /// the rectangle escapes Memory bounds; otherwise the count (zero means
    /// the whole rectangle is free).
    pub fn is_allocated_region(&self, addr: Vec2, size: Vec2) -> Option<usize> {
        if size.row <= 0 || size.col <= 0 {
            return None;
        }
        let far_corner = addr + Vec2::new(size.row - 1, size.col - 1);
        if self.index(addr).is_none() || self.index(far_corner).is_none() {
            return None;
        }
        let mut count = 0;
        for r in 0..size.row {
            for c in 0..size.col {
                let i = self.index(addr + Vec2::new(r, c))?;
                if self.allocated[i] {
                    count += 1;
                }
            }
        }
        Some(count)
    }

    /// Find the unique symbol whose encoding equals `opcode` and write it at
    /// `addr`. A no-op if no such symbol exists, or if `addr` is
    /// out-of-bounds.
    pub fn write_inst(&mut self, addr: Vec2, opcode: Vec2) {
        if let Some(symbol) = instruction::symbol_for_opcode(opcode) {
            self.set_cell(addr, symbol);
        }
    }

    /// True iff `allocated_cells / free_cells > ratio`. When Memory is
    /// exactly full (`free_cells == 0`) this is treated as `true` rather
    /// than dividing by zero.
    pub fn is_time_to_kill(&self, ratio: f64) -> bool {
        let allocated = self.allocated.iter().filter(|&&a| a).count();
        let free = self.allocated.len() - allocated;
        if free == 0 {
            return true;
        }
        (allocated as f64 / free as f64) > ratio
    }

    /// Apply one cosmic-ray mutation: overwrite a single uniformly random
    /// cell with a uniformly random instruction symbol.
    pub fn cycle(&mut self, rng: &mut impl Rng) {
        let alphabet = instruction::alphabet();
        let addr = Vec2::new(
            rng.gen_range(0..self.rows as i64),
            rng.gen_range(0..self.cols as i64),
        );
        let symbol = alphabet[rng.gen_range(0..alphabet.len())];
        self.set_cell(addr, symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grid(rows: &[&str]) -> Vec<Vec<char>> {
        rows.iter().map(|r| r.chars().collect()).collect()
    }

    #[test]
    fn out_of_bounds_reads_are_unknown() {
        let mem = Memory::new(10, 10);
        assert_eq!(mem.cell(Vec2::new(-1, 0)), None);
        assert_eq!(mem.cell(Vec2::new(10, 0)), None);
        assert_eq!(mem.cell(Vec2::new(0, 0)), Some('.'));
    }

    #[test]
    fn load_genome_does_not_allocate() {
        let mut mem = Memory::new(10, 10);
        mem.load_genome(&grid(&[">v", "<^"]), Vec2::new(2, 2));
        assert_eq!(mem.cell(Vec2::new(2, 2)), Some('>'));
        assert_eq!(mem.cell(Vec2::new(2, 3)), Some('v'));
        assert_eq!(mem.cell(Vec2::new(3, 2)), Some('<'));
        assert!(!mem.is_allocated(Vec2::new(2, 2)));
    }

    #[test]
    fn allocate_and_deallocate_round_trip() {
        let mut mem = Memory::new(10, 10);
        let addr = Vec2::new(1, 1);
        let size = Vec2::new(2, 3);
        mem.allocate(addr, size);
        assert_eq!(mem.is_allocated_region(addr, size), Some(6));
        mem.deallocate(addr, size);
        assert_eq!(mem.is_allocated_region(addr, size), Some(0));
    }

    #[test]
    fn deallocate_is_lenient_on_out_of_range_slices() {
        let mut mem = Memory::new(5, 5);
        mem.allocate(Vec2::new(3, 3), Vec2::new(2, 2));
        // Extends past bounds; must not panic.
        mem.deallocate(Vec2::new(3, 3), Vec2::new(10, 10));
        assert!(!mem.is_allocated(Vec2::new(3, 3)));
        assert!(!mem.is_allocated(Vec2::new(4, 4)));
    }

    #[test]
    fn region_escaping_bounds_is_none() {
        let mem = Memory::new(5, 5);
        assert_eq!(mem.is_allocated_region(Vec2::new(4, 4), Vec2::new(3, 3)), None);
    }

    #[test]
    fn write_inst_is_noop_for_unknown_encoding() {
        let mut mem = Memory::new(5, 5);
        mem.write_inst(Vec2::new(0, 0), Vec2::new(99, 99));
        assert_eq!(mem.cell(Vec2::new(0, 0)), Some('.'));
    }

    #[test]
    fn full_memory_is_always_time_to_kill() {
        let mut mem = Memory::new(2, 2);
        mem.allocate(Vec2::new(0, 0), Vec2::new(2, 2));
        assert!(mem.is_time_to_kill(0.75));
    }

    #[test]
    fn ratio_below_threshold_is_not_time_to_kill() {
        let mut mem = Memory::new(10, 10);
        mem.allocate(Vec2::new(0, 0), Vec2::new(1, 1));
        assert!(!mem.is_time_to_kill(0.75));
    }

    #[test]
    fn cosmic_ray_changes_exactly_one_cell() {
        let mut mem = Memory::new(4, 4);
        let before: Vec<char> = mem.cells.clone();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        mem.cycle(&mut rng);
        let diff = before
            .iter()
            .zip(mem.cells.iter())
            .filter(|(a, b)| a != b)
            .count();
        assert!(diff <= 1);
    }
}
