use crate::instruction::{self, Axis, Behavior};
use crate::memory::Memory;
use crate::queue::Queue;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// The four general-purpose registers, indexed by their letter (`a..d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registers {
    pub a: Vec2,
    pub b: Vec2,
    pub c: Vec2,
    pub d: Vec2,
}

impl Registers {
    fn get(&self, letter: char) -> Option<Vec2> {
        match letter {
            'a' => Some(self.a),
            'b' => Some(self.b),
            'c' => Some(self.c),
            'd' => Some(self.d),
            _ => None,
        }
    }

    fn set(&mut self, letter: char, value: Vec2) {
        match letter {
            'a' => self.a = value,
            'b' => self.b = value,
            'c' => self.c = value,
            'd' => self.d = value,
            _ => unreachable!("caller must validate register letters before calling set"),
        }
    }
}

/// A living organism: its own registers, stack, instruction pointer and
/// execution direction, plus the bookkeeping needed for self-replication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    pub id: u64,
    pub parent_id: Option<u64>,

    pub ip: Vec2,
    pub delta: Vec2,

    pub start: Vec2,
    pub size: Vec2,

    pub child_start: Vec2,
    pub child_size: Vec2,

    pub regs: Registers,
    pub stack: Vec<Vec2>,

    pub errors: u64,
    pub is_selected: bool,

    pub children: u64,
    pub reproduction_cycle: u64,

    /// Set once this organism has decided to self-destruct. `Queue::cycle_all`
    /// reaps organisms marked dead after the tick that set the flag.
    pub(crate) dead: bool,
}

/// Whether `cycle` already repositioned `ip` (only `if_not_zero` does this)
/// or whether the dispatcher should perform the ordinary `ip += delta`
/// advance.
enum IpAction {
    Advance,
    AlreadySet,
}

impl Organism {
    /// Construct a new organism occupying `[start, start+size)` and append
    /// it to `queue`. Does not allocate the region in Memory — callers pair
    /// this with `memory.allocate` (the ancestor at startup) or rely on the
    /// region already being allocated (a newborn from `split_child`).
    pub fn spawn(start: Vec2, size: Vec2, parent_id: Option<u64>, queue: &mut Queue) -> u64 {
        let id = queue.next_organism_id();
        let organism = Organism {
            id,
            parent_id,
            ip: start,
            delta: Vec2::RIGHT,
            start,
            size,
            child_start: Vec2::ZERO,
            child_size: Vec2::ZERO,
            regs: Registers::default(),
            stack: Vec::new(),
            errors: 0,
            is_selected: false,
            children: 0,
            reproduction_cycle: 0,
            dead: false,
        };
        queue.add(organism);
        id
    }

    fn ip_offset(&self, offset: i64) -> Vec2 {
        self.ip + self.delta * offset
    }

    fn inst(&self, memory: &Memory, offset: i64) -> Option<char> {
        memory.cell(self.ip_offset(offset))
    }

    /// Read either a bare register token (`a..d`) at `offset`, or an axis
    /// modifier (`x`/`y`) followed by a register token at `offset+1`.
    fn read_modifier_or_register(
        &self,
        memory: &Memory,
        offset: i64,
    ) -> Result<(Option<Axis>, char), ()> {
        let first = self.inst(memory, offset).ok_or(())?;
        if let Some(axis) = instruction::axis_of(first) {
            let reg = self.inst(memory, offset + 1).ok_or(())?;
            if !instruction::is_register(reg) {
                return Err(());
            }
            Ok((Some(axis), reg))
        } else if instruction::is_register(first) {
            Ok((None, first))
        } else {
            Err(())
        }
    }

    fn bare_register(&self, memory: &Memory, offset: i64) -> Result<char, ()> {
        let token = self.inst(memory, offset).ok_or(())?;
        if instruction::is_register(token) {
            Ok(token)
        } else {
            Err(())
        }
    }

    /// Advance the organism by exactly one instruction: read the symbol at
    /// `ip`, dispatch its behavior, and advance `ip` by `delta` (unless the
    /// behavior already repositioned it). Failed instructions never
    /// propagate — they increment `errors` and the cycle continues.
    pub fn cycle(&mut self, memory: &mut Memory, queue: &mut Queue) {
        let symbol = self.inst(memory, 0);
        let behavior = symbol.and_then(instruction::behavior_of);

        let action = match behavior {
            Some(b) => match self.dispatch(b, memory, queue) {
                Ok(action) => action,
                Err(()) => {
                    self.errors += 1;
                    IpAction::Advance
                }
            },
            None => {
                // Out-of-bounds ip, or a cell holding a symbol outside the
                // alphabet: the organism stalls until delta carries it back
                // onto a recognized symbol.
                self.errors += 1;
                IpAction::Advance
            }
        };

        if matches!(action, IpAction::Advance) {
            let next_ip = self.ip_offset(1);
            if memory.cell(next_ip).is_some() {
                self.ip = next_ip;
            }
        }

        self.reproduction_cycle += 1;

        if self.errors > queue.config.organism_death_rate
            || self.reproduction_cycle > queue.config.kill_if_no_child
        {
            self.die(memory);
        }
    }

    fn die(&mut self, memory: &mut Memory) {
        self.dead = true;
        memory.deallocate(self.start, self.size);
        if !self.child_size.is_zero() {
            memory.deallocate(self.child_start, self.child_size);
        }
    }

    fn dispatch(
        &mut self,
        behavior: Behavior,
        memory: &mut Memory,
        queue: &mut Queue,
    ) -> Result<IpAction, ()> {
        match behavior {
            Behavior::NoOperation => Ok(IpAction::Advance),
            Behavior::MoveUp => {
                self.delta = Vec2::UP;
                Ok(IpAction::Advance)
            }
            Behavior::MoveDown => {
                self.delta = Vec2::DOWN;
                Ok(IpAction::Advance)
            }
            Behavior::MoveRight => {
                self.delta = Vec2::RIGHT;
                Ok(IpAction::Advance)
            }
            Behavior::MoveLeft => {
                self.delta = Vec2::LEFT;
                Ok(IpAction::Advance)
            }
            Behavior::One => {
                let reg = self.bare_register(memory, 1)?;
                self.regs.set(reg, Vec2::new(1, 1));
                Ok(IpAction::Advance)
            }
            Behavior::Zero => {
                let reg = self.bare_register(memory, 1)?;
                self.regs.set(reg, Vec2::ZERO);
                Ok(IpAction::Advance)
            }
            Behavior::Increment => {
                self.increment_or_decrement(memory, 1)?;
                Ok(IpAction::Advance)
            }
            Behavior::Decrement => {
                self.increment_or_decrement(memory, -1)?;
                Ok(IpAction::Advance)
            }
            Behavior::Subtract => {
                let ra = self.bare_register(memory, 1)?;
                let rb = self.bare_register(memory, 2)?;
                let rc = self.bare_register(memory, 3)?;
                let value = self.regs.get(ra).unwrap() - self.regs.get(rb).unwrap();
                self.regs.set(rc, value);
                Ok(IpAction::Advance)
            }
            Behavior::IfNotZero => self.if_not_zero(memory),
            Behavior::Push => {
                let reg = self.bare_register(memory, 1)?;
                // Overfull push: silently ignored, not counted as an error.
                if self.stack.len() < queue.config.stack_length {
                    self.stack.push(self.regs.get(reg).unwrap());
                }
                Ok(IpAction::Advance)
            }
            Behavior::Pop => {
                let reg = self.bare_register(memory, 1)?;
                let value = self.stack.pop().ok_or(())?;
                self.regs.set(reg, value);
                Ok(IpAction::Advance)
            }
            Behavior::FindTemplate => self.find_template(memory),
            Behavior::LoadInst => {
                let src_reg = self.bare_register(memory, 1)?;
                let dst_reg = self.bare_register(memory, 2)?;
                let src_addr = self.regs.get(src_reg).unwrap();
                let symbol = memory.cell(src_addr).ok_or(())?;
                let opcode = instruction::opcode_of(symbol).ok_or(())?;
                self.regs.set(dst_reg, opcode);
                Ok(IpAction::Advance)
            }
            Behavior::WriteInst => {
                if !self.child_size.is_zero() {
                    let addr_reg = self.bare_register(memory, 1)?;
                    let val_reg = self.bare_register(memory, 2)?;
                    let addr = self.regs.get(addr_reg).unwrap();
                    let opcode = self.regs.get(val_reg).unwrap();
                    memory.write_inst(addr, opcode);
                }
                Ok(IpAction::Advance)
            }
            Behavior::AllocateChild => {
                self.allocate_child(memory)?;
                Ok(IpAction::Advance)
            }
            Behavior::SplitChild => {
                self.split_child(queue);
                Ok(IpAction::Advance)
            }
        }
    }

    fn increment_or_decrement(&mut self, memory: &Memory, step: i64) -> Result<(), ()> {
        let (axis, reg) = self.read_modifier_or_register(memory, 1)?;
        let mut value = self.regs.get(reg).unwrap();
        match axis {
            Some(Axis::X) => value.row += step,
            Some(Axis::Y) => value.col += step,
            None => {
                value.row += step;
                value.col += step;
            }
        }
        self.regs.set(reg, value);
        Ok(())
    }

    fn if_not_zero(&mut self, memory: &Memory) -> Result<IpAction, ()> {
        let (axis, reg) = self.read_modifier_or_register(memory, 1)?;
        let value = self.regs.get(reg).unwrap();
        let (is_nonzero, start_from) = match axis {
            Some(Axis::X) => (value.row != 0, 1),
            Some(Axis::Y) => (value.col != 0, 1),
            None => (!value.is_zero(), 0),
        };
        self.ip = if is_nonzero {
            self.ip_offset(start_from + 2)
        } else {
            self.ip_offset(start_from + 1)
        };
        Ok(IpAction::AlreadySet)
    }

    /// Read a maximal run of `.`/`:` symbols starting at offset 2, then scan
    /// forward for the first occurrence of the complemented pattern. An
    /// empty run (no template symbols at all) is an instruction error.
    fn find_template(&mut self, memory: &Memory) -> Result<IpAction, ()> {
        let dest = self.bare_register(memory, 1)?;
        let limit = self.size.max_component().max(1);

        let mut template = Vec::new();
        let mut i: i64 = 2;
        while i < limit {
            match self.inst(memory, i) {
                Some(c) if instruction::is_template_symbol(c) => {
                    template.push(instruction::complement(c).unwrap());
                    i += 1;
                }
                _ => break,
            }
        }

        if template.is_empty() {
            return Err(());
        }

        let mut counter = 0usize;
        let mut j = i;
        while j < limit {
            if self.inst(memory, j) == Some(template[counter]) {
                counter += 1;
            } else {
                counter = 0;
            }
            if counter == template.len() {
                self.regs.set(dest, self.ip_offset(j));
                break;
            }
            j += 1;
        }

        Ok(IpAction::Advance)
    }

    /// Scan outward from offset 2 along `delta` for the first unallocated
    /// rectangle of the requested size, taking the near-corner position.
    /// Leaves `child_size` at zero if the search runs off the edge of
    /// Memory before finding room.
    fn allocate_child(&mut self, memory: &mut Memory) -> Result<(), ()> {
        let size_reg = self.bare_register(memory, 1)?;
        let dest_reg = self.bare_register(memory, 2)?;
        let size = self.regs.get(size_reg).unwrap();
        if size.is_non_positive() {
            return Err(());
        }

        let search_limit = memory.size().max_component();
        let mut found = None;
        for i in 2..=search_limit {
            let candidate = self.ip_offset(i);
            match memory.is_allocated_region(candidate, size) {
                None => break,
                Some(0) => {
                    found = Some(candidate);
                    break;
                }
                Some(_) => continue,
            }
        }

        if let Some(child_start) = found {
            self.child_start = child_start;
            self.child_size = size;
            self.regs.set(dest_reg, child_start);
            memory.allocate(child_start, size);
        }

        Ok(())
    }

    /// The child's body stays allocated (it was allocated by
    /// `allocate_child`); the newborn's `Organism::spawn` does not
    /// re-allocate it, so this must not deallocate it either.
    fn split_child(&mut self, queue: &mut Queue) {
        if self.child_size.is_zero() {
            return;
        }
        Organism::spawn(self.child_start, self.child_size, Some(self.id), queue);
        self.children += 1;
        self.reproduction_cycle = 0;
        self.child_start = Vec2::ZERO;
        self.child_size = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn make_queue() -> Queue {
        Queue::new(EngineConfig::default().into())
    }

    fn place(memory: &mut Memory, row: i64, col: i64, text: &str) {
        for (i, c) in text.chars().enumerate() {
            memory.set_cell(Vec2::new(row, col + i as i64), c);
        }
    }

    #[test]
    fn s1_movement() {
        let mut memory = Memory::new(20, 20);
        let mut queue = make_queue();
        place(&mut memory, 5, 5, ">");
        memory.allocate(Vec2::new(5, 5), Vec2::new(1, 1));
        Organism::spawn(Vec2::new(5, 5), Vec2::new(1, 1), None, &mut queue);

        queue.cycle_all(&mut memory);

        let org = queue.organism(0).unwrap();
        assert_eq!(org.delta, Vec2::RIGHT);
        assert_eq!(org.ip, Vec2::new(5, 6));
        assert_eq!(org.errors, 0);
    }

    #[test]
    fn s2_stack_round_trip() {
        let mut memory = Memory::new(20, 20);
        let mut queue = make_queue();
        // 'S' pushes register a (operand at offset+1); register tokens are
        // themselves no-ops, so the ip lands on them harmlessly one cycle
        // later. 'P' then pops into register b the same way.
        place(&mut memory, 0, 0, "SaPb");
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 4));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 4), None, &mut queue);
        queue.organism_mut(0).unwrap().regs.a = Vec2::new(3, 7);

        for _ in 0..3 {
            queue.cycle_all(&mut memory);
        }

        let org = queue.organism(0).unwrap();
        assert_eq!(org.regs.b, Vec2::new(3, 7));
        assert!(org.stack.is_empty());
    }

    #[test]
    fn s4_allocate_and_split_child() {
        let mut memory = Memory::new(20, 20);
        let mut queue = make_queue();
        // '@' allocates a region sized by register a into the address held
        // by register b (operands at offset+1/+2); '$' splits the child off.
        place(&mut memory, 0, 0, "@ab$");
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 4));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 4), None, &mut queue);
        queue.organism_mut(0).unwrap().regs.a = Vec2::new(1, 3);

        queue.cycle_all(&mut memory); // '@' -- allocate_child

        let org = queue.organism(0).unwrap();
        assert_eq!(org.child_size, Vec2::new(1, 3));
        assert_eq!(memory.is_allocated_region(org.child_start, Vec2::new(1, 3)), Some(3));

        // Drive through the 'a'/'b' no-op operand cells to the '$' split.
        for _ in 0..3 {
            queue.cycle_all(&mut memory);
        }

        assert_eq!(queue.len(), 2);
        let child = queue.organism(1).unwrap();
        assert_eq!(child.size, Vec2::new(1, 3));
        assert_eq!(
            memory.is_allocated_region(child.start, child.size),
            Some(3),
            "child body must stay allocated after split"
        );
        let parent = queue.organism(0).unwrap();
        assert_eq!(parent.child_size, Vec2::ZERO);
    }

    #[test]
    fn errors_never_decrease_across_a_failing_instruction() {
        let mut memory = Memory::new(5, 5);
        let mut queue = make_queue();
        place(&mut memory, 0, 0, "P"); // pop on an empty stack
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 2));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 2), None, &mut queue);

        queue.cycle_all(&mut memory);
        assert_eq!(queue.organism(0).unwrap().errors, 1);
    }

    #[test]
    fn find_template_with_no_template_symbols_is_an_error() {
        let mut memory = Memory::new(10, 10);
        let mut queue = make_queue();
        place(&mut memory, 0, 0, "&aabbb");
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 6));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 6), None, &mut queue);

        queue.cycle_all(&mut memory);
        assert_eq!(queue.organism(0).unwrap().errors, 1);
    }
}
