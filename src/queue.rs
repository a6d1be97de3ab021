use crate::config::QueueConfig;
use crate::memory::Memory;
use crate::organism::Organism;
use std::collections::HashSet;

/// The ordered collection of living organisms, plus the cursor an external
/// observer uses to inspect one of them at a time.
///
/// `Queue` owns every `Organism` outright; organisms never hold a reference
/// back to their queue. `Organism::cycle` instead receives `&mut Queue` as
/// a plain parameter, which is how new organisms get appended during
/// `split_child` without Queue and Organism needing to know about each
/// other's lifetime.
#[derive(Debug, Clone)]
pub struct Queue {
    organisms: Vec<Organism>,
    selected_id: Option<u64>,
    next_id: u64,
    pub(crate) config: QueueConfig,
}

impl Queue {
    pub fn new(config: QueueConfig) -> Self {
        Queue {
            organisms: Vec::new(),
            selected_id: None,
            next_id: 0,
            config,
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    /// Rebuild a `Queue` from decoded snapshot parts. Used only by
    /// `Engine::load`, which discards the result on any decode error before
    /// this is ever called.
    pub(crate) fn from_parts(
        config: QueueConfig,
        organisms: Vec<Organism>,
        next_id: u64,
        selected_index: Option<usize>,
    ) -> Self {
        let selected_id = selected_index.and_then(|i| organisms.get(i)).map(|o| o.id);
        let mut queue = Queue {
            organisms,
            selected_id,
            next_id,
            config,
        };
        queue.resync_is_selected();
        queue
    }

    pub(crate) fn next_id_counter(&self) -> u64 {
        self.next_id
    }

    pub(crate) fn next_organism_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an organism. The first organism ever added (or the first one
    /// added after the selection has become dangling) becomes selected.
    pub(crate) fn add(&mut self, mut organism: Organism) {
        if self.selected_id.is_none() {
            self.selected_id = Some(organism.id);
            organism.is_selected = true;
        }
        self.organisms.push(organism);
    }

    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn organism(&self, index: usize) -> Option<&Organism> {
        self.organisms.get(index)
    }

    pub fn organism_mut(&mut self, index: usize) -> Option<&mut Organism> {
        self.organisms.get_mut(index)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id?;
        self.organisms.iter().position(|o| o.id == id)
    }

    /// The currently selected organism, falling back to the first organism
    /// in the queue if the selection is unset or has since died.
    pub fn get_selected(&self) -> Option<&Organism> {
        self.selected_index()
            .and_then(|i| self.organisms.get(i))
            .or_else(|| self.organisms.first())
    }

    pub fn select_next(&mut self) {
        self.shift_selection(1);
    }

    pub fn select_previous(&mut self) {
        self.shift_selection(-1);
    }

    fn shift_selection(&mut self, step: i64) {
        let n = self.organisms.len();
        if n == 0 {
            self.selected_id = None;
            return;
        }
        let current = self.selected_index().unwrap_or(0);
        if let Some(org) = self.organisms.get_mut(current) {
            org.is_selected = false;
        }
        let next = (current as i64 + step).rem_euclid(n as i64) as usize;
        self.selected_id = Some(self.organisms[next].id);
        self.organisms[next].is_selected = true;
    }

    /// Advance every currently-living organism by exactly one instruction.
    ///
    /// Organisms are processed from a snapshot of the queue taken at the
    /// start of the tick: any organism born mid-tick (via `split_child`)
    /// is appended to `self.organisms` by `Organism::spawn`, which this
    /// function leaves alone until the snapshot has finished processing, so
    /// a newborn never executes on the same tick it was created. Organisms
    /// that died during the tick are dropped.
    pub fn cycle_all(&mut self, memory: &mut Memory) {
        let snapshot = std::mem::take(&mut self.organisms);
        let mut survivors = Vec::with_capacity(snapshot.len());
        for mut organism in snapshot {
            organism.cycle(memory, self);
            if !organism.dead {
                survivors.push(organism);
            }
        }
        let newborns = std::mem::take(&mut self.organisms);
        survivors.extend(newborns);
        self.organisms = survivors;
        self.fix_up_selection();
    }

    /// Population-pressure cull: remove the `ratio` fraction of organisms
    /// with the highest error counts, deallocating their body and any live
    /// child region.
    pub fn kill_worst(&mut self, ratio: f64, memory: &mut Memory) {
        let n = self.organisms.len();
        if n == 0 {
            return;
        }
        let kill_count = ((n as f64) * ratio).floor() as usize;
        if kill_count == 0 {
            return;
        }

        let mut by_errors: Vec<usize> = (0..n).collect();
        by_errors.sort_by(|&a, &b| self.organisms[b].errors.cmp(&self.organisms[a].errors));
        let to_kill: HashSet<usize> = by_errors.into_iter().take(kill_count).collect();

        let mut kept = Vec::with_capacity(n - kill_count);
        for (i, organism) in std::mem::take(&mut self.organisms).into_iter().enumerate() {
            if to_kill.contains(&i) {
                memory.deallocate(organism.start, organism.size);
                if !organism.child_size.is_zero() {
                    memory.deallocate(organism.child_start, organism.child_size);
                }
            } else {
                kept.push(organism);
            }
        }
        self.organisms = kept;
        self.fix_up_selection();
    }

    fn fix_up_selection(&mut self) {
        let still_valid = self
            .selected_id
            .is_some_and(|id| self.organisms.iter().any(|o| o.id == id));
        if !still_valid {
            self.selected_id = self.organisms.first().map(|o| o.id);
        }
        self.resync_is_selected();
    }

    /// Re-derive every organism's `is_selected` flag from `selected_id`.
    /// UI-only bookkeeping; has no effect on simulation semantics.
    fn resync_is_selected(&mut self) {
        for organism in self.organisms.iter_mut() {
            organism.is_selected = Some(organism.id) == self.selected_id;
        }
    }

    /// UI-only hook: re-read selected/derived display state after a step.
    /// The core has nothing to do here — observers call this so the same
    /// call site works whether or not a UI is attached.
    pub fn update_all(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::memory::Memory;
    use crate::vec2::Vec2;

    fn config() -> QueueConfig {
        EngineConfig::default().into()
    }

    #[test]
    fn first_organism_added_is_selected() {
        let mut memory = Memory::new(10, 10);
        let mut queue = Queue::new(config());
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 1));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 1), None, &mut queue);
        assert_eq!(queue.selected_index(), Some(0));
        assert!(queue.organism(0).unwrap().is_selected);
    }

    #[test]
    fn is_selected_flag_follows_the_cursor() {
        let mut queue = Queue::new(config());
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 1), None, &mut queue);
        Organism::spawn(Vec2::new(1, 0), Vec2::new(1, 1), None, &mut queue);
        assert!(queue.organism(0).unwrap().is_selected);
        assert!(!queue.organism(1).unwrap().is_selected);

        queue.select_next();
        assert!(!queue.organism(0).unwrap().is_selected);
        assert!(queue.organism(1).unwrap().is_selected);
    }

    #[test]
    fn select_next_wraps_around() {
        let mut queue = Queue::new(config());
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 1), None, &mut queue);
        Organism::spawn(Vec2::new(1, 0), Vec2::new(1, 1), None, &mut queue);
        assert_eq!(queue.selected_index(), Some(0));
        queue.select_next();
        assert_eq!(queue.selected_index(), Some(1));
        queue.select_next();
        assert_eq!(queue.selected_index(), Some(0));
        queue.select_previous();
        assert_eq!(queue.selected_index(), Some(1));
    }

    #[test]
    fn newborn_does_not_execute_on_its_birth_tick() {
        let mut memory = Memory::new(20, 20);
        let mut queue = Queue::new(config());
        for (i, c) in "@ab$".chars().enumerate() {
            memory.set_cell(Vec2::new(0, i as i64), c);
        }
        memory.allocate(Vec2::new(0, 0), Vec2::new(1, 4));
        Organism::spawn(Vec2::new(0, 0), Vec2::new(1, 4), None, &mut queue);
        queue.organism_mut(0).unwrap().regs.a = Vec2::new(1, 3);

        queue.cycle_all(&mut memory); // '@'
        queue.cycle_all(&mut memory); // 'a'
        queue.cycle_all(&mut memory); // 'b'
        assert_eq!(queue.len(), 1);

        queue.cycle_all(&mut memory); // '$' -- spawns the child
        assert_eq!(queue.len(), 2);
        let child_ip_before = queue.organism(1).unwrap().ip;

        queue.cycle_all(&mut memory);
        // The parent's next instruction is out of its body; the child's
        // first real tick should have moved its own ip by exactly one step.
        let child = queue.organism(1).unwrap();
        assert_ne!(child.ip, child_ip_before);
    }

    #[test]
    fn kill_worst_removes_highest_error_organisms() {
        let mut memory = Memory::new(10, 10);
        let mut queue = Queue::new(config());
        for i in 0..4 {
            memory.allocate(Vec2::new(i, 0), Vec2::new(1, 1));
            Organism::spawn(Vec2::new(i, 0), Vec2::new(1, 1), None, &mut queue);
        }
        queue.organism_mut(0).unwrap().errors = 10;
        queue.organism_mut(1).unwrap().errors = 5;
        queue.organism_mut(2).unwrap().errors = 1;
        queue.organism_mut(3).unwrap().errors = 0;

        queue.kill_worst(0.5, &mut memory);

        assert_eq!(queue.len(), 2);
        assert!(queue.organisms().iter().all(|o| o.errors <= 1));
    }
}
