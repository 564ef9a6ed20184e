//! Processor timeline (C2): the per-PE ordered list of committed slots.
//!
//! A timeline's only job is to keep its slots sorted by `(end, start)` and
//! non-overlapping; every other component treats it as read-mostly and
//! appends through [`ProcessorTimeline::insert`].
use serde_derive::{Deserialize, Serialize};

/// An immutable, already-placed unit of work. Once constructed a slot never
/// moves or is removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub task: i32,
    pub start: f64,
    pub end: f64,
    pub proc: usize,
    pub wf_id: usize,
}

impl Slot {
    pub fn new(task: i32, start: f64, end: f64, proc: usize, wf_id: usize) -> Self {
        Self {
            task,
            start,
            end,
            proc,
            wf_id,
        }
    }
}

/// The ordered, non-overlapping sequence of slots committed to one PE.
#[derive(Debug, Clone, Default)]
pub struct ProcessorTimeline {
    slots: Vec<Slot>,
}

impl ProcessorTimeline {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Appends `slot` and re-sorts by `(end, start)`. The source's
    /// full-resort-on-every-insert policy is kept (§4.5): per-PE timelines
    /// are short enough that an ordered-insert optimisation isn't worth the
    /// complexity here.
    pub fn insert(&mut self, slot: Slot) {
        self.slots.push(slot);
        self.slots
            .sort_by(|a, b| (a.end, a.start).partial_cmp(&(b.end, b.start)).unwrap());
    }

    pub fn iterate(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn last(&self) -> Option<&Slot> {
        self.slots.last()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Checks the non-overlap invariant over adjacent slots, returning the
    /// offending pair if it is violated.
    pub fn check_non_overlap(&self) -> Option<(Slot, Slot)> {
        self.slots
            .windows(2)
            .find(|pair| pair[0].end > pair[1].start)
            .map(|pair| (pair[0], pair[1]))
    }
}
