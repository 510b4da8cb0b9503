//! Reorderings of a plan that keep its prerequisite order intact.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::prereq::{Move, PrereqGraph};

/// How a move travels through the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Neighborhood {
    /// Shift a single move; stop at the first prerequisite (or dependent) in
    /// the way.
    #[default]
    SingleStep,
    /// Shift a block; prerequisites (or dependents) in the way join the block.
    Block,
}

impl Neighborhood {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleStep => "single",
            Self::Block => "block",
        }
    }

    /// Lazily enumerate the neighbors of `seq`. The first move stays put.
    #[must_use]
    pub fn neighbors<'a>(self, seq: &'a [Move], graph: &'a PrereqGraph) -> Neighbors<'a> {
        Neighbors::new(seq, graph, self == Self::Block)
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Neighborhood {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::SingleStep),
            "block" => Ok(Self::Block),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Advance,
    Postpone,
}

/// Iterator over neighbor plans, each yielded as an owned sequence.
///
/// For every position after the first, the move there is walked earlier one
/// slot at a time, yielding each intermediate plan, then walked later from
/// the original plan the same way.
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    seq: &'a [Move],
    graph: &'a PrereqGraph,
    absorb: bool,
    index: usize,
    cursor: usize,
    phase: Phase,
    work: Vec<Move>,
    block: Vec<Move>,
    block_needs: HashSet<Move>,
}

impl<'a> Neighbors<'a> {
    #[must_use]
    pub fn new(seq: &'a [Move], graph: &'a PrereqGraph, absorb: bool) -> Self {
        Self {
            seq,
            graph,
            absorb,
            index: 1,
            cursor: 0,
            phase: Phase::Start,
            work: Vec::new(),
            block: Vec::new(),
            block_needs: HashSet::new(),
        }
    }

    fn reset_block(&mut self) {
        self.work.clear();
        self.work.extend_from_slice(self.seq);
        self.block.clear();
        self.block.push(self.seq[self.index]);
    }

    /// One slot earlier. `None` ends the advance walk.
    fn step_earlier(&mut self) -> Option<Option<Vec<Move>>> {
        if self.cursor < 1 {
            return None;
        }
        let iprev = self.cursor;
        let prev = self.work[iprev];
        self.cursor -= 1;
        if self.block_needs.contains(&prev) {
            if !self.absorb {
                return None;
            }
            self.block.insert(0, prev);
            self.block_needs
                .extend(self.graph.prerequisites(&prev).iter().copied());
            return Some(None);
        }
        let len = self.block.len();
        self.work[iprev + len] = prev;
        self.work[iprev..iprev + len].copy_from_slice(&self.block);
        Some(Some(self.work.clone()))
    }

    /// One slot later. `None` ends the postpone walk.
    fn step_later(&mut self) -> Option<Option<Vec<Move>>> {
        if self.cursor >= self.seq.len() {
            return None;
        }
        let inext = self.cursor;
        let next = self.work[inext];
        self.cursor += 1;
        if self.block.iter().any(|b| self.graph.requires(&next, b)) {
            if !self.absorb {
                return None;
            }
            self.block.push(next);
            return Some(None);
        }
        let len = self.block.len();
        self.work[inext - len] = next;
        self.work[inext + 1 - len..=inext].copy_from_slice(&self.block);
        Some(Some(self.work.clone()))
    }
}

impl Iterator for Neighbors<'_> {
    type Item = Vec<Move>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.index >= self.seq.len() {
                return None;
            }
            match self.phase {
                Phase::Start => {
                    self.reset_block();
                    self.block_needs.clear();
                    self.block_needs
                        .extend(self.graph.prerequisites(&self.seq[self.index]).iter().copied());
                    self.cursor = self.index - 1;
                    self.phase = Phase::Advance;
                }
                Phase::Advance => match self.step_earlier() {
                    Some(Some(found)) => return Some(found),
                    Some(None) => {}
                    None => {
                        self.reset_block();
                        self.cursor = self.index + 1;
                        self.phase = Phase::Postpone;
                    }
                },
                Phase::Postpone => match self.step_later() {
                    Some(Some(found)) => return Some(found),
                    Some(None) => {}
                    None => {
                        self.index += 1;
                        self.phase = Phase::Start;
                    }
                },
            }
        }
    }
}
