//! Timeline of scheduled steps.
//!
//! Production cycles, transfer sessions and placement settles are all
//! repeating or one-shot tasks. A task runs to completion when it is popped
//! and the system that ran it reschedules it if it wants another turn. Tasks
//! due at the same instant run in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use hecs::Entity;
use stockpile_logic::cancel::CancelToken;
use stockpile_logic::resources::PlacementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// One production pass of a building
    Cycle(Entity),
    /// One step of an actor's transfer session
    Session(Entity),
    /// Release the transit lock of a placement
    Settle(PlacementId),
}

#[derive(Debug, Clone)]
pub struct Scheduled {
    pub due: u64,
    pub task: Task,
    pub token: CancelToken,
}

#[derive(Debug, Default)]
pub struct Timeline {
    frontier: BinaryHeap<Reverse<(u64, u64)>>,
    tasks: HashMap<u64, Scheduled>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run at `due` unless `token` is cancelled first.
    pub fn schedule(&mut self, due: u64, task: Task, token: CancelToken) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(Reverse((due, seq)));
        self.tasks.insert(seq, Scheduled { due, task, token });
    }

    /// Next live task due at or before `now`. Cancelled tasks are dropped on the way.
    pub fn pop_due(&mut self, now: u64) -> Option<Scheduled> {
        while let Some(Reverse((due, seq))) = self.frontier.peek().copied() {
            if due > now {
                return None;
            }
            self.frontier.pop();
            let Some(scheduled) = self.tasks.remove(&seq) else {
                continue;
            };
            if scheduled.token.is_cancelled() {
                continue;
            }
            return Some(scheduled);
        }
        None
    }

    /// Due time of the earliest queued task, cancelled or not.
    pub fn next_due(&self) -> Option<u64> {
        self.frontier.peek().map(|Reverse((due, _))| *due)
    }

    /// Queued tasks whose token is still live
    pub fn live_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|s| !s.token.is_cancelled())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
