// In-flight request table.
//
// One entry per outstanding key. An entry holds the generation of the task
// that owns it, the waiters to deliver to (in subscription order), and an
// abort handle for that task. Completion only clears an entry whose
// generation still matches, so a superseded task can never deliver.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::fault::Fault;
use crate::operation::InFlightKey;
use crate::payload::Payload;

/// What a waiter eventually receives.
pub type Delivery = Result<Payload, Fault>;

pub type Waiter = oneshot::Sender<Delivery>;

#[derive(Debug)]
struct Entry {
    generation: u64,
    waiters: Vec<Waiter>,
    task: Option<AbortHandle>,
}

/// Waiters and task of an entry that was removed without completing.
#[derive(Debug)]
pub struct Evicted {
    waiters: Vec<Waiter>,
    task: Option<AbortHandle>,
}

impl Evicted {
    /// Abort the owning task and hand every waiter a `Cancelled` fault.
    /// Returns how many waiters were still listening.
    pub fn cancel(self) -> usize {
        if let Some(task) = self.task {
            task.abort();
        }
        self.waiters
            .into_iter()
            .map(|waiter| waiter.send(Err(Fault::cancelled())).is_ok())
            .filter(|sent| *sent)
            .count()
    }
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    entries: HashMap<InFlightKey, Entry>,
    next_generation: u64,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `waiter` to the pending entry for `key`. Hands the waiter back
    /// when nothing is pending.
    pub fn join(&mut self, key: &InFlightKey, waiter: Waiter) -> Result<u64, Waiter> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.waiters.push(waiter);
                Ok(entry.generation)
            }
            None => Err(waiter),
        }
    }

    /// Install a fresh entry for `key` owned by a new generation. Any entry
    /// already there is evicted and returned to the caller.
    pub fn replace(&mut self, key: InFlightKey, waiter: Waiter) -> (u64, Option<Evicted>) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let previous = self.entries.insert(
            key,
            Entry { generation, waiters: vec![waiter], task: None },
        );
        let evicted = previous.map(|entry| Evicted { waiters: entry.waiters, task: entry.task });
        (generation, evicted)
    }

    /// Record the task driving `generation`. Ignored if the entry has since
    /// completed or been replaced.
    pub fn attach_task(&mut self, key: &InFlightKey, generation: u64, task: AbortHandle) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.generation == generation {
                entry.task = Some(task);
            }
        }
    }

    /// Remove the entry for `key` if `generation` still owns it and return
    /// its waiters in subscription order. `None` means the result is stale.
    pub fn complete(&mut self, key: &InFlightKey, generation: u64) -> Option<Vec<Waiter>> {
        match self.entries.get(key) {
            Some(entry) if entry.generation == generation => {
                self.entries.remove(key).map(|entry| entry.waiters)
            }
            _ => None,
        }
    }

    /// Remove every entry.
    pub fn drain(&mut self) -> Vec<Evicted> {
        self.entries
            .drain()
            .map(|(_, entry)| Evicted { waiters: entry.waiters, task: entry.task })
            .collect()
    }

    pub fn contains(&self, key: &InFlightKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn waiter_count(&self, key: &InFlightKey) -> usize {
        self.entries.get(key).map_or(0, |entry| entry.waiters.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
