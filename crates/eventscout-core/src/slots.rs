//! One in-flight request per feature slot.
//!
//! Each user action (load feed, expand an event, explore venues, chat)
//! runs as a background task tagged with its slot. Starting a new task for
//! an occupied slot aborts the previous one, and results from superseded
//! tasks are discarded when collected, so only the latest request for a
//! slot ever reaches application state.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Buffer size for the result channel.
/// At most one live task per slot, so a handful of slots never fills it.
const CHANNEL_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Feed,
    Details,
    Venues,
    Chat,
}

struct Finished<T> {
    slot: Slot,
    generation: u64,
    value: T,
}

struct Active {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct RequestSlots<T> {
    tx: mpsc::Sender<Finished<T>>,
    rx: mpsc::Receiver<Finished<T>>,
    active: HashMap<Slot, Active>,
    next_generation: u64,
}

impl<T: Send + 'static> Default for RequestSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> RequestSlots<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            tx,
            rx,
            active: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Run `task` for `slot`, superseding whatever was running there.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, slot: Slot, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        if let Some(previous) = self.active.remove(&slot) {
            debug!(?slot, generation = previous.generation, "Superseding in-flight request");
            previous.handle.abort();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let value = task.await;
            // Receiver lives as long as RequestSlots; a send error means it was dropped
            let _ = tx.send(Finished { slot, generation, value }).await;
        });

        self.active.insert(slot, Active { generation, handle });
    }

    pub fn is_pending(&self, slot: Slot) -> bool {
        self.active.contains_key(&slot)
    }

    pub fn has_pending(&self) -> bool {
        !self.active.is_empty()
    }

    /// Abort the task for `slot`, if any. Its result will never be delivered.
    pub fn cancel(&mut self, slot: Slot) {
        if let Some(previous) = self.active.remove(&slot) {
            previous.handle.abort();
        }
    }

    /// Accept a finished task only if it is still the current one for its slot.
    fn accept(&mut self, finished: Finished<T>) -> Option<(Slot, T)> {
        match self.active.get(&finished.slot) {
            Some(active) if active.generation == finished.generation => {
                self.active.remove(&finished.slot);
                Some((finished.slot, finished.value))
            }
            _ => {
                debug!(slot = ?finished.slot, generation = finished.generation, "Dropping superseded result");
                None
            }
        }
    }

    /// Collect every result that is ready right now, without waiting.
    pub fn try_collect(&mut self) -> Vec<(Slot, T)> {
        let mut results = Vec::new();
        while let Ok(finished) = self.rx.try_recv() {
            if let Some(result) = self.accept(finished) {
                results.push(result);
            }
        }
        results
    }

    /// Wait for the next current result. Returns `None` once no task is pending.
    pub async fn next(&mut self) -> Option<(Slot, T)> {
        while self.has_pending() {
            let finished = self.rx.recv().await?;
            if let Some(result) = self.accept(finished) {
                return Some(result);
            }
        }
        None
    }
}

impl<T> Drop for RequestSlots<T> {
    fn drop(&mut self) {
        for active in self.active.values() {
            active.handle.abort();
        }
    }
}
