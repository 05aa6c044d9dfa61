use crate::prelude::*;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Per-device repeating tasks, at most one per id.
#[derive(Debug, Default)]
pub struct TaskTable {
    tasks:      Mutex<HashMap<DeviceId, TaskEntry>>,
    generation: Mutex<u64>,
}

#[derive(Debug)]
struct TaskEntry {
    generation: u64,
    token:      CancellationToken,
}

/// Handed to a task when it is registered. Lets the task remove its own
/// entry on completion without touching a newer task for the same id.
#[derive(Debug, Clone)]
pub struct TaskClaim {
    pub id:     DeviceId,
    pub token:  CancellationToken,
    generation: u64,
}

impl TaskTable {
    /// Registers a task for `id`. `None` when one is already running.
    pub fn claim(&self, id: &str) -> Option<TaskClaim> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(id) {
            return None;
        }
        let generation = {
            let mut g = self.generation.lock();
            *g += 1;
            *g
        };
        let token = CancellationToken::new();
        tasks.insert(
            id.into(),
            TaskEntry {
                generation,
                token: token.clone(),
            },
        );
        Some(TaskClaim {
            id: id.into(),
            token,
            generation,
        })
    }

    /// Removes the entry if it still belongs to `claim`.
    pub fn release(&self, claim: &TaskClaim) {
        let mut tasks = self.tasks.lock();
        if matches!(tasks.get(&claim.id), Some(e) if e.generation == claim.generation) {
            tasks.remove(&claim.id);
        }
    }

    /// Cancels and forgets the task for `id`. Returns whether one was running.
    pub fn stop(&self, id: &str) -> bool {
        match self.tasks.lock().remove(id) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for (_, entry) in self.tasks.lock().drain() {
            entry.token.cancel();
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.tasks.lock().contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_refused() {
        let table = TaskTable::default();
        assert!(table.claim("1").is_some());
        assert!(table.claim("1").is_none());
        assert!(table.claim("2").is_some());
        assert_eq!(2, table.len());
    }

    #[test]
    fn stop_cancels_and_frees_the_slot() {
        let table = TaskTable::default();
        let claim = table.claim("1").unwrap();
        assert!(table.stop("1"));
        assert!(claim.token.is_cancelled());
        assert!(!table.stop("1"));
        assert!(table.claim("1").is_some());
    }

    #[test]
    fn stale_release_keeps_newer_task() {
        let table = TaskTable::default();
        let old = table.claim("1").unwrap();
        table.stop("1");
        let new = table.claim("1").unwrap();
        table.release(&old);
        assert!(table.is_running("1"));
        table.release(&new);
        assert!(!table.is_running("1"));
    }

    #[test]
    fn stop_all_cancels_everything() {
        let table = TaskTable::default();
        let a = table.claim("a").unwrap();
        let b = table.claim("b").unwrap();
        table.stop_all();
        assert!(a.token.is_cancelled() && b.token.is_cancelled());
        assert_eq!(0, table.len());
    }
}
