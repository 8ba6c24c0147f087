use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub raw: String,
    pub arrival: u64,
}

/// Raw command lines in arrival order. Entries are addressed by arrival index
/// so removal during a scan never shifts the ones still to be visited.
#[derive(Debug, Default)]
pub struct CommandQueue {
    entries: VecDeque<PendingCommand>,
    next_arrival: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, raw: impl Into<String>) -> u64 {
        let arrival = self.next_arrival;
        self.next_arrival = self.next_arrival.saturating_add(1);
        self.entries.push_back(PendingCommand {
            raw: raw.into(),
            arrival,
        });
        arrival
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arrival indices currently queued, oldest first.
    pub fn snapshot(&self) -> Vec<u64> {
        self.entries.iter().map(|entry| entry.arrival).collect()
    }

    pub fn get(&self, arrival: u64) -> Option<&PendingCommand> {
        self.entries.iter().find(|entry| entry.arrival == arrival)
    }

    pub fn remove(&mut self, arrival: u64) -> Option<PendingCommand> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.arrival == arrival)?;
        self.entries.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingCommand> {
        self.entries.iter()
    }
}
