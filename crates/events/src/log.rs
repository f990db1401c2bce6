use serde::{Deserialize, Serialize};

/// One entry of an [`AuditLog`] with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Sequenced<T> {
    /// 1-based, strictly increasing position.
    sequence_number: u64,
    entry: T,
}

/// In-memory append-only log.
///
/// Entries can be appended and read; there is no way to edit or remove one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog<T> {
    entries: Vec<Sequenced<T>>,
}

impl<T> Default for AuditLog<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> AuditLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its sequence number.
    pub fn append(&mut self, entry: T) -> u64 {
        let sequence_number = self.last_sequence() + 1;
        self.entries.push(Sequenced { sequence_number, entry });
        sequence_number
    }

    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence_number).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.last().map(|e| &e.entry)
    }

    /// Iterate entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_start_at_one_and_increase() {
        let mut log = AuditLog::new();
        assert_eq!(log.append("a"), 1);
        assert_eq!(log.append("b"), 2);
        assert_eq!(log.last_sequence(), 2);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn sequence_continues_after_restored_entries() {
        let mut log = AuditLog::new();
        for entry in [10, 20] {
            log.append(entry);
        }
        assert_eq!(log.append(30), 3);
        assert_eq!(log.last(), Some(&30));
    }
}
