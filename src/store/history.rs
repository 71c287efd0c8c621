use std::collections::{HashSet, VecDeque};

/// Record of item keys already published.
pub trait History {
    fn seen(&self, key: &str) -> bool;
    fn record(&mut self, key: String);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory history, optionally capped with oldest-first eviction.
///
/// Without a limit it grows for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    keys: HashSet<String>,
    order: VecDeque<String>,
    limit: Option<usize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

impl History for MemoryHistory {
    fn seen(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn record(&mut self, key: String) {
        let Some(limit) = self.limit else {
            self.keys.insert(key);
            return;
        };

        if limit == 0 || !self.keys.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > limit {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_seen() {
        let mut history = MemoryHistory::new();
        assert!(history.is_empty());
        assert!(!history.seen("a"));

        history.record("a".into());
        history.record("a".into());
        assert!(history.seen("a"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut history = MemoryHistory::new();
        for i in 0..10_000 {
            history.record(i.to_string());
        }
        assert_eq!(history.len(), 10_000);
        assert!(history.seen("0"));
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = MemoryHistory::with_limit(Some(2));
        history.record("a".into());
        history.record("b".into());
        history.record("c".into());

        assert!(!history.seen("a"));
        assert!(history.seen("b"));
        assert!(history.seen("c"));
        assert_eq!(history.len(), 2);
    }
}
