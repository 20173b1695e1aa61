//! Server event log, newest first

use serde_json::Value;
use std::collections::VecDeque;

/// Ordered log of payloads received on the data channel.
///
/// New entries go to the front, so `snapshot()` yields the most recent
/// event first.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<Value>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, event: Value) {
        self.entries.push_front(event);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new();
        log.prepend(json!({"type": "m1"}));
        log.prepend(json!({"type": "m2"}));
        log.prepend(json!({"type": "m3"}));

        assert_eq!(
            log.snapshot(),
            vec![json!({"type": "m3"}), json!({"type": "m2"}), json!({"type": "m1"})]
        );
    }

    #[test]
    fn test_clear() {
        let mut log = EventLog::new();
        log.prepend(json!({"type": "x"}));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.snapshot(), Vec::<Value>::new());
    }
}
