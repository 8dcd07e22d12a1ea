use std::fmt;

/// One unit of scheduled work: a fund symbol and its display name
///
/// Immutable once created; the queue only ever clones or moves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    key: String,
    label: String,
}

impl WorkItem {
    /// Creates a work item, trimming surrounding whitespace
    ///
    /// Returns `None` when either the key or the label is blank.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        let label = label.into().trim().to_string();

        if key.is_empty() || label.is_empty() {
            return None;
        }

        Some(Self { key, label })
    }

    /// The unique key (fund symbol)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The display label (fund name)
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.label)
    }
}

/// A work item together with the number of fetch attempts already made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub item: WorkItem,

    /// Attempts already spent, 0 for a fresh entry
    pub attempt: u32,
}

impl QueueEntry {
    /// Creates a fresh entry at attempt 0
    pub fn new(item: WorkItem) -> Self {
        Self { item, attempt: 0 }
    }

    /// Consumes the entry and returns it with the attempt count bumped
    pub fn next_attempt(self) -> Self {
        Self {
            item: self.item,
            attempt: self.attempt + 1,
        }
    }

    pub fn key(&self) -> &str {
        self.item.key()
    }
}
