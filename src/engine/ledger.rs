use crate::domain::LedgerEntry;

/// Append-only record of executed trades, in execution order.
///
/// There is no way to edit or remove an entry once appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LedgerEntry) -> &LedgerEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the full ledger as a JSON array, the payload sealed into the chain.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.entries)
    }
}
