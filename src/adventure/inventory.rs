//! Inventory ledger: the set of items the player owns.
//!
//! Stored as a `Vec` so display order is insertion order; there is no
//! removal, items are never consumed.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventoryLedger {
    items: Vec<String>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Add an item. Returns true if it was not already owned.
    pub fn add(&mut self, item: &str) -> bool {
        if self.has(item) {
            return false;
        }
        self.items.push(item.to_string());
        true
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.items.clone()
    }

    /// Replace the contents with a saved snapshot. Duplicates collapse to
    /// their first occurrence.
    pub fn restore<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.items.clear();
        for item in items {
            self.add(item.as_ref());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut ledger = InventoryLedger::new();
        assert!(ledger.add("古籍"));
        assert!(!ledger.add("古籍"));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has("古籍"));
    }

    #[test]
    fn snapshot_keeps_insertion_order() {
        let mut ledger = InventoryLedger::new();
        ledger.add("符文钥匙");
        ledger.add("古籍");
        ledger.add("通行证");
        assert_eq!(ledger.snapshot(), vec!["符文钥匙", "古籍", "通行证"]);
    }

    #[test]
    fn restore_replaces_contents() {
        let mut ledger = InventoryLedger::new();
        ledger.add("金币");
        ledger.restore(["古籍", "宝石", "古籍"]);
        assert!(!ledger.has("金币"));
        assert_eq!(ledger.snapshot(), vec!["古籍", "宝石"]);
    }

    #[test]
    fn empty_ledger() {
        let ledger = InventoryLedger::new();
        assert!(ledger.is_empty());
        assert!(!ledger.has(""));
        assert_eq!(ledger.iter().count(), 0);
    }
}
