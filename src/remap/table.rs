//! The fixed H/J/K/L to arrow key table

use super::keys::KeyCode;

/// One source key and the key it becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapEntry {
    pub source: KeyCode,
    pub target: KeyCode,
}

const HJKL_ARROWS: [RemapEntry; 4] = [
    RemapEntry {
        source: KeyCode::H,
        target: KeyCode::LEFT_ARROW,
    },
    RemapEntry {
        source: KeyCode::J,
        target: KeyCode::DOWN_ARROW,
    },
    RemapEntry {
        source: KeyCode::K,
        target: KeyCode::UP_ARROW,
    },
    RemapEntry {
        source: KeyCode::L,
        target: KeyCode::RIGHT_ARROW,
    },
];

/// Immutable remap table
#[derive(Debug, Clone, Copy)]
pub struct RemapTable {
    entries: &'static [RemapEntry],
}

impl RemapTable {
    /// The H/J/K/L → ←/↓/↑/→ table
    pub fn hjkl() -> Self {
        Self {
            entries: &HJKL_ARROWS,
        }
    }

    /// Target key for `key`, if `key` is a registered source
    pub fn lookup(&self, key: KeyCode) -> Option<KeyCode> {
        self.entries
            .iter()
            .find(|entry| entry.source == key)
            .map(|entry| entry.target)
    }

    pub fn entries(&self) -> &'static [RemapEntry] {
        self.entries
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::hjkl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_registered_sources() {
        let table = RemapTable::hjkl();
        assert_eq!(table.lookup(KeyCode::H), Some(KeyCode::LEFT_ARROW));
        assert_eq!(table.lookup(KeyCode::J), Some(KeyCode::DOWN_ARROW));
        assert_eq!(table.lookup(KeyCode::K), Some(KeyCode::UP_ARROW));
        assert_eq!(table.lookup(KeyCode::L), Some(KeyCode::RIGHT_ARROW));
    }

    #[test]
    fn test_lookup_unregistered() {
        let table = RemapTable::hjkl();
        assert_eq!(table.lookup(KeyCode(0x07)), None);
        // targets are not sources
        assert_eq!(table.lookup(KeyCode::LEFT_ARROW), None);
    }

    #[test]
    fn test_sources_are_unique() {
        let table = RemapTable::hjkl();
        let sources: HashSet<_> = table.entries().iter().map(|e| e.source).collect();
        assert_eq!(sources.len(), table.entries().len());
        assert_eq!(table.entries().len(), 4);
    }
}
