// Label mapping — disease name to class index
//
// The mapping table is keyed by the configured class count:
//
//   2: ASD 0, non-ASD 1
//   3: ASD 0, DHS 1, LCS_HipOA 2
//   4: ASD 0, DHS 1, LCS_HipOA 2, normal 3
//
// Any other class count is a configuration error, raised at construction
// rather than per lookup.  The map is a plain value handed to the collator
// explicitly — it is never consulted through a global.

use gaitwalk_core::{Error, Result};
use tracing::warn;

/// Fallback key for the binary table when a disease is not listed.
const BINARY_FALLBACK: &str = "non-ASD";

/// Immutable disease-to-class mapping for a configured class count.
#[derive(Debug, Clone)]
pub struct LabelMap {
    class_count: usize,
    entries: Vec<(&'static str, i64)>,
}

impl LabelMap {
    /// Build the mapping table for `class_count`.
    ///
    /// Fails with [`Error::UnsupportedClassCount`] for anything outside
    /// {2, 3, 4}.
    pub fn new(class_count: usize) -> Result<Self> {
        let entries: Vec<(&'static str, i64)> = match class_count {
            2 => vec![("ASD", 0), (BINARY_FALLBACK, 1)],
            3 => vec![("ASD", 0), ("DHS", 1), ("LCS_HipOA", 2)],
            4 => vec![("ASD", 0), ("DHS", 1), ("LCS_HipOA", 2), ("normal", 3)],
            got => return Err(Error::UnsupportedClassCount { got }),
        };
        Ok(LabelMap {
            class_count,
            entries,
        })
    }

    /// The configured number of classes.
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Disease names in this table, in label order.
    pub fn diseases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(d, _)| *d)
    }

    /// Map a disease string to its class index.
    ///
    /// A disease absent from the binary (2-class) table falls back to the
    /// `non-ASD` entry, matching the labelling convention of the binary
    /// experiments.  The 3- and 4-class tables have no such catch-all, so
    /// an absent disease fails with [`Error::UnknownDisease`] instead of
    /// assuming a key that does not exist.
    pub fn map(&self, disease: &str) -> Result<i64> {
        if let Some((_, label)) = self.entries.iter().find(|(d, _)| *d == disease) {
            return Ok(*label);
        }
        if self.class_count == 2 {
            warn!(disease, "disease not in binary table, mapping to non-ASD");
            // BINARY_FALLBACK is always entry 1 of the binary table.
            return Ok(self.entries[1].1);
        }
        Err(Error::UnknownDisease {
            disease: disease.to_string(),
            class_count: self.class_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn tables_are_bijections() {
        for class_count in [2usize, 3, 4] {
            let map = LabelMap::new(class_count).unwrap();
            let labels: BTreeSet<i64> = map
                .diseases()
                .map(|d| map.map(d).unwrap())
                .collect();
            let expected: BTreeSet<i64> = (0..class_count as i64).collect();
            assert_eq!(labels, expected, "class_count={class_count}");
        }
    }

    #[test]
    fn known_diseases() {
        let map = LabelMap::new(3).unwrap();
        assert_eq!(map.map("ASD").unwrap(), 0);
        assert_eq!(map.map("DHS").unwrap(), 1);
        assert_eq!(map.map("LCS_HipOA").unwrap(), 2);
    }

    #[test]
    fn binary_fallback() {
        let map = LabelMap::new(2).unwrap();
        assert_eq!(map.map("DHS").unwrap(), 1); // falls back to non-ASD
        assert_eq!(map.map("ASD").unwrap(), 0);
    }

    #[test]
    fn unknown_disease_is_an_error_for_3_and_4() {
        for class_count in [3usize, 4] {
            let map = LabelMap::new(class_count).unwrap();
            let err = map.map("mystery").unwrap_err();
            assert!(matches!(err, Error::UnknownDisease { .. }));
        }
    }

    #[test]
    fn unsupported_class_count_fails_at_construction() {
        for bad in [0usize, 1, 5, 10] {
            assert!(matches!(
                LabelMap::new(bad),
                Err(Error::UnsupportedClassCount { got }) if got == bad
            ));
        }
    }
}
