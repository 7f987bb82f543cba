//! Label frequency tables, most frequent first. Ties keep first-seen order.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub label: String,
    pub count: usize,
}

/// Label counts ordered by descending count. Ties keep first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries: Vec<FrequencyEntry> = Vec::new();
        for label in labels {
            match entries.iter_mut().find(|entry| entry.label == label) {
                Some(entry) => entry.count += 1,
                None => entries.push(FrequencyEntry {
                    label: label.to_string(),
                    count: 1,
                }),
            }
        }
        // Stable sort keeps insertion order among equal counts.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Self { entries }
    }

    /// Most frequent label; the first seen wins a tie.
    pub fn dominant(&self) -> Option<&FrequencyEntry> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn count_of(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_keep_first_seen_order() {
        let table = FrequencyTable::from_labels(["seated", "standing-erect", "standing-erect", "seated", "unknown"]);
        assert_eq!(table.dominant().unwrap().label, "seated");
        assert_eq!(table.count_of("standing-erect"), 2);
        assert_eq!(table.count_of("crouched-or-lying"), 0);
        assert_eq!(table.total(), 5);
        assert_eq!(table.len(), 3);
        assert_eq!(table.entries()[2].label, "unknown");
    }

    #[test]
    fn empty_table_has_no_dominant() {
        let table = FrequencyTable::from_labels(std::iter::empty());
        assert!(table.is_empty());
        assert!(table.dominant().is_none());
    }
}
