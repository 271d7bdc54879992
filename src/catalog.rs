//! Grouping product records by category.
//!
//! The page lists products under category headings ("Белые вина",
//! "Красные вина", "Напитки", ...). Headings are sorted by name; products
//! under a heading stay in spreadsheet order.

use crate::records::ProductRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("record {row} has no '{field}' field")]
pub struct MissingFieldError {
    pub field: String,
    /// Zero-based index of the offending record.
    pub row: usize,
}

/// Products sharing one category value.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: String,
    pub records: Vec<ProductRecord>,
}

/// All records, grouped by category, groups in ascending category order.
///
/// Serializes as a JSON object `{category: [record, ...]}` with keys in the
/// same order, which is the shape templates iterate over.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedCatalog {
    groups: Vec<CategoryGroup>,
}

impl GroupedCatalog {
    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.category.as_str())
    }

    pub fn get(&self, category: &str) -> Option<&[ProductRecord]> {
        self.groups
            .binary_search_by(|g| g.category.as_str().cmp(category))
            .ok()
            .map(|idx| self.groups[idx].records.as_slice())
    }

    /// Total number of records across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for GroupedCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.category, &group.records)?;
        }
        map.end()
    }
}

/// Group `records` by the value of `field`.
///
/// Non-text category cells are keyed by their display text, so a numeric
/// category `5` groups under `"5"` and a missing one under `""`.
pub fn group_by_category(
    records: Vec<ProductRecord>,
    field: &str,
) -> Result<GroupedCatalog, MissingFieldError> {
    let mut by_category: BTreeMap<String, Vec<ProductRecord>> = BTreeMap::new();

    for (row, record) in records.into_iter().enumerate() {
        let category = record
            .get(field)
            .ok_or_else(|| MissingFieldError {
                field: field.to_string(),
                row,
            })?
            .to_string();
        by_category.entry(category).or_default().push(record);
    }

    let groups: Vec<CategoryGroup> = by_category
        .into_iter()
        .map(|(category, records)| CategoryGroup { category, records })
        .collect();
    tracing::debug!(categories = groups.len(), "grouped records by {field}");

    Ok(GroupedCatalog { groups })
}
