//! Value types for the census domain.
//!
//! Board snapshots ([`Project`], [`Column`], [`Card`], [`Label`]) are immutable
//! values taken from the tracker for the lifetime of one run. [`FrequencyTable`]
//! is the result; [`RunWarning`] and [`CensusReport`] carry it back to the caller.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    CardId, ColumnId, EngineeringFunction, LabelId, LabelName, ProjectId, RunId, TrackerError,
};

// ---------------------------------------------------------------------------
// Board snapshot
// ---------------------------------------------------------------------------

/// A project board in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Tracker-assigned identifier.
    pub id: ProjectId,
    /// Display name of the board.
    pub name: String,
}

/// A named column on a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Tracker-assigned identifier.
    pub id: ColumnId,
    /// Display name, matched exactly against configured column names.
    pub name: String,
}

impl Column {
    /// Creates a column snapshot.
    pub fn new(id: ColumnId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A card sitting in a project column.
///
/// Note-only cards and cards wrapping unlabelled issues have no labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Tracker-assigned identifier.
    pub id: CardId,
    /// Column the card was listed from.
    pub column_id: ColumnId,
    /// Names of the labels attached to the card's issue.
    pub labels: Vec<LabelName>,
    /// URL of the linked content when the tracker could not return it. Such
    /// a card has no known labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_content: Option<String>,
}

impl Card {
    /// Creates a card snapshot.
    pub fn new(id: CardId, column_id: ColumnId, labels: Vec<LabelName>) -> Self {
        Self {
            id,
            column_id,
            labels,
            missing_content: None,
        }
    }

    /// Creates a card whose linked content at `content_url` could not be read.
    pub fn with_missing_content(
        id: CardId,
        column_id: ColumnId,
        content_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            column_id,
            labels: Vec::new(),
            missing_content: Some(content_url.into()),
        }
    }

    /// Returns `true` if the card carries a label named exactly `name`.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.as_str() == name)
    }
}

/// A repository label as returned by the tracker.
///
/// Two labels are the same entity iff their canonical names match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Tracker-assigned identifier.
    pub id: LabelId,
    /// Canonical name, exactly as the tracker spells it.
    pub name: LabelName,
}

// ---------------------------------------------------------------------------
// Frequency table
// ---------------------------------------------------------------------------

/// Counts of size labels per engineering function.
///
/// Rows are engineering functions and columns are size labels, both in the
/// order they were configured. Every configured pair has a cell, including
/// pairs that were never observed. Cells only grow while the table is being
/// built inside this crate; callers receive it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    size_labels: Vec<LabelName>,
    rows: IndexMap<EngineeringFunction, IndexMap<LabelName, u64>>,
}

impl FrequencyTable {
    /// Builds a table with every (function, size label) cell set to zero.
    pub(crate) fn zeroed(functions: &[EngineeringFunction], size_labels: &[LabelName]) -> Self {
        let row: IndexMap<LabelName, u64> =
            size_labels.iter().map(|label| (label.clone(), 0)).collect();
        let rows = functions
            .iter()
            .map(|function| (function.clone(), row.clone()))
            .collect();
        Self {
            size_labels: row.keys().cloned().collect(),
            rows,
        }
    }

    /// Adds one to a cell. Pairs outside the configured key set are ignored.
    pub(crate) fn increment(&mut self, function: &EngineeringFunction, size_label: &LabelName) {
        if let Some(cell) = self
            .rows
            .get_mut(function)
            .and_then(|row| row.get_mut(size_label))
        {
            *cell += 1;
        }
    }

    /// Returns the count for a cell, or `None` if either key is not configured.
    pub fn get(&self, function: &str, size_label: &str) -> Option<u64> {
        self.rows.get(function)?.get(size_label).copied()
    }

    /// Engineering functions, in configured order.
    pub fn functions(&self) -> impl Iterator<Item = &EngineeringFunction> {
        self.rows.keys()
    }

    /// Size labels, in configured order.
    pub fn size_labels(&self) -> &[LabelName] {
        &self.size_labels
    }

    /// Sum of every cell.
    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(|row| row.values()).sum()
    }

    /// Number of cells, i.e. functions × size labels.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// A non-fatal problem encountered during a run.
///
/// Warnings are collected in pipeline order and returned next to the table;
/// the result is still complete for everything that did succeed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// Cards of one column could not be fetched; the column contributed nothing.
    ColumnFetchFailed {
        /// The column that failed.
        column: Column,
        /// Why the fetch failed.
        error: TrackerError,
    },
    /// The content behind a card could not be read, so its labels are
    /// unknown and it was not counted.
    CardContentMissing {
        /// The column the card was listed from.
        column: Column,
        /// The card whose content is missing.
        card: CardId,
        /// The URL that could not be read.
        content_url: String,
    },
    /// A configured size label does not exist on the tracker. Its table
    /// column stays at zero.
    LabelNotFound {
        /// The configured name.
        name: LabelName,
    },
    /// A configured size label could not be looked up.
    LabelLookupFailed {
        /// The configured name.
        name: LabelName,
        /// Why the lookup failed.
        error: TrackerError,
    },
    /// The tracker resolved a configured size label to a label spelled
    /// differently. Cards are matched on the canonical spelling and counted
    /// under the configured name.
    LabelNameMismatch {
        /// The configured name.
        configured: LabelName,
        /// The tracker's canonical name.
        canonical: LabelName,
    },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnFetchFailed { column, error } => {
                write!(f, "cards of column '{}' could not be fetched: {error}", column.name)
            }
            Self::CardContentMissing {
                column,
                card,
                content_url,
            } => write!(
                f,
                "card {card} in column '{}' was not counted: {content_url} could not be read",
                column.name
            ),
            Self::LabelNotFound { name } => {
                write!(f, "size label '{name}' does not exist in the repository")
            }
            Self::LabelLookupFailed { name, error } => {
                write!(f, "size label '{name}' could not be looked up: {error}")
            }
            Self::LabelNameMismatch {
                configured,
                canonical,
            } => write!(
                f,
                "size label '{configured}' is spelled '{canonical}' in the repository"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Everything a completed run hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct CensusReport {
    /// Identifier of the run that produced this report.
    pub run_id: RunId,
    /// When the report was completed.
    pub generated_at: Timestamp,
    /// The board that was surveyed.
    pub project: Project,
    /// Number of board columns that matched the configured names.
    pub columns_matched: usize,
    /// Number of cards collected from those columns.
    pub cards_collected: usize,
    /// The size-label counts.
    pub table: FrequencyTable,
    /// Non-fatal problems, in the order they were encountered.
    pub warnings: Vec<RunWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functions(names: &[&str]) -> Vec<EngineeringFunction> {
        names
            .iter()
            .map(|n| EngineeringFunction::new(*n).unwrap())
            .collect()
    }

    fn labels(names: &[&str]) -> Vec<LabelName> {
        names.iter().map(|n| LabelName::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_zeroed_table_has_every_cell() {
        let table = FrequencyTable::zeroed(
            &functions(&["backend", "frontend"]),
            &labels(&["size:S", "size:M", "size:L"]),
        );
        assert_eq!(table.cell_count(), 6);
        assert_eq!(table.total(), 0);
        assert_eq!(table.get("frontend", "size:L"), Some(0));
        assert_eq!(table.get("frontend", "size:XL"), None);
    }

    #[test]
    fn test_increment_ignores_unknown_keys() {
        let fns = functions(&["backend"]);
        let sizes = labels(&["size:S"]);
        let mut table = FrequencyTable::zeroed(&fns, &sizes);

        table.increment(&fns[0], &sizes[0]);
        table.increment(&fns[0], &LabelName::new("size:XL").unwrap());
        table.increment(&EngineeringFunction::new("qa").unwrap(), &sizes[0]);

        assert_eq!(table.get("backend", "size:S"), Some(1));
        assert_eq!(table.total(), 1);
        assert_eq!(table.cell_count(), 1);
    }

    #[test]
    fn test_keys_keep_configured_order() {
        let table = FrequencyTable::zeroed(
            &functions(&["qa", "backend"]),
            &labels(&["size:L", "size:S"]),
        );
        let fns: Vec<_> = table.functions().map(|f| f.as_str()).collect();
        let sizes: Vec<_> = table.size_labels().iter().map(|l| l.as_str()).collect();
        assert_eq!(fns, ["qa", "backend"]);
        assert_eq!(sizes, ["size:L", "size:S"]);
    }

    #[test]
    fn test_size_labels_survive_without_functions() {
        let table = FrequencyTable::zeroed(&[], &labels(&["size:S"]));
        assert_eq!(table.cell_count(), 0);
        assert_eq!(table.size_labels().len(), 1);
    }

    #[test]
    fn test_table_serialises_as_nested_map() {
        let fns = functions(&["backend"]);
        let sizes = labels(&["size:M"]);
        let mut table = FrequencyTable::zeroed(&fns, &sizes);
        table.increment(&fns[0], &sizes[0]);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({ "backend": { "size:M": 1 } }));
    }

    #[test]
    fn test_card_with_missing_content_has_no_labels() {
        let card = Card::with_missing_content(
            CardId::new(7),
            ColumnId::new(2),
            "https://api.github.com/repos/acme/private/issues/3",
        );
        assert!(card.labels.is_empty());
        assert_eq!(
            card.missing_content.as_deref(),
            Some("https://api.github.com/repos/acme/private/issues/3")
        );
        assert!(Card::new(CardId::new(8), ColumnId::new(2), Vec::new())
            .missing_content
            .is_none());
    }

    #[test]
    fn test_card_label_match_is_case_sensitive() {
        let card = Card::new(CardId::new(1), ColumnId::new(2), labels(&["Size:M"]));
        assert!(card.has_label("Size:M"));
        assert!(!card.has_label("size:M"));
    }
}
