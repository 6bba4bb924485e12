//! Column selection.

use crate::Column;

/// Returns the columns whose name equals one of `configured_names`.
///
/// Matching is exact and case-sensitive. The result keeps the board order of
/// `all_columns`; a board column that appears twice and matches is returned
/// twice. Configured names that match nothing are ignored.
pub fn filter_columns<S: AsRef<str>>(configured_names: &[S], all_columns: &[Column]) -> Vec<Column> {
    all_columns
        .iter()
        .filter(|column| {
            configured_names
                .iter()
                .any(|name| name.as_ref() == column.name)
        })
        .cloned()
        .collect()
}
