//! Folding cards into the size-label frequency table.
//!
//! A card adds one to the cell (function, size) for every configured size
//! label it carries and every engineering function it is attributed to.
//! Which functions a card is attributed to is decided in one place,
//! [`AttributionPolicy::attribute`]. During a run only size labels the
//! tracker resolved are counted; see [`aggregate_resolved`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Card, EngineeringFunction, FrequencyTable, LabelName, LabelResolution};

/// How a card carrying several engineering-function labels is attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionPolicy {
    /// Count the card under every function it carries. A card labelled both
    /// `backend` and `frontend` is counted once in each row.
    #[default]
    EveryMatch,
    /// Count the card only under the first carried function, in configured
    /// order.
    FirstMatch,
}

impl AttributionPolicy {
    /// Returns the configured functions `card` is attributed to.
    pub fn attribute<'f>(
        self,
        functions: &'f [EngineeringFunction],
        card: &Card,
    ) -> Vec<&'f EngineeringFunction> {
        let mut carried = functions
            .iter()
            .filter(|function| card.has_label(function.as_str()));
        match self {
            Self::EveryMatch => carried.collect(),
            Self::FirstMatch => carried.next().into_iter().collect(),
        }
    }
}

/// Builds the frequency table for `cards`, counting every configured size
/// label by its own name.
///
/// The table holds a zero cell for every configured (function, size label)
/// pair before any card is counted, so an empty card set still yields the
/// full key set. Cards with no configured size label, or attributed to no
/// function, change nothing. The result depends only on the multiset of
/// cards, not their order.
pub fn aggregate(
    engineering_functions: &[EngineeringFunction],
    size_labels: &[LabelName],
    cards: &[Card],
    policy: AttributionPolicy,
) -> FrequencyTable {
    let columns: Vec<(&LabelName, Option<&str>)> = size_labels
        .iter()
        .map(|label| (label, Some(label.as_str())))
        .collect();
    fold(engineering_functions, &columns, cards, policy)
}

/// Builds the frequency table from the outcome of the label lookups.
///
/// Table keys are the configured names. Only labels the tracker resolved are
/// counted, and cards are matched on the tracker's canonical spelling. A
/// label that was not found, or whose lookup failed, keeps a zero column
/// whatever the cards carry.
pub fn aggregate_resolved(
    engineering_functions: &[EngineeringFunction],
    resolutions: &[LabelResolution],
    cards: &[Card],
    policy: AttributionPolicy,
) -> FrequencyTable {
    let columns: Vec<(&LabelName, Option<&str>)> = resolutions
        .iter()
        .map(|resolution| {
            (
                &resolution.name,
                resolution.label().map(|label| label.name.as_str()),
            )
        })
        .collect();
    fold(engineering_functions, &columns, cards, policy)
}

/// `columns` pairs each table key with the card label it counts, or `None`
/// for a column that never counts.
fn fold(
    engineering_functions: &[EngineeringFunction],
    columns: &[(&LabelName, Option<&str>)],
    cards: &[Card],
    policy: AttributionPolicy,
) -> FrequencyTable {
    let keys: Vec<LabelName> = columns.iter().map(|&(key, _)| key.clone()).collect();
    let mut table = FrequencyTable::zeroed(engineering_functions, &keys);

    // Repeated configuration entries collapse into one key; count each key
    // once, using its first entry.
    let functions: Vec<EngineeringFunction> = table.functions().cloned().collect();
    let mut seen = HashSet::new();
    let counted: Vec<(&LabelName, &str)> = columns
        .iter()
        .filter(|&&(key, _)| seen.insert(key.as_str()))
        .filter_map(|&(key, matched)| matched.map(|matched| (key, matched)))
        .collect();

    for card in cards {
        let carried_sizes: Vec<&LabelName> = counted
            .iter()
            .filter(|(_, matched)| card.has_label(matched))
            .map(|(key, _)| *key)
            .collect();
        if carried_sizes.is_empty() {
            continue;
        }
        for function in policy.attribute(&functions, card) {
            for size in &carried_sizes {
                table.increment(function, size);
            }
        }
    }

    table
}
