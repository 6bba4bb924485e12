//! Card collection across the selected columns.

use std::future::Future;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::{Card, Column, RunWarning, TrackerError};

/// Cards gathered from a set of columns, plus the columns that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardCollection {
    /// Cards in column order, then in the order each fetch returned them.
    pub cards: Vec<Card>,
    /// One [`RunWarning::ColumnFetchFailed`] per column whose fetch failed and
    /// one [`RunWarning::CardContentMissing`] per card with unreadable content,
    /// in column order.
    pub warnings: Vec<RunWarning>,
}

/// Fetches the cards of every column and concatenates them.
///
/// Up to `concurrency` fetches are in flight at once (at least one). The
/// output order follows `columns` regardless of completion order. A failed
/// fetch becomes a warning and the remaining columns are still collected.
/// Cards whose content could not be read are kept and reported as warnings.
/// Nothing is sorted or deduplicated.
pub async fn collect_cards<F, Fut>(columns: &[Column], concurrency: usize, fetch: F) -> CardCollection
where
    F: Fn(&Column) -> Fut,
    Fut: Future<Output = Result<Vec<Card>, TrackerError>>,
{
    let outcomes: Vec<Result<Vec<Card>, TrackerError>> = stream::iter(columns)
        .map(|column| fetch(column))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut collection = CardCollection::default();
    for (column, outcome) in columns.iter().zip(outcomes) {
        match outcome {
            Ok(cards) => {
                debug!(column = %column.name, cards = cards.len(), "Collected column cards");
                for card in &cards {
                    if let Some(content_url) = &card.missing_content {
                        warn!(
                            column = %column.name,
                            card = %card.id,
                            content_url = %content_url,
                            "Card content could not be read; the card is not counted"
                        );
                        collection.warnings.push(RunWarning::CardContentMissing {
                            column: column.clone(),
                            card: card.id,
                            content_url: content_url.clone(),
                        });
                    }
                }
                collection.cards.extend(cards);
            }
            Err(error) => {
                warn!(column = %column.name, %error, "Skipping column whose cards could not be fetched");
                collection.warnings.push(RunWarning::ColumnFetchFailed {
                    column: column.clone(),
                    error,
                });
            }
        }
    }
    collection
}
