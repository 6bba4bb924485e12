//! Size-label census domain.
//!
//! Counts issue *size* labels per *engineering function* across the cards in
//! selected columns of one project board. This crate holds every domain
//! concept, the port traits the tracker adapter implements, and the pipeline
//! itself. It performs no I/O; tracker access is injected through
//! [`ProjectBoard`] and [`LabelCatalog`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ColumnId`, `LabelName`, `RepositoryId`, etc.) |
//! | [`types`] | Board snapshots, `FrequencyTable`, `RunWarning`, `CensusReport` |
//! | [`errors`] | `TrackerError`, `CensusError`, `RetryPolicy` |
//! | [`ports`] | `ProjectBoard` and `LabelCatalog` traits |
//! | [`columns`] | Column filter |
//! | [`cards`] | Card collector |
//! | [`labels`] | Size-label resolver |
//! | [`aggregate`] | Frequency aggregator and attribution policy |
//! | [`run`] | Run orchestrator |

pub mod aggregate;
pub mod cards;
pub mod columns;
pub mod errors;
pub mod identifiers;
pub mod labels;
pub mod ports;
pub mod run;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use aggregate::{aggregate, aggregate_resolved, AttributionPolicy};
pub use cards::{collect_cards, CardCollection};
pub use columns::filter_columns;
pub use errors::{CensusError, RetryPolicy, TrackerError};
pub use identifiers::{
    CardId, ColumnId, EngineeringFunction, LabelId, LabelName, ProjectId, RepositoryId, RunId,
};
pub use labels::{resolve_labels, LabelLookup, LabelResolution};
pub use ports::{LabelCatalog, ProjectBoard};
pub use run::{run_census, select_project, CensusRequest, DEFAULT_CONCURRENCY};
pub use types::{
    Card, CensusReport, Column, FrequencyTable, Label, Project, RunWarning, Timestamp,
};
