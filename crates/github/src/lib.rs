//! GitHub infrastructure adapter for the size census.
//!
//! Implements the tracker ports defined in the [`census`] crate
//! ([`census::ProjectBoard`], [`census::LabelCatalog`]) over the GitHub REST
//! API for classic project boards.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP
//! transport, authentication, status mapping, and retry with back-off are
//! handled here; the [`census`] crate only ever sees
//! [`census::TrackerError`].
//!
//! ## Endpoints
//!
//! | Port method | Request |
//! |-------------|---------|
//! | `list_projects` | `GET /repos/{owner}/{repo}/projects` |
//! | `list_project_columns` | `GET /projects/{project_id}/columns` |
//! | `list_project_cards` | `GET /projects/columns/{column_id}/cards`, then the issue at each card's `content_url` |
//! | `get_label` | `GET /repos/{owner}/{repo}/labels/{name}` |

mod client;
mod error;
mod models;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_URL};
pub use error::ClientError;
