//! Run orchestration: sequences the pipeline stages over the tracker ports.
//!
//! ```text
//! list projects ─▶ select project ─▶ list columns ─▶ filter_columns
//!        ─▶ collect_cards ─▶ resolve_labels ─▶ aggregate_resolved ─▶ CensusReport
//! ```
//!
//! Only the first three steps can abort the run. Everything after them
//! degrades to warnings on the report. A size label the tracker does not
//! resolve keeps a zero column.

use tracing::{info, info_span, warn, Instrument};

use crate::{
    aggregate_resolved, collect_cards, filter_columns, resolve_labels, AttributionPolicy, CensusError,
    CensusReport, Column, EngineeringFunction, LabelCatalog, LabelName, Project, ProjectBoard,
    RepositoryId, RunId, Timestamp,
};

/// Default number of tracker requests allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Everything one run needs, already parsed and validated.
#[derive(Debug, Clone)]
pub struct CensusRequest {
    /// Repository that owns the board and the labels.
    pub repository: RepositoryId,
    /// Board to survey by exact name; `None` takes the first listed board.
    pub project: Option<String>,
    /// Names of the columns whose cards are counted.
    pub columns: Vec<String>,
    /// Size labels, in table column order.
    pub size_labels: Vec<LabelName>,
    /// Engineering functions, in table row order.
    pub engineering_functions: Vec<EngineeringFunction>,
    /// How cards with several function labels are counted.
    pub attribution: AttributionPolicy,
    /// Upper bound on concurrent card fetches and label lookups.
    pub concurrency: usize,
}

impl CensusRequest {
    /// Creates a request with default attribution and concurrency.
    pub fn new(
        repository: RepositoryId,
        columns: Vec<String>,
        size_labels: Vec<LabelName>,
        engineering_functions: Vec<EngineeringFunction>,
    ) -> Self {
        Self {
            repository,
            project: None,
            columns,
            size_labels,
            engineering_functions,
            attribution: AttributionPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Picks the board to survey: the one named `name`, or the first one.
pub fn select_project(projects: Vec<Project>, name: Option<&str>) -> Option<Project> {
    match name {
        Some(wanted) => projects.into_iter().find(|p| p.name == wanted),
        None => projects.into_iter().next(),
    }
}

/// Runs one census against the tracker.
///
/// # Errors
///
/// Returns a [`CensusError`] when the projects cannot be listed, no project
/// matches, or the selected project's columns cannot be listed. Failures of
/// individual columns or labels are reported in [`CensusReport::warnings`].
pub async fn run_census(
    board: &dyn ProjectBoard,
    catalog: &dyn LabelCatalog,
    request: &CensusRequest,
) -> Result<CensusReport, CensusError> {
    let run_id = RunId::new_random();
    let span = info_span!("census_run", %run_id, repository = %request.repository);
    execute(run_id, board, catalog, request)
        .instrument(span)
        .await
}

async fn execute(
    run_id: RunId,
    board: &dyn ProjectBoard,
    catalog: &dyn LabelCatalog,
    request: &CensusRequest,
) -> Result<CensusReport, CensusError> {
    let repository = &request.repository;

    let projects = board
        .list_projects(repository)
        .await
        .map_err(|source| CensusError::ProjectListing {
            repository: repository.clone(),
            source,
        })?;
    let project = select_project(projects, request.project.as_deref()).ok_or_else(|| {
        CensusError::ProjectNotFound {
            repository: repository.clone(),
            name: request.project.clone(),
        }
    })?;
    info!(project = %project.name, project_id = %project.id, "Selected project board");

    let all_columns = board
        .list_project_columns(project.id)
        .await
        .map_err(|source| CensusError::ColumnListing {
            project: project.name.clone(),
            source,
        })?;

    let columns: Vec<Column> = filter_columns(&request.columns, &all_columns);
    if columns.is_empty() && !request.columns.is_empty() {
        warn!(
            configured = ?request.columns,
            "None of the configured columns exist on the board"
        );
    }

    let collection = collect_cards(&columns, request.concurrency, |column: &Column| {
        board.list_project_cards(column.id)
    })
    .instrument(info_span!("collect_cards", columns = columns.len()))
    .await;

    let resolutions = resolve_labels(&request.size_labels, request.concurrency, |name| async move {
        catalog.get_label(repository, &name).await
    })
    .instrument(info_span!("resolve_labels", labels = request.size_labels.len()))
    .await;

    let table = aggregate_resolved(
        &request.engineering_functions,
        &resolutions,
        &collection.cards,
        request.attribution,
    );

    let mut warnings = collection.warnings;
    warnings.extend(resolutions.iter().filter_map(|r| r.warning()));

    info!(
        columns = columns.len(),
        cards = collection.cards.len(),
        counted = table.total(),
        warnings = warnings.len(),
        "Census complete"
    );

    Ok(CensusReport {
        run_id,
        generated_at: Timestamp::now(),
        project,
        columns_matched: columns.len(),
        cards_collected: collection.cards.len(),
        table,
        warnings,
    })
}
