use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{DEFAULT_MAX_RECORDS, ResolvedConfig};
use crate::domain::{LengthRange, SearchOutcome, SeqRecord, Session, TaxId};
use crate::fetcher::{PagedFetcher, Paging};
use crate::filter::filter_by_length;
use crate::ncbi::EntrezClient;
use crate::report::{ReportArtifacts, ReportSink};
use crate::session::RemoteSession;

#[derive(Debug, Clone)]
pub struct SurveyRequest {
    pub taxid: TaxId,
    pub range: LengthRange,
}

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub max_records: usize,
    pub paging: Paging,
    pub output_dir: Utf8PathBuf,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            paging: Paging::default(),
            output_dir: Utf8PathBuf::from("."),
        }
    }
}

impl From<&ResolvedConfig> for WorkflowOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_records: config.max_records,
            paging: if config.single_page {
                Paging::SinglePage
            } else {
                Paging::Exhaustive
            },
            output_dir: config.output_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Init,
    Searching,
    Fetching,
    Filtering,
    Reporting,
    NoResults,
    SearchFailed,
    NoMatches,
    Completed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::NoResults
                | WorkflowState::SearchFailed
                | WorkflowState::NoMatches
                | WorkflowState::Completed
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub state: WorkflowState,
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    pub state: WorkflowState,
    pub trail: Vec<WorkflowState>,
    pub taxid: TaxId,
    pub range: LengthRange,
    pub organism_name: Option<String>,
    pub total_count: usize,
    pub fetched: usize,
    pub matched: usize,
    pub artifacts: Option<ReportArtifacts>,
    pub report_errors: Vec<String>,
    pub message: Option<String>,
    pub finished_at: String,
}

impl WorkflowOutcome {
    fn start(request: &SurveyRequest) -> Self {
        Self {
            state: WorkflowState::Init,
            trail: vec![WorkflowState::Init],
            taxid: request.taxid.clone(),
            range: request.range,
            organism_name: None,
            total_count: 0,
            fetched: 0,
            matched: 0,
            artifacts: None,
            report_errors: Vec::new(),
            message: None,
            finished_at: String::new(),
        }
    }

    fn enter(&mut self, state: WorkflowState, sink: &dyn ProgressSink, message: String) {
        info!(taxid = %self.taxid, state = ?state, "{message}");
        self.state = state;
        self.trail.push(state);
        sink.event(ProgressEvent { state, message });
    }

    fn finish(mut self) -> Self {
        debug_assert!(self.state.is_terminal());
        self.finished_at = chrono::Utc::now().to_rfc3339();
        self
    }
}

/// One-shot survey: search, fetch, filter, report. Never re-enters a state.
pub struct Workflow<C: EntrezClient, S: ReportSink> {
    session: RemoteSession<C>,
    sink: S,
    options: WorkflowOptions,
}

impl<C: EntrezClient, S: ReportSink> Workflow<C, S> {
    pub fn new(client: C, sink: S, options: WorkflowOptions) -> Self {
        Self {
            session: RemoteSession::new(client),
            sink,
            options,
        }
    }

    pub fn run(&self, request: &SurveyRequest, progress: &dyn ProgressSink) -> WorkflowOutcome {
        let mut outcome = WorkflowOutcome::start(request);
        let taxid = &request.taxid;

        outcome.enter(
            WorkflowState::Searching,
            progress,
            format!("Searching for records with taxID: {taxid}"),
        );
        let search = match self.session.search(taxid) {
            Ok(SearchOutcome::Found(search)) => search,
            Ok(SearchOutcome::NotFound { organism_name }) => {
                outcome.enter(
                    WorkflowState::NoResults,
                    progress,
                    format!(
                        "Found 0 records for {organism_name} (TaxID: {taxid}). \
                         No records found. Exiting."
                    ),
                );
                outcome.organism_name = Some(organism_name);
                return outcome.finish();
            }
            Err(err) => {
                warn!(%taxid, error = %err, "search failed");
                outcome.message = Some(err.to_string());
                outcome.enter(
                    WorkflowState::SearchFailed,
                    progress,
                    format!("Error searching TaxID {taxid}: {err}. No records found. Exiting."),
                );
                return outcome.finish();
            }
        };
        outcome.organism_name = Some(search.organism_name.clone());
        outcome.total_count = search.total_count;

        outcome.enter(
            WorkflowState::Fetching,
            progress,
            format!(
                "Found {} records for {} (TaxID: {taxid}). Fetching records...",
                search.total_count, search.organism_name
            ),
        );
        let fetcher = PagedFetcher::new(self.session.client(), self.options.paging);
        let records = fetcher.fetch_all(&Session::Active(search), self.options.max_records);
        outcome.fetched = records.len();
        if records.is_empty() {
            warn!(%taxid, "no records fetched; continuing to filter");
        }

        outcome.enter(
            WorkflowState::Filtering,
            progress,
            format!(
                "Fetched {} records. Filtering by length {}...",
                records.len(),
                request.range
            ),
        );
        let filtered = filter_by_length(records, request.range);
        outcome.matched = filtered.len();
        if filtered.is_empty() {
            outcome.enter(
                WorkflowState::NoMatches,
                progress,
                "No records matched the length criteria.".to_string(),
            );
            return outcome.finish();
        }

        outcome.enter(
            WorkflowState::Reporting,
            progress,
            format!("{} records matched. Writing reports...", filtered.len()),
        );
        let artifacts = ReportArtifacts {
            csv_path: self.options.output_dir.join(taxid.report_file_name()),
            plot_path: self.options.output_dir.join(taxid.plot_file_name()),
        };
        outcome.report_errors = self.write_reports(&filtered, &artifacts, progress);
        outcome.artifacts = Some(artifacts);

        let message = if outcome.report_errors.is_empty() {
            "Survey complete.".to_string()
        } else {
            format!(
                "Survey finished with {} report error(s).",
                outcome.report_errors.len()
            )
        };
        outcome.enter(WorkflowState::Completed, progress, message);
        outcome.finish()
    }

    // Table first, then chart; a failed table does not stop the chart.
    fn write_reports(
        &self,
        records: &[SeqRecord],
        artifacts: &ReportArtifacts,
        progress: &dyn ProgressSink,
    ) -> Vec<String> {
        if let Err(err) = fs::create_dir_all(self.options.output_dir.as_std_path()) {
            warn!(dir = %self.options.output_dir, error = %err, "cannot create output directory");
        }

        let mut errors = Vec::new();
        let writes = [
            (
                "CSV report",
                &artifacts.csv_path,
                self.sink.write_table(records, &artifacts.csv_path),
            ),
            (
                "plot",
                &artifacts.plot_path,
                self.sink.write_chart(records, &artifacts.plot_path),
            ),
        ];
        for (what, path, result) in writes {
            match result {
                Ok(()) => progress.event(ProgressEvent {
                    state: WorkflowState::Reporting,
                    message: format!("Saved {what} to {path}"),
                }),
                Err(err) => {
                    warn!(%path, error = %err, "report artifact failed");
                    errors.push(err.to_string());
                }
            }
        }
        errors
    }
}
