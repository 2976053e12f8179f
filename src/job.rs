//! Job lifecycle around one optimization request.
//!
//! A [`Job`] moves `Pending -> Running -> Succeeded | Failed`; any other
//! transition is a [`InverseDesignError::JobState`] error. [`Job::status`]
//! produces the pollable payload.

use crate::core::error::{InverseDesignError, Result};
use crate::core::numeric::sanitize_json;
use crate::model::ModelRegistry;
use crate::orchestrator::{InverseOptimizer, OptimizationReport, TargetResult};
use crate::report::{best_solution_rows, BestSolutionRow};
use crate::request::OptimizationRequest;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Progress of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded(OptimizationReport),
    Failed(String),
}

impl JobState {
    /// Label reported by the status poll.
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "IN_PROGRESS",
            JobState::Succeeded(_) => "SUCCESS",
            JobState::Failed(_) => "FAILURE",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded(_) | JobState::Failed(_))
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One request's unit of work and its timestamps.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    state: JobState,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A pending job.
    pub fn new(id: impl Into<String>) -> Self {
        Job {
            id: id.into(),
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// `Pending -> Running`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            JobState::Pending => {
                self.state = JobState::Running;
                self.started_at = Some(Utc::now());
                Ok(())
            }
            ref other => Err(InverseDesignError::job_state(other.label(), "IN_PROGRESS")),
        }
    }

    /// `Running -> Succeeded`.
    pub fn succeed(&mut self, report: OptimizationReport) -> Result<()> {
        self.finish(JobState::Succeeded(report))
    }

    /// `Running -> Failed`.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.finish(JobState::Failed(reason.into()))
    }

    fn finish(&mut self, next: JobState) -> Result<()> {
        if !matches!(self.state, JobState::Running) {
            return Err(InverseDesignError::job_state(self.state.label(), next.label()));
        }
        self.state = next;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// The report of a succeeded job.
    pub fn report(&self) -> Option<&OptimizationReport> {
        match &self.state {
            JobState::Succeeded(report) => Some(report),
            _ => None,
        }
    }

    /// Snapshot for the status poll.
    pub fn status(&self) -> JobStatus {
        let (results, best_solutions, error) = match &self.state {
            JobState::Succeeded(report) => {
                let rows = (!report.is_empty()).then(|| best_solution_rows(report));
                (Some(report.results.clone()), rows, None)
            }
            JobState::Failed(reason) => (None, None, Some(reason.clone())),
            _ => (None, None, None),
        };

        JobStatus {
            job_id: self.id.clone(),
            status: self.state.label(),
            results,
            best_solutions,
            error,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Status poll payload.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<TargetResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_solutions: Option<Vec<BestSolutionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// JSON payload with every non-finite number as `null`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(sanitize_json(serde_json::to_value(self)?))
    }
}

/// Run a request to completion as a job.
///
/// Request failures end the job in `Failed`; only an impossible state
/// transition is returned as an error.
pub fn run_job(
    id: impl Into<String>,
    request: &OptimizationRequest,
    registry: &ModelRegistry,
) -> Result<Job> {
    let mut job = Job::new(id);
    job.start()?;
    log::info!("Job {} started", job.id());

    let outcome = InverseOptimizer::with_registry(request, registry)
        .map(|optimizer| optimizer.optimize_for_targets(request.targets()));

    match outcome {
        Ok(report) => {
            log::info!("Job {} succeeded with {} result(s)", job.id(), report.len());
            job.succeed(report)?;
        }
        Err(e) => {
            log::error!("Job {} failed ({}): {}", job.id(), e.category(), e);
            job.fail(e.to_string())?;
        }
    }
    Ok(job)
}
