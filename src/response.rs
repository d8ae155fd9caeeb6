//! # Aggregated reply generation.
//!
//! Folds per-service detail payloads and an optional phase summary into one
//! structured, JSON-serializable reply plus an HTTP status code.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ServiceError, SummaryError};
use crate::services::ServiceRef;

/// Structured reply returned to the caller.
///
/// `status` is `"ok"` on success, otherwise the summary failure text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    pub details: Vec<ResponseDetail>,
}

/// One service's contribution to the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDetail {
    pub name: String,
    pub detail: Value,
}

fn response_container(summary: Option<SummaryError>) -> (StatusCode, Response) {
    match summary {
        Some(summary) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Response {
                status: summary.to_string(),
                details: Vec::new(),
            },
        ),
        None => (
            StatusCode::OK,
            Response {
                status: "ok".into(),
                details: Vec::new(),
            },
        ),
    }
}

/// Folds per-service responses into a single reply.
///
/// `errs` must be aligned with `services`. Services whose `response`
/// returns `None` are omitted from the details.
pub fn generate_response(
    services: &[ServiceRef],
    errs: &[Option<ServiceError>],
    summary: Option<SummaryError>,
) -> (StatusCode, Response) {
    let (status, mut response) = response_container(summary);

    for (service, err) in services.iter().zip(errs) {
        if let Some(detail) = service.response(err.as_ref()) {
            response.details.push(ResponseDetail {
                name: service.name(),
                detail,
            });
        }
    }

    (status, response)
}

/// Folds a staged outcome into a single reply.
///
/// With a summary present only the failing stage is reported; otherwise the
/// details of every stage are concatenated in stage order.
pub fn generate_staged_response(
    stages: &[Vec<ServiceRef>],
    failed_stage: usize,
    errs: &[Option<ServiceError>],
    summary: Option<SummaryError>,
) -> (StatusCode, Response) {
    if summary.is_some() {
        return generate_response(&stages[failed_stage], errs, summary);
    }

    let (status, mut response) = response_container(None);
    for stage in stages {
        let clean = vec![None; stage.len()];
        let (_, stage_response) = generate_response(stage, &clean, None);
        response.details.extend(stage_response.details);
    }

    (status, response)
}
