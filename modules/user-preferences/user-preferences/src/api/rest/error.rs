use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::domain::error::DomainError;

use super::problem::{Problem, ValidationViolation};

const TYPE_BASE: &str = "https://errors.user-preferences/v1";

/// Map domain error to RFC 9457 Problem
pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> Problem {
    let trace_id = tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string());

    let problem = match e {
        DomainError::UnknownKey(key) => build_unknown_key_problem(key),
        DomainError::Validation { violations } => build_validation_problem(
            violations.iter().cloned().map(ValidationViolation::from).collect(),
        ),
        DomainError::Registry(err) => {
            tracing::error!(error = %err, "Preference registry misconfiguration");
            build_internal_problem("An internal error occurred")
        }
        DomainError::Database(err) => {
            tracing::error!(error = ?err, "Database error occurred");
            build_internal_problem("An internal database error occurred")
        }
    }
    .with_instance(instance);

    match trace_id {
        Some(id) => problem.with_trace_id(id),
        None => problem,
    }
}

fn build_unknown_key_problem(key: &str) -> Problem {
    Problem::new(
        StatusCode::NOT_FOUND,
        "Unknown preference",
        format!("Preference key '{key}' is not registered"),
    )
    .with_type(format!("{TYPE_BASE}/unknown-key"))
    .with_code("PREFERENCES_UNKNOWN_KEY")
}

/// 422 problem carrying one entry per offending preference.
pub fn build_validation_problem(errors: Vec<ValidationViolation>) -> Problem {
    let detail = match errors.as_slice() {
        [single] => format!("Validation error on '{}': {}", single.field, single.message),
        _ => format!("{} preferences failed validation", errors.len()),
    };

    Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed", detail)
        .with_type(format!("{TYPE_BASE}/validation"))
        .with_code("PREFERENCES_VALIDATION")
        .with_errors(errors)
}

fn build_internal_problem(detail: &str) -> Problem {
    Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", detail)
        .with_type(format!("{TYPE_BASE}/internal"))
        .with_code("PREFERENCES_INTERNAL")
}

pub fn unauthenticated_problem(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail)
        .with_type(format!("{TYPE_BASE}/unauthenticated"))
        .with_code("PREFERENCES_UNAUTHENTICATED")
}

/// Problem for a request body axum could not turn into the expected JSON.
///
/// Well-formed JSON of the wrong shape is a 422 validation problem on the
/// `body` field; other rejections keep their status.
pub fn json_rejection_to_problem(rejection: &JsonRejection, instance: &str) -> Problem {
    let status = rejection.status();
    let problem = if status == StatusCode::UNPROCESSABLE_ENTITY {
        build_validation_problem(vec![ValidationViolation {
            field: "body".to_owned(),
            message: rejection.body_text(),
        }])
    } else {
        Problem::new(
            status,
            status.canonical_reason().unwrap_or("Bad Request"),
            rejection.body_text(),
        )
        .with_type(format!("{TYPE_BASE}/malformed-body"))
        .with_code("PREFERENCES_MALFORMED_BODY")
    };
    problem.with_instance(instance)
}
