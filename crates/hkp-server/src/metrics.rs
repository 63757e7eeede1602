//! Request metrics
//!
//! Only the operation and outcome are labeled, never the search term.

use std::time::Duration;

use axum::http::StatusCode;
use metrics::{counter, histogram};

pub const OP_ADD: &str = "add";
pub const OP_UNKNOWN: &str = "unknown";

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_NOT_FOUND: &str = "not_found";
pub const OUTCOME_CLIENT_ERROR: &str = "client_error";
pub const OUTCOME_SERVER_ERROR: &str = "server_error";

pub fn outcome(status: StatusCode) -> &'static str {
    if status == StatusCode::NOT_FOUND {
        OUTCOME_NOT_FOUND
    } else if status.is_client_error() {
        OUTCOME_CLIENT_ERROR
    } else if status.is_server_error() {
        OUTCOME_SERVER_ERROR
    } else {
        OUTCOME_OK
    }
}

pub fn record_request(op: &'static str, status: StatusCode, duration: Duration) {
    let outcome = outcome(status);
    counter!("hkp_requests_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("hkp_request_duration_seconds", "op" => op, "outcome" => outcome)
        .record(duration.as_secs_f64());
}
