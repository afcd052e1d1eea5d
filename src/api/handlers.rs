//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    BatchOutcome, CancellationToken, WorkerFailure, calculate_payroll, run_batch,
};
use crate::models::PayrollInput;

use super::request::{BatchRequest, CalculationRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/batch", post(batch_handler))
        .with_state(state)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response()
}

fn error_response(error: ApiErrorResponse) -> Response {
    json_response(error.status, error.error)
}

/// Maps a JSON extraction failure to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /calculate endpoint.
///
/// Accepts one worker's input and returns the payroll calculation.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let input = match PayrollInput::try_from(request) {
        Ok(input) => input,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Invalid request");
            return error_response(err.into());
        }
    };

    let start_time = Instant::now();
    match calculate_payroll(&input, state.config().config()) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                worker_id = %result.worker_id,
                records = input.records.len(),
                gross_pay = %result.gross.gross_pay,
                net_pay = %result.net_pay,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                worker_id = %input.worker.id,
                error = %err,
                "Calculation failed"
            );
            error_response(err.into())
        }
    }
}

/// Handler for POST /batch endpoint.
///
/// Workers whose request cannot be converted are reported as failures
/// alongside workers whose calculation fails; only a batch-fatal error fails
/// the whole request.
async fn batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        workers = request.workers.len(),
        "Processing batch request"
    );

    let mut rejected = Vec::new();
    let mut inputs = Vec::with_capacity(request.workers.len());
    for worker_request in request.workers {
        let worker_id = worker_request.worker.id.clone();
        match PayrollInput::try_from(worker_request) {
            Ok(input) => inputs.push(input),
            Err(err) => rejected.push(WorkerFailure::new(&worker_id, &err)),
        }
    }

    let start_time = Instant::now();
    let config = state.config_handle();
    // Dropping the request future cancels the token, so a client that goes
    // away stops the batch from starting further workers.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let joined = tokio::task::spawn_blocking(move || {
        run_batch(&inputs, config.config(), &cancel)
    })
    .await;

    let result = match joined {
        Ok(result) => result,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Batch task failed");
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("BATCH_FAILED", "Batch task did not complete"),
            );
        }
    };

    match result {
        Ok(mut outcome) => {
            rejected.append(&mut outcome.failures);
            let outcome = BatchOutcome {
                failures: rejected,
                ..outcome
            };
            info!(
                correlation_id = %correlation_id,
                calculated = outcome.calculations.len(),
                failed = outcome.failures.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Batch completed"
            );
            json_response(StatusCode::OK, outcome)
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Batch halted");
            error_response(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::PayrollCalculation;
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/2023").expect("Failed to load config");
        AppState::new(config)
    }

    fn worker_json(id: &str, classification: &str) -> String {
        format!(
            r#"{{
                "worker": {{ "id": "{}", "local": "local_46", "classification": "{}" }},
                "pay_period": {{
                    "start_date": "2023-03-06",
                    "end_date": "2023-03-12",
                    "frequency": "weekly"
                }},
                "records": [
                    {{ "work_date": "2023-03-06", "project_id": "proj_100", "zone": "zone_a", "hours_worked": 8 }},
                    {{ "work_date": "2023-03-07", "project_id": "proj_100", "zone": "zone_a", "hours_worked": 8 }}
                ],
                "federal_election": {{ "filing_status": "single", "form": {{ "era": "income_based" }} }},
                "state_election": {{ "filing_status": "single", "form": {{ "era": "income_based" }} }}
            }}"#,
            id, classification
        )
    }

    async fn post_request(uri: &str, body: String) -> Response {
        create_router(create_test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_calculate_returns_200() {
        let response = post_request("/calculate", worker_json("wkr_001", "inside_wireman")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let result: PayrollCalculation =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(result.worker_id, "wkr_001");
        // 16 * 52.50
        assert_eq!(result.gross.gross_pay, Decimal::from_str("840.00").unwrap());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let response = post_request("/calculate", "{invalid json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let body = r#"{ "worker": { "id": "wkr_001" } }"#.to_string();
        let response = post_request("/calculate", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_classification_returns_422() {
        let response = post_request("/calculate", worker_json("wkr_001", "unknown")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ApiError = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.code, "RATE_AMBIGUITY");
    }

    #[tokio::test]
    async fn test_batch_reports_failures_per_worker() {
        let body = format!(
            r#"{{ "workers": [{}, {}] }}"#,
            worker_json("wkr_001", "inside_wireman"),
            worker_json("wkr_002", "unknown")
        );
        let response = post_request("/batch", body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let outcome: BatchOutcome = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(outcome.calculations.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].worker_id, "wkr_002");
        assert!(!outcome.cancelled);
        assert!(outcome.skipped.is_empty());
    }
}
