//! HTTP API module for the payroll engine.
//!
//! `POST /calculate` runs one worker; `POST /batch` runs many workers on the
//! blocking pool and reports per-worker failures next to the calculations.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{BatchRequest, CalculationRequest, DailyRecordRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
