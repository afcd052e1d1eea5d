//! Integration tests for the payroll engine.
//!
//! This suite runs the engine against the shipped `config/2023` tables,
//! both directly and through the HTTP router:
//! - Hours classification scenarios
//! - Situational pay
//! - Withholding and flat taxes
//! - Identity, idempotence and supersession
//! - Batch runs
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::calculation::{
    CancellationToken, IncomeTaxInput, calculate_income_tax, calculate_payroll, run_batch,
};
use payroll_engine::config::{ConfigLoader, EngineConfig};
use payroll_engine::error::EngineError;
use payroll_engine::models::{
    DailyRecord, ElectionForm, FilingStatus, Jurisdiction, PayFrequency, PayPeriod,
    PayrollCalculation, PayrollInput, ScheduleType, WithholdingElection, Worker,
    YearToDateAccumulator,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn load_config() -> EngineConfig {
    ConfigLoader::load("./config/2023")
        .expect("Failed to load config")
        .config()
        .clone()
}

fn create_router_for_test() -> Router {
    let config = ConfigLoader::load("./config/2023").expect("Failed to load config");
    create_router(AppState::new(config))
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn make_date(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(date: &str, hours: &str) -> DailyRecord {
    DailyRecord {
        work_date: make_date(date),
        project_id: "proj_100".to_string(),
        zone: "zone_a".to_string(),
        hours_worked: decimal(hours),
        shift: 1,
        meal_taken: true,
        holiday: false,
        travel_distance: Decimal::ZERO,
        installation: false,
    }
}

fn income_based_single() -> WithholdingElection {
    WithholdingElection {
        filing_status: FilingStatus::Single,
        form: ElectionForm::IncomeBased {
            other_income: Decimal::ZERO,
            deductions: Decimal::ZERO,
            credits: Decimal::ZERO,
            extra_withholding_checkbox: false,
        },
        additional_withholding: Decimal::ZERO,
    }
}

fn payroll_input(records: Vec<DailyRecord>) -> PayrollInput {
    PayrollInput {
        worker: Worker {
            id: "wkr_001".to_string(),
            local: "local_46".to_string(),
            classification: "inside_wireman".to_string(),
            apprentice_level: None,
        },
        pay_period: PayPeriod {
            start_date: make_date("2023-03-06"),
            end_date: make_date("2023-03-12"),
            frequency: PayFrequency::Weekly,
            public_holidays: vec![],
        },
        schedule: ScheduleType::Standard,
        records,
        federal_election: income_based_single(),
        state_election: income_based_single(),
        year_to_date: YearToDateAccumulator::default(),
        deductions: vec![],
    }
}

fn weekdays(hours: &str) -> Vec<DailyRecord> {
    ["2023-03-06", "2023-03-07", "2023-03-08", "2023-03-09", "2023-03-10"]
        .iter()
        .map(|d| record(d, hours))
        .collect()
}

fn calculate(input: &PayrollInput) -> PayrollCalculation {
    calculate_payroll(input, &load_config()).expect("calculation failed")
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn request_body(worker_id: &str, records: Vec<Value>) -> Value {
    json!({
        "worker": {
            "id": worker_id,
            "local": "local_46",
            "classification": "inside_wireman"
        },
        "pay_period": {
            "start_date": "2023-03-06",
            "end_date": "2023-03-12",
            "frequency": "weekly"
        },
        "records": records,
        "federal_election": { "filing_status": "single", "form": { "era": "income_based" } },
        "state_election": { "filing_status": "single", "form": { "era": "income_based" } }
    })
}

fn record_json(date: &str, hours: f64) -> Value {
    json!({
        "work_date": date,
        "project_id": "proj_100",
        "zone": "zone_a",
        "hours_worked": hours
    })
}

// =============================================================================
// Hours Classification
// =============================================================================

#[test]
fn test_five_standard_days() {
    let result = calculate(&payroll_input(weekdays("8")));
    assert_eq!(result.hours.regular, decimal("40"));
    assert_eq!(result.hours.overtime, Decimal::ZERO);
    assert_eq!(result.hours.double_time, Decimal::ZERO);
    assert_eq!(result.gross.gross_pay, decimal("2100.00"));
}

#[test]
fn test_twelve_hour_weekday() {
    let result = calculate(&payroll_input(vec![record("2023-03-06", "12")]));
    assert_eq!(result.hours.regular, decimal("8"));
    assert_eq!(result.hours.overtime, decimal("2"));
    assert_eq!(result.hours.double_time, decimal("2"));
    // 420.00 + 157.50 + 210.00
    assert_eq!(result.gross.earnings, decimal("787.50"));
}

#[test]
fn test_ten_hour_saturday() {
    let result = calculate(&payroll_input(vec![record("2023-03-11", "10")]));
    assert_eq!(result.hours.regular, Decimal::ZERO);
    assert_eq!(result.hours.overtime, decimal("8"));
    assert_eq!(result.hours.double_time, decimal("2"));
    // 8 * 78.75 + 2 * 105
    assert_eq!(result.gross.gross_pay, decimal("840.00"));
}

#[test]
fn test_compressed_week_weekly_cap() {
    let mut input = payroll_input(weekdays("10"));
    input.schedule = ScheduleType::Compressed;
    let result = calculate(&input);
    assert_eq!(result.hours.regular, decimal("40"));
    assert_eq!(result.hours.overtime, decimal("10"));
    // Friday's 10 hours are the ones moved.
    let friday: Vec<_> = result
        .pay_lines
        .iter()
        .filter(|l| l.date == make_date("2023-03-10"))
        .collect();
    assert_eq!(friday.len(), 1);
    assert_eq!(friday[0].hours, decimal("10"));
    assert_eq!(result.gross.earnings, decimal("2887.50"));
}

#[test]
fn test_conservation_of_hours() {
    let records = vec![
        record("2023-03-06", "9.25"),
        record("2023-03-07", "11.5"),
        record("2023-03-11", "6"),
        record("2023-03-12", "3.75"),
    ];
    let total: Decimal = records.iter().map(|r| r.hours_worked).sum();
    let result = calculate(&payroll_input(records));
    assert_eq!(result.hours_exact.total(), total);
}

#[test]
fn test_mid_period_rate_change() {
    let mut input = payroll_input(vec![record("2023-05-31", "8"), record("2023-06-01", "8")]);
    input.pay_period.start_date = make_date("2023-05-29");
    input.pay_period.end_date = make_date("2023-06-04");
    let result = calculate(&input);
    assert_eq!(result.pay_lines[0].rate, decimal("52.50"));
    assert_eq!(result.pay_lines[1].rate, decimal("54.10"));
}

// =============================================================================
// Situational Pay
// =============================================================================

#[test]
fn test_short_day_minimum_pay() {
    let result = calculate(&payroll_input(vec![record("2023-03-06", "2")]));
    // Guarantee max(100.00, 4 * 52.50) = 210.00; earned 105.00
    assert_eq!(result.gross.earnings, decimal("105.00"));
    assert_eq!(result.gross.adjustments, decimal("105.00"));
    assert_eq!(result.gross.gross_pay, decimal("210.00"));
}

#[test]
fn test_reported_zero_hour_day_is_paid_the_guarantee() {
    let result = calculate(&payroll_input(vec![record("2023-03-06", "0")]));
    assert_eq!(result.gross.earnings, Decimal::ZERO);
    assert_eq!(result.gross.adjustments, decimal("210.00"));
    assert_eq!(result.gross.gross_pay, decimal("210.00"));
    assert!(result.fringe.contributions.is_empty());
}

#[test]
fn test_missed_meal_travel_and_installation() {
    let mut day = record("2023-03-06", "8");
    day.meal_taken = false;
    day.travel_distance = decimal("45");
    day.installation = true;
    let result = calculate(&payroll_input(vec![day]));
    // Meal: 3 tail hours * 52.50 * 0.5 = 78.75; travel 25.00; install 8 * 1.50 = 12.00
    assert_eq!(result.gross.adjustments, decimal("115.75"));
    assert_eq!(result.gross.gross_pay, decimal("535.75"));
    assert_eq!(result.adjustments.len(), 3);
}

// =============================================================================
// Withholding
// =============================================================================

#[test]
fn test_standard_week_withholding() {
    let result = calculate(&payroll_input(weekdays("8")));
    // (2100 * 52 - 8600) = 100600 -> 5147 + 50625 * 0.22 = 16284.50 / 52
    assert_eq!(result.withholding.federal_income_tax, decimal("313.16"));
    assert_eq!(result.withholding.old_age_survivors, decimal("130.20"));
    assert_eq!(result.withholding.hospital_insurance, decimal("30.45"));
    assert_eq!(result.withholding.state_disability, decimal("18.90"));
    assert_eq!(
        result.withholding.total,
        result.withholding.federal_income_tax
            + result.withholding.state_income_tax
            + result.withholding.old_age_survivors
            + result.withholding.hospital_insurance
            + result.withholding.state_disability
    );
    assert_eq!(
        result.net_pay,
        result.gross.gross_pay - result.withholding.total - result.deductions_total
    );
}

#[test]
fn test_ytd_at_wage_base_not_taxed() {
    let mut input = payroll_input(weekdays("8"));
    input.year_to_date = YearToDateAccumulator {
        old_age_survivors_wages: decimal("160200"),
        hospital_insurance_wages: decimal("160200"),
        state_disability_wages: decimal("160200"),
    };
    let result = calculate(&input);
    assert_eq!(result.withholding.old_age_survivors, Decimal::ZERO);
    assert_eq!(result.withholding.state_disability, Decimal::ZERO);
    assert_eq!(result.withholding.hospital_insurance, decimal("30.45"));
}

#[test]
fn test_state_low_income_boundary() {
    let config = load_config();
    let election = income_based_single();
    let input = |wages: &str| IncomeTaxInput {
        jurisdiction: Jurisdiction::State,
        period_wages: decimal(wages),
        frequency: PayFrequency::Weekly,
        election: &election,
        rules: config.rules(Jurisdiction::State),
        tables: &config.tax_tables,
    };

    let at = calculate_income_tax(input("333.00"), 1).unwrap();
    assert!(at.exempt);
    assert_eq!(at.total, Decimal::ZERO);

    let above = calculate_income_tax(input("333.01"), 1).unwrap();
    assert!(!above.exempt);
    assert!(above.total > Decimal::ZERO);
}

#[test]
fn test_federal_row_boundary() {
    let config = load_config();
    let election = WithholdingElection {
        filing_status: FilingStatus::Single,
        form: ElectionForm::AllowanceBased { allowances: 0 },
        additional_withholding: Decimal::ZERO,
    };
    // 625 * 26 = 16250, the lower bound of the 12% row.
    let result = calculate_income_tax(
        IncomeTaxInput {
            jurisdiction: Jurisdiction::Federal,
            period_wages: decimal("625"),
            frequency: PayFrequency::Biweekly,
            election: &election,
            rules: config.rules(Jurisdiction::Federal),
            tables: &config.tax_tables,
        },
        1,
    )
    .unwrap();
    assert_eq!(result.adjusted_annual_wages, decimal("16250"));
    assert_eq!(result.annual_tax, decimal("1100"));
}

// =============================================================================
// Identity and Supersession
// =============================================================================

#[test]
fn test_recalculation_is_identical() {
    let config = load_config();
    let input = payroll_input(weekdays("8"));
    let first = calculate_payroll(&input, &config).unwrap();
    let second = calculate_payroll(&input, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_correction_supersedes_original() {
    let original = calculate(&payroll_input(weekdays("8")));
    let mut corrected_records = weekdays("8");
    corrected_records[4].hours_worked = decimal("9");
    let corrected = calculate(&payroll_input(corrected_records));

    let original_id = original.calculation_id;
    let (voided, replacement) = original.supersede(corrected).unwrap();
    assert!(!voided.is_active());
    assert!(replacement.is_active());
    assert_eq!(replacement.supersedes, Some(original_id));
}

#[test]
fn test_ytd_advances_for_next_period() {
    let input = payroll_input(weekdays("8"));
    let result = calculate(&input);
    let next = input.year_to_date.advanced_by(result.gross.gross_pay);
    assert_eq!(next.old_age_survivors_wages, decimal("2100.00"));
    // The input snapshot itself is untouched.
    assert_eq!(input.year_to_date.old_age_survivors_wages, Decimal::ZERO);
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn test_batch_of_many_workers() {
    let config = load_config();
    let inputs: Vec<_> = (0..50)
        .map(|i| {
            let mut input = payroll_input(weekdays("8"));
            input.worker.id = format!("wkr_{:03}", i);
            input
        })
        .collect();
    let outcome = run_batch(&inputs, &config, &CancellationToken::new()).unwrap();
    assert_eq!(outcome.calculations.len(), 50);
    assert!(outcome.failures.is_empty());
    assert!(
        outcome
            .calculations
            .iter()
            .all(|c| c.gross.gross_pay == decimal("2100.00"))
    );
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn test_negative_hours_rejected() {
    let input = payroll_input(vec![record("2023-03-06", "-1")]);
    assert!(matches!(
        calculate_payroll(&input, &load_config()),
        Err(EngineError::MalformedInput { .. })
    ));
}

#[test]
fn test_missing_apprentice_level() {
    let mut input = payroll_input(weekdays("8"));
    input.worker.apprentice_level = Some(9);
    assert!(matches!(
        calculate_payroll(&input, &load_config()),
        Err(EngineError::MissingRateData { .. })
    ));
}

#[test]
fn test_missing_config_dir() {
    assert!(matches!(
        ConfigLoader::load("./config/1999"),
        Err(EngineError::ConfigNotFound { .. })
    ));
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn test_api_calculate_standard_week() {
    let records = [
        "2023-03-06",
        "2023-03-07",
        "2023-03-08",
        "2023-03-09",
        "2023-03-10",
    ]
    .iter()
    .map(|d| record_json(d, 8.0))
    .collect();

    let (status, body) = post_json(
        create_router_for_test(),
        "/calculate",
        request_body("wkr_001", records),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["worker_id"], "wkr_001");
    assert_eq!(body["gross"]["gross_pay"], "2100.00");
    assert_eq!(body["status"], "active");
    assert!(body["audit_trace"]["steps"].as_array().unwrap().len() > 10);
}

#[tokio::test]
async fn test_api_out_of_period_record() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/calculate",
        request_body("wkr_001", vec![record_json("2023-03-20", 8.0)]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn test_api_batch() {
    let body = json!({
        "workers": [
            request_body("wkr_001", vec![record_json("2023-03-06", 8.0)]),
            request_body("wkr_002", vec![record_json("2023-03-06", 12.0)]),
        ]
    });

    let (status, body) = post_json(create_router_for_test(), "/batch", body).await;

    assert_eq!(status, StatusCode::OK);
    let calculations = body["calculations"].as_array().unwrap();
    assert_eq!(calculations.len(), 2);
    assert_eq!(calculations[1]["gross"]["earnings"], "787.50");
    assert_eq!(body["failures"].as_array().unwrap().len(), 0);
}
