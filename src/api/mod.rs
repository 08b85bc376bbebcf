use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    CalcError, CompoundInterestInputs, CompoundInterestResult, Debt, DebtPayoffResult,
    GoalSolveConfig, GoalSolveResult, InflationInputs, InflationResult, LoanInputs,
    LoanPayoffResult, Report, RetirementInputs, RetirementResult, compute_compound_interest,
    compute_debt_payoff, compute_inflation, compute_loan_payoff, compute_retirement,
    solve_required_contribution, solve_required_payment,
};

pub mod defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Calc(CalcError),
}

impl From<CalcError> for ApiError {
    fn from(value: CalcError) -> Self {
        ApiError::Calc(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Calc(CalcError::InvalidInput { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Calc(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, kind) = match &self {
            ApiError::BadRequest(msg) => (msg.clone(), "invalid-input"),
            ApiError::Calc(err) => (err.to_string(), err.kind()),
        };
        tracing::warn!(%status, kind, %error, "rejected calculation request");
        json_response(status, ErrorResponse { error, kind })
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReportQuery {
    format: Option<ReportFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CompoundPayload {
    principal: Option<f64>,
    monthly: Option<f64>,
    rate: Option<f64>,
    years: Option<u32>,
    compare: Option<bool>,
    compare_principal: Option<f64>,
    compare_monthly: Option<f64>,
    compare_rate: Option<f64>,
    compare_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoanPayload {
    amount: Option<f64>,
    rate: Option<f64>,
    payment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    current_savings: Option<f64>,
    monthly_contribution: Option<f64>,
    expected_return: Option<f64>,
    withdrawal_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InflationPayload {
    current_value: Option<f64>,
    years: Option<u32>,
    inflation_rate: Option<f64>,
    compare: Option<bool>,
    compare_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtEntryPayload {
    name: Option<String>,
    balance: Option<f64>,
    rate: Option<f64>,
    min_payment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtPayload {
    debts: Option<Vec<DebtEntryPayload>>,
    extra_payment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolverPayload {
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RequiredContributionPayload {
    #[serde(flatten)]
    retirement: RetirementPayload,
    target_corpus: Option<f64>,
    #[serde(flatten)]
    solver: SolverPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RequiredPaymentPayload {
    amount: Option<f64>,
    rate: Option<f64>,
    target_months: Option<u32>,
    #[serde(flatten)]
    solver: SolverPayload,
}

#[derive(Debug, Clone, PartialEq)]
struct CompoundRequest {
    inputs: CompoundInterestInputs,
    compare: Option<CompoundInterestInputs>,
}

#[derive(Debug, Clone, PartialEq)]
struct InflationRequest {
    inputs: InflationInputs,
    compare: Option<InflationInputs>,
}

#[derive(Debug, Clone, PartialEq)]
struct DebtRequest {
    debts: Vec<Debt>,
    extra_payment: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompoundResponse {
    #[serde(flatten)]
    result: CompoundInterestResult,
    comparison: Option<CompoundInterestResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InflationResponse {
    #[serde(flatten)]
    result: InflationResult,
    comparison: Option<InflationResult>,
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.bind, config.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("fincalc HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{}/api/compound-interest", config.port);

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/compound-interest",
            get(compound_get_handler).post(compound_post_handler),
        )
        .route("/api/compound-interest/report", post(compound_report_handler))
        .route(
            "/api/loan-payoff",
            get(loan_get_handler).post(loan_post_handler),
        )
        .route("/api/loan-payoff/report", post(loan_report_handler))
        .route(
            "/api/retirement",
            get(retirement_get_handler).post(retirement_post_handler),
        )
        .route("/api/retirement/report", post(retirement_report_handler))
        .route(
            "/api/inflation",
            get(inflation_get_handler).post(inflation_post_handler),
        )
        .route("/api/inflation/report", post(inflation_report_handler))
        .route("/api/debt-payoff", post(debt_post_handler))
        .route("/api/debt-payoff/report", post(debt_report_handler))
        .route(
            "/api/goal/required-contribution",
            post(required_contribution_handler),
        )
        .route("/api/goal/required-payment", post(required_payment_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "Not found".to_string(),
            kind: "not-found",
        },
    )
}

async fn compound_get_handler(Query(payload): Query<CompoundPayload>) -> Response {
    respond(run_compound(payload).map(|(_, response)| response))
}

async fn compound_post_handler(Json(payload): Json<CompoundPayload>) -> Response {
    respond(run_compound(payload).map(|(_, response)| response))
}

async fn compound_report_handler(
    Query(query): Query<ReportQuery>,
    Json(payload): Json<CompoundPayload>,
) -> Response {
    report_response(
        run_compound(payload).map(|(req, response)| response.result.report(&req.inputs)),
        query,
    )
}

async fn loan_get_handler(Query(payload): Query<LoanPayload>) -> Response {
    respond(run_loan(payload).map(|(_, result)| result))
}

async fn loan_post_handler(Json(payload): Json<LoanPayload>) -> Response {
    respond(run_loan(payload).map(|(_, result)| result))
}

async fn loan_report_handler(
    Query(query): Query<ReportQuery>,
    Json(payload): Json<LoanPayload>,
) -> Response {
    report_response(
        run_loan(payload).map(|(inputs, result)| result.report(&inputs)),
        query,
    )
}

async fn retirement_get_handler(Query(payload): Query<RetirementPayload>) -> Response {
    respond(run_retirement(payload).map(|(_, result)| result))
}

async fn retirement_post_handler(Json(payload): Json<RetirementPayload>) -> Response {
    respond(run_retirement(payload).map(|(_, result)| result))
}

async fn retirement_report_handler(
    Query(query): Query<ReportQuery>,
    Json(payload): Json<RetirementPayload>,
) -> Response {
    report_response(
        run_retirement(payload).map(|(inputs, result)| result.report(&inputs)),
        query,
    )
}

async fn inflation_get_handler(Query(payload): Query<InflationPayload>) -> Response {
    respond(run_inflation(payload).map(|(_, response)| response))
}

async fn inflation_post_handler(Json(payload): Json<InflationPayload>) -> Response {
    respond(run_inflation(payload).map(|(_, response)| response))
}

async fn inflation_report_handler(
    Query(query): Query<ReportQuery>,
    Json(payload): Json<InflationPayload>,
) -> Response {
    report_response(
        run_inflation(payload).map(|(req, response)| response.result.report(&req.inputs)),
        query,
    )
}

async fn debt_post_handler(Json(payload): Json<DebtPayload>) -> Response {
    respond(run_debts(payload).map(|(_, result)| result))
}

async fn debt_report_handler(
    Query(query): Query<ReportQuery>,
    Json(payload): Json<DebtPayload>,
) -> Response {
    report_response(
        run_debts(payload).map(|(req, result)| result.report(&req.debts, req.extra_payment)),
        query,
    )
}

async fn required_contribution_handler(
    Json(payload): Json<RequiredContributionPayload>,
) -> Response {
    respond(run_required_contribution(payload))
}

async fn required_payment_handler(Json(payload): Json<RequiredPaymentPayload>) -> Response {
    respond(run_required_payment(payload))
}

fn respond<T: Serialize>(outcome: Result<T, ApiError>) -> Response {
    match outcome {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

fn report_response(outcome: Result<Report, ApiError>, query: ReportQuery) -> Response {
    let report = match outcome {
        Ok(report) => report,
        Err(err) => return err.into_response(),
    };
    match query.format.unwrap_or_default() {
        ReportFormat::Json => json_response(StatusCode::OK, report),
        ReportFormat::Csv => with_cache_control((
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            report.to_csv(),
        )),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn run_compound(
    payload: CompoundPayload,
) -> Result<(CompoundRequest, CompoundResponse), ApiError> {
    let request = compound_request_from_payload(payload);
    let result = compute_compound_interest(&request.inputs)?;
    let comparison = request
        .compare
        .as_ref()
        .map(compute_compound_interest)
        .transpose()?;
    tracing::debug!(
        years = request.inputs.years,
        compare = comparison.is_some(),
        "computed compound interest"
    );
    Ok((request, CompoundResponse { result, comparison }))
}

fn run_loan(payload: LoanPayload) -> Result<(LoanInputs, LoanPayoffResult), ApiError> {
    let inputs = loan_inputs_from_payload(payload);
    let result = compute_loan_payoff(&inputs)?;
    tracing::debug!(months = result.total_months, "computed loan payoff");
    Ok((inputs, result))
}

fn run_retirement(
    payload: RetirementPayload,
) -> Result<(RetirementInputs, RetirementResult), ApiError> {
    let inputs = retirement_inputs_from_payload(payload);
    let result = compute_retirement(&inputs)?;
    tracing::debug!(
        years = result.projection.len(),
        "computed retirement projection"
    );
    Ok((inputs, result))
}

fn run_inflation(
    payload: InflationPayload,
) -> Result<(InflationRequest, InflationResponse), ApiError> {
    let request = inflation_request_from_payload(payload);
    let result = compute_inflation(&request.inputs)?;
    let comparison = request
        .compare
        .as_ref()
        .map(compute_inflation)
        .transpose()?;
    tracing::debug!(years = request.inputs.years, "computed inflation erosion");
    Ok((request, InflationResponse { result, comparison }))
}

fn run_debts(payload: DebtPayload) -> Result<(DebtRequest, DebtPayoffResult), ApiError> {
    let request = debt_request_from_payload(payload).map_err(ApiError::BadRequest)?;
    let result = compute_debt_payoff(&request.debts, request.extra_payment)?;
    tracing::debug!(
        debts = request.debts.len(),
        snowball_months = result.snowball.total_months,
        avalanche_months = result.avalanche.total_months,
        "computed debt payoff"
    );
    Ok((request, result))
}

fn run_required_contribution(
    payload: RequiredContributionPayload,
) -> Result<GoalSolveResult, ApiError> {
    let inputs = retirement_inputs_from_payload(payload.retirement);
    let target_corpus = payload
        .target_corpus
        .ok_or_else(|| ApiError::BadRequest("targetCorpus is required".to_string()))?;
    let config = solver_config_from_payload(
        payload.solver,
        defaults::contribution_search_max(&inputs, target_corpus),
    );
    let result = solve_required_contribution(&inputs, target_corpus, config)?;
    tracing::debug!(
        iterations = result.iterations.len(),
        feasible = result.feasible,
        "solved required contribution"
    );
    Ok(result)
}

fn run_required_payment(payload: RequiredPaymentPayload) -> Result<GoalSolveResult, ApiError> {
    let principal = payload.amount.unwrap_or(defaults::LOAN.principal);
    let annual_rate_pct = payload.rate.unwrap_or(defaults::LOAN.annual_rate_pct);
    let target_months = payload
        .target_months
        .ok_or_else(|| ApiError::BadRequest("targetMonths is required".to_string()))?;
    let config = solver_config_from_payload(
        payload.solver,
        defaults::payment_search_max(principal, annual_rate_pct),
    );
    let result = solve_required_payment(principal, annual_rate_pct, target_months, config)?;
    tracing::debug!(
        iterations = result.iterations.len(),
        feasible = result.feasible,
        "solved required payment"
    );
    Ok(result)
}

fn compound_request_from_payload(payload: CompoundPayload) -> CompoundRequest {
    let base = defaults::COMPOUND;
    let inputs = CompoundInterestInputs {
        principal: payload.principal.unwrap_or(base.principal),
        monthly_contribution: payload.monthly.unwrap_or(base.monthly_contribution),
        annual_rate_pct: payload.rate.unwrap_or(base.annual_rate_pct),
        years: payload.years.unwrap_or(base.years),
    };

    let compare_base = defaults::COMPOUND_COMPARE;
    let wants_compare = payload.compare.unwrap_or(false)
        || payload.compare_principal.is_some()
        || payload.compare_monthly.is_some()
        || payload.compare_rate.is_some()
        || payload.compare_years.is_some();
    let compare = wants_compare.then(|| CompoundInterestInputs {
        principal: payload.compare_principal.unwrap_or(compare_base.principal),
        monthly_contribution: payload
            .compare_monthly
            .unwrap_or(compare_base.monthly_contribution),
        annual_rate_pct: payload.compare_rate.unwrap_or(compare_base.annual_rate_pct),
        years: payload.compare_years.unwrap_or(compare_base.years),
    });

    CompoundRequest { inputs, compare }
}

fn loan_inputs_from_payload(payload: LoanPayload) -> LoanInputs {
    let base = defaults::LOAN;
    LoanInputs {
        principal: payload.amount.unwrap_or(base.principal),
        annual_rate_pct: payload.rate.unwrap_or(base.annual_rate_pct),
        monthly_payment: payload.payment.unwrap_or(base.monthly_payment),
    }
}

fn retirement_inputs_from_payload(payload: RetirementPayload) -> RetirementInputs {
    let base = defaults::RETIREMENT;
    RetirementInputs {
        current_age: payload.current_age.unwrap_or(base.current_age),
        retirement_age: payload.retirement_age.unwrap_or(base.retirement_age),
        current_savings: payload.current_savings.unwrap_or(base.current_savings),
        monthly_contribution: payload
            .monthly_contribution
            .unwrap_or(base.monthly_contribution),
        expected_return_pct: payload.expected_return.unwrap_or(base.expected_return_pct),
        withdrawal_rate_pct: payload.withdrawal_rate.unwrap_or(base.withdrawal_rate_pct),
    }
}

fn inflation_request_from_payload(payload: InflationPayload) -> InflationRequest {
    let base = defaults::INFLATION;
    let inputs = InflationInputs {
        current_value: payload.current_value.unwrap_or(base.current_value),
        years: payload.years.unwrap_or(base.years),
        annual_rate_pct: payload.inflation_rate.unwrap_or(base.annual_rate_pct),
    };
    let wants_compare = payload.compare.unwrap_or(false) || payload.compare_rate.is_some();
    let compare = wants_compare.then(|| InflationInputs {
        annual_rate_pct: payload
            .compare_rate
            .unwrap_or(defaults::INFLATION_COMPARE_RATE),
        ..inputs
    });
    InflationRequest { inputs, compare }
}

/// Missing numbers count as zero, and debts without a positive balance and
/// minimum payment are dropped before the engine sees them.
fn debt_request_from_payload(payload: DebtPayload) -> Result<DebtRequest, String> {
    let extra_payment = payload.extra_payment.unwrap_or(defaults::DEBT_EXTRA_PAYMENT);
    if !extra_payment.is_finite() || extra_payment < 0.0 {
        return Err("extraPayment must be >= 0".to_string());
    }

    let debts = match payload.debts {
        None => defaults::debts(),
        Some(entries) => entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                Debt::new(
                    entry.name.unwrap_or_else(|| format!("Debt {}", idx + 1)),
                    entry.balance.unwrap_or(0.0),
                    entry.rate.unwrap_or(0.0),
                    entry.min_payment.unwrap_or(0.0),
                )
            })
            .filter(|d| d.balance > 0.0 && d.min_payment > 0.0)
            .collect::<Vec<_>>(),
    };

    if debts.is_empty() {
        return Err("at least one debt with balance > 0 and minPayment > 0 is required".to_string());
    }

    Ok(DebtRequest {
        debts,
        extra_payment,
    })
}

fn solver_config_from_payload(payload: SolverPayload, default_max: f64) -> GoalSolveConfig {
    GoalSolveConfig {
        search_min: payload.search_min.unwrap_or(0.0),
        search_max: payload.search_max.unwrap_or(default_max),
        tolerance: payload.tolerance.unwrap_or(defaults::SOLVER_TOLERANCE),
        max_iterations: payload
            .max_iterations
            .unwrap_or(defaults::SOLVER_MAX_ITERATIONS),
    }
}
