use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    CustomerId, DamageAssessment, FineId, FineStatus, LoanId, LoanRequest, LoanStatus,
    NewCustomer, NewToolKind, ReturnCondition, ToolId, ToolKindId,
};
use super::error::RentalError;
use super::repository::{MovementLog, RateTable, RentalStore};
use super::service::RentalService;

/// Router builder exposing the rental workflow over HTTP.
pub fn rental_router<S, M, R>(service: Arc<RentalService<S, M, R>>) -> Router
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    Router::new()
        .route(
            "/api/v1/rental/customers",
            post(register_customer::<S, M, R>),
        )
        .route(
            "/api/v1/rental/customers/:customer_id",
            get(get_customer::<S, M, R>),
        )
        .route(
            "/api/v1/rental/tool-kinds",
            post(register_tool_kind::<S, M, R>).get(list_tool_kinds::<S, M, R>),
        )
        .route(
            "/api/v1/rental/tool-kinds/:kind_id/units",
            post(add_units::<S, M, R>).get(list_kind_units::<S, M, R>),
        )
        .route("/api/v1/rental/tools/:tool_id", get(get_tool::<S, M, R>))
        .route(
            "/api/v1/rental/loans",
            post(create_loan::<S, M, R>).get(list_loans::<S, M, R>),
        )
        .route("/api/v1/rental/loans/:loan_id", get(get_loan::<S, M, R>))
        .route(
            "/api/v1/rental/loans/:loan_id/return",
            post(return_loan::<S, M, R>),
        )
        .route(
            "/api/v1/rental/loans/:loan_id/assessment",
            post(assess_damage::<S, M, R>),
        )
        .route("/api/v1/rental/fines", get(list_fines::<S, M, R>))
        .route("/api/v1/rental/fines/:fine_id", get(get_fine::<S, M, R>))
        .route(
            "/api/v1/rental/fines/:fine_id/payment",
            post(pay_fine::<S, M, R>),
        )
        .route(
            "/api/v1/rental/tools/:tool_id/repair-completion",
            post(complete_repair::<S, M, R>),
        )
        .route("/api/v1/rental/sweep", post(run_sweep::<S, M, R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateLoanBody {
    customer_id: u64,
    tool_id: u64,
    due_date: NaiveDate,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReturnBody {
    condition: ReturnCondition,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessmentBody {
    #[serde(flatten)]
    assessment: DamageAssessment,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SweepBody {
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterToolKindBody {
    #[serde(flatten)]
    draft: NewToolKind,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddUnitsBody {
    quantity: u32,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoanListQuery {
    #[serde(default)]
    status: Option<LoanStatus>,
    #[serde(default)]
    customer_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FineListQuery {
    #[serde(default)]
    status: Option<FineStatus>,
    #[serde(default)]
    customer_id: Option<u64>,
}

pub(crate) async fn register_customer<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Json(draft): Json<NewCustomer>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.register_customer(draft) {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_customer<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(customer_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.customer(CustomerId(customer_id)) {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn register_tool_kind<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Json(body): Json<RegisterToolKindBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    match service.register_tool_kind(body.draft, today) {
        Ok(kind) => (StatusCode::CREATED, Json(kind)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_tool_kinds<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.tool_kinds() {
        Ok(kinds) => (StatusCode::OK, Json(kinds)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_units<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(kind_id): Path<u64>,
    Json(body): Json<AddUnitsBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    match service.add_tool_units(ToolKindId(kind_id), body.quantity, today) {
        Ok(units) => (StatusCode::CREATED, Json(units)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_kind_units<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(kind_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.tools_of_kind(ToolKindId(kind_id)) {
        Ok(units) => (StatusCode::OK, Json(units)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_tool<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(tool_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.tool(ToolId(tool_id)) {
        Ok(tool) => (StatusCode::OK, Json(tool)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_loan<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Json(body): Json<CreateLoanBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    let request = LoanRequest {
        customer: CustomerId(body.customer_id),
        tool: ToolId(body.tool_id),
        due_date: body.due_date,
    };
    match service.create_loan(request, today) {
        Ok(loan) => (StatusCode::CREATED, Json(loan)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_loans<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Query(query): Query<LoanListQuery>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let loans = match query.customer_id {
        Some(customer_id) => service.loans_for_customer(CustomerId(customer_id)),
        None => service.loans(),
    };
    match loans {
        Ok(loans) => {
            let loans: Vec<_> = loans
                .into_iter()
                .filter(|loan| query.status.map_or(true, |status| loan.status == status))
                .collect();
            (StatusCode::OK, Json(loans)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_loan<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(loan_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.loan(LoanId(loan_id)) {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn return_loan<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(loan_id): Path<u64>,
    Json(body): Json<ReturnBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    match service.return_loan(LoanId(loan_id), body.condition, today) {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assess_damage<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(loan_id): Path<u64>,
    Json(body): Json<AssessmentBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    match service.assess_damage(LoanId(loan_id), body.assessment, today) {
        Ok(fine) => (StatusCode::CREATED, Json(fine)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_fines<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Query(query): Query<FineListQuery>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let fines = match query.customer_id {
        Some(customer_id) => service.fines_for_customer(CustomerId(customer_id)),
        None => service.fines(),
    };
    match fines {
        Ok(fines) => {
            let fines: Vec<_> = fines
                .into_iter()
                .filter(|fine| query.status.map_or(true, |status| fine.status == status))
                .collect();
            (StatusCode::OK, Json(fines)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_fine<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(fine_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.fine(FineId(fine_id)) {
        Ok(fine) => (StatusCode::OK, Json(fine)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pay_fine<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(fine_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.pay_fine(FineId(fine_id)) {
        Ok(fine) => (StatusCode::OK, Json(fine)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn complete_repair<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Path(tool_id): Path<u64>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    match service.complete_repair(ToolId(tool_id)) {
        Ok(tool) => (StatusCode::OK, Json(tool)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn run_sweep<S, M, R>(
    State(service): State<Arc<RentalService<S, M, R>>>,
    Json(body): Json<SweepBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    let today = body.today.unwrap_or_else(local_today);
    match service.run_overdue_sweep(today) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: RentalError) -> Response {
    let status = match &err {
        RentalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RentalError::NotFound(_) => StatusCode::NOT_FOUND,
        RentalError::Consistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
