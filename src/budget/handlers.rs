use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{
    BudgetDetailResponse, BudgetIdPath, BudgetListItem, CreateBudgetDto, ListBudgetsQuery,
    MonthYearPath, NewBudgetFormDataResponse, PaginatedBudgetsResponse, UpdateBudgetDto,
    UpdateBudgetStatusDto,
};
use super::service::BudgetService;

/// GET /budgets - Paginated, searchable budget list with computed amounts
#[utoipa::path(
    get,
    path = "/budgets",
    tag = "Budgets",
    params(ListBudgetsQuery),
    responses(
        (status = 200, description = "Page of budgets", body = PaginatedBudgetsResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/budgets")]
pub async fn list_budgets(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<ListBudgetsQuery>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let (budgets, filtered_count, total_count) =
        BudgetService::list_budgets_page(pool.get_ref(), auth.user_id, &query).await?;

    let mut results = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let amounts = BudgetService::compute_amounts(pool.get_ref(), auth.user_id, &budget).await?;
        results.push(BudgetListItem::from_budget(budget, amounts));
    }

    Ok(HttpResponse::Ok().json(PaginatedBudgetsResponse {
        results,
        filtered_count,
        total_count,
        page: query.page,
        page_size: query.page_size,
    }))
}

/// GET /budgets/new-form-data - Category reference data for a new budget
#[utoipa::path(
    get,
    path = "/budgets/new-form-data",
    tag = "Budgets",
    responses(
        (status = 200, description = "New budget form data", body = NewBudgetFormDataResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/budgets/new-form-data")]
pub async fn get_new_budget_form_data(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let data = BudgetService::new_budget_form_data(
        pool.get_ref(),
        auth.user_id,
        now.month() as i16,
        now.year() as i16,
    )
    .await?;

    Ok(HttpResponse::Ok().json(data))
}

/// GET /budgets/month/{month}/year/{year} - Budget for a specific month
#[utoipa::path(
    get,
    path = "/budgets/month/{month}/year/{year}",
    tag = "Budgets",
    params(MonthYearPath),
    responses(
        (status = 200, description = "Budget detail", body = BudgetDetailResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/budgets/month/{month}/year/{year}")]
pub async fn get_budget_by_month_year(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<MonthYearPath>,
) -> Result<HttpResponse, AppError> {
    path.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let budget = BudgetService::get_budget_by_month_year(
        pool.get_ref(),
        auth.user_id,
        path.month,
        path.year,
    )
    .await?;
    let detail = BudgetService::get_budget_detail(pool.get_ref(), budget.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// GET /budgets/{id} - Budget detail with per-category amounts
#[utoipa::path(
    get,
    path = "/budgets/{id}",
    tag = "Budgets",
    params(BudgetIdPath),
    responses(
        (status = 200, description = "Budget detail", body = BudgetDetailResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/budgets/{id}")]
pub async fn get_budget(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BudgetIdPath>,
) -> Result<HttpResponse, AppError> {
    let detail = BudgetService::get_budget_detail(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// POST /budgets - Create a budget with planned category values
#[utoipa::path(
    post,
    path = "/budgets",
    tag = "Budgets",
    request_body = CreateBudgetDto,
    responses(
        (status = 201, description = "Budget created", body = BudgetDetailResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Budget already exists for this month/year", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/budgets")]
pub async fn create_budget(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateBudgetDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let budget = BudgetService::create_budget(pool.get_ref(), auth.user_id, &body).await?;
    let detail = BudgetService::get_budget_detail(pool.get_ref(), budget.id, auth.user_id).await?;

    Ok(HttpResponse::Created().json(detail))
}

/// PATCH /budgets/{id} - Update a budget and its planned values
#[utoipa::path(
    patch,
    path = "/budgets/{id}",
    tag = "Budgets",
    params(BudgetIdPath),
    request_body = UpdateBudgetDto,
    responses(
        (status = 200, description = "Budget updated", body = BudgetDetailResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 409, description = "Budget already exists for this month/year", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/budgets/{id}")]
pub async fn update_budget(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BudgetIdPath>,
    body: web::Json<UpdateBudgetDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let budget =
        BudgetService::update_budget(pool.get_ref(), path.id, auth.user_id, &body).await?;
    let detail = BudgetService::get_budget_detail(pool.get_ref(), budget.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// PATCH /budgets/{id}/status - Open or close a budget
#[utoipa::path(
    patch,
    path = "/budgets/{id}/status",
    tag = "Budgets",
    params(BudgetIdPath),
    request_body = UpdateBudgetStatusDto,
    responses(
        (status = 200, description = "Status changed", body = BudgetDetailResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/budgets/{id}/status")]
pub async fn change_budget_status(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BudgetIdPath>,
    body: web::Json<UpdateBudgetStatusDto>,
) -> Result<HttpResponse, AppError> {
    let budget =
        BudgetService::change_status(pool.get_ref(), path.id, auth.user_id, body.is_open).await?;
    let detail = BudgetService::get_budget_detail(pool.get_ref(), budget.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// DELETE /budgets/{id} - Delete a budget
#[utoipa::path(
    delete,
    path = "/budgets/{id}",
    tag = "Budgets",
    params(BudgetIdPath),
    responses(
        (status = 204, description = "Budget deleted"),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/budgets/{id}")]
pub async fn delete_budget(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<BudgetIdPath>,
) -> Result<HttpResponse, AppError> {
    BudgetService::delete_budget(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
