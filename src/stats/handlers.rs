use actix_web::{get, web, HttpResponse};
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{
    MonthDistributionQuery, MonthDistributionResponse, PatrimonyEvolutionResponse,
    YearByYearQuery, YearByYearResponse,
};
use super::service::StatsService;

/// GET /stats/patrimony-evolution - Month-by-month net worth series
#[utoipa::path(
    get,
    path = "/stats/patrimony-evolution",
    tag = "Stats",
    responses(
        (status = 200, description = "Net worth evolution", body = PatrimonyEvolutionResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/stats/patrimony-evolution")]
pub async fn get_patrimony_evolution(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let response = StatsService::patrimony_evolution(
        pool.get_ref(),
        auth.user_id,
        now.month() as i16,
        now.year() as i16,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /stats/month-distribution - Per-category amounts for one month
#[utoipa::path(
    get,
    path = "/stats/month-distribution",
    tag = "Stats",
    params(MonthDistributionQuery),
    responses(
        (status = 200, description = "Month distribution", body = MonthDistributionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/stats/month-distribution")]
pub async fn get_month_distribution(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<MonthDistributionQuery>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let response =
        StatsService::month_distribution(pool.get_ref(), auth.user_id, query.month, query.year)
            .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /stats/year-by-year - Per-category amounts for one year
#[utoipa::path(
    get,
    path = "/stats/year-by-year",
    tag = "Stats",
    params(YearByYearQuery),
    responses(
        (status = 200, description = "Year distribution", body = YearByYearResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/stats/year-by-year")]
pub async fn get_year_by_year_distribution(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<YearByYearQuery>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let response = StatsService::year_by_year(pool.get_ref(), auth.user_id, query.year).await?;

    Ok(HttpResponse::Ok().json(response))
}
