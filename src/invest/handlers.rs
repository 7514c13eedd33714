use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{
    AssetIdPath, CreateAssetDto, CreateInvestTransactionDto, InvestAssetResponse,
    InvestStatsResponse, InvestTransactionResponse, InvestTrxIdPath, UpdateAssetDto,
    UpdateAssetValueDto,
};
use super::service::InvestService;

fn current_month_year() -> (i16, i16) {
    let now = Utc::now();
    (now.month() as i16, now.year() as i16)
}

/// GET /invest/assets - List assets with ROI figures
#[utoipa::path(
    get,
    path = "/invest/assets",
    tag = "Investments",
    responses(
        (status = 200, description = "List of assets", body = Vec<InvestAssetResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/invest/assets")]
pub async fn list_invest_assets(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assets = InvestService::list_assets(pool.get_ref(), auth.user_id).await?;

    let response: Vec<InvestAssetResponse> = assets
        .into_iter()
        .map(InvestService::asset_response)
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// GET /invest/stats - Portfolio statistics for the dashboard
#[utoipa::path(
    get,
    path = "/invest/stats",
    tag = "Investments",
    responses(
        (status = 200, description = "Portfolio statistics", body = InvestStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/invest/stats")]
pub async fn get_invest_stats(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (_, year) = current_month_year();
    let stats = InvestService::get_stats(pool.get_ref(), auth.user_id, year).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// POST /invest/assets - Create an asset
#[utoipa::path(
    post,
    path = "/invest/assets",
    tag = "Investments",
    request_body = CreateAssetDto,
    responses(
        (status = 201, description = "Asset created", body = InvestAssetResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/invest/assets")]
pub async fn create_invest_asset(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateAssetDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let asset = InvestService::create_asset(pool.get_ref(), auth.user_id, &body).await?;

    Ok(HttpResponse::Created().json(InvestService::asset_response(asset)))
}

/// PATCH /invest/assets/{id} - Update an asset
#[utoipa::path(
    patch,
    path = "/invest/assets/{id}",
    tag = "Investments",
    params(AssetIdPath),
    request_body = UpdateAssetDto,
    responses(
        (status = 200, description = "Asset updated", body = InvestAssetResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/invest/assets/{id}")]
pub async fn update_invest_asset(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AssetIdPath>,
    body: web::Json<UpdateAssetDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let asset =
        InvestService::update_asset(pool.get_ref(), path.id, auth.user_id, &body).await?;

    Ok(HttpResponse::Ok().json(InvestService::asset_response(asset)))
}

/// PATCH /invest/assets/{id}/value - Set the current market value
#[utoipa::path(
    patch,
    path = "/invest/assets/{id}/value",
    tag = "Investments",
    params(AssetIdPath),
    request_body = UpdateAssetValueDto,
    responses(
        (status = 200, description = "Value updated", body = InvestAssetResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/invest/assets/{id}/value")]
pub async fn update_invest_asset_value(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AssetIdPath>,
    body: web::Json<UpdateAssetValueDto>,
) -> Result<HttpResponse, AppError> {
    let (month, year) = current_month_year();
    let asset = InvestService::update_asset_value(
        pool.get_ref(),
        path.id,
        auth.user_id,
        body.current_value,
        month,
        year,
    )
    .await?;

    Ok(HttpResponse::Ok().json(InvestService::asset_response(asset)))
}

/// DELETE /invest/assets/{id} - Delete an asset
#[utoipa::path(
    delete,
    path = "/invest/assets/{id}",
    tag = "Investments",
    params(AssetIdPath),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/invest/assets/{id}")]
pub async fn delete_invest_asset(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AssetIdPath>,
) -> Result<HttpResponse, AppError> {
    InvestService::delete_asset(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /invest/assets/{id}/transactions - Buy/sell history of an asset
#[utoipa::path(
    get,
    path = "/invest/assets/{id}/transactions",
    tag = "Investments",
    params(AssetIdPath),
    responses(
        (status = 200, description = "Asset transactions", body = Vec<InvestTransactionResponse>),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/invest/assets/{id}/transactions")]
pub async fn list_asset_transactions(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AssetIdPath>,
) -> Result<HttpResponse, AppError> {
    let transactions =
        InvestService::list_asset_transactions(pool.get_ref(), path.id, auth.user_id).await?;

    let response: Vec<InvestTransactionResponse> = transactions
        .into_iter()
        .map(InvestTransactionResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// POST /invest/transactions - Record a buy or sell
#[utoipa::path(
    post,
    path = "/invest/transactions",
    tag = "Investments",
    request_body = CreateInvestTransactionDto,
    responses(
        (status = 201, description = "Transaction recorded", body = InvestTransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/invest/transactions")]
pub async fn create_invest_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateInvestTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let (month, year) = current_month_year();
    let transaction =
        InvestService::create_transaction(pool.get_ref(), auth.user_id, &body, month, year)
            .await?;

    Ok(HttpResponse::Created().json(InvestTransactionResponse::from(transaction)))
}

/// DELETE /invest/transactions/{id} - Delete a buy/sell, restoring units
#[utoipa::path(
    delete,
    path = "/invest/transactions/{id}",
    tag = "Investments",
    params(InvestTrxIdPath),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/invest/transactions/{id}")]
pub async fn delete_invest_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<InvestTrxIdPath>,
) -> Result<HttpResponse, AppError> {
    let (month, year) = current_month_year();
    InvestService::delete_transaction(pool.get_ref(), path.id, auth.user_id, month, year).await?;

    Ok(HttpResponse::NoContent().finish())
}
