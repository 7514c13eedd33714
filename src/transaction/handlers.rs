use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::account::service::AccountService;
use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::money::cents_to_decimal;

use super::models::{
    CreateTransactionDto, ImportContextQuery, ImportContextResponse, ImportResultResponse,
    ImportTransactionsDto, PaginatedTransactionResponse, TransactionFilters, TransactionIdPath,
    TransactionResponse, UpdateTransactionDto,
};
use super::service::TransactionService;

/// How many recent transactions the import context returns
const IMPORT_CONTEXT_RECENT_LIMIT: i64 = 10;

/// GET /transactions - List transactions with filters and pagination
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Transactions",
    params(TransactionFilters),
    responses(
        (status = 200, description = "Page of transactions", body = PaginatedTransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions")]
pub async fn list_transactions(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<TransactionFilters>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let (transactions, total) =
        TransactionService::list_transactions(pool.get_ref(), auth.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(PaginatedTransactionResponse {
        data: transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// GET /transactions/import-context - Account balance and recent transactions
/// to help the client deduplicate an imported statement
#[utoipa::path(
    get,
    path = "/transactions/import-context",
    tag = "Transactions",
    params(ImportContextQuery),
    responses(
        (status = 200, description = "Import context", body = ImportContextResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/import-context")]
pub async fn get_import_context(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<ImportContextQuery>,
) -> Result<HttpResponse, AppError> {
    let account =
        AccountService::get_account_by_id(pool.get_ref(), query.account_id, auth.user_id).await?;
    let recent = TransactionService::recent_for_account(
        pool.get_ref(),
        auth.user_id,
        account.id,
        IMPORT_CONTEXT_RECENT_LIMIT,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ImportContextResponse {
        account_id: account.id,
        balance: cents_to_decimal(account.balance_cents),
        recent_transactions: recent.into_iter().map(TransactionResponse::from).collect(),
    }))
}

/// POST /transactions/import - Bulk import parsed statement rows
#[utoipa::path(
    post,
    path = "/transactions/import",
    tag = "Transactions",
    request_body = ImportTransactionsDto,
    responses(
        (status = 201, description = "Rows imported", body = ImportResultResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/transactions/import")]
pub async fn import_transactions(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<ImportTransactionsDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let created =
        TransactionService::import_transactions(pool.get_ref(), auth.user_id, &body).await?;

    Ok(HttpResponse::Created().json(ImportResultResponse {
        imported_count: created.len(),
        transactions: created.into_iter().map(TransactionResponse::from).collect(),
    }))
}

/// GET /transactions/{id} - Get a specific transaction
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 200, description = "Transaction details", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/{id}")]
pub async fn get_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    let transaction =
        TransactionService::get_transaction(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

/// POST /transactions - Create a transaction with atomic balance update
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "Transactions",
    request_body = CreateTransactionDto,
    responses(
        (status = 201, description = "Transaction created", body = TransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category or account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/transactions")]
pub async fn create_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let transaction =
        TransactionService::create_transaction(pool.get_ref(), auth.user_id, body.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(TransactionResponse::from(transaction)))
}

/// PATCH /transactions/{id} - Update a transaction with atomic balance adjustments
#[utoipa::path(
    patch,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    request_body = UpdateTransactionDto,
    responses(
        (status = 200, description = "Transaction updated", body = TransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/transactions/{id}")]
pub async fn update_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
    body: web::Json<UpdateTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    body.validate_amount()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let transaction = TransactionService::update_transaction(
        pool.get_ref(),
        auth.user_id,
        path.id,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

/// DELETE /transactions/{id} - Delete a transaction, restoring balances
#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/transactions/{id}")]
pub async fn delete_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    TransactionService::delete_transaction(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
