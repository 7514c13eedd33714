use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::money::cents_to_decimal;

/// Transaction type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent from `accountFromId`
    #[default]
    Expense,
    /// Money received into `accountToId`
    Income,
    /// Money moved from `accountFromId` to `accountToId`
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(TransactionType::Expense),
            "income" => Some(TransactionType::Income),
            "transfer" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

/// Validate that amount is positive
fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

/// Database model for transactions. Amounts are stored in cents.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    #[allow(dead_code)]
    pub owner_id: Uuid,
    pub amount_cents: i64,
    pub transaction_type: String,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub account_from_id: Option<Uuid>,
    pub account_to_id: Option<Uuid>,
    pub is_essential: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn get_type(&self) -> TransactionType {
        TransactionType::parse(&self.transaction_type).unwrap_or_default()
    }
}

/// Transaction information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Unique transaction identifier
    pub id: Uuid,
    /// Transaction amount (always positive)
    #[schema(example = 50.00)]
    pub amount: Decimal,
    /// Transaction type (expense, income, transfer)
    #[serde(rename = "type")]
    #[schema(example = "expense")]
    pub transaction_type: String,
    /// Date of the transaction
    pub transaction_date: NaiveDate,
    /// Optional description
    #[schema(example = "Weekly groceries")]
    pub description: Option<String>,
    /// Category this transaction belongs to
    pub category_id: Option<Uuid>,
    /// Source account
    pub account_from_id: Option<Uuid>,
    /// Destination account
    pub account_to_id: Option<Uuid>,
    /// Whether this is essential spending
    pub is_essential: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            amount: cents_to_decimal(t.amount_cents),
            transaction_type: t.transaction_type,
            transaction_date: t.transaction_date,
            description: t.description,
            category_id: t.category_id,
            account_from_id: t.account_from_id,
            account_to_id: t.account_to_id,
            is_essential: t.is_essential,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionDto {
    /// Transaction amount (must be positive)
    #[validate(custom(
        function = "validate_positive_amount",
        message = "Amount must be positive"
    ))]
    #[schema(example = 50.00)]
    pub amount: Decimal,

    /// Transaction type (defaults to expense)
    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,

    /// Date of the transaction
    pub transaction_date: NaiveDate,

    /// Optional description (max 200 chars)
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(example = "Weekly groceries")]
    pub description: Option<String>,

    /// Category (optional)
    pub category_id: Option<Uuid>,

    /// Source account (required for expense and transfer)
    pub account_from_id: Option<Uuid>,

    /// Destination account (required for income and transfer)
    pub account_to_id: Option<Uuid>,

    /// Essential spending flag
    #[serde(default)]
    pub is_essential: bool,
}

/// Request body for updating a transaction (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionDto {
    /// Transaction amount
    #[schema(example = 75.00)]
    pub amount: Option<Decimal>,

    /// Transaction type
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,

    /// Transaction date
    pub transaction_date: Option<NaiveDate>,

    /// Description
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    /// Category ID
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,

    /// Source account
    #[schema(value_type = Option<Uuid>)]
    pub account_from_id: Option<Option<Uuid>>,

    /// Destination account
    #[schema(value_type = Option<Uuid>)]
    pub account_to_id: Option<Option<Uuid>>,

    /// Essential spending flag
    pub is_essential: Option<bool>,
}

impl UpdateTransactionDto {
    /// Validate amount if provided
    pub fn validate_amount(&self) -> Result<(), ValidationError> {
        if let Some(amount) = &self.amount {
            validate_positive_amount(amount)?;
        }
        Ok(())
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    /// Filter by start date (inclusive)
    pub start_date: Option<NaiveDate>,
    /// Filter by end date (inclusive)
    pub end_date: Option<NaiveDate>,
    /// Filter by category
    pub category_id: Option<Uuid>,
    /// Filter by account (either side)
    pub account_id: Option<Uuid>,
    /// Filter by type (expense, income, transfer)
    #[param(example = "expense")]
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Filter by essential flag
    pub is_essential: Option<bool>,
    /// Text searched in the description
    #[param(example = "groceries")]
    pub query: Option<String>,

    /// Maximum results (1-100)
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    #[param(example = 50)]
    pub limit: i64,

    /// Number of results to skip
    #[validate(range(min = 0))]
    #[serde(default)]
    #[param(example = 0)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedTransactionResponse {
    /// List of transactions
    pub data: Vec<TransactionResponse>,
    /// Total count matching filters
    #[schema(example = 100)]
    pub total: i64,
    /// Limit used
    #[schema(example = 50)]
    pub limit: i64,
    /// Offset used
    #[schema(example = 0)]
    pub offset: i64,
}

/// Query parameters for the import context
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ImportContextQuery {
    /// Account the statement will be imported into
    pub account_id: Uuid,
}

/// Context returned before importing a statement: the account's balance and
/// its most recent transactions, so the client can skip duplicates
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportContextResponse {
    /// Account being imported into
    pub account_id: Uuid,
    /// Current account balance
    #[schema(example = 1500.00)]
    pub balance: Decimal,
    /// Most recent transactions on this account
    pub recent_transactions: Vec<TransactionResponse>,
}

/// One parsed statement row to import
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportTransactionItemDto {
    /// Transaction amount (must be positive)
    #[validate(custom(
        function = "validate_positive_amount",
        message = "Amount must be positive"
    ))]
    pub amount: Decimal,

    /// expense or income (transfers cannot be imported)
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Date of the transaction
    pub transaction_date: NaiveDate,

    /// Optional description
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    /// Category (optional)
    pub category_id: Option<Uuid>,

    /// Essential spending flag
    #[serde(default)]
    pub is_essential: bool,
}

/// Request body for the bulk import
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportTransactionsDto {
    /// Account the rows are imported into
    pub account_id: Uuid,

    /// Parsed statement rows
    #[validate(length(min = 1, max = 500, message = "Import must contain 1-500 rows"))]
    #[validate(nested)]
    pub transactions: Vec<ImportTransactionItemDto>,
}

/// Result of a bulk import
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResultResponse {
    /// Number of transactions created
    #[schema(example = 42)]
    pub imported_count: usize,
    /// The created transactions
    pub transactions: Vec<TransactionResponse>,
}

/// Path parameters for transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionIdPath {
    /// Transaction UUID
    pub id: Uuid,
}
