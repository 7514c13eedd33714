use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::money::cents_to_decimal;

/// Account type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Checking account for daily transactions
    Checking,
    /// Savings account
    Savings,
    /// Investment/brokerage account (excluded from budget actuals)
    Investment,
    /// Credit card account
    Credit,
    /// Meal allowance card
    Meal,
    /// Cash wallet
    Wallet,
    /// Anything else
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Investment => "investment",
            AccountType::Credit => "credit",
            AccountType::Meal => "meal",
            AccountType::Wallet => "wallet",
            AccountType::Other => "other",
        }
    }

    #[allow(dead_code)]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checking" => Some(AccountType::Checking),
            "savings" => Some(AccountType::Savings),
            "investment" => Some(AccountType::Investment),
            "credit" => Some(AccountType::Credit),
            "meal" => Some(AccountType::Meal),
            "wallet" => Some(AccountType::Wallet),
            "other" => Some(AccountType::Other),
            _ => None,
        }
    }
}

/// Allowed display gradient slugs, mirrored in the web client's palette
pub const COLOR_GRADIENTS: [&str; 9] = [
    "red", "blue", "green", "orange", "purple", "pink", "dark-gray", "light-gray", "dark-blue",
];

/// Validate a color gradient slug
pub fn validate_color_gradient(value: &str) -> Result<(), ValidationError> {
    if COLOR_GRADIENTS.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_color_gradient"))
    }
}

/// Database entity for accounts. Balance is stored in cents.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    #[allow(dead_code)]
    pub owner_id: Uuid,
    pub name: String,
    pub account_type: String,
    pub balance_cents: i64,
    pub exclude_from_budgets: bool,
    pub status: String,
    pub color_gradient: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Unique account identifier
    pub id: Uuid,
    /// Account name
    #[schema(example = "Daily checking")]
    pub name: String,
    /// Account type
    #[serde(rename = "type")]
    #[schema(example = "checking")]
    pub account_type: String,
    /// Current balance
    #[schema(example = 1500.00)]
    pub balance: Decimal,
    /// Whether this account is ignored by budget actuals
    pub exclude_from_budgets: bool,
    /// Account status (active, inactive)
    #[schema(example = "active")]
    pub status: String,
    /// Display gradient slug
    #[schema(example = "blue")]
    pub color_gradient: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl AccountResponse {
    pub fn from_account(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            account_type: account.account_type,
            balance: cents_to_decimal(account.balance_cents),
            exclude_from_budgets: account.exclude_from_budgets,
            status: account.status,
            color_gradient: account.color_gradient,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Dashboard summary buckets folded from account balances
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountsSummary {
    /// Checking, meal, wallet and other balances
    #[schema(example = 2500.00)]
    pub operating_funds: Decimal,
    /// Savings and investment account balances
    #[schema(example = 10000.00)]
    pub investing: Decimal,
    /// Credit account balances (usually negative)
    #[schema(example = -300.00)]
    pub debt: Decimal,
    /// Sum of everything
    #[schema(example = 12200.00)]
    pub net_worth: Decimal,
    /// Number of accounts
    #[schema(example = 4)]
    pub accounts_count: i64,
}

/// Response for accounts with summary
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountsSummaryResponse {
    /// List of accounts
    pub accounts: Vec<AccountResponse>,
    /// Financial summary
    pub summary: AccountsSummary,
}

/// Summary row from the aggregation query
#[derive(Debug, FromRow)]
pub struct SummaryRow {
    pub operating_cents: Option<i64>,
    pub investing_cents: Option<i64>,
    pub debt_cents: Option<i64>,
    pub accounts_count: Option<i64>,
}

/// Request body for creating an account
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountDto {
    /// Account name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Daily checking")]
    pub name: String,

    /// Account type
    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Initial balance (defaults to 0)
    #[serde(default)]
    #[schema(example = 1000.00)]
    pub balance: Option<Decimal>,

    /// Ignore this account when computing budget actuals
    #[serde(default)]
    pub exclude_from_budgets: bool,

    /// Display gradient slug
    #[validate(custom(
        function = "validate_color_gradient",
        message = "Unknown color gradient"
    ))]
    #[schema(example = "blue")]
    pub color_gradient: String,
}

/// Request body for updating an account (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountDto {
    /// Account name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Emergency fund")]
    pub name: Option<String>,

    /// Account type
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,

    /// Account status (active, inactive)
    #[schema(example = "active")]
    pub status: Option<String>,

    /// Ignore this account when computing budget actuals
    pub exclude_from_budgets: Option<bool>,

    /// Display gradient slug
    #[schema(example = "green")]
    pub color_gradient: Option<String>,
}

impl UpdateAccountDto {
    /// Validate optional fields the derive macro can't reach
    pub fn validate_optionals(&self) -> Result<(), ValidationError> {
        if let Some(color) = &self.color_gradient {
            validate_color_gradient(color)?;
        }
        if let Some(status) = &self.status {
            if status != "active" && status != "inactive" {
                return Err(ValidationError::new("invalid_status"));
            }
        }
        Ok(())
    }
}

/// Request body for a manual balance adjustment
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalanceDto {
    /// New balance value
    #[schema(example = 2500.00)]
    pub balance: Decimal,
}

/// Path parameters for account ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct AccountIdPath {
    /// Account UUID
    pub id: Uuid,
}
