use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::money::cents_to_decimal;

lazy_static! {
    /// Ticker symbols: uppercase letters, digits, dots and dashes
    static ref TICKER_RE: Regex = Regex::new(r"^[A-Z0-9.\-]{1,12}$").expect("valid regex");
}

/// Asset class enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stocks,
    Etf,
    Crypto,
    FixedIncome,
    IndexFunds,
    InvestmentFunds,
    P2pLoans,
    Ppr,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stocks => "stocks",
            AssetType::Etf => "etf",
            AssetType::Crypto => "crypto",
            AssetType::FixedIncome => "fixed_income",
            AssetType::IndexFunds => "index_funds",
            AssetType::InvestmentFunds => "investment_funds",
            AssetType::P2pLoans => "p2p_loans",
            AssetType::Ppr => "ppr",
        }
    }
}

/// Buy/sell enum for asset transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvestTrxType {
    Buy,
    Sell,
}

impl InvestTrxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestTrxType::Buy => "buy",
            InvestTrxType::Sell => "sell",
        }
    }
}

/// Validate a ticker symbol
fn validate_ticker(value: &str) -> Result<(), ValidationError> {
    if TICKER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_ticker"))
    }
}

/// Asset row joined with its lifetime buy/sell totals
#[derive(Debug, Clone, FromRow)]
pub struct InvestAssetRow {
    pub id: Uuid,
    #[allow(dead_code)]
    pub owner_id: Uuid,
    pub name: String,
    pub ticker: Option<String>,
    pub asset_type: String,
    pub broker: Option<String>,
    pub units: Decimal,
    pub current_value_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub invested_cents: i64,
    pub withdrawn_cents: i64,
}

/// Asset information returned in responses, with ROI
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestAssetResponse {
    /// Unique asset identifier
    pub id: Uuid,
    /// Asset name
    #[schema(example = "World ETF")]
    pub name: String,
    /// Ticker symbol
    #[schema(example = "VWCE")]
    pub ticker: Option<String>,
    /// Asset class
    #[serde(rename = "type")]
    #[schema(example = "etf")]
    pub asset_type: String,
    /// Broker holding the asset
    pub broker: Option<String>,
    /// Units held
    #[schema(example = 12.5)]
    pub units: Decimal,
    /// Current market value
    #[schema(example = 1250.00)]
    pub current_value: Decimal,
    /// Lifetime amount invested
    #[schema(example = 1000.00)]
    pub invested_value: Decimal,
    /// Lifetime amount withdrawn
    #[schema(example = 0.00)]
    pub withdrawn_value: Decimal,
    /// Current value plus withdrawals minus investment
    #[schema(example = 250.00)]
    pub absolute_roi_value: Decimal,
    /// ROI as a percentage of the invested amount; null when nothing invested
    pub relative_roi_percentage: Option<Decimal>,
    /// Asset status (active, inactive)
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Database entity for invest transactions
#[derive(Debug, Clone, FromRow)]
pub struct InvestTransaction {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub trx_type: String,
    pub trx_date: NaiveDate,
    pub total_cents: i64,
    pub units: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invest transaction returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestTransactionResponse {
    /// Unique transaction identifier
    pub id: Uuid,
    /// Asset traded
    pub asset_id: Uuid,
    /// buy or sell
    #[serde(rename = "type")]
    #[schema(example = "buy")]
    pub trx_type: String,
    /// Trade date
    pub trx_date: NaiveDate,
    /// Total amount moved
    #[schema(example = 500.00)]
    pub total_amount: Decimal,
    /// Units traded
    #[schema(example = 5.0)]
    pub units: Decimal,
    /// Optional note
    pub note: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<InvestTransaction> for InvestTransactionResponse {
    fn from(t: InvestTransaction) -> Self {
        Self {
            id: t.id,
            asset_id: t.asset_id,
            trx_type: t.trx_type,
            trx_date: t.trx_date,
            total_amount: cents_to_decimal(t.total_cents),
            units: t.units,
            note: t.note,
            created_at: t.created_at,
        }
    }
}

/// Request body for creating an asset
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetDto {
    /// Asset name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "World ETF")]
    pub name: String,

    /// Ticker symbol (uppercase, max 12 chars)
    #[validate(custom(function = "validate_ticker", message = "Invalid ticker symbol"))]
    #[schema(example = "VWCE")]
    pub ticker: Option<String>,

    /// Asset class
    #[serde(rename = "type")]
    pub asset_type: AssetType,

    /// Broker holding the asset
    #[validate(length(max = 50, message = "Broker must be at most 50 characters"))]
    pub broker: Option<String>,
}

/// Request body for updating an asset (PATCH semantics)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetDto {
    /// Asset name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    /// Ticker symbol
    #[validate(custom(function = "validate_ticker", message = "Invalid ticker symbol"))]
    pub ticker: Option<String>,

    /// Asset class
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,

    /// Broker holding the asset
    #[validate(length(max = 50, message = "Broker must be at most 50 characters"))]
    pub broker: Option<String>,

    /// Asset status (active, inactive)
    pub status: Option<String>,
}

/// Request body for updating the current market value of an asset
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetValueDto {
    /// Current market value of the whole position
    #[schema(example = 1250.00)]
    pub current_value: Decimal,
}

/// Request body for recording a buy/sell
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestTransactionDto {
    /// Asset traded
    pub asset_id: Uuid,

    /// buy or sell
    #[serde(rename = "type")]
    pub trx_type: InvestTrxType,

    /// Trade date
    pub trx_date: NaiveDate,

    /// Total amount moved (must not be negative)
    #[schema(example = 500.00)]
    pub total_amount: Decimal,

    /// Units traded (must be positive)
    #[schema(example = 5.0)]
    pub units: Decimal,

    /// Optional note (max 200 chars)
    #[validate(length(max = 200, message = "Note cannot exceed 200 characters"))]
    pub note: Option<String>,
}

/// Share of the portfolio's current value held in one asset class
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeDistribution {
    /// Asset class
    #[serde(rename = "type")]
    #[schema(example = "etf")]
    pub asset_type: String,
    /// Current value held in this class
    pub current_value: Decimal,
    /// Percentage of the portfolio (0-100)
    #[schema(example = 62.5)]
    pub percentage: Decimal,
}

/// One of the best-performing assets
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformingAsset {
    /// Asset identifier
    pub id: Uuid,
    /// Asset name
    pub name: String,
    /// Asset class
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Current market value
    pub current_value: Decimal,
    /// Current value plus withdrawals minus investment
    pub absolute_roi_value: Decimal,
    /// ROI as a percentage of the invested amount; null when nothing invested
    pub relative_roi_percentage: Option<Decimal>,
}

/// Portfolio statistics for the invest dashboard
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestStatsResponse {
    /// Lifetime amount invested
    pub total_invested_value: Decimal,
    /// Current portfolio value
    pub total_current_value: Decimal,
    /// Lifetime gain: current value plus withdrawals minus investment
    pub global_roi_value: Decimal,
    /// Lifetime gain as a percentage of the invested amount
    pub global_roi_percentage: Option<Decimal>,
    /// Gain since the end of last year, net of money moved this year
    pub current_year_roi_value: Decimal,
    /// Year gain as a percentage of the year's starting point
    pub current_year_roi_percentage: Option<Decimal>,
    /// Current value split by asset class
    pub current_value_distribution: Vec<AssetTypeDistribution>,
    /// Top assets by absolute ROI
    pub top_performing_assets: Vec<TopPerformingAsset>,
}

/// Path parameters for asset ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct AssetIdPath {
    /// Asset UUID
    pub id: Uuid,
}

/// Path parameters for invest transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct InvestTrxIdPath {
    /// Invest transaction UUID
    pub id: Uuid,
}
