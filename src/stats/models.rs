use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Net worth at the end of one month
#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatrimonyMonth {
    /// Month (1-12)
    #[schema(example = 6)]
    pub month: i16,
    /// Year
    #[schema(example = 2025)]
    pub year: i16,
    /// Total account balance at month end
    #[schema(example = 12500.00)]
    pub net_worth: Decimal,
}

/// Net worth evolution series
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatrimonyEvolutionResponse {
    /// Month-by-month net worth, oldest first
    pub months: Vec<PatrimonyMonth>,
}

/// One category slice of a month or year distribution
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDistributionItem {
    /// Category identifier
    pub category_id: Uuid,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Category kind (credit, debit, mixed)
    #[serde(rename = "type")]
    pub category_type: String,
    /// Display gradient slug
    pub color_gradient: String,
    /// Income credited through this category
    pub current_credit: Decimal,
    /// Spending debited through this category
    pub current_debit: Decimal,
    /// Planned income, when a budget exists for the period
    pub planned_credit: Option<Decimal>,
    /// Planned spending, when a budget exists for the period
    pub planned_debit: Option<Decimal>,
}

/// Per-category distribution of a single month
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthDistributionResponse {
    /// Month (1-12)
    pub month: i16,
    /// Year
    pub year: i16,
    /// Per-category amounts
    pub categories: Vec<CategoryDistributionItem>,
    /// Total income of the month
    pub total_income: Decimal,
    /// Total expenses of the month
    pub total_expenses: Decimal,
}

/// Per-category distribution of a whole year
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearByYearResponse {
    /// Year
    pub year: i16,
    /// Per-category amounts
    pub categories: Vec<CategoryDistributionItem>,
    /// Total income of the year
    pub total_income: Decimal,
    /// Total expenses of the year
    pub total_expenses: Decimal,
}

/// Query parameters for the month distribution
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct MonthDistributionQuery {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i16,

    #[validate(range(min = 1970, max = 2100, message = "Year must be between 1970 and 2100"))]
    pub year: i16,
}

/// Query parameters for the year-by-year distribution
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct YearByYearQuery {
    #[validate(range(min = 1970, max = 2100, message = "Year must be between 1970 and 2100"))]
    pub year: i16,
}
