use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::category::service::{CategoryAverages, CategoryMonthAmounts};
use crate::money::cents_to_decimal;

/// Database entity for budgets
#[derive(Debug, Clone, FromRow)]
pub struct Budget {
    pub id: Uuid,
    #[allow(dead_code)]
    pub owner_id: Uuid,
    pub month: i16,
    pub year: i16,
    pub observations: String,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Computed amounts decorating a budget in list responses
#[derive(Debug, Clone, Copy)]
pub struct BudgetAmounts {
    pub balance_cents: i64,
    pub balance_change_percentage: Option<Decimal>,
    pub credit_cents: i64,
    pub debit_cents: i64,
    pub savings_rate_percentage: Decimal,
}

/// Budget list item with computed amounts
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetListItem {
    /// Unique budget identifier
    pub id: Uuid,
    /// Budget month (1-12)
    #[schema(example = 6)]
    pub month: i16,
    /// Budget year
    #[schema(example = 2025)]
    pub year: i16,
    /// Free-form notes
    pub observations: String,
    /// Whether the budget is still open (uses planned amounts)
    pub is_open: bool,
    /// Credits minus debits over non-excluded categories
    #[schema(example = 350.00)]
    pub balance: Decimal,
    /// Balance as a percentage of the previous month-end net worth;
    /// null when that starting point is zero
    pub balance_change_percentage: Option<Decimal>,
    /// Total credit side
    #[schema(example = 2000.00)]
    pub credit_amount: Decimal,
    /// Total debit side
    #[schema(example = 1650.00)]
    pub debit_amount: Decimal,
    /// Balance as a percentage of credits (0 when there are no credits)
    #[schema(example = 17.5)]
    pub savings_rate_percentage: Decimal,
}

impl BudgetListItem {
    pub fn from_budget(budget: Budget, amounts: BudgetAmounts) -> Self {
        Self {
            id: budget.id,
            month: budget.month,
            year: budget.year,
            observations: budget.observations,
            is_open: budget.is_open,
            balance: cents_to_decimal(amounts.balance_cents),
            balance_change_percentage: amounts.balance_change_percentage,
            credit_amount: cents_to_decimal(amounts.credit_cents),
            debit_amount: cents_to_decimal(amounts.debit_cents),
            savings_rate_percentage: amounts.savings_rate_percentage,
        }
    }
}

/// Paginated budget list
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedBudgetsResponse {
    /// Budgets on this page
    pub results: Vec<BudgetListItem>,
    /// Budgets matching the filters
    #[schema(example = 12)]
    pub filtered_count: i64,
    /// All budgets of the user
    #[schema(example = 36)]
    pub total_count: i64,
    /// Page used
    #[schema(example = 0)]
    pub page: i64,
    /// Page size used
    #[schema(example = 15)]
    pub page_size: i64,
}

/// One category inside a budget detail, with planned, current, and
/// historical reference amounts
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoryDetail {
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
    /// Whether the category is ignored by budget math
    pub exclude_from_budgets: bool,
    /// Planned income for this budget
    pub planned_credit: Decimal,
    /// Planned spending for this budget
    pub planned_debit: Decimal,
    /// Actual income so far (investment flows stripped)
    pub current_credit: Decimal,
    /// Actual spending so far (investment flows stripped)
    pub current_debit: Decimal,
    /// Previous month actuals
    pub avg_previous_month_credit: Decimal,
    pub avg_previous_month_debit: Decimal,
    /// Same month last year actuals
    pub avg_same_month_previous_year_credit: Decimal,
    pub avg_same_month_previous_year_debit: Decimal,
    /// Monthly average over the last 12 months
    pub avg_12_months_credit: Decimal,
    pub avg_12_months_debit: Decimal,
    /// Monthly average over the whole history
    pub avg_lifetime_credit: Decimal,
    pub avg_lifetime_debit: Decimal,
}

impl BudgetCategoryDetail {
    pub fn set_averages(&mut self, averages: &CategoryAverages) {
        self.avg_previous_month_credit = abs_decimal(averages.previous_month.credit_cents);
        self.avg_previous_month_debit = abs_decimal(averages.previous_month.debit_cents);
        self.avg_same_month_previous_year_credit =
            abs_decimal(averages.same_month_previous_year.credit_cents);
        self.avg_same_month_previous_year_debit =
            abs_decimal(averages.same_month_previous_year.debit_cents);
        self.avg_12_months_credit = abs_decimal(averages.last_12_months.credit_cents);
        self.avg_12_months_debit = abs_decimal(averages.last_12_months.debit_cents);
        self.avg_lifetime_credit = abs_decimal(averages.lifetime.credit_cents);
        self.avg_lifetime_debit = abs_decimal(averages.lifetime.debit_cents);
    }

    pub fn set_current(&mut self, amounts: CategoryMonthAmounts) {
        self.current_credit = abs_decimal(amounts.credit_cents);
        self.current_debit = abs_decimal(amounts.debit_cents);
    }
}

fn abs_decimal(cents: i64) -> Decimal {
    cents_to_decimal(cents.abs())
}

/// Full budget detail
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDetailResponse {
    /// Unique budget identifier
    pub id: Uuid,
    /// Budget month (1-12)
    pub month: i16,
    /// Budget year
    pub year: i16,
    /// Free-form notes
    pub observations: String,
    /// Whether the budget is still open
    pub is_open: bool,
    /// Net worth at the end of the previous month
    pub initial_balance: Decimal,
    /// Total of essential debit transactions in the budget month
    pub debit_essential_trx_total: Decimal,
    /// Categories with planned/current/historical amounts
    pub categories: Vec<BudgetCategoryDetail>,
}

/// Category reference data offered when composing a new budget
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetCategoryData {
    pub category_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: String,
    pub color_gradient: String,
    pub exclude_from_budgets: bool,
    pub avg_previous_month_credit: Decimal,
    pub avg_previous_month_debit: Decimal,
    pub avg_same_month_previous_year_credit: Decimal,
    pub avg_same_month_previous_year_debit: Decimal,
    pub avg_12_months_credit: Decimal,
    pub avg_12_months_debit: Decimal,
    pub avg_lifetime_credit: Decimal,
    pub avg_lifetime_debit: Decimal,
}

impl NewBudgetCategoryData {
    pub fn new(
        category_id: Uuid,
        name: String,
        category_type: String,
        color_gradient: String,
        exclude_from_budgets: bool,
        averages: &CategoryAverages,
    ) -> Self {
        Self {
            category_id,
            name,
            category_type,
            color_gradient,
            exclude_from_budgets,
            avg_previous_month_credit: abs_decimal(averages.previous_month.credit_cents),
            avg_previous_month_debit: abs_decimal(averages.previous_month.debit_cents),
            avg_same_month_previous_year_credit: abs_decimal(
                averages.same_month_previous_year.credit_cents,
            ),
            avg_same_month_previous_year_debit: abs_decimal(
                averages.same_month_previous_year.debit_cents,
            ),
            avg_12_months_credit: abs_decimal(averages.last_12_months.credit_cents),
            avg_12_months_debit: abs_decimal(averages.last_12_months.debit_cents),
            avg_lifetime_credit: abs_decimal(averages.lifetime.credit_cents),
            avg_lifetime_debit: abs_decimal(averages.lifetime.debit_cents),
        }
    }
}

/// Response for the new-budget form
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetFormDataResponse {
    pub categories: Vec<NewBudgetCategoryData>,
    /// Net worth at the end of the previous month
    pub initial_balance: Decimal,
}

/// Planned values for one category inside a create/update request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPlannedValuesDto {
    /// Category identifier
    pub category_id: Uuid,
    /// Planned income
    #[schema(example = 2000.00)]
    pub planned_credit: Decimal,
    /// Planned spending
    #[schema(example = 450.00)]
    pub planned_debit: Decimal,
}

/// Request body for creating a budget
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetDto {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    #[schema(example = 6)]
    pub month: i16,

    #[validate(range(min = 1970, max = 2100, message = "Year must be between 1970 and 2100"))]
    #[schema(example = 2025)]
    pub year: i16,

    /// Free-form notes
    #[validate(length(max = 500, message = "Observations cannot exceed 500 characters"))]
    #[serde(default)]
    pub observations: Option<String>,

    /// Planned values per category
    #[serde(default)]
    pub categories: Vec<CategoryPlannedValuesDto>,
}

/// Request body for updating a budget (PATCH semantics)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetDto {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: Option<i16>,

    #[validate(range(min = 1970, max = 2100, message = "Year must be between 1970 and 2100"))]
    pub year: Option<i16>,

    #[validate(length(max = 500, message = "Observations cannot exceed 500 characters"))]
    pub observations: Option<String>,

    /// Planned values per category (upserted; absent categories keep theirs)
    pub categories: Option<Vec<CategoryPlannedValuesDto>>,
}

/// Request body for opening/closing a budget
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetStatusDto {
    /// true reopens the budget, false closes it
    pub is_open: bool,
}

/// Path parameters for budget ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct BudgetIdPath {
    /// Budget UUID
    pub id: Uuid,
}

/// Path parameters for month/year lookup
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct MonthYearPath {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i16,

    #[validate(range(min = 1970, max = 2100, message = "Year must be between 1970 and 2100"))]
    pub year: i16,
}

/// Query parameters for the paginated budget list
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListBudgetsQuery {
    /// Zero-based page
    #[validate(range(min = 0))]
    #[serde(default)]
    #[param(example = 0)]
    pub page: i64,

    /// Page size (1-100)
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    #[param(example = 15)]
    pub page_size: i64,

    /// Text searched in observations, month and year
    #[param(example = "vacation")]
    pub query: Option<String>,

    /// Filter on open state
    pub is_open: Option<bool>,
}

fn default_page_size() -> i64 {
    15
}
