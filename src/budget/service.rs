use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{
    Budget, BudgetAmounts, BudgetCategoryDetail, BudgetDetailResponse, CategoryPlannedValuesDto,
    CreateBudgetDto, ListBudgetsQuery, NewBudgetCategoryData, NewBudgetFormDataResponse,
    UpdateBudgetDto,
};
use crate::account::service::{AccountService, InvestmentMonthAmounts};
use crate::category::service::{CategoryMonthAmounts, CategoryService};
use crate::dates::{month_range, previous_month};
use crate::errors::AppError;
use crate::money::{cents_to_decimal, decimal_to_cents, percentage_of};

/// One active category joined with the budget's planned values
#[derive(Debug, FromRow)]
pub struct BudgetCategoryRow {
    pub category_id: Uuid,
    pub name: String,
    pub category_type: String,
    pub color_gradient: String,
    pub exclude_from_budgets: bool,
    pub planned_credit_cents: i64,
    pub planned_debit_cents: i64,
}

/// Resolved per-category contribution to the budget fold
#[derive(Debug, Clone, Copy)]
pub struct CategoryContribution {
    pub excluded: bool,
    pub credit_cents: i64,
    pub debit_cents: i64,
}

/// Resolve what a category contributes to a budget.
///
/// Open budgets plan forward, so the planned amounts count; closed budgets
/// look back, so the actual month amounts count, minus whatever moved
/// through investment accounts (unrealized gains/losses stay out).
pub fn resolve_contribution(
    is_open: bool,
    row: &BudgetCategoryRow,
    actual: CategoryMonthAmounts,
    investment: InvestmentMonthAmounts,
) -> CategoryContribution {
    let (credit_cents, debit_cents) = if is_open {
        (
            row.planned_credit_cents.abs(),
            row.planned_debit_cents.abs(),
        )
    } else {
        (
            actual.credit_cents.abs() - investment.credit_cents,
            actual.debit_cents.abs() - investment.debit_cents,
        )
    };

    CategoryContribution {
        excluded: row.exclude_from_budgets,
        credit_cents,
        debit_cents,
    }
}

/// Budget balance: credits minus debits over non-excluded categories.
pub fn fold_balance(contributions: &[CategoryContribution]) -> i64 {
    contributions
        .iter()
        .filter(|c| !c.excluded)
        .map(|c| c.credit_cents - c.debit_cents)
        .sum()
}

/// Credit and debit totals over non-excluded categories.
pub fn fold_sums(contributions: &[CategoryContribution]) -> (i64, i64) {
    contributions
        .iter()
        .filter(|c| !c.excluded)
        .fold((0, 0), |(credit, debit), c| {
            (credit + c.credit_cents, debit + c.debit_cents)
        })
}

/// Balance as a percentage of credits; 0 when nothing was credited.
pub fn savings_rate_percentage(balance_cents: i64, credit_cents: i64) -> Decimal {
    if credit_cents == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(balance_cents) / Decimal::from(credit_cents) * Decimal::ONE_HUNDRED).normalize()
}

/// Service layer for budget business logic.
pub struct BudgetService;

impl BudgetService {
    /// All active categories of the user joined with this budget's planned values.
    async fn categories_for_budget(
        pool: &PgPool,
        owner_id: Uuid,
        budget_id: Uuid,
    ) -> Result<Vec<BudgetCategoryRow>, AppError> {
        sqlx::query_as::<_, BudgetCategoryRow>(
            r#"
            SELECT c.id as category_id, c.name, c.category_type, c.color_gradient,
                   c.exclude_from_budgets,
                   COALESCE(bc.planned_credit_cents, 0) as planned_credit_cents,
                   COALESCE(bc.planned_debit_cents, 0) as planned_debit_cents
            FROM categories c
            LEFT JOIN budget_categories bc
                   ON bc.category_id = c.id AND bc.budget_id = $2
            WHERE c.owner_id = $1 AND c.status = 'active'
            ORDER BY c.name ASC
            "#,
        )
        .bind(owner_id)
        .bind(budget_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Resolve every category's contribution for this budget.
    async fn contributions(
        pool: &PgPool,
        owner_id: Uuid,
        budget: &Budget,
        rows: &[BudgetCategoryRow],
    ) -> Result<Vec<CategoryContribution>, AppError> {
        let mut contributions = Vec::with_capacity(rows.len());
        for row in rows {
            let (actual, investment) = if budget.is_open {
                (
                    CategoryMonthAmounts::default(),
                    InvestmentMonthAmounts::default(),
                )
            } else {
                let actual = CategoryService::amounts_in_month(
                    pool,
                    owner_id,
                    row.category_id,
                    budget.month,
                    budget.year,
                )
                .await?;
                let investment = AccountService::investment_amounts_for_category_in_month(
                    pool,
                    owner_id,
                    row.category_id,
                    budget.month,
                    budget.year,
                )
                .await?;
                (actual, investment)
            };

            contributions.push(resolve_contribution(budget.is_open, row, actual, investment));
        }
        Ok(contributions)
    }

    /// Compute the balance, change percentage, sums and savings rate of a budget.
    pub async fn compute_amounts(
        pool: &PgPool,
        owner_id: Uuid,
        budget: &Budget,
    ) -> Result<BudgetAmounts, AppError> {
        let rows = Self::categories_for_budget(pool, owner_id, budget.id).await?;
        let contributions = Self::contributions(pool, owner_id, budget, &rows).await?;

        let balance_cents = fold_balance(&contributions);
        let (credit_cents, debit_cents) = fold_sums(&contributions);

        let (prev_month, prev_year) = previous_month(budget.month, budget.year);
        let initial_cents =
            AccountService::balance_snapshot_cents(pool, owner_id, prev_month, prev_year).await?;

        Ok(BudgetAmounts {
            balance_cents,
            balance_change_percentage: percentage_of(balance_cents, initial_cents),
            credit_cents,
            debit_cents,
            savings_rate_percentage: savings_rate_percentage(balance_cents, credit_cents),
        })
    }

    /// Paginated, searchable budget list.
    pub async fn list_budgets_page(
        pool: &PgPool,
        owner_id: Uuid,
        query: &ListBudgetsQuery,
    ) -> Result<(Vec<Budget>, i64, i64), AppError> {
        let pattern = query.query.as_ref().map(|q| format!("%{}%", q.trim()));
        let offset = query.page * query.page_size;

        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, owner_id, month, year, observations, is_open, created_at, updated_at
            FROM budgets
            WHERE owner_id = $1
              AND ($2::text IS NULL OR observations ILIKE $2
                   OR CAST(month AS TEXT) ILIKE $2 OR CAST(year AS TEXT) ILIKE $2)
              AND ($3::boolean IS NULL OR is_open = $3)
            ORDER BY year DESC, month DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(owner_id)
        .bind(&pattern)
        .bind(query.is_open)
        .bind(query.page_size)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let filtered_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM budgets
            WHERE owner_id = $1
              AND ($2::text IS NULL OR observations ILIKE $2
                   OR CAST(month AS TEXT) ILIKE $2 OR CAST(year AS TEXT) ILIKE $2)
              AND ($3::boolean IS NULL OR is_open = $3)
            "#,
        )
        .bind(owner_id)
        .bind(&pattern)
        .bind(query.is_open)
        .fetch_one(pool)
        .await?;

        let total_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM budgets WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;

        Ok((budgets, filtered_count, total_count))
    }

    /// Get a budget by ID, ensuring the requesting user owns it.
    pub async fn get_budget_by_id(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Budget, AppError> {
        sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, owner_id, month, year, observations, is_open, created_at, updated_at
            FROM budgets
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(budget_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Budget not found".to_string()))
    }

    /// Get a budget by month and year.
    pub async fn get_budget_by_month_year(
        pool: &PgPool,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<Budget, AppError> {
        sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, owner_id, month, year, observations, is_open, created_at, updated_at
            FROM budgets
            WHERE owner_id = $1 AND month = $2 AND year = $3
            "#,
        )
        .bind(owner_id)
        .bind(month)
        .bind(year)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Budget not found for {month}/{year}")))
    }

    /// Upsert planned category values for a budget.
    /// Categories must belong to the owner.
    async fn upsert_planned_values(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
        budget_id: Uuid,
        values: &[CategoryPlannedValuesDto],
    ) -> Result<(), AppError> {
        if values.is_empty() {
            return Ok(());
        }

        let category_ids: Vec<Uuid> = values.iter().map(|v| v.category_id).collect();
        let owned_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE id = ANY($1) AND owner_id = $2",
        )
        .bind(&category_ids)
        .bind(owner_id)
        .fetch_one(&mut **tx)
        .await?;

        if owned_count != category_ids.len() as i64 {
            return Err(AppError::NotFound(
                "One or more categories not found or access denied".to_string(),
            ));
        }

        for value in values {
            let planned_credit_cents = decimal_to_cents(value.planned_credit)?.abs();
            let planned_debit_cents = decimal_to_cents(value.planned_debit)?.abs();

            sqlx::query(
                r#"
                INSERT INTO budget_categories
                    (budget_id, category_id, planned_credit_cents, planned_debit_cents)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (budget_id, category_id)
                DO UPDATE SET planned_credit_cents = EXCLUDED.planned_credit_cents,
                              planned_debit_cents = EXCLUDED.planned_debit_cents
                "#,
            )
            .bind(budget_id)
            .bind(value.category_id)
            .bind(planned_credit_cents)
            .bind(planned_debit_cents)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Create a budget together with its planned category values.
    pub async fn create_budget(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateBudgetDto,
    ) -> Result<Budget, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM budgets WHERE owner_id = $1 AND month = $2 AND year = $3",
        )
        .bind(owner_id)
        .bind(dto.month)
        .bind(dto.year)
        .fetch_one(pool)
        .await?;

        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "Budget already exists for {}/{}",
                dto.month, dto.year
            )));
        }

        let mut tx = pool.begin().await?;

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (owner_id, month, year, observations, is_open)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, owner_id, month, year, observations, is_open, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(dto.month)
        .bind(dto.year)
        .bind(dto.observations.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await?;

        Self::upsert_planned_values(&mut tx, owner_id, budget.id, &dto.categories).await?;

        tx.commit().await?;

        Ok(budget)
    }

    /// Update a budget and upsert planned values (PATCH semantics).
    pub async fn update_budget(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateBudgetDto,
    ) -> Result<Budget, AppError> {
        let current = Self::get_budget_by_id(pool, budget_id, owner_id).await?;

        let new_month = dto.month.unwrap_or(current.month);
        let new_year = dto.year.unwrap_or(current.year);
        let new_observations = dto
            .observations
            .clone()
            .unwrap_or_else(|| current.observations.clone());

        if new_month != current.month || new_year != current.year {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM budgets WHERE owner_id = $1 AND month = $2 AND year = $3 AND id != $4",
            )
            .bind(owner_id)
            .bind(new_month)
            .bind(new_year)
            .bind(budget_id)
            .fetch_one(pool)
            .await?;

            if exists > 0 {
                return Err(AppError::Conflict(format!(
                    "Budget already exists for {new_month}/{new_year}"
                )));
            }
        }

        let mut tx = pool.begin().await?;

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets
            SET month = $3, year = $4, observations = $5, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, month, year, observations, is_open, created_at, updated_at
            "#,
        )
        .bind(budget_id)
        .bind(owner_id)
        .bind(new_month)
        .bind(new_year)
        .bind(&new_observations)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(values) = &dto.categories {
            Self::upsert_planned_values(&mut tx, owner_id, budget_id, values).await?;
        }

        tx.commit().await?;

        Ok(budget)
    }

    /// Open or close a budget.
    pub async fn change_status(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
        is_open: bool,
    ) -> Result<Budget, AppError> {
        sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets
            SET is_open = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, month, year, observations, is_open, created_at, updated_at
            "#,
        )
        .bind(budget_id)
        .bind(owner_id)
        .bind(is_open)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Budget not found".to_string()))
    }

    /// Delete a budget. Planned values go with it via FK cascade.
    pub async fn delete_budget(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND owner_id = $2")
            .bind(budget_id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Budget not found".to_string()));
        }

        Ok(())
    }

    /// Total of essential debit transactions inside the budget month.
    async fn essential_debit_total_cents(
        pool: &PgPool,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<i64, AppError> {
        let (start, end) = month_range(month, year);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(amount_cents), 0) AS BIGINT)
            FROM transactions
            WHERE owner_id = $1
              AND is_essential
              AND transaction_type IN ('expense', 'transfer')
              AND transaction_date >= $2
              AND transaction_date < $3
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Full budget detail: categories with planned, current and historical
    /// amounts, initial balance and essential spending.
    pub async fn get_budget_detail(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
    ) -> Result<BudgetDetailResponse, AppError> {
        let budget = Self::get_budget_by_id(pool, budget_id, owner_id).await?;
        let rows = Self::categories_for_budget(pool, owner_id, budget.id).await?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            let actual = CategoryService::amounts_in_month(
                pool,
                owner_id,
                row.category_id,
                budget.month,
                budget.year,
            )
            .await?;
            let investment = AccountService::investment_amounts_for_category_in_month(
                pool,
                owner_id,
                row.category_id,
                budget.month,
                budget.year,
            )
            .await?;
            let averages = CategoryService::historical_averages(
                pool,
                owner_id,
                row.category_id,
                budget.month,
                budget.year,
            )
            .await?;

            let mut detail = BudgetCategoryDetail {
                category_id: row.category_id,
                name: row.name,
                category_type: row.category_type,
                color_gradient: row.color_gradient,
                exclude_from_budgets: row.exclude_from_budgets,
                planned_credit: cents_to_decimal(row.planned_credit_cents),
                planned_debit: cents_to_decimal(row.planned_debit_cents),
                current_credit: Decimal::ZERO,
                current_debit: Decimal::ZERO,
                avg_previous_month_credit: Decimal::ZERO,
                avg_previous_month_debit: Decimal::ZERO,
                avg_same_month_previous_year_credit: Decimal::ZERO,
                avg_same_month_previous_year_debit: Decimal::ZERO,
                avg_12_months_credit: Decimal::ZERO,
                avg_12_months_debit: Decimal::ZERO,
                avg_lifetime_credit: Decimal::ZERO,
                avg_lifetime_debit: Decimal::ZERO,
            };
            detail.set_current(CategoryMonthAmounts {
                credit_cents: actual.credit_cents - investment.credit_cents,
                debit_cents: actual.debit_cents - investment.debit_cents,
            });
            detail.set_averages(&averages);
            categories.push(detail);
        }

        let (prev_month, prev_year) = previous_month(budget.month, budget.year);
        let initial_cents =
            AccountService::balance_snapshot_cents(pool, owner_id, prev_month, prev_year).await?;
        let essential_cents =
            Self::essential_debit_total_cents(pool, owner_id, budget.month, budget.year).await?;

        Ok(BudgetDetailResponse {
            id: budget.id,
            month: budget.month,
            year: budget.year,
            observations: budget.observations,
            is_open: budget.is_open,
            initial_balance: cents_to_decimal(initial_cents),
            debit_essential_trx_total: cents_to_decimal(essential_cents),
            categories,
        })
    }

    /// Reference data for composing a new budget: every active category with
    /// its historical averages, plus the current net-worth starting point.
    pub async fn new_budget_form_data(
        pool: &PgPool,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<NewBudgetFormDataResponse, AppError> {
        let categories = CategoryService::list_categories(pool, owner_id, true).await?;

        let mut data = Vec::with_capacity(categories.len());
        for category in categories {
            let averages =
                CategoryService::historical_averages(pool, owner_id, category.id, month, year)
                    .await?;
            data.push(NewBudgetCategoryData::new(
                category.id,
                category.name,
                category.category_type,
                category.color_gradient,
                category.exclude_from_budgets,
                &averages,
            ));
        }

        let (prev_month, prev_year) = previous_month(month, year);
        let initial_cents =
            AccountService::balance_snapshot_cents(pool, owner_id, prev_month, prev_year).await?;

        Ok(NewBudgetFormDataResponse {
            categories: data,
            initial_balance: cents_to_decimal(initial_cents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(excluded: bool, planned_credit: i64, planned_debit: i64) -> BudgetCategoryRow {
        BudgetCategoryRow {
            category_id: Uuid::new_v4(),
            name: "test".to_string(),
            category_type: "mixed".to_string(),
            color_gradient: "blue".to_string(),
            exclude_from_budgets: excluded,
            planned_credit_cents: planned_credit,
            planned_debit_cents: planned_debit,
        }
    }

    fn amounts(credit: i64, debit: i64) -> CategoryMonthAmounts {
        CategoryMonthAmounts {
            credit_cents: credit,
            debit_cents: debit,
        }
    }

    fn invest(credit: i64, debit: i64) -> InvestmentMonthAmounts {
        InvestmentMonthAmounts {
            credit_cents: credit,
            debit_cents: debit,
        }
    }

    #[test]
    fn test_open_budget_uses_planned_amounts() {
        let r = row(false, 200_000, 50_000);
        let c = resolve_contribution(true, &r, amounts(999, 999), invest(999, 999));
        assert_eq!(c.credit_cents, 200_000);
        assert_eq!(c.debit_cents, 50_000);
    }

    #[test]
    fn test_closed_budget_uses_actuals_minus_investment_flows() {
        let r = row(false, 200_000, 50_000);
        // 1500.00 earned, 400.00 spent; 200.00 of the credit came through
        // an investment account and must not count
        let c = resolve_contribution(false, &r, amounts(150_000, 40_000), invest(20_000, 0));
        assert_eq!(c.credit_cents, 130_000);
        assert_eq!(c.debit_cents, 40_000);
    }

    #[test]
    fn test_negative_planned_amounts_count_absolute() {
        let r = row(false, -80_000, -30_000);
        let c = resolve_contribution(true, &r, amounts(0, 0), invest(0, 0));
        assert_eq!(c.credit_cents, 80_000);
        assert_eq!(c.debit_cents, 30_000);
    }

    #[test]
    fn test_balance_is_credits_minus_debits_over_non_excluded() {
        let contributions = vec![
            CategoryContribution {
                excluded: false,
                credit_cents: 200_000,
                debit_cents: 50_000,
            },
            CategoryContribution {
                excluded: false,
                credit_cents: 0,
                debit_cents: 30_000,
            },
            CategoryContribution {
                excluded: true,
                credit_cents: 999_999,
                debit_cents: 1,
            },
        ];
        assert_eq!(fold_balance(&contributions), 120_000);
    }

    #[test]
    fn test_sums_skip_excluded_categories() {
        let contributions = vec![
            CategoryContribution {
                excluded: false,
                credit_cents: 100_000,
                debit_cents: 25_000,
            },
            CategoryContribution {
                excluded: true,
                credit_cents: 77_000,
                debit_cents: 12_000,
            },
        ];
        assert_eq!(fold_sums(&contributions), (100_000, 25_000));
    }

    #[test]
    fn test_empty_budget_balances_to_zero() {
        assert_eq!(fold_balance(&[]), 0);
        assert_eq!(fold_sums(&[]), (0, 0));
    }

    #[test]
    fn test_savings_rate_zero_credit_is_zero() {
        assert_eq!(savings_rate_percentage(50_000, 0), Decimal::ZERO);
    }

    #[test]
    fn test_savings_rate_percentage_of_credits() {
        let rate = savings_rate_percentage(35_000, 200_000);
        assert_eq!(rate, Decimal::new(175, 1)); // 17.5
    }

    #[test]
    fn test_savings_rate_negative_balance() {
        let rate = savings_rate_percentage(-50_000, 200_000);
        assert_eq!(rate, Decimal::from(-25));
    }
}
