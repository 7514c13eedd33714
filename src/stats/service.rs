use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{
    CategoryDistributionItem, MonthDistributionResponse, PatrimonyEvolutionResponse,
    PatrimonyMonth, YearByYearResponse,
};
use crate::dates::month_range;
use crate::errors::AppError;
use crate::money::cents_to_decimal;

/// Net effect transactions had on account balances inside one month
#[derive(Debug, Clone, Copy, FromRow)]
pub struct MonthlyEffectRow {
    pub month: i16,
    pub year: i16,
    pub effect_cents: i64,
}

/// Per-category sums with optional planned values
#[derive(Debug, FromRow)]
struct CategorySumsRow {
    category_id: Uuid,
    name: String,
    category_type: String,
    color_gradient: String,
    credit_cents: i64,
    debit_cents: i64,
    planned_credit_cents: Option<i64>,
    planned_debit_cents: Option<i64>,
}

/// Walk backwards from the current total: the value at the end of each
/// month is the value of the following month minus that month's net effect.
/// Effects must be sorted oldest first; gaps between them count as zero.
pub fn patrimony_series(
    current_total_cents: i64,
    effects: &[MonthlyEffectRow],
    current_month: i16,
    current_year: i16,
) -> Vec<PatrimonyMonth> {
    let Some(first) = effects.first() else {
        return Vec::new();
    };

    // Month sequence from the first recorded effect up to now
    let mut months = Vec::new();
    let (mut m, mut y) = (first.month, first.year);
    loop {
        months.push((m, y));
        if (y, m) >= (current_year, current_month) {
            break;
        }
        if m == 12 {
            m = 1;
            y += 1;
        } else {
            m += 1;
        }
    }

    let effect_for = |month: i16, year: i16| -> i64 {
        effects
            .iter()
            .find(|e| e.month == month && e.year == year)
            .map(|e| e.effect_cents)
            .unwrap_or(0)
    };

    // Value at the end of the latest month is the current total; every
    // earlier month subtracts the effects that came after it
    let mut series = vec![0i64; months.len()];
    let mut value = current_total_cents;
    for idx in (0..months.len()).rev() {
        series[idx] = value;
        let (month, year) = months[idx];
        value -= effect_for(month, year);
    }

    months
        .into_iter()
        .zip(series)
        .map(|((month, year), cents)| PatrimonyMonth {
            month,
            year,
            net_worth: cents_to_decimal(cents),
        })
        .collect()
}

/// Service layer for dashboard statistics.
pub struct StatsService;

impl StatsService {
    /// Month-by-month net worth from the first transaction to now.
    pub async fn patrimony_evolution(
        pool: &PgPool,
        owner_id: Uuid,
        current_month: i16,
        current_year: i16,
    ) -> Result<PatrimonyEvolutionResponse, AppError> {
        let current_total = sqlx::query_scalar::<_, i64>(
            "SELECT CAST(COALESCE(SUM(balance_cents), 0) AS BIGINT) FROM accounts WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        let effects = sqlx::query_as::<_, MonthlyEffectRow>(
            r#"
            SELECT CAST(EXTRACT(MONTH FROM bucket) AS SMALLINT) as month,
                   CAST(EXTRACT(YEAR FROM bucket) AS SMALLINT) as year,
                   effect_cents
            FROM (
                SELECT date_trunc('month', t.transaction_date) as bucket,
                       CAST(SUM(CASE WHEN t.account_to_id IS NOT NULL THEN t.amount_cents ELSE 0 END
                         - CASE WHEN t.account_from_id IS NOT NULL THEN t.amount_cents ELSE 0 END)
                           AS BIGINT) as effect_cents
                FROM transactions t
                WHERE t.owner_id = $1
                GROUP BY bucket
            ) monthly
            ORDER BY bucket ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(PatrimonyEvolutionResponse {
            months: patrimony_series(current_total, &effects, current_month, current_year),
        })
    }

    /// Per-category credit/debit inside a date range, with planned values
    /// when a budget row exists for the period.
    async fn category_sums(
        pool: &PgPool,
        owner_id: Uuid,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        budget_month: Option<(i16, i16)>,
    ) -> Result<Vec<CategorySumsRow>, AppError> {
        let (month, year) = budget_month.unzip();

        sqlx::query_as::<_, CategorySumsRow>(
            r#"
            SELECT c.id as category_id, c.name, c.category_type, c.color_gradient,
                   CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'income'
                                       OR (t.transaction_type = 'transfer' AND t.account_to_id IS NOT NULL)
                                     THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as credit_cents,
                   CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'expense'
                                       OR (t.transaction_type = 'transfer' AND t.account_from_id IS NOT NULL)
                                     THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as debit_cents,
                   bc.planned_credit_cents, bc.planned_debit_cents
            FROM categories c
            LEFT JOIN transactions t
                   ON t.category_id = c.id
                  AND t.transaction_date >= $2 AND t.transaction_date < $3
            LEFT JOIN budgets b
                   ON b.owner_id = c.owner_id AND b.month = $4 AND b.year = $5
            LEFT JOIN budget_categories bc
                   ON bc.budget_id = b.id AND bc.category_id = c.id
            WHERE c.owner_id = $1 AND c.status = 'active'
            GROUP BY c.id, bc.planned_credit_cents, bc.planned_debit_cents
            ORDER BY c.name ASC
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .bind(month)
        .bind(year)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    fn distribution_items(rows: Vec<CategorySumsRow>) -> (Vec<CategoryDistributionItem>, i64, i64) {
        let mut total_income = 0;
        let mut total_expenses = 0;
        let items = rows
            .into_iter()
            .map(|row| {
                total_income += row.credit_cents;
                total_expenses += row.debit_cents;
                CategoryDistributionItem {
                    category_id: row.category_id,
                    name: row.name,
                    category_type: row.category_type,
                    color_gradient: row.color_gradient,
                    current_credit: cents_to_decimal(row.credit_cents),
                    current_debit: cents_to_decimal(row.debit_cents),
                    planned_credit: row.planned_credit_cents.map(cents_to_decimal),
                    planned_debit: row.planned_debit_cents.map(cents_to_decimal),
                }
            })
            .collect();
        (items, total_income, total_expenses)
    }

    /// Per-category expenses/income distribution of one month.
    pub async fn month_distribution(
        pool: &PgPool,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<MonthDistributionResponse, AppError> {
        let (start, end) = month_range(month, year);
        let rows = Self::category_sums(pool, owner_id, start, end, Some((month, year))).await?;
        let (categories, total_income, total_expenses) = Self::distribution_items(rows);

        Ok(MonthDistributionResponse {
            month,
            year,
            categories,
            total_income: cents_to_decimal(total_income),
            total_expenses: cents_to_decimal(total_expenses),
        })
    }

    /// Per-category expenses/income distribution of one year.
    pub async fn year_by_year(
        pool: &PgPool,
        owner_id: Uuid,
        year: i16,
    ) -> Result<YearByYearResponse, AppError> {
        let (start, _) = month_range(1, year);
        let (_, end) = month_range(12, year);
        let rows = Self::category_sums(pool, owner_id, start, end, None).await?;
        let (categories, total_income, total_expenses) = Self::distribution_items(rows);

        Ok(YearByYearResponse {
            year,
            categories,
            total_income: cents_to_decimal(total_income),
            total_expenses: cents_to_decimal(total_expenses),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn effect(month: i16, year: i16, cents: i64) -> MonthlyEffectRow {
        MonthlyEffectRow {
            month,
            year,
            effect_cents: cents,
        }
    }

    #[test]
    fn test_empty_history_yields_empty_series() {
        assert!(patrimony_series(100_000, &[], 6, 2025).is_empty());
    }

    #[test]
    fn test_latest_month_equals_current_total() {
        let effects = vec![effect(5, 2025, 20_000), effect(6, 2025, 30_000)];
        let series = patrimony_series(150_000, &effects, 6, 2025);
        assert_eq!(series.last().unwrap().net_worth, Decimal::new(150_000, 2));
    }

    #[test]
    fn test_earlier_months_subtract_later_effects() {
        // Now worth 1500.00; June added 300.00, May added 200.00
        let effects = vec![effect(5, 2025, 20_000), effect(6, 2025, 30_000)];
        let series = patrimony_series(150_000, &effects, 6, 2025);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].net_worth, Decimal::new(120_000, 2)); // end of May
        assert_eq!(series[1].net_worth, Decimal::new(150_000, 2)); // end of June
    }

    #[test]
    fn test_gap_months_carry_value_forward() {
        // Activity in January and March only; February keeps January's value
        let effects = vec![effect(1, 2025, 50_000), effect(3, 2025, 10_000)];
        let series = patrimony_series(60_000, &effects, 3, 2025);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].net_worth, Decimal::new(50_000, 2));
        assert_eq!(series[1].net_worth, Decimal::new(50_000, 2));
        assert_eq!(series[2].net_worth, Decimal::new(60_000, 2));
    }

    #[test]
    fn test_series_spans_year_boundary() {
        let effects = vec![effect(12, 2024, 10_000)];
        let series = patrimony_series(10_000, &effects, 1, 2025);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].month, 12);
        assert_eq!(series[0].year, 2024);
        assert_eq!(series[1].month, 1);
        assert_eq!(series[1].year, 2025);
    }
}
