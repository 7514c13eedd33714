use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{Account, AccountsSummary, CreateAccountDto, SummaryRow, UpdateAccountDto};
use crate::dates::month_range;
use crate::errors::AppError;
use crate::money::{cents_to_decimal, decimal_to_cents};

/// Credit/debit cents a set of transactions moved through investment accounts.
/// Used by the budget pipeline to strip unrealized gains and losses.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct InvestmentMonthAmounts {
    pub credit_cents: i64,
    pub debit_cents: i64,
}

/// Service layer for account business logic.
pub struct AccountService;

impl AccountService {
    /// List all accounts for a user.
    pub async fn list_accounts(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Account>, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner_id, name, account_type, balance_cents, exclude_from_budgets,
                   status, color_gradient, created_at, updated_at
            FROM accounts
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Get an account by ID, ensuring the requesting user owns it.
    pub async fn get_account_by_id(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner_id, name, account_type, balance_cents, exclude_from_budgets,
                   status, color_gradient, created_at, updated_at
            FROM accounts
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Fold account balances into the dashboard summary buckets.
    pub async fn get_accounts_summary(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<(Vec<Account>, AccountsSummary), AppError> {
        let accounts = Self::list_accounts(pool, owner_id).await?;

        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN account_type IN ('checking', 'meal', 'wallet', 'other')
                                  THEN balance_cents ELSE 0 END), 0) AS BIGINT) as operating_cents,
                CAST(COALESCE(SUM(CASE WHEN account_type IN ('savings', 'investment')
                                  THEN balance_cents ELSE 0 END), 0) AS BIGINT) as investing_cents,
                CAST(COALESCE(SUM(CASE WHEN account_type = 'credit'
                                  THEN balance_cents ELSE 0 END), 0) AS BIGINT) as debt_cents,
                COUNT(*) as accounts_count
            FROM accounts
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        let operating = row.operating_cents.unwrap_or(0);
        let investing = row.investing_cents.unwrap_or(0);
        let debt = row.debt_cents.unwrap_or(0);

        let summary = AccountsSummary {
            operating_funds: cents_to_decimal(operating),
            investing: cents_to_decimal(investing),
            debt: cents_to_decimal(debt),
            net_worth: cents_to_decimal(operating + investing + debt),
            accounts_count: row.accounts_count.unwrap_or(0),
        };

        Ok((accounts, summary))
    }

    /// Create a new account.
    pub async fn create_account(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateAccountDto,
    ) -> Result<Account, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let balance_cents = match dto.balance {
            Some(value) => decimal_to_cents(value)?,
            None => 0,
        };

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner_id, name, account_type, balance_cents,
                                  exclude_from_budgets, color_gradient)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, name, account_type, balance_cents, exclude_from_budgets,
                      status, color_gradient, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(dto.account_type.as_str())
        .bind(balance_cents)
        .bind(dto.exclude_from_budgets)
        .bind(&dto.color_gradient)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Update an account (partial update - PATCH semantics).
    pub async fn update_account(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateAccountDto,
    ) -> Result<Account, AppError> {
        let current = Self::get_account_by_id(pool, account_id, owner_id).await?;

        let new_name = match &dto.name {
            Some(n) => {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Name cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => current.name,
        };

        let new_type = dto
            .account_type
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(&current.account_type);
        let new_status = dto.status.as_ref().unwrap_or(&current.status);
        let new_exclude = dto
            .exclude_from_budgets
            .unwrap_or(current.exclude_from_budgets);
        let new_color = dto.color_gradient.as_ref().unwrap_or(&current.color_gradient);

        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                name = $3,
                account_type = $4,
                status = $5,
                exclude_from_budgets = $6,
                color_gradient = $7,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, account_type, balance_cents, exclude_from_budgets,
                      status, color_gradient, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(new_type)
        .bind(new_status)
        .bind(new_exclude)
        .bind(new_color)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Set the balance directly (manual adjustment).
    pub async fn update_balance(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
        balance_cents: i64,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance_cents = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, account_type, balance_cents, exclude_from_budgets,
                      status, color_gradient, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .bind(balance_cents)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Delete an account.
    pub async fn delete_account(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND owner_id = $2")
            .bind(account_id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        Ok(())
    }

    /// Total balance of non-excluded accounts at the end of a given month.
    ///
    /// Derived backwards: current balances minus the effect of every
    /// transaction dated after that month.
    pub async fn balance_snapshot_cents(
        pool: &PgPool,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<i64, AppError> {
        let (_, end) = month_range(month, year);

        let current_total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(balance_cents), 0) AS BIGINT)
            FROM accounts
            WHERE owner_id = $1 AND NOT exclude_from_budgets
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        let later_effects = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(
                CASE WHEN ta.id IS NOT NULL AND NOT ta.exclude_from_budgets
                     THEN t.amount_cents ELSE 0 END
              - CASE WHEN tf.id IS NOT NULL AND NOT tf.exclude_from_budgets
                     THEN t.amount_cents ELSE 0 END), 0) AS BIGINT)
            FROM transactions t
            LEFT JOIN accounts ta ON ta.id = t.account_to_id
            LEFT JOIN accounts tf ON tf.id = t.account_from_id
            WHERE t.owner_id = $1 AND t.transaction_date >= $2
            "#,
        )
        .bind(owner_id)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(current_total - later_effects)
    }

    /// Credit/debit a category moved through investment accounts in a month.
    pub async fn investment_amounts_for_category_in_month(
        pool: &PgPool,
        owner_id: Uuid,
        category_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<InvestmentMonthAmounts, AppError> {
        let (start, end) = month_range(month, year);

        sqlx::query_as::<_, InvestmentMonthAmounts>(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN ta.account_type = 'investment'
                                  THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as credit_cents,
                CAST(COALESCE(SUM(CASE WHEN tf.account_type = 'investment'
                                  THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as debit_cents
            FROM transactions t
            LEFT JOIN accounts ta ON ta.id = t.account_to_id
            LEFT JOIN accounts tf ON tf.id = t.account_from_id
            WHERE t.owner_id = $1
              AND t.category_id = $2
              AND t.transaction_date >= $3
              AND t.transaction_date < $4
            "#,
        )
        .bind(owner_id)
        .bind(category_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }
}
