use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{Category, CreateCategoryDto, UpdateCategoryDto};
use crate::dates::{month_range, previous_month};
use crate::errors::AppError;

/// Credit/debit cents a category moved in one calendar month.
/// Credit counts income and incoming transfers; debit counts expenses and
/// outgoing transfers.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct CategoryMonthAmounts {
    pub credit_cents: i64,
    pub debit_cents: i64,
}

/// Historical reference amounts for a category, shown next to planned values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryAverages {
    pub previous_month: CategoryMonthAmounts,
    pub same_month_previous_year: CategoryMonthAmounts,
    pub last_12_months: CategoryMonthAmounts,
    pub lifetime: CategoryMonthAmounts,
}

/// Service layer for category business logic.
pub struct CategoryService;

impl CategoryService {
    /// List categories for a user, optionally only active ones.
    pub async fn list_categories(
        pool: &PgPool,
        owner_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Category>, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, owner_id, name, description, category_type, status,
                   exclude_from_budgets, color_gradient, created_at, updated_at
            FROM categories
            WHERE owner_id = $1
              AND ($2 = FALSE OR status = 'active')
            ORDER BY name ASC
            "#,
        )
        .bind(owner_id)
        .bind(only_active)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Get a category by ID, ensuring the requesting user owns it.
    pub async fn get_category_by_id(
        pool: &PgPool,
        category_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, owner_id, name, description, category_type, status,
                   exclude_from_budgets, color_gradient, created_at, updated_at
            FROM categories
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Create a new category.
    pub async fn create_category(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateCategoryDto,
    ) -> Result<Category, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (owner_id, name, description, category_type,
                                    exclude_from_budgets, color_gradient)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, name, description, category_type, status,
                      exclude_from_budgets, color_gradient, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(&dto.description)
        .bind(dto.category_type.as_str())
        .bind(dto.exclude_from_budgets)
        .bind(&dto.color_gradient)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Update a category (partial update - PATCH semantics).
    pub async fn update_category(
        pool: &PgPool,
        category_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateCategoryDto,
    ) -> Result<Category, AppError> {
        let current = Self::get_category_by_id(pool, category_id, owner_id).await?;

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

        let new_description = dto.description.clone().or(current.description);
        let new_type = dto
            .category_type
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(&current.category_type);
        let new_status = dto.status.as_ref().unwrap_or(&current.status);
        let new_exclude = dto
            .exclude_from_budgets
            .unwrap_or(current.exclude_from_budgets);
        let new_color = dto.color_gradient.as_ref().unwrap_or(&current.color_gradient);

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $3,
                description = $4,
                category_type = $5,
                status = $6,
                exclude_from_budgets = $7,
                color_gradient = $8,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, description, category_type, status,
                      exclude_from_budgets, color_gradient, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(&new_description)
        .bind(new_type)
        .bind(new_status)
        .bind(new_exclude)
        .bind(new_color)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete a category. Transactions keep existing with a NULL category.
    pub async fn delete_category(
        pool: &PgPool,
        category_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(category_id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        Ok(())
    }

    /// Credit/debit moved by a category inside one calendar month.
    pub async fn amounts_in_month(
        pool: &PgPool,
        owner_id: Uuid,
        category_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<CategoryMonthAmounts, AppError> {
        let (start, end) = month_range(month, year);

        sqlx::query_as::<_, CategoryMonthAmounts>(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'income'
                                    OR (t.transaction_type = 'transfer' AND t.account_to_id IS NOT NULL)
                                  THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as credit_cents,
                CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'expense'
                                    OR (t.transaction_type = 'transfer' AND t.account_from_id IS NOT NULL)
                                  THEN t.amount_cents ELSE 0 END), 0) AS BIGINT) as debit_cents
            FROM transactions t
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

    /// Average monthly credit/debit over the 12 months before `(month, year)`.
    pub async fn average_last_12_months(
        pool: &PgPool,
        owner_id: Uuid,
        category_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<CategoryMonthAmounts, AppError> {
        let (_, end) = month_range(month, year);
        let (start_month, start_year) = {
            // 11 full months back plus the current one makes 12
            let mut m = month;
            let mut y = year;
            for _ in 0..11 {
                let (pm, py) = previous_month(m, y);
                m = pm;
                y = py;
            }
            (m, y)
        };
        let (start, _) = month_range(start_month, start_year);

        sqlx::query_as::<_, CategoryMonthAmounts>(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'income'
                                    OR (t.transaction_type = 'transfer' AND t.account_to_id IS NOT NULL)
                                  THEN t.amount_cents ELSE 0 END), 0) / 12 AS BIGINT) as credit_cents,
                CAST(COALESCE(SUM(CASE WHEN t.transaction_type = 'expense'
                                    OR (t.transaction_type = 'transfer' AND t.account_from_id IS NOT NULL)
                                  THEN t.amount_cents ELSE 0 END), 0) / 12 AS BIGINT) as debit_cents
            FROM transactions t
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

    /// Average credit/debit per month with activity, over the whole history.
    pub async fn average_lifetime(
        pool: &PgPool,
        owner_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryMonthAmounts, AppError> {
        sqlx::query_as::<_, CategoryMonthAmounts>(
            r#"
            SELECT
                CAST(COALESCE(AVG(monthly.credit), 0) AS BIGINT) as credit_cents,
                CAST(COALESCE(AVG(monthly.debit), 0) AS BIGINT) as debit_cents
            FROM (
                SELECT
                    date_trunc('month', t.transaction_date) as bucket,
                    SUM(CASE WHEN t.transaction_type = 'income'
                               OR (t.transaction_type = 'transfer' AND t.account_to_id IS NOT NULL)
                             THEN t.amount_cents ELSE 0 END) as credit,
                    SUM(CASE WHEN t.transaction_type = 'expense'
                               OR (t.transaction_type = 'transfer' AND t.account_from_id IS NOT NULL)
                             THEN t.amount_cents ELSE 0 END) as debit
                FROM transactions t
                WHERE t.owner_id = $1 AND t.category_id = $2
                GROUP BY bucket
            ) monthly
            "#,
        )
        .bind(owner_id)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Bundle of the four historical reference amounts for a category,
    /// relative to `(month, year)`.
    pub async fn historical_averages(
        pool: &PgPool,
        owner_id: Uuid,
        category_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<CategoryAverages, AppError> {
        let (prev_month, prev_year) = previous_month(month, year);

        let previous_month =
            Self::amounts_in_month(pool, owner_id, category_id, prev_month, prev_year).await?;
        let same_month_previous_year =
            Self::amounts_in_month(pool, owner_id, category_id, month, year - 1).await?;
        let last_12_months =
            Self::average_last_12_months(pool, owner_id, category_id, month, year).await?;
        let lifetime = Self::average_lifetime(pool, owner_id, category_id).await?;

        Ok(CategoryAverages {
            previous_month,
            same_month_previous_year,
            last_12_months,
            lifetime,
        })
    }
}
