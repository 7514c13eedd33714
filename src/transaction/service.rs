use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    CreateTransactionDto, ImportTransactionsDto, Transaction, TransactionFilters, TransactionType,
    UpdateTransactionDto,
};
use crate::errors::AppError;
use crate::money::decimal_to_cents;

/// Indicates whether to apply or reverse a balance effect
#[derive(Debug, Clone, Copy)]
enum BalanceOperation {
    Apply,
    Reverse,
}

/// Values for one row about to be inserted
struct NewTransactionRow<'a> {
    amount_cents: i64,
    trx_type: TransactionType,
    date: chrono::NaiveDate,
    description: Option<&'a str>,
    category_id: Option<Uuid>,
    account_from_id: Option<Uuid>,
    account_to_id: Option<Uuid>,
    is_essential: bool,
}

/// Signed balance deltas a transaction causes per account.
///
/// Income credits the destination, expense debits the source, and a
/// transfer does both.
pub fn account_effects(
    trx_type: TransactionType,
    amount_cents: i64,
    account_from: Option<Uuid>,
    account_to: Option<Uuid>,
) -> Vec<(Uuid, i64)> {
    let mut effects = Vec::with_capacity(2);
    match trx_type {
        TransactionType::Expense => {
            if let Some(from) = account_from {
                effects.push((from, -amount_cents));
            }
        }
        TransactionType::Income => {
            if let Some(to) = account_to {
                effects.push((to, amount_cents));
            }
        }
        TransactionType::Transfer => {
            if let Some(from) = account_from {
                effects.push((from, -amount_cents));
            }
            if let Some(to) = account_to {
                effects.push((to, amount_cents));
            }
        }
    }
    effects
}

/// Each transaction type requires its own account shape.
pub fn validate_account_shape(
    trx_type: TransactionType,
    account_from: Option<Uuid>,
    account_to: Option<Uuid>,
) -> Result<(), AppError> {
    let valid = match trx_type {
        TransactionType::Expense => account_from.is_some() && account_to.is_none(),
        TransactionType::Income => account_to.is_some() && account_from.is_none(),
        TransactionType::Transfer => {
            account_from.is_some() && account_to.is_some() && account_from != account_to
        }
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError(match trx_type {
            TransactionType::Expense => {
                "Expense requires accountFromId and no accountToId".to_string()
            }
            TransactionType::Income => {
                "Income requires accountToId and no accountFromId".to_string()
            }
            TransactionType::Transfer => {
                "Transfer requires two distinct accounts".to_string()
            }
        }))
    }
}

/// Service layer for transaction business logic.
/// All balance updates run inside a database transaction.
pub struct TransactionService;

impl TransactionService {
    /// Verify the user owns an account, inside the current transaction.
    async fn verify_account_ownership(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let valid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 AND owner_id = $2)",
        )
        .bind(account_id)
        .bind(owner_id)
        .fetch_one(&mut **tx)
        .await?;

        if !valid {
            return Err(AppError::NotFound(
                "Account not found or access denied".to_string(),
            ));
        }
        Ok(())
    }

    /// Verify the user owns a category, inside the current transaction.
    async fn verify_category_ownership(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        category_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let valid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND owner_id = $2)",
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_one(&mut **tx)
        .await?;

        if !valid {
            return Err(AppError::NotFound(
                "Category not found or access denied".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply or reverse the balance effects of a transaction.
    async fn update_account_balances(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        transaction: &Transaction,
        operation: BalanceOperation,
    ) -> Result<(), AppError> {
        let effects = account_effects(
            transaction.get_type(),
            transaction.amount_cents,
            transaction.account_from_id,
            transaction.account_to_id,
        );

        for (account_id, delta) in effects {
            let adjustment = match operation {
                BalanceOperation::Apply => delta,
                BalanceOperation::Reverse => -delta,
            };

            // Account may have been deleted meanwhile; the FK sets the
            // reference to NULL, so a missing row is fine to skip
            sqlx::query(
                "UPDATE accounts SET balance_cents = balance_cents + $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(adjustment)
            .bind(account_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Insert one transaction row and apply its balance effects.
    async fn insert_transaction(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
        row: NewTransactionRow<'_>,
    ) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (owner_id, amount_cents, transaction_type, transaction_date, description,
                 category_id, account_from_id, account_to_id, is_essential)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, owner_id, amount_cents, transaction_type, transaction_date,
                      description, category_id, account_from_id, account_to_id, is_essential,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(row.amount_cents)
        .bind(row.trx_type.as_str())
        .bind(row.date)
        .bind(row.description)
        .bind(row.category_id)
        .bind(row.account_from_id)
        .bind(row.account_to_id)
        .bind(row.is_essential)
        .fetch_one(&mut **tx)
        .await?;

        Self::update_account_balances(tx, &transaction, BalanceOperation::Apply).await?;

        Ok(transaction)
    }

    /// Create a transaction with atomic balance update.
    pub async fn create_transaction(
        pool: &PgPool,
        owner_id: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<Transaction, AppError> {
        validate_account_shape(dto.transaction_type, dto.account_from_id, dto.account_to_id)?;
        let amount_cents = decimal_to_cents(dto.amount)?;

        let mut tx = pool.begin().await?;

        if let Some(category_id) = dto.category_id {
            Self::verify_category_ownership(&mut tx, category_id, owner_id).await?;
        }
        for account_id in [dto.account_from_id, dto.account_to_id].into_iter().flatten() {
            Self::verify_account_ownership(&mut tx, account_id, owner_id).await?;
        }

        let transaction = Self::insert_transaction(
            &mut tx,
            owner_id,
            NewTransactionRow {
                amount_cents,
                trx_type: dto.transaction_type,
                date: dto.transaction_date,
                description: dto.description.as_deref(),
                category_id: dto.category_id,
                account_from_id: dto.account_from_id,
                account_to_id: dto.account_to_id,
                is_essential: dto.is_essential,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Update a transaction: reverse the old balance effects, apply the new ones.
    pub async fn update_transaction(
        pool: &PgPool,
        owner_id: Uuid,
        transaction_id: Uuid,
        dto: UpdateTransactionDto,
    ) -> Result<Transaction, AppError> {
        let mut tx = pool.begin().await?;

        // Fetch and lock the existing transaction
        let old = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, amount_cents, transaction_type, transaction_date,
                   description, category_id, account_from_id, account_to_id, is_essential,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        // Resolve final values (PATCH semantics; inner None detaches)
        let new_amount_cents = match dto.amount {
            Some(amount) => decimal_to_cents(amount)?,
            None => old.amount_cents,
        };
        let new_type = dto.transaction_type.unwrap_or(old.get_type());
        let new_date = dto.transaction_date.unwrap_or(old.transaction_date);
        let new_description = dto.description.or_else(|| old.description.clone());
        let new_category_id = match dto.category_id {
            Some(value) => value,
            None => old.category_id,
        };
        let new_account_from = match dto.account_from_id {
            Some(value) => value,
            None => old.account_from_id,
        };
        let new_account_to = match dto.account_to_id {
            Some(value) => value,
            None => old.account_to_id,
        };
        let new_essential = dto.is_essential.unwrap_or(old.is_essential);

        validate_account_shape(new_type, new_account_from, new_account_to)?;

        if let Some(category_id) = new_category_id {
            if old.category_id != Some(category_id) {
                Self::verify_category_ownership(&mut tx, category_id, owner_id).await?;
            }
        }
        for account_id in [new_account_from, new_account_to].into_iter().flatten() {
            Self::verify_account_ownership(&mut tx, account_id, owner_id).await?;
        }

        // Reverse the old effects before writing the new state
        Self::update_account_balances(&mut tx, &old, BalanceOperation::Reverse).await?;

        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET
                amount_cents = $2,
                transaction_type = $3,
                transaction_date = $4,
                description = $5,
                category_id = $6,
                account_from_id = $7,
                account_to_id = $8,
                is_essential = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, amount_cents, transaction_type, transaction_date,
                      description, category_id, account_from_id, account_to_id, is_essential,
                      created_at, updated_at
            "#,
        )
        .bind(transaction_id)
        .bind(new_amount_cents)
        .bind(new_type.as_str())
        .bind(new_date)
        .bind(&new_description)
        .bind(new_category_id)
        .bind(new_account_from)
        .bind(new_account_to)
        .bind(new_essential)
        .fetch_one(&mut *tx)
        .await?;

        Self::update_account_balances(&mut tx, &updated, BalanceOperation::Apply).await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a transaction with atomic balance restoration.
    pub async fn delete_transaction(
        pool: &PgPool,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, amount_cents, transaction_type, transaction_date,
                   description, category_id, account_from_id, account_to_id, is_essential,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        Self::update_account_balances(&mut tx, &transaction, BalanceOperation::Reverse).await?;

        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get a single transaction by ID.
    pub async fn get_transaction(
        pool: &PgPool,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, amount_cents, transaction_type, transaction_date,
                   description, category_id, account_from_id, account_to_id, is_essential,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(transaction_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// List transactions with filters and text search.
    pub async fn list_transactions(
        pool: &PgPool,
        owner_id: Uuid,
        filters: &TransactionFilters,
    ) -> Result<(Vec<Transaction>, i64), AppError> {
        let limit = filters.limit.min(100);
        let pattern = filters.query.as_ref().map(|q| format!("%{}%", q.trim()));

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, amount_cents, transaction_type, transaction_date,
                   description, category_id, account_from_id, account_to_id, is_essential,
                   created_at, updated_at
            FROM transactions t
            WHERE t.owner_id = $1
              AND ($2::date IS NULL OR t.transaction_date >= $2)
              AND ($3::date IS NULL OR t.transaction_date <= $3)
              AND ($4::uuid IS NULL OR t.category_id = $4)
              AND ($5::uuid IS NULL OR t.account_from_id = $5 OR t.account_to_id = $5)
              AND ($6::text IS NULL OR t.transaction_type = $6)
              AND ($7::boolean IS NULL OR t.is_essential = $7)
              AND ($8::text IS NULL OR t.description ILIKE $8)
            ORDER BY t.transaction_date DESC, t.created_at DESC
            LIMIT $9 OFFSET $10
            "#,
        )
        .bind(owner_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(filters.category_id)
        .bind(filters.account_id)
        .bind(&filters.transaction_type)
        .bind(filters.is_essential)
        .bind(&pattern)
        .bind(limit)
        .bind(filters.offset)
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM transactions t
            WHERE t.owner_id = $1
              AND ($2::date IS NULL OR t.transaction_date >= $2)
              AND ($3::date IS NULL OR t.transaction_date <= $3)
              AND ($4::uuid IS NULL OR t.category_id = $4)
              AND ($5::uuid IS NULL OR t.account_from_id = $5 OR t.account_to_id = $5)
              AND ($6::text IS NULL OR t.transaction_type = $6)
              AND ($7::boolean IS NULL OR t.is_essential = $7)
              AND ($8::text IS NULL OR t.description ILIKE $8)
            "#,
        )
        .bind(owner_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(filters.category_id)
        .bind(filters.account_id)
        .bind(&filters.transaction_type)
        .bind(filters.is_essential)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        Ok((transactions, total))
    }

    /// Recent transactions on one account, newest first.
    pub async fn recent_for_account(
        pool: &PgPool,
        owner_id: Uuid,
        account_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, amount_cents, transaction_type, transaction_date,
                   description, category_id, account_from_id, account_to_id, is_essential,
                   created_at, updated_at
            FROM transactions
            WHERE owner_id = $1
              AND (account_from_id = $2 OR account_to_id = $2)
            ORDER BY transaction_date DESC, created_at DESC
            LIMIT $3
            "#,
        )
        .bind(owner_id)
        .bind(account_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Import parsed statement rows into one account, atomically.
    pub async fn import_transactions(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &ImportTransactionsDto,
    ) -> Result<Vec<Transaction>, AppError> {
        let mut tx = pool.begin().await?;

        Self::verify_account_ownership(&mut tx, dto.account_id, owner_id).await?;

        let mut created = Vec::with_capacity(dto.transactions.len());
        for item in &dto.transactions {
            let (account_from, account_to) = match item.transaction_type {
                TransactionType::Expense => (Some(dto.account_id), None),
                TransactionType::Income => (None, Some(dto.account_id)),
                TransactionType::Transfer => {
                    return Err(AppError::ValidationError(
                        "Transfers cannot be imported from a statement".to_string(),
                    ))
                }
            };

            if let Some(category_id) = item.category_id {
                Self::verify_category_ownership(&mut tx, category_id, owner_id).await?;
            }

            let amount_cents = decimal_to_cents(item.amount)?;
            let transaction = Self::insert_transaction(
                &mut tx,
                owner_id,
                NewTransactionRow {
                    amount_cents,
                    trx_type: item.transaction_type,
                    date: item.transaction_date,
                    description: item.description.as_deref(),
                    category_id: item.category_id,
                    account_from_id: account_from,
                    account_to_id: account_to,
                    is_essential: item.is_essential,
                },
            )
            .await?;
            created.push(transaction);
        }

        tx.commit().await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_debits_source_account() {
        let from = Uuid::new_v4();
        let effects = account_effects(TransactionType::Expense, 5_000, Some(from), None);
        assert_eq!(effects, vec![(from, -5_000)]);
    }

    #[test]
    fn test_income_credits_destination_account() {
        let to = Uuid::new_v4();
        let effects = account_effects(TransactionType::Income, 120_000, None, Some(to));
        assert_eq!(effects, vec![(to, 120_000)]);
    }

    #[test]
    fn test_transfer_moves_value_between_accounts() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let effects = account_effects(TransactionType::Transfer, 30_000, Some(from), Some(to));
        assert_eq!(effects, vec![(from, -30_000), (to, 30_000)]);
        // A transfer is net-zero across accounts
        assert_eq!(effects.iter().map(|(_, d)| d).sum::<i64>(), 0);
    }

    #[test]
    fn test_apply_then_reverse_is_identity() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let applied = account_effects(TransactionType::Transfer, 30_000, Some(from), Some(to));
        let reversed: Vec<(Uuid, i64)> = applied.iter().map(|(id, d)| (*id, -d)).collect();
        let net: i64 = applied
            .iter()
            .chain(reversed.iter())
            .map(|(_, d)| d)
            .sum();
        assert_eq!(net, 0);
    }

    #[test]
    fn test_expense_requires_source_only() {
        let id = Uuid::new_v4();
        assert!(validate_account_shape(TransactionType::Expense, Some(id), None).is_ok());
        assert!(validate_account_shape(TransactionType::Expense, None, None).is_err());
        assert!(
            validate_account_shape(TransactionType::Expense, Some(id), Some(Uuid::new_v4()))
                .is_err()
        );
    }

    #[test]
    fn test_income_requires_destination_only() {
        let id = Uuid::new_v4();
        assert!(validate_account_shape(TransactionType::Income, None, Some(id)).is_ok());
        assert!(validate_account_shape(TransactionType::Income, None, None).is_err());
    }

    #[test]
    fn test_transfer_requires_two_distinct_accounts() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_account_shape(TransactionType::Transfer, Some(a), Some(b)).is_ok());
        assert!(validate_account_shape(TransactionType::Transfer, Some(a), Some(a)).is_err());
        assert!(validate_account_shape(TransactionType::Transfer, Some(a), None).is_err());
    }
}
