use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{
    AssetTypeDistribution, CreateAssetDto, CreateInvestTransactionDto, InvestAssetResponse,
    InvestAssetRow, InvestStatsResponse, InvestTransaction, InvestTrxType, TopPerformingAsset,
    UpdateAssetDto,
};
use crate::errors::AppError;
use crate::money::{cents_to_decimal, decimal_to_cents, percentage_of};

/// How many assets the dashboard highlights
const TOP_PERFORMERS_LIMIT: usize = 3;

/// Lifetime gain of a position: what it is worth now, plus what was taken
/// out, minus what was put in.
pub fn absolute_roi_cents(current_cents: i64, withdrawn_cents: i64, invested_cents: i64) -> i64 {
    current_cents + withdrawn_cents - invested_cents
}

/// Gain since the end of last year, net of money moved this year.
/// The base is last year's closing value plus this year's investments.
pub fn year_roi_cents(
    current_cents: i64,
    withdrawn_this_year_cents: i64,
    invested_this_year_cents: i64,
    value_at_year_start_cents: i64,
) -> (i64, Option<Decimal>) {
    let roi = current_cents + withdrawn_this_year_cents
        - value_at_year_start_cents
        - invested_this_year_cents;
    let base = value_at_year_start_cents + invested_this_year_cents;
    (roi, percentage_of(roi, base))
}

/// Buy/sell totals inside one year
#[derive(Debug, Default, FromRow)]
struct YearFlowRow {
    invested_cents: Option<i64>,
    withdrawn_cents: Option<i64>,
}

/// Service layer for investment portfolio logic.
pub struct InvestService;

impl InvestService {
    /// List assets with lifetime buy/sell totals.
    pub async fn list_assets(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<InvestAssetRow>, AppError> {
        sqlx::query_as::<_, InvestAssetRow>(
            r#"
            SELECT a.id, a.owner_id, a.name, a.ticker, a.asset_type, a.broker, a.units,
                   a.current_value_cents, a.status, a.created_at, a.updated_at,
                   CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'buy' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as invested_cents,
                   CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'sell' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as withdrawn_cents
            FROM invest_assets a
            LEFT JOIN invest_transactions it ON it.asset_id = a.id
            WHERE a.owner_id = $1
            GROUP BY a.id
            ORDER BY a.name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Get one asset with totals, ensuring the requesting user owns it.
    pub async fn get_asset_by_id(
        pool: &PgPool,
        asset_id: Uuid,
        owner_id: Uuid,
    ) -> Result<InvestAssetRow, AppError> {
        sqlx::query_as::<_, InvestAssetRow>(
            r#"
            SELECT a.id, a.owner_id, a.name, a.ticker, a.asset_type, a.broker, a.units,
                   a.current_value_cents, a.status, a.created_at, a.updated_at,
                   CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'buy' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as invested_cents,
                   CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'sell' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as withdrawn_cents
            FROM invest_assets a
            LEFT JOIN invest_transactions it ON it.asset_id = a.id
            WHERE a.id = $1 AND a.owner_id = $2
            GROUP BY a.id
            "#,
        )
        .bind(asset_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))
    }

    /// Create a new asset.
    pub async fn create_asset(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateAssetDto,
    ) -> Result<InvestAssetRow, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let asset_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO invest_assets (owner_id, name, ticker, asset_type, broker)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(&dto.ticker)
        .bind(dto.asset_type.as_str())
        .bind(&dto.broker)
        .fetch_one(pool)
        .await?;

        Self::get_asset_by_id(pool, asset_id, owner_id).await
    }

    /// Update an asset (partial update - PATCH semantics).
    pub async fn update_asset(
        pool: &PgPool,
        asset_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateAssetDto,
    ) -> Result<InvestAssetRow, AppError> {
        let current = Self::get_asset_by_id(pool, asset_id, owner_id).await?;

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

        let new_ticker = dto.ticker.clone().or(current.ticker);
        let new_type = dto
            .asset_type
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(&current.asset_type);
        let new_broker = dto.broker.clone().or(current.broker);
        let new_status = match &dto.status {
            Some(status) => {
                if status != "active" && status != "inactive" {
                    return Err(AppError::ValidationError(
                        "Status must be active or inactive".to_string(),
                    ));
                }
                status.clone()
            }
            None => current.status,
        };

        sqlx::query(
            r#"
            UPDATE invest_assets SET
                name = $3, ticker = $4, asset_type = $5, broker = $6, status = $7,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(asset_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(&new_ticker)
        .bind(new_type)
        .bind(&new_broker)
        .bind(&new_status)
        .execute(pool)
        .await?;

        Self::get_asset_by_id(pool, asset_id, owner_id).await
    }

    /// Delete an asset, its transactions and snapshots.
    pub async fn delete_asset(
        pool: &PgPool,
        asset_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM invest_assets WHERE id = $1 AND owner_id = $2")
            .bind(asset_id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Asset not found".to_string()));
        }

        Ok(())
    }

    /// Refresh this month's snapshot of an asset from its current state.
    async fn write_snapshot(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        asset_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invest_asset_snapshots
                (asset_id, month, year, units, invested_cents, current_value_cents, withdrawn_cents)
            SELECT a.id, $2, $3, a.units, totals.invested_cents, a.current_value_cents, totals.withdrawn_cents
            FROM invest_assets a,
                 LATERAL (
                     SELECT
                         COALESCE(SUM(CASE WHEN it.trx_type = 'buy' THEN it.total_cents ELSE 0 END), 0) as invested_cents,
                         COALESCE(SUM(CASE WHEN it.trx_type = 'sell' THEN it.total_cents ELSE 0 END), 0) as withdrawn_cents
                     FROM invest_transactions it
                     WHERE it.asset_id = a.id
                 ) totals
            WHERE a.id = $1
            ON CONFLICT (asset_id, month, year)
            DO UPDATE SET units = EXCLUDED.units,
                          invested_cents = EXCLUDED.invested_cents,
                          current_value_cents = EXCLUDED.current_value_cents,
                          withdrawn_cents = EXCLUDED.withdrawn_cents,
                          updated_at = NOW()
            "#,
        )
        .bind(asset_id)
        .bind(month)
        .bind(year)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Set the current market value of an asset and snapshot the month.
    pub async fn update_asset_value(
        pool: &PgPool,
        asset_id: Uuid,
        owner_id: Uuid,
        current_value: Decimal,
        month: i16,
        year: i16,
    ) -> Result<InvestAssetRow, AppError> {
        if current_value < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Current value cannot be negative".to_string(),
            ));
        }
        let value_cents = decimal_to_cents(current_value)?;

        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE invest_assets
            SET current_value_cents = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(asset_id)
        .bind(owner_id)
        .bind(value_cents)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Asset not found".to_string()));
        }

        Self::write_snapshot(&mut tx, asset_id, month, year).await?;

        tx.commit().await?;

        Self::get_asset_by_id(pool, asset_id, owner_id).await
    }

    /// Record a buy or sell, adjusting units and snapshotting the month.
    pub async fn create_transaction(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateInvestTransactionDto,
        month: i16,
        year: i16,
    ) -> Result<InvestTransaction, AppError> {
        if dto.total_amount < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Total amount cannot be negative".to_string(),
            ));
        }
        if dto.units <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Units must be positive".to_string(),
            ));
        }
        let total_cents = decimal_to_cents(dto.total_amount)?;

        let asset = Self::get_asset_by_id(pool, dto.asset_id, owner_id).await?;
        if dto.trx_type == InvestTrxType::Sell && dto.units > asset.units {
            return Err(AppError::ValidationError(
                "Cannot sell more units than held".to_string(),
            ));
        }

        let mut tx = pool.begin().await?;

        let transaction = sqlx::query_as::<_, InvestTransaction>(
            r#"
            INSERT INTO invest_transactions (asset_id, trx_type, trx_date, total_cents, units, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, asset_id, trx_type, trx_date, total_cents, units, note,
                      created_at, updated_at
            "#,
        )
        .bind(dto.asset_id)
        .bind(dto.trx_type.as_str())
        .bind(dto.trx_date)
        .bind(total_cents)
        .bind(dto.units)
        .bind(&dto.note)
        .fetch_one(&mut *tx)
        .await?;

        let units_delta = match dto.trx_type {
            InvestTrxType::Buy => dto.units,
            InvestTrxType::Sell => -dto.units,
        };

        sqlx::query(
            "UPDATE invest_assets SET units = units + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(units_delta)
        .bind(dto.asset_id)
        .execute(&mut *tx)
        .await?;

        Self::write_snapshot(&mut tx, dto.asset_id, month, year).await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// List buy/sell transactions of one asset, newest first.
    pub async fn list_asset_transactions(
        pool: &PgPool,
        asset_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<InvestTransaction>, AppError> {
        // Ownership check through the asset
        Self::get_asset_by_id(pool, asset_id, owner_id).await?;

        sqlx::query_as::<_, InvestTransaction>(
            r#"
            SELECT id, asset_id, trx_type, trx_date, total_cents, units, note,
                   created_at, updated_at
            FROM invest_transactions
            WHERE asset_id = $1
            ORDER BY trx_date DESC, created_at DESC
            "#,
        )
        .bind(asset_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete a buy/sell, restoring units and refreshing the snapshot.
    pub async fn delete_transaction(
        pool: &PgPool,
        transaction_id: Uuid,
        owner_id: Uuid,
        month: i16,
        year: i16,
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        let transaction = sqlx::query_as::<_, InvestTransaction>(
            r#"
            SELECT it.id, it.asset_id, it.trx_type, it.trx_date, it.total_cents, it.units,
                   it.note, it.created_at, it.updated_at
            FROM invest_transactions it
            JOIN invest_assets a ON a.id = it.asset_id
            WHERE it.id = $1 AND a.owner_id = $2
            FOR UPDATE OF it
            "#,
        )
        .bind(transaction_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        let units_delta = if transaction.trx_type == "buy" {
            -transaction.units
        } else {
            transaction.units
        };

        sqlx::query(
            "UPDATE invest_assets SET units = units + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(units_delta)
        .bind(transaction.asset_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM invest_transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        Self::write_snapshot(&mut tx, transaction.asset_id, month, year).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Portfolio statistics for the invest dashboard.
    pub async fn get_stats(
        pool: &PgPool,
        owner_id: Uuid,
        year: i16,
    ) -> Result<InvestStatsResponse, AppError> {
        let assets = Self::list_assets(pool, owner_id).await?;

        let total_invested: i64 = assets.iter().map(|a| a.invested_cents).sum();
        let total_withdrawn: i64 = assets.iter().map(|a| a.withdrawn_cents).sum();
        let total_current: i64 = assets.iter().map(|a| a.current_value_cents).sum();

        let global_roi = absolute_roi_cents(total_current, total_withdrawn, total_invested);

        // Closing value of last year: the latest snapshot per asset before this year
        let value_at_year_start = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(v.current_value_cents), 0) AS BIGINT)
            FROM (
                SELECT DISTINCT ON (s.asset_id) s.current_value_cents
                FROM invest_asset_snapshots s
                JOIN invest_assets a ON a.id = s.asset_id
                WHERE a.owner_id = $1 AND s.year < $2
                ORDER BY s.asset_id, s.year DESC, s.month DESC
            ) v
            "#,
        )
        .bind(owner_id)
        .bind(year)
        .fetch_one(pool)
        .await?;

        let year_start = NaiveDate::from_ymd_opt(year as i32, 1, 1)
            .ok_or_else(|| AppError::ValidationError("Invalid year".to_string()))?;
        let year_flows = sqlx::query_as::<_, YearFlowRow>(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'buy' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as invested_cents,
                CAST(COALESCE(SUM(CASE WHEN it.trx_type = 'sell' THEN it.total_cents ELSE 0 END), 0) AS BIGINT) as withdrawn_cents
            FROM invest_transactions it
            JOIN invest_assets a ON a.id = it.asset_id
            WHERE a.owner_id = $1 AND it.trx_date >= $2
            "#,
        )
        .bind(owner_id)
        .bind(year_start)
        .fetch_one(pool)
        .await?;

        let (year_roi, year_roi_pct) = year_roi_cents(
            total_current,
            year_flows.withdrawn_cents.unwrap_or(0),
            year_flows.invested_cents.unwrap_or(0),
            value_at_year_start,
        );

        // Current value split by asset class
        let mut by_type: Vec<(String, i64)> = Vec::new();
        for asset in &assets {
            match by_type.iter_mut().find(|(t, _)| *t == asset.asset_type) {
                Some((_, value)) => *value += asset.current_value_cents,
                None => by_type.push((asset.asset_type.clone(), asset.current_value_cents)),
            }
        }
        let current_value_distribution = by_type
            .into_iter()
            .map(|(asset_type, value)| AssetTypeDistribution {
                asset_type,
                current_value: cents_to_decimal(value),
                percentage: percentage_of(value, total_current).unwrap_or(Decimal::ZERO),
            })
            .collect();

        // Top assets by absolute ROI
        let mut ranked: Vec<&InvestAssetRow> = assets.iter().collect();
        ranked.sort_by_key(|a| {
            std::cmp::Reverse(absolute_roi_cents(
                a.current_value_cents,
                a.withdrawn_cents,
                a.invested_cents,
            ))
        });
        let top_performing_assets = ranked
            .into_iter()
            .take(TOP_PERFORMERS_LIMIT)
            .map(|a| {
                let roi =
                    absolute_roi_cents(a.current_value_cents, a.withdrawn_cents, a.invested_cents);
                TopPerformingAsset {
                    id: a.id,
                    name: a.name.clone(),
                    asset_type: a.asset_type.clone(),
                    current_value: cents_to_decimal(a.current_value_cents),
                    absolute_roi_value: cents_to_decimal(roi),
                    relative_roi_percentage: percentage_of(roi, a.invested_cents),
                }
            })
            .collect();

        Ok(InvestStatsResponse {
            total_invested_value: cents_to_decimal(total_invested),
            total_current_value: cents_to_decimal(total_current),
            global_roi_value: cents_to_decimal(global_roi),
            global_roi_percentage: percentage_of(global_roi, total_invested),
            current_year_roi_value: cents_to_decimal(year_roi),
            current_year_roi_percentage: year_roi_pct,
            current_value_distribution,
            top_performing_assets,
        })
    }

    /// Build the response DTO for one asset row.
    pub fn asset_response(row: InvestAssetRow) -> InvestAssetResponse {
        let roi = absolute_roi_cents(row.current_value_cents, row.withdrawn_cents, row.invested_cents);
        InvestAssetResponse {
            id: row.id,
            name: row.name,
            ticker: row.ticker,
            asset_type: row.asset_type,
            broker: row.broker,
            units: row.units,
            current_value: cents_to_decimal(row.current_value_cents),
            invested_value: cents_to_decimal(row.invested_cents),
            withdrawn_value: cents_to_decimal(row.withdrawn_cents),
            absolute_roi_value: cents_to_decimal(roi),
            relative_roi_percentage: percentage_of(roi, row.invested_cents),
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_roi_counts_withdrawals_as_gains() {
        // Bought for 1000.00, sold 300.00 out, remainder worth 800.00
        assert_eq!(absolute_roi_cents(80_000, 30_000, 100_000), 10_000);
    }

    #[test]
    fn test_absolute_roi_negative_on_loss() {
        assert_eq!(absolute_roi_cents(70_000, 0, 100_000), -30_000);
    }

    #[test]
    fn test_year_roi_against_last_year_close() {
        // Worth 1000.00 at year start, added 500.00, now worth 1650.00
        let (roi, pct) = year_roi_cents(165_000, 0, 50_000, 100_000);
        assert_eq!(roi, 15_000);
        assert_eq!(pct, Some(Decimal::from(10)));
    }

    #[test]
    fn test_year_roi_with_withdrawals() {
        // Worth 1000.00 at year start, sold 200.00 out, now worth 850.00
        let (roi, pct) = year_roi_cents(85_000, 20_000, 0, 100_000);
        assert_eq!(roi, 5_000);
        assert_eq!(pct, Some(Decimal::from(5)));
    }

    #[test]
    fn test_year_roi_empty_portfolio_has_no_percentage() {
        let (roi, pct) = year_roi_cents(0, 0, 0, 0);
        assert_eq!(roi, 0);
        assert_eq!(pct, None);
    }
}
