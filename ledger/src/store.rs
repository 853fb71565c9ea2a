//! The ledger operations (`spec.md` §4.2-§4.9): the six transactional
//! entry points composing the FIFO consumer with a Postgres-backed
//! `transactions` table.
//!
//! ## Locking discipline
//!
//! Debit-shaped operations (`withdraw_points`, `reserve_points`) lock
//! every live deposit lot for the user with `SELECT ... FOR UPDATE
//! ORDER BY created_at ASC, id ASC` before applying the FIFO consumer.
//! A concurrent debit for the same user waits for the first transaction
//! to commit or roll back, then re-reads the now-current
//! `remaining_amount` values. Because every operation locks only one
//! user's rows, and always in `created_at` order, cross-user deadlock
//! is impossible and same-user lock acquisition never orders two
//! operations differently (`spec.md` §5, §9).
//!
//! Read paths (`get_balance`, `get_expiring_points`,
//! `get_transaction_history`) take no locks and run under a bounded
//! timeout so a slow query can't pin a request handler indefinitely.

use std::time::Duration;

use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use sqlx::{PgPool, Postgres, Transaction as SqlxTx};

use crate::error::LedgerError;
use crate::fifo::{self, Lot};
use crate::ids::{ReservationId, TransactionId, UserId};
use crate::time::TimeSource;
use crate::types::{Balance, ExpiringBucket, Transaction};

/// Read operations are cancelled if they don't complete within this
/// window, so a stuck store query can't pin a request-handler resource
/// indefinitely (`spec.md` §5).
const READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Entry point for the ledger core. Wraps a connection pool and a
/// `TimeSource`; holds no other state; safe to share across requests.
#[derive(Clone)]
pub struct Ledger {
    pool: PgPool,
    time_source: TimeSource,
}

impl Ledger {
    pub fn new(pool: PgPool, time_source: TimeSource) -> Self {
        Self { pool, time_source }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn time_source(&self) -> &TimeSource {
        &self.time_source
    }

    /// AddPoints (`spec.md` §4.2).
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn add_points(
        &self,
        user_id: UserId,
        amount: i64,
        ttl_days: i64,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::validation("amount must be positive"));
        }
        if ttl_days < 0 {
            return Err(LedgerError::validation("ttl_days must not be negative"));
        }

        let now = self.time_source.now();
        let expires_at = if ttl_days > 0 {
            Some(now + jiff::Span::new().days(ttl_days))
        } else {
            None
        };

        let row: Transaction = sqlx::query_as(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, type, status, expires_at,
                created_at, reservation_id, remaining_amount
            )
            VALUES ($1, $2, $3, 'deposit', 'completed', $4, $5, NULL, $3)
            RETURNING id, user_id, amount, type, status, expires_at,
                      created_at, reservation_id, remaining_amount
            "#,
        )
        .bind(TransactionId::new())
        .bind(user_id)
        .bind(amount)
        .bind(expires_at.map(|t| t.to_sqlx()))
        .bind(now.to_sqlx())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// WithdrawPoints (`spec.md` §4.3).
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn withdraw_points(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> Result<TransactionId, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::validation("amount must be positive"));
        }

        let now = self.time_source.now();
        let mut tx = self.pool.begin().await?;

        let lots = select_live_lots_for_update(&mut tx, user_id, now).await?;
        let deductions = fifo::consume(&lots, amount)
            .ok_or(LedgerError::InsufficientFunds)?;

        for d in &deductions {
            decrement_remaining(&mut tx, d.id, d.amount).await?;
        }

        let withdrawal_id = TransactionId::new();
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, type, status, expires_at,
                created_at, reservation_id, remaining_amount
            )
            VALUES ($1, $2, $3, 'withdrawal', 'completed', NULL, $4, NULL, 0)
            "#,
        )
        .bind(withdrawal_id)
        .bind(user_id)
        .bind(amount)
        .bind(now.to_sqlx())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(withdrawal_id)
    }

    /// GetBalance (`spec.md` §4.4). No locks; a snapshot read.
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        let now = self.time_source.now();
        let pool = self.pool.clone();

        let total: Option<i64> = tokio::time::timeout(READ_TIMEOUT, async move {
            sqlx::query_scalar(
                r#"
                SELECT SUM(remaining_amount)
                FROM transactions
                WHERE user_id = $1
                  AND type = 'deposit'
                  AND status = 'completed'
                  AND (expires_at IS NULL OR expires_at > $2)
                "#,
            )
            .bind(user_id)
            .bind(now.to_sqlx())
            .fetch_one(&pool)
            .await
        })
        .await
        .map_err(|_| LedgerError::Internal(anyhow::anyhow!("get_balance timed out")))??;
        let total = total.unwrap_or(0);

        Ok(Balance { user_id, total })
    }

    /// GetExpiringPoints (`spec.md` §4.8). No locks; a pure read.
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn get_expiring_points(
        &self,
        user_id: UserId,
        days: i64,
    ) -> Result<Vec<ExpiringBucket>, LedgerError> {
        if days < 0 {
            return Err(LedgerError::validation("days must not be negative"));
        }

        let now = self.time_source.now();
        let window_end = now + jiff::Span::new().days(days);
        let pool = self.pool.clone();

        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(try_from = "jiff_sqlx::Timestamp")]
            expires_at: Timestamp,
            amount: i64,
        }

        let rows: Vec<Row> = tokio::time::timeout(READ_TIMEOUT, async move {
            sqlx::query_as(
                r#"
                SELECT expires_at, SUM(remaining_amount) as amount
                FROM transactions
                WHERE user_id = $1
                  AND type = 'deposit'
                  AND status = 'completed'
                  AND remaining_amount > 0
                  AND expires_at > $2
                  AND expires_at <= $3
                GROUP BY expires_at
                ORDER BY expires_at ASC
                "#,
            )
            .bind(user_id)
            .bind(now.to_sqlx())
            .bind(window_end.to_sqlx())
            .fetch_all(&pool)
            .await
        })
        .await
        .map_err(|_| LedgerError::Internal(anyhow::anyhow!("get_expiring_points timed out")))??;

        let buckets = rows
            .into_iter()
            .map(|r| ExpiringBucket {
                expires_at: r.expires_at,
                amount: r.amount,
            })
            .collect();

        Ok(buckets)
    }

    /// ReservePoints (`spec.md` §4.5).
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn reserve_points(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> Result<ReservationId, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::validation("amount must be positive"));
        }

        let now = self.time_source.now();
        let mut tx = self.pool.begin().await?;

        let lots = select_live_lots_for_update(&mut tx, user_id, now).await?;
        let deductions = fifo::consume(&lots, amount)
            .ok_or(LedgerError::InsufficientFunds)?;

        let reservation_id = ReservationId::new();
        for d in &deductions {
            decrement_remaining(&mut tx, d.id, d.amount).await?;

            sqlx::query(
                r#"
                INSERT INTO transactions (
                    id, user_id, amount, type, status, expires_at,
                    created_at, reservation_id, remaining_amount
                )
                VALUES ($1, $2, $3, 'reserve', 'reserved', NULL, $4, $5, $3)
                "#,
            )
            .bind(TransactionId::new())
            .bind(user_id)
            .bind(d.amount)
            .bind(now.to_sqlx())
            .bind(reservation_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(reservation_id)
    }

    /// CommitReservation (`spec.md` §4.6). Terminal; idempotent commits
    /// of an already-processed reservation fail with `not_found`.
    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id), err)]
    pub async fn commit_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'completed', type = 'withdrawal', remaining_amount = 0
            WHERE reservation_id = $1 AND status = 'reserved'
            "#,
        )
        .bind(reservation_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found(
                "reservation not found or already processed",
            ));
        }

        tx.commit().await?;
        Ok(())
    }

    /// RollbackReservation (`spec.md` §4.7).
    ///
    /// Per the open question in `spec.md` §9.2, every cancelled hold's
    /// amount is returned into a single oldest still-live deposit lot
    /// for the user, not necessarily the lot it was originally drawn
    /// from. This preserves I4 (conservation) but not lot identity; see
    /// the module docs for the consequence on TTL.
    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id), err)]
    pub async fn rollback_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<(), LedgerError> {
        let now = self.time_source.now();
        let mut tx = self.pool.begin().await?;

        let holds: Vec<(TransactionId, UserId, i64)> = sqlx::query_as(
            r#"
            SELECT id, user_id, amount
            FROM transactions
            WHERE reservation_id = $1 AND status = 'reserved'
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&mut *tx)
        .await?;

        if holds.is_empty() {
            return Err(LedgerError::not_found(
                "reservation not found or already processed",
            ));
        }

        let user_id = holds[0].1;

        sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'cancelled'
            WHERE reservation_id = $1 AND status = 'reserved'
            "#,
        )
        .bind(reservation_id)
        .execute(&mut *tx)
        .await?;

        let total: i64 = holds.iter().map(|(_, _, amount)| amount).sum();
        return_to_oldest_live_lot(&mut tx, user_id, now, total).await?;

        tx.commit().await?;
        Ok(())
    }

    /// GetTransactionHistory — supplemented per `SPEC_FULL.md` §3. A
    /// raw, paginated audit trail, not a balance reconstruction.
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn get_transaction_history(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let pool = self.pool.clone();

        let rows = tokio::time::timeout(READ_TIMEOUT, async move {
            sqlx::query_as::<_, Transaction>(
                r#"
                SELECT id, user_id, amount, type, status, expires_at,
                       created_at, reservation_id, remaining_amount
                FROM transactions
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&pool)
            .await
        })
        .await
        .map_err(|_| LedgerError::Internal(anyhow::anyhow!("get_transaction_history timed out")))??;

        Ok(rows)
    }
}

/// Select every live deposit lot for `user_id`, locking each returned
/// row with `FOR UPDATE` in `created_at` ascending order. Must be
/// called inside a transaction; the locks are held until that
/// transaction commits or rolls back.
async fn select_live_lots_for_update(
    tx: &mut SqlxTx<'_, Postgres>,
    user_id: UserId,
    now: Timestamp,
) -> Result<Vec<Lot>, LedgerError> {
    let rows: Vec<(TransactionId, i64)> = sqlx::query_as(
        r#"
        SELECT id, remaining_amount
        FROM transactions
        WHERE user_id = $1
          AND type = 'deposit'
          AND status = 'completed'
          AND remaining_amount > 0
          AND (expires_at IS NULL OR expires_at > $2)
        ORDER BY created_at ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(now.to_sqlx())
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, remaining)| Lot { id, remaining })
        .collect())
}

async fn decrement_remaining(
    tx: &mut SqlxTx<'_, Postgres>,
    id: TransactionId,
    amount: i64,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        UPDATE transactions
        SET remaining_amount = remaining_amount - $1
        WHERE id = $2
        "#,
    )
    .bind(amount)
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Credit `total` back into the user's oldest still-live deposit lot,
/// creating a fresh zero-TTL lot if none exists. See the open question
/// documented on `rollback_reservation`.
async fn return_to_oldest_live_lot(
    tx: &mut SqlxTx<'_, Postgres>,
    user_id: UserId,
    now: Timestamp,
    total: i64,
) -> Result<(), LedgerError> {
    let oldest: Option<TransactionId> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM transactions
        WHERE user_id = $1
          AND type = 'deposit'
          AND status = 'completed'
          AND (expires_at IS NULL OR expires_at > $2)
        ORDER BY created_at ASC, id ASC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(now.to_sqlx())
    .fetch_optional(&mut **tx)
    .await?;

    match oldest {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE transactions
                SET remaining_amount = remaining_amount + $1
                WHERE id = $2
                "#,
            )
            .bind(total)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            // No live lot to return into: mint one, matching AddPoints'
            // shape but with no TTL, since the original lot's TTL can't
            // be recovered once all lots have expired or drained.
            sqlx::query(
                r#"
                INSERT INTO transactions (
                    id, user_id, amount, type, status, expires_at,
                    created_at, reservation_id, remaining_amount
                )
                VALUES ($1, $2, $3, 'deposit', 'completed', NULL, $4, NULL, $3)
                "#,
            )
            .bind(TransactionId::new())
            .bind(user_id)
            .bind(total)
            .bind(now.to_sqlx())
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}
