pub mod command;
pub mod warmup;

use std::time::Instant;

use futures_util::future;
use metrics::{counter, histogram};
use serde::Serialize;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Row};

use crate::models::{
    AccountStatement, BalanceSnapshot, StatementEntry, TransactionKind, TransactionOutcome,
    TransactionReceipt, TransactionRequest,
};
use crate::pool::{PoolError, ResourcePool};
use self::command::PreparedCommand;

/// Errors crossing the facade boundary.
///
/// Business rejection and "no such account" are *not* errors; they are
/// ordinary [`TransactionOutcome`] / `Option` values.  The facade never
/// retries; both variants bubble unchanged to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("command execution failed: {0}")]
    Execute(#[from] sqlx::Error),
}

const STATEMENT_SQL: &str = r#"
    WITH recent AS (
        SELECT
            amount,
            kind,
            description,
            created_at
        FROM transactions
        WHERE account_id = $1
        ORDER BY id DESC
        LIMIT 10
    )
    SELECT
        r.amount,
        r.kind,
        r.description,
        r.created_at,
        a.balance,
        a.credit_limit
    FROM accounts a
    LEFT JOIN recent r ON true
    WHERE a.id = $1
"#;

const DEBIT_SQL: &str =
    "SELECT accepted, balance, credit_limit FROM apply_debit($1, $2, $3, $4)";

const CREDIT_SQL: &str =
    "SELECT accepted, balance, credit_limit FROM apply_credit($1, $2, $3, $4)";

/// Facade over three independent command pools: one for statement reads,
/// one for debit writes, one for credit writes.
///
/// Every operation rents a [`PreparedCommand`] from the matching pool,
/// executes it, and returns the handle via the lease's scope-exit guarantee
/// on every path (success, rejection, or execution failure), so the pool
/// never shrinks.
pub struct Database {
    url: String,
    read_pool: ResourcePool<PreparedCommand>,
    debit_pool: ResourcePool<PreparedCommand>,
    credit_pool: ResourcePool<PreparedCommand>,
}

/// Idle/capacity snapshot of one pool, exposed by the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolUsage {
    pub available: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub read: PoolUsage,
    pub debit: PoolUsage,
    pub credit: PoolUsage,
}

impl Database {
    /// Open every dedicated connection and prepare its command up front, so
    /// all three pools are fully primed before the first request is served.
    pub async fn connect(
        url: &str,
        read_pool_size: usize,
        write_pool_size: usize,
    ) -> Result<Self, sqlx::Error> {
        let (read, debit, credit) = tokio::try_join!(
            build_handles(url, STATEMENT_SQL, read_pool_size),
            build_handles(url, DEBIT_SQL, write_pool_size),
            build_handles(url, CREDIT_SQL, write_pool_size),
        )?;

        tracing::info!(
            read = read_pool_size,
            debit = write_pool_size,
            credit = write_pool_size,
            "command pools primed"
        );

        Ok(Self {
            url: url.to_owned(),
            read_pool: ResourcePool::new(read),
            debit_pool: ResourcePool::new(debit),
            credit_pool: ResourcePool::new(credit),
        })
    }

    /// Apply one debit or credit through the matching write pool.
    ///
    /// The stored procedure reports its verdict as an explicit `accepted`
    /// column; a rejected operation (insufficient funds) and an unknown
    /// account both come back as outcomes, never as `Err`.
    pub async fn create_transaction(
        &self,
        account_id: i32,
        req: &TransactionRequest,
    ) -> Result<TransactionOutcome, DbError> {
        let pool = match req.kind {
            TransactionKind::Debit => &self.debit_pool,
            TransactionKind::Credit => &self.credit_pool,
        };

        let started = Instant::now();
        let mut cmd = pool.rent().await?;
        histogram!("handle_wait_seconds").record(started.elapsed().as_secs_f64());

        let row = cmd
            .execute_transaction(account_id, req.amount, req.kind.as_code(), &req.description)
            .await?;

        Ok(match row {
            None => TransactionOutcome::UnknownAccount,
            Some((false, _, _)) => {
                counter!("transactions_rejected_total").increment(1);
                TransactionOutcome::Rejected
            }
            Some((true, balance, limit)) => {
                counter!("transactions_accepted_total").increment(1);
                TransactionOutcome::Accepted(TransactionReceipt { balance, limit })
            }
        })
    }

    /// Fetch the current balance plus the ten most recent transactions,
    /// newest first.  `None` means the account does not exist; an account
    /// with no transactions yields a present balance and an empty list.
    pub async fn account_statement(
        &self,
        account_id: i32,
    ) -> Result<Option<AccountStatement>, DbError> {
        let started = Instant::now();
        let mut cmd = self.read_pool.rent().await?;
        histogram!("handle_wait_seconds").record(started.elapsed().as_secs_f64());

        let rows = cmd.fetch_statement(account_id).await?;
        // Row parsing is pure CPU; hand the command back first.
        drop(cmd);
        counter!("statement_reads_total").increment(1);

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let balance = BalanceSnapshot {
            total: first.try_get(4)?,
            limit: first.try_get(5)?,
        };

        let mut transactions = Vec::with_capacity(rows.len());
        for row in &rows {
            // The outer join yields a single all-NULL transaction row for an
            // account that has none.
            let Some(amount) = row.try_get::<Option<i32>, _>(0)? else {
                continue;
            };
            let code: String = row.try_get(1)?;
            let kind = TransactionKind::from_code(code.trim_end()).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown transaction kind {code:?}").into())
            })?;
            transactions.push(StatementEntry {
                amount,
                kind,
                description: row.try_get(2)?,
                created_at: row.try_get(3)?,
            });
        }

        Ok(Some(AccountStatement {
            balance,
            transactions,
        }))
    }

    /// Destructive reset: delete every transaction and zero every balance as
    /// one database transaction.
    ///
    /// Boot-only by construction: `&mut self` cannot be produced once the
    /// facade is shared behind an `Arc` for serving.
    pub async fn reset(&mut self) -> Result<(), DbError> {
        let mut conn = PgConnection::connect(&self.url).await?;
        let mut tx = conn.begin().await?;
        sqlx::query("DELETE FROM transactions WHERE id IS NOT NULL")
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE accounts SET balance = 0 WHERE id IS NOT NULL")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        conn.close().await?;
        tracing::info!("ledger state reset");
        Ok(())
    }

    /// Drain and close all three pools, waiting for every connection.
    pub async fn close(&self) {
        let close = |cmd: PreparedCommand| async move {
            if let Err(e) = cmd.close().await {
                tracing::warn!(error = %e, "failed to close pooled connection");
            }
        };
        tokio::join!(
            self.read_pool.shutdown(close),
            self.debit_pool.shutdown(close),
            self.credit_pool.shutdown(close),
        );
        tracing::info!("command pools drained");
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            read: usage(&self.read_pool),
            debit: usage(&self.debit_pool),
            credit: usage(&self.credit_pool),
        }
    }
}

fn usage(pool: &ResourcePool<PreparedCommand>) -> PoolUsage {
    PoolUsage {
        available: pool.available(),
        capacity: pool.capacity(),
    }
}

async fn build_handles(
    url: &str,
    sql: &'static str,
    count: usize,
) -> Result<Vec<PreparedCommand>, sqlx::Error> {
    future::try_join_all((0..count).map(|_| PreparedCommand::connect(url, sql))).await
}
