use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Connection, Executor};

/// One SQL command prepared on its own dedicated Postgres connection.
///
/// The command text is fixed at construction and the connection is never
/// shared: exclusivity is enforced by the pool handing out one lease at a
/// time and by every execution method taking `&mut self`.  Preparing at
/// connect time populates the per-connection statement cache, so requests
/// served later never pay the prepare round-trip.
pub struct PreparedCommand {
    conn: PgConnection,
    sql: &'static str,
}

impl PreparedCommand {
    /// Open a dedicated connection and prepare `sql` on it.
    pub async fn connect(url: &str, sql: &'static str) -> Result<Self, sqlx::Error> {
        let mut conn = PgConnection::connect(url).await?;
        conn.prepare(sql).await?;
        Ok(Self { conn, sql })
    }

    /// Execute the bound debit/credit procedure.
    ///
    /// Returns `None` when the procedure produced no row (unknown account),
    /// otherwise `(accepted, balance, limit)`.  Rejection is an ordinary
    /// output of the procedure, not an execution failure.
    pub async fn execute_transaction(
        &mut self,
        account_id: i32,
        amount: i32,
        kind: &str,
        description: &str,
    ) -> Result<Option<(bool, i32, i32)>, sqlx::Error> {
        sqlx::query_as::<_, (bool, i32, i32)>(self.sql)
            .bind(account_id)
            .bind(amount)
            .bind(kind)
            .bind(description)
            .fetch_optional(&mut self.conn)
            .await
    }

    /// Execute the bound statement query for one account.
    pub async fn fetch_statement(&mut self, account_id: i32) -> Result<Vec<PgRow>, sqlx::Error> {
        sqlx::query(self.sql)
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
    }

    /// Close the underlying connection gracefully.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}
