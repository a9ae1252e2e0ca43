use crate::db::{Database, DbError};
use crate::models::{TransactionKind, TransactionRequest};

const CYCLES: usize = 50;
const WARMUP_ACCOUNT: i32 = 1;
const WARMUP_AMOUNT: i32 = 1000;

/// Boot-time synthetic workload: 50 sequential cycles of one statement
/// read, one credit, and one debit against a single designated account,
/// followed by a single destructive state reset.
///
/// Sequential on purpose: the goal is to gently touch every pool and fill
/// the per-connection statement caches, not to stress the database.  Taking
/// `&mut Database` makes the boot-only constraint structural: once the
/// facade is shared behind an `Arc` for serving, no exclusive borrow exists
/// and this cannot be invoked again.
pub async fn run(db: &mut Database) -> Result<(), DbError> {
    let credit = TransactionRequest {
        amount: WARMUP_AMOUNT,
        kind: TransactionKind::Credit,
        description: "warmup".into(),
    };
    let debit = TransactionRequest {
        amount: WARMUP_AMOUNT,
        kind: TransactionKind::Debit,
        description: "warmup".into(),
    };

    for _ in 0..CYCLES {
        db.account_statement(WARMUP_ACCOUNT).await?;
        db.create_transaction(WARMUP_ACCOUNT, &credit).await?;
        db.create_transaction(WARMUP_ACCOUNT, &debit).await?;
    }

    tracing::info!(cycles = CYCLES, account = WARMUP_ACCOUNT, "warm-up cycles done");
    db.reset().await
}
