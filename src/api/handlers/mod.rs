pub mod health;
pub mod metrics;
pub mod statement;
pub mod transactions;
