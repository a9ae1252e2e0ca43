use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Handles in the statement-read pool.  Fixed for the process lifetime
    /// once read.
    pub read_pool_size: usize,
    /// Handles in each of the debit and credit write pools.
    pub write_pool_size: usize,

    /// Run the synthetic warm-up workload (and its destructive reset)
    /// before the listener binds.
    pub warmup_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            read_pool_size: env::var("READ_POOL_SIZE")
                .unwrap_or_else(|_| "1500".into())
                .parse()?,
            write_pool_size: env::var("WRITE_POOL_SIZE")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,
            warmup_enabled: env::var("WARMUP_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
        })
    }
}
