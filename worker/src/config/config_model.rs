use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub database: Database,
    pub migrations: Migrations,
    pub oauth_state_sweep: OAuthStateSweep,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Migrations {
    /// Apply pending migrations and verify table shapes before the worker starts.
    pub run_on_start: bool,
}

#[derive(Debug, Clone)]
pub struct OAuthStateSweep {
    pub interval_seconds: u64,
    pub grace_seconds: i64,
    /// `None` deletes every expired state in one statement.
    pub batch_limit: Option<i64>,
}
