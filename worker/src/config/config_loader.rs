use super::{
    config_model::{Database, DotEnvyConfig, Migrations, OAuthStateSweep},
    stage::Stage,
};
use anyhow::{Context, Result};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let value = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let stage = match value("STAGE") {
        Some(raw) => Stage::try_from(&raw).context("STAGE is invalid")?,
        None => Stage::default(),
    };

    let database = Database {
        url: value("DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: value("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
    };

    let migrations = Migrations {
        run_on_start: parse_bool(value("RUN_MIGRATIONS"))
            .context("RUN_MIGRATIONS is invalid")?
            .unwrap_or(true),
    };

    let oauth_state_sweep = OAuthStateSweep {
        interval_seconds: value("OAUTH_STATE_SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|| "300".to_string())
            .parse::<u64>()
            .context("OAUTH_STATE_SWEEP_INTERVAL_SECONDS is invalid")?
            .max(1),
        grace_seconds: value("OAUTH_STATE_SWEEP_GRACE_SECONDS")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .context("OAUTH_STATE_SWEEP_GRACE_SECONDS is invalid")?,
        batch_limit: value("OAUTH_STATE_SWEEP_BATCH_LIMIT")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("OAUTH_STATE_SWEEP_BATCH_LIMIT is invalid")?
            .filter(|v| *v > 0),
    };

    Ok(DotEnvyConfig {
        stage,
        database,
        migrations,
        oauth_state_sweep,
    })
}

fn parse_bool(raw: Option<String>) -> Result<Option<bool>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(anyhow::anyhow!("expected a boolean, got `{raw}`")),
    }
}
