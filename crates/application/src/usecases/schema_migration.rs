use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use domain::{
    errors::StoreError,
    repositories::schema::SchemaRepository,
    value_objects::table_catalog::{TABLE_CATALOG, TableDefinition},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMigrationReport {
    pub applied: Vec<String>,
    pub verified_tables: Vec<&'static str>,
}

/// Brings the namespace up to date, then checks every catalogued table against the
/// shape the rest of the crate relies on.
pub struct SchemaMigrationUseCase<T>
where
    T: SchemaRepository + Send + Sync,
{
    schema_repository: Arc<T>,
    tables: &'static [TableDefinition],
}

impl<T> SchemaMigrationUseCase<T>
where
    T: SchemaRepository + Send + Sync,
{
    pub fn new(schema_repository: Arc<T>) -> Self {
        Self {
            schema_repository,
            tables: TABLE_CATALOG,
        }
    }

    pub async fn run(&self) -> Result<SchemaMigrationReport> {
        let applied = self.schema_repository.apply_pending_migrations().await?;
        if applied.is_empty() {
            info!("schema: no pending migrations");
        } else {
            info!(applied = ?applied, "schema: migrations applied");
        }

        let verified_tables = self.verify().await?;

        Ok(SchemaMigrationReport {
            applied,
            verified_tables,
        })
    }

    pub async fn verify(&self) -> Result<Vec<&'static str>> {
        let mut verified = Vec::with_capacity(self.tables.len());

        for table in self.tables {
            let shape = self
                .schema_repository
                .describe_table(table.name.to_string())
                .await?
                .ok_or_else(|| StoreError::schema_mismatch(table.name, "table does not exist"))?;

            if let Err(err) = table.verify(&shape) {
                error!(table = table.name, error = %err, "schema: shape check failed");
                return Err(err.into());
            }
            verified.push(table.name);
        }

        info!(tables = ?verified, "schema: shape verified");
        Ok(verified)
    }
}
