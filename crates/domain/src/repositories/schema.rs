use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::value_objects::table_catalog::TableShape;

#[async_trait]
#[automock]
pub trait SchemaRepository {
    /// Applies every migration not yet recorded and returns their versions.
    async fn apply_pending_migrations(&self) -> Result<Vec<String>>;

    /// `None` when the table does not exist in the current schema.
    async fn describe_table(&self, table_name: String) -> Result<Option<TableShape>>;
}
