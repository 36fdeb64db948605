use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    PgConnection, QueryableByName, RunQueryDsl, sql_query,
    sql_types::{Array, Bool, Text},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::Arc;
use tokio::task;

use crate::postgres::{
    error_mapping::{pool_error, store_error},
    postgres_connection::PgPoolSquad,
};
use domain::{
    errors::StoreError,
    repositories::schema::SchemaRepository,
    value_objects::table_catalog::{
        ColumnShape, ConstraintKind, ConstraintShape, TableShape, UPDATED_AT_TRIGGER,
    },
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DESCRIBE_COLUMNS_SQL: &str = r#"
SELECT column_name::text AS column_name,
       data_type::text AS data_type,
       (is_nullable = 'YES') AS nullable
FROM information_schema.columns
WHERE table_schema = current_schema()
  AND table_name = $1
ORDER BY ordinal_position
"#;

const DESCRIBE_CAPABILITIES_SQL: &str = r#"
SELECT EXISTS (
           SELECT 1
           FROM pg_trigger t
           JOIN pg_class c ON c.oid = t.tgrelid
           JOIN pg_namespace n ON n.oid = c.relnamespace
           WHERE n.nspname = current_schema()
             AND c.relname = $1
             AND t.tgname = $2
             AND NOT t.tgisinternal
       ) AS has_updated_at_trigger,
       COALESCE((
           SELECT c.relrowsecurity
           FROM pg_class c
           JOIN pg_namespace n ON n.oid = c.relnamespace
           WHERE n.nspname = current_schema()
             AND c.relname = $1
       ), false) AS row_security_enabled
"#;

// Unique indexes count as unique keys too: a table may enforce uniqueness without a constraint.
const DESCRIBE_CONSTRAINTS_SQL: &str = r#"
SELECT con.contype::text AS kind,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(con.conkey) AS k(attnum)
           JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
           ORDER BY a.attname
       ) AS columns
FROM pg_constraint con
JOIN pg_class c ON c.oid = con.conrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = current_schema()
  AND c.relname = $1
  AND con.contype IN ('p', 'u', 'c')
UNION ALL
SELECT 'u'::text AS kind,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(i.indkey::int2[]) AS k(attnum)
           JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = k.attnum
           ORDER BY a.attname
       ) AS columns
FROM pg_index i
JOIN pg_class c ON c.oid = i.indrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = current_schema()
  AND c.relname = $1
  AND i.indisunique
  AND NOT i.indisprimary
  AND i.indpred IS NULL
  AND i.indexprs IS NULL
"#;

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
    #[diesel(sql_type = Bool)]
    nullable: bool,
}

#[derive(QueryableByName)]
struct CapabilityRow {
    #[diesel(sql_type = Bool)]
    has_updated_at_trigger: bool,
    #[diesel(sql_type = Bool)]
    row_security_enabled: bool,
}

#[derive(QueryableByName)]
struct ConstraintRow {
    #[diesel(sql_type = Text)]
    kind: String,
    #[diesel(sql_type = Array<Text>)]
    columns: Vec<String>,
}

pub struct SchemaPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SchemaPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SchemaRepository for SchemaPostgres {
    async fn apply_pending_migrations(&self) -> Result<Vec<String>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut pooled = db_pool.get().map_err(pool_error)?;
            let conn: &mut PgConnection = &mut pooled;

            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|err| StoreError::Query {
                    message: format!("migration: {err}"),
                })?
                .into_iter()
                .map(|version| version.to_string())
                .collect();

            Ok(applied)
        })
        .await??)
    }

    async fn describe_table(&self, table_name: String) -> Result<Option<TableShape>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<TableShape>> {
            let mut conn = db_pool.get().map_err(pool_error)?;

            let columns = sql_query(DESCRIBE_COLUMNS_SQL)
                .bind::<Text, _>(&table_name)
                .load::<ColumnRow>(&mut conn)
                .map_err(store_error)?;

            if columns.is_empty() {
                return Ok(None);
            }

            let capabilities = sql_query(DESCRIBE_CAPABILITIES_SQL)
                .bind::<Text, _>(&table_name)
                .bind::<Text, _>(UPDATED_AT_TRIGGER)
                .get_result::<CapabilityRow>(&mut conn)
                .map_err(store_error)?;

            let constraints = sql_query(DESCRIBE_CONSTRAINTS_SQL)
                .bind::<Text, _>(&table_name)
                .load::<ConstraintRow>(&mut conn)
                .map_err(store_error)?
                .into_iter()
                .filter_map(|row| {
                    ConstraintKind::from_contype(&row.kind).map(|kind| ConstraintShape {
                        kind,
                        columns: row.columns,
                    })
                })
                .collect();

            Ok(Some(TableShape {
                columns: columns
                    .into_iter()
                    .map(|row| ColumnShape {
                        name: row.column_name,
                        data_type: row.data_type,
                        nullable: row.nullable,
                    })
                    .collect(),
                has_updated_at_trigger: capabilities.has_updated_at_trigger,
                row_security_enabled: capabilities.row_security_enabled,
                constraints,
            }))
        })
        .await??)
    }
}
