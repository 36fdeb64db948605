//! In-code description of every table the migrations create.
//!
//! After migrations run, the live shape read from the store is checked against this
//! catalog so a pre-existing table with a different shape fails start-up instead of
//! being silently accepted by `CREATE TABLE IF NOT EXISTS`.

use serde::{Deserialize, Serialize};

use crate::{errors::StoreError, value_objects::enums::access_policies::AccessPolicy};

pub const UPDATED_AT_COLUMN: &str = "updated_at";
pub const UPDATED_AT_TRIGGER: &str = "set_updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: &'static str,
    /// As reported by `information_schema.columns.data_type`.
    pub data_type: &'static str,
    pub nullable: bool,
}

const fn column(name: &'static str, data_type: &'static str, nullable: bool) -> ColumnDefinition {
    ColumnDefinition {
        name,
        data_type,
        nullable,
    }
}

const UUID: &str = "uuid";
const TEXT: &str = "text";
const NUMERIC: &str = "numeric";
const JSONB: &str = "jsonb";
const BIGINT: &str = "bigint";
const TIMESTAMPTZ: &str = "timestamp with time zone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: &'static str,
    pub columns: &'static [ColumnDefinition],
    /// A `BEFORE UPDATE` trigger keeps `updated_at` current.
    pub manages_updated_at: bool,
    pub access_policy: AccessPolicy,
    pub primary_key: &'static [&'static str],
    /// Column sets that must be unique; a matching primary key also satisfies one.
    pub unique_keys: &'static [&'static [&'static str]],
    /// Columns that must be covered by at least one CHECK constraint.
    pub checked_columns: &'static [&'static str],
}

pub const PAYMENTS: TableDefinition = TableDefinition {
    name: "payments",
    columns: &[
        column("id", UUID, false),
        column("stripe_payment_intent_id", TEXT, false),
        column("stripe_customer_id", TEXT, true),
        column("customer_email", TEXT, false),
        column("customer_name", TEXT, true),
        column("amount_total", NUMERIC, false),
        column("amount_subtotal", NUMERIC, false),
        column("currency", TEXT, false),
        column("payment_status", TEXT, false),
        column("product_id", TEXT, false),
        column("product_name", TEXT, false),
        column("payment_method", TEXT, true),
        column("metadata", JSONB, false),
        column("status", TEXT, false),
        column("created_at", TIMESTAMPTZ, false),
        column("updated_at", TIMESTAMPTZ, false),
    ],
    manages_updated_at: true,
    access_policy: AccessPolicy::AuthenticatedReadInsert,
    primary_key: &["id"],
    unique_keys: &[&["stripe_payment_intent_id"]],
    checked_columns: &["amount_total", "amount_subtotal", "metadata"],
};

pub const OAUTH_STATES: TableDefinition = TableDefinition {
    name: "oauth_states",
    columns: &[
        column("state", TEXT, false),
        column("user_id", UUID, false),
        column("created_at", TIMESTAMPTZ, false),
        column("expires_at", TIMESTAMPTZ, false),
    ],
    manages_updated_at: false,
    access_policy: AccessPolicy::ServiceRoleOnly,
    primary_key: &["state"],
    unique_keys: &[],
    checked_columns: &[],
};

pub const LINKEDIN_TOKENS: TableDefinition = TableDefinition {
    name: "linkedin_tokens",
    columns: &[
        column("user_id", UUID, false),
        column("access_token", TEXT, false),
        column("refresh_token", TEXT, true),
        column("expires_at", BIGINT, false),
        column("created_at", TIMESTAMPTZ, false),
        column("updated_at", TIMESTAMPTZ, false),
    ],
    manages_updated_at: true,
    access_policy: AccessPolicy::ServiceRoleOnly,
    primary_key: &["user_id"],
    unique_keys: &[],
    checked_columns: &[],
};

pub const LINKEDIN_POSTS: TableDefinition = TableDefinition {
    name: "linkedin_posts",
    columns: &[
        column("id", UUID, false),
        column("user_id", UUID, false),
        column("post_urn", TEXT, false),
        column("posted_at", TIMESTAMPTZ, false),
        column("created_at", TIMESTAMPTZ, false),
    ],
    manages_updated_at: false,
    access_policy: AccessPolicy::AuthenticatedReadInsert,
    primary_key: &["id"],
    unique_keys: &[&["post_urn"]],
    checked_columns: &[],
};

pub const TABLE_CATALOG: &[TableDefinition] =
    &[PAYMENTS, OAUTH_STATES, LINKEDIN_TOKENS, LINKEDIN_POSTS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnShape {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
}

impl ConstraintKind {
    /// Maps `pg_constraint.contype`; other kinds are not tracked.
    pub fn from_contype(contype: &str) -> Option<Self> {
        match contype {
            "p" => Some(ConstraintKind::PrimaryKey),
            "u" => Some(ConstraintKind::Unique),
            "c" => Some(ConstraintKind::Check),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintShape {
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl ConstraintShape {
    fn covers_exactly(&self, expected: &[&str]) -> bool {
        let mut actual: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let mut expected = expected.to_vec();
        actual.sort_unstable();
        expected.sort_unstable();
        actual == expected
    }
}

/// Shape of a table as it exists in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub columns: Vec<ColumnShape>,
    pub has_updated_at_trigger: bool,
    pub row_security_enabled: bool,
    /// Primary key, unique (constraints and plain unique indexes) and CHECK constraints.
    pub constraints: Vec<ConstraintShape>,
}

impl TableDefinition {
    pub fn has_updated_at_column(&self) -> bool {
        self.columns.iter().any(|c| c.name == UPDATED_AT_COLUMN)
    }

    /// Compares the live shape with this definition. Extra columns are tolerated.
    pub fn verify(&self, shape: &TableShape) -> Result<(), StoreError> {
        let mut problems = Vec::new();

        for expected in self.columns {
            match shape.columns.iter().find(|c| c.name == expected.name) {
                None => problems.push(format!("missing column `{}`", expected.name)),
                Some(actual) => {
                    if actual.data_type != expected.data_type {
                        problems.push(format!(
                            "column `{}` has type `{}`, expected `{}`",
                            expected.name, actual.data_type, expected.data_type
                        ));
                    }
                    if actual.nullable != expected.nullable {
                        let wanted = if expected.nullable { "nullable" } else { "NOT NULL" };
                        problems.push(format!("column `{}` should be {}", expected.name, wanted));
                    }
                }
            }
        }

        let has_key = |kinds: &[ConstraintKind], columns: &[&str]| {
            shape
                .constraints
                .iter()
                .any(|c| kinds.contains(&c.kind) && c.covers_exactly(columns))
        };

        if !has_key(&[ConstraintKind::PrimaryKey], self.primary_key) {
            problems.push(format!("missing primary key ({})", self.primary_key.join(", ")));
        }

        for &unique in self.unique_keys {
            if !has_key(&[ConstraintKind::Unique, ConstraintKind::PrimaryKey], unique) {
                problems.push(format!("missing unique constraint on ({})", unique.join(", ")));
            }
        }

        for &column in self.checked_columns {
            let checked = shape.constraints.iter().any(|c| {
                c.kind == ConstraintKind::Check && c.columns.iter().any(|name| name == column)
            });
            if !checked {
                problems.push(format!("missing check constraint on `{}`", column));
            }
        }

        if self.manages_updated_at && !shape.has_updated_at_trigger {
            problems.push(format!("missing `{}` trigger", UPDATED_AT_TRIGGER));
        }

        if !shape.row_security_enabled {
            problems.push("row level security is disabled".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(StoreError::schema_mismatch(self.name, problems.join("; ")))
        }
    }

    /// The shape a freshly migrated table reports. Handy for tests and fixtures.
    pub fn expected_shape(&self) -> TableShape {
        TableShape {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnShape {
                    name: c.name.to_string(),
                    data_type: c.data_type.to_string(),
                    nullable: c.nullable,
                })
                .collect(),
            has_updated_at_trigger: self.manages_updated_at,
            row_security_enabled: true,
            constraints: self.expected_constraints(),
        }
    }

    fn expected_constraints(&self) -> Vec<ConstraintShape> {
        let shape = |kind, columns: &[&str]| ConstraintShape {
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        };

        std::iter::once(shape(ConstraintKind::PrimaryKey, self.primary_key))
            .chain(
                self.unique_keys
                    .iter()
                    .map(|&columns| shape(ConstraintKind::Unique, columns)),
            )
            .chain(
                self.checked_columns
                    .iter()
                    .map(|&column| shape(ConstraintKind::Check, &[column])),
            )
            .collect()
    }
}

pub fn find_table(name: &str) -> Option<&'static TableDefinition> {
    TABLE_CATALOG.iter().find(|t| t.name == name)
}
