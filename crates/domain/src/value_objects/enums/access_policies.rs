use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Coarse row-level policy a table is created with. Enforcement belongs to the store;
/// the migrations install the matching `CREATE POLICY` statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessPolicy {
    /// `authenticated` may SELECT and INSERT, `service_role` may do anything.
    AuthenticatedReadInsert,
    /// Only `service_role` may touch the rows.
    ServiceRoleOnly,
}

impl Display for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policy = match self {
            AccessPolicy::AuthenticatedReadInsert => "authenticated_read_insert",
            AccessPolicy::ServiceRoleOnly => "service_role_only",
        };
        write!(f, "{}", policy)
    }
}
