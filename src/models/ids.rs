//! Typed wrappers around the opaque TEXT ids every entity is keyed by.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub(crate) struct $name(String);

        impl $name {
            pub(crate) fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub(crate) fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                String::column_result(value).map(Self)
            }
        }
    };
}

define_id!(CategoryId);
define_id!(TransactionId);
define_id!(BudgetId);

/// Timestamp-derived id, unique at nanosecond resolution within one process.
fn timestamp_id() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S%9f").to_string()
}

impl TransactionId {
    pub(crate) fn generate() -> Self {
        Self(timestamp_id())
    }
}

impl BudgetId {
    pub(crate) fn generate() -> Self {
        Self(timestamp_id())
    }
}

impl CategoryId {
    /// Derive an id from a display name: "Coffee Shops" → `coffee_shops`.
    pub(crate) fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        for c in name.trim().chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        while slug.ends_with('_') {
            slug.pop();
        }
        Self(slug)
    }
}
