use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::{CategoryId, EntryType};
use crate::error::{LedgerError, Result};

const COLOR_PATTERN: &str = r"^#(?:[0-9a-fA-F]{3}){1,2}$";

static COLOR_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(COLOR_PATTERN).ok());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

impl Category {
    /// New user category; the id is derived from the name.
    pub(crate) fn new(name: String, icon: String, color: String, kind: EntryType) -> Self {
        Self {
            id: CategoryId::from_name(&name),
            name,
            icon,
            color,
            kind,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation("category name must not be empty".into()));
        }
        if self.id.as_str().is_empty() {
            return Err(LedgerError::Validation(format!(
                "category name '{}' needs at least one letter or digit",
                self.name
            )));
        }
        if !self.color.is_empty() {
            let re = COLOR_RE
                .as_ref()
                .ok_or_else(|| LedgerError::Validation("color pattern failed to compile".into()))?;
            if !re.is_match(&self.color) {
                return Err(LedgerError::Validation(format!(
                    "'{}' is not a hex color like #10b981",
                    self.color
                )));
            }
        }
        Ok(())
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub(crate) fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    pub(crate) fn find_by_id<'a>(categories: &'a [Category], id: &CategoryId) -> Option<&'a Category> {
        categories.iter().find(|c| &c.id == id)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
