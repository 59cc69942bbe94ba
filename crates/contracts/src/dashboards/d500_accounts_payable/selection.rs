use serde::{Deserialize, Serialize};

use super::record::PayableStatus;

/// Option shown at the top of every filter list; selecting it disables the filter
pub const ALL_SENTINEL: &str = "Todos";

/// Multi-select filter value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "values")]
pub enum Selection {
    #[default]
    All,
    Only(Vec<String>),
}

impl Selection {
    /// Parse a comma-separated query value.
    ///
    /// `None`, an empty string, or any item equal to `Todos`/`all` yields [`Selection::All`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self::from_values(raw.split(',')),
            None => Self::All,
        }
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = Vec::new();
        for value in values {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            if is_all_sentinel(value) {
                return Self::All;
            }
            items.push(value.to_string());
        }
        if items.is_empty() {
            Self::All
        } else {
            Self::Only(items)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Exact membership
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(items) => items.iter().any(|item| item == value),
        }
    }

    /// Case-insensitive membership
    pub fn matches_ignore_case(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(items) => {
                let value = value.trim().to_lowercase();
                items.iter().any(|item| item.to_lowercase() == value)
            }
        }
    }

    /// Status membership: `aberto`/`open` and `quitado`/`settled` select each
    /// other; any other status text is compared case-insensitively.
    pub fn matches_status(&self, status: &str) -> bool {
        match (self, PayableStatus::from_raw(status)) {
            (Self::All, _) => true,
            (_, PayableStatus::Other) => self.matches_ignore_case(status),
            (Self::Only(items), kind) => items
                .iter()
                .any(|item| PayableStatus::from_raw(item) == kind),
        }
    }
}

fn is_all_sentinel(value: &str) -> bool {
    value.eq_ignore_ascii_case(ALL_SENTINEL) || value.eq_ignore_ascii_case("all")
}
