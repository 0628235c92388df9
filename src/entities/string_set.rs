use serde::{Deserialize, Serialize};

use crate::middleware::error::{AppError, AppResult};

const MAX_ITEM_LEN: usize = 64;

/// Ordered set of non-empty trimmed strings, first occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct StringSet(Vec<String>);

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items<I, S>(items: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for item in items {
            set.insert(item.as_ref())?;
        }
        Ok(set)
    }

    /// Returns false when the value was already present.
    pub fn insert(&mut self, value: &str) -> AppResult<bool> {
        let value = value.trim();
        if value.is_empty() || value.len() > MAX_ITEM_LEN {
            return Err(AppError::ValidationErrors {
                value: format!("set item '{value}' must be 1..={MAX_ITEM_LEN} characters"),
            });
        }
        if self.contains(value) {
            return Ok(false);
        }
        self.0.push(value.to_string());
        Ok(true)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for StringSet {
    type Error = AppError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        StringSet::from_items(value)
    }
}

impl From<StringSet> for Vec<String> {
    fn from(value: StringSet) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let set = StringSet::from_items(["rust", " go ", "rust", "sql"]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["rust", "go", "sql"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rejects_blank_items() {
        assert!(StringSet::from_items(["ok", "  "]).is_err());
        assert!(StringSet::from_items(["x".repeat(65)]).is_err());
    }

    #[test]
    fn validates_on_deserialize() {
        let set: StringSet = serde_json::from_str(r#"["a","b","a"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(serde_json::from_str::<StringSet>(r#"["a",""]"#).is_err());
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }
}
