//! Category names.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The categories available in a new database.
pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "Entertainment",
    "Food",
    "Groceries",
    "Healthcare",
    "Income",
    "Miscellaneous",
    "Rent",
    "Shopping",
    "Travel",
    "Utilities",
];

/// The name of a category, never empty and without surrounding whitespace.
///
/// A transaction has exactly one category, referenced by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyName] if `name` is blank.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        Ok(Self(name.to_owned()))
    }

    /// Wrap a name read back from the database.
    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request body for creating and renaming a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The name of the category.
    pub name: String,
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(CategoryName::new(" \t"), Err(Error::EmptyName));
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(
            CategoryName::new(" Food\n").map(|name| name.to_string()),
            Ok("Food".to_owned())
        );
    }
}
