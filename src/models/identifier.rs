//! Identifier and target input types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Field name carried by seed identifiers.
pub const USERNAME_FIELD: &str = "username";

/// A typed value that can be probed: the field it was observed under plus its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    field: String,
    value: String,
}

impl Identifier {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Identifier for a username seed.
    pub fn username(value: impl Into<String>) -> Self {
        Self::new(USERNAME_FIELD, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.field)
    }
}

/// A seed supplied by the user.
///
/// Anything from the first `@` onward is dropped, so `alice@example.com`
/// seeds the username `alice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    input: String,
    identifier: Identifier,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self> {
        let value = input.trim().split('@').next().unwrap_or_default().trim();
        if value.is_empty() {
            return Err(AppError::validation(format!(
                "target '{input}' has no username part"
            )));
        }

        Ok(Self {
            input: input.to_string(),
            identifier: Identifier::username(value),
        })
    }

    /// The raw string the target was parsed from.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identifier.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_strips_mail_domain() {
        let target = Target::parse("alice@example.com").unwrap();
        assert_eq!(target.identifier().value(), "alice");
        assert_eq!(target.identifier().field(), USERNAME_FIELD);
        assert_eq!(target.input(), "alice@example.com");
    }

    #[test]
    fn test_target_rejects_empty() {
        assert!(Target::parse("   ").is_err());
        assert!(Target::parse("@example.com").is_err());
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier::new("id", "123");
        assert_eq!(id.to_string(), "123 (id)");
    }
}
