//! Unit entity type - a unit of measure tagged with a dimension

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// A case-normalized unit code (e.g. "m", "kg", "ea", "box12")
///
/// Codes are stored lowercase so "CM" and "cm" name the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitCode(String);

impl UnitCode {
    /// Normalize and validate a raw code string
    pub fn new(raw: &str) -> Result<Self, CodeParseError> {
        let code = raw.trim().to_lowercase();
        if code.is_empty() {
            return Err(CodeParseError::Empty);
        }
        if code.chars().any(|c| c.is_whitespace()) {
            return Err(CodeParseError::Whitespace(raw.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnitCode {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for UnitCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UnitCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A dimension grouping units that can be mutually converted
/// (length, mass, temperature, ...). Normalized lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dimension(String);

impl Dimension {
    pub fn new(raw: &str) -> Result<Self, CodeParseError> {
        let dim = raw.trim().to_lowercase();
        if dim.is_empty() {
            return Err(CodeParseError::Empty);
        }
        Ok(Self(dim))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Dimension {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors parsing unit codes and dimension names
#[derive(Debug, Error)]
pub enum CodeParseError {
    #[error("code must not be empty")]
    Empty,

    #[error("code must not contain whitespace: '{0}'")]
    Whitespace(String),
}

/// A Unit entity - one unit of measure in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier
    pub id: EntityId,

    /// Unique case-normalized code
    pub code: UnitCode,

    /// Display name (e.g. "meter")
    pub name: String,

    /// Display symbol (e.g. "m"); defaults to the code when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Dimension this unit belongs to
    pub dimension: Dimension,

    /// Whether this is the SI base unit for its dimension
    /// (at most one per dimension)
    #[serde(default)]
    pub is_si_base: bool,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Last update timestamp
    pub updated: DateTime<Utc>,

    /// Author (who created this unit)
    pub author: String,
}

impl Unit {
    /// Create a new unit with the given parameters
    pub fn new(
        code: UnitCode,
        name: String,
        dimension: Dimension,
        is_si_base: bool,
        author: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Uom),
            code,
            name,
            symbol: None,
            dimension,
            is_si_base,
            created: now,
            updated: now,
            author,
        }
    }

    /// Symbol to display, falling back to the code
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(self.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_code_normalization() {
        let code = UnitCode::new(" CM ").unwrap();
        assert_eq!(code.as_str(), "cm");
        assert_eq!(code, UnitCode::new("cm").unwrap());
    }

    #[test]
    fn test_unit_code_rejects_empty() {
        assert!(matches!(UnitCode::new("  "), Err(CodeParseError::Empty)));
    }

    #[test]
    fn test_unit_code_rejects_whitespace() {
        assert!(matches!(
            UnitCode::new("fl oz"),
            Err(CodeParseError::Whitespace(_))
        ));
    }

    #[test]
    fn test_dimension_normalization() {
        let dim = Dimension::new("Length").unwrap();
        assert_eq!(dim.as_str(), "length");
    }

    #[test]
    fn test_unit_creation() {
        let unit = Unit::new(
            UnitCode::new("m").unwrap(),
            "meter".to_string(),
            Dimension::new("length").unwrap(),
            true,
            "test".to_string(),
        );

        assert!(unit.id.to_string().starts_with("UOM-"));
        assert_eq!(unit.code.as_str(), "m");
        assert!(unit.is_si_base);
        assert_eq!(unit.display_symbol(), "m");
    }

    #[test]
    fn test_unit_roundtrip() {
        let mut unit = Unit::new(
            UnitCode::new("degc").unwrap(),
            "degree Celsius".to_string(),
            Dimension::new("temperature").unwrap(),
            false,
            "test".to_string(),
        );
        unit.symbol = Some("°C".to_string());

        let yaml = serde_yml::to_string(&unit).unwrap();
        let parsed: Unit = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(unit.id, parsed.id);
        assert_eq!(unit.code, parsed.code);
        assert_eq!(unit.dimension, parsed.dimension);
        assert_eq!(parsed.display_symbol(), "°C");
    }
}
