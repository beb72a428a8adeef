//! Entity identity system using type-prefixed ULIDs
//!
//! Ids are opaque strings of the form `PRJ-01HQ…`: a type prefix plus a
//! ULID, which carries a creation timestamp and a random suffix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Company (tenant root)
    Co,
    /// Project
    Prj,
    /// User
    Usr,
    /// Milestone
    Ms,
    /// Task
    Task,
    /// Inspection
    Insp,
    /// Invoice
    Inv,
    /// Document reference
    Doc,
    /// Project team member (assignment)
    Tm,
    /// Bill certification
    Cert,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Co => "CO",
            EntityPrefix::Prj => "PRJ",
            EntityPrefix::Usr => "USR",
            EntityPrefix::Ms => "MS",
            EntityPrefix::Task => "TASK",
            EntityPrefix::Insp => "INSP",
            EntityPrefix::Inv => "INV",
            EntityPrefix::Doc => "DOC",
            EntityPrefix::Tm => "TM",
            EntityPrefix::Cert => "CERT",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Co,
            EntityPrefix::Prj,
            EntityPrefix::Usr,
            EntityPrefix::Ms,
            EntityPrefix::Task,
            EntityPrefix::Insp,
            EntityPrefix::Inv,
            EntityPrefix::Doc,
            EntityPrefix::Tm,
            EntityPrefix::Cert,
        ]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CO" => Ok(EntityPrefix::Co),
            "PRJ" => Ok(EntityPrefix::Prj),
            "USR" => Ok(EntityPrefix::Usr),
            "MS" => Ok(EntityPrefix::Ms),
            "TASK" => Ok(EntityPrefix::Task),
            "INSP" => Ok(EntityPrefix::Insp),
            "INV" => Ok(EntityPrefix::Inv),
            "DOC" => Ok(EntityPrefix::Doc),
            "TM" => Ok(EntityPrefix::Tm),
            "CERT" => Ok(EntityPrefix::Cert),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Create an EntityId from a prefix and existing ULID
    pub fn from_parts(prefix: EntityPrefix, ulid: Ulid) -> Self {
        Self { prefix, ulid }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: CO, PRJ, USR, MS, TASK, INSP, INV, DOC, TM, CERT)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Prj);
        assert!(id.to_string().starts_with("PRJ-"));
        assert_eq!(id.to_string().len(), 30); // PRJ- (4) + ULID (26) = 30
    }

    #[test]
    fn test_entity_id_parsing() {
        let original = EntityId::new(EntityPrefix::Co);
        let id_str = original.to_string();
        let parsed = EntityId::parse(&id_str).unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Co);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let original = EntityId::new(EntityPrefix::Insp);
        let serialized = original.to_string();
        let parsed = EntityId::parse(&serialized).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = EntityId::parse("XXX-01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = EntityId::parse("PRJ01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = EntityId::parse("PRJ-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let id = EntityId::new(*prefix);
            let parsed = EntityId::parse(&id.to_string()).unwrap();
            assert_eq!(parsed.prefix(), *prefix);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = EntityId::new(EntityPrefix::Usr);
        let b = EntityId::new(EntityPrefix::Usr);
        assert_ne!(a, b);
    }
}
