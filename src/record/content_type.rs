//! Content types used to address records in collaborator subsystems.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of record, as known to the activity log, notes and conformity graph.
///
/// Serialized as a lowercase string; custom kinds use the `custom:<name>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentType {
    /// A company (the default record kind).
    #[default]
    Company,
    /// A customer (contact person).
    Customer,
    /// A sales deal.
    Deal,
    /// A support ticket.
    Ticket,
    /// Any other kind.
    Custom(String),
}

impl ContentType {
    /// Returns the wire name of this content type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Company => "company",
            Self::Customer => "customer",
            Self::Deal => "deal",
            Self::Ticket => "ticket",
            Self::Custom(name) => name,
        }
    }
}

impl TryFrom<String> for ContentType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err("content type cannot be empty".to_string());
        }

        let bytes = value.as_bytes();
        if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"custom:") {
            let rest = value[7..].trim();
            if rest.is_empty() {
                return Err("custom content type cannot be empty".to_string());
            }
            return Ok(Self::Custom(rest.to_string()));
        }

        Ok(if value.eq_ignore_ascii_case("company") {
            Self::Company
        } else if value.eq_ignore_ascii_case("customer") {
            Self::Customer
        } else if value.eq_ignore_ascii_case("deal") {
            Self::Deal
        } else if value.eq_ignore_ascii_case("ticket") {
            Self::Ticket
        } else {
            return Err(format!(
                "unknown content type: {value}. Use a built-in type (company, customer, deal, ticket) or prefix custom types with custom:<name>"
            ));
        })
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "custom:{name}"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_display() {
        assert_eq!(ContentType::Company.to_string(), "company");
        assert_eq!(ContentType::Deal.to_string(), "deal");
        assert_eq!(
            ContentType::Custom("invoice".to_string()).to_string(),
            "custom:invoice"
        );
    }

    #[test]
    fn test_content_type_serde_is_string() {
        let company = serde_json::to_value(ContentType::Company).unwrap();
        assert_eq!(company, serde_json::Value::String("company".to_string()));

        let parsed: ContentType = serde_json::from_str("\"Customer\"").unwrap();
        assert_eq!(parsed, ContentType::Customer);

        let custom: ContentType = serde_json::from_str("\"custom:invoice\"").unwrap();
        assert_eq!(custom, ContentType::Custom("invoice".to_string()));

        let unknown: Result<ContentType, _> = serde_json::from_str("\"compnay\"");
        assert!(unknown.is_err());

        let empty: Result<ContentType, _> = serde_json::from_str("\"custom: \"");
        assert!(empty.is_err());
    }

    #[test]
    fn test_custom_builtin_name_roundtrips() {
        let original = ContentType::Custom("company".to_string());
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"custom:company\"");
        let decoded: ContentType = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }
}
