//! # Jurisdiction Codes
//!
//! A jurisdiction identifies the legal context a policy is issued in and
//! the home country of a company. Codes are ISO-style (`US`, `EU`, `UK`)
//! or sub-national (`US-CA`).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated jurisdiction code.
///
/// # Validation
///
/// 2 to 10 characters drawn from `A-Z`, `0-9` and `-`. Input is trimmed and
/// upper-cased before validation, so `" us "` becomes `US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Create a jurisdiction code, normalising case and whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidJurisdiction`] on empty input, bad
    /// length, or characters outside the allowed set.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref();
        let normalised = raw.trim().to_ascii_uppercase();
        let len_ok = (2..=10).contains(&normalised.len());
        let chars_ok = normalised
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
        if !len_ok || !chars_ok || normalised.starts_with('-') {
            return Err(ValidationError::InvalidJurisdiction(raw.to_string()));
        }
        Ok(Self(normalised))
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `other` names the same jurisdiction, ignoring case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl TryFrom<String> for JurisdictionCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JurisdictionCode> for String {
    fn from(code: JurisdictionCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_whitespace() {
        let code = JurisdictionCode::new(" us ").unwrap();
        assert_eq!(code.as_str(), "US");
    }

    #[test]
    fn accepts_subnational_codes() {
        assert_eq!(JurisdictionCode::new("US-CA").unwrap().as_str(), "US-CA");
    }

    #[test]
    fn rejects_bad_codes() {
        assert!(JurisdictionCode::new("").is_err());
        assert!(JurisdictionCode::new("U").is_err());
        assert!(JurisdictionCode::new("UNITED-STATES").is_err());
        assert!(JurisdictionCode::new("U S").is_err());
        assert!(JurisdictionCode::new("-US").is_err());
    }

    #[test]
    fn serde_roundtrip_validates() {
        let code: JurisdictionCode = serde_json::from_str("\"eu\"").unwrap();
        assert_eq!(code.as_str(), "EU");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"EU\"");
        assert!(serde_json::from_str::<JurisdictionCode>("\"e u\"").is_err());
    }

    #[test]
    fn matches_ignores_case() {
        let code = JurisdictionCode::new("UK").unwrap();
        assert!(code.matches("uk"));
        assert!(!code.matches("US"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalisation is idempotent and case-insensitive.
        #[test]
        fn normalised_codes_are_stable(raw in "[a-zA-Z0-9][a-zA-Z0-9-]{1,9}", pad in " {0,3}") {
            let code = JurisdictionCode::new(format!("{pad}{raw}{pad}")).unwrap();
            prop_assert_eq!(code.as_str(), raw.to_ascii_uppercase());
            prop_assert_eq!(JurisdictionCode::new(code.as_str()).unwrap(), code.clone());
            prop_assert!(code.matches(&raw.to_ascii_lowercase()));
        }

        /// Any character outside `A-Z`, `0-9` and `-` is rejected.
        #[test]
        fn foreign_characters_rejected(
            head in "[A-Z]{1,4}",
            bad in "[_ ./!#]",
            tail in "[A-Z]{1,4}",
        ) {
            let raw = format!("{head}{bad}{tail}");
            prop_assert!(matches!(
                JurisdictionCode::new(&raw),
                Err(ValidationError::InvalidJurisdiction(_))
            ));
        }
    }
}
