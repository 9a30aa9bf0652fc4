use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Normalised scientific-name key, e.g. `Crotalus_atrox`.
///
/// Surrounding whitespace is trimmed and every interior whitespace run becomes
/// a single underscore. Keys are compared byte-for-byte after normalisation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesKey(String);

impl SpeciesKey {
    /// Normalise a scientific name into a key.
    ///
    /// Returns `None` when the name is empty after trimming.
    ///
    /// ```
    /// use rangewatch_types::species::SpeciesKey;
    ///
    /// let key = SpeciesKey::normalize("  Crotalus   atrox ").unwrap();
    /// assert_eq!(key.as_str(), "Crotalus_atrox");
    /// assert!(SpeciesKey::normalize("   ").is_none());
    /// ```
    pub fn normalize(name: &str) -> Option<Self> {
        let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
        if joined.is_empty() {
            None
        } else {
            Some(Self(joined))
        }
    }

    /// Wrap an already-normalised key without re-normalising it.
    pub fn from_normalized(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SpeciesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SpeciesKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SpeciesKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let key = SpeciesKey::normalize("Crotalus\tatrox").unwrap();
        assert_eq!(key.as_str(), "Crotalus_atrox");

        let key = SpeciesKey::normalize("Lampropeltis  getula  californiae").unwrap();
        assert_eq!(key.as_str(), "Lampropeltis_getula_californiae");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = SpeciesKey::normalize("Crotalus atrox").unwrap();
        let twice = SpeciesKey::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = SpeciesKey::from_normalized("Crotalus_atrox");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Crotalus_atrox\"");
    }
}
