//! Actor identity.

use crate::error::ActorNameError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable, human-readable identity of an actor.
///
/// Assigned at spawn or obtained through the naming handshake with the
/// director. Unique among all actors known to one director, and the key
/// under which peer channels are registered and looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorName(String);

impl ActorName {
    /// Create a validated actor name.
    ///
    /// # Errors
    ///
    /// Returns [`ActorNameError::Empty`] for the empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, ActorNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ActorNameError::Empty);
        }
        Ok(Self(name))
    }

    /// The raw name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ActorName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<ActorName> for String {
    fn from(name: ActorName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_name_creation() {
        let name = ActorName::new("Front door").unwrap();
        assert_eq!(name.as_str(), "Front door");
        assert_eq!(name.to_string(), "Front door");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(ActorName::new(""), Err(ActorNameError::Empty)));
    }

    #[test]
    fn test_str_lookup_in_maps() {
        let mut registry: HashMap<ActorName, u32> = HashMap::new();
        registry.insert(ActorName::new("Line").unwrap(), 1);
        assert_eq!(registry.get("Line"), Some(&1));
        assert_eq!(registry.get("Teller"), None);
    }
}
