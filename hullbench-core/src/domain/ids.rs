use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque material identifier (e.g. a WBM or Materials Project id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub String);

impl MaterialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MaterialId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque model identifier, one per prediction column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_raw_string() {
        assert_eq!(MaterialId::new("wbm-1-1").to_string(), "wbm-1-1");
        assert_eq!(ModelId::from("CHGNet").to_string(), "CHGNet");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ModelId::new("MACE")).unwrap();
        assert_eq!(json, "\"MACE\"");
        let back: MaterialId = serde_json::from_str("\"mp-149\"").unwrap();
        assert_eq!(back, MaterialId::from("mp-149"));
    }
}
