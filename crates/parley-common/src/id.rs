use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(String);

impl ServerId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn server_id_new() {
        let sid = ServerId::new();
        let parsed = uuid::Uuid::parse_str(sid.as_str());
        assert!(parsed.is_ok());
    }

    #[test]
    fn server_id_display() {
        let sid = ServerId::new();
        let display = sid.to_string();
        assert_eq!(display, sid.as_str());
    }

    #[test]
    fn server_id_equality() {
        let sid = ServerId::new();
        let cloned = sid.clone();
        assert_eq!(sid, cloned);

        let other = ServerId::new();
        assert_ne!(sid, other);
    }

    #[test]
    fn server_id_serialization() {
        let sid = ServerId::new();
        let json = serde_json::to_string(&sid).unwrap();
        let deserialized: ServerId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, deserialized);
    }

    #[test]
    fn server_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let s1 = ServerId::new();
        let s2 = s1.clone();
        set.insert(s1);
        set.insert(s2);
        assert_eq!(set.len(), 1);
    }
}
