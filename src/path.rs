//! Node paths
//!
//! A node's name is the chain of keys from the root. Both spellings are
//! accepted when parsing:
//! - `address.city` (dot notation)
//! - `items[0].name` (bracket index)
//! - `items.0.name` (numeric segment treated as index)
//!
//! Parsing does not know the schema. A numeric segment under an object model
//! is turned back into a field key when the path is resolved through a
//! [`crate::Model`], which is how object fields named `0` stay reachable.
//!
//! Rendering always uses dots, so `items[0].name` prints as `items.0.name`.
//! The root path is the empty string.

use std::fmt;

use crate::error::BinderError;

/// One step from a container to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Object field access: .field
    Field(String),
    /// Array index access: [0]
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Path from the root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<Key>);

impl NodePath {
    /// The root path (empty name)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Last key, `None` at the root
    pub fn key(&self) -> Option<&Key> {
        self.0.last()
    }

    /// Parent path, `None` at the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.0.is_empty() {
            return None;
        }
        Some(NodePath(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, key: Key) -> NodePath {
        let mut keys = self.0.clone();
        keys.push(key);
        NodePath(keys)
    }

    pub fn field(&self, name: impl Into<String>) -> NodePath {
        self.child(Key::Field(name.into()))
    }

    pub fn index(&self, idx: usize) -> NodePath {
        self.child(Key::Index(idx))
    }

    /// Segment-wise prefix test; every path starts with the root path
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Parse a dotted/bracket path string
    ///
    /// Examples:
    /// - "address.city" → [Field("address"), Field("city")]
    /// - "items[0].name" → [Field("items"), Index(0), Field("name")]
    /// - "" → root
    pub fn parse(path: &str) -> Result<NodePath, BinderError> {
        if path.is_empty() {
            return Ok(NodePath::root());
        }

        let invalid = || BinderError::InvalidPath {
            path: path.to_string(),
        };
        let mut keys = Vec::new();

        for part in path.split('.') {
            if part.is_empty() {
                return Err(invalid());
            }

            // Field followed by one or more indexes: items[0][1]
            if let Some(bracket_pos) = part.find('[') {
                let field = &part[..bracket_pos];
                if !field.is_empty() {
                    keys.push(Key::Field(field.to_string()));
                }

                let mut rest = &part[bracket_pos..];
                while !rest.is_empty() {
                    if !rest.starts_with('[') {
                        return Err(invalid());
                    }
                    let close = rest.find(']').ok_or_else(invalid)?;
                    let index: usize = rest[1..close].parse().map_err(|_| invalid())?;
                    keys.push(Key::Index(index));
                    rest = &rest[close + 1..];
                }
            } else if let Ok(index) = part.parse::<usize>() {
                keys.push(Key::Index(index));
            } else {
                keys.push(Key::Field(part.to_string()));
            }
        }

        Ok(NodePath(keys))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl From<Vec<Key>> for NodePath {
    fn from(keys: Vec<Key>) -> Self {
        NodePath(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_path() {
        let path = NodePath::parse("address.city").unwrap();
        assert_eq!(
            path.keys(),
            &[
                Key::Field("address".to_string()),
                Key::Field("city".to_string())
            ]
        );
    }

    #[test]
    fn parse_bracket_and_dot_index_agree() {
        let bracket = NodePath::parse("items[0].name").unwrap();
        let dotted = NodePath::parse("items.0.name").unwrap();
        assert_eq!(bracket, dotted);
        assert_eq!(bracket.to_string(), "items.0.name");
    }

    #[test]
    fn parse_nested_indexes() {
        let path = NodePath::parse("grid[1][2]").unwrap();
        assert_eq!(
            path.keys(),
            &[Key::Field("grid".to_string()), Key::Index(1), Key::Index(2)]
        );
    }

    #[test]
    fn parse_root() {
        assert!(NodePath::parse("").unwrap().is_root());
        assert_eq!(NodePath::root().to_string(), "");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(NodePath::parse("a..b").is_err());
        assert!(NodePath::parse("items[x]").is_err());
        assert!(NodePath::parse("items[0").is_err());
        let err = NodePath::parse("a.").unwrap_err();
        assert!(err.to_string().contains("FORM-020"));
    }

    #[test]
    fn prefix_is_segment_wise() {
        let email = NodePath::parse("email").unwrap();
        let other = NodePath::parse("emailConfirm").unwrap();
        let nested = NodePath::parse("email.domain").unwrap();
        assert!(nested.starts_with(&email));
        assert!(!other.starts_with(&email));
        assert!(email.starts_with(&NodePath::root()));
    }

    #[test]
    fn parent_and_key() {
        let path = NodePath::root().field("items").index(2);
        assert_eq!(path.key(), Some(&Key::Index(2)));
        assert_eq!(path.parent().unwrap().to_string(), "items");
        assert_eq!(NodePath::root().parent(), None);
    }
}
