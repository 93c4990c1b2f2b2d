//! Result Set Mapping Module
//!
//! Describes the shape of a query result: the root entity alias, the joined
//! associations hanging off it (by parent alias and field) and any scalar
//! columns.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A root entity in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResult {
    pub alias: String,
    pub class_name: String,
}

/// An entity fetched through an association of another alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedEntityResult {
    pub alias: String,
    pub class_name: String,
    pub parent_alias: String,
    pub field: String,
}

// == Result Set Mapping ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSetMapping {
    roots: Vec<EntityResult>,
    joined: Vec<JoinedEntityResult>,
    scalars: Vec<String>,
    index_by: Option<String>,
}

impl ResultSetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root_entity(mut self, class_name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.roots.push(EntityResult {
            alias: alias.into(),
            class_name: class_name.into(),
        });
        self
    }

    /// Adds an entity reached from `parent_alias` through `field`.
    pub fn add_joined_entity(
        mut self,
        class_name: impl Into<String>,
        alias: impl Into<String>,
        parent_alias: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.joined.push(JoinedEntityResult {
            alias: alias.into(),
            class_name: class_name.into(),
            parent_alias: parent_alias.into(),
            field: field.into(),
        });
        self
    }

    pub fn add_scalar_result(mut self, column: impl Into<String>) -> Self {
        self.scalars.push(column.into());
        self
    }

    /// Indexes root results by the value of `field`.
    pub fn set_index_by(mut self, field: impl Into<String>) -> Self {
        self.index_by = Some(field.into());
        self
    }

    pub fn root_entities(&self) -> &[EntityResult] {
        &self.roots
    }

    pub fn joined_entities(&self) -> &[JoinedEntityResult] {
        &self.joined
    }

    pub fn scalar_results(&self) -> &[String] {
        &self.scalars
    }

    pub fn has_scalar_results(&self) -> bool {
        !self.scalars.is_empty()
    }

    pub fn index_by(&self) -> Option<&str> {
        self.index_by.as_deref()
    }

    /// Joined entities whose parent is `alias`, in declaration order.
    pub fn children_of<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a JoinedEntityResult> {
        self.joined.iter().filter(move |j| j.parent_alias == alias)
    }

    pub fn joined(&self, alias: &str) -> Option<&JoinedEntityResult> {
        self.joined.iter().find(|j| j.alias == alias)
    }

    /// Joins leading from a root alias down to `alias`, outermost first.
    /// Empty if `alias` is a root or unknown.
    pub fn path_to(&self, alias: &str) -> Vec<&JoinedEntityResult> {
        let mut path = Vec::new();
        let mut current = self.joined(alias);
        while let Some(join) = current {
            // Guard against cyclic parent chains
            if path.len() > self.joined.len() {
                return Vec::new();
            }
            path.push(join);
            current = self.joined(&join.parent_alias);
        }
        path.reverse();
        path
    }

    /// Every entity class named by the mapping, roots first, without repeats.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = Vec::new();
        let names = self
            .roots
            .iter()
            .map(|r| r.class_name.as_str())
            .chain(self.joined.iter().map(|j| j.class_name.as_str()));
        for name in names {
            if !classes.contains(&name) {
                classes.push(name);
            }
        }
        classes
    }

    /// Stable fingerprint of the mapping's shape, used as a query key's
    /// mapping hash: the first 16 hex digits of a SHA-256 over a canonical
    /// rendering.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for root in &self.roots {
            hasher.update(format!("r:{}:{};", root.alias, root.class_name));
        }
        for join in &self.joined {
            hasher.update(format!(
                "j:{}:{}:{}:{};",
                join.alias, join.class_name, join.parent_alias, join.field
            ));
        }
        for scalar in &self.scalars {
            hasher.update(format!("s:{};", scalar));
        }
        if let Some(index_by) = &self.index_by {
            hasher.update(format!("i:{};", index_by));
        }

        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }
}
