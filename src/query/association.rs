//! Association Path Module
//!
//! Resolves the value an alias of a result set mapping has for one root
//! object, by walking the association path from the root down to the alias.

use crate::orm::{AssociationValue, JoinedEntityResult, ObjectMapper, ResultSetMapping};

/// Value of an alias for one root object.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationPathValue<T> {
    /// The alias is reached through to-one associations only
    One(T),
    /// The last step is a to-many association
    Many(Vec<T>),
    /// One value per member of an intermediate to-many association
    Nested(Vec<AssociationPathValue<T>>),
}

impl<T> AssociationPathValue<T> {
    /// Number of values at this level.
    pub fn len(&self) -> usize {
        match self {
            AssociationPathValue::One(_) => 1,
            AssociationPathValue::Many(values) => values.len(),
            AssociationPathValue::Nested(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every object of the value, depth first, nesting flattened.
    pub fn into_objects(self) -> Vec<T> {
        match self {
            AssociationPathValue::One(object) => vec![object],
            AssociationPathValue::Many(objects) => objects,
            AssociationPathValue::Nested(values) => values
                .into_iter()
                .flat_map(AssociationPathValue::into_objects)
                .collect(),
        }
    }
}

/// Resolves `alias` against `root`.
///
/// Returns `None` if `alias` is not a joined alias of `rsm` or a to-one
/// association on the path is null. Null members below an intermediate
/// collection are left out.
pub fn resolve_association<M: ObjectMapper>(
    mapper: &M,
    rsm: &ResultSetMapping,
    alias: &str,
    root: &M::Object,
) -> Option<AssociationPathValue<M::Object>> {
    let path: Vec<&str> = rsm.path_to(alias).iter().map(|j| j.field.as_str()).collect();
    if path.is_empty() {
        return None;
    }
    resolve_path(mapper, root, &path)
}

/// Resolves one joined association against `owner`, the object bound to
/// the join's parent alias. Never `Nested`; `None` for a null to-one.
pub fn resolve_join<M: ObjectMapper>(
    mapper: &M,
    join: &JoinedEntityResult,
    owner: &M::Object,
) -> Option<AssociationPathValue<M::Object>> {
    resolve_path(mapper, owner, &[join.field.as_str()])
}

fn resolve_path<M: ObjectMapper>(
    mapper: &M,
    object: &M::Object,
    path: &[&str],
) -> Option<AssociationPathValue<M::Object>> {
    let (field, rest) = path.split_first()?;
    let value = mapper.association_value(object, field);

    if rest.is_empty() {
        return match value {
            AssociationValue::Single(target) => target.map(AssociationPathValue::One),
            AssociationValue::Collection(members) => Some(AssociationPathValue::Many(members)),
        };
    }

    match value {
        AssociationValue::Single(target) => resolve_path(mapper, &target?, rest),
        AssociationValue::Collection(members) => Some(AssociationPathValue::Nested(
            members
                .iter()
                .filter_map(|member| resolve_path(mapper, member, rest))
                .collect(),
        )),
    }
}
