use std::collections::{BTreeMap, HashMap};

use crate::shared::identity::Identity;

/// Numeric recognizer label → identity, fixed for the session.
///
/// Persisted the other way round (identity → id), as produced by training;
/// [`LabelMap::from_identity_ids`] performs the inversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelMap {
    by_id: HashMap<i32, Identity>,
}

impl LabelMap {
    pub fn from_identity_ids(ids: &BTreeMap<String, i32>) -> Self {
        let by_id = ids
            .iter()
            .map(|(name, id)| (*id, Identity::new(name.clone())))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, label_id: i32) -> Option<&Identity> {
        self.by_id.get(&label_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Identity → id view, the persisted orientation.
    pub fn to_identity_ids(&self) -> BTreeMap<String, i32> {
        self.by_id
            .iter()
            .map(|(id, identity)| (identity.as_str().to_string(), *id))
            .collect()
    }
}

impl FromIterator<(i32, Identity)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (i32, Identity)>>(iter: T) -> Self {
        Self {
            by_id: iter.into_iter().collect(),
        }
    }
}
