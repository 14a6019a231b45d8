use std::collections::{BTreeSet, HashMap};

use crate::shared::identity::Identity;

/// Everything the tracker needs from one processed frame: who was seen, and
/// the snapshot taken for an identity in this frame, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameObservation {
    identities: BTreeSet<Identity>,
    snapshot_refs: HashMap<Identity, String>,
}

impl FrameObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_identities<I>(identities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identity>,
    {
        Self {
            identities: identities.into_iter().map(Into::into).collect(),
            snapshot_refs: HashMap::new(),
        }
    }

    /// Records a sighting. When an identity is seen several times in one
    /// frame (several unknown faces), the first snapshot is kept.
    pub fn add(&mut self, identity: Identity, snapshot_ref: Option<String>) {
        if let Some(stem) = snapshot_ref {
            self.snapshot_refs.entry(identity.clone()).or_insert(stem);
        }
        self.identities.insert(identity);
    }

    pub fn identities(&self) -> &BTreeSet<Identity> {
        &self.identities
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.identities.contains(identity)
    }

    pub fn snapshot_ref(&self, identity: &Identity) -> Option<&str> {
        self.snapshot_refs.get(identity).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
