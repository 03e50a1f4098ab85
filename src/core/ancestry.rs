//! # Ancestry index: parent edges plus a positive-answer cache.
//!
//! The module tree is stored as a flat parent-pointer map (`id → parent id`),
//! an arena rather than nested objects. "Is A an ancestor of B" walks the
//! parent chain from B upward, which costs O(depth).
//!
//! ## Cache rules
//! - Only **positive** answers are cached, and only after a successful walk.
//! - Edges are immutable once written, so a cached answer can never become
//!   false. Edges of modules discarded after a failed build are dropped
//!   together with their cache entries; identities are never reused.
//! - Lookups are reflexive: every module is its own ancestor (not cached).
//!
//! The index is shared (`Arc`) between the [`Registry`](crate::Registry) and
//! the scoped reducers/subscriptions that query it during dispatch. It holds
//! no module records, so those closures never keep records alive.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

use crate::identity::ModuleId;

/// Parent edges and memoized ancestry answers.
#[derive(Default)]
pub struct Ancestry {
    parents: RwLock<HashMap<ModuleId, ModuleId>>,
    cache: Mutex<HashMap<ModuleId, HashSet<ModuleId>>>,
}

impl Ancestry {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `child → parent`. An existing edge is never overwritten.
    pub(crate) fn link(&self, child: ModuleId, parent: ModuleId) {
        self.parents.write().entry(child).or_insert(parent);
    }

    /// Parent of `id`, if it has one.
    pub fn parent_of(&self, id: ModuleId) -> Option<ModuleId> {
        self.parents.read().get(&id).copied()
    }

    /// True if `candidate` is `id` itself or one of its ancestors.
    pub fn is_ancestor(&self, candidate: ModuleId, id: ModuleId) -> bool {
        if candidate == id {
            return true;
        }
        if self
            .cache
            .lock()
            .get(&id)
            .is_some_and(|known| known.contains(&candidate))
        {
            return true;
        }

        let found = self.walk(candidate, id);
        if found {
            self.cache.lock().entry(id).or_default().insert(candidate);
            tracing::trace!(ancestor = %candidate, descendant = %id, "ancestry cached");
        }
        found
    }

    /// Drops the edges and cache entries of `ids`.
    pub(crate) fn forget(&self, ids: &HashSet<ModuleId>) {
        self.parents.write().retain(|child, _| !ids.contains(child));
        self.cache.lock().retain(|child, _| !ids.contains(child));
    }

    /// Uncached chain walk from `id` upward.
    pub(crate) fn walk(&self, candidate: ModuleId, id: ModuleId) -> bool {
        let parents = self.parents.read();
        let mut current = parents.get(&id).copied();
        while let Some(node) = current {
            if node == candidate {
                return true;
            }
            current = parents.get(&node).copied();
        }
        false
    }

    /// Copy of all edges, ordered by child id.
    pub fn edges(&self) -> BTreeMap<ModuleId, ModuleId> {
        self.parents.read().iter().map(|(c, p)| (*c, *p)).collect()
    }

    /// Copy of the cache: descendant → ancestors proven so far.
    pub fn cached(&self) -> BTreeMap<ModuleId, BTreeSet<ModuleId>> {
        self.cache
            .lock()
            .iter()
            .map(|(id, known)| (*id, known.iter().copied().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root ─┬─ a ── b
    ///       └─ c
    fn tree() -> (Ancestry, [ModuleId; 4]) {
        let ids = [
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
        ];
        let [root, a, b, c] = ids;
        let ancestry = Ancestry::new();
        ancestry.link(a, root);
        ancestry.link(b, a);
        ancestry.link(c, root);
        (ancestry, ids)
    }

    #[test]
    fn reflexive() {
        let (ancestry, ids) = tree();
        for id in ids {
            assert!(ancestry.is_ancestor(id, id));
        }
        assert!(ancestry.cached().is_empty());
    }

    #[test]
    fn ancestors_and_non_ancestors() {
        let (ancestry, [root, a, b, c]) = tree();

        assert!(ancestry.is_ancestor(root, b));
        assert!(ancestry.is_ancestor(a, b));
        assert!(ancestry.is_ancestor(root, c));

        assert!(!ancestry.is_ancestor(b, a));
        assert!(!ancestry.is_ancestor(c, b));
        assert!(!ancestry.is_ancestor(a, c));
        assert!(!ancestry.is_ancestor(b, root));
    }

    #[test]
    fn cache_only_grows_with_positive_answers() {
        let (ancestry, [root, a, b, c]) = tree();

        assert!(!ancestry.is_ancestor(c, b));
        assert!(ancestry.cached().is_empty());

        assert!(ancestry.is_ancestor(root, b));
        assert!(ancestry.is_ancestor(a, b));
        let cached = ancestry.cached();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[&b], BTreeSet::from([root, a]));
    }

    #[test]
    fn cached_and_uncached_answers_agree() {
        let (ancestry, ids) = tree();
        for x in ids {
            for y in ids {
                let first = ancestry.is_ancestor(x, y);
                let second = ancestry.is_ancestor(x, y);
                let third = ancestry.is_ancestor(x, y);
                assert_eq!(first, second, "{x} vs {y}");
                assert_eq!(second, third, "{x} vs {y}");
                assert_eq!(first, x == y || ancestry.walk(x, y));
            }
        }
    }

    #[test]
    fn edges_are_write_once() {
        let (ancestry, [root, a, b, _]) = tree();
        ancestry.link(b, root);
        assert_eq!(ancestry.parent_of(b), Some(a));
        assert_eq!(ancestry.parent_of(root), None);
        assert_eq!(ancestry.edges().len(), 3);
    }

    #[test]
    fn forgotten_edges_take_their_cache_along() {
        let (ancestry, [root, a, b, c]) = tree();
        assert!(ancestry.is_ancestor(root, b));
        assert!(ancestry.is_ancestor(root, c));

        ancestry.forget(&HashSet::from([a, b]));
        assert_eq!(ancestry.edges(), BTreeMap::from([(c, root)]));
        assert_eq!(ancestry.cached().keys().copied().collect::<Vec<_>>(), vec![c]);
        assert!(!ancestry.is_ancestor(root, b));
    }
}
