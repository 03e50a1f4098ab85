//! # Module registry - identity → record arena with ancestry queries.
//!
//! The registry tracks every instantiated module of one application:
//! - `records`: identity → [`ModuleRecord`]
//! - `mounts`: parent identity → mount name → child identity
//! - [`Ancestry`]: identity → parent identity, plus the positive-answer cache
//!
//! ## Architecture
//! ```text
//! ModuleFactory::instantiate ──► ModuleContext::add(child)
//!                                   └─► Registry::register(Some(parent), child, mount)
//!                                          ├─► records[child.id]       = child
//!                                          ├─► mounts[parent][mount]   = child.id
//!                                          └─► ancestry.link(child.id, parent)
//!
//! ModuleFactory::instantiate_root ──► Registry::register(None, root, mount)
//! ```
//!
//! ## Rules
//! - A registry handle is passed down explicitly (`Arc<Registry>`); there is
//!   no process-wide instance, so applications and tests never share state.
//! - Records live as long as the registry. The only removal is
//!   [`discard_descendants`](Registry::discard_descendants), which drops the
//!   children a module registered before its own build failed.
//! - Lookups of unknown identities fail loudly with [`ModuleError::NotFound`].
//! - Registration is lock-protected, so concurrent construction is safe.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::FailurePolicy;
use crate::core::ancestry::Ancestry;
use crate::error::ModuleError;
use crate::identity::ModuleId;
use crate::module::ModuleRecord;

#[derive(Default)]
struct Inner {
    records: HashMap<ModuleId, Arc<ModuleRecord>>,
    names: HashMap<ModuleId, Option<String>>,
    mounts: HashMap<ModuleId, BTreeMap<String, ModuleId>>,
    order: Vec<ModuleId>,
}

/// Registry of instantiated modules.
pub struct Registry {
    inner: RwLock<Inner>,
    ancestry: Arc<Ancestry>,
    policy: FailurePolicy,
}

/// One registered module, as exposed by [`Registry::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Module identity.
    pub id: ModuleId,
    /// Parent identity (`None` for top-level modules).
    pub parent: Option<ModuleId>,
    /// Mount name under the parent (or the root's own mount name).
    pub mount: Option<String>,
}

/// Full registry state for debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// Modules in registration order.
    pub modules: Vec<ModuleEntry>,
    /// Ancestry cache: descendant → ancestors proven so far.
    pub cache: BTreeMap<ModuleId, BTreeSet<ModuleId>>,
}

impl Registry {
    /// Creates a new, empty registry with the default failure policy.
    pub fn new() -> Arc<Self> {
        Self::with_policy(FailurePolicy::default())
    }

    /// Creates a new, empty registry whose modules supervise their routines with `policy`.
    pub fn with_policy(policy: FailurePolicy) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Inner::default()),
            ancestry: Arc::new(Ancestry::new()),
            policy,
        })
    }

    /// Failure policy for routine groups composed under this registry.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Records `record` under `parent` at `mount`.
    ///
    /// Fails with [`ModuleError::Duplicate`] if the identity is already known.
    pub fn register(
        &self,
        parent: Option<ModuleId>,
        record: Arc<ModuleRecord>,
        mount: Option<&str>,
    ) -> Result<(), ModuleError> {
        let id = record.id();
        {
            let mut inner = self.inner.write();
            if inner.records.contains_key(&id) {
                return Err(ModuleError::Duplicate { id });
            }
            inner.records.insert(id, record);
            inner.names.insert(id, mount.map(str::to_string));
            inner.order.push(id);
            if let (Some(parent), Some(mount)) = (parent, mount) {
                inner
                    .mounts
                    .entry(parent)
                    .or_default()
                    .insert(mount.to_string(), id);
            }
        }
        if let Some(parent) = parent {
            self.ancestry.link(id, parent);
        }

        tracing::debug!(
            module = %id,
            parent = ?parent.map(ModuleId::as_u64),
            mount = mount.unwrap_or("<unmounted>"),
            "module registered"
        );
        Ok(())
    }

    /// Returns the record registered under `id`.
    pub fn lookup(&self, id: ModuleId) -> Result<Arc<ModuleRecord>, ModuleError> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(ModuleError::NotFound { id })
    }

    /// Returns the child of `parent` mounted at `mount`.
    pub fn child(&self, parent: ModuleId, mount: &str) -> Result<Arc<ModuleRecord>, ModuleError> {
        let inner = self.inner.read();
        let id = inner
            .mounts
            .get(&parent)
            .and_then(|m| m.get(mount))
            .copied()
            .ok_or_else(|| ModuleError::UnknownMount {
                parent,
                mount: mount.to_string(),
            })?;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(ModuleError::NotFound { id })
    }

    /// Children of `parent` keyed by mount name.
    pub fn children(&self, parent: ModuleId) -> BTreeMap<String, Arc<ModuleRecord>> {
        let inner = self.inner.read();
        let Some(mounts) = inner.mounts.get(&parent) else {
            return BTreeMap::new();
        };
        mounts
            .iter()
            .filter_map(|(mount, id)| inner.records.get(id).map(|r| (mount.clone(), r.clone())))
            .collect()
    }

    /// True if `candidate` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, candidate: ModuleId, id: ModuleId) -> bool {
        self.ancestry.is_ancestor(candidate, id)
    }

    /// Parent of `id`, if it has one.
    pub fn parent_of(&self, id: ModuleId) -> Option<ModuleId> {
        self.ancestry.parent_of(id)
    }

    /// Shared handle to the ancestry index (used by scoped reducers and subscriptions).
    pub fn ancestry(&self) -> Arc<Ancestry> {
        Arc::clone(&self.ancestry)
    }

    /// Removes every registered descendant of `id` and returns how many
    /// there were. `id` itself is expected to be unregistered: it is the
    /// module whose build failed after adding children.
    pub(crate) fn discard_descendants(&self, id: ModuleId) -> usize {
        let mut inner = self.inner.write();
        let doomed: HashSet<ModuleId> = inner
            .order
            .iter()
            .copied()
            .filter(|m| self.ancestry.walk(id, *m))
            .collect();
        inner.mounts.remove(&id);
        if doomed.is_empty() {
            return 0;
        }

        inner.records.retain(|m, _| !doomed.contains(m));
        inner.names.retain(|m, _| !doomed.contains(m));
        inner.mounts.retain(|m, _| !doomed.contains(m));
        inner.order.retain(|m| !doomed.contains(m));
        drop(inner);

        self.ancestry.forget(&doomed);
        doomed.len()
    }

    /// True if no module has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Copies the full registry state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read();
        let modules = inner
            .order
            .iter()
            .map(|id| ModuleEntry {
                id: *id,
                parent: self.ancestry.parent_of(*id),
                mount: inner.names.get(id).cloned().flatten(),
            })
            .collect();
        RegistrySnapshot {
            modules,
            cache: self.ancestry.cached(),
        }
    }

    /// Renders the module tree, one line per module labelled `"<mount> | <id>"`.
    ///
    /// Top-level modules (no registered parent) start a tree each; modules
    /// without a mount name are labelled `root`.
    ///
    /// ```text
    /// app | 1
    /// ├── a | 2
    /// │   └── b | 3
    /// └── c | 4
    /// ```
    pub fn render_tree(&self) -> String {
        let snapshot = self.snapshot();
        let mut children: HashMap<ModuleId, Vec<&ModuleEntry>> = HashMap::new();
        let mut roots = Vec::new();
        let known: BTreeSet<ModuleId> = snapshot.modules.iter().map(|m| m.id).collect();

        for entry in &snapshot.modules {
            match entry.parent {
                Some(parent) if known.contains(&parent) => {
                    children.entry(parent).or_default().push(entry)
                }
                _ => roots.push(entry),
            }
        }

        let mut out = String::new();
        for root in roots {
            let _ = writeln!(out, "{}", label(root));
            render_children(&children, root.id, "", &mut out);
        }
        out
    }
}

fn label(entry: &ModuleEntry) -> String {
    format!("{} | {}", entry.mount.as_deref().unwrap_or("root"), entry.id)
}

fn render_children(
    children: &HashMap<ModuleId, Vec<&ModuleEntry>>,
    parent: ModuleId,
    prefix: &str,
    out: &mut String,
) {
    let Some(nodes) = children.get(&parent) else {
        return;
    };
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", label(node));
        render_children(children, node.id, &format!("{prefix}{indent}"), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleRecord;

    fn record() -> Arc<ModuleRecord> {
        Arc::new(ModuleRecord::bare(ModuleId::next()))
    }

    #[test]
    fn empty_until_first_registration() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        registry.register(None, record(), Some("app")).unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_unknown_is_not_found() {
        let registry = Registry::new();
        let id = ModuleId::next();
        match registry.lookup(id) {
            Err(ModuleError::NotFound { id: missing }) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.id())),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = Registry::new();
        let rec = record();
        registry.register(None, rec.clone(), None).unwrap();
        assert_eq!(
            registry.register(None, rec.clone(), None),
            Err(ModuleError::Duplicate { id: rec.id() })
        );
    }

    #[test]
    fn children_are_indexed_by_mount() {
        let registry = Registry::new();
        let root = record();
        let a = record();
        registry.register(None, root.clone(), Some("app")).unwrap();
        registry.register(Some(root.id()), a.clone(), Some("a")).unwrap();

        assert_eq!(registry.child(root.id(), "a").unwrap().id(), a.id());
        assert_eq!(registry.children(root.id()).len(), 1);
        assert!(matches!(
            registry.child(root.id(), "zzz"),
            Err(ModuleError::UnknownMount { .. })
        ));
        assert!(registry.is_ancestor(root.id(), a.id()));
        assert!(!registry.is_ancestor(a.id(), root.id()));
    }

    #[test]
    fn ancestry_follows_registration_sequence() {
        // app ─┬─ a ── b
        //      └─ c
        let registry = Registry::new();
        let (app, a, b, c) = (record(), record(), record(), record());
        registry.register(Some(a.id()), b.clone(), Some("b")).unwrap();
        registry.register(Some(app.id()), a.clone(), Some("a")).unwrap();
        registry.register(Some(app.id()), c.clone(), Some("c")).unwrap();
        registry.register(None, app.clone(), Some("app")).unwrap();

        let ids = [app.id(), a.id(), b.id(), c.id()];
        let descendants = |x: ModuleId| -> Vec<ModuleId> {
            if x == app.id() {
                ids.to_vec()
            } else if x == a.id() {
                vec![a.id(), b.id()]
            } else {
                vec![x]
            }
        };
        for x in ids {
            for y in ids {
                assert_eq!(
                    registry.is_ancestor(x, y),
                    descendants(x).contains(&y),
                    "is_ancestor({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn discarding_drops_the_failed_subtree_only() {
        // failed (never registered) ── a ── b ; other
        let registry = Registry::new();
        let failed = ModuleId::next();
        let (a, b, other) = (record(), record(), record());
        registry.register(Some(failed), a.clone(), Some("a")).unwrap();
        registry.register(Some(a.id()), b.clone(), Some("b")).unwrap();
        registry.register(None, other.clone(), Some("other")).unwrap();
        assert!(registry.is_ancestor(failed, b.id()));

        assert_eq!(registry.discard_descendants(failed), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(a.id()).is_err());
        assert!(registry.children(failed).is_empty());
        assert!(registry.snapshot().cache.is_empty());
        assert_eq!(registry.render_tree(), format!("other | {}\n", other.id()));

        assert_eq!(registry.discard_descendants(other.id()), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn renders_nested_tree() {
        let registry = Registry::new();
        let (app, a, b, c) = (record(), record(), record(), record());
        registry.register(Some(a.id()), b.clone(), Some("b")).unwrap();
        registry.register(Some(app.id()), a.clone(), Some("a")).unwrap();
        registry.register(Some(app.id()), c.clone(), Some("c")).unwrap();
        registry.register(None, app.clone(), None).unwrap();

        let expected = format!(
            "root | {}\n├── a | {}\n│   └── b | {}\n└── c | {}\n",
            app.id(),
            a.id(),
            b.id(),
            c.id()
        );
        assert_eq!(registry.render_tree(), expected);
    }

    #[test]
    fn snapshot_exposes_edges_and_cache() {
        let registry = Registry::new();
        let (app, a) = (record(), record());
        registry.register(Some(app.id()), a.clone(), Some("a")).unwrap();
        registry.register(None, app.clone(), Some("app")).unwrap();
        assert!(registry.is_ancestor(app.id(), a.id()));

        let snap = registry.snapshot();
        assert_eq!(snap.modules.len(), 2);
        assert_eq!(snap.modules[0].parent, Some(app.id()));
        assert_eq!(snap.modules[1].mount.as_deref(), Some("app"));
        assert_eq!(snap.cache[&a.id()], BTreeSet::from([app.id()]));
    }
}
