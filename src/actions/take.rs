//! # Scoped action subscriptions ("take local").
//!
//! [`TakeLocal`] lets a module's routine wait for actions emitted by the
//! module itself or by one of its descendants. Siblings and ancestors are
//! never observed, and untagged actions never match.
//!
//! ## Matching
//! ```text
//! accepts(action) = action.meta.module is Some(tag)
//!                   && ancestry.is_ancestor(me, tag)
//!                   && pattern.matches(action)
//! ```
//!
//! ## Patterns
//! - `"*"` / [`Pattern::Wildcard`] matches every kind
//! - `"kind"` / [`Pattern::Kind`] matches one kind
//! - `vec!["a", "b"]` / [`Pattern::Kinds`] matches any listed kind
//! - [`Pattern::predicate`] matches with an arbitrary function

use std::fmt;
use std::sync::Arc;

use crate::actions::action::Action;
use crate::core::Ancestry;
use crate::error::RoutineError;
use crate::identity::ModuleId;
use crate::store::ActionStream;

/// Which actions a subscription is interested in.
#[derive(Clone)]
pub enum Pattern {
    /// Every action.
    Wildcard,
    /// Actions of exactly this kind.
    Kind(String),
    /// Actions whose kind is one of these.
    Kinds(Vec<String>),
    /// Actions accepted by the predicate.
    Predicate(Arc<dyn Fn(&Action) -> bool + Send + Sync>),
}

impl Pattern {
    /// Builds a predicate pattern.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Action) -> bool + Send + Sync + 'static,
    {
        Pattern::Predicate(Arc::new(f))
    }

    /// Checks the pattern alone, ignoring scope.
    pub fn matches(&self, action: &Action) -> bool {
        match self {
            Pattern::Wildcard => true,
            Pattern::Kind(kind) => action.is(kind),
            Pattern::Kinds(kinds) => kinds.iter().any(|k| action.is(k)),
            Pattern::Predicate(f) => f(action),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => f.write_str("Wildcard"),
            Pattern::Kind(k) => f.debug_tuple("Kind").field(k).finish(),
            Pattern::Kinds(ks) => f.debug_tuple("Kinds").field(ks).finish(),
            Pattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Pattern {
    fn from(kind: &str) -> Self {
        if kind == "*" {
            Pattern::Wildcard
        } else {
            Pattern::Kind(kind.to_string())
        }
    }
}

impl From<String> for Pattern {
    fn from(kind: String) -> Self {
        Pattern::from(kind.as_str())
    }
}

impl From<Vec<String>> for Pattern {
    fn from(kinds: Vec<String>) -> Self {
        Pattern::Kinds(kinds)
    }
}

impl From<Vec<&str>> for Pattern {
    fn from(kinds: Vec<&str>) -> Self {
        Pattern::Kinds(kinds.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Pattern {
    fn from(kinds: &[&str]) -> Self {
        Pattern::Kinds(kinds.iter().map(|k| k.to_string()).collect())
    }
}

/// Subscription builder bound to one module.
#[derive(Clone)]
pub struct TakeLocal {
    module: ModuleId,
    ancestry: Arc<Ancestry>,
}

impl TakeLocal {
    /// Creates a builder scoped to `module`.
    ///
    /// `ancestry` is usually [`Registry::ancestry`](crate::Registry::ancestry).
    pub fn new(module: ModuleId, ancestry: Arc<Ancestry>) -> Self {
        Self { module, ancestry }
    }

    /// The module this builder is scoped to.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// True if `action` was emitted by this module or a descendant and matches `pattern`.
    pub fn accepts(&self, action: &Action, pattern: &Pattern) -> bool {
        let Some(tag) = action.module() else {
            return false;
        };
        self.ancestry.is_ancestor(self.module, tag) && pattern.matches(action)
    }

    /// Returns the combined scope-and-pattern predicate.
    pub fn matcher(
        &self,
        pattern: impl Into<Pattern>,
    ) -> impl Fn(&Action) -> bool + Send + Sync + 'static {
        let pattern = pattern.into();
        let me = self.clone();
        move |action| me.accepts(action, &pattern)
    }

    /// Waits for the next action on `stream` that this module may observe.
    ///
    /// Returns [`RoutineError::Canceled`] when the stream's routine is cancelled
    /// or the store is gone.
    pub async fn take(
        &self,
        stream: &mut ActionStream,
        pattern: impl Into<Pattern>,
    ) -> Result<Action, RoutineError> {
        let pattern = pattern.into();
        loop {
            let action = stream.recv().await?;
            if self.accepts(&action, &pattern) {
                return Ok(action);
            }
        }
    }
}

impl fmt::Debug for TakeLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TakeLocal")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_patterns() {
        let add = Action::new("add");
        assert!(Pattern::from("*").matches(&add));
        assert!(Pattern::from("add").matches(&add));
        assert!(!Pattern::from("remove").matches(&add));
        assert!(Pattern::from(vec!["remove", "add"]).matches(&add));
        assert!(!Pattern::Kinds(Vec::new()).matches(&add));
    }

    #[test]
    fn predicate_pattern() {
        let p = Pattern::predicate(|a| a.payload.as_i64() == Some(2));
        assert!(p.matches(&Action::new("x").with_payload(2)));
        assert!(!p.matches(&Action::new("x").with_payload(3)));
    }

    #[test]
    fn untagged_actions_never_match() {
        let take = TakeLocal::new(ModuleId::next(), Arc::new(Ancestry::new()));
        assert!(!take.accepts(&Action::new("add"), &Pattern::Wildcard));
    }

    #[test]
    fn scope_is_self_and_descendants() {
        let ancestry = Arc::new(Ancestry::new());
        let (parent, me, child, sibling) = (
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
        );
        ancestry.link(me, parent);
        ancestry.link(child, me);
        ancestry.link(sibling, parent);

        let take = TakeLocal::new(me, ancestry);
        let accepts = take.matcher("add");
        assert!(accepts(&Action::new("add").tagged(me)));
        assert!(accepts(&Action::new("add").tagged(child)));
        assert!(!accepts(&Action::new("add").tagged(sibling)));
        assert!(!accepts(&Action::new("add").tagged(parent)));
        assert!(!accepts(&Action::new("add").tagged(parent).broadcast()));
        assert!(!accepts(&Action::new("remove").tagged(me)));
    }

    #[tokio::test]
    async fn take_skips_foreign_actions() {
        use crate::store::ActionBus;
        use tokio_util::sync::CancellationToken;

        let ancestry = Arc::new(Ancestry::new());
        let (me, other) = (ModuleId::next(), ModuleId::next());
        let bus = ActionBus::new(16);
        let mut stream = bus.stream(CancellationToken::new());

        bus.publish(Action::new("add").tagged(other));
        bus.publish(Action::new("add"));
        bus.publish(Action::new("add").tagged(me).with_payload(7));

        let take = TakeLocal::new(me, ancestry);
        let got = take.take(&mut stream, "*").await.unwrap();
        assert_eq!(got.payload, serde_json::json!(7));
    }

    #[tokio::test]
    async fn take_reports_cancellation() {
        use crate::store::ActionBus;
        use tokio_util::sync::CancellationToken;

        let token = CancellationToken::new();
        let bus = ActionBus::new(4);
        let mut stream = bus.stream(token.clone());
        token.cancel();

        let take = TakeLocal::new(ModuleId::next(), Arc::new(Ancestry::new()));
        assert_eq!(take.take(&mut stream, "*").await, Err(RoutineError::Canceled));
    }
}
