//! Ordered middleware registry and the fold that turns it into a chain.
//!
//! # Concurrency
//!
//! There is no internal locking. Every mutation takes `&mut self` and
//! [`MiddlewareStack::build`] takes `&self`, so the borrow checker already
//! rules out a mutation racing a build on the same value. A stack shared
//! between configuration threads must be wrapped in a `Mutex` (or similar) by
//! the caller. Finish configuring before building.

use std::fmt;

use tracing::{debug, warn};

use crate::error::BoxError;
use crate::handler::{BoxedHandler, Handler};

use super::{LayerEntry, LayerType};

// ── Targets ───────────────────────────────────────────────────────────────────

/// Where a positional mutation should happen.
///
/// Either an index into the stack, or the first entry of a given layer type.
/// `usize` and [`LayerType`] both convert into a `Target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Position(usize),
    Layer(LayerType),
}

impl From<usize> for Target {
    fn from(index: usize) -> Self {
        Self::Position(index)
    }
}

impl From<LayerType> for Target {
    fn from(layer: LayerType) -> Self {
        Self::Layer(layer)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(index) => write!(f, "#{index}"),
            Self::Layer(layer) => write!(f, "{layer}"),
        }
    }
}

/// Side of the target a new entry was meant to land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Before,
    After,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

/// A positional mutation named a target that is not in the stack.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no such middleware to insert {relation}: {target}")]
pub struct ResolutionError {
    target: Target,
    relation: Relation,
}

impl ResolutionError {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }
}

// ── MiddlewareStack ───────────────────────────────────────────────────────────

/// An ordered list of middleware, outermost first.
///
/// Index 0 wraps everything else; the last entry sits directly around the
/// final handler. Cloning copies the list, so mutating a clone leaves the
/// original untouched.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    entries: Vec<LayerEntry>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack and hands it to `configure` before returning it.
    ///
    /// ```rust
    /// use sheath::middleware::{LayerEntry, MiddlewareStack, Trace};
    ///
    /// let stack = MiddlewareStack::setup(|stack| {
    ///     stack.push(LayerEntry::new::<Trace>(()));
    /// });
    /// assert_eq!(stack.len(), 1);
    /// ```
    pub fn setup(configure: impl FnOnce(&mut Self)) -> Self {
        let mut stack = Self::new();
        configure(&mut stack);
        stack
    }

    /// Appends `entry` as the innermost layer.
    pub fn push(&mut self, entry: LayerEntry) {
        debug!(layer = entry.name(), index = self.entries.len(), "middleware added");
        self.entries.push(entry);
    }

    /// Inserts `entry` as the outermost layer.
    pub fn prepend(&mut self, entry: LayerEntry) {
        debug!(layer = entry.name(), index = 0, "middleware added");
        self.entries.insert(0, entry);
    }

    /// Inserts `entry` directly outside `target`.
    pub fn insert_before(
        &mut self,
        target: impl Into<Target>,
        entry: LayerEntry,
    ) -> Result<(), ResolutionError> {
        let index = self.resolve(target.into(), Relation::Before)?;
        debug!(layer = entry.name(), index, "middleware added");
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Inserts `entry` directly inside `target`.
    pub fn insert_after(
        &mut self,
        target: impl Into<Target>,
        entry: LayerEntry,
    ) -> Result<(), ResolutionError> {
        let index = self.resolve(target.into(), Relation::After)? + 1;
        debug!(layer = entry.name(), index, "middleware added");
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Replaces the entry at `target` with `entry`, keeping every other entry
    /// where it was. Returns the replaced entry.
    pub fn swap(
        &mut self,
        target: impl Into<Target>,
        entry: LayerEntry,
    ) -> Result<LayerEntry, ResolutionError> {
        let index = self.resolve(target.into(), Relation::Before)?;
        debug!(layer = entry.name(), index, "middleware swapped");
        Ok(std::mem::replace(&mut self.entries[index], entry))
    }

    /// Removes every entry of type `layer` and returns how many went.
    ///
    /// Removing a layer that is not present is fine and returns 0.
    pub fn delete(&mut self, layer: LayerType) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.layer() != layer);
        let removed = before - self.entries.len();
        debug!(%layer, removed, "middleware deleted");
        removed
    }

    /// Folds the stack around `app`, innermost entry first, and returns the
    /// outermost link.
    ///
    /// An empty stack returns `app` itself. Every call constructs a fresh
    /// chain from the current entries. The first constructor error stops the
    /// fold and is returned as is.
    pub fn build(&self, app: impl Handler) -> Result<BoxedHandler, BoxError> {
        debug!(layers = self.entries.len(), "building middleware chain");
        self.entries
            .iter()
            .rev()
            .try_fold(app.into_boxed_handler(), |next, entry| entry.build(next))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LayerEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&LayerEntry> {
        self.entries.last()
    }

    /// Entries outermost first.
    pub fn iter(&self) -> std::slice::Iter<'_, LayerEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, layer: LayerType) -> bool {
        self.position(layer).is_some()
    }

    /// Index of the first entry of type `layer`.
    pub fn position(&self, layer: LayerType) -> Option<usize> {
        self.entries.iter().position(|entry| entry.layer() == layer)
    }

    fn resolve(&self, target: Target, relation: Relation) -> Result<usize, ResolutionError> {
        let index = match target {
            Target::Position(index) if index < self.entries.len() => Some(index),
            Target::Position(_) => None,
            Target::Layer(layer) => self.position(layer),
        };
        index.ok_or_else(|| {
            warn!(%target, %relation, "middleware target not found");
            ResolutionError { target, relation }
        })
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<'a> IntoIterator for &'a MiddlewareStack {
    type Item = &'a LayerEntry;
    type IntoIter = std::slice::Iter<'a, LayerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<LayerEntry> for MiddlewareStack {
    fn from_iter<I: IntoIterator<Item = LayerEntry>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl Extend<LayerEntry> for MiddlewareStack {
    fn extend<I: IntoIterator<Item = LayerEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::middleware::Middleware;

    macro_rules! passthrough {
        ($($name:ident),*) => {$(
            struct $name;

            impl Middleware for $name {
                type Args = u32;
                type Block = ();

                fn construct(
                    next: BoxedHandler,
                    _: u32,
                    _: Option<Arc<()>>,
                ) -> Result<BoxedHandler, BoxError> {
                    Ok(next)
                }
            }
        )*};
    }

    passthrough!(A, B, C, X, Z);

    fn entry<M: Middleware<Args = u32>>() -> LayerEntry {
        LayerEntry::new::<M>(0)
    }

    fn layer<M: Middleware>() -> LayerType {
        LayerType::of::<M>()
    }

    fn short_names(stack: &MiddlewareStack) -> Vec<&'static str> {
        stack
            .iter()
            .map(|entry| entry.name().rsplit("::").next().unwrap_or_default())
            .collect()
    }

    fn abc() -> MiddlewareStack {
        [entry::<A>(), entry::<B>(), entry::<C>()].into_iter().collect()
    }

    #[test]
    fn push_keeps_registration_order() {
        assert_eq!(short_names(&abc()), ["A", "B", "C"]);
    }

    #[test]
    fn prepend_goes_outermost() {
        let mut stack = abc();
        stack.prepend(entry::<X>());
        assert_eq!(short_names(&stack), ["X", "A", "B", "C"]);
    }

    #[test]
    fn insert_before_and_after_a_layer() {
        let mut stack = abc();
        stack.insert_before(layer::<B>(), entry::<X>()).unwrap();
        assert_eq!(short_names(&stack), ["A", "X", "B", "C"]);

        let mut stack = abc();
        stack.insert_after(layer::<B>(), entry::<X>()).unwrap();
        assert_eq!(short_names(&stack), ["A", "B", "X", "C"]);
    }

    #[test]
    fn insert_by_position() {
        let mut stack = abc();
        stack.insert_before(0, entry::<X>()).unwrap();
        stack.insert_after(3, entry::<Z>()).unwrap();
        assert_eq!(short_names(&stack), ["X", "A", "B", "C", "Z"]);
    }

    #[test]
    fn insert_resolves_to_first_match() {
        let mut stack: MiddlewareStack =
            [entry::<A>(), entry::<B>(), entry::<A>()].into_iter().collect();
        stack.insert_after(layer::<A>(), entry::<X>()).unwrap();
        assert_eq!(short_names(&stack), ["A", "X", "B", "A"]);
    }

    #[test]
    fn swap_replaces_in_place() {
        let mut stack = abc();
        let replaced = stack.swap(layer::<B>(), entry::<X>()).unwrap();
        assert!(replaced.layer().is::<B>());
        assert_eq!(short_names(&stack), ["A", "X", "C"]);

        stack.swap(2, entry::<Z>()).unwrap();
        assert_eq!(short_names(&stack), ["A", "X", "Z"]);
    }

    #[test]
    fn delete_removes_every_match() {
        let mut stack: MiddlewareStack =
            [entry::<A>(), entry::<B>(), entry::<A>(), entry::<C>()].into_iter().collect();
        assert_eq!(stack.delete(layer::<A>()), 2);
        assert_eq!(short_names(&stack), ["B", "C"]);
    }

    #[test]
    fn delete_absent_is_a_noop() {
        let mut stack: MiddlewareStack = [entry::<A>(), entry::<B>()].into_iter().collect();
        assert_eq!(stack.delete(layer::<Z>()), 0);
        assert_eq!(short_names(&stack), ["A", "B"]);
    }

    #[test]
    fn unresolved_target_is_an_error() {
        let mut stack = abc();

        let err = stack.insert_before(layer::<Z>(), entry::<X>()).unwrap_err();
        assert_eq!(err.target(), Target::Layer(layer::<Z>()));
        assert_eq!(err.relation(), Relation::Before);
        let message = err.to_string();
        assert!(message.contains("before"), "{message}");
        assert!(message.ends_with("::Z"), "{message}");

        let err = stack.insert_after(layer::<Z>(), entry::<X>()).unwrap_err();
        assert_eq!(err.relation(), Relation::After);

        let err = stack.swap(layer::<Z>(), entry::<X>()).unwrap_err();
        assert_eq!(err.relation(), Relation::Before);

        assert_eq!(short_names(&stack), ["A", "B", "C"]);
    }

    #[test]
    fn out_of_range_position_is_an_error() {
        let mut stack = abc();
        let err = stack.insert_before(3, entry::<X>()).unwrap_err();
        assert_eq!(err.target(), Target::Position(3));
        assert_eq!(err.to_string(), "no such middleware to insert before: #3");

        assert!(MiddlewareStack::new().swap(0, entry::<X>()).is_err());
    }

    #[test]
    fn clone_is_independent() {
        let original = abc();
        let mut copy = original.clone();
        copy.push(entry::<X>());
        copy.delete(layer::<A>());

        assert_eq!(original.len(), 3);
        assert_eq!(short_names(&original), ["A", "B", "C"]);
        assert_eq!(short_names(&copy), ["B", "C", "X"]);
    }

    #[test]
    fn accessors() {
        let stack = abc();
        assert!(stack.get(1).is_some_and(|e| e.layer().is::<B>()));
        assert!(stack.get(3).is_none());
        assert!(stack.last().is_some_and(|e| e.layer().is::<C>()));
        assert_eq!(stack.position(layer::<C>()), Some(2));
        assert!(!stack.contains(layer::<Z>()));
        assert!(MiddlewareStack::new().is_empty());
        assert!(MiddlewareStack::new().last().is_none());
    }

    #[test]
    fn entry_exposes_its_arguments() {
        let entry = LayerEntry::new::<A>(7);
        assert_eq!(entry.args::<u32>(), Some(&7));
        assert_eq!(entry.args::<String>(), None);
        assert!(!entry.has_block());
        assert!(LayerEntry::with_block::<A>(7, Arc::new(())).has_block());
    }

    #[test]
    fn debug_lists_names_in_order() {
        let rendered = format!("{:?}", abc());
        let a = rendered.find("::A").unwrap();
        let b = rendered.find("::B").unwrap();
        let c = rendered.find("::C").unwrap();
        assert!(a < b && b < c, "{rendered}");
    }
}
