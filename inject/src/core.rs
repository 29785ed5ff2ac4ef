//! Core, non-public data structures for the container.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A contextual instance as the container stores it: the bean's
/// implementation type behind a type-erased `Arc`.
pub(crate) type Stored = Arc<dyn Any + Send + Sync>;

/// Identifies a registered bean. Assigned in registration order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanId(pub(crate) u64);

impl fmt::Debug for BeanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "BeanId({})", self.0)
  }
}

impl fmt::Display for BeanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Identifies one created contextual instance. Every dependent resolution and
/// every (re)creation of a singleton gets a fresh id, so destruction state is
/// never shared between two creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct InstanceId(pub(crate) u64);

thread_local! {
  // The beans currently being created on this thread. A bean showing up twice
  // means its factory (transitively) asked for itself.
  static RESOLVING_STACK: RefCell<HashSet<BeanId>> = RefCell::new(HashSet::new());
}

/// An RAII guard to detect and prevent circular dependencies.
///
/// When created, it adds a bean id to the thread-local resolution stack.
/// If the id is already present, it means we have a circular dependency, and it panics.
/// When the guard is dropped, it removes the id from the stack.
pub(crate) struct ResolutionGuard {
  id: BeanId,
}

impl ResolutionGuard {
  pub(crate) fn new(id: BeanId, bean_type: &str) -> Self {
    RESOLVING_STACK.with(|stack| {
      // `insert` returns `false` if the value was already present.
      if !stack.borrow_mut().insert(id) {
        panic!(
          "Circular dependency detected while resolving bean {} ({})",
          id, bean_type
        );
      }
    });
    Self { id }
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.id);
    });
  }
}
