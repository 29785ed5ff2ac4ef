//! Handles over resolved contextual references.

use crate::bean::{Bean, BeanEntry};
use crate::container::ContainerInner;
use crate::core::InstanceId;

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// A resolved contextual reference, the metadata of the bean that produced
/// it, and an explicit way to destroy the underlying contextual instance.
///
/// Every lookup produces its own handle with its own destruction state.
/// Destroying is idempotent: only the first call has an effect, and it is a
/// no-op once the owning container is shut down or dropped.
///
/// Dropping a `Handle` does not destroy anything. Use [`Handle::scoped`] for
/// release on scope exit.
///
/// A handle is meant to stay on one logical flow of execution. It can be moved
/// to another thread, but it is not `Sync`.
pub struct Handle<T: ?Sized> {
  value: Arc<T>,
  entry: Arc<BeanEntry>,
  id: InstanceId,
  container: Weak<ContainerInner>,
  destroyed: Cell<bool>,
}

impl<T: ?Sized> Handle<T> {
  pub(crate) fn new(
    value: Arc<T>,
    entry: Arc<BeanEntry>,
    id: InstanceId,
    container: Weak<ContainerInner>,
  ) -> Self {
    Self {
      value,
      entry,
      id,
      container,
      destroyed: Cell::new(false),
    }
  }

  /// The contextual reference.
  pub fn value(&self) -> &Arc<T> {
    &self.value
  }

  /// Metadata of the bean that produced the reference.
  pub fn bean(&self) -> &Bean {
    &self.entry.bean
  }

  /// Whether [`destroy`](Handle::destroy) was already called on this handle.
  pub fn is_destroyed(&self) -> bool {
    self.destroyed.get()
  }

  /// Destroys the underlying contextual instance, running the bean's disposer.
  ///
  /// For a singleton bean this removes the instance from the container, so the
  /// next lookup creates a new one. Calling it again, or after the container
  /// is shut down, does nothing.
  pub fn destroy(&self) {
    if self.destroyed.replace(true) {
      return;
    }
    if let Some(container) = self.container.upgrade() {
      container.destroy_instance(&self.entry, self.id);
    }
  }

  /// Destroys the instance and consumes the handle. Same as [`destroy`](Handle::destroy).
  pub fn close(self) {
    self.destroy();
  }

  /// Wraps the handle in a guard that destroys the instance when it goes out of scope.
  pub fn scoped(self) -> ScopedHandle<T> {
    ScopedHandle { handle: self }
  }
}

impl<T: ?Sized> Deref for Handle<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.value
  }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handle")
      .field("bean", &self.entry.bean.to_string())
      .field("instance", &self.id)
      .field("destroyed", &self.destroyed.get())
      .finish()
  }
}

/// A [`Handle`] that destroys its contextual instance on drop.
///
/// ```
/// use fibre_inject::Container;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// static DESTROYED: AtomicUsize = AtomicUsize::new(0);
///
/// struct Connection;
///
/// let container = Container::new();
/// container
///   .bean(|_| Connection)
///   .on_destroy(|_| { DESTROYED.fetch_add(1, Ordering::SeqCst); })
///   .register()
///   .unwrap();
///
/// {
///   let _conn = container.instance::<Connection>().get_handle().unwrap().scoped();
///   assert_eq!(DESTROYED.load(Ordering::SeqCst), 0);
/// }
/// assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
/// ```
pub struct ScopedHandle<T: ?Sized> {
  handle: Handle<T>,
}

impl<T: ?Sized> Deref for ScopedHandle<T> {
  type Target = Handle<T>;

  fn deref(&self) -> &Handle<T> {
    &self.handle
  }
}

impl<T: ?Sized> Drop for ScopedHandle<T> {
  fn drop(&mut self) {
    self.handle.destroy();
  }
}

impl<T: ?Sized> fmt::Debug for ScopedHandle<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ScopedHandle").field(&self.handle).finish()
  }
}
