//! `Instance`: a re-queryable lookup for a required type and qualifiers.

use crate::bean::BeanEntry;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::qualifier::{display_set, Qualifier};
use crate::Object;

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::vec;
use tracing::trace;

/// A lookup for beans of type `T` carrying a set of required qualifiers.
///
/// An `Instance` is an immutable value: [`select`](Instance::select) and
/// [`narrow`](Instance::narrow) return new lookups and leave the receiver
/// untouched. It can be cloned freely and shared between threads.
///
/// A lookup with no explicit qualifiers requires `@Default`.
///
/// Every operation fails with [`Error::IllegalState`] once the owning
/// container is shut down.
pub struct Instance<T: ?Sized> {
  container: Container,
  required: Arc<[Qualifier]>,
  _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Clone for Instance<T> {
  fn clone(&self) -> Self {
    Self {
      container: self.container.clone(),
      required: self.required.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T: ?Sized> fmt::Debug for Instance<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Instance")
      .field("type", &type_name::<T>())
      .field("qualifiers", &display_set(&self.required))
      .field("container", &self.container.name())
      .finish()
  }
}

impl<T: ?Sized + Any + Send + Sync> Instance<T> {
  pub(crate) fn root(container: Container) -> Self {
    Self::with_qualifiers(container, Vec::new())
  }

  fn with_qualifiers(container: Container, required: Vec<Qualifier>) -> Self {
    Self {
      container,
      required: required.into(),
      _marker: PhantomData,
    }
  }

  /// The explicitly required qualifiers. Empty means `@Default`.
  pub fn qualifiers(&self) -> &[Qualifier] {
    &self.required
  }

  pub fn container(&self) -> &Container {
    &self.container
  }

  fn effective_qualifiers(&self) -> Vec<Qualifier> {
    if self.required.is_empty() {
      vec![Qualifier::DEFAULT]
    } else {
      self.required.to_vec()
    }
  }

  fn eligible(&self) -> Result<Vec<Arc<BeanEntry>>> {
    self.container.ensure_running("look up beans")?;
    Ok(
      self
        .container
        .eligible_beans(TypeId::of::<T>(), &self.effective_qualifiers()),
    )
  }

  fn resolve_unique(&self) -> Result<Arc<BeanEntry>> {
    self.container.ensure_running("look up beans")?;
    self
      .container
      .resolve_unique::<T>(TypeId::of::<T>(), &self.effective_qualifiers())
  }

  fn handle_for(&self, entry: &Arc<BeanEntry>) -> Result<Handle<T>> {
    let resolved = self.container.contextual_instance(entry)?;
    let value = resolved.entry.cast::<T>(&resolved.stored).ok_or_else(|| {
      Error::IllegalState(format!(
        "bean {} does not expose type {}",
        resolved.entry.bean,
        type_name::<T>()
      ))
    })?;
    trace!(
      bean = %resolved.entry.bean,
      instance = resolved.id.0,
      required = type_name::<T>(),
      "created handle"
    );
    Ok(Handle::new(
      value,
      resolved.entry,
      resolved.id,
      self.container.downgrade(),
    ))
  }

  // --- Resolution ---

  /// Obtains a handle for the single bean eligible for this lookup.
  ///
  /// Every call performs a fresh resolution; for a dependent bean it creates a
  /// new contextual instance.
  ///
  /// # Errors
  ///
  /// [`Error::Unsatisfied`] if no bean is eligible, [`Error::Ambiguous`] if more
  /// than one is, [`Error::IllegalState`] if the container is shut down.
  pub fn get_handle(&self) -> Result<Handle<T>> {
    let entry = self.resolve_unique()?;
    self.handle_for(&entry)
  }

  /// Obtains the contextual reference of the single eligible bean.
  ///
  /// Fails the same way as [`get_handle`](Instance::get_handle).
  ///
  /// A dependent bean's instance stays tracked by the container until it is
  /// released with [`Instance::destroy`] or the container shuts down.
  pub fn get(&self) -> Result<Arc<T>> {
    self.get_handle().map(|handle| handle.value().clone())
  }

  /// A lazy, restartable sequence of handles, one per eligible bean.
  ///
  /// Nothing is resolved until the sequence is traversed, and every call to
  /// [`Handles::iter`] resolves the beans again and creates new handles.
  pub fn handles(&self) -> Handles<T> {
    Handles {
      instance: self.clone(),
    }
  }

  /// A lazy, restartable sequence of the eligible beans' references.
  ///
  /// As with [`get`](Instance::get), dependent references stay tracked until
  /// passed to [`Instance::destroy`].
  pub fn iter(&self) -> Values<T> {
    Values {
      handles: HandleIter::new(self.clone()),
    }
  }

  /// `true` if no bean is eligible (or the container is shut down).
  pub fn is_unsatisfied(&self) -> bool {
    self.eligible().map(|beans| beans.is_empty()).unwrap_or(true)
  }

  /// `true` if more than one bean is eligible.
  pub fn is_ambiguous(&self) -> bool {
    self.eligible().map(|beans| beans.len() > 1).unwrap_or(false)
  }

  /// `true` if exactly one bean is eligible.
  pub fn is_resolvable(&self) -> bool {
    self.eligible().map(|beans| beans.len() == 1).unwrap_or(false)
  }

  /// Destroys a reference obtained from this container's lookups.
  ///
  /// A no-op if the reference is unknown, already destroyed, or the container
  /// is shut down.
  pub fn destroy(&self, reference: &Arc<T>) {
    if self.container.is_shut_down() {
      return;
    }
    self
      .container
      .destroy_by_ptr(Arc::as_ptr(reference) as *const ());
  }

  // --- Derivation ---

  /// A lookup for the same type with additional required qualifiers.
  ///
  /// # Errors
  ///
  /// [`Error::IllegalArgument`] if a qualifier is not a registered qualifier
  /// type, or a non-repeatable qualifier type would occur twice;
  /// [`Error::IllegalState`] if the container is shut down.
  pub fn select(&self, qualifiers: &[Qualifier]) -> Result<Instance<T>> {
    self.container.ensure_running("select a child lookup")?;
    self.derive::<T>(qualifiers)
  }

  /// A lookup for another type `U` with additional required qualifiers.
  ///
  /// Only legal on the universal lookup, `Instance<Object>` (see
  /// [`Container::lookup`]).
  ///
  /// # Errors
  ///
  /// [`Error::IllegalState`] if this lookup's type is not [`Object`] or the
  /// container is shut down; [`Error::IllegalArgument`] for invalid qualifiers
  /// as in [`select`](Instance::select).
  pub fn narrow<U: ?Sized + Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Result<Instance<U>> {
    self.container.ensure_running("narrow a lookup")?;
    if TypeId::of::<T>() != TypeId::of::<Object>() {
      return Err(Error::IllegalState(format!(
        "narrow() must be invoked on a lookup of {}, not {}",
        type_name::<Object>(),
        type_name::<T>()
      )));
    }
    self.derive::<U>(qualifiers)
  }

  fn derive<U: ?Sized + Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Result<Instance<U>> {
    self
      .container
      .qualifier_registry()
      .validate(&self.required, qualifiers)?;
    let mut required = self.required.to_vec();
    required.extend_from_slice(qualifiers);
    Ok(Instance::with_qualifiers(self.container.clone(), required))
  }
}

/// The lazy sequence returned by [`Instance::handles`].
///
/// Holds no iteration state: every [`iter`](Handles::iter) starts over with a
/// fresh resolution.
pub struct Handles<T: ?Sized> {
  instance: Instance<T>,
}

impl<T: ?Sized + Any + Send + Sync> Handles<T> {
  pub fn iter(&self) -> HandleIter<T> {
    HandleIter::new(self.instance.clone())
  }
}

impl<T: ?Sized> fmt::Debug for Handles<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handles")
      .field("instance", &self.instance)
      .finish()
  }
}

impl<'a, T: ?Sized + Any + Send + Sync> IntoIterator for &'a Handles<T> {
  type Item = Result<Handle<T>>;
  type IntoIter = HandleIter<T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<T: ?Sized + Any + Send + Sync> IntoIterator for Handles<T> {
  type Item = Result<Handle<T>>;
  type IntoIter = HandleIter<T>;

  fn into_iter(self) -> Self::IntoIter {
    HandleIter::new(self.instance)
  }
}

/// One traversal over the eligible beans of a lookup.
///
/// The eligible beans are resolved on the first call to `next`; each handle is
/// created only when it is pulled. If the container shuts down mid-way, the
/// next item is an [`Error::IllegalState`] and the traversal ends.
pub struct HandleIter<T: ?Sized> {
  instance: Instance<T>,
  pending: Option<vec::IntoIter<Arc<BeanEntry>>>,
  finished: bool,
}

impl<T: ?Sized + Any + Send + Sync> HandleIter<T> {
  fn new(instance: Instance<T>) -> Self {
    Self {
      instance,
      pending: None,
      finished: false,
    }
  }
}

impl<T: ?Sized + Any + Send + Sync> Iterator for HandleIter<T> {
  type Item = Result<Handle<T>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }
    if self.pending.is_none() {
      match self.instance.eligible() {
        Ok(beans) => self.pending = Some(beans.into_iter()),
        Err(e) => {
          self.finished = true;
          return Some(Err(e));
        }
      }
    }
    let entry = match self.pending.as_mut().and_then(Iterator::next) {
      Some(entry) => entry,
      None => {
        self.finished = true;
        return None;
      }
    };
    let handle = self.instance.handle_for(&entry);
    if handle.is_err() {
      self.finished = true;
    }
    Some(handle)
  }
}

/// A traversal yielding references instead of handles. See [`Instance::iter`].
pub struct Values<T: ?Sized> {
  handles: HandleIter<T>,
}

impl<T: ?Sized + Any + Send + Sync> Iterator for Values<T> {
  type Item = Result<Arc<T>>;

  fn next(&mut self) -> Option<Self::Item> {
    self
      .handles
      .next()
      .map(|handle| handle.map(|h| h.value().clone()))
  }
}
