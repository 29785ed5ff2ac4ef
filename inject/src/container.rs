//! The main `Container` struct and its associated methods.

use crate::bean::{Bean, BeanBuilder, BeanEntry, Scope};
use crate::config::ContainerConfig;
use crate::core::{BeanId, InstanceId, ResolutionGuard, Stored};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::qualifier::{display_set, Qualifier, QualifierRegistry, QualifierType};
use crate::Object;

use dashmap::{DashMap, DashSet};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// A contextual instance handed out by the container.
pub(crate) struct Resolved {
  pub(crate) id: InstanceId,
  pub(crate) entry: Arc<BeanEntry>,
  pub(crate) stored: Stored,
}

// A dependent instance the container still owns destruction of.
struct Tracked {
  entry: Arc<BeanEntry>,
  stored: Stored,
}

pub(crate) struct ContainerInner {
  name: String,
  beans: DashMap<BeanId, Arc<BeanEntry>>,
  qualifiers: QualifierRegistry,
  enabled_alternatives: DashSet<String>,
  dependents: DashMap<InstanceId, Tracked>,
  next_bean_id: AtomicU64,
  next_instance_id: AtomicU64,
  shut_down: AtomicBool,
}

impl ContainerInner {
  pub(crate) fn is_shut_down(&self) -> bool {
    self.shut_down.load(Ordering::Acquire)
  }

  /// Destroys one contextual instance. A no-op if the instance is unknown,
  /// already destroyed, or the container is shut down.
  pub(crate) fn destroy_instance(&self, entry: &Arc<BeanEntry>, id: InstanceId) {
    if self.is_shut_down() {
      return;
    }
    let stored = match entry.bean.scope() {
      Scope::Dependent => self.dependents.remove(&id).map(|(_, tracked)| tracked.stored),
      Scope::Singleton => {
        let mut slot = entry.slot.lock();
        let is_current = matches!(slot.as_ref(), Some((current, _)) if *current == id);
        if is_current {
          slot.take().map(|(_, stored)| stored)
        } else {
          None
        }
      }
    };
    match stored {
      Some(stored) => {
        trace!(bean = %entry.bean, instance = id.0, "destroying contextual instance");
        dispose(entry, &stored);
      }
      None => trace!(bean = %entry.bean, instance = id.0, "instance already destroyed"),
    }
  }
}

/// Runs a bean's disposer, containing any panic it raises.
fn dispose(entry: &BeanEntry, stored: &Stored) {
  let result = panic::catch_unwind(AssertUnwindSafe(|| entry.dispose(stored)));
  if result.is_err() {
    warn!(bean = %entry.bean, "disposer panicked while destroying contextual instance");
  }
}

/// The Inversion of Control (IoC) container.
///
/// This struct holds the registered beans and their contextual instances. It is
/// thread-safe, cheap to clone (clones share the same registry), and allows
/// dynamic registration and lookup of beans at any time until it is
/// [shut down](Container::shutdown).
///
/// Lookups go through an [`Instance`], obtained from [`Container::instance`].
#[derive(Clone)]
pub struct Container {
  inner: Arc<ContainerInner>,
}

impl Default for Container {
  fn default() -> Self {
    Self::named("default")
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("name", &self.inner.name)
      .field("beans", &self.inner.beans.len())
      .field("tracked_dependents", &self.inner.dependents.len())
      .field("shut_down", &self.is_shut_down())
      .finish()
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a new, empty `Container` with the given name. The name only
  /// shows up in logs and debug output.
  pub fn named(name: impl Into<String>) -> Self {
    let name = name.into();
    debug!(container = %name, "creating container");
    Self {
      inner: Arc::new(ContainerInner {
        name,
        beans: DashMap::new(),
        qualifiers: QualifierRegistry::with_builtins(),
        enabled_alternatives: DashSet::new(),
        dependents: DashMap::new(),
        next_bean_id: AtomicU64::new(0),
        next_instance_id: AtomicU64::new(0),
        shut_down: AtomicBool::new(false),
      }),
    }
  }

  /// Creates a container from a loaded [`ContainerConfig`], registering its
  /// qualifier types and enabling its alternatives.
  pub fn with_config(config: &ContainerConfig) -> Self {
    let container = Self::named(config.name.clone());
    for qualifier in &config.qualifiers {
      container
        .inner
        .qualifiers
        .register(qualifier.to_qualifier_type());
    }
    for alternative in &config.alternatives {
      container.inner.enabled_alternatives.insert(alternative.clone());
    }
    debug!(
      container = %config.name,
      qualifiers = config.qualifiers.len(),
      alternatives = config.alternatives.len(),
      "applied container configuration"
    );
    container
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
    Arc::downgrade(&self.inner)
  }

  pub(crate) fn qualifier_registry(&self) -> &QualifierRegistry {
    &self.inner.qualifiers
  }

  pub(crate) fn ensure_running(&self, operation: &str) -> Result<()> {
    if self.is_shut_down() {
      return Err(self.shut_down_error(operation));
    }
    Ok(())
  }

  fn shut_down_error(&self, operation: &str) -> Error {
    Error::IllegalState(format!(
      "cannot {}: container '{}' is already shut down",
      operation, self.inner.name
    ))
  }

  // An instance created while the container shut down is destroyed right away.
  fn discard_created(&self, entry: &BeanEntry, stored: &Stored) -> Error {
    debug!(bean = %entry.bean, "container shut down during creation, destroying new instance");
    dispose(entry, stored);
    self.shut_down_error("resolve a bean")
  }

  pub(crate) fn next_bean_id(&self) -> BeanId {
    BeanId(self.inner.next_bean_id.fetch_add(1, Ordering::Relaxed))
  }

  fn next_instance_id(&self) -> InstanceId {
    InstanceId(self.inner.next_instance_id.fetch_add(1, Ordering::Relaxed))
  }

  pub(crate) fn insert_bean(&self, entry: BeanEntry) -> Arc<Bean> {
    let bean = entry.bean.clone();
    debug!(
      container = %self.inner.name,
      bean = %bean,
      scope = ?bean.scope(),
      qualifiers = %display_set(bean.qualifiers()),
      "registered bean"
    );
    self.inner.beans.insert(bean.id(), Arc::new(entry));
    bean
  }

  // Snapshot of the registry, so no map lock is held while slots are locked.
  fn entries(&self) -> Vec<Arc<BeanEntry>> {
    self.inner.beans.iter().map(|e| e.value().clone()).collect()
  }

  fn is_enabled(&self, bean: &Bean) -> bool {
    !bean.is_alternative()
      || bean.priority().is_some()
      || bean
        .name()
        .map(|name| self.inner.enabled_alternatives.contains(name))
        .unwrap_or(false)
  }

  // Configured alternatives outrank prioritised ones.
  fn alternative_rank(&self, bean: &Bean) -> i64 {
    let configured = bean
      .name()
      .map(|name| self.inner.enabled_alternatives.contains(name))
      .unwrap_or(false);
    if configured {
      i64::MAX
    } else {
      bean.priority().map(i64::from).unwrap_or(i64::MIN)
    }
  }

  /// Finds the beans eligible for `type_id` and the effective `required`
  /// qualifiers, in registration order, after alternatives are applied.
  pub(crate) fn eligible_beans(&self, type_id: TypeId, required: &[Qualifier]) -> Vec<Arc<BeanEntry>> {
    let mut candidates: Vec<Arc<BeanEntry>> = self
      .inner
      .beans
      .iter()
      .filter(|entry| entry.exposes(type_id) && entry.matches(required) && self.is_enabled(&entry.bean))
      .map(|entry| entry.value().clone())
      .collect();
    candidates.sort_by_key(|entry| entry.bean.id());

    if candidates.len() > 1 && candidates.iter().any(|e| e.bean.is_alternative()) {
      let best = candidates
        .iter()
        .filter(|e| e.bean.is_alternative())
        .map(|e| self.alternative_rank(&e.bean))
        .max()
        .unwrap_or(i64::MIN);
      candidates.retain(|e| e.bean.is_alternative() && self.alternative_rank(&e.bean) == best);
    }
    candidates
  }

  /// Narrows the eligible beans down to exactly one.
  pub(crate) fn resolve_unique<T: ?Sized>(&self, type_id: TypeId, required: &[Qualifier]) -> Result<Arc<BeanEntry>> {
    let mut beans = self.eligible_beans(type_id, required);
    match beans.len() {
      0 => Err(Error::Unsatisfied {
        type_name: type_name::<T>(),
        qualifiers: display_set(required),
      }),
      1 => Ok(beans.remove(0)),
      _ => Err(Error::Ambiguous {
        type_name: type_name::<T>(),
        qualifiers: display_set(required),
        beans: beans.iter().map(|e| e.bean.to_string()).collect(),
      }),
    }
  }

  /// Obtains the contextual instance of a bean, creating it if the scope requires it.
  pub(crate) fn contextual_instance(&self, entry: &Arc<BeanEntry>) -> Result<Resolved> {
    self.ensure_running("resolve a bean")?;
    let bean = &entry.bean;

    // Create the RAII guard before touching the singleton slot, so a circular
    // dependency panics instead of deadlocking on the slot's lock.
    let _guard = ResolutionGuard::new(bean.id(), bean.implementation());

    match bean.scope() {
      Scope::Singleton => {
        let mut slot = entry.slot.lock();
        if let Some((id, stored)) = slot.as_ref() {
          return Ok(Resolved {
            id: *id,
            entry: entry.clone(),
            stored: stored.clone(),
          });
        }
        let stored = entry.create(self);
        let id = self.next_instance_id();
        trace!(bean = %bean, instance = id.0, "created singleton instance");
        *slot = Some((id, stored.clone()));
        if self.is_shut_down() {
          // Shutdown drained the slot while the factory ran.
          slot.take();
          drop(slot);
          return Err(self.discard_created(entry, &stored));
        }
        Ok(Resolved {
          id,
          entry: entry.clone(),
          stored,
        })
      }
      Scope::Dependent => {
        let stored = entry.create(self);
        let id = self.next_instance_id();
        trace!(bean = %bean, instance = id.0, "created dependent instance");
        self.inner.dependents.insert(
          id,
          Tracked {
            entry: entry.clone(),
            stored: stored.clone(),
          },
        );
        if self.is_shut_down() {
          // Whoever removes the entry disposes it: us, or a concurrent shutdown.
          if self.inner.dependents.remove(&id).is_some() {
            return Err(self.discard_created(entry, &stored));
          }
          return Err(self.shut_down_error("resolve a bean"));
        }
        Ok(Resolved {
          id,
          entry: entry.clone(),
          stored,
        })
      }
    }
  }

  /// Destroys the contextual instance whose data pointer is `ptr`, if the
  /// container is still tracking it.
  pub(crate) fn destroy_by_ptr(&self, ptr: *const ()) {
    let dependent = self
      .inner
      .dependents
      .iter()
      .find(|tracked| Arc::as_ptr(&tracked.stored) as *const () == ptr)
      .map(|tracked| (*tracked.key(), tracked.entry.clone()));
    if let Some((id, entry)) = dependent {
      self.inner.destroy_instance(&entry, id);
      return;
    }

    let singleton = self.entries().into_iter().find_map(|entry| {
      let current = match entry.slot.lock().as_ref() {
        Some((id, stored)) if Arc::as_ptr(stored) as *const () == ptr => Some(*id),
        _ => None,
      };
      current.map(|id| (id, entry))
    });
    match singleton {
      Some((id, entry)) => self.inner.destroy_instance(&entry, id),
      None => trace!(container = %self.inner.name, "destroy requested for an untracked instance"),
    }
  }

  // --- PUBLIC API ---

  // --- Qualifier Registration ---

  /// Makes a marker name usable as a qualifier.
  pub fn register_qualifier(&self, qualifier_type: QualifierType) -> Result<()> {
    self.ensure_running("register a qualifier")?;
    debug!(
      container = %self.inner.name,
      qualifier = qualifier_type.name(),
      repeatable = qualifier_type.is_repeatable(),
      "registered qualifier type"
    );
    self.inner.qualifiers.register(qualifier_type);
    Ok(())
  }

  /// Enables the alternative bean with the given bean name.
  pub fn enable_alternative(&self, bean_name: impl Into<String>) {
    self.inner.enabled_alternatives.insert(bean_name.into());
  }

  // --- Bean Registration ---

  /// Starts registering a bean whose instances are produced by `factory`.
  ///
  /// The factory receives the container so it can look up its own dependencies.
  pub fn bean<I: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> I + Send + Sync + 'static,
  ) -> BeanBuilder<'_, I> {
    BeanBuilder::new(self, move |c: &Container| Arc::new(factory(c)))
  }

  /// Registers an already-built value as an unqualified singleton bean.
  pub fn add_instance<I: Any + Send + Sync>(&self, instance: I) -> Result<Arc<Bean>> {
    let instance = Arc::new(instance);
    BeanBuilder::new(self, move |_: &Container| instance.clone()).register()
  }

  /// Registers an unqualified, lazily created singleton bean.
  pub fn add_singleton<I: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> I + Send + Sync + 'static,
  ) -> Result<Arc<Bean>> {
    self.bean(factory).scope(Scope::Singleton).register()
  }

  /// Registers an unqualified bean that produces a new instance per lookup.
  pub fn add_dependent<I: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> I + Send + Sync + 'static,
  ) -> Result<Arc<Bean>> {
    self.bean(factory).scope(Scope::Dependent).register()
  }

  // --- Lookup ---

  /// A lookup for beans of type `T` with the `@Default` qualifier.
  pub fn instance<T: ?Sized + Any + Send + Sync>(&self) -> Instance<T> {
    Instance::root(self.clone())
  }

  /// A lookup over every type. Only this lookup can be
  /// [narrowed](Instance::narrow) to another type.
  pub fn lookup(&self) -> Instance<Object> {
    self.instance::<Object>()
  }

  /// Metadata of every registered bean, in registration order.
  pub fn beans(&self) -> Vec<Arc<Bean>> {
    let mut beans: Vec<Arc<Bean>> = self.inner.beans.iter().map(|e| e.bean.clone()).collect();
    beans.sort_by_key(|bean| bean.id());
    beans
  }

  // --- Lifecycle ---

  pub fn is_shut_down(&self) -> bool {
    self.inner.is_shut_down()
  }

  /// Shuts the container down and destroys every contextual instance it still
  /// owns, most recently created first.
  ///
  /// Afterwards every lookup fails with [`Error::IllegalState`] and destroying
  /// a handle is a no-op. Calling `shutdown` again does nothing.
  pub fn shutdown(&self) {
    if self.inner.shut_down.swap(true, Ordering::AcqRel) {
      return;
    }

    let mut owned: Vec<(InstanceId, Arc<BeanEntry>, Stored)> = Vec::new();
    let dependent_ids: Vec<InstanceId> = self.inner.dependents.iter().map(|t| *t.key()).collect();
    for id in dependent_ids {
      if let Some((id, tracked)) = self.inner.dependents.remove(&id) {
        owned.push((id, tracked.entry, tracked.stored));
      }
    }
    for entry in self.entries() {
      let taken = entry.slot.lock().take();
      if let Some((id, stored)) = taken {
        owned.push((id, entry, stored));
      }
    }
    owned.sort_by(|a, b| b.0.cmp(&a.0));

    debug!(
      container = %self.inner.name,
      instances = owned.len(),
      "shutting down container"
    );
    for (id, entry, stored) in owned {
      trace!(bean = %entry.bean, instance = id.0, "destroying contextual instance on shutdown");
      dispose(&entry, &stored);
    }
  }
}
