//! Bean metadata, registration and per-bean contextual storage.

use crate::container::Container;
use crate::core::{BeanId, InstanceId, Stored};
use crate::error::Result;
use crate::qualifier::Qualifier;
use crate::Object;

use parking_lot::Mutex;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How long a bean's contextual instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
  /// One instance per container, created on first lookup and shared until it
  /// is destroyed or the container shuts down.
  #[default]
  Singleton,
  /// A new instance for every lookup. The container tracks it until it is
  /// destroyed or the container shuts down.
  Dependent,
}

/// Read-only metadata about a registered bean.
///
/// Every [`Handle`](crate::Handle) exposes the `Bean` that produced its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bean {
  id: BeanId,
  implementation: &'static str,
  types: Vec<&'static str>,
  qualifiers: Vec<Qualifier>,
  scope: Scope,
  name: Option<String>,
  alternative: bool,
  priority: Option<i32>,
}

impl Bean {
  pub fn id(&self) -> BeanId {
    self.id
  }

  /// The type name of the value the bean's factory produces.
  pub fn implementation(&self) -> &'static str {
    self.implementation
  }

  /// Type names of every type this bean can be looked up as.
  pub fn types(&self) -> &[&'static str] {
    &self.types
  }

  /// The complete qualifier set, including the implied `@Any` and `@Default`.
  pub fn qualifiers(&self) -> &[Qualifier] {
    &self.qualifiers
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  /// The bean name given through [`BeanBuilder::named`].
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn is_alternative(&self) -> bool {
    self.alternative
  }

  pub fn priority(&self) -> Option<i32> {
    self.priority
  }
}

impl fmt::Display for Bean {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{} '{}' ({})", self.id, name, self.implementation),
      None => write!(f, "{} ({})", self.id, self.implementation),
    }
  }
}

type Factory = Box<dyn Fn(&Container) -> Stored + Send + Sync>;
type Caster = Box<dyn Fn(&Stored) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;
type Disposer = Box<dyn Fn(&Stored) + Send + Sync>;

/// A registered bean together with everything needed to create, cast and
/// destroy its instances.
pub(crate) struct BeanEntry {
  pub(crate) bean: Arc<Bean>,
  factory: Factory,
  casters: HashMap<TypeId, Caster>,
  disposer: Option<Disposer>,
  // The singleton context. Unused for dependent beans.
  pub(crate) slot: Mutex<Option<(InstanceId, Stored)>>,
}

impl BeanEntry {
  pub(crate) fn exposes(&self, type_id: TypeId) -> bool {
    self.casters.contains_key(&type_id)
  }

  /// A bean matches when it carries every required qualifier.
  pub(crate) fn matches(&self, required: &[Qualifier]) -> bool {
    required.iter().all(|q| self.bean.qualifiers.contains(q))
  }

  pub(crate) fn create(&self, container: &Container) -> Stored {
    (self.factory)(container)
  }

  /// Converts a stored instance into an `Arc<T>` for one of the exposed types.
  pub(crate) fn cast<T: ?Sized + Any + Send + Sync>(&self, stored: &Stored) -> Option<Arc<T>> {
    let caster = self.casters.get(&TypeId::of::<T>())?;
    caster(stored)
      .and_then(|boxed| boxed.downcast::<Arc<T>>().ok())
      .map(|arc_in_a_box| *arc_in_a_box)
  }

  pub(crate) fn dispose(&self, stored: &Stored) {
    if let Some(disposer) = &self.disposer {
      disposer(stored);
    }
  }
}

impl fmt::Debug for BeanEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BeanEntry")
      .field("bean", &self.bean)
      .field("has_disposer", &self.disposer.is_some())
      .finish_non_exhaustive()
  }
}

/// A builder for registering a bean with a [`Container`].
///
/// Created by [`Container::bean`]. Nothing is registered until
/// [`register`](BeanBuilder::register) is called.
///
/// ```
/// use fibre_inject::{Container, Qualifier, Scope};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
/// struct English;
/// impl Greeter for English {
///   fn greet(&self) -> String { "Hello!".into() }
/// }
///
/// let container = Container::new();
/// container
///   .bean(|_| English)
///   .scope(Scope::Dependent)
///   .named("english")
///   .expose::<dyn Greeter>(|e| e as Arc<dyn Greeter>)
///   .register()
///   .unwrap();
///
/// let greeter = container
///   .instance::<dyn Greeter>()
///   .select(&[Qualifier::named("english")])
///   .and_then(|i| i.get())
///   .unwrap();
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[must_use = "a bean is only registered once `register()` is called"]
pub struct BeanBuilder<'c, I> {
  container: &'c Container,
  factory: Box<dyn Fn(&Container) -> Arc<I> + Send + Sync>,
  scope: Scope,
  qualifiers: Vec<Qualifier>,
  name: Option<String>,
  alternative: bool,
  priority: Option<i32>,
  casters: Vec<(TypeId, &'static str, Caster)>,
  disposer: Option<Box<dyn Fn(&I) + Send + Sync>>,
}

impl<'c, I: Any + Send + Sync> BeanBuilder<'c, I> {
  pub(crate) fn new(
    container: &'c Container,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) -> Self {
    Self {
      container,
      factory: Box::new(factory),
      scope: Scope::default(),
      qualifiers: Vec::new(),
      name: None,
      alternative: false,
      priority: None,
      casters: Vec::new(),
      disposer: None,
    }
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  /// Adds a qualifier to the bean.
  pub fn qualified(mut self, qualifier: Qualifier) -> Self {
    self.qualifiers.push(qualifier);
    self
  }

  /// Gives the bean a name. The bean also gets the matching `@Named` qualifier.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    self.qualifiers.push(Qualifier::named(name.clone()));
    self.name = Some(name);
    self
  }

  /// Makes the bean resolvable as `U` (typically a trait object).
  pub fn expose<U: ?Sized + Any + Send + Sync>(
    mut self,
    cast: impl Fn(Arc<I>) -> Arc<U> + Send + Sync + 'static,
  ) -> Self {
    let caster: Caster = Box::new(move |stored: &Stored| -> Option<Box<dyn Any + Send + Sync>> {
      let concrete = stored.clone().downcast::<I>().ok()?;
      Some(Box::new(cast(concrete)))
    });
    self.casters.push((TypeId::of::<U>(), type_name::<U>(), caster));
    self
  }

  /// Declares the bean an alternative. A disabled alternative is never
  /// resolved; it is enabled by a priority or by listing its name in
  /// [`ContainerConfig::alternatives`](crate::ContainerConfig).
  pub fn alternative(mut self) -> Self {
    self.alternative = true;
    self
  }

  /// Declares the bean an alternative enabled with the given priority.
  /// Among competing alternatives the highest priority wins.
  pub fn priority(mut self, priority: i32) -> Self {
    self.alternative = true;
    self.priority = Some(priority);
    self
  }

  /// Registers a callback run when an instance of this bean is destroyed.
  pub fn on_destroy(mut self, disposer: impl Fn(&I) + Send + Sync + 'static) -> Self {
    self.disposer = Some(Box::new(disposer));
    self
  }

  /// Validates the qualifiers and adds the bean to the container.
  pub fn register(self) -> Result<Arc<Bean>> {
    let container = self.container;
    container.ensure_running("register a bean")?;
    container.qualifier_registry().validate(&[], &self.qualifiers)?;

    let mut qualifiers = self.qualifiers;
    if qualifiers.iter().all(|q| q.is_named() || *q == Qualifier::ANY) {
      qualifiers.push(Qualifier::DEFAULT);
    }
    if !qualifiers.contains(&Qualifier::ANY) {
      qualifiers.push(Qualifier::ANY);
    }

    let mut casters: HashMap<TypeId, Caster> = HashMap::new();
    let mut types = vec![type_name::<I>()];
    casters.insert(
      TypeId::of::<I>(),
      Box::new(|stored: &Stored| -> Option<Box<dyn Any + Send + Sync>> {
        let concrete = stored.clone().downcast::<I>().ok()?;
        Some(Box::new(concrete))
      }),
    );
    for (type_id, name, caster) in self.casters {
      if casters.insert(type_id, caster).is_none() {
        types.push(name);
      }
    }
    casters.insert(
      TypeId::of::<Object>(),
      Box::new(|stored: &Stored| -> Option<Box<dyn Any + Send + Sync>> {
        Some(Box::new(stored.clone()))
      }),
    );
    if !types.contains(&type_name::<Object>()) {
      types.push(type_name::<Object>());
    }

    let factory = self.factory;
    let disposer = self.disposer.map(|dispose| -> Disposer {
      Box::new(move |stored: &Stored| {
        if let Some(concrete) = stored.downcast_ref::<I>() {
          dispose(concrete);
        }
      })
    });

    let bean = Bean {
      id: container.next_bean_id(),
      implementation: type_name::<I>(),
      types,
      qualifiers,
      scope: self.scope,
      name: self.name,
      alternative: self.alternative,
      priority: self.priority,
    };

    let entry = BeanEntry {
      bean: Arc::new(bean),
      factory: Box::new(move |c: &Container| -> Stored { factory(c) }),
      casters,
      disposer,
      slot: Mutex::new(None),
    };
    Ok(container.insert_bean(entry))
  }
}
