//! Public macros for ergonomic lookups.

#[doc(hidden)]
pub mod __private {
  use crate::{Container, Qualifier, Result};
  use std::any::Any;
  use std::sync::Arc;

  pub fn lookup<T: ?Sized + Any + Send + Sync>(
    container: &Container,
    name: Option<&str>,
  ) -> Result<Arc<T>> {
    let instance = container.instance::<T>();
    match name {
      Some(name) => instance.select(&[Qualifier::named(name)])?.get(),
      None => instance.get(),
    }
  }
}

/// Resolves a bean from the global container.
///
/// This macro is the primary way to get dependencies. It panics if the
/// requested bean cannot be resolved (unsatisfied or ambiguous), ensuring that
/// all required dependencies are present at runtime. A second argument selects
/// the bean by its `@Named` qualifier.
///
/// # Panics
///
/// This macro will panic if the bean cannot be resolved. For a non-panicking
/// version, use [`maybe_resolve!`] or `global().instance::<T>().get()` directly.
///
/// Each call on a dependent bean creates an instance that the container tracks
/// until it is released with [`Instance::destroy`](crate::Instance::destroy) or
/// the container shuts down.
///
/// # Examples
///
/// ```
/// use fibre_inject::{global, resolve};
///
/// global().bean(|_| 7_u16).named("answer").register().unwrap();
///
/// let answer = resolve!(u16, "answer");
/// assert_eq!(*answer, 7);
/// ```
///
/// ```
/// use fibre_inject::{global, resolve};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// // Register a trait implementation
/// global()
///   .bean(|_| EnglishGreeter)
///   .expose::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
///   .register()
///   .unwrap();
///
/// // Resolve the trait object
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  (trait $trait_ident:ident) => {
    $crate::resolve_from!($crate::global(), trait $trait_ident)
  };
  (trait $trait_ident:ident, $name:expr) => {
    $crate::resolve_from!($crate::global(), trait $trait_ident, $name)
  };
  ($type:ty) => {
    $crate::resolve_from!($crate::global(), $type)
  };
  ($type:ty, $name:expr) => {
    $crate::resolve_from!($crate::global(), $type, $name)
  };
}

/// Like [`resolve!`], against an explicit container.
///
/// ```
/// use fibre_inject::{resolve_from, Container};
///
/// let container = Container::new();
/// container.add_instance(String::from("local")).unwrap();
/// assert_eq!(*resolve_from!(&container, String), "local");
/// ```
#[macro_export]
macro_rules! resolve_from {
  ($container:expr, trait $trait_ident:ident) => {
    // We construct `dyn Trait` manually inside the macro expansion.
    $crate::__private::lookup::<dyn $trait_ident>($container, None).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required trait service: {}: {}",
        std::any::type_name::<dyn $trait_ident>(),
        e
      )
    })
  };
  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $crate::__private::lookup::<dyn $trait_ident>($container, Some($name)).unwrap_or_else(
      |e| {
        panic!(
          "Failed to resolve required trait service with name '{}': {}: {}",
          $name,
          std::any::type_name::<dyn $trait_ident>(),
          e
        )
      },
    )
  };
  ($container:expr, $type:ty) => {
    $crate::__private::lookup::<$type>($container, None).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required service: {}: {}",
        std::any::type_name::<$type>(),
        e
      )
    })
  };
  ($container:expr, $type:ty, $name:expr) => {
    $crate::__private::lookup::<$type>($container, Some($name)).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required service with name '{}': {}: {}",
        $name,
        std::any::type_name::<$type>(),
        e
      )
    })
  };
}

/// Resolves a bean from the global container, returning `None` if it is
/// unsatisfied, ambiguous, or the container is shut down.
///
/// Dependent instances are tracked the same way as with [`resolve!`].
#[macro_export]
macro_rules! maybe_resolve {
  (trait $trait_ident:ident) => {
    $crate::__private::lookup::<dyn $trait_ident>($crate::global(), None).ok()
  };
  (trait $trait_ident:ident, $name:expr) => {
    $crate::__private::lookup::<dyn $trait_ident>($crate::global(), Some($name)).ok()
  };
  ($type:ty) => {
    $crate::__private::lookup::<$type>($crate::global(), None).ok()
  };
  ($type:ty, $name:expr) => {
    $crate::__private::lookup::<$type>($crate::global(), Some($name)).ok()
  };
}
