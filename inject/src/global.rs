//! The global container instance and access functions.

use crate::container::Container;
use once_cell::sync::Lazy;

// The one and only global container instance.
// It will be created on its first access in a thread-safe manner.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(|| Container::named("global"));

/// Provides a reference to the global container instance.
///
/// This function allows for direct interaction with the container, such as
/// registering beans from anywhere in an application.
///
/// # Examples
///
/// ```
/// use fibre_inject::global;
///
/// fn register_beans() {
///   // Get the global container and register a bean.
///   global()
///     .bean(|_| String::from("Hello from global!"))
///     .named("global_greeting")
///     .register()
///     .unwrap();
/// }
/// # register_beans();
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
