//! # Fibre Inject
//!
//! Qualifier-aware lookups with destroyable reference handles, on top of a
//! thread-safe, dynamic Inversion of Control container.
//!
//! ## Core Concepts
//!
//! - **Container**: The registry of beans, qualifier types and the contextual
//!   instances it manages. Beans can be registered at any time until the
//!   container is shut down.
//! - **Bean**: A registered factory plus its metadata: the types it can be looked
//!   up as, its qualifiers and its [`Scope`].
//! - **Instance**: A lookup for a required type and required qualifiers. It
//!   resolves one bean ([`Instance::get_handle`]), iterates over all eligible
//!   beans ([`Instance::handles`]) and derives narrower lookups
//!   ([`Instance::select`], [`Instance::narrow`]).
//! - **Handle**: One resolved reference together with its bean's metadata and
//!   an idempotent [`Handle::destroy`].
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Container, Qualifier, Scope};
//! use std::sync::Arc;
//!
//! trait Notifier: Send + Sync {
//!   fn channel(&self) -> &'static str;
//! }
//!
//! struct Email;
//! impl Notifier for Email {
//!   fn channel(&self) -> &'static str { "email" }
//! }
//!
//! struct Sms;
//! impl Notifier for Sms {
//!   fn channel(&self) -> &'static str { "sms" }
//! }
//!
//! fn main() -> fibre_inject::Result<()> {
//!   let container = Container::new();
//!   container
//!     .bean(|_| Email)
//!     .expose::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
//!     .register()?;
//!   container
//!     .bean(|_| Sms)
//!     .scope(Scope::Dependent)
//!     .named("sms")
//!     .expose::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
//!     .register()?;
//!
//!   // Both beans carry `@Default`, so the plain lookup is ambiguous...
//!   let notifiers = container.instance::<dyn Notifier>();
//!   assert!(notifiers.get_handle().unwrap_err().is_ambiguous());
//!
//!   // ...but a qualifier picks one.
//!   let sms = notifiers.select(&[Qualifier::named("sms")])?.get_handle()?;
//!   assert_eq!(sms.channel(), "sms");
//!   assert_eq!(sms.bean().name(), Some("sms"));
//!   sms.destroy();
//!
//!   // Every traversal resolves afresh.
//!   let channels: Vec<&'static str> = notifiers
//!     .handles()
//!     .iter()
//!     .map(|h| h.map(|h| h.channel()))
//!     .collect::<Result<_, _>>()?;
//!   assert_eq!(channels, ["email", "sms"]);
//!
//!   container.shutdown();
//!   assert!(matches!(notifiers.get(), Err(e) if e.is_illegal_state()));
//!   Ok(())
//! }
//! ```

mod bean;
mod config;
mod container;
mod core;
mod error;
mod global;
mod handle;
mod instance;
mod macros;
mod qualifier;

use std::any::Any;

/// The universal top type: every bean can be looked up as `Object`.
pub type Object = dyn Any + Send + Sync;

pub use bean::{Bean, BeanBuilder, Scope};
pub use config::{find_config_file, find_config_file_in, ContainerConfig, QualifierConfig};
pub use container::Container;
pub use crate::core::BeanId;
pub use error::{Error, Result};
pub use global::global;
pub use handle::{Handle, ScopedHandle};
pub use instance::{HandleIter, Handles, Instance, Values};
pub use qualifier::{Qualifier, QualifierType};

#[doc(hidden)]
pub use macros::__private;
