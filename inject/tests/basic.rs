use fibre_inject::{global, resolve, Container, Object, Qualifier, Scope};
use std::sync::Arc;

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// --- Basic Tests ---

#[test]
fn test_unqualified_singleton_factory() {
  // Arrange
  let container = Container::new();
  container.add_singleton(|_| SimpleService { id: 101 }).unwrap();

  // Act
  let r1 = container.instance::<SimpleService>().get().unwrap();
  let r2 = container.instance::<SimpleService>().get().unwrap();

  // Assert
  assert_eq!(r1.id, 101);
  // Ensure it's a singleton by checking pointer equality.
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_named_singleton_instance() {
  // Arrange
  struct NamedInstanceService {
    id: u32,
  }
  global()
    .bean(|_| NamedInstanceService { id: 202 })
    .named("named_instance")
    .register()
    .unwrap();

  // Act
  let r1 = resolve!(NamedInstanceService, "named_instance");
  let r2 = resolve!(NamedInstanceService, "named_instance");

  // Assert
  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_dependent_factory() {
  // Arrange
  let container = Container::new();
  container.add_dependent(|_| SimpleService { id: 303 }).unwrap();

  // Act
  let r1 = container.instance::<SimpleService>().get().unwrap();
  let r2 = container.instance::<SimpleService>().get().unwrap();

  // Assert
  assert_eq!(r1.id, 303);
  assert_eq!(r2.id, 303);
  // Ensure it's dependent by checking the pointers are different.
  assert!(!Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_add_instance_is_shared() {
  let container = Container::new();
  container.add_instance(SimpleService { id: 404 }).unwrap();

  let r1 = container.instance::<SimpleService>().get().unwrap();
  let r2 = container.instance::<SimpleService>().get().unwrap();
  assert_eq!(*r1, SimpleService { id: 404 });
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_unqualified_trait_resolution() {
  // Arrange
  trait LocalGreeter: Send + Sync {
    fn greet(&self) -> String;
  }
  struct Hello;
  impl LocalGreeter for Hello {
    fn greet(&self) -> String {
      "Hello!".to_string()
    }
  }
  global()
    .bean(|_| Hello)
    .expose::<dyn LocalGreeter>(|g| g as Arc<dyn LocalGreeter>)
    .register()
    .unwrap();

  // Act
  let greeter = resolve!(trait LocalGreeter);

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
fn test_named_trait_resolution() {
  // Arrange
  struct GermanGreeter;
  impl Greeter for GermanGreeter {
    fn greet(&self) -> String {
      "Hallo!".to_string()
    }
  }
  global()
    .bean(|_| GermanGreeter)
    .named("german")
    .expose::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
    .register()
    .unwrap();

  // Act
  let greeter = resolve!(trait Greeter, "german");

  // Assert
  assert_eq!(greeter.greet(), "Hallo!");
}

#[test]
fn test_bean_is_resolvable_as_every_exposed_type() {
  let container = Container::new();
  container
    .bean(|_| EnglishGreeter)
    .scope(Scope::Singleton)
    .expose::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
    .register()
    .unwrap();

  let concrete = container.instance::<EnglishGreeter>().get().unwrap();
  let as_trait = container.instance::<dyn Greeter>().get().unwrap();
  let as_object = container.lookup().get().unwrap();

  assert_eq!(as_trait.greet(), "Hello!");
  assert!(as_object.downcast_ref::<EnglishGreeter>().is_some());
  assert_eq!(
    Arc::as_ptr(&concrete) as *const (),
    Arc::as_ptr(&as_trait) as *const ()
  );
}

#[test]
fn test_registered_bean_metadata() {
  let container = Container::new();
  let bean = container
    .bean(|_| EnglishGreeter)
    .named("english")
    .expose::<dyn Greeter>(|g| g as Arc<dyn Greeter>)
    .register()
    .unwrap();

  assert_eq!(bean.name(), Some("english"));
  assert_eq!(bean.scope(), Scope::Singleton);
  assert!(bean.implementation().ends_with("EnglishGreeter"));
  assert_eq!(bean.types().len(), 3);
  assert!(bean.qualifiers().contains(&Qualifier::named("english")));
  assert!(bean.qualifiers().contains(&Qualifier::DEFAULT));
  assert!(bean.qualifiers().contains(&Qualifier::ANY));
  assert_eq!(container.beans(), vec![bean]);
}

#[test]
fn test_explicit_object_exposure_is_listed_once() {
  let container = Container::new();
  let bean = container
    .bean(|_| SimpleService { id: 9 })
    .expose::<Object>(|s| s as Arc<Object>)
    .register()
    .unwrap();

  let object_types = bean
    .types()
    .iter()
    .filter(|t| **t == std::any::type_name::<Object>())
    .count();
  assert_eq!(object_types, 1);
  assert_eq!(bean.types().len(), 2);
  assert!(container.lookup().is_resolvable());
}

#[test]
fn test_bean_qualified_only_with_any_keeps_default() {
  let container = Container::new();
  let bean = container
    .bean(|_| SimpleService { id: 3 })
    .qualified(Qualifier::ANY)
    .register()
    .unwrap();

  assert!(bean.qualifiers().contains(&Qualifier::DEFAULT));
  assert_eq!(bean.qualifiers().iter().filter(|q| **q == Qualifier::ANY).count(), 1);
  assert_eq!(container.instance::<SimpleService>().get().unwrap().id, 3);
}

#[test]
#[should_panic(expected = "Failed to resolve required service")]
fn test_resolve_panics_on_missing_concrete_service() {
  struct MissingService;
  resolve!(MissingService);
}

#[test]
#[should_panic(expected = "Failed to resolve required trait service")]
fn test_resolve_panics_on_missing_trait_service() {
  // The test trait must also be Send + Sync to be a valid type for `get`.
  trait MissingTrait: Send + Sync {}
  resolve!(trait MissingTrait);
}
