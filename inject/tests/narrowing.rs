use fibre_inject::{Container, Object, Qualifier, QualifierType};
use std::sync::Arc;

trait Storage: Send + Sync {
  fn kind(&self) -> &'static str;
}

struct Disk;
impl Storage for Disk {
  fn kind(&self) -> &'static str {
    "disk"
  }
}

struct Memory;
impl Storage for Memory {
  fn kind(&self) -> &'static str {
    "memory"
  }
}

fn storage_container() -> Container {
  let container = Container::new();
  container
    .register_qualifier(QualifierType::new("Fast"))
    .unwrap();
  container
    .register_qualifier(QualifierType::new("Region").repeatable())
    .unwrap();
  container
    .bean(|_| Disk)
    .expose::<dyn Storage>(|s| s as Arc<dyn Storage>)
    .qualified(Qualifier::new("Region").with_member("value", "eu"))
    .register()
    .unwrap();
  container
    .bean(|_| Memory)
    .expose::<dyn Storage>(|s| s as Arc<dyn Storage>)
    .qualified(Qualifier::new("Fast"))
    .qualified(Qualifier::new("Region").with_member("value", "eu"))
    .qualified(Qualifier::new("Region").with_member("value", "us"))
    .register()
    .unwrap();
  container
}

#[test]
fn narrow_from_object_to_a_trait() {
  let container = storage_container();

  let fast = container
    .lookup()
    .narrow::<dyn Storage>(&[Qualifier::new("Fast")])
    .unwrap();
  assert_eq!(fast.get().unwrap().kind(), "memory");
  assert_eq!(fast.qualifiers(), &[Qualifier::new("Fast")]);
}

#[test]
fn narrow_without_qualifiers_requires_default() {
  let container = storage_container();

  // Disk has only @Region (not @Named), so it loses @Default; so does Memory.
  let storage = container.lookup().narrow::<dyn Storage>(&[]).unwrap();
  assert!(storage.is_unsatisfied());

  let any = storage.select(&[Qualifier::ANY]).unwrap();
  assert!(any.is_ambiguous());
  assert_eq!(any.handles().iter().count(), 2);
}

#[test]
fn narrow_is_illegal_on_a_specific_type() {
  let container = storage_container();

  let err = container
    .instance::<dyn Storage>()
    .narrow::<Disk>(&[])
    .unwrap_err();
  assert!(err.is_illegal_state());

  // Narrowing once leaves a specific type behind; narrowing again is illegal too.
  let narrowed = container.lookup().narrow::<dyn Storage>(&[]).unwrap();
  assert!(narrowed.narrow::<Memory>(&[]).unwrap_err().is_illegal_state());
}

#[test]
fn narrow_is_legal_on_selected_object_lookups() {
  let container = storage_container();
  let any_object = container.lookup().select(&[Qualifier::ANY]).unwrap();

  let disks = any_object.narrow::<Disk>(&[]).unwrap();
  assert_eq!(disks.get().unwrap().kind(), "disk");
  // Every bean is an Object.
  assert_eq!(any_object.iter().count(), 2);
}

#[test]
fn duplicate_non_repeatable_qualifier_is_illegal_argument() {
  let container = storage_container();

  let err = container
    .lookup()
    .narrow::<dyn Storage>(&[Qualifier::new("Fast"), Qualifier::new("Fast")])
    .unwrap_err();
  assert!(err.is_illegal_argument());

  let err = container
    .instance::<dyn Storage>()
    .select(&[Qualifier::named("a"), Qualifier::named("b")])
    .unwrap_err();
  assert!(err.is_illegal_argument());

  // Duplicates across derivations count too.
  let fast = container
    .instance::<dyn Storage>()
    .select(&[Qualifier::new("Fast")])
    .unwrap();
  assert!(fast
    .select(&[Qualifier::new("Fast")])
    .unwrap_err()
    .is_illegal_argument());
}

#[test]
fn repeatable_qualifiers_may_repeat() {
  let container = storage_container();

  let both_regions = container
    .instance::<dyn Storage>()
    .select(&[
      Qualifier::new("Region").with_member("value", "eu"),
      Qualifier::new("Region").with_member("value", "us"),
    ])
    .unwrap();
  assert_eq!(both_regions.get().unwrap().kind(), "memory");

  let eu = container
    .instance::<dyn Storage>()
    .select(&[Qualifier::new("Region").with_member("value", "eu")])
    .unwrap();
  assert!(eu.is_ambiguous());
}

#[test]
fn unknown_qualifier_marker_is_illegal_argument() {
  let container = storage_container();

  let err = container
    .lookup()
    .narrow::<dyn Storage>(&[Qualifier::new("Slow")])
    .unwrap_err();
  assert!(err.is_illegal_argument());

  let err = container
    .instance::<Disk>()
    .select(&[Qualifier::new("Slow")])
    .unwrap_err();
  assert!(err.is_illegal_argument());

  // Registration validates bean qualifiers the same way.
  let err = container
    .bean(|_| Disk)
    .qualified(Qualifier::new("Slow"))
    .register()
    .unwrap_err();
  assert!(err.is_illegal_argument());
}

#[test]
fn derivation_leaves_the_parent_untouched() {
  let container = storage_container();
  let parent = container.lookup().select(&[Qualifier::ANY]).unwrap();

  let _child = parent.narrow::<dyn Storage>(&[Qualifier::new("Fast")]).unwrap();

  assert_eq!(parent.qualifiers(), &[Qualifier::ANY]);
  assert_eq!(parent.iter().count(), 2);
}

#[test]
fn object_lookup_yields_type_erased_references() {
  let container = storage_container();
  let objects: Vec<Arc<Object>> = container
    .lookup()
    .select(&[Qualifier::new("Fast")])
    .unwrap()
    .iter()
    .collect::<Result<_, _>>()
    .unwrap();

  assert_eq!(objects.len(), 1);
  assert!(objects[0].downcast_ref::<Memory>().is_some());
}
