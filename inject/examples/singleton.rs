use fibre_inject::{Container, Qualifier, Scope};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple bean that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tracker(_: &Container) -> RequestTracker {
  RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  }
}

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();
  container
    .bean(tracker)
    .named("singleton_tracker")
    .on_destroy(|t| println!("Destroying SINGLETON tracker {}", t.id))
    .register()?;
  container
    .bean(tracker)
    .scope(Scope::Dependent)
    .named("dependent_tracker")
    .on_destroy(|t| println!("Destroying DEPENDENT tracker {}", t.id))
    .register()?;

  let singletons = container
    .instance::<RequestTracker>()
    .select(&[Qualifier::named("singleton_tracker")])?;
  let dependents = container
    .instance::<RequestTracker>()
    .select(&[Qualifier::named("dependent_tracker")])?;

  println!("--- Resolving Singletons ---");
  let s1 = singletons.get_handle()?;
  let s2 = singletons.get_handle()?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(s1.value(), s2.value()));

  // Destroying the singleton lets the next lookup create a new one.
  s1.destroy();
  let s3 = singletons.get_handle()?;
  println!("After destroy, singleton ID: {}", s3.id);
  assert!(!Arc::ptr_eq(s2.value(), s3.value()));

  println!("\n--- Resolving Dependents ---");
  let d1 = dependents.get_handle()?;
  let d2 = dependents.get_handle()?;
  println!("Dependent 1 ID: {}, Dependent 2 ID: {}", d1.id, d2.id);
  assert!(!Arc::ptr_eq(d1.value(), d2.value()));
  d1.destroy();

  // d2 and s3 are still owned by the container.
  println!("\n--- Shutting down ---");
  container.shutdown();
  Ok(())
}
