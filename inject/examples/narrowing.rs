use fibre_inject::{Container, Qualifier, QualifierType, Scope};
use std::sync::Arc;

trait Plugin: Send + Sync {
  fn name(&self) -> &'static str;
}

struct Metrics;
impl Plugin for Metrics {
  fn name(&self) -> &'static str {
    "metrics"
  }
}

struct Audit;
impl Plugin for Audit {
  fn name(&self) -> &'static str {
    "audit"
  }
}

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();
  container.register_qualifier(QualifierType::new("Builtin"))?;

  container
    .bean(|_| Metrics)
    .qualified(Qualifier::new("Builtin"))
    .expose::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
    .register()?;
  container
    .bean(|_| Audit)
    .scope(Scope::Dependent)
    .qualified(Qualifier::new("Builtin"))
    .on_destroy(|_| println!("audit plugin released"))
    .expose::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
    .register()?;

  // Start from the untyped lookup and narrow it down to the plugin trait.
  let plugins = container
    .lookup()
    .narrow::<dyn Plugin>(&[Qualifier::new("Builtin")])?;

  for handle in &plugins.handles() {
    let handle = handle?;
    println!("found plugin '{}' from bean {}", handle.name(), handle.bean());
    handle.destroy();
  }

  // A narrowed lookup is already typed: narrowing again is rejected.
  let err = plugins.narrow::<Metrics>(&[]).unwrap_err();
  println!("narrowing twice: {}", err);

  container.shutdown();
  Ok(())
}
