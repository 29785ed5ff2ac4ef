use fibre_inject::{global, resolve};
use std::panic;

struct UnregisteredService;

fn main() {
  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a bean that was never registered...");

  let result = panic::catch_unwind(|| {
    let _service = resolve!(UnregisteredService);
  });
  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Caught the expected panic from resolve!.");

  // --- Using the fallible lookup ---
  println!("\nNow resolving through `Instance::get_handle`...");
  let lookup = global().instance::<UnregisteredService>();
  assert!(lookup.is_unsatisfied());

  match lookup.get_handle() {
    Ok(_) => panic!("Should not have found the bean!"),
    Err(e) => {
      assert!(e.is_unsatisfied());
      println!("Correctly received an error: {}", e);
    }
  }
}
