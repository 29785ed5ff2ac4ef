use fibre_inject::{global, resolve};
use std::sync::Arc;

trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// Depends on the abstraction, not on ConsoleLogger.
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> fibre_inject::Result<()> {
  // The container stores Arc<ConsoleLogger> but serves it as Arc<dyn Logger>.
  global()
    .bean(|_| ConsoleLogger)
    .expose::<dyn Logger>(|l| l as Arc<dyn Logger>)
    .register()?;

  // The factory looks up its own dependency.
  global().add_singleton(|_| ReportService {
    logger: resolve!(trait Logger),
  })?;

  println!("Resolving the high-level service...");
  let report_service = resolve!(ReportService);
  report_service.generate_report();
  Ok(())
}
