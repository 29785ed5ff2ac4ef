use fibre_inject::{global, resolve, Qualifier};
use std::sync::Arc;

trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

fn main() -> fibre_inject::Result<()> {
  global()
    .bean(|_| EmailSender)
    .named("email")
    .expose::<dyn MessageSender>(|s| s as Arc<dyn MessageSender>)
    .register()?;
  global()
    .bean(|_| SmsSender)
    .named("sms")
    .expose::<dyn MessageSender>(|s| s as Arc<dyn MessageSender>)
    .register()?;

  // The name picks the implementation at the point of resolution.
  let email_notifier = resolve!(trait MessageSender, "email");
  let result = email_notifier.send("test@example.com", "Hello from Fibre!");
  println!("{}", result);
  assert!(result.contains("email"));

  // The same choice through an explicit lookup, keeping the bean metadata.
  let sms = global()
    .instance::<dyn MessageSender>()
    .select(&[Qualifier::named("sms")])?
    .get_handle()?;
  println!("{} (bean {})", sms.send("+123456789", "Hello from Fibre!"), sms.bean());

  // Without a name both beans qualify.
  assert!(global().instance::<dyn MessageSender>().is_ambiguous());
  Ok(())
}
