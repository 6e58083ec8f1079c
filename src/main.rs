/*!

Builds a registry, creates two nodes, looks them up and tears the registry down. Exits with 1 if the registry cannot be
built. Log output is controlled by `RUST_LOG`.

*/

use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use nodegraph::NodeRegistry;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nodegraph=info"));
  let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .try_init();
}

fn main() -> ExitCode {
  init_tracing();

  let mut registry = match NodeRegistry::system() {
    Ok(registry) => registry,
    Err(error) => {
      println!("Graph initialization failed: {}", error);
      return ExitCode::from(1);
    }
  };

  for _ in 0..2 {
    if let Err(error) = registry.create_node() {
      println!("{}", error);
    }
  }

  for index in 0..3 {
    match registry.find_node(index) {
      Some(node) => println!("Found {}", node),
      None       => println!("Node {} not found", index),
    }
  }

  info!(nodes = registry.len(), capacity = registry.capacity(), "driver.teardown");
  registry.teardown();

  ExitCode::SUCCESS
}
