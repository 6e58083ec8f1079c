pub mod config;
pub mod error;
pub mod node_graph;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use node_graph::{
  next_power_of_two,
  MemoryProvider,
  Node,
  NodeHeader,
  NodeRef,
  NodeRegistry,
  SystemMemory,
  TrackingMemory
};
