/*!

Registry configuration. Validated when the registry is built and fixed afterward.

*/

use crate::{
  error::{RegistryError, Result},
  node_graph::{
    allocator::next_power_of_two,
    header::NODE_HEADER_LEN
  }
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryConfig {
  /// Nodes the registry has room for before its first doubling.
  pub initial_capacity: usize,

  /// Bytes requested from the allocator for every node. Rounded up to a power of two, which must fit a header.
  pub node_request: u32,

  /// Value stamped into each new node's `used_size` field. Must not exceed the node's capacity.
  pub used_size: u32,
}

impl RegistryConfig {
  pub const DEFAULT_INITIAL_CAPACITY: usize = 10;
  pub const DEFAULT_NODE_REQUEST    : u32   = 16;
  pub const DEFAULT_USED_SIZE       : u32   = 14;

  pub fn with_initial_capacity(initial_capacity: usize) -> Self {
    RegistryConfig {
      initial_capacity,
      ..Self::default()
    }
  }

  /// Capacity of every node buffer under this config.
  pub fn node_capacity(&self) -> u32 {
    next_power_of_two(self.node_request)
  }

  pub fn validate(&self) -> Result<()> {
    if self.initial_capacity == 0 {
      return Err(RegistryError::InvalidConfig("initial capacity must be at least 1".to_string()));
    }

    let node_capacity = self.node_capacity();
    if self.node_request == 0 || node_capacity == 0 {
      return Err(RegistryError::InvalidConfig(format!(
        "node request of {} bytes has no power-of-two capacity",
        self.node_request
      )));
    }
    if (node_capacity as usize) < NODE_HEADER_LEN {
      return Err(RegistryError::InvalidConfig(format!(
        "node capacity {} cannot hold a {} byte header",
        node_capacity, NODE_HEADER_LEN
      )));
    }
    if self.used_size > node_capacity {
      return Err(RegistryError::InvalidConfig(format!(
        "used size {} exceeds node capacity {}",
        self.used_size, node_capacity
      )));
    }

    Ok(())
  }
}

impl Default for RegistryConfig {
  fn default() -> Self {
    RegistryConfig {
      initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
      node_request    : Self::DEFAULT_NODE_REQUEST,
      used_size       : Self::DEFAULT_USED_SIZE,
    }
  }
}
