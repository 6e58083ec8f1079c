/*!

A process-wide registry for callers that need one registry across threads.

The registry's invariants (length against capacity, the monotonic index) are not independently atomic, so the whole
registry sits behind one mutex and every operation runs with the lock held.

*/

use std::{
  ops::{Deref, DerefMut},
  sync::{Mutex, MutexGuard, PoisonError}
};

use once_cell::sync::Lazy;

use crate::{
  error::Result,
  node_graph::{
    allocator::SystemMemory,
    registry::NodeRegistry
  }
};

/// Holds the construction error if the initial node vector could not be allocated.
static GLOBAL_NODE_REGISTRY: Lazy<Mutex<Result<NodeRegistry<SystemMemory>>>> = Lazy::new(|| {
  Mutex::new(NodeRegistry::system())
});

/// Exclusive access to the process-wide registry for as long as the guard lives.
pub struct RegistryGuard {
  guard: MutexGuard<'static, Result<NodeRegistry<SystemMemory>>>,
}

/// Blocks until the process-wide registry is free.
pub fn acquire_registry() -> Result<RegistryGuard> {
  let guard = GLOBAL_NODE_REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
  if let Err(error) = guard.as_ref() {
    return Err(error.clone());
  }
  Ok(RegistryGuard { guard })
}

impl Deref for RegistryGuard {
  type Target = NodeRegistry<SystemMemory>;

  fn deref(&self) -> &Self::Target {
    match self.guard.as_ref() {
      Ok(registry) => registry,
      Err(_) => unreachable!("RegistryGuard is only built over an initialized registry"),
    }
  }
}

impl DerefMut for RegistryGuard {
  fn deref_mut(&mut self) -> &mut Self::Target {
    match self.guard.as_mut() {
      Ok(registry) => registry,
      Err(_) => unreachable!("RegistryGuard is only built over an initialized registry"),
    }
  }
}
