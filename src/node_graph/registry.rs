/*!

The `NodeRegistry` owns every node buffer along with the vector that holds them.

Nodes are appended in creation order and stamped with a monotonically increasing index that is never reused. When the
vector is full its capacity doubles. Lookup is a linear scan by index. There is no way to remove a single node; the
registry is torn down as a whole, either explicitly or when dropped.

Every failing operation leaves the registry exactly as it was. A node is only pushed once its buffer is stamped, so a
lookup never sees a partial node.

*/

use tracing::warn;
#[cfg(feature = "node_debug")]
use tracing::debug;

use crate::{
  config::RegistryConfig,
  error::{RegistryError, Result},
  node_graph::{
    allocator::{self, node_vector::NodeVector, MemoryProvider, SystemMemory},
    header::NodeHeader,
    node::{Node, NodeRef}
  }
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegistryState {
  Live,
  TornDown,
}

pub struct NodeRegistry<M: MemoryProvider = SystemMemory> {
  memory    : M,
  nodes     : NodeVector,
  next_index: u32,          // Index stamped into the next node; never decremented
  config    : RegistryConfig,
  state     : RegistryState,
}

impl NodeRegistry<SystemMemory> {
  /// A registry with the default configuration backed by the global allocator.
  pub fn system() -> Result<Self> {
    NodeRegistry::new(SystemMemory)
  }
}

impl<M: MemoryProvider> NodeRegistry<M> {
  // region Constructors

  pub fn new(memory: M) -> Result<Self> {
    NodeRegistry::with_config(memory, RegistryConfig::default())
  }

  /// Allocates the initial node vector. Fails if `config` is invalid or the provider cannot supply the vector.
  pub fn with_config(mut memory: M, config: RegistryConfig) -> Result<Self> {
    config.validate()?;

    let nodes = NodeVector::with_capacity(&mut memory, config.initial_capacity).ok_or_else(|| {
      RegistryError::AllocationFailure {
        requested: config.initial_capacity.saturating_mul(std::mem::size_of::<Node>()),
      }
    })?;

    Ok(NodeRegistry {
      memory,
      nodes,
      next_index: 0,
      config,
      state: RegistryState::Live,
    })
  }

  // endregion Constructors

  // region Accessors

  /// Number of live nodes.
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Nodes the registry can hold before it has to grow.
  #[inline(always)]
  pub fn capacity(&self) -> usize {
    self.nodes.capacity()
  }

  /// The index the next created node will receive.
  #[inline(always)]
  pub fn next_index(&self) -> u32 {
    self.next_index
  }

  #[inline(always)]
  pub fn state(&self) -> RegistryState {
    self.state
  }

  #[inline(always)]
  pub fn is_torn_down(&self) -> bool {
    self.state == RegistryState::TornDown
  }

  pub fn memory(&self) -> &M {
    &self.memory
  }

  /// Nodes in creation order.
  pub fn iter(&self) -> std::slice::Iter<'_, Node> {
    self.nodes.iter()
  }

  // endregion Accessors

  /// Creates a node and returns its index.
  ///
  /// Grows the node vector first if it is full. Any failure is logged and returned, and leaves the length, capacity
  /// and next index untouched.
  pub fn create_node(&mut self) -> Result<u32> {
    if self.is_torn_down() {
      return Err(RegistryError::TornDown);
    }

    let index = self.next_index;
    let Some(following) = index.checked_add(1) else {
      let error = RegistryError::IndexExhausted;
      warn!(%error, "registry.create_node.index_exhausted");
      return Err(error);
    };

    if self.nodes.is_full() {
      if let Err(error) = self.grow() {
        warn!(%error, "registry.create_node.resize_failed");
        return Err(error);
      }
    }

    let requested = self.config.node_request;
    let Some(buffer) = allocator::allocate(&mut self.memory, requested) else {
      let error = RegistryError::AllocationFailure { requested: requested as usize };
      warn!(%error, "registry.create_node.allocation_failed");
      return Err(error);
    };

    let header = NodeHeader {
      index,
      allocated_size: buffer.capacity(),
      used_size     : self.config.used_size,
      channel_count : 0,
    };
    let node = Node::stamp(buffer, header);

    if let Err(node) = self.nodes.push(node) {
      // `grow` guarantees room, so this only happens if that invariant is broken.
      unsafe { allocator::release(&mut self.memory, node.into_buffer()); }
      return Err(RegistryError::GraphResizeFailure { capacity: self.nodes.capacity() });
    }
    self.next_index = following;

    Ok(index)
  }

  /// Doubles the node vector's capacity. Capacity and storage change together or not at all.
  fn grow(&mut self) -> Result<()> {
    let old_capacity = self.nodes.capacity();
    let new_capacity = old_capacity
        .checked_mul(2)
        .ok_or(RegistryError::GraphResizeFailure { capacity: usize::MAX })?;

    if !self.nodes.reallocate(&mut self.memory, new_capacity) {
      return Err(RegistryError::GraphResizeFailure { capacity: new_capacity });
    }

    #[cfg(feature = "node_debug")]
    debug!(old_capacity, new_capacity, "registry.grow");

    Ok(())
  }

  /// Returns the node stamped with `target_index`, scanning in creation order.
  pub fn find_node(&self, target_index: u32) -> Option<NodeRef<'_>> {
    self.nodes.iter().find(|node| node.index() == target_index)
  }

  /// Releases every node buffer and then the node vector. Calling it again does nothing.
  pub fn teardown(&mut self) {
    if self.is_torn_down() {
      return;
    }

    #[cfg(feature = "node_debug")]
    debug!(nodes = self.nodes.len(), capacity = self.nodes.capacity(), "registry.teardown");

    self.nodes.release(&mut self.memory);
    self.state = RegistryState::TornDown;
  }
}

impl<M: MemoryProvider> Drop for NodeRegistry<M> {
  fn drop(&mut self) {
    self.teardown();
  }
}

impl<'a, M: MemoryProvider> IntoIterator for &'a NodeRegistry<M> {
  type Item = &'a Node;
  type IntoIter = std::slice::Iter<'a, Node>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{alloc::Layout, cell::Cell, ptr::NonNull, rc::Rc};
  use crate::node_graph::allocator::TrackingMemory;

  fn tracked() -> NodeRegistry<TrackingMemory> {
    NodeRegistry::new(TrackingMemory::new()).unwrap()
  }

  #[test]
  fn starts_empty() {
    let registry = tracked();
    assert!(registry.is_empty());
    assert_eq!(registry.capacity(), RegistryConfig::DEFAULT_INITIAL_CAPACITY);
    assert_eq!(registry.next_index(), 0);
    assert_eq!(registry.state(), RegistryState::Live);
    // Only the node vector has been allocated.
    assert_eq!(registry.memory().live_blocks(), 1);
  }

  #[test]
  fn create_stamps_header() {
    let mut registry = tracked();
    let index = registry.create_node().unwrap();
    assert_eq!(index, 0);

    let node = registry.find_node(0).unwrap();
    assert_eq!(node.index(), 0);
    assert_eq!(node.allocated_size(), 16);
    assert_eq!(node.used_size(), 14);
    assert_eq!(node.channel_count(), 0);
    assert_eq!(node.capacity(), 16);
  }

  #[test]
  fn find_misses_uncreated_index() {
    let mut registry = tracked();
    registry.create_node().unwrap();
    registry.create_node().unwrap();

    assert!(registry.find_node(0).is_some());
    assert!(registry.find_node(1).is_some());
    assert!(registry.find_node(2).is_none());
  }

  #[test]
  fn doubles_when_full() {
    let mut registry = NodeRegistry::with_config(
      TrackingMemory::new(),
      RegistryConfig::with_initial_capacity(2)
    ).unwrap();

    for _ in 0..3 {
      registry.create_node().unwrap();
    }
    assert_eq!(registry.capacity(), 4);
    assert_eq!(registry.len(), 3);
  }

  #[test]
  fn failed_allocation_leaves_state() {
    let mut registry = tracked();
    registry.create_node().unwrap();

    registry.memory.exhaust();
    let error = registry.create_node().unwrap_err();
    assert_eq!(error, RegistryError::AllocationFailure { requested: 16 });
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.next_index(), 1);

    registry.memory.set_budget(None);
    assert_eq!(registry.create_node().unwrap(), 1);
  }

  #[test]
  fn failed_resize_leaves_state() {
    let mut registry = NodeRegistry::with_config(
      TrackingMemory::new(),
      RegistryConfig::with_initial_capacity(1)
    ).unwrap();
    registry.create_node().unwrap();

    registry.memory.exhaust();
    let error = registry.create_node().unwrap_err();
    assert_eq!(error, RegistryError::GraphResizeFailure { capacity: 2 });
    assert_eq!(registry.capacity(), 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.next_index(), 1);
    assert!(registry.find_node(0).is_some());
  }

  #[test]
  fn teardown_twice_is_noop() {
    let mut registry = tracked();
    registry.create_node().unwrap();
    registry.teardown();
    assert!(registry.memory().is_balanced());
    assert!(registry.is_torn_down());

    registry.teardown();
    assert!(registry.memory().is_balanced());
    assert_eq!(registry.capacity(), 0);
    assert!(registry.find_node(0).is_none());
    assert_eq!(registry.create_node(), Err(RegistryError::TornDown));
  }

  #[test]
  fn initial_allocation_failure() {
    let result = NodeRegistry::new(TrackingMemory::with_budget(0));
    let requested = RegistryConfig::DEFAULT_INITIAL_CAPACITY * std::mem::size_of::<Node>();
    assert_eq!(result.err(), Some(RegistryError::AllocationFailure { requested }));
  }

  #[test]
  fn oversized_initial_capacity_is_allocation_failure() {
    let result = NodeRegistry::with_config(
      TrackingMemory::new(),
      RegistryConfig::with_initial_capacity(usize::MAX / 2)
    );
    assert_eq!(result.err(), Some(RegistryError::AllocationFailure { requested: usize::MAX }));
  }

  #[test]
  fn exhausted_index_is_refused() {
    let mut registry = tracked();
    registry.create_node().unwrap();
    registry.next_index = u32::MAX;

    assert_eq!(registry.create_node(), Err(RegistryError::IndexExhausted));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.next_index(), u32::MAX);
    // Only the vector and the first node.
    assert_eq!(registry.memory().live_blocks(), 2);
    assert!(registry.find_node(0).is_some());
  }

  /// Counts live blocks in a cell that outlives the registry holding the provider.
  struct SharedCountMemory {
    live: Rc<Cell<usize>>,
  }

  unsafe impl MemoryProvider for SharedCountMemory {
    fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
      let ptr = SystemMemory.allocate(layout)?;
      self.live.set(self.live.get() + 1);
      Some(ptr)
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
      self.live.set(self.live.get() - 1);
      SystemMemory.release(ptr, layout);
    }
  }

  #[test]
  fn drop_tears_down() {
    let live = Rc::new(Cell::new(0));
    {
      let mut registry = NodeRegistry::with_config(
        SharedCountMemory { live: Rc::clone(&live) },
        RegistryConfig::with_initial_capacity(2)
      ).unwrap();
      for _ in 0..5 {
        registry.create_node().unwrap();
      }
      assert_eq!(live.get(), 6);
    }
    assert_eq!(live.get(), 0);
  }

  #[test]
  fn invalid_config_is_rejected() {
    let result = NodeRegistry::with_config(TrackingMemory::new(), RegistryConfig::with_initial_capacity(0));
    assert!(matches!(result, Err(RegistryError::InvalidConfig(_))));
  }
}
