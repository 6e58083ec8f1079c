/*!

A vector of nodes whose storage comes from a `MemoryProvider`.

The vector never grows on its own. `push` fails when the vector is full, and the owner decides when to `reallocate`.
Reallocation either fully succeeds, moving every node into the new block and releasing the old one, or changes nothing.
The vector does not release its storage on drop since it does not hold its provider; `release` must be called.

Every method taking a provider must be handed the one the vector was built with. Only the registry, which owns both,
builds these vectors.

*/

use std::{
  alloc::Layout,
  ops::Index,
  ptr::{self, NonNull}
};

use crate::node_graph::{
  allocator::{self, MemoryProvider},
  node::Node
};

pub(crate) struct NodeVector {
  length  : usize,
  capacity: usize,
  data    : Option<NonNull<Node>>, // `None` exactly when `capacity == 0`
}

// Owns its storage and the nodes in it outright.
unsafe impl Send for NodeVector {}

impl NodeVector {

  // region Constructors

  /// A vector with no storage. Pushing to it always fails.
  pub(crate) const fn empty() -> NodeVector {
    NodeVector {
      length  : 0,
      capacity: 0,
      data    : None,
    }
  }

  /// Creates a new empty vector with room for `capacity` nodes, or `None` if the provider cannot supply the storage.
  pub(crate) fn with_capacity<M: MemoryProvider + ?Sized>(memory: &mut M, capacity: usize) -> Option<NodeVector> {
    if capacity == 0 {
      return Some(NodeVector::empty());
    }

    let data = memory.allocate(Layout::array::<Node>(capacity).ok()?)?;
    Some(NodeVector {
      length: 0,
      capacity,
      data: Some(data.cast::<Node>()),
    })
  }

  // endregion Constructors

  pub(crate) fn len(&self) -> usize {
    self.length
  }

  pub(crate) fn capacity(&self) -> usize {
    self.capacity
  }

  pub(crate) fn is_empty(&self) -> bool { self.len() == 0 }

  pub(crate) fn is_full(&self) -> bool { self.length >= self.capacity }

  pub(crate) fn iter(&self) -> std::slice::Iter<'_, Node> {
    self.as_slice().iter()
  }

  fn as_slice(&self) -> &[Node] {
    match self.data {
      Some(data) => unsafe { std::slice::from_raw_parts(data.as_ptr(), self.length) },
      None       => &[],
    }
  }

  /// Pushes `node` onto the end of the vector if there is enough capacity. When full, the node is handed back.
  pub(crate) fn push(&mut self, node: Node) -> Result<(), Node> {
    match self.data {
      Some(data) if self.length < self.capacity => {
        unsafe { data.as_ptr().add(self.length).write(node); }
        self.length += 1;
        Ok(())
      }
      _ => Err(node),
    }
  }

  /// Moves the contents into fresh storage of `new_capacity` nodes. On failure the vector is untouched and `false`
  /// is returned. `new_capacity` must be at least `len()`.
  pub(crate) fn reallocate<M: MemoryProvider + ?Sized>(&mut self, memory: &mut M, new_capacity: usize) -> bool {
    assert!(new_capacity >= self.length, "reallocation would drop nodes");

    let Some(mut replacement) = NodeVector::with_capacity(memory, new_capacity) else {
      return false;
    };

    if let (Some(old), Some(new)) = (self.data, replacement.data) {
      unsafe { ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), self.length); }
    }
    replacement.length = self.length;

    // The nodes now live in `replacement`; only the old block itself remains to be returned.
    self.length = 0;
    self.release_storage(memory);
    *self = replacement;

    true
  }

  /// Releases every node's buffer, then the vector's own storage. The vector is left empty with no storage.
  pub(crate) fn release<M: MemoryProvider + ?Sized>(&mut self, memory: &mut M) {
    if let Some(data) = self.data {
      for i in 0..self.length {
        unsafe {
          let node = ptr::read(data.as_ptr().add(i));
          allocator::release(memory, node.into_buffer());
        }
      }
    }
    self.length = 0;
    self.release_storage(memory);
  }

  fn release_storage<M: MemoryProvider + ?Sized>(&mut self, memory: &mut M) {
    debug_assert_eq!(self.length, 0);
    if let Some(data) = self.data.take() {
      if let Ok(layout) = Layout::array::<Node>(self.capacity) {
        unsafe { memory.release(data.cast::<u8>(), layout); }
      }
    }
    self.capacity = 0;
  }
}

impl Index<usize> for NodeVector {
  type Output = Node;

  fn index(&self, index: usize) -> &Self::Output {
    &self.as_slice()[index]
  }
}

impl<'a> IntoIterator for &'a NodeVector {
  type Item = &'a Node;
  type IntoIter = std::slice::Iter<'a, Node>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node_graph::{
    allocator::{allocate, TrackingMemory},
    header::NodeHeader
  };

  fn make_node(memory: &mut TrackingMemory, index: u32) -> Node {
    let buffer = allocate(memory, 16).unwrap();
    Node::stamp(buffer, NodeHeader { index, allocated_size: 16, used_size: 14, channel_count: 0 })
  }

  #[test]
  fn push_until_full() {
    let mut memory = TrackingMemory::new();
    let mut vector = NodeVector::with_capacity(&mut memory, 2).unwrap();

    for i in 0..2 {
      let node = make_node(&mut memory, i);
      assert!(vector.push(node).is_ok());
    }
    assert!(vector.is_full());

    let extra = make_node(&mut memory, 2);
    let extra = vector.push(extra).unwrap_err();
    assert_eq!(extra.index(), 2);
    unsafe { allocator::release(&mut memory, extra.into_buffer()); }

    vector.release(&mut memory);
    assert!(memory.is_balanced());
  }

  #[test]
  fn reallocate_preserves_nodes() {
    let mut memory = TrackingMemory::new();
    let mut vector = NodeVector::with_capacity(&mut memory, 3).unwrap();
    for i in 0..3 {
      let node = make_node(&mut memory, i);
      vector.push(node).unwrap();
    }

    assert!(vector.reallocate(&mut memory, 6));
    assert_eq!(vector.capacity(), 6);
    assert_eq!(vector.len(), 3);
    let indices: Vec<u32> = vector.iter().map(Node::index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(vector[1].index(), 1);

    vector.release(&mut memory);
    assert!(memory.is_balanced());
  }

  #[test]
  fn failed_reallocate_changes_nothing() {
    let mut memory = TrackingMemory::new();
    let mut vector = NodeVector::with_capacity(&mut memory, 1).unwrap();
    let node = make_node(&mut memory, 0);
    vector.push(node).unwrap();

    memory.exhaust();
    assert!(!vector.reallocate(&mut memory, 2));
    assert_eq!(vector.capacity(), 1);
    assert_eq!(vector.len(), 1);
    assert_eq!(vector.iter().next().map(Node::index), Some(0));

    vector.release(&mut memory);
    assert!(memory.is_balanced());
  }

  #[test]
  fn empty_vector_has_no_storage() {
    let mut memory = TrackingMemory::new();
    let mut vector = NodeVector::with_capacity(&mut memory, 0).unwrap();
    assert_eq!(memory.total_blocks(), 0);
    assert!(vector.is_full());
    assert!(vector.iter().next().is_none());
    vector.release(&mut memory);
    assert!(memory.is_balanced());
  }
}
