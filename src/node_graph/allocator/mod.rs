/*!
The allocator for node buffers.

Every node buffer is a raw block whose size is the requested size rounded up to the next power of two. The allocator
itself keeps no state: it rounds, asks a `MemoryProvider` for exactly that many bytes, and hands the uninitialized block
to the caller, who owns it from then on. A block goes back to the same provider through `release`, which consumes the
`NodeBuffer` so it cannot be returned twice.

*/

mod memory;
pub(crate) mod node_vector;

use std::{
  alloc::Layout,
  ptr::NonNull
};

pub use memory::{MemoryProvider, SystemMemory, TrackingMemory};

/// Alignment of node buffers, enough for the `u32` header fields.
pub(crate) const NODE_ALIGN: usize = 4;

/// Rounds `n` up to a power of two by smearing the highest set bit of `n - 1` into every lower bit.
///
/// Powers of two map to themselves. The result wraps to 0 for `n == 0` and for `n > 2^31`, neither of which has a
/// 32-bit answer.
#[inline(always)]
pub const fn next_power_of_two(n: u32) -> u32 {
  let mut n = n.wrapping_sub(1);
  n |= n >> 1;
  n |= n >> 2;
  n |= n >> 4;
  n |= n >> 8;
  n |= n >> 16;
  n.wrapping_add(1)
}

/// An uninitialized, exclusively owned block from the node allocator. Its capacity is always a power of two.
#[must_use = "a NodeBuffer leaks unless it is released to the provider it came from"]
#[derive(Debug)]
pub struct NodeBuffer {
  ptr     : NonNull<u8>,
  capacity: u32,
  layout  : Layout,
}

// The block is exclusively owned, so it may move between threads with its owner.
unsafe impl Send for NodeBuffer {}

impl NodeBuffer {
  #[inline(always)]
  pub fn capacity(&self) -> u32 {
    self.capacity
  }

  #[inline(always)]
  pub(crate) fn as_ptr(&self) -> *mut u8 {
    self.ptr.as_ptr()
  }
}

/// Allocates a buffer of `next_power_of_two(requested_size)` bytes.
///
/// Returns `None` for a zero request, for a request with no 32-bit power of two above it, and when the provider cannot
/// supply the block.
pub fn allocate<M: MemoryProvider + ?Sized>(memory: &mut M, requested_size: u32) -> Option<NodeBuffer> {
  if requested_size == 0 {
    return None;
  }

  let capacity = next_power_of_two(requested_size);
  if capacity == 0 {
    return None;
  }

  let layout = Layout::from_size_align(capacity as usize, NODE_ALIGN).ok()?;
  let ptr    = memory.allocate(layout)?;
  Some(NodeBuffer { ptr, capacity, layout })
}

/// Returns `buffer` to `memory`.
///
/// # Safety
/// `memory` must be the provider `buffer` was allocated from. Releasing through any other provider is rejected at
/// compile time unless the caller takes this on:
///
/// ```compile_fail
/// use nodegraph::node_graph::{allocate, release, SystemMemory, TrackingMemory};
///
/// let mut tracking = TrackingMemory::new();
/// let buffer = allocate(&mut tracking, 16).unwrap();
/// release(&mut SystemMemory, buffer);
/// ```
pub unsafe fn release<M: MemoryProvider + ?Sized>(memory: &mut M, buffer: NodeBuffer) {
  memory.release(buffer.ptr, buffer.layout);
}
