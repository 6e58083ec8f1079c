/*!

A `Node` is a node buffer whose header has been stamped. Only the header bytes are ever initialized; the rest of the
block is reserved for channel data that is not modeled. Reads go through the header bytes alone, so a `Node` is always
safe to inspect.

*/

use std::{
  fmt::{Display, Formatter},
  ptr::copy_nonoverlapping
};

use crate::node_graph::{
  allocator::NodeBuffer,
  header::{NodeHeader, INDEX_OFFSET, NODE_HEADER_LEN}
};

/// What `find_node` hands out. The registry keeps ownership.
pub type NodeRef<'a> = &'a Node;

#[derive(Debug)]
pub struct Node {
  buffer: NodeBuffer,
}

impl Node {
  /// Writes `header` into the front of `buffer`. The buffer must have room for `NODE_HEADER_LEN` bytes.
  pub(crate) fn stamp(buffer: NodeBuffer, header: NodeHeader) -> Node {
    assert!(
      buffer.capacity() as usize >= NODE_HEADER_LEN,
      "node buffer of {} bytes cannot hold a header",
      buffer.capacity()
    );

    let mut bytes = [0u8; NODE_HEADER_LEN];
    header.encode(&mut bytes);
    unsafe {
      copy_nonoverlapping(bytes.as_ptr(), buffer.as_ptr(), NODE_HEADER_LEN);
    }

    Node { buffer }
  }

  /// Gives the buffer back so it can be released.
  pub(crate) fn into_buffer(self) -> NodeBuffer {
    self.buffer
  }

  // region Accessors

  #[inline(always)]
  pub fn index(&self) -> u32 {
    let mut bytes = [0u8; 4];
    unsafe {
      copy_nonoverlapping(self.buffer.as_ptr().add(INDEX_OFFSET), bytes.as_mut_ptr(), 4);
    }
    NodeHeader::decode_index(&bytes)
  }

  pub fn header(&self) -> NodeHeader {
    let mut bytes = [0u8; NODE_HEADER_LEN];
    unsafe {
      copy_nonoverlapping(self.buffer.as_ptr(), bytes.as_mut_ptr(), NODE_HEADER_LEN);
    }
    NodeHeader::decode(&bytes)
  }

  #[inline(always)]
  pub fn allocated_size(&self) -> u32 {
    self.header().allocated_size
  }

  #[inline(always)]
  pub fn used_size(&self) -> u32 {
    self.header().used_size
  }

  #[inline(always)]
  pub fn channel_count(&self) -> u16 {
    self.header().channel_count
  }

  /// Size of the block actually backing this node.
  #[inline(always)]
  pub fn capacity(&self) -> u32 {
    self.buffer.capacity()
  }

  // endregion Accessors
}

impl Display for Node {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.header())
  }
}
