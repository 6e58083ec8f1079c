/*!

The fixed header at the front of every node buffer.

| Field            | Type  | Offset |
|:-----------------|:------|:-------|
| `index`          | `u32` | 0      |
| `allocated_size` | `u32` | 4      |
| `used_size`      | `u32` | 8      |
| `channel_count`  | `u16` | 12     |

Fields are stored in native byte order. Nothing after offset 14 is written.

*/

use std::fmt::{Display, Formatter};

pub const INDEX_OFFSET         : usize = 0;
pub const ALLOCATED_SIZE_OFFSET: usize = 4;
pub const USED_SIZE_OFFSET     : usize = 8;
pub const CHANNEL_COUNT_OFFSET : usize = 12;
/// Bytes occupied by an encoded header.
pub const NODE_HEADER_LEN      : usize = 14;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct NodeHeader {
  pub index         : u32,
  pub allocated_size: u32,
  pub used_size     : u32,
  pub channel_count : u16,
}

impl NodeHeader {
  /// Writes the header into the first `NODE_HEADER_LEN` bytes of `out`.
  pub fn encode(&self, out: &mut [u8; NODE_HEADER_LEN]) {
    out[INDEX_OFFSET..INDEX_OFFSET + 4].copy_from_slice(&self.index.to_ne_bytes());
    out[ALLOCATED_SIZE_OFFSET..ALLOCATED_SIZE_OFFSET + 4].copy_from_slice(&self.allocated_size.to_ne_bytes());
    out[USED_SIZE_OFFSET..USED_SIZE_OFFSET + 4].copy_from_slice(&self.used_size.to_ne_bytes());
    out[CHANNEL_COUNT_OFFSET..CHANNEL_COUNT_OFFSET + 2].copy_from_slice(&self.channel_count.to_ne_bytes());
  }

  pub fn decode(bytes: &[u8; NODE_HEADER_LEN]) -> Self {
    NodeHeader {
      index         : read_u32(bytes, INDEX_OFFSET),
      allocated_size: read_u32(bytes, ALLOCATED_SIZE_OFFSET),
      used_size     : read_u32(bytes, USED_SIZE_OFFSET),
      channel_count : u16::from_ne_bytes([bytes[CHANNEL_COUNT_OFFSET], bytes[CHANNEL_COUNT_OFFSET + 1]]),
    }
  }

  /// Only the `index` field, which is all a lookup needs.
  #[inline(always)]
  pub fn decode_index(bytes: &[u8; 4]) -> u32 {
    u32::from_ne_bytes(*bytes)
  }
}

#[inline(always)]
fn read_u32(bytes: &[u8; NODE_HEADER_LEN], offset: usize) -> u32 {
  u32::from_ne_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

impl Display for NodeHeader {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "node<{}; {}/{} bytes, {} channels>",
      self.index,
      self.used_size,
      self.allocated_size,
      self.channel_count
    )
  }
}
