/*!

Nodes are raw, power-of-two sized byte blocks with a packed header at the front. The registry owns all of them, grows
the vector that holds them by doubling, and finds them by a linear scan over their stamped indices.

| Piece          | Role                                                              |
|:---------------|:------------------------------------------------------------------|
| `allocator`    | Rounds requests to a power of two and gets blocks from a provider |
| `header`       | Byte layout of the header and its encoder                         |
| `node`         | A stamped buffer                                                  |
| `node_vector`  | Provider-backed vector of nodes with all-or-nothing reallocation  |
| `registry`     | Creation, lookup and teardown                                     |
| `shared`       | One registry behind a mutex for multi-threaded callers            |

*/

pub mod allocator;
pub mod header;
pub mod node;
pub mod registry;
pub mod shared;

pub use allocator::{
  allocate,
  next_power_of_two,
  release,
  MemoryProvider,
  NodeBuffer,
  SystemMemory,
  TrackingMemory
};
pub use header::{NodeHeader, NODE_HEADER_LEN};
pub use node::{Node, NodeRef};
pub use registry::{NodeRegistry, RegistryState};
pub use shared::{acquire_registry, RegistryGuard};
