/*!

Errors from registry operations. A lookup miss is not an error; `find_node` returns `None`.

*/

use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
  /// The memory provider could not supply a node buffer or the initial node vector.
  #[error("memory allocation failed: {requested} bytes requested")]
  AllocationFailure { requested: usize },

  /// The memory provider could not supply a larger node vector. Capacity and storage are unchanged.
  #[error("graph resize failed: could not grow to {capacity} nodes")]
  GraphResizeFailure { capacity: usize },

  /// Every `u32` index has been handed out. Indices are never reused.
  #[error("node indices exhausted")]
  IndexExhausted,

  #[error("the registry has been torn down")]
  TornDown,

  /// Rejected `RegistryConfig`.
  #[error("invalid registry configuration: {0}")]
  InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
