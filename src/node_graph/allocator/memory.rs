/*!

Sources of raw memory for node buffers and node vectors.

`SystemMemory` forwards to the global allocator. `TrackingMemory` does the same but keeps a count of live blocks and
bytes, and can be given a byte budget beyond which it refuses requests. The budget is how exhaustion is exercised in
tests; the live counts are how leaks are detected.

*/

use std::{
  alloc::{alloc, dealloc, Layout},
  ptr::NonNull
};

/// A source of raw, uninitialized memory blocks.
///
/// # Safety
/// A block returned by `allocate` must be valid for reads and writes of `layout.size()` bytes, aligned to
/// `layout.align()`, not aliased by any other live block, and must stay valid until it is passed to `release` on the
/// same provider. Node headers are written straight into these blocks.
///
/// A provider that does not promise this cannot be plugged in:
///
/// ```compile_fail
/// use std::{alloc::Layout, ptr::NonNull};
/// use nodegraph::MemoryProvider;
///
/// struct Undersized;
///
/// impl MemoryProvider for Undersized {
///   fn allocate(&mut self, _layout: Layout) -> Option<NonNull<u8>> { None }
///   unsafe fn release(&mut self, _ptr: NonNull<u8>, _layout: Layout) {}
/// }
/// ```
pub unsafe trait MemoryProvider {
  /// Returns a block satisfying `layout`, or `None` if the request cannot be met. Zero sized layouts are never
  /// requested by this crate.
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>>;

  /// Returns a block to the provider.
  ///
  /// # Safety
  /// `ptr` must have been returned by `allocate` on this same provider with the same `layout`, and must not have been
  /// released already.
  unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout);
}

/// Forwards to the global allocator.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemMemory;

unsafe impl MemoryProvider for SystemMemory {
  #[inline(always)]
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
    debug_assert_ne!(layout.size(), 0);
    NonNull::new(unsafe { alloc(layout) })
  }

  #[inline(always)]
  unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
    dealloc(ptr.as_ptr(), layout);
  }
}

/// A `SystemMemory` that counts what it hands out.
#[derive(Clone, Debug, Default)]
pub struct TrackingMemory {
  budget       : Option<usize>, // Refuse requests that would push live bytes past this
  live_blocks  : usize,
  live_bytes   : usize,
  total_blocks : usize,         // Blocks ever handed out
  refused      : usize,         // Requests turned down
}

impl TrackingMemory {
  pub fn new() -> Self {
    Self::default()
  }

  /// A provider that refuses any request which would bring the live byte count above `budget`.
  pub fn with_budget(budget: usize) -> Self {
    TrackingMemory {
      budget: Some(budget),
      ..Self::default()
    }
  }

  /// Changes the budget. `None` lifts it.
  pub fn set_budget(&mut self, budget: Option<usize>) {
    self.budget = budget;
  }

  /// Caps the budget at exactly the bytes currently live, so the next request of any size is refused.
  pub fn exhaust(&mut self) {
    self.budget = Some(self.live_bytes);
  }

  pub fn live_blocks(&self) -> usize {
    self.live_blocks
  }

  pub fn live_bytes(&self) -> usize {
    self.live_bytes
  }

  pub fn total_blocks(&self) -> usize {
    self.total_blocks
  }

  pub fn refused(&self) -> usize {
    self.refused
  }

  /// True when everything handed out has been returned.
  pub fn is_balanced(&self) -> bool {
    self.live_blocks == 0 && self.live_bytes == 0
  }
}

// Every block comes from `SystemMemory`.
unsafe impl MemoryProvider for TrackingMemory {
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
    if let Some(budget) = self.budget {
      if self.live_bytes + layout.size() > budget {
        self.refused += 1;
        return None;
      }
    }

    let ptr = SystemMemory.allocate(layout)?;
    self.live_blocks  += 1;
    self.live_bytes   += layout.size();
    self.total_blocks += 1;

    Some(ptr)
  }

  unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
    assert!(self.live_blocks > 0, "released more blocks than were allocated");
    self.live_blocks -= 1;
    self.live_bytes  -= layout.size();
    SystemMemory.release(ptr, layout);
  }
}
