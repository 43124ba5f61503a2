//! Page-aligned host buffers.
//!
//! The DMA engine moves whole descriptors between host and card; transfers
//! that do not start on a 4096-byte boundary fall back to a slow path (or are
//! rejected outright, depending on the shell). Every buffer handed to a
//! backend comes from here.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

pub const ALIGN: usize = 4096;

/// Heap slice of u32 words on a 4096-byte boundary.
pub struct AlignedWords {
    ptr: NonNull<u32>,
    len: usize,
}

impl AlignedWords {
    /// Allocate `len` zeroed words.
    pub fn zeroed(len: usize) -> Self {
        if len == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len: 0,
            };
        }
        let layout = Self::layout(len);
        // SAFETY: layout has nonzero size.
        let raw = unsafe { alloc_zeroed(layout) }.cast::<u32>();
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self { ptr, len }
    }

    fn layout(len: usize) -> Layout {
        match Layout::array::<u32>(len).and_then(|l| l.align_to(ALIGN)) {
            Ok(layout) => layout,
            Err(_) => panic!("aligned buffer of {len} words exceeds address space"),
        }
    }
}

impl Deref for AlignedWords {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        // SAFETY: ptr/len describe our allocation (or a dangling empty slice).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedWords {
    fn deref_mut(&mut self) -> &mut [u32] {
        // SAFETY: as above, and &mut self gives exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedWords {
    fn drop(&mut self) {
        if self.len != 0 {
            // SAFETY: same layout the allocation was made with.
            unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), Self::layout(self.len)) }
        }
    }
}

impl fmt::Debug for AlignedWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SAFETY: AlignedWords uniquely owns its allocation of plain u32s.
unsafe impl Send for AlignedWords {}
unsafe impl Sync for AlignedWords {}
