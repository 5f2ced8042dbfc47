//! `#[global_allocator]` support.
//!
//! Allows Rust programs to route their heap through the pools:
//!
//! ```rust,ignore
//! use pagepool::PagePool;
//!
//! #[global_allocator]
//! static GLOBAL: PagePool = PagePool;
//! ```

use crate::dispatch;
use crate::util::MAX_POOL_ALIGN;
use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

/// A zero-sized unit struct that implements [`GlobalAlloc`] by delegating
/// to the dispatcher.
pub struct PagePool;

unsafe impl GlobalAlloc for PagePool {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let size = layout.size();
        let align = layout.align();

        // Zero-size types: return a well-aligned dangling pointer, the
        // standard-library pattern.
        if size == 0 {
            return align as *mut u8;
        }

        if align > MAX_POOL_ALIGN {
            return over_aligned_alloc(size, align);
        }

        dispatch::allocate(size, align)
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.alloc(layout);
        // Recycled slots hold stale bytes, so zero unconditionally; fresh
        // pages are already zero but telling the two apart is not worth it.
        if !ptr.is_null() && layout.size() != 0 {
            ptr::write_bytes(ptr, 0, layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        if layout.align() > MAX_POOL_ALIGN {
            libc::free(ptr as *mut libc::c_void);
            return;
        }
        dispatch::deallocate(ptr);
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // The old allocation being zero-sized makes this a fresh alloc.
        if layout.size() == 0 {
            return self.alloc(Layout::from_size_align_unchecked(new_size, layout.align()));
        }

        // No in-place growth across size classes; allocate, copy, free.
        let new_ptr = self.alloc(Layout::from_size_align_unchecked(new_size, layout.align()));
        if !new_ptr.is_null() {
            ptr::copy_nonoverlapping(ptr, new_ptr, layout.size().min(new_size));
            self.dealloc(ptr, layout);
        }
        new_ptr
    }
}

/// Alignments past the pool maximum never touch the pools or the tagged
/// system path. The Layout comes back at dealloc time, so this path needs
/// no discrimination header.
unsafe fn over_aligned_alloc(size: usize, align: usize) -> *mut u8 {
    let mut out: *mut libc::c_void = ptr::null_mut();
    let err = libc::posix_memalign(&mut out, align, size);
    if err != 0 {
        ptr::null_mut()
    } else {
        out as *mut u8
    }
}
