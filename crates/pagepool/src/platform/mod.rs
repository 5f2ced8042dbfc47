#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub use linux as sys;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos as sys;

use crate::util::page_size;

/// Obtain one page, aligned to the page size. Returns null on failure.
/// Alignment is what the pool layout depends on: masking any slot pointer
/// recovers the page base.
#[inline]
pub fn page_alloc() -> *mut u8 {
    unsafe { sys::map_page(page_size()) }
}

/// Return a page to the system.
///
/// # Safety
/// `page` must have been returned by `page_alloc` and must not be touched
/// again afterwards.
#[inline]
pub unsafe fn page_free(page: *mut u8) {
    sys::unmap_page(page, page_size());
}

/// Large-size fallback: the system heap.
#[inline]
pub fn heap_alloc(bytes: usize) -> *mut u8 {
    unsafe { sys::heap_alloc(bytes) }
}

/// # Safety
/// `ptr` must have been returned by `heap_alloc`.
#[inline]
pub unsafe fn heap_free(ptr: *mut u8) {
    sys::heap_free(ptr);
}
