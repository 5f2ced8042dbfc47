use core::ptr;

/// Map one anonymous read-write page. mmap results sit on page boundaries.
///
/// # Safety
/// `size` must be the page size.
pub unsafe fn map_page(size: usize) -> *mut u8 {
    let result = libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
    );
    if result == libc::MAP_FAILED {
        ptr::null_mut()
    } else {
        result as *mut u8
    }
}

/// # Safety
/// `page` must have been returned by `map_page` with the same `size`.
pub unsafe fn unmap_page(page: *mut u8, size: usize) {
    libc::munmap(page as *mut libc::c_void, size);
}

/// # Safety
/// Thin wrapper over malloc; always safe to call, null on failure.
pub unsafe fn heap_alloc(bytes: usize) -> *mut u8 {
    libc::malloc(bytes) as *mut u8
}

/// # Safety
/// `ptr` must have been returned by `heap_alloc`.
pub unsafe fn heap_free(ptr: *mut u8) {
    libc::free(ptr as *mut libc::c_void);
}
