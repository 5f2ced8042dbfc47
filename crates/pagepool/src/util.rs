use core::sync::atomic::{AtomicUsize, Ordering};

/// Align `value` up to the next multiple of `align`.
/// `align` must be a power of two.
#[inline(always)]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Check if `value` is aligned to `align`.
#[inline(always)]
pub const fn is_aligned(value: usize, align: usize) -> bool {
    value & (align - 1) == 0
}

/// One pool word. Size classes advance in steps of this.
pub const WORD: usize = core::mem::size_of::<*mut u8>();

/// Largest request served from a pool. malloc performs equally well on
/// objects above this size.
pub const POOL_THRESHOLD: usize = 128;

/// Largest alignment the pool classes can guarantee: classes divisible by
/// 16 hold 16-byte aligned slots, the rest are word-aligned.
pub const MAX_POOL_ALIGN: usize = 16;

/// Cached result of sysconf(_SC_PAGESIZE). 0 = not queried yet.
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// The platform page size. A power of two, constant for process lifetime.
#[inline]
pub fn page_size() -> usize {
    let cached = PAGE_SIZE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }
    query_page_size()
}

#[cold]
fn query_page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    debug_assert!(size.is_power_of_two());
    PAGE_SIZE.store(size, Ordering::Relaxed);
    size
}

/// Mask that truncates any in-page address to its page base.
#[inline]
pub fn page_mask() -> usize {
    !(page_size() - 1)
}
