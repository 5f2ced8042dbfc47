//! Request routing: the size-class threshold, the malloc-vs-pool tag, and
//! the alignment bump that keeps every request in a class that can hold it.

use crate::init;
use crate::platform;
use crate::pool::arena::PoolHeader;
use crate::pool::global;
use crate::util::{MAX_POOL_ALIGN, POOL_THRESHOLD, WORD};
use core::mem;
use core::ptr;

/// Sentinel written at the head of every system-allocator block. Chosen to
/// never equal the first bytes of `arena::POOL_TAG`; deallocation depends
/// on the two staying bytewise disjoint.
pub const MALLOC_TAG: [u8; 15] = *b"IsThIsMaLlOcD!\0";

/// 16-byte prefix carried by every system-path allocation. The user pointer
/// is the address immediately after it.
#[repr(C)]
pub struct MallocHeader {
    tag: [u8; 15],
    _pad: u8,
}

const HEADER_SIZE: usize = mem::size_of::<MallocHeader>();

const _: () = assert!(HEADER_SIZE == 16);

/// Round `size` up to the word multiple the pools are indexed by.
/// Zero-byte requests occupy one word.
#[inline]
fn round_to_class(size: usize) -> usize {
    if size == 0 {
        return WORD;
    }
    (size + WORD - 1) & !(WORD - 1)
}

/// Bump a rounded size into the next class when its own class cannot hold
/// `align`-aligned slots. Classes divisible by 16 hold 16-byte aligned
/// slots, so one extra word is always enough for alignments up to 16.
#[inline]
fn bump_for_align(size: usize, align: usize) -> usize {
    if size % align == 0 {
        size
    } else {
        size + WORD
    }
}

/// Non-throwing allocation entry. `align` must be a power of two no larger
/// than 16; the pool classes cannot represent more, so callers needing a
/// larger alignment go around the dispatcher. Returns null on OutOfMemory.
pub fn allocate(size: usize, align: usize) -> *mut u8 {
    debug_assert!(align.is_power_of_two() && align <= MAX_POOL_ALIGN);
    init::ensure_initialized();
    if size > POOL_THRESHOLD || init::pools_disabled() {
        return system_allocate(size);
    }
    let class = bump_for_align(round_to_class(size), align);
    global::global().get(class).allocate()
}

/// Throwing allocation entry: aborts the process on OutOfMemory instead of
/// returning null.
pub fn allocate_or_abort(size: usize, align: usize) -> *mut u8 {
    let ptr = allocate(size, align);
    if ptr.is_null() {
        oom_abort();
    }
    ptr
}

/// System path: 16 extra prefix bytes tag the block as malloc-owned.
fn system_allocate(size: usize) -> *mut u8 {
    let raw = platform::heap_alloc(size + HEADER_SIZE);
    if raw.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        let header = raw as *mut MallocHeader;
        (*header).tag = MALLOC_TAG;
        (*header)._pad = 0;
        raw.add(HEADER_SIZE)
    }
}

/// Release `ptr`, whichever path produced it, in O(1): the 16 bytes in
/// front of a system pointer carry the malloc sentinel, while for a pool
/// pointer they fall inside the arena header, which never does.
///
/// # Safety
/// `ptr` must be non-null, previously returned by `allocate` or
/// `allocate_or_abort`, and not yet deallocated. Nothing beyond the
/// sentinel bytes is validated.
pub unsafe fn deallocate(ptr: *mut u8) {
    let raw = ptr.sub(HEADER_SIZE);
    let header = raw as *const MallocHeader;
    if (*header).tag == MALLOC_TAG {
        platform::heap_free(raw);
        return;
    }
    let arena = PoolHeader::of(ptr);
    debug_assert!((*arena).has_pool_tag());
    global::global().get((*arena).slot_size).deallocate(ptr);
}

/// BadAlloc-class failure: diagnostic straight to fd 2, then abort. The
/// allocator cannot unwind across its C entry points.
#[cold]
#[inline(never)]
pub fn oom_abort() -> ! {
    let msg = "pagepool: out of memory\n";
    unsafe {
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
        libc::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_snaps_to_word_multiples() {
        assert_eq!(round_to_class(0), WORD);
        assert_eq!(round_to_class(1), WORD);
        assert_eq!(round_to_class(WORD), WORD);
        assert_eq!(round_to_class(WORD + 1), 2 * WORD);
        assert_eq!(round_to_class(127), 128);
        assert_eq!(round_to_class(128), 128);
    }

    #[test]
    fn alignment_bump_lands_in_an_aligned_class() {
        // 24 is already a multiple of 8
        assert_eq!(bump_for_align(24, 8), 24);
        // 40 % 16 != 0, the 48 class is 16-byte aligned
        assert_eq!(bump_for_align(40, 16), 48);
        assert_eq!(bump_for_align(48, 16), 48);
        // the bump never leaves the threshold for align <= 16
        assert_eq!(bump_for_align(120, 16), 128);
        for size in (WORD..=POOL_THRESHOLD).step_by(WORD) {
            for align in [1usize, 2, 4, 8, 16] {
                let bumped = bump_for_align(size, align);
                assert_eq!(bumped % align, 0);
                assert!(bumped <= POOL_THRESHOLD);
            }
        }
    }

    #[test]
    fn tags_are_bytewise_disjoint() {
        let pool_tag = crate::pool::arena::POOL_TAG;
        assert_ne!(&MALLOC_TAG[..8], &pool_tag[..]);
        // they differ at byte 0 already, which the comparison hits first
        assert_ne!(MALLOC_TAG[0], pool_tag[0]);
    }
}
