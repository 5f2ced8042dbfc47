//! On-page arena layout.
//!
//! An arena is exactly one page, allocated on a page boundary. The header at
//! offset 0 serves the whole page; slots carry no per-object bookkeeping
//! word. Masking any slot pointer with the page mask recovers the header in
//! constant time, which is what makes deallocation O(1).

use core::ptr;

/// Identifies a page as a pool arena. Must stay bytewise distinct from
/// `dispatch::MALLOC_TAG`; deallocation tells the two ownership kinds apart
/// by comparing these bytes.
pub const POOL_TAG: [u8; 8] = *b"__pool_\0";

/// A free slot, reinterpreted as a link in its arena's free list. Live
/// slots hold user bytes and carry no interpretation.
#[repr(C)]
pub struct FreeNode {
    pub next: *mut FreeNode,
}

/// Arena header. 48 bytes on 64-bit, so the first slot always begins past
/// the 16-byte window that deallocation inspects below a user pointer.
#[repr(C)]
pub struct PoolHeader {
    /// Arena identity tag; never equal to the malloc sentinel.
    pub tag: [u8; 8],
    /// Slots currently handed out from this arena.
    pub occupied_slots: usize,
    /// The size class this arena serves.
    pub slot_size: usize,
    /// Head of the free list threaded through this arena's unused slots,
    /// null when the arena is full.
    pub free_head: *mut FreeNode,
    /// Intrusive links for the owning pool's not-full index.
    pub next_free: *mut PoolHeader,
    pub prev_free: *mut PoolHeader,
}

// The sentinel comparison window must fall inside the header.
const _: () = assert!(core::mem::size_of::<PoolHeader>() > 16);

impl PoolHeader {
    /// Recover the owning arena of a pool pointer via the page mask.
    #[inline]
    pub fn of(ptr: *mut u8) -> *mut PoolHeader {
        (ptr as usize & crate::util::page_mask()) as *mut PoolHeader
    }

    #[inline]
    pub fn has_pool_tag(&self) -> bool {
        self.tag == POOL_TAG
    }
}

/// Write a fresh header at `page` and chain every slot into the free list:
/// slot i links to slot i+1, the last slot terminates the list, and the
/// head points at slot 0.
///
/// # Safety
/// `page` must be a writable page-aligned page and the geometry must
/// describe a layout that fits in it.
pub unsafe fn format(page: *mut u8, slot_size: usize, first_slot_offset: usize, capacity: usize) {
    let mut slot = page.add(first_slot_offset);
    let free_head = slot as *mut FreeNode;
    for _ in 1..capacity {
        let next = slot.add(slot_size);
        (*(slot as *mut FreeNode)).next = next as *mut FreeNode;
        slot = next;
    }
    (*(slot as *mut FreeNode)).next = ptr::null_mut();

    let header = page as *mut PoolHeader;
    header.write(PoolHeader {
        tag: POOL_TAG,
        occupied_slots: 0,
        slot_size,
        free_head,
        next_free: ptr::null_mut(),
        prev_free: ptr::null_mut(),
    });
}
