//! A single-size-class pool: an intrusive free list threaded through the
//! unused slots of one or more page arenas, plus an index of arenas that
//! still have room.

use crate::platform;
use crate::pool::arena::{self, FreeNode, PoolHeader};
use crate::sync::Mutex;
use crate::util::{align_up, page_size, MAX_POOL_ALIGN, WORD};
use core::mem;
use core::ptr;

/// Mutable pool state, all of it behind the pool's one mutex.
struct PoolState {
    /// Intrusive doubly-linked list of arenas with at least one free slot.
    /// An arena is linked iff `occupied_slots < capacity`.
    not_full_head: *mut PoolHeader,
    /// Arena touched most recently; skips the index walk on the hot path.
    /// When set, it has a free slot.
    cached: *mut PoolHeader,
    /// Live arenas, full ones included.
    arenas: usize,
}

// Arena pointers are owned by the pool and only dereferenced under the lock.
unsafe impl Send for PoolState {}

/// Pool allocator for one size class. Allocation and deallocation are O(1);
/// a page whose last slot is returned goes back to the system.
pub struct LinkedPool {
    slot_size: usize,
    capacity: usize,
    first_slot_offset: usize,
    state: Mutex<PoolState>,
}

impl LinkedPool {
    /// Build a pool serving `stride`-byte slots.
    ///
    /// The slot size is at least one free-list link and is rounded to the
    /// slot alignment: 16 for strides divisible by 16, the word size
    /// otherwise. The first slot starts past the header at that same
    /// alignment.
    pub fn new(stride: usize) -> LinkedPool {
        let slot_align = if stride % MAX_POOL_ALIGN == 0 {
            MAX_POOL_ALIGN
        } else {
            WORD
        };
        let slot_size = align_up(stride.max(mem::size_of::<FreeNode>()), slot_align);
        let first_slot_offset = align_up(mem::size_of::<PoolHeader>(), slot_align);
        let capacity = (page_size() - first_slot_offset) / slot_size;
        debug_assert!(capacity >= 1, "stride {stride} is not pool-eligible");
        LinkedPool {
            slot_size,
            capacity,
            first_slot_offset,
            state: Mutex::new(PoolState {
                not_full_head: ptr::null_mut(),
                cached: ptr::null_mut(),
                arenas: 0,
            }),
        }
    }

    /// Slots one arena holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Byte offset of slot 0 from the arena base.
    #[inline]
    pub fn first_slot_offset(&self) -> usize {
        self.first_slot_offset
    }

    /// Number of live arenas, full ones included.
    pub fn arena_count(&self) -> usize {
        self.state.lock().arenas
    }

    /// Hand out one slot. Returns null only when the system is out of pages.
    pub fn allocate(&self) -> *mut u8 {
        let mut st = self.state.lock();
        if !st.cached.is_null() {
            let arena = st.cached;
            return unsafe { self.take_slot(&mut st, arena) };
        }
        if !st.not_full_head.is_null() {
            let arena = st.not_full_head;
            st.cached = arena;
            return unsafe { self.take_slot(&mut st, arena) };
        }
        // No free slot anywhere: map a fresh arena. The page call happens
        // under the lock, which is brief and spares a test-and-install
        // dance between racing threads.
        let page = platform::page_alloc();
        if page.is_null() {
            return ptr::null_mut();
        }
        unsafe {
            arena::format(page, self.slot_size, self.first_slot_offset, self.capacity);
            let new_arena = page as *mut PoolHeader;
            push_not_full(&mut st, new_arena);
            st.cached = new_arena;
            st.arenas += 1;
            self.take_slot(&mut st, new_arena)
        }
    }

    /// Pop the head of `arena`'s free list. Caller holds the lock and
    /// `arena` has at least one free slot.
    unsafe fn take_slot(&self, st: &mut PoolState, arena: *mut PoolHeader) -> *mut u8 {
        let header = &mut *arena;
        let slot = header.free_head;
        debug_assert!(!slot.is_null());
        header.free_head = (*slot).next;
        header.occupied_slots += 1;
        if header.occupied_slots == self.capacity {
            unlink_not_full(st, arena);
            st.cached = st.not_full_head;
        }
        slot as *mut u8
    }

    /// Return `ptr`'s slot to its arena. An arena whose last outstanding
    /// slot comes back is released to the system.
    ///
    /// # Safety
    /// `ptr` must have been returned by this pool's `allocate` and not yet
    /// deallocated.
    pub unsafe fn deallocate(&self, ptr: *mut u8) {
        let arena = PoolHeader::of(ptr);
        let mut st = self.state.lock();
        let header = &mut *arena;
        debug_assert!(header.has_pool_tag());
        debug_assert_eq!(header.slot_size, self.slot_size);

        if header.occupied_slots == 1 {
            // Last slot came back: the whole page is free again.
            if self.capacity > 1 {
                // A capacity-1 arena is full at occupancy 1 and not linked.
                unlink_not_full(&mut st, arena);
            }
            st.arenas -= 1;
            platform::page_free(arena as *mut u8);
            st.cached = st.not_full_head;
            return;
        }

        let node = ptr as *mut FreeNode;
        (*node).next = header.free_head;
        header.free_head = node;
        header.occupied_slots -= 1;
        if header.occupied_slots == self.capacity - 1 {
            // The arena just left the full state.
            push_not_full(&mut st, arena);
        }
        st.cached = arena;
    }
}

unsafe fn push_not_full(st: &mut PoolState, arena: *mut PoolHeader) {
    (*arena).prev_free = ptr::null_mut();
    (*arena).next_free = st.not_full_head;
    if !st.not_full_head.is_null() {
        (*st.not_full_head).prev_free = arena;
    }
    st.not_full_head = arena;
}

unsafe fn unlink_not_full(st: &mut PoolState, arena: *mut PoolHeader) {
    let prev = (*arena).prev_free;
    let next = (*arena).next_free;
    if prev.is_null() {
        debug_assert!(st.not_full_head == arena);
        st.not_full_head = next;
    } else {
        (*prev).next_free = next;
    }
    if !next.is_null() {
        (*next).prev_free = prev;
    }
    (*arena).next_free = ptr::null_mut();
    (*arena).prev_free = ptr::null_mut();
}
