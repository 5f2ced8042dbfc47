//! The process-wide pool vector: one `LinkedPool` per word-multiple size
//! class up to the threshold, each built on first use.

use crate::pool::linked_pool::LinkedPool;
use crate::sync::RawMutex;
use crate::util::{POOL_THRESHOLD, WORD};
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicBool, Ordering};

/// Number of size classes: sizeof(pointer), 2x, ... up to the threshold.
pub const NUM_CLASSES: usize = POOL_THRESHOLD / WORD;

/// Index of the class pool serving a rounded `size`.
/// `size` must be a positive word multiple no larger than the threshold.
#[inline]
pub fn class_index(size: usize) -> usize {
    debug_assert!(size > 0 && size <= POOL_THRESHOLD && size % WORD == 0);
    size / WORD - 1
}

pub struct GlobalPools {
    pools: [UnsafeCell<MaybeUninit<LinkedPool>>; NUM_CLASSES],
    ready: [AtomicBool; NUM_CLASSES],
    build_lock: RawMutex,
}

// Slots are written once under build_lock and read-only afterwards;
// LinkedPool itself is Sync.
unsafe impl Sync for GlobalPools {}

impl GlobalPools {
    const fn new() -> GlobalPools {
        const EMPTY_SLOT: UnsafeCell<MaybeUninit<LinkedPool>> =
            UnsafeCell::new(MaybeUninit::uninit());
        const NOT_READY: AtomicBool = AtomicBool::new(false);
        GlobalPools {
            pools: [EMPTY_SLOT; NUM_CLASSES],
            ready: [NOT_READY; NUM_CLASSES],
            build_lock: RawMutex::new(),
        }
    }

    /// Pool for a rounded `size`, constructing it on first use.
    pub fn get(&self, size: usize) -> &LinkedPool {
        let index = class_index(size);
        if self.ready[index].load(Ordering::Acquire) {
            return unsafe { (*self.pools[index].get()).assume_init_ref() };
        }
        self.build(index, size)
    }

    #[cold]
    fn build(&self, index: usize, size: usize) -> &LinkedPool {
        self.build_lock.lock();
        if !self.ready[index].load(Ordering::Relaxed) {
            unsafe {
                (*self.pools[index].get()).write(LinkedPool::new(size));
            }
            self.ready[index].store(true, Ordering::Release);
        }
        self.build_lock.unlock();
        unsafe { (*self.pools[index].get()).assume_init_ref() }
    }
}

/// The singleton. A static never runs destructors, so the pools outlive
/// every allocation made through the dispatcher.
static POOLS: GlobalPools = GlobalPools::new();

#[inline]
pub fn global() -> &'static GlobalPools {
    &POOLS
}
