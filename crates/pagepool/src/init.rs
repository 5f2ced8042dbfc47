use crate::config;
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const DISABLED: u8 = 3;

static INIT_STATE: AtomicU8 = AtomicU8::new(UNINIT);

/// One-time init: reads the env config and publishes the final state.
/// There is no static constructor; the allocator is entered explicitly, so
/// first use is early enough.
#[inline]
pub fn ensure_initialized() {
    if INIT_STATE.load(Ordering::Acquire) >= READY {
        return;
    }
    initialize();
}

#[cold]
#[inline(never)]
fn initialize() {
    match INIT_STATE.compare_exchange(UNINIT, INITIALIZING, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {}
        Err(INITIALIZING) => {
            // Another thread is initializing; wait for it to publish.
            while INIT_STATE.load(Ordering::Acquire) == INITIALIZING {
                core::hint::spin_loop();
            }
            return;
        }
        Err(_) => return,
    }

    unsafe { config::read_config() };

    let state = if config::is_disabled() { DISABLED } else { READY };
    INIT_STATE.store(state, Ordering::Release);
}

/// True when the kill switch routed the process to the system allocator.
#[inline]
pub fn pools_disabled() -> bool {
    INIT_STATE.load(Ordering::Acquire) == DISABLED
}
