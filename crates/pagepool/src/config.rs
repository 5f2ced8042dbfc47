use core::sync::atomic::{AtomicBool, Ordering};

/// Cached kill-switch value, read once at init.
static DISABLED: AtomicBool = AtomicBool::new(false);

/// Read configuration from the environment. Must be called during init,
/// before the first allocation.
///
/// # Safety
/// `libc::getenv` is not safe against concurrent `setenv`; callers must be
/// inside the one-time init path.
pub unsafe fn read_config() {
    let key = b"PAGEPOOL_DISABLE\0".as_ptr() as *const libc::c_char;
    if !libc::getenv(key).is_null() {
        DISABLED.store(true, Ordering::Relaxed);
    }
}

/// Kill switch: when set, every request takes the system-allocator path.
#[inline]
pub fn is_disabled() -> bool {
    DISABLED.load(Ordering::Relaxed)
}
