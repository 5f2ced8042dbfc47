#![no_main]

use libfuzzer_sys::fuzz_target;
use pagepool::dispatch;

/// Interprets a byte slice as a sequence of allocator operations.
///
/// Each operation is encoded as:
///   byte 0: bit 0 = opcode (0 = allocate, 1 = deallocate),
///           bits 1.. pick the alignment
///   byte 1-2: size (little-endian u16, spans both pool and system paths)
///   byte 3: slot index (which tracked pointer to operate on)
///
/// Up to 64 live pointers are tracked; allocating into an occupied slot
/// frees the previous pointer first.
const MAX_SLOTS: usize = 64;

const ALIGNS: [usize; 5] = [1, 2, 4, 8, 16];

fuzz_target!(|data: &[u8]| {
    let mut slots: [*mut u8; MAX_SLOTS] = [std::ptr::null_mut(); MAX_SLOTS];

    let mut i = 0;
    while i + 4 <= data.len() {
        let opcode = data[i] & 0x01;
        let size = u16::from_le_bytes([data[i + 1], data[i + 2]]) as usize;
        let align = ALIGNS[(data[i] >> 1) as usize % ALIGNS.len()];
        let slot = (data[i + 3] as usize) % MAX_SLOTS;
        i += 4;

        match opcode {
            0 => {
                if !slots[slot].is_null() {
                    unsafe { dispatch::deallocate(slots[slot]) };
                }
                let ptr = dispatch::allocate(size, align);
                slots[slot] = ptr;
                if !ptr.is_null() && size > 0 {
                    unsafe {
                        std::ptr::write_bytes(ptr, 0xAA, std::cmp::min(size, 256));
                    }
                }
            }
            _ => {
                if !slots[slot].is_null() {
                    unsafe { dispatch::deallocate(slots[slot]) };
                    slots[slot] = std::ptr::null_mut();
                }
            }
        }
    }

    // drain everything still live
    for ptr in slots {
        if !ptr.is_null() {
            unsafe { dispatch::deallocate(ptr) };
        }
    }
});
