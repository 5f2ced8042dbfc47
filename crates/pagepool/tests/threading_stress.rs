//! Thread stress tests for the dispatcher and pools.
//!
//! These exercise one size class under heavy contention, verifying that
//! concurrent allocate/deallocate pairs never hand out the same slot twice
//! and that the pools drain completely at quiescence.

use std::collections::HashSet;
use std::ptr;
use std::sync::{Arc, Barrier};
use std::thread;

use pagepool::dispatch;
use pagepool::pool::global;

/// Wrapper to allow sending `*mut u8` across thread boundaries. The pools
/// are thread-safe; only ownership moves between threads.
#[derive(Clone, Copy)]
struct SendPtr(*mut u8);
unsafe impl Send for SendPtr {}

fn stress_alloc_free_pairs(num_threads: usize) {
    const PAIRS: usize = 10_000;
    const SIZE: usize = 48;

    let barrier = Arc::new(Barrier::new(num_threads));
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let fill = t as u8;
                for _ in 0..PAIRS {
                    let p = dispatch::allocate(SIZE, 8);
                    assert!(!p.is_null(), "allocate returned null under contention");
                    unsafe {
                        ptr::write_bytes(p, fill, SIZE);
                        assert_eq!(*p, fill);
                        assert_eq!(*p.add(SIZE - 1), fill);
                        dispatch::deallocate(p);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("thread panicked during alloc/free stress");
    }
}

#[test]
fn stress_pairs_4_threads() {
    stress_alloc_free_pairs(4);
}

#[test]
fn stress_pairs_8_threads() {
    stress_alloc_free_pairs(8);
}

#[test]
fn concurrent_allocations_never_share_an_address() {
    const THREADS: usize = 8;
    const LIVE: usize = 600;
    const SIZE: usize = 24;

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let fill = 0x40 + t as u8;
                let mut held: Vec<SendPtr> = Vec::with_capacity(LIVE);
                for _ in 0..LIVE {
                    let p = dispatch::allocate(SIZE, 8);
                    assert!(!p.is_null());
                    unsafe { ptr::write_bytes(p, fill, SIZE) };
                    held.push(SendPtr(p));
                }
                // nobody scribbled over our slots while we allocated
                for sp in &held {
                    unsafe {
                        assert_eq!(*sp.0, fill);
                        assert_eq!(*sp.0.add(SIZE - 1), fill);
                    }
                }
                held
            })
        })
        .collect();

    let mut all: Vec<SendPtr> = Vec::new();
    for h in handles {
        all.extend(h.join().expect("allocator thread panicked"));
    }

    let unique: HashSet<usize> = all.iter().map(|sp| sp.0 as usize).collect();
    assert_eq!(unique.len(), THREADS * LIVE, "duplicate slot handed out");

    for sp in &all {
        unsafe { dispatch::deallocate(sp.0) };
    }
    // quiescent: every arena of the class drained back to the system
    assert_eq!(global::global().get(SIZE).arena_count(), 0);
}

#[test]
fn cross_thread_free() {
    const COUNT: usize = 2_000;
    const SIZE: usize = 64;

    let ptrs: Vec<SendPtr> = (0..COUNT)
        .map(|i| {
            let p = dispatch::allocate(SIZE, 8);
            assert!(!p.is_null());
            unsafe { ptr::write_bytes(p, (i % 251) as u8, SIZE) };
            SendPtr(p)
        })
        .collect();

    // free everything from other threads, split in half
    let (left, right) = ptrs.split_at(COUNT / 2);
    let left = left.to_vec();
    let right = right.to_vec();
    let a = thread::spawn(move || {
        for sp in left {
            unsafe { dispatch::deallocate(sp.0) };
        }
    });
    let b = thread::spawn(move || {
        for sp in right {
            unsafe { dispatch::deallocate(sp.0) };
        }
    });
    a.join().unwrap();
    b.join().unwrap();

    assert_eq!(global::global().get(SIZE).arena_count(), 0);
}
