#![cfg(feature = "global-allocator")]

use pagepool::PagePool;

#[global_allocator]
static GLOBAL: PagePool = PagePool;

#[test]
fn basic_alloc_and_free() {
    let b = Box::new(42u64);
    assert_eq!(*b, 42);
    drop(b);

    let mut v: Vec<u32> = Vec::new();
    for i in 0..1000 {
        v.push(i);
    }
    assert_eq!(v.len(), 1000);
    assert_eq!(v[999], 999);
    drop(v);

    let s = String::from("hello, pagepool global allocator!");
    assert_eq!(s, "hello, pagepool global allocator!");
    drop(s);
}

#[test]
fn zero_size_alloc() {
    let mut v: Vec<()> = Vec::new();
    for _ in 0..100 {
        v.push(());
    }
    assert_eq!(v.len(), 100);
    drop(v);

    let v: Vec<u8> = Vec::new();
    assert_eq!(v.len(), 0);
    drop(v);
}

#[test]
fn over_aligned_alloc() {
    use std::alloc::{alloc, dealloc, Layout};

    unsafe {
        let layout = Layout::from_size_align(256, 64).unwrap();
        let ptr = alloc(layout);
        assert!(!ptr.is_null(), "64-byte aligned allocation returned null");
        assert_eq!(ptr as usize % 64, 0, "pointer is not 64-byte aligned: {ptr:p}");

        core::ptr::write(ptr, 0xAB);
        core::ptr::write(ptr.add(255), 0xCD);
        assert_eq!(core::ptr::read(ptr), 0xAB);
        assert_eq!(core::ptr::read(ptr.add(255)), 0xCD);

        dealloc(ptr, layout);
    }
}

#[test]
fn alloc_zeroed_is_zero_even_for_recycled_slots() {
    use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};

    unsafe {
        let layout = Layout::from_size_align(96, 8).unwrap();
        // dirty a slot, free it, then ask for zeroed memory of the same class
        let dirty = alloc(layout);
        core::ptr::write_bytes(dirty, 0xFF, 96);
        dealloc(dirty, layout);

        let ptr = alloc_zeroed(layout);
        assert!(!ptr.is_null());
        let slice = core::slice::from_raw_parts(ptr, 96);
        assert!(slice.iter().all(|&b| b == 0), "alloc_zeroed returned dirty memory");
        dealloc(ptr, layout);
    }
}

#[test]
fn realloc_preserves_data_across_classes() {
    let mut v: Vec<u8> = Vec::with_capacity(16);
    for i in 0u8..200 {
        v.push(i);
    }
    for i in 0u8..200 {
        assert_eq!(v[i as usize], i);
    }
}
