// Original source: https://github.com/fornwall/allocation-counter
//
// Licensed under either of:
// - Apache License, Version 2.0.
// - MIT/X Consortium License
//
// Modifications:
// - Observation routed through compile-time resolved hook slots
// - Explicit tracked_alloc/tracked_free API next to the GlobalAlloc impl

use std::alloc::{GlobalAlloc, Layout, System};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::hooks::{Hook, HookInfo};

pub type InitFn = fn();
pub type ObserveAllocFn = fn(usize, usize);
pub type ObserveFreeFn = fn(usize);
pub type ReportFn = fn();

/// Allocation-tracking slots. All of them are optional and unwired by default.
pub mod slot {
    use super::*;

    pub const INIT: Hook<InitFn> = Hook::optional("alloc.init");
    pub const OBSERVE_ALLOC: Hook<ObserveAllocFn> = Hook::optional("alloc.observe_alloc");
    pub const OBSERVE_FREE: Hook<ObserveFreeFn> = Hook::optional("alloc.observe_free");
    pub const REPORT: Hook<ReportFn> = Hook::optional("alloc.report");
}

/// Hook set consulted by [`InstrumentedAllocator`].
///
/// Implement it on a marker type and replace the slots you want to wire:
///
/// ```rust
/// use linkhook::alloc::{slot, ObserveAllocFn};
/// use linkhook::{AllocHooks, Hook};
///
/// fn count_alloc(_address: usize, _size: usize) {}
///
/// struct Counting;
/// impl AllocHooks for Counting {
///     const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC.with_override(count_alloc);
/// }
///
/// assert!(Counting::OBSERVE_ALLOC.is_present());
/// assert!(!Counting::OBSERVE_FREE.is_present());
/// ```
pub trait AllocHooks {
    const INIT: Hook<InitFn> = slot::INIT;
    const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC;
    const OBSERVE_FREE: Hook<ObserveFreeFn> = slot::OBSERVE_FREE;
    const REPORT: Hook<ReportFn> = slot::REPORT;

    fn wiring() -> Vec<HookInfo> {
        vec![
            HookInfo::of(&Self::INIT),
            HookInfo::of(&Self::OBSERVE_ALLOC),
            HookInfo::of(&Self::OBSERVE_FREE),
            HookInfo::of(&Self::REPORT),
        ]
    }
}

/// Wires nothing: allocations pass straight through.
pub struct NoTracking;

impl AllocHooks for NoTracking {}

/// Alignment of blocks handed out by [`InstrumentedAllocator::tracked_alloc`],
/// matching what `malloc` guarantees on 64-bit targets.
pub const BLOCK_ALIGN: usize = 16;

/// Memory obtained from [`InstrumentedAllocator::tracked_alloc`].
///
/// Give it back with [`InstrumentedAllocator::tracked_free`]. Dropping a block
/// leaks it, and the ledger will list it.
#[derive(Debug)]
pub struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    size: usize,
}

// The block is a uniquely owned heap region.
unsafe impl Send for Block {}

impl Block {
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Requested size. Zero-size requests still occupy one byte underneath.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Allocator wrapper that reports every allocation and free to the
/// `H` hook set before handing off to `A`.
pub struct InstrumentedAllocator<H, A = System> {
    inner: A,
    _hooks: PhantomData<fn() -> H>,
}

impl<H> InstrumentedAllocator<H, System> {
    pub const fn new() -> Self {
        Self::with_inner(System)
    }
}

impl<H> Default for InstrumentedAllocator<H, System> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, A> InstrumentedAllocator<H, A> {
    pub const fn with_inner(inner: A) -> Self {
        Self {
            inner,
            _hooks: PhantomData,
        }
    }
}

impl<H: AllocHooks, A> InstrumentedAllocator<H, A> {
    #[inline(always)]
    fn observe_alloc(address: usize, size: usize) {
        if const { H::OBSERVE_ALLOC.is_present() } {
            H::OBSERVE_ALLOC.resolve()(address, size);
        }
    }

    #[inline(always)]
    fn observe_free(address: usize) {
        if const { H::OBSERVE_FREE.is_present() } {
            H::OBSERVE_FREE.resolve()(address);
        }
    }
}

impl<H: AllocHooks, A: GlobalAlloc> InstrumentedAllocator<H, A> {
    /// Requests `size` bytes and reports them to the allocation hook if one is wired.
    ///
    /// Failures of the underlying allocator come back as [`Error::OutOfMemory`]
    /// and are never reported as allocations.
    pub fn tracked_alloc(&self, size: usize) -> Result<Block> {
        let layout = Layout::from_size_align(size.max(1), BLOCK_ALIGN)
            .map_err(|_| Error::InvalidLayout { size })?;

        let ptr = unsafe { self.inner.alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(Error::OutOfMemory { size })?;

        Self::observe_alloc(ptr.as_ptr() as usize, size);

        Ok(Block { ptr, layout, size })
    }

    /// Reports the free to the hook if one is wired, then releases the memory.
    pub fn tracked_free(&self, block: Block) {
        Self::observe_free(block.address());

        unsafe {
            self.inner.dealloc(block.ptr.as_ptr(), block.layout);
        }
    }
}

// realloc keeps the default alloc + copy + dealloc so the hooks see both sides.
unsafe impl<H: AllocHooks, A: GlobalAlloc> GlobalAlloc for InstrumentedAllocator<H, A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        Self::observe_alloc(ptr as usize, layout.size());
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        Self::observe_alloc(ptr as usize, layout.size());
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        Self::observe_free(ptr as usize);

        unsafe {
            self.inner.dealloc(ptr, layout);
        }
    }
}

/// [`InstrumentedAllocator::tracked_alloc`] on the system allocator.
pub fn tracked_alloc<H: AllocHooks>(size: usize) -> Result<Block> {
    InstrumentedAllocator::<H>::new().tracked_alloc(size)
}

/// [`InstrumentedAllocator::tracked_free`] on the system allocator.
pub fn tracked_free<H: AllocHooks>(block: Block) {
    InstrumentedAllocator::<H>::new().tracked_free(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Resolution;
    use std::cell::RefCell;
    use std::ptr;

    // Each test runs on its own thread, so per-thread recording keeps
    // concurrently running tests from seeing each other's addresses.
    thread_local! {
        static SEEN: RefCell<Vec<(char, usize, usize)>> = const { RefCell::new(Vec::new()) };
    }

    fn record_alloc(address: usize, size: usize) {
        SEEN.with(|seen| seen.borrow_mut().push(('a', address, size)));
    }

    fn record_free(address: usize) {
        SEEN.with(|seen| seen.borrow_mut().push(('f', address, 0)));
    }

    struct Recording;

    impl AllocHooks for Recording {
        const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC.with_override(record_alloc);
        const OBSERVE_FREE: Hook<ObserveFreeFn> = slot::OBSERVE_FREE.with_override(record_free);
    }

    struct Refusing;

    unsafe impl GlobalAlloc for Refusing {
        unsafe fn alloc(&self, _layout: Layout) -> *mut u8 {
            ptr::null_mut()
        }

        unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
    }

    fn seen_for(address: usize) -> Vec<(char, usize, usize)> {
        SEEN.with(|seen| {
            seen.borrow()
                .iter()
                .copied()
                .filter(|&(_, a, _)| a == address)
                .collect()
        })
    }

    #[test]
    fn test_hooks_see_alloc_then_free() {
        let allocator = InstrumentedAllocator::<Recording>::new();
        let block = allocator.tracked_alloc(48).unwrap();
        let address = block.address();
        assert_eq!(block.size(), 48);
        assert_eq!(address % BLOCK_ALIGN, 0);

        allocator.tracked_free(block);

        assert_eq!(seen_for(address), vec![('a', address, 48), ('f', address, 0)]);
    }

    #[test]
    fn test_zero_size_request_is_tracked_as_zero() {
        let block = tracked_alloc::<Recording>(0).unwrap();
        let address = block.address();
        assert_eq!(block.size(), 0);
        tracked_free::<Recording>(block);
        assert_eq!(seen_for(address)[0], ('a', address, 0));
    }

    #[test]
    fn test_allocation_without_tracking() {
        let allocator = InstrumentedAllocator::<NoTracking>::new();
        let block = allocator.tracked_alloc(32).unwrap();
        unsafe { ptr::write_bytes(block.as_ptr(), 0xAB, block.size()) };
        allocator.tracked_free(block);

        assert!(NoTracking::wiring()
            .iter()
            .all(|info| info.resolution == Resolution::Absent));
    }

    #[test]
    fn test_underlying_failure_is_not_tracked() {
        let allocator = InstrumentedAllocator::<Recording, Refusing>::with_inner(Refusing);
        assert_eq!(
            allocator.tracked_alloc(16).unwrap_err(),
            Error::OutOfMemory { size: 16 }
        );
        assert!(seen_for(0).is_empty());
    }

    #[test]
    fn test_oversized_request_is_invalid_layout() {
        let err = tracked_alloc::<NoTracking>(usize::MAX).unwrap_err();
        assert_eq!(err, Error::InvalidLayout { size: usize::MAX });
    }

    #[test]
    fn test_global_alloc_interface_reports_layout_size() {
        let allocator = InstrumentedAllocator::<Recording>::new();
        let layout = Layout::from_size_align(24, 8).unwrap();
        let ptr = unsafe { allocator.alloc_zeroed(layout) };
        assert!(!ptr.is_null());
        let address = ptr as usize;
        unsafe { allocator.dealloc(ptr, layout) };

        assert_eq!(seen_for(address), vec![('a', address, 24), ('f', address, 0)]);
    }
}
