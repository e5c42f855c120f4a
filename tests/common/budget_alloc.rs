use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global allocator that tracks live bytes, the high-water mark and the
/// number of allocation calls.
pub struct BudgetAlloc {
    live: AtomicUsize,
    high_water: AtomicUsize,
    allocations: AtomicUsize,
}

/// Allocation activity observed by [`BudgetAlloc::measure`].
#[derive(Clone, Copy, Debug)]
pub struct Measurement {
    /// Peak bytes above the live total at the start of the measurement.
    pub peak_bytes: usize,
    /// Allocation calls, reallocations included.
    pub allocations: usize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
        }
    }

    /// Run `f` and report what it allocated.
    ///
    /// Other threads allocating at the same time are counted too, so budget
    /// tests keep all measurements inside a single test function.
    pub fn measure<R>(&self, f: impl FnOnce() -> R) -> (R, Measurement) {
        let baseline = self.live.load(Ordering::SeqCst);
        self.high_water.store(baseline, Ordering::SeqCst);
        let calls_before = self.allocations.load(Ordering::SeqCst);

        let result = f();

        let peak = self.high_water.load(Ordering::SeqCst);
        let calls_after = self.allocations.load(Ordering::SeqCst);
        (
            result,
            Measurement {
                peak_bytes: peak.saturating_sub(baseline),
                allocations: calls_after.saturating_sub(calls_before),
            },
        )
    }

    fn grow(&self, bytes: usize) {
        let now = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.allocations.fetch_add(1, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        // Memory allocated before the counters existed can be freed later.
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let moved = unsafe { System.realloc(ptr, layout, new_size) };
        if !moved.is_null() {
            self.shrink(layout.size());
            self.grow(new_size);
        }
        moved
    }
}
