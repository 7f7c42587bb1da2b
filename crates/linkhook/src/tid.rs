//! OS thread identifiers attached to `tracing` trace events, so interleaved
//! allocations from several threads can be told apart.

/// Return the OS thread ID (TID) as u64.
///
/// - **Linux**: `syscall(SYS_gettid)`, the kernel thread ID
/// - **macOS**: `pthread_mach_thread_np(pthread_self())`, the Mach thread ID
/// - elsewhere: `0`
///
/// Does not allocate, so it is safe to call from inside allocator hooks.
#[inline]
pub fn current_tid() -> u64 {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "linux")] {
            unsafe { libc::syscall(libc::SYS_gettid) as u64 }
        } else if #[cfg(target_os = "macos")] {
            unsafe { libc::pthread_mach_thread_np(libc::pthread_self()) as u64 }
        } else {
            0
        }
    }
}
