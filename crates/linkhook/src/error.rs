use thiserror::Error;

/// Errors returned by the instrumented allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The underlying allocator returned null.
    #[error("out of memory: underlying allocator refused {size} bytes")]
    OutOfMemory { size: usize },
    /// The request cannot be expressed as a layout (size overflows `isize`).
    #[error("invalid allocation size: {size} bytes")]
    InvalidLayout { size: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
