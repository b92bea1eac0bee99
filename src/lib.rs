//! Debugger-side summaries for tensor values
//!
//! This library renders a bounded, one-line description of a tensor living in
//! an inspected process, for display in a debugger's variables pane:
//! - Reads the object only through a fallible introspection interface
//! - Recovers element count, shape, element kind and data location
//! - Samples the leading elements of each dimension within a render budget
//! - Degrades to partial output or a placeholder instead of failing
//!
//! # Features
//! - `debug_logs` - Prints why fields were skipped or output was degraded
//! - `serialization` - Enables `RenderOptions::from_json`
//!
//! # Example
//! ```rust
//! use tensor_summary::test_utils::SyntheticTensor;
//! use tensor_summary::{render, RenderOptions};
//!
//! let tensor = SyntheticTensor::float32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).build();
//! let summary = render(tensor.as_handle(), &(), &RenderOptions::default());
//! assert_eq!(
//!     summary,
//!     "Tensor(shape=[2,3], dtype=float32, data=[[1.0,2.0,3.0],[4.0,5.0,6.0]])"
//! );
//! ```

// --- Central debug_println macro definition ---
/// Conditional logging macro. Prints if 'debug_logs' feature is enabled.
#[cfg(feature = "debug_logs")]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        ::std::println!("[DEBUG {}] {}", module_path!(), ::std::format_args!($($arg)*))
    };
}

/// Conditional logging macro (disabled version). Does nothing.
#[cfg(not(feature = "debug_logs"))]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {};
}

pub mod dtype;
pub mod error;
pub mod handle;
pub mod metadata;
pub mod options;
pub mod registry;
pub mod render;

// Synthetic handles for tests, benches and doc examples
pub mod test_utils;

pub use dtype::ElementKind;
pub use error::Error;
pub use handle::{Address, Scalar, ScalarKind, ValueHandle};
pub use metadata::{extract, Layout, TensorMetadata, SANITY_CEILING};
pub use options::RenderOptions;
pub use registry::{
    init_plugin, register_summaries, SummaryRegistry, TypePattern, TypeSummaryHost,
    TENSOR_TYPE_PATTERN,
};
pub use render::{
    render, SummaryProvider, TensorSummary, TRUNCATION_MARKER, UNREADABLE_PLACEHOLDER,
};
