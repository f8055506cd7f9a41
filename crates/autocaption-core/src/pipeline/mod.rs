//! Upload checks that run before an image reaches a caption provider.
//!
//! - **validate**: emptiness, size and magic-byte checks on raw bytes
//! - **probe**: format and dimension detection with a timeout

pub mod probe;
pub mod validate;

pub use probe::{ImageProbe, ProbedImage};
pub use validate::Validator;
