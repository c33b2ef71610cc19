//! Entity catalog: declarations in, immutable descriptors out.

pub mod builder;
pub mod descriptor;
pub mod loader;
pub mod types;

pub use builder::*;
pub use descriptor::*;
pub use loader::*;
pub use types::*;
