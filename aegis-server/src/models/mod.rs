//! Request and response models

pub mod scan;
pub mod analyst;

pub use scan::*;
pub use analyst::*;
