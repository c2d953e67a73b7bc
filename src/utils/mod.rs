//! # Utilities
//!
//! Allocation helpers run when an instance is constructed.

pub mod ids;
pub mod ports;

pub use ids::{encode_base36, IdGenerator, ProcessIdGenerator, SeededIdGenerator};
pub use ports::allocate_port;
