//! Testing utilities for archive atomicity
//!
//! - **Fault injection**: a container wrapper that fails a chosen operation,
//!   used to check that a failed insert leaves no partial record behind
//!
//! # Example
//!
//! ```ignore
//! use sdarc_storage::testing::{FaultPoint, FaultyContainer};
//! use sdarc_storage::MemoryContainer;
//!
//! // Fail the third buffer write
//! let container = FaultyContainer::new(MemoryContainer::new(), FaultPoint::WriteBuffer { after: 2 });
//! ```

mod fault;

pub use fault::{FaultPoint, FaultyContainer};
