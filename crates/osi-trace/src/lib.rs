//! Reading, writing and analyzing OSI trace files.
//!
//! # Crate Structure
//!
//! - [`message`]: OSI message types and the message type registry
//! - [`file`]: `.osi`, `.txth` and `.mcap` readers and writers
//! - [`analyzer`]: statistics and MCAP tuning for `.osi` files
//!
//! With the `cli` feature the `osi-trace` binary is built as well.

/// Re-export message types.
pub mod message {
    pub use osi_trace_message::*;
}

/// Re-export trace file readers and writers.
pub mod file {
    pub use osi_trace_file::*;
}

/// Re-export the file analyzer.
pub mod analyzer {
    pub use osi_trace_analyzer::*;
}
