//! Trace subsystem: instruction ring buffer, memory-access log, and the
//! ELF-symbol-driven function call/return tracer.

mod ftrace;
mod mtrace;
mod ring;

pub use ftrace::Ftrace;
pub use mtrace::{MemDirection, Mtrace};
pub use ring::RingBuffer;
