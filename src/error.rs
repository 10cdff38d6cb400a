//! Error types for the emulator core and the debugger's monitor commands.
//!
//! [`EmulatorError`] is fatal: it terminates the machine and is reported via
//! the process exit code. [`CommandError`] is confined to a single monitor
//! command; the caller keeps running.

use std::fmt;

/// Kind of memory access that failed, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAccessKind {
    Read,
    Write,
    InstructionFetch,
}

impl fmt::Display for MemoryAccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryAccessKind::Read => "read",
            MemoryAccessKind::Write => "write",
            MemoryAccessKind::InstructionFetch => "instruction fetch",
        };
        f.write_str(s)
    }
}

/// Errors that terminate the machine.
#[derive(Debug, Clone)]
pub enum EmulatorError {
    /// Access outside the configured memory window.
    BadAddress {
        address: u32,
        len: usize,
        kind: MemoryAccessKind,
        pc: u32,
    },
    /// No decoder pattern matched (should only happen via the catch-all, kept
    /// here for symmetry with the state machine's `ABORT` transition).
    IllegalInstruction { pc: u32, instruction: u32 },
    /// ELF symbol-table ingestion failed at startup.
    Elf(String),
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::BadAddress {
                address,
                len,
                kind,
                pc,
            } => write!(
                f,
                "bad address: {kind} of {len} byte(s) at 0x{address:08x} (pc=0x{pc:08x})"
            ),
            EmulatorError::IllegalInstruction { pc, instruction } => write!(
                f,
                "illegal instruction 0x{instruction:08x} at pc=0x{pc:08x}"
            ),
            EmulatorError::Elf(msg) => write!(f, "ELF error: {msg}"),
        }
    }
}

impl std::error::Error for EmulatorError {}

/// Errors confined to one monitor command. The machine's run state is
/// unaffected; the REPL reports the message and prompts again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    LexError { position: usize },
    ParseError,
    DivideByZero,
    WatchpointFull,
    WatchpointNotFound { id: usize },
    BadArgument(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::LexError { position } => {
                write!(f, "cannot tokenize expression at position {position}")
            }
            CommandError::ParseError => write!(f, "malformed expression"),
            CommandError::DivideByZero => write!(f, "division by zero"),
            CommandError::WatchpointFull => write!(f, "watchpoint pool is full"),
            CommandError::WatchpointNotFound { id } => write!(f, "no watchpoint with id {id}"),
            CommandError::BadArgument(msg) => write!(f, "bad argument: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}
