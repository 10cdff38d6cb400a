//! Memory-access log: each guest read/write is appended as a line when
//! tracing is enabled.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemDirection {
    Read,
    Write,
}

pub struct Mtrace {
    sink: Option<Box<dyn Write + Send>>,
}

impl Mtrace {
    pub fn disabled() -> Self {
        Mtrace { sink: None }
    }

    pub fn enabled(sink: Box<dyn Write + Send>) -> Self {
        Mtrace { sink: Some(sink) }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&mut self, addr: u32, len: usize, value: u32, dir: MemDirection) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let arrow = match dir {
            MemDirection::Read => "R",
            MemDirection::Write => "W",
        };
        let _ = writeln!(sink, "{arrow} 0x{addr:08x} len={len} value=0x{value:08x}");
    }
}
