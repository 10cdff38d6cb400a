//! Trace file naming: derive `-itrace`/`-mtrace`/`-ftrace` sibling paths from
//! a single log path the user supplies, inserting the suffix before the
//! extension (or appending it when the path has none).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Instruction,
    Memory,
    Function,
}

impl TraceKind {
    fn suffix(self) -> &'static str {
        match self {
            TraceKind::Instruction => "-itrace",
            TraceKind::Memory => "-mtrace",
            TraceKind::Function => "-ftrace",
        }
    }
}

/// Build the auxiliary log path for `kind` from a base log path.
///
/// `base.txt` + `Memory` -> `base-mtrace.txt`; `base` (no extension) +
/// `Function` -> `base-ftrace`.
pub fn derive_trace_path(base: &Path, kind: TraceKind) -> PathBuf {
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let mut name = format!("{stem}{}", kind.suffix());
    if let Some(ext) = base.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    match base.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_suffix_before_extension() {
        let out = derive_trace_path(Path::new("run.txt"), TraceKind::Memory);
        assert_eq!(out, PathBuf::from("run-mtrace.txt"));
    }

    #[test]
    fn appends_suffix_when_no_extension() {
        let out = derive_trace_path(Path::new("run"), TraceKind::Function);
        assert_eq!(out, PathBuf::from("run-ftrace"));
    }

    #[test]
    fn preserves_directory_component() {
        let out = derive_trace_path(Path::new("logs/session.log"), TraceKind::Instruction);
        assert_eq!(out, PathBuf::from("logs/session-itrace.log"));
    }
}
