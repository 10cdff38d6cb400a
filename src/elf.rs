//! One-shot ELF32 symbol-table reader. Populates the function table that
//! ftrace consumes; otherwise side-effect-free.

use object::{Object, ObjectSymbol, SymbolKind};

use crate::error::EmulatorError;

/// One function symbol: name and half-open address range.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub begin_addr: u32,
    pub end_addr: u32,
}

/// Immutable table of function symbols, built once at init.
///
/// A linear scan over a few thousand entries per jump is acceptable for a
/// functional emulator; this could be a `HashMap` keyed by `begin_addr`
/// without any observable change in behavior.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: Vec<FunctionEntry>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: String, begin_addr: u32, end_addr: u32) {
        self.entries.push(FunctionEntry {
            name,
            begin_addr,
            end_addr,
        });
    }

    pub fn lookup_begin(&self, addr: u32) -> Option<&String> {
        self.entries
            .iter()
            .find(|e| e.begin_addr == addr)
            .map(|e| &e.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read an ELF32 little-endian file's symbol table (`SHT_SYMTAB` plus its
/// linked `.strtab`) and build a function table from every `STT_FUNC`
/// symbol. Any failure is fatal and reported with a clear message.
pub fn load_function_table(path: &std::path::Path) -> Result<FunctionTable, EmulatorError> {
    let data = std::fs::read(path).map_err(|e| {
        EmulatorError::Elf(format!("cannot read {}: {e}", path.display()))
    })?;
    build_function_table(&data)
}

/// Build a function table from in-memory ELF bytes.
pub fn build_function_table(data: &[u8]) -> Result<FunctionTable, EmulatorError> {
    let obj = object::File::parse(data)
        .map_err(|e| EmulatorError::Elf(format!("failed to parse ELF: {e}")))?;

    let mut table = FunctionTable::new();
    for symbol in obj.symbols() {
        if symbol.kind() != SymbolKind::Text {
            continue;
        }
        let Ok(name) = symbol.name() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let begin = symbol.address() as u32;
        let end = begin.wrapping_add(symbol.size() as u32);
        log::debug!("ftrace symbol '{name}': 0x{begin:08x}..0x{end:08x}");
        table.insert(name.to_string(), begin, end);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_has_no_entries() {
        let table = FunctionTable::new();
        assert!(table.is_empty());
        assert_eq!(table.lookup_begin(0x1000), None);
    }

    #[test]
    fn lookup_finds_inserted_entry() {
        let mut table = FunctionTable::new();
        table.insert("main".to_string(), 0x8000_0000, 0x8000_0020);
        assert_eq!(table.lookup_begin(0x8000_0000).map(String::as_str), Some("main"));
        assert_eq!(table.lookup_begin(0x8000_0010), None);
    }
}
