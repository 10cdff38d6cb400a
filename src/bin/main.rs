use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rv32emu::config::{derive_trace_path, TraceKind};
use rv32emu::cpu::{Cpu, MachineState, UNBOUNDED};
use rv32emu::elf::{load_function_table, FunctionTable};
use rv32emu::memory::{Memory, DEFAULT_BASE};

/// RV32IM functional emulator with a source-level debugger monitor.
///
/// The interactive REPL (line reading, command parsing) lives outside this
/// crate; this binary is a batch driver over the same `Cpu`/`Monitor` API:
/// load an image, optionally ingest ELF symbols for ftrace, run to
/// completion, and report the exit status.
#[derive(Parser)]
#[command(name = "rv32emu")]
#[command(about = "RV32IM functional emulator")]
struct Args {
    /// Raw guest image, loaded at --base.
    image: PathBuf,

    /// ELF32 file to read function symbols from, for ftrace.
    #[arg(long)]
    elf: Option<PathBuf>,

    /// Guest memory load address.
    #[arg(long, value_parser = parse_u32, default_value_t = DEFAULT_BASE)]
    base: u32,

    /// Guest memory size in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    mem_size: usize,

    /// Base log path; auxiliary logs are derived with -itrace/-mtrace/-ftrace
    /// suffixes inserted before the extension.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Number of instructions to run (omit for unbounded, i.e. run to halt).
    #[arg(long)]
    steps: Option<u64>,
}

fn parse_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let image = std::fs::read(&args.image)
        .with_context(|| format!("cannot read guest image {}", args.image.display()))?;
    let mem = Memory::with_image(args.base, &image, args.mem_size);

    let functions = match &args.elf {
        Some(path) => load_function_table(path)
            .with_context(|| format!("cannot read ELF symbols from {}", path.display()))?,
        None => FunctionTable::new(),
    };

    let mut cpu = Cpu::new(mem, args.base, functions.clone());

    if let Some(log) = &args.log {
        let itrace_path = derive_trace_path(log, TraceKind::Instruction);
        let itrace_file = File::create(&itrace_path)
            .with_context(|| format!("cannot create {}", itrace_path.display()))?;
        cpu.enable_itrace(Box::new(itrace_file));
        log::info!("instruction trace: {}", itrace_path.display());

        let mtrace_path = derive_trace_path(log, TraceKind::Memory);
        let mtrace_file = File::create(&mtrace_path)
            .with_context(|| format!("cannot create {}", mtrace_path.display()))?;
        cpu.enable_mtrace(Box::new(mtrace_file));

        if args.elf.is_some() {
            let ftrace_path = derive_trace_path(log, TraceKind::Function);
            let ftrace_file = File::create(&ftrace_path)
                .with_context(|| format!("cannot create {}", ftrace_path.display()))?;
            cpu.enable_ftrace(functions, Box::new(ftrace_file));
        }
    }

    let state = cpu.exec(args.steps.unwrap_or(UNBOUNDED))?;
    log::debug!("ran {} instruction(s)", cpu.instruction_count());

    let code = match state {
        MachineState::End { exit_code } => exit_code,
        MachineState::Abort => 1,
        MachineState::Quit => 0,
        MachineState::Running | MachineState::Stop => 0,
    };
    std::process::exit(code);
}
