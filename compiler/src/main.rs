use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use logicc::diag::{DiagLevel, Diagnostic};
use logicc::pass::PassId;
use logicc::pipeline::{compute_provenance, run_pipeline, CompilationState};
use logicc::project::{self, LoadOptions};
use logicc::{disasm, dot, encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitStage {
    /// Raw bytecode (binary; needs -o)
    Bytes,
    /// Comma-separated decimal bytes
    Csv,
    /// Framed upload packet (binary; needs -o)
    Frame,
    /// C array initializer
    CArray,
    /// Disassembly listing
    Asm,
    /// Dependency order, one node id per line
    Order,
    /// Slot assignments
    Slots,
    /// Graphviz DOT of the normalized graph
    Dot,
    /// Provenance JSON
    BuildInfo,
}

impl EmitStage {
    fn terminal_pass(self) -> PassId {
        match self {
            EmitStage::Order => PassId::Order,
            EmitStage::Slots | EmitStage::Dot => PassId::Allocate,
            _ => PassId::Codegen,
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, EmitStage::Bytes | EmitStage::Frame)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "logicc",
    version,
    about = "Logic graph compiler — compiles editor projects to controller bytecode"
)]
struct Cli {
    /// Input project JSON file
    project: PathBuf,

    /// Output file path (`-` for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Csv)]
    emit: EmitStage,

    /// Target board, overriding the project's `board` field
    #[arg(long)]
    board: Option<String>,

    /// Print compiler phases and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    tracing::debug!(
        project = %cli.project.display(),
        emit = ?cli.emit,
        "starting"
    );

    if cli.emit.is_binary() && cli.output.is_none() {
        eprintln!(
            "logicc: error: --emit {:?} writes binary; pass -o FILE (or -o - for stdout)",
            cli.emit
        );
        std::process::exit(2);
    }

    // ── Load project ──
    let text = match std::fs::read_to_string(&cli.project) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("logicc: error: {}: {}", cli.project.display(), e);
            std::process::exit(2);
        }
    };

    let options = LoadOptions {
        board: cli.board.clone(),
    };
    let loaded = match project::load(&text, &options) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("logicc: {}", Diagnostic::from(&e));
            std::process::exit(2);
        }
    };
    for warning in &loaded.warnings {
        eprintln!("logicc: {}", warning);
    }

    // ── Compile ──
    let mut state = CompilationState::new(loaded.graph);
    let result = run_pipeline(&mut state, cli.emit.terminal_pass(), |_, diags| {
        for d in diags {
            eprintln!("logicc: {}", d);
        }
    });
    if let Err(e) = result {
        tracing::debug!(pass = ?e.failing_pass, "compilation failed");
        std::process::exit(1);
    }

    // ── Emit ──
    let data = match render(cli.emit, &state, &text) {
        Ok(data) => data,
        Err(diag) => {
            eprintln!("logicc: {}", diag);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_output(cli.output.as_deref(), &data) {
        eprintln!("logicc: error: {}", e);
        std::process::exit(2);
    }
}

fn render(emit: EmitStage, state: &CompilationState, text: &str) -> Result<Vec<u8>, Diagnostic> {
    let graph = state.working_graph();
    let program = || {
        state
            .program
            .as_ref()
            .ok_or_else(|| Diagnostic::new(DiagLevel::Error, "no program was produced"))
    };

    let out = match emit {
        EmitStage::Order => {
            let order = state.order.as_ref().map(|o| o.ids(graph)).unwrap_or_default();
            lines(order)
        }
        EmitStage::Slots => {
            let slots = state
                .slots
                .as_ref()
                .map(|s| s.assignments(graph))
                .unwrap_or_default();
            lines(slots.into_iter().map(|(id, slot)| format!("v{slot}\t{id}")))
        }
        EmitStage::Dot => dot::emit_dot(graph, state.slots.as_ref()).into_bytes(),
        EmitStage::Bytes => program()?.bytes.clone(),
        EmitStage::Csv => format!("{}\n", encode::to_csv(&program()?.bytes)).into_bytes(),
        EmitStage::Frame => encode::frame(&program()?.bytes).map_err(|e| Diagnostic::from(&e))?,
        EmitStage::CArray => encode::to_c_array("logic_program", &program()?.bytes).into_bytes(),
        EmitStage::Asm => {
            let insts = disasm::disassemble(&program()?.bytes)
                .map_err(|e| Diagnostic::new(DiagLevel::Error, e.to_string()))?;
            disasm::listing(&insts).into_bytes()
        }
        EmitStage::BuildInfo => compute_provenance(text, program()?)
            .to_json()
            .map_err(|e| Diagnostic::new(DiagLevel::Error, e.to_string()))?
            .into_bytes(),
    };
    Ok(out)
}

fn lines<I, S>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut s = String::new();
    for item in items {
        s.push_str(item.as_ref());
        s.push('\n');
    }
    s.into_bytes()
}

fn write_output(path: Option<&Path>, data: &[u8]) -> std::io::Result<()> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::write(p, data),
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()
        }
    }
}
