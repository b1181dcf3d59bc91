use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tmengine::{
    paradox, HaltingOracle, MachineDefinition, ProgramLoader, ProgramManager, TraceEntry,
    TuringMachine, Verdict,
};

const WINDOW_RADIUS: usize = 10;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// The machine definition file to execute (a definition can also be piped on stdin)
    #[clap(short, long, conflicts_with = "machine")]
    program: Option<PathBuf>,

    /// Run a built-in machine by name (see --list)
    #[clap(short, long)]
    machine: Option<String>,

    /// Input for the machine; repeat to run several inputs (default: the sample input)
    #[clap(short, long)]
    input: Vec<String>,

    /// Override the step limit of the definition
    #[clap(long)]
    max_steps: Option<usize>,

    /// Print each step of the execution with a view of the tape around the head
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the executed transitions after each run
    #[clap(long)]
    trace: bool,

    /// Print one JSON report per input instead of plain text
    #[clap(long)]
    json: bool,

    /// List the built-in machines and exit
    #[clap(long)]
    list: bool,

    /// Ask the halting oracle about the machine that contradicts it
    #[clap(long)]
    paradox: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    machine: &'a str,
    input: &'a str,
    verdict: Verdict,
    steps: usize,
    tape: String,
    trace: &'a [TraceEntry],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    if cli.list {
        list_programs()?;
        return Ok(());
    }

    if cli.paradox {
        run_paradox(cli.input.first().map(String::as_str).unwrap_or(""));
        return Ok(());
    }

    let definition = select_definition(&cli)?;
    let inputs = if cli.input.is_empty() {
        vec![definition.sample_input().to_string()]
    } else {
        cli.input.clone()
    };

    let mut machine = TuringMachine::new(definition.clone(), "");
    if let Some(limit) = cli.max_steps {
        machine.set_step_limit(limit);
    }

    for input in &inputs {
        machine.reset(input);

        let verdict = if cli.debug && !cli.json {
            run_debug(&mut machine)
        } else {
            machine.run(None).verdict
        };

        if cli.json {
            let report = Report {
                machine: definition.name(),
                input,
                verdict,
                steps: machine.step_count(),
                tape: machine.tape().trimmed(),
                trace: machine.trace(),
            };
            println!(
                "{}",
                serde_json::to_string(&report).context("Failed to serialize report")?
            );
            continue;
        }

        if cli.trace {
            for entry in machine.trace() {
                println!("{:>5}  {}", entry.step, entry);
            }
        }

        println!(
            "{} on {:?}: {} after {} steps",
            definition.name(),
            input,
            verdict,
            machine.step_count()
        );
        println!("{}", machine.tape().trimmed());
    }

    Ok(())
}

/// Picks the definition from a file, the catalog, or stdin, falling back to the first
/// built-in machine.
fn select_definition(cli: &Cli) -> Result<Arc<MachineDefinition>> {
    if let Some(path) = &cli.program {
        let definition = ProgramLoader::load_program(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        return Ok(Arc::new(definition));
    }

    if let Some(name) = &cli.machine {
        return Ok(ProgramManager::get_program_by_name(name)?);
    }

    if !atty::is(atty::Stream::Stdin) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read definition from stdin")?;

        if !content.trim().is_empty() {
            let definition = ProgramLoader::load_program_from_string(&content)
                .context("Failed to parse definition from stdin")?;
            return Ok(Arc::new(definition));
        }
    }

    Ok(ProgramManager::get_program_by_index(0)?)
}

fn run_debug(machine: &mut TuringMachine) -> Verdict {
    print_window(machine);

    loop {
        let result = machine.step();
        println!("{}", result.message);

        if !result.continues() {
            break;
        }
        print_window(machine);
    }

    println!();
    machine.verdict().unwrap_or(Verdict::StuckNoTransition)
}

fn print_window(machine: &TuringMachine) {
    let window: String = machine
        .tape()
        .window(machine.head(), WINDOW_RADIUS)
        .into_iter()
        .collect();

    println!("  [{}] {}", machine.state(), window);
    println!("  {}{}^", " ".repeat(machine.state().len() + 3), " ".repeat(WINDOW_RADIUS));
}

fn list_programs() -> Result<()> {
    for index in 0..ProgramManager::count() {
        let info = ProgramManager::get_program_info(index)?;
        println!(
            "{:>2}. {} (states: {}, transitions: {}, sample: {:?})",
            info.index, info.name, info.state_count, info.transition_count, info.sample_input
        );
    }

    Ok(())
}

fn run_paradox(input: &str) {
    let oracle = HaltingOracle::default();

    match oracle.halts(paradox, input) {
        Ok(halts) => println!("The oracle says the paradox machine halts: {halts}"),
        Err(e) => println!("{e}"),
    }
}
