//! Fabula CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use fabula_runtime::{Carry, ScriptIo, Session, TerminalIo, vocabulary};
use fabula_stdlib::{demo, standard_grammar};
use tracing_subscriber::EnvFilter;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    show_help: bool,
    show_version: bool,
    log: Option<String>,
    script: Option<PathBuf>,
    dump_world: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--dump-world" => config.dump_world = true,
            "--log" => {
                config.log = Some(args.next().ok_or("--log requires a value")?);
            }
            "--script" => {
                config.script = Some(PathBuf::from(args.next().ok_or("--script requires a file")?));
            }
            other => return Err(format!("unknown option: {other}").into()),
        }
    }

    Ok(config)
}

fn init_logging(level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("fabula {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(config.log.as_deref())?;
    let story = demo::story()?;

    if config.dump_world {
        print!("{}", story.world.dump());
        return Ok(());
    }

    let opening = Carry::Input("look".to_string());
    if let Some(path) = &config.script {
        let script = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        Session::new(story, ScriptIo::new(&script)).play_from(opening);
        return Ok(());
    }

    let io = TerminalIo::new(vocabulary(&standard_grammar()?))?;
    println!("\x1b[1mFabula\x1b[0m {} (Ctrl+D to quit)\n", env!("CARGO_PKG_VERSION"));
    Session::new(story, io).play_from(opening);
    println!("\nGoodbye!");
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mFabula\x1b[0m - Rule-driven interactive fiction

\x1b[1mUSAGE:\x1b[0m
    fabula [OPTIONS]

\x1b[1mOPTIONS:\x1b[0m
    -h, --help          Print help information
    -V, --version       Print version information
    --log LEVEL         Log filter for stderr, e.g. debug or fabula_engine=trace
                        (defaults to RUST_LOG, then warn)
    --script FILE       Read commands from FILE instead of the terminal
    --dump-world        Print the starting world and exit

\x1b[1mIN-GAME COMMANDS:\x1b[0m
    dump                Print the live world
    save PATH           Save a snapshot
    restore PATH        Restore a snapshot
    Ctrl+D              Quit
    Ctrl+C              Discard the current line"
    );
}
