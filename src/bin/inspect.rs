//! Mochi Console Inspector
//!
//! Reads escape-coded text from stdin or a file and shows how it parses,
//! what it strips to, or what it renders as on an emulated console.

use std::io::{self, Read};
use std::process::ExitCode;

use mochi_console::emulator::{self, ConsoleApi, EmulatorState, HeadlessConsole};
use mochi_console::{parser, RenderConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let config = RenderConfig::load_or_default();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let (mut cols, mut rows) = config.buffer_size();
    let mut input_file: Option<String> = None;
    let mut mode = Mode::Render;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--cols" => {
                i += 1;
                if i < args.len() {
                    cols = args[i].parse().unwrap_or(cols);
                }
            },
            "-r" | "--rows" => {
                i += 1;
                if i < args.len() {
                    rows = args[i].parse().unwrap_or(rows);
                }
            },
            "-j" | "--json" => mode = Mode::Json,
            "-s" | "--strip" => mode = Mode::Strip,
            "--render" => mode = Mode::Render,
            "-h" | "--help" => show_help = true,
            _ => {
                if input_file.is_none() && !args[i].starts_with('-') {
                    input_file = Some(args[i].clone());
                }
            },
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let input_data = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            },
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        },
    };
    let input = String::from_utf8_lossy(&input_data);

    let result = match mode {
        Mode::Json => print_blocks(&input),
        Mode::Strip => parser::strip(&input).map(|text| print!("{}", text)).map_err(|e| e.to_string()),
        Mode::Render => print_render(&input, cols, rows),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Json,
    Strip,
    Render,
}

fn print_blocks(input: &str) -> Result<(), String> {
    let blocks = parser::parse(input).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&blocks).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn print_render(input: &str, cols: usize, rows: usize) -> Result<(), String> {
    let mut console = HeadlessConsole::new(cols, rows);
    let mut state = EmulatorState::new();
    let written = emulator::emulate(&mut state, &mut console, input).map_err(|e| e.to_string())?;

    let cursor = console.cursor();
    println!("Console ({}x{}), {} printable chars:", cols, rows, written);
    println!("Cursor: ({}, {})", cursor.row, cursor.col);
    println!("---");
    for line in console.lines() {
        println!("{}", line);
    }
    println!("---");
    Ok(())
}

fn print_help() {
    println!("Mochi Console Inspector");
    println!();
    println!("Usage: mochi-console-inspect [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>     Console width (default: terminal width)");
    println!("  -r, --rows <N>     Console height (default: terminal height)");
    println!("  -j, --json         Print parsed command blocks as JSON");
    println!("  -s, --strip        Print the text with escape sequences removed");
    println!("      --render       Print the emulated console grid (default)");
    println!("  -h, --help         Show this help message");
    println!();
    println!("If no input file is specified, reads from stdin.");
    println!();
    println!("Examples:");
    println!("  printf '\\x1b[31mred\\x1b[0m' | mochi-console-inspect --json");
    println!("  mochi-console-inspect -c 40 -r 10 log.txt");
}
