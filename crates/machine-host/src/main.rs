//! CLI entry point for the x86 bus simulator.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use instruction_codec::{decode, encode, parse, render, WordBits};
use machine_core::MachineConfig;
use machine_host::Machine;
use serde as _;
#[cfg(test)]
use tempfile as _;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: x86-sim <command> [options]

Commands:
  run <text>...     Load instructions into memory, then fetch and decode them
  encode <text>     Print the machine word for instruction text
  decode <value>    Print the instruction text for a machine word

Options:
  -c, --config <file>        Machine configuration as JSON (run only)
  -a, --address-lines <n>    Override the processor's address lines (run only)
  -w, --word-bits <8|16|32>  Word width for encode/decode (default: 8)
  -j, --json                 Print the run report as JSON (run only)
  -v, --verbose              Log bus traffic to stderr
  -h, --help                 Show this help message

Values passed to decode may be decimal, 0x-prefixed hex, or a numeral in the
word's alphabet prefixed with `@`.

Examples:
  x86-sim run M O V
  x86-sim run MV AX --config machine.json --json
  x86-sim encode M
  x86-sim decode 0x4D
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    Encode(CodecArgs),
    Decode(CodecArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    program: Vec<String>,
    config: Option<PathBuf>,
    address_lines: Option<u32>,
    json: bool,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct CodecArgs {
    input: String,
    word: WordBits,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "encode" => parse_codec_args(args)
            .map(Command::Encode)
            .map(ParseResult::Command),
        "decode" => parse_codec_args(args)
            .map(Command::Decode)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn option_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &OsString,
) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut program = Vec::new();
    let mut config = None;
    let mut address_lines = None;
    let mut json = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "--json" || arg == "-j" {
            json = true;
            continue;
        }

        if arg == "--config" || arg == "-c" {
            config = Some(PathBuf::from(option_value(&mut args, &arg)?));
            continue;
        }

        if arg == "--address-lines" || arg == "-a" {
            let value = option_value(&mut args, &arg)?;
            let lines = value
                .parse::<u32>()
                .map_err(|_| format!("invalid address line count: {value}"))?;
            address_lines = Some(lines);
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        program.push(arg.to_string_lossy().to_string());
    }

    if program.is_empty() {
        return Err("missing program text".to_string());
    }
    Ok(RunArgs {
        program,
        config,
        address_lines,
        json,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_codec_args(mut args: impl Iterator<Item = OsString>) -> Result<CodecArgs, String> {
    let mut input: Option<String> = None;
    let mut word = WordBits::default();
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "--word-bits" || arg == "-w" {
            let value = option_value(&mut args, &arg)?;
            word = value
                .parse::<u32>()
                .map_err(|_| format!("invalid word width: {value}"))
                .and_then(|bits| WordBits::from_bits(bits).map_err(|e| e.to_string()))?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple inputs provided".to_string());
        }
        input = Some(arg.to_string_lossy().to_string());
    }

    let input = input.ok_or_else(|| "missing input".to_string())?;
    Ok(CodecArgs {
        input,
        word,
        verbose,
    })
}

fn parse_word_value(input: &str, word: WordBits) -> Result<u64, String> {
    if let Some(numeral) = input.strip_prefix('@') {
        return parse(numeral, word).map_err(|e| e.to_string());
    }
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid word value: {input}"))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &RunArgs) -> Result<MachineConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            serde_json::from_str(&raw)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?
        }
        None => MachineConfig::default(),
    };
    if let Some(lines) = args.address_lines {
        config.address_lines = lines;
    }
    debug!(?config, "machine configuration");
    Ok(config)
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    let config = load_config(args).map_err(|e| {
        eprintln!("error: {e}");
        2
    })?;

    let mut machine = Machine::new(&config).map_err(|e| {
        eprintln!("error: {e} ({:?})", e.class());
        1
    })?;

    let program: Vec<&str> = args.program.iter().map(String::as_str).collect();
    let report = machine
        .load_program(&program)
        .and_then(|words| machine.run(words))
        .map_err(|e| {
            eprintln!("error: {e} ({:?})", e.class());
            1
        })?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            eprintln!("error: failed to serialize report: {e}");
            1
        })?;
        println!("{json}");
        return Ok(());
    }

    for step in &report.steps {
        let word = step
            .word
            .map_or_else(|| "--".to_string(), |word| format!("{word:#04X}"));
        println!(
            "{:#07X}: {word} {}",
            step.physical_address,
            step.text.as_deref().unwrap_or("<empty queue>")
        );
    }
    println!("Decoded: {}", report.text);
    Ok(())
}

fn run_encode(args: &CodecArgs) -> Result<(), i32> {
    let value = encode(&args.input, args.word).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;
    println!("{value:#X} ({} in base {})", render(value, args.word), args.word.radix());
    Ok(())
}

fn run_decode(args: &CodecArgs) -> Result<(), i32> {
    let text = parse_word_value(&args.input, args.word)
        .and_then(|value| decode(value, args.word).map_err(|e| e.to_string()))
        .map_err(|e| {
            eprintln!("error: {e}");
            1
        })?;
    println!("{text}");
    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let verbose = match &command {
                Command::Run(args) => args.verbose,
                Command::Encode(args) | Command::Decode(args) => args.verbose,
            };
            init_logging(verbose);
            let result = match &command {
                Command::Run(args) => run_program(args),
                Command::Encode(args) => run_encode(args),
                Command::Decode(args) => run_decode(args),
            };
            match result {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
