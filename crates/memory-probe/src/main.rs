//! CLI entry point for the memprobe binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use memory_api::{
    AccessWidth, ApiConfig, ByteDomain, DomainList, Endianness, MemoryApi, StaticMachine,
    TracingSink, MAX_RANGE_LEN,
};
#[cfg(test)]
use tempfile as _;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: memprobe <command> [options]

Commands:
  hash <file> [--addr <n>] [--count <n>]   SHA-256 of a byte range (default: whole file)
  read <file> <addr> [read options]        Read one typed value
  dump <file> <addr> <length>              Hex dump, zero-filled past the end

Read options:
  -w, --width <1|2|3|4>  Access width in bytes (default: 1)
  -s, --signed           Sign-extend the value
  -b, --big-endian       Assemble bytes most significant first
  -f, --float            Read a 32-bit IEEE-754 float

Options:
  -d, --domain <name>  Domain name for the loaded file (default: FILE)
  -h, --help           Show this help message

Numbers are decimal or 0x-prefixed hex. Set RUST_LOG to control diagnostics.

Examples:
  memprobe hash rom.bin
  memprobe hash rom.bin --addr 0x100 --count 0x40
  memprobe read ram.bin 0x10 --width 2 --big-endian
  memprobe dump ram.bin 0 64
";

const DEFAULT_DOMAIN: &str = "FILE";
const DUMP_ROW_BYTES: usize = 16;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Hash(HashArgs),
    Read(ReadArgs),
    Dump(DumpArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct HashArgs {
    input: PathBuf,
    domain: String,
    addr: i64,
    count: Option<usize>,
}

#[derive(Debug, PartialEq, Eq)]
struct ReadArgs {
    input: PathBuf,
    domain: String,
    addr: i64,
    width: AccessWidth,
    signed: bool,
    big_endian: bool,
    float: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct DumpArgs {
    input: PathBuf,
    domain: String,
    addr: i64,
    length: usize,
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

    let parsed = match command_str.as_str() {
        "hash" => parse_hash_args(args)?.map(Command::Hash),
        "read" => parse_read_args(args)?.map(Command::Read),
        "dump" => parse_dump_args(args)?.map(Command::Dump),
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(parsed.map_or(ParseResult::Help, ParseResult::Command))
}

/// Parses a decimal or `0x` hex integer with an optional leading minus.
fn parse_number(text: &str) -> Result<i64, String> {
    let (negative, digits) = text
        .strip_prefix('-')
        .map_or((false, text), |rest| (true, rest));
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|_| format!("invalid number: {text}"))?;

    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_count(text: &str) -> Result<usize, String> {
    parse_number(text)
        .and_then(|n| usize::try_from(n).map_err(|_| format!("invalid count: {text}")))
}

fn parse_dump_length(text: &str) -> Result<usize, String> {
    let length = parse_count(text)?;
    if length > MAX_RANGE_LEN {
        return Err(format!("length {text} exceeds the maximum of {MAX_RANGE_LEN} bytes"));
    }
    Ok(length)
}

fn take_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {flag}"))
}

/// Splits arguments into positionals, handing each flag to `on_flag`.
///
/// `on_flag` returns `Ok(false)` for flags it does not recognize. A help flag
/// anywhere yields `Ok(None)`.
#[allow(clippy::while_let_on_iterator)]
fn collect_positionals<I, F>(mut args: I, mut on_flag: F) -> Result<Option<Vec<String>>, String>
where
    I: Iterator<Item = OsString>,
    F: FnMut(&str, &mut I) -> Result<bool, String>,
{
    let mut positionals = Vec::new();

    while let Some(arg) = args.next() {
        let arg = arg.to_string_lossy().to_string();
        if arg == "--help" || arg == "-h" {
            return Ok(None);
        }

        let looks_numeric = parse_number(&arg).is_ok();
        if arg.starts_with('-') && !looks_numeric {
            if !on_flag(&arg, &mut args)? {
                return Err(format!("unknown option: {arg}"));
            }
            continue;
        }

        positionals.push(arg);
    }

    Ok(Some(positionals))
}

fn parse_hash_args(args: impl Iterator<Item = OsString>) -> Result<Option<HashArgs>, String> {
    let mut domain = DEFAULT_DOMAIN.to_string();
    let mut addr = 0;
    let mut count = None;

    let positionals = collect_positionals(args, |flag, rest| {
        match flag {
            "-d" | "--domain" => domain = take_value(rest, flag)?,
            "-a" | "--addr" => addr = parse_number(&take_value(rest, flag)?)?,
            "-c" | "--count" => count = Some(parse_count(&take_value(rest, flag)?)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    let Some(positionals) = positionals else {
        return Ok(None);
    };

    match positionals.as_slice() {
        [input] => Ok(Some(HashArgs {
            input: PathBuf::from(input),
            domain,
            addr,
            count,
        })),
        [] => Err("missing input path".to_string()),
        _ => Err("multiple input paths provided".to_string()),
    }
}

fn parse_read_args(args: impl Iterator<Item = OsString>) -> Result<Option<ReadArgs>, String> {
    let mut domain = DEFAULT_DOMAIN.to_string();
    let mut width = AccessWidth::Bits8;
    let mut signed = false;
    let mut big_endian = false;
    let mut float = false;

    let positionals = collect_positionals(args, |flag, rest| {
        match flag {
            "-d" | "--domain" => domain = take_value(rest, flag)?,
            "-w" | "--width" => {
                let value = take_value(rest, flag)?;
                width = value
                    .parse::<u8>()
                    .ok()
                    .and_then(AccessWidth::from_bytes)
                    .ok_or_else(|| format!("invalid width: {value} (expected 1, 2, 3 or 4)"))?;
            }
            "-s" | "--signed" => signed = true,
            "-b" | "--big-endian" => big_endian = true,
            "-f" | "--float" => float = true,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    let Some(positionals) = positionals else {
        return Ok(None);
    };

    if float && width != AccessWidth::Bits8 && width != AccessWidth::Bits32 {
        return Err("--float reads 4 bytes and cannot be combined with --width".to_string());
    }

    match positionals.as_slice() {
        [input, addr] => Ok(Some(ReadArgs {
            input: PathBuf::from(input),
            domain,
            addr: parse_number(addr)?,
            width,
            signed,
            big_endian,
            float,
        })),
        [] => Err("missing input path".to_string()),
        [_] => Err("missing address".to_string()),
        _ => Err("too many arguments".to_string()),
    }
}

fn parse_dump_args(args: impl Iterator<Item = OsString>) -> Result<Option<DumpArgs>, String> {
    let mut domain = DEFAULT_DOMAIN.to_string();

    let positionals = collect_positionals(args, |flag, rest| {
        match flag {
            "-d" | "--domain" => domain = take_value(rest, flag)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    let Some(positionals) = positionals else {
        return Ok(None);
    };

    match positionals.as_slice() {
        [input, addr, length] => Ok(Some(DumpArgs {
            input: PathBuf::from(input),
            domain,
            addr: parse_number(addr)?,
            length: parse_dump_length(length)?,
        })),
        [] => Err("missing input path".to_string()),
        [_] => Err("missing address".to_string()),
        [_, _] => Err("missing length".to_string()),
        _ => Err("too many arguments".to_string()),
    }
}

/// Loads `input` as the single read-only domain of a machine named after the file.
fn load_machine(input: &Path, domain: &str) -> Result<StaticMachine, i32> {
    let bytes = fs::read(input).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", input.display());
        1
    })?;
    tracing::debug!(path = %input.display(), size = bytes.len(), domain, "loaded image");

    let domains = DomainList::new(vec![ByteDomain::read_only(domain, bytes)]).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;
    Ok(StaticMachine::new(input.display().to_string(), domains))
}

fn report<T>(result: Result<T, memory_api::MemoryApiError>) -> Result<T, i32> {
    result.map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn run_hash(args: &HashArgs) -> Result<(), i32> {
    let mut machine = load_machine(&args.input, &args.domain)?;
    let mut api = MemoryApi::new(&mut machine);

    let count = match args.count {
        Some(count) => count,
        None => {
            let size = report(api.current_domain_size())?;
            let remaining = u64::try_from(args.addr)
                .ok()
                .and_then(|addr| size.checked_sub(addr))
                .unwrap_or(0);
            usize::try_from(remaining).map_err(|_| {
                eprintln!("error: image too large to hash");
                1
            })?
        }
    };

    let digest = report(api.hash_region(args.addr, count, None))?;
    println!("{digest}");
    Ok(())
}

fn run_read(args: &ReadArgs) -> Result<(), i32> {
    let mut machine = load_machine(&args.input, &args.domain)?;
    let config = ApiConfig {
        endianness: Endianness::from_big(args.big_endian),
        default_domain: Some(args.domain.clone()),
    };
    let mut api = MemoryApi::with_config(&mut machine, &config, TracingSink);

    if args.float {
        let value = report(api.read_float(args.addr, None))?;
        println!("{value}");
    } else {
        let request = api.request(args.addr, args.width, args.signed);
        let value = report(api.read(&request, None))?;
        println!("{value}");
    }
    Ok(())
}

fn run_dump(args: &DumpArgs) -> Result<(), i32> {
    let mut machine = load_machine(&args.input, &args.domain)?;
    let mut api = MemoryApi::new(&mut machine);

    let bytes = report(api.read_byte_range(args.addr, args.length, None))?;
    for line in format_dump(args.addr, &bytes) {
        println!("{line}");
    }
    Ok(())
}

fn format_address(addr: i128) -> String {
    if addr < 0 {
        format!("-{:07X}", addr.unsigned_abs())
    } else {
        format!("{addr:08X}")
    }
}

fn format_dump(start: i64, bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(DUMP_ROW_BYTES)
        .zip((i128::from(start)..).step_by(DUMP_ROW_BYTES))
        .map(|(row, addr)| {
            let hex_bytes: String = row
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}: {hex_bytes}", format_address(addr))
        })
        .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let result = match &command {
                Command::Hash(args) => run_hash(args),
                Command::Read(args) => run_read(args),
                Command::Dump(args) => run_dump(args),
            };
            result.err().unwrap_or(0)
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
