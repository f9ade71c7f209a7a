//! Command line options for the `con` binary.

use std::{ffi::OsString, path::PathBuf};

use crate::gc::HeapConfig;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Options {
    pub heap: HeapConfig,
    /// Expressions given with `-e`, evaluated in order.
    pub eval: Vec<String>,
    pub filename: Option<PathBuf>,
    pub help: bool,
}

pub const USAGE: &str = "\
Usage: con [options] [input file]
Options:
  -h, --help                     Print this help message
  -e, --eval <expr>              Evaluate <expr> and print the result (repeatable)
  --arena-capacity <slots>       Slots per heap arena (default: 4096)
  --gc-initial-threshold <n>     Allocations before the first collection (default: 10000)
  --gc-threshold <n>             Allocations between later collections (default: 100000)
  --max-arenas <n>               Fail allocation instead of growing past <n> arenas

Without an input file or -e, expressions are read from standard input.";

pub fn parse() -> Result<Options, String> {
    parse_from(std::env::args_os().skip(1).collect())
}

pub fn parse_from(args: Vec<OsString>) -> Result<Options, String> {
    let mut args = pico_args::Arguments::from_vec(args);
    let mut options = Options::default();

    if args.contains(["-h", "--help"]) {
        options.help = true;
        return Ok(options);
    }

    let defaults = HeapConfig::default();
    options.heap = HeapConfig {
        arena_capacity: args
            .opt_value_from_str("--arena-capacity")
            .map_err(|e| e.to_string())?
            .unwrap_or(defaults.arena_capacity),
        initial_threshold: args
            .opt_value_from_str("--gc-initial-threshold")
            .map_err(|e| e.to_string())?
            .unwrap_or(defaults.initial_threshold),
        threshold: args
            .opt_value_from_str("--gc-threshold")
            .map_err(|e| e.to_string())?
            .unwrap_or(defaults.threshold),
        max_arenas: args
            .opt_value_from_str("--max-arenas")
            .map_err(|e| e.to_string())?,
    };
    if options.heap.arena_capacity == 0 || options.heap.arena_capacity > u32::MAX as usize {
        return Err(format!("--arena-capacity must be between 1 and {}", u32::MAX));
    }

    options.eval = args
        .values_from_str(["-e", "--eval"])
        .map_err(|e| e.to_string())?;
    options.filename = args
        .opt_free_from_str::<PathBuf>()
        .map_err(|e| e.to_string())?;

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(format!("unexpected arguments: {rest:?}"));
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        parse_from(args.iter().map(OsString::from).collect())
    }

    #[test]
    fn defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.heap, HeapConfig::default());
        assert!(options.eval.is_empty());
        assert_eq!(options.filename, None);
        assert!(!options.help);
    }

    #[test]
    fn heap_settings_and_inputs() {
        let options = parse(&[
            "--arena-capacity",
            "128",
            "--gc-threshold",
            "500",
            "--max-arenas",
            "4",
            "-e",
            "(+ 1 2)",
            "--eval",
            "x",
            "prog.con",
        ])
        .unwrap();
        assert_eq!(options.heap.arena_capacity, 128);
        assert_eq!(options.heap.threshold, 500);
        assert_eq!(options.heap.initial_threshold, 10_000);
        assert_eq!(options.heap.max_arenas, Some(4));
        assert_eq!(options.eval, vec!["(+ 1 2)".to_owned(), "x".to_owned()]);
        assert_eq!(options.filename, Some(PathBuf::from("prog.con")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--gc-threshold", "lots"]).is_err());
        assert!(parse(&["--arena-capacity", "0"]).is_err());
        assert!(parse(&["--arena-capacity", "4294967296"]).is_err());
        assert_eq!(
            parse(&["--arena-capacity", "4294967295"]).unwrap().heap.arena_capacity,
            u32::MAX as usize
        );
        assert!(parse(&["a", "b"]).is_err());
    }

    #[test]
    fn help() {
        assert!(parse(&["--help"]).unwrap().help);
    }
}
