#[macro_use]
extern crate clap;

use std::collections::{HashMap, HashSet};
use std::fs;

use clap::{Arg, ArgGroup};

use abysmal_compiler::{CompilationError, SourceLine, SourceMap};
use abysmal_decimal::{Decimal, DecimalError};
use abysmal_vm::{ExecutionError, InvalidProgramError, InvalidVariableValue, Program};

#[derive(Debug)]
enum Error {
    Io(std::io::Error),
    Clap(clap::Error),
    Compilation(CompilationError),
    Load(InvalidProgramError),
    Run(ExecutionError),
    Decimal(DecimalError),
    Variable(InvalidVariableValue),
    Usage(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CompilationError> for Error {
    fn from(err: CompilationError) -> Error {
        Error::Compilation(err)
    }
}

impl From<InvalidProgramError> for Error {
    fn from(err: InvalidProgramError) -> Error {
        Error::Load(err)
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Error {
        Error::Run(err)
    }
}

impl From<DecimalError> for Error {
    fn from(err: DecimalError) -> Error {
        Error::Decimal(err)
    }
}

impl From<InvalidVariableValue> for Error {
    fn from(err: InvalidVariableValue) -> Error {
        Error::Variable(err)
    }
}

/// Splits a `NAME=VALUE` command-line argument into its two halves.
fn split_assignment<'a>(text: &'a str, flag: &str) -> Result<(&'a str, &'a str), Error> {
    let mut parts = text.splitn(2, '=');
    let name = parts.next().unwrap_or("");
    let value = parts.next().ok_or_else(|| {
        Error::Usage(format!("--{} expects NAME=VALUE, got \"{}\"", flag, text))
    })?;
    Ok((name, value))
}

fn parse_vars(matches: &clap::ArgMatches) -> Result<HashMap<String, String>, Error> {
    let mut vars = HashMap::new();
    if let Some(values) = matches.values_of("var") {
        for text in values {
            let (name, value) = split_assignment(text, "var")?;
            vars.insert(name.to_string(), value.to_string());
        }
    }
    Ok(vars)
}

fn parse_constants(matches: &clap::ArgMatches) -> Result<HashMap<String, Decimal>, Error> {
    let mut constants = HashMap::new();
    if let Some(values) = matches.values_of("const") {
        for text in values {
            let (name, value) = split_assignment(text, "const")?;
            constants.insert(name.to_string(), Decimal::parse(value)?);
        }
    }
    Ok(constants)
}

/// Renders a source map as one line per instruction: the source line (or
/// range) it was compiled from, or `-` for synthetic instructions.
fn format_source_map(source_map: &SourceMap) -> String {
    let mut rendered = String::new();
    for entry in source_map {
        match entry {
            Some(SourceLine::Single(line)) => rendered.push_str(&line.to_string()),
            Some(SourceLine::Range(start, end)) => {
                rendered.push_str(&format!("{}-{}", start, end))
            }
            None => rendered.push('-'),
        }
        rendered.push('\n');
    }
    rendered
}

fn compile_source(
    path: &str,
    matches: &clap::ArgMatches,
) -> Result<(Program, Option<SourceMap>), Error> {
    let source = fs::read_to_string(path)?;
    let variable_names: HashSet<String> = parse_vars(matches)?.keys().cloned().collect();
    let constants = parse_constants(matches)?;

    let (program, source_map) = abysmal_compiler::compile(&source, &variable_names, &constants)?;

    if let Some(out_path) = matches.value_of("out") {
        fs::write(out_path, program.source())?;
    }
    if let Some(map_path) = matches.value_of("source-map") {
        fs::write(map_path, format_source_map(&source_map))?;
    }

    Ok((program, Some(source_map)))
}

fn load_compiled(path: &str) -> Result<(Program, Option<SourceMap>), Error> {
    let dsmal = fs::read_to_string(path)?;
    let program = Program::load(&dsmal)?;
    Ok((program, None))
}

fn run(matches: &clap::ArgMatches) -> Result<(), Error> {
    let (program, source_map) = match matches.value_of("source") {
        Some(source_path) => compile_source(source_path, matches)?,
        None => load_compiled(matches.value_of("PROGRAM").unwrap())?,
    };

    if matches.is_present("compile-only") {
        return Ok(());
    }

    let mut machine = program.machine();

    if matches.is_present("instruction-limit") {
        let limit = value_t!(matches.value_of("instruction-limit"), u64).map_err(Error::Clap)?;
        machine.set_instruction_limit(Some(limit));
    }

    for (name, value) in parse_vars(matches)? {
        machine.set_variable(&name, &value)?;
    }

    if matches.is_present("coverage") {
        let source_map = source_map.ok_or_else(|| {
            Error::Usage("--coverage requires --source, since coverage is reported in terms of the source map".to_string())
        })?;
        let (executed, coverage) = machine.run_with_coverage()?;
        println!("Executed {} instruction(s).", executed);

        let (partially_covered, uncovered) =
            abysmal_coverage::get_uncovered_lines(&source_map, &[coverage]);
        if uncovered.is_empty() && partially_covered.is_empty() {
            println!("Every source line was fully covered.");
        } else {
            if !partially_covered.is_empty() {
                println!("Partially covered lines: {:?}", partially_covered);
            }
            if !uncovered.is_empty() {
                println!("Uncovered lines: {:?}", uncovered);
            }
        }
    } else {
        let executed = machine.run()?;
        println!("Executed {} instruction(s).", executed);
    }

    for name in machine.variable_names() {
        println!("{} = {}", name, machine.get_variable(name).unwrap());
    }

    Ok(())
}

/// Prints `text` in its canonical decimal form (suffixes expanded,
/// trailing zeros dropped) without compiling or running anything.
fn canon(text: &str) -> Result<(), Error> {
    match abysmal_compiler::canonicalize_number_literal(text) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(Error::Usage(format!("\"{}\" is not a valid literal", text))),
    }
}

fn main() -> Result<(), Error> {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("PROGRAM")
                .help("A compiled .dsmal bytecode file to load and run")
                .index(1),
        )
        .arg(
            Arg::with_name("canon")
                .long("canon")
                .takes_value(true)
                .value_name("LITERAL")
                .conflicts_with("input")
                .help("Prints LITERAL (e.g. \"42k\" or \"5%\") in its canonical decimal form and exits"),
        )
        .arg(
            Arg::with_name("source")
                .short("s")
                .long("source")
                .takes_value(true)
                .value_name("SOURCE")
                .help("An Abysmal .aby source file to compile"),
        )
        .group(ArgGroup::with_name("input").args(&["PROGRAM", "source"]))
        .arg(
            Arg::with_name("out")
                .short("o")
                .long("out")
                .takes_value(true)
                .value_name("PATH")
                .help("Writes the compiled DSMAL string here (requires --source)"),
        )
        .arg(
            Arg::with_name("source-map")
                .long("source-map")
                .takes_value(true)
                .value_name("PATH")
                .help("Writes the source map here, one entry per instruction (requires --source)"),
        )
        .arg(
            Arg::with_name("compile-only")
                .long("compile-only")
                .help("Compiles (and optionally writes --out/--source-map) without running"),
        )
        .arg(
            Arg::with_name("var")
                .long("var")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("NAME=VALUE")
                .help("Declares an external variable (when compiling) and/or sets its initial value"),
        )
        .arg(
            Arg::with_name("const")
                .long("const")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("NAME=VALUE")
                .help("Declares a named constant available to the compiled source (requires --source)"),
        )
        .arg(
            Arg::with_name("instruction-limit")
                .long("instruction-limit")
                .takes_value(true)
                .value_name("COUNT")
                .help("Aborts the run after COUNT instructions instead of running unbounded"),
        )
        .arg(
            Arg::with_name("coverage")
                .long("coverage")
                .help("Runs with per-instruction coverage and reports uncovered source lines (requires --source)"),
        )
        .get_matches();

    if let Some(text) = matches.value_of("canon") {
        return canon(text);
    }
    if !matches.is_present("input") {
        return Err(Error::Usage(
            "either PROGRAM, --source, or --canon is required".to_string(),
        ));
    }
    run(&matches)
}
