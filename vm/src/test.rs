use std::collections::HashMap;

use crate::error::{ExecutionError, InvalidProgramError};
use crate::program::Program;

pub(crate) fn instruction_count(source: &str) -> Result<u64, ExecutionError> {
    let program = Program::load(source).expect("program should load");
    let mut machine = program.machine();
    machine.run()
}

pub(crate) fn final_variables(source: &str) -> HashMap<String, String> {
    let program = Program::load(source).expect("program should load");
    let mut machine = program.machine();
    machine.run().expect("program should run to completion");
    machine
        .variable_names()
        .iter()
        .map(|name| (name.clone(), machine.get_variable(name).unwrap()))
        .collect()
}

pub(crate) fn run_error(source: &str) -> ExecutionError {
    let program = Program::load(source).expect("program should load");
    let mut machine = program.machine();
    machine.run().expect_err("program should fail")
}

pub(crate) fn load_error(source: &str) -> InvalidProgramError {
    Program::load(source).expect_err("program should fail to load")
}

#[test]
fn minimal_program_terminates() {
    assert_eq!(instruction_count("a;;Xx").unwrap(), 1);
}

#[test]
fn instruction_count_reflects_a_jump() {
    // a;42;Ju3Lc0St0Xx: jump straight past the store, skipping it.
    let vars = final_variables("a;42;Ju3Lc0St0Xx");
    assert_eq!(vars.get("a").unwrap(), "0");
}

#[test]
fn missing_sections_is_rejected() {
    assert_eq!(load_error("a|42|Xx"), InvalidProgramError::MissingSections);
}

#[test]
fn reset_zeroes_every_variable_then_applies_overrides() {
    let program = Program::load("a|b;;Lv0Lv1AdSt0Xx").unwrap();
    let mut machine = program.machine();
    machine.set_variable("a", "10").unwrap();
    machine.set_variable("b", "5").unwrap();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "15");

    let mut overrides = HashMap::new();
    overrides.insert("b".to_string(), "3".to_string());
    machine.reset(&overrides).unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "0");
    assert_eq!(machine.get_variable("b").unwrap(), "3");

    machine.run().unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "3");
}

mod instructions;
