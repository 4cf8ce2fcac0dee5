use std::collections::{HashMap, HashSet};

use abysmal_decimal::Decimal;

use crate::error::CompilationErrorKind;
use crate::{compile, CompilationError};

fn vars(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn no_constants() -> HashMap<String, Decimal> {
    HashMap::new()
}

fn compile_ok(
    source: &str,
    variable_names: &HashSet<String>,
) -> (abysmal_vm::Program, crate::SourceMap) {
    compile(source, variable_names, &no_constants()).expect("program should compile")
}

fn compile_err(source: &str, variable_names: &HashSet<String>) -> CompilationError {
    compile(source, variable_names, &no_constants()).expect_err("program should fail to compile")
}

#[test]
fn ice_cream_vanilla_weekday() {
    let source = r#"
let TAX_RATE = 5.3%
let WEEKDAY_DISCOUNT = 25%
@start:
  price = scoops * (flavor == STRAWBERRY ? 1.25 : 1)
  price = price + (cone == WAFFLE ? 1.00 : 0.00)
  price = price + (sprinkles * 0.25)
  weekday not in {SATURDAY, SUNDAY} => @discount
  => @tax
@discount:
  price = price * (1 - WEEKDAY_DISCOUNT)
  => @tax
@tax:
  price = price * (1 + TAX_RATE)
"#;
    let names = vars(&["scoops", "flavor", "cone", "sprinkles", "weekday", "price"]);
    let mut constants = HashMap::new();
    constants.insert("STRAWBERRY".to_string(), Decimal::from_i64(3));
    constants.insert("WAFFLE".to_string(), Decimal::from_i64(2));
    constants.insert("SATURDAY".to_string(), Decimal::from_i64(6));
    constants.insert("SUNDAY".to_string(), Decimal::from_i64(7));

    let (program, _source_map) = compile(source, &names, &constants).expect("should compile");
    let mut machine = program.machine();
    machine.set_variable("flavor", "1").unwrap();
    machine.set_variable("scoops", "1").unwrap();
    machine.set_variable("cone", "1").unwrap();
    machine.set_variable("sprinkles", "0").unwrap();
    machine.set_variable("weekday", "1").unwrap();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("price").unwrap(), "0.78975");
}

#[test]
fn ice_cream_strawberry_weekend() {
    let source = r#"
let TAX_RATE = 5.3%
let WEEKDAY_DISCOUNT = 25%
@start:
  price = scoops * (flavor == STRAWBERRY ? 1.25 : 1)
  price = price + (cone == WAFFLE ? 1.00 : 0.00)
  price = price + (sprinkles * 0.25)
  weekday not in {SATURDAY, SUNDAY} => @discount
  => @tax
@discount:
  price = price * (1 - WEEKDAY_DISCOUNT)
  => @tax
@tax:
  price = price * (1 + TAX_RATE)
"#;
    let mut constants = HashMap::new();
    constants.insert("STRAWBERRY".to_string(), Decimal::from_i64(3));
    constants.insert("WAFFLE".to_string(), Decimal::from_i64(2));
    constants.insert("SATURDAY".to_string(), Decimal::from_i64(6));
    constants.insert("SUNDAY".to_string(), Decimal::from_i64(7));
    let names = vars(&["scoops", "flavor", "cone", "sprinkles", "weekday", "price"]);

    let (program, _) = compile(source, &names, &constants).expect("should compile");
    let mut machine = program.machine();
    machine.set_variable("flavor", "3").unwrap();
    machine.set_variable("scoops", "2").unwrap();
    machine.set_variable("cone", "2").unwrap();
    machine.set_variable("sprinkles", "1").unwrap();
    machine.set_variable("weekday", "6").unwrap();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("price").unwrap(), "3.94875");
}

#[test]
fn division_by_zero_is_an_execution_error() {
    let names = vars(&["x"]);
    let (program, _) = compile_ok("@start:\n  x = 1 / 0\n", &names);
    let mut machine = program.machine();
    let err = machine.run().expect_err("division by zero must fail");
    assert_eq!(err.to_string(), "illegal Dv at instruction 2");
}

#[test]
fn three_state_cycle_is_rejected() {
    let source = "@a:\n  => @b\n@b:\n  => @c\n@c:\n  => @a\n";
    let err = compile_err(source, &HashSet::new());
    match err.kind {
        CompilationErrorKind::Cycle(ref members) => {
            for label in ["@a", "@b", "@c"] {
                assert!(members.contains(label), "{members} should mention {label}");
            }
        }
        other => panic!("expected Cycle, got {:?}", other),
    }
}

#[test]
fn self_loop_is_rejected_at_parse_time() {
    let err = compile_err("@a:\n  => @a\n", &HashSet::new());
    assert!(matches!(err.kind, CompilationErrorKind::SelfBranch(_)));
}

#[test]
fn variable_slot_assignment_is_frequency_then_lexicographic() {
    // `b` is used twice, `a` once: b must win slot 0.
    let names = vars(&["a", "b"]);
    let (program, _) = compile_ok("@s:\n  b = a + b\n", &names);
    assert_eq!(program.variable_slot("b"), Some(0));
    assert_eq!(program.variable_slot("a"), Some(1));
}

#[test]
fn equal_frequency_variable_slots_break_ties_lexicographically() {
    let names = vars(&["a", "b"]);
    let (program, _) = compile_ok("@s:\n  a = b\n", &names);
    assert_eq!(program.variable_slot("a"), Some(0));
    assert_eq!(program.variable_slot("b"), Some(1));
}

#[test]
fn constant_folding_collapses_arithmetic_to_a_single_constant() {
    let names = vars(&["result"]);
    let (program, _) = compile_ok("@s:\n  result = 1 + 2 * 3\n", &names);
    assert_eq!(program.constant_count(), 1);
    assert_eq!(program.constants()[0].to_string(), "7");
}

#[test]
fn constant_folding_collapses_set_membership() {
    let names = vars(&["result"]);
    let (program, _) = compile_ok("@s:\n  result = 5 in {1, 2, 5}\n", &names);
    // Folds to the literal `1`, which links to the singleton `Lo` opcode
    // rather than a constant-pool slot.
    assert_eq!(program.constant_count(), 0);
    let mut machine = program.machine();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("result").unwrap(), "1");
}

#[test]
fn recompiling_is_byte_identical() {
    let names = vars(&["a", "b", "result"]);
    let source = "@s:\n  result = (a + b) * 2\n  a in [0, 10) => @t\n  => @t\n@t:\n  result = result + 1\n";
    let (first, _) = compile_ok(source, &names);
    let (second, _) = compile_ok(source, &names);
    assert_eq!(first.source(), second.source());
}

#[test]
fn undeclared_variable_is_a_compilation_error() {
    let err = compile_err("@s:\n  x = y\n", &vars(&["x"]));
    assert!(matches!(
        err.kind,
        CompilationErrorKind::UndeclaredVariable(ref name) if name == "y"
    ));
}

#[test]
fn set_literal_over_1024_members_is_rejected() {
    let members: Vec<String> = (0..1025).map(|n| n.to_string()).collect();
    let source = format!("@s:\n  x = 1 in {{{}}}\n", members.join(", "));
    let err = compile_err(&source, &vars(&["x"]));
    assert!(matches!(err.kind, CompilationErrorKind::Unexpected(_)));
}

#[test]
fn unreferenced_external_variable_still_gets_a_slot() {
    // `unused` never appears in the program body, but it was declared as
    // part of the host's variable namespace, so it must still be
    // addressable through `Machine::get_variable`/`set_variable`.
    let names = vars(&["x", "unused"]);
    let (program, _) = compile_ok("@s:\n  x = 1\n", &names);
    assert!(program.variable_slot("unused").is_some());

    let mut machine = program.machine();
    machine.set_variable("unused", "42").unwrap();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("unused").unwrap(), "42");
    assert_eq!(machine.get_variable("x").unwrap(), "1");
}

#[test]
fn non_literal_let_initializer_runs_before_the_first_state() {
    // `half`'s initializer references an external variable, so it can't
    // fold to a literal and survives as a declared variable whose
    // initialization must execute before `@start` runs.
    let names = vars(&["price", "half"]);
    let source = "let half = price / 2\n@start:\n  price = half + 1\n";
    let (program, _) = compile_ok(source, &names);
    let mut machine = program.machine();
    machine.set_variable("price", "10").unwrap();
    machine.run().unwrap();
    assert_eq!(machine.get_variable("price").unwrap(), "6");
}

#[test]
fn chained_assignment_is_rejected() {
    let names = vars(&["a", "b"]);
    let err = compile_err("@s:\n  a = b = 1\n", &names);
    assert_eq!(err.kind, CompilationErrorKind::ChainedAssignment);
}

#[test]
fn let_matching_a_constant_name_is_a_redeclared_constant() {
    let mut constants = HashMap::new();
    constants.insert("WAFFLE".to_string(), Decimal::zero());
    let err = compile("let WAFFLE = 0\n@start:\n", &HashSet::new(), &constants)
        .expect_err("should fail to compile");
    assert!(matches!(
        err.kind,
        CompilationErrorKind::RedeclaredConstant(ref name) if name == "WAFFLE"
    ));
}

#[test]
fn let_matching_an_external_variable_is_a_redeclared_variable() {
    let err = compile_err("let flavor = 0\n@start:\n", &vars(&["flavor"]));
    assert!(matches!(
        err.kind,
        CompilationErrorKind::RedeclaredVariable(ref name) if name == "flavor"
    ));
}

#[test]
fn let_matching_an_earlier_let_is_a_redeclared_variable() {
    let err = compile_err("let temp = 0\nlet temp = 1\n@start:\n", &HashSet::new());
    assert!(matches!(
        err.kind,
        CompilationErrorKind::RedeclaredVariable(ref name) if name == "temp"
    ));
}

#[test]
fn overlapping_variable_and_constant_names_are_rejected_up_front() {
    let mut constants = HashMap::new();
    constants.insert("scoops".to_string(), Decimal::one());
    let err = compile("@start:\n", &vars(&["scoops"]), &constants)
        .expect_err("should fail to compile");
    assert!(matches!(
        err.kind,
        CompilationErrorKind::VariableConstantCollision(ref name) if name == "scoops"
    ));
    assert!(err.line.is_none(), "up-front collision check carries no source position");
}
