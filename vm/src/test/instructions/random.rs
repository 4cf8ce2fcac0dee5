use super::*;
use crate::program::Program;
use crate::random::FixedRandomSource;

#[test]
fn lr_draws_from_the_default_source_when_none_is_installed() {
    // A fresh Machine falls back to the process-wide default generator,
    // so `Lr` succeeds without any explicit random source.
    let program = Program::load("a;;LrSt0Xx").expect("program should load");
    let mut machine = program.machine();
    machine.run().expect("Lr should draw from the default source");
    let value: f64 = machine.get_variable("a").unwrap().parse().unwrap();
    assert!((0.0..1.0).contains(&value));
}

#[test]
fn lr_draws_from_an_installed_fixed_source() {
    let program = Program::load("a;;LrSt0Xx").expect("program should load");
    let mut machine = program.machine();
    machine.set_random_source(FixedRandomSource::new(["0.42"]));
    machine.run().unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "0.42");
}

#[test]
fn lr_errors_when_a_fixed_source_is_exhausted() {
    let program = Program::load("a|b;;LrSt0LrSt1Xx").expect("program should load");
    let mut machine = program.machine();
    machine.set_random_source(FixedRandomSource::new(["0.1"]));
    let err = machine.run().expect_err("second Lr should find the source exhausted");
    assert_eq!(err, ExecutionError::RandomIteratorExhausted);
}

#[test]
fn lr_errors_on_an_unparseable_random_value() {
    let program = Program::load("a;;LrSt0Xx").expect("program should load");
    let mut machine = program.machine();
    machine.set_random_source(FixedRandomSource::new(["not-a-decimal"]));
    let err = machine.run().expect_err("invalid random text should be rejected");
    assert_eq!(err, ExecutionError::InvalidRandomValue("not-a-decimal".to_string()));
}

#[test]
fn clear_random_source_restores_the_default() {
    let program = Program::load("a;;LrSt0Xx").expect("program should load");
    let mut machine = program.machine();
    machine.set_random_source(FixedRandomSource::new(["0.5"]));
    machine.clear_random_source();
    machine.run().expect("cleared source should fall back to the default generator");
    let value: f64 = machine.get_variable("a").unwrap().parse().unwrap();
    assert!((0.0..1.0).contains(&value));
}

#[test]
fn cycling_source_repeats_its_values_forever() {
    let program = Program::load("a|b|c;;LrSt0LrSt1LrSt2Xx").expect("program should load");
    let mut machine = program.machine();
    machine.set_random_source(FixedRandomSource::cycling(["0.1", "0.2"]));
    machine.run().unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "0.1");
    assert_eq!(machine.get_variable("b").unwrap(), "0.2");
    assert_eq!(machine.get_variable("c").unwrap(), "0.1");
}
