use super::*;
use crate::Program;

#[test]
fn lv_reads_and_st_writes_by_slot() {
    let vars = final_variables("a|b;5;Lc0St0Lv0Lv0AdSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "5");
    assert_eq!(vars.get("b").unwrap(), "10");
}

#[test]
fn reading_a_nonexistent_constant_slot_is_rejected_at_load_time() {
    assert_eq!(
        load_error("a;1;Lc5St0Xx"),
        InvalidProgramError::NonexistentConstantSlot(5)
    );
}

#[test]
fn reading_a_nonexistent_variable_slot_is_rejected_at_load_time() {
    assert_eq!(
        load_error("a;1;Lc0St5Xx"),
        InvalidProgramError::NonexistentVariableSlot(5)
    );
}

#[test]
fn set_variable_and_get_variable_round_trip_by_name() {
    let program = Program::load("a;;LzSt0Xx").unwrap();
    let mut machine = program.machine();
    machine.set_variable("a", "12.5").unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "12.5");
    machine.run().unwrap();
    assert_eq!(machine.get_variable("a").unwrap(), "0");
}

#[test]
fn setting_a_variable_to_unparseable_text_is_rejected() {
    let program = Program::load("a;;Xx").unwrap();
    let mut machine = program.machine();
    let err = machine
        .set_variable("a", "bogus")
        .expect_err("\"bogus\" is not a decimal");
    assert_eq!(err.to_string(), "invalid variable value \"bogus\"");
}
