use super::*;

// Shared shape for all four cases: index 0 loads a constant, index 1 is the
// conditional jump under test, indices 2-4 are the "falsy" path (taken = 0),
// indices 5-7 are the jump target, the "truthy" path (taken = 10).

#[test]
fn jn_jumps_on_a_truthy_value() {
    let vars = final_variables("taken;1|10;Lc0Jn5LzSt0XxLc1St0Xx");
    assert_eq!(vars.get("taken").unwrap(), "10");
}

#[test]
fn jn_falls_through_on_a_falsy_value() {
    let vars = final_variables("taken;0|10;Lc0Jn5LzSt0XxLc1St0Xx");
    assert_eq!(vars.get("taken").unwrap(), "0");
}

#[test]
fn jz_jumps_on_a_falsy_value() {
    let vars = final_variables("taken;0|10;Lc0Jz5LzSt0XxLc1St0Xx");
    assert_eq!(vars.get("taken").unwrap(), "10");
}

#[test]
fn jz_falls_through_on_a_truthy_value() {
    let vars = final_variables("taken;1|10;Lc0Jz5LzSt0XxLc1St0Xx");
    assert_eq!(vars.get("taken").unwrap(), "0");
}

#[test]
fn jump_past_the_end_is_out_of_bounds_at_run_time() {
    match run_error("a;;Ju5Xx") {
        ExecutionError::OutOfBounds(location) => assert_eq!(location, 5),
        other => panic!("expected OutOfBounds, got {:?}", other),
    }
}
