use super::*;

#[test]
fn integer_power_is_exact() {
    let vars = final_variables("a;2|10;Lc0Lc1PwSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "1024");
}

#[test]
fn zero_to_a_negative_power_is_illegal() {
    match run_error("a;0|-1;Lc0Lc1PwSt0Xx") {
        ExecutionError::Illegal { opcode, .. } => assert_eq!(opcode, OpCode::Pw),
        other => panic!("expected Illegal, got {:?}", other),
    }
}

#[test]
fn negative_base_with_fractional_exponent_is_illegal() {
    match run_error("a;-2|0.5;Lc0Lc1PwSt0Xx") {
        ExecutionError::Illegal { opcode, .. } => assert_eq!(opcode, OpCode::Pw),
        other => panic!("expected Illegal, got {:?}", other),
    }
}

#[test]
fn negative_base_with_integer_exponent_is_legal() {
    let vars = final_variables("a;-2|3;Lc0Lc1PwSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "-8");
}
