use super::*;

#[test]
fn adds_two_constants() {
    let vars = final_variables("a;2|3;Lc0Lc1AdSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "5");
}

#[test]
fn overflow_reports_the_faulting_instruction() {
    let source = ";9999999999999999999999999999999999e+6111|1e+6111;Lc0Lc1AdXx";
    match run_error(source) {
        ExecutionError::ResultTooLarge { opcode, instruction } => {
            assert_eq!(opcode, OpCode::Ad);
            assert_eq!(instruction, 2);
        }
        other => panic!("expected ResultTooLarge, got {:?}", other),
    }
}

#[test]
fn insufficient_operands() {
    match run_error("a;1;Lc0AdXx") {
        ExecutionError::InsufficientOperands { opcode, required, available } => {
            assert_eq!(opcode, OpCode::Ad);
            assert_eq!(required, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientOperands, got {:?}", other),
    }
}
