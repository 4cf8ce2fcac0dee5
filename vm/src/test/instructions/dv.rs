use super::*;

#[test]
fn divides_two_constants() {
    let vars = final_variables("a;7|2;Lc0Lc1DvSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "3.5");
}

#[test]
fn division_by_zero_is_illegal() {
    match run_error("a;7|0;Lc0Lc1DvSt0Xx") {
        ExecutionError::Illegal { opcode, instruction } => {
            assert_eq!(opcode, OpCode::Dv);
            assert_eq!(instruction, 2);
        }
        other => panic!("expected Illegal, got {:?}", other),
    }
}
