use super::*;

#[test]
fn cp_duplicates_the_top_of_stack() {
    // a = b = 7: Lc0 duplicated, stored into both variables.
    let vars = final_variables("a|b;7;Lc0CpSt0St1Xx");
    assert_eq!(vars.get("a").unwrap(), "7");
    assert_eq!(vars.get("b").unwrap(), "7");
}

#[test]
fn pp_discards_the_top_of_stack() {
    // a ends up holding the first constant; the second is pushed then popped.
    let vars = final_variables("a;1|2;Lc0Lc1PpSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "1");
}

#[test]
fn nt_negates_truthiness() {
    let vars = final_variables("a|b;0;Lc0NtSt0LoNtSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "1");
    assert_eq!(vars.get("b").unwrap(), "0");
}

#[test]
fn lz_and_lo_push_the_singleton_zero_and_one() {
    let vars = final_variables("a|b;;LzSt0LoSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "0");
    assert_eq!(vars.get("b").unwrap(), "1");
}
