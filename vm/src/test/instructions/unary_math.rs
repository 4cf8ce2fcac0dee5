use super::*;

#[test]
fn ng_negates() {
    let vars = final_variables("a;3;Lc0NgSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "-3");
}

#[test]
fn ab_takes_the_absolute_value() {
    let vars = final_variables("a;-3;Lc0AbSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "3");
}

#[test]
fn cl_rounds_up() {
    let vars = final_variables("a;1.2;Lc0ClSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "2");
}

#[test]
fn fl_rounds_down() {
    let vars = final_variables("a;1.8;Lc0FlSt0Xx");
    assert_eq!(vars.get("a").unwrap(), "1");
}

#[test]
fn rd_rounds_half_to_even() {
    let vars = final_variables("a|b;0.5|2.5;Lc0RdSt0Lc1RdSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "0");
    assert_eq!(vars.get("b").unwrap(), "2");
}
