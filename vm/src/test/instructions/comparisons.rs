use super::*;

#[test]
fn eq_and_ne() {
    let vars = final_variables("a|b;3|3;Lc0Lc1EqSt0Lc0Lc1NeSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "1");
    assert_eq!(vars.get("b").unwrap(), "0");
}

#[test]
fn gt_and_ge() {
    let vars = final_variables("a|b;3|3;Lc0Lc1GtSt0Lc0Lc1GeSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "0");
    assert_eq!(vars.get("b").unwrap(), "1");
}

#[test]
fn mn_and_mx() {
    let vars = final_variables("a|b;3|5;Lc0Lc1MnSt0Lc0Lc1MxSt1Xx");
    assert_eq!(vars.get("a").unwrap(), "3");
    assert_eq!(vars.get("b").unwrap(), "5");
}
