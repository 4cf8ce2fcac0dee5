use super::*;

fn d(s: &str) -> Decimal {
    Decimal::parse(s).unwrap()
}

#[test]
fn canonicalizes_trailing_zeros() {
    assert_eq!(d("0.0").to_string(), "0");
    assert_eq!(d("42.00").to_string(), "42");
    assert_eq!(d("1.2300").to_string(), "1.23");
}

#[test]
fn addition() {
    assert_eq!(d("1.1").add(&d("2.2")).unwrap(), d("3.3"));
}

#[test]
fn subtraction_can_go_negative() {
    assert_eq!(d("1").sub(&d("4")).unwrap().to_string(), "-3");
}

#[test]
fn multiplication() {
    assert_eq!(d("1.25").mul(&d("2")).unwrap(), d("2.5"));
}

#[test]
fn division_by_zero_is_illegal() {
    assert_eq!(d("1").div(&d("0")).unwrap_err(), DecimalError::DivisionByZero);
}

#[test]
fn division() {
    assert_eq!(d("10").div(&d("4")).unwrap(), d("2.5"));
}

#[test]
fn integer_powers_are_exact() {
    assert_eq!(d("2").pow(&d("10")).unwrap(), d("1024"));
    assert_eq!(d("2").pow(&d("-1")).unwrap(), d("0.5"));
    assert_eq!(d("5").pow(&d("0")).unwrap(), d("1"));
}

#[test]
fn zero_to_negative_power_is_illegal() {
    assert_eq!(d("0").pow(&d("-1")).unwrap_err(), DecimalError::IllegalPower);
}

#[test]
fn negative_base_with_fractional_exponent_is_illegal() {
    assert_eq!(
        d("-4").pow(&d("0.5")).unwrap_err(),
        DecimalError::IllegalPower
    );
}

#[test]
fn negative_base_with_integer_exponent_is_legal() {
    assert_eq!(d("-2").pow(&d("3")).unwrap(), d("-8"));
}

#[test]
fn rounding_is_half_to_even() {
    assert_eq!(d("0.5").round_to_integer().unwrap(), d("0"));
    assert_eq!(d("1.5").round_to_integer().unwrap(), d("2"));
    assert_eq!(d("2.5").round_to_integer().unwrap(), d("2"));
    assert_eq!(d("-0.5").round_to_integer().unwrap(), d("0"));
}

#[test]
fn ceiling_and_floor() {
    assert_eq!(d("1.1").ceil().unwrap(), d("2"));
    assert_eq!(d("-1.1").ceil().unwrap(), d("-1"));
    assert_eq!(d("1.9").floor().unwrap(), d("1"));
    assert_eq!(d("-1.1").floor().unwrap(), d("-2"));
}

#[test]
fn truthiness_matches_nonzero() {
    assert!(!d("0").is_truthy());
    assert!(!d("0.0").is_truthy());
    assert!(!d("-0").is_truthy());
    assert!(d("0.0001").is_truthy());
}

#[test]
fn min_and_max() {
    assert_eq!(d("3").min(&d("5")), d("3"));
    assert_eq!(d("3").max(&d("5")), d("5"));
}

#[test]
fn rejects_non_numeric_input() {
    assert!(Decimal::parse("NaN").is_err());
    assert!(Decimal::parse("Infinity").is_err());
    assert!(Decimal::parse("abc").is_err());
}

#[test]
fn coefficient_beyond_precision_rounds_half_even() {
    let huge = d("1.00000000000000000000000000000000005");
    assert_eq!(huge.to_string(), "1.0000000000000000000000000000000001");
}

#[test]
fn overflow_and_underflow_are_reported() {
    let huge = d("1e6000");
    assert_eq!(
        huge.mul(&d("1e1000")).unwrap_err(),
        DecimalError::TooLarge
    );

    let tiny = d("1e-6000");
    assert_eq!(
        tiny.mul(&d("1e-1000")).unwrap_err(),
        DecimalError::TooSmall
    );
}
