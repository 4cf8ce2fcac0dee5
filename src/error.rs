use thiserror::Error;

/// Failure modes of the decimal facade. These surface to callers as plain
/// arithmetic failures; the compiler and DSM layer wrap them with positional
/// or instruction context of their own.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum DecimalError {
    #[error("illegal Dv")]
    DivisionByZero,

    #[error("illegal Pw")]
    IllegalPower,

    #[error("result was too large")]
    TooLarge,

    #[error("result was too small")]
    TooSmall,

    #[error("\"{0}\" is not a valid decimal value")]
    Parse(String),
}
