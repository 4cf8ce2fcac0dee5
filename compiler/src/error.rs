//! Everything that can go wrong while turning Abysmal source text into a
//! `Program`. A `CompilationError` always names what went wrong; most also
//! carry the line (and, within the line, the character) that caused it.

use thiserror::Error;

/// Raised while compiling an Abysmal program. Carries an optional source
/// position: a line number alone, or a line and character column together.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompilationError {
    pub kind: CompilationErrorKind,
    pub line: Option<u32>,
    pub char: Option<u32>,
}

impl CompilationError {
    pub(crate) fn new(kind: CompilationErrorKind) -> CompilationError {
        CompilationError {
            kind,
            line: None,
            char: None,
        }
    }

    pub(crate) fn at_line(kind: CompilationErrorKind, line: u32) -> CompilationError {
        CompilationError {
            kind,
            line: Some(line),
            char: None,
        }
    }

    pub(crate) fn at(kind: CompilationErrorKind, line: u32, char: u32) -> CompilationError {
        CompilationError {
            kind,
            line: Some(line),
            char: Some(char),
        }
    }
}

impl std::fmt::Display for CompilationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(line) = self.line {
            write!(f, " (line {}", line)?;
            if let Some(char) = self.char {
                write!(f, ", char {}", char)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilationError {}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CompilationErrorKind {
    #[error("unknown token")]
    UnknownToken,

    #[error("unexpected text after line-continuation character")]
    UnexpectedTextAfterLineContinuation,

    #[error("unexpected {0}")]
    Unexpected(String),

    #[error("expected {expected} but found {found} instead")]
    ExpectedButFound { expected: String, found: String },

    #[error("missing start state label")]
    MissingStartStateLabel,

    #[error("variables must be declared before the first state definition")]
    LetAfterFirstState,

    #[error("redeclaration of constant \"{0}\"")]
    RedeclaredConstant(String),

    #[error("redeclaration of variable \"{0}\"")]
    RedeclaredVariable(String),

    #[error("reference to undeclared variable \"{0}\"")]
    UndeclaredVariable(String),

    #[error("reference to unknown function \"{0}\"")]
    UnknownFunction(String),

    #[error("function {name}() accepts {count} {noun} ({provided} provided)")]
    FunctionArityFixed {
        name: String,
        count: usize,
        noun: &'static str,
        provided: usize,
    },

    #[error("function {name}() accepts between {min} and {max} parameters ({provided} provided)")]
    FunctionArityRange {
        name: String,
        min: usize,
        max: usize,
        provided: usize,
    },

    #[error("illegal assignment")]
    IllegalAssignment,

    #[error("chained assignment is not allowed - did you mean == instead?")]
    ChainedAssignment,

    #[error("duplicate label \"{0}\"")]
    DuplicateLabel(String),

    #[error("branch to itself in state \"{0}\"")]
    SelfBranch(String),

    #[error("no states are defined")]
    NoStates,

    #[error("branch to undefined label \"{0}\"")]
    UndefinedLabel(String),

    #[error("cycle exists between states {0}")]
    Cycle(String),

    #[error("\"{0}\" cannot be both a variable and a constant")]
    VariableConstantCollision(String),
}
