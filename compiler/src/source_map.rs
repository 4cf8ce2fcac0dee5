//! A source map ties every emitted instruction back to the line(s) of
//! source text responsible for it, so coverage reporting can speak in
//! terms of lines rather than instruction indices.

/// A statement's position: either a single physical line, or — when the
/// statement was spread across a `\`-continued chain of physical lines —
/// the inclusive `(start, end)` range of that chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SourceLine {
    Single(u32),
    Range(u32, u32),
}

impl SourceLine {
    pub fn start(self) -> u32 {
        match self {
            SourceLine::Single(line) => line,
            SourceLine::Range(start, _) => start,
        }
    }
}

/// One entry per emitted instruction; `None` for synthetic instructions
/// (for example the implicit `Xx` a state picks up when it doesn't end in
/// an unconditional branch) that have no source statement of their own.
pub type SourceMap = Vec<Option<SourceLine>>;
