//! The 29 DSMAL opcodes. Mnemonics are exactly the variant names: two
//! letters, case sensitive.

use abysmal_util::EnumFromStr;
use abysmal_util_derive::EnumFromStr;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumFromStr)]
#[allow(clippy::upper_case_acronyms)]
pub enum OpCode {
    /// terminate execution successfully
    Xx,
    /// unconditional jump
    Ju,
    /// pop; jump if truthy
    Jn,
    /// pop; jump if zero
    Jz,
    /// push constants[n]
    Lc,
    /// push variables[n]
    Lv,
    /// pull the next value from the random source and push it
    Lr,
    /// push 0
    Lz,
    /// push 1
    Lo,
    /// pop; variables[n] = popped
    St,
    /// duplicate the top of the stack
    Cp,
    /// pop and discard
    Pp,
    /// logical not
    Nt,
    /// arithmetic negate
    Ng,
    /// absolute value
    Ab,
    /// ceiling
    Cl,
    /// floor
    Fl,
    /// round half to even, 0 digits
    Rd,
    /// equal
    Eq,
    /// not equal
    Ne,
    /// greater than
    Gt,
    /// greater than or equal
    Ge,
    /// add
    Ad,
    /// subtract
    Sb,
    /// multiply
    Ml,
    /// divide
    Dv,
    /// power
    Pw,
    /// minimum
    Mn,
    /// maximum
    Mx,
}

impl OpCode {
    /// Opcodes taking a 16-bit parameter: `Ju Jn Jz Lc Lv St`.
    pub fn takes_param(self) -> bool {
        matches!(
            self,
            OpCode::Ju | OpCode::Jn | OpCode::Jz | OpCode::Lc | OpCode::Lv | OpCode::St
        )
    }

    pub const ALL: [OpCode; 29] = [
        OpCode::Xx,
        OpCode::Ju,
        OpCode::Jn,
        OpCode::Jz,
        OpCode::Lc,
        OpCode::Lv,
        OpCode::Lr,
        OpCode::Lz,
        OpCode::Lo,
        OpCode::St,
        OpCode::Cp,
        OpCode::Pp,
        OpCode::Nt,
        OpCode::Ng,
        OpCode::Ab,
        OpCode::Cl,
        OpCode::Fl,
        OpCode::Rd,
        OpCode::Eq,
        OpCode::Ne,
        OpCode::Gt,
        OpCode::Ge,
        OpCode::Ad,
        OpCode::Sb,
        OpCode::Ml,
        OpCode::Dv,
        OpCode::Pw,
        OpCode::Mn,
        OpCode::Mx,
    ];
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
