//! The abstract syntax tree: a closed set of expression node kinds plus
//! the statement- and program-level shapes (`Assignment`, `Branch`,
//! `State`, `Ast`) that sit above them. Strictly a tree — the state graph
//! a program's `Branch`es describe is a separate adjacency relation
//! checked once, after parsing (see `parser::check_cycles`).

use abysmal_decimal::Decimal;

use crate::source_map::SourceLine;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalOpKind {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Function {
    Abs,
    Ceiling,
    Floor,
    Round,
    Min,
    Max,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Abs => "ABS",
            Function::Ceiling => "CEILING",
            Function::Floor => "FLOOR",
            Function::Round => "ROUND",
            Function::Min => "MIN",
            Function::Max => "MAX",
        }
    }

    pub fn lookup(name: &str) -> Option<Function> {
        match name {
            "ABS" => Some(Function::Abs),
            "CEILING" => Some(Function::Ceiling),
            "FLOOR" => Some(Function::Floor),
            "ROUND" => Some(Function::Round),
            "MIN" => Some(Function::Min),
            "MAX" => Some(Function::Max),
            _ => None,
        }
    }

    /// Inclusive `(min, max)` arity.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Function::Abs | Function::Ceiling | Function::Floor | Function::Round => (1, 1),
            Function::Min | Function::Max => (2, 100),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Variable(String),
    Literal(Decimal),
    RandomValue,
    UnOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    LogicalOp {
        op: LogicalOpKind,
        predicates: Vec<Expr>,
    },
    TerOp {
        cond: Box<Expr>,
        yes: Box<Expr>,
        no: Box<Expr>,
    },
    SetMembership {
        operand: Box<Expr>,
        members: Vec<Expr>,
    },
    RangeMembership {
        operand: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        low_inclusive: bool,
        high_inclusive: bool,
    },
    FunctionCall {
        function: Function,
        params: Vec<Expr>,
    },
}

impl Expr {
    /// Recursively substitutes every `Variable(name)` reference with
    /// `replacement` — the one rewrite the optimizer needs, used to
    /// inline a constant-valued declared variable everywhere it's read.
    pub fn substitute(self, name: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Variable(ref n) if n == name => replacement.clone(),
            Expr::Variable(_) | Expr::Literal(_) | Expr::RandomValue => self,
            Expr::UnOp { op, operand } => Expr::UnOp {
                op,
                operand: Box::new(operand.substitute(name, replacement)),
            },
            Expr::BinOp { left, op, right } => Expr::BinOp {
                left: Box::new(left.substitute(name, replacement)),
                op,
                right: Box::new(right.substitute(name, replacement)),
            },
            Expr::LogicalOp { op, predicates } => Expr::LogicalOp {
                op,
                predicates: predicates
                    .into_iter()
                    .map(|p| p.substitute(name, replacement))
                    .collect(),
            },
            Expr::TerOp { cond, yes, no } => Expr::TerOp {
                cond: Box::new(cond.substitute(name, replacement)),
                yes: Box::new(yes.substitute(name, replacement)),
                no: Box::new(no.substitute(name, replacement)),
            },
            Expr::SetMembership { operand, members } => Expr::SetMembership {
                operand: Box::new(operand.substitute(name, replacement)),
                members: members
                    .into_iter()
                    .map(|m| m.substitute(name, replacement))
                    .collect(),
            },
            Expr::RangeMembership {
                operand,
                low,
                high,
                low_inclusive,
                high_inclusive,
            } => Expr::RangeMembership {
                operand: Box::new(operand.substitute(name, replacement)),
                low: Box::new(low.substitute(name, replacement)),
                high: Box::new(high.substitute(name, replacement)),
                low_inclusive,
                high_inclusive,
            },
            Expr::FunctionCall { function, params } => Expr::FunctionCall {
                function,
                params: params
                    .into_iter()
                    .map(|p| p.substitute(name, replacement))
                    .collect(),
            },
        }
    }

    pub fn as_literal(&self) -> Option<&Decimal> {
        match self {
            Expr::Literal(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
    pub line: SourceLine,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub condition: Option<Expr>,
    pub destination: String,
    pub line: SourceLine,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Assignment(Assignment),
    Branch(Branch),
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub label: String,
    pub actions: Vec<Action>,
    pub line: u32,
}

impl State {
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.actions.iter().filter_map(|action| match action {
            Action::Branch(branch) => Some(branch),
            _ => None,
        })
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.actions.iter().filter_map(|action| match action {
            Action::Assignment(assignment) => Some(assignment),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ast {
    pub declared_variable_names: Vec<String>,
    pub initializations: Vec<Assignment>,
    pub states: Vec<State>,
}
