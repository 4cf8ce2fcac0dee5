//! Statement dispatcher and Pratt-precedence expression parser. Consumes
//! the flat token stream from [`crate::lexer`] and produces an [`Ast`],
//! resolving every identifier against the caller-supplied external
//! variables and named constants as it goes (see [`Scope`]).

use std::collections::HashMap;

use abysmal_decimal::Decimal;

use crate::ast::{Action, Assignment, Ast, BinaryOp, Branch, Expr, Function, LogicalOpKind, State, UnaryOp};
use crate::error::{CompilationError, CompilationErrorKind};
use crate::lexer::{Symbol, Token, TokenKind};
use crate::source_map::SourceLine;

/// The external namespaces a program's identifiers resolve against,
/// supplied by the host embedding the compiler (never mutated during a
/// single parse — the only namespace that grows while parsing is the set
/// of `let`-declared variables, tracked separately by the parser itself).
pub struct Scope<'a> {
    pub external_vars: &'a std::collections::HashSet<String>,
    pub constants: &'a HashMap<String, Decimal>,
}

pub fn parse(tokens: &[Token], scope: &Scope) -> Result<Ast, CompilationError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        declared_vars: Vec::new(),
        scope,
    };
    parser.parse_program()
}

struct Parser<'t, 'a> {
    tokens: &'t [Token],
    pos: usize,
    declared_vars: Vec<String>,
    scope: &'a Scope<'a>,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error_at(&self, token: &Token, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::at(kind, token.line, token.char)
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<(), CompilationError> {
        let found = self.peek().clone();
        if found.kind == TokenKind::Symbol(symbol) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at(
                &found,
                CompilationErrorKind::ExpectedButFound {
                    expected: Symbol::text(symbol).to_string(),
                    found: found.describe(),
                },
            ))
        }
    }

    fn expect_end_of_line(&mut self) -> Result<(), CompilationError> {
        let found = self.peek().clone();
        match found.kind {
            TokenKind::EndOfLine | TokenKind::EndOfInput => {
                if found.kind == TokenKind::EndOfLine {
                    self.advance();
                }
                Ok(())
            }
            _ => Err(self.error_at(
                &found,
                CompilationErrorKind::ExpectedButFound {
                    expected: "end-of-line".to_string(),
                    found: found.describe(),
                },
            )),
        }
    }

    fn expect_label(&mut self) -> Result<(String, Token), CompilationError> {
        let found = self.peek().clone();
        match found.kind {
            TokenKind::Label(ref name) => {
                let name = name.clone();
                self.advance();
                Ok((name, found))
            }
            _ => Err(self.error_at(
                &found,
                CompilationErrorKind::ExpectedButFound {
                    expected: "label".to_string(),
                    found: found.describe(),
                },
            )),
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.peek().kind == TokenKind::EndOfLine {
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Result<Ast, CompilationError> {
        let mut initializations = Vec::new();
        let mut states: Vec<State> = Vec::new();
        let mut current: Option<State> = None;

        loop {
            self.skip_blank_lines();
            let token = self.peek().clone();
            match token.kind {
                TokenKind::EndOfInput => break,
                TokenKind::Let => {
                    if !states.is_empty() || current.is_some() {
                        return Err(self.error_at(&token, CompilationErrorKind::LetAfterFirstState));
                    }
                    let assignment = self.parse_let()?;
                    initializations.push(assignment);
                }
                TokenKind::Label(_) => {
                    if let Some(state) = current.take() {
                        states.push(state);
                    }
                    let (name, label_token) = self.expect_label()?;
                    if states.iter().any(|s| s.label == name) {
                        return Err(self.error_at(
                            &label_token,
                            CompilationErrorKind::DuplicateLabel(format!("@{}", name)),
                        ));
                    }
                    self.expect_symbol(Symbol::Colon)?;
                    self.expect_end_of_line()?;
                    current = Some(State {
                        label: name,
                        actions: Vec::new(),
                        line: label_token.line,
                    });
                }
                _ => {
                    let state = current.as_mut().ok_or_else(|| {
                        self.error_at(&token, CompilationErrorKind::MissingStartStateLabel)
                    })?;
                    let action = self.parse_action(&state.label)?;
                    state.actions.push(action);
                }
            }
        }

        if let Some(state) = current.take() {
            states.push(state);
        }

        Ok(Ast {
            declared_variable_names: self.declared_vars.clone(),
            initializations,
            states,
        })
    }

    fn parse_let(&mut self) -> Result<Assignment, CompilationError> {
        let let_token = self.advance().clone();
        let name_token = self.peek().clone();
        let name = match name_token.kind {
            TokenKind::Identifier(ref n) => n.clone(),
            _ => {
                return Err(self.error_at(
                    &name_token,
                    CompilationErrorKind::ExpectedButFound {
                        expected: "identifier".to_string(),
                        found: name_token.describe(),
                    },
                ))
            }
        };
        self.advance();

        if self.scope.constants.contains_key(&name) {
            return Err(self.error_at(&name_token, CompilationErrorKind::RedeclaredConstant(name)));
        }
        if self.scope.external_vars.contains(&name) || self.declared_vars.iter().any(|v| v == &name) {
            return Err(self.error_at(&name_token, CompilationErrorKind::RedeclaredVariable(name)));
        }

        self.expect_symbol(Symbol::Eq)?;
        let value = self.parse_expr(0)?;
        self.expect_end_of_line()?;

        self.declared_vars.push(name.clone());
        Ok(Assignment {
            target: name,
            value,
            line: SourceLine::Single(let_token.line),
        })
    }

    fn parse_action(&mut self, current_label: &str) -> Result<Action, CompilationError> {
        let start = self.peek().clone();

        if start.kind == TokenKind::Symbol(Symbol::Arrow) {
            self.advance();
            let (dest, dest_token) = self.expect_label()?;
            self.expect_end_of_line()?;
            if dest == current_label {
                return Err(self.error_at(
                    &dest_token,
                    CompilationErrorKind::SelfBranch(format!("@{}", current_label)),
                ));
            }
            return Ok(Action::Branch(Branch {
                condition: None,
                destination: dest,
                line: start.span,
            }));
        }

        if let TokenKind::Identifier(ref name) = start.kind {
            if self.tokens[self.pos + 1].kind == TokenKind::Symbol(Symbol::Eq) {
                let name = name.clone();
                self.advance();
                self.advance();
                let target = self.resolve_assignment_target(&name, &start)?;
                let value = self.parse_expr(0)?;
                self.expect_end_of_line()?;
                return Ok(Action::Assignment(Assignment {
                    target,
                    value,
                    line: start.span,
                }));
            }
        }

        let condition = self.parse_expr(0)?;
        self.expect_symbol(Symbol::Arrow)?;
        let (dest, dest_token) = self.expect_label()?;
        self.expect_end_of_line()?;
        if dest == current_label {
            return Err(self.error_at(
                &dest_token,
                CompilationErrorKind::SelfBranch(format!("@{}", current_label)),
            ));
        }
        Ok(Action::Branch(Branch {
            condition: Some(condition),
            destination: dest,
            line: start.span,
        }))
    }

    fn resolve_assignment_target(
        &self,
        name: &str,
        token: &Token,
    ) -> Result<String, CompilationError> {
        if self.scope.constants.contains_key(name) {
            return Err(self.error_at(token, CompilationErrorKind::IllegalAssignment));
        }
        if self.declared_vars.iter().any(|v| v == name) || self.scope.external_vars.contains(name) {
            return Ok(name.to_string());
        }
        Err(self.error_at(
            token,
            CompilationErrorKind::UndeclaredVariable(name.to_string()),
        ))
    }

    fn resolve_identifier(&self, name: &str, token: &Token) -> Result<Expr, CompilationError> {
        if self.declared_vars.iter().any(|v| v == name) || self.scope.external_vars.contains(name) {
            return Ok(Expr::Variable(name.to_string()));
        }
        if let Some(value) = self.scope.constants.get(name) {
            return Ok(Expr::Literal(value.clone()));
        }
        Err(self.error_at(
            token,
            CompilationErrorKind::UndeclaredVariable(name.to_string()),
        ))
    }

    // --- expressions ---------------------------------------------------

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, CompilationError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::In => {
                    if MEMBERSHIP_BP < min_bp {
                        break;
                    }
                    self.advance();
                    lhs = self.parse_membership(lhs, false)?;
                }
                TokenKind::Not => {
                    if MEMBERSHIP_BP < min_bp {
                        break;
                    }
                    self.advance();
                    let in_token = self.peek().clone();
                    if in_token.kind != TokenKind::In {
                        return Err(in_token.unexpected());
                    }
                    self.advance();
                    lhs = self.parse_membership(lhs, true)?;
                }
                TokenKind::Symbol(Symbol::Question) => {
                    if TERNARY_BP < min_bp {
                        break;
                    }
                    self.advance();
                    lhs = self.parse_ternary(lhs)?;
                }
                TokenKind::Symbol(Symbol::Eq) => {
                    if ASSIGN_BP < min_bp {
                        break;
                    }
                    return Err(self.error_at(&token, CompilationErrorKind::ChainedAssignment));
                }
                TokenKind::Symbol(symbol) => match binary_op(*symbol) {
                    Some((lbp, rbp, op)) => {
                        if lbp < min_bp {
                            break;
                        }
                        self.advance();
                        let rhs = self.parse_expr(rbp)?;
                        lhs = self.combine(lhs, op, rhs);
                    }
                    None => break,
                },
                _ => break,
            }
        }

        Ok(lhs)
    }

    fn combine(&self, lhs: Expr, op: BinOrLogical, rhs: Expr) -> Expr {
        match op {
            BinOrLogical::Bin(op) => Expr::BinOp {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
            },
            BinOrLogical::Logical(kind) => match lhs {
                Expr::LogicalOp {
                    op: existing,
                    mut predicates,
                } if existing == kind => {
                    predicates.push(rhs);
                    Expr::LogicalOp {
                        op: kind,
                        predicates,
                    }
                }
                _ => Expr::LogicalOp {
                    op: kind,
                    predicates: vec![lhs, rhs],
                },
            },
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, CompilationError> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Literal(ref value) => Ok(Expr::Literal(value.clone())),
            TokenKind::Random => Ok(Expr::RandomValue),
            TokenKind::Identifier(ref name) => {
                if self.peek().kind == TokenKind::Symbol(Symbol::LParen) {
                    self.parse_function_call(name, &token)
                } else {
                    self.resolve_identifier(name, &token)
                }
            }
            TokenKind::Symbol(Symbol::Bang) => {
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Expr::UnOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Symbol(Symbol::Minus) => {
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Expr::UnOp {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Symbol(Symbol::Plus) => {
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Expr::UnOp {
                    op: UnaryOp::Plus,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Symbol(Symbol::LParen) => {
                let inner = self.parse_expr(0)?;
                self.expect_symbol(Symbol::RParen)?;
                Ok(inner)
            }
            _ => Err(token.unexpected()),
        }
    }

    fn parse_function_call(&mut self, name: &str, name_token: &Token) -> Result<Expr, CompilationError> {
        let function = Function::lookup(name).ok_or_else(|| {
            self.error_at(
                name_token,
                CompilationErrorKind::UnknownFunction(name.to_string()),
            )
        })?;
        self.advance();

        let mut params = Vec::new();
        if self.peek().kind != TokenKind::Symbol(Symbol::RParen) {
            loop {
                params.push(self.parse_expr(0)?);
                if self.peek().kind == TokenKind::Symbol(Symbol::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect_symbol(Symbol::RParen)?;

        let (min, max) = function.arity();
        if params.len() < min || params.len() > max {
            let kind = if min == max {
                CompilationErrorKind::FunctionArityFixed {
                    name: function.name().to_string(),
                    count: min,
                    noun: if min == 1 { "parameter" } else { "parameters" },
                    provided: params.len(),
                }
            } else {
                CompilationErrorKind::FunctionArityRange {
                    name: function.name().to_string(),
                    min,
                    max,
                    provided: params.len(),
                }
            };
            return Err(self.error_at(name_token, kind));
        }

        Ok(Expr::FunctionCall { function, params })
    }

    fn parse_membership(&mut self, operand: Expr, negate: bool) -> Result<Expr, CompilationError> {
        let token = self.peek().clone();
        let membership = match token.kind {
            TokenKind::Symbol(Symbol::LBrace) => {
                self.advance();
                let mut members = Vec::new();
                if self.peek().kind != TokenKind::Symbol(Symbol::RBrace) {
                    loop {
                        members.push(self.parse_expr(MEMBERSHIP_BP + 1)?);
                        if self.peek().kind == TokenKind::Symbol(Symbol::Comma) {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                }
                self.expect_symbol(Symbol::RBrace)?;
                if members.len() > MAX_SET_MEMBERS {
                    return Err(self.error_at(
                        &token,
                        CompilationErrorKind::Unexpected(format!(
                            "set literal with more than {} members",
                            MAX_SET_MEMBERS
                        )),
                    ));
                }
                Expr::SetMembership {
                    operand: Box::new(operand),
                    members,
                }
            }
            TokenKind::Symbol(Symbol::LBracket) | TokenKind::Symbol(Symbol::LParen) => {
                let low_inclusive = token.kind == TokenKind::Symbol(Symbol::LBracket);
                self.advance();
                let low = self.parse_expr(MEMBERSHIP_BP + 1)?;
                self.expect_symbol(Symbol::Comma)?;
                let high = self.parse_expr(MEMBERSHIP_BP + 1)?;
                let close = self.peek().clone();
                let high_inclusive = match close.kind {
                    TokenKind::Symbol(Symbol::RBracket) => true,
                    TokenKind::Symbol(Symbol::RParen) => false,
                    _ => {
                        return Err(self.error_at(
                            &close,
                            CompilationErrorKind::ExpectedButFound {
                                expected: "] or )".to_string(),
                                found: close.describe(),
                            },
                        ))
                    }
                };
                self.advance();
                Expr::RangeMembership {
                    operand: Box::new(operand),
                    low: Box::new(low),
                    high: Box::new(high),
                    low_inclusive,
                    high_inclusive,
                }
            }
            _ => return Err(token.unexpected()),
        };

        if negate {
            Ok(Expr::UnOp {
                op: UnaryOp::Not,
                operand: Box::new(membership),
            })
        } else {
            Ok(membership)
        }
    }

    fn parse_ternary(&mut self, cond: Expr) -> Result<Expr, CompilationError> {
        let yes = self.parse_expr(TERNARY_BP + 1)?;
        self.expect_symbol(Symbol::Colon)?;
        let no = self.parse_expr(TERNARY_BP)?;
        Ok(Expr::TerOp {
            cond: Box::new(cond),
            yes: Box::new(yes),
            no: Box::new(no),
        })
    }
}

const UNARY_BP: u8 = 110;
const MEMBERSHIP_BP: u8 = 70;
const TERNARY_BP: u8 = 20;
const ASSIGN_BP: u8 = 10;

/// Spec §9 leaves the `in { … }` set size unbounded; this implementation
/// pins it to a reasonable cap rather than allowing unbounded parse-time
/// allocation from a single literal.
const MAX_SET_MEMBERS: usize = 1024;

enum BinOrLogical {
    Bin(BinaryOp),
    Logical(LogicalOpKind),
}

fn binary_op(symbol: Symbol) -> Option<(u8, u8, BinOrLogical)> {
    use BinOrLogical::*;
    Some(match symbol {
        Symbol::Caret => (100, 100, Bin(BinaryOp::Pow)),
        Symbol::Star => (90, 91, Bin(BinaryOp::Mul)),
        Symbol::Slash => (90, 91, Bin(BinaryOp::Div)),
        Symbol::Plus => (80, 81, Bin(BinaryOp::Add)),
        Symbol::Minus => (80, 81, Bin(BinaryOp::Sub)),
        Symbol::Lt => (60, 61, Bin(BinaryOp::Lt)),
        Symbol::LtEq => (60, 61, Bin(BinaryOp::Le)),
        Symbol::Gt => (60, 61, Bin(BinaryOp::Gt)),
        Symbol::GtEq => (60, 61, Bin(BinaryOp::Ge)),
        Symbol::EqEq => (50, 51, Bin(BinaryOp::Eq)),
        Symbol::NotEq => (50, 51, Bin(BinaryOp::Ne)),
        Symbol::AndAnd => (40, 41, Logical(LogicalOpKind::And)),
        Symbol::OrOr => (30, 31, Logical(LogicalOpKind::Or)),
        _ => return None,
    })
}
