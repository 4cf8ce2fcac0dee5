//! Constant folding and declared-variable inlining, run to a fixed point
//! (bounded to 10 passes). Both passes are monotone: neither can increase
//! the number of AST nodes or the number of referenced variables.

use abysmal_decimal::Decimal;

use crate::ast::{Action, Ast, BinaryOp, Expr, Function, LogicalOpKind, UnaryOp};

const MAX_PASSES: usize = 10;

pub fn optimize(mut ast: Ast) -> Ast {
    for _ in 0..MAX_PASSES {
        let (folded, folded_changed) = fold_ast(ast);
        let (inlined, inlined_changed) = inline_ast(folded);
        ast = inlined;
        if !folded_changed && !inlined_changed {
            break;
        }
    }
    ast
}

// --- constant folding ---------------------------------------------------

fn fold_ast(ast: Ast) -> (Ast, bool) {
    let mut changed = false;

    let initializations = ast
        .initializations
        .into_iter()
        .map(|mut a| {
            a.value = fold_expr(a.value, &mut changed);
            a
        })
        .collect();

    let states = ast
        .states
        .into_iter()
        .map(|mut state| {
            state.actions = state
                .actions
                .into_iter()
                .filter_map(|action| fold_action(action, &mut changed))
                .collect();
            state
        })
        .collect();

    (
        Ast {
            declared_variable_names: ast.declared_variable_names,
            initializations,
            states,
        },
        changed,
    )
}

fn fold_action(action: Action, changed: &mut bool) -> Option<Action> {
    match action {
        Action::Assignment(mut a) => {
            a.value = fold_expr(a.value, changed);
            Some(Action::Assignment(a))
        }
        Action::Branch(mut b) => match b.condition.take() {
            None => Some(Action::Branch(b)),
            Some(cond) => {
                let folded = fold_expr(cond, changed);
                match folded.as_literal() {
                    Some(value) if value.is_truthy() => {
                        *changed = true;
                        b.condition = None;
                        Some(Action::Branch(b))
                    }
                    Some(_) => {
                        *changed = true;
                        None
                    }
                    None => {
                        b.condition = Some(folded);
                        Some(Action::Branch(b))
                    }
                }
            }
        },
    }
}

fn fold_expr(expr: Expr, changed: &mut bool) -> Expr {
    match expr {
        Expr::Variable(_) | Expr::Literal(_) | Expr::RandomValue => expr,
        Expr::UnOp { op, operand } => fold_unop(op, fold_expr(*operand, changed), changed),
        Expr::BinOp { left, op, right } => {
            let left = fold_expr(*left, changed);
            let right = fold_expr(*right, changed);
            fold_binop(left, op, right, changed)
        }
        Expr::LogicalOp { op, predicates } => {
            let predicates: Vec<Expr> = predicates
                .into_iter()
                .map(|p| fold_expr(p, changed))
                .collect();
            fold_logical(op, predicates, changed)
        }
        Expr::TerOp { cond, yes, no } => {
            let cond = fold_expr(*cond, changed);
            let yes = fold_expr(*yes, changed);
            let no = fold_expr(*no, changed);
            match cond.as_literal() {
                Some(value) => {
                    *changed = true;
                    if value.is_truthy() {
                        yes
                    } else {
                        no
                    }
                }
                None => Expr::TerOp {
                    cond: Box::new(cond),
                    yes: Box::new(yes),
                    no: Box::new(no),
                },
            }
        }
        Expr::SetMembership { operand, members } => {
            let operand = fold_expr(*operand, changed);
            let members: Vec<Expr> = members.into_iter().map(|m| fold_expr(m, changed)).collect();
            fold_set_membership(operand, members, changed)
        }
        Expr::RangeMembership {
            operand,
            low,
            high,
            low_inclusive,
            high_inclusive,
        } => {
            let operand = fold_expr(*operand, changed);
            let low = fold_expr(*low, changed);
            let high = fold_expr(*high, changed);
            fold_range_membership(operand, low, high, low_inclusive, high_inclusive, changed)
        }
        Expr::FunctionCall { function, params } => {
            let params: Vec<Expr> = params.into_iter().map(|p| fold_expr(p, changed)).collect();
            fold_function_call(function, params, changed)
        }
    }
}

fn fold_unop(op: UnaryOp, operand: Expr, changed: &mut bool) -> Expr {
    let Some(value) = operand.as_literal() else {
        return Expr::UnOp {
            op,
            operand: Box::new(operand),
        };
    };
    let folded = match op {
        UnaryOp::Plus => Some(value.clone()),
        UnaryOp::Not => Some(if value.is_truthy() {
            Decimal::zero()
        } else {
            Decimal::one()
        }),
        UnaryOp::Neg => value.neg().ok(),
    };
    match folded {
        Some(v) => {
            *changed = true;
            Expr::Literal(v)
        }
        None => Expr::UnOp {
            op,
            operand: Box::new(operand),
        },
    }
}

fn fold_binop(left: Expr, op: BinaryOp, right: Expr, changed: &mut bool) -> Expr {
    let rebuild = |left: Expr, right: Expr| Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    };

    let (Some(a), Some(b)) = (left.as_literal().cloned(), right.as_literal().cloned()) else {
        return rebuild(left, right);
    };

    let folded = match op {
        BinaryOp::Eq => Some(bool_decimal(a == b)),
        BinaryOp::Ne => Some(bool_decimal(a != b)),
        BinaryOp::Lt => Some(bool_decimal(a < b)),
        BinaryOp::Le => Some(bool_decimal(a <= b)),
        BinaryOp::Gt => Some(bool_decimal(a > b)),
        BinaryOp::Ge => Some(bool_decimal(a >= b)),
        BinaryOp::Add => a.add(&b).ok(),
        BinaryOp::Sub => a.sub(&b).ok(),
        BinaryOp::Mul => a.mul(&b).ok(),
        BinaryOp::Div => a.div(&b).ok(),
        BinaryOp::Pow => a.pow(&b).ok(),
    };

    match folded {
        Some(v) => {
            *changed = true;
            Expr::Literal(v)
        }
        None => rebuild(Expr::Literal(a), Expr::Literal(b)),
    }
}

fn bool_decimal(b: bool) -> Decimal {
    if b {
        Decimal::one()
    } else {
        Decimal::zero()
    }
}

fn fold_logical(op: LogicalOpKind, predicates: Vec<Expr>, changed: &mut bool) -> Expr {
    let absorber_is_truthy = match op {
        LogicalOpKind::And => false,
        LogicalOpKind::Or => true,
    };

    for p in &predicates {
        if let Some(value) = p.as_literal() {
            if value.is_truthy() == absorber_is_truthy {
                *changed = true;
                return Expr::Literal(bool_decimal(absorber_is_truthy));
            }
        }
    }

    let before = predicates.len();
    let kept: Vec<Expr> = predicates
        .into_iter()
        .filter(|p| p.as_literal().is_none())
        .collect();
    if kept.len() != before {
        *changed = true;
    }

    match kept.len() {
        0 => {
            *changed = true;
            Expr::Literal(bool_decimal(!absorber_is_truthy))
        }
        1 => {
            *changed = true;
            kept.into_iter().next().unwrap()
        }
        _ => Expr::LogicalOp {
            op,
            predicates: kept,
        },
    }
}

fn fold_set_membership(operand: Expr, members: Vec<Expr>, changed: &mut bool) -> Expr {
    let Some(opval) = operand.as_literal().cloned() else {
        return Expr::SetMembership {
            operand: Box::new(operand),
            members,
        };
    };

    if members.iter().any(|m| m.as_literal() == Some(&opval)) {
        *changed = true;
        return Expr::Literal(Decimal::one());
    }

    let before = members.len();
    let kept: Vec<Expr> = members
        .into_iter()
        .filter(|m| m.as_literal().is_none())
        .collect();
    if kept.len() != before {
        *changed = true;
    }

    if kept.is_empty() {
        *changed = true;
        return Expr::Literal(Decimal::zero());
    }

    Expr::SetMembership {
        operand: Box::new(Expr::Literal(opval)),
        members: kept,
    }
}

fn fold_range_membership(
    operand: Expr,
    low: Expr,
    high: Expr,
    low_inclusive: bool,
    high_inclusive: bool,
    changed: &mut bool,
) -> Expr {
    let rebuild = |operand: Expr, low: Expr, high: Expr| Expr::RangeMembership {
        operand: Box::new(operand),
        low: Box::new(low),
        high: Box::new(high),
        low_inclusive,
        high_inclusive,
    };

    let Some(opval) = operand.as_literal().cloned() else {
        return rebuild(operand, low, high);
    };

    if let Some(lowval) = low.as_literal() {
        let low_ok = if low_inclusive {
            opval >= *lowval
        } else {
            opval > *lowval
        };
        if !low_ok {
            *changed = true;
            return Expr::Literal(Decimal::zero());
        }
        if let Some(highval) = high.as_literal() {
            let high_ok = if high_inclusive {
                opval <= *highval
            } else {
                opval < *highval
            };
            *changed = true;
            return Expr::Literal(bool_decimal(high_ok));
        }
        *changed = true;
        return Expr::BinOp {
            left: Box::new(Expr::Literal(opval)),
            op: if high_inclusive { BinaryOp::Le } else { BinaryOp::Lt },
            right: Box::new(high),
        };
    }

    if let Some(highval) = high.as_literal() {
        let high_ok = if high_inclusive {
            opval <= *highval
        } else {
            opval < *highval
        };
        if !high_ok {
            *changed = true;
            return Expr::Literal(Decimal::zero());
        }
        *changed = true;
        return Expr::BinOp {
            left: Box::new(Expr::Literal(opval)),
            op: if low_inclusive { BinaryOp::Ge } else { BinaryOp::Gt },
            right: Box::new(low),
        };
    }

    rebuild(Expr::Literal(opval), low, high)
}

fn fold_function_call(function: Function, params: Vec<Expr>, changed: &mut bool) -> Expr {
    let all_literal = params.iter().all(|p| p.as_literal().is_some());
    if !all_literal {
        return Expr::FunctionCall { function, params };
    }

    let values: Vec<Decimal> = params
        .iter()
        .map(|p| p.as_literal().unwrap().clone())
        .collect();

    let folded = match function {
        Function::Abs => values[0].abs().ok(),
        Function::Ceiling => values[0].ceil().ok(),
        Function::Floor => values[0].floor().ok(),
        Function::Round => values[0].round_to_integer().ok(),
        Function::Min => Some(
            values
                .into_iter()
                .reduce(|a, b| a.min(&b))
                .expect("MIN always has at least 2 arguments"),
        ),
        Function::Max => Some(
            values
                .into_iter()
                .reduce(|a, b| a.max(&b))
                .expect("MAX always has at least 2 arguments"),
        ),
    };

    match folded {
        Some(v) => {
            *changed = true;
            Expr::Literal(v)
        }
        None => Expr::FunctionCall { function, params },
    }
}

// --- declared-variable inlining ------------------------------------------

fn inline_ast(ast: Ast) -> (Ast, bool) {
    let mut ast = ast;
    let mut changed_any = false;
    loop {
        let (next, changed) = inline_once(ast);
        ast = next;
        if !changed {
            break;
        }
        changed_any = true;
    }
    (ast, changed_any)
}

fn inline_once(ast: Ast) -> (Ast, bool) {
    let Ast {
        mut declared_variable_names,
        mut initializations,
        mut states,
    } = ast;

    let target = declared_variable_names.iter().enumerate().find_map(|(i, name)| {
        let init = initializations.iter().find(|a| &a.target == name)?;
        let literal = init.value.as_literal()?.clone();
        let reassigned = states
            .iter()
            .any(|s| s.assignments().any(|a| &a.target == name));
        if reassigned {
            None
        } else {
            Some((i, name.clone(), literal))
        }
    });

    let Some((index, name, literal)) = target else {
        return (
            Ast {
                declared_variable_names,
                initializations,
                states,
            },
            false,
        );
    };

    declared_variable_names.remove(index);
    initializations.retain(|a| a.target != name);
    let replacement = Expr::Literal(literal);

    for a in initializations.iter_mut() {
        a.value = std::mem::replace(&mut a.value, Expr::RandomValue).substitute(&name, &replacement);
    }

    for state in states.iter_mut() {
        for action in state.actions.iter_mut() {
            match action {
                Action::Assignment(a) => {
                    a.value =
                        std::mem::replace(&mut a.value, Expr::RandomValue).substitute(&name, &replacement);
                }
                Action::Branch(b) => {
                    if let Some(cond) = b.condition.take() {
                        b.condition = Some(cond.substitute(&name, &replacement));
                    }
                }
            }
        }
    }

    (
        Ast {
            declared_variable_names,
            initializations,
            states,
        },
        true,
    )
}
