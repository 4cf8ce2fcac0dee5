//! Symbolic IR emission, three peephole passes, slot assignment, and
//! final linking into a DSMAL string plus its parallel source map.

use std::collections::{HashMap, HashSet};

use abysmal_decimal::Decimal;
use abysmal_vm::OpCode;

use crate::ast::{Action, Assignment, Ast, BinaryOp, Expr, Function, LogicalOpKind, UnaryOp};
use crate::source_map::SourceLine;

/// A single IR instruction. Jump targets and variable/constant operands
/// stay symbolic until [`link`] resolves them to concrete slots.
#[derive(Clone, Debug)]
enum Ir {
    Op(OpCode),
    LoadConst(Decimal),
    LoadVar(String),
    Store(String),
    Jump(u32),
    JumpIfTruthy(u32),
    JumpIfZero(u32),
    Label(u32),
}

struct Emitter {
    code: Vec<Ir>,
    lines: Vec<Option<SourceLine>>,
    next_label: u32,
    state_labels: HashMap<String, u32>,
}

impl Emitter {
    fn new() -> Emitter {
        Emitter {
            code: Vec::new(),
            lines: Vec::new(),
            next_label: 0,
            state_labels: HashMap::new(),
        }
    }

    fn fresh_label(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn label_for_state(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.state_labels.get(name) {
            return id;
        }
        let id = self.fresh_label();
        self.state_labels.insert(name.to_string(), id);
        id
    }

    fn push(&mut self, op: Ir, line: Option<SourceLine>) {
        self.code.push(op);
        self.lines.push(line);
    }

    fn place_label(&mut self, id: u32) {
        self.code.push(Ir::Label(id));
        self.lines.push(None);
    }

    fn last_is_jump(&self) -> bool {
        matches!(self.code.last(), Some(Ir::Jump(_)))
    }
}

/// Emits IR, peephole-optimizes it, assigns slots, and links the final
/// DSMAL text. Returns the DSMAL string alongside its source map.
///
/// `external_vars` is the host-supplied variable namespace; every name in
/// it gets a variable slot in the emitted program even if the program
/// never reads or writes it, matching `ast.declared_variable_names` (the
/// `let`-declared variables that survived optimization unfolded) which
/// get the same treatment.
pub fn compile_ast(ast: &Ast, external_vars: &HashSet<String>) -> (String, Vec<Option<SourceLine>>) {
    let mut emitter = Emitter::new();

    for initialization in &ast.initializations {
        emit_assignment(&mut emitter, initialization);
    }

    for state in &ast.states {
        let label = emitter.label_for_state(&state.label);
        emitter.place_label(label);

        for action in &state.actions {
            emit_action(&mut emitter, action);
        }

        if !emitter.last_is_jump() {
            emitter.push(Ir::Op(OpCode::Xx), None);
        }
    }

    let mut all_vars: HashSet<String> = external_vars.clone();
    all_vars.extend(ast.declared_variable_names.iter().cloned());

    let (code, lines) = peephole(emitter.code, emitter.lines);
    link(code, lines, &all_vars)
}

fn emit_assignment(e: &mut Emitter, assignment: &Assignment) {
    emit_expr(e, &assignment.value, Some(assignment.line));
    e.push(Ir::Store(assignment.target.clone()), Some(assignment.line));
}

fn emit_action(e: &mut Emitter, action: &Action) {
    match action {
        Action::Assignment(assignment) => emit_assignment(e, assignment),
        Action::Branch(branch) => {
            let dest = e.label_for_state(&branch.destination);
            match &branch.condition {
                None => e.push(Ir::Jump(dest), Some(branch.line)),
                Some(Expr::UnOp {
                    op: UnaryOp::Not,
                    operand,
                }) => {
                    emit_expr(e, operand, Some(branch.line));
                    e.push(Ir::JumpIfZero(dest), Some(branch.line));
                }
                Some(condition) => {
                    emit_expr(e, condition, Some(branch.line));
                    e.push(Ir::JumpIfTruthy(dest), Some(branch.line));
                }
            }
        }
    }
}

fn emit_expr(e: &mut Emitter, expr: &Expr, line: Option<SourceLine>) {
    match expr {
        Expr::Variable(name) => e.push(Ir::LoadVar(name.clone()), line),
        Expr::Literal(value) => e.push(Ir::LoadConst(value.clone()), line),
        Expr::RandomValue => e.push(Ir::Op(OpCode::Lr), line),

        Expr::UnOp { op, operand } => {
            emit_expr(e, operand, line);
            match op {
                UnaryOp::Not => e.push(Ir::Op(OpCode::Nt), line),
                UnaryOp::Neg => e.push(Ir::Op(OpCode::Ng), line),
                UnaryOp::Plus => {}
            }
        }

        Expr::BinOp { left, op, right } => emit_binop(e, left, *op, right, line),

        Expr::LogicalOp { op, predicates } => emit_logical(e, *op, predicates, line),

        Expr::TerOp { cond, yes, no } => {
            let no_label = e.fresh_label();
            let join_label = e.fresh_label();
            emit_expr(e, cond, line);
            e.push(Ir::JumpIfZero(no_label), line);
            emit_expr(e, yes, line);
            e.push(Ir::Jump(join_label), line);
            e.place_label(no_label);
            emit_expr(e, no, line);
            e.place_label(join_label);
        }

        Expr::SetMembership { operand, members } => emit_set_membership(e, operand, members, line),

        Expr::RangeMembership {
            operand,
            low,
            high,
            low_inclusive,
            high_inclusive,
        } => emit_range_membership(e, operand, low, high, *low_inclusive, *high_inclusive, line),

        Expr::FunctionCall { function, params } => emit_function_call(e, *function, params, line),
    }
}

fn emit_binop(e: &mut Emitter, left: &Expr, op: BinaryOp, right: &Expr, line: Option<SourceLine>) {
    // `<` and `<=` swap operands to reuse `Gt` / `Ge`; `>` and `>=` don't.
    let (first, second, opcode) = match op {
        BinaryOp::Lt => (right, left, OpCode::Gt),
        BinaryOp::Le => (right, left, OpCode::Ge),
        BinaryOp::Gt => (left, right, OpCode::Gt),
        BinaryOp::Ge => (left, right, OpCode::Ge),
        BinaryOp::Eq => (left, right, OpCode::Eq),
        BinaryOp::Ne => (left, right, OpCode::Ne),
        BinaryOp::Add => (left, right, OpCode::Ad),
        BinaryOp::Sub => (left, right, OpCode::Sb),
        BinaryOp::Mul => (left, right, OpCode::Ml),
        BinaryOp::Div => (left, right, OpCode::Dv),
        BinaryOp::Pow => (left, right, OpCode::Pw),
    };
    emit_expr(e, first, line);
    emit_expr(e, second, line);
    e.push(Ir::Op(opcode), line);
}

/// `||`: evaluate each predicate; on true jump to a label that pushes 1.
/// If none fires, push 0. `&&`: evaluate each predicate; on false jump to
/// a label that pushes 0. If all are non-zero, push 1.
fn emit_logical(e: &mut Emitter, op: LogicalOpKind, predicates: &[Expr], line: Option<SourceLine>) {
    let shortcut_label = e.fresh_label();
    let join_label = e.fresh_label();

    for predicate in predicates {
        emit_expr(e, predicate, line);
        match op {
            LogicalOpKind::Or => e.push(Ir::JumpIfTruthy(shortcut_label), line),
            LogicalOpKind::And => e.push(Ir::JumpIfZero(shortcut_label), line),
        }
    }

    match op {
        LogicalOpKind::Or => e.push(Ir::LoadConst(Decimal::zero()), line),
        LogicalOpKind::And => e.push(Ir::LoadConst(Decimal::one()), line),
    }
    e.push(Ir::Jump(join_label), line);

    e.place_label(shortcut_label);
    match op {
        LogicalOpKind::Or => e.push(Ir::LoadConst(Decimal::one()), line),
        LogicalOpKind::And => e.push(Ir::LoadConst(Decimal::zero()), line),
    }

    e.place_label(join_label);
}

/// Leaves the operand on the stack (`Cp` before each compare), compares
/// against each member in turn; `Jn` to a true path on the first match,
/// falls through to false if none match.
fn emit_set_membership(e: &mut Emitter, operand: &Expr, members: &[Expr], line: Option<SourceLine>) {
    let true_label = e.fresh_label();
    let join_label = e.fresh_label();

    emit_expr(e, operand, line);
    for member in members {
        e.push(Ir::Op(OpCode::Cp), line);
        emit_expr(e, member, line);
        e.push(Ir::Op(OpCode::Eq), line);
        e.push(Ir::JumpIfTruthy(true_label), line);
    }

    e.push(Ir::Op(OpCode::Pp), line);
    e.push(Ir::LoadConst(Decimal::zero()), line);
    e.push(Ir::Jump(join_label), line);

    e.place_label(true_label);
    e.push(Ir::Op(OpCode::Pp), line);
    e.push(Ir::LoadConst(Decimal::one()), line);

    e.place_label(join_label);
}

/// Checks `operand OP low` via `Ge`/`Gt` (low side), then `operand OP
/// high` via `Gt`/`Ge` with the result inverted by `Nt` (high side: "not
/// above high" reframes as "not (operand > high)"). The low-check-fail
/// path pops the duplicated operand before joining the high-check-fail
/// path so both arrive at `false_label` with a balanced stack.
fn emit_range_membership(
    e: &mut Emitter,
    operand: &Expr,
    low: &Expr,
    high: &Expr,
    low_inclusive: bool,
    high_inclusive: bool,
    line: Option<SourceLine>,
) {
    let fail_with_operand = e.fresh_label();
    let false_label = e.fresh_label();
    let true_label = e.fresh_label();
    let join_label = e.fresh_label();

    emit_expr(e, operand, line);
    e.push(Ir::Op(OpCode::Cp), line);
    emit_expr(e, low, line);
    // operand >= low, or operand > low for the exclusive bound.
    e.push(Ir::Op(if low_inclusive { OpCode::Ge } else { OpCode::Gt }), line);
    e.push(Ir::JumpIfZero(fail_with_operand), line);

    emit_expr(e, high, line);
    // operand <= high  <=>  !(operand > high); operand < high <=> !(operand >= high).
    e.push(Ir::Op(if high_inclusive { OpCode::Gt } else { OpCode::Ge }), line);
    e.push(Ir::Op(OpCode::Nt), line);
    e.push(Ir::JumpIfTruthy(true_label), line);
    e.push(Ir::Jump(false_label), line);

    e.place_label(fail_with_operand);
    e.push(Ir::Op(OpCode::Pp), line);
    e.push(Ir::Jump(false_label), line);

    e.place_label(true_label);
    e.push(Ir::LoadConst(Decimal::one()), line);
    e.push(Ir::Jump(join_label), line);

    e.place_label(false_label);
    e.push(Ir::LoadConst(Decimal::zero()), line);

    e.place_label(join_label);
}

fn emit_function_call(e: &mut Emitter, function: Function, params: &[Expr], line: Option<SourceLine>) {
    match function {
        Function::Abs => {
            emit_expr(e, &params[0], line);
            e.push(Ir::Op(OpCode::Ab), line);
        }
        Function::Ceiling => {
            emit_expr(e, &params[0], line);
            e.push(Ir::Op(OpCode::Cl), line);
        }
        Function::Floor => {
            emit_expr(e, &params[0], line);
            e.push(Ir::Op(OpCode::Fl), line);
        }
        Function::Round => {
            emit_expr(e, &params[0], line);
            e.push(Ir::Op(OpCode::Rd), line);
        }
        Function::Min | Function::Max => {
            let opcode = if matches!(function, Function::Min) {
                OpCode::Mn
            } else {
                OpCode::Mx
            };
            emit_expr(e, &params[0], line);
            for param in &params[1..] {
                emit_expr(e, param, line);
                e.push(Ir::Op(opcode), line);
            }
        }
    }
}

// --- peephole passes ------------------------------------------------------

fn peephole(
    code: Vec<Ir>,
    lines: Vec<Option<SourceLine>>,
) -> (Vec<Ir>, Vec<Option<SourceLine>>) {
    let (mut code, mut lines) = strip_labels_tracking(code, lines);

    collapse_jump_chains(&mut code);
    let (code2, lines2) = prune_unreachable(code, lines);
    code = code2;
    lines = lines2;
    remove_noop_jumps(&mut code, &mut lines);

    (code, lines)
}

/// Removes `Ir::Label` pseudo-instructions, rewriting every jump target
/// from a label id to the instruction index it names.
fn strip_labels_tracking(
    code: Vec<Ir>,
    lines: Vec<Option<SourceLine>>,
) -> (Vec<Ir>, Vec<Option<SourceLine>>) {
    let mut positions: HashMap<u32, usize> = HashMap::new();
    let mut real: Vec<Ir> = Vec::with_capacity(code.len());
    let mut real_lines: Vec<Option<SourceLine>> = Vec::with_capacity(lines.len());

    for (instr, line) in code.into_iter().zip(lines.into_iter()) {
        match instr {
            Ir::Label(id) => {
                positions.insert(id, real.len());
            }
            other => {
                real.push(other);
                real_lines.push(line);
            }
        }
    }

    for instr in real.iter_mut() {
        match instr {
            Ir::Jump(target) | Ir::JumpIfTruthy(target) | Ir::JumpIfZero(target) => {
                *target = *positions
                    .get(target)
                    .expect("every label referenced by a jump is emitted somewhere") as u32;
            }
            _ => {}
        }
    }

    (real, real_lines)
}

/// Rewrites any jump whose target is itself an unconditional jump to
/// target that jump's destination; a jump landing on `Xx` becomes `Xx`.
/// Targets are positions at this point, so the rewrite chases through
/// `Ju` chains with a visited-set to guard against (already-impossible,
/// since the state graph is acyclic, but cheap to guard) infinite loops.
fn collapse_jump_chains(code: &mut [Ir]) {
    let resolved: Vec<Option<u32>> = (0..code.len())
        .map(|i| resolve_final_target(code, i))
        .collect();
    let lands_on_xx: Vec<bool> = (0..code.len())
        .map(|i| matches!(code[i], Ir::Op(OpCode::Xx)))
        .collect();

    for (i, instr) in code.iter_mut().enumerate() {
        match resolved[i] {
            None => {}
            Some(target) => match instr {
                // An unconditional jump landing (through however many
                // hops) on `Xx` is itself equivalent to `Xx`.
                Ir::Jump(_) if lands_on_xx[target as usize] => *instr = Ir::Op(OpCode::Xx),
                Ir::Jump(t) | Ir::JumpIfTruthy(t) | Ir::JumpIfZero(t) => *t = target,
                _ => {}
            },
        }
    }
}

/// Given the index of a jump instruction, follows the chain of `Ju`
/// targets as far as it goes and returns the final destination. Returns
/// `None` if the instruction at `index` isn't a jump (nothing to rewrite).
fn resolve_final_target(code: &[Ir], index: usize) -> Option<u32> {
    let mut target = match &code[index] {
        Ir::Jump(t) | Ir::JumpIfTruthy(t) | Ir::JumpIfZero(t) => *t,
        _ => return None,
    };

    let mut visited = std::collections::HashSet::new();
    loop {
        if !visited.insert(target) {
            break;
        }
        match code.get(target as usize) {
            Some(Ir::Jump(next)) => target = *next,
            _ => break,
        }
    }
    Some(target)
}

/// DFS from instruction 0 over control-flow successors; drops anything
/// unreached and remaps every remaining jump target to its new position.
fn prune_unreachable(
    code: Vec<Ir>,
    lines: Vec<Option<SourceLine>>,
) -> (Vec<Ir>, Vec<Option<SourceLine>>) {
    let n = code.len();
    let mut reachable = vec![false; n];
    let mut stack = vec![0usize];

    while let Some(pos) = stack.pop() {
        if pos >= n || reachable[pos] {
            continue;
        }
        reachable[pos] = true;

        match &code[pos] {
            Ir::Op(OpCode::Xx) => {}
            Ir::Jump(target) => stack.push(*target as usize),
            Ir::JumpIfTruthy(target) | Ir::JumpIfZero(target) => {
                stack.push(*target as usize);
                stack.push(pos + 1);
            }
            _ => stack.push(pos + 1),
        }
    }

    let mut new_index = vec![0u32; n];
    let mut next = 0u32;
    for (i, keep) in reachable.iter().enumerate() {
        if *keep {
            new_index[i] = next;
            next += 1;
        }
    }

    let mut kept_code = Vec::with_capacity(next as usize);
    let mut kept_lines = Vec::with_capacity(next as usize);
    for (i, (instr, line)) in code.into_iter().zip(lines.into_iter()).enumerate() {
        if reachable[i] {
            kept_code.push(instr);
            kept_lines.push(line);
        }
    }

    for instr in kept_code.iter_mut() {
        match instr {
            Ir::Jump(t) | Ir::JumpIfTruthy(t) | Ir::JumpIfZero(t) => {
                *t = new_index[*t as usize];
            }
            _ => {}
        }
    }

    (kept_code, kept_lines)
}

/// Removes `Ju` instructions whose target is the textually-next
/// instruction (a no-op once reachability pruning has run); any jump
/// that targeted the removed `Ju` is retargeted to migrate forward to
/// what is now in its place.
fn remove_noop_jumps(code: &mut Vec<Ir>, lines: &mut Vec<Option<SourceLine>>) {
    loop {
        let noop = code.iter().enumerate().position(|(i, instr)| {
            matches!(instr, Ir::Jump(target) if *target as usize == i + 1)
        });

        let i = match noop {
            Some(i) => i,
            None => break,
        };

        code.remove(i);
        lines.remove(i);
        for instr in code.iter_mut() {
            match instr {
                Ir::Jump(t) | Ir::JumpIfTruthy(t) | Ir::JumpIfZero(t) => {
                    if *t as usize > i {
                        *t -= 1;
                    }
                }
                _ => {}
            }
        }
    }
}

// --- slot assignment and linking ------------------------------------------

fn link(
    code: Vec<Ir>,
    lines: Vec<Option<SourceLine>>,
    all_vars: &HashSet<String>,
) -> (String, Vec<Option<SourceLine>>) {
    // Fold Lc 0 / Lc 1 into Lz / Lo before counting constant usages, per
    // the slot-assignment rule: "count Lc references only after
    // rewriting Lc 0→Lz and Lc 1→Lo".
    let code: Vec<Ir> = code
        .into_iter()
        .map(|instr| match instr {
            Ir::LoadConst(ref value) if value.is_zero() => Ir::Op(OpCode::Lz),
            Ir::LoadConst(ref value) if *value == Decimal::one() => Ir::Op(OpCode::Lo),
            other => other,
        })
        .collect();

    let variable_slots = assign_variable_slots(&code, all_vars);
    let constant_slots = assign_constant_slots(&code);

    let mut variable_names = vec![String::new(); variable_slots.len()];
    for (name, &slot) in &variable_slots {
        variable_names[slot as usize] = name.clone();
    }

    let mut constant_values = vec![String::new(); constant_slots.len()];
    for (key, &slot) in &constant_slots {
        constant_values[slot as usize] = key.0.clone();
    }

    let mut text = String::new();
    text.push_str(&variable_names.join("|"));
    text.push(';');
    text.push_str(&constant_values.join("|"));
    text.push(';');

    for instr in &code {
        match instr {
            Ir::Op(opcode) => text.push_str(&opcode.to_string()),
            Ir::LoadConst(value) => {
                let slot = constant_slots[&DecimalKey::from(value)];
                text.push_str(&OpCode::Lc.to_string());
                text.push_str(&slot.to_string());
            }
            Ir::LoadVar(name) => {
                text.push_str(&OpCode::Lv.to_string());
                text.push_str(&variable_slots[name].to_string());
            }
            Ir::Store(name) => {
                text.push_str(&OpCode::St.to_string());
                text.push_str(&variable_slots[name].to_string());
            }
            Ir::Jump(target) => {
                text.push_str(&OpCode::Ju.to_string());
                text.push_str(&target.to_string());
            }
            Ir::JumpIfTruthy(target) => {
                text.push_str(&OpCode::Jn.to_string());
                text.push_str(&target.to_string());
            }
            Ir::JumpIfZero(target) => {
                text.push_str(&OpCode::Jz.to_string());
                text.push_str(&target.to_string());
            }
            Ir::Label(_) => unreachable!("labels are stripped before linking"),
        }
    }

    (text, lines)
}

/// `Decimal` has no `Hash`/`Eq` impl (its ordering already accounts for
/// scale-insensitive comparison), so constant-slot bookkeeping keys on
/// the canonical display text instead.
#[derive(Clone, Eq, PartialEq, Hash)]
struct DecimalKey(String);

impl DecimalKey {
    fn from(value: &Decimal) -> DecimalKey {
        DecimalKey(value.to_string())
    }
}

/// Every name in `all_vars` gets a slot, even ones the program body never
/// loads or stores — the host's variable namespace (plus any surviving
/// `let` declarations) defines the Machine's variable array, not code
/// usage. Usage counts only break the slot ordering.
fn assign_variable_slots(code: &[Ir], all_vars: &HashSet<String>) -> HashMap<String, u32> {
    let mut counts: HashMap<String, usize> = all_vars.iter().map(|n| (n.clone(), 0)).collect();
    for instr in code {
        match instr {
            Ir::LoadVar(name) | Ir::Store(name) => {
                *counts.entry(name.clone()).or_insert(0) += 1;
            }
            _ => {}
        }
    }

    let mut names: Vec<String> = counts.keys().cloned().collect();
    names.sort_by(|a, b| counts[b].cmp(&counts[a]).then_with(|| a.cmp(b)));

    names
        .into_iter()
        .enumerate()
        .map(|(slot, name)| (name, slot as u32))
        .collect()
}

fn assign_constant_slots(code: &[Ir]) -> HashMap<DecimalKey, u32> {
    let mut counts: HashMap<DecimalKey, usize> = HashMap::new();
    for instr in code {
        if let Ir::LoadConst(value) = instr {
            *counts.entry(DecimalKey::from(value)).or_insert(0) += 1;
        }
    }

    let mut keys: Vec<DecimalKey> = counts.keys().cloned().collect();
    keys.sort_by(|a, b| counts[b].cmp(&counts[a]).then_with(|| a.0.cmp(&b.0)));

    keys.into_iter()
        .enumerate()
        .map(|(slot, key)| (key, slot as u32))
        .collect()
}
