//! Post-parse validation: every branch must target a real state, and the
//! state graph must be acyclic. Self-loops are already rejected by the
//! parser; this module runs Tarjan's algorithm to catch longer cycles.

use std::collections::HashMap;

use crate::ast::Ast;
use crate::error::{CompilationError, CompilationErrorKind};

pub fn validate(ast: &Ast) -> Result<(), CompilationError> {
    if ast.states.is_empty() {
        return Err(CompilationError::new(CompilationErrorKind::NoStates));
    }

    let index_of: HashMap<&str, usize> = ast
        .states
        .iter()
        .enumerate()
        .map(|(i, s)| (s.label.as_str(), i))
        .collect();

    for state in &ast.states {
        for branch in state.branches() {
            if !index_of.contains_key(branch.destination.as_str()) {
                return Err(CompilationError::at_line(
                    CompilationErrorKind::UndefinedLabel(format!("@{}", branch.destination)),
                    branch.line.start(),
                ));
            }
        }
    }

    let adjacency: Vec<Vec<usize>> = ast
        .states
        .iter()
        .map(|state| {
            state
                .branches()
                .map(|b| index_of[b.destination.as_str()])
                .collect()
        })
        .collect();

    if let Some(cycle) = find_cycle(&adjacency) {
        let labels = cycle
            .into_iter()
            .map(|i| format!("\"@{}\"", ast.states[i].label))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CompilationError::new(CompilationErrorKind::Cycle(labels)));
    }

    Ok(())
}

/// Tarjan's strongly-connected-components algorithm, returning the first
/// SCC of size greater than one it finds (a cycle), or `None` if the
/// graph is acyclic.
fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    struct Tarjan<'a> {
        adjacency: &'a [Vec<usize>],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next_index: usize,
        cycle: Option<Vec<usize>>,
    }

    impl<'a> Tarjan<'a> {
        fn visit(&mut self, v: usize) {
            if self.cycle.is_some() {
                return;
            }
            self.index[v] = Some(self.next_index);
            self.lowlink[v] = self.next_index;
            self.next_index += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            for &w in &self.adjacency[v] {
                if self.cycle.is_some() {
                    return;
                }
                if self.index[w].is_none() {
                    self.visit(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                } else if self.on_stack[w] {
                    self.lowlink[v] = self.lowlink[v].min(self.index[w].unwrap());
                }
            }

            if self.lowlink[v] == self.index[v].unwrap() {
                let mut component = Vec::new();
                loop {
                    let w = self.stack.pop().unwrap();
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if component.len() > 1 {
                    self.cycle = Some(component);
                }
            }
        }
    }

    let n = adjacency.len();
    let mut tarjan = Tarjan {
        adjacency,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        next_index: 0,
        cycle: None,
    };

    for v in 0..n {
        if tarjan.cycle.is_some() {
            break;
        }
        if tarjan.index[v].is_none() {
            tarjan.visit(v);
        }
    }

    tarjan.cycle
}
