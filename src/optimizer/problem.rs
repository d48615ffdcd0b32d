//! Solver-agnostic MILP intermediate representation.
//!
//! The builder assembles a [`MilpProblem`] from these pieces; solver
//! adapters translate it into their backend's API. Keeping the IR free of
//! backend types keeps the model builder testable without a solver.

use std::collections::BTreeMap;

/// Index of a decision variable within its [`MilpProblem`].
pub type VarId = usize;

/// The two variable shapes the model needs: 0/1 indicators and unbounded
/// continuous accounting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Free,
}

/// A sparse linear expression over decision variables. Adding a term for a
/// variable that is already present merges the coefficients, which is what
/// makes repeated-index sums come out right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-term expression `coeff * var`.
    pub fn term(var: VarId, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add(var, coeff);
        expr
    }

    /// Accumulates `coeff * var` into the expression.
    pub fn add(&mut self, var: VarId, coeff: f64) {
        *self.terms.entry(var).or_insert(0.0) += coeff;
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Terms in ascending variable order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coeff)| (var, coeff))
    }

    /// Value of the expression under a dense assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.iter().map(|(var, coeff)| coeff * values[var]).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Maximize,
    Minimize,
}

/// A complete mixed-integer linear program.
#[derive(Debug, Clone, PartialEq)]
pub struct MilpProblem {
    vars: Vec<VarKind>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: LinearExpr,
    pub sense: ObjectiveSense,
}

impl MilpProblem {
    pub fn new(sense: ObjectiveSense) -> Self {
        Self { vars: Vec::new(), constraints: Vec::new(), objective: LinearExpr::new(), sense }
    }

    /// Registers a variable and returns its id. Ids are dense and start
    /// at zero, so solution vectors can be indexed directly.
    pub fn add_var(&mut self, kind: VarKind) -> VarId {
        self.vars.push(kind);
        self.vars.len() - 1
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn var_kinds(&self) -> &[VarKind] {
        &self.vars
    }

    pub fn constrain(&mut self, expr: LinearExpr, cmp: Comparison, rhs: f64) {
        self.constraints.push(LinearConstraint { expr, cmp, rhs });
    }
}
