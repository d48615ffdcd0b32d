//! Model builder: turns a [`ModelInput`] into the complete MILP.
//!
//! The decision space is the classic activation formulation:
//! - `x[f,t]` (binary): flexibility `f` starts some measure at interval `t`
//! - `y[f,m,t]` (binary): flexibility `f` starts measure `m` at `t`
//! - `z_end[f,m,t]` (binary): a measure `m` of `f` ends at `t`
//! - `cost`, `cost_act`, `energy` (continuous, per `(f,m)`): accounting
//!   values pinned by equality constraints
//!
//! Every sum silently drops terms whose shifted interval index falls
//! outside `[1, T]`. That truncation is part of the model's contract:
//! a dependency window pushed fully outside the horizon leaves an empty
//! sum, which can pin the depending indicator to zero.

use itertools::iproduct;

use super::error::OptimizeError;
use super::problem::{Comparison, LinearExpr, MilpProblem, ObjectiveSense, VarId, VarKind};
use super::types::{MeasureKey, ModelInput, PowerKey};

/// The built optimization model: the solver-ready problem plus the index
/// maps needed to read the solution back.
#[derive(Debug)]
pub struct FlexModel {
    pub problem: MilpProblem,
    x: Vec<Vec<VarId>>,
    y: Vec<Vec<Vec<VarId>>>,
    z_end: Vec<Vec<Vec<VarId>>>,
    cost: Vec<Vec<VarId>>,
    cost_act: Vec<Vec<VarId>>,
    energy: Vec<Vec<VarId>>,
}

impl FlexModel {
    /// Deterministically constructs the full variable set, constraint
    /// system and objective from normalized parameters.
    pub fn build(input: &ModelInput) -> Result<Self, OptimizeError> {
        validate(input)?;

        let f_count = input.flexibilities.len();
        let m_count = input.measures.len();
        let t_count = input.times.len();

        let mut problem = MilpProblem::new(ObjectiveSense::Maximize);

        let mut x = vec![vec![0; t_count]; f_count];
        for (fi, ti) in iproduct!(0..f_count, 0..t_count) {
            x[fi][ti] = problem.add_var(VarKind::Binary);
        }
        let mut y = vec![vec![vec![0; t_count]; m_count]; f_count];
        for (fi, mi, ti) in iproduct!(0..f_count, 0..m_count, 0..t_count) {
            y[fi][mi][ti] = problem.add_var(VarKind::Binary);
        }
        let mut z_end = vec![vec![vec![0; t_count]; m_count]; f_count];
        for (fi, mi, ti) in iproduct!(0..f_count, 0..m_count, 0..t_count) {
            z_end[fi][mi][ti] = problem.add_var(VarKind::Binary);
        }
        let mut cost = vec![vec![0; m_count]; f_count];
        let mut cost_act = vec![vec![0; m_count]; f_count];
        let mut energy = vec![vec![0; m_count]; f_count];
        for (fi, mi) in iproduct!(0..f_count, 0..m_count) {
            cost[fi][mi] = problem.add_var(VarKind::Free);
            cost_act[fi][mi] = problem.add_var(VarKind::Free);
            energy[fi][mi] = problem.add_var(VarKind::Free);
        }

        let mut model = Self { problem, x, y, z_end, cost, cost_act, energy };

        model.set_objective(input)?;
        model.add_usage_bounds(input);
        model.add_activation_decomposition(input);
        model.add_measure_index_validity(input);
        model.add_time_window_validity(input);
        model.add_end_linkage(input)?;
        model.add_horizon_fit(input)?;
        model.add_regeneration_exclusivity(input)?;
        model.add_overlap_prevention(input)?;
        model.add_cost_accounting(input)?;
        model.add_dependencies(input);
        model.add_energy_accounting(input)?;

        Ok(model)
    }

    pub fn x(&self, f: u32, t: u32) -> VarId {
        self.x[(f - 1) as usize][(t - 1) as usize]
    }

    pub fn y(&self, f: u32, m: u32, t: u32) -> VarId {
        self.y[(f - 1) as usize][(m - 1) as usize][(t - 1) as usize]
    }

    fn z(&self, f: u32, m: u32, t: u32) -> VarId {
        self.z_end[(f - 1) as usize][(m - 1) as usize][(t - 1) as usize]
    }

    fn cost_var(&self, f: u32, m: u32) -> VarId {
        self.cost[(f - 1) as usize][(m - 1) as usize]
    }

    fn cost_act_var(&self, f: u32, m: u32) -> VarId {
        self.cost_act[(f - 1) as usize][(m - 1) as usize]
    }

    /// Accounting variable holding the signed energy of measure `(f, m)`.
    pub fn energy_var(&self, f: u32, m: u32) -> VarId {
        self.energy[(f - 1) as usize][(m - 1) as usize]
    }

    /// Maximize savings from shifted consumption minus one-time start
    /// costs. Negative power draws represent avoided consumption, hence
    /// the negated price; power is in W, prices per kWh, hence the /1000.
    fn set_objective(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        let mut objective = LinearExpr::new();
        for (&f, &m, &t) in iproduct!(&input.flexibilities, &input.measures, &input.times) {
            for &i in &input.offsets {
                if t + i - 1 > input.horizon {
                    continue;
                }
                let coeff = input.interval_hours * power_at(input, f, m, i)?
                    * -price_at(input, t + i - 1)?
                    / 1000.0;
                objective.add(self.y(f, m, t), coeff);
            }
            objective.add(self.y(f, m, t), -start_cost_at(input, f, m)?);
        }
        self.problem.objective = objective;
        Ok(())
    }

    /// `usageNumber_min[f] <= sum_t x[f,t] <= usageNumber_max[f]`.
    fn add_usage_bounds(&mut self, input: &ModelInput) {
        for &f in &input.flexibilities {
            let mut total = LinearExpr::new();
            for &t in &input.times {
                total.add(self.x(f, t), 1.0);
            }
            let min = f64::from(input.usage_min[(f - 1) as usize]);
            let max = f64::from(input.usage_max[(f - 1) as usize]);
            self.problem.constrain(total.clone(), Comparison::GreaterOrEqual, min);
            self.problem.constrain(total, Comparison::LessOrEqual, max);
        }
    }

    /// An activation at `t` is exactly one measure choice:
    /// `x[f,t] == sum_m y[f,m,t]`.
    fn add_activation_decomposition(&mut self, input: &ModelInput) {
        for (&t, &f) in iproduct!(&input.times, &input.flexibilities) {
            let mut expr = LinearExpr::term(self.x(f, t), 1.0);
            for &m in &input.measures {
                expr.add(self.y(f, m, t), -1.0);
            }
            self.problem.constrain(expr, Comparison::Equal, 0.0);
        }
    }

    /// Measures beyond the count registered for a flexibility are forced
    /// to zero.
    fn add_measure_index_validity(&mut self, input: &ModelInput) {
        let max_registered = input.measures_per_flexibility.iter().copied().max().unwrap_or(0);
        for &t in &input.times {
            for (fi, &registered) in input.measures_per_flexibility.iter().enumerate() {
                let f = fi as u32 + 1;
                let mut expr = LinearExpr::new();
                for m in registered + 1..=max_registered {
                    expr.add(self.y(f, m, t), 1.0);
                }
                self.problem.constrain(expr, Comparison::Equal, 0.0);
            }
        }
    }

    /// `y[f,m,t] <= validity_in_time_format[f][t]`.
    fn add_time_window_validity(&mut self, input: &ModelInput) {
        for (&f, &t, &m) in iproduct!(&input.flexibilities, &input.times, &input.measures) {
            let allowed = f64::from(input.validity[(f - 1) as usize][(t - 1) as usize]);
            self.problem.constrain(
                LinearExpr::term(self.y(f, m, t), 1.0),
                Comparison::LessOrEqual,
                allowed,
            );
        }
    }

    /// `y[f,m,t] == z_end[f,m,t + duration]` whenever the end falls inside
    /// the horizon.
    fn add_end_linkage(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &t, &m) in iproduct!(&input.flexibilities, &input.times, &input.measures) {
            let len = duration_at(input, f, m)?;
            if t + len <= input.horizon {
                let mut expr = LinearExpr::term(self.y(f, m, t), 1.0);
                expr.add(self.z(f, m, t + len), -1.0);
                self.problem.constrain(expr, Comparison::Equal, 0.0);
            }
        }
        Ok(())
    }

    /// An activation plus its duration plus regeneration tail must fit in
    /// the horizon: `y[f,m,t] * (t + duration + regeneration) <= T`.
    fn add_horizon_fit(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &t, &m) in iproduct!(&input.flexibilities, &input.times, &input.measures) {
            let len = duration_at(input, f, m)?;
            let regen = regeneration_at(input, f, m)?;
            self.problem.constrain(
                LinearExpr::term(self.y(f, m, t), f64::from(t + len + regen)),
                Comparison::LessOrEqual,
                f64::from(input.horizon),
            );
        }
        Ok(())
    }

    /// No restart of the same `(f,m)` during its regeneration window:
    /// `sum_h y[f,m,t+h+duration-1] <= regeneration * (1 - y[f,m,t])`.
    fn add_regeneration_exclusivity(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &t, &m) in iproduct!(&input.flexibilities, &input.times, &input.measures) {
            let len = duration_at(input, f, m)?;
            let regen = regeneration_at(input, f, m)?;
            if regen == 0 {
                continue;
            }
            let mut expr = LinearExpr::new();
            for h in 1..=regen {
                let slot = t + h + len - 1;
                if slot <= input.horizon {
                    expr.add(self.y(f, m, slot), 1.0);
                }
            }
            expr.add(self.y(f, m, t), f64::from(regen));
            self.problem.constrain(expr, Comparison::LessOrEqual, f64::from(regen));
        }
        Ok(())
    }

    /// While a multi-interval measure runs (plus its regeneration tail) no
    /// other activation may start on the same flexibility. Big-M with
    /// `M = duration + regeneration - 1`.
    fn add_overlap_prevention(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &m, &t) in iproduct!(&input.flexibilities, &input.measures, &input.times) {
            let len = duration_at(input, f, m)?;
            let regen = regeneration_at(input, f, m)?;
            if len < 2 {
                continue;
            }
            let big_m = f64::from(len + regen - 1);
            let mut expr = LinearExpr::new();
            for h in 2..=len + regen {
                let slot = t + h - 1;
                if slot <= input.horizon {
                    expr.add(self.x(f, slot), 1.0);
                }
            }
            expr.add(self.y(f, m, t), big_m);
            self.problem.constrain(expr, Comparison::LessOrEqual, big_m);
        }
        Ok(())
    }

    /// Pins `cost[f,m]` to the market cost of the activated trace and
    /// `cost_act[f,m]` to the accumulated start costs.
    fn add_cost_accounting(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &m) in iproduct!(&input.flexibilities, &input.measures) {
            let mut expr = LinearExpr::term(self.cost_var(f, m), 1.0);
            for (&t, &i) in iproduct!(&input.times, &input.offsets) {
                if t + i - 1 > input.horizon {
                    continue;
                }
                let coeff = power_at(input, f, m, i)? * price_at(input, t + i - 1)?;
                expr.add(self.y(f, m, t), -coeff);
            }
            self.problem.constrain(expr, Comparison::Equal, 0.0);
        }
        for (&f, &m) in iproduct!(&input.flexibilities, &input.measures) {
            let mut expr = LinearExpr::term(self.cost_act_var(f, m), 1.0);
            let start = start_cost_at(input, f, m)?;
            for &t in &input.times {
                expr.add(self.y(f, m, t), -start);
            }
            self.problem.constrain(expr, Comparison::Equal, 0.0);
        }
        Ok(())
    }

    /// Pins `energy[f,m]` to the signed energy moved by the measure:
    /// `energy[f,m] == sum_{t,i} -y[f,m,t] * power[f,m,i] * interval_hours`.
    fn add_energy_accounting(&mut self, input: &ModelInput) -> Result<(), OptimizeError> {
        for (&f, &m) in iproduct!(&input.flexibilities, &input.measures) {
            let mut expr = LinearExpr::term(self.energy_var(f, m), 1.0);
            for (&t, &i) in iproduct!(&input.times, &input.offsets) {
                if t + i - 1 > input.horizon {
                    continue;
                }
                expr.add(self.y(f, m, t), power_at(input, f, m, i)? * input.interval_hours);
            }
            self.problem.constrain(expr, Comparison::Equal, 0.0);
        }
        Ok(())
    }

    /// `sum_a x[f, t+a]` over the in-horizon part of the window.
    fn start_sum_window(&self, input: &ModelInput, f: u32, t: u32, from: i64, to: i64) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for a in from..=to {
            let slot = i64::from(t) + a;
            if slot >= 1 && slot <= i64::from(input.horizon) {
                expr.add(self.x(f, slot as u32), 1.0);
            }
        }
        expr
    }

    /// `sum_{m,a} z_end[f, m, t+a]` over the in-horizon part of the window.
    fn end_sum_window(&self, input: &ModelInput, f: u32, t: u32, from: i64, to: i64) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for &m in &input.measures {
            for a in from..=to {
                let slot = i64::from(t) + a;
                if slot >= 1 && slot <= i64::from(input.horizon) {
                    expr.add(self.z(f, m, slot as u32), 1.0);
                }
            }
        }
        expr
    }

    /// `sum_m z_end[f, m, t]`: the indicator that any measure of `f` ends
    /// at `t`.
    fn end_sum_at(&self, input: &ModelInput, f: u32, t: u32) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for &m in &input.measures {
            expr.add(self.z(f, m, t), 1.0);
        }
        expr
    }

    /// Compiles the eight dependency families. Implications are `<=` with
    /// the windowed sum on the right; exclusions use a big-M equal to the
    /// nominal window length `to - from + 1`.
    fn add_dependencies(&mut self, input: &ModelInput) {
        for &t in &input.times {
            for arc in &input.dependencies.start_implies_start {
                let mut expr = LinearExpr::term(self.x(arc.first, t), 1.0);
                for (var, coeff) in self.start_sum_window(input, arc.second, t, arc.from, arc.to).iter() {
                    expr.add(var, -coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, 0.0);
            }
            for arc in &input.dependencies.start_implies_end {
                let mut expr = LinearExpr::term(self.x(arc.first, t), 1.0);
                for (var, coeff) in self.end_sum_window(input, arc.second, t, arc.from, arc.to).iter() {
                    expr.add(var, -coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, 0.0);
            }
            for arc in &input.dependencies.end_implies_start {
                let mut expr = self.end_sum_at(input, arc.first, t);
                for (var, coeff) in self.start_sum_window(input, arc.second, t, arc.from, arc.to).iter() {
                    expr.add(var, -coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, 0.0);
            }
            for arc in &input.dependencies.end_implies_end {
                let mut expr = self.end_sum_at(input, arc.first, t);
                for (var, coeff) in self.end_sum_window(input, arc.second, t, arc.from, arc.to).iter() {
                    expr.add(var, -coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, 0.0);
            }
            for arc in &input.dependencies.start_excludes_start {
                let big_m = (arc.to - arc.from + 1) as f64;
                let mut expr = self.start_sum_window(input, arc.second, t, arc.from, arc.to);
                expr.add(self.x(arc.first, t), big_m);
                self.problem.constrain(expr, Comparison::LessOrEqual, big_m);
            }
            for arc in &input.dependencies.start_excludes_end {
                let big_m = (arc.to - arc.from + 1) as f64;
                let mut expr = self.end_sum_window(input, arc.second, t, arc.from, arc.to);
                expr.add(self.x(arc.first, t), big_m);
                self.problem.constrain(expr, Comparison::LessOrEqual, big_m);
            }
            for arc in &input.dependencies.end_excludes_start {
                let big_m = (arc.to - arc.from + 1) as f64;
                let mut expr = self.start_sum_window(input, arc.second, t, arc.from, arc.to);
                for (var, coeff) in self.end_sum_at(input, arc.first, t).iter() {
                    expr.add(var, big_m * coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, big_m);
            }
            for arc in &input.dependencies.end_excludes_end {
                let big_m = (arc.to - arc.from + 1) as f64;
                // The end indicator of the second flexibility is counted
                // once per in-horizon window offset, without shifting.
                let mut expr = LinearExpr::new();
                for &m in &input.measures {
                    for a in arc.from..=arc.to {
                        let slot = i64::from(t) + a;
                        if slot >= 1 && slot <= i64::from(input.horizon) {
                            expr.add(self.z(arc.second, m, t), 1.0);
                        }
                    }
                }
                for (var, coeff) in self.end_sum_at(input, arc.first, t).iter() {
                    expr.add(var, big_m * coeff);
                }
                self.problem.constrain(expr, Comparison::LessOrEqual, big_m);
            }
        }
    }
}

/// Rejects index ranges the variable space cannot represent. The original
/// formulation left these unspecified; failing fast beats silently
/// truncating a set.
fn validate(input: &ModelInput) -> Result<(), OptimizeError> {
    expect_contiguous("time_set", &input.times)?;
    expect_contiguous("measure_set", &input.measures)?;
    expect_contiguous("flexibilities_set", &input.flexibilities)?;

    if input.times.len() != input.horizon as usize {
        return Err(OptimizeError::InvalidModel(format!(
            "time_set has {} entries but optimization_duration_intervals_num is {}",
            input.times.len(),
            input.horizon
        )));
    }

    let f_count = input.flexibilities.len();
    let per_flexibility = [
        ("usageNumber_min", input.usage_min.len()),
        ("usageNumber_max", input.usage_max.len()),
        ("validity_in_time_format", input.validity.len()),
        ("measure_num_of_each_machine", input.measures_per_flexibility.len()),
    ];
    for (name, len) in per_flexibility {
        if len != f_count {
            return Err(OptimizeError::InvalidModel(format!(
                "{name} has {len} entries for {f_count} flexibilities"
            )));
        }
    }
    for (fi, row) in input.validity.iter().enumerate() {
        if row.len() != input.times.len() {
            return Err(OptimizeError::InvalidModel(format!(
                "validity_in_time_format[{fi}] covers {} intervals, expected {}",
                row.len(),
                input.times.len()
            )));
        }
    }
    if let Some(&max_registered) = input.measures_per_flexibility.iter().max() {
        if max_registered as usize > input.measures.len() {
            return Err(OptimizeError::InvalidModel(format!(
                "measure_num_of_each_machine registers measure {max_registered} outside measure_set"
            )));
        }
    }
    for arc in input.dependencies.iter_all() {
        for id in [arc.first, arc.second] {
            if id == 0 || id as usize > f_count {
                return Err(OptimizeError::InvalidModel(format!(
                    "dependency references unknown flexibility {id}"
                )));
            }
        }
    }
    Ok(())
}

fn expect_contiguous(name: &str, set: &[u32]) -> Result<(), OptimizeError> {
    for (idx, &value) in set.iter().enumerate() {
        if value != idx as u32 + 1 {
            return Err(OptimizeError::InvalidModel(format!(
                "{name} must be the contiguous range 1..={}",
                set.len()
            )));
        }
    }
    Ok(())
}

fn price_at(input: &ModelInput, t: u32) -> Result<f64, OptimizeError> {
    input.prices.get(&t).copied().ok_or(OptimizeError::MissingParameter {
        name: "electricity_price",
        key: t.to_string(),
    })
}

fn power_at(input: &ModelInput, f: u32, m: u32, i: u32) -> Result<f64, OptimizeError> {
    let key = PowerKey { flexibility: f, measure: m, offset: i };
    input.power.get(&key).copied().ok_or(OptimizeError::MissingParameter {
        name: "power_for_measure",
        key: key.to_string(),
    })
}

fn start_cost_at(input: &ModelInput, f: u32, m: u32) -> Result<f64, OptimizeError> {
    let key = MeasureKey { flexibility: f, measure: m };
    input.start_cost.get(&key).copied().ok_or(OptimizeError::MissingParameter {
        name: "start_cost",
        key: key.to_string(),
    })
}

fn duration_at(input: &ModelInput, f: u32, m: u32) -> Result<u32, OptimizeError> {
    let key = MeasureKey { flexibility: f, measure: m };
    input.duration.get(&key).copied().ok_or(OptimizeError::MissingParameter {
        name: "time_length_of_measure",
        key: key.to_string(),
    })
}

fn regeneration_at(input: &ModelInput, f: u32, m: u32) -> Result<u32, OptimizeError> {
    let key = MeasureKey { flexibility: f, measure: m };
    input.regeneration.get(&key).copied().ok_or(OptimizeError::MissingParameter {
        name: "regeneration_time",
        key: key.to_string(),
    })
}
