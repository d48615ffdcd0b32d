#![allow(dead_code)]
//! Shared payload construction for the scenario and API tests.

use serde_json::{json, Map, Value};

use flextool_lp::payload::OptimizationRequest;

pub const DEPENDENCY_LISTS: [&str; 8] = [
    "list_of_dependencies_x2_implies_starts_from_a_to_b_step_start_x1",
    "list_of_dependencies_x2_implies_starts_from_a_to_b_step_ends_x1",
    "list_of_dependencies_x2_implies_ends_from_a_to_b_step_start_x1",
    "list_of_dependencies_x2_implies_ends_from_a_to_b_step_ends_x1",
    "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_start_x1",
    "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_ends_x1",
    "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_start_x1",
    "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_ends_x1",
];

/// Declarative scenario description, rendered into the wire payload.
pub struct ScenarioPayload {
    pub horizon: u32,
    pub interval_hours: f64,
    /// One price per interval, in order.
    pub prices: Vec<f64>,
    pub measure_count: u32,
    pub max_offset: u32,
    pub usage_min: Vec<u32>,
    pub usage_max: Vec<u32>,
    pub validity: Vec<Vec<u8>>,
    pub measures_per_flexibility: Vec<u32>,
    /// `(f, m, value)` entries.
    pub start_cost: Vec<(u32, u32, f64)>,
    /// `(f, m, i, watts)` entries.
    pub power: Vec<(u32, u32, u32, f64)>,
    pub duration: Vec<(u32, u32, u32)>,
    pub regeneration: Vec<(u32, u32, u32)>,
    /// `(wire list name, arcs)` overrides; unnamed lists stay empty.
    pub dependencies: Vec<(&'static str, Vec<(u32, u32, i64, i64)>)>,
}

impl ScenarioPayload {
    pub fn to_json(&self) -> Value {
        let prices: Map<String, Value> = self
            .prices
            .iter()
            .enumerate()
            .map(|(idx, &price)| ((idx as u32 + 1).to_string(), json!(price)))
            .collect();

        let measure_map = |entries: &[(u32, u32, u32)]| -> Map<String, Value> {
            entries.iter().map(|&(f, m, v)| (format!("({f},{m})"), json!(v))).collect()
        };

        let flexibility_count = self.usage_min.len() as u32;
        let mut body = json!({
            "electricity_price": prices,
            "optimization_duration_intervals_num": self.horizon,
            "time_interval_duration_hours": self.interval_hours,
            "start_cost": self.start_cost.iter()
                .map(|&(f, m, v)| (format!("({f},{m})"), json!(v)))
                .collect::<Map<_, _>>(),
            "power_for_measure": self.power.iter()
                .map(|&(f, m, i, v)| (format!("({f},{m},{i})"), json!(v)))
                .collect::<Map<_, _>>(),
            "time_length_of_measure": measure_map(&self.duration),
            "regeneration_time": measure_map(&self.regeneration),
            "usageNumber_max": self.usage_max,
            "usageNumber_min": self.usage_min,
            "validity_in_time_format": self.validity,
            "time_set": (1..=self.horizon).collect::<Vec<_>>(),
            "measure_set": (1..=self.measure_count).collect::<Vec<_>>(),
            "max_lenght_of_measure_among_all_efdms": (1..=self.max_offset).collect::<Vec<_>>(),
            "flexibilities_set": (1..=flexibility_count).collect::<Vec<_>>(),
            "measure_num_of_each_machine": self.measures_per_flexibility,
        });

        let map = body.as_object_mut().unwrap();
        for list in DEPENDENCY_LISTS {
            map.insert(list.to_string(), json!([]));
        }
        for (list, arcs) in &self.dependencies {
            let rendered: Vec<Value> =
                arcs.iter().map(|&(x1, x2, a, b)| json!([x1, x2, a, b])).collect();
            map.insert((*list).to_string(), json!(rendered));
        }
        body
    }

    pub fn request(&self) -> OptimizationRequest {
        serde_json::from_value(self.to_json()).unwrap()
    }
}

/// One flexibility, one 2-interval measure with a 1-interval regeneration
/// tail, exactly one required activation, flat prices.
pub fn single_flexibility() -> ScenarioPayload {
    ScenarioPayload {
        horizon: 6,
        interval_hours: 1.0,
        prices: vec![10.0; 6],
        measure_count: 1,
        max_offset: 2,
        usage_min: vec![1],
        usage_max: vec![1],
        validity: vec![vec![1; 6]],
        measures_per_flexibility: vec![1],
        start_cost: vec![(1, 1, 0.0)],
        power: vec![(1, 1, 1, -5.0), (1, 1, 2, -5.0)],
        duration: vec![(1, 1, 2)],
        regeneration: vec![(1, 1, 1)],
        dependencies: Vec::new(),
    }
}

/// Two flexibilities; the second is attractive on its own and only a
/// dependency can keep it idle.
pub fn two_flexibilities() -> ScenarioPayload {
    ScenarioPayload {
        horizon: 6,
        interval_hours: 1.0,
        prices: vec![10.0; 6],
        measure_count: 1,
        max_offset: 2,
        usage_min: vec![1, 0],
        usage_max: vec![1, 1],
        validity: vec![vec![1; 6], vec![1; 6]],
        measures_per_flexibility: vec![1, 1],
        start_cost: vec![(1, 1, 0.0), (2, 1, 0.0)],
        power: vec![
            (1, 1, 1, -5.0),
            (1, 1, 2, -5.0),
            (2, 1, 1, -5.0),
            (2, 1, 2, 0.0),
        ],
        duration: vec![(1, 1, 2), (2, 1, 1)],
        regeneration: vec![(1, 1, 1), (2, 1, 0)],
        dependencies: Vec::new(),
    }
}
