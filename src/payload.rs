//! Wire-level request types and the payload normalizer.
//!
//! Clients send parameter maps keyed by stringified indices: `"7"` for an
//! interval, `"(f,m)"` for a measure, `"(f,m,i)"` for a power-trace entry.
//! Normalization parses those keys into typed composite keys and bundles
//! everything into a [`ModelInput`]. Normalizing already-plain integer
//! keys is a no-op; any other key shape is rejected.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::optimizer::types::{Dependencies, DependencyArc, MeasureKey, ModelInput, PowerKey};
use crate::optimizer::OptimizeError;

/// One dependency entry on the wire: `[x1, x2, a, b]`.
pub type RawDependency = (u32, u32, i64, i64);

/// The `POST /optimize` body. Field names follow the wire contract; the
/// eight dependency lists are required.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationRequest {
    pub electricity_price: HashMap<String, f64>,
    pub optimization_duration_intervals_num: u32,
    pub time_interval_duration_hours: f64,
    pub start_cost: HashMap<String, f64>,
    pub power_for_measure: HashMap<String, f64>,
    pub time_length_of_measure: HashMap<String, u32>,
    pub regeneration_time: HashMap<String, u32>,
    #[serde(rename = "usageNumber_max")]
    pub usage_max: Vec<u32>,
    #[serde(rename = "usageNumber_min")]
    pub usage_min: Vec<u32>,
    pub validity_in_time_format: Vec<Vec<u8>>,
    pub time_set: Vec<u32>,
    pub measure_set: Vec<u32>,
    /// Power-trace offsets `1..=L`, `L` the longest measure duration.
    #[serde(rename = "max_lenght_of_measure_among_all_efdms")]
    pub measure_offsets: Vec<u32>,
    pub flexibilities_set: Vec<u32>,
    pub measure_num_of_each_machine: Vec<u32>,
    #[serde(rename = "list_of_dependencies_x2_implies_starts_from_a_to_b_step_start_x1")]
    pub start_implies_start: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_implies_starts_from_a_to_b_step_ends_x1")]
    pub start_implies_end: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_implies_ends_from_a_to_b_step_start_x1")]
    pub end_implies_start: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_implies_ends_from_a_to_b_step_ends_x1")]
    pub end_implies_end: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_start_x1")]
    pub start_excludes_start: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_ends_x1")]
    pub start_excludes_end: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_start_x1")]
    pub end_excludes_start: Vec<RawDependency>,
    #[serde(rename = "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_ends_x1")]
    pub end_excludes_end: Vec<RawDependency>,
}

impl OptimizationRequest {
    /// Parses all stringified keys and assembles the typed model input.
    pub fn normalize(&self) -> Result<ModelInput, OptimizeError> {
        let mut prices = BTreeMap::new();
        for (key, &value) in &self.electricity_price {
            prices.insert(parse_interval_key(key)?, value);
        }

        let start_cost = parse_measure_map(&self.start_cost)?;
        let duration = parse_measure_map(&self.time_length_of_measure)?;
        let regeneration = parse_measure_map(&self.regeneration_time)?;

        let mut power = HashMap::with_capacity(self.power_for_measure.len());
        for (key, &value) in &self.power_for_measure {
            power.insert(parse_power_key(key)?, value);
        }

        let dependencies = Dependencies {
            start_implies_start: to_arcs(&self.start_implies_start),
            start_implies_end: to_arcs(&self.start_implies_end),
            end_implies_start: to_arcs(&self.end_implies_start),
            end_implies_end: to_arcs(&self.end_implies_end),
            start_excludes_start: to_arcs(&self.start_excludes_start),
            start_excludes_end: to_arcs(&self.start_excludes_end),
            end_excludes_start: to_arcs(&self.end_excludes_start),
            end_excludes_end: to_arcs(&self.end_excludes_end),
        };

        Ok(ModelInput {
            horizon: self.optimization_duration_intervals_num,
            interval_hours: self.time_interval_duration_hours,
            prices,
            start_cost,
            power,
            duration,
            regeneration,
            usage_min: self.usage_min.clone(),
            usage_max: self.usage_max.clone(),
            validity: self.validity_in_time_format.clone(),
            times: self.time_set.clone(),
            measures: self.measure_set.clone(),
            offsets: self.measure_offsets.clone(),
            flexibilities: self.flexibilities_set.clone(),
            measures_per_flexibility: self.measure_num_of_each_machine.clone(),
            dependencies,
        })
    }
}

fn malformed(key: &str) -> OptimizeError {
    OptimizeError::MalformedKey { key: key.to_string() }
}

/// A plain (possibly whitespace-padded) non-negative integer.
fn parse_interval_key(key: &str) -> Result<u32, OptimizeError> {
    key.trim().parse().map_err(|_| malformed(key))
}

/// `"(a,b,…)"` with exactly `arity` integer fields.
fn parse_tuple_key(key: &str, arity: usize) -> Result<Vec<u32>, OptimizeError> {
    let inner = key
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| malformed(key))?;
    let fields: Vec<&str> = inner.split(',').collect();
    if fields.len() != arity {
        return Err(malformed(key));
    }
    fields
        .into_iter()
        .map(|field| field.trim().parse().map_err(|_| malformed(key)))
        .collect()
}

fn parse_measure_key(key: &str) -> Result<MeasureKey, OptimizeError> {
    let fields = parse_tuple_key(key, 2)?;
    Ok(MeasureKey { flexibility: fields[0], measure: fields[1] })
}

fn parse_power_key(key: &str) -> Result<PowerKey, OptimizeError> {
    let fields = parse_tuple_key(key, 3)?;
    Ok(PowerKey { flexibility: fields[0], measure: fields[1], offset: fields[2] })
}

fn parse_measure_map<V: Copy>(
    raw: &HashMap<String, V>,
) -> Result<HashMap<MeasureKey, V>, OptimizeError> {
    let mut parsed = HashMap::with_capacity(raw.len());
    for (key, &value) in raw {
        parsed.insert(parse_measure_key(key)?, value);
    }
    Ok(parsed)
}

fn to_arcs(raw: &[RawDependency]) -> Vec<DependencyArc> {
    raw.iter().map(|&(first, second, from, to)| DependencyArc { first, second, from, to }).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::spaced_tuple("(2, 3)")]
    #[case::padded_int_fields("( 2 ,3)")]
    fn tolerates_spacing_inside_tuples(#[case] key: &str) {
        assert_eq!(
            parse_measure_key(key).unwrap(),
            MeasureKey { flexibility: 2, measure: 3 }
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::word("price")]
    #[case::unclosed("(1,2")]
    #[case::unopened("1,2)")]
    #[case::non_numeric("(a,b)")]
    #[case::wrong_separator("(1;2)")]
    #[case::wrong_arity("(1,2,3)")]
    #[case::negative_index("(-1,2)")]
    fn rejects_malformed_measure_keys(#[case] key: &str) {
        let err = parse_measure_key(key).unwrap_err();
        assert!(matches!(err, OptimizeError::MalformedKey { .. }), "got {err}");
    }

    #[test]
    fn power_keys_need_three_fields() {
        assert!(parse_power_key("(1,2)").is_err());
        assert_eq!(
            parse_power_key("(1,2,3)").unwrap(),
            PowerKey { flexibility: 1, measure: 2, offset: 3 }
        );
    }

    fn sample_request() -> OptimizationRequest {
        serde_json::from_value(json!({
            "electricity_price": {"1": 10.0, "2": 20.0},
            "optimization_duration_intervals_num": 2,
            "time_interval_duration_hours": 0.5,
            "start_cost": {"(1,1)": 1.5},
            "power_for_measure": {"(1,1,1)": -5.0},
            "time_length_of_measure": {"(1,1)": 1},
            "regeneration_time": {"(1,1)": 0},
            "usageNumber_max": [1],
            "usageNumber_min": [0],
            "validity_in_time_format": [[1, 1]],
            "time_set": [1, 2],
            "measure_set": [1],
            "max_lenght_of_measure_among_all_efdms": [1],
            "flexibilities_set": [1],
            "measure_num_of_each_machine": [1],
            "list_of_dependencies_x2_implies_starts_from_a_to_b_step_start_x1": [[1, 1, -1, 1]],
            "list_of_dependencies_x2_implies_starts_from_a_to_b_step_ends_x1": [],
            "list_of_dependencies_x2_implies_ends_from_a_to_b_step_start_x1": [],
            "list_of_dependencies_x2_implies_ends_from_a_to_b_step_ends_x1": [],
            "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_start_x1": [],
            "list_of_dependencies_x2_excludes_starts_from_a_to_b_step_ends_x1": [],
            "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_start_x1": [],
            "list_of_dependencies_x2_excludes_ends_from_a_to_b_step_ends_x1": []
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_the_full_sample() {
        let input = sample_request().normalize().unwrap();
        assert_eq!(input.horizon, 2);
        assert_eq!(input.interval_hours, 0.5);
        assert_eq!(input.prices.get(&2), Some(&20.0));
        assert_eq!(
            input.start_cost.get(&MeasureKey { flexibility: 1, measure: 1 }),
            Some(&1.5)
        );
        assert_eq!(
            input.power.get(&PowerKey { flexibility: 1, measure: 1, offset: 1 }),
            Some(&-5.0)
        );
        assert_eq!(
            input.dependencies.start_implies_start,
            vec![DependencyArc { first: 1, second: 1, from: -1, to: 1 }]
        );
    }

    #[test]
    fn missing_dependency_list_is_a_deserialization_error() {
        let result: Result<OptimizationRequest, _> = serde_json::from_value(json!({
            "electricity_price": {},
            "optimization_duration_intervals_num": 0,
            "time_interval_duration_hours": 1.0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn bad_key_in_any_map_fails_normalization() {
        let mut request = sample_request();
        request.regeneration_time.insert("not-a-key".into(), 1);
        let err = request.normalize().unwrap_err();
        assert!(matches!(err, OptimizeError::MalformedKey { .. }));
    }

    proptest! {
        /// Formatting a composite key and parsing it back is lossless, and
        /// re-parsing the canonical form is a no-op.
        #[test]
        fn measure_key_roundtrip(f in 1u32..10_000, m in 1u32..10_000) {
            let key = MeasureKey { flexibility: f, measure: m };
            let parsed = parse_measure_key(&key.to_string()).unwrap();
            prop_assert_eq!(parsed, key);
            prop_assert_eq!(parse_measure_key(&parsed.to_string()).unwrap(), key);
        }

        #[test]
        fn interval_key_roundtrip(t in 0u32..1_000_000) {
            prop_assert_eq!(parse_interval_key(&t.to_string()).unwrap(), t);
        }

        /// Keys with junk around the digits never parse silently.
        #[test]
        fn garbage_suffix_is_rejected(t in 0u32..1000, junk in "[a-z]{1,4}") {
            let key = format!("{t}{junk}");
            prop_assert!(parse_interval_key(&key).is_err());
        }
    }
}
