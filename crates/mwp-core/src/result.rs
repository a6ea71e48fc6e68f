//! Analysis results
//!
//! Per-function and per-loop records plus the top-level aggregate that the
//! driver serializes. Timing is wall-clock nanoseconds since the epoch.

use crate::bound::Bound;
use crate::choice::Choices;
use crate::relation::Relation;
use crate::semiring::Scalar;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Outcome of analyzing one function.
#[derive(Clone, Debug, Serialize)]
pub struct FuncResult {
    pub name: String,
    pub infinite: bool,
    pub variables: Vec<String>,
    /// Number of delta indices the derivation consumed.
    pub index: usize,
    pub relation: Option<Relation>,
    pub choices: Option<Choices>,
    pub bound: Option<Bound>,
    /// Failing (input, output) pairs when infinite.
    pub inf_flows: Vec<(String, String)>,
    pub start_time_ns: u128,
    pub end_time_ns: u128,
}

impl FuncResult {
    pub fn new(name: &str) -> Self {
        FuncResult {
            name: name.to_string(),
            infinite: false,
            variables: Vec::new(),
            index: 0,
            relation: None,
            choices: None,
            bound: None,
            inf_flows: Vec::new(),
            start_time_ns: now_ns(),
            end_time_ns: 0,
        }
    }

    pub fn finish(&mut self) {
        self.end_time_ns = now_ns();
    }
}

/// Outcome of analyzing one loop in isolation.
#[derive(Clone, Debug, Serialize)]
pub struct LoopResult {
    pub func_name: String,
    /// The loop statement, rendered as source.
    pub loop_code: String,
    pub variables: Vec<String>,
    pub index: usize,
    /// No choice keeps the whole matrix finite.
    pub infinite: bool,
    /// Minimal attainable mwp-class per variable; ∞ when no choice works.
    pub classes: BTreeMap<String, Scalar>,
}

impl LoopResult {
    /// The loop admits some bound on every variable.
    pub fn all_bounded(&self) -> bool {
        self.classes.values().all(|c| !c.is_infty())
    }
}

/// Aggregate result of one analyzer run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnalysisResult {
    pub functions: Vec<FuncResult>,
    pub loops: Vec<LoopResult>,
    pub start_time_ns: u128,
    pub end_time_ns: u128,
}

impl AnalysisResult {
    pub fn on_start(&mut self) {
        if self.start_time_ns == 0 {
            self.start_time_ns = now_ns();
        }
    }

    pub fn on_end(&mut self) {
        self.end_time_ns = now_ns();
    }

    pub fn add_function(&mut self, result: FuncResult) {
        self.functions.push(result);
    }

    pub fn add_loop(&mut self, result: LoopResult) {
        self.loops.push(result);
    }

    pub fn get_function(&self, name: &str) -> Option<&FuncResult> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Log a human-readable summary of the run.
    pub fn log_result(&self) {
        for func in &self.functions {
            if func.infinite {
                info!("{}: no polynomial bound exists", func.name);
                for (input, output) in &func.inf_flows {
                    info!("{}: infinite flow {input} -> {output}", func.name);
                }
            } else if let Some(bound) = &func.bound {
                info!("{}: bound {bound}", func.name);
            }
        }
        for lp in &self.loops {
            let classes: Vec<String> = lp
                .classes
                .iter()
                .map(|(v, c)| format!("{v}:{c}"))
                .collect();
            info!("{} loop [{}]: {}", lp.func_name, lp.loop_code, classes.join(" "));
        }
        let elapsed_ms = self.end_time_ns.saturating_sub(self.start_time_ns) / 1_000_000;
        info!(
            "analyzed {} function(s), {} loop(s) in {elapsed_ms} ms",
            self.functions.len(),
            self.loops.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_is_monotone() {
        let mut result = AnalysisResult::default();
        result.on_start();
        result.on_end();
        assert!(result.end_time_ns >= result.start_time_ns);
        assert!(result.start_time_ns > 0);
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = AnalysisResult::default();
        result.on_start();
        let mut func = FuncResult::new("main");
        func.finish();
        result.add_function(func);
        result.on_end();

        let json = serde_json::to_value(&result).expect("result serializes");
        assert!(json.get("functions").is_some());
        assert!(json.get("loops").is_some());
        assert!(json.get("start_time_ns").is_some());
        let func = &json["functions"][0];
        assert_eq!(func["name"], "main");
        assert_eq!(func["infinite"], false);
        assert!(func["relation"].is_null());
        assert!(func["bound"].is_null());
    }
}
