// Approach-formula selection under a weighting policy.
//
// For a chosen target degree the chord profile says which formula type it
// takes; every formula of that type is a candidate. Each candidate starts
// with weight `max(1, len - 1)` (its approach-note count), and an optional
// `FormulaPolicy` scales it by a per-type length multiplier, a per-type group
// multiplier, and a repetition penalty when the type matches the one chosen
// for the previous chord. If every weight ends up at zero the draw falls
// back to uniform.
//
// `FormulaSelector` carries the "last type" memory. It lives for exactly one
// scheduling run.

use crate::error::ScheduleError;
use bebop_prng::LineRng;
use bebop_theory::formula::FormulaType;
use bebop_theory::{ChordProfile, TheoryStore};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest repetition penalty honoured; anything above is clamped.
pub const MAX_REPETITION_PENALTY: f64 = 0.95;

/// Multipliers for one formula type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeighting {
    /// Formula length (target included) -> multiplier.
    pub length: BTreeMap<usize, f64>,
    /// Group label -> multiplier.
    pub group: BTreeMap<String, f64>,
}

impl TypeWeighting {
    fn factor(&self, candidate: &FormulaCandidate) -> f64 {
        let by_length = self.length.get(&candidate.pattern.len()).copied().unwrap_or(1.0);
        let by_group = self.group.get(&candidate.group).copied().unwrap_or(1.0);
        by_length * by_group
    }
}

/// Tunable selection and landing preferences, loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaPolicy {
    pub type1: TypeWeighting,
    pub type2: TypeWeighting,
    /// Fractional weight cut when a chord reuses the previous chord's type.
    pub repetition_penalty: f64,
    /// Window length -> preferred landing offsets, tried before the rest.
    pub landing_order: BTreeMap<u32, Vec<u32>>,
}

impl FormulaPolicy {
    pub fn weighting(&self, formula_type: FormulaType) -> &TypeWeighting {
        match formula_type {
            FormulaType::Type1 => &self.type1,
            FormulaType::Type2 => &self.type2,
        }
    }

    /// Penalty actually applied, clamped into `[0, 0.95]`.
    pub fn effective_penalty(&self) -> f64 {
        if self.repetition_penalty.is_nan() {
            return 0.0;
        }
        self.repetition_penalty.clamp(0.0, MAX_REPETITION_PENALTY)
    }

    /// Preferred landing offsets for a window length, if configured.
    pub fn landing_order_for(&self, length_eighths: u32) -> Option<&[u32]> {
        self.landing_order.get(&length_eighths).map(Vec::as_slice)
    }
}

/// One formula in the flattened candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaCandidate {
    pub pattern: Vec<i8>,
    pub group: String,
}

/// Flatten a type's grouped catalog, in sorted group order.
pub fn candidates(store: &TheoryStore, formula_type: FormulaType) -> Vec<FormulaCandidate> {
    store
        .formulas(formula_type)
        .iter()
        .flat_map(|(group, patterns)| {
            patterns.iter().map(move |pattern| FormulaCandidate {
                pattern: pattern.clone(),
                group: group.clone(),
            })
        })
        .collect()
}

/// Weights for `candidates` before the draw.
pub fn candidate_weights(
    candidates: &[FormulaCandidate],
    formula_type: FormulaType,
    policy: Option<&FormulaPolicy>,
    last_type: Option<FormulaType>,
) -> Vec<f64> {
    candidates
        .iter()
        .map(|candidate| {
            let mut weight = candidate.pattern.len().saturating_sub(1).max(1) as f64;
            if let Some(policy) = policy {
                weight *= policy.weighting(formula_type).factor(candidate);
                if last_type == Some(formula_type) {
                    weight *= 1.0 - policy.effective_penalty();
                }
            }
            if weight.is_nan() { 0.0 } else { weight.max(0.0) }
        })
        .collect()
}

/// Stateful formula chooser for one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct FormulaSelector {
    policy: Option<FormulaPolicy>,
    last_type: Option<FormulaType>,
}

impl FormulaSelector {
    pub fn new(policy: Option<FormulaPolicy>) -> Self {
        FormulaSelector {
            policy,
            last_type: None,
        }
    }

    pub fn policy(&self) -> Option<&FormulaPolicy> {
        self.policy.as_ref()
    }

    /// Type chosen on the previous call, if any.
    pub fn last_type(&self) -> Option<FormulaType> {
        self.last_type
    }

    /// Resolve which formula type `degree` takes over `profile`.
    pub fn formula_type_for(
        profile: &ChordProfile,
        degree: &str,
    ) -> Result<FormulaType, ScheduleError> {
        let missing = |reason: String| ScheduleError::MissingTargetData {
            chord: profile.symbol.clone(),
            degree: degree.to_string(),
            reason,
        };
        let spec = profile
            .target(degree)
            .ok_or_else(|| missing("degree is not a target of this chord".to_string()))?;
        FormulaType::from_code(spec.type_code)
            .ok_or_else(|| missing(format!("unsupported formula type {}", spec.type_code)))
    }

    /// Candidates of `formula_type` and the weights the next draw would use,
    /// given the remembered type.
    pub fn weighted_candidates(
        &self,
        store: &TheoryStore,
        formula_type: FormulaType,
    ) -> (Vec<FormulaCandidate>, Vec<f64>) {
        let candidates = candidates(store, formula_type);
        let weights =
            candidate_weights(&candidates, formula_type, self.policy.as_ref(), self.last_type);
        (candidates, weights)
    }

    /// Draw a formula for `degree` and remember its type for the next call.
    pub fn select(
        &mut self,
        store: &TheoryStore,
        profile: &ChordProfile,
        degree: &str,
        rng: &mut LineRng,
    ) -> Result<Vec<i8>, ScheduleError> {
        let formula_type = Self::formula_type_for(profile, degree)?;
        let (candidates, weights) = self.weighted_candidates(store, formula_type);
        if candidates.is_empty() {
            return Err(ScheduleError::EmptyCatalog(formula_type));
        }

        let index = match rng.choice_weighted(&weights) {
            Some(index) => index,
            None => {
                warn!(
                    "all {formula_type} weights are zero for {} {degree}, drawing uniformly",
                    profile.symbol
                );
                rng.range_usize(0, candidates.len())
            }
        };

        self.last_type = Some(formula_type);
        Ok(candidates[index].pattern.clone())
    }
}
