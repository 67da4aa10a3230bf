//! The ordered sequence plan mutated by the console frontend.
//!
//! The plan is plain data: an ordered list of step identifiers with
//! duplicates allowed. The frontend translates its gestures (append buttons,
//! drag reordering, preset loading) into the index-based operations here; the
//! plan has no notion of pixels or elements.

use indexmap::IndexMap;
use radtest_types::StepKind;

/// The ordered list of steps a user intends to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencePlan {
    steps: Vec<StepKind>,
}

impl SequencePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plan from an existing sequence.
    pub fn from_steps(steps: impl Into<Vec<StepKind>>) -> Self {
        Self { steps: steps.into() }
    }

    /// The sequence in execution order.
    pub fn steps(&self) -> &[StepKind] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Add a step to the end of the plan.
    pub fn append(&mut self, step: StepKind) {
        self.steps.push(step);
    }

    /// Remove the step at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) {
        if index < self.steps.len() {
            self.steps.remove(index);
        }
    }

    /// Move the step at `from` so it lands immediately after the element
    /// originally at `to` when moving down, immediately before it when moving
    /// up. All other relative orderings are preserved; `from == to` leaves the
    /// plan unchanged. Out-of-range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.steps.len() || to >= self.steps.len() {
            return;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
    }

    /// Discard the current plan and adopt `steps` verbatim. Used when loading
    /// a preset or an imported session.
    pub fn replace_all(&mut self, steps: Vec<StepKind>) {
        self.steps = steps;
    }

    /// Name of the first preset whose sequence is element-wise identical to
    /// the current plan. Map iteration order resolves ties, which `IndexMap`
    /// makes deterministic.
    pub fn match_preset<'a>(&self, presets: &'a IndexMap<String, Vec<StepKind>>) -> Option<&'a str> {
        presets
            .iter()
            .find(|(_, sequence)| sequence.as_slice() == self.steps.as_slice())
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radtest_types::StepKind::{Alive, Auth, Start, Stop};

    fn full_session() -> SequencePlan {
        SequencePlan::from_steps(vec![Auth, Start, Alive, Stop])
    }

    #[test]
    fn append_grows_the_tail() {
        let mut plan = SequencePlan::new();
        plan.append(Auth);
        plan.append(Start);
        assert_eq!(plan.steps(), &[Auth, Start]);
    }

    #[test]
    fn remove_out_of_range_is_a_noop() {
        let mut plan = full_session();
        plan.remove(10);
        assert_eq!(plan.len(), 4);
        plan.remove(1);
        assert_eq!(plan.steps(), &[Auth, Alive, Stop]);
    }

    #[test]
    fn reorder_down_lands_after_the_target() {
        let mut plan = full_session();
        plan.reorder(0, 2);
        assert_eq!(plan.steps(), &[Start, Alive, Auth, Stop]);
    }

    #[test]
    fn reorder_up_lands_before_the_target() {
        let mut plan = full_session();
        plan.reorder(3, 1);
        assert_eq!(plan.steps(), &[Auth, Stop, Start, Alive]);
    }

    #[test]
    fn reorder_to_own_position_is_idempotent() {
        let mut plan = full_session();
        for index in 0..plan.len() {
            plan.reorder(index, index);
        }
        assert_eq!(plan, full_session());
    }

    #[test]
    fn reorder_preserves_the_multiset() {
        let mut plan = SequencePlan::from_steps(vec![Auth, Alive, Alive, Stop]);
        plan.reorder(1, 3);
        let mut sorted = plan.steps().to_vec();
        sorted.sort_by_key(|step| step.as_str());
        assert_eq!(sorted, vec![Alive, Alive, Auth, Stop]);
    }

    #[test]
    fn reorder_out_of_range_is_a_noop() {
        let mut plan = full_session();
        plan.reorder(9, 0);
        plan.reorder(0, 9);
        assert_eq!(plan, full_session());
    }

    #[test]
    fn match_preset_round_trip() {
        let presets = IndexMap::from([
            ("auth-only".to_string(), vec![Auth]),
            ("full-session".to_string(), vec![Auth, Start, Alive, Stop]),
        ]);

        let mut plan = SequencePlan::new();
        plan.replace_all(presets["full-session"].clone());
        assert_eq!(plan.match_preset(&presets), Some("full-session"));

        plan.append(Alive);
        assert_eq!(plan.match_preset(&presets), None);

        let mut shorter = SequencePlan::new();
        shorter.replace_all(presets["full-session"].clone());
        shorter.remove(3);
        assert_eq!(shorter.match_preset(&presets), None);
    }

    #[test]
    fn match_preset_takes_the_first_exact_match() {
        let presets = IndexMap::from([
            ("alias".to_string(), vec![Auth]),
            ("auth-only".to_string(), vec![Auth]),
        ]);
        let plan = SequencePlan::from_steps(vec![Auth]);
        assert_eq!(plan.match_preset(&presets), Some("alias"));
    }
}
