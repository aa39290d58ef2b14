use std::sync::Arc;

use super::RuleTable;
use crate::event::DamageEvent;
use crate::plan::ResolutionPlan;
use crate::tags::{TagSet, TagSnapshot};

/// Matches `event` against `table` using tags copied in `snapshot`.
///
/// Rules whose damage type filter and preconditions hold are walked in
/// evaluation order. Each contributes its amount modifiers in walk order;
/// a matched `stop_on_match` rule ends the walk. Pure and deterministic.
pub fn match_rules(event: DamageEvent, table: &RuleTable, snapshot: &TagSnapshot) -> ResolutionPlan {
    RuleMatcher::evaluate(event, table, &snapshot.target, &snapshot.instigator)
}

/// Stateless rule matcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn evaluate(
        event: DamageEvent,
        table: &RuleTable,
        target_tags: &TagSet,
        instigator_tags: &TagSet,
    ) -> ResolutionPlan {
        let mut matched = Vec::new();
        let mut amount = event.amount();

        for rule in table.evaluation_order() {
            if !rule.applies_to(&event, target_tags, instigator_tags) {
                continue;
            }
            amount = rule
                .effects
                .iter()
                .filter_map(|effect| effect.amount_op())
                .fold(amount, |acc, op| op.apply(acc));
            matched.push(Arc::clone(rule));
            if rule.stop_on_match {
                break;
            }
        }

        ResolutionPlan::new(event, matched, amount)
    }
}
