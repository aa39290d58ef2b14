use std::collections::HashSet;
use std::sync::Arc;

use super::{BehaviorRule, RuleId};
use crate::error::{DamageError, ErrorSeverity};

/// Reasons a set of rules cannot form a table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuleTableError {
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(RuleId),

    #[error("rule id is empty")]
    EmptyRuleId,

    #[error("rule '{rule}' effect {index} has a non-finite amount operand")]
    InvalidAmountOp { rule: RuleId, index: usize },
}

impl DamageError for RuleTableError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuleTableError::DuplicateRuleId(_) => "duplicate_rule_id",
            RuleTableError::EmptyRuleId => "empty_rule_id",
            RuleTableError::InvalidAmountOp { .. } => "invalid_amount_op",
        }
    }
}

/// Validated, immutable set of behavior rules.
///
/// Rules are stored in evaluation order: priority descending, ties broken by
/// id ascending.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: Vec<Arc<BehaviorRule>>,
    version: u64,
}

impl RuleTable {
    pub fn new(rules: Vec<BehaviorRule>) -> Result<Self, RuleTableError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if rule.id.as_str().is_empty() {
                return Err(RuleTableError::EmptyRuleId);
            }
            if !seen.insert(rule.id.clone()) {
                return Err(RuleTableError::DuplicateRuleId(rule.id.clone()));
            }
            for (index, effect) in rule.effects.iter().enumerate() {
                if effect.amount_op().is_some_and(|op| !op.operand().is_finite()) {
                    return Err(RuleTableError::InvalidAmountOp {
                        rule: rule.id.clone(),
                        index,
                    });
                }
            }
        }

        let mut rules: Vec<_> = rules.into_iter().map(Arc::new).collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(Self { rules, version: 0 })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn evaluation_order(&self) -> &[Arc<BehaviorRule>] {
        &self.rules
    }

    pub fn get(&self, id: &RuleId) -> Option<&Arc<BehaviorRule>> {
        self.rules.iter().find(|rule| &rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
