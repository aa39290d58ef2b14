use crate::tags::{Tag, TagQuery};

/// Arithmetic applied to the running damage amount.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmountOp {
    Multiply(f32),
    Add(f32),
}

impl AmountOp {
    pub fn apply(self, amount: f32) -> f32 {
        match self {
            AmountOp::Multiply(factor) => amount * factor,
            AmountOp::Add(delta) => amount + delta,
        }
    }

    pub fn operand(self) -> f32 {
        match self {
            AmountOp::Multiply(value) | AmountOp::Add(value) => value,
        }
    }
}

/// Which way an impulse pushes the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpulseDirection {
    /// Along the surface normal at the hit location.
    #[default]
    AlongNormal,
    /// Into the surface.
    AgainstNormal,
    /// Along the travel direction of the sweep.
    Travel,
}

/// What one effect step does.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectAction {
    /// Folded into the plan's final amount at match time.
    ModifyAmount(AmountOp),
    /// Activates a gameplay ability or effect on the target.
    ApplyEffect {
        effect: Tag,
        #[cfg_attr(feature = "serde", serde(default))]
        await_completion: bool,
    },
    ApplyImpulse {
        strength: f32,
        #[cfg_attr(feature = "serde", serde(default))]
        scale_with_amount: bool,
        #[cfg_attr(feature = "serde", serde(default))]
        direction: ImpulseDirection,
    },
    /// Asks the AI module to react (flinch, flee, aggro).
    RequestReaction { reaction: Tag },
}

/// One step of a behavior rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub action: EffectAction,
    /// Failure of a critical step cancels the rest of the plan.
    #[cfg_attr(feature = "serde", serde(default))]
    pub critical: bool,
    /// Checked against the target's live tags right before the step runs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub eligibility: TagQuery,
}

impl EffectSpec {
    pub fn new(action: EffectAction) -> Self {
        Self {
            action,
            critical: false,
            eligibility: TagQuery::default(),
        }
    }

    pub fn multiply(factor: f32) -> Self {
        Self::new(EffectAction::ModifyAmount(AmountOp::Multiply(factor)))
    }

    pub fn add(delta: f32) -> Self {
        Self::new(EffectAction::ModifyAmount(AmountOp::Add(delta)))
    }

    pub fn apply_effect(effect: Tag) -> Self {
        Self::new(EffectAction::ApplyEffect {
            effect,
            await_completion: false,
        })
    }

    pub fn impulse(strength: f32, direction: ImpulseDirection) -> Self {
        Self::new(EffectAction::ApplyImpulse {
            strength,
            scale_with_amount: false,
            direction,
        })
    }

    pub fn reaction(reaction: Tag) -> Self {
        Self::new(EffectAction::RequestReaction { reaction })
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Makes the step ineligible while the target carries `tag`.
    pub fn blocked_by(mut self, tag: Tag) -> Self {
        self.eligibility.forbid_any.insert(tag);
        self
    }

    /// Suspends the plan until an `ApplyEffect` activation finishes.
    pub fn awaiting(mut self) -> Self {
        if let EffectAction::ApplyEffect {
            await_completion, ..
        } = &mut self.action
        {
            *await_completion = true;
        }
        self
    }

    /// Scales an `ApplyImpulse` step by the plan's final amount.
    pub fn scaled(mut self) -> Self {
        if let EffectAction::ApplyImpulse {
            scale_with_amount, ..
        } = &mut self.action
        {
            *scale_with_amount = true;
        }
        self
    }

    pub fn amount_op(&self) -> Option<AmountOp> {
        match self.action {
            EffectAction::ModifyAmount(op) => Some(op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_ops_apply_in_order() {
        let ops = [AmountOp::Multiply(2.0), AmountOp::Add(3.0)];
        assert_eq!(ops.iter().fold(10.0, |acc, op| op.apply(acc)), 23.0);
        assert_eq!(ops.iter().rev().fold(10.0, |acc, op| op.apply(acc)), 26.0);
    }

    #[test]
    fn builders_only_touch_matching_actions() {
        let spec = EffectSpec::multiply(2.0).awaiting().scaled();
        assert_eq!(spec.action, EffectAction::ModifyAmount(AmountOp::Multiply(2.0)));

        let spec = EffectSpec::apply_effect(Tag::new("Ability.Stagger").unwrap()).awaiting();
        assert!(matches!(
            spec.action,
            EffectAction::ApplyEffect {
                await_completion: true,
                ..
            }
        ));
    }
}
