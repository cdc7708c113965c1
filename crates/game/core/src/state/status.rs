//! Status conditions for combatants.
//!
//! A combatant carries at most one *major* condition (burn, paralysis,
//! poison, bad poison, sleep, freeze). Confusion is volatile and can stack
//! with a major condition.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::typing::TypeTag;

/// Kinds of status condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    Burn,
    Paralysis,
    Poison,
    BadPoison,
    Sleep,
    Freeze,
    Confusion,
}

impl StatusKind {
    pub const fn is_major(self) -> bool {
        !matches!(self, Self::Confusion)
    }

    /// Rounds the condition lasts; `None` means until cured.
    pub const fn default_duration(self) -> Option<u8> {
        match self {
            Self::Sleep => Some(3),
            Self::Freeze => Some(2),
            Self::Confusion => Some(4),
            _ => None,
        }
    }

    /// True when a combatant of type `tag` cannot receive this condition.
    pub fn is_immune(self, tag: TypeTag) -> bool {
        matches!(
            (self, tag),
            (Self::Burn, TypeTag::Fire)
                | (Self::Paralysis, TypeTag::Electric)
                | (Self::Poison | Self::BadPoison, TypeTag::Poison | TypeTag::Steel)
                | (Self::Freeze, TypeTag::Ice)
        )
    }

    /// True when the condition stops its bearer from dodging.
    pub const fn prevents_dodge(self) -> bool {
        matches!(self, Self::Sleep | Self::Freeze)
    }
}

/// A single status condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Rounds remaining; `None` lasts until cured.
    pub rounds_left: Option<u8>,
    /// Rounds elapsed, used by escalating conditions (bad poison).
    pub elapsed: u8,
}

/// Why a status condition was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusRejection {
    AlreadyAffected,
    HasMajorCondition,
    TypeImmune,
    Full,
}

/// Active status conditions on a combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<StatusEffect, { CombatConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusEffects {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn major(&self) -> Option<StatusKind> {
        self.effects
            .iter()
            .map(|e| e.kind)
            .find(|kind| kind.is_major())
    }

    /// Checks whether `kind` could be applied to a bearer with `types`.
    pub fn check(&self, kind: StatusKind, types: &[TypeTag]) -> Result<(), StatusRejection> {
        if self.has(kind) {
            return Err(StatusRejection::AlreadyAffected);
        }
        if kind.is_major() && self.major().is_some() {
            return Err(StatusRejection::HasMajorCondition);
        }
        if types.iter().any(|&tag| kind.is_immune(tag)) {
            return Err(StatusRejection::TypeImmune);
        }
        if self.effects.is_full() {
            return Err(StatusRejection::Full);
        }
        Ok(())
    }

    /// Applies `kind` with its default duration after running [`Self::check`].
    pub fn inflict(&mut self, kind: StatusKind, types: &[TypeTag]) -> Result<(), StatusRejection> {
        self.check(kind, types)?;
        self.effects.push(StatusEffect {
            kind,
            rounds_left: kind.default_duration(),
            elapsed: 0,
        });
        Ok(())
    }

    pub fn cure(&mut self, kind: StatusKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        before != self.effects.len()
    }

    pub fn prevents_dodge(&self) -> bool {
        self.effects.iter().any(|e| e.kind.prevents_dodge())
    }

    /// Advances every condition by one round and removes expired ones.
    ///
    /// Returns the conditions that expired.
    pub fn advance_round(&mut self) -> ArrayVec<StatusKind, { CombatConfig::MAX_STATUS_EFFECTS }> {
        let mut expired = ArrayVec::new();
        for effect in self.effects.iter_mut() {
            effect.elapsed = effect.elapsed.saturating_add(1);
            if let Some(rounds) = effect.rounds_left.as_mut() {
                *rounds = rounds.saturating_sub(1);
                if *rounds == 0 {
                    expired.push(effect.kind);
                }
            }
        }
        self.effects.retain(|e| e.rounds_left != Some(0));
        expired
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
