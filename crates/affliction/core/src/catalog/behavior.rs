//! Autonomous-behavior overrides.

/// Forced change to an entity's autonomous action selection.
///
/// Variants are declared in ascending severity; the derived ordering is the
/// resolution priority, so when several active stages disagree the greatest
/// variant wins.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum BehaviorOverride {
    /// Player (or normal AI) keeps control.
    #[default]
    None,
    /// Wanders in random directions on the map.
    RandomMove,
    /// Walks toward the nearest enemy marker.
    MoveTowardEnemy,
    /// Attacks, possibly hitting allies.
    Confused,
    /// Attacks a random target every turn.
    AutoAttack,
    /// Acts on behalf of the enemy side.
    Charmed,
    /// Skips its turns entirely.
    CannotAct,
}

impl BehaviorOverride {
    /// Returns true when the player can issue commands to the entity.
    pub fn allows_control(self) -> bool {
        self == Self::None
    }

    /// Behaviors that take over map movement from the player.
    pub fn overrides_movement(self) -> bool {
        matches!(
            self,
            Self::RandomMove | Self::MoveTowardEnemy | Self::CannotAct
        )
    }

    /// Behaviors that replace the entity's battle command with a plain attack.
    pub fn forces_attack(self) -> bool {
        matches!(self, Self::AutoAttack | Self::Confused | Self::Charmed)
    }

    /// Behaviors under which attacks may be redirected at allies.
    pub fn may_target_allies(self) -> bool {
        matches!(self, Self::Confused | Self::Charmed)
    }

    /// Behaviors that prevent acting at all.
    pub fn prevents_action(self) -> bool {
        self == Self::CannotAct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn declaration_order_is_priority_order() {
        let ordered: Vec<_> = BehaviorOverride::iter().collect();
        let mut sorted = ordered.clone();
        sorted.sort();
        assert_eq!(ordered, sorted);
        assert_eq!(ordered.last(), Some(&BehaviorOverride::CannotAct));
    }

    #[test]
    fn parses_camel_case_names() {
        assert_eq!(
            "moveTowardEnemy".parse::<BehaviorOverride>(),
            Ok(BehaviorOverride::MoveTowardEnemy)
        );
        assert_eq!(
            "CANNOTACT".parse::<BehaviorOverride>(),
            Ok(BehaviorOverride::CannotAct)
        );
        assert_eq!(BehaviorOverride::AutoAttack.to_string(), "autoAttack");
    }
}
