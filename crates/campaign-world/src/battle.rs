//! Battle contexts for the nested space and ground combat simulations.
//!
//! A [`Combat`] is built by a combat driver in two stages. During placement
//! the driver adds units; once [`Combat::finalize_placements`] has been
//! called the roster is frozen and the battle may start. From then on every
//! mutation goes through guarded methods that refuse to break the
//! invariants the driver relies on:
//!
//! - no units join after placements are finalized
//! - a destroyed unit (zero hitpoints) never comes back
//! - hitpoints never exceed the unit's maximum
//! - an outcome is set exactly once
//!
//! Scripts receive `&mut SpaceBattle` / `&mut GroundBattle` during the
//! step phase, so the guards are what keeps a misbehaving script from
//! corrupting a fight in progress.

use campaign_types::{
    BattleId, BattleInfo, BattleKind, BattleOutcome, FleetId, PlanetId, PlayerId, UnitId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BattleError;

/// Which side of the battle a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The side that initiated the battle.
    Attacker,
    /// The side being attacked.
    Defender,
}

impl Side {
    /// Return the opposing side.
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// A single combatant: a ship, a building, a tank or a troop squad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    /// Unit identifier, unique within the battle.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Side the unit fights for.
    pub side: Side,
    /// Display name (ship class, building kind).
    pub name: String,
    /// Remaining hitpoints; zero means destroyed.
    pub hitpoints: u32,
    /// Hitpoints at full strength.
    pub max_hitpoints: u32,
    /// Damage dealt per step.
    pub attack: u32,
}

impl CombatUnit {
    /// Whether the unit has been destroyed.
    pub const fn is_destroyed(&self) -> bool {
        self.hitpoints == 0
    }
}

/// Shared state of one battle, regardless of kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    id: BattleId,
    kind: BattleKind,
    attacker: PlayerId,
    defender: Option<PlayerId>,
    units: Vec<CombatUnit>,
    placements_finalized: bool,
    steps: u32,
    retreat_requested: Option<Side>,
    outcome: Option<BattleOutcome>,
}

impl Combat {
    /// Create an empty battle in the placement stage.
    pub fn new(kind: BattleKind, attacker: PlayerId, defender: Option<PlayerId>) -> Self {
        Self {
            id: BattleId::new(),
            kind,
            attacker,
            defender,
            units: Vec::new(),
            placements_finalized: false,
            steps: 0,
            retreat_requested: None,
            outcome: None,
        }
    }

    /// Battle identifier.
    pub const fn id(&self) -> BattleId {
        self.id
    }

    /// Space or ground.
    pub const fn kind(&self) -> BattleKind {
        self.kind
    }

    /// The attacking player.
    pub const fn attacker(&self) -> PlayerId {
        self.attacker
    }

    /// The defending player, if any.
    pub const fn defender(&self) -> Option<PlayerId> {
        self.defender
    }

    /// All units, destroyed ones included.
    pub fn units(&self) -> &[CombatUnit] {
        &self.units
    }

    /// Look up a unit.
    pub fn unit(&self, id: UnitId) -> Option<&CombatUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Units of one side that are still fighting.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &CombatUnit> {
        self.units
            .iter()
            .filter(move |u| u.side == side && !u.is_destroyed())
    }

    /// Whether a side has no units left.
    pub fn is_side_destroyed(&self, side: Side) -> bool {
        self.living(side).next().is_none()
    }

    /// Sum of remaining hitpoints on one side.
    pub fn strength(&self, side: Side) -> u32 {
        self.living(side)
            .fold(0_u32, |acc, u| acc.saturating_add(u.hitpoints))
    }

    /// Whether the roster is frozen.
    pub const fn is_finalized(&self) -> bool {
        self.placements_finalized
    }

    /// Number of completed steps.
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// The side that asked to retreat, if any.
    pub const fn retreat_requested(&self) -> Option<Side> {
        self.retreat_requested
    }

    /// The outcome once concluded.
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Whether the battle has an outcome.
    pub const fn is_concluded(&self) -> bool {
        self.outcome.is_some()
    }

    // -------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------

    /// Add a unit at full strength. Only allowed before finalization.
    pub fn add_unit(
        &mut self,
        owner: PlayerId,
        side: Side,
        name: &str,
        max_hitpoints: u32,
        attack: u32,
    ) -> Result<UnitId, BattleError> {
        if self.placements_finalized {
            return Err(BattleError::PlacementsFinalized);
        }
        let id = UnitId::new();
        self.units.push(CombatUnit {
            id,
            owner,
            side,
            name: name.to_owned(),
            hitpoints: max_hitpoints,
            max_hitpoints,
            attack,
        });
        Ok(id)
    }

    /// Freeze the roster. Idempotent.
    pub fn finalize_placements(&mut self) {
        if !self.placements_finalized {
            debug!(battle = %self.id, units = self.units.len(), "placements finalized");
        }
        self.placements_finalized = true;
    }

    /// Fail unless the roster is frozen.
    pub const fn require_finalized(&self) -> Result<(), BattleError> {
        if self.placements_finalized {
            Ok(())
        } else {
            Err(BattleError::PlacementsOpen)
        }
    }

    // -------------------------------------------------------------------
    // Guarded mutation
    // -------------------------------------------------------------------

    fn live_unit_mut(&mut self, id: UnitId) -> Result<&mut CombatUnit, BattleError> {
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(BattleError::UnitNotFound(id))?;
        if unit.is_destroyed() {
            return Err(BattleError::UnitDestroyed(id));
        }
        Ok(unit)
    }

    /// Deal damage to a living unit. Returns the remaining hitpoints.
    pub fn damage(&mut self, id: UnitId, amount: u32) -> Result<u32, BattleError> {
        let unit = self.live_unit_mut(id)?;
        unit.hitpoints = unit.hitpoints.saturating_sub(amount);
        Ok(unit.hitpoints)
    }

    /// Set the hitpoints of a living unit. Setting zero destroys it.
    pub fn set_hitpoints(&mut self, id: UnitId, hitpoints: u32) -> Result<(), BattleError> {
        let unit = self.live_unit_mut(id)?;
        if hitpoints > unit.max_hitpoints {
            return Err(BattleError::HitpointsExceedMaximum {
                unit: id,
                requested: hitpoints,
                maximum: unit.max_hitpoints,
            });
        }
        unit.hitpoints = hitpoints;
        Ok(())
    }

    /// Ask for one side to withdraw at the end of the current step.
    pub fn request_retreat(&mut self, side: Side) -> Result<(), BattleError> {
        if self.outcome.is_some() {
            return Err(BattleError::AlreadyConcluded);
        }
        self.retreat_requested = Some(side);
        Ok(())
    }

    /// Count one completed step.
    pub fn advance_step(&mut self) -> Result<u32, BattleError> {
        if self.outcome.is_some() {
            return Err(BattleError::AlreadyConcluded);
        }
        self.steps = self.steps.saturating_add(1);
        Ok(self.steps)
    }

    /// Record the outcome. Allowed once.
    pub fn conclude(&mut self, outcome: BattleOutcome) -> Result<(), BattleError> {
        if self.outcome.is_some() {
            return Err(BattleError::AlreadyConcluded);
        }
        debug!(
            battle = %self.id,
            outcome = outcome.as_str(),
            steps = self.steps,
            "battle concluded"
        );
        self.outcome = Some(outcome);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Battle contexts
// ---------------------------------------------------------------------------

/// Common read surface of space and ground battles.
pub trait Battle {
    /// The shared combat state.
    fn combat(&self) -> &Combat;

    /// Guarded mutable access to the combat state.
    fn combat_mut(&mut self) -> &mut Combat;

    /// Fleet that started the battle.
    fn attacker_fleet(&self) -> FleetId;

    /// Defending fleet, if the battle is fleet against fleet.
    fn defender_fleet(&self) -> Option<FleetId>;

    /// Contested planet, if any.
    fn planet(&self) -> Option<PlanetId>;

    /// Battle identifier.
    fn id(&self) -> BattleId {
        self.combat().id()
    }

    /// Space or ground.
    fn kind(&self) -> BattleKind {
        self.combat().kind()
    }

    /// Summary of a concluded battle.
    fn info(&self) -> Result<BattleInfo, BattleError> {
        let combat = self.combat();
        let outcome = combat.outcome().ok_or(BattleError::NotConcluded)?;
        Ok(BattleInfo {
            id: combat.id(),
            kind: combat.kind(),
            attacker: combat.attacker(),
            attacker_fleet: self.attacker_fleet(),
            defender: combat.defender(),
            defender_fleet: self.defender_fleet(),
            planet: self.planet(),
            outcome,
            steps: combat.steps(),
        })
    }
}

/// A fleet battle in space, either fleet against fleet or a fleet
/// assaulting a planet's defenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceBattle {
    combat: Combat,
    attacker_fleet: FleetId,
    defender_fleet: Option<FleetId>,
    planet: Option<PlanetId>,
}

impl SpaceBattle {
    /// Two fleets meeting in open space.
    pub fn fleet_vs_fleet(
        attacker: PlayerId,
        attacker_fleet: FleetId,
        defender: PlayerId,
        defender_fleet: FleetId,
    ) -> Self {
        Self {
            combat: Combat::new(BattleKind::Space, attacker, Some(defender)),
            attacker_fleet,
            defender_fleet: Some(defender_fleet),
            planet: None,
        }
    }

    /// A fleet attacking a planet's orbital defenses.
    pub fn planet_assault(
        attacker: PlayerId,
        attacker_fleet: FleetId,
        planet: PlanetId,
        defender: Option<PlayerId>,
    ) -> Self {
        Self {
            combat: Combat::new(BattleKind::Space, attacker, defender),
            attacker_fleet,
            defender_fleet: None,
            planet: Some(planet),
        }
    }
}

impl Battle for SpaceBattle {
    fn combat(&self) -> &Combat {
        &self.combat
    }

    fn combat_mut(&mut self) -> &mut Combat {
        &mut self.combat
    }

    fn attacker_fleet(&self) -> FleetId {
        self.attacker_fleet
    }

    fn defender_fleet(&self) -> Option<FleetId> {
        self.defender_fleet
    }

    fn planet(&self) -> Option<PlanetId> {
        self.planet
    }
}

/// A planetary invasion: troops landed by a fleet against the garrison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundBattle {
    combat: Combat,
    attacker_fleet: FleetId,
    planet: PlanetId,
}

impl GroundBattle {
    /// Create an invasion of `planet` by troops from `attacker_fleet`.
    pub fn new(
        attacker: PlayerId,
        attacker_fleet: FleetId,
        planet: PlanetId,
        defender: Option<PlayerId>,
    ) -> Self {
        Self {
            combat: Combat::new(BattleKind::Ground, attacker, defender),
            attacker_fleet,
            planet,
        }
    }

    /// The invaded planet.
    pub const fn target(&self) -> PlanetId {
        self.planet
    }
}

impl Battle for GroundBattle {
    fn combat(&self) -> &Combat {
        &self.combat
    }

    fn combat_mut(&mut self) -> &mut Combat {
        &mut self.combat
    }

    fn attacker_fleet(&self) -> FleetId {
        self.attacker_fleet
    }

    fn defender_fleet(&self) -> Option<FleetId> {
        None
    }

    fn planet(&self) -> Option<PlanetId> {
        Some(self.planet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn space_battle() -> (SpaceBattle, UnitId, UnitId) {
        let attacker = PlayerId::new();
        let defender = PlayerId::new();
        let mut battle =
            SpaceBattle::fleet_vs_fleet(attacker, FleetId::new(), defender, FleetId::new());
        let a = battle
            .combat_mut()
            .add_unit(attacker, Side::Attacker, "Cruiser", 100, 20)
            .unwrap();
        let d = battle
            .combat_mut()
            .add_unit(defender, Side::Defender, "Fighter", 40, 5)
            .unwrap();
        (battle, a, d)
    }

    #[test]
    fn no_units_after_finalize() {
        let (mut battle, _, _) = space_battle();
        assert_eq!(
            battle.combat().require_finalized(),
            Err(BattleError::PlacementsOpen)
        );
        battle.combat_mut().finalize_placements();
        assert!(battle.combat().require_finalized().is_ok());
        let owner = battle.combat().attacker();
        let late = battle
            .combat_mut()
            .add_unit(owner, Side::Attacker, "Late", 10, 1);
        assert_eq!(late, Err(BattleError::PlacementsFinalized));
    }

    #[test]
    fn destroyed_units_stay_destroyed() {
        let (mut battle, _, defender) = space_battle();
        battle.combat_mut().finalize_placements();
        assert_eq!(battle.combat_mut().damage(defender, 500).unwrap(), 0);
        assert!(battle.combat().is_side_destroyed(Side::Defender));
        assert_eq!(
            battle.combat_mut().set_hitpoints(defender, 40),
            Err(BattleError::UnitDestroyed(defender))
        );
    }

    #[test]
    fn hitpoints_capped_at_maximum() {
        let (mut battle, attacker, _) = space_battle();
        let result = battle.combat_mut().set_hitpoints(attacker, 101);
        assert!(matches!(
            result,
            Err(BattleError::HitpointsExceedMaximum { maximum: 100, .. })
        ));
        battle.combat_mut().set_hitpoints(attacker, 60).unwrap();
        assert_eq!(battle.combat().strength(Side::Attacker), 60);
    }

    #[test]
    fn info_requires_conclusion() {
        let (mut battle, _, _) = space_battle();
        assert_eq!(battle.info(), Err(BattleError::NotConcluded));
        battle.combat_mut().advance_step().unwrap();
        battle
            .combat_mut()
            .conclude(BattleOutcome::AttackerWon)
            .unwrap();
        let info = battle.info().unwrap();
        assert_eq!(info.kind, BattleKind::Space);
        assert_eq!(info.steps, 1);
        assert_eq!(info.winner(), Some(battle.combat().attacker()));
        assert_eq!(
            battle.combat_mut().conclude(BattleOutcome::Aborted),
            Err(BattleError::AlreadyConcluded)
        );
        assert_eq!(
            battle.combat_mut().advance_step(),
            Err(BattleError::AlreadyConcluded)
        );
    }

    #[test]
    fn ground_battle_reports_planet() {
        let planet = PlanetId::new();
        let battle = GroundBattle::new(PlayerId::new(), FleetId::new(), planet, None);
        assert_eq!(battle.kind(), BattleKind::Ground);
        assert_eq!(battle.planet(), Some(planet));
        assert_eq!(battle.defender_fleet(), None);
    }
}
