//! Combat drivers.
//!
//! Each driver builds a battle context from the world, freezes the roster,
//! and brackets the fight with the host's start / step / finish calls:
//!
//! ```text
//! build -> finalize -> start -> (resolve, step)* -> finish -> reward -> apply
//! ```
//!
//! Resolution is intentionally simple: every living unit fires once per
//! step at a random living enemy, for a seeded roll of its attack rating.
//! A battle still undecided after `battle.max_ticks` steps is aborted.
//!
//! Results reach the world only after `finish`, and always through the
//! event-ordered world operations, so the script sees losses the same way
//! it sees any other world change.

use campaign_script::{ScriptError, ScriptHost};
use campaign_types::{
    BattleInfo, BattleOutcome, BattleReward, BuildingId, FleetId, PlanetId, ScriptEvent, UnitId,
};
use campaign_world::{Battle, Combat, GroundBattle, Side, SpaceBattle, World, WorldError};
use rand::Rng;
use tracing::{info, warn};

use crate::commit::notify;
use crate::config::BattleConfig;
use crate::error::SimError;
use crate::simulation::{CommandOutcome, Simulation};

/// Troops per ground combat unit.
const SQUAD_SIZE: u32 = 10;

/// Base attack of a planetary defense building, before level bonus.
const DEFENSE_BASE_ATTACK: u32 = 10;

/// Summary of a battle once its results are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    /// The battle summary dispatched with `BattleComplete`.
    pub info: BattleInfo,
    /// The campaign script's special reward, if it granted one.
    pub reward: Option<BattleReward>,
}

/// What a player orders a fleet to attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTarget {
    /// Engage another fleet in open space.
    Fleet(FleetId),
    /// Bombard a planet's orbital defenses.
    Orbit(PlanetId),
    /// Land troops on a planet.
    Invade(PlanetId),
}

/// Result of a player's attack order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The battle was fought.
    Fought(BattleReport),
    /// The campaign script withholds control of the attacking fleet; no
    /// battle started.
    Locked,
}

impl AttackOutcome {
    /// The gate's answer, without the report.
    pub const fn command(&self) -> CommandOutcome {
        match self {
            Self::Fought(_) => CommandOutcome::Executed,
            Self::Locked => CommandOutcome::Locked,
        }
    }

    /// The battle report, if a battle was fought.
    pub const fn report(&self) -> Option<&BattleReport> {
        match self {
            Self::Fought(report) => Some(report),
            Self::Locked => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Fire one volley per side, attackers first.
pub fn resolve_step(
    combat: &mut Combat,
    rng: &mut impl Rng,
    config: &BattleConfig,
) -> Result<(), SimError> {
    let (low, high) = if config.min_damage_percent <= config.max_damage_percent {
        (config.min_damage_percent, config.max_damage_percent)
    } else {
        (config.max_damage_percent, config.min_damage_percent)
    };

    for side in [Side::Attacker, Side::Defender] {
        let volley: Vec<u32> = combat.living(side).map(|u| u.attack).collect();
        for attack in volley {
            let targets: Vec<UnitId> = combat.living(side.opponent()).map(|u| u.id).collect();
            if targets.is_empty() {
                break;
            }
            let Some(target) = targets.get(rng.random_range(0..targets.len())).copied() else {
                continue;
            };
            let percent: u32 = rng.random_range(low..=high);
            let damage = attack
                .saturating_mul(percent)
                .checked_div(100)
                .unwrap_or(0)
                .max(1);
            combat.damage(target, damage)?;
        }
    }
    Ok(())
}

/// The outcome the current state implies, if any.
pub fn decide(combat: &Combat) -> Option<BattleOutcome> {
    if combat.is_side_destroyed(Side::Defender) {
        return Some(BattleOutcome::AttackerWon);
    }
    if combat.is_side_destroyed(Side::Attacker) {
        return Some(BattleOutcome::DefenderWon);
    }
    // The side that stays on the field wins.
    combat.retreat_requested().map(|side| match side {
        Side::Attacker => BattleOutcome::DefenderWon,
        Side::Defender => BattleOutcome::AttackerWon,
    })
}

/// Split a troop count into squads of at most [`SQUAD_SIZE`].
fn squads(troops: u32) -> Vec<u32> {
    let mut left = troops;
    let mut out = Vec::new();
    while left > 0 {
        let size = left.min(SQUAD_SIZE);
        out.push(size);
        left = left.saturating_sub(size);
    }
    out
}

fn remaining_hitpoints(combat: &Combat, units: &[UnitId]) -> Vec<u32> {
    units
        .iter()
        .map(|id| combat.unit(*id).map_or(0, |u| u.hitpoints))
        .collect()
}

// ---------------------------------------------------------------------------
// Phase plumbing
// ---------------------------------------------------------------------------

/// Maps a battle context onto the host's phase calls.
trait Phases: Battle {
    fn start(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError>;
    fn step(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError>;
    fn finish(host: &mut ScriptHost, world: &World, battle: &Self) -> Result<(), ScriptError>;
}

impl Phases for SpaceBattle {
    fn start(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError> {
        host.space_start(world, battle)
    }

    fn step(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError> {
        host.space_step(world, battle)
    }

    fn finish(host: &mut ScriptHost, world: &World, battle: &Self) -> Result<(), ScriptError> {
        host.space_finish(world, battle)
    }
}

impl Phases for GroundBattle {
    fn start(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError> {
        host.ground_start(world, battle)
    }

    fn step(host: &mut ScriptHost, world: &World, battle: &mut Self) -> Result<(), ScriptError> {
        host.ground_step(world, battle)
    }

    fn finish(host: &mut ScriptHost, world: &World, battle: &Self) -> Result<(), ScriptError> {
        host.ground_finish(world, battle)
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

impl Simulation {
    /// Fight `battle` to a conclusion with the script bracketing it.
    fn fight<B: Phases>(
        &mut self,
        battle: &mut B,
    ) -> Result<(BattleInfo, Option<BattleReward>), SimError> {
        battle.combat_mut().finalize_placements();
        let id = battle.id();

        // A host that is not running a campaign refuses the bridge; the
        // battle is still fought.
        let bridged = match B::start(&mut self.host, &self.world, battle) {
            Ok(()) => true,
            Err(e) => {
                warn!(battle = %id, error = %e, "battle runs without the campaign script");
                false
            }
        };

        while !battle.combat().is_concluded() {
            if battle.combat().steps() >= self.config.battle.max_ticks {
                battle.combat_mut().conclude(BattleOutcome::Aborted)?;
                break;
            }
            resolve_step(battle.combat_mut(), &mut self.rng, &self.config.battle)?;
            battle.combat_mut().advance_step()?;
            let stepped = if bridged {
                B::step(&mut self.host, &self.world, battle)
            } else {
                Ok(())
            };
            if let Err(e) = stepped {
                warn!(battle = %id, error = %e, "battle step refused by host");
            }
            // The script may have ended the battle itself during the step.
            if battle.combat().is_concluded() {
                continue;
            }
            if let Some(outcome) = decide(battle.combat()) {
                battle.combat_mut().conclude(outcome)?;
            }
        }

        let finished = if bridged {
            B::finish(&mut self.host, &self.world, battle)
        } else {
            Ok(())
        };
        if let Err(e) = finished {
            warn!(battle = %id, error = %e, "battle finish refused by host");
        }
        let info = battle.info()?;
        let reward = self.host.battle_reward(id);
        info!(
            battle = %id,
            kind = info.kind.as_str(),
            outcome = info.outcome.as_str(),
            steps = info.steps,
            rewarded = reward.is_some(),
            "battle resolved"
        );
        Ok((info, reward))
    }

    /// Tell every participant the battle is over.
    fn announce(&mut self, info: &BattleInfo) {
        let players = core::iter::once(info.attacker).chain(info.defender);
        for player in players {
            if self.world.player(player).is_some() {
                let event = ScriptEvent::BattleComplete {
                    player,
                    battle: info.clone(),
                };
                notify(&self.world, &mut self.host, &event);
            }
        }
    }

    /// A player orders `attacker` into battle.
    ///
    /// The script is asked first: a fleet it has locked does not fight, and
    /// the world is left untouched. Otherwise the fleet closes in on its
    /// target (`FleetAtFleet` or `FleetAtPlanet`) and the matching combat
    /// driver runs.
    ///
    /// # Errors
    ///
    /// As for the combat driver the target selects, and
    /// [`SimError::World`] if an entity does not exist.
    pub fn attack(
        &mut self,
        attacker: FleetId,
        target: AttackTarget,
    ) -> Result<AttackOutcome, SimError> {
        if !self.host.may_control_fleet(&self.world, attacker) {
            info!(fleet = %attacker, "attack order refused: fleet is under script control");
            return Ok(AttackOutcome::Locked);
        }
        let report = match target {
            AttackTarget::Fleet(defender) => {
                self.fleet_at_fleet(attacker, defender)?;
                self.run_space_battle(attacker, defender)?
            }
            AttackTarget::Orbit(planet) => {
                self.fleet_at_planet(attacker, planet)?;
                self.run_orbital_assault(attacker, planet)?
            }
            AttackTarget::Invade(planet) => {
                self.fleet_at_planet(attacker, planet)?;
                self.run_ground_battle(attacker, planet)?
            }
        };
        Ok(AttackOutcome::Fought(report))
    }

    /// Two fleets fight in open space. A fleet left without ships is
    /// destroyed; surviving ships keep their damage.
    ///
    /// No control check: this resolves battles the engine starts on its
    /// own, such as an AI fleet engaging. Player orders go through
    /// [`attack`](Self::attack).
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidBattle`] if the fleets share an owner or either
    /// has no ships; [`SimError::World`] if either fleet does not exist.
    pub fn run_space_battle(
        &mut self,
        attacker: FleetId,
        defender: FleetId,
    ) -> Result<BattleReport, SimError> {
        let a = self
            .world
            .fleet(attacker)
            .ok_or(WorldError::FleetNotFound(attacker))?;
        let d = self
            .world
            .fleet(defender)
            .ok_or(WorldError::FleetNotFound(defender))?;
        if a.owner == d.owner {
            return Err(SimError::InvalidBattle {
                reason: format!("fleets {attacker} and {defender} belong to the same player"),
            });
        }
        if a.ships.is_empty() || d.ships.is_empty() {
            return Err(SimError::InvalidBattle {
                reason: "both fleets need at least one ship".to_owned(),
            });
        }

        let mut battle = SpaceBattle::fleet_vs_fleet(a.owner, attacker, d.owner, defender);
        let mut attacker_units = Vec::with_capacity(a.ships.len());
        for ship in &a.ships {
            let unit = battle.combat_mut().add_unit(
                a.owner,
                Side::Attacker,
                &ship.class,
                ship.hull,
                ship.attack,
            )?;
            attacker_units.push(unit);
        }
        let mut defender_units = Vec::with_capacity(d.ships.len());
        for ship in &d.ships {
            let unit = battle.combat_mut().add_unit(
                d.owner,
                Side::Defender,
                &ship.class,
                ship.hull,
                ship.attack,
            )?;
            defender_units.push(unit);
        }
        let (attacker_troops, defender_troops) = (a.troops, d.troops);

        let (info, reward) = self.fight(&mut battle)?;

        let attacker_hulls = remaining_hitpoints(battle.combat(), &attacker_units);
        let defender_hulls = remaining_hitpoints(battle.combat(), &defender_units);
        self.settle_fleet(attacker, defender, &attacker_hulls, attacker_troops)?;
        self.settle_fleet(defender, attacker, &defender_hulls, defender_troops)?;

        self.announce(&info);
        Ok(BattleReport { info, reward })
    }

    /// A fleet attacks a planet's orbital defenses: every complete building
    /// with hitpoints left fights. Buildings keep the damage they take.
    /// Like [`run_space_battle`](Self::run_space_battle), ungated.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidBattle`] if the fleet has no ships or attacks its
    /// own planet; [`SimError::World`] if either entity does not exist.
    pub fn run_orbital_assault(
        &mut self,
        attacker: FleetId,
        planet: PlanetId,
    ) -> Result<BattleReport, SimError> {
        let a = self
            .world
            .fleet(attacker)
            .ok_or(WorldError::FleetNotFound(attacker))?;
        let p = self
            .world
            .planet(planet)
            .ok_or(WorldError::PlanetNotFound(planet))?;
        if p.owner == Some(a.owner) {
            return Err(SimError::InvalidBattle {
                reason: format!("fleet {attacker} cannot attack its own planet"),
            });
        }
        if a.ships.is_empty() {
            return Err(SimError::InvalidBattle {
                reason: "the attacking fleet has no ships".to_owned(),
            });
        }

        let defender = p.owner;
        let mut battle = SpaceBattle::planet_assault(a.owner, attacker, planet, defender);
        let mut attacker_units = Vec::with_capacity(a.ships.len());
        for ship in &a.ships {
            let unit = battle.combat_mut().add_unit(
                a.owner,
                Side::Attacker,
                &ship.class,
                ship.hull,
                ship.attack,
            )?;
            attacker_units.push(unit);
        }
        let mut defenses: Vec<(UnitId, BuildingId, u32)> = Vec::new();
        if let Some(owner) = defender {
            for building in p.buildings.iter().filter(|b| b.complete && b.hitpoints > 0) {
                let attack = DEFENSE_BASE_ATTACK.saturating_add(building.level.saturating_mul(5));
                let unit = battle.combat_mut().add_unit(
                    owner,
                    Side::Defender,
                    &building.kind,
                    building.hitpoints,
                    attack,
                )?;
                defenses.push((unit, building.id, building.hitpoints));
            }
        }
        let attacker_troops = a.troops;

        let (info, reward) = self.fight(&mut battle)?;

        let hulls = remaining_hitpoints(battle.combat(), &attacker_units);
        for (unit, building, before) in defenses {
            let after = battle.combat().unit(unit).map_or(0, |u| u.hitpoints);
            self.world
                .damage_building(planet, building, before.saturating_sub(after))?;
        }
        if hulls.iter().all(|hull| *hull == 0) {
            self.lose_fleet(attacker)?;
        } else {
            self.world.set_fleet_forces(attacker, &hulls, attacker_troops)?;
        }

        self.announce(&info);
        Ok(BattleReport { info, reward })
    }

    /// A fleet lands its troops on a planet. Winning invaders take the
    /// planet (conquering an owned one, settling an empty one) and garrison
    /// it with their survivors. Landed troops never return to the fleet
    /// unless the battle is aborted. Ungated, like the other drivers.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidBattle`] if the fleet carries no troops or
    /// invades its own planet; [`SimError::World`] if either entity does
    /// not exist.
    pub fn run_ground_battle(
        &mut self,
        attacker: FleetId,
        planet: PlanetId,
    ) -> Result<BattleReport, SimError> {
        let a = self
            .world
            .fleet(attacker)
            .ok_or(WorldError::FleetNotFound(attacker))?;
        let p = self
            .world
            .planet(planet)
            .ok_or(WorldError::PlanetNotFound(planet))?;
        if p.owner == Some(a.owner) {
            return Err(SimError::InvalidBattle {
                reason: format!("fleet {attacker} cannot invade its own planet"),
            });
        }
        if a.troops == 0 {
            return Err(SimError::InvalidBattle {
                reason: format!("fleet {attacker} carries no troops"),
            });
        }

        let invader = a.owner;
        let defender = p.owner;
        let hulls: Vec<u32> = a.ships.iter().map(|s| s.hull).collect();
        let mut battle = GroundBattle::new(invader, attacker, planet, defender);
        for squad in squads(a.troops) {
            battle
                .combat_mut()
                .add_unit(invader, Side::Attacker, "Assault squad", squad, squad)?;
        }
        if let Some(owner) = defender {
            for squad in squads(p.garrison) {
                battle
                    .combat_mut()
                    .add_unit(owner, Side::Defender, "Garrison squad", squad, squad)?;
            }
        }

        let (info, reward) = self.fight(&mut battle)?;

        let invaders_left = battle.combat().strength(Side::Attacker);
        let defenders_left = battle.combat().strength(Side::Defender);
        match info.outcome {
            BattleOutcome::AttackerWon => {
                self.world.set_fleet_forces(attacker, &hulls, 0)?;
                if defender.is_some() {
                    self.conquer(planet, invader)?;
                } else {
                    self.colonize(planet, invader, invaders_left)?;
                }
                self.world.set_garrison(planet, invaders_left)?;
            }
            BattleOutcome::DefenderWon => {
                self.world.set_fleet_forces(attacker, &hulls, 0)?;
                self.world.set_garrison(planet, defenders_left)?;
            }
            BattleOutcome::Aborted => {
                self.world.set_fleet_forces(attacker, &hulls, invaders_left)?;
                self.world.set_garrison(planet, defenders_left)?;
            }
        }

        self.announce(&info);
        Ok(BattleReport { info, reward })
    }

    /// Write a fleet's post-battle hulls back, or destroy it if none remain.
    fn settle_fleet(
        &mut self,
        fleet: FleetId,
        opponent: FleetId,
        hulls: &[u32],
        troops: u32,
    ) -> Result<(), SimError> {
        if hulls.iter().all(|hull| *hull == 0) {
            self.destroy_fleet(opponent, fleet)?;
        } else {
            self.world.set_fleet_forces(fleet, hulls, troops)?;
        }
        Ok(())
    }
}
