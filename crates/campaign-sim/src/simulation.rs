//! The simulation driver.
//!
//! [`Simulation`] owns the world, the script host and the clock, and is the
//! only code that mutates the world while a campaign runs. Each world
//! operation below commits its mutation around the matching event through
//! [`commit`](crate::commit), so the script always observes the world in
//! the state the event's timing promises.
//!
//! Events the script raises from its handlers are not dispatched
//! re-entrantly. They wait in the host until the next [`tick`](Simulation::tick).

use campaign_script::{CampaignScript, HostOptions, ScriptHost};
use campaign_types::{
    BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId, ScriptEvent, XElement,
};
use campaign_world::{ALLIED_STANCE, Fleet, InventoryItem, World, WorldError};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::clock::SimClock;
use crate::commit::{commit_if_changed, commit_with_event, notify};
use crate::config::SimulationConfig;
use crate::error::SimError;

/// Result of a gated player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command was carried out.
    Executed,
    /// The campaign script currently withholds control of the fleet.
    Locked,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The tick number after advancing.
    pub tick: u64,
    /// Script-raised events dispatched this tick.
    pub deferred: usize,
    /// Whether an autosave was written.
    pub autosaved: bool,
}

/// One running campaign session.
pub struct Simulation {
    pub(crate) world: World,
    pub(crate) host: ScriptHost,
    pub(crate) config: SimulationConfig,
    pub(crate) clock: SimClock,
    pub(crate) pending: Vec<ScriptEvent>,
    pub(crate) rng: SmallRng,
    pub(crate) last_autosave: Option<XElement>,
}

impl Simulation {
    /// Wrap a world. No campaign runs until [`start`](Self::start).
    pub fn new(world: World, config: SimulationConfig) -> Self {
        let host = ScriptHost::with_options(HostOptions {
            warn_unhandled: config.scripting.warn_unhandled,
        });
        let rng = SmallRng::seed_from_u64(config.world.seed);
        Self {
            world,
            host,
            config,
            clock: SimClock::new(),
            pending: Vec::new(),
            rng,
            last_autosave: None,
        }
    }

    /// Start the campaign described by `campaign` and announce a new game.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Script`] if the host rejects the configuration.
    pub fn start(&mut self, campaign: &XElement) -> Result<(), SimError> {
        self.host.init(&self.world, campaign)?;
        info!(world = %self.world.name, variant = ?self.host.variant(), "campaign started");
        self.new_game();
        Ok(())
    }

    /// Start a campaign run by a caller-supplied script.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Script`] if the host rejects the configuration
    /// or the script's own `init` fails.
    pub fn start_with(
        &mut self,
        campaign: &XElement,
        script: Box<dyn CampaignScript>,
    ) -> Result<(), SimError> {
        self.host.init_with(&self.world, campaign, script)?;
        info!(world = %self.world.name, "custom campaign started");
        self.new_game();
        Ok(())
    }

    /// End the campaign. The world stays; the script is released.
    pub fn finish(&mut self) {
        self.pending.clear();
        self.host.done();
    }

    /// The world.
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The script host.
    pub const fn host(&self) -> &ScriptHost {
        &self.host
    }

    /// The script host, for save/load and direct dispatch.
    pub const fn host_mut(&mut self) -> &mut ScriptHost {
        &mut self.host
    }

    /// The driver configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Completed ticks.
    pub const fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    /// The most recent autosave, if any was written.
    pub const fn last_autosave(&self) -> Option<&XElement> {
        self.last_autosave.as_ref()
    }

    // -------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------

    /// Advance one tick: deliver the events the script raised since the
    /// last tick, dispatch `Time`, then autosave if one is due.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Clock`] if the tick counter overflows.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        let tick = self.clock.advance()?;

        self.pending.extend(self.host.take_raised_events());
        let due = core::mem::take(&mut self.pending);
        let deferred = due.len();
        for event in &due {
            notify(&self.world, &mut self.host, event);
        }

        notify(&self.world, &mut self.host, &ScriptEvent::Time);

        let autosaved = self.config.autosave.enabled
            && self.clock.is_due(self.config.autosave.interval_ticks)
            && self.autosave().is_some();

        debug!(tick, deferred, autosaved, "tick complete");
        Ok(TickReport {
            tick,
            deferred,
            autosaved,
        })
    }

    /// Snapshot the script state unless the script vetoes it.
    ///
    /// Returns `None` when no campaign is running, autosave is disabled,
    /// the script refuses, or the snapshot fails.
    pub fn autosave(&mut self) -> Option<XElement> {
        if !self.config.autosave.enabled || !self.host.is_active() {
            return None;
        }
        if !self.host.may_auto_save() {
            debug!(tick = self.clock.tick(), "autosave vetoed by campaign script");
            return None;
        }
        match self.host.save() {
            Ok(snapshot) => {
                info!(tick = self.clock.tick(), "autosave written");
                self.last_autosave = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "autosave failed");
                None
            }
        }
    }

    // -------------------------------------------------------------------
    // Player commands
    // -------------------------------------------------------------------

    /// Move a fleet on the player's order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::World`] if the fleet does not exist.
    pub fn move_fleet(
        &mut self,
        fleet: FleetId,
        x: f64,
        y: f64,
    ) -> Result<CommandOutcome, SimError> {
        if !self.host.may_control_fleet(&self.world, fleet) {
            info!(fleet = %fleet, "move order refused: fleet is under script control");
            return Ok(CommandOutcome::Locked);
        }
        self.fleet_at_point(fleet, x, y)?;
        Ok(CommandOutcome::Executed)
    }

    // -------------------------------------------------------------------
    // Research and production
    // -------------------------------------------------------------------

    /// A player finishes researching a technology. Returns `false` if the
    /// player already had it.
    pub fn complete_research(
        &mut self,
        player: PlayerId,
        research: ResearchId,
    ) -> Result<bool, SimError> {
        let event = ScriptEvent::Researched { player, research };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.mark_researched(player, research)
        })
    }

    /// A planet's owner finishes producing `count` items of a research type.
    /// The items land in the planet's inventory.
    pub fn complete_production(
        &mut self,
        planet: PlanetId,
        research: ResearchId,
        count: u32,
    ) -> Result<InventoryItemId, SimError> {
        let owner = self
            .world
            .planet(planet)
            .ok_or(WorldError::PlanetNotFound(planet))?
            .owner
            .ok_or(WorldError::PlanetUnowned(planet))?;
        let item = InventoryItem::new(owner, research, count);
        let item_id = item.id;
        let event = ScriptEvent::Produced {
            player: owner,
            research,
        };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.research(research).ok_or(WorldError::ResearchNotFound(research))?;
            w.add_inventory(planet, item)
        })?;
        notify(
            &self.world,
            &mut self.host,
            &ScriptEvent::InventoryAdd {
                planet,
                item: item_id,
            },
        );
        Ok(item_id)
    }

    // -------------------------------------------------------------------
    // Planets
    // -------------------------------------------------------------------

    /// Settle an unowned planet.
    pub fn colonize(
        &mut self,
        planet: PlanetId,
        owner: PlayerId,
        population: u32,
    ) -> Result<(), SimError> {
        let event = ScriptEvent::Colonized { planet };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.colonize(planet, owner, population)
        })
    }

    /// Take an owned planet by force. Returns the previous owner. A player
    /// cannot conquer its own planet.
    pub fn conquer(&mut self, planet: PlanetId, conqueror: PlayerId) -> Result<PlayerId, SimError> {
        let previous = self.owner_of(planet)?;
        let event = ScriptEvent::Conquered {
            planet,
            previous_owner: previous,
        };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.conquer(planet, conqueror)
        })?;
        self.check_elimination(previous)?;
        Ok(previous)
    }

    /// An owner loses a planet, leaving it empty. Returns the previous owner.
    pub fn lose_planet(&mut self, planet: PlanetId) -> Result<PlayerId, SimError> {
        let previous = self.owner_of(planet)?;
        let event = ScriptEvent::PlanetLost { planet };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| w.abandon(planet))?;
        self.check_elimination(previous)?;
        Ok(previous)
    }

    /// Infect a planet. Returns `false` if it already was.
    pub fn infect(&mut self, planet: PlanetId) -> Result<bool, SimError> {
        let event = ScriptEvent::PlanetInfected { planet };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.set_infected(planet, true).map(|was| !was)
        })
    }

    /// Cure a planet. Returns `false` if it was not infected.
    pub fn cure(&mut self, planet: PlanetId) -> Result<bool, SimError> {
        let event = ScriptEvent::PlanetCured { planet };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.set_infected(planet, false)
        })
    }

    // -------------------------------------------------------------------
    // Buildings
    // -------------------------------------------------------------------

    /// Finish construction of a building.
    pub fn complete_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
    ) -> Result<(), SimError> {
        let event = ScriptEvent::BuildingComplete { planet, building };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.finish_building(planet, building)
        })
    }

    /// Restore a building to full hitpoints.
    pub fn repair_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
    ) -> Result<(), SimError> {
        let event = ScriptEvent::RepairComplete { planet, building };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.repair_building(planet, building)
        })
    }

    /// Raise a building to `new_level`. The script is told while the
    /// building is still at its old level.
    pub fn upgrade_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
        new_level: u32,
    ) -> Result<(), SimError> {
        let current = self
            .world
            .building(planet, building)
            .ok_or(WorldError::BuildingNotFound { planet, building })?;
        if !current.complete {
            return Err(WorldError::BuildingIncomplete(building).into());
        }
        if current.level >= new_level {
            return Err(WorldError::InvalidUpgrade {
                building,
                current: current.level,
                requested: new_level,
            }
            .into());
        }
        let event = ScriptEvent::Upgrading {
            planet,
            building,
            new_level,
        };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.set_building_level(planet, building, new_level)
        })
    }

    // -------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------

    /// Station an item at a planet.
    pub fn add_inventory(
        &mut self,
        planet: PlanetId,
        item: InventoryItem,
    ) -> Result<InventoryItemId, SimError> {
        let event = ScriptEvent::InventoryAdd {
            planet,
            item: item.id,
        };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.add_inventory(planet, item)
        })
    }

    /// Take an item away from a planet.
    pub fn remove_inventory(
        &mut self,
        planet: PlanetId,
        item: InventoryItemId,
    ) -> Result<InventoryItem, SimError> {
        let event = ScriptEvent::InventoryRemove { planet, item };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.remove_inventory(planet, item)
        })
    }

    // -------------------------------------------------------------------
    // Fleets
    // -------------------------------------------------------------------

    /// A fleet arrives at map coordinates.
    pub fn fleet_at_point(&mut self, fleet: FleetId, x: f64, y: f64) -> Result<(), SimError> {
        let event = ScriptEvent::FleetAtPoint { fleet, x, y };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.move_fleet(fleet, x, y)
        })
    }

    /// A fleet catches up with another fleet and takes its position.
    pub fn fleet_at_fleet(&mut self, fleet: FleetId, other: FleetId) -> Result<(), SimError> {
        let target = self
            .world
            .fleet(other)
            .ok_or(WorldError::FleetNotFound(other))?;
        let (x, y) = (target.x, target.y);
        let event = ScriptEvent::FleetAtFleet { fleet, other };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.move_fleet(fleet, x, y)
        })
    }

    /// A fleet enters orbit around a planet.
    pub fn fleet_at_planet(&mut self, fleet: FleetId, planet: PlanetId) -> Result<(), SimError> {
        let event = ScriptEvent::FleetAtPlanet { fleet, planet };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.fleet(fleet).ok_or(WorldError::FleetNotFound(fleet))?;
            w.planet(planet).ok_or(WorldError::PlanetNotFound(planet))?;
            Ok(())
        })
    }

    /// Remove a fleet from the world. The script is told while the fleet
    /// still exists.
    pub fn lose_fleet(&mut self, fleet: FleetId) -> Result<Fleet, SimError> {
        let owner = self
            .world
            .fleet(fleet)
            .ok_or(WorldError::FleetNotFound(fleet))?
            .owner;
        let event = ScriptEvent::FleetLost { fleet };
        let removed = commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.remove_fleet(fleet)
        })?;
        self.check_elimination(owner)?;
        Ok(removed)
    }

    /// `winner` wipes out `loser`: the loser is wrecked, `Destroyed` is
    /// dispatched with both fleets in the world, then the loser is lost.
    pub fn destroy_fleet(&mut self, winner: FleetId, loser: FleetId) -> Result<Fleet, SimError> {
        self.world
            .fleet(winner)
            .ok_or(WorldError::FleetNotFound(winner))?;
        let ships = self
            .world
            .fleet(loser)
            .ok_or(WorldError::FleetNotFound(loser))?
            .ships
            .len();
        let wrecked = vec![0; ships];
        let event = ScriptEvent::Destroyed { winner, loser };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.set_fleet_forces(loser, &wrecked, 0)
        })?;
        self.lose_fleet(loser)
    }

    // -------------------------------------------------------------------
    // Discovery
    // -------------------------------------------------------------------

    /// A player discovers a planet. Returns `false` if already known.
    pub fn discover_planet(
        &mut self,
        player: PlayerId,
        planet: PlanetId,
    ) -> Result<bool, SimError> {
        let event = ScriptEvent::DiscoveredPlanet { player, planet };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.discover_planet(player, planet)
        })
    }

    /// A player meets another player. Returns `false` if already met.
    pub fn discover_player(&mut self, player: PlayerId, other: PlayerId) -> Result<bool, SimError> {
        let event = ScriptEvent::DiscoveredPlayer { player, other };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.discover_player(player, other)
        })
    }

    /// A foreign fleet comes into a player's sight. Returns `false` if it
    /// already was visible.
    pub fn discover_fleet(&mut self, player: PlayerId, fleet: FleetId) -> Result<bool, SimError> {
        let event = ScriptEvent::DiscoveredFleet { player, fleet };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.sight_fleet(player, fleet)
        })
    }

    /// A fleet leaves a player's sight. Returns `false` if it was not
    /// visible.
    pub fn lose_sight(&mut self, player: PlayerId, fleet: FleetId) -> Result<bool, SimError> {
        let event = ScriptEvent::LostSight { player, fleet };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            w.unsight_fleet(player, fleet)
        })
    }

    // -------------------------------------------------------------------
    // Diplomacy
    // -------------------------------------------------------------------

    /// Set `first`'s stance toward `second` (0 = war, 100 = alliance).
    pub fn change_stance(
        &mut self,
        first: PlayerId,
        second: PlayerId,
        stance: i32,
    ) -> Result<(), SimError> {
        let event = ScriptEvent::Stance { first, second };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.set_stance(first, second, stance)
        })
    }

    /// Two players ally against a common enemy.
    pub fn ally_against(
        &mut self,
        first: PlayerId,
        second: PlayerId,
        common_enemy: PlayerId,
    ) -> Result<(), SimError> {
        self.world
            .player(common_enemy)
            .ok_or(WorldError::PlayerNotFound(common_enemy))?;
        let event = ScriptEvent::AllyAgainst {
            first,
            second,
            common_enemy,
        };
        commit_with_event(&mut self.world, &mut self.host, &event, |w| {
            w.set_stance(first, second, ALLIED_STANCE)?;
            w.set_stance(second, first, ALLIED_STANCE)
        })
    }

    /// Eliminate a player. Returns `false` if already beaten.
    pub fn beat_player(&mut self, player: PlayerId) -> Result<bool, SimError> {
        let event = ScriptEvent::PlayerBeaten { player };
        commit_if_changed(&mut self.world, &mut self.host, &event, |w| {
            let was_beaten = w
                .player(player)
                .ok_or(WorldError::PlayerNotFound(player))?
                .beaten;
            w.mark_beaten(player)?;
            Ok(!was_beaten)
        })
    }

    /// Beat a player left with neither planets nor fleets.
    pub(crate) fn check_elimination(&mut self, player: PlayerId) -> Result<(), SimError> {
        let Some(record) = self.world.player(player) else {
            return Ok(());
        };
        let empty = self.world.planets_of(player).next().is_none()
            && self.world.fleets_of(player).next().is_none();
        if empty && !record.beaten {
            info!(player = %player, name = %record.name, "player eliminated");
            self.beat_player(player)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Media and session
    // -------------------------------------------------------------------

    /// A full-screen video finished.
    pub fn video_complete(&mut self, video: &str) {
        let event = ScriptEvent::VideoComplete {
            video: video.to_owned(),
        };
        notify(&self.world, &mut self.host, &event);
    }

    /// A sound finished.
    pub fn sound_complete(&mut self, audio: &str) {
        let event = ScriptEvent::SoundComplete {
            audio: audio.to_owned(),
        };
        notify(&self.world, &mut self.host, &event);
    }

    /// The user watched a message.
    pub fn message_seen(&mut self, id: &str) {
        let event = ScriptEvent::MessageSeen { id: id.to_owned() };
        notify(&self.world, &mut self.host, &event);
    }

    /// A new game started.
    pub fn new_game(&mut self) {
        notify(&self.world, &mut self.host, &ScriptEvent::NewGame);
    }

    /// The campaign jumped to another level.
    pub fn level_changed(&mut self) {
        notify(&self.world, &mut self.host, &ScriptEvent::LevelChanged);
    }

    fn owner_of(&self, planet: PlanetId) -> Result<PlayerId, SimError> {
        Ok(self
            .world
            .planet(planet)
            .ok_or(WorldError::PlanetNotFound(planet))?
            .owner
            .ok_or(WorldError::PlanetUnowned(planet))?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_types::{EventKind, ObjectiveStatus};
    use campaign_world::{StartingIds, create_starting_world};

    fn skirmish() -> XElement {
        XElement::new("campaign-script")
            .with("variant", "skirmish")
            .with("title", "Free play")
    }

    fn running() -> (Simulation, StartingIds) {
        let (world, ids) = create_starting_world().unwrap();
        let mut sim = Simulation::new(world, SimulationConfig::default());
        sim.start(&skirmish()).unwrap();
        (sim, ids)
    }

    #[test]
    fn start_announces_a_new_game() {
        let (sim, _) = running();
        assert_eq!(sim.host().stats().delivered_of(EventKind::NewGame), 1);
    }

    #[test]
    fn tick_dispatches_time_and_autosaves_on_schedule() {
        let (mut sim, _) = running();
        for _ in 0..9 {
            assert!(!sim.tick().unwrap().autosaved);
        }
        let report = sim.tick().unwrap();
        assert_eq!(report.tick, 10);
        assert!(report.autosaved);
        assert!(sim.last_autosave().is_some());
        assert_eq!(sim.host().stats().delivered_of(EventKind::Time), 10);
    }

    #[test]
    fn upgrade_rejected_up_front_never_dispatches() {
        let (mut sim, ids) = running();
        let before = sim.host().stats().delivered;
        assert!(sim.upgrade_building(ids.achilles, ids.colony_hub, 0).is_err());
        assert_eq!(sim.host().stats().delivered, before);

        sim.upgrade_building(ids.achilles, ids.colony_hub, 1).unwrap();
        assert_eq!(sim.host().stats().delivered_of(EventKind::Upgrading), 1);
        assert_eq!(
            sim.world().building(ids.achilles, ids.colony_hub).map(|b| b.level),
            Some(1)
        );
    }

    #[test]
    fn destroy_fleet_orders_destroyed_before_fleet_lost() {
        let (mut sim, ids) = running();
        sim.destroy_fleet(ids.home_fleet, ids.pirate_fleet).unwrap();
        let stats = sim.host().stats();
        assert_eq!(stats.delivered_of(EventKind::Destroyed), 1);
        assert_eq!(stats.delivered_of(EventKind::FleetLost), 1);
        assert_eq!(stats.malformed, 0);
        assert!(sim.world().fleet(ids.pirate_fleet).is_none());
    }

    #[test]
    fn losing_everything_beats_the_player() {
        let (mut sim, ids) = running();
        sim.destroy_fleet(ids.home_fleet, ids.pirate_fleet).unwrap();
        assert!(!sim.world().player(ids.pirates).unwrap().beaten);

        sim.conquer(ids.pirate_base, ids.empire).unwrap();
        assert!(sim.world().player(ids.pirates).unwrap().beaten);
        assert_eq!(
            sim.host().current_objectives().first().map(|o| o.status),
            Some(ObjectiveStatus::Completed)
        );
    }

    #[test]
    fn discovery_is_reported_once() {
        let (mut sim, ids) = running();
        assert!(sim.discover_planet(ids.empire, ids.naxos).unwrap());
        assert!(!sim.discover_planet(ids.empire, ids.naxos).unwrap());
        assert_eq!(sim.host().stats().delivered_of(EventKind::DiscoveredPlanet), 1);
    }

    #[test]
    fn infection_round_trip() {
        let (mut sim, ids) = running();
        assert!(sim.infect(ids.naxos).unwrap());
        assert!(!sim.infect(ids.naxos).unwrap());
        assert!(sim.cure(ids.naxos).unwrap());
        assert!(!sim.cure(ids.naxos).unwrap());
    }

    #[test]
    fn production_lands_in_inventory() {
        let (mut sim, ids) = running();
        let item = sim
            .complete_production(ids.achilles, ids.fighter, 3)
            .unwrap();
        assert_eq!(
            sim.world().inventory_item(ids.achilles, item).map(|i| i.count),
            Some(3)
        );
        assert_eq!(sim.host().stats().delivered_of(EventKind::Produced), 1);
        assert_eq!(sim.host().stats().delivered_of(EventKind::InventoryAdd), 1);
    }

    #[test]
    fn alliance_sets_both_stances() {
        let (mut world, ids) = create_starting_world().unwrap();
        let traders = world
            .add_player(campaign_world::Player::new("Traders", false))
            .unwrap();
        let mut sim = Simulation::new(world, SimulationConfig::default());
        sim.start(&skirmish()).unwrap();

        sim.ally_against(ids.empire, traders, ids.pirates).unwrap();
        assert!(sim.world().player(ids.empire).unwrap().is_allied_with(traders));
        assert!(sim.world().player(traders).unwrap().is_allied_with(ids.empire));
    }
}
