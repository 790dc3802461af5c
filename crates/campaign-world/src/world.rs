//! The world model: players, fleets, planets and research types.
//!
//! [`World`] stores every entity in ordered maps keyed by typed ID. Reads are
//! plain lookups returning `Option`; mutations return [`WorldError`] when the
//! target is missing or the change would be inconsistent. Mutations never
//! emit script events themselves; the simulation driver wraps them and owns
//! the before/after dispatch ordering.

use std::collections::BTreeMap;

use campaign_types::{
    BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId, WorldId,
};
use serde::{Deserialize, Serialize};

use crate::entities::{Building, Fleet, InventoryItem, Planet, Player, ResearchType};
use crate::error::WorldError;

/// The persistent game world a campaign script is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    id: WorldId,
    /// Human-readable world or campaign name.
    pub name: String,
    players: BTreeMap<PlayerId, Player>,
    fleets: BTreeMap<FleetId, Fleet>,
    planets: BTreeMap<PlanetId, Planet>,
    research: BTreeMap<ResearchId, ResearchType>,
}

impl World {
    /// Create an empty world.
    pub fn new(name: &str) -> Self {
        Self {
            id: WorldId::new(),
            name: name.to_owned(),
            players: BTreeMap::new(),
            fleets: BTreeMap::new(),
            planets: BTreeMap::new(),
            research: BTreeMap::new(),
        }
    }

    /// Return the world identifier.
    pub const fn id(&self) -> WorldId {
        self.id
    }

    // -------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------

    /// Add a player.
    pub fn add_player(&mut self, player: Player) -> Result<PlayerId, WorldError> {
        let id = player.id;
        if self.players.contains_key(&id) {
            return Err(WorldError::Duplicate(id.to_string()));
        }
        self.players.insert(id, player);
        Ok(id)
    }

    /// Add a fleet. The owner must exist.
    pub fn add_fleet(&mut self, fleet: Fleet) -> Result<FleetId, WorldError> {
        let id = fleet.id;
        if !self.players.contains_key(&fleet.owner) {
            return Err(WorldError::PlayerNotFound(fleet.owner));
        }
        if self.fleets.contains_key(&id) {
            return Err(WorldError::Duplicate(id.to_string()));
        }
        self.fleets.insert(id, fleet);
        Ok(id)
    }

    /// Add a planet. An owner, if set, must exist.
    pub fn add_planet(&mut self, planet: Planet) -> Result<PlanetId, WorldError> {
        let id = planet.id;
        if let Some(owner) = planet.owner {
            if !self.players.contains_key(&owner) {
                return Err(WorldError::PlayerNotFound(owner));
            }
        }
        if self.planets.contains_key(&id) {
            return Err(WorldError::Duplicate(id.to_string()));
        }
        self.planets.insert(id, planet);
        Ok(id)
    }

    /// Add a research type.
    pub fn add_research(&mut self, research: ResearchType) -> Result<ResearchId, WorldError> {
        let id = research.id;
        if self.research.contains_key(&id) {
            return Err(WorldError::Duplicate(id.to_string()));
        }
        self.research.insert(id, research);
        Ok(id)
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    /// Return a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Return a fleet.
    pub fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.get(&id)
    }

    /// Return a planet.
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(&id)
    }

    /// Return a research type.
    pub fn research(&self, id: ResearchId) -> Option<&ResearchType> {
        self.research.get(&id)
    }

    /// Return a building on a planet.
    pub fn building(&self, planet: PlanetId, building: BuildingId) -> Option<&Building> {
        self.planet(planet).and_then(|p| p.building(building))
    }

    /// Return an inventory item stationed at a planet.
    pub fn inventory_item(
        &self,
        planet: PlanetId,
        item: InventoryItemId,
    ) -> Option<&InventoryItem> {
        self.planet(planet).and_then(|p| p.inventory_item(item))
    }

    /// Iterate over all players.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Iterate over all fleets.
    pub fn fleets(&self) -> impl Iterator<Item = &Fleet> {
        self.fleets.values()
    }

    /// Iterate over all planets.
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// Iterate over the fleets owned by a player.
    pub fn fleets_of(&self, owner: PlayerId) -> impl Iterator<Item = &Fleet> {
        self.fleets.values().filter(move |f| f.owner == owner)
    }

    /// Iterate over the planets owned by a player.
    pub fn planets_of(&self, owner: PlayerId) -> impl Iterator<Item = &Planet> {
        self.planets
            .values()
            .filter(move |p| p.owner == Some(owner))
    }

    /// Return the first human player, if any.
    pub fn human_player(&self) -> Option<&Player> {
        self.players.values().find(|p| p.human)
    }

    // -------------------------------------------------------------------
    // Mutable access (crate-internal helpers)
    // -------------------------------------------------------------------

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, WorldError> {
        self.players
            .get_mut(&id)
            .ok_or(WorldError::PlayerNotFound(id))
    }

    fn fleet_mut(&mut self, id: FleetId) -> Result<&mut Fleet, WorldError> {
        self.fleets.get_mut(&id).ok_or(WorldError::FleetNotFound(id))
    }

    fn planet_mut(&mut self, id: PlanetId) -> Result<&mut Planet, WorldError> {
        self.planets
            .get_mut(&id)
            .ok_or(WorldError::PlanetNotFound(id))
    }

    fn building_mut(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
    ) -> Result<&mut Building, WorldError> {
        self.planet_mut(planet)?
            .building_mut(building)
            .ok_or(WorldError::BuildingNotFound { planet, building })
    }

    fn require_research(&self, id: ResearchId) -> Result<(), WorldError> {
        if self.research.contains_key(&id) {
            Ok(())
        } else {
            Err(WorldError::ResearchNotFound(id))
        }
    }

    fn require_player(&self, id: PlayerId) -> Result<(), WorldError> {
        if self.players.contains_key(&id) {
            Ok(())
        } else {
            Err(WorldError::PlayerNotFound(id))
        }
    }

    // -------------------------------------------------------------------
    // Players
    // -------------------------------------------------------------------

    /// Record a completed research. Returns `false` if the player already
    /// had it.
    pub fn mark_researched(
        &mut self,
        player: PlayerId,
        research: ResearchId,
    ) -> Result<bool, WorldError> {
        self.require_research(research)?;
        Ok(self.player_mut(player)?.researched.insert(research))
    }

    /// Mark a player as eliminated.
    pub fn mark_beaten(&mut self, player: PlayerId) -> Result<(), WorldError> {
        self.player_mut(player)?.beaten = true;
        Ok(())
    }

    /// Record that a player knows a planet.
    pub fn discover_planet(
        &mut self,
        player: PlayerId,
        planet: PlanetId,
    ) -> Result<bool, WorldError> {
        if !self.planets.contains_key(&planet) {
            return Err(WorldError::PlanetNotFound(planet));
        }
        Ok(self.player_mut(player)?.known_planets.insert(planet))
    }

    /// Record that a player has met another player.
    pub fn discover_player(
        &mut self,
        player: PlayerId,
        other: PlayerId,
    ) -> Result<bool, WorldError> {
        self.require_player(other)?;
        Ok(self.player_mut(player)?.known_players.insert(other))
    }

    /// Record that a foreign fleet came into sight.
    pub fn sight_fleet(&mut self, player: PlayerId, fleet: FleetId) -> Result<bool, WorldError> {
        if !self.fleets.contains_key(&fleet) {
            return Err(WorldError::FleetNotFound(fleet));
        }
        Ok(self.player_mut(player)?.visible_fleets.insert(fleet))
    }

    /// Record that a foreign fleet went out of sight.
    pub fn unsight_fleet(&mut self, player: PlayerId, fleet: FleetId) -> Result<bool, WorldError> {
        Ok(self.player_mut(player)?.visible_fleets.remove(&fleet))
    }

    /// Set the stance of `first` toward `second` (clamped to 0..=100).
    pub fn set_stance(
        &mut self,
        first: PlayerId,
        second: PlayerId,
        stance: i32,
    ) -> Result<(), WorldError> {
        self.require_player(second)?;
        self.player_mut(first)?
            .stances
            .insert(second, stance.clamp(0, 100));
        Ok(())
    }

    // -------------------------------------------------------------------
    // Fleets
    // -------------------------------------------------------------------

    /// Move a fleet to map coordinates.
    pub fn move_fleet(&mut self, fleet: FleetId, x: f64, y: f64) -> Result<(), WorldError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(WorldError::NonFinitePosition(fleet));
        }
        let f = self.fleet_mut(fleet)?;
        f.x = x;
        f.y = y;
        Ok(())
    }

    /// Remove a fleet from the world and from every player's sight.
    pub fn remove_fleet(&mut self, fleet: FleetId) -> Result<Fleet, WorldError> {
        let removed = self
            .fleets
            .remove(&fleet)
            .ok_or(WorldError::FleetNotFound(fleet))?;
        for player in self.players.values_mut() {
            player.visible_fleets.remove(&fleet);
        }
        Ok(removed)
    }

    /// Replace the ship list and troop count of a fleet after combat.
    pub fn set_fleet_forces(
        &mut self,
        fleet: FleetId,
        hulls: &[u32],
        troops: u32,
    ) -> Result<(), WorldError> {
        let f = self.fleet_mut(fleet)?;
        for (ship, hull) in f.ships.iter_mut().zip(hulls) {
            ship.hull = *hull;
        }
        f.ships.retain(|ship| ship.hull > 0);
        f.troops = troops;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Planets
    // -------------------------------------------------------------------

    /// Give an unowned planet to a player.
    pub fn colonize(
        &mut self,
        planet: PlanetId,
        owner: PlayerId,
        population: u32,
    ) -> Result<(), WorldError> {
        self.require_player(owner)?;
        let p = self.planet_mut(planet)?;
        if p.owner.is_some() {
            return Err(WorldError::PlanetAlreadyOwned(planet));
        }
        p.owner = Some(owner);
        p.population = population;
        Ok(())
    }

    /// Transfer an owned planet to a new owner. Returns the previous owner.
    pub fn conquer(
        &mut self,
        planet: PlanetId,
        conqueror: PlayerId,
    ) -> Result<PlayerId, WorldError> {
        self.require_player(conqueror)?;
        let p = self.planet_mut(planet)?;
        let previous = p.owner.ok_or(WorldError::PlanetUnowned(planet))?;
        if previous == conqueror {
            return Err(WorldError::AlreadyOwner { planet, player: conqueror });
        }
        p.owner = Some(conqueror);
        Ok(previous)
    }

    /// Make an owned planet ownerless (abandoned or depopulated).
    pub fn abandon(&mut self, planet: PlanetId) -> Result<PlayerId, WorldError> {
        let p = self.planet_mut(planet)?;
        let previous = p.owner.take().ok_or(WorldError::PlanetUnowned(planet))?;
        p.population = 0;
        p.buildings.clear();
        p.inventory.clear();
        Ok(previous)
    }

    /// Set the ground garrison of a planet.
    pub fn set_garrison(&mut self, planet: PlanetId, garrison: u32) -> Result<(), WorldError> {
        self.planet_mut(planet)?.garrison = garrison;
        Ok(())
    }

    /// Set or clear the infection flag. Returns the previous value.
    pub fn set_infected(&mut self, planet: PlanetId, infected: bool) -> Result<bool, WorldError> {
        let p = self.planet_mut(planet)?;
        let previous = p.infected;
        p.infected = infected;
        Ok(previous)
    }

    // -------------------------------------------------------------------
    // Buildings
    // -------------------------------------------------------------------

    /// Place a new building (under construction) on a planet.
    pub fn place_building(
        &mut self,
        planet: PlanetId,
        building: Building,
    ) -> Result<BuildingId, WorldError> {
        let id = building.id;
        self.planet_mut(planet)?.buildings.push(building);
        Ok(id)
    }

    /// Finish construction of a building.
    pub fn finish_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
    ) -> Result<(), WorldError> {
        let b = self.building_mut(planet, building)?;
        if b.complete {
            return Err(WorldError::BuildingAlreadyComplete(building));
        }
        b.complete = true;
        Ok(())
    }

    /// Apply damage to a building (saturating at zero).
    pub fn damage_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
        amount: u32,
    ) -> Result<(), WorldError> {
        let b = self.building_mut(planet, building)?;
        b.hitpoints = b.hitpoints.saturating_sub(amount);
        Ok(())
    }

    /// Restore a building to full hitpoints.
    pub fn repair_building(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
    ) -> Result<(), WorldError> {
        let b = self.building_mut(planet, building)?;
        b.hitpoints = b.max_hitpoints;
        Ok(())
    }

    /// Raise a completed building to a strictly higher level.
    pub fn set_building_level(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
        level: u32,
    ) -> Result<(), WorldError> {
        let b = self.building_mut(planet, building)?;
        if !b.complete {
            return Err(WorldError::BuildingIncomplete(building));
        }
        if level <= b.level {
            return Err(WorldError::InvalidUpgrade {
                building,
                current: b.level,
                requested: level,
            });
        }
        b.level = level;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------

    /// Station an item at a planet.
    pub fn add_inventory(
        &mut self,
        planet: PlanetId,
        item: InventoryItem,
    ) -> Result<InventoryItemId, WorldError> {
        self.require_research(item.research)?;
        self.require_player(item.owner)?;
        let id = item.id;
        self.planet_mut(planet)?.inventory.push(item);
        Ok(id)
    }

    /// Remove an item from a planet.
    pub fn remove_inventory(
        &mut self,
        planet: PlanetId,
        item: InventoryItemId,
    ) -> Result<InventoryItem, WorldError> {
        let p = self.planet_mut(planet)?;
        let position = p
            .inventory
            .iter()
            .position(|i| i.id == item)
            .ok_or(WorldError::InventoryItemNotFound { planet, item })?;
        Ok(p.inventory.remove(position))
    }
}
