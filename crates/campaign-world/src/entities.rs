//! Entity records of the persistent world model.
//!
//! These are the collaborators scripts read when reacting to an event. The
//! simulation owns them through [`World`](crate::World); scripts only ever
//! see shared references.

use std::collections::{BTreeMap, BTreeSet};

use campaign_types::{BuildingId, FleetId, InventoryItemId, PlanetId, PlayerId, ResearchId};
use serde::{Deserialize, Serialize};

/// Diplomatic stance value at or above which two players are allied.
pub const ALLIED_STANCE: i32 = 75;

/// A human or AI empire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether the player is controlled by the local user.
    pub human: bool,
    /// Whether the player has been eliminated.
    pub beaten: bool,
    /// Completed research.
    pub researched: BTreeSet<ResearchId>,
    /// Planets this player has discovered.
    pub known_planets: BTreeSet<PlanetId>,
    /// Other players this player has met.
    pub known_players: BTreeSet<PlayerId>,
    /// Foreign fleets currently in sight.
    pub visible_fleets: BTreeSet<FleetId>,
    /// Stance toward other players (0 = war, 100 = alliance).
    pub stances: BTreeMap<PlayerId, i32>,
}

impl Player {
    /// Create a player with no knowledge and no stances.
    pub fn new(name: &str, human: bool) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.to_owned(),
            human,
            beaten: false,
            researched: BTreeSet::new(),
            known_planets: BTreeSet::new(),
            known_players: BTreeSet::new(),
            visible_fleets: BTreeSet::new(),
            stances: BTreeMap::new(),
        }
    }

    /// Return the stance toward another player, if one was ever set.
    pub fn stance_toward(&self, other: PlayerId) -> Option<i32> {
        self.stances.get(&other).copied()
    }

    /// Whether this player is allied with the other.
    pub fn is_allied_with(&self, other: PlayerId) -> bool {
        self.stance_toward(other)
            .is_some_and(|stance| stance >= ALLIED_STANCE)
    }
}

/// A single ship inside a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Ship class name (e.g. "Fighter", "Cruiser").
    pub class: String,
    /// Hull strength.
    pub hull: u32,
    /// Damage dealt per combat step.
    pub attack: u32,
}

impl Ship {
    /// Create a ship.
    pub fn new(class: &str, hull: u32, attack: u32) -> Self {
        Self {
            class: class.to_owned(),
            hull,
            attack,
        }
    }
}

/// A group of ships moving together on the star map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    /// Fleet identifier.
    pub id: FleetId,
    /// Owning player.
    pub owner: PlayerId,
    /// Display name.
    pub name: String,
    /// Map X coordinate.
    pub x: f64,
    /// Map Y coordinate.
    pub y: f64,
    /// Ships in the fleet.
    pub ships: Vec<Ship>,
    /// Ground troops carried for planetary invasions.
    pub troops: u32,
}

impl Fleet {
    /// Create an empty fleet at the given position.
    pub fn new(owner: PlayerId, name: &str, x: f64, y: f64) -> Self {
        Self {
            id: FleetId::new(),
            owner,
            name: name.to_owned(),
            x,
            y,
            ships: Vec::new(),
            troops: 0,
        }
    }

    /// Builder helper adding a ship.
    #[must_use]
    pub fn with_ship(mut self, ship: Ship) -> Self {
        self.ships.push(ship);
        self
    }

    /// Builder helper setting the troop count.
    #[must_use]
    pub const fn with_troops(mut self, troops: u32) -> Self {
        self.troops = troops;
        self
    }
}

/// A structure on a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Building identifier.
    pub id: BuildingId,
    /// Building type name (e.g. "Colony Hub", "Radar").
    pub kind: String,
    /// Current upgrade level (0 = base).
    pub level: u32,
    /// Whether construction has finished.
    pub complete: bool,
    /// Current hitpoints.
    pub hitpoints: u32,
    /// Maximum hitpoints.
    pub max_hitpoints: u32,
}

impl Building {
    /// Create a building under construction.
    pub fn new(kind: &str, max_hitpoints: u32) -> Self {
        Self {
            id: BuildingId::new(),
            kind: kind.to_owned(),
            level: 0,
            complete: false,
            hitpoints: max_hitpoints,
            max_hitpoints,
        }
    }

    /// Whether the building is below full hitpoints.
    pub const fn is_damaged(&self) -> bool {
        self.hitpoints < self.max_hitpoints
    }
}

/// A research (technology) type, also used as the product type for
/// production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchType {
    /// Research identifier.
    pub id: ResearchId,
    /// Display name.
    pub name: String,
    /// Category (e.g. "spaceships", "buildings").
    pub category: String,
}

impl ResearchType {
    /// Create a research type.
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            id: ResearchId::new(),
            name: name.to_owned(),
            category: category.to_owned(),
        }
    }
}

/// An item (satellite, station, tank) stationed at a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item identifier.
    pub id: InventoryItemId,
    /// Owning player.
    pub owner: PlayerId,
    /// The item's type.
    pub research: ResearchId,
    /// Stack size.
    pub count: u32,
}

impl InventoryItem {
    /// Create an inventory item.
    pub fn new(owner: PlayerId, research: ResearchId, count: u32) -> Self {
        Self {
            id: InventoryItemId::new(),
            owner,
            research,
            count,
        }
    }
}

/// A star system body that can be colonized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Planet identifier.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owning player, `None` when uncolonized.
    pub owner: Option<PlayerId>,
    /// Population count.
    pub population: u32,
    /// Ground defenders for invasions.
    pub garrison: u32,
    /// Whether the planet is infected by a plague.
    pub infected: bool,
    /// Buildings on the surface.
    pub buildings: Vec<Building>,
    /// Items stationed at the planet.
    pub inventory: Vec<InventoryItem>,
}

impl Planet {
    /// Create an uncolonized planet.
    pub fn new(name: &str) -> Self {
        Self {
            id: PlanetId::new(),
            name: name.to_owned(),
            owner: None,
            population: 0,
            garrison: 0,
            infected: false,
            buildings: Vec::new(),
            inventory: Vec::new(),
        }
    }

    /// Builder helper setting the owner and population.
    #[must_use]
    pub const fn owned_by(mut self, owner: PlayerId, population: u32) -> Self {
        self.owner = Some(owner);
        self.population = population;
        self
    }

    /// Builder helper setting the garrison.
    #[must_use]
    pub const fn with_garrison(mut self, garrison: u32) -> Self {
        self.garrison = garrison;
        self
    }

    /// Return a building by id.
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Return a mutable building by id.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    /// Return a stationed inventory item by id.
    pub fn inventory_item(&self, id: InventoryItemId) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alliance_requires_high_stance() {
        let mut player = Player::new("Empire", true);
        let other = PlayerId::new();
        assert!(!player.is_allied_with(other));
        player.stances.insert(other, 50);
        assert!(!player.is_allied_with(other));
        player.stances.insert(other, ALLIED_STANCE);
        assert!(player.is_allied_with(other));
    }

    #[test]
    fn new_building_is_incomplete_and_healthy() {
        let building = Building::new("Radar", 400);
        assert!(!building.complete);
        assert_eq!(building.level, 0);
        assert!(!building.is_damaged());
    }

    #[test]
    fn planet_lookups_find_children() {
        let mut planet = Planet::new("Achilles");
        let building = Building::new("Colony Hub", 1000);
        let id = building.id;
        planet.buildings.push(building);
        assert!(planet.building(id).is_some());
        assert!(planet.building(BuildingId::new()).is_none());
    }
}
