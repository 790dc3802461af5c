//! Default starting world for the pirate-base campaign.
//!
//! Two players (the human empire and the pirates), four planets, two
//! fleets and a handful of research types. The harness and the integration
//! tests start from this world so scripted scenarios have stable names to
//! refer to.

use crate::entities::{Building, Fleet, Planet, Player, ResearchType, Ship};
use crate::error::WorldError;
use crate::world::World;
use campaign_types::{BuildingId, FleetId, PlanetId, PlayerId, ResearchId};

/// Identifiers of the starting entities, returned alongside the world so
/// that callers can address specific players, planets and fleets.
#[derive(Debug, Clone, Copy)]
pub struct StartingIds {
    // --- Players ---
    /// The human empire.
    pub empire: PlayerId,
    /// The pirate faction.
    pub pirates: PlayerId,

    // --- Planets ---
    /// The empire's home planet.
    pub achilles: PlanetId,
    /// The pirates' base.
    pub pirate_base: PlanetId,
    /// Uncolonized planet near the home system.
    pub naxos: PlanetId,
    /// Uncolonized planet near the pirate base.
    pub centronom: PlanetId,

    // --- Buildings ---
    /// Colony hub on Achilles (complete).
    pub colony_hub: BuildingId,
    /// Radar on Achilles (complete, level 0).
    pub radar: BuildingId,

    // --- Fleets ---
    /// The empire's starting fleet.
    pub home_fleet: FleetId,
    /// The pirate raiders.
    pub pirate_fleet: FleetId,

    // --- Research ---
    /// Fighter hulls.
    pub fighter: ResearchId,
    /// Orbital spy satellite.
    pub spy_satellite: ResearchId,
    /// Radar upgrades.
    pub radar_research: ResearchId,
}

/// Create the starting world.
///
/// # Errors
///
/// Returns [`WorldError`] if the world construction fails (should not happen
/// with the hardcoded data).
pub fn create_starting_world() -> Result<(World, StartingIds), WorldError> {
    let mut world = World::new("Pirate Frontier");

    let empire = world.add_player(Player::new("Galactic Empire", true))?;
    let pirates = world.add_player(Player::new("Pirates", false))?;
    world.set_stance(empire, pirates, 0)?;
    world.set_stance(pirates, empire, 0)?;

    let fighter = world.add_research(ResearchType::new("Fighter", "spaceships"))?;
    let spy_satellite = world.add_research(ResearchType::new("Spy Satellite", "satellites"))?;
    let radar_research = world.add_research(ResearchType::new("Radar", "buildings"))?;

    let achilles = world.add_planet(
        Planet::new("Achilles")
            .owned_by(empire, 25_000)
            .with_garrison(40),
    )?;
    let pirate_base = world.add_planet(
        Planet::new("Pirate Base")
            .owned_by(pirates, 3_000)
            .with_garrison(15),
    )?;
    let naxos = world.add_planet(Planet::new("Naxos"))?;
    let centronom = world.add_planet(Planet::new("Centronom"))?;

    let colony_hub = world.place_building(achilles, Building::new("Colony Hub", 1_000))?;
    world.finish_building(achilles, colony_hub)?;
    let radar = world.place_building(achilles, Building::new("Radar", 300))?;
    world.finish_building(achilles, radar)?;

    let base_guns = world.place_building(pirate_base, Building::new("Fortress", 600))?;
    world.finish_building(pirate_base, base_guns)?;

    world.discover_planet(empire, achilles)?;
    world.discover_planet(pirates, pirate_base)?;
    world.mark_researched(empire, fighter)?;

    let home_fleet = world.add_fleet(
        Fleet::new(empire, "Home Fleet", 10.0, 10.0)
            .with_ship(Ship::new("Cruiser", 300, 30))
            .with_ship(Ship::new("Fighter", 60, 12))
            .with_ship(Ship::new("Fighter", 60, 12))
            .with_troops(30),
    )?;
    let pirate_fleet = world.add_fleet(
        Fleet::new(pirates, "Raiders", 80.0, 60.0)
            .with_ship(Ship::new("Corsair", 120, 15))
            .with_ship(Ship::new("Fighter", 50, 10)),
    )?;

    let ids = StartingIds {
        empire,
        pirates,
        achilles,
        pirate_base,
        naxos,
        centronom,
        colony_hub,
        radar,
        home_fleet,
        pirate_fleet,
        fighter,
        spy_satellite,
        radar_research,
    };

    Ok((world, ids))
}
