//! Full campaign sessions driven through the simulation.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use std::cell::RefCell;
use std::rc::Rc;

use campaign_script::{CampaignScript, EventDisposition, LifecycleState, ScriptContext};
use campaign_sim::{
    AttackOutcome, AttackTarget, CommandOutcome, SimError, Simulation, SimulationConfig,
};
use campaign_types::{
    BattleKind, BattleOutcome, EventKind, ObjectiveStatus, PlayerId, ScriptEvent, XElement,
};
use campaign_world::{Building, StartingIds, WorldError, create_starting_world};

// =============================================================================
// Helpers
// =============================================================================

fn pirate_frontier() -> XElement {
    XElement::new("campaign-script")
        .with("variant", "mission")
        .with("title", "Pirate Frontier")
        .with_child(
            XElement::new("objective")
                .with("id", "destroy-pirate-base")
                .with("title", "Destroy the pirate base"),
        )
        .with_child(XElement::new("lock").with("fleet", "Home Fleet"))
        .with_child(
            XElement::new("trigger")
                .with("id", "briefing")
                .with("on", "new-game")
                .with_child(XElement::new("play-video").with("video", "video/briefing")),
        )
        .with_child(
            XElement::new("trigger")
                .with("id", "briefing-over")
                .with("on", "video-complete")
                .with("video", "video/briefing")
                .with_child(XElement::new("unlock-fleet").with("fleet", "Home Fleet"))
                .with_child(
                    XElement::new("receive-message")
                        .with("id", "orders")
                        .with("payload", "video/orders"),
                ),
        )
        .with_child(
            XElement::new("trigger")
                .with("id", "base-taken")
                .with("on", "conquered")
                .with("planet", "Pirate Base")
                .with_child(XElement::new("complete").with("objective", "destroy-pirate-base")),
        )
        .with_child(
            XElement::new("reward")
                .with("kind", "space")
                .with("loser-owner", "Pirates")
                .with("background", "bg/loot")
                .with("text", "The raiders' hold was full of stolen cargo."),
        )
}

fn config() -> SimulationConfig {
    SimulationConfig::parse(
        "world:\n  seed: 11\nbattle:\n  max_ticks: 60\nautosave:\n  interval_ticks: 2\n",
    )
    .unwrap()
}

fn session() -> (Simulation, StartingIds) {
    let (world, ids) = create_starting_world().unwrap();
    let mut sim = Simulation::new(world, config());
    sim.start(&pirate_frontier()).unwrap();
    (sim, ids)
}

// =============================================================================
// Policy gating
// =============================================================================

#[test]
fn locked_fleet_refuses_orders_until_briefing_ends() {
    let (mut sim, ids) = session();
    let before = sim.world().fleet(ids.home_fleet).map(|f| (f.x, f.y)).unwrap();

    assert_eq!(
        sim.move_fleet(ids.home_fleet, 50.0, 50.0).unwrap(),
        CommandOutcome::Locked
    );
    let after = sim.world().fleet(ids.home_fleet).map(|f| (f.x, f.y)).unwrap();
    assert_eq!(after, before);
    assert_eq!(sim.host().stats().delivered_of(EventKind::FleetAtPoint), 0);

    sim.video_complete("video/briefing");
    assert_eq!(
        sim.move_fleet(ids.home_fleet, 50.0, 50.0).unwrap(),
        CommandOutcome::Executed
    );
    assert_eq!(sim.host().stats().delivered_of(EventKind::FleetAtPoint), 1);
    assert_eq!(sim.host().receive_messages().len(), 1);
}

#[test]
fn locked_fleet_cannot_attack() {
    let (mut sim, ids) = session();
    assert!(!sim.host().may_control_fleet(sim.world(), ids.home_fleet));
    let position = sim.world().fleet(ids.home_fleet).map(|f| (f.x, f.y)).unwrap();

    for target in [
        AttackTarget::Fleet(ids.pirate_fleet),
        AttackTarget::Orbit(ids.pirate_base),
        AttackTarget::Invade(ids.pirate_base),
    ] {
        let outcome = sim.attack(ids.home_fleet, target).unwrap();
        assert_eq!(outcome, AttackOutcome::Locked);
        assert_eq!(outcome.command(), CommandOutcome::Locked);
    }

    // Nothing moved, nothing fought, nobody was told.
    let after = sim.world().fleet(ids.home_fleet).map(|f| (f.x, f.y)).unwrap();
    assert_eq!(after, position);
    assert!(sim.world().fleet(ids.pirate_fleet).is_some());
    assert_eq!(
        sim.world().planet(ids.pirate_base).unwrap().owner,
        Some(ids.pirates)
    );
    assert!(!sim.host().battle_phase().is_running());
    let stats = sim.host().stats();
    assert_eq!(stats.delivered_of(EventKind::FleetAtFleet), 0);
    assert_eq!(stats.delivered_of(EventKind::FleetAtPlanet), 0);
    assert_eq!(stats.delivered_of(EventKind::BattleComplete), 0);

    sim.video_complete("video/briefing");
    let outcome = sim
        .attack(ids.home_fleet, AttackTarget::Fleet(ids.pirate_fleet))
        .unwrap();
    assert_eq!(outcome.command(), CommandOutcome::Executed);
    assert_eq!(
        outcome.report().map(|r| r.info.kind),
        Some(BattleKind::Space)
    );
    assert_eq!(sim.host().stats().delivered_of(EventKind::FleetAtFleet), 1);
}

#[test]
fn autosave_waits_for_the_cutscene() {
    let (mut sim, _) = session();
    assert!(!sim.tick().unwrap().autosaved);
    // Tick 2 is due, but the briefing video is still playing.
    assert!(!sim.tick().unwrap().autosaved);
    assert!(sim.last_autosave().is_none());

    sim.video_complete("video/briefing");
    sim.tick().unwrap();
    assert!(sim.tick().unwrap().autosaved);
    assert!(sim.last_autosave().is_some());
}

// =============================================================================
// Battles
// =============================================================================

#[test]
fn space_battle_brackets_and_rewards() {
    let (mut sim, ids) = session();
    sim.video_complete("video/briefing");

    let report = sim
        .attack(ids.home_fleet, AttackTarget::Fleet(ids.pirate_fleet))
        .unwrap()
        .report()
        .cloned()
        .unwrap();
    assert_eq!(report.info.kind, BattleKind::Space);
    assert!(report.info.steps > 0);

    // Whatever the rolls, the host is idle again and has a cached answer.
    assert!(!sim.host().battle_phase().is_running());
    assert_eq!(sim.host().battle_reward(report.info.id), report.reward);

    match report.info.outcome {
        BattleOutcome::AttackerWon => {
            assert!(sim.world().fleet(ids.pirate_fleet).is_none());
            assert_eq!(
                report.reward.map(|r| r.background),
                Some("bg/loot".to_owned())
            );
            assert_eq!(sim.host().stats().delivered_of(EventKind::Destroyed), 1);
            assert_eq!(sim.host().stats().delivered_of(EventKind::FleetLost), 1);
        }
        BattleOutcome::DefenderWon => {
            assert!(sim.world().fleet(ids.home_fleet).is_none());
            assert!(report.reward.is_none());
        }
        BattleOutcome::Aborted => {
            assert!(sim.world().fleet(ids.home_fleet).is_some());
            assert!(sim.world().fleet(ids.pirate_fleet).is_some());
        }
    }
    // Both participants are told.
    assert_eq!(sim.host().stats().delivered_of(EventKind::BattleComplete), 2);
    assert_eq!(sim.host().stats().malformed, 0);
}

#[test]
fn invading_the_pirate_base_completes_the_mission() {
    let (world, ids) = create_starting_world().unwrap();
    // Enough troops that the invasion cannot fail against a garrison of 15.
    let mut world = world;
    let hulls: Vec<u32> = world
        .fleet(ids.home_fleet)
        .unwrap()
        .ships
        .iter()
        .map(|s| s.hull)
        .collect();
    world.set_fleet_forces(ids.home_fleet, &hulls, 400).unwrap();

    let mut sim = Simulation::new(world, config());
    sim.start(&pirate_frontier()).unwrap();
    sim.video_complete("video/briefing");

    let outcome = sim
        .attack(ids.home_fleet, AttackTarget::Invade(ids.pirate_base))
        .unwrap();
    let report = outcome.report().cloned().unwrap();
    assert_eq!(report.info.kind, BattleKind::Ground);
    assert_eq!(report.info.outcome, BattleOutcome::AttackerWon);

    let base = sim.world().planet(ids.pirate_base).unwrap();
    assert_eq!(base.owner, Some(ids.empire));
    assert!(base.garrison > 0);
    assert_eq!(sim.world().fleet(ids.home_fleet).unwrap().troops, 0);

    let objectives = sim.host().current_objectives();
    assert_eq!(objectives.len(), 1);
    assert_eq!(objectives[0].status, ObjectiveStatus::Completed);

    // Taking it again is refused and reports nothing.
    let conquests = sim.host().stats().delivered_of(EventKind::Conquered);
    assert!(matches!(
        sim.conquer(ids.pirate_base, ids.empire),
        Err(SimError::World(WorldError::AlreadyOwner { .. }))
    ));
    assert_eq!(
        sim.host().stats().delivered_of(EventKind::Conquered),
        conquests
    );
}

#[test]
fn battles_without_a_campaign_still_resolve() {
    let (world, ids) = create_starting_world().unwrap();
    let mut sim = Simulation::new(world, config());
    let report = sim.run_space_battle(ids.home_fleet, ids.pirate_fleet).unwrap();
    assert!(report.reward.is_none());
    assert_eq!(sim.host().state(), LifecycleState::Uninitialized);
}

#[test]
fn orbital_assault_damages_defenses() {
    let (mut sim, ids) = session();
    sim.video_complete("video/briefing");
    let before: u32 = sim
        .world()
        .planet(ids.pirate_base)
        .unwrap()
        .buildings
        .iter()
        .map(|b| b.hitpoints)
        .sum();
    let report = sim
        .attack(ids.home_fleet, AttackTarget::Orbit(ids.pirate_base))
        .unwrap()
        .report()
        .cloned()
        .unwrap();
    let after: u32 = sim
        .world()
        .planet(ids.pirate_base)
        .unwrap()
        .buildings
        .iter()
        .map(|b| b.hitpoints)
        .sum();
    assert!(after < before);
    assert_eq!(report.info.planet, Some(ids.pirate_base));
}

#[test]
fn invalid_battles_are_refused() {
    let (mut sim, ids) = session();
    assert!(matches!(
        sim.run_ground_battle(ids.pirate_fleet, ids.achilles),
        Err(SimError::InvalidBattle { .. })
    ));
    assert!(matches!(
        sim.run_ground_battle(ids.home_fleet, ids.achilles),
        Err(SimError::InvalidBattle { .. })
    ));
    assert!(!sim.host().battle_phase().is_running());
}

// =============================================================================
// Ordering and persistence
// =============================================================================

#[test]
fn each_tick_dispatches_time_once() {
    let (mut sim, _) = session();
    assert_eq!(sim.host().stats().delivered_of(EventKind::Time), 0);
    let report = sim.tick().unwrap();
    assert_eq!(report.tick, 1);
    assert_eq!(report.deferred, 0);
    assert_eq!(sim.host().stats().delivered_of(EventKind::Time), 1);
    sim.tick().unwrap();
    assert_eq!(sim.tick_count(), 2);
    assert_eq!(sim.host().stats().delivered_of(EventKind::Time), 2);
}

#[test]
fn autosave_restores_into_a_fresh_session() {
    let (mut sim, _) = session();
    sim.video_complete("video/briefing");
    let snapshot = sim.autosave().unwrap();
    // Autosaves go to disk as JSON.
    let text = serde_json::to_string(&snapshot).unwrap();
    let snapshot: XElement = serde_json::from_str(&text).unwrap();

    let (world, _) = create_starting_world().unwrap();
    let mut resumed = Simulation::new(world, config());
    resumed.start(&pirate_frontier()).unwrap();
    let home = resumed
        .world()
        .fleets()
        .find(|f| f.name == "Home Fleet")
        .map(|f| f.id)
        .unwrap();
    // The fresh session is still in its briefing.
    assert!(!resumed.host().may_auto_save());
    assert_eq!(
        resumed.move_fleet(home, 1.0, 1.0).unwrap(),
        CommandOutcome::Locked
    );

    resumed.host_mut().load(&snapshot).unwrap();

    assert_eq!(
        resumed.host().receive_messages(),
        sim.host().receive_messages()
    );
    assert!(resumed.host().may_auto_save());
    assert_eq!(
        resumed.move_fleet(home, 1.0, 1.0).unwrap(),
        CommandOutcome::Executed
    );
}

// =============================================================================
// What handlers observe
// =============================================================================

/// World state a handler saw while its event was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Level(u32),
    Complete(bool),
    Researched(bool),
    Owner(Option<PlayerId>),
}

/// Records the state relevant to each event at dispatch time.
struct Observer {
    seen: Rc<RefCell<Vec<Seen>>>,
}

impl CampaignScript for Observer {
    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &ScriptEvent) -> EventDisposition {
        let world = ctx.world();
        let seen = match event {
            ScriptEvent::Upgrading {
                planet, building, ..
            } => world.building(*planet, *building).map(|b| Seen::Level(b.level)),
            ScriptEvent::BuildingComplete { planet, building } => world
                .building(*planet, *building)
                .map(|b| Seen::Complete(b.complete)),
            ScriptEvent::Researched { player, research } => world
                .player(*player)
                .map(|p| Seen::Researched(p.researched.contains(research))),
            ScriptEvent::Conquered { planet, .. } => {
                world.planet(*planet).map(|p| Seen::Owner(p.owner))
            }
            _ => return EventDisposition::Unhandled,
        };
        self.seen.borrow_mut().extend(seen);
        EventDisposition::Handled
    }
}

#[test]
fn handlers_see_the_state_their_event_promises() {
    let (mut world, ids) = create_starting_world().unwrap();
    let shipyard = world
        .place_building(ids.achilles, Building::new("Shipyard", 500))
        .unwrap();
    let mut sim = Simulation::new(world, config());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let campaign = XElement::new("campaign-script")
        .with("variant", "observer")
        .with("title", "Observer");
    sim.start_with(
        &campaign,
        Box::new(Observer {
            seen: Rc::clone(&seen),
        }),
    )
    .unwrap();

    // Upgrading goes out while the radar is still at its old level.
    sim.upgrade_building(ids.achilles, ids.radar, 1).unwrap();
    // The others go out once the change is in the world.
    sim.complete_building(ids.achilles, shipyard).unwrap();
    assert!(sim.complete_research(ids.empire, ids.spy_satellite).unwrap());
    sim.conquer(ids.pirate_base, ids.empire).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            Seen::Level(0),
            Seen::Complete(true),
            Seen::Researched(true),
            Seen::Owner(Some(ids.empire)),
        ]
    );
    assert_eq!(
        sim.world().building(ids.achilles, ids.radar).map(|b| b.level),
        Some(1)
    );

    // Finishing the same research again changes nothing and says nothing.
    assert!(!sim.complete_research(ids.empire, ids.spy_satellite).unwrap());
    assert_eq!(seen.borrow().len(), 4);
    assert_eq!(sim.host().stats().delivered_of(EventKind::Researched), 1);
}
