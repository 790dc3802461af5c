//! The single entry point for simulation events.
//!
//! [`ScriptHost::dispatch`] delivers one [`ScriptEvent`] to the script, or
//! refuses it with a diagnostic. An envelope is refused when the host is
//! outside its active window, when it comes from a world the host is not
//! bound to, or when it names entities the world does not have. Refusals
//! are never errors: the simulation keeps ticking.
//!
//! Timing is the caller's job. Before-mutation events must be dispatched
//! while the world still shows the old state, after-mutation events once
//! the change is committed; the envelope check below enforces the parts of
//! that contract the world can reveal (an `Upgrading` building must still be
//! below the new level, a lost planet must still be owned).

use std::collections::BTreeMap;

use campaign_types::{EventKind, FleetId, PlanetId, PlayerId, ResearchId, ScriptEvent};
use campaign_world::{World, WorldError};
use tracing::{debug, warn};

use crate::host::ScriptHost;
use crate::script::EventDisposition;

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The host is not active or is bound to another world.
    Rejected,
    /// The envelope names entities that do not exist or contradicts the
    /// world state.
    Malformed,
    /// The script reacted to the event.
    Handled,
    /// The script has no handler for the event.
    Unhandled,
}

/// Dispatch counters kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events delivered to the script.
    pub delivered: u64,
    /// Delivered events the script handled.
    pub handled: u64,
    /// Delivered events the script ignored.
    pub unhandled: u64,
    /// Events refused for lifecycle or world mismatch.
    pub rejected: u64,
    /// Events refused as malformed.
    pub malformed: u64,
    per_kind: BTreeMap<EventKind, u64>,
}

impl DispatchStats {
    /// How many events of this kind were delivered.
    pub fn delivered_of(&self, kind: EventKind) -> u64 {
        self.per_kind.get(&kind).copied().unwrap_or(0)
    }

    fn record(&mut self, kind: EventKind, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Rejected => &mut self.rejected,
            DispatchOutcome::Malformed => &mut self.malformed,
            DispatchOutcome::Handled => &mut self.handled,
            DispatchOutcome::Unhandled => &mut self.unhandled,
        };
        *counter = counter.saturating_add(1);
        if matches!(outcome, DispatchOutcome::Handled | DispatchOutcome::Unhandled) {
            self.delivered = self.delivered.saturating_add(1);
            let per_kind = self.per_kind.entry(kind).or_insert(0);
            *per_kind = per_kind.saturating_add(1);
        }
    }
}

impl ScriptHost {
    /// Deliver one event to the script.
    ///
    /// Store mutations made by the handler are visible as soon as this
    /// returns. Events the handler raises are queued for
    /// [`take_raised_events`](Self::take_raised_events).
    pub fn dispatch(&mut self, world: &World, event: &ScriptEvent) -> DispatchOutcome {
        let kind = event.kind();
        let outcome = self.deliver(world, event, kind);
        self.stats.record(kind, outcome);
        outcome
    }

    fn deliver(&mut self, world: &World, event: &ScriptEvent, kind: EventKind) -> DispatchOutcome {
        if !self.is_active() {
            warn!(
                event = %kind,
                state = %self.state,
                "event dispatched outside the active window; ignored"
            );
            return DispatchOutcome::Rejected;
        }
        if self.world != Some(world.id()) {
            warn!(event = %kind, world = %world.id(), "event from an unbound world; ignored");
            return DispatchOutcome::Rejected;
        }
        if let Err(reason) = validate_envelope(world, event) {
            warn!(event = %kind, %reason, "malformed event envelope; ignored");
            return DispatchOutcome::Malformed;
        }

        let Some(disposition) =
            self.with_script(world, |script, ctx| script.on_event(ctx, event))
        else {
            return DispatchOutcome::Rejected;
        };
        match disposition {
            EventDisposition::Handled => {
                debug!(event = %kind, "event handled");
                DispatchOutcome::Handled
            }
            EventDisposition::Unhandled => {
                if self.options.warn_unhandled {
                    warn!(event = %kind, "no script handler for event");
                } else {
                    debug!(event = %kind, "no script handler for event");
                }
                DispatchOutcome::Unhandled
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope validation
// ---------------------------------------------------------------------------

fn player(world: &World, id: PlayerId) -> Result<(), WorldError> {
    world
        .player(id)
        .map(|_| ())
        .ok_or(WorldError::PlayerNotFound(id))
}

fn fleet(world: &World, id: FleetId) -> Result<(), WorldError> {
    world
        .fleet(id)
        .map(|_| ())
        .ok_or(WorldError::FleetNotFound(id))
}

fn planet(world: &World, id: PlanetId) -> Result<(), WorldError> {
    world
        .planet(id)
        .map(|_| ())
        .ok_or(WorldError::PlanetNotFound(id))
}

fn research(world: &World, id: ResearchId) -> Result<(), WorldError> {
    world
        .research(id)
        .map(|_| ())
        .ok_or(WorldError::ResearchNotFound(id))
}

/// Check an envelope against the world it claims to describe.
///
/// Entities removed by the mutation an after-event reports (the item of an
/// `InventoryRemove`, the fleet of a `LostSight`) are not required to exist.
pub fn validate_envelope(world: &World, event: &ScriptEvent) -> Result<(), WorldError> {
    match event {
        ScriptEvent::Researched { player: p, research: r }
        | ScriptEvent::Produced { player: p, research: r } => {
            player(world, *p)?;
            research(world, *r)
        }
        ScriptEvent::Destroyed { winner, loser } => {
            fleet(world, *winner)?;
            fleet(world, *loser)
        }
        ScriptEvent::Colonized { planet: id } => {
            let owned = world.planet(*id).ok_or(WorldError::PlanetNotFound(*id))?;
            if owned.owner.is_none() {
                return Err(WorldError::PlanetUnowned(*id));
            }
            Ok(())
        }
        ScriptEvent::Conquered { planet: id, previous_owner } => {
            planet(world, *id)?;
            player(world, *previous_owner)
        }
        ScriptEvent::PlayerBeaten { player: p } | ScriptEvent::LostSight { player: p, .. } => {
            player(world, *p)
        }
        ScriptEvent::DiscoveredPlanet { player: p, planet: id } => {
            player(world, *p)?;
            planet(world, *id)
        }
        ScriptEvent::DiscoveredPlayer { player: first, other: second }
        | ScriptEvent::Stance { first, second } => {
            player(world, *first)?;
            player(world, *second)
        }
        ScriptEvent::DiscoveredFleet { player: p, fleet: f } => {
            player(world, *p)?;
            fleet(world, *f)
        }
        ScriptEvent::FleetAtPoint { fleet: f, x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return Err(WorldError::NonFinitePosition(*f));
            }
            fleet(world, *f)
        }
        ScriptEvent::FleetLost { fleet: f } => fleet(world, *f),
        ScriptEvent::FleetAtFleet { fleet: f, other } => {
            fleet(world, *f)?;
            fleet(world, *other)
        }
        ScriptEvent::FleetAtPlanet { fleet: f, planet: id } => {
            fleet(world, *f)?;
            planet(world, *id)
        }
        ScriptEvent::AllyAgainst {
            first,
            second,
            common_enemy,
        } => {
            player(world, *first)?;
            player(world, *second)?;
            player(world, *common_enemy)
        }
        ScriptEvent::BattleComplete { player: p, .. } => player(world, *p),
        ScriptEvent::BuildingComplete { planet: id, building }
        | ScriptEvent::RepairComplete { planet: id, building } => world
            .building(*id, *building)
            .map(|_| ())
            .ok_or(WorldError::BuildingNotFound {
                planet: *id,
                building: *building,
            }),
        ScriptEvent::Upgrading {
            planet: id,
            building,
            new_level,
        } => {
            let current = world
                .building(*id, *building)
                .ok_or(WorldError::BuildingNotFound {
                    planet: *id,
                    building: *building,
                })?;
            if current.level >= *new_level {
                return Err(WorldError::InvalidUpgrade {
                    building: *building,
                    current: current.level,
                    requested: *new_level,
                });
            }
            Ok(())
        }
        ScriptEvent::InventoryAdd { planet: id, item } => world
            .inventory_item(*id, *item)
            .map(|_| ())
            .ok_or(WorldError::InventoryItemNotFound {
                planet: *id,
                item: *item,
            }),
        ScriptEvent::InventoryRemove { planet: id, .. }
        | ScriptEvent::PlanetInfected { planet: id }
        | ScriptEvent::PlanetCured { planet: id } => planet(world, *id),
        ScriptEvent::PlanetLost { planet: id } => {
            let lost = world.planet(*id).ok_or(WorldError::PlanetNotFound(*id))?;
            if lost.owner.is_none() {
                return Err(WorldError::PlanetUnowned(*id));
            }
            Ok(())
        }
        ScriptEvent::Time
        | ScriptEvent::VideoComplete { .. }
        | ScriptEvent::SoundComplete { .. }
        | ScriptEvent::MessageSeen { .. }
        | ScriptEvent::NewGame
        | ScriptEvent::LevelChanged => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::{CampaignScript, ScriptContext};
    use campaign_types::{BuildingId, XElement};
    use campaign_world::create_starting_world;

    struct TimeOnly;

    impl CampaignScript for TimeOnly {
        fn on_event(
            &mut self,
            ctx: &mut ScriptContext<'_>,
            event: &ScriptEvent,
        ) -> EventDisposition {
            if matches!(event, ScriptEvent::Time) {
                ctx.raise(ScriptEvent::LevelChanged);
                EventDisposition::Handled
            } else {
                EventDisposition::Unhandled
            }
        }
    }

    fn active_host(world: &World) -> ScriptHost {
        let config = XElement::new("campaign-script")
            .with("variant", "time")
            .with("title", "Clock");
        let mut host = ScriptHost::new();
        host.init_with(world, &config, Box::new(TimeOnly)).unwrap();
        host
    }

    #[test]
    fn dispatch_before_init_and_after_done_is_rejected() {
        let (world, _) = create_starting_world().unwrap();
        let mut host = ScriptHost::new();
        assert_eq!(host.dispatch(&world, &ScriptEvent::Time), DispatchOutcome::Rejected);

        let mut host_active = active_host(&world);
        host_active.done();
        assert_eq!(
            host_active.dispatch(&world, &ScriptEvent::Time),
            DispatchOutcome::Rejected
        );
        assert_eq!(host.stats().delivered, 0);
    }

    #[test]
    fn other_world_is_rejected() {
        let (world, _) = create_starting_world().unwrap();
        let (other, _) = create_starting_world().unwrap();
        let mut host = active_host(&world);
        assert_eq!(host.dispatch(&other, &ScriptEvent::Time), DispatchOutcome::Rejected);
        assert_eq!(host.dispatch(&world, &ScriptEvent::Time), DispatchOutcome::Handled);
    }

    #[test]
    fn raised_events_wait_for_the_driver() {
        let (world, _) = create_starting_world().unwrap();
        let mut host = active_host(&world);
        host.dispatch(&world, &ScriptEvent::Time);
        assert_eq!(host.take_raised_events(), vec![ScriptEvent::LevelChanged]);
        assert!(host.take_raised_events().is_empty());
    }

    #[test]
    fn malformed_envelopes_never_reach_the_script() {
        let (world, ids) = create_starting_world().unwrap();
        let mut host = active_host(&world);
        let missing = ScriptEvent::BuildingComplete {
            planet: ids.achilles,
            building: BuildingId::new(),
        };
        assert_eq!(host.dispatch(&world, &missing), DispatchOutcome::Malformed);

        let stale_upgrade = ScriptEvent::Upgrading {
            planet: ids.achilles,
            building: ids.radar,
            new_level: 0,
        };
        assert_eq!(host.dispatch(&world, &stale_upgrade), DispatchOutcome::Malformed);

        let unowned_loss = ScriptEvent::PlanetLost { planet: ids.naxos };
        assert_eq!(host.dispatch(&world, &unowned_loss), DispatchOutcome::Malformed);

        for (x, y) in [(f64::NAN, 1.0), (2.0, f64::INFINITY)] {
            let off_map = ScriptEvent::FleetAtPoint {
                fleet: ids.home_fleet,
                x,
                y,
            };
            assert_eq!(host.dispatch(&world, &off_map), DispatchOutcome::Malformed);
        }
        assert_eq!(host.stats().malformed, 5);
        assert_eq!(host.stats().delivered, 0);
    }

    #[test]
    fn counters_track_handled_and_unhandled() {
        let (world, ids) = create_starting_world().unwrap();
        let mut host = active_host(&world);
        host.dispatch(&world, &ScriptEvent::Time);
        host.dispatch(&world, &ScriptEvent::Time);
        host.dispatch(
            &world,
            &ScriptEvent::PlayerBeaten {
                player: ids.pirates,
            },
        );
        let stats = host.stats();
        assert_eq!(stats.handled, 2);
        assert_eq!(stats.unhandled, 1);
        assert_eq!(stats.delivered_of(EventKind::Time), 2);
        assert_eq!(stats.delivered_of(EventKind::PlayerBeaten), 1);
    }

    #[test]
    fn upgrade_below_new_level_is_valid() {
        let (world, ids) = create_starting_world().unwrap();
        let event = ScriptEvent::Upgrading {
            planet: ids.achilles,
            building: ids.radar,
            new_level: 1,
        };
        assert!(validate_envelope(&world, &event).is_ok());
    }
}
