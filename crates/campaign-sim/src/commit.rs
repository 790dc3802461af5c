//! Ordering of world mutations against their events.
//!
//! Every world change that scripts can observe goes through one of the two
//! helpers here. The event's [`EventTiming`] decides the order:
//!
//! - `BeforeMutation`: dispatch, then mutate. Handlers see the state that is
//!   about to change (a building still at its old level, a fleet still in
//!   the world, a planet still owned).
//! - `AfterMutation`: mutate, then dispatch. Handlers see the result.
//!
//! A mutation that fails is never followed by its event.

use campaign_script::{DispatchOutcome, ScriptHost};
use campaign_types::{EventTiming, ScriptEvent};
use campaign_world::{World, WorldError};
use tracing::trace;

use crate::error::SimError;

/// Apply `mutate` to the world and dispatch `event` in the order its timing
/// requires. Returns the mutation's result.
///
/// # Errors
///
/// Returns [`SimError::World`] if the mutation fails. For a before-mutation
/// event the script has already been notified at that point, so callers
/// check preconditions before committing those.
pub fn commit_with_event<T>(
    world: &mut World,
    host: &mut ScriptHost,
    event: &ScriptEvent,
    mutate: impl FnOnce(&mut World) -> Result<T, WorldError>,
) -> Result<T, SimError> {
    let kind = event.kind();
    match kind.timing() {
        EventTiming::BeforeMutation => {
            let outcome = host.dispatch(world, event);
            trace!(event = %kind, ?outcome, "dispatched before mutation");
            Ok(mutate(world)?)
        }
        EventTiming::AfterMutation => {
            let value = mutate(world)?;
            let outcome = host.dispatch(world, event);
            trace!(event = %kind, ?outcome, "dispatched after mutation");
            Ok(value)
        }
    }
}

/// Apply a mutation that reports whether anything changed, and dispatch
/// `event` only if it did. Used for idempotent changes such as discovery,
/// where repeating the mutation must not repeat the notification.
///
/// # Errors
///
/// [`SimError::TimingMismatch`] for before-mutation events, whose dispatch
/// cannot depend on the mutation's result; [`SimError::World`] if the
/// mutation fails.
pub fn commit_if_changed(
    world: &mut World,
    host: &mut ScriptHost,
    event: &ScriptEvent,
    mutate: impl FnOnce(&mut World) -> Result<bool, WorldError>,
) -> Result<bool, SimError> {
    let kind = event.kind();
    if kind.timing() == EventTiming::BeforeMutation {
        return Err(SimError::TimingMismatch { kind });
    }
    let changed = mutate(world)?;
    if changed {
        let outcome = host.dispatch(world, event);
        trace!(event = %kind, ?outcome, "dispatched after change");
    }
    Ok(changed)
}

/// Dispatch an event that accompanies no world mutation.
pub fn notify(world: &World, host: &mut ScriptHost, event: &ScriptEvent) -> DispatchOutcome {
    let outcome = host.dispatch(world, event);
    trace!(event = %event.kind(), ?outcome, "notification dispatched");
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_types::XElement;
    use campaign_world::{StartingIds, create_starting_world};

    fn setup() -> (World, StartingIds, ScriptHost) {
        let (world, ids) = create_starting_world().unwrap();
        let mut host = ScriptHost::new();
        let config = XElement::new("campaign-script")
            .with("variant", "skirmish")
            .with("title", "Commit");
        host.init(&world, &config).unwrap();
        (world, ids, host)
    }

    #[test]
    fn failed_mutation_suppresses_after_event() {
        let (mut world, ids, mut host) = setup();
        let event = ScriptEvent::Colonized { planet: ids.achilles };
        // Achilles is already owned, so colonizing it fails.
        let result = commit_with_event(&mut world, &mut host, &event, |w| {
            w.colonize(ids.achilles, ids.pirates, 10)
        });
        assert!(matches!(result, Err(SimError::World(WorldError::PlanetAlreadyOwned(_)))));
        assert_eq!(host.stats().delivered, 0);
    }

    #[test]
    fn before_event_sees_the_old_state() {
        let (mut world, ids, mut host) = setup();
        let event = ScriptEvent::FleetLost {
            fleet: ids.pirate_fleet,
        };
        commit_with_event(&mut world, &mut host, &event, |w| {
            w.remove_fleet(ids.pirate_fleet).map(|_| ())
        })
        .unwrap();
        // The fleet existed when the event was validated.
        assert_eq!(host.stats().delivered, 1);
        assert_eq!(host.stats().malformed, 0);
        assert!(world.fleet(ids.pirate_fleet).is_none());
    }

    #[test]
    fn unchanged_mutation_is_silent() {
        let (mut world, ids, mut host) = setup();
        let event = ScriptEvent::DiscoveredPlanet {
            player: ids.empire,
            planet: ids.naxos,
        };
        let first = commit_if_changed(&mut world, &mut host, &event, |w| {
            w.discover_planet(ids.empire, ids.naxos)
        })
        .unwrap();
        let second = commit_if_changed(&mut world, &mut host, &event, |w| {
            w.discover_planet(ids.empire, ids.naxos)
        })
        .unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(host.stats().delivered, 1);
    }

    #[test]
    fn conditional_commit_refuses_before_events() {
        let (mut world, ids, mut host) = setup();
        let event = ScriptEvent::PlanetLost { planet: ids.achilles };
        assert!(matches!(
            commit_if_changed(&mut world, &mut host, &event, |_| Ok(true)),
            Err(SimError::TimingMismatch { .. })
        ));
    }
}
