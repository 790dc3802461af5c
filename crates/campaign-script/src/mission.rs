//! Data-driven mission script.
//!
//! The mission is described entirely by the configuration document:
//!
//! ```text
//! <campaign-script variant="mission" title="Pirate Frontier">
//!   <objective id="destroy-pirate-base" title="Destroy the pirate base"/>
//!   <lock fleet="Home Fleet"/>
//!   <trigger id="raiders-down" on="destroyed" owner="Pirates">
//!     <complete objective="destroy-pirate-base"/>
//!     <receive-message id="victory" payload="video/victory"/>
//!     <unlock-fleet fleet="Home Fleet"/>
//!   </trigger>
//!   <reward kind="space" loser-owner="Pirates" background="bg/loot" text="..."/>
//! </campaign-script>
//! ```
//!
//! Entity references (`player`, `owner`, `planet`, `fleet`, `research`)
//! accept either an id or the entity's name and are resolved against the
//! world once, at init. A trigger fires at most once unless it says
//! `repeat="true"`.
//!
//! Playing a video starts a cutscene that lasts until the matching
//! `video-complete` event; autosave is vetoed meanwhile.

use core::str::FromStr;
use std::collections::BTreeSet;

use campaign_types::{
    BattleInfo, BattleKind, BattleReward, EventKind, FleetId, Objective, PlanetId, PlayerId,
    ResearchId, ScriptEvent, XElement,
};
use campaign_world::World;
use tracing::{debug, info};

use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::script::{CampaignScript, EventDisposition, ScriptContext};
use crate::stores::objective_from_node;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Conditions a trigger places on the event. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Filter {
    player: Option<PlayerId>,
    owner: Option<PlayerId>,
    planet: Option<PlanetId>,
    fleet: Option<FleetId>,
    research: Option<ResearchId>,
    video: Option<String>,
    message: Option<String>,
}

impl Filter {
    fn matches(&self, facts: &Facts<'_>) -> bool {
        fn check<T: PartialEq + ?Sized>(wanted: Option<&T>, actual: Option<&T>) -> bool {
            wanted.is_none_or(|w| actual == Some(w))
        }
        check(self.player.as_ref(), facts.player.as_ref())
            && check(self.owner.as_ref(), facts.owner.as_ref())
            && check(self.planet.as_ref(), facts.planet.as_ref())
            && check(self.fleet.as_ref(), facts.fleet.as_ref())
            && check(self.research.as_ref(), facts.research.as_ref())
            && check(self.video.as_deref(), facts.video)
            && check(self.message.as_deref(), facts.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Complete(String),
    Fail(String),
    Retire(String),
    AddObjective(Objective),
    SendMessage { id: String, payload: String },
    ReceiveMessage { id: String, payload: String },
    PlayVideo(String),
    LockFleet(FleetId),
    UnlockFleet(FleetId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Trigger {
    id: String,
    on: EventKind,
    filter: Filter,
    actions: Vec<Action>,
    repeat: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RewardRule {
    kind: BattleKind,
    winner: Option<PlayerId>,
    loser_owner: Option<PlayerId>,
    reward: BattleReward,
}

impl RewardRule {
    fn matches(&self, battle: &BattleInfo) -> bool {
        self.kind == battle.kind
            && self.winner.is_none_or(|w| battle.winner() == Some(w))
            && self.loser_owner.is_none_or(|l| battle.loser() == Some(l))
    }
}

// ---------------------------------------------------------------------------
// Event facts
// ---------------------------------------------------------------------------

/// What an event says about the filterable dimensions. `player` is the
/// acting player, `owner` the owner of the entity the event is about.
#[derive(Debug, Default)]
struct Facts<'e> {
    player: Option<PlayerId>,
    owner: Option<PlayerId>,
    planet: Option<PlanetId>,
    fleet: Option<FleetId>,
    research: Option<ResearchId>,
    video: Option<&'e str>,
    message: Option<&'e str>,
}

impl<'e> Facts<'e> {
    fn of(world: &World, event: &'e ScriptEvent) -> Self {
        let fleet_owner = |id: FleetId| world.fleet(id).map(|f| f.owner);
        let planet_owner = |id: PlanetId| world.planet(id).and_then(|p| p.owner);
        match event {
            ScriptEvent::Researched { player, research }
            | ScriptEvent::Produced { player, research } => Self {
                player: Some(*player),
                owner: Some(*player),
                research: Some(*research),
                ..Self::default()
            },
            ScriptEvent::Destroyed { winner, loser } => Self {
                player: fleet_owner(*winner),
                owner: fleet_owner(*loser),
                fleet: Some(*loser),
                ..Self::default()
            },
            ScriptEvent::Colonized { planet }
            | ScriptEvent::BuildingComplete { planet, .. }
            | ScriptEvent::RepairComplete { planet, .. }
            | ScriptEvent::Upgrading { planet, .. }
            | ScriptEvent::InventoryAdd { planet, .. }
            | ScriptEvent::InventoryRemove { planet, .. }
            | ScriptEvent::PlanetLost { planet }
            | ScriptEvent::PlanetInfected { planet }
            | ScriptEvent::PlanetCured { planet } => Self {
                player: planet_owner(*planet),
                owner: planet_owner(*planet),
                planet: Some(*planet),
                ..Self::default()
            },
            ScriptEvent::Conquered {
                planet,
                previous_owner,
            } => Self {
                player: planet_owner(*planet),
                owner: Some(*previous_owner),
                planet: Some(*planet),
                ..Self::default()
            },
            ScriptEvent::PlayerBeaten { player } => Self {
                player: Some(*player),
                owner: Some(*player),
                ..Self::default()
            },
            ScriptEvent::DiscoveredPlanet { player, planet } => Self {
                player: Some(*player),
                owner: planet_owner(*planet),
                planet: Some(*planet),
                ..Self::default()
            },
            ScriptEvent::DiscoveredPlayer { player, other } => Self {
                player: Some(*player),
                owner: Some(*other),
                ..Self::default()
            },
            ScriptEvent::DiscoveredFleet { player, fleet }
            | ScriptEvent::LostSight { player, fleet } => Self {
                player: Some(*player),
                owner: fleet_owner(*fleet),
                fleet: Some(*fleet),
                ..Self::default()
            },
            ScriptEvent::FleetAtPoint { fleet, .. } | ScriptEvent::FleetLost { fleet } => Self {
                player: fleet_owner(*fleet),
                owner: fleet_owner(*fleet),
                fleet: Some(*fleet),
                ..Self::default()
            },
            ScriptEvent::FleetAtFleet { fleet, other } => Self {
                player: fleet_owner(*fleet),
                owner: fleet_owner(*other),
                fleet: Some(*fleet),
                ..Self::default()
            },
            ScriptEvent::FleetAtPlanet { fleet, planet } => Self {
                player: fleet_owner(*fleet),
                owner: planet_owner(*planet),
                fleet: Some(*fleet),
                planet: Some(*planet),
                ..Self::default()
            },
            ScriptEvent::Stance { first, second } => Self {
                player: Some(*first),
                owner: Some(*second),
                ..Self::default()
            },
            ScriptEvent::AllyAgainst {
                first,
                common_enemy,
                ..
            } => Self {
                player: Some(*first),
                owner: Some(*common_enemy),
                ..Self::default()
            },
            ScriptEvent::BattleComplete { player, battle } => Self {
                player: Some(*player),
                owner: battle.loser(),
                planet: battle.planet,
                fleet: Some(battle.attacker_fleet),
                ..Self::default()
            },
            ScriptEvent::VideoComplete { video } => Self {
                video: Some(video),
                ..Self::default()
            },
            ScriptEvent::MessageSeen { id } => Self {
                message: Some(id),
                ..Self::default()
            },
            ScriptEvent::SoundComplete { .. }
            | ScriptEvent::Time
            | ScriptEvent::NewGame
            | ScriptEvent::LevelChanged => Self::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config parsing
// ---------------------------------------------------------------------------

/// Resolve an optional entity reference given by id or by name.
fn resolve<T>(
    node: &XElement,
    key: &str,
    exists: impl Fn(T) -> bool,
    by_name: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ScriptError>
where
    T: Copy + FromStr,
{
    let Some(raw) = node.get(key) else {
        return Ok(None);
    };
    if let Some(id) = raw.parse::<T>().ok().filter(|id| exists(*id)) {
        return Ok(Some(id));
    }
    by_name(raw).map(Some).ok_or_else(|| {
        ScriptError::config(format!("<{}> {key}='{raw}' does not name a known entity", node.name))
    })
}

fn resolve_player(
    world: &World,
    node: &XElement,
    key: &str,
) -> Result<Option<PlayerId>, ScriptError> {
    resolve(
        node,
        key,
        |id| world.player(id).is_some(),
        |name| world.players().find(|p| p.name == name).map(|p| p.id),
    )
}

fn resolve_fleet(
    world: &World,
    node: &XElement,
    key: &str,
) -> Result<Option<FleetId>, ScriptError> {
    resolve(
        node,
        key,
        |id| world.fleet(id).is_some(),
        |name| world.fleets().find(|f| f.name == name).map(|f| f.id),
    )
}

fn resolve_planet(
    world: &World,
    node: &XElement,
    key: &str,
) -> Result<Option<PlanetId>, ScriptError> {
    resolve(
        node,
        key,
        |id| world.planet(id).is_some(),
        |name| world.planets().find(|p| p.name == name).map(|p| p.id),
    )
}

fn required_fleet(world: &World, node: &XElement) -> Result<FleetId, ScriptError> {
    resolve_fleet(world, node, "fleet")?.ok_or_else(|| {
        ScriptError::config(format!("<{}> is missing required attribute 'fleet'", node.name))
    })
}

fn text_attr(node: &XElement, key: &str) -> Result<String, ScriptError> {
    node.require(key)
        .map(str::to_owned)
        .map_err(|e| ScriptError::config(e.to_string()))
}

fn parse_filter(world: &World, node: &XElement) -> Result<Filter, ScriptError> {
    let research = match node.get("research") {
        None => None,
        Some(raw) => {
            let found = raw
                .parse::<ResearchId>()
                .ok()
                .filter(|id| world.research(*id).is_some());
            Some(found.ok_or_else(|| {
                ScriptError::config(format!(
                    "<trigger> research='{raw}' is not a known research id"
                ))
            })?)
        }
    };
    Ok(Filter {
        player: resolve_player(world, node, "player")?,
        owner: resolve_player(world, node, "owner")?,
        planet: resolve_planet(world, node, "planet")?,
        fleet: resolve_fleet(world, node, "fleet")?,
        research,
        video: node.get("video").map(str::to_owned),
        message: node.get("message").map(str::to_owned),
    })
}

fn parse_action(world: &World, node: &XElement) -> Result<Action, ScriptError> {
    let action = match node.name.as_str() {
        "complete" => Action::Complete(text_attr(node, "objective")?),
        "fail" => Action::Fail(text_attr(node, "objective")?),
        "retire" => Action::Retire(text_attr(node, "objective")?),
        "add-objective" => Action::AddObjective(
            objective_from_node(node).map_err(|e| ScriptError::config(e.to_string()))?,
        ),
        "send-message" => Action::SendMessage {
            id: text_attr(node, "id")?,
            payload: text_attr(node, "payload")?,
        },
        "receive-message" => Action::ReceiveMessage {
            id: text_attr(node, "id")?,
            payload: text_attr(node, "payload")?,
        },
        "play-video" => Action::PlayVideo(text_attr(node, "video")?),
        "lock-fleet" => Action::LockFleet(required_fleet(world, node)?),
        "unlock-fleet" => Action::UnlockFleet(required_fleet(world, node)?),
        other => {
            return Err(ScriptError::config(format!("unknown trigger action <{other}>")));
        }
    };
    Ok(action)
}

fn parse_trigger(world: &World, node: &XElement) -> Result<Trigger, ScriptError> {
    let id = text_attr(node, "id")?;
    let on: EventKind = node
        .parse_required("on")
        .map_err(|e| ScriptError::config(e.to_string()))?;
    let repeat = node
        .parse("repeat")
        .map_err(|e| ScriptError::config(e.to_string()))?
        .unwrap_or(false);
    let actions = node
        .children()
        .iter()
        .map(|child| parse_action(world, child))
        .collect::<Result<Vec<_>, _>>()?;
    if actions.is_empty() {
        return Err(ScriptError::config(format!("trigger '{id}' has no actions")));
    }
    Ok(Trigger {
        filter: parse_filter(world, node)?,
        id,
        on,
        actions,
        repeat,
    })
}

fn parse_reward(world: &World, node: &XElement) -> Result<RewardRule, ScriptError> {
    let kind: BattleKind = node
        .parse_required("kind")
        .map_err(|e| ScriptError::config(e.to_string()))?;
    let text = match node.text() {
        Some(text) => text.to_owned(),
        None => text_attr(node, "text")?,
    };
    Ok(RewardRule {
        kind,
        winner: resolve_player(world, node, "winner")?,
        loser_owner: resolve_player(world, node, "loser-owner")?,
        reward: BattleReward {
            background: text_attr(node, "background")?,
            text,
        },
    })
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// The `mission` script variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionScript {
    triggers: Vec<Trigger>,
    rewards: Vec<RewardRule>,
    fired: BTreeSet<String>,
    locked: BTreeSet<FleetId>,
    cutscene: Option<String>,
}

impl MissionScript {
    /// Create an empty mission; rules are read at init.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cutscene video is playing.
    pub const fn in_cutscene(&self) -> bool {
        self.cutscene.is_some()
    }

    /// Fleets currently withheld from player control.
    pub const fn locked_fleets(&self) -> &BTreeSet<FleetId> {
        &self.locked
    }

    fn apply(&mut self, ctx: &mut ScriptContext<'_>, action: &Action) {
        match action {
            Action::Complete(id) => {
                ctx.complete_objective(id);
            }
            Action::Fail(id) => {
                ctx.fail_objective(id);
            }
            Action::Retire(id) => {
                ctx.retire_objective(id);
            }
            Action::AddObjective(objective) => {
                ctx.add_objective(objective.clone());
            }
            Action::SendMessage { id, payload } => {
                ctx.send_message(id, payload);
            }
            Action::ReceiveMessage { id, payload } => {
                ctx.receive_message(id, payload);
            }
            Action::PlayVideo(video) => {
                debug!(video = %video, "cutscene started");
                self.cutscene = Some(video.clone());
            }
            Action::LockFleet(fleet) => {
                self.locked.insert(*fleet);
            }
            Action::UnlockFleet(fleet) => {
                self.locked.remove(fleet);
            }
        }
    }
}

impl CampaignScript for MissionScript {
    fn init(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        config: &ScriptConfig,
    ) -> Result<(), ScriptError> {
        let world = ctx.world();
        let doc = &config.document;

        let mut triggers: Vec<Trigger> = Vec::new();
        for node in doc.children_named("trigger") {
            let trigger = parse_trigger(world, node)?;
            if triggers.iter().any(|t| t.id == trigger.id) {
                return Err(ScriptError::config(format!(
                    "trigger '{}' is declared twice",
                    trigger.id
                )));
            }
            triggers.push(trigger);
        }
        let rewards = doc
            .children_named("reward")
            .map(|node| parse_reward(world, node))
            .collect::<Result<Vec<_>, _>>()?;
        let locked = doc
            .children_named("lock")
            .map(|node| required_fleet(world, node))
            .collect::<Result<BTreeSet<_>, _>>()?;

        info!(
            triggers = triggers.len(),
            rewards = rewards.len(),
            locked = locked.len(),
            "mission rules loaded"
        );
        *self = Self {
            triggers,
            rewards,
            fired: BTreeSet::new(),
            locked,
            cutscene: None,
        };
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &ScriptEvent) -> EventDisposition {
        let mut handled = false;
        let cutscene_over = matches!(
            event,
            ScriptEvent::VideoComplete { video } if self.cutscene.as_deref() == Some(video.as_str())
        );
        if cutscene_over {
            debug!(video = ?self.cutscene, "cutscene finished");
            self.cutscene = None;
            handled = true;
        }

        let kind = event.kind();
        let facts = Facts::of(ctx.world(), event);
        let due: Vec<usize> = self
            .triggers
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.on == kind
                    && (t.repeat || !self.fired.contains(&t.id))
                    && t.filter.matches(&facts)
            })
            .map(|(index, _)| index)
            .collect();

        for index in due {
            let Some(trigger) = self.triggers.get(index).cloned() else {
                continue;
            };
            for action in &trigger.actions {
                self.apply(ctx, action);
            }
            debug!(trigger = %trigger.id, event = %kind, "mission trigger fired");
            self.fired.insert(trigger.id);
            handled = true;
        }

        if handled {
            EventDisposition::Handled
        } else {
            EventDisposition::Unhandled
        }
    }

    fn may_control_fleet(&self, _world: &World, fleet: FleetId) -> bool {
        !self.locked.contains(&fleet)
    }

    fn may_auto_save(&self) -> bool {
        self.cutscene.is_none()
    }

    fn battle_reward(&self, _world: &World, battle: &BattleInfo) -> Option<BattleReward> {
        self.rewards
            .iter()
            .find(|rule| rule.matches(battle))
            .map(|rule| rule.reward.clone())
    }

    fn save(&self, state: &mut XElement) {
        for id in &self.fired {
            state.push(XElement::new("fired").with("trigger", id));
        }
        for fleet in &self.locked {
            state.push(XElement::new("locked").with("fleet", fleet));
        }
        if let Some(video) = &self.cutscene {
            state.push(XElement::new("cutscene").with("video", video));
        }
    }

    fn load(&mut self, state: &XElement) -> Result<(), ScriptError> {
        let mut fired = BTreeSet::new();
        for node in state.children_named("fired") {
            let id = node
                .require("trigger")
                .map_err(|e| ScriptError::corrupt(e.to_string()))?;
            if !self.triggers.iter().any(|t| t.id == id) {
                return Err(ScriptError::corrupt(format!("unknown trigger '{id}'")));
            }
            fired.insert(id.to_owned());
        }
        let locked = state
            .children_named("locked")
            .map(|node| node.parse_required::<FleetId>("fleet"))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| ScriptError::corrupt(e.to_string()))?;
        let cutscene = match state.child("cutscene") {
            Some(node) => Some(
                node.require("video")
                    .map_err(|e| ScriptError::corrupt(e.to_string()))?
                    .to_owned(),
            ),
            None => None,
        };

        self.fired = fired;
        self.locked = locked;
        self.cutscene = cutscene;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ScriptHost;
    use campaign_types::{BattleId, BattleOutcome, ObjectiveStatus};
    use campaign_world::{StartingIds, create_starting_world};

    fn mission() -> XElement {
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
                    .with_child(XElement::new("unlock-fleet").with("fleet", "Home Fleet")),
            )
            .with_child(
                XElement::new("trigger")
                    .with("id", "raiders-down")
                    .with("on", "destroyed")
                    .with("owner", "Pirates")
                    .with_child(XElement::new("complete").with("objective", "destroy-pirate-base"))
                    .with_child(
                        XElement::new("receive-message")
                            .with("id", "victory")
                            .with("payload", "video/victory"),
                    ),
            )
            .with_child(
                XElement::new("reward")
                    .with("kind", "space")
                    .with("loser-owner", "Pirates")
                    .with("background", "bg/loot")
                    .with("text", "Pirate loot seized"),
            )
    }

    fn started() -> (World, StartingIds, ScriptHost) {
        let (world, ids) = create_starting_world().unwrap();
        let mut host = ScriptHost::new();
        host.init(&world, &mission()).unwrap();
        (world, ids, host)
    }

    #[test]
    fn locked_fleet_is_released_after_briefing() {
        let (world, ids, mut host) = started();
        assert!(!host.may_control_fleet(&world, ids.home_fleet));
        assert!(host.may_auto_save());

        host.dispatch(&world, &ScriptEvent::NewGame);
        assert!(!host.may_auto_save());

        host.dispatch(
            &world,
            &ScriptEvent::VideoComplete {
                video: "video/briefing".to_owned(),
            },
        );
        assert!(host.may_auto_save());
        assert!(host.may_control_fleet(&world, ids.home_fleet));
    }

    #[test]
    fn owner_filter_selects_the_losing_side() {
        let (world, ids, mut host) = started();
        // The pirates winning does not complete the objective.
        host.dispatch(
            &world,
            &ScriptEvent::Destroyed {
                winner: ids.pirate_fleet,
                loser: ids.home_fleet,
            },
        );
        assert_eq!(
            host.current_objectives().first().map(|o| o.status),
            Some(ObjectiveStatus::Active)
        );

        host.dispatch(
            &world,
            &ScriptEvent::Destroyed {
                winner: ids.home_fleet,
                loser: ids.pirate_fleet,
            },
        );
        assert_eq!(
            host.current_objectives().first().map(|o| o.status),
            Some(ObjectiveStatus::Completed)
        );
        assert_eq!(host.receive_messages().len(), 1);
    }

    #[test]
    fn triggers_fire_once_unless_repeating() {
        let (world, ids, mut host) = started();
        let event = ScriptEvent::Destroyed {
            winner: ids.home_fleet,
            loser: ids.pirate_fleet,
        };
        assert_eq!(host.dispatch(&world, &event), crate::DispatchOutcome::Handled);
        assert_eq!(host.dispatch(&world, &event), crate::DispatchOutcome::Unhandled);
    }

    #[test]
    fn reward_matches_kind_and_loser() {
        let (world, ids) = create_starting_world().unwrap();
        let config = ScriptConfig::from_document(&mission()).unwrap();
        let mut script = MissionScript::new();
        script.rewards = config
            .document
            .children_named("reward")
            .map(|node| parse_reward(&world, node).unwrap())
            .collect();

        let mut info = BattleInfo {
            id: BattleId::new(),
            kind: BattleKind::Space,
            attacker: ids.empire,
            attacker_fleet: ids.home_fleet,
            defender: Some(ids.pirates),
            defender_fleet: Some(ids.pirate_fleet),
            planet: None,
            outcome: BattleOutcome::AttackerWon,
            steps: 4,
        };
        assert_eq!(
            script.battle_reward(&world, &info).map(|r| r.background),
            Some("bg/loot".to_owned())
        );
        info.outcome = BattleOutcome::DefenderWon;
        assert!(script.battle_reward(&world, &info).is_none());
        info.outcome = BattleOutcome::AttackerWon;
        info.kind = BattleKind::Ground;
        assert!(script.battle_reward(&world, &info).is_none());
    }

    #[test]
    fn unknown_reference_is_a_config_error() {
        let (world, _) = create_starting_world().unwrap();
        let doc = mission().with_child(XElement::new("lock").with("fleet", "Phantom Fleet"));
        let mut host = ScriptHost::new();
        assert!(matches!(
            host.init(&world, &doc),
            Err(ScriptError::Config { .. })
        ));
        assert!(!host.is_active());
    }

    #[test]
    fn unknown_action_is_a_config_error() {
        let (world, _) = create_starting_world().unwrap();
        let doc = mission().with_child(
            XElement::new("trigger")
                .with("id", "odd")
                .with("on", "time")
                .with_child(XElement::new("self-destruct")),
        );
        let mut host = ScriptHost::new();
        assert!(host.init(&world, &doc).is_err());
    }

    #[test]
    fn private_state_survives_save_and_load() {
        let (world, ids, mut host) = started();
        host.dispatch(&world, &ScriptEvent::NewGame);
        let snapshot = host.save().unwrap();
        let script_state = snapshot.child("script").unwrap();
        assert!(script_state.child("cutscene").is_some());
        assert_eq!(script_state.children_named("fired").count(), 1);

        host.dispatch(
            &world,
            &ScriptEvent::VideoComplete {
                video: "video/briefing".to_owned(),
            },
        );
        assert!(host.may_control_fleet(&world, ids.home_fleet));

        host.load(&snapshot).unwrap();
        assert!(!host.may_auto_save());
        assert!(!host.may_control_fleet(&world, ids.home_fleet));
    }

    #[test]
    fn unknown_fired_trigger_is_corrupt() {
        let mut script = MissionScript::new();
        let state = XElement::new("script")
            .with_child(XElement::new("fired").with("trigger", "ghost"));
        assert!(matches!(
            script.load(&state),
            Err(ScriptError::CorruptState { .. })
        ));
    }
}
