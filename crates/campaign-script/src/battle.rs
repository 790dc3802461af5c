//! Battle phase bridge: `start` / `step` / `finish` for both combat kinds.
//!
//! At most one battle runs at a time across both kinds, and a battle that
//! has started once can never start again. Out-of-order calls are lifecycle
//! misuse: logged, refused, and otherwise harmless. Errors returned by the
//! script's own phase hooks are logged and swallowed so a broken script can
//! never abort a battle.
//!
//! At `finish` the host asks the script for a battle reward exactly once and
//! caches the answer under the battle id for
//! [`ScriptHost::battle_reward`](crate::ScriptHost::battle_reward).

use std::collections::{BTreeMap, BTreeSet};

use campaign_types::{BattleId, BattleKind, BattleReward, XElement};
use campaign_world::{Battle, GroundBattle, SpaceBattle, World};
use tracing::{info, warn};

use crate::error::ScriptError;
use crate::host::{ScriptHost, misuse};
use crate::script::{CampaignScript, ScriptContext};

/// Where the bridge currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// No battle is running.
    Idle,
    /// A battle has started and not yet finished.
    Running {
        /// Space or ground.
        kind: BattleKind,
        /// The running battle.
        battle: BattleId,
        /// Steps delivered so far.
        steps: u32,
    },
}

impl BattlePhase {
    /// Whether a battle has started and not yet finished.
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Bridge state kept by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BattleBridge {
    phase: BattlePhase,
    started: BTreeSet<BattleId>,
    rewards: BTreeMap<BattleId, Option<BattleReward>>,
}

impl Default for BattleBridge {
    fn default() -> Self {
        Self {
            phase: BattlePhase::Idle,
            started: BTreeSet::new(),
            rewards: BTreeMap::new(),
        }
    }
}

impl BattleBridge {
    pub(crate) const fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Whether the battle went through `finish` under this host.
    pub(crate) fn has_finished(&self, battle: BattleId) -> bool {
        self.rewards.contains_key(&battle)
    }

    /// The reward cached at finish, if the script granted one.
    pub(crate) fn reward(&self, battle: BattleId) -> Option<&BattleReward> {
        self.rewards.get(&battle).and_then(Option::as_ref)
    }

    pub(crate) fn rewards_document(&self) -> XElement {
        self.rewards
            .iter()
            .filter_map(|(battle, reward)| reward.as_ref().map(|r| (battle, r)))
            .fold(XElement::new("battle-rewards"), |doc, (battle, reward)| {
                doc.with_child(
                    XElement::new("reward")
                        .with("battle", battle)
                        .with("background", &reward.background)
                        .with("text", &reward.text),
                )
            })
    }

    pub(crate) fn replace_rewards(&mut self, rewards: BTreeMap<BattleId, Option<BattleReward>>) {
        self.started.extend(rewards.keys().copied());
        self.rewards = rewards;
    }
}

/// Routes the generic phase driver to the kind-specific script hooks.
pub(crate) trait PhaseHooks: Battle {
    const START: &'static str;
    const STEP: &'static str;
    const FINISH: &'static str;

    fn start(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError>;
    fn step(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &mut Self,
    ) -> Result<(), ScriptError>;
    fn finish(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError>;
}

impl PhaseHooks for SpaceBattle {
    const START: &'static str = "space_start";
    const STEP: &'static str = "space_step";
    const FINISH: &'static str = "space_finish";

    fn start(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError> {
        script.on_space_start(ctx, battle)
    }

    fn step(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &mut Self,
    ) -> Result<(), ScriptError> {
        script.on_space_step(ctx, battle)
    }

    fn finish(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError> {
        script.on_space_finish(ctx, battle)
    }
}

impl PhaseHooks for GroundBattle {
    const START: &'static str = "ground_start";
    const STEP: &'static str = "ground_step";
    const FINISH: &'static str = "ground_finish";

    fn start(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError> {
        script.on_ground_start(ctx, battle)
    }

    fn step(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &mut Self,
    ) -> Result<(), ScriptError> {
        script.on_ground_step(ctx, battle)
    }

    fn finish(
        script: &mut dyn CampaignScript,
        ctx: &mut ScriptContext<'_>,
        battle: &Self,
    ) -> Result<(), ScriptError> {
        script.on_ground_finish(ctx, battle)
    }
}

impl ScriptHost {
    /// Current bridge phase.
    pub const fn battle_phase(&self) -> BattlePhase {
        self.bridge.phase
    }

    /// A space battle's placements are final and combat begins.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Lifecycle`] when another battle is running, this
    /// battle already started, or the host is not active;
    /// [`ScriptError::Battle`] when placements are still open.
    pub fn space_start(
        &mut self,
        world: &World,
        battle: &mut SpaceBattle,
    ) -> Result<(), ScriptError> {
        self.phase_start(world, battle)
    }

    /// One space battle step has been simulated.
    pub fn space_step(
        &mut self,
        world: &World,
        battle: &mut SpaceBattle,
    ) -> Result<(), ScriptError> {
        self.phase_step(world, battle)
    }

    /// The space battle is resolved; called before results reach the world.
    pub fn space_finish(&mut self, world: &World, battle: &SpaceBattle) -> Result<(), ScriptError> {
        self.phase_finish(world, battle)
    }

    /// A ground battle's placements are final and combat begins.
    pub fn ground_start(
        &mut self,
        world: &World,
        battle: &mut GroundBattle,
    ) -> Result<(), ScriptError> {
        self.phase_start(world, battle)
    }

    /// One ground battle step has been simulated.
    pub fn ground_step(
        &mut self,
        world: &World,
        battle: &mut GroundBattle,
    ) -> Result<(), ScriptError> {
        self.phase_step(world, battle)
    }

    /// The ground battle is resolved; called before results reach the world.
    pub fn ground_finish(
        &mut self,
        world: &World,
        battle: &GroundBattle,
    ) -> Result<(), ScriptError> {
        self.phase_finish(world, battle)
    }

    // -------------------------------------------------------------------
    // Generic phase driver
    // -------------------------------------------------------------------

    fn require_bound(&self, world: &World, operation: &'static str) -> Result<(), ScriptError> {
        if self.is_bound_to(world) {
            Ok(())
        } else {
            Err(misuse(
                operation,
                format!("host is {} or bound to another world", self.state),
            ))
        }
    }

    fn require_running<B: Battle>(
        &self,
        battle: &B,
        operation: &'static str,
    ) -> Result<(), ScriptError> {
        match self.bridge.phase {
            BattlePhase::Running {
                kind,
                battle: running,
                ..
            } if kind == battle.kind() && running == battle.id() => Ok(()),
            BattlePhase::Running { kind, battle: running, .. } => Err(misuse(
                operation,
                format!("{} battle {running} is running, not {}", kind.as_str(), battle.id()),
            )),
            BattlePhase::Idle => Err(misuse(operation, "no battle is running")),
        }
    }

    fn run_hook(
        &mut self,
        world: &World,
        operation: &'static str,
        hook: impl FnOnce(
            &mut dyn CampaignScript,
            &mut ScriptContext<'_>,
        ) -> Result<(), ScriptError>,
    ) {
        if let Some(Err(e)) = self.with_script(world, hook) {
            warn!(
                operation,
                error = %e,
                "script battle hook failed; treated as no special outcome"
            );
        }
    }

    fn phase_start<B: PhaseHooks>(
        &mut self,
        world: &World,
        battle: &mut B,
    ) -> Result<(), ScriptError> {
        self.require_bound(world, B::START)?;
        if let BattlePhase::Running { kind, battle: running, .. } = self.bridge.phase {
            return Err(misuse(
                B::START,
                format!("{} battle {running} has not finished", kind.as_str()),
            ));
        }
        let id = battle.id();
        if self.bridge.started.contains(&id) {
            return Err(misuse(B::START, format!("battle {id} already started once")));
        }
        battle
            .combat()
            .require_finalized()
            .inspect_err(|e| {
                warn!(battle = %id, error = %e, "battle started with open placements");
            })?;
        if battle.combat().is_concluded() {
            return Err(misuse(B::START, format!("battle {id} is already concluded")));
        }

        self.bridge.started.insert(id);
        self.bridge.phase = BattlePhase::Running {
            kind: battle.kind(),
            battle: id,
            steps: 0,
        };
        info!(
            battle = %id,
            kind = battle.kind().as_str(),
            units = battle.combat().units().len(),
            "battle started"
        );
        self.run_hook(world, B::START, |script, ctx| B::start(script, ctx, battle));
        Ok(())
    }

    fn phase_step<B: PhaseHooks>(
        &mut self,
        world: &World,
        battle: &mut B,
    ) -> Result<(), ScriptError> {
        self.require_bound(world, B::STEP)?;
        self.require_running(battle, B::STEP)?;
        self.run_hook(world, B::STEP, |script, ctx| B::step(script, ctx, battle));
        if let BattlePhase::Running { steps, .. } = &mut self.bridge.phase {
            *steps = steps.saturating_add(1);
        }
        Ok(())
    }

    fn phase_finish<B: PhaseHooks>(
        &mut self,
        world: &World,
        battle: &B,
    ) -> Result<(), ScriptError> {
        self.require_bound(world, B::FINISH)?;
        self.require_running(battle, B::FINISH)?;
        // No outcome: the battle still closes, without a reward.
        let summary = match battle.info() {
            Ok(summary) => summary,
            Err(e) => {
                warn!(battle = %battle.id(), error = %e, "battle finished without an outcome");
                self.bridge.rewards.insert(battle.id(), None);
                self.bridge.phase = BattlePhase::Idle;
                return Err(e.into());
            }
        };

        self.run_hook(world, B::FINISH, |script, ctx| B::finish(script, ctx, battle));

        let reward = self
            .script
            .as_ref()
            .and_then(|script| script.battle_reward(world, &summary));
        info!(
            battle = %summary.id,
            kind = summary.kind.as_str(),
            outcome = summary.outcome.as_str(),
            steps = summary.steps,
            reward = reward.is_some(),
            "battle finished"
        );
        self.bridge.rewards.insert(summary.id, reward);
        self.bridge.phase = BattlePhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::EventDisposition;
    use campaign_types::{BattleOutcome, FleetId, PlayerId, ScriptEvent};
    use campaign_world::{Side, create_starting_world};

    /// Script that records phase calls and tries to cheat during steps.
    #[derive(Default)]
    struct Recorder {
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl CampaignScript for Recorder {
        fn on_event(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            _event: &ScriptEvent,
        ) -> EventDisposition {
            EventDisposition::Unhandled
        }

        fn on_space_start(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            battle: &SpaceBattle,
        ) -> Result<(), ScriptError> {
            self.log.borrow_mut().push(format!("start {}", battle.id()));
            Ok(())
        }

        fn on_space_step(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            battle: &mut SpaceBattle,
        ) -> Result<(), ScriptError> {
            self.log.borrow_mut().push(format!("step {}", battle.id()));
            let owner = battle.combat().attacker();
            // Reinforcements after start must be refused by the context.
            battle
                .combat_mut()
                .add_unit(owner, Side::Attacker, "Reinforcement", 10, 1)?;
            Ok(())
        }

        fn on_space_finish(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            battle: &SpaceBattle,
        ) -> Result<(), ScriptError> {
            self.log.borrow_mut().push(format!("finish {}", battle.id()));
            Err(ScriptError::Handler("finish hook exploded".to_owned()))
        }

        fn battle_reward(
            &self,
            _world: &World,
            battle: &campaign_types::BattleInfo,
        ) -> Option<BattleReward> {
            (battle.outcome == BattleOutcome::AttackerWon).then(|| BattleReward {
                background: "bg/victory".to_owned(),
                text: "Pirate treasure recovered".to_owned(),
            })
        }
    }

    fn host_with(world: &World, log: &std::rc::Rc<std::cell::RefCell<Vec<String>>>) -> ScriptHost {
        let config = XElement::new("campaign-script")
            .with("variant", "recorder")
            .with("title", "Bridge");
        let mut host = ScriptHost::new();
        host.init_with(world, &config, Box::new(Recorder { log: log.clone() }))
            .unwrap();
        host
    }

    fn battle() -> SpaceBattle {
        let attacker = PlayerId::new();
        let mut battle =
            SpaceBattle::fleet_vs_fleet(attacker, FleetId::new(), PlayerId::new(), FleetId::new());
        battle
            .combat_mut()
            .add_unit(attacker, Side::Attacker, "Cruiser", 100, 10)
            .unwrap();
        battle
    }

    #[test]
    fn start_requires_finalized_placements() {
        let (world, _) = create_starting_world().unwrap();
        let log = std::rc::Rc::default();
        let mut host = host_with(&world, &log);
        let mut battle = battle();
        assert!(matches!(
            host.space_start(&world, &mut battle),
            Err(ScriptError::Battle(_))
        ));
        assert_eq!(host.battle_phase(), BattlePhase::Idle);
    }

    #[test]
    fn full_sequence_caches_reward_and_swallows_hook_errors() {
        let (world, _) = create_starting_world().unwrap();
        let log = std::rc::Rc::default();
        let mut host = host_with(&world, &log);
        let mut battle = battle();
        battle.combat_mut().finalize_placements();
        let id = battle.id();

        host.space_start(&world, &mut battle).unwrap();
        assert!(host.battle_reward(id).is_none());
        host.space_step(&world, &mut battle).unwrap();
        host.space_step(&world, &mut battle).unwrap();
        assert_eq!(battle.combat().units().len(), 1);
        assert!(matches!(
            host.battle_phase(),
            BattlePhase::Running { steps: 2, .. }
        ));

        battle.combat_mut().conclude(BattleOutcome::AttackerWon).unwrap();
        host.space_finish(&world, &battle).unwrap();
        assert_eq!(host.battle_phase(), BattlePhase::Idle);
        assert_eq!(
            host.battle_reward(id).map(|r| r.text),
            Some("Pirate treasure recovered".to_owned())
        );
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn no_interleaving_and_no_restart() {
        let (world, _) = create_starting_world().unwrap();
        let log = std::rc::Rc::default();
        let mut host = host_with(&world, &log);
        let mut first = battle();
        first.combat_mut().finalize_placements();
        let mut second = battle();
        second.combat_mut().finalize_placements();

        host.space_start(&world, &mut first).unwrap();
        assert!(matches!(
            host.space_start(&world, &mut second),
            Err(ScriptError::Lifecycle { .. })
        ));
        assert!(matches!(
            host.space_step(&world, &mut second),
            Err(ScriptError::Lifecycle { .. })
        ));

        first.combat_mut().conclude(BattleOutcome::Aborted).unwrap();
        host.space_finish(&world, &first).unwrap();
        assert!(matches!(
            host.space_finish(&world, &first),
            Err(ScriptError::Lifecycle { .. })
        ));
        assert!(matches!(
            host.space_start(&world, &mut first),
            Err(ScriptError::Lifecycle { .. })
        ));
        assert!(host.battle_reward(first.id()).is_none());

        host.space_start(&world, &mut second).unwrap();
    }

    #[test]
    fn finish_without_outcome_frees_the_bridge() {
        let (world, _) = create_starting_world().unwrap();
        let log = std::rc::Rc::default();
        let mut host = host_with(&world, &log);
        let mut battle = battle();
        battle.combat_mut().finalize_placements();
        host.space_start(&world, &mut battle).unwrap();
        assert!(matches!(
            host.space_finish(&world, &battle),
            Err(ScriptError::Battle(_))
        ));
        assert!(!host.battle_phase().is_running());
        assert!(host.battle_reward(battle.id()).is_none());
        assert!(matches!(
            host.space_start(&world, &mut battle),
            Err(ScriptError::Lifecycle { .. })
        ));

        let mut next = self::battle();
        next.combat_mut().finalize_placements();
        host.space_start(&world, &mut next).unwrap();
        assert!(host.battle_phase().is_running());
    }
}
