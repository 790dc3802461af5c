//! The handler contract implemented by campaign scripts.
//!
//! A script sees the world only through the [`ScriptContext`] handed to each
//! hook. The context carries a shared reference to the world, mutable access
//! to the host's stores, and a queue for follow-up events. Nothing a hook
//! does can reach back into the dispatcher, so re-entrant dispatch is ruled
//! out by the borrow checker rather than at runtime.

use campaign_types::{
    BattleInfo, BattleReward, FleetId, Objective, ObjectiveStatus, ScriptEvent, VideoMessage,
    XElement,
};
use campaign_world::{GroundBattle, SpaceBattle, World};
use tracing::warn;

use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::stores::{MessageQueue, ObjectiveList};

/// Whether a script reacted to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The script had a handler for the event.
    Handled,
    /// The script ignores this event kind.
    Unhandled,
}

/// What a script hook may touch while it runs.
pub struct ScriptContext<'a> {
    world: &'a World,
    send: &'a mut MessageQueue,
    receive: &'a mut MessageQueue,
    objectives: &'a mut ObjectiveList,
    raised: &'a mut Vec<ScriptEvent>,
}

impl<'a> ScriptContext<'a> {
    pub(crate) const fn new(
        world: &'a World,
        send: &'a mut MessageQueue,
        receive: &'a mut MessageQueue,
        objectives: &'a mut ObjectiveList,
        raised: &'a mut Vec<ScriptEvent>,
    ) -> Self {
        Self {
            world,
            send,
            receive,
            objectives,
            raised,
        }
    }

    /// The bound world, in the state the event timing promises.
    pub const fn world(&self) -> &'a World {
        self.world
    }

    /// Current objectives.
    pub fn objectives(&self) -> &[Objective] {
        self.objectives.as_slice()
    }

    /// Look up an objective.
    pub fn objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.get(id)
    }

    /// Outgoing messages.
    pub fn send_messages(&self) -> &[VideoMessage] {
        self.send.as_slice()
    }

    /// Incoming messages.
    pub fn receive_messages(&self) -> &[VideoMessage] {
        self.receive.as_slice()
    }

    /// Queue an outgoing video message. Returns `false` if the id is taken.
    pub fn send_message(&mut self, id: &str, payload: &str) -> bool {
        log_rejection("send_message", self.send.push(id, payload))
    }

    /// Queue an incoming video message. Returns `false` if the id is taken.
    pub fn receive_message(&mut self, id: &str, payload: &str) -> bool {
        log_rejection("receive_message", self.receive.push(id, payload))
    }

    /// Add an objective. Returns `false` if the id is taken.
    pub fn add_objective(&mut self, objective: Objective) -> bool {
        log_rejection("add_objective", self.objectives.add(objective))
    }

    /// Mark an active objective completed.
    pub fn complete_objective(&mut self, id: &str) -> bool {
        log_rejection(
            "complete_objective",
            self.objectives.resolve(id, ObjectiveStatus::Completed),
        )
    }

    /// Mark an active objective failed.
    pub fn fail_objective(&mut self, id: &str) -> bool {
        log_rejection(
            "fail_objective",
            self.objectives.resolve(id, ObjectiveStatus::Failed),
        )
    }

    /// Remove a completed or failed objective from the list.
    pub fn retire_objective(&mut self, id: &str) -> bool {
        log_rejection("retire_objective", self.objectives.retire(id).map(|_| ()))
    }

    /// Queue a follow-up event. The simulation dispatches it on the next
    /// tick, never from inside the current handler.
    pub fn raise(&mut self, event: ScriptEvent) {
        self.raised.push(event);
    }
}

fn log_rejection<E: core::fmt::Display>(operation: &'static str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(reason) => {
            warn!(operation, %reason, "script store mutation rejected");
            false
        }
    }
}

/// Campaign script behavior.
///
/// Only [`on_event`](Self::on_event) is required. Every other hook has a
/// neutral default: battle phases do nothing, policy queries allow
/// everything and grant no reward, and the private save state is empty.
pub trait CampaignScript {
    /// One-time setup after the host has seeded the configured objectives
    /// and messages. An error aborts `init` with the host left
    /// uninitialized.
    fn init(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        config: &ScriptConfig,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, config);
        Ok(())
    }

    /// React to one simulation event.
    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &ScriptEvent) -> EventDisposition;

    /// A space battle is about to start; placements are final.
    fn on_space_start(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &SpaceBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// One space battle step has been simulated.
    fn on_space_step(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &mut SpaceBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// The space battle is resolved; results are not applied yet.
    fn on_space_finish(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &SpaceBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// A ground battle is about to start; placements are final.
    fn on_ground_start(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &GroundBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// One ground battle step has been simulated.
    fn on_ground_step(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &mut GroundBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// The ground battle is resolved; results are not applied yet.
    fn on_ground_finish(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        battle: &GroundBattle,
    ) -> Result<(), ScriptError> {
        let _ = (ctx, battle);
        Ok(())
    }

    /// Whether the player may issue commands to this fleet. Called at
    /// arbitrary frequency; must be cheap and side-effect free.
    fn may_control_fleet(&self, world: &World, fleet: FleetId) -> bool {
        let _ = (world, fleet);
        true
    }

    /// Whether the simulation may autosave now.
    fn may_auto_save(&self) -> bool {
        true
    }

    /// Special reward for a concluded battle. Evaluated once, at finish.
    fn battle_reward(&self, world: &World, battle: &BattleInfo) -> Option<BattleReward> {
        let _ = (world, battle);
        None
    }

    /// Write private state into the host-provided `<script>` node.
    fn save(&self, state: &mut XElement) {
        let _ = state;
    }

    /// Restore private state from a `<script>` node written by
    /// [`save`](Self::save). On error the host restores the previous state.
    fn load(&mut self, state: &XElement) -> Result<(), ScriptError> {
        let _ = state;
        Ok(())
    }

    /// The host is closing; release anything tied to the world.
    fn done(&mut self) {}
}
