//! Script lifecycle: `init`, `done`, and transactional `save` / `load`.
//!
//! A [`ScriptHost`] owns exactly one script instance and everything that
//! instance is allowed to change: the message queues, the objective list,
//! the battle bridge and the queue of events the script raised. The host
//! moves through three states:
//!
//! ```text
//! Uninitialized --init--> Active --done--> Closed
//! ```
//!
//! A failed `init` leaves the host uninitialized so the caller can retry
//! with a corrected configuration. `Closed` is terminal.

use std::collections::BTreeMap;

use campaign_types::{
    BattleId, BattleReward, DocumentError, MessageAudience, Objective, ScriptEvent, VideoMessage,
    WorldId, XElement,
};
use campaign_world::World;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::battle::BattleBridge;
use crate::config::{ScriptConfig, ScriptVariant};
use crate::dispatch::DispatchStats;
use crate::error::{ScriptError, StoreError};
use crate::mission::MissionScript;
use crate::script::{CampaignScript, ScriptContext};
use crate::skirmish::SkirmishScript;
use crate::stores::{MessageQueue, ObjectiveList};

/// Name of the snapshot root element written by [`ScriptHost::save`].
pub const STATE_ROOT: &str = "script-state";

/// Lifecycle state of a [`ScriptHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created but not initialized, or a previous `init` failed.
    Uninitialized,
    /// Bound to a world and receiving events.
    Active,
    /// Shut down; no further calls are accepted.
    Closed,
}

impl LifecycleState {
    /// Lowercase name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl core::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostOptions {
    /// Log unhandled events at warn level instead of debug.
    pub warn_unhandled: bool,
}

/// Owner of one campaign script instance.
pub struct ScriptHost {
    pub(crate) state: LifecycleState,
    pub(crate) options: HostOptions,
    pub(crate) world: Option<WorldId>,
    pub(crate) variant: Option<String>,
    pub(crate) script: Option<Box<dyn CampaignScript>>,
    pub(crate) send: MessageQueue,
    pub(crate) receive: MessageQueue,
    pub(crate) objectives: ObjectiveList,
    pub(crate) raised: Vec<ScriptEvent>,
    pub(crate) bridge: BattleBridge,
    pub(crate) stats: DispatchStats,
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHost {
    /// Create an uninitialized host.
    pub fn new() -> Self {
        Self::with_options(HostOptions::default())
    }

    /// Create an uninitialized host with explicit options.
    pub fn with_options(options: HostOptions) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            options,
            world: None,
            variant: None,
            script: None,
            send: MessageQueue::new(MessageAudience::Send),
            receive: MessageQueue::new(MessageAudience::Receive),
            objectives: ObjectiveList::new(),
            raised: Vec::new(),
            bridge: BattleBridge::default(),
            stats: DispatchStats::default(),
        }
    }

    // -------------------------------------------------------------------
    // Read-only views
    // -------------------------------------------------------------------

    /// Current lifecycle state.
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the host accepts events.
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// The bound world, while active.
    pub const fn world_id(&self) -> Option<WorldId> {
        self.world
    }

    /// The configured variant name, while active.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Outgoing messages, oldest first.
    pub fn send_messages(&self) -> &[VideoMessage] {
        self.send.as_slice()
    }

    /// Incoming messages, oldest first.
    pub fn receive_messages(&self) -> &[VideoMessage] {
        self.receive.as_slice()
    }

    /// Current objectives, in the order they were added.
    pub fn current_objectives(&self) -> &[Objective] {
        self.objectives.as_slice()
    }

    /// Dispatch counters.
    pub const fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Drain the events raised by the script since the last call. The
    /// simulation dispatches them on its next tick.
    pub fn take_raised_events(&mut self) -> Vec<ScriptEvent> {
        core::mem::take(&mut self.raised)
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Bind the host to `world` and start the script named by the
    /// configuration's `variant` attribute.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Config`] for a malformed document or unknown variant
    /// (the host stays uninitialized), [`ScriptError::Lifecycle`] if the
    /// host is not uninitialized.
    pub fn init(&mut self, world: &World, config: &XElement) -> Result<(), ScriptError> {
        self.require_state(LifecycleState::Uninitialized, "init")?;
        let parsed = ScriptConfig::from_document(config).inspect_err(log_config_error)?;
        let variant = parsed.builtin_variant().inspect_err(log_config_error)?;
        let script: Box<dyn CampaignScript> = match variant {
            ScriptVariant::Mission => Box::new(MissionScript::new()),
            ScriptVariant::Skirmish => Box::new(SkirmishScript::new()),
        };
        self.activate(world, parsed, script)
    }

    /// Like [`init`](Self::init), but runs a caller-supplied script. The
    /// configuration's `variant` is recorded but not interpreted.
    pub fn init_with(
        &mut self,
        world: &World,
        config: &XElement,
        script: Box<dyn CampaignScript>,
    ) -> Result<(), ScriptError> {
        self.require_state(LifecycleState::Uninitialized, "init")?;
        let parsed = ScriptConfig::from_document(config).inspect_err(log_config_error)?;
        self.activate(world, parsed, script)
    }

    fn activate(
        &mut self,
        world: &World,
        config: ScriptConfig,
        mut script: Box<dyn CampaignScript>,
    ) -> Result<(), ScriptError> {
        // Stage everything; nothing is committed unless the script's own
        // init succeeds.
        let mut send = MessageQueue::new(MessageAudience::Send);
        let mut receive = MessageQueue::new(MessageAudience::Receive);
        let mut objectives = ObjectiveList::new();
        let mut raised = Vec::new();

        for objective in &config.objectives {
            objectives
                .add(objective.clone())
                .map_err(|e| ScriptError::config(e.to_string()))?;
        }
        for message in &config.messages {
            let queue = match message.audience {
                MessageAudience::Send => &mut send,
                MessageAudience::Receive => &mut receive,
            };
            queue
                .push(&message.id, &message.payload)
                .map_err(|e| ScriptError::config(e.to_string()))?;
        }

        {
            let mut ctx = ScriptContext::new(
                world,
                &mut send,
                &mut receive,
                &mut objectives,
                &mut raised,
            );
            script
                .init(&mut ctx, &config)
                .map_err(|e| match e {
                    ScriptError::Config { .. } => e,
                    other => ScriptError::config(other.to_string()),
                })
                .inspect_err(log_config_error)?;
        }

        self.send = send;
        self.receive = receive;
        self.objectives = objectives;
        self.raised = raised;
        self.script = Some(script);
        self.world = Some(world.id());
        self.bridge = BattleBridge::default();
        self.stats = DispatchStats::default();
        self.state = LifecycleState::Active;

        info!(
            world = %world.id(),
            variant = %config.variant,
            title = %config.title,
            objectives = self.objectives.len(),
            "campaign script initialized"
        );
        self.variant = Some(config.variant);
        Ok(())
    }

    /// Release the world and drain every store. Calling this outside the
    /// active window is logged and ignored.
    pub fn done(&mut self) {
        if self.state != LifecycleState::Active {
            warn!(state = %self.state, "done called outside the active window; ignored");
            return;
        }
        if let Some(mut script) = self.script.take() {
            script.done();
        }
        self.send.clear();
        self.receive.clear();
        self.objectives.clear();
        self.raised.clear();
        self.bridge = BattleBridge::default();
        let world = self.world.take();
        self.variant = None;
        self.state = LifecycleState::Closed;
        info!(world = ?world, dispatched = self.stats.delivered, "campaign script closed");
    }

    // -------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------

    /// Snapshot the script-owned state.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Lifecycle`] if the host is not active.
    pub fn save(&self) -> Result<XElement, ScriptError> {
        self.require_state(LifecycleState::Active, "save")?;

        let mut script_state = XElement::new("script");
        if let Some(script) = &self.script {
            script.save(&mut script_state);
        }

        let mut root = XElement::new(STATE_ROOT);
        root.set("variant", self.variant.as_deref().unwrap_or_default());
        root.set("saved-at", Utc::now().to_rfc3339());
        root.push(self.objectives.to_document());
        root.push(self.send.to_document("send-messages"));
        root.push(self.receive.to_document("receive-messages"));
        root.push(self.bridge.rewards_document());
        root.push(script_state);

        debug!(
            objectives = self.objectives.len(),
            sent = self.send.len(),
            received = self.receive.len(),
            "script state saved"
        );
        Ok(root)
    }

    /// Replace the script-owned state with a snapshot, or reject it whole.
    ///
    /// # Errors
    ///
    /// [`ScriptError::CorruptState`] if the snapshot is malformed or the
    /// script refuses its private state; nothing observable changes.
    /// [`ScriptError::Lifecycle`] if the host is not active or a battle is
    /// in progress.
    pub fn load(&mut self, snapshot: &XElement) -> Result<(), ScriptError> {
        self.require_state(LifecycleState::Active, "load")?;
        if self.bridge.is_running() {
            return Err(misuse("load", "a battle is in progress"));
        }

        let staged = Snapshot::parse(snapshot, self.variant.as_deref().unwrap_or_default())
            .map_err(|e| ScriptError::corrupt(e.to_string()))
            .inspect_err(|e| warn!(error = %e, "snapshot rejected; previous state kept"))?;

        let Some(script) = self.script.as_mut() else {
            return Err(misuse("load", "no script is bound"));
        };
        let mut backup = XElement::new("script");
        script.save(&mut backup);
        if let Err(e) = script.load(&staged.script) {
            if let Err(restore) = script.load(&backup) {
                error!(error = %restore, "script failed to restore its own backup");
            }
            warn!(error = %e, "script rejected its private state; previous state kept");
            return Err(match e {
                ScriptError::CorruptState { .. } => e,
                other => ScriptError::corrupt(other.to_string()),
            });
        }

        self.objectives = staged.objectives;
        self.send = staged.send;
        self.receive = staged.receive;
        self.bridge.replace_rewards(staged.rewards);
        self.raised.clear();

        info!(
            objectives = self.objectives.len(),
            saved_at = %staged.saved_at,
            "script state loaded"
        );
        Ok(())
    }

    // -------------------------------------------------------------------
    // Helpers shared with dispatch, battle and policy
    // -------------------------------------------------------------------

    pub(crate) fn require_state(
        &self,
        expected: LifecycleState,
        operation: &'static str,
    ) -> Result<(), ScriptError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(misuse(
                operation,
                format!("host is {}, expected {}", self.state, expected),
            ))
        }
    }

    /// Whether the host is active and bound to this world.
    pub(crate) fn is_bound_to(&self, world: &World) -> bool {
        self.state == LifecycleState::Active && self.world == Some(world.id())
    }

    /// Run `f` against the script with a context over this host's stores.
    pub(crate) fn with_script<R>(
        &mut self,
        world: &World,
        f: impl FnOnce(&mut dyn CampaignScript, &mut ScriptContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            script,
            send,
            receive,
            objectives,
            raised,
            ..
        } = self;
        let script = script.as_deref_mut()?;
        let mut ctx = ScriptContext::new(world, send, receive, objectives, raised);
        Some(f(script, &mut ctx))
    }
}

/// Log and build a lifecycle misuse error.
pub(crate) fn misuse(operation: &'static str, reason: impl Into<String>) -> ScriptError {
    let err = ScriptError::lifecycle(operation, reason);
    warn!(operation, error = %err, "lifecycle misuse");
    err
}

fn log_config_error(err: &ScriptError) {
    warn!(error = %err, "campaign configuration rejected; host stays uninitialized");
}

// ---------------------------------------------------------------------------
// Snapshot parsing
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum SnapshotError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("snapshot belongs to variant '{found}', host runs '{expected}'")]
    VariantMismatch { expected: String, found: String },
    #[error("battle reward for {0} is listed twice")]
    DuplicateReward(BattleId),
}

/// A fully parsed snapshot, staged before anything is committed.
struct Snapshot {
    saved_at: String,
    objectives: ObjectiveList,
    send: MessageQueue,
    receive: MessageQueue,
    rewards: BTreeMap<BattleId, Option<BattleReward>>,
    script: XElement,
}

impl Snapshot {
    fn parse(doc: &XElement, expected_variant: &str) -> Result<Self, SnapshotError> {
        let root = doc.expect_name(STATE_ROOT)?;
        let found = root.require("variant")?;
        if found != expected_variant {
            return Err(SnapshotError::VariantMismatch {
                expected: expected_variant.to_owned(),
                found: found.to_owned(),
            });
        }

        let objectives = ObjectiveList::from_document(root.require_child("objectives")?)?;
        let send = MessageQueue::from_document(
            root.require_child("send-messages")?,
            MessageAudience::Send,
        )?;
        let receive = MessageQueue::from_document(
            root.require_child("receive-messages")?,
            MessageAudience::Receive,
        )?;

        let mut rewards = BTreeMap::new();
        for node in root.require_child("battle-rewards")?.children_named("reward") {
            let battle: BattleId = node.parse_required("battle")?;
            let reward = BattleReward {
                background: node.require("background")?.to_owned(),
                text: node.require("text")?.to_owned(),
            };
            if rewards.insert(battle, Some(reward)).is_some() {
                return Err(SnapshotError::DuplicateReward(battle));
            }
        }

        Ok(Self {
            saved_at: root.get("saved-at").unwrap_or("unknown").to_owned(),
            objectives,
            send,
            receive,
            rewards,
            script: root.require_child("script")?.clone(),
        })
    }
}
