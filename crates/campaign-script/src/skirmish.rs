//! Free-play script: one objective, defeat every rival.

use campaign_types::{Objective, ObjectiveStatus, ScriptEvent};
use tracing::info;

use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::script::{CampaignScript, EventDisposition, ScriptContext};

/// Id of the objective the skirmish tracks.
pub const DEFEAT_ALL_RIVALS: &str = "defeat-all-rivals";

/// The `skirmish` script variant.
///
/// Completes [`DEFEAT_ALL_RIVALS`] once every non-human player is beaten and
/// fails it as soon as a human player is. Holds no private state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkirmishScript;

impl SkirmishScript {
    /// Create the script.
    pub const fn new() -> Self {
        Self
    }
}

impl CampaignScript for SkirmishScript {
    fn init(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        _config: &ScriptConfig,
    ) -> Result<(), ScriptError> {
        if ctx.objective(DEFEAT_ALL_RIVALS).is_none() {
            ctx.add_objective(Objective::active(
                DEFEAT_ALL_RIVALS,
                "Defeat all rivals",
                "Eliminate every other player in the galaxy.",
            ));
        }
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &ScriptEvent) -> EventDisposition {
        let ScriptEvent::PlayerBeaten { player } = event else {
            return EventDisposition::Unhandled;
        };
        let still_open = ctx
            .objective(DEFEAT_ALL_RIVALS)
            .is_some_and(|o| o.status == ObjectiveStatus::Active);
        if !still_open {
            return EventDisposition::Unhandled;
        }

        let world = ctx.world();
        if world.player(*player).is_some_and(|p| p.human) {
            info!(player = %player, "human player beaten; skirmish lost");
            ctx.fail_objective(DEFEAT_ALL_RIVALS);
            return EventDisposition::Handled;
        }
        let rivals_left = world.players().filter(|p| !p.human && !p.beaten).count();
        if rivals_left == 0 {
            info!("every rival beaten; skirmish won");
            ctx.complete_objective(DEFEAT_ALL_RIVALS);
        }
        EventDisposition::Handled
    }
}
