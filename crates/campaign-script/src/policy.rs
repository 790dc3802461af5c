//! Policy queries the simulation issues mid-tick.
//!
//! All three are `&self` and side-effect free, so the simulation may call
//! them as often as it likes. An inactive host answers with the defaults:
//! control allowed, autosave allowed, no reward.

use campaign_types::{BattleId, BattleReward, FleetId};
use campaign_world::World;
use tracing::debug;

use crate::host::ScriptHost;

impl ScriptHost {
    /// Whether the player may command this fleet right now.
    pub fn may_control_fleet(&self, world: &World, fleet: FleetId) -> bool {
        if !self.is_bound_to(world) {
            return true;
        }
        self.script
            .as_ref()
            .is_none_or(|script| script.may_control_fleet(world, fleet))
    }

    /// Whether the simulation may autosave right now.
    pub fn may_auto_save(&self) -> bool {
        if !self.is_active() {
            return true;
        }
        self.script
            .as_ref()
            .is_none_or(|script| script.may_auto_save())
    }

    /// The special reward granted for a finished battle.
    ///
    /// The script is asked once, when the battle finishes; this returns the
    /// cached answer. Asking before the battle has finished yields `None`.
    pub fn battle_reward(&self, battle: BattleId) -> Option<BattleReward> {
        if !self.bridge.has_finished(battle) {
            debug!(battle = %battle, "battle reward queried before finish");
            return None;
        }
        self.bridge.reward(battle).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::{CampaignScript, EventDisposition, ScriptContext};
    use campaign_types::{ScriptEvent, XElement};
    use campaign_world::create_starting_world;

    struct LockOne(FleetId);

    impl CampaignScript for LockOne {
        fn on_event(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            _event: &ScriptEvent,
        ) -> EventDisposition {
            EventDisposition::Unhandled
        }

        fn may_control_fleet(&self, _world: &World, fleet: FleetId) -> bool {
            fleet != self.0
        }

        fn may_auto_save(&self) -> bool {
            false
        }
    }

    #[test]
    fn inactive_host_answers_defaults() {
        let (world, ids) = create_starting_world().unwrap();
        let host = ScriptHost::new();
        assert!(host.may_control_fleet(&world, ids.home_fleet));
        assert!(host.may_auto_save());
        assert!(host.battle_reward(BattleId::new()).is_none());
    }

    #[test]
    fn active_host_asks_the_script() {
        let (world, ids) = create_starting_world().unwrap();
        let mut host = ScriptHost::new();
        let config = XElement::new("campaign-script")
            .with("variant", "escort")
            .with("title", "Escort");
        host.init_with(&world, &config, Box::new(LockOne(ids.home_fleet)))
            .unwrap();
        assert!(!host.may_control_fleet(&world, ids.home_fleet));
        assert!(host.may_control_fleet(&world, ids.pirate_fleet));
        assert!(!host.may_auto_save());

        host.done();
        assert!(host.may_control_fleet(&world, ids.home_fleet));
        assert!(host.may_auto_save());
    }
}
