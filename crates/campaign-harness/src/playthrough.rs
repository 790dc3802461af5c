//! Scripted player for the starting world.
//!
//! The player sits through every cutscene the campaign can play, watches
//! each message it receives, orders the home fleet to attack the raiders
//! (refused while the script holds the fleet), and invades the pirate base
//! with whatever troops survive. The remaining ticks run idle.

use campaign_sim::{AttackOutcome, AttackTarget, BattleReport, Simulation};
use campaign_types::{Objective, XElement};
use campaign_world::StartingIds;
use tracing::{debug, info};

use crate::error::HarnessError;

/// What a playthrough did.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Ticks run.
    pub ticks: u64,
    /// Every battle fought, in order.
    pub battles: Vec<BattleReport>,
    /// Attack orders the script refused.
    pub refused_orders: u32,
    /// Autosaves written.
    pub autosaves: u32,
    /// Objectives at the end of the run.
    pub objectives: Vec<Objective>,
}

/// Every video a campaign document can start, in document order.
pub fn cutscenes(doc: &XElement) -> Vec<String> {
    let mut out = Vec::new();
    collect_cutscenes(doc, &mut out);
    out
}

fn collect_cutscenes(node: &XElement, out: &mut Vec<String>) {
    let video = node.get("video").filter(|_| node.name == "play-video");
    if let Some(video) = video.filter(|v| !out.iter().any(|seen| seen == v)) {
        out.push(video.to_owned());
    }
    for child in node.children() {
        collect_cutscenes(child, out);
    }
}

/// Play `ticks` ticks of the campaign described by `campaign`.
///
/// The session must already be started.
pub fn play(
    sim: &mut Simulation,
    ids: &StartingIds,
    campaign: &XElement,
    ticks: u64,
) -> Result<Summary, HarnessError> {
    let mut summary = Summary::default();
    let videos = cutscenes(campaign);
    let mut watched = 0_usize;

    for _ in 0..ticks {
        let report = sim.tick()?;
        summary.ticks = report.tick;
        if report.autosaved {
            summary.autosaves = summary.autosaves.saturating_add(1);
        }

        for video in &videos {
            sim.video_complete(video);
        }
        let inbox: Vec<String> = sim
            .host()
            .receive_messages()
            .iter()
            .skip(watched)
            .map(|m| m.id.clone())
            .collect();
        watched = watched.saturating_add(inbox.len());
        for id in &inbox {
            debug!(message = %id, "message watched");
            sim.message_seen(id);
        }

        engage(sim, ids, &mut summary)?;
    }

    summary.objectives = sim.host().current_objectives().to_vec();
    info!(
        ticks = summary.ticks,
        battles = summary.battles.len(),
        refused_orders = summary.refused_orders,
        autosaves = summary.autosaves,
        "playthrough finished"
    );
    Ok(summary)
}

/// One round of orders: attack the raiders, then invade the base.
fn engage(
    sim: &mut Simulation,
    ids: &StartingIds,
    summary: &mut Summary,
) -> Result<(), HarnessError> {
    let Some(home) = sim.world().fleet(ids.home_fleet) else {
        return Ok(());
    };
    let home_troops = home.troops;

    let target = if sim.world().fleet(ids.pirate_fleet).is_some() {
        AttackTarget::Fleet(ids.pirate_fleet)
    } else {
        let base_held_by_enemy = sim
            .world()
            .planet(ids.pirate_base)
            .is_some_and(|p| p.owner.is_some_and(|owner| owner != ids.empire));
        if !base_held_by_enemy || home_troops == 0 {
            return Ok(());
        }
        AttackTarget::Invade(ids.pirate_base)
    };

    match sim.attack(ids.home_fleet, target)? {
        AttackOutcome::Locked => {
            summary.refused_orders = summary.refused_orders.saturating_add(1);
        }
        AttackOutcome::Fought(report) => summary.battles.push(report),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campaign_sim::SimulationConfig;
    use campaign_world::create_starting_world;

    fn skirmish() -> XElement {
        XElement::new("campaign-script")
            .with("variant", "skirmish")
            .with("title", "Harness")
    }

    #[test]
    fn cutscenes_are_collected_once() {
        let doc = XElement::new("campaign-script")
            .with_child(
                XElement::new("trigger")
                    .with_child(XElement::new("play-video").with("video", "video/a")),
            )
            .with_child(
                XElement::new("trigger")
                    .with_child(XElement::new("play-video").with("video", "video/a"))
                    .with_child(XElement::new("play-video").with("video", "video/b")),
            );
        assert_eq!(cutscenes(&doc), vec!["video/a".to_owned(), "video/b".to_owned()]);
    }

    #[test]
    fn held_fleet_orders_are_counted_not_fought() {
        let campaign = XElement::new("campaign-script")
            .with("variant", "mission")
            .with("title", "Held")
            .with_child(XElement::new("lock").with("fleet", "Home Fleet"));
        let (world, ids) = create_starting_world().unwrap();
        let mut sim = Simulation::new(world, SimulationConfig::default());
        sim.start(&campaign).unwrap();

        let summary = play(&mut sim, &ids, &campaign, 2).unwrap();
        assert_eq!(summary.refused_orders, 2);
        assert!(summary.battles.is_empty());
        assert!(sim.world().fleet(ids.pirate_fleet).is_some());
    }

    #[test]
    fn skirmish_playthrough_fights() {
        let (world, ids) = create_starting_world().unwrap();
        let mut sim = Simulation::new(world, SimulationConfig::default());
        let campaign = skirmish();
        sim.start(&campaign).unwrap();

        let summary = play(&mut sim, &ids, &campaign, 3).unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.refused_orders, 0);
        assert!(!summary.battles.is_empty());
        assert_eq!(summary.objectives.len(), 1);
    }
}
