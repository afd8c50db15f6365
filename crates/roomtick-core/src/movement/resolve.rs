//! Simultaneous move resolution.
//!
//! Every round classifies all claims against the static board, settles
//! contention for shared tiles, then repeatedly cancels moves into tiles
//! whose occupant stays put. Pulls are checked last: a pull whose puller did
//! not leave its tile is broken (the pulled mover falls back to its own
//! intent) and a pull whose pulled half is blocked or fatal crashes the whole
//! chain. Both sets only grow, so the rounds terminate.

use std::collections::{BTreeMap, BTreeSet};

use super::claims::{MovePlan, Mover, Target};
use super::transit::{Board, Outcome};
use crate::{CancelToken, EngineError, ObjectId, Position};

pub(crate) type Outcomes = BTreeMap<ObjectId, Outcome>;

pub(crate) fn resolve(
    plan: &MovePlan,
    board: &Board<'_>,
    cancel: &CancelToken,
) -> Result<Outcomes, EngineError> {
    let mut broken: BTreeSet<ObjectId> = BTreeSet::new();
    let mut forced_crash: BTreeSet<ObjectId> = BTreeSet::new();

    loop {
        cancel.check()?;
        let joint = active_pulls(plan, &broken);
        let classified = classify(plan, board, &joint, &forced_crash);
        let mut outcomes = classified.clone();
        settle_contention(plan, board, &joint, &mut outcomes);
        settle_occupancy(board, &mut outcomes);

        let mut changed = false;
        for (pulled, puller) in &joint {
            let puller_left = outcomes.get(puller).is_some_and(Outcome::vacates);
            match outcomes.get(pulled) {
                _ if !puller_left => changed |= broken.insert(pulled.clone()),
                Some(Outcome::Move(_) | Outcome::Transfer(_)) => {}
                Some(Outcome::Crash) => {
                    changed |= crash_chain(plan, &joint, pulled, &mut forced_crash);
                }
                // Blocked by the tile itself rather than by another mover.
                Some(Outcome::Stay) if classified.get(pulled) == Some(&Outcome::Stay) => {
                    changed |= crash_chain(plan, &joint, pulled, &mut forced_crash);
                }
                _ => changed |= broken.insert(pulled.clone()),
            }
        }
        if !changed {
            return Ok(outcomes);
        }
    }
}

/// pulled -> puller for pulls still in force.
fn active_pulls(plan: &MovePlan, broken: &BTreeSet<ObjectId>) -> BTreeMap<ObjectId, ObjectId> {
    plan.movers
        .values()
        .filter(|m| !broken.contains(&m.id))
        .filter_map(|m| m.pulled_by.clone().map(|puller| (m.id.clone(), puller)))
        .collect()
}

fn claim(
    plan: &MovePlan,
    mover: &Mover,
    joint: &BTreeMap<ObjectId, ObjectId>,
) -> Option<Target> {
    match joint.get(&mover.id).and_then(|puller| plan.movers.get(puller)) {
        Some(puller) => Some(Target {
            to: puller.from,
            direct: false,
        }),
        None => mover.own,
    }
}

fn classify(
    plan: &MovePlan,
    board: &Board<'_>,
    joint: &BTreeMap<ObjectId, ObjectId>,
    forced_crash: &BTreeSet<ObjectId>,
) -> Outcomes {
    let mut outcomes = Outcomes::new();
    for mover in plan.movers.values() {
        let outcome = if forced_crash.contains(&mover.id) {
            Outcome::Crash
        } else {
            match claim(plan, mover, joint) {
                Some(target) => board.classify(mover, target),
                None => Outcome::Stay,
            }
        };
        outcomes.insert(mover.id.clone(), outcome);
    }
    outcomes
}

/// One winner per contested tile: swap partners first, then pull
/// participants, then the lowest object id. Losers stay in place.
fn settle_contention(
    plan: &MovePlan,
    board: &Board<'_>,
    joint: &BTreeMap<ObjectId, ObjectId>,
    outcomes: &mut Outcomes,
) {
    let mut claims: BTreeMap<Position, Vec<ObjectId>> = BTreeMap::new();
    for (id, outcome) in outcomes.iter() {
        if let Outcome::Move(to) = outcome {
            claims.entry(*to).or_default().push(id.clone());
        }
    }

    for (to, contenders) in claims {
        if contenders.len() < 2 {
            continue;
        }
        let current: &Outcomes = outcomes;
        let Some(winner) = contenders
            .iter()
            .min_by_key(|id| {
                let swap = is_swap(plan, board, current, id, to);
                let pull = joint.contains_key(*id) || joint.values().any(|p| p == *id);
                (!swap, !pull, (*id).clone())
            })
            .cloned()
        else {
            continue;
        };
        for loser in contenders.iter().filter(|id| **id != winner) {
            tracing::debug!(
                object = %loser,
                winner = %winner,
                x = to.x,
                y = to.y,
                "Lost tile contention"
            );
            outcomes.insert(loser.clone(), Outcome::Stay);
        }
    }
}

/// `id` heads for `to` while an occupant of `to` heads for `id`'s tile.
fn is_swap(
    plan: &MovePlan,
    board: &Board<'_>,
    outcomes: &Outcomes,
    id: &ObjectId,
    to: Position,
) -> bool {
    let Some(from) = plan.movers.get(id).map(|m| m.from) else {
        return false;
    };
    board
        .occupants(to)
        .iter()
        .any(|other| outcomes.get(other) == Some(&Outcome::Move(from)))
}

/// Cancels moves into tiles whose occupants do not leave, until stable.
/// A crashing occupant stays where it is.
fn settle_occupancy(board: &Board<'_>, outcomes: &mut Outcomes) {
    loop {
        let blocked: Vec<ObjectId> = outcomes
            .iter()
            .filter_map(|(id, outcome)| match outcome {
                Outcome::Move(to) => board
                    .occupants(*to)
                    .iter()
                    .any(|occupant| {
                        occupant != id
                            && !outcomes.get(occupant).is_some_and(Outcome::vacates)
                    })
                    .then(|| id.clone()),
                _ => None,
            })
            .collect();
        if blocked.is_empty() {
            return;
        }
        for id in blocked {
            outcomes.insert(id, Outcome::Stay);
        }
    }
}

/// Crashes `pulled` and every puller up its chain. Returns whether anything
/// new was marked.
fn crash_chain(
    plan: &MovePlan,
    joint: &BTreeMap<ObjectId, ObjectId>,
    pulled: &ObjectId,
    forced_crash: &mut BTreeSet<ObjectId>,
) -> bool {
    let mut changed = forced_crash.insert(pulled.clone());
    let mut cursor = pulled;
    while let Some(puller) = joint.get(cursor) {
        if !plan.movers.contains_key(puller) {
            break;
        }
        changed |= forced_crash.insert(puller.clone());
        cursor = puller;
    }
    changed
}
