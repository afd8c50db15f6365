use serde::{Deserialize, Serialize};

pub const BODY_PART_HITS: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPartType {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl BodyPartType {
    /// Spawn cost in energy.
    pub const fn cost(self) -> u32 {
        match self {
            BodyPartType::Move | BodyPartType::Carry => 50,
            BodyPartType::Work => 100,
            BodyPartType::Attack => 80,
            BodyPartType::RangedAttack => 150,
            BodyPartType::Heal => 250,
            BodyPartType::Claim => 600,
            BodyPartType::Tough => 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPart {
    #[serde(rename = "type")]
    pub kind: BodyPartType,
    pub hits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<String>,
}

impl BodyPart {
    pub fn new(kind: BodyPartType) -> Self {
        Self {
            kind,
            hits: BODY_PART_HITS,
            boost: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.hits > 0
    }
}

pub fn active_parts(body: &[BodyPart], kind: BodyPartType) -> u32 {
    body.iter()
        .filter(|part| part.kind == kind && part.is_active())
        .count() as u32
}

pub fn body_hits(body: &[BodyPart]) -> u32 {
    body.iter().map(|part| part.hits).sum()
}

/// Spread `amount` damage front-to-back across the body: the first living
/// part absorbs until it is destroyed, then the next one, and so on.
pub fn damage_body(body: &[BodyPart], amount: u32) -> Vec<BodyPart> {
    let mut remaining = amount;
    let mut out = body.to_vec();
    for part in out.iter_mut() {
        if remaining == 0 {
            break;
        }
        let absorbed = part.hits.min(remaining);
        part.hits -= absorbed;
        remaining -= absorbed;
    }
    out
}
