// Playoff bracket resolution.
//
// Bracket slots can point at the winner or loser of another match instead of
// naming a team, and the provider does not guarantee those pointers form a
// tree. Resolution walks the pointers through an arena indexed by match id
// and gives up past a fixed depth, so malformed or cyclic data resolves to
// `None` instead of recursing forever.

use std::collections::HashMap;

use dynasty_core::model::{BracketMatch, TeamRef};
use dynasty_core::{MatchId, RosterId};
use serde::{Deserialize, Serialize};

/// Deepest chain of match references followed before giving up.
pub const MAX_RESOLVE_DEPTH: u32 = 10;

/// One season's winners or losers bracket. Serializes as the plain list of
/// matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<BracketMatch>", into = "Vec<BracketMatch>")]
pub struct Bracket {
    matches: Vec<BracketMatch>,
    by_id: HashMap<MatchId, usize>,
}

impl Bracket {
    pub fn new(matches: Vec<BracketMatch>) -> Self {
        let mut by_id = HashMap::with_capacity(matches.len());
        for (idx, m) in matches.iter().enumerate() {
            if let Some(id) = m.m {
                // First occurrence wins when the provider repeats an id.
                by_id.entry(id).or_insert(idx);
            }
        }
        Self { matches, by_id }
    }

    pub fn matches(&self) -> &[BracketMatch] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Look up a match by id.
    pub fn find(&self, id: MatchId) -> Option<&BracketMatch> {
        self.by_id.get(&id).map(|&idx| &self.matches[idx])
    }

    /// Resolve a slot reference to a concrete roster id.
    pub fn resolve(&self, slot: Option<&TeamRef>) -> Option<RosterId> {
        self.resolve_at(slot, 0)
    }

    fn resolve_at(&self, slot: Option<&TeamRef>, depth: u32) -> Option<RosterId> {
        match slot? {
            TeamRef::Roster(id) => Some(*id),
            _ if depth > MAX_RESOLVE_DEPTH => None,
            TeamRef::WinnerOf(match_id) => {
                let target = self.find(*match_id)?;
                target
                    .w
                    .or_else(|| self.resolve_at(target.first_slot(), depth + 1))
            }
            TeamRef::LoserOf(match_id) => {
                let target = self.find(*match_id)?;
                target
                    .l
                    .or_else(|| self.resolve_at(target.first_slot(), depth + 1))
            }
            TeamRef::Match(embedded) => embedded
                .w
                .or(embedded.l)
                .or_else(|| self.resolve_at(embedded.first_slot(), depth + 1)),
            TeamRef::Other(_) => None,
        }
    }

    /// The highest round number present, or `None` for an empty or
    /// round-less bracket.
    pub fn final_round(&self) -> Option<u32> {
        self.matches
            .iter()
            .map(|m| m.r.unwrap_or(0))
            .max()
            .filter(|&r| r > 0)
    }

    /// The championship match: among final-round matches, the first that has
    /// a recorded result, otherwise the first one listed.
    pub fn final_match(&self) -> Option<&BracketMatch> {
        let round = self.final_round()?;
        let mut in_final = self.matches.iter().filter(|m| m.r == Some(round));
        let first = in_final.clone().next();
        in_final.find(|m| m.has_result()).or(first)
    }

    /// The bracket winner.
    ///
    /// Uses the final match's recorded winner when present. Otherwise each
    /// side is resolved independently; when exactly one side resolves (a bye)
    /// that team is returned. When both or neither side resolve the winner
    /// cannot be read off the structure and `None` is returned.
    pub fn champion(&self) -> Option<RosterId> {
        let fin = self.final_match()?;
        if let Some(w) = fin.w {
            return Some(w);
        }

        let side1 = self.resolve(fin.t1.as_ref().or(fin.t1_from.as_ref()));
        let side2 = self.resolve(fin.t2.as_ref().or(fin.t2_from.as_ref()));
        match (side1, side2) {
            (Some(team), None) | (None, Some(team)) => Some(team),
            _ => None,
        }
    }

    /// The losing finalist, when the final has been played.
    ///
    /// Prefers the recorded loser; failing that, the side of a fully resolved
    /// final that is not the recorded winner.
    pub fn runner_up(&self) -> Option<RosterId> {
        let fin = self.final_match()?;
        if let Some(l) = fin.l {
            return Some(l);
        }
        let winner = fin.w?;
        let side1 = self.resolve(fin.t1.as_ref().or(fin.t1_from.as_ref()));
        let side2 = self.resolve(fin.t2.as_ref().or(fin.t2_from.as_ref()));
        match (side1, side2) {
            (Some(a), Some(b)) if a == winner && b != winner => Some(b),
            (Some(a), Some(b)) if b == winner && a != winner => Some(a),
            _ => None,
        }
    }

    /// Whether `a` and `b` meet in some match of this bracket, judged only by
    /// concrete `t1`/`t2` slots. References are not followed.
    pub fn has_pairing(&self, a: RosterId, b: RosterId) -> bool {
        self.matches.iter().any(|m| {
            let (t1, t2) = (m.t1_roster(), m.t2_roster());
            (t1 == Some(a) && t2 == Some(b)) || (t1 == Some(b) && t2 == Some(a))
        })
    }
}

impl From<Vec<BracketMatch>> for Bracket {
    fn from(matches: Vec<BracketMatch>) -> Self {
        Bracket::new(matches)
    }
}

impl From<Bracket> for Vec<BracketMatch> {
    fn from(bracket: Bracket) -> Self {
        bracket.matches
    }
}

/// Winner of a raw bracket, or `None` when it cannot be determined.
pub fn final_winner(matches: &[BracketMatch]) -> Option<RosterId> {
    Bracket::new(matches.to_vec()).champion()
}
