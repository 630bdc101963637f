// Playoff bracket matches and the team references inside them.
//
// A bracket slot is either a concrete roster id or a pointer to the winner
// or loser of another match in the same bracket. Some payloads embed the
// whole source match instead of a pointer, so `TeamRef` classifies raw JSON
// by shape rather than relying on an untagged enum.

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient::{self, value_as_id};
use super::{MatchId, RosterId};

/// One match in a winners or losers bracket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// Round number (1-based).
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub r: Option<u32>,
    /// Match id, unique within the bracket.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub m: Option<MatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1: Option<TeamRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t2: Option<TeamRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1_from: Option<TeamRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t2_from: Option<TeamRef>,
    /// Winning roster once the match has been played.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub w: Option<RosterId>,
    /// Losing roster once the match has been played.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub l: Option<RosterId>,
    /// Placement decided by this match (`p` and `p + 1`).
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub p: Option<u32>,
}

impl BracketMatch {
    /// Concrete roster id in slot `t1`, ignoring references.
    pub fn t1_roster(&self) -> Option<RosterId> {
        self.t1.as_ref().and_then(TeamRef::roster)
    }

    /// Concrete roster id in slot `t2`, ignoring references.
    pub fn t2_roster(&self) -> Option<RosterId> {
        self.t2.as_ref().and_then(TeamRef::roster)
    }

    pub fn has_result(&self) -> bool {
        self.w.is_some() || self.l.is_some()
    }

    /// First populated slot in resolution order: `t1`, `t2`, `t1_from`,
    /// `t2_from`.
    pub fn first_slot(&self) -> Option<&TeamRef> {
        self.t1
            .as_ref()
            .or(self.t2.as_ref())
            .or(self.t1_from.as_ref())
            .or(self.t2_from.as_ref())
    }
}

/// A bracket team slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamRef {
    /// A concrete team.
    Roster(RosterId),
    /// The winner of match `m` in the same bracket.
    WinnerOf(MatchId),
    /// The loser of match `m` in the same bracket.
    LoserOf(MatchId),
    /// A full source match embedded in place of a pointer.
    Match(Box<BracketMatch>),
    /// Anything else the provider sent; never resolves.
    Other(Value),
}

impl TeamRef {
    pub fn roster(&self) -> Option<RosterId> {
        match self {
            TeamRef::Roster(id) => Some(*id),
            _ => None,
        }
    }

    /// Classify a raw JSON slot value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if let Some(id) = value_as_id(&value) {
            return Ok(TeamRef::Roster(id));
        }
        let Value::Object(map) = &value else {
            return Ok(TeamRef::Other(value));
        };

        let present = |k: &str| map.get(k).is_some_and(|v| !v.is_null());

        // Only a match id marks an embedded match; otherwise `w`/`l` are
        // pointers to another match.
        if present("m") {
            let inner: BracketMatch = serde_json::from_value(value)?;
            return Ok(TeamRef::Match(Box::new(inner)));
        }
        if let Some(m) = map.get("w").and_then(value_as_id) {
            return Ok(TeamRef::WinnerOf(m));
        }
        if let Some(m) = map.get("l").and_then(value_as_id) {
            return Ok(TeamRef::LoserOf(m));
        }
        if ["t1", "t2", "t1_from", "t2_from"].into_iter().any(present) {
            let inner: BracketMatch = serde_json::from_value(value)?;
            return Ok(TeamRef::Match(Box::new(inner)));
        }
        Ok(TeamRef::Other(value))
    }
}

impl<'de> Deserialize<'de> for TeamRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        TeamRef::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for TeamRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TeamRef::Roster(id) => serializer.serialize_u32(*id),
            TeamRef::WinnerOf(m) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("w", m)?;
                map.end()
            }
            TeamRef::LoserOf(m) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("l", m)?;
                map.end()
            }
            TeamRef::Match(inner) => inner.serialize(serializer),
            TeamRef::Other(raw) => raw.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(v: Value) -> TeamRef {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn classifies_slot_shapes() {
        assert_eq!(slot(json!(4)), TeamRef::Roster(4));
        assert_eq!(slot(json!("4")), TeamRef::Roster(4));
        assert_eq!(slot(json!({"w": 1})), TeamRef::WinnerOf(1));
        assert_eq!(slot(json!({"l": "2"})), TeamRef::LoserOf(2));
        assert!(matches!(slot(json!({"m": 3, "w": 8})), TeamRef::Match(_)));
        assert!(matches!(slot(json!("tbd")), TeamRef::Other(_)));
    }

    #[test]
    fn winner_pointer_beside_team_slots_is_not_embedded() {
        assert_eq!(slot(json!({"w": 1, "t1": 8})), TeamRef::WinnerOf(1));
        assert_eq!(slot(json!({"l": 2, "t2_from": {"w": 1}})), TeamRef::LoserOf(2));
        assert!(matches!(slot(json!({"m": 3, "t1": 8})), TeamRef::Match(_)));

        // Neither a match id nor a pointer: the team slots are followed.
        let TeamRef::Match(inner) = slot(json!({"t1": 8})) else {
            panic!("expected an embedded slot holder");
        };
        assert_eq!(inner.t1_roster(), Some(8));
        assert!(inner.w.is_none());
    }

    #[test]
    fn null_slot_is_none() {
        let m: BracketMatch = serde_json::from_value(json!({
            "r": 1, "m": 1, "t1": null, "t2": 5, "w": null, "l": null
        }))
        .unwrap();
        assert!(m.t1.is_none());
        assert_eq!(m.t2_roster(), Some(5));
        assert!(!m.has_result());
    }

    #[test]
    fn first_slot_prefers_t1_then_t2_then_from() {
        let m = BracketMatch {
            t2: Some(TeamRef::Roster(2)),
            t1_from: Some(TeamRef::WinnerOf(1)),
            ..Default::default()
        };
        assert_eq!(m.first_slot(), Some(&TeamRef::Roster(2)));

        let m = BracketMatch {
            t2_from: Some(TeamRef::LoserOf(1)),
            ..Default::default()
        };
        assert_eq!(m.first_slot(), Some(&TeamRef::LoserOf(1)));
    }

    #[test]
    fn references_survive_serialization() {
        let original: BracketMatch = serde_json::from_value(json!({
            "r": 2, "m": 3,
            "t1": {"w": 1}, "t2": {"l": 2},
            "t1_from": {"w": 1}, "t2_from": {"l": 2},
            "w": 7, "l": 9, "p": 1
        }))
        .unwrap();
        let text = serde_json::to_string(&original).unwrap();
        let back: BracketMatch = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
    }
}
