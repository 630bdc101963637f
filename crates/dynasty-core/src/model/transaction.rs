// Roster moves: trades, waiver claims, free-agent pickups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient;
use super::RosterId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Trade,
    Waiver,
    FreeAgent,
    Commissioner,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Complete,
    Pending,
    Failed,
    #[default]
    #[serde(other)]
    Other,
}

/// A draft pick that changed hands in a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradedPick {
    /// Draft year the pick belongs to.
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub season: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub round: u32,
    /// Roster that originally owned the pick.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub roster_id: Option<RosterId>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub previous_owner_id: Option<RosterId>,
    /// Roster that receives the pick.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub owner_id: Option<RosterId>,
}

/// A historical roster move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub transaction_id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::null_as_default")]
    pub kind: TransactionKind,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub status: TransactionStatus,
    #[serde(default, deserialize_with = "lenient::id_list")]
    pub roster_ids: Vec<RosterId>,
    /// Player id -> receiving roster.
    #[serde(default, deserialize_with = "lenient::id_map")]
    pub adds: BTreeMap<String, RosterId>,
    /// Player id -> losing roster.
    #[serde(default, deserialize_with = "lenient::id_map")]
    pub drops: BTreeMap<String, RosterId>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub draft_picks: Vec<TradedPick>,
    /// Week the transaction was processed in.
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub leg: u32,
    /// Creation time, epoch milliseconds.
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub created: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub status_updated: Option<i64>,
}

impl Transaction {
    pub fn is_complete(&self) -> bool {
        self.status == TransactionStatus::Complete
    }

    pub fn is_completed_trade(&self) -> bool {
        self.kind == TransactionKind::Trade && self.is_complete()
    }

    pub fn involves(&self, roster_id: RosterId) -> bool {
        self.roster_ids.contains(&roster_id)
    }

    /// When the move happened: creation time, falling back to the last
    /// status change.
    pub fn timestamp(&self) -> Option<i64> {
        self.created.or(self.status_updated)
    }
}
