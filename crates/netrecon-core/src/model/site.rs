// ── Site and VLAN ──
//
// Operator-maintained rows. The engine reads them through inventory
// snapshots but never creates or edits them.

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    pub name: String,
    /// Street address or other free-form location.
    pub address: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: EntityId,
    pub name: String,
    /// 802.1Q tag.
    pub tag: u16,
    pub site_id: Option<EntityId>,
}
