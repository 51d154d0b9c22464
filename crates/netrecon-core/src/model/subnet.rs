// ── Subnet domain type ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use crate::cidr::Cidr;

/// An addressable block in the inventory.
///
/// `cidr` is kept as text: rows imported from an operator-edited store may
/// be malformed, and the resolver must skip those rather than refuse the
/// whole inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: EntityId,
    pub cidr: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub site_id: Option<EntityId>,
    pub vlan_id: Option<EntityId>,
}

impl Subnet {
    /// A new, unattached subnet for `cidr`.
    pub fn new(cidr: Cidr, name: Option<String>) -> Self {
        Self {
            id: EntityId::generate(),
            cidr: cidr.to_string(),
            name,
            description: None,
            site_id: None,
            vlan_id: None,
        }
    }
}
