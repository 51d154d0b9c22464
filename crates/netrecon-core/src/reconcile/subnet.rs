// ── Subnet resolution and auto-provisioning ──
//
// Holds the run's working set of subnets. Resolution never touches the
// store; provisioning writes one row and appends it to the working set so
// later addresses in the same block resolve without another write.

use std::cmp::Reverse;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::cidr::Cidr;
use crate::config::{SubnetMatch, SyncPolicy};
use crate::error::CoreError;
use crate::model::Subnet;
use crate::store::IpamRepository;

pub struct SubnetResolver {
    /// Parsed blocks in resolution order.
    entries: Vec<(Cidr, Subnet)>,
    strategy: SubnetMatch,
    auto_create: bool,
    auto_prefix: u8,
}

impl SubnetResolver {
    /// Build the working set from `subnets` in enumeration order.
    ///
    /// Rows whose CIDR does not parse are skipped. Under
    /// [`SubnetMatch::MostSpecific`] the set is stably sorted by descending
    /// prefix length, so ties keep enumeration order.
    pub fn new(subnets: Vec<Subnet>, policy: &SyncPolicy) -> Self {
        let mut entries: Vec<(Cidr, Subnet)> = subnets
            .into_iter()
            .filter_map(|subnet| match subnet.cidr.parse::<Cidr>() {
                Ok(block) => Some((block, subnet)),
                Err(e) => {
                    debug!(subnet = %subnet.id, cidr = %subnet.cidr, error = %e, "skipping malformed subnet");
                    None
                }
            })
            .collect();

        if policy.subnet_match == SubnetMatch::MostSpecific {
            entries.sort_by_key(|(block, _)| Reverse(block.prefix_len()));
        }

        Self {
            entries,
            strategy: policy.subnet_match,
            auto_create: policy.auto_create_subnets,
            auto_prefix: policy.auto_subnet_prefix,
        }
    }

    /// The subnet `address` belongs to, or `None` when unmapped.
    pub fn resolve(&self, address: Ipv4Addr) -> Option<&Subnet> {
        self.entries
            .iter()
            .find(|(block, _)| block.contains(address))
            .map(|(_, subnet)| subnet)
    }

    /// Create the enclosing block for an unmapped `address`.
    ///
    /// Returns `Ok(None)` when auto-creation is disabled. The created row is
    /// named after `name_hint` (the originating interface) when given, has
    /// no site or VLAN, and stays in the store even if the device that
    /// triggered it fails later in the run.
    pub fn provision<R: IpamRepository + ?Sized>(
        &mut self,
        repo: &R,
        address: Ipv4Addr,
        name_hint: Option<&str>,
    ) -> Result<Option<Subnet>, CoreError> {
        if !self.auto_create {
            return Ok(None);
        }
        let block = Cidr::enclosing(address, self.auto_prefix)?;
        let created = repo.create_subnet(Subnet::new(block, name_hint.map(str::to_owned)))?;
        info!(cidr = %block, name = ?created.name, "auto-provisioned subnet");
        self.insert(block, created.clone());
        Ok(Some(created))
    }

    /// [`resolve`](Self::resolve), falling back to
    /// [`provision`](Self::provision). The flag is `true` when a subnet was
    /// created.
    pub fn resolve_or_provision<R: IpamRepository + ?Sized>(
        &mut self,
        repo: &R,
        address: Ipv4Addr,
        name_hint: Option<&str>,
    ) -> Result<Option<(Subnet, bool)>, CoreError> {
        if let Some(found) = self.resolve(address) {
            return Ok(Some((found.clone(), false)));
        }
        Ok(self
            .provision(repo, address, name_hint)?
            .map(|created| (created, true)))
    }

    /// Prefix length of auto-provisioned blocks.
    pub fn auto_prefix(&self) -> u8 {
        self.auto_prefix
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, block: Cidr, subnet: Subnet) {
        match self.strategy {
            SubnetMatch::FirstMatch => self.entries.push((block, subnet)),
            SubnetMatch::MostSpecific => {
                // after every entry at least as specific, i.e. last among equals
                let at = self
                    .entries
                    .partition_point(|(b, _)| b.prefix_len() >= block.prefix_len());
                self.entries.insert(at, (block, subnet));
            }
        }
    }
}
