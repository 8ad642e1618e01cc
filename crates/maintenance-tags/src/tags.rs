/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! The tag vocabulary of the host maintenance protocol.
//!
//! The source material spells the LXD-ready variant of some of these tags
//! two different ways (`maas.lxd-*` and `maas-lxd-*`). We standardise on a
//! single alphabet, a plain `SCREAMING_SNAKE` prefix followed by `:`, for
//! every tag in this module.

use crate::sanitise::sanitise;

/// Host is draining; do not place new workloads.
pub const HOST_MAINT: &str = "HOST_MAINT";
/// Scheduler hint: block new VM placement on the host.
pub const HOST_NOSCHED: &str = "HOST_NOSCHED";
/// Prefix of `HOST_OP:<opID>`, binding a drain to an HMC session.
pub const HOST_OP_PREFIX: &str = "HOST_OP:";
/// This VM serves as a control-plane member of a workload cluster.
pub const VM_CP: &str = "VM_CP";
/// Prefix of `VM_CLUSTER:<clusterID>`.
pub const VM_CLUSTER_PREFIX: &str = "VM_CLUSTER:";
/// Prefix of `VM_READY_OP:<opID>`.
pub const VM_READY_OP_PREFIX: &str = "VM_READY_OP:";
/// Prefix of `HOST_READY:<clusterID>-op-<opID>`.
pub const HOST_READY_PREFIX: &str = "HOST_READY:";

/// Builds `HOST_OP:<opID>`.
pub fn build_op_tag(op_id: &str) -> String {
    format!("{HOST_OP_PREFIX}{op_id}")
}

/// Parses a tag of the form `HOST_OP:<opID>`, returning the `opID` if `tag`
/// carries the prefix.
///
/// `parse_op_tag(&build_op_tag(id)) == Some(id)` for every `id`.
pub fn parse_op_tag(tag: &str) -> Option<&str> {
    tag.strip_prefix(HOST_OP_PREFIX)
}

/// Builds `VM_CLUSTER:<clusterID>`, sanitising `cluster_id` first.
pub fn build_cluster_tag(cluster_id: &str) -> String {
    format!("{VM_CLUSTER_PREFIX}{}", sanitise(cluster_id))
}

/// Parses a `VM_CLUSTER:<clusterID>` tag.
pub fn parse_cluster_tag(tag: &str) -> Option<&str> {
    tag.strip_prefix(VM_CLUSTER_PREFIX)
}

/// Builds `VM_READY_OP:<opID>`.
pub fn build_ready_op_tag(op_id: &str) -> String {
    format!("{VM_READY_OP_PREFIX}{op_id}")
}

/// Parses a `VM_READY_OP:<opID>` tag.
pub fn parse_ready_op_tag(tag: &str) -> Option<&str> {
    tag.strip_prefix(VM_READY_OP_PREFIX)
}

/// Builds `HOST_READY:<clusterID>-op-<opID>`.
pub fn build_host_ready_tag(cluster_id: &str, op_id: &str) -> String {
    format!(
        "{HOST_READY_PREFIX}{}-op-{op_id}",
        sanitise(cluster_id)
    )
}

/// Scans a host's tag set for the `HOST_MAINT ∧ HOST_NOSCHED ∧ ∃ HOST_OP:*`
/// conjunction that defines "the host is in maintenance" (spec §4.2, §8
/// invariant 2).
///
/// Returns the active session's `opID` when the conjunction holds, or `None`
/// if any of the three tags is absent. A host carrying `HOST_MAINT` alone,
/// or `HOST_MAINT ∧ HOST_NOSCHED` with no `HOST_OP:*`, is **not** considered
/// in maintenance.
///
/// If more than one `HOST_OP:*` tag is present — a protocol violation — the
/// lexicographically smallest `opID` is returned for determinism, and the
/// violation is logged.
pub fn host_maintenance_op_id<'a, I, S>(tags: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'a,
{
    let tags: Vec<&str> = tags.into_iter().map(|t| t.as_ref()).collect();
    let has_maint = tags.iter().any(|t| *t == HOST_MAINT);
    let has_nosched = tags.iter().any(|t| *t == HOST_NOSCHED);
    if !has_maint || !has_nosched {
        return None;
    }

    let mut op_ids: Vec<&str> = tags.iter().filter_map(|t| parse_op_tag(t)).collect();
    if op_ids.is_empty() {
        return None;
    }
    op_ids.sort_unstable();
    if op_ids.len() > 1 {
        tracing::warn!(
            op_ids = ?op_ids,
            "protocol violation: host carries multiple HOST_OP tags, picking the lexicographically smallest"
        );
    }
    op_ids.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_tag_round_trips() {
        for id in ["abc-123", "f47ac10b-58cc-4372-a567-0e02b2c3d479", "x"] {
            assert_eq!(parse_op_tag(&build_op_tag(id)), Some(id));
        }
    }

    #[test]
    fn cluster_tag_sanitises() {
        assert_eq!(build_cluster_tag("Tenant_A"), "VM_CLUSTER:tenant-a");
        assert_eq!(parse_cluster_tag("VM_CLUSTER:tenant-a"), Some("tenant-a"));
    }

    #[test]
    fn conjunction_requires_all_three() {
        let none: [&str; 0] = [];
        assert_eq!(host_maintenance_op_id(&none), None);
        assert_eq!(host_maintenance_op_id(&[HOST_MAINT]), None);
        assert_eq!(
            host_maintenance_op_id(&[HOST_MAINT, HOST_NOSCHED]),
            None,
            "HOST_MAINT and HOST_NOSCHED without HOST_OP is not in maintenance"
        );
        let op_tag = build_op_tag("op-1");
        assert_eq!(
            host_maintenance_op_id(&[HOST_MAINT.to_string(), HOST_NOSCHED.to_string(), op_tag]),
            Some("op-1")
        );
    }

    #[test]
    fn conjunction_ignores_host_op_alone() {
        let op_tag = build_op_tag("op-1");
        assert_eq!(host_maintenance_op_id(&[op_tag]), None);
    }

    #[test]
    fn multiple_host_op_tags_pick_smallest() {
        let tags = vec![
            HOST_MAINT.to_string(),
            HOST_NOSCHED.to_string(),
            build_op_tag("op-zzz"),
            build_op_tag("op-aaa"),
        ];
        assert_eq!(host_maintenance_op_id(&tags), Some("op-aaa"));
    }
}
