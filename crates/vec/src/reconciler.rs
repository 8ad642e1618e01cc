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

//! The VM Evacuation Controller loop (spec §4.4): detect that a host
//! carrying this cluster's control-plane VMs has been marked for drain, and
//! produce a replacement member on a different host.

use std::sync::Arc;

use chrono::Utc;
use maintenance_inventory::{BmaasInventory, ensure_and_assign};
use maintenance_model::config::{ForcePolicy, VecConfig};
use maintenance_model::infra::InfraMachine;
use maintenance_model::session::VecSession;
use maintenance_model::{MaintenanceError, ReconcileOutcome};
use maintenance_session::ConfigMapBackend;
use maintenance_session::VecSessionStore;
use maintenance_tags as tags;
use maintenance_tags::ProviderId;

use crate::cluster_records::ClusterRecords;

/// Processes at most one `opID` at a time for a single workload cluster
/// (spec §4.4 concurrency rule); one instance per cluster the controller
/// watches.
pub struct VecEvacuationReconciler<B: ConfigMapBackend> {
    cluster_id: String,
    inventory: Arc<dyn BmaasInventory>,
    cluster_records: Arc<dyn ClusterRecords>,
    store: VecSessionStore<B>,
    config: VecConfig,
}

impl<B: ConfigMapBackend> VecEvacuationReconciler<B> {
    pub fn new(
        cluster_id: impl Into<String>,
        inventory: Arc<dyn BmaasInventory>,
        cluster_records: Arc<dyn ClusterRecords>,
        store: VecSessionStore<B>,
        config: VecConfig,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            inventory,
            cluster_records,
            store,
            config,
        }
    }

    pub async fn reconcile(&self) -> Result<ReconcileOutcome, MaintenanceError> {
        let (existing, present) = self.store.load().await?;
        let session = if present && existing.is_in_progress() {
            existing
        } else {
            let Some((op_id, host_system_id)) = self.find_affected_host().await? else {
                return Ok(ReconcileOutcome::DoNothing);
            };
            let session = self.store.start_or_get(&op_id, &host_system_id).await?;
            if session.op_id != op_id {
                return Ok(ReconcileOutcome::wait(format!(
                    "deferring opID {op_id}: a session for {} is already in progress",
                    session.op_id
                )));
            }
            session
        };

        // Move timeout check (spec §4.4 failure semantics): under the halt
        // policy, a replacement that hasn't landed within
        // `per_wlc_move_timeout` surfaces a warning and leaves the session
        // in progress rather than retrying forever.
        if self.config.force_policy == ForcePolicy::Halt {
            if let Some(started_at) = session.started_at {
                let elapsed = Utc::now()
                    .signed_duration_since(started_at)
                    .to_std()
                    .unwrap_or_default();
                if elapsed >= self.config.per_wlc_move_timeout {
                    tracing::warn!(
                        event = "ReplacementMoveBlocked",
                        cluster_id = %self.cluster_id,
                        op_id = %session.op_id,
                        host_system_id = %session.host_system_id,
                        "move timeout exceeded under halt policy; leaving session in progress for operator resolution"
                    );
                    return Ok(ReconcileOutcome::wait(
                        "move timeout exceeded under halt policy; session left in progress for operator resolution",
                    ));
                }
            }
        }

        let cluster = self.cluster_records.cluster(&self.cluster_id).await?;
        if !cluster.is_stable() {
            return Ok(ReconcileOutcome::wait(
                "control-plane cluster is not stable",
            ));
        }

        let members = self
            .cluster_records
            .list_control_plane_machines(&self.cluster_id)
            .await?;
        if members.iter().any(InfraMachine::is_pending_deletion) {
            // At most one in-flight replacement per cluster; either it's the
            // member we just deleted (wait for its replacement) or a sibling
            // beat us to it (also wait).
            return self.await_replacement(&session).await;
        }

        match self.member_on_host(&members, &session.host_system_id) {
            Some(member) => self.evacuate(&cluster, member).await,
            None => self.await_replacement(&session).await,
        }
    }

    async fn evacuate(
        &self,
        cluster: &maintenance_model::infra::InfraCluster,
        member: &InfraMachine,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        match cluster.replicas {
            r if r >= 3 => {
                self.cluster_records
                    .delete_control_plane_machine(&self.cluster_id, &member.name)
                    .await?;
                Ok(ReconcileOutcome::wait(
                    "deleted affected control-plane record; waiting for its replacement",
                ))
            }
            1 => Ok(ReconcileOutcome::wait(
                "replicas==1 template-swap strategy is collaborator-owned; not implemented here",
            )),
            r => Ok(ReconcileOutcome::wait(format!(
                "no evacuation strategy defined for replicas={r}"
            ))),
        }
    }

    async fn await_replacement(
        &self,
        session: &VecSession,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        let cluster_tag = tags::build_cluster_tag(&self.cluster_id);
        let candidates = self.inventory.list_machines(Some(tags::VM_CP)).await?;
        let replacement = candidates.iter().find(|vm| {
            vm.has_tag(&cluster_tag)
                && vm.parent.as_deref() != Some(session.host_system_id.as_str())
                && vm.tag_value(tags::VM_READY_OP_PREFIX) != Some(session.op_id.as_str())
        });

        let Some(replacement) = replacement else {
            return Ok(ReconcileOutcome::wait(
                "waiting for a replacement control-plane VM to appear",
            ));
        };

        if !self
            .cluster_records
            .new_member_is_ready(&self.cluster_id, &replacement.system_id)
            .await?
        {
            return Ok(ReconcileOutcome::wait("replacement VM not yet ready"));
        }

        ensure_and_assign(
            self.inventory.as_ref(),
            &tags::build_ready_op_tag(&session.op_id),
            &replacement.system_id,
        )
        .await?;
        self.store.complete(&replacement.system_id).await?;
        Ok(ReconcileOutcome::transition("Completed"))
    }

    fn member_on_host<'a>(
        &self,
        members: &'a [InfraMachine],
        host_system_id: &str,
    ) -> Option<&'a InfraMachine> {
        members.iter().find(|m| {
            m.provider_id
                .as_deref()
                .and_then(|p| tags::parse_provider_id(p).ok())
                .is_some_and(|parsed| match parsed {
                    ProviderId::Vm {
                        host_system_id: h, ..
                    } => h == host_system_id,
                    ProviderId::Host { .. } => false,
                })
        })
    }

    /// Scans the cluster's control-plane members for one whose parent host
    /// carries the `HOST_MAINT ∧ HOST_NOSCHED ∧ HOST_OP:<opID>` conjunction
    /// (spec §4.4 steps 1-2).
    async fn find_affected_host(&self) -> Result<Option<(String, String)>, MaintenanceError> {
        let members = self
            .cluster_records
            .list_control_plane_machines(&self.cluster_id)
            .await?;
        for member in &members {
            let Some(provider_id) = member.provider_id.as_deref() else {
                continue;
            };
            let Ok(ProviderId::Vm { host_system_id, .. }) = tags::parse_provider_id(provider_id)
            else {
                continue;
            };
            let host = match self.inventory.get_machine(&host_system_id).await {
                Ok(host) => host,
                Err(MaintenanceError::InventoryNotFound(_)) => continue,
                Err(err) => return Err(err),
            };
            if let Some(op_id) = tags::host_maintenance_op_id(&host.tags) {
                return Ok(Some((op_id.to_string(), host_system_id)));
            }
        }
        Ok(None)
    }
}
