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

//! The Host Maintenance Controller state machine (spec §4.3):
//! `Idle → Tagging → Gating → Clearing → Completed`, with `{Halted,
//! ForceCleared}` escape hatches from `Gating` on policy timeout.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use maintenance_inventory::{BmaasInventory, ensure_and_assign};
use maintenance_model::config::HmcConfig;
use maintenance_model::config::ForcePolicy;
use maintenance_model::{MaintenanceError, ReconcileOutcome};
use maintenance_session::ConfigMapBackend;
use maintenance_session::HmcSessionStore;
use maintenance_tags as tags;

use crate::host_machine::HostMachineRecords;

/// What caused HMC to look at a host: an operator request recorded on the
/// session ConfigMap (`start="true"`, `hostSystemID=...`), or a deletion
/// timestamp observed on the host's external machine record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainTrigger {
    OperatorRequested { host_system_id: String },
    MachineDeletion { host_system_id: String },
}

impl DrainTrigger {
    pub fn host_system_id(&self) -> &str {
        match self {
            DrainTrigger::OperatorRequested { host_system_id }
            | DrainTrigger::MachineDeletion { host_system_id } => host_system_id,
        }
    }
}

pub struct HostDrainReconciler<B: ConfigMapBackend> {
    inventory: Arc<dyn BmaasInventory>,
    machine_records: Arc<dyn HostMachineRecords>,
    store: HmcSessionStore<B>,
    config: HmcConfig,
}

impl<B: ConfigMapBackend> HostDrainReconciler<B> {
    pub fn new(
        inventory: Arc<dyn BmaasInventory>,
        machine_records: Arc<dyn HostMachineRecords>,
        store: HmcSessionStore<B>,
        config: HmcConfig,
    ) -> Self {
        Self {
            inventory,
            machine_records,
            store,
            config,
        }
    }

    /// Drives one step of the drain state machine for `trigger`.
    pub async fn reconcile_drain(
        &self,
        trigger: DrainTrigger,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        let host = trigger.host_system_id().to_string();

        if let DrainTrigger::MachineDeletion { .. } = &trigger {
            self.machine_records.add_finalizer(&host).await?;
        }

        let mut session = self.store.start_if_none_active(&host).await?;
        if session.current_host != host {
            // A different host is already draining; at most one concurrent
            // drain is permitted per management environment.
            return Err(MaintenanceError::SessionConflict {
                active_op_id: session.op_id,
            });
        }

        // Policy timeout check happens before the rest of the gate so a
        // long-stalled session doesn't keep re-tagging forever.
        if let Some(started_at) = session.started_at {
            let elapsed = Utc::now().signed_duration_since(started_at);
            let elapsed = elapsed.to_std().unwrap_or_default();
            if elapsed >= self.config.per_host_wave_timeout {
                return self.handle_policy_timeout(&host, &session).await;
            }
        }

        self.ensure_host_tags(&host, &session.op_id).await?;

        let vms = self.inventory.list_vms(&host).await?;
        if vms.is_empty() {
            return self.clear_and_complete(&host, &session.op_id).await;
        }

        let draining_cp: Vec<_> = vms.iter().filter(|vm| vm.has_tag(tags::VM_CP)).collect();
        if draining_cp.is_empty() {
            // No control-plane VMs on the host: nothing to wait for, even
            // though other (non-CP) VMs remain.
            return self.clear_and_complete(&host, &session.op_id).await;
        }

        let mut required_per_cluster: BTreeMap<String, usize> = BTreeMap::new();
        for vm in &draining_cp {
            if let Some(cluster) = vm.tag_value(tags::VM_CLUSTER_PREFIX) {
                *required_per_cluster.entry(cluster.to_string()).or_default() += 1;
            }
        }

        session.affected_clusters = required_per_cluster.keys().cloned().collect();
        session.pending_replacements = draining_cp
            .iter()
            .map(|vm| vm.system_id.clone())
            .collect();

        let ready_vms = self
            .inventory
            .list_machines(Some(tags::VM_CP))
            .await?;

        let mut unsatisfied = Vec::new();
        for (cluster, required) in &required_per_cluster {
            let ready_count = ready_vms
                .iter()
                .filter(|vm| {
                    vm.parent.as_deref() != Some(host.as_str())
                        && vm.tag_value(tags::VM_CLUSTER_PREFIX) == Some(cluster.as_str())
                        && vm.tag_value(tags::VM_READY_OP_PREFIX) == Some(session.op_id.as_str())
                })
                .count();
            if ready_count < *required {
                unsatisfied.push(cluster.clone());
            }
        }

        self.store.save_progress(&session).await?;

        if unsatisfied.is_empty() {
            return self.clear_and_complete(&host, &session.op_id).await;
        }

        tracing::warn!(
            event = "WLCReplacementPending",
            host = %host,
            op_id = %session.op_id,
            clusters = ?unsatisfied,
            "waiting for replacement control-plane VMs before clearing host tags"
        );
        Ok(ReconcileOutcome::wait(format!(
            "gate not satisfied for clusters: {unsatisfied:?}"
        )))
    }

    async fn ensure_host_tags(&self, host: &str, op_id: &str) -> Result<(), MaintenanceError> {
        ensure_and_assign(self.inventory.as_ref(), tags::HOST_MAINT, host).await?;
        ensure_and_assign(self.inventory.as_ref(), tags::HOST_NOSCHED, host).await?;
        ensure_and_assign(self.inventory.as_ref(), &tags::build_op_tag(op_id), host).await?;
        Ok(())
    }

    async fn clear_and_complete(
        &self,
        host: &str,
        op_id: &str,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        self.inventory
            .unassign_tag(&tags::build_op_tag(op_id), host)
            .await?;
        self.inventory.unassign_tag(tags::HOST_NOSCHED, host).await?;
        self.inventory.unassign_tag(tags::HOST_MAINT, host).await?;
        self.machine_records.remove_finalizer(host).await?;
        self.store.complete().await?;
        Ok(ReconcileOutcome::transition("Completed"))
    }

    async fn handle_policy_timeout(
        &self,
        host: &str,
        session: &maintenance_model::session::HmcSession,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        match self.config.force_policy {
            ForcePolicy::Halt => {
                tracing::warn!(
                    event = "EvacuationBlocked",
                    host = %host,
                    op_id = %session.op_id,
                    clusters = ?session.affected_clusters,
                    pending = ?session.pending_replacements,
                    "per-host wave timeout exceeded, aborting session for operator intervention"
                );
                self.store.abort().await?;
                Ok(ReconcileOutcome::wait(
                    "policy timeout exceeded under halt policy; tags left for operator",
                ))
            }
            ForcePolicy::Force => {
                tracing::warn!(
                    host = %host,
                    op_id = %session.op_id,
                    "force policy: clearing host tags despite unsatisfied gates"
                );
                self.clear_and_complete(host, &session.op_id).await
            }
            ForcePolicy::Relax => {
                tracing::warn!(
                    host = %host,
                    op_id = %session.op_id,
                    "relax policy: removing HOST_OP only, leaving HOST_MAINT/HOST_NOSCHED for the operator"
                );
                self.inventory
                    .unassign_tag(&tags::build_op_tag(&session.op_id), host)
                    .await?;
                self.store.complete().await?;
                Ok(ReconcileOutcome::transition("Completed"))
            }
        }
    }

    /// Stale-tag garbage collection (spec §4.3, §8 invariant 6): removes an
    /// orphaned `HOST_OP:*` tag whose `opID` does not belong to the current
    /// active session, and — if the host is also empty of VMs — the
    /// `HOST_MAINT`/`HOST_NOSCHED` tags too.
    pub async fn reconcile_stale_tags(
        &self,
        host_system_id: &str,
    ) -> Result<ReconcileOutcome, MaintenanceError> {
        let host = self.inventory.get_machine(host_system_id).await?;
        let Some(op_id) = tags::host_maintenance_op_id(&host.tags) else {
            return Ok(ReconcileOutcome::DoNothing);
        };

        let (session, present) = self.store.load().await?;
        let belongs_to_active_session = present && session.is_active() && session.op_id == op_id;
        if belongs_to_active_session {
            return Ok(ReconcileOutcome::DoNothing);
        }

        tracing::warn!(
            event = "ProtocolViolation",
            host = %host_system_id,
            op_id = %op_id,
            "garbage collecting orphaned HOST_OP tag with no matching active session"
        );
        self.inventory
            .unassign_tag(&tags::build_op_tag(op_id), host_system_id)
            .await?;

        let vms = self.inventory.list_vms(host_system_id).await?;
        if vms.is_empty() {
            self.inventory
                .unassign_tag(tags::HOST_NOSCHED, host_system_id)
                .await?;
            self.inventory
                .unassign_tag(tags::HOST_MAINT, host_system_id)
                .await?;
        }
        Ok(ReconcileOutcome::transition("Completed"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use maintenance_inventory::BmaasInventory;
    use maintenance_inventory::mock::MockInventory;
    use maintenance_model::config::ForcePolicy;
    use maintenance_model::session::HmcSessionStatus;
    use maintenance_model::{Machine, PowerState};
    use maintenance_session::InMemoryConfigMapBackend;

    use super::*;
    use crate::host_machine::MockHostMachineRecords;

    fn machine(system_id: &str, parent: Option<&str>, tags: &[&str]) -> Machine {
        Machine {
            system_id: system_id.to_string(),
            hostname: format!("{system_id}.example"),
            parent: parent.map(str::to_string),
            zone: "zone-a".to_string(),
            resource_pool: "pool-a".to_string(),
            power_state: PowerState::On,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn config(per_host_wave_timeout: Duration) -> HmcConfig {
        HmcConfig {
            per_host_wave_timeout,
            ..Default::default()
        }
    }

    fn reconciler_with(
        inventory: Arc<MockInventory>,
        machine_records: MockHostMachineRecords,
        config: HmcConfig,
    ) -> HostDrainReconciler<InMemoryConfigMapBackend> {
        let store = HmcSessionStore::new(InMemoryConfigMapBackend::new(), "ns", "hmc-session");
        HostDrainReconciler::new(inventory, Arc::new(machine_records), store, config)
    }

    #[tokio::test]
    async fn s1_tags_host_and_waits_for_the_gate() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
            machine("v2", Some("h1"), &[]),
        ]));
        let machine_records = MockHostMachineRecords::new();
        let reconciler =
            reconciler_with(inventory.clone(), machine_records, config(Duration::from_secs(3600)));

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Wait { .. }));

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(host.has_tag(tags::HOST_MAINT));
        assert!(host.has_tag(tags::HOST_NOSCHED));
        assert!(tags::host_maintenance_op_id(&host.tags).is_some());
    }

    #[tokio::test]
    async fn s1_completes_once_the_replacement_vm_is_ready() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
        ]));
        let mut machine_records = MockHostMachineRecords::new();
        machine_records
            .expect_remove_finalizer()
            .times(1)
            .returning(|_| Ok(()));
        let reconciler =
            reconciler_with(inventory.clone(), machine_records, config(Duration::from_secs(3600)));

        let first = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(first, ReconcileOutcome::Wait { .. }));

        let host = inventory.get_machine("h1").await.unwrap();
        let op_id = tags::host_maintenance_op_id(&host.tags).unwrap().to_string();

        // The replacement VM lands on a different host, carrying the gate
        // tags the original drain's opID is waiting on.
        let ready = machine(
            "v3",
            Some("h2"),
            &["VM_CP", "VM_CLUSTER:a", &tags::build_ready_op_tag(&op_id)],
        );
        inventory.insert(ready).await;

        let second = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(second, ReconcileOutcome::transition("Completed"));

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(!host.has_tag(tags::HOST_MAINT));
        assert!(!host.has_tag(tags::HOST_NOSCHED));
        assert!(tags::host_maintenance_op_id(&host.tags).is_none());
    }

    #[tokio::test]
    async fn s2_empty_host_completes_without_gating() {
        let inventory = Arc::new(MockInventory::new([machine("h1", None, &[])]));
        let mut machine_records = MockHostMachineRecords::new();
        machine_records
            .expect_remove_finalizer()
            .times(1)
            .returning(|_| Ok(()));
        let reconciler =
            reconciler_with(inventory, machine_records, config(Duration::from_secs(3600)));

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::transition("Completed"));
    }

    #[tokio::test]
    async fn s3_requires_every_affected_cluster_to_clear() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
            machine("v2", Some("h1"), &["VM_CP", "VM_CLUSTER:b"]),
        ]));
        let machine_records = MockHostMachineRecords::new();
        let reconciler =
            reconciler_with(inventory.clone(), machine_records, config(Duration::from_secs(3600)));

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Wait { .. }));

        let host = inventory.get_machine("h1").await.unwrap();
        let op_id = tags::host_maintenance_op_id(&host.tags).unwrap().to_string();

        // Only cluster `a` gets its replacement; `b` is still pending.
        let ready_a = machine(
            "v3",
            Some("h2"),
            &["VM_CP", "VM_CLUSTER:a", &tags::build_ready_op_tag(&op_id)],
        );
        inventory.insert(ready_a).await;

        let still_waiting = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        match still_waiting {
            ReconcileOutcome::Wait { reason } => assert!(reason.contains('b')),
            other => panic!("expected Wait, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn s4_garbage_collects_an_orphan_host_op_tag() {
        let inventory = Arc::new(MockInventory::new([machine(
            "h1",
            None,
            &["HOST_OP:stale-123", "HOST_NOSCHED", "HOST_MAINT"],
        )]));
        let machine_records = MockHostMachineRecords::new();
        let reconciler =
            reconciler_with(inventory.clone(), machine_records, config(Duration::from_secs(3600)));

        let outcome = reconciler.reconcile_stale_tags("h1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::transition("Completed"));

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(host.tags.is_empty());
    }

    #[tokio::test]
    async fn s4_leaves_tags_belonging_to_the_active_session() {
        let inventory = Arc::new(MockInventory::new([machine("h1", None, &[])]));
        let machine_records = MockHostMachineRecords::new();
        let reconciler =
            reconciler_with(inventory.clone(), machine_records, config(Duration::from_secs(3600)));

        let session = reconciler.store.start_if_none_active("h1").await.unwrap();
        let op_tag = tags::build_op_tag(&session.op_id);
        inventory.assign_tag(&op_tag, "h1").await.unwrap();
        inventory.assign_tag(tags::HOST_NOSCHED, "h1").await.unwrap();
        inventory.assign_tag(tags::HOST_MAINT, "h1").await.unwrap();

        let outcome = reconciler.reconcile_stale_tags("h1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::DoNothing);

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(host.has_tag(&op_tag));
    }

    #[tokio::test]
    async fn s5_halt_policy_aborts_without_clearing_tags() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
        ]));
        let machine_records = MockHostMachineRecords::new();
        let mut cfg = config(Duration::ZERO);
        cfg.force_policy = ForcePolicy::Halt;
        let reconciler = reconciler_with(inventory, machine_records, cfg);

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Wait { .. }));

        let (session, present) = reconciler.store.load().await.unwrap();
        assert!(present);
        assert_eq!(session.status, HmcSessionStatus::Aborted);
    }

    #[tokio::test]
    async fn force_policy_clears_tags_despite_unsatisfied_gate() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
        ]));
        let mut machine_records = MockHostMachineRecords::new();
        machine_records
            .expect_remove_finalizer()
            .times(1)
            .returning(|_| Ok(()));
        let mut cfg = config(Duration::ZERO);
        cfg.force_policy = ForcePolicy::Force;
        let reconciler = reconciler_with(inventory.clone(), machine_records, cfg);

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::transition("Completed"));

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(!host.has_tag(tags::HOST_MAINT));
    }

    #[tokio::test]
    async fn relax_policy_removes_only_host_op() {
        let inventory = Arc::new(MockInventory::new([
            machine("h1", None, &[]),
            machine("v1", Some("h1"), &["VM_CP", "VM_CLUSTER:a"]),
        ]));
        let machine_records = MockHostMachineRecords::new();
        let mut cfg = config(Duration::ZERO);
        cfg.force_policy = ForcePolicy::Relax;
        let reconciler = reconciler_with(inventory.clone(), machine_records, cfg);

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::OperatorRequested {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::transition("Completed"));

        let host = inventory.get_machine("h1").await.unwrap();
        assert!(tags::host_maintenance_op_id(&host.tags).is_none());
    }

    #[tokio::test]
    async fn machine_deletion_trigger_adds_the_evacuation_finalizer() {
        let inventory = Arc::new(MockInventory::new([machine("h1", None, &[])]));
        let mut machine_records = MockHostMachineRecords::new();
        machine_records
            .expect_add_finalizer()
            .times(1)
            .returning(|_| Ok(()));
        machine_records
            .expect_remove_finalizer()
            .times(1)
            .returning(|_| Ok(()));
        let reconciler =
            reconciler_with(inventory, machine_records, config(Duration::from_secs(3600)));

        let outcome = reconciler
            .reconcile_drain(DrainTrigger::MachineDeletion {
                host_system_id: "h1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::transition("Completed"));
    }
}
