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

use std::collections::HashMap;

use async_trait::async_trait;
use maintenance_model::MaintenanceError;
use maintenance_model::infra::{InfraCluster, InfraMachine};
use tokio::sync::Mutex;

use crate::cluster_records::ClusterRecords;

/// An in-memory control-plane records fake for tests, built the same way
/// `maintenance_inventory::mock::MockInventory` fakes the BMaaS inventory:
/// seeded state mutated directly by test code across reconcile calls, rather
/// than a sequence of scripted mockall expectations.
pub struct FakeClusterRecords {
    cluster: Mutex<InfraCluster>,
    members: Mutex<HashMap<String, InfraMachine>>,
    ready: Mutex<HashMap<String, bool>>,
}

impl FakeClusterRecords {
    pub fn new(cluster: InfraCluster, members: impl IntoIterator<Item = InfraMachine>) -> Self {
        Self {
            cluster: Mutex::new(cluster),
            members: Mutex::new(members.into_iter().map(|m| (m.name.clone(), m)).collect()),
            ready: Mutex::new(HashMap::new()),
        }
    }

    pub async fn set_unstable(&self) {
        let mut cluster = self.cluster.lock().await;
        cluster.ready_replicas = cluster.replicas.saturating_sub(1);
    }

    pub async fn mark_ready(&self, vm_system_id: &str) {
        self.ready.lock().await.insert(vm_system_id.to_string(), true);
    }
}

#[async_trait]
impl ClusterRecords for FakeClusterRecords {
    async fn cluster(&self, _cluster_id: &str) -> Result<InfraCluster, MaintenanceError> {
        Ok(self.cluster.lock().await.clone())
    }

    async fn list_control_plane_machines(
        &self,
        _cluster_id: &str,
    ) -> Result<Vec<InfraMachine>, MaintenanceError> {
        Ok(self.members.lock().await.values().cloned().collect())
    }

    async fn delete_control_plane_machine(
        &self,
        _cluster_id: &str,
        name: &str,
    ) -> Result<(), MaintenanceError> {
        self.members.lock().await.remove(name);
        Ok(())
    }

    async fn new_member_is_ready(
        &self,
        _cluster_id: &str,
        vm_system_id: &str,
    ) -> Result<bool, MaintenanceError> {
        Ok(*self.ready.lock().await.get(vm_system_id).unwrap_or(&false))
    }
}
