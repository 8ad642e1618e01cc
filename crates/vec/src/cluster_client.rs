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

//! The InfraCluster/InfraMachine CRDs, their schemas, webhooks, and the
//! workload-level controller that reschedules a deleted control-plane member
//! are deliberately out of scope (spec §1): this adapter exists only as the
//! wiring seam for [`vec_core::ClusterRecords`] in a real deployment.

use async_trait::async_trait;
use maintenance_model::MaintenanceError;
use maintenance_model::infra::{InfraCluster, InfraMachine};
use vec_core::ClusterRecords;

pub struct KubeClusterRecords {
    #[allow(dead_code)]
    client: kube::Client,
}

impl KubeClusterRecords {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

fn not_implemented() -> MaintenanceError {
    MaintenanceError::InventoryTransient(
        "InfraCluster/InfraMachine CRD client is collaborator-owned and not vendored here"
            .to_string(),
    )
}

#[async_trait]
impl ClusterRecords for KubeClusterRecords {
    async fn cluster(&self, _cluster_id: &str) -> Result<InfraCluster, MaintenanceError> {
        Err(not_implemented())
    }

    async fn list_control_plane_machines(
        &self,
        _cluster_id: &str,
    ) -> Result<Vec<InfraMachine>, MaintenanceError> {
        Err(not_implemented())
    }

    async fn delete_control_plane_machine(
        &self,
        _cluster_id: &str,
        _name: &str,
    ) -> Result<(), MaintenanceError> {
        Err(not_implemented())
    }

    async fn new_member_is_ready(
        &self,
        _cluster_id: &str,
        _vm_system_id: &str,
    ) -> Result<bool, MaintenanceError> {
        Err(not_implemented())
    }
}
