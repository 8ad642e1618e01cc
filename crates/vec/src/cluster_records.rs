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

//! Port onto the collaborator-owned control-plane desired-state records VEC
//! reads and mutates (spec §4.4, §6): the `InfraCluster` stability signal and
//! the `InfraMachine` members that resolve to control-plane VMs. Their CRD
//! schema, webhooks, and the workload-level controller that reschedules a
//! deleted member onto a fresh host are out of scope (spec §1).

use async_trait::async_trait;
use maintenance_model::MaintenanceError;
use maintenance_model::infra::{InfraCluster, InfraMachine};
use mockall::automock;

#[automock]
#[async_trait]
pub trait ClusterRecords: Send + Sync {
    async fn cluster(&self, cluster_id: &str) -> Result<InfraCluster, MaintenanceError>;

    /// The cluster's control-plane desired-state records.
    async fn list_control_plane_machines(
        &self,
        cluster_id: &str,
    ) -> Result<Vec<InfraMachine>, MaintenanceError>;

    async fn delete_control_plane_machine(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<(), MaintenanceError>;

    /// Collapses the three readiness checks from spec §4.4 step 6 (desired
    /// replica count matches status counts, the node object is `Ready`, the
    /// control-plane health endpoint responds) into one boundary call.
    async fn new_member_is_ready(
        &self,
        cluster_id: &str,
        vm_system_id: &str,
    ) -> Result<bool, MaintenanceError>;
}
