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

//! Port onto the collaborator-owned external machine record for a Host
//! (spec §4.5): the only thing HMC does to it is add/remove the evacuation
//! finalizer. The record's CRD, webhooks, and the machine controller that
//! allocates/releases the underlying physical machine are out of scope
//! (spec §1).

use async_trait::async_trait;
use maintenance_model::MaintenanceError;
use maintenance_model::infra::InfraMachine;
use mockall::automock;

#[automock]
#[async_trait]
pub trait HostMachineRecords: Send + Sync {
    async fn get(&self, host_system_id: &str) -> Result<Option<InfraMachine>, MaintenanceError>;
    async fn add_finalizer(&self, host_system_id: &str) -> Result<(), MaintenanceError>;
    async fn remove_finalizer(&self, host_system_id: &str) -> Result<(), MaintenanceError>;
}
