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

//! The InfraMachine CRD, its schema, and its validating/defaulting webhooks
//! are deliberately out of scope (spec §1): this adapter exists only as the
//! wiring seam for [`hmc::HostMachineRecords`] in a real deployment.

use async_trait::async_trait;
use hmc::HostMachineRecords;
use maintenance_model::MaintenanceError;
use maintenance_model::infra::InfraMachine;

pub struct KubeMachineRecords {
    #[allow(dead_code)]
    client: kube::Client,
}

impl KubeMachineRecords {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

fn not_implemented() -> MaintenanceError {
    MaintenanceError::InventoryTransient(
        "InfraMachine CRD client is collaborator-owned and not vendored here".to_string(),
    )
}

#[async_trait]
impl HostMachineRecords for KubeMachineRecords {
    async fn get(&self, _host_system_id: &str) -> Result<Option<InfraMachine>, MaintenanceError> {
        Err(not_implemented())
    }

    async fn add_finalizer(&self, _host_system_id: &str) -> Result<(), MaintenanceError> {
        Err(not_implemented())
    }

    async fn remove_finalizer(&self, _host_system_id: &str) -> Result<(), MaintenanceError> {
        Err(not_implemented())
    }
}
