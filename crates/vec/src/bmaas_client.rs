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

//! The BMaaS HTTP client (OAuth1 signing, JSON marshalling) is deliberately
//! out of scope here: it's an opaque, collaborator-owned service shared with
//! HMC and consumed through the [`maintenance_inventory::BmaasInventory`]
//! contract. This is the seam a deployment wires a real client into.

use async_trait::async_trait;
use maintenance_inventory::BmaasInventory;
use maintenance_model::{Machine, MaintenanceError};

pub struct BmaasHttpInventory {
    base_url: String,
}

impl BmaasHttpInventory {
    pub fn from_env() -> eyre::Result<Self> {
        let base_url = std::env::var("BMAAS_API_BASE_URL")
            .map_err(|_| eyre::eyre!("BMAAS_API_BASE_URL must be set"))?;
        Ok(Self { base_url })
    }
}

fn not_implemented(base_url: &str) -> MaintenanceError {
    MaintenanceError::InventoryTransient(format!(
        "BMaaS HTTP client against {base_url} is collaborator-owned and not vendored here"
    ))
}

#[async_trait]
impl BmaasInventory for BmaasHttpInventory {
    async fn list_machines(
        &self,
        _filter_tag: Option<&str>,
    ) -> Result<Vec<Machine>, MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }

    async fn get_machine(&self, _system_id: &str) -> Result<Machine, MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }

    async fn list_vms(&self, _host_system_id: &str) -> Result<Vec<Machine>, MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }

    async fn ensure_tag_exists(&self, _tag: &str) -> Result<(), MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }

    async fn assign_tag(&self, _tag: &str, _system_id: &str) -> Result<(), MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }

    async fn unassign_tag(&self, _tag: &str, _system_id: &str) -> Result<(), MaintenanceError> {
        Err(not_implemented(&self.base_url))
    }
}
