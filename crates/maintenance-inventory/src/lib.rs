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

//! The BMaaS inventory contract (spec §6) and an in-memory mock
//! implementation for tests, built the way `crates/bmc-mock` builds a fake
//! Redfish BMC: a plain in-memory store driven directly by test code.

pub mod mock;

use async_trait::async_trait;
use maintenance_model::{Machine, MaintenanceError};
use mockall::automock;

/// `ListMachines`/`GetMachine`/`Tags.EnsureExists`/`Tags.Assign`/
/// `Tags.Unassign`/`VMHosts.ListVMs` from spec §6, collapsed into one trait
/// boundary. All tag operations are idempotent.
#[automock]
#[async_trait]
pub trait BmaasInventory: Send + Sync {
    /// Lists machines carrying `filter_tag`, or every machine when `None`.
    async fn list_machines(&self, filter_tag: Option<&str>) -> Result<Vec<Machine>, MaintenanceError>;

    async fn get_machine(&self, system_id: &str) -> Result<Machine, MaintenanceError>;

    /// VMs whose parent is `host_system_id`.
    async fn list_vms(&self, host_system_id: &str) -> Result<Vec<Machine>, MaintenanceError>;

    /// Ensures `tag` exists in the inventory's tag catalogue. Idempotent.
    async fn ensure_tag_exists(&self, tag: &str) -> Result<(), MaintenanceError>;

    /// Assigns `tag` to `system_id`. Idempotent: assigning an already-present
    /// tag is a no-op success.
    async fn assign_tag(&self, tag: &str, system_id: &str) -> Result<(), MaintenanceError>;

    /// Unassigns `tag` from `system_id`. Idempotent: unassigning an absent
    /// tag is a success.
    async fn unassign_tag(&self, tag: &str, system_id: &str) -> Result<(), MaintenanceError>;
}

/// Ensures `tag` exists and is assigned to `system_id` in one call, per the
/// `Ensure` semantics of spec §4.2 ("`Ensure` ensures both creation in the
/// inventory's tag catalogue and assignment to the target").
pub async fn ensure_and_assign(
    inventory: &dyn BmaasInventory,
    tag: &str,
    system_id: &str,
) -> Result<(), MaintenanceError> {
    inventory.ensure_tag_exists(tag).await?;
    inventory.assign_tag(tag, system_id).await
}
