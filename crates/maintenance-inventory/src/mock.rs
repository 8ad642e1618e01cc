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

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use maintenance_model::{Machine, MaintenanceError};
use tokio::sync::Mutex;

use crate::BmaasInventory;

/// An in-memory BMaaS inventory for tests. Machines are seeded up front;
/// tag catalogue membership is tracked so `ensure_tag_exists` is faithfully
/// idempotent the way the real inventory's tag catalogue would be.
#[derive(Default)]
pub struct MockInventory {
    machines: Mutex<HashMap<String, Machine>>,
    tag_catalogue: Mutex<BTreeSet<String>>,
}

impl MockInventory {
    pub fn new(machines: impl IntoIterator<Item = Machine>) -> Self {
        let machines = machines
            .into_iter()
            .map(|m| (m.system_id.clone(), m))
            .collect();
        Self {
            machines: Mutex::new(machines),
            tag_catalogue: Mutex::new(BTreeSet::new()),
        }
    }

    pub async fn insert(&self, machine: Machine) {
        self.machines
            .lock()
            .await
            .insert(machine.system_id.clone(), machine);
    }

    pub async fn snapshot(&self, system_id: &str) -> Option<Machine> {
        self.machines.lock().await.get(system_id).cloned()
    }
}

#[async_trait]
impl BmaasInventory for MockInventory {
    async fn list_machines(
        &self,
        filter_tag: Option<&str>,
    ) -> Result<Vec<Machine>, MaintenanceError> {
        let machines = self.machines.lock().await;
        Ok(machines
            .values()
            .filter(|m| filter_tag.is_none_or(|tag| m.has_tag(tag)))
            .cloned()
            .collect())
    }

    async fn get_machine(&self, system_id: &str) -> Result<Machine, MaintenanceError> {
        self.machines
            .lock()
            .await
            .get(system_id)
            .cloned()
            .ok_or_else(|| MaintenanceError::InventoryNotFound(system_id.to_string()))
    }

    async fn list_vms(&self, host_system_id: &str) -> Result<Vec<Machine>, MaintenanceError> {
        let machines = self.machines.lock().await;
        Ok(machines
            .values()
            .filter(|m| m.parent.as_deref() == Some(host_system_id))
            .cloned()
            .collect())
    }

    async fn ensure_tag_exists(&self, tag: &str) -> Result<(), MaintenanceError> {
        self.tag_catalogue.lock().await.insert(tag.to_string());
        Ok(())
    }

    async fn assign_tag(&self, tag: &str, system_id: &str) -> Result<(), MaintenanceError> {
        let mut machines = self.machines.lock().await;
        let machine = machines
            .get_mut(system_id)
            .ok_or_else(|| MaintenanceError::InventoryNotFound(system_id.to_string()))?;
        if !machine.tags.iter().any(|t| t == tag) {
            machine.tags.push(tag.to_string());
        }
        Ok(())
    }

    async fn unassign_tag(&self, tag: &str, system_id: &str) -> Result<(), MaintenanceError> {
        let mut machines = self.machines.lock().await;
        if let Some(machine) = machines.get_mut(system_id) {
            machine.tags.retain(|t| t != tag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use maintenance_model::PowerState;

    use super::*;

    fn host(id: &str, tags: &[&str]) -> Machine {
        Machine {
            system_id: id.to_string(),
            hostname: format!("{id}.example"),
            parent: None,
            zone: "zone-a".to_string(),
            resource_pool: "pool-a".to_string(),
            power_state: PowerState::On,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn assign_is_idempotent() {
        let inv = MockInventory::new([host("h1", &[])]);
        inv.assign_tag("HOST_MAINT", "h1").await.unwrap();
        inv.assign_tag("HOST_MAINT", "h1").await.unwrap();
        let m = inv.get_machine("h1").await.unwrap();
        assert_eq!(m.tags, vec!["HOST_MAINT".to_string()]);
    }

    #[tokio::test]
    async fn unassign_absent_tag_is_success() {
        let inv = MockInventory::new([host("h1", &[])]);
        inv.unassign_tag("HOST_MAINT", "h1").await.unwrap();
    }

    #[tokio::test]
    async fn unassign_unknown_machine_is_success() {
        let inv = MockInventory::new([]);
        inv.unassign_tag("HOST_MAINT", "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_machine_is_not_found() {
        let inv = MockInventory::new([]);
        let err = inv.get_machine("ghost").await.unwrap_err();
        assert!(!err.retryable());
    }

    #[tokio::test]
    async fn list_vms_filters_by_parent() {
        let mut vm1 = host("vm1", &[]);
        vm1.parent = Some("h1".to_string());
        let mut vm2 = host("vm2", &[]);
        vm2.parent = Some("h2".to_string());
        let inv = MockInventory::new([host("h1", &[]), vm1, vm2]);
        let vms = inv.list_vms("h1").await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].system_id, "vm1");
    }
}
