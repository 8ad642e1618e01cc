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

//! View structs over the two collaborator-owned desired-state kinds named in
//! spec §6. The core never owns these objects' schema, defaulting, or
//! validation (that lives in webhooks out of scope here) — it only reads and
//! writes the fields named below.

use chrono::{DateTime, Utc};

/// `spec.failureDomains[]`, `spec.controlPlaneEndpoint`, `status.ready`,
/// `status.conditions[]`, plus the control-plane replica counts VEC must
/// check for stability before evacuating a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraCluster {
    pub name: String,
    pub replicas: u32,
    pub ready_replicas: u32,
    pub updated_replicas: u32,
    pub paused: bool,
}

impl InfraCluster {
    /// spec §4.4 step 4: "replica counts on the spec match all of
    /// `readyReplicas`, `updatedReplicas`, and `replicas`, and it is not
    /// paused".
    pub fn is_stable(&self) -> bool {
        !self.paused
            && self.ready_replicas == self.replicas
            && self.updated_replicas == self.replicas
    }
}

/// `spec.systemID`, `spec.providerID`, `spec.parent`, `metadata.finalizers`,
/// `metadata.deletionTimestamp`, plus the status fields the reconcilers
/// observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraMachine {
    pub name: String,
    pub provider_id: Option<String>,
    pub system_id: Option<String>,
    pub parent: Option<String>,
    pub ready: bool,
    pub finalizers: Vec<String>,
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

pub const EVACUATION_FINALIZER: &str = "maintenance.carbide.example.com/evacuation";

impl InfraMachine {
    pub fn is_pending_deletion(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn has_evacuation_finalizer(&self) -> bool {
        self.finalizers.iter().any(|f| f == EVACUATION_FINALIZER)
    }

    pub fn add_evacuation_finalizer(&mut self) {
        if !self.has_evacuation_finalizer() {
            self.finalizers.push(EVACUATION_FINALIZER.to_string());
        }
    }

    pub fn remove_evacuation_finalizer(&mut self) {
        self.finalizers.retain(|f| f != EVACUATION_FINALIZER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_requires_all_replica_counts_equal_and_unpaused() {
        let stable = InfraCluster {
            name: "c".into(),
            replicas: 3,
            ready_replicas: 3,
            updated_replicas: 3,
            paused: false,
        };
        assert!(stable.is_stable());

        let mut unready = stable.clone();
        unready.ready_replicas = 2;
        assert!(!unready.is_stable());

        let mut paused = stable.clone();
        paused.paused = true;
        assert!(!paused.is_stable());
    }

    #[test]
    fn finalizer_add_remove_is_idempotent() {
        let mut m = InfraMachine {
            name: "h1".into(),
            provider_id: None,
            system_id: None,
            parent: None,
            ready: true,
            finalizers: vec![],
            deletion_timestamp: None,
        };
        m.add_evacuation_finalizer();
        m.add_evacuation_finalizer();
        assert_eq!(m.finalizers.len(), 1);
        m.remove_evacuation_finalizer();
        m.remove_evacuation_finalizer();
        assert!(m.finalizers.is_empty());
    }
}
