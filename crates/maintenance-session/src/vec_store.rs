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

use chrono::Utc;
use maintenance_model::MaintenanceError;
use maintenance_model::session::{VecSession, VecSessionStatus};

use crate::backend::ConfigMapBackend;
use crate::codec::{merge_vec_session_into_fields, vec_session_from_fields};

/// Session Store for a single workload cluster's VM Evacuation Controller.
/// A VEC processes at most one `opID` at a time (spec §4.4 concurrency
/// rule), so — like the HMC store — this is a single-slot record per
/// ConfigMap, re-read on every call.
pub struct VecSessionStore<B: ConfigMapBackend> {
    backend: B,
    namespace: String,
    name: String,
}

impl<B: ConfigMapBackend> VecSessionStore<B> {
    pub fn new(backend: B, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub async fn load(&self) -> Result<(VecSession, bool), MaintenanceError> {
        match self.backend.load(&self.namespace, &self.name).await? {
            None => Ok((VecSession::default(), false)),
            Some(fields) => Ok((vec_session_from_fields(&fields), true)),
        }
    }

    async fn save(&self, session: &VecSession) -> Result<(), MaintenanceError> {
        let mut fields = self
            .backend
            .load(&self.namespace, &self.name)
            .await?
            .unwrap_or_default();
        merge_vec_session_into_fields(session, &mut fields);
        self.backend.save(&self.namespace, &self.name, fields).await
    }

    /// Opens a fresh `InProgress` record for `op_id`/`host_system_id` if no
    /// record exists for this `op_id`. If an `InProgress` record already
    /// exists for the *same* `op_id`, returns it unchanged. If it exists for
    /// a *different* `op_id`, returns it unchanged so the caller can defer
    /// (spec §4.4 step 3: "If an `InProgress` session exists for a different
    /// `opID`, defer").
    pub async fn start_or_get(
        &self,
        op_id: &str,
        host_system_id: &str,
    ) -> Result<VecSession, MaintenanceError> {
        let (existing, present) = self.load().await?;
        if present && existing.is_in_progress() {
            return Ok(existing);
        }
        if present && existing.op_id == op_id {
            // A prior session for this opID completed; re-observing the same
            // opID restarts at step 1, per spec §8 boundary behaviour.
        }

        let session = VecSession {
            op_id: op_id.to_string(),
            host_system_id: host_system_id.to_string(),
            status: VecSessionStatus::InProgress,
            started_at: Some(Utc::now()),
            new_vm_system_id: None,
        };
        self.save(&session).await?;
        Ok(session)
    }

    pub async fn save_progress(&self, session: &VecSession) -> Result<(), MaintenanceError> {
        self.save(session).await
    }

    /// Marks the session `Completed`, recording the replacement VM's system
    /// ID.
    pub async fn complete(&self, new_vm_system_id: &str) -> Result<(), MaintenanceError> {
        let (mut session, _) = self.load().await?;
        session.status = VecSessionStatus::Completed;
        session.new_vm_system_id = Some(new_vm_system_id.to_string());
        self.save(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_backend::InMemoryConfigMapBackend;

    fn store() -> VecSessionStore<InMemoryConfigMapBackend> {
        VecSessionStore::new(InMemoryConfigMapBackend::new(), "tenant-a", "vec-session")
    }

    #[tokio::test]
    async fn start_or_get_opens_a_fresh_in_progress_session() {
        let store = store();
        let session = store.start_or_get("op-1", "h1").await.unwrap();
        assert!(session.is_in_progress());
        assert_eq!(session.host_system_id, "h1");
    }

    #[tokio::test]
    async fn start_or_get_is_idempotent_for_the_same_op_id() {
        let store = store();
        let first = store.start_or_get("op-1", "h1").await.unwrap();
        let second = store.start_or_get("op-1", "h1").await.unwrap();
        assert_eq!(first.op_id, second.op_id);
    }

    #[tokio::test]
    async fn a_different_in_progress_op_id_is_returned_unchanged_for_the_caller_to_defer() {
        let store = store();
        store.start_or_get("op-1", "h1").await.unwrap();
        let returned = store.start_or_get("op-2", "h2").await.unwrap();
        assert_eq!(returned.op_id, "op-1");
    }

    #[tokio::test]
    async fn complete_records_new_vm_and_a_fresh_op_id_can_restart() {
        let store = store();
        store.start_or_get("op-1", "h1").await.unwrap();
        store.complete("vm-9").await.unwrap();
        let (state, _) = store.load().await.unwrap();
        assert_eq!(state.status, VecSessionStatus::Completed);
        assert_eq!(state.new_vm_system_id.as_deref(), Some("vm-9"));

        let next = store.start_or_get("op-2", "h2").await.unwrap();
        assert!(next.is_in_progress());
        assert_eq!(next.op_id, "op-2");
    }
}
