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
use maintenance_model::session::{HmcSession, HmcSessionStatus};

use crate::backend::ConfigMapBackend;
use crate::codec::{hmc_session_from_fields, merge_hmc_session_into_fields};

/// Session Store for the Host Maintenance Controller (spec §4.1). Never
/// caches session state across calls: every method re-reads the backend on
/// entry so the store stays convergent with operator edits to the
/// ConfigMap.
pub struct HmcSessionStore<B: ConfigMapBackend> {
    backend: B,
    namespace: String,
    name: String,
}

impl<B: ConfigMapBackend> HmcSessionStore<B> {
    pub fn new(backend: B, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns `(state, present)`. A missing ConfigMap yields a zero state
    /// and `present = false`, never an error.
    pub async fn load(&self) -> Result<(HmcSession, bool), MaintenanceError> {
        match self.backend.load(&self.namespace, &self.name).await? {
            None => Ok((HmcSession::default(), false)),
            Some(fields) => Ok((hmc_session_from_fields(&fields), true)),
        }
    }

    async fn save(&self, session: &HmcSession) -> Result<(), MaintenanceError> {
        let mut fields = self
            .backend
            .load(&self.namespace, &self.name)
            .await?
            .unwrap_or_default();
        merge_hmc_session_into_fields(session, &mut fields);
        self.backend.save(&self.namespace, &self.name, fields).await
    }

    /// If no record exists or `status != Active`, opens a fresh session for
    /// `host`. If an `Active` record exists for the same host, returns it
    /// unchanged (idempotent). If `Active` for a *different* host, returns
    /// the existing record without overwriting — the caller (HMC reconciler)
    /// must resolve that conflict, typically by requeueing with backoff.
    pub async fn start_if_none_active(&self, host: &str) -> Result<HmcSession, MaintenanceError> {
        let (existing, present) = self.load().await?;
        if present && existing.is_active() {
            return Ok(existing);
        }

        let session = HmcSession {
            op_id: uuid::Uuid::new_v4().to_string(),
            status: HmcSessionStatus::Active,
            started_at: Some(Utc::now()),
            current_host: host.to_string(),
            active_sessions_count: 1,
            ..Default::default()
        };
        self.save(&session).await?;
        Ok(session)
    }

    /// Persists an in-progress update to the active session (e.g. newly
    /// discovered `affectedClusters`/`pendingReplacements`) without changing
    /// its status.
    pub async fn save_progress(&self, session: &HmcSession) -> Result<(), MaintenanceError> {
        self.save(session).await
    }

    async fn close(&self, status: HmcSessionStatus) -> Result<(), MaintenanceError> {
        let (mut session, _) = self.load().await?;
        session.status = status;
        session.current_host.clear();
        session.active_sessions_count = 0;
        session.affected_clusters.clear();
        session.pending_replacements.clear();
        self.save(&session).await
    }

    pub async fn complete(&self) -> Result<(), MaintenanceError> {
        self.close(HmcSessionStatus::Completed).await
    }

    /// Used when a policy timeout is exceeded under the halt policy.
    pub async fn abort(&self) -> Result<(), MaintenanceError> {
        self.close(HmcSessionStatus::Aborted).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_backend::InMemoryConfigMapBackend;

    fn store() -> HmcSessionStore<InMemoryConfigMapBackend> {
        HmcSessionStore::new(InMemoryConfigMapBackend::new(), "ns", "hmc-session")
    }

    #[tokio::test]
    async fn load_of_absent_record_is_zero_state_not_error() {
        let (state, present) = store().load().await.unwrap();
        assert!(!present);
        assert!(!state.is_active());
    }

    #[tokio::test]
    async fn start_if_none_active_opens_a_fresh_session() {
        let store = store();
        let session = store.start_if_none_active("h1").await.unwrap();
        assert!(session.is_active());
        assert_eq!(session.current_host, "h1");
        assert!(!session.op_id.is_empty());
        assert!(session.upholds_active_invariant());
    }

    #[tokio::test]
    async fn start_if_none_active_is_idempotent_for_same_host() {
        let store = store();
        let first = store.start_if_none_active("h1").await.unwrap();
        let second = store.start_if_none_active("h1").await.unwrap();
        assert_eq!(first.op_id, second.op_id);
    }

    #[tokio::test]
    async fn start_if_none_active_does_not_overwrite_a_different_host() {
        let store = store();
        let first = store.start_if_none_active("h1").await.unwrap();
        let returned = store.start_if_none_active("h2").await.unwrap();
        assert_eq!(returned.op_id, first.op_id);
        assert_eq!(returned.current_host, "h1");
    }

    #[tokio::test]
    async fn complete_clears_session_fields() {
        let store = store();
        store.start_if_none_active("h1").await.unwrap();
        store.complete().await.unwrap();
        let (state, _) = store.load().await.unwrap();
        assert_eq!(state.status, HmcSessionStatus::Completed);
        assert_eq!(state.current_host, "");
        assert_eq!(state.active_sessions_count, 0);
    }

    #[tokio::test]
    async fn abort_sets_aborted_status() {
        let store = store();
        store.start_if_none_active("h1").await.unwrap();
        store.abort().await.unwrap();
        let (state, _) = store.load().await.unwrap();
        assert_eq!(state.status, HmcSessionStatus::Aborted);
    }

    #[tokio::test]
    async fn after_complete_a_fresh_active_session_can_open() {
        let store = store();
        store.start_if_none_active("h1").await.unwrap();
        store.complete().await.unwrap();
        let next = store.start_if_none_active("h2").await.unwrap();
        assert_eq!(next.current_host, "h2");
    }
}
