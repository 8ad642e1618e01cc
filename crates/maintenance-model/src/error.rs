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

use std::time::Duration;

use thiserror::Error;

use crate::config::MAX_RETRY_BACKOFF;

/// Categorised error abstraction (spec §7): every inventory/config-store
/// call returns one of these kinds and the reconciler branches on category
/// rather than unwinding.
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("inventory transient error: {0}")]
    InventoryTransient(String),

    #[error("inventory conflict (lost race, tag already assigned): {0}")]
    InventoryConflict(String),

    #[error("inventory not-found: {0}")]
    InventoryNotFound(String),

    #[error("session store transient error: {0}")]
    SessionStoreTransient(String),

    #[error("session conflict: active session is for a different opID ({active_op_id})")]
    SessionConflict { active_op_id: String },

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("policy timeout exceeded")]
    PolicyTimeout,

    #[error("tag parse error: {0}")]
    TagParse(#[from] maintenance_tags::TagError),
}

impl MaintenanceError {
    /// Whether the reconciler should requeue on this error rather than
    /// treat it as terminal for the current reconcile.
    pub fn retryable(&self) -> bool {
        match self {
            MaintenanceError::InventoryTransient(_)
            | MaintenanceError::InventoryConflict(_)
            | MaintenanceError::SessionStoreTransient(_)
            | MaintenanceError::SessionConflict { .. } => true,
            MaintenanceError::InventoryNotFound(_)
            | MaintenanceError::ProtocolViolation(_)
            | MaintenanceError::PolicyTimeout
            | MaintenanceError::TagParse(_) => false,
        }
    }

    /// Exponential-ish backoff hint, capped at [`MAX_RETRY_BACKOFF`]. Only
    /// meaningful when [`Self::retryable`] is `true`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        match self {
            MaintenanceError::InventoryConflict(_) => Duration::ZERO,
            _ => {
                let secs = 2u64.saturating_pow(attempt.min(8)).min(MAX_RETRY_BACKOFF.as_secs());
                Duration::from_secs(secs.max(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_retried_as_success_with_no_backoff() {
        let err = MaintenanceError::InventoryConflict("tag already assigned".into());
        assert!(err.retryable());
        assert_eq!(err.backoff(0), Duration::ZERO);
    }

    #[test]
    fn not_found_is_not_retried() {
        let err = MaintenanceError::InventoryNotFound("h1".into());
        assert!(!err.retryable());
    }

    #[test]
    fn backoff_is_capped() {
        let err = MaintenanceError::InventoryTransient("timeout".into());
        assert_eq!(err.backoff(20), MAX_RETRY_BACKOFF);
    }
}
