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

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum HmcSessionStatus {
    #[default]
    Completed,
    Active,
    Aborted,
}

/// Exactly one active record per management environment (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HmcSession {
    pub op_id: String,
    pub status: HmcSessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub current_host: String,
    pub affected_clusters: BTreeSet<String>,
    pub pending_replacements: BTreeSet<String>,
    pub active_sessions_count: u8,
}

impl HmcSession {
    pub fn is_active(&self) -> bool {
        self.status == HmcSessionStatus::Active
    }

    /// The invariant from spec §3: `status==Active ⟹ opID≠"" ∧
    /// currentHost≠"" ∧ activeSessionsCount==1`.
    pub fn upholds_active_invariant(&self) -> bool {
        if !self.is_active() {
            return true;
        }
        !self.op_id.is_empty() && !self.current_host.is_empty() && self.active_sessions_count == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum VecSessionStatus {
    #[default]
    Completed,
    InProgress,
}

/// One record per observed `opID`, processed serially by a workload
/// environment's VEC (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VecSession {
    pub op_id: String,
    pub host_system_id: String,
    pub status: VecSessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub new_vm_system_id: Option<String>,
}

impl VecSession {
    pub fn is_in_progress(&self) -> bool {
        self.status == VecSessionStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_session_always_upholds_invariant() {
        let s = HmcSession::default();
        assert!(s.upholds_active_invariant());
    }

    #[test]
    fn active_session_requires_op_id_and_host() {
        let mut s = HmcSession {
            status: HmcSessionStatus::Active,
            ..Default::default()
        };
        assert!(!s.upholds_active_invariant());
        s.op_id = "op-1".to_string();
        s.current_host = "h1".to_string();
        s.active_sessions_count = 1;
        assert!(s.upholds_active_invariant());
    }
}
