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

//! (De)serialisation of [`maintenance_model::session`] types against the
//! Session ConfigMap schema of spec §6. Unparseable fields are treated as
//! missing for that field only — schema drift is never fatal — and unknown
//! keys already present in the ConfigMap (e.g. operator trigger keys `start`,
//! `hostSystemID`, or the opaque `progress` blob) are left untouched by
//! `merge_*_into_fields`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use maintenance_model::session::{HmcSession, HmcSessionStatus, VecSession, VecSessionStatus};

pub const KEY_OP_ID: &str = "opId";
pub const KEY_STATUS: &str = "status";
pub const KEY_STARTED_AT: &str = "startedAt";
pub const KEY_CURRENT_HOST: &str = "currentHost";
pub const KEY_ACTIVE_SESSIONS: &str = "activeSessions";
pub const KEY_AFFECTED_CLUSTERS: &str = "affectedWLCClusters";
pub const KEY_PENDING_REPLACEMENTS: &str = "pendingReadyVMReplacements";
pub const KEY_NEW_VM_SYSTEM_ID: &str = "newVMSystemID";
pub const KEY_HOST_SYSTEM_ID: &str = "hostSystemID";
pub const KEY_START_TRIGGER: &str = "start";

fn json_array(values: &BTreeSet<String>) -> String {
    serde_json::to_string(&values.iter().collect::<Vec<_>>()).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_array(raw: &str) -> BTreeSet<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|v| v.into_iter().collect())
        .unwrap_or_default()
}

pub fn hmc_session_from_fields(fields: &BTreeMap<String, String>) -> HmcSession {
    HmcSession {
        op_id: fields.get(KEY_OP_ID).cloned().unwrap_or_default(),
        status: fields
            .get(KEY_STATUS)
            .and_then(|s| parse_hmc_status(s))
            .unwrap_or_default(),
        started_at: fields
            .get(KEY_STARTED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        current_host: fields.get(KEY_CURRENT_HOST).cloned().unwrap_or_default(),
        affected_clusters: fields
            .get(KEY_AFFECTED_CLUSTERS)
            .map(|s| parse_json_array(s))
            .unwrap_or_default(),
        pending_replacements: fields
            .get(KEY_PENDING_REPLACEMENTS)
            .map(|s| parse_json_array(s))
            .unwrap_or_default(),
        active_sessions_count: fields
            .get(KEY_ACTIVE_SESSIONS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
    }
}

pub fn merge_hmc_session_into_fields(session: &HmcSession, fields: &mut BTreeMap<String, String>) {
    fields.insert(KEY_OP_ID.to_string(), session.op_id.clone());
    fields.insert(KEY_STATUS.to_string(), hmc_status_str(session.status).to_string());
    if let Some(started_at) = session.started_at {
        fields.insert(KEY_STARTED_AT.to_string(), started_at.to_rfc3339());
    }
    fields.insert(KEY_CURRENT_HOST.to_string(), session.current_host.clone());
    fields.insert(
        KEY_ACTIVE_SESSIONS.to_string(),
        session.active_sessions_count.to_string(),
    );
    fields.insert(
        KEY_AFFECTED_CLUSTERS.to_string(),
        json_array(&session.affected_clusters),
    );
    fields.insert(
        KEY_PENDING_REPLACEMENTS.to_string(),
        json_array(&session.pending_replacements),
    );
}

fn parse_hmc_status(raw: &str) -> Option<HmcSessionStatus> {
    match raw {
        "Active" => Some(HmcSessionStatus::Active),
        "Completed" => Some(HmcSessionStatus::Completed),
        "Aborted" => Some(HmcSessionStatus::Aborted),
        _ => None,
    }
}

fn hmc_status_str(status: HmcSessionStatus) -> &'static str {
    match status {
        HmcSessionStatus::Active => "Active",
        HmcSessionStatus::Completed => "Completed",
        HmcSessionStatus::Aborted => "Aborted",
    }
}

pub fn vec_session_from_fields(fields: &BTreeMap<String, String>) -> VecSession {
    VecSession {
        op_id: fields.get(KEY_OP_ID).cloned().unwrap_or_default(),
        host_system_id: fields.get(KEY_HOST_SYSTEM_ID).cloned().unwrap_or_default(),
        status: fields
            .get(KEY_STATUS)
            .and_then(|s| parse_vec_status(s))
            .unwrap_or_default(),
        started_at: fields
            .get(KEY_STARTED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        new_vm_system_id: fields.get(KEY_NEW_VM_SYSTEM_ID).cloned(),
    }
}

pub fn merge_vec_session_into_fields(session: &VecSession, fields: &mut BTreeMap<String, String>) {
    fields.insert(KEY_OP_ID.to_string(), session.op_id.clone());
    fields.insert(
        KEY_HOST_SYSTEM_ID.to_string(),
        session.host_system_id.clone(),
    );
    fields.insert(KEY_STATUS.to_string(), vec_status_str(session.status).to_string());
    if let Some(started_at) = session.started_at {
        fields.insert(KEY_STARTED_AT.to_string(), started_at.to_rfc3339());
    }
    match &session.new_vm_system_id {
        Some(id) => {
            fields.insert(KEY_NEW_VM_SYSTEM_ID.to_string(), id.clone());
        }
        None => {
            fields.remove(KEY_NEW_VM_SYSTEM_ID);
        }
    }
}

fn parse_vec_status(raw: &str) -> Option<VecSessionStatus> {
    match raw {
        "InProgress" => Some(VecSessionStatus::InProgress),
        "Completed" => Some(VecSessionStatus::Completed),
        _ => None,
    }
}

fn vec_status_str(status: VecSessionStatus) -> &'static str {
    match status {
        VecSessionStatus::InProgress => "InProgress",
        VecSessionStatus::Completed => "Completed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmc_round_trips_through_fields() {
        let mut session = HmcSession {
            op_id: "op-1".to_string(),
            status: HmcSessionStatus::Active,
            started_at: Some(Utc::now()),
            current_host: "h1".to_string(),
            active_sessions_count: 1,
            ..Default::default()
        };
        session.affected_clusters.insert("tenant-a".to_string());
        session.pending_replacements.insert("vm-9".to_string());

        let mut fields = BTreeMap::new();
        merge_hmc_session_into_fields(&session, &mut fields);
        let parsed = hmc_session_from_fields(&fields);

        assert_eq!(parsed.op_id, session.op_id);
        assert_eq!(parsed.status, session.status);
        assert_eq!(parsed.current_host, session.current_host);
        assert_eq!(parsed.active_sessions_count, 1);
        assert_eq!(parsed.affected_clusters, session.affected_clusters);
        assert_eq!(parsed.pending_replacements, session.pending_replacements);
    }

    #[test]
    fn unparseable_status_is_treated_as_missing_not_fatal() {
        let mut fields = BTreeMap::new();
        fields.insert(KEY_STATUS.to_string(), "Bogus".to_string());
        let parsed = hmc_session_from_fields(&fields);
        assert_eq!(parsed.status, HmcSessionStatus::default());
    }

    #[test]
    fn unknown_keys_survive_a_merge() {
        let mut fields = BTreeMap::new();
        fields.insert("start".to_string(), "true".to_string());
        fields.insert("progress".to_string(), "{}".to_string());
        let session = HmcSession::default();
        merge_hmc_session_into_fields(&session, &mut fields);
        assert_eq!(fields.get("start").map(String::as_str), Some("true"));
        assert_eq!(fields.get("progress").map(String::as_str), Some("{}"));
    }
}
