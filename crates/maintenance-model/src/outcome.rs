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

use serde::{Deserialize, Serialize};

/// The result of one reconcile call. Distinct from [`crate::MaintenanceError`]:
/// an outcome is a decision the reconciler made, not a failure it hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReconcileOutcome {
    /// The state machine advanced; `to` names the state reached.
    Transition { to: String },
    /// Nothing to do; state is already where it should be.
    DoNothing,
    /// Waiting on an external condition (a gate, a timer); `reason` is
    /// operator-facing.
    Wait { reason: String },
    /// Ask the runtime to requeue after `after`.
    #[serde(skip)]
    Requeue { after: Duration },
}

impl ReconcileOutcome {
    pub fn transition(to: impl Into<String>) -> Self {
        ReconcileOutcome::Transition { to: to.into() }
    }

    pub fn wait(reason: impl Into<String>) -> Self {
        ReconcileOutcome::Wait {
            reason: reason.into(),
        }
    }

    pub fn requeue_after(after: Duration) -> Self {
        ReconcileOutcome::Requeue { after }
    }
}
