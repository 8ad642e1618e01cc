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

use std::collections::BTreeMap;

use async_trait::async_trait;
use maintenance_model::MaintenanceError;
use mockall::automock;

/// Abstracts the session ConfigMap's `.data` map away from Kubernetes so the
/// session store logic can run against an in-memory fake in tests. Mirrors
/// how the teacher's `StateControllerIO` trait keeps the controller loop
/// independent of its concrete persistence layer.
#[automock]
#[async_trait]
pub trait ConfigMapBackend: Send + Sync {
    /// Returns `None` if the ConfigMap does not exist.
    async fn load(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, MaintenanceError>;

    /// Creates the ConfigMap if absent, otherwise replaces its `.data`.
    async fn save(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), MaintenanceError>;
}
