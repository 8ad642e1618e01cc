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
use tokio::sync::Mutex;

use crate::backend::ConfigMapBackend;

/// An in-memory stand-in for the session ConfigMap, used by reconciler
/// tests so they never need a live API server.
#[derive(Default)]
pub struct InMemoryConfigMapBackend {
    maps: Mutex<BTreeMap<(String, String), BTreeMap<String, String>>>,
}

impl InMemoryConfigMapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a ConfigMap as if an operator or a previous reconcile had
    /// written it directly.
    pub async fn seed(&self, namespace: &str, name: &str, data: BTreeMap<String, String>) {
        self.maps
            .lock()
            .await
            .insert((namespace.to_string(), name.to_string()), data);
    }
}

#[async_trait]
impl ConfigMapBackend for InMemoryConfigMapBackend {
    async fn load(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, MaintenanceError> {
        Ok(self
            .maps
            .lock()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn save(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), MaintenanceError> {
        self.maps
            .lock()
            .await
            .insert((namespace.to_string(), name.to_string()), data);
        Ok(())
    }
}
