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
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};
use maintenance_model::MaintenanceError;

use crate::backend::ConfigMapBackend;

const FIELD_MANAGER: &str = "carbide-maintenance-session";

/// `ConfigMapBackend` backed by a real `kube::Client`. Transient I/O errors
/// against the API server are surfaced unchanged as
/// [`MaintenanceError::SessionStoreTransient`] for the reconciler's work
/// queue to retry.
pub struct KubeConfigMapBackend {
    client: kube::Client,
}

impl KubeConfigMapBackend {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ConfigMapBackend for KubeConfigMapBackend {
    async fn load(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, MaintenanceError> {
        match self.api(namespace).get_opt(name).await {
            Ok(Some(cm)) => Ok(Some(cm.data.unwrap_or_default())),
            Ok(None) => Ok(None),
            Err(err) => Err(MaintenanceError::SessionStoreTransient(err.to_string())),
        }
    }

    async fn save(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), MaintenanceError> {
        let api = self.api(namespace);
        match api.get_opt(name).await {
            Ok(Some(_)) => {
                let patch = ConfigMap {
                    metadata: ObjectMeta {
                        name: Some(name.to_string()),
                        namespace: Some(namespace.to_string()),
                        ..Default::default()
                    },
                    data: Some(data),
                    ..Default::default()
                };
                api.patch(
                    name,
                    &PatchParams::apply(FIELD_MANAGER).force(),
                    &Patch::Apply(&patch),
                )
                .await
                .map_err(|err| MaintenanceError::SessionStoreTransient(err.to_string()))?;
            }
            Ok(None) => {
                let cm = ConfigMap {
                    metadata: ObjectMeta {
                        name: Some(name.to_string()),
                        namespace: Some(namespace.to_string()),
                        ..Default::default()
                    },
                    data: Some(data),
                    ..Default::default()
                };
                api.create(&PostParams::default(), &cm)
                    .await
                    .map_err(|err| MaintenanceError::SessionStoreTransient(err.to_string()))?;
            }
            Err(err) => return Err(MaintenanceError::SessionStoreTransient(err.to_string())),
        }
        Ok(())
    }
}
