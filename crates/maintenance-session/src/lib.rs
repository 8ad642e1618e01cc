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

//! Session Store (spec §4.1): idempotent load/save/start/complete for the
//! single keyed HMC and VEC session records, backed by a Kubernetes
//! `ConfigMap`.

pub mod backend;
pub mod codec;
pub mod hmc_store;
pub mod in_memory_backend;
pub mod kube_backend;
pub mod vec_store;

pub use backend::{ConfigMapBackend, MockConfigMapBackend};
pub use hmc_store::HmcSessionStore;
pub use in_memory_backend::InMemoryConfigMapBackend;
pub use kube_backend::KubeConfigMapBackend;
pub use vec_store::VecSessionStore;
