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

//! The on-the-wire language of the host maintenance protocol: well-known tag
//! names, their construction/parsing rules, and the provider-ID grammar
//! shared by HMC and VEC.

mod error;
mod provider_id;
mod sanitise;
mod tags;

pub use error::TagError;
pub use provider_id::{ProviderId, parse_provider_id};
pub use sanitise::sanitise;
pub use tags::{
    HOST_MAINT, HOST_NOSCHED, HOST_OP_PREFIX, HOST_READY_PREFIX, VM_CLUSTER_PREFIX, VM_CP,
    VM_READY_OP_PREFIX, build_cluster_tag, build_host_ready_tag, build_op_tag,
    build_ready_op_tag, host_maintenance_op_id, parse_cluster_tag, parse_op_tag,
    parse_ready_op_tag,
};
