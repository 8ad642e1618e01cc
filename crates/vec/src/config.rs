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

use clap::Parser;
use maintenance_model::config::{ForcePolicy, VecConfig};

#[derive(Parser, Debug, Clone)]
#[clap(name = "carbide-vec")]
pub struct Args {
    /// The workload cluster this controller instance evacuates
    /// control-plane members for.
    #[arg(long, env = "VEC_CLUSTER_ID")]
    pub cluster_id: String,

    /// How often to poll for a host in maintenance carrying this cluster's
    /// control-plane VMs.
    #[arg(long, env = "VEC_POLL_INTERVAL", value_parser = humantime::parse_duration, default_value = "10s")]
    pub poll_interval: Duration,

    #[arg(long, env = "VEC_FORCE_POLICY", default_value = "halt")]
    pub force_policy: ForcePolicy,

    #[arg(long, env = "VEC_PER_WLC_MOVE_TIMEOUT", value_parser = humantime::parse_duration, default_value = "20m")]
    pub per_wlc_move_timeout: Duration,

    #[arg(long, env = "VEC_RETRY_BACKOFF", value_parser = humantime::parse_duration, default_value = "5s")]
    pub retry_backoff: Duration,

    #[arg(long, env = "VEC_SESSION_NAMESPACE", default_value = "carbide-system")]
    pub session_namespace: String,

    #[arg(long, env = "VEC_SESSION_NAME", default_value = "vec-maintenance-session")]
    pub session_name: String,
}

impl Args {
    pub fn load() -> Self {
        Self::parse()
    }
}

impl From<&Args> for VecConfig {
    fn from(args: &Args) -> Self {
        VecConfig {
            force_policy: args.force_policy,
            per_wlc_move_timeout: args.per_wlc_move_timeout,
            retry_backoff: args.retry_backoff,
            session_namespace: args.session_namespace.clone(),
            session_name: args.session_name.clone(),
        }
    }
}
