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
use maintenance_model::config::{ForcePolicy, HmcConfig};

#[derive(Parser, Debug, Clone)]
#[clap(name = "carbide-hmc")]
pub struct Args {
    /// How often to poll the BMaaS inventory for an operator-requested or
    /// deletion-triggered drain.
    #[arg(long, env = "HMC_POLL_INTERVAL", value_parser = humantime::parse_duration, default_value = "10s")]
    pub poll_interval: Duration,

    /// What to do when a drain's per-host wave timeout is exceeded while the
    /// eviction gate is still unsatisfied.
    #[arg(long, env = "HMC_FORCE_POLICY", default_value = "halt")]
    pub force_policy: ForcePolicy,

    #[arg(long, env = "HMC_PER_HOST_WAVE_TIMEOUT", value_parser = humantime::parse_duration, default_value = "1h")]
    pub per_host_wave_timeout: Duration,

    #[arg(long, env = "HMC_EVACUATION_CHECK_INTERVAL", value_parser = humantime::parse_duration, default_value = "30s")]
    pub evacuation_check_interval: Duration,

    #[arg(long, env = "HMC_SESSION_NAMESPACE", default_value = "carbide-system")]
    pub session_namespace: String,

    #[arg(long, env = "HMC_SESSION_NAME", default_value = "hmc-maintenance-session")]
    pub session_name: String,
}

impl Args {
    pub fn load() -> Self {
        Self::parse()
    }
}

impl From<&Args> for HmcConfig {
    fn from(args: &Args) -> Self {
        HmcConfig {
            force_policy: args.force_policy,
            per_host_wave_timeout: args.per_host_wave_timeout,
            evacuation_check_interval: args.evacuation_check_interval,
            session_namespace: args.session_namespace.clone(),
            session_name: args.session_name.clone(),
        }
    }
}
