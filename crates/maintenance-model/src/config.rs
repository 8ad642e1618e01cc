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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcePolicy {
    /// Abort the session and leave tags in place for a human. Default.
    #[default]
    Halt,
    /// Clear tags despite unsatisfied gates. Unsafe; logged as a warning.
    Force,
    /// Clear only `HOST_OP`; leave `HOST_MAINT`/`HOST_NOSCHED` for the
    /// operator to clear by hand.
    Relax,
}

impl std::str::FromStr for ForcePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "halt" => Ok(ForcePolicy::Halt),
            "force" => Ok(ForcePolicy::Force),
            "relax" => Ok(ForcePolicy::Relax),
            other => Err(format!(
                "unknown force policy \"{other}\", expected one of: halt, force, relax"
            )),
        }
    }
}

impl std::fmt::Display for ForcePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ForcePolicy::Halt => "halt",
            ForcePolicy::Force => "force",
            ForcePolicy::Relax => "relax",
        };
        write!(f, "{s}")
    }
}

pub const DEFAULT_PER_WLC_MOVE_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_PER_HOST_WAVE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_EVACUATION_CHECK_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MOVE_TIMEOUT: Duration = DEFAULT_PER_WLC_MOVE_TIMEOUT;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HmcConfig {
    pub force_policy: ForcePolicy,
    pub per_host_wave_timeout: Duration,
    pub evacuation_check_interval: Duration,
    /// Well-known namespace/name of the HMC session ConfigMap.
    pub session_namespace: String,
    pub session_name: String,
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            force_policy: ForcePolicy::default(),
            per_host_wave_timeout: DEFAULT_PER_HOST_WAVE_TIMEOUT,
            evacuation_check_interval: DEFAULT_EVACUATION_CHECK_INTERVAL,
            session_namespace: "carbide-system".to_string(),
            session_name: "hmc-maintenance-session".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VecConfig {
    pub force_policy: ForcePolicy,
    pub per_wlc_move_timeout: Duration,
    pub retry_backoff: Duration,
    pub session_namespace: String,
    pub session_name: String,
}

impl Default for VecConfig {
    fn default() -> Self {
        Self {
            force_policy: ForcePolicy::default(),
            per_wlc_move_timeout: DEFAULT_MOVE_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            session_namespace: "carbide-system".to_string(),
            session_name: "vec-maintenance-session".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_policy_parses_case_insensitively() {
        assert_eq!("HALT".parse::<ForcePolicy>().unwrap(), ForcePolicy::Halt);
        assert_eq!("Force".parse::<ForcePolicy>().unwrap(), ForcePolicy::Force);
        assert_eq!("relax".parse::<ForcePolicy>().unwrap(), ForcePolicy::Relax);
        assert!("bogus".parse::<ForcePolicy>().is_err());
    }
}
