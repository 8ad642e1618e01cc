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

//! Parser/formatter for the two provider-ID grammars named in spec §6:
//!
//! ```text
//! providerID := "maas:///" zone "/" systemID
//!             | "maas-lxd:///" zone "/" hostSystemID "/" vmName
//! ```
//!
//! Both HMC and VEC must parse this identically: HMC uses the bare
//! `systemID`/`hostSystemID`, VEC uses the trailing VM name segment.

use crate::error::TagError;

const MAAS_PREFIX: &str = "maas:///";
const MAAS_LXD_PREFIX: &str = "maas-lxd:///";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderId {
    Host {
        zone: String,
        system_id: String,
    },
    Vm {
        zone: String,
        host_system_id: String,
        vm_name: String,
    },
}

impl ProviderId {
    /// The BMaaS system identifier this provider ID resolves to: the host's
    /// `systemID` for a `Host` variant, the VM's own name for a `Vm` variant.
    pub fn resolved_system_id(&self) -> &str {
        match self {
            ProviderId::Host { system_id, .. } => system_id,
            ProviderId::Vm { vm_name, .. } => vm_name,
        }
    }

    pub fn zone(&self) -> &str {
        match self {
            ProviderId::Host { zone, .. } => zone,
            ProviderId::Vm { zone, .. } => zone,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::Host { zone, system_id } => {
                write!(f, "{MAAS_PREFIX}{zone}/{system_id}")
            }
            ProviderId::Vm {
                zone,
                host_system_id,
                vm_name,
            } => write!(f, "{MAAS_LXD_PREFIX}{zone}/{host_system_id}/{vm_name}"),
        }
    }
}

/// Parses a `providerID` string into a [`ProviderId`].
pub fn parse_provider_id(raw: &str) -> Result<ProviderId, TagError> {
    if let Some(rest) = raw.strip_prefix(MAAS_LXD_PREFIX) {
        let mut parts = rest.splitn(3, '/');
        let zone = parts.next().unwrap_or_default();
        let host_system_id = parts.next().filter(|s| !s.is_empty());
        let vm_name = parts.next().filter(|s| !s.is_empty());
        return match (host_system_id, vm_name) {
            (Some(host_system_id), Some(vm_name)) => Ok(ProviderId::Vm {
                zone: zone.to_string(),
                host_system_id: host_system_id.to_string(),
                vm_name: vm_name.to_string(),
            }),
            _ => Err(TagError::MalformedProviderId(raw.to_string())),
        };
    }

    if let Some(rest) = raw.strip_prefix(MAAS_PREFIX) {
        let mut parts = rest.splitn(2, '/');
        let zone = parts.next().unwrap_or_default();
        let system_id = parts.next().filter(|s| !s.is_empty());
        return match system_id {
            Some(system_id) => Ok(ProviderId::Host {
                zone: zone.to_string(),
                system_id: system_id.to_string(),
            }),
            None => Err(TagError::MalformedProviderId(raw.to_string())),
        };
    }

    Err(TagError::MalformedProviderId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_round_trips() {
        let raw = "maas:///zone-a/abc123";
        let parsed = parse_provider_id(raw).unwrap();
        assert_eq!(
            parsed,
            ProviderId::Host {
                zone: "zone-a".to_string(),
                system_id: "abc123".to_string()
            }
        );
        assert_eq!(parsed.to_string(), raw);
        assert_eq!(parsed.resolved_system_id(), "abc123");
    }

    #[test]
    fn vm_round_trips() {
        let raw = "maas-lxd:///zone-a/host-1/vm-7";
        let parsed = parse_provider_id(raw).unwrap();
        assert_eq!(
            parsed,
            ProviderId::Vm {
                zone: "zone-a".to_string(),
                host_system_id: "host-1".to_string(),
                vm_name: "vm-7".to_string(),
            }
        );
        assert_eq!(parsed.to_string(), raw);
        assert_eq!(parsed.resolved_system_id(), "vm-7");
    }

    #[test]
    fn empty_zone_is_preserved() {
        // zone segment is empty, which is explicitly permitted by the grammar
        let raw = "maas:////abc123";
        let parsed = parse_provider_id(raw).unwrap();
        assert_eq!(
            parsed,
            ProviderId::Host {
                zone: String::new(),
                system_id: "abc123".to_string()
            }
        );
        assert_eq!(parsed.to_string(), raw);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_provider_id("not-a-provider-id").is_err());
        assert!(parse_provider_id("maas:///").is_err());
        assert!(parse_provider_id("maas-lxd:///zone/host-only").is_err());
    }
}
