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

/// Placeholder substituted for identifiers that sanitise to nothing.
pub const EMPTY_PLACEHOLDER: &str = "unknown";

/// Maximum length of a sanitised identifier segment, matching the BMaaS tag
/// charset limit.
pub const MAX_SANITISED_LEN: usize = 63;

/// Lower-cases `id`, restricts it to `[a-z0-9-]`, collapses invalid runs to a
/// single `-`, trims leading/trailing `-`, and truncates to
/// [`MAX_SANITISED_LEN`]. Empty results are replaced by [`EMPTY_PLACEHOLDER`].
///
/// Idempotent: `sanitise(sanitise(id)) == sanitise(id)` for every `id`.
pub fn sanitise(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut last_was_dash = false;
    for ch in id.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }

    let trimmed = out.trim_matches('-');
    let truncated = if trimmed.len() > MAX_SANITISED_LEN {
        // Truncate on a char boundary; the charset is pure ASCII so byte
        // indexing is always a valid boundary here.
        &trimmed[..MAX_SANITISED_LEN]
    } else {
        trimmed
    };
    let truncated = truncated.trim_matches('-');

    if truncated.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_restricts_charset() {
        assert_eq!(sanitise("Cluster_A.01"), "cluster-a-01");
    }

    #[test]
    fn collapses_runs_and_trims() {
        assert_eq!(sanitise("--a///b--"), "a-b");
    }

    #[test]
    fn empty_input_yields_placeholder() {
        assert_eq!(sanitise(""), EMPTY_PLACEHOLDER);
        assert_eq!(sanitise("___"), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn truncates_to_max_length() {
        let long = "a".repeat(100);
        let sanitised = sanitise(&long);
        assert_eq!(sanitised.len(), MAX_SANITISED_LEN);
    }

    #[test]
    fn is_idempotent() {
        for input in ["Weird--Name_!!", "", "already-sane", "UPPER123"] {
            let once = sanitise(input);
            let twice = sanitise(&once);
            assert_eq!(once, twice);
        }
    }
}
