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

//! Shared data model, configuration, and categorised errors for the host
//! maintenance coordination subsystem.

pub mod config;
pub mod error;
pub mod infra;
pub mod machine;
pub mod outcome;
pub mod session;

pub use error::MaintenanceError;
pub use machine::{Machine, PowerState};
pub use outcome::ReconcileOutcome;
pub use session::{HmcSession, HmcSessionStatus, VecSession, VecSessionStatus};
