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

use std::sync::Arc;
use std::time::Duration;

use hmc::{DrainTrigger, HostDrainReconciler};
use maintenance_model::ReconcileOutcome;
use maintenance_model::config::HmcConfig;
use maintenance_session::codec::{KEY_HOST_SYSTEM_ID, KEY_START_TRIGGER};
use maintenance_session::{ConfigMapBackend, HmcSessionStore, KubeConfigMapBackend};
use rand::Rng;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

mod bmaas_client;
mod config;
mod machine_records_client;

use config::Args;

fn init_logging() -> eyre::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
        .add_directive("kube=info".parse()?)
        .add_directive("tower=warn".parse()?)
        .add_directive("hyper=warn".parse()?);
    tracing_subscriber::registry()
        .with(logfmt::layer().with_filter(env_filter))
        .try_init()
        .map_err(|err| eyre::eyre!("failed to install tracing subscriber: {err}"))
}

fn main() -> eyre::Result<()> {
    init_logging()?;
    let args = Args::load();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(args))?;
    rt.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}

async fn run(args: Args) -> eyre::Result<()> {
    let kube_client = kube::Client::try_default().await?;
    let config: HmcConfig = (&args).into();

    let inventory = Arc::new(bmaas_client::BmaasHttpInventory::from_env()?);
    let machine_records = Arc::new(machine_records_client::KubeMachineRecords::new(
        kube_client.clone(),
    ));
    let session_namespace = config.session_namespace.clone();
    let session_name = config.session_name.clone();
    let trigger_backend = KubeConfigMapBackend::new(kube_client.clone());
    let store = HmcSessionStore::new(
        KubeConfigMapBackend::new(kube_client),
        session_namespace.clone(),
        session_name.clone(),
    );
    let reconciler = HostDrainReconciler::new(inventory, machine_records, store, config);

    tracing::info!(poll_interval = ?args.poll_interval, "carbide-hmc starting");

    loop {
        let next_delay = match reconcile_once(&reconciler, &trigger_backend, &session_namespace, &session_name).await
        {
            Ok(outcome) => match outcome {
                Some(ReconcileOutcome::Wait { .. }) => args.evacuation_check_interval,
                _ => args.poll_interval,
            },
            Err(err) => {
                tracing::error!(error = %err, "reconcile iteration failed");
                args.poll_interval
            }
        };
        tokio::time::sleep(jittered(next_delay)).await;
    }
}

/// Adds up to 10% jitter to `interval` so that a fleet of controllers racing
/// on the same ConfigMap doesn't thunder in lockstep.
fn jittered(interval: Duration) -> Duration {
    let max_jitter_ms = (interval.as_millis() as u64 / 10).max(1);
    let jitter_ms = rand::rng().random_range(0..=max_jitter_ms);
    interval + Duration::from_millis(jitter_ms)
}

#[tracing::instrument(skip_all)]
async fn reconcile_once(
    reconciler: &HostDrainReconciler<KubeConfigMapBackend>,
    trigger_backend: &KubeConfigMapBackend,
    session_namespace: &str,
    session_name: &str,
) -> eyre::Result<Option<ReconcileOutcome>> {
    let Some(trigger) = poll_trigger(trigger_backend, session_namespace, session_name).await? else {
        return Ok(None);
    };
    let host = trigger.host_system_id().to_string();
    let outcome = reconciler.reconcile_drain(trigger).await?;
    tracing::info!(host = %host, outcome = ?outcome, "drain reconcile step complete");
    Ok(Some(outcome))
}

/// Looks for an operator-requested drain: the `start="true"` / `hostSystemID`
/// trigger keys on HMC's own session ConfigMap (spec §4.1, §6). A host
/// machine record's deletion timestamp is the other documented trigger
/// source, but that record is collaborator-owned and not wired in here (see
/// `machine_records_client`). The session ConfigMap itself is read again
/// inside `reconcile_drain`; this only decides *whether* to call it this
/// tick.
async fn poll_trigger(
    backend: &KubeConfigMapBackend,
    session_namespace: &str,
    session_name: &str,
) -> eyre::Result<Option<DrainTrigger>> {
    let Some(fields) = backend.load(session_namespace, session_name).await? else {
        return Ok(None);
    };
    if fields.get(KEY_START_TRIGGER).map(String::as_str) != Some("true") {
        return Ok(None);
    }
    let Some(host_system_id) = fields.get(KEY_HOST_SYSTEM_ID) else {
        return Ok(None);
    };
    Ok(Some(DrainTrigger::OperatorRequested {
        host_system_id: host_system_id.clone(),
    }))
}
