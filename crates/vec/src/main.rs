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

use maintenance_model::ReconcileOutcome;
use maintenance_model::config::VecConfig;
use maintenance_session::{KubeConfigMapBackend, VecSessionStore};
use rand::Rng;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use vec_core::VecEvacuationReconciler;

mod bmaas_client;
mod cluster_client;
mod config;

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
    let config: VecConfig = (&args).into();

    let inventory = Arc::new(bmaas_client::BmaasHttpInventory::from_env()?);
    let cluster_records = Arc::new(cluster_client::KubeClusterRecords::new(kube_client.clone()));
    let store = VecSessionStore::new(
        KubeConfigMapBackend::new(kube_client),
        config.session_namespace.clone(),
        config.session_name.clone(),
    );
    let reconciler = VecEvacuationReconciler::new(
        args.cluster_id.clone(),
        inventory,
        cluster_records,
        store,
        config,
    );

    tracing::info!(
        cluster_id = %args.cluster_id,
        poll_interval = ?args.poll_interval,
        "carbide-vec starting"
    );

    loop {
        let next_delay = match reconciler.reconcile().await {
            Ok(outcome) => {
                tracing::info!(outcome = ?outcome, "evacuation reconcile step complete");
                match outcome {
                    ReconcileOutcome::Wait { .. } => args.retry_backoff,
                    _ => args.poll_interval,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "reconcile iteration failed");
                args.retry_backoff
            }
        };
        tokio::time::sleep(jittered(next_delay)).await;
    }
}

/// Adds up to 10% jitter to `interval` so that evacuation controllers across
/// workload environments don't thunder in lockstep against the shared
/// BMaaS inventory.
fn jittered(interval: Duration) -> Duration {
    let max_jitter_ms = (interval.as_millis() as u64 / 10).max(1);
    let jitter_ms = rand::rng().random_range(0..=max_jitter_ms);
    interval + Duration::from_millis(jitter_ms)
}
