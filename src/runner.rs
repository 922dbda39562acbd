use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::bsky::Poster;
use crate::config::{Actor, AppConfig};
use crate::format::format_post;
use crate::snapshot::SnapshotStore;
use crate::steam::StatsSource;
use crate::types::{ActorOutcome, ActorReport, Stage};

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip login, posting, and snapshot writes.
    pub dry_run: bool,
    /// Overwrite the snapshot after each successful post.
    pub advance_snapshot: bool,
}

/// Everything a worker talks to. Shared read-only between workers.
pub struct Services<S, P> {
    pub stats: S,
    pub poster: P,
    pub snapshots: SnapshotStore,
}

fn abort(stage: Stage, reason: impl ToString) -> ActorOutcome {
    ActorOutcome::Aborted {
        stage,
        reason: reason.to_string(),
    }
}

/// One actor's run: fetch, diff, format, authenticate, publish.
pub async fn run_actor<S, P>(
    services: &Services<S, P>,
    actor: &Actor,
    options: RunOptions,
) -> ActorOutcome
where
    S: StatsSource,
    P: Poster,
{
    let appid = actor.appid.as_str();

    // Fetching
    let previous = match services.snapshots.read(appid).await {
        Ok(previous) => previous,
        Err(e) => return abort(Stage::Fetching, e),
    };
    let current = match services.stats.global_stats(appid, &actor.stat_names()).await {
        Ok(current) => current,
        Err(e) => return abort(Stage::Fetching, e),
    };

    // Diffing
    let Some(previous) = previous else {
        if options.dry_run {
            info!("[{}] No snapshot for app {appid}; dry run, not saving", actor.handle);
            return ActorOutcome::Baseline { persisted: false };
        }
        if let Err(e) = services.snapshots.write(appid, &current).await {
            return abort(Stage::Diffing, e);
        }
        info!("[{}] No snapshot for app {appid}; saved baseline", actor.handle);
        return ActorOutcome::Baseline { persisted: true };
    };

    // Formatting
    let text = format_post(&current, &previous, &actor.stats);
    if options.dry_run {
        return ActorOutcome::DryRun { text };
    }

    // Authenticating
    let session = match services
        .poster
        .authenticate(&actor.handle, &actor.password)
        .await
    {
        Ok(session) => session,
        Err(e) => return abort(Stage::Authenticating, e),
    };

    // Publishing
    let post = match services.poster.publish(&session, &text).await {
        Ok(post) => post,
        Err(e) => return abort(Stage::Publishing, e),
    };
    info!("[{}] Posted {}", actor.handle, post.uri);

    if options.advance_snapshot {
        if let Err(e) = services.snapshots.write(appid, &current).await {
            warn!("[{}] Posted but failed to advance snapshot: {e}", actor.handle);
        }
    }

    ActorOutcome::Posted {
        uri: post.uri,
        cid: post.cid,
    }
}

/// Run every configured actor concurrently and wait for all of them.
///
/// Reports come back in completion order. A worker that panics is reported as
/// aborted; its siblings are unaffected.
pub async fn run_all<S, P>(
    config: Arc<AppConfig>,
    services: Arc<Services<S, P>>,
    options: RunOptions,
) -> Vec<ActorReport>
where
    S: StatsSource + 'static,
    P: Poster + 'static,
{
    let mut workers = JoinSet::new();
    let mut pending = Vec::with_capacity(config.actors.len());

    for (idx, actor) in config.actors.iter().enumerate() {
        let worker_config = Arc::clone(&config);
        let services = Arc::clone(&services);
        let task = workers.spawn(async move {
            let actor = &worker_config.actors[idx];
            let outcome = run_actor(&*services, actor, options).await;
            (idx, outcome)
        });
        pending.push((task.id(), idx));
        info!("[{}] Started worker for app {}", actor.handle, actor.appid);
    }

    let mut reports = Vec::with_capacity(config.actors.len());
    while let Some(joined) = workers.join_next_with_id().await {
        let (idx, outcome) = match joined {
            Ok((_, result)) => result,
            Err(e) => {
                let Some(&(_, idx)) = pending.iter().find(|(id, _)| *id == e.id()) else {
                    error!("Worker failed: {e}");
                    continue;
                };
                error!("[{}] Worker failed: {e}", config.actors[idx].handle);
                (idx, abort(Stage::Fetching, format!("worker failed: {e}")))
            }
        };

        let actor = &config.actors[idx];
        if let ActorOutcome::Aborted { stage, reason } = &outcome {
            warn!("[{}] Aborted while {}: {reason}", actor.handle, stage.label());
        }
        reports.push(ActorReport {
            handle: actor.handle.clone(),
            appid: actor.appid.clone(),
            outcome,
        });
    }

    reports
}
