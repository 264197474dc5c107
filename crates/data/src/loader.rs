//! Startup preload orchestration and the landing-page phase.
//!
//! The preload runs on the IO task pool while the landing page is shown;
//! the user enters the dashboard once it commits. A total failure (no
//! station loaded) surfaces a retry affordance instead of a blank screen.

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use futures_lite::future;

use crate::config::DataConfig;
use crate::level::RefreshViews;
use crate::store::{preload_all, DataStore, PreloadOutcome};

/// Application phase: the landing page (with the preload running behind
/// it) or the live dashboard.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppPhase {
    #[default]
    Landing,
    Dashboard,
}

/// Preload progress as shown on the landing page.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    InProgress,
    Ready,
    Failed(String),
}

/// The in-flight preload task, if any.
#[derive(Resource, Default)]
pub struct PreloadTask(pub Option<Task<PreloadOutcome>>);

/// Marker resource: skip the filesystem preload entirely. Inserted by the
/// test harness, which provides its own synthetic [`DataStore`].
#[derive(Resource)]
pub struct SkipPreload;

/// Landing-page request to enter the dashboard (enabled once Ready).
#[derive(Event, Debug, Clone, Copy)]
pub struct EnterDashboard;

/// Landing-page request to restart a failed preload.
#[derive(Event, Debug, Clone, Copy)]
pub struct RetryLoad;

/// Kick off the bulk preload on the IO pool.
pub fn start_preload(
    config: Res<DataConfig>,
    skip: Option<Res<SkipPreload>>,
    mut task: ResMut<PreloadTask>,
    mut status: ResMut<LoadStatus>,
) {
    if skip.is_some() {
        *status = LoadStatus::Ready;
        return;
    }
    let dir = config.data_dir.clone();
    let codes = config.station_codes.clone();
    info!("preloading {} stations from {}", codes.len(), dir.display());
    *status = LoadStatus::InProgress;
    task.0 = Some(IoTaskPool::get().spawn(preload_all(dir, codes)));
}

/// Poll the preload and commit the store when it finishes. Per-station
/// failures were isolated inside the task; here they are only reported.
pub fn poll_preload(
    mut task: ResMut<PreloadTask>,
    mut store: ResMut<DataStore>,
    mut status: ResMut<LoadStatus>,
) {
    let Some(pending) = task.0.as_mut() else {
        return;
    };
    let Some(outcome) = block_on(future::poll_once(pending)) else {
        return;
    };
    task.0 = None;

    for (code, reason) in &outcome.failures {
        warn!("station {code} omitted from the dashboard: {reason}");
    }
    if outcome.stations.is_empty() {
        let message = format!(
            "no station data could be loaded ({} failures)",
            outcome.failures.len()
        );
        error!("{message}");
        *status = LoadStatus::Failed(message);
        return;
    }

    info!(
        "preload complete: {} stations, {} routes ({} stations failed)",
        outcome.stations.len(),
        outcome.details.values().map(|d| d.routes.len()).sum::<usize>(),
        outcome.failures.len()
    );
    *store = DataStore::from_outcome(outcome);
    *status = LoadStatus::Ready;
}

/// Restart a failed preload on request.
pub fn handle_retry(
    mut events: EventReader<RetryLoad>,
    config: Res<DataConfig>,
    skip: Option<Res<SkipPreload>>,
    task: ResMut<PreloadTask>,
    status: ResMut<LoadStatus>,
) {
    if events.read().next().is_none() || task.0.is_some() {
        return;
    }
    start_preload(config, skip, task, status);
}

/// Enter the dashboard once the preload is ready.
pub fn handle_enter_dashboard(
    mut events: EventReader<EnterDashboard>,
    status: Res<LoadStatus>,
    mut next_phase: ResMut<NextState<AppPhase>>,
) {
    if events.read().next().is_none() {
        return;
    }
    if *status == LoadStatus::Ready {
        next_phase.set(AppPhase::Dashboard);
    } else {
        warn!("dashboard entry requested before the preload finished");
    }
}

/// First dashboard frame: fit the nation view.
pub fn on_enter_dashboard(mut refresh: EventWriter<RefreshViews>) {
    refresh.send(RefreshViews);
}
