use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{LocationSettings, Platform},
    models::LocationFix,
};

use super::state::{
    FailureKind, FetchOutcome, FixErrorCode, FixOptions, LocationFailure, LocationStatus,
    PermissionStatus,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Platform geolocation service.
#[async_trait]
pub trait LocationApi: Send + Sync {
    /// Show the platform permission prompt (where one exists).
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_fix(&self, options: FixOptions) -> Result<LocationFix, FixErrorCode>;
}

struct InFlight {
    generation: u64,
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

#[derive(Default)]
struct ProviderState {
    permission_granted: bool,
    last_fix: Option<LocationFix>,
    generation: u64,
    in_flight: Option<InFlight>,
}

/// Permission-gated, single-flight location fetcher.
///
/// At most one platform request runs at a time. Calls made while one is in
/// flight join it and resolve with the same settled status. Status changes
/// are broadcast on a watch channel; results from a fetch that was cancelled
/// are dropped.
#[derive(Clone)]
pub struct LocationProvider {
    api: Arc<dyn LocationApi>,
    platform: Platform,
    options: FixOptions,
    state: Arc<Mutex<ProviderState>>,
    status_tx: Arc<watch::Sender<LocationStatus>>,
}

impl LocationProvider {
    pub fn new(api: Arc<dyn LocationApi>, platform: Platform, settings: &LocationSettings) -> Self {
        let (status_tx, _) = watch::channel(LocationStatus::Idle);
        Self {
            api,
            platform,
            options: FixOptions::from(settings),
            state: Arc::new(Mutex::new(ProviderState::default())),
            status_tx: Arc::new(status_tx),
        }
    }

    pub fn status(&self) -> LocationStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationStatus> {
        self.status_tx.subscribe()
    }

    pub async fn last_fix(&self) -> Option<LocationFix> {
        self.state.lock().await.last_fix
    }

    /// Ask for location permission outside of a fetch.
    ///
    /// While a fetch is in flight it owns the permission step: this waits for
    /// that fetch to settle and reports its outcome instead of prompting.
    pub async fn request_permission(&self) -> PermissionStatus {
        let joined = {
            let state = self.state.lock().await;
            if state.permission_granted {
                return PermissionStatus::Granted;
            }
            state.in_flight.as_ref().map(|_| self.status_tx.subscribe())
        };

        if let Some(mut rx) = joined {
            match wait_settled(&mut rx).await {
                // Cancelled before the fetch answered; ask directly.
                LocationStatus::Idle => {}
                status => return permission_from(&status),
            }
        }

        {
            let state = self.state.lock().await;
            if state.in_flight.is_none() {
                self.status_tx.send_replace(LocationStatus::PermissionPending);
            }
        }

        let permission = self.prompt().await;

        let mut state = self.state.lock().await;
        if state.in_flight.is_none() {
            let next = match permission {
                PermissionStatus::Granted => LocationStatus::Idle,
                PermissionStatus::Denied => LocationStatus::Denied,
            };
            self.status_tx.send_replace(next);
        }
        state.permission_granted |= permission == PermissionStatus::Granted;
        permission
    }

    /// Resolve to a settled status: `Ready`, `Denied`, `Failed` (or `Idle`
    /// if the fetch was cancelled). Never retries on its own.
    pub async fn get_location(&self) -> LocationStatus {
        let mut rx = self.start_fetch().await;
        wait_settled(&mut rx).await
    }

    /// Like [`get_location`](Self::get_location), but the caller may stop
    /// waiting by cancelling `interest`. The fetch itself carries on and
    /// still updates the provider.
    pub async fn get_location_until(&self, interest: CancellationToken) -> FetchOutcome {
        if interest.is_cancelled() {
            return FetchOutcome::Abandoned;
        }
        let mut rx = self.start_fetch().await;
        tokio::select! {
            status = wait_settled(&mut rx) => FetchOutcome::Completed(status),
            _ = interest.cancelled() => {
                log_debug!("location caller stopped waiting");
                FetchOutcome::Abandoned
            }
        }
    }

    /// Abort the in-flight fetch, if any, and return to `Idle`. The last good
    /// fix is kept.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.cancel_token.cancel();
            in_flight.handle.abort();
            log_info!("location fetch {} cancelled", in_flight.generation);
            self.status_tx.send_replace(LocationStatus::Idle);
        }
    }

    async fn start_fetch(&self) -> watch::Receiver<LocationStatus> {
        let mut state = self.state.lock().await;
        // Subscribing under the lock marks the current status as seen, so
        // the waiter only wakes for transitions of this fetch.
        let rx = self.status_tx.subscribe();

        if let Some(in_flight) = &state.in_flight {
            log_debug!("joining in-flight location fetch {}", in_flight.generation);
            return rx;
        }

        state.generation += 1;
        let generation = state.generation;
        let cancel_token = CancellationToken::new();

        let provider = self.clone();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = provider.run_fetch(generation) => {}
                _ = token.cancelled() => {}
            }
        });

        state.in_flight = Some(InFlight {
            generation,
            handle,
            cancel_token,
        });
        rx
    }

    async fn run_fetch(&self, generation: u64) {
        if !self.ensure_permission(generation).await {
            log_warn!("location permission denied");
            self.finish(generation, LocationStatus::Denied).await;
            return;
        }

        self.transition(generation, LocationStatus::Fetching).await;

        let timeout = Duration::from_millis(self.options.timeout_ms);
        let status = match time::timeout(timeout, self.api.current_fix(self.options)).await {
            Ok(Ok(fix)) => LocationStatus::Ready(fix),
            Ok(Err(code)) => LocationStatus::Failed(LocationFailure::from(code)),
            Err(_) => LocationStatus::Failed(LocationFailure::new(FailureKind::Timeout)),
        };

        if let LocationStatus::Failed(failure) = &status {
            log_warn!("location fetch failed: {}", failure.message);
        }
        self.finish(generation, status).await;
    }

    async fn ensure_permission(&self, generation: u64) -> bool {
        if self.state.lock().await.permission_granted {
            return true;
        }

        self.transition(generation, LocationStatus::PermissionPending)
            .await;
        let granted = self.prompt().await == PermissionStatus::Granted;
        if granted {
            self.state.lock().await.permission_granted = true;
        }
        granted
    }

    async fn prompt(&self) -> PermissionStatus {
        if self.platform.permission_is_implicit() {
            PermissionStatus::Granted
        } else {
            self.api.request_permission().await
        }
    }

    /// Publish an intermediate status if `generation` is still the live fetch.
    async fn transition(&self, generation: u64, status: LocationStatus) {
        let state = self.state.lock().await;
        if is_live(&state, generation) {
            self.status_tx.send_replace(status);
        }
    }

    /// Publish the settled status and release the single-flight slot.
    async fn finish(&self, generation: u64, status: LocationStatus) {
        let mut state = self.state.lock().await;
        if !is_live(&state, generation) {
            log_debug!("dropping result of stale location fetch {}", generation);
            return;
        }

        match &status {
            LocationStatus::Ready(fix) => {
                state.last_fix = Some(*fix);
                log_info!("location fix acquired (accuracy {:.0} m)", fix.accuracy);
            }
            // Revoked after an earlier grant; the next fetch prompts again.
            LocationStatus::Failed(failure) if failure.kind == FailureKind::PermissionDenied => {
                state.permission_granted = false;
            }
            _ => {}
        }
        state.in_flight = None;
        self.status_tx.send_replace(status);
    }
}

fn permission_from(status: &LocationStatus) -> PermissionStatus {
    match status {
        LocationStatus::Denied => PermissionStatus::Denied,
        LocationStatus::Failed(failure) if failure.kind == FailureKind::PermissionDenied => {
            PermissionStatus::Denied
        }
        _ => PermissionStatus::Granted,
    }
}

fn is_live(state: &ProviderState, generation: u64) -> bool {
    state
        .in_flight
        .as_ref()
        .is_some_and(|in_flight| in_flight.generation == generation)
}

async fn wait_settled(rx: &mut watch::Receiver<LocationStatus>) -> LocationStatus {
    loop {
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
        let status = rx.borrow_and_update().clone();
        if status.is_settled() {
            return status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeLocationApi, FixBehavior};
    use std::sync::atomic::Ordering;

    fn provider(api: Arc<FakeLocationApi>, platform: Platform) -> LocationProvider {
        LocationProvider::new(api, platform, &LocationSettings::default())
    }

    fn paris() -> LocationFix {
        LocationFix::new(48.8566, 2.3522, 12.0)
    }

    #[tokio::test]
    async fn granted_fetch_reaches_ready_and_keeps_fix() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        let status = provider.get_location().await;

        assert_eq!(status, LocationStatus::Ready(paris()));
        assert_eq!(provider.status(), LocationStatus::Ready(paris()));
        assert_eq!(provider.last_fix().await, Some(paris()));
        let options = api.last_options().unwrap();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout_ms, 15_000);
        assert_eq!(options.max_cached_age_ms, 10_000);
    }

    #[tokio::test]
    async fn denied_permission_never_fetches() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Denied,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        assert_eq!(provider.get_location().await, LocationStatus::Denied);
        assert_eq!(api.fix_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.last_fix().await, None);
    }

    #[tokio::test]
    async fn denial_is_asked_again_on_retry() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Denied,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        provider.get_location().await;
        api.set_permission(PermissionStatus::Granted);
        let status = provider.get_location().await;

        assert_eq!(status, LocationStatus::Ready(paris()));
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn granted_permission_is_remembered() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        provider.get_location().await;
        provider.get_location().await;

        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.fix_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn revoked_permission_is_asked_again() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);
        assert_eq!(provider.get_location().await, LocationStatus::Ready(paris()));

        api.set_permission(PermissionStatus::Denied);
        api.set_behavior(FixBehavior::Fail(FixErrorCode::PermissionDenied));

        assert_eq!(
            provider.get_location().await,
            LocationStatus::Failed(LocationFailure::from(FixErrorCode::PermissionDenied))
        );
        assert_eq!(provider.get_location().await, LocationStatus::Denied);
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 2);

        api.set_permission(PermissionStatus::Granted);
        api.set_behavior(FixBehavior::Succeed(paris()));
        assert_eq!(provider.get_location().await, LocationStatus::Ready(paris()));
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_request_during_fetch_does_not_prompt_twice() {
        let api = Arc::new(
            FakeLocationApi::new(PermissionStatus::Granted, FixBehavior::Succeed(paris()))
                .with_prompt_delay(Duration::from_secs(2)),
        );
        let provider = provider(api.clone(), Platform::Android);

        let fetch = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get_location().await })
        };
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(provider.request_permission().await, PermissionStatus::Granted);
        assert_eq!(fetch.await.unwrap(), LocationStatus::Ready(paris()));
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_request_during_fetch_reports_denial() {
        let api = Arc::new(
            FakeLocationApi::new(PermissionStatus::Denied, FixBehavior::Succeed(paris()))
                .with_prompt_delay(Duration::from_secs(2)),
        );
        let provider = provider(api.clone(), Platform::Android);

        let fetch = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get_location().await })
        };
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(provider.request_permission().await, PermissionStatus::Denied);
        assert_eq!(fetch.await.unwrap(), LocationStatus::Denied);
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn implicit_platform_skips_the_prompt() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Denied,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Ios);

        assert_eq!(provider.request_permission().await, PermissionStatus::Granted);
        assert_eq!(provider.get_location().await, LocationStatus::Ready(paris()));
        assert_eq!(api.permission_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn request_permission_settles_status() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Denied,
            FixBehavior::Succeed(paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        assert_eq!(provider.request_permission().await, PermissionStatus::Denied);
        assert_eq!(provider.status(), LocationStatus::Denied);

        api.set_permission(PermissionStatus::Granted);
        assert_eq!(provider.request_permission().await, PermissionStatus::Granted);
        assert_eq!(provider.status(), LocationStatus::Idle);
    }

    #[tokio::test]
    async fn platform_errors_are_classified() {
        for (code, kind) in [
            (FixErrorCode::PermissionDenied, FailureKind::PermissionDenied),
            (FixErrorCode::Unavailable, FailureKind::PositionUnavailable),
            (FixErrorCode::Timeout, FailureKind::Timeout),
            (FixErrorCode::Unknown, FailureKind::Unknown),
        ] {
            let api = Arc::new(FakeLocationApi::new(
                PermissionStatus::Granted,
                FixBehavior::Fail(code),
            ));
            let provider = provider(api, Platform::Android);

            match provider.get_location().await {
                LocationStatus::Failed(failure) => assert_eq!(failure.kind, kind),
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_platform_call_times_out_after_fifteen_seconds() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Hang,
        ));
        let provider = provider(api, Platform::Android);
        let started = time::Instant::now();

        let status = provider.get_location().await;

        assert_eq!(
            status,
            LocationStatus::Failed(LocationFailure::new(FailureKind::Timeout))
        );
        assert!(started.elapsed() >= Duration::from_millis(15_000));
        assert_ne!(provider.status(), LocationStatus::Fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_share_one_platform_request() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Delay(Duration::from_secs(2), paris()),
        ));
        let provider = provider(api.clone(), Platform::Android);

        let (a, b) = tokio::join!(provider.get_location(), provider.get_location());

        assert_eq!(a, LocationStatus::Ready(paris()));
        assert_eq!(b, LocationStatus::Ready(paris()));
        assert_eq!(api.fix_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_caller_does_not_stop_the_fetch() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Delay(Duration::from_secs(3), paris()),
        ));
        let provider = provider(api, Platform::Android);
        let interest = CancellationToken::new();

        let waiter = {
            let provider = provider.clone();
            let interest = interest.clone();
            tokio::spawn(async move { provider.get_location_until(interest).await })
        };
        time::sleep(Duration::from_secs(1)).await;
        interest.cancel();

        assert_eq!(waiter.await.unwrap(), FetchOutcome::Abandoned);

        let mut rx = provider.subscribe();
        let settled = wait_settled(&mut rx).await;
        assert_eq!(settled, LocationStatus::Ready(paris()));
        assert_eq!(provider.last_fix().await, Some(paris()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_late_result() {
        let api = Arc::new(FakeLocationApi::new(
            PermissionStatus::Granted,
            FixBehavior::Delay(Duration::from_secs(5), paris()),
        ));
        let provider = provider(api, Platform::Android);

        let waiter = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get_location().await })
        };
        time::sleep(Duration::from_secs(1)).await;
        provider.cancel().await;

        assert_eq!(waiter.await.unwrap(), LocationStatus::Idle);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.status(), LocationStatus::Idle);
        assert_eq!(provider.last_fix().await, None);
    }
}
