//! Presentation driver: turns city submissions into screen states.
//!
//! Each accepted submission gets a sequence number and supersedes whatever
//! was in flight before it. The background task only publishes its outcome
//! while the screen is still loading *its* sequence number, so a slow stale
//! response can never overwrite a newer one.
//!
//! State is handed to the interactive side through a [`watch`] channel; the
//! background task never touches anything else the caller owns.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    error::{FetchError, QueryError},
    model::WeatherQuery,
    provider::WeatherProvider,
    view::{ErrorNotice, WeatherView},
};

/// Icon image slot in the result panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSlot {
    Pending,
    Ready(Vec<u8>),
    /// Not requested, or the download failed.
    Blank,
}

/// Everything the screen can show. One variant at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState {
    Idle,
    Loading { seq: u64 },
    Loaded { seq: u64, view: WeatherView, icon: IconSlot },
    Failed { seq: u64, notice: ErrorNotice },
}

impl ScreenState {
    pub fn loading_visible(&self) -> bool {
        matches!(self, ScreenState::Loading { .. })
    }

    pub fn results_visible(&self) -> bool {
        matches!(self, ScreenState::Loaded { .. })
    }

    /// No request and no icon download is outstanding.
    pub fn is_settled(&self) -> bool {
        match self {
            ScreenState::Loading { .. } => false,
            ScreenState::Loaded { icon, .. } => *icon != IconSlot::Pending,
            ScreenState::Idle | ScreenState::Failed { .. } => true,
        }
    }

    pub fn seq(&self) -> Option<u64> {
        match self {
            ScreenState::Idle => None,
            ScreenState::Loading { seq }
            | ScreenState::Loaded { seq, .. }
            | ScreenState::Failed { seq, .. } => Some(*seq),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Deadline for the weather request. The icon download is not bounded by it.
    pub timeout: Duration,
    pub load_icons: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), load_icons: true }
    }
}

pub struct PresentationDriver {
    provider: Arc<dyn WeatherProvider>,
    options: DriverOptions,
    state_tx: Arc<watch::Sender<ScreenState>>,
    next_seq: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl PresentationDriver {
    pub fn new(provider: Arc<dyn WeatherProvider>, options: DriverOptions) -> Self {
        let (state_tx, _) = watch::channel(ScreenState::Idle);
        Self {
            provider,
            options,
            state_tx: Arc::new(state_tx),
            next_seq: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    /// Handle a submitted city name.
    ///
    /// Blank input leaves the screen untouched and issues no request; the
    /// error is returned so the caller can show inline guidance. Otherwise
    /// the previous request is cancelled, the screen switches to loading and
    /// the new request runs in the background. Must be called from within a
    /// tokio runtime.
    pub fn on_submit(&self, input: &str) -> Result<u64, QueryError> {
        let query = WeatherQuery::parse(input).inspect_err(|err| {
            debug!(%err, "ignoring blank submission");
        })?;

        // Held across the whole hand-over so concurrent submissions publish
        // `Loading` in sequence order and never abort a newer task.
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        abort(in_flight.take());
        self.state_tx.send_replace(ScreenState::Loading { seq });
        info!(seq, city = %query, "submitting weather request");

        *in_flight = Some(tokio::spawn(run_request(
            Arc::clone(&self.provider),
            Arc::clone(&self.state_tx),
            self.options,
            seq,
            query,
        )));

        Ok(seq)
    }

    /// Cancel the in-flight request, if any. A loading screen goes back to idle;
    /// a shown result or error stays, with a pending icon left blank.
    pub fn cancel(&self) {
        self.abort_in_flight();
        self.state_tx.send_if_modified(|state| match state {
            ScreenState::Loading { seq } => {
                info!(seq = *seq, "cancelled in-flight weather request");
                *state = ScreenState::Idle;
                true
            }
            ScreenState::Loaded { seq, icon: icon @ IconSlot::Pending, .. } => {
                info!(seq = *seq, "cancelled icon download, leaving it blank");
                *icon = IconSlot::Blank;
                true
            }
            _ => false,
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ScreenState {
        self.state_tx.borrow().clone()
    }

    /// Wait until the current submission, including its icon, has finished.
    pub async fn settled(&self) -> ScreenState {
        let mut rx = self.subscribe();
        match rx.wait_for(ScreenState::is_settled).await {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender.
            Err(_) => self.state(),
        }
    }

    fn abort_in_flight(&self) {
        abort(self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).take());
    }
}

fn abort(previous: Option<JoinHandle<()>>) {
    if let Some(handle) = previous {
        if !handle.is_finished() {
            debug!("aborting superseded weather request");
        }
        handle.abort();
    }
}

impl Drop for PresentationDriver {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

impl std::fmt::Debug for PresentationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationDriver")
            .field("provider", &self.provider)
            .field("options", &self.options)
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}

async fn run_request(
    provider: Arc<dyn WeatherProvider>,
    state_tx: Arc<watch::Sender<ScreenState>>,
    options: DriverOptions,
    seq: u64,
    query: WeatherQuery,
) {
    let outcome = match tokio::time::timeout(options.timeout, provider.fetch_weather(&query)).await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(FetchError::Timeout(options.timeout)),
    };

    match outcome {
        Ok(result) => {
            let icon = if options.load_icons { IconSlot::Pending } else { IconSlot::Blank };
            let view = WeatherView::from(&result);
            let shown = state_tx.send_if_modified(|state| {
                if *state != (ScreenState::Loading { seq }) {
                    return false;
                }
                *state = ScreenState::Loaded { seq, view, icon };
                true
            });
            if !shown {
                debug!(seq, "discarding stale response");
                return;
            }

            info!(seq, temperature_c = result.temperature_c, icon = %result.icon, "weather loaded");
            if options.load_icons {
                load_icon(provider.as_ref(), &state_tx, seq, &result.icon_url()).await;
            }
        }
        Err(err) => {
            log_failure(seq, &query, &err);
            let notice = ErrorNotice::from(&err);
            let shown = state_tx.send_if_modified(|state| {
                if *state != (ScreenState::Loading { seq }) {
                    return false;
                }
                *state = ScreenState::Failed { seq, notice };
                true
            });
            if !shown {
                debug!(seq, "discarding stale failure");
            }
        }
    }
}

async fn load_icon(
    provider: &dyn WeatherProvider,
    state_tx: &watch::Sender<ScreenState>,
    seq: u64,
    icon_url: &str,
) {
    let slot = match provider.fetch_icon(icon_url).await {
        Ok(bytes) => IconSlot::Ready(bytes),
        Err(err) => {
            warn!(seq, icon_url, error = ?err, "icon download failed, leaving it blank");
            IconSlot::Blank
        }
    };

    state_tx.send_if_modified(|state| match state {
        ScreenState::Loaded { seq: shown, icon, .. } if *shown == seq => {
            *icon = slot;
            true
        }
        _ => false,
    });
}

fn log_failure(seq: u64, query: &WeatherQuery, err: &FetchError) {
    match err {
        FetchError::Http { status, message } => {
            warn!(seq, city = %query, status, message = %message, "weather request rejected");
        }
        FetchError::Transport(cause) => {
            error!(seq, city = %query, error = %err, cause = ?cause, "weather request failed");
        }
        FetchError::Timeout(after) => {
            error!(seq, city = %query, ?after, "weather request timed out");
        }
        FetchError::Parse(cause) => {
            error!(seq, city = %query, error = %err, cause = %cause, "weather response unreadable");
        }
    }
}
