//! One refresh cycle: fetch → parse → project → present.
//!
//! The fetch runs on a spawned task and hands its result back through a
//! channel owned by the orchestrator. Everything else, including every
//! [`PresentationSink`] call, happens on the caller's task.

use std::sync::Arc;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};

use crate::{
    city::CityListProvider,
    client::ForecastClient,
    error::{FormatError, NO_CITY_PROMPT, RefreshError, TransportError},
    model::{DisplayRow, StructuredForecast},
    parser, projector,
};

/// View layer that renders the outcome of a refresh cycle.
pub trait PresentationSink {
    fn show_rows(&mut self, rows: &[DisplayRow], title: &str);
    fn show_prompt(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
}

/// Terminal state of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    NoCity,
    Failed(RefreshError),
    Ready { rows: Vec<DisplayRow>, city_name: String },
}

impl RefreshOutcome {
    /// Deliver the outcome to the sink; exactly one sink call.
    pub fn present(&self, sink: &mut dyn PresentationSink) {
        match self {
            RefreshOutcome::NoCity => sink.show_prompt(NO_CITY_PROMPT),
            RefreshOutcome::Failed(err) => sink.show_error(&err.user_message()),
            RefreshOutcome::Ready { rows, city_name } => sink.show_rows(rows, city_name),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RefreshOutcome::Failed(_))
    }
}

/// What happened when a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStart {
    /// No city configured; the prompt has already been presented.
    NoCity,
    /// Fetch dispatched; await [`ForecastOrchestrator::next_completion`].
    Started(u64),
    /// Another refresh is pending; this request was dropped.
    AlreadyInFlight,
    /// The orchestrator was torn down.
    Closed,
}

/// Result of a background fetch, handed back to the foreground.
#[derive(Debug)]
pub struct FetchCompletion {
    id: u64,
    city_name: String,
    result: Result<Vec<u8>, TransportError>,
}

impl FetchCompletion {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    city_name: String,
    /// `None` once the task has been joined.
    handle: Option<JoinHandle<()>>,
}

impl InFlight {
    fn abort(self) {
        if let Some(handle) = self.handle {
            handle.abort();
        }
    }
}

#[derive(Debug)]
pub struct ForecastOrchestrator {
    client: Arc<dyn ForecastClient>,
    tx: mpsc::UnboundedSender<FetchCompletion>,
    rx: mpsc::UnboundedReceiver<FetchCompletion>,
    in_flight: Option<InFlight>,
    next_id: u64,
    closed: bool,
}

impl ForecastOrchestrator {
    pub fn new(client: Arc<dyn ForecastClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { client, tx, rx, in_flight: None, next_id: 1, closed: false }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a refresh cycle for the provider's current city.
    ///
    /// The city list is reloaded first. With no city the prompt is shown
    /// immediately and no request is made. Must be called within a tokio runtime.
    pub fn begin_refresh(
        &mut self,
        cities: &mut dyn CityListProvider,
        sink: &mut dyn PresentationSink,
    ) -> RefreshStart {
        if self.closed {
            return RefreshStart::Closed;
        }
        if self.in_flight.is_some() {
            info!("refresh requested while another is pending; ignoring");
            return RefreshStart::AlreadyInFlight;
        }

        if let Err(err) = cities.reload() {
            // Keep going with the list already in memory.
            warn!("failed to reload city list: {err:#}");
        }

        let Some(city_name) = cities.current_city_name().map(str::to_string) else {
            info!("no city configured");
            RefreshOutcome::NoCity.present(sink);
            return RefreshStart::NoCity;
        };

        let id = self.next_id;
        self.next_id += 1;
        info!(id, city = %city_name, "refreshing forecast");

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let query = city_name.clone();
        let handle = tokio::spawn(async move {
            let result = client.fetch(&query).await;
            // Receiver gone means the orchestrator was dropped.
            let _ = tx.send(FetchCompletion { id, city_name: query, result });
        });

        debug!(id, "fetching");
        self.in_flight = Some(InFlight { id, city_name, handle: Some(handle) });
        RefreshStart::Started(id)
    }

    /// Wait for the pending fetch to complete.
    ///
    /// A fetch task that dies without reporting (panic) completes with a
    /// transport error. Returns `None` when nothing is in flight or after teardown.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        if self.closed {
            return None;
        }
        let pending = self.in_flight.as_mut()?;

        let joined = match pending.handle.as_mut() {
            Some(handle) => tokio::select! {
                biased;
                completion = self.rx.recv() => return completion,
                joined = handle => joined,
            },
            // Already joined; its completion is queued or was consumed.
            None => return self.rx.recv().await,
        };
        pending.handle = None;

        match joined {
            // The task sends before it returns, so the completion is queued.
            Ok(()) => self.rx.recv().await,
            Err(err) => Some(task_failure(pending.id, &pending.city_name, err)),
        }
    }

    /// Finish the cycle a completion belongs to and present its outcome.
    ///
    /// Stale completions and completions arriving after teardown are
    /// dropped without touching the sink.
    pub fn finish(
        &mut self,
        completion: FetchCompletion,
        sink: &mut dyn PresentationSink,
    ) -> Option<RefreshOutcome> {
        if self.closed {
            debug!(id = completion.id, "dropping completion after teardown");
            return None;
        }
        match &self.in_flight {
            Some(pending) if pending.id == completion.id => {}
            _ => {
                debug!(id = completion.id, "dropping stale completion");
                return None;
            }
        }
        self.in_flight = None;

        let outcome = resolve(completion.id, completion.result);
        match &outcome {
            RefreshOutcome::Ready { rows, city_name } => {
                info!(id = completion.id, city = %city_name, rows = rows.len(), "forecast ready")
            }
            RefreshOutcome::NoCity => {
                info!(id = completion.id, query = %completion.city_name, "server resolved no city name")
            }
            RefreshOutcome::Failed(err) => {
                warn!(id = completion.id, city = %completion.city_name, "refresh failed: {err}")
            }
        }
        outcome.present(sink);
        Some(outcome)
    }

    /// Run one full refresh cycle and wait for it to finish.
    ///
    /// Returns `None` if the request was dropped because another one is
    /// pending, or the orchestrator was torn down.
    pub async fn refresh(
        &mut self,
        cities: &mut dyn CityListProvider,
        sink: &mut dyn PresentationSink,
    ) -> Option<RefreshOutcome> {
        match self.begin_refresh(cities, sink) {
            RefreshStart::NoCity => Some(RefreshOutcome::NoCity),
            RefreshStart::Started(_) => {
                let completion = self.next_completion().await?;
                self.finish(completion, sink)
            }
            RefreshStart::AlreadyInFlight | RefreshStart::Closed => None,
        }
    }

    /// Abort any pending fetch; later completions are ignored.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            debug!(id = pending.id, "aborting in-flight fetch");
            pending.abort();
        }
        self.closed = true;
    }
}

impl Drop for ForecastOrchestrator {
    fn drop(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            pending.abort();
        }
    }
}

fn task_failure(id: u64, city_name: &str, err: JoinError) -> FetchCompletion {
    warn!(id, city = city_name, "fetch task ended without a result: {err}");
    FetchCompletion {
        id,
        city_name: city_name.to_string(),
        result: Err(TransportError::new(format!("fetch task failed: {err}"))),
    }
}

/// Classify a fetch result into a terminal state.
fn resolve(id: u64, fetched: Result<Vec<u8>, TransportError>) -> RefreshOutcome {
    resolve_with(id, fetched, parser::parse)
}

fn resolve_with(
    id: u64,
    fetched: Result<Vec<u8>, TransportError>,
    parse: impl FnOnce(&[u8]) -> Result<StructuredForecast, FormatError>,
) -> RefreshOutcome {
    let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(err) => return RefreshOutcome::Failed(err.into()),
    };

    debug!(id, "parsing");
    let forecast = match parse(&bytes) {
        Ok(forecast) => forecast,
        Err(err) => return RefreshOutcome::Failed(err.into()),
    };

    if !forecast.is_success() {
        return RefreshOutcome::Failed(RefreshError::Semantic { status: forecast.status });
    }

    let Some(city_name) = forecast.resolved_city_name().map(str::to_string) else {
        return RefreshOutcome::NoCity;
    };

    debug!(id, "projecting");
    let rows = projector::project(forecast);
    RefreshOutcome::Ready { rows, city_name }
}
