//! Search controller: turns keystrokes, submits and suggestion picks into
//! geocoder/forecaster calls and owns the resulting display state.
//!
//! All state is mutated on one task. Network calls run on their own tasks and
//! report back through a completion channel, where their results are checked
//! against the current state before being applied.
//!
//! Overlapping forecast fetches (say, two suggestions picked in quick
//! succession) are allowed. Whichever completes last decides which snapshot is
//! shown. A failure is still reported unless a request started after it succeeds.

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    SearchError,
    debounce::{Debouncer, Generation, GenerationCounter},
    model::{ForecastPayload, ResolvedPlace, Suggestion, WeatherSnapshot},
    provider::{Forecaster, Geocoder},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Queries shorter than this never produce suggestions.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub suggestion_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

/// Why the last resolution or forecast did not produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Search,
    Forecast,
}

impl Failure {
    /// How a failed place resolution is reported.
    pub fn of_resolve(error: &SearchError) -> Self {
        match error {
            SearchError::NotFound(_) => Failure::NotFound,
            _ => Failure::Search,
        }
    }

    /// The text shown to users. Never carries upstream detail.
    pub fn message(&self) -> &'static str {
        match self {
            Failure::NotFound => "City not found. Please check the spelling.",
            Failure::Search => "An error occurred while searching.",
            Failure::Forecast => "Could not retrieve weather data. Please try again.",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Geocoding a submitted query.
    Resolving,
    /// At least one forecast fetch is in flight.
    Fetching,
    Loaded,
    Failed(Failure),
}

/// What a UI renders. `snapshot` survives failures; `phase` carries loading and error.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    /// The query `suggestions` were fetched for; `None` while the list is cleared.
    pub suggestions_for: Option<String>,
    pub phase: Phase,
    pub snapshot: Option<Arc<WeatherSnapshot>>,
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Resolving | Phase::Fetching)
    }

    pub fn failure(&self) -> Option<Failure> {
        match self.phase {
            Phase::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.failure().map(|f| f.message())
    }
}

#[derive(Debug)]
enum Action {
    QueryChanged(String),
    Submit,
    Select(Suggestion),
    FetchForecast(ResolvedPlace),
}

#[derive(Debug)]
struct Command {
    action: Action,
    applied: oneshot::Sender<()>,
}

#[derive(Debug)]
enum Completion {
    DebounceElapsed(Generation),
    Suggestions {
        generation: Generation,
        query: String,
        results: Vec<Suggestion>,
    },
    Resolved {
        request: u64,
        result: Result<ResolvedPlace, SearchError>,
    },
    Forecast {
        request: u64,
        place: ResolvedPlace,
        echo: bool,
        result: Result<ForecastPayload, SearchError>,
    },
}

type Report<T> = Box<dyn FnOnce(Result<T, SearchError>) -> Completion + Send>;

/// Reports exactly one completion for a loading request: the real result via
/// `finish`, or `SearchError::Interrupted` if the task is dropped or panics first.
/// The controller releases the loading state when that completion arrives.
struct InFlight<T> {
    completions: mpsc::UnboundedSender<Completion>,
    report: Option<Report<T>>,
}

impl<T> InFlight<T> {
    fn new(
        completions: mpsc::UnboundedSender<Completion>,
        report: impl FnOnce(Result<T, SearchError>) -> Completion + Send + 'static,
    ) -> Self {
        Self {
            completions,
            report: Some(Box::new(report)),
        }
    }

    fn finish(mut self, result: Result<T, SearchError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<T, SearchError>) {
        if let Some(report) = self.report.take() {
            let _ = self.completions.send(report(result));
        }
    }
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        self.send(Err(SearchError::Interrupted));
    }
}

/// Cheap, cloneable front end to a running [`SearchController`].
///
/// Each input method returns once the controller has applied it, so the state
/// observed afterwards already reflects the input.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
}

impl SearchHandle {
    pub async fn query_changed(&self, text: impl Into<String>) -> Result<(), SearchError> {
        self.send(Action::QueryChanged(text.into())).await
    }

    pub async fn submit(&self) -> Result<(), SearchError> {
        self.send(Action::Submit).await
    }

    pub async fn select(&self, suggestion: Suggestion) -> Result<(), SearchError> {
        self.send(Action::Select(suggestion)).await
    }

    pub async fn fetch_forecast(&self, place: ResolvedPlace) -> Result<(), SearchError> {
        self.send(Action::FetchForecast(place)).await
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SearchState) -> bool,
    ) -> Result<SearchState, SearchError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SearchError::Closed)?
            .clone();
        Ok(state)
    }

    /// Wait until no resolution or forecast fetch is in flight.
    pub async fn settled(&self) -> Result<SearchState, SearchError> {
        self.wait_for(|s| !s.is_loading()).await
    }

    async fn send(&self, action: Action) -> Result<(), SearchError> {
        let (applied, done) = oneshot::channel();
        self.commands
            .send(Command { action, applied })
            .map_err(|_| SearchError::Closed)?;
        done.await.map_err(|_| SearchError::Closed)
    }
}

pub struct SearchController {
    geocoder: Arc<dyn Geocoder>,
    forecaster: Arc<dyn Forecaster>,
    suggestion_limit: usize,
    state: SearchState,
    suggest_generations: GenerationCounter,
    debouncer: Debouncer,
    in_flight: usize,
    requests_started: u64,
    /// Newest failed request and how it failed, shown once nothing is loading.
    pending_failure: Option<(u64, Failure)>,
    completions: mpsc::UnboundedSender<Completion>,
    published: watch::Sender<SearchState>,
}

impl SearchController {
    /// Start the controller on the current tokio runtime. It stops once every
    /// handle has been dropped.
    pub fn spawn(
        geocoder: Arc<dyn Geocoder>,
        forecaster: Arc<dyn Forecaster>,
        settings: SearchSettings,
    ) -> SearchHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (published, state) = watch::channel(SearchState::default());

        let controller = SearchController {
            geocoder,
            forecaster,
            suggestion_limit: settings.suggestion_limit,
            state: SearchState::default(),
            suggest_generations: GenerationCounter::default(),
            debouncer: Debouncer::new(settings.debounce),
            in_flight: 0,
            requests_started: 0,
            pending_failure: None,
            completions: completions_tx,
            published,
        };
        tokio::spawn(controller.run(commands_rx, completions_rx));

        SearchHandle {
            commands: commands_tx,
            state,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command { action, applied }) => {
                        self.apply(action);
                        self.publish();
                        let _ = applied.send(());
                    }
                    None => break,
                },
                Some(completion) = completions.recv() => {
                    self.complete(completion);
                    self.publish();
                }
            }
        }
        tracing::debug!("search controller stopped");
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::QueryChanged(text) => self.on_query_change(text),
            Action::Submit => self.on_submit(),
            Action::Select(suggestion) => self.on_suggestion_select(suggestion),
            Action::FetchForecast(place) => self.fetch_forecast(place, false),
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::DebounceElapsed(generation) => self.on_debounce_elapsed(generation),
            Completion::Suggestions {
                generation,
                query,
                results,
            } => self.on_suggestions(generation, query, results),
            Completion::Resolved { request, result } => self.on_resolved(request, result),
            Completion::Forecast {
                request,
                place,
                echo,
                result,
            } => self.on_forecast(request, place, echo, result),
        }
    }

    fn on_query_change(&mut self, text: String) {
        self.state.query = text;
        self.debouncer.cancel();
        let generation = self.suggest_generations.advance();

        if self.state.query.chars().count() < MIN_QUERY_CHARS {
            self.state.suggestions.clear();
            self.state.suggestions_for = None;
            return;
        }
        if self.is_displayed_place(&self.state.query) {
            return;
        }

        let completions = self.completions.clone();
        self.debouncer.schedule(move || {
            let _ = completions.send(Completion::DebounceElapsed(generation));
        });
    }

    fn on_debounce_elapsed(&mut self, generation: Generation) {
        if !self.suggest_generations.is_current(generation) {
            return;
        }
        // The forecast for this very name may have landed while the timer ran.
        let query = self.state.query.clone();
        if self.is_displayed_place(&query) {
            return;
        }

        tracing::debug!(%query, ?generation, "fetching suggestions");
        let geocoder = self.geocoder.clone();
        let completions = self.completions.clone();
        let limit = self.suggestion_limit;
        tokio::spawn(async move {
            let results = geocoder.suggest(&query, limit).await;
            let _ = completions.send(Completion::Suggestions {
                generation,
                query,
                results,
            });
        });
    }

    fn on_suggestions(&mut self, generation: Generation, query: String, results: Vec<Suggestion>) {
        if !self.suggest_generations.is_current(generation) {
            tracing::debug!(
                ?generation,
                latest = ?self.suggest_generations.latest(),
                "discarding stale suggestions"
            );
            return;
        }
        self.state.suggestions = results;
        self.state.suggestions_for = Some(query);
    }

    fn on_submit(&mut self) {
        let query = self.state.query.trim().to_string();
        if query.is_empty() {
            return;
        }

        self.clear_suggestions();
        let request = self.begin(Phase::Resolving);

        let geocoder = self.geocoder.clone();
        let in_flight = InFlight::new(self.completions.clone(), move |result| {
            Completion::Resolved { request, result }
        });
        tokio::spawn(async move {
            in_flight.finish(geocoder.resolve(&query).await);
        });
    }

    fn on_resolved(&mut self, request: u64, result: Result<ResolvedPlace, SearchError>) {
        match result {
            Ok(place) => {
                self.settle(request, None);
                self.fetch_forecast(place, true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "place resolution failed");
                self.settle(request, Some(Failure::of_resolve(&e)));
            }
        }
    }

    fn on_suggestion_select(&mut self, suggestion: Suggestion) {
        self.state.query = suggestion.name.clone();
        self.clear_suggestions();
        self.fetch_forecast(ResolvedPlace::from(suggestion), false);
    }

    /// `echo` puts the canonical place name back into the query once the fetch ends.
    fn fetch_forecast(&mut self, place: ResolvedPlace, echo: bool) {
        let request = self.begin(Phase::Fetching);

        let forecaster = self.forecaster.clone();
        let (latitude, longitude) = (place.latitude, place.longitude);
        let in_flight = InFlight::new(self.completions.clone(), move |result| {
            Completion::Forecast {
                request,
                place,
                echo,
                result,
            }
        });
        tokio::spawn(async move {
            in_flight.finish(forecaster.fetch(latitude, longitude).await);
        });
    }

    fn on_forecast(
        &mut self,
        request: u64,
        place: ResolvedPlace,
        echo: bool,
        result: Result<ForecastPayload, SearchError>,
    ) {
        match result {
            Ok(payload) => {
                self.state.snapshot = Some(Arc::new(WeatherSnapshot::new(&place, payload)));
                self.settle(request, None);
            }
            Err(e) => {
                tracing::warn!(place = %place.name, error = %e, "forecast fetch failed");
                self.settle(request, Some(Failure::Forecast));
            }
        }
        if echo {
            self.echo_query(place.name);
        }
    }

    /// Writes the resolved name into the query without asking for suggestions.
    fn echo_query(&mut self, name: String) {
        self.state.query = name;
        self.clear_suggestions();
    }

    fn clear_suggestions(&mut self) {
        self.debouncer.cancel();
        self.suggest_generations.advance();
        self.state.suggestions.clear();
        self.state.suggestions_for = None;
    }

    fn is_displayed_place(&self, query: &str) -> bool {
        self.state
            .snapshot
            .as_ref()
            .is_some_and(|s| s.city_name == query)
    }

    /// Marks a request as loading and returns its sequence number.
    fn begin(&mut self, phase: Phase) -> u64 {
        self.in_flight += 1;
        self.requests_started += 1;
        self.state.phase = phase;
        self.requests_started
    }

    /// Releases `request` and records how it ended.
    ///
    /// A failure stays pending until something started after it succeeds. Once
    /// nothing is loading, a pending failure becomes the phase, so a failure is
    /// never lost just because an older fetch was still running.
    fn settle(&mut self, request: u64, failure: Option<Failure>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let superseded = self
            .pending_failure
            .is_some_and(|(newest, _)| newest > request);
        if !superseded {
            self.pending_failure = failure.map(|f| (request, f));
        }

        if self.in_flight == 0 {
            self.state.phase = match self.pending_failure.take() {
                Some((_, failure)) => Phase::Failed(failure),
                None => Phase::Loaded,
            };
        }
    }
}
