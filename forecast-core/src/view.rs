//! Loading / Content / Error state for the presentation layer, and the
//! trigger/refresh facade that drives it.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    loader::{ForecastLoader, LoadEvent, StartOutcome},
    model::{ForecastErrorKind, ForecastResult},
};

/// What the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ForecastViewState {
    #[default]
    Loading,
    Content(Vec<String>),
    Error(ForecastErrorKind),
}

impl ForecastViewState {
    /// Next state after `event`.
    pub fn apply(&self, event: &LoadEvent) -> ForecastViewState {
        match event {
            LoadEvent::Started => ForecastViewState::Loading,
            LoadEvent::Delivered(result) => ForecastViewState::from(result.as_ref()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ForecastViewState::Loading)
    }
}

impl From<&ForecastResult> for ForecastViewState {
    fn from(result: &ForecastResult) -> Self {
        match result {
            ForecastResult::Success(lines) => ForecastViewState::Content(lines.clone()),
            ForecastResult::Failure(kind) => ForecastViewState::Error(*kind),
        }
    }
}

pub type ViewSubscriber = Arc<dyn Fn(ForecastViewState) + Send + Sync>;

struct ScreenInner {
    state: ForecastViewState,
    subscriber: Option<ViewSubscriber>,
}

/// Presentation-facing facade: turns triggers into loader calls and loader
/// events into view states.
pub struct ForecastScreen {
    loader: ForecastLoader,
    inner: Arc<Mutex<ScreenInner>>,
}

impl ForecastScreen {
    pub fn new(loader: ForecastLoader) -> Self {
        let inner = Arc::new(Mutex::new(ScreenInner {
            state: ForecastViewState::Loading,
            subscriber: None,
        }));

        let sink = inner.clone();
        loader.subscribe(Arc::new(move |event: LoadEvent| {
            let (state, subscriber) = {
                let mut screen = sink.lock();
                screen.state = screen.state.apply(&event);
                (screen.state.clone(), screen.subscriber.clone())
            };
            if let Some(subscriber) = subscriber {
                subscriber(state);
            }
        }));

        Self { loader, inner }
    }

    /// Register the sole view-state consumer, replacing any previous one.
    pub fn subscribe(&self, subscriber: ViewSubscriber) {
        self.inner.lock().subscriber = Some(subscriber);
    }

    /// First display or re-display.
    pub fn on_trigger(&self) -> StartOutcome {
        self.loader.start()
    }

    /// Explicit refresh: always goes back to the network.
    pub fn on_refresh(&self) -> StartOutcome {
        self.loader.invalidate_and_restart()
    }

    pub fn state(&self) -> ForecastViewState {
        self.inner.lock().state.clone()
    }
}

impl std::fmt::Debug for ForecastScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastScreen")
            .field("state", &self.state())
            .field("loader", &self.loader)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        format::Units,
        task::ForecastLoadTask,
        test_support::{MockProvider, Reply},
    };
    use tokio::sync::mpsc;

    const CLEAR: &str = r#"{"cod":"200","list":[{"weather":[{"main":"Clear"}],"temp":{"max":20,"min":10}}]}"#;

    fn screen_with(provider: Arc<MockProvider>) -> (ForecastScreen, mpsc::UnboundedReceiver<ForecastViewState>) {
        let loader = ForecastLoader::new(
            ForecastLoadTask::new(provider, Units::Metric),
            Arc::new(Config::default()),
        );
        let screen = ForecastScreen::new(loader);
        let (tx, rx) = mpsc::unbounded_channel();
        screen.subscribe(Arc::new(move |state: ForecastViewState| {
            let _ = tx.send(state);
        }));
        (screen, rx)
    }

    #[test]
    fn state_transitions() {
        let content = ForecastResult::Success(vec!["a".into()]);
        let failed = ForecastResult::Failure(ForecastErrorKind::ServerError);

        let state = ForecastViewState::default();
        assert!(state.is_loading());

        let state = state.apply(&LoadEvent::Delivered(Arc::new(content)));
        assert_eq!(state, ForecastViewState::Content(vec!["a".into()]));

        let state = state.apply(&LoadEvent::Started);
        assert_eq!(state, ForecastViewState::Loading);

        let state = state.apply(&LoadEvent::Delivered(Arc::new(failed)));
        assert_eq!(state, ForecastViewState::Error(ForecastErrorKind::ServerError));
    }

    #[tokio::test]
    async fn trigger_goes_loading_then_content() {
        let (screen, mut rx) = screen_with(Arc::new(MockProvider::with_body(CLEAR)));

        screen.on_trigger();

        assert_eq!(rx.recv().await, Some(ForecastViewState::Loading));
        let Some(ForecastViewState::Content(lines)) = rx.recv().await else {
            panic!("expected content");
        };
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Clear - 20° / 10°"));
        assert_eq!(screen.state(), ForecastViewState::Content(lines));
    }

    #[tokio::test]
    async fn cache_hit_delivers_content_without_loading() {
        let provider = Arc::new(MockProvider::with_body(CLEAR));
        let (screen, mut rx) = screen_with(provider.clone());

        screen.on_trigger();
        rx.recv().await;
        let first = rx.recv().await;

        assert_eq!(screen.on_trigger(), StartOutcome::CacheHit);
        assert_eq!(rx.recv().await, first);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_recovers_from_error() {
        let provider = Arc::new(MockProvider::scripted(vec![
            Reply::Body(r#"{"cod":"404"}"#.into()),
            Reply::Body(CLEAR.into()),
        ]));
        let (screen, mut rx) = screen_with(provider.clone());

        screen.on_trigger();
        assert_eq!(rx.recv().await, Some(ForecastViewState::Loading));
        assert_eq!(
            rx.recv().await,
            Some(ForecastViewState::Error(ForecastErrorKind::LocationNotFound))
        );

        assert_eq!(screen.on_refresh(), StartOutcome::Launched);
        assert_eq!(rx.recv().await, Some(ForecastViewState::Loading));
        assert!(matches!(rx.recv().await, Some(ForecastViewState::Content(_))));
        assert_eq!(provider.calls(), 2);
    }
}
