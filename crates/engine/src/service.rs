use crate::{OptimizationRun, RiskEngine};
use crate::error::EngineError;
use analytics::RiskMetricsSnapshot;
use chrono::NaiveDate;
use core_types::{DateWindow, RiskProfile};
use correlation::CorrelationMatrix;
use monte_carlo::{SimulationConfig, SimulationResult};
use optimizer::{AllocationScenario, OptimizationResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Last-writer-wins bookkeeping for one kind of request.
///
/// Starting a request cancels the token of the one in flight and bumps the generation.
/// A result is only delivered if its generation is still the current one when it
/// completes, so a stale result can never overwrite a newer one.
#[derive(Debug)]
pub struct RequestSlot {
    name: &'static str,
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl RequestSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancels the request in flight, if any, and registers a new one.
    pub fn begin(&self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        // A poisoned lock only means a previous holder panicked; the token inside is still usable.
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        (generation, token)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Runs `work` on the blocking pool and returns its result unless a newer request
    /// started in the meantime.
    pub async fn run<T, F>(&self, work: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&CancellationToken) -> Result<T, EngineError> + Send + 'static,
    {
        let (generation, token) = self.begin();
        let worker_token = token.clone();
        let outcome = tokio::task::spawn_blocking(move || work(&worker_token))
            .await
            .map_err(|e| EngineError::Join(e.to_string()))?;

        if token.is_cancelled() || !self.is_current(generation) {
            tracing::warn!(request = self.name, generation, "Discarding superseded result.");
            return Err(EngineError::Superseded(self.name));
        }
        outcome
    }
}

/// Async front end over a shared [`RiskEngine`].
///
/// Each operation has its own slot, so a new metrics request supersedes only an older
/// metrics request and never a running optimization.
pub struct AnalyticsService {
    engine: Arc<RiskEngine>,
    metrics: RequestSlot,
    correlation: RequestSlot,
    simulation: RequestSlot,
    optimization: RequestSlot,
}

impl AnalyticsService {
    pub fn new(engine: Arc<RiskEngine>) -> Self {
        Self {
            engine,
            metrics: RequestSlot::new("metrics"),
            correlation: RequestSlot::new("correlation"),
            simulation: RequestSlot::new("simulation"),
            optimization: RequestSlot::new("optimization"),
        }
    }

    pub fn engine(&self) -> &Arc<RiskEngine> {
        &self.engine
    }

    pub async fn compute_metrics(
        &self,
        as_of: NaiveDate,
        window: DateWindow,
    ) -> Result<RiskMetricsSnapshot, EngineError> {
        let engine = Arc::clone(&self.engine);
        self.metrics
            .run(move |cancel| engine.compute_metrics(as_of, &window, Some(cancel)))
            .await
    }

    pub async fn compute_correlation(
        &self,
        symbols: Vec<String>,
        window: DateWindow,
    ) -> Result<CorrelationMatrix, EngineError> {
        let engine = Arc::clone(&self.engine);
        self.correlation
            .run(move |cancel| engine.compute_correlation(&symbols, &window, Some(cancel)))
            .await
    }

    pub async fn run_simulation(&self, config: SimulationConfig) -> Result<SimulationResult, EngineError> {
        let engine = Arc::clone(&self.engine);
        self.simulation
            .run(move |cancel| engine.run_simulation(&config, Some(cancel)))
            .await
    }

    pub async fn optimize(
        &self,
        candidates: Vec<AllocationScenario>,
        profile: RiskProfile,
        as_of: NaiveDate,
        window: DateWindow,
    ) -> Result<OptimizationResult, EngineError> {
        let engine = Arc::clone(&self.engine);
        self.optimization
            .run(move |cancel| engine.optimize(&candidates, &profile, as_of, &window, Some(cancel)))
            .await
    }

    /// Like [`AnalyticsService::optimize`], with the grid and the baseline comparison done
    /// in the same background task.
    pub async fn optimize_portfolio(
        &self,
        candidates: Option<Vec<AllocationScenario>>,
        profile: RiskProfile,
        as_of: NaiveDate,
        window: DateWindow,
    ) -> Result<OptimizationRun, EngineError> {
        let engine = Arc::clone(&self.engine);
        self.optimization
            .run(move |cancel| {
                engine.optimize_portfolio(candidates.as_deref(), &profile, as_of, &window, Some(cancel))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn newer_request_supersedes_the_one_in_flight() {
        let slot = Arc::new(RequestSlot::new("test"));

        let first = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                slot.run(|cancel| {
                    while !cancel.is_cancelled() {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    Ok(1)
                })
                .await
            })
        };
        while slot.generation() < 1 {
            tokio::task::yield_now().await;
        }

        let second = slot.run(|_| Ok(2)).await;
        assert_eq!(second, Ok(2));
        let first = first.await.unwrap();
        assert_eq!(first, Err(EngineError::Superseded("test")));
    }

    #[tokio::test]
    async fn errors_from_current_requests_are_returned() {
        let slot = Arc::new(RequestSlot::new("test"));
        let result: Result<(), _> = slot
            .run(|_| Err(EngineError::Join("boom".to_string())))
            .await;
        assert_eq!(result, Err(EngineError::Join("boom".to_string())));
        assert_eq!(slot.generation(), 1);
    }

    #[test]
    fn begin_cancels_the_previous_token() {
        let slot = RequestSlot::new("test");
        let (g1, t1) = slot.begin();
        let (g2, t2) = slot.begin();
        assert!(t1.is_cancelled());
        assert!(!t2.is_cancelled());
        assert!(!slot.is_current(g1));
        assert!(slot.is_current(g2));
    }
}
