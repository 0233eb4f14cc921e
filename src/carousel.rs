//! The carousel orchestrator: owns the slide index and background gradient,
//! and re-analyzes the current image whenever the index changes.
//!
//! ## Architecture
//! - Navigation (manual or autoplay) runs synchronously under one lock
//! - Each index change spawns an analysis task tagged with a generation
//! - A finished analysis is applied only if its generation is still current,
//!   so a slow image can never paint the background of a newer slide
//! - State changes are published on a `tokio::sync::watch` channel
//!
//! ## Rust concepts
//! - `Arc` / `Weak` so background tasks never keep the carousel alive
//! - `watch` channels for "latest value" state broadcasting
//! - `JoinHandle::abort` for cancelling in-flight work on shutdown

use crate::analyzer::{ImageColorAnalyzer, ImageSource};
use crate::gradient::{self, GradientDescriptor};
use crate::scheduler::{AutoAdvanceScheduler, AutoplayHandle, AutoplayPolicy};
use crate::slides::{ConfigurationError, ImageSet, SlideIndexController};
use crate::{CarouselConfig, ColorPair};
use serde::Serialize;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Offsets of the slides shown side by side: previous, current, next.
pub const NEIGHBORHOOD: [isize; 3] = [-1, 0, 1];

/// Externally visible carousel state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarouselState {
    /// Index of the slide currently shown.
    pub index: usize,
    /// Background derived from the current slide (or the placeholder).
    pub gradient: GradientDescriptor,
}

/// One slide of the rendered strip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Slide {
    /// Position relative to the current slide.
    pub offset: isize,
    /// Index into the image set.
    pub index: usize,
    /// Image URL or path.
    pub locator: String,
}

/// State and neighborhood taken from the same moment, so `slides[1]` is
/// always the slide at `state.index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub state: CarouselState,
    pub slides: [Slide; 3],
}

/// Why the index moved. Only used for logging and the reset policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cause {
    Manual,
    Autoplay,
}

struct Navigation {
    controller: SlideIndexController,
    /// Bumped on every index change; analyses carry the value they were
    /// issued for.
    generation: u64,
}

struct Shared<S> {
    images: ImageSet,
    config: CarouselConfig,
    analyzer: Arc<ImageColorAnalyzer<S>>,
    navigation: Mutex<Navigation>,
    state: watch::Sender<CarouselState>,
    autoplay: Mutex<Option<AutoplayHandle>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    /// Set by shutdown; late analyses are no longer applied.
    stopped: AtomicBool,
}

/// Auto-advancing image carousel with an image-derived background.
///
/// Cheap to clone: all clones drive the same carousel. Background work
/// ([`start`](Self::start), and the analysis behind [`next`](Self::next) and
/// [`previous`](Self::previous)) runs on the current Tokio runtime; called
/// from outside one, navigation still moves the index but nothing is
/// analyzed.
pub struct Carousel<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Carousel<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ImageSource> Carousel<S> {
    /// Build a carousel at slide 0 with the placeholder background.
    ///
    /// Nothing runs until [`start`](Self::start) is called.
    pub fn new(
        images: ImageSet,
        source: S,
        config: CarouselConfig,
    ) -> Result<Self, ConfigurationError> {
        if let Some(period) = config.autoplay {
            AutoAdvanceScheduler::new(period)?;
        }

        let controller = SlideIndexController::for_images(&images);
        let (state, _) = watch::channel(CarouselState {
            index: controller.current(),
            gradient: GradientDescriptor::PLACEHOLDER,
        });

        Ok(Self {
            shared: Arc::new(Shared {
                images,
                config,
                analyzer: Arc::new(ImageColorAnalyzer::new(source)),
                navigation: Mutex::new(Navigation {
                    controller,
                    generation: 0,
                }),
                state,
                autoplay: Mutex::new(None),
                in_flight: Mutex::new(Vec::new()),
                stopped: AtomicBool::new(false),
            }),
        })
    }

    /// Convenience constructor from raw locators.
    pub fn from_locators<I, L>(
        locators: I,
        source: S,
        config: CarouselConfig,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self::new(ImageSet::new(locators)?, source, config)
    }

    /// Analyze the current slide and start the autoplay timer (if enabled).
    pub fn start(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("Carousel started outside a Tokio runtime; not starting");
            return;
        }

        let (index, generation) = {
            let navigation = lock(&self.shared.navigation);
            (navigation.controller.current(), navigation.generation)
        };
        self.shared.request_analysis(index, generation);

        if let Some(period) = self.shared.config.autoplay {
            let mut autoplay = lock(&self.shared.autoplay);
            if autoplay.is_none() {
                // Construction already validated the period.
                if let Ok(scheduler) = AutoAdvanceScheduler::new(period) {
                    let weak = Arc::downgrade(&self.shared);
                    *autoplay = Some(scheduler.start(move || tick(&weak)));
                    tracing::info!("Autoplay every {}ms", period.as_millis());
                }
            }
        }
    }

    /// Show the next slide. Returns the new index.
    pub fn next(&self) -> usize {
        self.shared.navigate(1, Cause::Manual)
    }

    /// Show the previous slide. Returns the new index.
    pub fn previous(&self) -> usize {
        self.shared.navigate(-1, Cause::Manual)
    }

    /// Stop autoplay and abort analyses that have not finished yet.
    ///
    /// Final: analyses that still complete afterwards are discarded.
    pub fn shutdown(&self) {
        {
            // Under the navigation lock so no analysis is mid-apply.
            let _navigation = lock(&self.shared.navigation);
            self.shared.stopped.store(true, Ordering::SeqCst);
        }
        if let Some(handle) = lock(&self.shared.autoplay).take() {
            handle.cancel();
        }
        self.shared.abort_in_flight();
        tracing::info!("Carousel stopped");
    }

    /// Wait for every analysis issued so far to finish (or be aborted).
    pub async fn settle(&self) {
        loop {
            let pending = mem::take(&mut *lock(&self.shared.in_flight));
            if pending.is_empty() {
                return;
            }
            for task in pending {
                // Aborted tasks are fine here; they just never apply.
                let _ = task.await;
            }
        }
    }
}

impl<S> Carousel<S> {
    pub fn images(&self) -> &ImageSet {
        &self.shared.images
    }

    pub fn config(&self) -> CarouselConfig {
        self.shared.config
    }

    pub fn current_index(&self) -> usize {
        self.shared.state.borrow().index
    }

    pub fn gradient(&self) -> GradientDescriptor {
        self.shared.state.borrow().gradient
    }

    /// Current index and gradient, read atomically.
    pub fn snapshot(&self) -> CarouselState {
        *self.shared.state.borrow()
    }

    /// Subscribe to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<CarouselState> {
        self.shared.state.subscribe()
    }

    /// The slide `offset` positions away from the current one.
    pub fn neighbor(&self, offset: isize) -> Slide {
        let controller = lock(&self.shared.navigation).controller;
        self.shared.slide(&controller, offset)
    }

    /// Previous, current and next slides, in that order.
    pub fn neighborhood(&self) -> [Slide; 3] {
        let controller = lock(&self.shared.navigation).controller;
        NEIGHBORHOOD.map(|offset| self.shared.slide(&controller, offset))
    }

    /// State and neighborhood in one consistent read.
    pub fn frame(&self) -> Frame {
        // Every state change is published while this lock is held.
        let navigation = lock(&self.shared.navigation);
        let state = *self.shared.state.borrow();
        Frame {
            state,
            slides: NEIGHBORHOOD.map(|offset| self.shared.slide(&navigation.controller, offset)),
        }
    }

    pub fn is_autoplaying(&self) -> bool {
        lock(&self.shared.autoplay)
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled())
    }
}

impl<S> Shared<S> {
    fn slide(&self, controller: &SlideIndexController, offset: isize) -> Slide {
        let index = controller.neighbor(offset);
        Slide {
            offset,
            index,
            // The controller was built over this image set, so the index is in range.
            locator: self.images.get(index).unwrap_or_default().to_string(),
        }
    }

    /// Apply a finished analysis if it still belongs to the current slide.
    /// Returns whether the gradient changed hands.
    fn apply(&self, generation: u64, pair: ColorPair) -> bool {
        let navigation = lock(&self.navigation);
        if self.stopped.load(Ordering::SeqCst) {
            tracing::debug!("Discarding analysis for generation {} after shutdown", generation);
            return false;
        }
        if navigation.generation != generation {
            tracing::debug!(
                "Discarding stale analysis (generation {} superseded by {})",
                generation,
                navigation.generation
            );
            return false;
        }

        let gradient = gradient::compose(pair);
        self.state.send_modify(|state| state.gradient = gradient);
        true
    }

    fn abort_in_flight(&self) {
        for task in lock(&self.in_flight).drain(..) {
            task.abort();
        }
    }
}

impl<S: ImageSource> Shared<S> {
    fn navigate(self: &Arc<Self>, offset: isize, cause: Cause) -> usize {
        let (index, generation) = {
            let mut navigation = lock(&self.navigation);
            let previous = navigation.controller.current();
            let index = navigation.controller.step(offset);
            if index == previous {
                // A single slide: nothing moves, nothing to re-analyze.
                return index;
            }
            navigation.generation += 1;
            self.state.send_modify(|state| state.index = index);
            (index, navigation.generation)
        };

        tracing::info!("Slide {} ({:?})", index, cause);

        if cause == Cause::Manual && self.config.policy == AutoplayPolicy::ResetOnNavigation {
            if let Some(handle) = lock(&self.autoplay).as_ref() {
                handle.restart_period();
            }
        }

        self.request_analysis(index, generation);
        index
    }

    fn request_analysis(self: &Arc<Self>, index: usize, generation: u64) {
        let Some(locator) = self.images.get(index).map(str::to_owned) else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No Tokio runtime; slide {} is not analyzed", index);
            return;
        };
        let analyzer = Arc::clone(&self.analyzer);
        let weak = Arc::downgrade(self);

        let task = runtime.spawn(async move {
            let analysis = analyzer.request(&locator).await;
            if let Some(shared) = weak.upgrade() {
                shared.apply(generation, analysis.pair);
            }
        });

        let mut in_flight = lock(&self.in_flight);
        in_flight.retain(|task| !task.is_finished());
        in_flight.push(task);
    }
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        // The autoplay handle cancels itself when dropped.
        self.abort_in_flight();
    }
}

fn tick<S: ImageSource>(shared: &Weak<Shared<S>>) {
    if let Some(shared) = shared.upgrade() {
        shared.navigate(1, Cause::Autoplay);
    }
}

/// Lock a mutex, recovering the data if another thread panicked while
/// holding it. Every critical section here leaves the data consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
