//! Freeform transform gesture detection
//!
//! Implements a three-stage pipeline that runs to completion inside every
//! [`GestureDetector::on_touch_event`] call:
//!
//! 1. [`tracker`] - Active contact registry and slop evaluation
//! 2. [`fitter`] - Best-fit transform between the before and after snapshots of a move batch
//! 3. [`accumulator`] - Composition of fitted deltas until the listener consumes them
//!
//! # Architecture
//!
//! ```text
//! TouchEvent ──► Tracker ──► Fitter ──► Accumulator ──► TransformListener
//!                (before/after)  (delta)   (slop gated)
//! ```
//!
//! # Phases
//!
//! ```text
//! Idle ──► PreSlop ──► PostSlop
//!   ▲         │            │
//!   └─────────┴────────────┘
//!      (last contact ends)
//! ```

pub mod accumulator;
pub mod error;
pub mod fitter;
pub mod tracker;

pub use accumulator::{Accumulator, GesturePhase};
pub use error::GestureError;
pub use fitter::{Fit, Solver};
pub use tracker::{Pointer, PointerId, PointerTracker};

use crate::config::{validate_max_pointers, validate_touch_slop, DetectorConfig};
use crate::geometry::Matrix;
use kurbo::Point;
use std::fmt;
use tracing::{debug, info, trace};

/// One contact position inside a touch event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub id: PointerId,
    pub position: Point,
}

impl Contact {
    pub fn new(id: PointerId, position: Point) -> Self {
        Self { id, position }
    }

    pub fn at(id: u32, x: f64, y: f64) -> Self {
        Self::new(PointerId(id), Point::new(x, y))
    }
}

/// Input records the detector consumes
///
/// The stream must be well formed: every id in `Move`/`End`/`Cancel` has an earlier
/// unmatched `Begin`, and ids are not reused while active. Contacts lift one at a time,
/// so simultaneous lifts arrive as consecutive `End` events.
#[derive(Clone, Debug, PartialEq)]
pub enum TouchEvent {
    /// A contact went down
    Begin(Contact),
    /// Positions of the contacts that moved within one update
    Move(Vec<Contact>),
    /// A contact lifted
    End(Contact),
    /// A contact was cancelled by the event source; handled like `End`
    Cancel(Contact),
}

/// Receives accumulated transforms once a gesture is past slop
pub trait TransformListener {
    /// Called with the move event that produced the transform and the transform
    /// accumulated since the last consumed call.
    ///
    /// Returning `false` keeps accumulating: the next call carries this transform
    /// composed with the following deltas.
    fn on_transform(&mut self, event: &TouchEvent, transform: &Matrix) -> bool;
}

impl<F> TransformListener for F
where
    F: FnMut(&TouchEvent, &Matrix) -> bool,
{
    fn on_transform(&mut self, event: &TouchEvent, transform: &Matrix) -> bool {
        self(event, transform)
    }
}

/// Detects drag, pinch-rotate-scale and free multi-touch distortion gestures
///
/// One instance serves one serial event stream. Excess pointers beyond `max_pointers`
/// still move and count towards slop but are ignored by the fitter.
pub struct GestureDetector {
    listener: Box<dyn TransformListener>,
    config: DetectorConfig,
    tracker: PointerTracker,
    accumulator: Accumulator,
}

impl fmt::Debug for GestureDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureDetector")
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}

impl GestureDetector {
    /// Creates a detector with the default configuration.
    pub fn new<L: TransformListener + 'static>(listener: L) -> Self {
        Self::from_parts(DetectorConfig::default(), Box::new(listener))
    }

    pub fn with_config<L: TransformListener + 'static>(
        config: DetectorConfig,
        listener: L,
    ) -> Result<Self, GestureError> {
        config.validate()?;
        Ok(Self::from_parts(config, Box::new(listener)))
    }

    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::default()
    }

    fn from_parts(config: DetectorConfig, listener: Box<dyn TransformListener>) -> Self {
        info!("Creating gesture detector with config: {:?}", config);
        Self {
            listener,
            config,
            tracker: PointerTracker::new(),
            accumulator: Accumulator::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn touch_slop(&self) -> f64 {
        self.config.touch_slop
    }

    pub fn set_touch_slop(&mut self, touch_slop: f64) -> Result<(), GestureError> {
        validate_touch_slop(touch_slop)?;
        debug!("Touch slop set to {}", touch_slop);
        self.config.touch_slop = touch_slop;
        Ok(())
    }

    pub fn max_pointers(&self) -> usize {
        self.config.max_pointers
    }

    /// Limits the degrees of freedom: 2 allows translation, rotation and scale only.
    pub fn set_max_pointers(&mut self, max_pointers: usize) -> Result<(), GestureError> {
        validate_max_pointers(max_pointers)?;
        debug!("Max pointers set to {}", max_pointers);
        self.config.max_pointers = max_pointers;
        Ok(())
    }

    pub fn phase(&self) -> GesturePhase {
        if self.tracker.is_empty() {
            GesturePhase::Idle
        } else if self.tracker.is_past_slop() {
            GesturePhase::PostSlop
        } else {
            GesturePhase::PreSlop
        }
    }

    /// Transform composed since the listener last consumed one
    pub fn accumulated(&self) -> &Matrix {
        self.accumulator.matrix()
    }

    pub fn has_pending(&self) -> bool {
        self.accumulator.has_pending()
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// Feeds one event through the pipeline.
    ///
    /// Returns the fit computed for a move batch, or `None` for begin/end events and for
    /// batches with nothing to fit. Contract violations fail without changing state.
    pub fn on_touch_event(&mut self, event: &TouchEvent) -> Result<Option<Fit>, GestureError> {
        match event {
            TouchEvent::Begin(contact) => {
                self.tracker.begin(contact.id, contact.position)?;
                Ok(None)
            }
            TouchEvent::Move(contacts) => self.apply_update(event, contacts),
            TouchEvent::End(contact) | TouchEvent::Cancel(contact) => {
                self.tracker.end(contact.id, contact.position)?;
                if self.tracker.is_empty() {
                    debug!("Back to idle, discarding accumulated transform");
                    self.accumulator.reset();
                }
                Ok(None)
            }
        }
    }

    fn apply_update(
        &mut self,
        event: &TouchEvent,
        contacts: &[Contact],
    ) -> Result<Option<Fit>, GestureError> {
        let before = self.tracker.snapshot();
        self.tracker.apply_moves(
            contacts.iter().map(|c| (c.id, c.position)),
            self.config.touch_slop,
        )?;
        let after = self.tracker.snapshot();

        let Some(fit) = fitter::fit(&before, &after, self.config.max_pointers) else {
            trace!("No correspondences to fit for {} pointers", before.len());
            return Ok(None);
        };

        // Only the fitted correspondences count as motion; pointers past the cap are ignored.
        let fitted = fit.solver.correspondences();
        if before[..fitted] == after[..fitted] {
            trace!("Move batch without fitted motion, nothing to dispatch");
            return Ok(Some(Fit {
                matrix: Matrix::IDENTITY,
                solver: fit.solver,
            }));
        }

        debug!("{} fit over {} pointers: {}", fit.solver, after.len(), fit.matrix);
        self.accumulator.compose(&fit.matrix);

        if self.tracker.is_past_slop() {
            self.dispatch(event);
        }
        Ok(Some(fit))
    }

    fn dispatch(&mut self, event: &TouchEvent) {
        let transform = *self.accumulator.matrix();
        if self.listener.on_transform(event, &transform) {
            trace!("Listener consumed {}", transform);
            self.accumulator.consume();
        } else {
            debug!("Listener did not consume transform, accumulating");
        }
    }
}

/// Builder that checks configuration and listener presence up front
#[derive(Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
    listener: Option<Box<dyn TransformListener>>,
}

impl DetectorBuilder {
    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn touch_slop(mut self, touch_slop: f64) -> Self {
        self.config.touch_slop = touch_slop;
        self
    }

    pub fn max_pointers(mut self, max_pointers: usize) -> Self {
        self.config.max_pointers = max_pointers;
        self
    }

    pub fn listener<L: TransformListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn build(self) -> Result<GestureDetector, GestureError> {
        let listener = self.listener.ok_or(GestureError::MissingListener)?;
        self.config.validate()?;
        Ok(GestureDetector::from_parts(self.config, listener))
    }
}
