//! Offline replay of recorded touch streams through a [`GestureDetector`].
//!
//! A replay runs a statum state machine over the script, one frame at a time. A frame is
//! every event up to and including the next move batch, which is the only event that can
//! produce a transform.
//!
//! # State Machine
//!
//! ```text
//! Waiting ──► Processing(FrameBatch) ──► Updating
//!    ▲                                      │
//!    └──────────────────────────────────────┘
//! ```

pub mod error;
pub mod script;

pub use error::ReplayError;
pub use script::{ListenerConfig, ReplayScript, ScriptContact, ScriptEvent};

use crate::config::DetectorConfig;
use crate::detector::{Fit, GestureDetector, GesturePhase, Solver, TouchEvent, TransformListener};
use crate::geometry::Matrix;
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info};

/// Transform delivered to the listener during a replay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub frame: usize,
    pub matrix: Matrix,
    pub consumed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub frame: usize,
    pub events: usize,
    pub solver: Option<Solver>,
    pub phase: GesturePhase,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub final_phase: GesturePhase,
    pub frames: Vec<FrameSummary>,
    pub emissions: Vec<Emission>,
}

impl ReplayReport {
    pub fn to_toml(&self) -> Result<String, ReplayError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// Events of one frame for the processing state
#[derive(Debug, Clone)]
pub struct FrameBatch {
    pub events: Vec<TouchEvent>,
}

// Listener answering from the script's consume policy
struct ScriptListener {
    consume_every: usize,
    calls: usize,
    outbox: Rc<RefCell<Vec<(Matrix, bool)>>>,
}

impl TransformListener for ScriptListener {
    fn on_transform(&mut self, _event: &TouchEvent, transform: &Matrix) -> bool {
        self.calls += 1;
        let consumed = self.consume_every != 0 && self.calls % self.consume_every == 0;
        self.outbox.borrow_mut().push((*transform, consumed));
        consumed
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum ReplayState {
    Waiting,
    Processing(FrameBatch),
    Updating,
}

#[machine]
#[derive(Debug)]
pub struct ReplayProcessor<S: ReplayState> {
    detector: GestureDetector,

    // Events not yet collected into a frame
    queue: VecDeque<TouchEvent>,

    // Transforms the listener saw during the current frame
    outbox: Rc<RefCell<Vec<(Matrix, bool)>>>,

    report: ReplayReport,

    frame: usize,
    frame_events: usize,
    frame_fit: Option<Fit>,
}

impl<S: ReplayState> ReplayProcessor<S> {
    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl ReplayProcessor<Waiting> {
    /// Builds the detector from `base` with the script's overrides applied on top.
    pub fn create(script: &ReplayScript, base: DetectorConfig) -> Result<Self, ReplayError> {
        if script.events.is_empty() {
            return Err(ReplayError::EmptyScript);
        }

        let config = script.detector.apply(base);
        info!(
            "Creating replay of {} events with config: {:?}",
            script.events.len(),
            config
        );

        let outbox = Rc::new(RefCell::new(Vec::new()));
        let listener = ScriptListener {
            consume_every: script.listener.consume_every,
            calls: 0,
            outbox: outbox.clone(),
        };
        let detector = GestureDetector::with_config(config, listener)
            .map_err(|source| ReplayError::Gesture { frame: 0, source })?;

        Ok(Self::new(
            detector,
            script.touch_events().into(),
            outbox,
            ReplayReport::default(),
            0,
            0,
            None,
        ))
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Collects the next frame and transitions to Processing
    pub fn wait_and_collect(mut self) -> ReplayProcessor<Processing> {
        let mut events = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            let is_move = matches!(event, TouchEvent::Move(_));
            events.push(event);
            if is_move {
                break;
            }
        }
        debug!("Frame {} collected {} events", self.frame, events.len());

        self.transition_with(FrameBatch { events })
    }

    pub fn finish(mut self) -> ReplayReport {
        self.report.final_phase = self.detector.phase();
        info!(
            "Replay finished after {} frames with {} emissions",
            self.report.frames.len(),
            self.report.emissions.len()
        );
        self.report
    }
}

impl ReplayProcessor<Processing> {
    /// Feeds the frame into the detector and transitions to Updating
    pub fn process_events(mut self) -> Result<ReplayProcessor<Updating>, ReplayError> {
        let events = self
            .get_state_data()
            .map(|batch| batch.events.clone())
            .unwrap_or_default();

        self.frame_events = events.len();
        self.frame_fit = None;
        for event in &events {
            let fit = self
                .detector
                .on_touch_event(event)
                .map_err(|source| ReplayError::Gesture {
                    frame: self.frame,
                    source,
                })?;
            if fit.is_some() {
                self.frame_fit = fit;
            }
        }

        Ok(self.transition())
    }
}

impl ReplayProcessor<Updating> {
    /// Moves the frame's emissions into the report and transitions back to Waiting
    pub fn update_report(mut self) -> ReplayProcessor<Waiting> {
        let frame = self.frame;
        let drained: Vec<_> = self.outbox.borrow_mut().drain(..).collect();
        for (matrix, consumed) in drained {
            debug!("Frame {} emitted {} (consumed: {})", frame, matrix, consumed);
            self.report.emissions.push(Emission {
                frame,
                matrix,
                consumed,
            });
        }

        self.report.frames.push(FrameSummary {
            frame,
            events: self.frame_events,
            solver: self.frame_fit.map(|fit| fit.solver),
            phase: self.detector.phase(),
        });
        self.frame += 1;

        self.transition()
    }
}

/// Runs a whole script and returns the report
pub fn run_replay(
    script: &ReplayScript,
    base: DetectorConfig,
) -> Result<ReplayReport, ReplayError> {
    let mut processor = ReplayProcessor::create(script, base)?;
    while !processor.is_finished() {
        let processing = processor.wait_and_collect();
        let updating = processing.process_events()?;
        processor = updating.update_report();
    }
    Ok(processor.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAG: &str = r#"
        [detector]
        touch_slop = 10.0

        [[events]]
        action = "begin"
        id = 0
        x = 0.0
        y = 0.0

        [[events]]
        action = "move"
        contacts = [{ id = 0, x = 5.0, y = 0.0 }]

        [[events]]
        action = "move"
        contacts = [{ id = 0, x = 20.0, y = 0.0 }]

        [[events]]
        action = "move"
        contacts = [{ id = 0, x = 50.0, y = 0.0 }]

        [[events]]
        action = "end"
        id = 0
        x = 50.0
        y = 0.0
    "#;

    #[test]
    fn frames_end_at_move_batches() {
        let script = ReplayScript::from_toml_str(DRAG).unwrap();
        let report = run_replay(&script, DetectorConfig::default()).unwrap();

        let sizes: Vec<_> = report.frames.iter().map(|f| f.events).collect();
        assert_eq!(sizes, vec![2, 1, 1, 1]);
        assert_eq!(report.frames[0].phase, GesturePhase::PreSlop);
        assert_eq!(report.frames[1].phase, GesturePhase::PostSlop);
        assert_eq!(report.frames[3].solver, None);
        assert_eq!(report.final_phase, GesturePhase::Idle);
    }

    #[test]
    fn emissions_sum_to_total_drag() {
        let script = ReplayScript::from_toml_str(DRAG).unwrap();
        let report = run_replay(&script, DetectorConfig::default()).unwrap();

        assert_eq!(report.emissions.len(), 2);
        assert!(report.emissions.iter().all(|e| e.consumed));
        let total = report
            .emissions
            .iter()
            .fold(Matrix::IDENTITY, |acc, e| e.matrix * acc);
        assert!(total.approx_eq(&Matrix::translate(50.0, 0.0), 1e-9));
    }

    #[test]
    fn processor_reports_detector_errors_with_frame() {
        let script = ReplayScript::from_toml_str(
            r#"
            [[events]]
            action = "move"
            contacts = [{ id = 4, x = 1.0, y = 1.0 }]
            "#,
        )
        .unwrap();
        let result = run_replay(&script, DetectorConfig::default());
        assert!(matches!(result, Err(ReplayError::Gesture { frame: 0, .. })));
    }

    #[test]
    fn empty_script_is_rejected() {
        let script = ReplayScript::default();
        assert!(matches!(
            run_replay(&script, DetectorConfig::default()),
            Err(ReplayError::EmptyScript)
        ));
    }

    #[test]
    fn report_serializes_to_toml() {
        let script = ReplayScript::from_toml_str(DRAG).unwrap();
        let report = run_replay(&script, DetectorConfig::default()).unwrap();
        let text = report.to_toml().unwrap();
        assert!(text.contains("final_phase = \"idle\""));
        assert!(text.contains("[[emissions]]"));
    }
}
