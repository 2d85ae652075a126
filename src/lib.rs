//! Freeform multi-touch transform gestures.
//!
//! Turns a stream of contact begin/move/end events into transformation matrices: one
//! finger drags, two fingers rotate and scale, three add skew and four add perspective.
//!
//! ```
//! use freeform_gesture::{Contact, GestureDetector, Matrix, TouchEvent};
//!
//! let mut detector = GestureDetector::builder()
//!     .touch_slop(10.0)
//!     .listener(|_: &TouchEvent, transform: &Matrix| {
//!         println!("transform: {}", transform);
//!         true
//!     })
//!     .build()?;
//!
//! detector.on_touch_event(&TouchEvent::Begin(Contact::at(0, 0.0, 0.0)))?;
//! detector.on_touch_event(&TouchEvent::Move(vec![Contact::at(0, 40.0, 0.0)]))?;
//! detector.on_touch_event(&TouchEvent::End(Contact::at(0, 40.0, 0.0)))?;
//! # Ok::<(), freeform_gesture::GestureError>(())
//! ```

pub mod config;
pub mod detector;
pub mod geometry;
pub mod replay;

pub use config::DetectorConfig;
pub use detector::{
    Contact, DetectorBuilder, Fit, GestureDetector, GestureError, GesturePhase, PointerId,
    Solver, TouchEvent, TransformListener,
};
pub use geometry::{Matrix, Point};
