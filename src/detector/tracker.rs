//! Live contact registry.
//!
//! Pointers are kept in a `BTreeMap` keyed by id, so snapshots always list pointers in
//! ascending id order and a "before" and "after" snapshot taken around one move batch are
//! index-aligned.

use crate::detector::error::GestureError;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

// Opaque contact identifier, unique while the contact is down
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pointer {
    /// Where the contact went down; only recorded while the gesture is still inside slop
    pub start: Option<Point>,
    pub position: Point,
}

#[derive(Debug)]
pub struct PointerTracker {
    pointers: BTreeMap<PointerId, Pointer>,
    past_slop: bool,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            pointers: BTreeMap::new(),
            past_slop: false,
        }
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.pointers.contains_key(&id)
    }

    pub fn get(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    /// Sticky for the whole gesture; cleared when a new gesture starts.
    pub fn is_past_slop(&self) -> bool {
        self.past_slop
    }

    pub fn begin(&mut self, id: PointerId, position: Point) -> Result<(), GestureError> {
        if self.pointers.contains_key(&id) {
            warn!("Begin for pointer {} which is already active", id);
            return Err(GestureError::DuplicatePointer(id));
        }

        if self.pointers.is_empty() {
            info!("Gesture started by pointer {} at ({:.1}, {:.1})", id, position.x, position.y);
            self.past_slop = false;
        }

        let start = (!self.past_slop).then_some(position);
        self.pointers.insert(id, Pointer { start, position });
        debug!("Pointer {} down, {} active", id, self.pointers.len());
        Ok(())
    }

    /// Moves a single pointer, evaluating slop against that pointer's own start.
    pub fn move_to(
        &mut self,
        id: PointerId,
        position: Point,
        touch_slop: f64,
    ) -> Result<(), GestureError> {
        let pointer = self.pointers.get_mut(&id).ok_or_else(|| {
            warn!("Move for unknown pointer {}", id);
            GestureError::UnknownPointer(id)
        })?;

        if !self.past_slop {
            if let Some(start) = pointer.start {
                let distance = start.distance(position);
                if distance >= touch_slop {
                    info!(
                        "Pointer {} moved {:.2} from its start, slop {:.2} exceeded",
                        id, distance, touch_slop
                    );
                    self.past_slop = true;
                }
            }
        }

        pointer.position = position;
        Ok(())
    }

    /// Applies a whole move batch. Every id is checked first so an unknown pointer leaves
    /// the tracker untouched.
    pub fn apply_moves<I>(&mut self, moves: I, touch_slop: f64) -> Result<(), GestureError>
    where
        I: IntoIterator<Item = (PointerId, Point)> + Clone,
    {
        if let Some((id, _)) = moves
            .clone()
            .into_iter()
            .find(|(id, _)| !self.pointers.contains_key(id))
        {
            warn!("Move batch references unknown pointer {}", id);
            return Err(GestureError::UnknownPointer(id));
        }

        for (id, position) in moves {
            self.move_to(id, position, touch_slop)?;
        }
        Ok(())
    }

    /// Records the final position and forgets the pointer, start position included.
    pub fn end(&mut self, id: PointerId, position: Point) -> Result<Pointer, GestureError> {
        let mut pointer = self.pointers.remove(&id).ok_or_else(|| {
            warn!("End for unknown pointer {}", id);
            GestureError::UnknownPointer(id)
        })?;
        pointer.position = position;

        debug!("Pointer {} up, {} active", id, self.pointers.len());
        if self.pointers.is_empty() {
            info!("Gesture finished (past slop: {})", self.past_slop);
        }
        Ok(pointer)
    }

    /// Current positions in ascending id order.
    pub fn snapshot(&self) -> Vec<Point> {
        self.pointers.values().map(|p| p.position).collect()
    }

    pub fn ids(&self) -> Vec<PointerId> {
        self.pointers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn begin_records_start_and_position() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(3), p(1.0, 2.0)).unwrap();
        let pointer = tracker.get(PointerId(3)).unwrap();
        assert_eq!(pointer.start, Some(p(1.0, 2.0)));
        assert_eq!(pointer.position, p(1.0, 2.0));
    }

    #[test]
    fn duplicate_begin_is_rejected() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(1), p(0.0, 0.0)).unwrap();
        assert_eq!(
            tracker.begin(PointerId(1), p(5.0, 5.0)),
            Err(GestureError::DuplicatePointer(PointerId(1)))
        );
        assert_eq!(tracker.get(PointerId(1)).unwrap().position, p(0.0, 0.0));
    }

    #[test]
    fn slop_is_sticky_and_gesture_wide() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(0), p(0.0, 0.0)).unwrap();
        tracker.begin(PointerId(1), p(100.0, 0.0)).unwrap();

        tracker.move_to(PointerId(0), p(3.0, 4.0), 10.0).unwrap();
        assert!(!tracker.is_past_slop());

        tracker.move_to(PointerId(1), p(106.0, 8.0), 10.0).unwrap();
        assert!(tracker.is_past_slop());

        tracker.move_to(PointerId(1), p(100.0, 0.0), 10.0).unwrap();
        assert!(tracker.is_past_slop());
    }

    #[test]
    fn pointer_added_after_slop_has_no_start() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(0), p(0.0, 0.0)).unwrap();
        tracker.move_to(PointerId(0), p(20.0, 0.0), 10.0).unwrap();
        tracker.begin(PointerId(1), p(50.0, 50.0)).unwrap();
        assert_eq!(tracker.get(PointerId(1)).unwrap().start, None);
    }

    #[test]
    fn new_gesture_clears_slop() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(0), p(0.0, 0.0)).unwrap();
        tracker.move_to(PointerId(0), p(20.0, 0.0), 10.0).unwrap();
        tracker.end(PointerId(0), p(20.0, 0.0)).unwrap();
        assert!(tracker.is_empty());

        tracker.begin(PointerId(0), p(0.0, 0.0)).unwrap();
        assert!(!tracker.is_past_slop());
    }

    #[test]
    fn unknown_pointer_in_batch_changes_nothing() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(0), p(0.0, 0.0)).unwrap();
        let batch = vec![(PointerId(0), p(50.0, 0.0)), (PointerId(9), p(1.0, 1.0))];
        assert_eq!(
            tracker.apply_moves(batch, 10.0),
            Err(GestureError::UnknownPointer(PointerId(9)))
        );
        assert_eq!(tracker.snapshot(), vec![p(0.0, 0.0)]);
        assert!(!tracker.is_past_slop());
    }

    #[test]
    fn end_unknown_pointer_fails() {
        let mut tracker = PointerTracker::new();
        assert_eq!(
            tracker.end(PointerId(4), p(0.0, 0.0)),
            Err(GestureError::UnknownPointer(PointerId(4)))
        );
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let mut tracker = PointerTracker::new();
        tracker.begin(PointerId(7), p(7.0, 0.0)).unwrap();
        tracker.begin(PointerId(2), p(2.0, 0.0)).unwrap();
        tracker.begin(PointerId(5), p(5.0, 0.0)).unwrap();
        assert_eq!(tracker.ids(), vec![PointerId(2), PointerId(5), PointerId(7)]);
        assert_eq!(tracker.snapshot(), vec![p(2.0, 0.0), p(5.0, 0.0), p(7.0, 0.0)]);
    }
}
