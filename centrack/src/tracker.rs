//! Centroid tracker: stable identities for per-frame bounding boxes
//!
//! Each frame's boxes are reduced to centroids and associated with the
//! previously tracked centroids by greedy nearest-neighbor matching.
//! Objects that go unmatched for more than `max_disappeared` consecutive
//! frames are deregistered; their ids are never handed out again.

use crate::assignment::{distance_matrix, greedy_assign};
use crate::bbox::{BoundingBox, Centroid, ObjectId};
use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Consecutive unmatched frames tolerated before an object is deregistered
    pub max_disappeared: u32,
}

impl TrackerConfig {
    pub const DEFAULT_MAX_DISAPPEARED: u32 = 50;

    pub fn new(max_disappeared: u32) -> Self {
        Self { max_disappeared }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: Self::DEFAULT_MAX_DISAPPEARED,
        }
    }
}

/// A registered object and its current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedObject {
    pub id: ObjectId,
    pub centroid: Centroid,
    /// number of consecutive frames without a matching detection
    pub disappeared: u32,
}

impl TrackedObject {
    fn new(id: ObjectId, centroid: Centroid) -> Self {
        Self {
            id,
            centroid,
            disappeared: 0,
        }
    }

    fn matched(&mut self, centroid: Centroid) {
        self.centroid = centroid;
        self.disappeared = 0;
    }

    fn missed(&mut self) {
        self.disappeared = self.disappeared.saturating_add(1);
    }
}

/// Greedy nearest-neighbor centroid tracker
#[derive(Debug, Clone)]
pub struct CentroidTracker {
    config: TrackerConfig,
    next_id: u64,
    objects: BTreeMap<ObjectId, TrackedObject>,
    deregistered: Vec<ObjectId>,
    n_steps: u64,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Ok(Self {
            config,
            next_id: 0,
            objects: BTreeMap::new(),
            deregistered: Vec::new(),
            n_steps: 0,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of successful `update` calls so far
    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    /// Main update function, called once per frame
    ///
    /// Returns the centroid of every registered object, including objects that
    /// were not matched this frame. Fails without touching any state if a box
    /// violates the detector contract.
    pub fn update(&mut self, boxes: &[BoundingBox]) -> Result<BTreeMap<ObjectId, Centroid>> {
        for (index, bbox) in boxes.iter().enumerate() {
            bbox.validate(index)?;
        }
        let inputs: Vec<Centroid> = boxes.iter().map(BoundingBox::centroid).collect();
        self.n_steps += 1;

        if inputs.is_empty() {
            self.mark_all_missed();
        } else if self.objects.is_empty() {
            for centroid in inputs {
                self.register(centroid);
            }
        } else {
            self.associate(&inputs);
        }

        Ok(self.centroids())
    }

    /// Match inputs against existing objects, then age or register the leftovers
    fn associate(&mut self, inputs: &[Centroid]) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        let existing: Vec<Centroid> = self.objects.values().map(|o| o.centroid).collect();

        let cost = distance_matrix(&existing, inputs);
        let result = greedy_assign(cost.view());

        log::trace!(
            "frame {}: {} objects, {} inputs, {} matched (cost {:.1})",
            self.n_steps,
            ids.len(),
            inputs.len(),
            result.assignments.len(),
            result.total_cost
        );

        for &(row, col) in &result.assignments {
            if let Some(object) = self.objects.get_mut(&ids[row]) {
                object.matched(inputs[col]);
            }
        }

        let missed: Vec<ObjectId> = result.unassigned_rows.iter().map(|&row| ids[row]).collect();
        self.mark_missed(&missed);

        for &col in &result.unassigned_cols {
            self.register(inputs[col]);
        }
    }

    fn mark_all_missed(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        self.mark_missed(&ids);
    }

    fn mark_missed(&mut self, ids: &[ObjectId]) {
        for id in ids {
            let expired = match self.objects.get_mut(id) {
                Some(object) => {
                    object.missed();
                    object.disappeared > self.config.max_disappeared
                }
                None => false,
            };
            if expired {
                self.deregister(*id);
            }
        }
    }

    fn register(&mut self, centroid: Centroid) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, TrackedObject::new(id, centroid));
        log::debug!("Registered {} at {}", id, centroid);
        id
    }

    fn deregister(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.remove(&id) {
            log::debug!(
                "Deregistered {} after {} missed frames (last seen at {})",
                id,
                object.disappeared,
                object.centroid
            );
            self.deregistered.push(id);
        }
    }

    /// Current id -> centroid mapping
    pub fn centroids(&self) -> BTreeMap<ObjectId, Centroid> {
        self.objects
            .iter()
            .map(|(id, object)| (*id, object.centroid))
            .collect()
    }

    /// Ids deregistered since the previous call, oldest first
    pub fn drain_deregistered(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.deregistered)
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    /// The id the next registered object will receive
    pub fn next_id(&self) -> ObjectId {
        ObjectId(self.next_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop all objects. The id counter keeps running so ids stay unique.
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            self.deregister(id);
        }
    }
}

/// Shorthand used by configuration loaders that accept signed input
impl TryFrom<i64> for TrackerConfig {
    type Error = TrackError;

    fn try_from(max_disappeared: i64) -> Result<Self> {
        u32::try_from(max_disappeared)
            .map(Self::new)
            .map_err(|_| {
                TrackError::config(format!(
                    "max_disappeared must be a non-negative frame count, got {}",
                    max_disappeared
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: i32, cy: i32) -> BoundingBox {
        BoundingBox::new(cx - 10, cy - 10, cx + 10, cy + 10)
    }

    fn tracker(max_disappeared: u32) -> CentroidTracker {
        CentroidTracker::new(TrackerConfig::new(max_disappeared)).unwrap()
    }

    #[test]
    fn test_first_update_registers_all() {
        let mut tracker = tracker(5);
        let out = tracker.update(&[square(50, 50), square(200, 80)]).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[&ObjectId(0)], Centroid::new(50, 50));
        assert_eq!(out[&ObjectId(1)], Centroid::new(200, 80));
        assert_eq!(tracker.next_id(), ObjectId(2));
    }

    #[test]
    fn test_empty_tracker_empty_input() {
        let mut tracker = tracker(5);
        assert!(tracker.update(&[]).unwrap().is_empty());
        assert!(tracker.is_empty());
        assert_eq!(tracker.next_id(), ObjectId(0));
    }

    #[test]
    fn test_smooth_motion_keeps_single_id() {
        let mut tracker = tracker(3);
        for step in 0..40 {
            let out = tracker.update(&[square(20 + step * 15, 100 + step)]).unwrap();
            assert_eq!(out.len(), 1);
            assert!(out.contains_key(&ObjectId(0)));
        }
        assert_eq!(tracker.next_id(), ObjectId(1));
    }

    #[test]
    fn test_short_gap_retains_id() {
        let max_disappeared = 4;
        let mut tracker = tracker(max_disappeared);
        tracker.update(&[square(100, 100)]).unwrap();

        for k in 1..=max_disappeared {
            let out = tracker.update(&[]).unwrap();
            // Sticky: the last centroid is still reported while missing
            assert_eq!(out[&ObjectId(0)], Centroid::new(100, 100));
            assert_eq!(tracker.get(ObjectId(0)).unwrap().disappeared, k);
        }

        let out = tracker.update(&[square(104, 102)]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[&ObjectId(0)], Centroid::new(104, 102));
        assert_eq!(tracker.get(ObjectId(0)).unwrap().disappeared, 0);
    }

    #[test]
    fn test_long_gap_deregisters_and_issues_new_id() {
        let max_disappeared = 2;
        let mut tracker = tracker(max_disappeared);
        tracker.update(&[square(100, 100)]).unwrap();

        for _ in 0..=max_disappeared {
            tracker.update(&[]).unwrap();
        }
        assert!(tracker.is_empty());
        assert_eq!(tracker.drain_deregistered(), vec![ObjectId(0)]);
        assert!(tracker.drain_deregistered().is_empty());

        let out = tracker.update(&[square(100, 100)]).unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![ObjectId(1)]);
    }

    #[test]
    fn test_zero_max_disappeared_drops_on_first_miss() {
        let mut tracker = tracker(0);
        tracker.update(&[square(10, 10)]).unwrap();
        let out = tracker.update(&[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_updates_increment_by_one() {
        let mut tracker = tracker(10);
        tracker.update(&[square(10, 10), square(300, 300)]).unwrap();
        for k in 1..=6 {
            tracker.update(&[]).unwrap();
            assert_eq!(tracker.len(), 2);
            for object in tracker.objects() {
                assert_eq!(object.disappeared, k);
            }
        }
    }

    #[test]
    fn test_new_detection_registers_alongside_existing() {
        let mut tracker = tracker(5);
        tracker.update(&[square(100, 100)]).unwrap();
        let out = tracker
            .update(&[square(500, 400), square(103, 101)])
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[&ObjectId(0)], Centroid::new(103, 101));
        assert_eq!(out[&ObjectId(1)], Centroid::new(500, 400));
    }

    #[test]
    fn test_unmatched_object_ages_while_others_match() {
        let mut tracker = tracker(5);
        tracker.update(&[square(100, 100), square(400, 100)]).unwrap();
        tracker.update(&[square(405, 100)]).unwrap();

        assert_eq!(tracker.get(ObjectId(0)).unwrap().disappeared, 1);
        assert_eq!(tracker.get(ObjectId(1)).unwrap().disappeared, 0);
        assert_eq!(tracker.get(ObjectId(1)).unwrap().centroid, Centroid::new(405, 100));
    }

    #[test]
    fn test_unmatched_row_deregisters_during_matching() {
        let mut tracker = tracker(1);
        tracker.update(&[square(100, 100), square(400, 100)]).unwrap();
        tracker.update(&[square(405, 100)]).unwrap();
        assert_eq!(tracker.get(ObjectId(0)).unwrap().disappeared, 1);

        // Second consecutive miss exceeds the limit while ID 1 keeps matching
        let out = tracker.update(&[square(410, 100)]).unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![ObjectId(1)]);
        assert_eq!(out[&ObjectId(1)], Centroid::new(410, 100));
        assert_eq!(tracker.drain_deregistered(), vec![ObjectId(0)]);
        assert_eq!(tracker.next_id(), ObjectId(2));
    }

    #[test]
    fn test_boxes_at_coordinate_extremes() {
        let mut tracker = tracker(5);
        let far = BoundingBox::new(i32::MAX - 10, 0, i32::MAX, 10);
        let near = BoundingBox::new(i32::MIN, -10, i32::MIN + 10, 0);

        let out = tracker.update(&[far, near]).unwrap();
        assert_eq!(out[&ObjectId(0)], Centroid::new(i32::MAX - 5, 5));
        assert_eq!(out[&ObjectId(1)], Centroid::new(i32::MIN + 5, -5));

        let out = tracker.update(&[near, far]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[&ObjectId(0)], Centroid::new(i32::MAX - 5, 5));
        assert_eq!(tracker.next_id(), ObjectId(2));
    }

    #[test]
    fn test_step_counter_skips_rejected_updates() {
        let mut tracker = tracker(5);
        tracker.update(&[square(10, 10)]).unwrap();
        tracker.update(&[]).unwrap();
        assert!(tracker.update(&[BoundingBox::new(5, 5, 0, 0)]).is_err());
        assert_eq!(tracker.n_steps(), 2);
    }

    #[test]
    fn test_tie_break_prefers_lowest_id() {
        // Two objects equidistant from a single new detection
        let mut tracker = tracker(5);
        tracker.update(&[square(100, 100), square(120, 100)]).unwrap();
        let out = tracker.update(&[square(110, 100)]).unwrap();

        assert_eq!(out[&ObjectId(0)], Centroid::new(110, 100));
        assert_eq!(out[&ObjectId(1)], Centroid::new(120, 100));
        assert_eq!(tracker.get(ObjectId(1)).unwrap().disappeared, 1);
    }

    #[test]
    fn test_matching_is_reproducible() {
        let frames: Vec<Vec<BoundingBox>> = vec![
            vec![square(100, 100), square(300, 100)],
            vec![square(200, 100), square(205, 100), square(195, 100)],
            vec![square(210, 100), square(190, 100)],
            vec![],
            vec![square(215, 102), square(185, 98), square(600, 50)],
        ];

        let run = || {
            let mut tracker = tracker(5);
            frames
                .iter()
                .map(|boxes| tracker.update(boxes).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_malformed_box_rejected_without_mutation() {
        let mut tracker = tracker(5);
        tracker.update(&[square(100, 100)]).unwrap();

        let bad = BoundingBox::new(50, 50, 40, 60);
        let err = tracker.update(&[square(102, 100), bad]).unwrap_err();
        assert_eq!(err, TrackError::InputContractViolation { index: 1, bbox: bad });

        let object = tracker.get(ObjectId(0)).unwrap();
        assert_eq!(object.centroid, Centroid::new(100, 100));
        assert_eq!(object.disappeared, 0);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.next_id(), ObjectId(1));
    }

    #[test]
    fn test_clear_keeps_id_counter() {
        let mut tracker = tracker(5);
        tracker.update(&[square(1, 1), square(100, 100)]).unwrap();
        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.drain_deregistered(), vec![ObjectId(0), ObjectId(1)]);

        let out = tracker.update(&[square(1, 1)]).unwrap();
        assert!(out.contains_key(&ObjectId(2)));
    }

    #[test]
    fn test_negative_max_disappeared_rejected() {
        assert!(matches!(
            TrackerConfig::try_from(-1i64),
            Err(TrackError::Configuration(_))
        ));
        assert_eq!(TrackerConfig::try_from(7i64).unwrap(), TrackerConfig::new(7));
        assert_eq!(TrackerConfig::default().max_disappeared, 50);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = tracker(5);
        let mut b = tracker(5);
        a.update(&[square(1, 1), square(50, 50)]).unwrap();
        let out = b.update(&[square(1, 1)]).unwrap();
        assert!(out.contains_key(&ObjectId(0)));
        assert_eq!(b.next_id(), ObjectId(1));
        assert_eq!(a.next_id(), ObjectId(2));
    }
}
