// Quality gating for external vision measurements and landmark
// acquisition bookkeeping.
//
// A frame only contributes to the pose estimate after passing three gates
// in order: range, ambiguity, then derived confidence. Rejections carry
// the specific gate that failed so the runtime can log something useful.

use thiserror::Error;

use crate::chassis::types::Pose;
use crate::config;
use crate::messages::{LandmarkObservation, VisionFrame};

/// A vision frame that has passed the quality gate, ready for fusion.
/// Transient; never stored beyond the fusion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionMeasurement {
    pub pose: Pose,
    pub stamp_s: f64,
    pub range_m: f64,
    pub ambiguity: f64,
    pub confidence: f64,
}

/// Why a vision frame was not fused.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GateRejection {
    #[error("frame carries no pose estimate")]
    NoPose,
    #[error("frame carries no landmark observations")]
    NoLandmarks,
    #[error("range {range_m:.2} m exceeds limit {max_m:.2} m")]
    RangeExceeded { range_m: f64, max_m: f64 },
    #[error("ambiguity {ambiguity:.3} exceeds limit {max:.3}")]
    AmbiguityExceeded { ambiguity: f64, max: f64 },
    #[error("confidence {confidence:.3} below minimum {min:.3}")]
    ConfidenceBelow { confidence: f64, min: f64 },
}

/// Confidence falls off monotonically with ambiguity: 1 at zero
/// ambiguity, 0.5 at ambiguity 1.
pub fn confidence_from_ambiguity(ambiguity: f64) -> f64 {
    1.0 / (1.0 + ambiguity.max(0.0))
}

#[derive(Debug, Clone, Copy)]
pub struct VisionGate {
    pub max_range_m: f64,
    pub max_ambiguity: f64,
    pub min_confidence: f64,
}

impl Default for VisionGate {
    fn default() -> Self {
        Self {
            max_range_m: config::VISION_MAX_RANGE_M,
            max_ambiguity: config::VISION_MAX_AMBIGUITY,
            min_confidence: config::VISION_MIN_CONFIDENCE,
        }
    }
}

impl VisionGate {
    /// Gate a frame on the quality of its best (lowest-ambiguity)
    /// landmark. Gates are checked in range, ambiguity, confidence order
    /// and the first failure wins.
    pub fn evaluate(&self, frame: &VisionFrame) -> Result<VisionMeasurement, GateRejection> {
        let pose = frame.pose.ok_or(GateRejection::NoPose)?;
        let best = frame
            .landmarks
            .iter()
            .min_by(|a, b| a.ambiguity.total_cmp(&b.ambiguity))
            .ok_or(GateRejection::NoLandmarks)?;

        if best.range_m >= self.max_range_m {
            return Err(GateRejection::RangeExceeded {
                range_m: best.range_m,
                max_m: self.max_range_m,
            });
        }
        if best.ambiguity >= self.max_ambiguity {
            return Err(GateRejection::AmbiguityExceeded {
                ambiguity: best.ambiguity,
                max: self.max_ambiguity,
            });
        }
        let confidence = confidence_from_ambiguity(best.ambiguity);
        if confidence < self.min_confidence {
            return Err(GateRejection::ConfidenceBelow {
                confidence,
                min: self.min_confidence,
            });
        }

        Ok(VisionMeasurement {
            pose,
            stamp_s: frame.stamp_s,
            range_m: best.range_m,
            ambiguity: best.ambiguity,
            confidence,
        })
    }
}

/// Tracks which landmark was most recently (re)acquired. Diagnostic only;
/// fusion does not depend on it.
#[derive(Debug, Default)]
pub struct AcquisitionTracker {
    acquired_id: Option<u32>,
    previous_ids: Vec<u32>,
}

impl AcquisitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one cycle's visible landmark set. An empty set leaves the
    /// acquired id untouched; it is overwritten, never cleared.
    pub fn observe(&mut self, landmarks: &[LandmarkObservation]) -> Option<u32> {
        if landmarks.is_empty() {
            self.previous_ids.clear();
            return self.acquired_id;
        }

        let chosen = if landmarks.len() == 1 {
            landmarks[0].id
        } else if let Some(reappeared) = landmarks
            .iter()
            .find(|landmark| !self.previous_ids.contains(&landmark.id))
        {
            // A landmark absent last cycle takes priority over a
            // better-seen one that never went away
            reappeared.id
        } else {
            // Nothing new: fall back to the most confident sighting
            landmarks
                .iter()
                .min_by(|a, b| a.ambiguity.total_cmp(&b.ambiguity))
                .map(|landmark| landmark.id)?
        };

        self.previous_ids.clear();
        self.previous_ids
            .extend(landmarks.iter().map(|landmark| landmark.id));
        self.acquired_id = Some(chosen);
        self.acquired_id
    }

    pub fn acquired_id(&self) -> Option<u32> {
        self.acquired_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark(id: u32, range_m: f64, ambiguity: f64) -> LandmarkObservation {
        LandmarkObservation {
            id,
            range_m,
            ambiguity,
        }
    }

    fn frame(landmarks: Vec<LandmarkObservation>) -> VisionFrame {
        VisionFrame {
            stamp_s: 10.0,
            pose: Some(Pose::new(1.0, 2.0, 0.3)),
            landmarks,
        }
    }

    #[test]
    fn test_good_frame_passes() {
        let gate = VisionGate::default();
        let measurement = gate
            .evaluate(&frame(vec![landmark(7, 2.0, 0.1)]))
            .unwrap();
        assert_eq!(measurement.pose, Pose::new(1.0, 2.0, 0.3));
        assert_eq!(measurement.stamp_s, 10.0);
        assert!((measurement.confidence - 1.0 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_gates_fire_in_order() {
        let gate = VisionGate::default();

        // Too far, even though ambiguity is fine
        assert_eq!(
            gate.evaluate(&frame(vec![landmark(1, 6.0, 0.1)])),
            Err(GateRejection::RangeExceeded {
                range_m: 6.0,
                max_m: config::VISION_MAX_RANGE_M
            })
        );

        // In range, too ambiguous
        assert_eq!(
            gate.evaluate(&frame(vec![landmark(1, 2.0, 0.5)])),
            Err(GateRejection::AmbiguityExceeded {
                ambiguity: 0.5,
                max: config::VISION_MAX_AMBIGUITY
            })
        );

        // Confidence gate needs a floor the ambiguity gate would pass
        let strict = VisionGate {
            min_confidence: 0.95,
            ..VisionGate::default()
        };
        assert_eq!(
            strict.evaluate(&frame(vec![landmark(1, 2.0, 0.2)])),
            Err(GateRejection::ConfidenceBelow {
                confidence: confidence_from_ambiguity(0.2),
                min: 0.95
            })
        );
    }

    #[test]
    fn test_gate_uses_lowest_ambiguity_landmark() {
        let gate = VisionGate::default();
        // The ambiguous landmark would fail; the clean one carries the frame
        let measurement = gate
            .evaluate(&frame(vec![landmark(3, 2.0, 0.9), landmark(4, 3.0, 0.05)]))
            .unwrap();
        assert_eq!(measurement.ambiguity, 0.05);
        assert_eq!(measurement.range_m, 3.0);
    }

    #[test]
    fn test_poseless_and_empty_frames_reject() {
        let gate = VisionGate::default();

        let mut no_pose = frame(vec![landmark(1, 2.0, 0.1)]);
        no_pose.pose = None;
        assert_eq!(gate.evaluate(&no_pose), Err(GateRejection::NoPose));

        assert_eq!(
            gate.evaluate(&frame(vec![])),
            Err(GateRejection::NoLandmarks)
        );
    }

    #[test]
    fn test_acquired_id_persists_through_empty_cycles() {
        let mut tracker = AcquisitionTracker::new();
        assert_eq!(tracker.observe(&[landmark(5, 2.0, 0.1)]), Some(5));
        assert_eq!(tracker.observe(&[]), Some(5));
        assert_eq!(tracker.observe(&[]), Some(5));
        assert_eq!(tracker.acquired_id(), Some(5));
    }

    #[test]
    fn test_newly_appeared_landmark_wins() {
        let mut tracker = AcquisitionTracker::new();
        tracker.observe(&[landmark(5, 2.0, 0.05)]);
        // 7 appears alongside 5; it wins despite worse ambiguity
        assert_eq!(
            tracker.observe(&[landmark(5, 2.0, 0.05), landmark(7, 4.0, 0.2)]),
            Some(7)
        );
    }

    #[test]
    fn test_no_new_landmark_falls_back_to_confidence() {
        let mut tracker = AcquisitionTracker::new();
        tracker.observe(&[landmark(5, 2.0, 0.05), landmark(7, 4.0, 0.2)]);
        // Same pair again: nothing newly appeared, best ambiguity wins
        assert_eq!(
            tracker.observe(&[landmark(7, 4.0, 0.2), landmark(5, 2.0, 0.05)]),
            Some(5)
        );
    }

    #[test]
    fn test_single_landmark_always_acquires() {
        let mut tracker = AcquisitionTracker::new();
        tracker.observe(&[landmark(5, 2.0, 0.05), landmark(7, 4.0, 0.2)]);
        assert_eq!(tracker.observe(&[landmark(7, 4.0, 0.2)]), Some(7));
    }
}
