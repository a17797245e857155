//! Continuous haptic feedback driven by two-point distance changes.

use shared::{
    Hand, HAPTIC_PULSE_DISTANCE, HAPTIC_PULSE_DURATION_MS, HAPTIC_PULSE_FIRST_DURATION_MS,
    HAPTIC_PULSE_FIRST_STRENGTH, HAPTIC_PULSE_MAX_STRENGTH,
};

use crate::platform::Platform;
use crate::scanner::JointInfo;

/// Fires one strong pulse on `start`, then a small fixed-strength pulse every
/// time the tracked controller-to-controller distance moves by more than
/// `HAPTIC_PULSE_DISTANCE / frequency_scale`. Raising the frequency scale makes
/// the clicks denser; the reject watchdog uses that to signal growing strain.
pub struct HapticBuddy {
    hand: Hand,
    enabled: bool,
    frequency_scale: f32,
    last_pulse_distance: f32,
}

impl HapticBuddy {
    pub fn new(hand: Hand) -> HapticBuddy {
        HapticBuddy {
            hand,
            enabled: false,
            frequency_scale: 1.0,
            last_pulse_distance: 0.0,
        }
    }

    pub fn set_frequency_scale(&mut self, frequency_scale: f32) {
        self.frequency_scale = frequency_scale;
    }

    pub fn start(&mut self, platform: &dyn Platform, my_hand: &JointInfo, other_hand: &JointInfo) {
        platform.trigger_haptic_pulse(
            HAPTIC_PULSE_FIRST_STRENGTH,
            HAPTIC_PULSE_FIRST_DURATION_MS,
            self.hand,
        );
        self.enabled = true;
        self.last_pulse_distance = controller_distance(my_hand, other_hand);
    }

    pub fn update(&mut self, platform: &dyn Platform, my_hand: &JointInfo, other_hand: &JointInfo) {
        if !self.enabled {
            return;
        }
        let distance = controller_distance(my_hand, other_hand);
        if (self.last_pulse_distance - distance).abs() > HAPTIC_PULSE_DISTANCE / self.frequency_scale
        {
            self.last_pulse_distance = distance;
            platform.trigger_haptic_pulse(
                HAPTIC_PULSE_MAX_STRENGTH,
                HAPTIC_PULSE_DURATION_MS,
                self.hand,
            );
        }
    }

    pub fn stop(&mut self) {
        self.enabled = false;
    }
}

fn controller_distance(a: &JointInfo, b: &JointInfo) -> f32 {
    (a.controller_pose.translation.vector - b.controller_pose.translation.vector).norm()
}

/// One buddy per hand.
pub struct HandFeedback {
    pub left: HapticBuddy,
    pub right: HapticBuddy,
}

impl HandFeedback {
    pub fn new() -> HandFeedback {
        HandFeedback {
            left: HapticBuddy::new(Hand::Left),
            right: HapticBuddy::new(Hand::Right),
        }
    }

    pub fn for_side(&mut self, hand: Hand) -> &mut HapticBuddy {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }
}

impl Default for HandFeedback {
    fn default() -> Self {
        HandFeedback::new()
    }
}
