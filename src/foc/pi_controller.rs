// PI (Proportional-Integral) controller with clamping anti-windup

use super::transforms::clamp_symmetric;

/// PI controller for one current axis
///
/// The output limit is not stored: the voltage envelope changes every tick
/// with the bus voltage (and, for q, with the committed d-axis voltage), so
/// it is passed to `update`. The integral accumulator always lies within the
/// limit of the most recent update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PiController {
    /// Proportional gain [V/A]
    kp: f32,
    /// Integral gain [V/(A·s)]
    ki: f32,
    /// Integral accumulator [V]
    integral: f32,
    /// Last calculated output [V]
    last_output: f32,
}

impl PiController {
    /// Create a new PI controller
    ///
    /// # Arguments
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    pub const fn new(kp: f32, ki: f32) -> Self {
        Self {
            kp,
            ki,
            integral: 0.0,
            last_output: 0.0,
        }
    }

    /// Update the PI controller
    ///
    /// Accumulate-then-clamp, then recombine-then-clamp: the integral is
    /// bounded independently of the proportional term, and the final command
    /// (including feed-forward) is bounded again.
    ///
    /// # Arguments
    /// * `setpoint` - Desired value
    /// * `measured` - Actual measured value
    /// * `feedforward` - Term added to the output before the final clamp
    /// * `limit` - Symmetric limit for both integral and output (±limit)
    /// * `dt` - Time step (seconds)
    ///
    /// # Returns
    /// Controller output limited to ±limit
    pub fn update(
        &mut self,
        setpoint: f32,
        measured: f32,
        feedforward: f32,
        limit: f32,
        dt: f32,
    ) -> f32 {
        let error = setpoint - measured;

        let p_term = self.kp * error;

        self.integral = clamp_symmetric(self.integral + self.ki * error * dt, limit);

        self.last_output = clamp_symmetric(p_term + self.integral + feedforward, limit);
        self.last_output
    }

    /// Reset the integral term to zero
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_output = 0.0;
    }

    /// Get the current output
    pub fn output(&self) -> f32 {
        self.last_output
    }

    /// Get the current integral term
    pub fn integral(&self) -> f32 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_only() {
        let mut pi = PiController::new(1.0, 0.0);
        let output = pi.update(5.0, 0.0, 0.0, 10.0, 0.1);
        assert_eq!(output, 5.0); // P term only
    }

    #[test]
    fn test_output_limiting() {
        let mut pi = PiController::new(1.0, 0.0);
        let output = pi.update(20.0, 0.0, 0.0, 10.0, 0.1);
        assert_eq!(output, 10.0); // Limited to max
        let output = pi.update(-20.0, 0.0, 0.0, 10.0, 0.1);
        assert_eq!(output, -10.0);
    }

    #[test]
    fn test_integral_accumulation() {
        let mut pi = PiController::new(0.0, 1.0);
        // Error = 10, dt = 0.1: Ki·e·dt = 1.0 per step
        pi.update(10.0, 0.0, 0.0, 100.0, 0.1);
        assert_eq!(pi.integral(), 1.0);
        pi.update(10.0, 0.0, 0.0, 100.0, 0.1);
        assert_eq!(pi.integral(), 2.0);
    }

    #[test]
    fn test_integral_clamped_independently_of_p_term() {
        let mut pi = PiController::new(100.0, 1.0);
        for _ in 0..100 {
            pi.update(10.0, 0.0, 0.0, 3.0, 1.0);
        }
        // Integral saturates at the limit even though the output was saturated
        // by the P term from the first step
        assert_eq!(pi.integral(), 3.0);
        assert_eq!(pi.output(), 3.0);
    }

    #[test]
    fn test_integral_follows_shrinking_limit() {
        let mut pi = PiController::new(0.0, 1.0);
        pi.update(10.0, 0.0, 0.0, 50.0, 1.0);
        assert_eq!(pi.integral(), 10.0);
        // Limit drops below the stored integral: clamped on the next update
        pi.update(0.0, 0.0, 0.0, 4.0, 1.0);
        assert_eq!(pi.integral(), 4.0);
    }

    #[test]
    fn test_feedforward_is_clamped() {
        let mut pi = PiController::new(0.0, 0.0);
        assert_eq!(pi.update(0.0, 0.0, 2.5, 10.0, 0.1), 2.5);
        assert_eq!(pi.update(0.0, 0.0, 25.0, 10.0, 0.1), 10.0);
    }

    #[test]
    fn test_reset() {
        let mut pi = PiController::new(1.0, 1.0);
        pi.update(1.0, 0.0, 0.0, 10.0, 0.5);
        pi.reset();
        assert_eq!(pi.integral(), 0.0);
        assert_eq!(pi.output(), 0.0);
    }
}
