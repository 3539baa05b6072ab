use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curves, named after the power family used by web tweening tools.
/// `power1` is quadratic, `power2` cubic, `power3` quartic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    Linear,
    Power1In,
    #[default]
    Power1Out,
    Power1InOut,
    Power2In,
    Power2Out,
    Power2InOut,
    Power3In,
    Power3Out,
    Power3InOut,
}

impl Ease {
    /// Maps linear progress `t` in [0, 1] onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1In => ease_in(t, 2),
            Ease::Power1Out => ease_out(t, 2),
            Ease::Power1InOut => ease_in_out(t, 2),
            Ease::Power2In => ease_in(t, 3),
            Ease::Power2Out => ease_out(t, 3),
            Ease::Power2InOut => ease_in_out(t, 3),
            Ease::Power3In => ease_in(t, 4),
            Ease::Power3Out => ease_out(t, 4),
            Ease::Power3InOut => ease_in_out(t, 4),
        }
    }
}

fn ease_in(t: f32, power: i32) -> f32 {
    t.powi(power)
}

fn ease_out(t: f32, power: i32) -> f32 {
    1.0 - (1.0 - t).powi(power)
}

fn ease_in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        ease_in(t * 2.0, power) / 2.0
    } else {
        1.0 - ease_in((1.0 - t) * 2.0, power) / 2.0
    }
}

/// A single eased interpolation between two scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            ease,
        }
    }

    /// Moves the tween forward and returns the new value.
    pub fn advance(&mut self, delta: Duration) -> f32 {
        self.elapsed = (self.elapsed + delta).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let progress = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.ease.apply(progress)
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Scalar that eases toward whatever target it was last given.
///
/// A new target replaces the in-flight tween, starting from the current
/// value, so the value never jumps.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenedScalar {
    value: f32,
    tween: Option<Tween>,
    duration: Duration,
    ease: Ease,
}

impl TweenedScalar {
    pub fn new(initial: f32, duration: Duration, ease: Ease) -> Self {
        Self {
            value: initial,
            tween: None,
            duration,
            ease,
        }
    }

    /// Starts easing toward `target`. Returns `false` when the value is
    /// already heading there (or resting on it) and nothing changed.
    pub fn animate_to(&mut self, target: f32) -> bool {
        let current_target = self.tween.as_ref().map_or(self.value, Tween::target);
        if current_target == target {
            return false;
        }
        self.tween = Some(Tween::new(self.value, target, self.duration, self.ease));
        true
    }

    pub fn advance(&mut self, delta: Duration) -> f32 {
        if let Some(tween) = self.tween.as_mut() {
            self.value = tween.advance(delta);
            if tween.finished() {
                self.tween = None;
            }
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Where the value is heading, or the value itself when idle.
    pub fn target(&self) -> f32 {
        self.tween.as_ref().map_or(self.value, Tween::target)
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Drops the in-flight tween, leaving the value where it is.
    pub fn kill(&mut self) {
        self.tween = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(16);

    #[test]
    fn eases_hit_their_endpoints() {
        for ease in [
            Ease::Linear,
            Ease::Power1In,
            Ease::Power1Out,
            Ease::Power1InOut,
            Ease::Power2Out,
            Ease::Power3InOut,
        ] {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{ease:?}");
        }
        assert!((Ease::Power1Out.apply(0.5) - 0.75).abs() < 1e-6);
        assert!((Ease::Power1In.apply(0.5) - 0.25).abs() < 1e-6);
        assert!((Ease::Power2InOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tween_reaches_target_after_duration() {
        let mut tween = Tween::new(0.0, 1.0, Duration::from_millis(500), Ease::Power1Out);
        let halfway = tween.advance(Duration::from_millis(250));
        assert!((halfway - 0.75).abs() < 1e-5);
        assert!(!tween.finished());
        assert_eq!(tween.advance(Duration::from_secs(1)), 1.0);
        assert!(tween.finished());
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let tween = Tween::new(0.2, 0.9, Duration::ZERO, Ease::Linear);
        assert_eq!(tween.value(), 0.9);
    }

    #[test]
    fn retarget_continues_from_current_value() {
        let mut scalar = TweenedScalar::new(0.0, Duration::from_millis(500), Ease::Linear);
        assert!(scalar.animate_to(1.0));
        scalar.advance(Duration::from_millis(250));
        let before = scalar.value();
        assert!((before - 0.5).abs() < 1e-5);

        assert!(scalar.animate_to(0.0));
        let after = scalar.advance(STEP);
        assert!(after < before);
        assert!((before - after) < 0.05);

        scalar.advance(Duration::from_secs(1));
        assert_eq!(scalar.value(), 0.0);
        assert!(!scalar.is_animating());
    }

    #[test]
    fn repeated_target_keeps_in_flight_tween() {
        let mut scalar = TweenedScalar::new(0.0, Duration::from_millis(500), Ease::Power1Out);
        assert!(scalar.animate_to(1.0));
        scalar.advance(STEP);
        assert!(!scalar.animate_to(1.0));
        assert!(!TweenedScalar::new(0.0, STEP, Ease::Linear).animate_to(0.0));
    }

    #[test]
    fn value_stays_within_bounds() {
        let mut scalar = TweenedScalar::new(0.0, Duration::from_millis(300), Ease::Power3InOut);
        for i in 0..200 {
            scalar.animate_to(if (i / 7) % 2 == 0 { 1.0 } else { 0.0 });
            let value = scalar.advance(STEP);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn kill_freezes_value() {
        let mut scalar = TweenedScalar::new(0.0, Duration::from_millis(500), Ease::Linear);
        scalar.animate_to(1.0);
        scalar.advance(Duration::from_millis(100));
        let frozen = scalar.value();
        scalar.kill();
        assert_eq!(scalar.advance(Duration::from_secs(1)), frozen);
        assert_eq!(scalar.target(), frozen);
    }
}
