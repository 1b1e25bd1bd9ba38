//! Keyboard control panel for the live parameter block

use super::{FractalField, ParameterBlock};

/// A tunable exposed by the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tunable {
    /// Raymarch step budget
    MaxSteps,
    /// Fractal iteration count
    Iterations,
    /// Mandelbulb power
    Power,
    /// Escape radius
    Bailout,
    /// Miss distance
    MaxDistance,
    /// Surface hit threshold
    HitEpsilon,
    /// Normal estimation offset
    NormalEpsilon,
}

impl Tunable {
    /// Label used in log output
    pub const fn label(self) -> &'static str {
        match self {
            Self::MaxSteps => "Max steps",
            Self::Iterations => "Iterations",
            Self::Power => "Power",
            Self::Bailout => "Bailout",
            Self::MaxDistance => "Max dist",
            Self::HitEpsilon => "Hit eps",
            Self::NormalEpsilon => "Normal eps",
        }
    }
}

/// One step up or down on a tunable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamAdjust {
    /// Which value to change
    pub tunable: Tunable,
    /// Step direction
    pub increase: bool,
}

impl ParamAdjust {
    /// Step `tunable` up
    pub const fn up(tunable: Tunable) -> Self {
        Self { tunable, increase: true }
    }

    /// Step `tunable` down
    pub const fn down(tunable: Tunable) -> Self {
        Self { tunable, increase: false }
    }
}

/// Applies clamped adjustments to the live [`ParameterBlock`]
///
/// Integer tunables move by a fixed step, power and bailout additively, and
/// distances multiplicatively since they span several orders of magnitude.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    int_step: i32,
    power_step: f32,
    bailout_step: f32,
    distance_factor: f32,
    epsilon_factor: f32,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            int_step: 16,
            power_step: 0.5,
            bailout_step: 2.0,
            distance_factor: 1.25,
            epsilon_factor: 2.0,
        }
    }
}

impl ControlPanel {
    /// Max steps range
    pub const STEPS_RANGE: (i32, i32) = (16, 2048);
    /// Iterations range
    pub const ITERATIONS_RANGE: (i32, i32) = (16, 2048);
    /// Power range
    pub const POWER_RANGE: (f32, f32) = (2.0, 32.0);
    /// Bailout range
    pub const BAILOUT_RANGE: (f32, f32) = (1.0, 200.0);
    /// Max distance range
    pub const DISTANCE_RANGE: (f32, f32) = (1e-3, 200.0);
    /// Hit and normal epsilon range
    pub const EPSILON_RANGE: (f32, f32) = (1e-6, 1e-2);

    /// Apply one adjustment and log the resulting value
    pub fn apply(&self, params: &mut ParameterBlock, adjust: ParamAdjust) {
        let sign = if adjust.increase { 1 } else { -1 };
        let scale = |factor: f32| if adjust.increase { factor } else { factor.recip() };

        match adjust.tunable {
            Tunable::MaxSteps => {
                let (lo, hi) = Self::STEPS_RANGE;
                params.set_max_steps(params.max_steps().saturating_add(sign * self.int_step).clamp(lo, hi));
                log::info!("{}: {}", adjust.tunable.label(), params.max_steps());
            }
            Tunable::Iterations => {
                let (lo, hi) = Self::ITERATIONS_RANGE;
                params.set_iterations(params.iterations().saturating_add(sign * self.int_step).clamp(lo, hi));
                log::info!("{}: {}", adjust.tunable.label(), params.iterations());
            }
            Tunable::Power => {
                let (lo, hi) = Self::POWER_RANGE;
                params.set_power((params.power() + sign as f32 * self.power_step).clamp(lo, hi));
                log::info!("{}: {:.2}", adjust.tunable.label(), params.power());
            }
            Tunable::Bailout => {
                let (lo, hi) = Self::BAILOUT_RANGE;
                params.set_bailout((params.bailout() + sign as f32 * self.bailout_step).clamp(lo, hi));
                log::info!("{}: {:.2}", adjust.tunable.label(), params.bailout());
            }
            Tunable::MaxDistance => {
                let (lo, hi) = Self::DISTANCE_RANGE;
                params.set_max_distance((params.max_distance() * scale(self.distance_factor)).clamp(lo, hi));
                log::info!("{}: {:.6}", adjust.tunable.label(), params.max_distance());
            }
            Tunable::HitEpsilon => {
                let (lo, hi) = Self::EPSILON_RANGE;
                params.set_hit_epsilon((params.hit_epsilon() * scale(self.epsilon_factor)).clamp(lo, hi));
                log::info!("{}: {:.6}", adjust.tunable.label(), params.hit_epsilon());
            }
            Tunable::NormalEpsilon => {
                let (lo, hi) = Self::EPSILON_RANGE;
                params.set_normal_epsilon(
                    (params.normal_epsilon() * scale(self.epsilon_factor)).clamp(lo, hi),
                );
                log::info!("{}: {:.6}", adjust.tunable.label(), params.normal_epsilon());
            }
        }
    }

    /// Move the field selector by `delta`, clamped to the available fields
    pub fn shift_field(&self, params: &mut ParameterBlock, delta: i32) -> FractalField {
        let field = params.field().shifted(delta);
        params.set_field(field);
        log::info!("Field: {field}");
        field
    }

    /// One-line description of the current settings
    pub fn summary(params: &ParameterBlock) -> String {
        format!(
            "field={} steps={} iterations={} power={:.2} bailout={:.2} max_dist={:.3} hit_eps={:.1e} normal_eps={:.1e}",
            params.field(),
            params.max_steps(),
            params.iterations(),
            params.power(),
            params.bailout(),
            params.max_distance(),
            params.hit_epsilon(),
            params.normal_epsilon(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integer_steps_are_clamped() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();
        params.set_max_steps(2040);

        panel.apply(&mut params, ParamAdjust::up(Tunable::MaxSteps));
        assert_eq!(params.max_steps(), 2048);

        params.set_iterations(20);
        panel.apply(&mut params, ParamAdjust::down(Tunable::Iterations));
        assert_eq!(params.iterations(), 16);
    }

    #[test]
    fn test_integer_steps_saturate_at_extremes() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();

        params.set_max_steps(i32::MAX);
        panel.apply(&mut params, ParamAdjust::up(Tunable::MaxSteps));
        assert_eq!(params.max_steps(), 2048);

        params.set_iterations(i32::MIN);
        panel.apply(&mut params, ParamAdjust::down(Tunable::Iterations));
        assert_eq!(params.iterations(), 16);
    }

    #[test]
    fn test_epsilon_scales_multiplicatively() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();

        panel.apply(&mut params, ParamAdjust::down(Tunable::HitEpsilon));
        assert_relative_eq!(params.hit_epsilon(), 5e-4);

        panel.apply(&mut params, ParamAdjust::up(Tunable::NormalEpsilon));
        assert_relative_eq!(params.normal_epsilon(), 2e-3);
        assert_relative_eq!(params.hit_epsilon(), 5e-4);
    }

    #[test]
    fn test_epsilon_upper_bound() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();
        for _ in 0..20 {
            panel.apply(&mut params, ParamAdjust::up(Tunable::NormalEpsilon));
        }
        assert_relative_eq!(params.normal_epsilon(), 1e-2);
    }

    #[test]
    fn test_power_and_bailout_ranges() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();
        params.set_power(2.2);
        panel.apply(&mut params, ParamAdjust::down(Tunable::Power));
        assert_relative_eq!(params.power(), 2.0);

        params.set_bailout(199.0);
        panel.apply(&mut params, ParamAdjust::up(Tunable::Bailout));
        assert_relative_eq!(params.bailout(), 200.0);
    }

    #[test]
    fn test_shift_field_updates_selector() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();

        assert_eq!(panel.shift_field(&mut params, 1), FractalField::Mandelbox);
        assert_eq!(params.render_int[1], 3);
        assert_eq!(panel.shift_field(&mut params, 1), FractalField::Mandelbox);
        assert_eq!(panel.shift_field(&mut params, -3), FractalField::Sphere);
    }

    #[test]
    fn test_adjustments_leave_other_fields_untouched() {
        let panel = ControlPanel::default();
        let mut params = ParameterBlock::default();
        let before = params;

        panel.apply(&mut params, ParamAdjust::up(Tunable::MaxDistance));
        assert_eq!(params.render_int, before.render_int);
        assert_eq!(params.fractal, before.fractal);
        assert_relative_eq!(params.max_distance(), 62.5);
    }
}
