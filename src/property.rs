use crate::style::{StyleSurface, StyleValue};

/// Each tick a property moves by this share of its remaining distance.
pub(crate) const STEP_DIVISOR: f64 = 10.;

/// Classification of a style property, governing how its current value is
/// read, stepped, written and compared against its target.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropertyKind {
  /// Pixel valued, stepped on integers, written with a `px` suffix.
  Length,
  /// Unitless fractional value in `[0, 1]`, compared with an epsilon.
  Opacity,
  /// Integer layering value, jumps straight to its target.
  StackingOrder,
}

/// Property names with non-length semantics; anything not listed here is a
/// length.
const KIND_TABLE: &[(&str, PropertyKind)] = &[
  ("opacity", PropertyKind::Opacity),
  ("zIndex", PropertyKind::StackingOrder),
  ("z-index", PropertyKind::StackingOrder),
];

impl PropertyKind {
  /// Classify a property by its name.
  pub fn of(name: &str) -> PropertyKind {
    KIND_TABLE
      .iter()
      .find_map(|(n, k)| (*n == name).then_some(*k))
      .unwrap_or(PropertyKind::Length)
  }

  /// Advance `prop` on `surface` one step toward `target` and report whether
  /// it converged this tick.
  ///
  /// A target that isn't a finite number can never converge; the property is
  /// left untouched rather than written with garbage.
  pub(crate) fn advance(
    self, surface: &mut dyn StyleSurface, prop: &str, target: f64, opacity_epsilon: f64,
  ) -> bool {
    if !target.is_finite() {
      return false;
    }
    match self {
      PropertyKind::Length => step_length(surface, prop, target),
      PropertyKind::Opacity => step_opacity(surface, prop, target, opacity_epsilon),
      PropertyKind::StackingOrder => jump_stacking_order(surface, prop, target),
    }
  }
}

/// Lengths step on integers, the way `parseInt` reads a computed pixel
/// value. The step magnitude always rounds up toward the target so progress
/// never stalls on a sub-pixel fraction; converged means exact equality.
fn step_length(surface: &mut dyn StyleSurface, prop: &str, target: f64) -> bool {
  let Some(value) = surface.computed_value(prop) else {
    log::debug!("`{prop}` is not resolvable on this surface, waiting for it");
    return false;
  };
  if !value.is_finite() {
    return false;
  }

  let current = value.trunc() as i64;
  let step = (target - current as f64) / STEP_DIVISOR;
  let step = if (current as f64) < target { step.ceil() } else { step.floor() } as i64;
  let current = current + step;
  surface.set_value(prop, StyleValue::Length(current));

  current as f64 == target
}

/// Opacity steps fractionally without rounding. Raw float equality is
/// unreliable here, so converged means current and target agree within
/// `epsilon`; the written value then snaps to the target exactly to avoid
/// residual drift.
fn step_opacity(surface: &mut dyn StyleSurface, prop: &str, target: f64, epsilon: f64) -> bool {
  let Some(current) = surface.computed_value(prop) else {
    log::debug!("`{prop}` is not resolvable on this surface, waiting for it");
    return false;
  };
  if !current.is_finite() {
    return false;
  }

  let current = current + (target - current) / STEP_DIVISOR;
  let converged = (target - current).abs() < epsilon;
  let value = if converged { target } else { current };
  surface.set_value(prop, StyleValue::Number(value));

  converged
}

/// A layering change isn't perceptible as motion, so it jumps straight to
/// the target and counts as converged from the first tick touching it.
fn jump_stacking_order(surface: &mut dyn StyleSurface, prop: &str, target: f64) -> bool {
  surface.set_value(prop, StyleValue::Integer(target as i32));
  true
}
