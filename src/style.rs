use std::fmt;

/// A value written back to the host's style surface. How the host serializes
/// it depends on the property kind: lengths carry the `px` suffix, opacity
/// and stacking order are bare numbers.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StyleValue {
  /// A pixel valued length.
  Length(i64),
  /// A unitless fractional value.
  Number(f64),
  /// A bare integer, used for stacking order.
  Integer(i32),
}

impl fmt::Display for StyleValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StyleValue::Length(v) => write!(f, "{v}px"),
      StyleValue::Number(v) => write!(f, "{v}"),
      StyleValue::Integer(v) => write!(f, "{v}"),
    }
  }
}

/// The styling boundary of the host environment.
///
/// The animator reads every property fresh from `computed_value` on each
/// tick, so the host must resolve the live value, not an author-set
/// shorthand or relative unit. A property the host can't resolve returns
/// `None` and is treated as not yet converged.
pub trait StyleSurface {
  /// The resolved numeric value of `prop`, or `None` if the property isn't
  /// resolvable on this surface.
  fn computed_value(&self, prop: &str) -> Option<f64>;

  /// Write `value` to `prop`.
  fn set_value(&mut self, prop: &str, value: StyleValue);
}
