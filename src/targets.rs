/// The target map of one animation request: property name to the finite
/// numeric value it should reach. Keys are unique and insertion order is
/// irrelevant.
pub type AnimateTargets = std::collections::HashMap<String, f64, ahash::RandomState>;

/// Build an [`AnimateTargets`] map from `property => value` pairs.
///
/// ```
/// use style_anim::targets;
///
/// let targets = targets! { "left" => 100., "opacity" => 1. };
/// assert_eq!(targets.len(), 2);
/// ```
#[macro_export]
macro_rules! targets {
  ($($prop:expr => $value:expr),* $(,)?) => {{
    let mut map = $crate::AnimateTargets::default();
    $(
      let value: f64 = $value;
      map.insert(::std::string::String::from($prop), value);
    )*
    map
  }};
}
