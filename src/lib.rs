//! An element style property animator.
//!
//! Given an element-like style surface and a map of target values, the
//! [`Animator`] steps the element's live computed values toward the targets
//! on a periodic tick until every property converges, then invokes an
//! optional completion callback. Each tick a property moves a tenth of its
//! remaining distance, so motion starts fast and eases out on its own;
//! there is no easing-curve machinery and no general scheduler.
//!
//! Properties are classified by [`PropertyKind`]: pixel lengths step on
//! integers and converge exactly, opacity steps fractionally and converges
//! within a configurable epsilon, and stacking order jumps straight to its
//! target. An element carries at most one animation at a time; starting a
//! new one supersedes the old, whose callback then never fires.
//!
//! The host environment plugs in through the [`StyleSurface`] trait and
//! drives [`Animator::tick`] from its event loop:
//!
//! ```
//! use std::time::Instant;
//!
//! use style_anim::{Animator, StyleSurface, StyleValue, targets};
//!
//! #[derive(Default)]
//! struct Element(std::collections::HashMap<String, f64>);
//!
//! impl StyleSurface for Element {
//!   fn computed_value(&self, prop: &str) -> Option<f64> { self.0.get(prop).copied() }
//!   fn set_value(&mut self, prop: &str, value: StyleValue) {
//!     let v = match value {
//!       StyleValue::Length(v) => v as f64,
//!       StyleValue::Number(v) => v,
//!       StyleValue::Integer(v) => v as f64,
//!     };
//!     self.0.insert(prop.to_string(), v);
//!   }
//! }
//!
//! let animator = Animator::default();
//! let el = std::rc::Rc::new(std::cell::RefCell::new(Element::default()));
//! el.borrow_mut().0.insert("left".to_string(), 0.);
//!
//! animator.animate_then(&el, targets! { "left" => 100., "zIndex" => 2. }, || {
//!   println!("arrived");
//! });
//! while animator.is_running(&el) {
//!   // a real host ticks every `animator.tick_period()`.
//!   animator.tick(Instant::now());
//! }
//! assert_eq!(el.borrow().computed_value("left"), Some(100.));
//! ```

mod targets;

mod animator;
mod property;
mod style;
mod ticker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helper;

pub use animator::{Animator, AnimatorCfg, SharedElement};
pub use property::PropertyKind;
pub use style::{StyleSurface, StyleValue};
pub use targets::AnimateTargets;
pub use ticker::StepTicker;
