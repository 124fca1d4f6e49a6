use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::style::{StyleSurface, StyleValue};

/// An in-memory style surface that assists in writing unit tests: every
/// write resolves immediately into the computed style, the way a live
/// element reflects its last set value, and a log keeps the exact values
/// written in order.
#[derive(Default)]
pub struct MockElement {
  computed: HashMap<String, f64, ahash::RandomState>,
  written: Vec<(String, StyleValue)>,
}

impl MockElement {
  pub fn new() -> Rc<RefCell<Self>> { <_>::default() }

  /// An element seeded with an initial computed style; seeding doesn't show
  /// up in the write log.
  pub fn with_style(style: &[(&str, f64)]) -> Rc<RefCell<Self>> {
    let this = Self::new();
    {
      let mut el = this.borrow_mut();
      for (prop, value) in style {
        el.computed.insert(prop.to_string(), *value);
      }
    }
    this
  }

  /// The current computed value of `prop`.
  pub fn style(&self, prop: &str) -> Option<f64> { self.computed.get(prop).copied() }

  /// Every value written so far, oldest first.
  pub fn written_log(&self) -> &[(String, StyleValue)] { &self.written }

  /// The most recent value written to `prop`.
  pub fn last_written(&self, prop: &str) -> Option<StyleValue> {
    self
      .written
      .iter()
      .rev()
      .find_map(|(p, v)| (p == prop).then_some(*v))
  }

  /// Drain the write log, handy for per-tick assertions.
  pub fn take_writes(&mut self) -> Vec<(String, StyleValue)> { std::mem::take(&mut self.written) }
}

impl StyleSurface for MockElement {
  fn computed_value(&self, prop: &str) -> Option<f64> { self.style(prop) }

  fn set_value(&mut self, prop: &str, value: StyleValue) {
    let resolved = match value {
      StyleValue::Length(v) => v as f64,
      StyleValue::Number(v) => v,
      StyleValue::Integer(v) => v as f64,
    };
    self.computed.insert(prop.to_string(), resolved);
    self.written.push((prop.to_string(), value));
  }
}
