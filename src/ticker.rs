use std::{convert::Infallible, time::Instant};

use rxrust::prelude::*;

/// Emits a message every time running animations should advance one step.
///
/// The host event loop drives it at the animator's tick period; tests drive
/// it manually, which makes stepping fully deterministic.
#[derive(Clone)]
pub struct StepTicker {
  subject: LocalSubject<'static, Instant, Infallible>,
}

impl Default for StepTicker {
  fn default() -> Self { Self { subject: Local::subject() } }
}

impl StepTicker {
  #[inline]
  pub(crate) fn emit(&self, now: Instant) { self.subject.clone().next(now); }

  /// The stream a stepping subscription listens on.
  #[inline]
  pub fn tick_stream(&self) -> LocalSubject<'static, Instant, Infallible> { self.subject.clone() }
}
