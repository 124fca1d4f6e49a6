use std::{
  any::Any,
  cell::RefCell,
  collections::HashMap,
  num::NonZeroU32,
  rc::{Rc, Weak},
  time::{Duration, Instant},
};

use rxrust::prelude::*;
use smallvec::SmallVec;

use crate::{
  property::PropertyKind, style::StyleSurface, targets::AnimateTargets, ticker::StepTicker,
};

/// A shared, mutable element whose style the animator may step.
pub type SharedElement<E> = Rc<RefCell<E>>;

/// Animator configuration.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AnimatorCfg {
  /// The period the host should drive [`Animator::tick`] at.
  pub tick_period: Duration,
  /// How close an opacity value must get to its target to count as
  /// converged. Raw float equality is unreliable for fractional stepping.
  pub opacity_epsilon: f64,
  /// Optional safeguard against animations that can never converge, e.g. a
  /// non-finite target or a property the surface can't resolve. When an
  /// animation reaches this many ticks it is dropped with a warning and its
  /// completion callback never fires.
  pub max_ticks: Option<NonZeroU32>,
}

impl Default for AnimatorCfg {
  fn default() -> Self {
    Self { tick_period: Duration::from_millis(20), opacity_epsilon: 0.01, max_ticks: None }
  }
}

/// Steps element style properties toward target values on a periodic tick.
///
/// The animator owns an identity-keyed table from element handle to its
/// running animation, so an element carries at most one stepping process at
/// any instant: a new [`Animator::animate`] call on the same element cancels
/// and replaces the in-flight one, and the superseded completion callback
/// never fires.
///
/// `animate` is non-blocking; all stepping happens when the host event loop
/// calls [`Animator::tick`], once per [`AnimatorCfg::tick_period`]. The
/// whole model is single-threaded and cooperative, each tick body runs to
/// completion before anything else can observe the elements.
pub struct Animator<E> {
  inner: Rc<RefCell<AnimatorInner<E>>>,
  ticker: StepTicker,
  cfg: AnimatorCfg,
}

struct AnimatorInner<E> {
  animations: HashMap<ElementId, RunningAnimation<E>, ahash::RandomState>,
  /// Guard of the shared tick subscription; present while any animation is
  /// registered, dropping it cancels the subscription.
  tick_guard: Option<Box<dyn Any>>,
}

struct RunningAnimation<E> {
  element: Weak<RefCell<E>>,
  targets: AnimateTargets,
  on_complete: Option<Box<dyn FnOnce()>>,
  ticks: u32,
}

/// Identity of an element handle, keyed by the shared allocation address.
/// The running animation holds a `Weak` to its element, which keeps the
/// allocation reserved, so a stale record's address can't be recycled into
/// a different element while the record is still in the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct ElementId(usize);

impl ElementId {
  fn of<E>(element: &SharedElement<E>) -> Self { Self(Rc::as_ptr(element) as usize) }
}

impl<E> Default for Animator<E> {
  fn default() -> Self { Self::new(<_>::default()) }
}

impl<E> Clone for Animator<E> {
  fn clone(&self) -> Self {
    Self { inner: self.inner.clone(), ticker: self.ticker.clone(), cfg: self.cfg }
  }
}

impl<E> Animator<E> {
  pub fn new(cfg: AnimatorCfg) -> Self {
    let inner = AnimatorInner { animations: <_>::default(), tick_guard: None };
    Self { inner: Rc::new(RefCell::new(inner)), ticker: <_>::default(), cfg }
  }

  /// The period the host should drive [`Animator::tick`] at.
  pub fn tick_period(&self) -> Duration { self.cfg.tick_period }

  /// Whether `element` has an in-flight animation.
  pub fn is_running(&self, element: &SharedElement<E>) -> bool {
    self
      .inner
      .borrow()
      .animations
      .contains_key(&ElementId::of(element))
  }

  /// How many elements are animating right now.
  pub fn running_count(&self) -> usize { self.inner.borrow().animations.len() }

  /// Cancel the in-flight animation of `element`, if any. Its completion
  /// callback will never fire. The owner of an element must cancel before
  /// destroying it; the animator also drops an animation on its own when
  /// the element turns out to be gone at the next tick.
  pub fn cancel(&self, element: &SharedElement<E>) {
    let mut inner = self.inner.borrow_mut();
    inner.animations.remove(&ElementId::of(element));
    if inner.animations.is_empty() {
      inner.tick_guard.take();
    }
  }
}

impl<E: StyleSurface + 'static> Animator<E> {
  /// Animate every property in `targets` toward its value.
  ///
  /// Any animation previously started on `element` is cancelled first, so
  /// no two stepping processes ever mutate the same element concurrently.
  pub fn animate(&self, element: &SharedElement<E>, targets: AnimateTargets) {
    self.start(element, targets, None);
  }

  /// Like [`Animator::animate`], but invokes `on_complete` exactly once when
  /// every property has converged, synchronously within the final tick and
  /// after the stepping process is released.
  pub fn animate_then(
    &self, element: &SharedElement<E>, targets: AnimateTargets, on_complete: impl FnOnce() + 'static,
  ) {
    self.start(element, targets, Some(Box::new(on_complete)));
  }

  /// Advance all running animations one step. The host calls this once per
  /// [`AnimatorCfg::tick_period`]; tests call it directly.
  pub fn tick(&self, now: Instant) {
    self.ticker.emit(now);
    // release the shared subscription once nothing is running; it can't be
    // dropped inside the emission itself.
    let mut inner = self.inner.borrow_mut();
    if inner.animations.is_empty() {
      inner.tick_guard.take();
    }
  }

  fn start(
    &self, element: &SharedElement<E>, targets: AnimateTargets,
    on_complete: Option<Box<dyn FnOnce()>>,
  ) {
    if targets.is_empty() {
      log::warn!("animate called with an empty target map, nothing to do");
      return;
    }
    for (prop, value) in &targets {
      if !value.is_finite() {
        log::warn!("target of `{prop}` is not finite, it will never converge");
      }
    }

    let animation = RunningAnimation {
      element: Rc::downgrade(element),
      targets,
      on_complete,
      ticks: 0,
    };
    // replacing drops the superseded animation, its callback unfired.
    self
      .inner
      .borrow_mut()
      .animations
      .insert(ElementId::of(element), animation);
    self.ensure_ticking();
  }

  fn ensure_ticking(&self) {
    let mut inner = self.inner.borrow_mut();
    if inner.tick_guard.is_none() {
      let weak = Rc::downgrade(&self.inner);
      let cfg = self.cfg;
      let guard = self
        .ticker
        .tick_stream()
        .subscribe(move |_| {
          if let Some(inner) = weak.upgrade() {
            step_frame(&inner, &cfg);
          }
        })
        .unsubscribe_when_dropped();
      inner.tick_guard = Some(Box::new(guard));
    }
  }
}

/// One tick: step every registered animation, drop the finished and the
/// orphaned, then fire completion callbacks with the store borrow released
/// so a callback may start a follow-up animation.
fn step_frame<E: StyleSurface>(inner: &Rc<RefCell<AnimatorInner<E>>>, cfg: &AnimatorCfg) {
  let mut completed: SmallVec<[Box<dyn FnOnce()>; 1]> = SmallVec::new();
  {
    let mut store = inner.borrow_mut();
    let mut done: SmallVec<[ElementId; 1]> = SmallVec::new();

    for (id, anim) in store.animations.iter_mut() {
      let Some(element) = anim.element.upgrade() else {
        log::warn!("element dropped while animating, cancelling its animation");
        done.push(*id);
        continue;
      };
      anim.ticks = anim.ticks.saturating_add(1);

      // assume everything converged, let any property falsify it. Every
      // property still advances this tick, so no early exit.
      let mut all_converged = true;
      {
        let mut surface = element.borrow_mut();
        for (prop, target) in &anim.targets {
          let kind = PropertyKind::of(prop);
          if !kind.advance(&mut *surface, prop, *target, cfg.opacity_epsilon) {
            all_converged = false;
          }
        }
      }

      if all_converged {
        done.push(*id);
        if let Some(cb) = anim.on_complete.take() {
          completed.push(cb);
        }
      } else if cfg.max_ticks.is_some_and(|max| anim.ticks >= max.get()) {
        log::warn!("animation hasn't converged after {} ticks, dropping it", anim.ticks);
        done.push(*id);
      }
    }

    for id in done {
      store.animations.remove(&id);
    }
  }
  for cb in completed {
    cb()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;
  use crate::{targets, test_helper::MockElement};

  fn run_to_idle<E: StyleSurface + 'static>(animator: &Animator<E>) -> u32 {
    let mut ticks = 0;
    while animator.running_count() > 0 {
      animator.tick(Instant::now());
      ticks += 1;
      assert!(ticks < 1000, "animation never converged");
    }
    ticks
  }

  #[test]
  fn length_distance_shrinks_every_tick_without_overshoot() {
    let animator = Animator::new(AnimatorCfg::default());
    let el = MockElement::with_style(&[("left", 0.)]);
    animator.animate(&el, targets! { "left" => 100. });

    let mut distance = 100.;
    while animator.is_running(&el) {
      animator.tick(Instant::now());
      let current = el.borrow().style("left").unwrap();
      assert!(current <= 100., "stepped past the target");
      let remaining = 100. - current;
      assert!(
        remaining < distance || remaining == 0.,
        "tick made no progress: {remaining} of {distance}"
      );
      distance = remaining;
    }
    assert_eq!(el.borrow().style("left"), Some(100.));
  }

  #[test]
  fn length_animates_downward_too() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("top", 80.)]);
    animator.animate(&el, targets! { "top" => -20. });

    animator.tick(Instant::now());
    // first step moves a tenth of the remaining 100, floored direction.
    assert_eq!(el.borrow().style("top"), Some(70.));

    run_to_idle(&animator);
    assert_eq!(el.borrow().style("top"), Some(-20.));
  }

  #[test]
  fn opacity_snaps_exactly_to_target() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("opacity", 0.)]);
    animator.animate(&el, targets! { "opacity" => 1. });

    run_to_idle(&animator);
    assert_eq!(el.borrow().style("opacity"), Some(1.));
  }

  #[test]
  fn stacking_order_converges_in_one_tick() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[]);
    animator.animate(&el, targets! { "zIndex" => 5. });

    animator.tick(Instant::now());
    assert!(!animator.is_running(&el));
    let el = el.borrow();
    assert_eq!(el.style("zIndex"), Some(5.));
    // no intermediate value was ever observed.
    assert_eq!(
      el.written_log(),
      [("zIndex".to_string(), crate::StyleValue::Integer(5))].as_slice()
    );
  }

  #[test]
  fn completion_waits_for_every_property() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.), ("opacity", 0.)]);
    animator.animate(&el, targets! { "left" => 100., "opacity" => 1. });

    while animator.is_running(&el) {
      animator.tick(Instant::now());
      // both properties advance on every tick, even after one of them
      // already satisfies its convergence test.
      let writes = el.borrow_mut().take_writes();
      assert_eq!(writes.len(), 2);
    }
    let el = el.borrow();
    assert_eq!(el.style("left"), Some(100.));
    assert_eq!(el.style("opacity"), Some(1.));
  }

  #[test]
  fn new_animate_call_supersedes_the_running_one() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.), ("top", 0.)]);

    let a_fired = Rc::new(Cell::new(false));
    let b_fired = Rc::new(Cell::new(false));

    let c_a = a_fired.clone();
    animator.animate_then(&el, targets! { "left" => 500. }, move || c_a.set(true));
    // superseded before any tick fires.
    let c_b = b_fired.clone();
    animator.animate_then(&el, targets! { "top" => 10. }, move || c_b.set(true));

    run_to_idle(&animator);

    assert!(!a_fired.get());
    assert!(b_fired.get());
    assert_eq!(el.borrow().style("top"), Some(10.));
    // the superseded animation never touched its property.
    assert_eq!(el.borrow().style("left"), Some(0.));
  }

  #[test]
  fn completion_fires_once_after_cancellation() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 90.)]);

    let fired = Rc::new(Cell::new(0));
    let c_fired = fired.clone();
    animator.animate_then(&el, targets! { "left" => 100. }, move || c_fired.set(c_fired.get() + 1));

    run_to_idle(&animator);
    assert_eq!(fired.get(), 1);

    // further ticks neither re-fire the callback nor touch the element.
    let writes_before = el.borrow().written_log().len();
    animator.tick(Instant::now());
    animator.tick(Instant::now());
    assert_eq!(fired.get(), 1);
    assert_eq!(el.borrow().written_log().len(), writes_before);
  }

  #[test]
  fn already_at_target_still_ticks_once_then_completes() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 100.), ("opacity", 1.)]);

    let fired = Rc::new(Cell::new(false));
    let c_fired = fired.clone();
    animator.animate_then(&el, targets! { "left" => 100., "opacity" => 1. }, move || {
      c_fired.set(true)
    });

    assert!(animator.is_running(&el));
    assert!(!fired.get());

    animator.tick(Instant::now());
    assert!(!animator.is_running(&el));
    assert!(fired.get());
  }

  #[test]
  fn explicit_cancel_silences_the_callback() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.)]);

    let fired = Rc::new(Cell::new(false));
    let c_fired = fired.clone();
    animator.animate_then(&el, targets! { "left" => 100. }, move || c_fired.set(true));

    animator.tick(Instant::now());
    animator.cancel(&el);
    assert!(!animator.is_running(&el));

    animator.tick(Instant::now());
    assert!(!fired.get());
    // the element keeps whatever value the last tick wrote.
    assert_eq!(el.borrow().style("left"), Some(10.));
  }

  #[test]
  fn unconvergeable_property_stalls_until_max_ticks() {
    let cfg = AnimatorCfg { max_ticks: NonZeroU32::new(5), ..<_>::default() };
    let animator = Animator::new(cfg);
    // `width` is not resolvable on this element, so it can never converge.
    let el = MockElement::with_style(&[("left", 0.)]);

    let fired = Rc::new(Cell::new(false));
    let c_fired = fired.clone();
    animator.animate_then(&el, targets! { "left" => 10., "width" => 50. }, move || {
      c_fired.set(true)
    });

    for _ in 0..5 {
      assert!(animator.is_running(&el));
      animator.tick(Instant::now());
    }
    // dropped by the safeguard, callback never fired.
    assert!(!animator.is_running(&el));
    assert!(!fired.get());
  }

  #[test]
  fn non_finite_target_stalls_forever_without_the_safeguard() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.)]);
    animator.animate(&el, targets! { "left" => f64::NAN });

    for _ in 0..50 {
      animator.tick(Instant::now());
    }
    assert!(animator.is_running(&el));
    animator.cancel(&el);
  }

  #[test]
  fn stale_record_never_aliases_a_new_element() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.)]);
    animator.animate(&el, targets! { "left" => 100. });
    drop(el);

    // the store's weak handle keeps the dead element's allocation reserved,
    // so no fresh element can collide with the stale record's identity.
    let fresh: Vec<_> = (0..16).map(|_| MockElement::new()).collect();
    assert_eq!(animator.running_count(), 1);
    for el in &fresh {
      assert!(!animator.is_running(el));
    }

    animator.tick(Instant::now());
    assert_eq!(animator.running_count(), 0);
  }

  #[test]
  fn dropped_element_cancels_its_animation() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 0.)]);
    animator.animate(&el, targets! { "left" => 100. });

    drop(el);
    animator.tick(Instant::now());
    assert_eq!(animator.running_count(), 0);
  }

  #[test]
  fn empty_targets_is_a_no_op() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[]);
    animator.animate(&el, AnimateTargets::default());
    assert!(!animator.is_running(&el));
  }

  #[test]
  fn completion_callback_may_chain_a_follow_up_animation() {
    let animator = Animator::<MockElement>::default();
    let el = MockElement::with_style(&[("left", 95.), ("opacity", 0.)]);

    let c_animator = animator.clone();
    let c_el = el.clone();
    animator.animate_then(&el, targets! { "left" => 100. }, move || {
      c_animator.animate(&c_el, targets! { "opacity" => 1. });
    });

    run_to_idle(&animator);
    let el = el.borrow();
    assert_eq!(el.style("left"), Some(100.));
    assert_eq!(el.style("opacity"), Some(1.));
  }

  #[test]
  fn animates_independent_elements_concurrently() {
    let animator = Animator::<MockElement>::default();
    let a = MockElement::with_style(&[("left", 0.)]);
    let b = MockElement::with_style(&[("left", 0.)]);

    animator.animate(&a, targets! { "left" => 10. });
    animator.animate(&b, targets! { "left" => 300. });
    assert_eq!(animator.running_count(), 2);

    run_to_idle(&animator);
    assert_eq!(a.borrow().style("left"), Some(10.));
    assert_eq!(b.borrow().style("left"), Some(300.));
  }
}
