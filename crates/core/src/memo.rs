//! # Memoizing Compositions
//!
//! A [`Composition`] wraps a pure unary function and remembers every result
//! it has produced, keyed by the argument. Compositions chain with
//! [`Composition::compose`] (or `&outer * &inner`); the chained function
//! calls the memoized operands, so repeated inputs are served from cache at
//! every stage of the pipeline.
//!
//! ```rust
//! use composable_core::Composition;
//!
//! let abs = Composition::new(|n: i64| n.unsigned_abs() as u32);
//! let big = Composition::new(|n: u64| n > 10_000);
//!
//! // u32 converts into u64, so `big ∘ abs` is an `i64 -> bool` composition.
//! let is_big = &big * &abs;
//! assert!(is_big.invoke(-10_001));
//! assert!(!is_big.invoke(10_000));
//! ```
//!
//! ## Type gating
//!
//! Composition requires the inner return type to convert into the outer
//! argument type (`O: Into<A>`). The requirement is a trait bound, so an
//! ill-typed chain is rejected by the compiler instead of at call time.
//!
//! ## Copies
//!
//! Cloning shares the function and takes a snapshot of the completed memo
//! entries. From then on the two memo tables evolve independently.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Mul;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::CompositionError;
use crate::trace::Callable;

/// A shared, thread-safe unary function.
pub type Func<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// A memo entry. `value` is locked for the whole evaluation of its key so
/// concurrent callers with the same argument wait for the first result.
/// `ready` is set once a result is stored and never cleared.
struct Entry<R> {
    value: Mutex<Option<R>>,
    ready: AtomicBool,
}

type Slot<R> = Arc<Entry<R>>;

impl<R> Entry<R> {
    fn pending() -> Self {
        Self {
            value: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    fn completed(value: R) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            ready: AtomicBool::new(true),
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn store(&self, cached: &mut Option<R>, value: R) {
        *cached = Some(value);
        self.ready.store(true, Ordering::Release);
    }
}

impl<R: Clone> Entry<R> {
    /// The stored result. Never waits on an evaluation in progress.
    fn peek(&self) -> Option<R> {
        if self.is_ready() {
            self.value.lock().clone()
        } else {
            None
        }
    }
}

/// A memoizing wrapper around a unary function `A -> R`.
pub struct Composition<A, R> {
    func: Option<Func<A, R>>,
    memo: Mutex<HashMap<A, Slot<R>>>,
}

/// A suspended (lazy) value: the nullary form of [`Composition`], keyed by `()`.
pub type Suspended<T> = Composition<(), T>;

impl<A, R> Composition<A, R> {
    /// Wrap a function. The memo starts empty.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::from_fn(Arc::new(func))
    }

    /// Wrap an already shared function.
    pub fn from_fn(func: Func<A, R>) -> Self {
        Self {
            func: Some(func),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// A composition with no function. It is not [`valid`](Self::valid).
    pub fn empty() -> Self {
        Self {
            func: None,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a function is present.
    pub fn valid(&self) -> bool {
        self.func.is_some()
    }

    /// The underlying function, without the memo in front of it.
    ///
    /// Calls through the returned function always recompute.
    pub fn to_fn(&self) -> Option<Func<A, R>> {
        self.func.clone()
    }
}

impl<A, R> Composition<A, R>
where
    A: Eq + Hash + Clone,
{
    /// Whether a result for `arg` has been cached.
    ///
    /// An entry whose evaluation is still running on another thread reports
    /// `false`.
    pub fn is_memoized(&self, arg: &A) -> bool {
        self.memo
            .lock()
            .get(arg)
            .map_or(false, |slot| slot.is_ready())
    }

    /// Number of cached results.
    pub fn memo_len(&self) -> usize {
        self.memo
            .lock()
            .values()
            .filter(|slot| slot.is_ready())
            .count()
    }

    fn slot(&self, arg: &A) -> Slot<R> {
        let mut memo = self.memo.lock();
        if let Some(slot) = memo.get(arg) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(Entry::pending());
        memo.insert(arg.clone(), Arc::clone(&slot));
        slot
    }
}

impl<A, R> Composition<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
{
    /// Evaluate the composition at `arg`, computing at most once per argument.
    ///
    /// If the function panics the panic reaches the caller and nothing is
    /// cached, so the next call with the same argument evaluates again.
    ///
    /// # Panics
    ///
    /// Panics if the composition is empty. Use
    /// [`checked_invoke`](Self::checked_invoke) to get the error instead.
    pub fn invoke(&self, arg: A) -> R {
        match self.checked_invoke(arg) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`invoke`](Self::invoke), but an empty composition is an error.
    pub fn checked_invoke(&self, arg: A) -> Result<R, CompositionError> {
        let func = self.func.as_ref().ok_or(CompositionError::EmptyFunction)?;
        let slot = self.slot(&arg);
        let mut cached = slot.value.lock();
        if let Some(value) = cached.as_ref() {
            trace!("memo hit");
            return Ok(value.clone());
        }

        debug!("memo miss, evaluating");
        let value = func(arg);
        slot.store(&mut cached, value.clone());
        Ok(value)
    }
}

impl<A, T, E> Composition<A, Result<T, E>>
where
    A: Eq + Hash + Clone,
    T: Clone,
{
    /// Evaluate a fallible function, caching only successes.
    ///
    /// An `Err` is handed back to the caller and the next call with the same
    /// argument retries.
    ///
    /// # Panics
    ///
    /// Panics if the composition is empty.
    pub fn try_invoke(&self, arg: A) -> Result<T, E> {
        let Some(func) = self.func.as_ref() else {
            panic!("{}", CompositionError::EmptyFunction);
        };
        let slot = self.slot(&arg);
        let mut cached = slot.value.lock();
        if let Some(Ok(value)) = cached.as_ref() {
            trace!("memo hit");
            return Ok(value.clone());
        }

        match func(arg) {
            Ok(value) => {
                slot.store(&mut cached, Ok(value.clone()));
                Ok(value)
            }
            Err(err) => {
                debug!("evaluation failed, result not memoized");
                Err(err)
            }
        }
    }
}

impl<A, R> Composition<A, R>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Compose `self ∘ inner`: the result maps `b` to `self(inner(b))`.
    ///
    /// `inner` runs first. Both operands are captured by clone, so their
    /// current memo entries come along. The result is empty if either
    /// operand is.
    pub fn compose<B, O>(&self, inner: &Composition<B, O>) -> Composition<B, R>
    where
        B: Eq + Hash + Clone + Send + 'static,
        O: Into<A> + Clone + Send + 'static,
    {
        if !self.valid() || !inner.valid() {
            debug!("composing with an empty composition");
            return Composition::empty();
        }
        debug!(
            outer = std::any::type_name::<Self>(),
            inner = std::any::type_name::<Composition<B, O>>(),
            "composing memoized functions"
        );
        let outer = self.clone();
        let inner = inner.clone();
        Composition::new(move |arg: B| outer.invoke(inner.invoke(arg).into()))
    }

    /// Compose `self ∘ f` with a plain function as the inner stage.
    pub fn compose_fn<B, O, F>(&self, f: F) -> Composition<B, R>
    where
        B: Eq + Hash + Clone + Send + 'static,
        O: Into<A>,
        F: Fn(B) -> O + Send + Sync + 'static,
    {
        if !self.valid() {
            return Composition::empty();
        }
        let outer = self.clone();
        Composition::new(move |arg: B| outer.invoke(f(arg).into()))
    }
}

impl<T: Clone> Composition<(), T> {
    /// Evaluate the suspended value; later calls return the cached result.
    pub fn force(&self) -> T {
        self.invoke(())
    }
}

impl<T> Composition<(), T>
where
    T: Clone + Send + 'static,
{
    /// Adapt a suspended value into a constant unary composition.
    ///
    /// The argument is ignored; calling the adapter forces the suspended value.
    pub fn constant<A>(&self) -> Composition<A, T> {
        let suspended = self.clone();
        Composition::new(move |_: A| suspended.force())
    }
}

impl<A, R> Clone for Composition<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
{
    fn clone(&self) -> Self {
        // In-flight entries are skipped; they are not memoized yet.
        let memo = self
            .memo
            .lock()
            .iter()
            .filter_map(|(arg, slot)| {
                let value = slot.peek()?;
                Some((arg.clone(), Arc::new(Entry::completed(value))))
            })
            .collect();
        Self {
            func: self.func.clone(),
            memo: Mutex::new(memo),
        }
    }
}

impl<A, R> Default for Composition<A, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, R> fmt::Debug for Composition<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("valid", &self.valid())
            .field("entries", &self.memo.lock().len())
            .finish()
    }
}

impl<'a, 'b, A, R, B, O> Mul<&'b Composition<B, O>> for &'a Composition<A, R>
where
    A: Eq + Hash + Clone + Send + 'static,
    R: Clone + Send + 'static,
    B: Eq + Hash + Clone + Send + 'static,
    O: Into<A> + Clone + Send + 'static,
{
    type Output = Composition<B, R>;

    fn mul(self, inner: &'b Composition<B, O>) -> Composition<B, R> {
        self.compose(inner)
    }
}

impl<A, R> Callable for Composition<A, R>
where
    A: Eq + Hash + Clone,
    R: Clone,
{
    type Input = A;
    type Output = R;

    fn call(&self, input: A) -> R {
        self.invoke(input)
    }

    fn name(&self) -> &'static str {
        "Composition"
    }

    fn is_cached(&self, input: &A) -> bool {
        self.is_memoized(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted<F>(f: F) -> (Composition<i64, i64>, Arc<AtomicUsize>)
    where
        F: Fn(i64) -> i64 + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let comp = Composition::new(move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            f(n)
        });
        (comp, calls)
    }

    #[test]
    fn test_invoke_computes_once_per_argument() {
        let (square, calls) = counted(|n| n * n);

        for _ in 0..5 {
            assert_eq!(square.invoke(7), 49);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(square.invoke(-3), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(square.memo_len(), 2);
    }

    #[test]
    fn test_is_memoized_tracks_entries() {
        let (double, _) = counted(|n| n * 2);
        assert!(!double.is_memoized(&4));
        double.invoke(4);
        assert!(double.is_memoized(&4));
        assert!(!double.is_memoized(&5));
    }

    #[test]
    fn test_panicking_function_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let flaky = Composition::new(move |n: i64| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first attempt fails");
            }
            n + 1
        });

        let first = catch_unwind(AssertUnwindSafe(|| flaky.invoke(1)));
        assert!(first.is_err());
        assert!(!flaky.is_memoized(&1));

        assert_eq!(flaky.invoke(1), 2);
        assert_eq!(flaky.invoke(1), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_try_invoke_caches_only_success() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let parse = Composition::new(move |s: String| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err("not yet".to_string());
            }
            s.parse::<i32>().map_err(|e| e.to_string())
        });

        assert_eq!(parse.try_invoke("42".to_string()), Err("not yet".to_string()));
        assert_eq!(parse.try_invoke("42".to_string()), Ok(42));
        assert_eq!(parse.try_invoke("42".to_string()), Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_composition() {
        let empty: Composition<i32, i32> = Composition::empty();
        assert!(!empty.valid());
        assert_eq!(empty.checked_invoke(1), Err(CompositionError::EmptyFunction));
        assert!(empty.to_fn().is_none());

        let result = catch_unwind(AssertUnwindSafe(|| empty.invoke(1)));
        assert!(result.is_err());
    }

    #[test]
    fn test_compose_runs_inner_first() {
        let add_one = Composition::new(|n: i64| n + 1);
        let double = Composition::new(|n: i64| n * 2);

        // add_one ∘ double
        let composed = add_one.compose(&double);
        assert_eq!(composed.invoke(5), 11);

        // double ∘ add_one
        let composed = &double * &add_one;
        assert_eq!(composed.invoke(5), 12);
    }

    #[test]
    fn test_compose_with_empty_operand_is_empty() {
        let add_one = Composition::new(|n: i32| n + 1);
        let empty: Composition<i32, i32> = Composition::empty();

        for composed in [add_one.compose(&empty), empty.compose(&add_one), &empty * &empty] {
            assert!(!composed.valid());
            assert_eq!(composed.checked_invoke(1), Err(CompositionError::EmptyFunction));
        }

        let composed = empty.compose_fn(|s: &'static str| s.len() as i32);
        assert!(!composed.valid());
        assert_eq!(composed.checked_invoke("abc"), Err(CompositionError::EmptyFunction));
    }

    #[test]
    fn test_entry_held_by_another_caller_stays_visible() {
        let (square, _) = counted(|n| n * n);
        square.invoke(3);

        let slot = square.slot(&3);
        let held = std::sync::Barrier::new(2);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                // A memo hit in progress on another thread.
                let _hit = slot.value.lock();
                held.wait();
                std::thread::sleep(std::time::Duration::from_millis(20));
            });
            held.wait();

            assert!(square.is_memoized(&3));
            assert_eq!(square.memo_len(), 1);
            let copy = square.clone();
            assert!(copy.is_memoized(&3));
            assert_eq!(copy.memo_len(), 1);
        });
    }

    #[test]
    fn test_compose_with_conversion() {
        let len = Composition::new(|s: String| s.len() as u32);
        let wide = Composition::new(|n: u64| n * 1_000_000_000);

        let composed = wide.compose(&len);
        assert_eq!(composed.invoke("abcde".to_string()), 5_000_000_000);
    }

    #[test]
    fn test_compose_fn() {
        let negate = Composition::new(|n: i64| -n);
        let composed = negate.compose_fn(|s: &'static str| s.len() as i64);
        assert_eq!(composed.invoke("four"), -4);
    }

    #[test]
    fn test_composed_chain_reuses_operand_memo() {
        let (inner, inner_calls) = counted(|n| n + 10);
        let (outer, outer_calls) = counted(|n| n * 3);

        let composed = outer.compose(&inner);
        assert_eq!(composed.invoke(1), 33);
        assert_eq!(composed.invoke(1), 33);

        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outer_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_carries_memo_snapshot() {
        let (square, calls) = counted(|n| n * n);
        square.invoke(3);

        let copy = square.clone();
        assert!(copy.is_memoized(&3));
        assert_eq!(copy.invoke(3), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Entries added after the copy stay with their own table.
        copy.invoke(4);
        assert!(copy.is_memoized(&4));
        assert!(!square.is_memoized(&4));
    }

    #[test]
    fn test_to_fn_bypasses_memo() {
        let (square, calls) = counted(|n| n * n);
        square.invoke(2);

        let raw = square.to_fn().unwrap();
        assert_eq!(raw(2), 4);
        assert_eq!(raw(2), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_concurrent_callers_evaluate_once() {
        let (slow, calls) = counted(|n| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            n + 1
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert_eq!(slow.invoke(41), 42));
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_and_constant_adapter() {
        let forced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&forced);
        let answer: Suspended<i32> = Composition::new(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(answer.force(), 42);
        assert_eq!(answer.force(), 42);

        // The adapter captures the already-forced memo.
        let always = answer.constant::<&'static str>();
        assert_eq!(always.invoke("ignored"), 42);
        assert_eq!(always.invoke("also ignored"), 42);
        assert_eq!(forced.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callable_reports_cache_state() {
        let double = Composition::new(|n: i32| n * 2);
        assert!(!double.is_cached(&2));
        assert_eq!(double.call(2), 4);
        assert!(double.is_cached(&2));
        assert_eq!(Callable::name(&double), "Composition");
    }
}
