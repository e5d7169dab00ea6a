//! # Per-Call Tracing
//!
//! Compile-time configurable tracing of individual calls, using const generics.
//!
//! - `Traced<C, false>`: no tracing code is generated. The wrapper compiles away
//!   and returns the bare output.
//! - `Traced<C, true>`: every call returns `(output, TraceNode)` with the wall
//!   time of the call and whether the result came from a memo.
//!
//! [`AutoTraced`] picks between the two from `debug_assertions`.
//!
//! Library-level log events (memo misses, task triggers) go through the
//! `tracing` crate instead; this module is for callers who want the timing
//! of a specific pipeline as a value.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Anything that maps an input to an output and can be traced.
///
/// Memoizing compositions and the task compositions implement this, so a
/// `Traced` wrapper works over either family.
pub trait Callable {
    /// The argument type.
    type Input;

    /// The result type.
    type Output;

    /// Run the callable.
    fn call(&self, input: Self::Input) -> Self::Output;

    /// Name used in traces.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether a call with `input` would be served from a cache.
    fn is_cached(&self, _input: &Self::Input) -> bool {
        false
    }
}

/// A node in the trace tree, recording timing and hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    /// The name of the callable
    pub name: String,
    /// How long the call took
    pub duration: Duration,
    /// Whether the result was served from a memo
    pub cached: bool,
    /// Child traces (for composed pipelines)
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Create a new trace node.
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            cached: false,
            children: Vec::new(),
        }
    }

    /// Mark whether the result came from a memo.
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Add a child trace.
    pub fn with_child(mut self, child: TraceNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple children.
    pub fn with_children(mut self, children: Vec<TraceNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Pretty-print the trace tree.
    pub fn display(&self) -> String {
        self.display_indent(0)
    }

    fn display_indent(&self, indent: usize) -> String {
        let mut out = format!(
            "{}[{:?}] {}{}\n",
            "  ".repeat(indent),
            self.duration,
            self.name,
            if self.cached { " (cached)" } else { "" }
        );
        for child in &self.children {
            out.push_str(&child.display_indent(indent + 1));
        }
        out
    }

    /// Number of nodes in this tree whose result came from a memo.
    pub fn cache_hits(&self) -> usize {
        usize::from(self.cached) + self.children.iter().map(TraceNode::cache_hits).sum::<usize>()
    }
}

impl std::fmt::Display for TraceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A traced wrapper around a callable.
///
/// ```rust
/// use composable_core::{CallableExt, Callable, Composition};
///
/// let square = Composition::new(|n: u64| n * n).traced();
/// let (value, trace) = square.call(12);
/// assert_eq!(value, 144);
/// assert!(!trace.cached);
///
/// let (_, trace) = square.call(12);
/// assert!(trace.cached);
/// ```
#[derive(Clone, Debug)]
pub struct Traced<C, const ENABLED: bool> {
    inner: C,
}

impl<C, const ENABLED: bool> Traced<C, ENABLED> {
    /// Create a new traced wrapper.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Get a reference to the inner callable.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap and return the inner callable.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Callable> Callable for Traced<C, false> {
    type Input = C::Input;
    type Output = C::Output;

    fn call(&self, input: Self::Input) -> Self::Output {
        self.inner.call(input)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_cached(&self, input: &Self::Input) -> bool {
        self.inner.is_cached(input)
    }
}

impl<C: Callable> Callable for Traced<C, true> {
    type Input = C::Input;
    type Output = (C::Output, TraceNode);

    fn call(&self, input: Self::Input) -> Self::Output {
        let cached = self.inner.is_cached(&input);
        let start = Instant::now();
        let output = self.inner.call(input);
        let trace = TraceNode::new(self.inner.name(), start.elapsed()).with_cached(cached);
        (output, trace)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_cached(&self, input: &Self::Input) -> bool {
        self.inner.is_cached(input)
    }
}

/// Traced callable for debug builds: full tracing.
#[cfg(debug_assertions)]
pub type AutoTraced<C> = Traced<C, true>;

/// Traced callable for release builds: zero overhead.
#[cfg(not(debug_assertions))]
pub type AutoTraced<C> = Traced<C, false>;

/// Extension trait for wrapping callables with optional tracing.
pub trait CallableExt: Callable + Sized {
    /// Wrap this callable with tracing enabled.
    fn traced(self) -> Traced<Self, true> {
        Traced::new(self)
    }

    /// Wrap this callable with tracing disabled.
    fn untraced(self) -> Traced<Self, false> {
        Traced::new(self)
    }

    /// Wrap with auto-selected tracing (debug = on, release = off).
    fn auto_traced(self) -> AutoTraced<Self> {
        Traced::new(self)
    }
}

impl<C: Callable + Sized> CallableExt for C {}

#[cfg(test)]
mod tests {
    use super::*;

    struct AddOne;

    impl Callable for AddOne {
        type Input = i32;
        type Output = i32;

        fn call(&self, input: i32) -> i32 {
            input + 1
        }

        fn name(&self) -> &'static str {
            "AddOne"
        }
    }

    struct Sleepy {
        delay_ms: u64,
    }

    impl Callable for Sleepy {
        type Input = ();
        type Output = ();

        fn call(&self, _input: ()) {
            std::thread::sleep(Duration::from_millis(self.delay_ms));
        }
    }

    #[test]
    fn test_traced_disabled_same_output() {
        let traced: Traced<AddOne, false> = Traced::new(AddOne);
        assert_eq!(traced.call(5), 6);
    }

    #[test]
    fn test_traced_enabled_includes_trace() {
        let traced: Traced<AddOne, true> = Traced::new(AddOne);

        let (result, trace) = traced.call(5);
        assert_eq!(result, 6);
        assert_eq!(trace.name, "AddOne");
        assert!(!trace.cached);
    }

    #[test]
    fn test_trace_timing_accuracy() {
        let traced = Sleepy { delay_ms: 50 }.traced();
        let ((), trace) = traced.call(());

        assert!(trace.duration.as_millis() >= 45);
        assert!(trace.duration.as_millis() < 1000);
    }

    #[test]
    fn test_default_name_is_type_name() {
        let sleepy = Sleepy { delay_ms: 0 };
        assert!(sleepy.name().ends_with("Sleepy"));
    }

    #[test]
    fn test_trace_node_display() {
        let trace = TraceNode::new("pipeline", Duration::from_millis(100))
            .with_child(TraceNode::new("inner", Duration::from_millis(30)).with_cached(true))
            .with_child(TraceNode::new("outer", Duration::from_millis(40)));

        let display = trace.display();
        assert!(display.contains("pipeline"));
        assert!(display.contains("inner (cached)"));
        assert!(display.contains("outer"));
        assert!(display.contains("100ms"));
        assert_eq!(trace.cache_hits(), 1);
    }

    #[test]
    fn test_trace_node_with_children() {
        let parent = TraceNode::new("pipeline", Duration::from_millis(50)).with_children(vec![
            TraceNode::new("op1", Duration::from_millis(10)),
            TraceNode::new("op2", Duration::from_millis(20)),
        ]);

        assert_eq!(parent.children.len(), 2);
        assert_eq!(parent.children[0].name, "op1");
        assert_eq!(parent.children[1].name, "op2");
    }

    #[test]
    fn test_traced_wrapper_accessors() {
        let traced = AddOne.traced();
        assert_eq!(traced.inner().name(), "AddOne");
        assert_eq!(traced.into_inner().name(), "AddOne");
    }

    #[test]
    fn test_untraced_passthrough() {
        assert_eq!(AddOne.untraced().call(10), 11);
    }

    #[test]
    fn test_trace_serializes_to_json() {
        let trace = TraceNode::new("square", Duration::from_millis(3)).with_cached(true);

        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"name\":\"square\""));
        assert!(json.contains("\"cached\":true"));

        let back: TraceNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
    }
}
