//! # Composition Laws
//!
//! Memoizing compositions form a category: types are objects, compositions
//! are morphisms, [`identity`] is the identity arrow and
//! [`Composition::compose`] is composition. The laws
//!
//! 1. `id ∘ f = f = f ∘ id`                (identity)
//! 2. `h ∘ (g ∘ f) = (h ∘ g) ∘ f`          (associativity)
//!
//! cannot be proven for arbitrary closures, but they can be checked on
//! sample inputs. The checkers here return the first counterexample as a
//! [`CompositionError::LawViolation`].

use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::error::CompositionError;
use crate::memo::Composition;

/// The identity composition on `A`.
pub fn identity<A>() -> Composition<A, A>
where
    A: Eq + Hash + Clone + Send + 'static,
{
    Composition::new(|a: A| a)
}

/// Check `id ∘ f = f` and `f ∘ id = f` on every sample.
pub fn check_identity_laws<A, R, I>(f: &Composition<A, R>, samples: I) -> Result<(), CompositionError>
where
    A: Eq + Hash + Clone + Send + Debug + 'static,
    R: Clone + Send + Eq + Hash + 'static,
    I: IntoIterator<Item = A>,
{
    let left = identity::<R>().compose(f);
    let right = f.compose(&identity::<A>());

    for sample in samples {
        let expected = f.invoke(sample.clone());
        if left.invoke(sample.clone()) != expected {
            return Err(violation("left identity", &sample));
        }
        if right.invoke(sample.clone()) != expected {
            return Err(violation("right identity", &sample));
        }
    }
    Ok(())
}

/// Check `h ∘ (g ∘ f) = (h ∘ g) ∘ f` on every sample.
pub fn check_associativity<A, B, C, D, I>(
    h: &Composition<C, D>,
    g: &Composition<B, C>,
    f: &Composition<A, B>,
    samples: I,
) -> Result<(), CompositionError>
where
    A: Eq + Hash + Clone + Send + Debug + 'static,
    B: Eq + Hash + Clone + Send + 'static,
    C: Eq + Hash + Clone + Send + 'static,
    D: Clone + Send + PartialEq + 'static,
    I: IntoIterator<Item = A>,
{
    let nested_right = h.compose(&g.compose(f));
    let nested_left = h.compose(g).compose(f);

    for sample in samples {
        if nested_right.invoke(sample.clone()) != nested_left.invoke(sample.clone()) {
            return Err(violation("associativity", &sample));
        }
    }
    Ok(())
}

/// Check that `chain` maps every sample back to itself.
///
/// Useful for pipelines built from a function and its inverse.
pub fn check_round_trip<A, I>(chain: &Composition<A, A>, samples: I) -> Result<(), CompositionError>
where
    A: Eq + Hash + Clone + Debug,
    I: IntoIterator<Item = A>,
{
    for sample in samples {
        if chain.invoke(sample.clone()) != sample {
            return Err(violation("round trip", &sample));
        }
    }
    Ok(())
}

fn violation(law: &'static str, input: &impl Debug) -> CompositionError {
    let input = format!("{:?}", input);
    debug!(law, %input, "composition law violated");
    CompositionError::LawViolation { law, input }
}
