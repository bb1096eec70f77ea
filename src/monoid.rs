use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, Mul};
use std::sync::Arc;

type Op<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// A binary operation paired with its left identity.
///
/// The reducer folds every forked chunk starting from [`Monoid::identity`]
/// and stitches the partial results back together with the same operation,
/// so `op` must be associative and `op(identity, x) == x` must hold for all
/// `x`. Neither law is checked at runtime; a pair that breaks them yields
/// wrong results, not an error.
pub struct Monoid<T> {
    op: Op<T>,
    identity: T,
}

impl<T> Monoid<T> {
    pub fn new<F>(identity: T, op: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        Monoid {
            op: Arc::new(op),
            identity,
        }
    }

    pub fn combine(&self, a: T, b: T) -> T {
        (self.op)(a, b)
    }

    /// Left fold of `iter` seeded with `seed`.
    pub fn fold<I>(&self, iter: I, seed: T) -> T
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter().fold(seed, |acc, x| (self.op)(acc, x))
    }
}

impl<T: Clone> Monoid<T> {
    pub fn identity(&self) -> T {
        self.identity.clone()
    }

    /// Left fold of `iter` seeded with the identity.
    pub fn concat<I>(&self, iter: I) -> T
    where
        I: IntoIterator<Item = T>,
    {
        self.fold(iter, self.identity())
    }
}

impl<T> Monoid<T>
where
    T: Add<Output = T> + Sum + Clone,
{
    /// Addition with the empty sum as identity.
    pub fn sum() -> Self {
        Monoid::new(std::iter::empty::<T>().sum(), |a, b| a + b)
    }
}

impl<T> Monoid<T>
where
    T: Mul<Output = T> + Product + Clone,
{
    /// Multiplication with the empty product as identity.
    pub fn product() -> Self {
        Monoid::new(std::iter::empty::<T>().product(), |a, b| a * b)
    }
}

impl<T: Clone> Clone for Monoid<T> {
    fn clone(&self) -> Self {
        Monoid {
            op: Arc::clone(&self.op),
            identity: self.identity.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Monoid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monoid")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
