//! Row-parallel iteration with an optional rayon backend.
//!
//! With the `parallel` feature this is rayon's prelude. Without it,
//! `into_par_iter()` is plain `into_iter()`, so the same iterator chains
//! (`.map()`, `.collect::<Result<_>>()`) run sequentially.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
