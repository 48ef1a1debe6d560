//! Runtime index to static call.
//!
//! [`Candidates`] maps an option index to one of a fixed set of callables with
//! a shared signature. Tuples get one `match` arm per element, so each arm
//! calls a concrete closure type that the compiler can inline; arrays index
//! directly.
//!
//! Multi-argument candidates take a tuple:
//!
//! ```ignore
//! let mut add = (|(a, b): (u32, u32)| a + b, |(a, b): (u32, u32)| b + a);
//! assert_eq!(veer_rs::switch::invoke(1, &mut add, (2, 3)), 5);
//! ```
//!
//! Tuples are implemented up to [`MAX_OPTIONS`] elements; a larger tuple has
//! no implementation and fails to compile. Arrays longer than `MAX_OPTIONS`
//! (or empty) fail a constant assertion when the dispatcher is instantiated.

use crate::selector::MAX_OPTIONS;

/// Number of callables in a candidate set.
///
/// Separate from [`Candidates`] so the count is known before the argument
/// type is, when a dispatcher sizes its selector.
pub trait Arity {
    /// Number of candidates.
    const LEN: usize;
}

/// A fixed, ordered set of interchangeable callables.
pub trait Candidates<Args, R>: Arity {
    /// Call the candidate at `index`.
    ///
    /// `index` must be below [`Arity::LEN`]. Selectors never produce anything
    /// else; an out-of-range index from a caller panics.
    fn invoke(&mut self, index: usize, args: Args) -> R;
}

/// Call the candidate at `index` with `args`.
#[inline(always)]
pub fn invoke<C, Args, R>(index: usize, candidates: &mut C, args: Args) -> R
where
    C: Candidates<Args, R>,
{
    candidates.invoke(index, args)
}

#[cold]
#[inline(never)]
fn out_of_range(index: usize, len: usize) -> ! {
    unreachable!("option index {index} out of range for {len} candidates")
}

macro_rules! impl_candidates_for_tuple {
    ($len:expr; $($idx:tt => $f:ident),+) => {
        impl<$($f),+> Arity for ($($f,)+) {
            const LEN: usize = $len;
        }

        impl<Args, R, $($f),+> Candidates<Args, R> for ($($f,)+)
        where
            $($f: FnMut(Args) -> R,)+
        {
            #[inline(always)]
            fn invoke(&mut self, index: usize, args: Args) -> R {
                match index {
                    $($idx => (self.$idx)(args),)+
                    _ => out_of_range(index, $len),
                }
            }
        }
    };
}

impl_candidates_for_tuple!(1; 0 => F0);
impl_candidates_for_tuple!(2; 0 => F0, 1 => F1);
impl_candidates_for_tuple!(3; 0 => F0, 1 => F1, 2 => F2);
impl_candidates_for_tuple!(4; 0 => F0, 1 => F1, 2 => F2, 3 => F3);
impl_candidates_for_tuple!(5; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4);
impl_candidates_for_tuple!(6; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4, 5 => F5);
impl_candidates_for_tuple!(7; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4, 5 => F5, 6 => F6);
impl_candidates_for_tuple!(8; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4, 5 => F5, 6 => F6, 7 => F7);
impl_candidates_for_tuple!(9; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4, 5 => F5, 6 => F6, 7 => F7, 8 => F8);
impl_candidates_for_tuple!(10; 0 => F0, 1 => F1, 2 => F2, 3 => F3, 4 => F4, 5 => F5, 6 => F6, 7 => F7, 8 => F8, 9 => F9);

impl<F, const N: usize> Arity for [F; N] {
    const LEN: usize = {
        assert!(
            N >= 1 && N <= MAX_OPTIONS,
            "candidate arrays must hold between 1 and MAX_OPTIONS callables"
        );
        N
    };
}

impl<Args, R, F, const N: usize> Candidates<Args, R> for [F; N]
where
    F: FnMut(Args) -> R,
{
    #[inline(always)]
    fn invoke(&mut self, index: usize, args: Args) -> R {
        match self.get_mut(index) {
            Some(f) => f(args),
            None => out_of_range(index, N),
        }
    }
}
