//! Calibration samples.

use std::sync::Arc;

use crate::balancer::FixedBalancer;
use crate::list::DistributedList;

/// Produces the collections a calibration benchmarks against.
///
/// Implementations must be deterministic and must return collections with
/// adaptive selection disabled, so building a sample never triggers another
/// calibration.
pub trait SampleProvider<T> {
    fn sample(&self, size: usize) -> DistributedList<T>;
}

/// Element types that can be synthesised for calibration samples.
///
/// Wide integers, floats and strings give distinct values for every seed a
/// sample uses. Narrow types repeat: `u8`/`i8` wrap every 256 seeds,
/// `u16`/`i16` every 65,536, and `bool` alternates, so calibrating on them
/// times a search that stops at the first repeat rather than a full scan.
pub trait SampleElement: Clone + PartialEq + 'static {
    /// A deterministic value for position `seed`.
    fn sample(seed: usize) -> Self;
}

macro_rules! sample_element_as {
    ($($ty:ty),*) => {
        $(
            impl SampleElement for $ty {
                #[inline]
                fn sample(seed: usize) -> Self {
                    return seed as $ty;
                }
            }
        )*
    };
}

sample_element_as!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl SampleElement for bool {
    fn sample(seed: usize) -> Self {
        return seed % 2 == 1;
    }
}

impl SampleElement for char {
    fn sample(seed: usize) -> Self {
        return char::from_u32((seed % 0xD800) as u32).unwrap_or('\u{FFFD}');
    }
}

impl SampleElement for String {
    fn sample(seed: usize) -> Self {
        return format!("sample-{}", seed);
    }
}

/// Samples `0..size` mapped through [`SampleElement::sample`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSamples;

impl<T: SampleElement> SampleProvider<T> for DefaultSamples {
    fn sample(&self, size: usize) -> DistributedList<T> {
        let mut list = DistributedList::with_balancer(Arc::new(FixedBalancer::default()), false);
        list.extend_from((0..size).map(T::sample));
        return list;
    }
}
