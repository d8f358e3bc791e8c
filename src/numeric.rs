use num_traits::Float;
use std::fmt::Display;

/// Assert two float values are the same up to `eps`.
#[allow(dead_code)]
pub fn assert_float_eq<T>(left: T, right: T, eps: T)
where
    T: Float + Display,
{
    if left.is_nan() {
        assert!(right.is_nan(), "left is NaN, but right is not");
    } else {
        let diff = (left - right).abs();
        assert!(
            diff < eps,
            "values |{} - {}| ≥ {} (diff: {})",
            left,
            right,
            eps,
            diff
        );
    }
}

/// Arithmetic mean of `values`, or `None` if there are none.
pub fn mean<T, I>(values: I) -> Option<T>
where
    T: Float,
    I: IntoIterator<Item = T>,
{
    let (sum, count) = values
        .into_iter()
        .fold((T::zero(), 0usize), |(sum, count), x| (sum + x, count + 1));
    if count == 0 {
        return None;
    }
    T::from(count).map(|n| sum / n)
}
