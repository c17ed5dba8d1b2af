use crate::error::{Error, Result};

use ndarray::{Array1, Array2, ArrayView2, Axis, ScalarOperand};
use num_traits::{Float, FromPrimitive, NumAssign};
use tracing::warn;

use std::fmt::{Debug, Display};

/// Element type accepted by every layer, loss and optimizer.
pub trait Scalar:
    Float + NumAssign + FromPrimitive + ScalarOperand + Debug + Display + Send + Sync + 'static
{
}

impl<T> Scalar for T where
    T: Float + NumAssign + FromPrimitive + ScalarOperand + Debug + Display + Send + Sync + 'static
{
}

/// Converts an `f64` constant into `T`. Infallible for `f32` and `f64`.
pub fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

pub(crate) fn batch_len<T: Scalar>(len: usize) -> T {
    T::from_usize(len).unwrap_or_else(T::nan)
}

/// Index of the largest entry of every row. Ties resolve to the first index.
pub fn argmax_rows<T: Scalar>(data: &ArrayView2<T>) -> Array1<usize> {
    data.map_axis(Axis(1), |row| {
        let mut max = T::neg_infinity();
        let mut max_index = 0;
        for (i, &val) in row.iter().enumerate() {
            if val > max {
                max = val;
                max_index = i;
            }
        }
        max_index
    })
}

pub fn one_hot<T: Scalar>(indices: &Array1<usize>, num_classes: usize) -> Result<Array2<T>> {
    let mut encoded = Array2::zeros((indices.len(), num_classes));
    for (row, &index) in indices.iter().enumerate() {
        if index >= num_classes {
            return Err(Error::LabelOutOfRange { index, classes: num_classes });
        }
        encoded[[row, index]] = T::one();
    }
    Ok(encoded)
}

pub fn clip<T: Scalar>(data: &Array2<T>, min: T, max: T) -> Array2<T> {
    data.mapv(|x| x.max(min).min(max))
}

/// Fails with `Error::NonFinite` if any entry is NaN or infinite.
pub fn check_finite<T: Scalar>(data: &Array2<T>, name: &str) -> Result<()> {
    let bad_count = data.iter().filter(|x| !x.is_finite()).count();
    if bad_count > 0 {
        let ratio = bad_count as f32 / data.len() as f32;
        warn!(tensor = name, ratio, "non-finite values detected");
        return Err(Error::NonFinite(name.to_string()));
    }
    Ok(())
}

pub(crate) fn expect_shape(op: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(Error::shape(op, expected, actual));
    }
    Ok(())
}
