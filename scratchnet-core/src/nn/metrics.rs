use super::loss::Targets;
use crate::error::{Error, Result};
use crate::tensor::{argmax_rows, batch_len, Scalar};

use ndarray::Array2;

/// Fraction of samples whose highest-probability class is the true class.
pub fn accuracy<T: Scalar>(y_pred: &Array2<T>, targets: &Targets<T>) -> Result<T> {
    if y_pred.nrows() == 0 {
        return Err(Error::EmptyBatch("accuracy"));
    }
    if targets.len() != y_pred.nrows() {
        return Err(Error::shape("accuracy", &[y_pred.nrows()], &[targets.len()]));
    }

    let predicted = argmax_rows(&y_pred.view());
    let correct = predicted
        .iter()
        .zip(targets.indices().iter())
        .filter(|(p, t)| p == t)
        .count();

    Ok(batch_len::<T>(correct) / batch_len::<T>(y_pred.nrows()))
}
