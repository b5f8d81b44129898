//! Waiting for a batch of independent operations.

use futures_util::future::join_all;
use std::future::Future;

/// Terminal state of one operation in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Settlement<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settlement<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfilled(value),
            Err(reason) => Self::Rejected(reason),
        }
    }
}

/// Drive every operation to completion and report them in input order.
///
/// All operations are polled concurrently. A rejection never cancels or
/// short-circuits its siblings; the returned vector always has one entry
/// per input.
pub async fn settle_all<I, F, T, E>(operations: I) -> Vec<Settlement<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(operations)
        .await
        .into_iter()
        .map(Settlement::from)
        .collect()
}
