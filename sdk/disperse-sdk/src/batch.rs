//! Splits recipient lists into bounded, ordered batches.

use std::future::Future;
use std::ops::Range;

/// A consecutive slice of the input, tagged with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<'a, T> {
    pub index: usize,
    /// Position of `items` within the original list.
    pub range: Range<usize>,
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `ceil(len / batch_size)`; a zero batch size is treated as one.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Non-overlapping batches of at most `batch_size`, in input order.
/// A zero batch size is treated as one.
pub fn partition<T>(items: &[T], batch_size: usize) -> impl Iterator<Item = Batch<'_, T>> {
    let size = batch_size.max(1);
    items.chunks(size).enumerate().map(move |(index, chunk)| {
        let start = index * size;
        Batch {
            index,
            range: start..start + chunk.len(),
            items: chunk,
        }
    })
}

/// Run `action` once per batch, strictly one after another.
///
/// The first error stops the walk; batches already processed stay processed.
pub async fn for_each_batch<'a, T, F, Fut, E>(
    items: &'a [T],
    batch_size: usize,
    mut action: F,
) -> Result<(), E>
where
    F: FnMut(Batch<'a, T>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for batch in partition(items, batch_size) {
        action(batch).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_partition_sizes() {
        for (n, b) in [(0usize, 20usize), (1, 20), (20, 20), (21, 20), (45, 20), (100, 7), (5, 1)] {
            let items: Vec<usize> = (0..n).collect();
            let batches: Vec<_> = partition(&items, b).collect();

            assert_eq!(batches.len(), batch_count(n, b), "n={} b={}", n, b);
            for (i, batch) in batches.iter().enumerate() {
                assert_eq!(batch.index, i);
                if i + 1 < batches.len() {
                    assert_eq!(batch.len(), b);
                } else {
                    assert!(batch.len() <= b && !batch.is_empty());
                }
                assert_eq!(&items[batch.range.clone()], batch.items);
            }

            let rebuilt: Vec<usize> = batches
                .iter()
                .flat_map(|b| b.items.iter().copied())
                .collect();
            assert_eq!(rebuilt, items);
        }
    }

    #[test]
    fn test_zero_batch_size_treated_as_one() {
        let items = [1, 2, 3];
        assert_eq!(partition(&items, 0).count(), 3);
        assert_eq!(batch_count(3, 0), 3);
    }

    #[tokio::test]
    async fn test_for_each_batch_sequential() {
        let items: Vec<u32> = (0..45).collect();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let result: Result<(), ()> = for_each_batch(&items, 20, |batch| {
            let seen = seen.clone();
            async move {
                tokio::task::yield_now().await;
                seen.lock().unwrap().push((batch.index, batch.items.to_vec()));
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.iter().map(|(i, b)| (*i, b.len())).collect::<Vec<_>>(),
            vec![(0, 20), (1, 20), (2, 5)]
        );
        let flat: Vec<u32> = seen.iter().flat_map(|(_, b)| b.iter().copied()).collect();
        assert_eq!(flat, items);
    }

    #[tokio::test]
    async fn test_for_each_batch_empty_never_calls_action() {
        let items: Vec<u32> = Vec::new();
        let calls = Arc::new(Mutex::new(0usize));

        let result: Result<(), ()> = for_each_batch(&items, 20, |_| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_for_each_batch_stops_on_error() {
        let items: Vec<u32> = (0..50).collect();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let result = for_each_batch(&items, 10, |batch| {
            let calls = calls.clone();
            async move {
                calls.lock().unwrap().push(batch.index);
                if batch.index == 2 {
                    Err(batch.range.clone())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(result, Err(20..30));
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    }
}
