//! Balanced contiguous chunking of a key batch.

use crate::error::DispatchError;

/// Split `items` into at most `workers` contiguous chunks whose sizes differ
/// by at most one, larger chunks first.
///
/// Never yields more chunks than items, and never yields an empty chunk;
/// an empty input produces no chunks at all.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidArgument`] when `workers` is zero.
pub fn partition<T>(items: &[T], workers: usize) -> Result<Vec<&[T]>, DispatchError> {
    if workers == 0 {
        return Err(DispatchError::InvalidArgument(
            "worker count must be at least 1".to_string(),
        ));
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_count = workers.min(items.len());
    let base = items.len() / chunk_count;
    let remainder = items.len() % chunk_count;

    let mut chunks = Vec::with_capacity(chunk_count);
    let mut rest = items;
    for i in 0..chunk_count {
        let size = base + usize::from(i < remainder);
        let (head, tail) = rest.split_at(size);
        chunks.push(head);
        rest = tail;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_invalid() {
        let err = partition(&[1, 2, 3], 0).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument(_)));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let items: [&str; 0] = [];
        assert!(partition(&items, 3).unwrap().is_empty());
    }

    #[test]
    fn more_workers_than_keys_yields_singletons() {
        let chunks = partition(&["a", "b"], 3).unwrap();
        assert_eq!(chunks, vec![&["a"][..], &["b"][..]]);
    }

    #[test]
    fn seven_keys_three_workers_is_balanced() {
        let items: Vec<u32> = (0..7).collect();
        let sizes: Vec<usize> = partition(&items, 3).unwrap().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
    }

    #[test]
    fn concatenation_restores_input_and_sizes_stay_within_one() {
        for len in 0..40usize {
            let items: Vec<usize> = (0..len).collect();
            for workers in 1..10usize {
                let chunks = partition(&items, workers).unwrap();

                let rejoined: Vec<usize> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
                assert_eq!(rejoined, items, "len={len} workers={workers}");

                assert!(chunks.len() <= workers);
                assert!(chunks.len() <= len);
                assert!(chunks.iter().all(|c| !c.is_empty()));

                if let (Some(max), Some(min)) = (
                    chunks.iter().map(|c| c.len()).max(),
                    chunks.iter().map(|c| c.len()).min(),
                ) {
                    assert!(max - min <= 1, "len={len} workers={workers}");
                }
            }
        }
    }

    #[test]
    fn duplicates_are_preserved_positionally() {
        let items = ["Dolo", "Dolo", "Crocin"];
        let chunks = partition(&items, 2).unwrap();
        assert_eq!(chunks, vec![&["Dolo", "Dolo"][..], &["Crocin"][..]]);
    }
}
