/// Number of items per batch when `total` items are cut into `batch_count` batches.
/// Never zero, so empty inputs and a zero batch count still produce a usable chunk size.
#[inline]
pub fn batch_size(total: usize, batch_count: usize) -> usize {
    total.div_ceil(batch_count.max(1)).max(1)
}

/// Number of batches actually produced: `ceil(total / batch_size)`.
/// This is at most `batch_count`, and can be fewer (e.g. 11 items in 10 batches of 2 gives 6).
#[inline]
pub fn num_batches(total: usize, batch_count: usize) -> usize {
    total.div_ceil(batch_size(total, batch_count))
}

/// Cut `items` into consecutive batches.
#[inline]
pub fn batches<T>(items: &[T], batch_count: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(batch_size(items.len(), batch_count))
}
