/// One contiguous byte sub-range of a resource, fetched by a single worker.
///
/// The range is half-open: `start` is included, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `Range` header value for the byte span `[start, end)`.
    ///
    /// HTTP range endpoints are inclusive, so the exclusive end is mapped
    /// to `end - 1` here and nowhere else.
    pub fn range_header(start: u64, end: u64) -> String {
        format!("bytes={}-{}", start, end.saturating_sub(1))
    }
}

/// Plans the segments for a resource of `total_len` bytes split across
/// `workers` fetchers.
///
/// Segments are contiguous and exactly partition `[0, total_len)`; the
/// remainder of the integer division goes to the last segment. When
/// `total_len` is smaller than `workers`, the leading segments come out
/// empty and only the last one carries bytes; empty segments are skipped
/// by the fetcher.
pub fn plan_segments(total_len: u64, workers: usize) -> Vec<Segment> {
    let workers = workers.max(1);
    let part_size = total_len / workers as u64;

    let mut segments = Vec::with_capacity(workers);
    for index in 0..workers {
        let start = index as u64 * part_size;
        let end = if index == workers - 1 {
            total_len
        } else {
            start + part_size
        };
        segments.push(Segment { index, start, end });
    }
    segments
}
