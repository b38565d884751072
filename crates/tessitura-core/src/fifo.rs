//! Elastic FIFO of interleaved sample frames.
//!
//! Producers append at the logical end, consumers advance a read cursor. The backing
//! storage only grows; when the tail runs out of room the valid window is shifted back to
//! index 0 before any reallocation is considered, so the allocation stays proportional to
//! the data in flight rather than to lifetime throughput.
//!
//! ## RT-Safety
//!
//! After warm-up (once the storage has reached the steady-state high-water mark) no
//! method allocates.

/// Queue of interleaved frames (`C0,C1,..,C0,C1,..`) with a fixed channel count.
#[derive(Debug, Clone, Default)]
pub struct SampleFifo {
    storage: Vec<f32>,
    channels: usize,
    /// Read cursor, in frames.
    position: usize,
    /// Valid frames after the cursor.
    frames: usize,
}

impl SampleFifo {
    /// Create an empty FIFO. A channel count of zero is treated as mono.
    pub fn new(channels: usize) -> Self {
        debug_assert!(channels > 0, "SampleFifo needs at least one channel");
        Self {
            storage: Vec::new(),
            channels: channels.max(1),
            position: 0,
            frames: 0,
        }
    }

    /// Create an empty FIFO with storage pre-sized for `frames` frames.
    pub fn with_capacity(channels: usize, frames: usize) -> Self {
        let mut fifo = Self::new(channels);
        fifo.storage.resize(frames * fifo.channels, 0.0);
        fifo
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of valid frames waiting to be consumed.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Read cursor, in frames from the start of the backing storage.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Size of the backing storage, in frames.
    #[inline]
    pub fn capacity_frames(&self) -> usize {
        self.storage.len() / self.channels
    }

    #[inline]
    fn start(&self) -> usize {
        self.position * self.channels
    }

    #[inline]
    fn end(&self) -> usize {
        (self.position + self.frames) * self.channels
    }

    /// All valid frames, interleaved.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.storage[self.start()..self.end()]
    }

    /// Up to `count` valid frames starting `offset` frames after the read cursor.
    ///
    /// The window is clipped to the logical end; it never reaches past valid data.
    #[inline]
    pub fn frame_slice(&self, offset: usize, count: usize) -> &[f32] {
        let offset = offset.min(self.frames);
        let count = count.min(self.frames - offset);
        let start = self.start() + offset * self.channels;
        &self.storage[start..start + count * self.channels]
    }

    /// Drop every frame. Storage is kept.
    pub fn clear(&mut self) {
        self.position = 0;
        self.frames = 0;
    }

    /// Append `count` frames read from `source`, starting at frame `offset` of `source`.
    ///
    /// `count` is clipped to what `source` actually holds.
    pub fn put_samples(&mut self, source: &[f32], offset: usize, count: usize) {
        let ch = self.channels;
        let src_start = (offset * ch).min(source.len());
        let count = count.min((source.len() - src_start) / ch);
        if count == 0 {
            return;
        }

        self.ensure_additional_capacity(count);
        let end = self.end();
        self.storage[end..end + count * ch]
            .copy_from_slice(&source[src_start..src_start + count * ch]);
        self.frames += count;
        self.check_invariant();
    }

    /// Append `count` frames copied from another FIFO, starting `offset` frames after its
    /// read cursor. The source FIFO is not consumed.
    pub fn put_from(&mut self, other: &SampleFifo, offset: usize, count: usize) {
        debug_assert_eq!(self.channels, other.channels, "channel layout mismatch");
        let window = other.frame_slice(offset, count);
        self.put_samples(window, 0, window.len() / self.channels);
    }

    /// Reserve `count` frames past the logical end and return them for writing.
    ///
    /// The frames become visible only after [`commit`](Self::commit).
    pub fn tail_mut(&mut self, count: usize) -> &mut [f32] {
        self.ensure_additional_capacity(count);
        let end = self.end();
        &mut self.storage[end..end + count * self.channels]
    }

    /// Publish `count` frames previously written through [`tail_mut`](Self::tail_mut).
    pub fn commit(&mut self, count: usize) {
        self.frames += count;
        self.check_invariant();
    }

    /// Consume up to `count` frames from the front. Returns the number consumed.
    pub fn receive(&mut self, count: usize) -> usize {
        let count = count.min(self.frames);
        self.frames -= count;
        self.position += count;
        if self.frames == 0 {
            self.position = 0;
        }
        count
    }

    /// Copy up to `count` frames into `output`, then consume them.
    ///
    /// Returns the number of frames copied. On shortfall the rest of `output` is left as
    /// it was, so callers wanting silence must zero it first.
    pub fn receive_samples(&mut self, output: &mut [f32], count: usize) -> usize {
        let count = self.extract(output, 0, count);
        self.receive(count)
    }

    /// Copy up to `count` frames starting `offset` frames after the cursor into `output`
    /// without consuming anything. Returns the number of frames copied.
    pub fn extract(&self, output: &mut [f32], offset: usize, count: usize) -> usize {
        let count = count.min(output.len() / self.channels);
        let window = self.frame_slice(offset, count);
        output[..window.len()].copy_from_slice(window);
        window.len() / self.channels
    }

    /// Make room for `frames` valid frames measured from the read cursor.
    ///
    /// Compacts the valid window to index 0 when the tail is short, and grows the storage
    /// (at least doubling) only when compaction is not enough.
    pub fn ensure_capacity(&mut self, frames: usize) {
        let required = frames * self.channels;
        if self.start() + required <= self.storage.len() {
            return;
        }

        self.rewind();
        if required > self.storage.len() {
            let grown = required.max(self.storage.len() * 2);
            self.storage.resize(grown, 0.0);
        }
    }

    /// Make room for `frames` more frames past the logical end.
    #[inline]
    pub fn ensure_additional_capacity(&mut self, frames: usize) {
        self.ensure_capacity(self.frames + frames);
    }

    /// Drop frames from the logical end so at most `frames` remain.
    pub fn truncate(&mut self, frames: usize) {
        self.frames = self.frames.min(frames);
        if self.frames == 0 {
            self.position = 0;
        }
    }

    /// Shift the valid window to index 0.
    fn rewind(&mut self) {
        if self.position > 0 {
            let (start, end) = (self.start(), self.end());
            self.storage.copy_within(start..end, 0);
            self.position = 0;
        }
    }

    #[inline]
    fn check_invariant(&self) {
        debug_assert!(
            self.end() <= self.storage.len(),
            "SampleFifo overran its storage: end {} > len {}",
            self.end(),
            self.storage.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn staircase(frames: usize, channels: usize, start: usize) -> Vec<f32> {
        (0..frames * channels).map(|i| (start * channels + i) as f32).collect()
    }

    #[test]
    fn test_new_is_empty() {
        let fifo = SampleFifo::new(2);
        assert_eq!(fifo.frames(), 0);
        assert!(fifo.is_empty());
        assert_eq!(fifo.channels(), 2);
        assert!(fifo.as_slice().is_empty());
    }

    #[test]
    fn test_put_and_receive_samples() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&staircase(4, 2, 0), 0, 4);
        assert_eq!(fifo.frames(), 4);

        let mut out = [0.0f32; 4];
        assert_eq!(fifo.receive_samples(&mut out, 2), 2);
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(fifo.frames(), 2);
        assert_eq!(fifo.as_slice(), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_put_with_offset() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&staircase(4, 2, 0), 1, 2);
        assert_eq!(fifo.as_slice(), &[2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_put_clips_to_source() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&staircase(3, 2, 0), 2, 10);
        assert_eq!(fifo.frames(), 1);
        fifo.put_samples(&staircase(3, 2, 0), 7, 10);
        assert_eq!(fifo.frames(), 1);
    }

    #[test]
    fn test_receive_clamps() {
        let mut fifo = SampleFifo::new(1);
        fifo.put_samples(&[1.0, 2.0, 3.0], 0, 3);
        assert_eq!(fifo.receive(10), 3);
        assert_eq!(fifo.frames(), 0);
        assert_eq!(fifo.receive(1), 0);
    }

    #[test]
    fn test_receive_samples_shortfall_leaves_output() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&[0.5, 0.5], 0, 1);

        let mut out = [9.0f32; 6];
        assert_eq!(fifo.receive_samples(&mut out, 3), 1);
        assert_eq!(out, [0.5, 0.5, 9.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_extract_is_non_consuming() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&staircase(5, 2, 0), 0, 5);

        let mut out = [0.0f32; 4];
        assert_eq!(fifo.extract(&mut out, 3, 2), 2);
        assert_eq!(out, [6.0, 7.0, 8.0, 9.0]);
        assert_eq!(fifo.frames(), 5);

        // Window past the logical end is clipped
        assert_eq!(fifo.extract(&mut out, 4, 2), 1);
    }

    #[test]
    fn test_tail_commit() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&[1.0, 1.0], 0, 1);
        {
            let tail = fifo.tail_mut(2);
            assert_eq!(tail.len(), 4);
            tail.copy_from_slice(&[2.0, 2.0, 3.0, 3.0]);
        }
        assert_eq!(fifo.frames(), 1);
        fifo.commit(2);
        assert_eq!(fifo.as_slice(), &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_put_from_other_fifo() {
        let mut src = SampleFifo::new(2);
        src.put_samples(&staircase(6, 2, 0), 0, 6);
        src.receive(1);

        let mut dst = SampleFifo::new(2);
        dst.put_from(&src, 2, 2);
        assert_eq!(dst.as_slice(), &[6.0, 7.0, 8.0, 9.0]);
        assert_eq!(src.frames(), 5);
    }

    #[test]
    fn test_truncate() {
        let mut fifo = SampleFifo::new(1);
        fifo.put_samples(&[1.0, 2.0, 3.0, 4.0], 0, 4);
        fifo.receive(1);
        fifo.truncate(2);
        assert_eq!(fifo.as_slice(), &[2.0, 3.0]);
        fifo.truncate(5);
        assert_eq!(fifo.frames(), 2);
    }

    #[test]
    fn test_clear_keeps_storage() {
        let mut fifo = SampleFifo::new(2);
        fifo.put_samples(&staircase(64, 2, 0), 0, 64);
        let capacity = fifo.capacity_frames();
        fifo.clear();
        assert_eq!(fifo.frames(), 0);
        assert_eq!(fifo.capacity_frames(), capacity);
    }

    #[test]
    fn test_compaction_bounds_storage() {
        let mut fifo = SampleFifo::new(2);
        let block = staircase(128, 2, 0);
        fifo.put_samples(&staircase(200, 2, 0), 0, 200);

        // Steady state with a standing backlog: 3 blocks in, 3 blocks out, forever
        for _ in 0..10_000 {
            for _ in 0..3 {
                fifo.put_samples(&block, 0, 128);
            }
            fifo.receive(384);
        }
        assert!(
            fifo.capacity_frames() <= 1024,
            "storage grew to {} frames",
            fifo.capacity_frames()
        );
    }

    #[test]
    fn test_compaction_preserves_order() {
        let mut fifo = SampleFifo::with_capacity(1, 8);
        fifo.put_samples(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 0, 6);
        fifo.receive(4);
        assert_eq!(fifo.position(), 4);

        // Tail has room for 2, needs 4: compaction instead of growth
        fifo.put_samples(&[6.0, 7.0, 8.0, 9.0], 0, 4);
        assert_eq!(fifo.capacity_frames(), 8);
        assert_eq!(fifo.position(), 0);
        assert_eq!(fifo.as_slice(), &[4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put(usize),
        Receive(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..300).prop_map(Op::Put),
            (0usize..400).prop_map(Op::Receive),
        ]
    }

    proptest! {
        #[test]
        fn prop_fifo_algebra(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let channels = 2;
            let mut fifo = SampleFifo::new(channels);
            let mut total_put = 0usize;
            let mut total_received = 0usize;

            for op in ops {
                match op {
                    Op::Put(n) => {
                        fifo.put_samples(&staircase(n, channels, total_put), 0, n);
                        total_put += n;
                    }
                    Op::Receive(n) => {
                        total_received += fifo.receive(n);
                    }
                }
                prop_assert_eq!(fifo.frames(), total_put - total_received);

                // Every valid frame still holds what was written for it
                let mut out = vec![0.0f32; fifo.frames() * channels];
                let copied = fifo.extract(&mut out, 0, fifo.frames());
                prop_assert_eq!(copied, fifo.frames());
                let expected = staircase(fifo.frames(), channels, total_received);
                prop_assert_eq!(out, expected);
            }
        }
    }
}
