//! Linear-interpolation rate transposer.
//!
//! Resamples a stream by a floating-point factor. The interpolation phase and the last
//! frame of the previous call are carried over, so splitting the input into blocks of any
//! size produces the same output as processing it in one piece.
//!
//! ## RT-Safety
//!
//! `process()` writes straight into the output FIFO's reserved tail; it allocates only when
//! that FIFO has to grow.

use tessitura_core::SampleFifo;

/// Stateful resampler between two FIFOs.
#[derive(Debug, Clone)]
pub struct RateTransposer {
    channels: usize,
    /// Output frames advance the source position by `rate` frames.
    rate: f64,
    /// Fractional position between the previous and the next source frame.
    slope_count: f64,
    /// Last frame of the previous call; silence before any input.
    prev: Vec<f32>,
}

impl RateTransposer {
    pub fn new(channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            rate: 1.0,
            slope_count: 0.0,
            prev: vec![0.0; channels],
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set the resample factor (> 1.0 shortens and raises, < 1.0 lengthens and lowers).
    ///
    /// Returns the rate now in effect. The phase is kept, so the change is seamless.
    pub fn set_rate(&mut self, rate: f64) -> f64 {
        debug_assert!(rate.is_finite() && rate > 0.0, "rate must be positive");
        self.rate = rate;
        self.rate
    }

    /// Forget the interpolation phase and the carried frame.
    pub fn clear(&mut self) {
        self.slope_count = 0.0;
        self.prev.fill(0.0);
    }

    /// Resample everything buffered in `input` into `output`.
    ///
    /// Returns the number of frames produced, about `input.frames() / rate`.
    pub fn process(&mut self, input: &mut SampleFifo, output: &mut SampleFifo) -> usize {
        debug_assert_eq!(input.channels(), self.channels);
        debug_assert_eq!(output.channels(), self.channels);

        let frames = input.frames();
        if frames == 0 {
            return 0;
        }

        // Output positions are spaced `rate` apart over at most `frames` source frames
        let bound = (frames as f64 / self.rate) as usize + 3;
        let produced = self.transpose(input.as_slice(), output.tail_mut(bound), frames);
        output.commit(produced);
        input.receive(frames);
        produced
    }

    fn transpose(&mut self, src: &[f32], dest: &mut [f32], frames: usize) -> usize {
        let ch = self.channels;
        let mut out = 0;

        // Between the carried frame and the first new one
        while self.slope_count < 1.0 {
            let t = self.slope_count as f32;
            for c in 0..ch {
                dest[out * ch + c] = (1.0 - t) * self.prev[c] + t * src[c];
            }
            out += 1;
            self.slope_count += self.rate;
        }
        self.slope_count -= 1.0;

        if frames > 1 {
            let mut used = 0;
            'interpolate: loop {
                while self.slope_count > 1.0 {
                    self.slope_count -= 1.0;
                    used += 1;
                    if used >= frames - 1 {
                        break 'interpolate;
                    }
                }

                let t = self.slope_count as f32;
                let base = used * ch;
                for c in 0..ch {
                    dest[out * ch + c] = (1.0 - t) * src[base + c] + t * src[base + ch + c];
                }
                out += 1;
                self.slope_count += self.rate;
            }
        }

        self.prev.copy_from_slice(&src[(frames - 1) * ch..frames * ch]);
        out
    }
}
