//! Pipeline stages and their ordering.

/// One of the two processing stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeKind {
    Transposer,
    Stretcher,
}

/// Order in which the two stages run.
///
/// FIFOs are addressed by slot: stage `i` reads slot `i` and writes slot `i + 1`. On a
/// switch the input and intermediate slots trade places, so each stage keeps its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Stretch first, then resample. Used when the effective rate is above 1, so the
    /// stretcher works on the longer, not yet shortened, signal.
    StretchThenTranspose,
    /// Resample first, then stretch.
    #[default]
    TransposeThenStretch,
}

impl Topology {
    /// Input FIFO slot.
    pub const INPUT: usize = 0;
    /// FIFO between the two stages.
    pub const INTERMEDIATE: usize = 1;
    /// Output FIFO slot.
    pub const OUTPUT: usize = 2;

    /// Topology for an effective resample factor.
    #[inline]
    pub fn for_rate(rate: f64) -> Self {
        if rate > 1.0 {
            Self::StretchThenTranspose
        } else {
            Self::TransposeThenStretch
        }
    }

    /// Stages in processing order.
    #[inline]
    pub fn order(self) -> [PipeKind; 2] {
        match self {
            Self::StretchThenTranspose => [PipeKind::Stretcher, PipeKind::Transposer],
            Self::TransposeThenStretch => [PipeKind::Transposer, PipeKind::Stretcher],
        }
    }

    /// Slot read by the stage.
    #[inline]
    pub fn input_slot(self, kind: PipeKind) -> usize {
        if self.order()[0] == kind {
            Self::INPUT
        } else {
            Self::INTERMEDIATE
        }
    }
}
