//! Per-coding-block mode state consumed and mutated by the residual
//! pipeline. Mode decisions themselves happen upstream; this core only
//! writes the skip flag and the per-sub-block transform-type entries.

use crate::geom::{BlockSize, TxPartition, TxSize, TxType};

/// Distinguishes a real output pass from a trial run. Trial runs produce
/// identical reconstructions but suppress side-effecting instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    DryRun,
    Output,
}

impl RunType {
    pub fn output_enabled(self) -> bool {
        matches!(self, RunType::Output)
    }
}

#[derive(Debug, Clone)]
pub struct ModeInfo {
    /// Coding-block skip flag. Starts optimistic (true) on the inter path
    /// and is cleared by the first leaf with a nonzero eob.
    pub skip: bool,
    /// Set by an earlier decision stage: the whole block is coded in skip
    /// mode and the residual pipeline is bypassed.
    pub skip_mode: bool,
    pub segment_id: u8,
    /// Whole-block transform size used by the fixed (non-partitioned)
    /// walkers.
    pub tx_size: TxSize,
    /// Per-4x4-unit transform type, luma grid. Write target of this core:
    /// zero-eob luma leaves are forced back to the degenerate type.
    pub txk_types: Vec<TxType>,
    /// Per-4x4-unit target transform size for the variable-partition
    /// (inter) walker.
    pub inter_tx_sizes: Vec<TxSize>,
    /// Per-4x4-unit transform partition selection for the variable
    /// partition policy.
    pub tx_partitions: Vec<TxPartition>,
    /// Base block size chroma derives its geometry from; `None` when this
    /// block is not a chroma reference.
    pub chroma_base: Option<BlockSize>,
    /// Selects the downsampled-residual transform path for luma.
    pub downsample_residual: bool,
}

impl ModeInfo {
    pub fn new(bsize: BlockSize, tx_size: TxSize) -> Self {
        let units = bsize.width_units() * bsize.height_units();
        Self {
            skip: false,
            skip_mode: false,
            segment_id: 0,
            tx_size,
            txk_types: vec![TxType::DctDct; units],
            inter_tx_sizes: vec![tx_size; units],
            tx_partitions: vec![TxPartition::None; units],
            chroma_base: Some(bsize),
            downsample_residual: false,
        }
    }

    pub fn is_chroma_ref(&self) -> bool {
        self.chroma_base.is_some()
    }

    pub fn txk_index(plane_bsize: BlockSize, blk_row: usize, blk_col: usize) -> usize {
        blk_row * plane_bsize.width_units() + blk_col
    }

    pub fn txk_type(&self, plane_bsize: BlockSize, blk_row: usize, blk_col: usize) -> TxType {
        self.txk_types[Self::txk_index(plane_bsize, blk_row, blk_col)]
    }

    /// Spreads `tx_type` over every 4x4 unit covered by the transform
    /// block, so later per-unit lookups are well-defined.
    pub fn set_txk_type(
        &mut self,
        plane_bsize: BlockSize,
        blk_row: usize,
        blk_col: usize,
        tx_size: TxSize,
        tx_type: TxType,
    ) {
        let stride = plane_bsize.width_units();
        for r in 0..tx_size.height_units() {
            for c in 0..tx_size.width_units() {
                let row = blk_row + r;
                let col = blk_col + c;
                let idx = row * stride + col;
                if idx < self.txk_types.len() {
                    self.txk_types[idx] = tx_type;
                }
            }
        }
    }

    pub fn inter_tx_size(&self, plane_bsize: BlockSize, blk_row: usize, blk_col: usize) -> TxSize {
        self.inter_tx_sizes[Self::txk_index(plane_bsize, blk_row, blk_col)]
    }

    pub fn tx_partition(&self, plane_bsize: BlockSize, blk_row: usize, blk_col: usize) -> TxPartition {
        self.tx_partitions[Self::txk_index(plane_bsize, blk_row, blk_col)]
    }
}
