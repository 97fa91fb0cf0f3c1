//! Block and transform geometry: pure mappings from block sizes and
//! subsampling factors to pixel dimensions, 4-sample unit counts, and
//! sub-partition shapes. All inputs are assumed pre-validated upstream;
//! violations panic.

pub const MI_SIZE_LOG2: usize = 2;
pub const MI_SIZE: usize = 1 << MI_SIZE_LOG2;

/// Analysis granule edge in samples. Transform blocks never straddle a
/// granule boundary, and plane walks clip the last partial granule.
pub const ANALYSIS_UNIT: usize = 64;

pub const MAX_TX_DIM: usize = 64;
pub const MAX_TX_SQUARE: usize = MAX_TX_DIM * MAX_TX_DIM;

/// Longest coding-block edge, in 4-sample units.
pub const MAX_MIB_SIZE: usize = ANALYSIS_UNIT / MI_SIZE;

pub const MAX_TX_PARTITIONS: usize = 4;

pub const MAX_SEGMENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Ten,
    Twelve,
}

impl BitDepth {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            8 => Some(BitDepth::Eight),
            10 => Some(BitDepth::Ten),
            12 => Some(BitDepth::Twelve),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Ten => 10,
            BitDepth::Twelve => 12,
        }
    }

    pub fn is_high(self) -> bool {
        !matches!(self, BitDepth::Eight)
    }

    pub fn max_value(self) -> i32 {
        (1 << self.bits()) - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
    B4x4,
    B4x8,
    B8x4,
    B8x8,
    B8x16,
    B16x8,
    B16x16,
    B16x32,
    B32x16,
    B32x32,
    B32x64,
    B64x32,
    B64x64,
}

impl BlockSize {
    pub fn width(self) -> usize {
        match self {
            BlockSize::B4x4 | BlockSize::B4x8 => 4,
            BlockSize::B8x4 | BlockSize::B8x8 | BlockSize::B8x16 => 8,
            BlockSize::B16x8 | BlockSize::B16x16 | BlockSize::B16x32 => 16,
            BlockSize::B32x16 | BlockSize::B32x32 | BlockSize::B32x64 => 32,
            BlockSize::B64x32 | BlockSize::B64x64 => 64,
        }
    }

    pub fn height(self) -> usize {
        match self {
            BlockSize::B4x4 | BlockSize::B8x4 => 4,
            BlockSize::B4x8 | BlockSize::B8x8 | BlockSize::B16x8 => 8,
            BlockSize::B8x16 | BlockSize::B16x16 | BlockSize::B32x16 => 16,
            BlockSize::B16x32 | BlockSize::B32x32 | BlockSize::B64x32 => 32,
            BlockSize::B32x64 | BlockSize::B64x64 => 64,
        }
    }

    pub fn width_units(self) -> usize {
        self.width() >> MI_SIZE_LOG2
    }

    pub fn height_units(self) -> usize {
        self.height() >> MI_SIZE_LOG2
    }

    pub fn area(self) -> usize {
        self.width() * self.height()
    }

    pub fn from_dims(width: usize, height: usize) -> Option<Self> {
        match (width, height) {
            (4, 4) => Some(BlockSize::B4x4),
            (4, 8) => Some(BlockSize::B4x8),
            (8, 4) => Some(BlockSize::B8x4),
            (8, 8) => Some(BlockSize::B8x8),
            (8, 16) => Some(BlockSize::B8x16),
            (16, 8) => Some(BlockSize::B16x8),
            (16, 16) => Some(BlockSize::B16x16),
            (16, 32) => Some(BlockSize::B16x32),
            (32, 16) => Some(BlockSize::B32x16),
            (32, 32) => Some(BlockSize::B32x32),
            (32, 64) => Some(BlockSize::B32x64),
            (64, 32) => Some(BlockSize::B64x32),
            (64, 64) => Some(BlockSize::B64x64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSize {
    Tx4x4,
    Tx4x8,
    Tx8x4,
    Tx8x8,
    Tx8x16,
    Tx16x8,
    Tx16x16,
    Tx16x32,
    Tx32x16,
    Tx32x32,
    Tx32x64,
    Tx64x32,
    Tx64x64,
}

impl TxSize {
    pub fn width(self) -> usize {
        match self {
            TxSize::Tx4x4 | TxSize::Tx4x8 => 4,
            TxSize::Tx8x4 | TxSize::Tx8x8 | TxSize::Tx8x16 => 8,
            TxSize::Tx16x8 | TxSize::Tx16x16 | TxSize::Tx16x32 => 16,
            TxSize::Tx32x16 | TxSize::Tx32x32 | TxSize::Tx32x64 => 32,
            TxSize::Tx64x32 | TxSize::Tx64x64 => 64,
        }
    }

    pub fn height(self) -> usize {
        match self {
            TxSize::Tx4x4 | TxSize::Tx8x4 => 4,
            TxSize::Tx4x8 | TxSize::Tx8x8 | TxSize::Tx16x8 => 8,
            TxSize::Tx8x16 | TxSize::Tx16x16 | TxSize::Tx32x16 => 16,
            TxSize::Tx16x32 | TxSize::Tx32x32 | TxSize::Tx64x32 => 32,
            TxSize::Tx32x64 | TxSize::Tx64x64 => 64,
        }
    }

    pub fn width_units(self) -> usize {
        self.width() >> MI_SIZE_LOG2
    }

    pub fn height_units(self) -> usize {
        self.height() >> MI_SIZE_LOG2
    }

    pub fn area(self) -> usize {
        self.width() * self.height()
    }

    pub fn from_dims(width: usize, height: usize) -> Option<Self> {
        match (width, height) {
            (4, 4) => Some(TxSize::Tx4x4),
            (4, 8) => Some(TxSize::Tx4x8),
            (8, 4) => Some(TxSize::Tx8x4),
            (8, 8) => Some(TxSize::Tx8x8),
            (8, 16) => Some(TxSize::Tx8x16),
            (16, 8) => Some(TxSize::Tx16x8),
            (16, 16) => Some(TxSize::Tx16x16),
            (16, 32) => Some(TxSize::Tx16x32),
            (32, 16) => Some(TxSize::Tx32x16),
            (32, 32) => Some(TxSize::Tx32x32),
            (32, 64) => Some(TxSize::Tx32x64),
            (64, 32) => Some(TxSize::Tx64x32),
            (64, 64) => Some(TxSize::Tx64x64),
            _ => None,
        }
    }

    pub fn block_size(self) -> BlockSize {
        BlockSize::from_dims(self.width(), self.height()).expect("transform block size")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    DctDct,
    AdstDct,
    DctAdst,
    AdstAdst,
    FlipadstDct,
    DctFlipadst,
    FlipadstFlipadst,
    Idtx,
}

impl TxType {
    /// 1D and identity transforms take a flat (unweighted) quantization
    /// matrix; only full 2D transforms are weighted.
    pub fn is_2d(self) -> bool {
        !matches!(self, TxType::Idtx)
    }
}

/// Plane block size under chroma subsampling. Dimensions never shrink
/// below 4 samples.
pub fn plane_block_size(bsize: BlockSize, subsampling_x: usize, subsampling_y: usize) -> BlockSize {
    let w = (bsize.width() >> subsampling_x).max(MI_SIZE);
    let h = (bsize.height() >> subsampling_y).max(MI_SIZE);
    BlockSize::from_dims(w, h).expect("subsampled block size")
}

/// Quad-split map: each split halves both dimensions, saturating at 4.
pub fn sub_tx_size(tx: TxSize) -> TxSize {
    let w = (tx.width() / 2).max(MI_SIZE);
    let h = (tx.height() / 2).max(MI_SIZE);
    TxSize::from_dims(w, h).expect("sub transform size")
}

/// Transform size used to index quantization-matrix tables: 64-sample
/// dimensions are folded down to 32.
pub fn adjusted_tx_size(tx: TxSize) -> TxSize {
    match tx {
        TxSize::Tx64x64 | TxSize::Tx64x32 | TxSize::Tx32x64 => TxSize::Tx32x32,
        other => other,
    }
}

/// Transform size used by the downsampled-residual path: half of the
/// nominal size in each dimension.
pub fn dspl_tx_size(tx: TxSize) -> TxSize {
    sub_tx_size(tx)
}

/// Coefficient shrink applied during quantization for the larger
/// transforms.
pub fn tx_log_scale(tx: TxSize) -> i32 {
    match tx {
        TxSize::Tx64x64 => 2,
        TxSize::Tx32x64 | TxSize::Tx64x32 | TxSize::Tx32x32 => 1,
        _ => 0,
    }
}

/// Largest transform covering a plane block, capped at 64 samples per
/// dimension.
pub fn max_tx_size(plane_bsize: BlockSize) -> TxSize {
    let w = plane_bsize.width().min(MAX_TX_DIM);
    let h = plane_bsize.height().min(MAX_TX_DIM);
    TxSize::from_dims(w, h).expect("max transform size")
}

/// Largest chroma transform for a coding block: the subsampled block
/// size capped at 32 samples per dimension.
pub fn max_uv_tx_size(
    bsize_base: BlockSize,
    subsampling_x: usize,
    subsampling_y: usize,
) -> TxSize {
    let pb = plane_block_size(bsize_base, subsampling_x, subsampling_y);
    let w = pb.width().min(32);
    let h = pb.height().min(32);
    TxSize::from_dims(w, h).expect("uv transform size")
}

/// Variable transform partition shapes. `Split` is the four-way
/// quad-split; `Horz`/`Vert` halve one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPartition {
    None,
    Split,
    Horz,
    Vert,
}

/// Ordered sub-transform sizes for a partition of `tx`, raster order.
/// Returns the fixed-capacity list and its length.
pub fn tx_partition_sizes(partition: TxPartition, tx: TxSize) -> ([TxSize; MAX_TX_PARTITIONS], usize) {
    let w = tx.width();
    let h = tx.height();
    match partition {
        TxPartition::None => ([tx; MAX_TX_PARTITIONS], 1),
        TxPartition::Split => {
            let sub = sub_tx_size(tx);
            assert!(sub != tx, "split of a minimum-size transform");
            ([sub; MAX_TX_PARTITIONS], 4)
        }
        TxPartition::Horz => {
            let sub = TxSize::from_dims(w, h / 2).expect("horz partition size");
            ([sub; MAX_TX_PARTITIONS], 2)
        }
        TxPartition::Vert => {
            let sub = TxSize::from_dims(w / 2, h).expect("vert partition size");
            ([sub; MAX_TX_PARTITIONS], 2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_block_size_420() {
        assert_eq!(plane_block_size(BlockSize::B64x64, 1, 1), BlockSize::B32x32);
        assert_eq!(plane_block_size(BlockSize::B16x8, 1, 1), BlockSize::B8x4);
        assert_eq!(plane_block_size(BlockSize::B4x4, 1, 1), BlockSize::B4x4);
    }

    #[test]
    fn plane_block_size_444() {
        assert_eq!(plane_block_size(BlockSize::B32x16, 0, 0), BlockSize::B32x16);
    }

    #[test]
    fn sub_tx_size_halves_both_dims() {
        assert_eq!(sub_tx_size(TxSize::Tx64x64), TxSize::Tx32x32);
        assert_eq!(sub_tx_size(TxSize::Tx16x16), TxSize::Tx8x8);
        assert_eq!(sub_tx_size(TxSize::Tx8x16), TxSize::Tx4x8);
        assert_eq!(sub_tx_size(TxSize::Tx4x4), TxSize::Tx4x4);
    }

    #[test]
    fn sub_tx_size_strictly_shrinks_above_minimum() {
        for tx in [
            TxSize::Tx8x8,
            TxSize::Tx8x16,
            TxSize::Tx16x16,
            TxSize::Tx32x32,
            TxSize::Tx64x64,
        ] {
            assert!(sub_tx_size(tx).area() < tx.area());
        }
    }

    #[test]
    fn adjusted_tx_size_folds_64() {
        assert_eq!(adjusted_tx_size(TxSize::Tx64x64), TxSize::Tx32x32);
        assert_eq!(adjusted_tx_size(TxSize::Tx64x32), TxSize::Tx32x32);
        assert_eq!(adjusted_tx_size(TxSize::Tx16x16), TxSize::Tx16x16);
    }

    #[test]
    fn max_uv_tx_size_caps_at_32() {
        assert_eq!(max_uv_tx_size(BlockSize::B64x64, 0, 0), TxSize::Tx32x32);
        assert_eq!(max_uv_tx_size(BlockSize::B64x64, 1, 1), TxSize::Tx32x32);
        assert_eq!(max_uv_tx_size(BlockSize::B16x16, 1, 1), TxSize::Tx8x8);
    }

    #[test]
    fn partition_sizes_tile_the_parent() {
        for tx in [TxSize::Tx8x8, TxSize::Tx16x16, TxSize::Tx32x32] {
            for part in [
                TxPartition::None,
                TxPartition::Split,
                TxPartition::Horz,
                TxPartition::Vert,
            ] {
                let (subs, n) = tx_partition_sizes(part, tx);
                let covered: usize = subs[..n].iter().map(|s| s.area()).sum();
                assert_eq!(covered, tx.area(), "{part:?} of {tx:?}");
            }
        }
    }

    #[test]
    fn log_scale_matches_transform_area() {
        assert_eq!(tx_log_scale(TxSize::Tx4x4), 0);
        assert_eq!(tx_log_scale(TxSize::Tx32x32), 1);
        assert_eq!(tx_log_scale(TxSize::Tx64x64), 2);
    }
}
