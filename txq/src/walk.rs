//! Transform-block walkers. The recursive walker decomposes a coding
//! block into transform leaves following the per-block partition policy;
//! the full-plane walker visits a fixed transform size across successive
//! 64x64 analysis granules. Both visit leaves in raster order and never
//! reorder them: each leaf's entropy context depends on the finalized
//! state of its above/left neighbors.

use crate::block::BlockContext;
use crate::geom::{
    max_uv_tx_size, plane_block_size, sub_tx_size, tx_partition_sizes, BlockSize, TxPartition,
    TxSize, ANALYSIS_UNIT, MI_SIZE_LOG2,
};
use crate::mode::ModeInfo;

/// One transform-block leaf: coefficient-buffer block index, position in
/// 4-sample units, and effective transform size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLeaf {
    pub block: usize,
    pub blk_row: usize,
    pub blk_col: usize,
    pub tx_size: TxSize,
}

/// Transform size used by the fixed walker for a plane: luma takes the
/// block's selected size, chroma the largest transform covering its
/// reference area.
pub fn plane_tx_size(ctx: &BlockContext, plane: usize) -> TxSize {
    if plane == 0 {
        ctx.mode.tx_size
    } else {
        let base = ctx.mode.chroma_base.unwrap_or(ctx.bsize);
        let p = &ctx.planes[plane];
        max_uv_tx_size(base, p.subsampling_x, p.subsampling_y)
    }
}

/// Analysis-granule extent for a plane, in transform units, clipped to
/// the plane's valid extent.
fn granule_units(
    subsampling: usize,
    max_blocks: usize,
) -> usize {
    ((ANALYSIS_UNIT >> subsampling) >> MI_SIZE_LOG2).min(max_blocks)
}

/// Walks every transform unit of a fixed size across the plane in raster
/// order within successive analysis granules, clipping the last partial
/// granule in each dimension. Sub-blocks wholly past the valid extent
/// are not visited.
pub fn walk_plane_fixed(
    tx_size: TxSize,
    max_blocks_wide: usize,
    max_blocks_high: usize,
    mu_blocks_wide: usize,
    mu_blocks_high: usize,
    visit: &mut impl FnMut(TxLeaf),
) {
    let txw_unit = tx_size.width_units();
    let txh_unit = tx_size.height_units();
    let step = txw_unit * txh_unit;
    let mut block = 0;

    let mut r = 0;
    while r < max_blocks_high {
        let unit_height = (mu_blocks_high + r).min(max_blocks_high);
        let mut c = 0;
        while c < max_blocks_wide {
            let unit_width = (mu_blocks_wide + c).min(max_blocks_wide);
            let mut blk_row = r;
            while blk_row < unit_height {
                let mut blk_col = c;
                while blk_col < unit_width {
                    visit(TxLeaf {
                        block,
                        blk_row,
                        blk_col,
                        tx_size,
                    });
                    block += step;
                    blk_col += txw_unit;
                }
                blk_row += txh_unit;
            }
            c += mu_blocks_wide;
        }
        r += mu_blocks_high;
    }
}

/// Recursive partition walk. Chroma planes and areas whose proposed size
/// already matches the stored target are leaves; everything else splits
/// per the partition policy (explicit variable shape, or the fixed
/// quad-split table when none was chosen) and recurses in raster order,
/// skipping sub-rectangles wholly outside the valid extent.
#[allow(clippy::too_many_arguments)]
pub fn walk_tx_partition(
    mode: &ModeInfo,
    plane: usize,
    plane_bsize: BlockSize,
    max_blocks_wide: usize,
    max_blocks_high: usize,
    blk_row: usize,
    blk_col: usize,
    block: usize,
    tx_size: TxSize,
    visit: &mut impl FnMut(TxLeaf),
) {
    if blk_row >= max_blocks_high || blk_col >= max_blocks_wide {
        return;
    }

    let is_leaf =
        plane != 0 || mode.inter_tx_size(plane_bsize, blk_row, blk_col) == tx_size;
    if is_leaf {
        visit(TxLeaf {
            block,
            blk_row,
            blk_col,
            tx_size,
        });
        return;
    }

    let partition = mode.tx_partition(plane_bsize, blk_row, blk_col);
    let (subs, n) = match partition {
        TxPartition::None => ([sub_tx_size(tx_size); 4], 4),
        p => tx_partition_sizes(p, tx_size),
    };
    // Every partition in the policy set yields equal-size children, so
    // the grid steps uniformly; the list length bounds the child count
    // before edge clipping.
    let sub = subs[0];
    debug_assert!(subs[..n].iter().all(|&s| s == sub));
    debug_assert!(sub.area() < tx_size.area(), "partition must shrink");
    let bsw = sub.width_units();
    let bsh = sub.height_units();

    let mut sub_block = block;
    for r in (0..tx_size.height_units()).step_by(bsh) {
        for c in (0..tx_size.width_units()).step_by(bsw) {
            let offsetr = blk_row + r;
            let offsetc = blk_col + c;
            if offsetr >= max_blocks_high || offsetc >= max_blocks_wide {
                continue;
            }
            walk_tx_partition(
                mode,
                plane,
                plane_bsize,
                max_blocks_wide,
                max_blocks_high,
                offsetr,
                offsetc,
                sub_block,
                sub,
                visit,
            );
            sub_block += bsw * bsh;
        }
    }
}

/// Drives the recursive walker over a whole plane, one maximum-size
/// transform cell at a time within analysis granules.
#[allow(clippy::too_many_arguments)]
pub fn walk_vartx_plane(
    mode: &ModeInfo,
    plane: usize,
    plane_bsize: BlockSize,
    max_tx: TxSize,
    max_blocks_wide: usize,
    max_blocks_high: usize,
    mu_blocks_wide: usize,
    mu_blocks_high: usize,
    visit: &mut impl FnMut(TxLeaf),
) {
    let mi_width = plane_bsize.width_units();
    let mi_height = plane_bsize.height_units();
    let bw = max_tx.width_units();
    let bh = max_tx.height_units();
    let step = bw * bh;
    let mut block = 0;

    let mut idy = 0;
    while idy < mi_height {
        let unit_height = (mu_blocks_high + idy).min(mi_height);
        let mut idx = 0;
        while idx < mi_width {
            let unit_width = (mu_blocks_wide + idx).min(mi_width);
            let mut blk_row = idy;
            while blk_row < unit_height {
                let mut blk_col = idx;
                while blk_col < unit_width {
                    walk_tx_partition(
                        mode,
                        plane,
                        plane_bsize,
                        max_blocks_wide,
                        max_blocks_high,
                        blk_row,
                        blk_col,
                        block,
                        max_tx,
                        visit,
                    );
                    block += step;
                    blk_col += bw;
                }
                blk_row += bh;
            }
            idx += mu_blocks_wide;
        }
        idy += mu_blocks_high;
    }
}

/// Visits every transform block of one plane the way the fixed-size
/// encoder walk does. Exposed so instrumentation and mismatch checking
/// can retrace the encoder's partition.
pub fn foreach_txb_in_plane(
    ctx: &BlockContext,
    bsize: BlockSize,
    plane: usize,
    visit: &mut impl FnMut(usize, TxLeaf),
) {
    let p = &ctx.planes[plane];
    let base = if plane == 0 {
        bsize
    } else {
        ctx.mode.chroma_base.unwrap_or(bsize)
    };
    let plane_bsize = plane_block_size(base, p.subsampling_x, p.subsampling_y);
    let tx_size = plane_tx_size(ctx, plane);
    let max_w = ctx.max_blocks_wide(plane_bsize, plane);
    let max_h = ctx.max_blocks_high(plane_bsize, plane);
    let mu_w = granule_units(p.subsampling_x, max_w);
    let mu_h = granule_units(p.subsampling_y, max_h);
    walk_plane_fixed(tx_size, max_w, max_h, mu_w, mu_h, &mut |leaf| {
        visit(plane, leaf)
    });
}

/// Per-plane variant over every plane, skipping chroma when the block is
/// not a chroma reference.
pub fn foreach_txb(
    ctx: &BlockContext,
    bsize: BlockSize,
    visit: &mut impl FnMut(usize, TxLeaf),
) {
    for plane in 0..ctx.num_planes() {
        if plane != 0 && !ctx.mode.is_chroma_ref() {
            continue;
        }
        foreach_txb_in_plane(ctx, bsize, plane, visit);
    }
}

/// Collects the fixed walk's leaves for one plane.
pub fn plane_tx_leaves(ctx: &BlockContext, bsize: BlockSize, plane: usize) -> Vec<TxLeaf> {
    let mut leaves = Vec::new();
    foreach_txb_in_plane(ctx, bsize, plane, &mut |_, leaf| leaves.push(leaf));
    leaves
}

/// Collects the variable-partition walk's leaves for one plane.
pub fn vartx_leaves(ctx: &BlockContext, plane: usize) -> Vec<TxLeaf> {
    let p = &ctx.planes[plane];
    let base = if plane == 0 {
        ctx.bsize
    } else {
        ctx.mode.chroma_base.unwrap_or(ctx.bsize)
    };
    let plane_bsize = plane_block_size(base, p.subsampling_x, p.subsampling_y);
    let max_tx = if plane == 0 {
        crate::geom::max_tx_size(plane_bsize)
    } else {
        max_uv_tx_size(base, p.subsampling_x, p.subsampling_y)
    };
    let max_w = ctx.max_blocks_wide(plane_bsize, plane);
    let max_h = ctx.max_blocks_high(plane_bsize, plane);
    let mu_w = granule_units(p.subsampling_x, max_w);
    let mu_h = granule_units(p.subsampling_y, max_h);
    let mut leaves = Vec::new();
    walk_vartx_plane(
        &ctx.mode,
        plane,
        plane_bsize,
        max_tx,
        max_w,
        max_h,
        mu_w,
        mu_h,
        &mut |leaf| leaves.push(leaf),
    );
    leaves
}
