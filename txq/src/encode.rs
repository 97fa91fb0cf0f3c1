//! Per-coding-block orchestration: the full intra and inter plane
//! encoders, the lightweight first-pass encoder, and the shared leaf
//! encode that ties subtraction, transform/quantize, optimization,
//! context updates, and reconstruction together in strict raster order.

use crate::block::{block_offset, BlockContext, PlaneBuf, PlaneState};
use crate::ctx::{get_txb_ctx, init_plane_contexts, set_txb_context};
use crate::geom::{plane_block_size, BlockSize, TxSize, TxType};
use crate::mode::RunType;
use crate::optimize::{optimize_b, CoeffOptimizer};
use crate::quant::{QmProvider, XformQuant};
use crate::recon::reconstruct;
use crate::subtract::{subtract_plane, subtract_txb};
use crate::txfm::{TxfmKernel, TxfmParam};
use crate::walk::{plane_tx_leaves, vartx_leaves, TxLeaf};
use crate::xform::xform_quant;

/// Stores reconstructed luma for a downstream chroma-from-luma
/// predictor.
pub trait CflStore {
    fn store_tx(&mut self, blk_row: usize, blk_col: usize, tx_size: TxSize, luma: &PlaneBuf);
}

/// Per-pixel skip logging consumed by instrumentation outside this core.
/// Only invoked on real output passes.
pub trait SkipLog {
    /// The whole block was bypassed as skip.
    fn init_block(&mut self, bsize: BlockSize, skipped: bool);
    /// One transform block ended with no coded coefficients.
    fn record_txb(&mut self, plane: usize, blk_row: usize, blk_col: usize, tx_size: TxSize);
}

/// Reconstruction recorder for encoder/decoder mismatch debugging. Only
/// invoked on real output passes.
pub trait MismatchRecorder {
    fn record_txb(
        &mut self,
        plane: usize,
        blk_row: usize,
        blk_col: usize,
        tx_size: TxSize,
        dst: &PlaneBuf,
    );
}

/// Prediction sample generation for the intra path (external
/// collaborator). Writes the prediction for one transform block into the
/// destination buffer; may read previously reconstructed samples from
/// it.
pub trait IntraPredictor {
    fn predict(
        &mut self,
        plane: usize,
        blk_row: usize,
        blk_col: usize,
        tx_size: TxSize,
        dst: &mut PlaneBuf,
    );
}

/// Optional side-effecting collaborators, selected at construction time.
/// All absent by default.
#[derive(Default)]
pub struct EncodeHooks<'a> {
    pub cfl: Option<&'a mut dyn CflStore>,
    pub skip_log: Option<&'a mut dyn SkipLog>,
    pub mismatch: Option<&'a mut dyn MismatchRecorder>,
}

/// Frame-level entropy-context summaries along a block's above and left
/// edges, provided by the caller that tracks neighboring blocks.
#[derive(Debug, Clone, Copy)]
pub struct NeighborSeed<'a> {
    pub above: &'a [u8],
    pub left: &'a [u8],
}

/// Per-plane neighbor seeds; `None` entries start neutral.
#[derive(Debug, Default, Clone, Copy)]
pub struct Neighbors<'a> {
    pub planes: [Option<NeighborSeed<'a>>; 3],
}

fn get_tx_type(
    ctx: &BlockContext,
    plane: usize,
    plane_bsize: BlockSize,
    blk_row: usize,
    blk_col: usize,
) -> TxType {
    if plane == 0 {
        ctx.mode.txk_type(plane_bsize, blk_row, blk_col)
    } else {
        TxType::DctDct
    }
}

fn set_txb_context_for(ctx: &mut BlockContext, plane: usize, leaf: TxLeaf) {
    let p = &mut ctx.planes[plane];
    let value = p.txb_entropy_ctx[leaf.block];
    set_txb_context(
        &mut p.above_ctx,
        &mut p.left_ctx,
        leaf.blk_col,
        leaf.blk_row,
        leaf.tx_size,
        value,
    );
}

fn reconstruct_leaf(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    plane: usize,
    leaf: TxLeaf,
    tx_type: TxType,
) {
    let param = TxfmParam {
        tx_type,
        tx_size: leaf.tx_size,
        lossless: ctx.lossless(),
        bit_depth: ctx.bit_depth,
        eob: 0,
    };
    let off = block_offset(leaf.block);
    let area = leaf.tx_size.area();
    let PlaneState { dst, dqcoeff, eobs, .. } = &mut ctx.planes[plane];
    let eob = eobs[leaf.block];
    reconstruct(
        kernels,
        &dqcoeff[off..off + area],
        eob,
        &param,
        dst,
        leaf.blk_col,
        leaf.blk_row,
    );
}

/// Shared leaf encode for the inter path: transform/quantize (honoring
/// predetermined skips), optional coefficient optimization, entropy
/// context update, reconstruction, and skip-flag aggregation.
#[allow(clippy::too_many_arguments)]
fn encode_block(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    optimizer: &dyn CoeffOptimizer,
    hooks: &mut EncodeHooks<'_>,
    plane: usize,
    leaf: TxLeaf,
    plane_bsize: BlockSize,
    dry_run: RunType,
    enable_optimize: bool,
) {
    let TxLeaf {
        block,
        blk_row,
        blk_col,
        tx_size,
    } = leaf;
    let bw = plane_bsize.width_units();

    if !ctx.is_blk_skip(plane, blk_row * bw + blk_col) && !ctx.mode.skip_mode {
        let tx_type = get_tx_type(ctx, plane, plane_bsize, blk_row, blk_col);
        let strategy = if enable_optimize {
            XformQuant::Fp
        } else {
            XformQuant::B
        };
        xform_quant(
            ctx, kernels, qm, plane, block, blk_row, blk_col, plane_bsize, tx_size, tx_type,
            strategy,
        );
        if enable_optimize {
            let p = &ctx.planes[plane];
            let txb_ctx = get_txb_ctx(plane, tx_size, &p.above_ctx, &p.left_ctx, blk_col, blk_row);
            optimize_b(
                ctx, optimizer, plane, block, tx_size, tx_type, &txb_ctx, false,
            );
        }
    } else {
        let p = &mut ctx.planes[plane];
        p.eobs[block] = 0;
        p.txb_entropy_ctx[block] = 0;
    }

    set_txb_context_for(ctx, plane, leaf);

    let eob = ctx.planes[plane].eobs[block];
    if eob != 0 {
        ctx.mode.skip = false;
        let tx_type = get_tx_type(ctx, plane, plane_bsize, blk_row, blk_col);
        reconstruct_leaf(ctx, kernels, plane, leaf, tx_type);
    }

    // Zero-eob luma leaves fall back to the degenerate transform type so
    // later lookups stay well-defined. Checking that the stored type
    // already was the degenerate one stays disabled: hash collisions in
    // the upstream mode decision can leave a stale entry, and that is
    // not an error.
    if eob == 0 && plane == 0 {
        ctx.mode
            .set_txk_type(plane_bsize, blk_row, blk_col, tx_size, TxType::DctDct);
    }

    if eob == 0 && dry_run.output_enabled() {
        if let Some(log) = &mut hooks.skip_log {
            log.record_txb(plane, blk_row, blk_col, tx_size);
        }
    }

    if dry_run.output_enabled() {
        if let Some(rec) = &mut hooks.mismatch {
            rec.record_txb(plane, blk_row, blk_col, tx_size, &ctx.planes[plane].dst);
        }
    }
}

/// Leaf encode for the intra path: predict, subtract, transform,
/// optionally optimize, reconstruct.
#[allow(clippy::too_many_arguments)]
pub fn encode_block_intra(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    optimizer: &dyn CoeffOptimizer,
    predictor: &mut dyn IntraPredictor,
    hooks: &mut EncodeHooks<'_>,
    plane: usize,
    leaf: TxLeaf,
    plane_bsize: BlockSize,
    dry_run: RunType,
    enable_optimize: bool,
) {
    let TxLeaf {
        block,
        blk_row,
        blk_col,
        tx_size,
    } = leaf;

    predictor.predict(plane, blk_row, blk_col, tx_size, &mut ctx.planes[plane].dst);

    let bw = plane_bsize.width_units();
    if plane == 0 && ctx.is_blk_skip(plane, blk_row * bw + blk_col) {
        let p = &mut ctx.planes[plane];
        p.eobs[block] = 0;
        p.txb_entropy_ctx[block] = 0;
    } else {
        subtract_txb(ctx, plane, plane_bsize, blk_col, blk_row, tx_size);
        let tx_type = get_tx_type(ctx, plane, plane_bsize, blk_row, blk_col);
        let strategy = if enable_optimize {
            XformQuant::Fp
        } else {
            XformQuant::B
        };
        xform_quant(
            ctx, kernels, qm, plane, block, blk_row, blk_col, plane_bsize, tx_size, tx_type,
            strategy,
        );
        if enable_optimize {
            let p = &ctx.planes[plane];
            let txb_ctx = get_txb_ctx(plane, tx_size, &p.above_ctx, &p.left_ctx, blk_col, blk_row);
            optimize_b(
                ctx, optimizer, plane, block, tx_size, tx_type, &txb_ctx, false,
            );
        }
    }

    let eob = ctx.planes[plane].eobs[block];
    if eob != 0 {
        let tx_type = get_tx_type(ctx, plane, plane_bsize, blk_row, blk_col);
        reconstruct_leaf(ctx, kernels, plane, leaf, tx_type);
        if plane == 0 {
            ctx.mode
                .set_txk_type(plane_bsize, blk_row, blk_col, tx_size, tx_type);
            if let Some(cfl) = &mut hooks.cfl {
                cfl.store_tx(blk_row, blk_col, tx_size, &ctx.planes[0].dst);
            }
        }
    }

    // Same relaxed handling as the inter leaf: overwrite, never assert.
    if eob == 0 && plane == 0 {
        ctx.mode
            .set_txk_type(plane_bsize, blk_row, blk_col, tx_size, TxType::DctDct);
    }

    if eob == 0 && dry_run.output_enabled() {
        if let Some(log) = &mut hooks.skip_log {
            log.record_txb(plane, blk_row, blk_col, tx_size);
        }
    }

    // Skipped intra blocks are rare enough that signaling skip would be
    // a net cost; the block-level flag is forced off.
    ctx.mode.skip = false;
}

/// Encodes one plane of an intra coding block: context initialization,
/// then the fixed transform walk with the intra leaf encode and a
/// context update after every leaf.
#[allow(clippy::too_many_arguments)]
pub fn encode_intra_block_plane(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    optimizer: &dyn CoeffOptimizer,
    predictor: &mut dyn IntraPredictor,
    hooks: &mut EncodeHooks<'_>,
    bsize: BlockSize,
    plane: usize,
    dry_run: RunType,
    enable_optimize: bool,
    neighbors: Option<NeighborSeed<'_>>,
) {
    if plane != 0 && !ctx.mode.is_chroma_ref() {
        return;
    }
    let base = if plane == 0 {
        bsize
    } else {
        ctx.mode.chroma_base.unwrap_or(bsize)
    };
    let p = &ctx.planes[plane];
    let plane_bsize = plane_block_size(base, p.subsampling_x, p.subsampling_y);
    // Neighbor summaries only matter to the optimizer's context
    // estimates; without it the contexts start neutral.
    let seed = if enable_optimize { neighbors } else { None };
    init_plane_contexts(
        &mut ctx.planes[plane],
        plane_bsize,
        seed.map(|s| (s.above, s.left)),
    );

    for leaf in plane_tx_leaves(ctx, bsize, plane) {
        encode_block_intra(
            ctx,
            kernels,
            qm,
            optimizer,
            predictor,
            hooks,
            plane,
            leaf,
            plane_bsize,
            dry_run,
            enable_optimize,
        );
        set_txb_context_for(ctx, plane, leaf);
    }
}

/// Encodes the residual of an inter coding block across all planes. The
/// block-level skip flag starts optimistic and is cleared by the first
/// leaf with coded coefficients; blocks predetermined as whole-block
/// skip bypass everything.
pub fn encode_inter_txfm_block(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    optimizer: &dyn CoeffOptimizer,
    hooks: &mut EncodeHooks<'_>,
    dry_run: RunType,
    neighbors: &Neighbors<'_>,
) {
    ctx.mode.skip = true;

    if ctx.skip_block {
        if dry_run.output_enabled() {
            if let Some(log) = &mut hooks.skip_log {
                log.init_block(ctx.bsize, true);
            }
        }
        return;
    }

    let enable_optimize = ctx.optimize_enabled();
    for plane in 0..ctx.num_planes() {
        if plane != 0 && !ctx.mode.is_chroma_ref() {
            continue;
        }
        let bsizec = if plane == 0 {
            ctx.bsize
        } else {
            ctx.mode.chroma_base.unwrap_or(ctx.bsize)
        };
        let p = &ctx.planes[plane];
        let plane_bsize = plane_block_size(bsizec, p.subsampling_x, p.subsampling_y);
        init_plane_contexts(
            &mut ctx.planes[plane],
            plane_bsize,
            neighbors.planes[plane].map(|s| (s.above, s.left)),
        );
        subtract_plane(ctx, bsizec, plane);

        for leaf in vartx_leaves(ctx, plane) {
            encode_block(
                ctx,
                kernels,
                qm,
                optimizer,
                hooks,
                plane,
                leaf,
                plane_bsize,
                dry_run,
                enable_optimize,
            );
        }
    }
}

/// Lightweight first-pass encode of the luma plane: whole-plane
/// subtraction, DCT + standalone quantization at the fixed transform
/// size, reconstruction, and nothing else.
pub fn encode_sby_pass1(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    bsize: BlockSize,
) {
    subtract_plane(ctx, bsize, 0);
    for leaf in plane_tx_leaves(ctx, bsize, 0) {
        xform_quant(
            ctx,
            kernels,
            qm,
            0,
            leaf.block,
            leaf.blk_row,
            leaf.blk_col,
            bsize,
            leaf.tx_size,
            TxType::DctDct,
            XformQuant::B,
        );
        if ctx.planes[0].eobs[leaf.block] > 0 {
            reconstruct_leaf(ctx, kernels, 0, leaf, TxType::DctDct);
        }
    }
}
