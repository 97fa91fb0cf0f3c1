//! Transform-quantize engine: forward-transforms a residual block
//! (optionally through the downsampled variant), quantizes it with the
//! selected strategy, and accumulates the block's entropy-context
//! summary.

use crate::block::{block_offset, BlockContext, PlaneState};
use crate::ctx::txb_entropy_context;
use crate::geom::{
    adjusted_tx_size, dspl_tx_size, tx_log_scale, BlockSize, MI_SIZE_LOG2, TxSize, TxType,
};
use crate::quant::{
    flat_matrix, quant_facade, quantize_skip, QmProvider, QuantParam, QuantStep, XformQuant,
};
use crate::scan::scan_order;
use crate::txfm::{TxfmKernel, TxfmParam};

/// Averaging 2x downsample of a signed residual rectangle.
fn signed_down2(
    src: &[i32],
    src_stride: usize,
    rows: usize,
    cols: usize,
    dst: &mut [i32],
    dst_stride: usize,
) {
    for r in 0..rows / 2 {
        for c in 0..cols / 2 {
            let a = src[(2 * r) * src_stride + 2 * c];
            let b = src[(2 * r) * src_stride + 2 * c + 1];
            let d = src[(2 * r + 1) * src_stride + 2 * c];
            let e = src[(2 * r + 1) * src_stride + 2 * c + 1];
            dst[r * dst_stride + c] = (a + b + d + e + 2) >> 2;
        }
    }
}

/// Downsampled-residual transform: downsample 2x in each dimension,
/// transform at the reduced size, then re-expand into the full
/// transform's scan layout. Packing scans the small transform's
/// coefficients in via its own scan order and back out through the large
/// order, so the quantizer always sees a contiguous run of significant
/// values followed by zeros, which the eob signals cheaply.
pub fn dspl_xform(
    kernels: &dyn TxfmKernel,
    src_diff: &[i32],
    diff_stride: usize,
    coeff: &mut [i32],
    param: &TxfmParam,
    tx_size: TxSize,
    tx_type: TxType,
) {
    let txw = tx_size.width();
    let txh = tx_size.height();
    let new_tx = dspl_tx_size(tx_size);
    assert!(new_tx != tx_size, "downsample of a minimum-size transform");
    let dspl_w = txw / 2;

    let mut dspl_diff = vec![0i32; new_tx.area()];
    signed_down2(src_diff, diff_stride, txh, txw, &mut dspl_diff, dspl_w);

    let mut dspl_param = *param;
    dspl_param.tx_size = new_tx;
    let mut small = vec![0i32; new_tx.area()];
    kernels.forward(&dspl_diff, dspl_w, &mut small, &dspl_param);

    // Pack: gather the small coefficients in their scan order, then
    // scatter that run through the large scan order, zero-filling the
    // tail.
    let small_scan = scan_order(new_tx);
    let large_scan = scan_order(tx_size);
    let mut scan_buf = vec![0i32; new_tx.area()];
    for (i, &pos) in small_scan.iter().enumerate() {
        scan_buf[i] = small[pos as usize];
    }
    coeff[..tx_size.area()].fill(0);
    for (i, &pos) in large_scan.iter().take(scan_buf.len()).enumerate() {
        coeff[pos as usize] = scan_buf[i];
    }
}

/// Forward-transforms and quantizes one transform block, leaving its
/// coefficients, eob, and entropy-context summary in the plane state.
#[allow(clippy::too_many_arguments)]
pub fn xform_quant(
    ctx: &mut BlockContext,
    kernels: &dyn TxfmKernel,
    qm: &dyn QmProvider,
    plane: usize,
    block: usize,
    blk_row: usize,
    blk_col: usize,
    plane_bsize: BlockSize,
    tx_size: TxSize,
    tx_type: TxType,
    strategy: XformQuant,
) {
    let scan = scan_order(tx_size);
    let seg = ctx.mode.segment_id;
    let lossless = ctx.lossless();
    let bit_depth = ctx.bit_depth;
    let skip_block = ctx.skip_block;
    let downsample = ctx.mode.downsample_residual;
    let use_quant_b_adapt = ctx.use_quant_b_adapt;
    let qindex = ctx.qindex;

    let qm_tx = adjusted_tx_size(tx_size);
    // Flat matrices for 1D and identity transform types.
    let (qmatrix, iqmatrix) = if tx_type.is_2d() {
        (qm.qmatrix(seg, qm_tx), qm.iqmatrix(seg, qm_tx))
    } else {
        (flat_matrix(tx_size), flat_matrix(tx_size))
    };
    let qparam = QuantParam {
        log_scale: tx_log_scale(tx_size),
        tx_size,
        qmatrix,
        iqmatrix,
        use_quant_b_adapt,
    };
    let txfm_param = TxfmParam {
        tx_type,
        tx_size,
        lossless,
        bit_depth,
        eob: 0,
    };

    let diff_stride = plane_bsize.width();
    let diff_offset = (blk_row * diff_stride + blk_col) << MI_SIZE_LOG2;
    let off = block_offset(block);
    let area = tx_size.area();

    let PlaneState {
        residual,
        coeff,
        qcoeff,
        dqcoeff,
        eobs,
        txb_entropy_ctx,
        ..
    } = &mut ctx.planes[plane];
    let coeff = &mut coeff[off..off + area];
    let qcoeff = &mut qcoeff[off..off + area];
    let dqcoeff = &mut dqcoeff[off..off + area];
    let src_diff = &residual[diff_offset..];

    let use_dspl = plane == 0 && downsample && !bit_depth.is_high() && !lossless;
    if use_dspl {
        dspl_xform(kernels, src_diff, diff_stride, coeff, &txfm_param, tx_size, tx_type);
    } else {
        kernels.forward(src_diff, diff_stride, coeff, &txfm_param);
    }

    if strategy != XformQuant::SkipQuant {
        let eob = if skip_block {
            quantize_skip(area, qcoeff, dqcoeff)
        } else {
            let quantize = quant_facade(strategy, bit_depth)
                .expect("no quantization strategy for this transform");
            let step = if lossless {
                QuantStep::lossless()
            } else {
                crate::quant::qstep(qindex, bit_depth)
            };
            quantize(coeff, area, step, &qparam, &scan, qcoeff, dqcoeff)
        };
        assert!(eob as usize <= area, "eob outside transform area");
        eobs[block] = eob;
    }

    // A first-pass quantize is always followed by an optimization pass
    // that recomputes the summary; leave it neutral to avoid the
    // redundant work.
    let optimize_follows = strategy == XformQuant::Fp && !lossless;
    txb_entropy_ctx[block] = if optimize_follows {
        0
    } else {
        txb_entropy_context(qcoeff, &scan, eobs[block])
    };
}
