use txq::{
    encode_inter_txfm_block, encode_intra_block_plane, encode_sby_pass1, foreach_txb_in_plane,
    BitDepth, BlockContext, BlockSize, EncodeHooks, FlatQm, IntraPredictor, Neighbors,
    NoopOptimizer, PlaneBuf, ReferenceKernels, RunType, TxSize,
};

struct FlatPredictor(u16);

impl IntraPredictor for FlatPredictor {
    fn predict(
        &mut self,
        _plane: usize,
        blk_row: usize,
        blk_col: usize,
        tx_size: TxSize,
        dst: &mut PlaneBuf,
    ) {
        for r in 0..tx_size.height() {
            for c in 0..tx_size.width() {
                let x = blk_col * 4 + c;
                let y = blk_row * 4 + r;
                if x < dst.width && y < dst.height {
                    dst.set(x, y, self.0);
                }
            }
        }
    }
}

fn gradient(buf: &mut PlaneBuf, scale: usize) {
    for y in 0..buf.height {
        for x in 0..buf.width {
            buf.set(x, y, (32 + scale * x + 2 * scale * y) as u16 & 0xff);
        }
    }
}

fn sse(a: &PlaneBuf, b: &PlaneBuf) -> u64 {
    a.data
        .iter()
        .zip(b.data.iter())
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum()
}

/// A 16x16 luma block with a flat zero-residual prediction, default
/// quantization, DCT, and optimization disabled yields eob 0 on every
/// 8x8 leaf, an untouched destination, and a skip flag of true.
#[test]
fn flat_sixteen_by_sixteen_is_all_skip() {
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 1, 0, 0).unwrap();
    ctx.mode.tx_size = TxSize::Tx8x8;
    for t in ctx.mode.inter_tx_sizes.iter_mut() {
        *t = TxSize::Tx8x8;
    }
    ctx.seg.optimize[0] = false;
    ctx.planes[0].src.fill(128);
    ctx.planes[0].dst.fill(128);
    let before = ctx.planes[0].dst.data.clone();

    let mut hooks = EncodeHooks::default();
    encode_inter_txfm_block(
        &mut ctx,
        &ReferenceKernels,
        &FlatQm,
        &NoopOptimizer,
        &mut hooks,
        RunType::Output,
        &Neighbors::default(),
    );

    assert_eq!(ctx.planes[0].eobs.iter().filter(|&&e| e == 0).count(), 16);
    assert_eq!(ctx.planes[0].dst.data, before);
    assert!(ctx.mode.skip);
}

#[test]
fn three_plane_inter_encode_reconstructs_all_planes() {
    let mut ctx = BlockContext::new(BlockSize::B32x32, BitDepth::Eight, 3, 1, 1).unwrap();
    ctx.mode.tx_size = TxSize::Tx16x16;
    for t in ctx.mode.inter_tx_sizes.iter_mut() {
        *t = TxSize::Tx16x16;
    }
    ctx.seg.optimize[0] = false;
    ctx.qindex = 60;
    for plane in 0..3 {
        gradient(&mut ctx.planes[plane].src, 3);
        ctx.planes[plane].dst.fill(100);
    }
    let initial: Vec<u64> = (0..3)
        .map(|p| sse(&ctx.planes[p].src, &ctx.planes[p].dst))
        .collect();

    let mut hooks = EncodeHooks::default();
    encode_inter_txfm_block(
        &mut ctx,
        &ReferenceKernels,
        &FlatQm,
        &NoopOptimizer,
        &mut hooks,
        RunType::Output,
        &Neighbors::default(),
    );

    assert!(!ctx.mode.skip);
    for plane in 0..3 {
        let after = sse(&ctx.planes[plane].src, &ctx.planes[plane].dst);
        assert!(
            after * 4 < initial[plane],
            "plane {plane}: {after} vs {}",
            initial[plane]
        );
    }
}

#[test]
fn intra_encode_all_planes_with_optimizer() {
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 3, 1, 1).unwrap();
    ctx.mode.tx_size = TxSize::Tx8x8;
    ctx.qindex = 80;
    for plane in 0..3 {
        gradient(&mut ctx.planes[plane].src, 2);
    }

    let mut pred = FlatPredictor(96);
    let mut hooks = EncodeHooks::default();
    for plane in 0..3 {
        encode_intra_block_plane(
            &mut ctx,
            &ReferenceKernels,
            &FlatQm,
            &NoopOptimizer,
            &mut pred,
            &mut hooks,
            BlockSize::B16x16,
            plane,
            RunType::Output,
            true,
            None,
        );
    }

    assert!(!ctx.mode.skip);
    for plane in 0..3 {
        let after = sse(&ctx.planes[plane].src, &ctx.planes[plane].dst);
        let area = (ctx.planes[plane].src.width * ctx.planes[plane].src.height) as u64;
        assert!(after < area * 300, "plane {plane}: sse {after}");
    }
}

#[test]
fn high_bit_depth_pipeline_runs() {
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Ten, 1, 0, 0).unwrap();
    ctx.mode.tx_size = TxSize::Tx8x8;
    for t in ctx.mode.inter_tx_sizes.iter_mut() {
        *t = TxSize::Tx8x8;
    }
    ctx.seg.optimize[0] = false;
    ctx.qindex = 50;
    for y in 0..16 {
        for x in 0..16 {
            ctx.planes[0].src.set(x, y, (600 + 13 * x + 7 * y) as u16);
        }
    }
    ctx.planes[0].dst.fill(512);
    let initial = sse(&ctx.planes[0].src, &ctx.planes[0].dst);

    let mut hooks = EncodeHooks::default();
    encode_inter_txfm_block(
        &mut ctx,
        &ReferenceKernels,
        &FlatQm,
        &NoopOptimizer,
        &mut hooks,
        RunType::Output,
        &Neighbors::default(),
    );

    let after = sse(&ctx.planes[0].src, &ctx.planes[0].dst);
    assert!(after < initial);
    assert!(ctx.planes[0].dst.data.iter().all(|&v| v < 1024));
}

#[test]
fn pass1_tracks_source_on_luma() {
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 1, 0, 0).unwrap();
    ctx.mode.tx_size = TxSize::Tx8x8;
    ctx.qindex = 60;
    gradient(&mut ctx.planes[0].src, 4);
    ctx.planes[0].dst.fill(90);
    let initial = sse(&ctx.planes[0].src, &ctx.planes[0].dst);

    encode_sby_pass1(&mut ctx, &ReferenceKernels, &FlatQm, BlockSize::B16x16);

    let after = sse(&ctx.planes[0].src, &ctx.planes[0].dst);
    assert!(after * 2 < initial, "{after} vs {initial}");
}

#[test]
fn downsampled_residual_path_confines_eob_to_small_run() {
    let run = |downsample: bool| {
        let mut ctx =
            BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 1, 0, 0).unwrap();
        ctx.mode.tx_size = TxSize::Tx8x8;
        for t in ctx.mode.inter_tx_sizes.iter_mut() {
            *t = TxSize::Tx8x8;
        }
        ctx.seg.optimize[0] = false;
        ctx.mode.downsample_residual = downsample;
        ctx.qindex = 10;
        for y in 0..16 {
            for x in 0..16 {
                let v = 40 + 9 * x + 3 * y + ((x * y) % 5) * 7;
                ctx.planes[0].src.set(x, y, v as u16);
            }
        }
        ctx.planes[0].dst.fill(70);
        let mut hooks = EncodeHooks::default();
        encode_inter_txfm_block(
            &mut ctx,
            &ReferenceKernels,
            &FlatQm,
            &NoopOptimizer,
            &mut hooks,
            RunType::Output,
            &Neighbors::default(),
        );
        ctx
    };

    // The packed layout guarantees every significant coefficient lands
    // in the small transform's scan prefix, so no 8x8 leaf can have an
    // eob past the 4x4 area.
    let dspl = run(true);
    assert!(!dspl.mode.skip);
    let leaf_blocks = [0usize, 4, 8, 12];
    for &b in &leaf_blocks {
        let eob = dspl.planes[0].eobs[b];
        assert!(eob > 0, "leaf {b} coded nothing");
        assert!(eob <= 16, "leaf {b} eob {eob} leaks past the packed run");
    }

    // The full-resolution path on the same busy content is not so
    // confined.
    let full = run(false);
    assert!(leaf_blocks
        .iter()
        .any(|&b| full.planes[0].eobs[b] > 16));
}

#[test]
fn entropy_contexts_follow_raster_order() {
    // After an inter encode, the above context at each column must be
    // the summary of the lowest leaf in that column, and the left
    // context that of the rightmost leaf in each row band.
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 1, 0, 0).unwrap();
    ctx.mode.tx_size = TxSize::Tx8x8;
    for t in ctx.mode.inter_tx_sizes.iter_mut() {
        *t = TxSize::Tx8x8;
    }
    ctx.seg.optimize[0] = false;
    ctx.qindex = 30;
    gradient(&mut ctx.planes[0].src, 5);
    ctx.planes[0].dst.fill(10);

    let mut hooks = EncodeHooks::default();
    encode_inter_txfm_block(
        &mut ctx,
        &ReferenceKernels,
        &FlatQm,
        &NoopOptimizer,
        &mut hooks,
        RunType::Output,
        &Neighbors::default(),
    );

    // Leaves sit at units (0,0) (0,2) (2,0) (2,2) and occupy 4
    // coefficient units each, so their block indices are 0, 4, 8, 12.
    let s = &ctx.planes[0].txb_entropy_ctx;
    let (top_right, bot_left, bot_right) = (s[4], s[8], s[12]);
    assert_eq!(ctx.planes[0].above_ctx[0], bot_left);
    assert_eq!(ctx.planes[0].above_ctx[2], bot_right);
    assert_eq!(ctx.planes[0].left_ctx[0], top_right);
    assert_eq!(ctx.planes[0].left_ctx[2], bot_right);
}

#[test]
fn public_walker_retraces_encoder_partition() {
    let mut ctx = BlockContext::new(BlockSize::B16x16, BitDepth::Eight, 1, 0, 0).unwrap();
    ctx.mode.tx_size = TxSize::Tx4x4;
    let mut count = 0;
    foreach_txb_in_plane(&ctx, BlockSize::B16x16, 0, &mut |_, leaf| {
        assert_eq!(leaf.tx_size, TxSize::Tx4x4);
        count += 1;
    });
    assert_eq!(count, 16);
}
