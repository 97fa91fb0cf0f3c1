#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::process;

use clap::{Parser, ValueEnum};

use txq::{
    encode_intra_block_plane, BitDepth, BlockContext, BlockSize, EncodeHooks, FlatQm,
    IntraPredictor, NoopOptimizer, PlaneBuf, ReferenceKernels, RunType, TxSize,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pattern {
    Solid,
    Gradient,
    Checker,
}

#[derive(Parser, Debug)]
#[command(name = "txq", about = "Drives the txq residual coding core over a synthetic frame.")]
struct Args {
    /// Frame width in samples.
    #[arg(long, default_value_t = 128)]
    width: usize,

    /// Frame height in samples.
    #[arg(long, default_value_t = 128)]
    height: usize,

    /// Coding block edge (16, 32, or 64).
    #[arg(long, default_value_t = 16)]
    block_size: usize,

    /// Transform edge (4, 8, or 16).
    #[arg(long, default_value_t = 8)]
    tx_size: usize,

    /// Quantizer index, 0-255.
    #[arg(long, default_value_t = 128)]
    qindex: u8,

    /// Sample bit depth (8, 10, or 12).
    #[arg(long, default_value_t = 8)]
    bit_depth: u8,

    /// Test pattern to encode.
    #[arg(long, value_enum, default_value = "gradient")]
    pattern: Pattern,

    /// Lossless coding (forces 4x4 Walsh-Hadamard transforms).
    #[arg(long)]
    lossless: bool,

    /// Run the coefficient optimization pass.
    #[arg(long)]
    optimize: bool,

    /// Write the reconstructed luma plane as a binary PGM.
    #[arg(short, long)]
    output: Option<String>,
}

/// Flat DC prediction from the reconstructed frame samples above and to
/// the left of the coding block, in the manner of a real intra DC mode.
struct DcPredictor {
    value: u16,
}

impl DcPredictor {
    fn for_block(recon: &PlaneBuf, x0: usize, y0: usize, bw: usize, bh: usize, neutral: u16) -> Self {
        let mut sum = 0u64;
        let mut count = 0u64;
        if y0 > 0 {
            for x in x0..(x0 + bw).min(recon.width) {
                sum += recon.get(x, y0 - 1) as u64;
                count += 1;
            }
        }
        if x0 > 0 {
            for y in y0..(y0 + bh).min(recon.height) {
                sum += recon.get(x0 - 1, y) as u64;
                count += 1;
            }
        }
        let value = if count == 0 {
            neutral
        } else {
            ((sum + count / 2) / count) as u16
        };
        Self { value }
    }
}

impl IntraPredictor for DcPredictor {
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
                    dst.set(x, y, self.value);
                }
            }
        }
    }
}

fn fill_pattern(frame: &mut PlaneBuf, pattern: Pattern, max: u16) {
    for y in 0..frame.height {
        for x in 0..frame.width {
            let v = match pattern {
                Pattern::Solid => max / 2,
                Pattern::Gradient => {
                    ((x * max as usize) / frame.width.max(1)
                        + (y * max as usize) / (2 * frame.height.max(1)))
                        as u16
                }
                Pattern::Checker => {
                    if ((x / 8) + (y / 8)) % 2 == 0 {
                        max / 4
                    } else {
                        (3 * (max as usize) / 4) as u16
                    }
                }
            };
            frame.set(x, y, v.min(max));
        }
    }
}

fn write_pgm(path: &str, frame: &PlaneBuf, bit_depth: BitDepth) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "P5\n{} {}\n255", frame.width, frame.height)?;
    let shift = bit_depth.bits() - 8;
    let bytes: Vec<u8> = frame.data.iter().map(|&v| (v >> shift) as u8).collect();
    f.write_all(&bytes)
}

fn run(args: &Args) -> Result<(), String> {
    let bit_depth = BitDepth::from_u8(args.bit_depth)
        .ok_or_else(|| format!("unsupported bit depth: {}", args.bit_depth))?;
    let bsize = BlockSize::from_dims(args.block_size, args.block_size)
        .ok_or_else(|| format!("unsupported block size: {}", args.block_size))?;
    let tx_edge = if args.lossless { 4 } else { args.tx_size };
    let tx_size = TxSize::from_dims(tx_edge, tx_edge)
        .ok_or_else(|| format!("unsupported transform size: {}", args.tx_size))?;
    if !(4..=16).contains(&tx_edge) {
        return Err(format!("transform size {} has no reference kernel", tx_edge));
    }
    if args.width == 0 || args.height == 0 || args.width % 4 != 0 || args.height % 4 != 0 {
        return Err("frame dimensions must be nonzero multiples of 4".to_owned());
    }

    let max = (1u32 << bit_depth.bits()) as u16 - 1;
    let mut source = PlaneBuf::new(args.width, args.height);
    fill_pattern(&mut source, args.pattern, max);
    let mut recon = PlaneBuf::new(args.width, args.height);

    let bs = args.block_size;
    let neutral = (max / 2) + 1;
    let mut zero_eob_leaves = 0usize;
    let mut total_leaves = 0usize;

    let mut y0 = 0;
    while y0 < args.height {
        let mut x0 = 0;
        while x0 < args.width {
            let mut ctx = BlockContext::new(bsize, bit_depth, 1, 0, 0)
                .map_err(|e| e.to_string())?;
            ctx.mode.tx_size = tx_size;
            ctx.qindex = args.qindex;
            ctx.seg.lossless[0] = args.lossless;
            ctx.seg.optimize[0] = args.optimize;
            ctx.valid_width = (args.width - x0).min(bs);
            ctx.valid_height = (args.height - y0).min(bs);

            for y in 0..ctx.valid_height {
                for x in 0..ctx.valid_width {
                    let v = source.get(x0 + x, y0 + y);
                    ctx.planes[0].src.set(x, y, v);
                }
            }

            let mut predictor = DcPredictor::for_block(
                &recon,
                x0,
                y0,
                ctx.valid_width,
                ctx.valid_height,
                neutral,
            );
            let mut hooks = EncodeHooks::default();
            encode_intra_block_plane(
                &mut ctx,
                &ReferenceKernels,
                &FlatQm,
                &NoopOptimizer,
                &mut predictor,
                &mut hooks,
                bsize,
                0,
                RunType::Output,
                args.optimize,
                None,
            );

            // Retrace the encoder's partition to tally skipped leaves.
            txq::foreach_txb_in_plane(&ctx, bsize, 0, &mut |_, leaf| {
                total_leaves += 1;
                if ctx.planes[0].eobs[leaf.block] == 0 {
                    zero_eob_leaves += 1;
                }
            });

            for y in 0..ctx.valid_height {
                for x in 0..ctx.valid_width {
                    recon.set(x0 + x, y0 + y, ctx.planes[0].dst.get(x, y));
                }
            }
            x0 += bs;
        }
        y0 += bs;
    }

    let mut err = 0u64;
    for (s, r) in source.data.iter().zip(recon.data.iter()) {
        let d = *s as i64 - *r as i64;
        err += (d * d) as u64;
    }
    let n = (args.width * args.height) as f64;
    let mse = err as f64 / n;
    let peak = max as f64;
    let psnr = if mse > 0.0 {
        10.0 * (peak * peak / mse).log10()
    } else {
        f64::INFINITY
    };

    eprintln!(
        "Encoded {}x{} ({:?}, q={}, {}-bit{}): PSNR {:.2} dB, {}/{} transform blocks skipped",
        args.width,
        args.height,
        args.pattern,
        args.qindex,
        bit_depth.bits(),
        if args.lossless { ", lossless" } else { "" },
        psnr,
        zero_eob_leaves,
        total_leaves,
    );

    if args.lossless && err != 0 {
        return Err("lossless run produced nonzero reconstruction error".to_owned());
    }

    if let Some(path) = &args.output {
        write_pgm(path, &recon, bit_depth).map_err(|e| e.to_string())?;
        eprintln!("Wrote {}", path);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(msg) = run(&args) {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}
