//! Forward and inverse transform kernels behind the `TxfmKernel` seam.
//! The reference implementation provides integer DCT/ADST/identity
//! butterflies for 4/8/16-point dimensions (identity up to 32) plus the
//! exact 4x4 Walsh-Hadamard pair used by lossless segments. Requesting a
//! combination outside that set is a fatal invariant violation.

use crate::block::PlaneBuf;
use crate::geom::{BitDepth, TxSize, TxType};

/// Immutable parameter bundle for one transform call.
#[derive(Debug, Clone, Copy)]
pub struct TxfmParam {
    pub tx_type: TxType,
    pub tx_size: TxSize,
    pub lossless: bool,
    pub bit_depth: BitDepth,
    /// Coefficient count hint for the inverse; reference kernels always
    /// process the full block.
    pub eob: u16,
}

/// Forward/inverse transform kernels keyed by size, type, and bit depth.
pub trait TxfmKernel {
    /// Transforms a strided residual rectangle into raster-order
    /// coefficients.
    fn forward(&self, residual: &[i32], diff_stride: usize, coeff: &mut [i32], param: &TxfmParam);

    /// Inverse-transforms coefficients and adds the result onto the
    /// destination buffer in place, clamped to the active bit depth.
    fn inverse_add(
        &self,
        dqcoeff: &[i32],
        dst: &mut PlaneBuf,
        x0: usize,
        y0: usize,
        param: &TxfmParam,
    );
}

fn clip(v: i32) -> i32 {
    v.clamp(-32768, 32767)
}

fn ilog2(n: usize) -> usize {
    n.trailing_zeros() as usize
}

fn round_shift(v: i32, s: usize) -> i32 {
    if s == 0 {
        v
    } else {
        (v + (1 << (s - 1))) >> s
    }
}

// ---------------------------------------------------------------------
// 1-D butterflies. Signature: (data, offset, stride); each reads and
// writes `len` elements at the given stride.

fn fwd_dct4_1d_values(in0: i32, in1: i32, in2: i32, in3: i32) -> (i32, i32, i32, i32) {
    let s0 = in0 + in3;
    let s1 = in1 + in2;
    let s2 = in1 - in2;
    let s3 = in0 - in3;

    let out0 = ((s0 + s1) * 181 + 128) >> 8;
    let out1 = ((s3 * (3784 - 4096) + s2 * 1567 + 2048) >> 12) + s3;
    let out2 = ((s0 - s1) * 181 + 128) >> 8;
    let out3 = ((s3 * 1567 - s2 * (3784 - 4096) + 2048) >> 12) - s2;

    (out0, out1, out2, out3)
}

fn fwd_dct4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let (o0, o1, o2, o3) = fwd_dct4_1d_values(
        data[offset],
        data[offset + stride],
        data[offset + 2 * stride],
        data[offset + 3 * stride],
    );
    data[offset] = o0;
    data[offset + stride] = o1;
    data[offset + 2 * stride] = o2;
    data[offset + 3 * stride] = o3;
}

#[allow(clippy::too_many_arguments)]
fn fwd_dct8_1d_values(
    in0: i32,
    in1: i32,
    in2: i32,
    in3: i32,
    in4: i32,
    in5: i32,
    in6: i32,
    in7: i32,
) -> (i32, i32, i32, i32, i32, i32, i32, i32) {
    let s0 = in0 + in7;
    let s1 = in1 + in6;
    let s2 = in2 + in5;
    let s3 = in3 + in4;
    let s4 = in3 - in4;
    let s5 = in2 - in5;
    let s6 = in1 - in6;
    let s7 = in0 - in7;

    let (e0, e1, e2, e3) = fwd_dct4_1d_values(s0, s1, s2, s3);

    let t5 = ((s6 - s5) * 181 + 128) >> 8;
    let t6 = ((s6 + s5) * 181 + 128) >> 8;

    let t4a = clip(s4 + t5);
    let t5a = clip(s4 - t5);
    let t7a = clip(s7 + t6);
    let t6a = clip(s7 - t6);

    let o1 = ((t7a * (4017 - 4096) + t4a * 799 + 2048) >> 12) + t7a;
    let o3 = (t6a * 1703 - t5a * 1138 + 1024) >> 11;
    let o5 = (t5a * 1703 + t6a * 1138 + 1024) >> 11;
    let o7 = ((t7a * 799 - t4a * (4017 - 4096) + 2048) >> 12) - t4a;

    (e0, o1, e1, o3, e2, o5, e3, o7)
}

fn fwd_dct8_1d(data: &mut [i32], offset: usize, stride: usize) {
    let (o0, o1, o2, o3, o4, o5, o6, o7) = fwd_dct8_1d_values(
        data[offset],
        data[offset + stride],
        data[offset + 2 * stride],
        data[offset + 3 * stride],
        data[offset + 4 * stride],
        data[offset + 5 * stride],
        data[offset + 6 * stride],
        data[offset + 7 * stride],
    );
    data[offset] = o0;
    data[offset + stride] = o1;
    data[offset + 2 * stride] = o2;
    data[offset + 3 * stride] = o3;
    data[offset + 4 * stride] = o4;
    data[offset + 5 * stride] = o5;
    data[offset + 6 * stride] = o6;
    data[offset + 7 * stride] = o7;
}

fn fwd_dct16_1d(data: &mut [i32], offset: usize, stride: usize) {
    let mut input = [0i32; 16];
    for (i, v) in input.iter_mut().enumerate() {
        *v = data[offset + i * stride];
    }

    let mut sums = [0i32; 8];
    let mut diffs = [0i32; 8];
    for i in 0..8 {
        sums[i] = input[i] + input[15 - i];
        diffs[i] = input[i] - input[15 - i];
    }

    let (e0, e1, e2, e3, e4, e5, e6, e7) = fwd_dct8_1d_values(
        sums[0], sums[1], sums[2], sums[3], sums[4], sums[5], sums[6], sums[7],
    );

    let u0 = ((diffs[2] - diffs[5]) * 181 + 128) >> 8;
    let u1 = ((diffs[2] + diffs[5]) * 181 + 128) >> 8;
    let u2 = ((diffs[3] - diffs[4]) * 181 + 128) >> 8;
    let u3 = ((diffs[3] + diffs[4]) * 181 + 128) >> 8;

    let t8 = clip(diffs[7] + u2);
    let t11 = clip(diffs[7] - u2);
    let t9a = clip(diffs[6] + u0);
    let t10a = clip(diffs[6] - u0);
    let t12 = clip(diffs[0] - u3);
    let t15 = clip(diffs[0] + u3);
    let t13a = clip(diffs[1] - u1);
    let t14a = clip(diffs[1] + u1);

    let t9 = ((t14a * 1567 - t9a * (3784 - 4096) + 2048) >> 12) - t9a;
    let t14 = ((t14a * (3784 - 4096) + t9a * 1567 + 2048) >> 12) + t14a;
    let t10 = ((-t10a * 1567 - t13a * (3784 - 4096) + 2048) >> 12) - t13a;
    let t13 = ((-t10a * (3784 - 4096) + t13a * 1567 + 2048) >> 12) - t10a;

    let t8a = clip(t8 + t9);
    let t9b = clip(t8 - t9);
    let t10b = clip(t11 - t10);
    let t11a = clip(t11 + t10);
    let t12a = clip(t12 + t13);
    let t13b = clip(t12 - t13);
    let t14b = clip(t15 - t14);
    let t15a = clip(t15 + t14);

    let o1 = ((t15a * (4076 - 4096) + t8a * 401 + 2048) >> 12) + t15a;
    let o15 = ((t15a * 401 - t8a * (4076 - 4096) + 2048) >> 12) - t8a;
    let o9 = (t9b * 1583 + t14b * 1299 + 1024) >> 11;
    let o7 = (t14b * 1583 - t9b * 1299 + 1024) >> 11;
    let o5 = ((t13b * (3612 - 4096) + t10b * 1931 + 2048) >> 12) + t13b;
    let o11 = ((t13b * 1931 - t10b * (3612 - 4096) + 2048) >> 12) - t10b;
    let o13 = ((t11a * (3920 - 4096) + t12a * 1189 + 2048) >> 12) + t11a;
    let o3 = ((-t11a * 1189 + t12a * (3920 - 4096) + 2048) >> 12) + t12a;

    let out = [
        e0, o1, e1, o3, e2, o5, e3, o7, e4, o9, e5, o11, e6, o13, e7, o15,
    ];
    for (i, v) in out.iter().enumerate() {
        data[offset + i * stride] = *v;
    }
}

fn inv_dct4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset];
    let in1 = data[offset + stride];
    let in2 = data[offset + 2 * stride];
    let in3 = data[offset + 3 * stride];

    let t0 = ((in0 + in2) * 181 + 128) >> 8;
    let t1 = ((in0 - in2) * 181 + 128) >> 8;
    let t2 = ((in1 * 1567 - in3 * (3784 - 4096) + 2048) >> 12) - in3;
    let t3 = ((in1 * (3784 - 4096) + in3 * 1567 + 2048) >> 12) + in1;

    data[offset] = clip(t0 + t3);
    data[offset + stride] = clip(t1 + t2);
    data[offset + 2 * stride] = clip(t1 - t2);
    data[offset + 3 * stride] = clip(t0 - t3);
}

fn inv_dct8_1d(data: &mut [i32], offset: usize, stride: usize) {
    inv_dct4_1d(data, offset, stride * 2);

    let in1 = data[offset + stride];
    let in3 = data[offset + 3 * stride];
    let in5 = data[offset + 5 * stride];
    let in7 = data[offset + 7 * stride];

    let t4a = ((in1 * 799 - in7 * (4017 - 4096) + 2048) >> 12) - in7;
    let t5a = (in5 * 1703 - in3 * 1138 + 1024) >> 11;
    let t6a = (in5 * 1138 + in3 * 1703 + 1024) >> 11;
    let t7a = ((in1 * (4017 - 4096) + in7 * 799 + 2048) >> 12) + in1;

    let t4 = clip(t4a + t5a);
    let t5a = clip(t4a - t5a);
    let t7 = clip(t7a + t6a);
    let t6a = clip(t7a - t6a);

    let t5 = ((t6a - t5a) * 181 + 128) >> 8;
    let t6 = ((t6a + t5a) * 181 + 128) >> 8;

    let t0 = data[offset];
    let t1 = data[offset + 2 * stride];
    let t2 = data[offset + 4 * stride];
    let t3 = data[offset + 6 * stride];

    data[offset] = clip(t0 + t7);
    data[offset + stride] = clip(t1 + t6);
    data[offset + 2 * stride] = clip(t2 + t5);
    data[offset + 3 * stride] = clip(t3 + t4);
    data[offset + 4 * stride] = clip(t3 - t4);
    data[offset + 5 * stride] = clip(t2 - t5);
    data[offset + 6 * stride] = clip(t1 - t6);
    data[offset + 7 * stride] = clip(t0 - t7);
}

fn inv_dct16_1d(data: &mut [i32], offset: usize, stride: usize) {
    inv_dct8_1d(data, offset, stride * 2);

    let in1 = data[offset + stride];
    let in3 = data[offset + 3 * stride];
    let in5 = data[offset + 5 * stride];
    let in7 = data[offset + 7 * stride];
    let in9 = data[offset + 9 * stride];
    let in11 = data[offset + 11 * stride];
    let in13 = data[offset + 13 * stride];
    let in15 = data[offset + 15 * stride];

    let t8a = ((in1 * 401 - in15 * (4076 - 4096) + 2048) >> 12) - in15;
    let t9a = (in9 * 1583 - in7 * 1299 + 1024) >> 11;
    let t10a = ((in5 * 1931 - in11 * (3612 - 4096) + 2048) >> 12) - in11;
    let t11a = ((in13 * (3920 - 4096) - in3 * 1189 + 2048) >> 12) + in13;
    let t12a = ((in13 * 1189 + in3 * (3920 - 4096) + 2048) >> 12) + in3;
    let t13a = ((in5 * (3612 - 4096) + in11 * 1931 + 2048) >> 12) + in5;
    let t14a = (in9 * 1299 + in7 * 1583 + 1024) >> 11;
    let t15a = ((in1 * (4076 - 4096) + in15 * 401 + 2048) >> 12) + in1;

    let t8 = clip(t8a + t9a);
    let t9 = clip(t8a - t9a);
    let t10 = clip(t11a - t10a);
    let t11 = clip(t11a + t10a);
    let t12 = clip(t12a + t13a);
    let t13 = clip(t12a - t13a);
    let t14 = clip(t15a - t14a);
    let t15 = clip(t15a + t14a);

    let t9a = ((t14 * 1567 - t9 * (3784 - 4096) + 2048) >> 12) - t9;
    let t14a = ((t14 * (3784 - 4096) + t9 * 1567 + 2048) >> 12) + t14;
    let t10a = ((-(t13 * (3784 - 4096) + t10 * 1567) + 2048) >> 12) - t13;
    let t13a = ((t13 * 1567 - t10 * (3784 - 4096) + 2048) >> 12) - t10;

    let t8a2 = clip(t8 + t11);
    let t9f = clip(t9a + t10a);
    let t10f = clip(t9a - t10a);
    let t11f = clip(t8 - t11);
    let t12f = clip(t15 - t12);
    let t13f = clip(t14a - t13a);
    let t14f = clip(t14a + t13a);
    let t15f = clip(t15 + t12);

    let t10g = ((t13f - t10f) * 181 + 128) >> 8;
    let t13g = ((t13f + t10f) * 181 + 128) >> 8;
    let t11g = ((t12f - t11f) * 181 + 128) >> 8;
    let t12g = ((t12f + t11f) * 181 + 128) >> 8;

    let mut even = [0i32; 8];
    for (i, e) in even.iter_mut().enumerate() {
        *e = data[offset + 2 * i * stride];
    }
    let odd = [t8a2, t9f, t10g, t11g, t12g, t13g, t14f, t15f];

    for i in 0..8 {
        data[offset + i * stride] = clip(even[i] + odd[7 - i]);
        data[offset + (15 - i) * stride] = clip(even[i] - odd[7 - i]);
    }
}

fn fwd_adst4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset];
    let in1 = data[offset + stride];
    let in2 = data[offset + 2 * stride];
    let in3 = data[offset + 3 * stride];

    let s0 = 1321 * in0 + 2482 * in1 + 3344 * in2 + 3803 * in3;
    let s1 = 3344 * (in0 + in1 - in3);
    let s2 = 3803 * in0 - 1321 * in1 - 3344 * in2 + 2482 * in3;
    let s3 = 2482 * in0 - 3803 * in1 + 3344 * in2 - 1321 * in3;

    data[offset] = (s0 + 2048) >> 12;
    data[offset + stride] = (s1 + 2048) >> 12;
    data[offset + 2 * stride] = (s2 + 2048) >> 12;
    data[offset + 3 * stride] = (s3 + 2048) >> 12;
}

fn inv_adst4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset];
    let in1 = data[offset + stride];
    let in2 = data[offset + 2 * stride];
    let in3 = data[offset + 3 * stride];

    let o0 =
        ((1321 * in0 + (3803 - 4096) * in2 + (2482 - 4096) * in3 + (3344 - 4096) * in1 + 2048)
            >> 12)
            + in2
            + in3
            + in1;
    let o1 =
        (((2482 - 4096) * in0 - 1321 * in2 - (3803 - 4096) * in3 + (3344 - 4096) * in1 + 2048)
            >> 12)
            + in0
            - in3
            + in1;
    let o2 = (209 * (in0 - in2 + in3) + 128) >> 8;
    let o3 = (((3803 - 4096) * in0 + (2482 - 4096) * in2 - 1321 * in3 - (3344 - 4096) * in1
        + 2048)
        >> 12)
        + in0
        + in2
        - in1;

    data[offset] = clip(o0);
    data[offset + stride] = clip(o1);
    data[offset + 2 * stride] = clip(o2);
    data[offset + 3 * stride] = clip(o3);
}

fn fwd_adst8_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset + 7 * stride];
    let in1 = data[offset];
    let in2 = data[offset + 5 * stride];
    let in3 = data[offset + 2 * stride];
    let in4 = data[offset + 3 * stride];
    let in5 = data[offset + 4 * stride];
    let in6 = data[offset + stride];
    let in7 = data[offset + 6 * stride];

    let t0a = (((4076 - 4096) * in0 + 401 * in1 + 2048) >> 12) + in0;
    let t1a = ((401 * in0 - (4076 - 4096) * in1 + 2048) >> 12) - in1;
    let t2a = (((3612 - 4096) * in2 + 1931 * in3 + 2048) >> 12) + in2;
    let t3a = ((1931 * in2 - (3612 - 4096) * in3 + 2048) >> 12) - in3;
    let t4a = (1299 * in4 + 1583 * in5 + 1024) >> 11;
    let t5a = (1583 * in4 - 1299 * in5 + 1024) >> 11;
    let t6a = ((1189 * in6 + (3920 - 4096) * in7 + 2048) >> 12) + in7;
    let t7a = (((3920 - 4096) * in6 - 1189 * in7 + 2048) >> 12) + in6;

    let t0 = clip(t0a + t4a);
    let t1 = clip(t1a + t5a);
    let t2 = clip(t2a + t6a);
    let t3 = clip(t3a + t7a);
    let t4 = clip(t0a - t4a);
    let t5 = clip(t1a - t5a);
    let t6 = clip(t2a - t6a);
    let t7 = clip(t3a - t7a);

    let t4b = (((3784 - 4096) * t4 + 1567 * t5 + 2048) >> 12) + t4;
    let t5b = ((1567 * t4 - (3784 - 4096) * t5 + 2048) >> 12) - t5;
    let t6b = (((3784 - 4096) * t7 - 1567 * t6 + 2048) >> 12) + t7;
    let t7b = ((1567 * t7 + (3784 - 4096) * t6 + 2048) >> 12) + t6;

    let o0 = clip(t0 + t2);
    let o7 = clip(t1 + t3);
    let t2f = clip(t0 - t2);
    let t3f = clip(t1 - t3);
    let o1 = clip(t4b + t6b);
    let o6 = clip(t5b + t7b);
    let t6f = clip(t4b - t6b);
    let t7f = clip(t5b - t7b);

    data[offset] = o0;
    data[offset + stride] = -o1;
    data[offset + 2 * stride] = ((t6f + t7f) * 181 + 128) >> 8;
    data[offset + 3 * stride] = -(((t2f + t3f) * 181 + 128) >> 8);
    data[offset + 4 * stride] = ((t2f - t3f) * 181 + 128) >> 8;
    data[offset + 5 * stride] = -(((t6f - t7f) * 181 + 128) >> 8);
    data[offset + 6 * stride] = o6;
    data[offset + 7 * stride] = -o7;
}

fn inv_adst8_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset];
    let in1 = data[offset + stride];
    let in2 = data[offset + 2 * stride];
    let in3 = data[offset + 3 * stride];
    let in4 = data[offset + 4 * stride];
    let in5 = data[offset + 5 * stride];
    let in6 = data[offset + 6 * stride];
    let in7 = data[offset + 7 * stride];

    let t0a = (((4076 - 4096) * in7 + 401 * in0 + 2048) >> 12) + in7;
    let t1a = ((401 * in7 - (4076 - 4096) * in0 + 2048) >> 12) - in0;
    let t2a = (((3612 - 4096) * in5 + 1931 * in2 + 2048) >> 12) + in5;
    let t3a = ((1931 * in5 - (3612 - 4096) * in2 + 2048) >> 12) - in2;
    let t4a = (1299 * in3 + 1583 * in4 + 1024) >> 11;
    let t5a = (1583 * in3 - 1299 * in4 + 1024) >> 11;
    let t6a = ((1189 * in1 + (3920 - 4096) * in6 + 2048) >> 12) + in6;
    let t7a = (((3920 - 4096) * in1 - 1189 * in6 + 2048) >> 12) + in1;

    let t0 = clip(t0a + t4a);
    let t1 = clip(t1a + t5a);
    let mut t2 = clip(t2a + t6a);
    let mut t3 = clip(t3a + t7a);
    let t4 = clip(t0a - t4a);
    let t5 = clip(t1a - t5a);
    let mut t6 = clip(t2a - t6a);
    let mut t7 = clip(t3a - t7a);

    let t4b = (((3784 - 4096) * t4 + 1567 * t5 + 2048) >> 12) + t4;
    let t5b = ((1567 * t4 - (3784 - 4096) * t5 + 2048) >> 12) - t5;
    let t6b = (((3784 - 4096) * t7 - 1567 * t6 + 2048) >> 12) + t7;
    let t7b = ((1567 * t7 + (3784 - 4096) * t6 + 2048) >> 12) + t6;

    data[offset] = clip(t0 + t2);
    data[offset + 7 * stride] = -clip(t1 + t3);
    t2 = clip(t0 - t2);
    t3 = clip(t1 - t3);
    data[offset + stride] = -clip(t4b + t6b);
    data[offset + 6 * stride] = clip(t5b + t7b);
    t6 = clip(t4b - t6b);
    t7 = clip(t5b - t7b);

    data[offset + 3 * stride] = -(((t2 + t3) * 181 + 128) >> 8);
    data[offset + 4 * stride] = ((t2 - t3) * 181 + 128) >> 8;
    data[offset + 2 * stride] = ((t6 + t7) * 181 + 128) >> 8;
    data[offset + 5 * stride] = -(((t6 - t7) * 181 + 128) >> 8);
}

fn identity4_1d(data: &mut [i32], offset: usize, stride: usize) {
    for i in 0..4 {
        let v = data[offset + i * stride];
        data[offset + i * stride] = v + ((v * 1697 + 2048) >> 12);
    }
}

fn identity8_1d(data: &mut [i32], offset: usize, stride: usize) {
    for i in 0..8 {
        data[offset + i * stride] *= 2;
    }
}

fn identity16_1d(data: &mut [i32], offset: usize, stride: usize) {
    for i in 0..16 {
        let v = data[offset + i * stride];
        data[offset + i * stride] = 2 * v + ((v * 1697 + 1024) >> 11);
    }
}

fn identity32_1d(data: &mut [i32], offset: usize, stride: usize) {
    for i in 0..32 {
        data[offset + i * stride] *= 4;
    }
}

fn wht4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let a = data[offset];
    let b = data[offset + stride];
    let c = data[offset + 2 * stride];
    let d = data[offset + 3 * stride];

    let e0 = a + b;
    let e1 = a - b;
    let e2 = c + d;
    let e3 = c - d;

    data[offset] = e0 + e2;
    data[offset + stride] = e1 + e3;
    data[offset + 2 * stride] = e0 - e2;
    data[offset + 3 * stride] = e1 - e3;
}

// ---------------------------------------------------------------------
// 2-D drivers.

type Transform1dFn = fn(&mut [i32], usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tx1d {
    Dct,
    Adst,
    Identity,
}

/// (vertical family, horizontal family, flip up-down, flip left-right)
fn tx_axes(tx_type: TxType) -> (Tx1d, Tx1d, bool, bool) {
    match tx_type {
        TxType::DctDct => (Tx1d::Dct, Tx1d::Dct, false, false),
        TxType::AdstDct => (Tx1d::Adst, Tx1d::Dct, false, false),
        TxType::DctAdst => (Tx1d::Dct, Tx1d::Adst, false, false),
        TxType::AdstAdst => (Tx1d::Adst, Tx1d::Adst, false, false),
        TxType::FlipadstDct => (Tx1d::Adst, Tx1d::Dct, true, false),
        TxType::DctFlipadst => (Tx1d::Dct, Tx1d::Adst, false, true),
        TxType::FlipadstFlipadst => (Tx1d::Adst, Tx1d::Adst, true, true),
        TxType::Idtx => (Tx1d::Identity, Tx1d::Identity, false, false),
    }
}

fn fwd_1d(family: Tx1d, len: usize) -> Transform1dFn {
    match (family, len) {
        (Tx1d::Dct, 4) => fwd_dct4_1d,
        (Tx1d::Dct, 8) => fwd_dct8_1d,
        (Tx1d::Dct, 16) => fwd_dct16_1d,
        (Tx1d::Adst, 4) => fwd_adst4_1d,
        (Tx1d::Adst, 8) => fwd_adst8_1d,
        (Tx1d::Identity, 4) => identity4_1d,
        (Tx1d::Identity, 8) => identity8_1d,
        (Tx1d::Identity, 16) => identity16_1d,
        (Tx1d::Identity, 32) => identity32_1d,
        _ => panic!("unsupported forward transform: {family:?} length {len}"),
    }
}

fn inv_1d(family: Tx1d, len: usize) -> Transform1dFn {
    match (family, len) {
        (Tx1d::Dct, 4) => inv_dct4_1d,
        (Tx1d::Dct, 8) => inv_dct8_1d,
        (Tx1d::Dct, 16) => inv_dct16_1d,
        (Tx1d::Adst, 4) => inv_adst4_1d,
        (Tx1d::Adst, 8) => inv_adst8_1d,
        (Tx1d::Identity, 4) => identity4_1d,
        (Tx1d::Identity, 8) => identity8_1d,
        (Tx1d::Identity, 16) => identity16_1d,
        (Tx1d::Identity, 32) => identity32_1d,
        _ => panic!("unsupported inverse transform: {family:?} length {len}"),
    }
}

fn flip_vertical(buf: &mut [i32], w: usize, h: usize) {
    for r in 0..h / 2 {
        for c in 0..w {
            buf.swap(r * w + c, (h - 1 - r) * w + c);
        }
    }
}

fn flip_horizontal(buf: &mut [i32], w: usize, h: usize) {
    for row in buf.chunks_mut(w).take(h) {
        row.reverse();
    }
}

/// Shift applied between the row and column passes; the `*181 >> 8`
/// square-root-of-two correction handles odd log-area rectangles.
fn mid_shift(w: usize, h: usize) -> usize {
    (ilog2(w) + ilog2(h)) / 2 - 2
}

fn needs_sqrt2(w: usize, h: usize) -> bool {
    (ilog2(w) + ilog2(h)) % 2 == 1
}

fn fwd_txfm2d(buf: &mut [i32], w: usize, h: usize, tx_type: TxType) {
    let (vert, horz, flip_ud, flip_lr) = tx_axes(tx_type);
    if flip_ud {
        flip_vertical(buf, w, h);
    }
    if flip_lr {
        flip_horizontal(buf, w, h);
    }

    for v in buf.iter_mut() {
        *v <<= 2;
    }

    let row_fn = fwd_1d(horz, w);
    for r in 0..h {
        row_fn(buf, r * w, 1);
    }

    let s = mid_shift(w, h);
    if s > 0 {
        for v in buf.iter_mut() {
            *v = round_shift(*v, s);
        }
    }

    let col_fn = fwd_1d(vert, h);
    for c in 0..w {
        col_fn(buf, c, w);
    }

    if needs_sqrt2(w, h) {
        for v in buf.iter_mut() {
            *v = (*v * 181 + 128) >> 8;
        }
    }
}

fn inv_txfm2d(buf: &mut [i32], w: usize, h: usize, tx_type: TxType) {
    let (vert, horz, flip_ud, flip_lr) = tx_axes(tx_type);

    let row_fn = inv_1d(horz, w);
    for r in 0..h {
        row_fn(buf, r * w, 1);
    }

    let s = mid_shift(w, h);
    if s > 0 {
        for v in buf.iter_mut() {
            *v = round_shift(*v, s);
        }
    }

    let col_fn = inv_1d(vert, h);
    for c in 0..w {
        col_fn(buf, c, w);
    }

    if needs_sqrt2(w, h) {
        for v in buf.iter_mut() {
            *v = (*v * 181 + 128) >> 8;
        }
    }

    for v in buf.iter_mut() {
        *v = round_shift(*v, 4);
    }

    if flip_ud {
        flip_vertical(buf, w, h);
    }
    if flip_lr {
        flip_horizontal(buf, w, h);
    }
}

fn fwd_wht4x4(buf: &mut [i32; 16]) {
    for r in 0..4 {
        wht4_1d(buf, r * 4, 1);
    }
    for c in 0..4 {
        wht4_1d(buf, c, 4);
    }
}

fn inv_wht4x4(buf: &mut [i32; 16]) {
    for r in 0..4 {
        wht4_1d(buf, r * 4, 1);
    }
    for c in 0..4 {
        wht4_1d(buf, c, 4);
    }
    for v in buf.iter_mut() {
        *v = round_shift(*v, 4);
    }
}

/// Reference kernel set: integer DCT/ADST/identity for the sizes the
/// pipeline exercises, exact Walsh-Hadamard 4x4 for lossless.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceKernels;

impl TxfmKernel for ReferenceKernels {
    fn forward(&self, residual: &[i32], diff_stride: usize, coeff: &mut [i32], param: &TxfmParam) {
        let w = param.tx_size.width();
        let h = param.tx_size.height();

        if param.lossless {
            assert_eq!(param.tx_size, TxSize::Tx4x4, "lossless transforms are 4x4");
            let mut buf = [0i32; 16];
            for r in 0..4 {
                for c in 0..4 {
                    buf[r * 4 + c] = residual[r * diff_stride + c];
                }
            }
            fwd_wht4x4(&mut buf);
            coeff[..16].copy_from_slice(&buf);
            return;
        }

        let mut buf = vec![0i32; w * h];
        for r in 0..h {
            for c in 0..w {
                buf[r * w + c] = residual[r * diff_stride + c];
            }
        }
        fwd_txfm2d(&mut buf, w, h, param.tx_type);
        coeff[..w * h].copy_from_slice(&buf);
    }

    fn inverse_add(
        &self,
        dqcoeff: &[i32],
        dst: &mut PlaneBuf,
        x0: usize,
        y0: usize,
        param: &TxfmParam,
    ) {
        let w = param.tx_size.width();
        let h = param.tx_size.height();

        let residual = if param.lossless {
            assert_eq!(param.tx_size, TxSize::Tx4x4, "lossless transforms are 4x4");
            let mut buf = [0i32; 16];
            buf.copy_from_slice(&dqcoeff[..16]);
            inv_wht4x4(&mut buf);
            buf.to_vec()
        } else {
            let mut buf = dqcoeff[..w * h].to_vec();
            inv_txfm2d(&mut buf, w, h, param.tx_type);
            buf
        };

        add_residual(&residual, dst, x0, y0, w, h, param.bit_depth.max_value());
    }
}

fn add_residual(
    residual: &[i32],
    dst: &mut PlaneBuf,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    max: i32,
) {
    for r in 0..h {
        for c in 0..w {
            let x = x0 + c;
            let y = y0 + r;
            if x < dst.width && y < dst.height {
                let v = dst.get(x, y) as i32 + residual[r * w + c];
                dst.set(x, y, v.clamp(0, max) as u16);
            }
        }
    }
}
