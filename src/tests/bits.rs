//! Randomized pack/extract round trips over every supported word layout,
//! checked against a per-bit reference for each GPS subframe field.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    bits::{PackedBits, Word},
    telemetry::Subframe,
};

const FRAME_BITS: usize = 300;

pub(crate) fn pack_u8(bits: &[bool], effective: u32, padding_msb: i32) -> Vec<u8> {
    let words = bits.len().div_ceil(effective as usize);
    let mut buf = vec![0u8; words];
    for (k, bit) in bits.iter().enumerate() {
        if !bit {
            continue;
        }
        let word = k / effective as usize;
        let position = padding_msb + (k % effective as usize) as i32;
        if (0..8).contains(&position) {
            buf[word] |= 1u8 << (7 - position as u32);
        }
    }
    buf
}

fn pack_u32(bits: &[bool], effective: u32, padding_msb: i32) -> Vec<u32> {
    let words = bits.len().div_ceil(effective as usize);
    let mut buf = vec![0u32; words];
    for (k, bit) in bits.iter().enumerate() {
        if !bit {
            continue;
        }
        let word = k / effective as usize;
        let position = padding_msb + (k % effective as usize) as i32;
        if (0..32).contains(&position) {
            buf[word] |= 1u32 << (31 - position as u32);
        }
    }
    buf
}

fn reference_unsigned(bits: &[bool], offset: usize, length: usize) -> u32 {
    bits[offset..offset + length]
        .iter()
        .fold(0u32, |acc, bit| (acc << 1) | *bit as u32)
}

fn reference_signed(bits: &[bool], offset: usize, length: usize) -> i32 {
    let value = reference_unsigned(bits, offset, length);
    ((value << (32 - length)) as i32) >> (32 - length)
}

fn reference_unsigned2(bits: &[bool], o1: usize, l1: usize, o2: usize, l2: usize) -> u32 {
    (reference_unsigned(bits, o1, l1) << l2) | reference_unsigned(bits, o2, l2)
}

fn reference_signed2(bits: &[bool], o1: usize, l1: usize, o2: usize, l2: usize) -> i32 {
    let length = l1 + l2;
    ((reference_unsigned2(bits, o1, l1, o2, l2) << (32 - length)) as i32) >> (32 - length)
}

fn check_subframe<W: Word>(frame: &Subframe<W>, b: &[bool]) {
    assert_eq!(frame.preamble() as u32, reference_unsigned(b, 0, 8));
    assert_eq!(frame.how(), reference_unsigned(b, 30, 24));
    assert_eq!(frame.subframe_id() as u32, reference_unsigned(b, 49, 3));
    assert_eq!(frame.sv_page_id() as u32, reference_unsigned(b, 62, 6));

    let sf1 = frame.subframe1();
    assert_eq!(sf1.wn() as u32, reference_unsigned(b, 60, 10));
    assert_eq!(sf1.ura() as u32, reference_unsigned(b, 72, 4));
    assert_eq!(sf1.sv_health() as u32, reference_unsigned(b, 76, 6));
    assert_eq!(sf1.iodc() as u32, reference_unsigned2(b, 82, 2, 210, 8));
    assert_eq!(sf1.t_gd() as i32, reference_signed(b, 196, 8));
    assert_eq!(sf1.t_oc() as u32, reference_unsigned(b, 218, 16));
    assert_eq!(sf1.a_f2() as i32, reference_signed(b, 240, 8));
    assert_eq!(sf1.a_f1() as i32, reference_signed(b, 248, 16));
    assert_eq!(sf1.a_f0(), reference_signed(b, 270, 22));

    let sf2 = frame.subframe2();
    assert_eq!(sf2.iode() as u32, reference_unsigned(b, 60, 8));
    assert_eq!(sf2.c_rs() as i32, reference_signed(b, 68, 16));
    assert_eq!(sf2.delta_n() as i32, reference_signed(b, 90, 16));
    assert_eq!(sf2.m0(), reference_signed2(b, 106, 8, 120, 24));
    assert_eq!(sf2.c_uc() as i32, reference_signed(b, 150, 16));
    assert_eq!(sf2.e(), reference_unsigned2(b, 166, 8, 180, 24));
    assert_eq!(sf2.c_us() as i32, reference_signed(b, 210, 16));
    assert_eq!(sf2.sqrt_a(), reference_unsigned2(b, 226, 8, 240, 24));
    assert_eq!(sf2.t_oe() as u32, reference_unsigned(b, 270, 16));
    assert_eq!(sf2.fit_interval_flag() as u32, reference_unsigned(b, 286, 1));

    let sf3 = frame.subframe3();
    assert_eq!(sf3.c_ic() as i32, reference_signed(b, 60, 16));
    assert_eq!(sf3.omega0(), reference_signed2(b, 76, 8, 90, 24));
    assert_eq!(sf3.c_is() as i32, reference_signed(b, 120, 16));
    assert_eq!(sf3.i0(), reference_signed2(b, 136, 8, 150, 24));
    assert_eq!(sf3.c_rc() as i32, reference_signed(b, 180, 16));
    assert_eq!(sf3.omega(), reference_signed2(b, 196, 8, 210, 24));
    assert_eq!(sf3.dot_omega0(), reference_signed(b, 240, 24));
    assert_eq!(sf3.iode() as u32, reference_unsigned(b, 270, 8));
    assert_eq!(sf3.dot_i0() as i32, reference_signed(b, 278, 14));

    let almanac = frame.almanac_page();
    assert_eq!(almanac.e() as u32, reference_unsigned(b, 68, 16));
    assert_eq!(almanac.t_oa() as u32, reference_unsigned(b, 90, 8));
    assert_eq!(almanac.delta_i() as i32, reference_signed(b, 98, 16));
    assert_eq!(almanac.dot_omega0() as i32, reference_signed(b, 120, 16));
    assert_eq!(almanac.sv_health() as u32, reference_unsigned(b, 128, 8));
    assert_eq!(almanac.sqrt_a(), reference_unsigned(b, 150, 24));
    assert_eq!(almanac.omega0(), reference_signed(b, 180, 24));
    assert_eq!(almanac.omega(), reference_signed(b, 210, 24));
    assert_eq!(almanac.m0(), reference_signed(b, 240, 24));
    assert_eq!(almanac.a_f0() as i32, reference_signed2(b, 270, 8, 289, 3));
    assert_eq!(almanac.a_f1() as i32, reference_signed(b, 278, 11));

    let page18 = frame.iono_utc_page();
    assert_eq!(page18.alpha0() as i32, reference_signed(b, 68, 8));
    assert_eq!(page18.alpha1() as i32, reference_signed(b, 76, 8));
    assert_eq!(page18.alpha2() as i32, reference_signed(b, 90, 8));
    assert_eq!(page18.alpha3() as i32, reference_signed(b, 98, 8));
    assert_eq!(page18.beta0() as i32, reference_signed(b, 106, 8));
    assert_eq!(page18.beta1() as i32, reference_signed(b, 120, 8));
    assert_eq!(page18.beta2() as i32, reference_signed(b, 128, 8));
    assert_eq!(page18.beta3() as i32, reference_signed(b, 136, 8));
    assert_eq!(page18.a1(), reference_signed(b, 150, 24));
    assert_eq!(page18.a0(), reference_signed2(b, 180, 24, 210, 8));
    assert_eq!(page18.t_ot() as u32, reference_unsigned(b, 218, 8));
    assert_eq!(page18.wn_t() as u32, reference_unsigned(b, 226, 8));
    assert_eq!(page18.delta_t_ls() as i32, reference_signed(b, 240, 8));
    assert_eq!(page18.wn_lsf() as u32, reference_unsigned(b, 248, 8));
    assert_eq!(page18.dn() as u32, reference_unsigned(b, 256, 8));
    assert_eq!(page18.delta_t_lsf() as i32, reference_signed(b, 270, 8));
}

#[test]
fn packed_layouts_round_trip() {
    let mut rng = SmallRng::seed_from_u64(0);

    // (effective bits, MSB padding) per storage width; the last u32
    // entry is the u-blox RXM-EPH layout whose trailing 6 payload bits
    // per word do not exist (the parity area, never addressed by the
    // field map).
    const U8_LAYOUTS: [(u32, i32); 4] = [(8, 0), (6, 2), (6, 0), (4, 2)];
    const U32_LAYOUTS: [(u32, i32); 5] = [(32, 0), (30, 2), (30, 0), (28, 2), (30, 8)];

    for _ in 0..64 {
        let bits: Vec<bool> = (0..FRAME_BITS).map(|_| rng.random()).collect();

        for (effective, padding_msb) in U8_LAYOUTS {
            let buf = pack_u8(&bits, effective, padding_msb);
            let packed = PackedBits::with_layout(&buf, effective, padding_msb);
            check_subframe(&Subframe::new(packed), &bits);
        }

        for (effective, padding_msb) in U32_LAYOUTS {
            let buf = pack_u32(&bits, effective, padding_msb);
            let packed = PackedBits::with_layout(&buf, effective, padding_msb);
            check_subframe(&Subframe::new(packed), &bits);
        }
    }
}
