//! GPS LNAV subframe field map (IS-GPS-200, 300 bits per subframe).
//!
//! Offsets are counted in effective bits from the subframe start and
//! include the parity bits of each 30-bit word; multi-word parameters
//! are assembled from two non-contiguous ranges, MSB part first.

use crate::bits::{PackedBits, Word};

/// One 300-bit subframe, addressed through a [PackedBits] layout.
#[derive(Copy, Clone)]
pub struct Subframe<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<'a, W: Word> Subframe<'a, W> {
    pub fn new(bits: PackedBits<'a, W>) -> Self {
        Self { bits }
    }

    pub fn preamble(&self) -> u8 {
        self.bits.unsigned(0, 8) as u8
    }

    /// The full 24-bit hand-over word.
    pub fn how(&self) -> u32 {
        self.bits.unsigned(30, 24)
    }

    pub fn subframe_id(&self) -> u8 {
        self.bits.unsigned(49, 3) as u8
    }

    /// SV/page identifier of subframes 4 and 5.
    pub fn sv_page_id(&self) -> u8 {
        self.bits.unsigned(62, 6) as u8
    }

    pub fn subframe1(&self) -> Subframe1<'a, W> {
        Subframe1 { bits: self.bits }
    }

    pub fn subframe2(&self) -> Subframe2<'a, W> {
        Subframe2 { bits: self.bits }
    }

    pub fn subframe3(&self) -> Subframe3<'a, W> {
        Subframe3 { bits: self.bits }
    }

    pub fn almanac_page(&self) -> AlmanacPage<'a, W> {
        AlmanacPage { bits: self.bits }
    }

    pub fn iono_utc_page(&self) -> IonoUtcPage<'a, W> {
        IonoUtcPage { bits: self.bits }
    }
}

/// Clock parameters (subframe 1).
#[derive(Copy, Clone)]
pub struct Subframe1<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<W: Word> Subframe1<'_, W> {
    pub fn wn(&self) -> u16 {
        self.bits.unsigned(60, 10) as u16
    }

    pub fn ura(&self) -> u8 {
        self.bits.unsigned(72, 4) as u8
    }

    pub fn sv_health(&self) -> u8 {
        self.bits.unsigned(76, 6) as u8
    }

    pub fn iodc(&self) -> u16 {
        self.bits.unsigned2(82, 2, 210, 8) as u16
    }

    pub fn t_gd(&self) -> i8 {
        self.bits.signed(196, 8) as i8
    }

    pub fn t_oc(&self) -> u16 {
        self.bits.unsigned(218, 16) as u16
    }

    pub fn a_f2(&self) -> i8 {
        self.bits.signed(240, 8) as i8
    }

    pub fn a_f1(&self) -> i16 {
        self.bits.signed(248, 16) as i16
    }

    pub fn a_f0(&self) -> i32 {
        self.bits.signed(270, 22)
    }
}

/// Ephemeris, first half (subframe 2).
#[derive(Copy, Clone)]
pub struct Subframe2<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<W: Word> Subframe2<'_, W> {
    pub fn iode(&self) -> u8 {
        self.bits.unsigned(60, 8) as u8
    }

    pub fn c_rs(&self) -> i16 {
        self.bits.signed(68, 16) as i16
    }

    pub fn delta_n(&self) -> i16 {
        self.bits.signed(90, 16) as i16
    }

    pub fn m0(&self) -> i32 {
        self.bits.signed2(106, 8, 120, 24)
    }

    pub fn c_uc(&self) -> i16 {
        self.bits.signed(150, 16) as i16
    }

    pub fn e(&self) -> u32 {
        self.bits.unsigned2(166, 8, 180, 24)
    }

    pub fn c_us(&self) -> i16 {
        self.bits.signed(210, 16) as i16
    }

    pub fn sqrt_a(&self) -> u32 {
        self.bits.unsigned2(226, 8, 240, 24)
    }

    pub fn t_oe(&self) -> u16 {
        self.bits.unsigned(270, 16) as u16
    }

    pub fn fit_interval_flag(&self) -> bool {
        self.bits.unsigned(286, 1) == 1
    }
}

/// Ephemeris, second half (subframe 3).
#[derive(Copy, Clone)]
pub struct Subframe3<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<W: Word> Subframe3<'_, W> {
    pub fn c_ic(&self) -> i16 {
        self.bits.signed(60, 16) as i16
    }

    pub fn omega0(&self) -> i32 {
        self.bits.signed2(76, 8, 90, 24)
    }

    pub fn c_is(&self) -> i16 {
        self.bits.signed(120, 16) as i16
    }

    pub fn i0(&self) -> i32 {
        self.bits.signed2(136, 8, 150, 24)
    }

    pub fn c_rc(&self) -> i16 {
        self.bits.signed(180, 16) as i16
    }

    pub fn omega(&self) -> i32 {
        self.bits.signed2(196, 8, 210, 24)
    }

    pub fn dot_omega0(&self) -> i32 {
        self.bits.signed(240, 24)
    }

    pub fn iode(&self) -> u8 {
        self.bits.unsigned(270, 8) as u8
    }

    pub fn dot_i0(&self) -> i16 {
        self.bits.signed(278, 14) as i16
    }
}

/// Almanac data pages of subframes 4 and 5.
#[derive(Copy, Clone)]
pub struct AlmanacPage<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<W: Word> AlmanacPage<'_, W> {
    pub fn e(&self) -> u16 {
        self.bits.unsigned(68, 16) as u16
    }

    pub fn t_oa(&self) -> u8 {
        self.bits.unsigned(90, 8) as u8
    }

    pub fn delta_i(&self) -> i16 {
        self.bits.signed(98, 16) as i16
    }

    pub fn dot_omega0(&self) -> i16 {
        self.bits.signed(120, 16) as i16
    }

    pub fn sv_health(&self) -> u8 {
        self.bits.unsigned(128, 8) as u8
    }

    pub fn sqrt_a(&self) -> u32 {
        self.bits.unsigned(150, 24)
    }

    pub fn omega0(&self) -> i32 {
        self.bits.signed(180, 24)
    }

    pub fn omega(&self) -> i32 {
        self.bits.signed(210, 24)
    }

    pub fn m0(&self) -> i32 {
        self.bits.signed(240, 24)
    }

    pub fn a_f0(&self) -> i16 {
        self.bits.signed2(270, 8, 289, 3) as i16
    }

    pub fn a_f1(&self) -> i16 {
        self.bits.signed(278, 11) as i16
    }
}

/// Ionosphere and UTC parameters (subframe 4, page 18).
#[derive(Copy, Clone)]
pub struct IonoUtcPage<'a, W: Word> {
    bits: PackedBits<'a, W>,
}

impl<W: Word> IonoUtcPage<'_, W> {
    pub fn alpha0(&self) -> i8 {
        self.bits.signed(68, 8) as i8
    }

    pub fn alpha1(&self) -> i8 {
        self.bits.signed(76, 8) as i8
    }

    pub fn alpha2(&self) -> i8 {
        self.bits.signed(90, 8) as i8
    }

    pub fn alpha3(&self) -> i8 {
        self.bits.signed(98, 8) as i8
    }

    pub fn beta0(&self) -> i8 {
        self.bits.signed(106, 8) as i8
    }

    pub fn beta1(&self) -> i8 {
        self.bits.signed(120, 8) as i8
    }

    pub fn beta2(&self) -> i8 {
        self.bits.signed(128, 8) as i8
    }

    pub fn beta3(&self) -> i8 {
        self.bits.signed(136, 8) as i8
    }

    pub fn a1(&self) -> i32 {
        self.bits.signed(150, 24)
    }

    pub fn a0(&self) -> i32 {
        self.bits.signed2(180, 24, 210, 8)
    }

    pub fn t_ot(&self) -> u8 {
        self.bits.unsigned(218, 8) as u8
    }

    pub fn wn_t(&self) -> u8 {
        self.bits.unsigned(226, 8) as u8
    }

    pub fn delta_t_ls(&self) -> i8 {
        self.bits.signed(240, 8) as i8
    }

    pub fn wn_lsf(&self) -> u8 {
        self.bits.unsigned(248, 8) as u8
    }

    pub fn dn(&self) -> u8 {
        self.bits.unsigned(256, 8) as u8
    }

    pub fn delta_t_lsf(&self) -> i8 {
        self.bits.signed(270, 8) as i8
    }
}

/// Unscaled GPS ephemeris, filled across subframes 1 to 3.
///
/// Each scaled field carries its ICD scale exponent in the accessors of
/// [crate::prelude::Ephemeris]; here everything is kept as the broadcast
/// integer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RawEphemeris {
    pub svid: u8,

    // Subframe 1
    pub wn: u16,
    pub ura: u8,
    pub sv_health: u8,
    pub iodc: u16,
    pub t_gd: i8,
    pub t_oc: u16,
    pub a_f2: i8,
    pub a_f1: i16,
    pub a_f0: i32,

    // Subframe 2
    pub iode: u8,
    pub c_rs: i16,
    pub delta_n: i16,
    pub m0: i32,
    pub c_uc: i16,
    pub e: u32,
    pub c_us: i16,
    pub sqrt_a: u32,
    pub t_oe: u16,
    pub fit_interval_flag: bool,

    // Subframe 3
    pub c_ic: i16,
    pub omega0: i32,
    pub c_is: i16,
    pub i0: i32,
    pub c_rc: i16,
    pub omega: i32,
    pub dot_omega0: i32,
    pub dot_i0: i16,
}

impl RawEphemeris {
    /// Copies subframe 1 fields in; returns the 10-bit IODC for the
    /// subframe correlation check.
    pub fn update_subframe1<W: Word>(&mut self, sf: &Subframe1<W>) -> u16 {
        self.wn = sf.wn();
        self.ura = sf.ura();
        self.sv_health = sf.sv_health();
        self.iodc = sf.iodc();
        self.t_gd = sf.t_gd();
        self.t_oc = sf.t_oc();
        self.a_f2 = sf.a_f2();
        self.a_f1 = sf.a_f1();
        self.a_f0 = sf.a_f0();
        self.iodc
    }

    /// Copies subframe 2 fields in; returns its IODE.
    pub fn update_subframe2<W: Word>(&mut self, sf: &Subframe2<W>) -> u8 {
        self.iode = sf.iode();
        self.c_rs = sf.c_rs();
        self.delta_n = sf.delta_n();
        self.m0 = sf.m0();
        self.c_uc = sf.c_uc();
        self.e = sf.e();
        self.c_us = sf.c_us();
        self.sqrt_a = sf.sqrt_a();
        self.t_oe = sf.t_oe();
        self.fit_interval_flag = sf.fit_interval_flag();
        self.iode
    }

    /// Copies subframe 3 fields in; returns its IODE.
    pub fn update_subframe3<W: Word>(&mut self, sf: &Subframe3<W>) -> u8 {
        self.c_ic = sf.c_ic();
        self.omega0 = sf.omega0();
        self.c_is = sf.c_is();
        self.i0 = sf.i0();
        self.c_rc = sf.c_rc();
        self.omega = sf.omega();
        self.dot_omega0 = sf.dot_omega0();
        self.dot_i0 = sf.dot_i0();
        sf.iode()
    }
}

/// Unscaled ionosphere/UTC parameters (subframe 4 page 18).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RawIonoUtc {
    pub alpha: [i8; 4],
    pub beta: [i8; 4],
    pub a1: i32,
    pub a0: i32,
    pub t_ot: u8,
    pub wn_t: u8,
    pub delta_t_ls: i8,
    pub wn_lsf: u8,
    pub dn: u8,
    pub delta_t_lsf: i8,
}

impl RawIonoUtc {
    pub fn decode<W: Word>(page: &IonoUtcPage<W>) -> Self {
        Self {
            alpha: [page.alpha0(), page.alpha1(), page.alpha2(), page.alpha3()],
            beta: [page.beta0(), page.beta1(), page.beta2(), page.beta3()],
            a1: page.a1(),
            a0: page.a0(),
            t_ot: page.t_ot(),
            wn_t: page.wn_t(),
            delta_t_ls: page.delta_t_ls(),
            wn_lsf: page.wn_lsf(),
            dn: page.dn(),
            delta_t_lsf: page.delta_t_lsf(),
        }
    }
}

/// Unscaled almanac entry (subframes 4/5, data pages).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RawAlmanac {
    pub svid: u8,
    pub e: u16,
    pub t_oa: u8,
    pub delta_i: i16,
    pub dot_omega0: i16,
    pub sv_health: u8,
    pub sqrt_a: u32,
    pub omega0: i32,
    pub omega: i32,
    pub m0: i32,
    pub a_f0: i16,
    pub a_f1: i16,
}

impl RawAlmanac {
    pub fn decode<W: Word>(svid: u8, page: &AlmanacPage<W>) -> Self {
        Self {
            svid,
            e: page.e(),
            t_oa: page.t_oa(),
            delta_i: page.delta_i(),
            dot_omega0: page.dot_omega0(),
            sv_health: page.sv_health(),
            sqrt_a: page.sqrt_a(),
            omega0: page.omega0(),
            omega: page.omega(),
            m0: page.m0(),
            a_f0: page.a_f0(),
            a_f1: page.a_f1(),
        }
    }
}
