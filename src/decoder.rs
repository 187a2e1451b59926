use log::debug;

use crate::{
    bits::{PackedBits, Word},
    ephemeris::Ephemeris,
    space_node::{IonoUtc, SpaceNode},
    telemetry::{RawEphemeris, RawIonoUtc, Subframe},
    time::GpsTime,
};

const GPS_SV_COUNT: usize = 32;

/// Raw ephemeris being accumulated across subframes 1 to 3.
#[derive(Debug, Default, Copy, Clone)]
struct PendingEphemeris {
    raw: RawEphemeris,
    have_subframe1: bool,
    /// IODE of the last subframe 2/3, negative while unseen
    iode_subframe2: i32,
    iode_subframe3: i32,
}

impl PendingEphemeris {
    fn new(svid: u8) -> Self {
        Self {
            raw: RawEphemeris {
                svid,
                ..Default::default()
            },
            have_subframe1: false,
            iode_subframe2: -1,
            iode_subframe3: -1,
        }
    }

    /// A record is complete once subframes 1/2/3 of the same data issue
    /// have all been seen.
    fn is_consistent(&self) -> bool {
        self.have_subframe1
            && self.iode_subframe2 >= 0
            && self.iode_subframe3 >= 0
            && self.iode_subframe2 == self.iode_subframe3
            && (self.raw.iodc & 0xFF) as i32 == self.iode_subframe3
    }

    fn invalidate(&mut self) {
        self.have_subframe1 = false;
        self.iode_subframe2 = -1;
        self.iode_subframe3 = -1;
    }
}

/// Accumulates broadcast subframes into a [SpaceNode].
///
/// Subframes may arrive in any order and with gaps; an ephemeris is only
/// committed once its three subframes carry matching issue-of-data tags.
/// Buffers are trusted as-is: preamble and parity checks are the host's
/// business.
#[derive(Debug)]
pub struct Decoder {
    pending: [PendingEphemeris; GPS_SV_COUNT],
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            pending: std::array::from_fn(|index| PendingEphemeris::new(index as u8 + 1)),
        }
    }

    /// Feeds one 300-bit subframe of satellite `sv_number` received at
    /// `time_of_reception`. Returns true when the space node gained a
    /// complete ephemeris or fresh ionosphere/UTC parameters.
    ///
    /// A negative reception week is replaced by an estimate from the
    /// system clock; it only compensates the truncated broadcast week
    /// fields, so the estimate is allowed to be coarse.
    pub fn ingest<W: Word>(
        &mut self,
        space: &mut SpaceNode,
        sv_number: u8,
        bits: PackedBits<W>,
        time_of_reception: &GpsTime,
    ) -> bool {
        let week_number = if time_of_reception.week < 0 {
            GpsTime::now().week
        } else {
            time_of_reception.week
        };

        let frame = Subframe::new(bits);
        let subframe_id = frame.subframe_id();

        if (1..=3).contains(&subframe_id) {
            if sv_number < 1 || sv_number as usize > GPS_SV_COUNT {
                return false;
            }
            let pending = &mut self.pending[sv_number as usize - 1];

            match subframe_id {
                1 => {
                    pending.raw.update_subframe1(&frame.subframe1());
                    pending.have_subframe1 = true;
                }
                2 => {
                    pending.iode_subframe2 =
                        pending.raw.update_subframe2(&frame.subframe2()) as i32;
                }
                _ => {
                    pending.iode_subframe3 =
                        pending.raw.update_subframe3(&frame.subframe3()) as i32;
                }
            }

            if pending.is_consistent() {
                // The broadcast week is truncated to 10 bits.
                let mut ephemeris = Ephemeris::from(&pending.raw);
                ephemeris.wn =
                    ((week_number - week_number % 0x400) + (pending.raw.wn as i32 % 0x400)) as u16;
                pending.invalidate();

                debug!(
                    "G{:02}: new ephemeris, iode {} toe {}",
                    ephemeris.svid, ephemeris.iode, ephemeris.t_oe,
                );
                space
                    .satellite_mut(ephemeris.svid)
                    .register_ephemeris(ephemeris, 1);
                return true;
            }
        } else if subframe_id == 4 && frame.sv_page_id() == 56 {
            let raw = RawIonoUtc::decode(&frame.iono_utc_page());
            let mut iono_utc = IonoUtc::from(&raw);

            // The broadcast week references are truncated to 8 bits.
            let week_number_base = (week_number - week_number % 0x100) as u32;
            iono_utc.wn_t = week_number_base + iono_utc.wn_t % 0x100;
            iono_utc.wn_lsf = week_number_base + iono_utc.wn_lsf % 0x100;

            debug!("new ionosphere/UTC parameters");
            space.update_iono_utc(iono_utc, true, true);
            return true;
        }

        false
    }

    /// Commits an already assembled ephemeris, as delivered by receiver
    /// side channels (u-blox RXM-EPH and friends).
    pub fn ingest_ephemeris(&self, space: &mut SpaceNode, ephemeris: Ephemeris) {
        space
            .satellite_mut(ephemeris.svid)
            .register_ephemeris(ephemeris, 1);
    }
}
