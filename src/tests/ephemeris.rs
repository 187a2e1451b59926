use rand::{rngs::SmallRng, Rng, SeedableRng};
use rstest::*;

use crate::{
    ephemeris::{
        history::{EphemerisHistory, IterMode},
        scale, Ephemeris,
    },
    space_node::{IonoUtc, SpaceNode},
    tests::ephemeris_fixture,
    time::GpsTime,
};

#[test]
fn scale_round_trip() {
    let mut rng = SmallRng::seed_from_u64(7);

    for _ in 0..256 {
        let eph = Ephemeris {
            svid: 1,
            wn: 2048,
            ura: 1,
            sv_health: 0,
            iodc: 100,
            iode: 100,
            t_gd: rng.random_range(-100i32..100) as f64 * scale::T_GD,
            t_oc: rng.random_range(0u32..37800) as f64 * scale::T_OC,
            a_f0: rng.random_range(-2E5..2E5) * scale::A_F0,
            a_f1: rng.random_range(-3E4..3E4) * scale::A_F1,
            a_f2: rng.random_range(-100.0..100.0) * scale::A_F2,
            c_rs: rng.random_range(-3E4..3E4) * scale::C_RS,
            delta_n: rng.random_range(-3E4..3E4) * scale::DELTA_N,
            m0: rng.random_range(-2E9..2E9) * scale::M0,
            c_uc: rng.random_range(-3E4..3E4) * scale::C_UC,
            e: rng.random_range(0.0..4E9) * scale::E,
            c_us: rng.random_range(-3E4..3E4) * scale::C_US,
            sqrt_a: rng.random_range(0.0..4E9) * scale::SQRT_A,
            t_oe: rng.random_range(0u32..37800) as f64 * scale::T_OE,
            fit_interval: 4.0 * 60.0 * 60.0,
            c_ic: rng.random_range(-3E4..3E4) * scale::C_IC,
            omega0: rng.random_range(-2E9..2E9) * scale::OMEGA0,
            c_is: rng.random_range(-3E4..3E4) * scale::C_IS,
            i0: rng.random_range(-2E9..2E9) * scale::I0,
            c_rc: rng.random_range(-3E4..3E4) * scale::C_RC,
            omega: rng.random_range(-2E9..2E9) * scale::OMEGA,
            dot_omega0: rng.random_range(-8E6..8E6) * scale::DOT_OMEGA0,
            dot_i0: rng.random_range(-8E3..8E3) * scale::DOT_I0,
        };

        let back = Ephemeris::from(&eph.to_raw());

        macro_rules! check {
            ($field:ident, $scale:path) => {
                assert!(
                    (eph.$field - back.$field).abs() <= $scale,
                    concat!(stringify!($field), " drifted by more than one step"),
                );
            };
        }

        check!(t_gd, scale::T_GD);
        check!(t_oc, scale::T_OC);
        check!(a_f0, scale::A_F0);
        check!(a_f1, scale::A_F1);
        check!(a_f2, scale::A_F2);
        check!(c_rs, scale::C_RS);
        check!(delta_n, scale::DELTA_N);
        check!(m0, scale::M0);
        check!(c_uc, scale::C_UC);
        check!(e, scale::E);
        check!(c_us, scale::C_US);
        check!(sqrt_a, scale::SQRT_A);
        check!(t_oe, scale::T_OE);
        check!(c_ic, scale::C_IC);
        check!(omega0, scale::OMEGA0);
        check!(c_is, scale::C_IS);
        check!(i0, scale::I0);
        check!(c_rc, scale::C_RC);
        check!(omega, scale::OMEGA);
        check!(dot_omega0, scale::DOT_OMEGA0);
        check!(dot_i0, scale::DOT_I0);

        assert!(eph.is_equivalent(&back));
    }
}

#[rstest]
#[case(false, 123, 4.0)]
#[case(true, 240, 8.0)]
#[case(true, 247, 8.0)]
#[case(true, 250, 14.0)]
#[case(true, 496, 14.0)]
#[case(true, 500, 26.0)]
#[case(true, 507, 50.0)]
#[case(true, 511, 74.0)]
#[case(true, 754, 74.0)]
#[case(true, 760, 98.0)]
#[case(true, 765, 122.0)]
#[case(true, 1009, 122.0)]
#[case(true, 1015, 146.0)]
#[case(true, 100, 6.0)]
fn fit_intervals(#[case] flag: bool, #[case] iodc: u16, #[case] hours: f64) {
    assert_eq!(Ephemeris::fit_interval_s(flag, iodc), hours * 3600.0);
}

#[test]
fn validity_window() {
    let eph = ephemeris_fixture();
    let t_oc = GpsTime::new(eph.wn as i32, eph.t_oc);

    assert!(eph.is_valid(&t_oc));
    assert!(eph.is_valid(&(t_oc + eph.fit_interval / 2.0)));
    assert!(!eph.is_valid(&(t_oc + (eph.fit_interval / 2.0 + 1.0))));
    assert!(!eph.is_valid(&(t_oc - (eph.fit_interval / 2.0 + 1.0))));

    // the placeholder record is valid nowhere
    assert!(!Ephemeris::default().is_valid(&t_oc));
}

#[test]
fn ura_mapping() {
    assert_eq!(Ephemeris::ura_meters(-1), -1.0);
    assert_eq!(Ephemeris::ura_meters(0), 2.40);
    assert_eq!(Ephemeris::ura_meters(14), 6144.00);
    assert_eq!(Ephemeris::ura_meters(15), 12288.00);

    assert_eq!(Ephemeris::ura_index(-5.0), -1);
    assert_eq!(Ephemeris::ura_index(2.0), 0);
    assert_eq!(Ephemeris::ura_index(2.40), 0);
    assert_eq!(Ephemeris::ura_index(3.0), 1);
    assert_eq!(Ephemeris::ura_index(7000.0), 15);
}

fn fixture_at(t_oc: f64, delta_n_steps: i32) -> Ephemeris {
    let mut eph = ephemeris_fixture();
    eph.t_oc = t_oc;
    eph.t_oe = t_oc;
    // one scale step apart per count: different broadcast content
    eph.delta_n += delta_n_steps as f64 * 2.0 * scale::DELTA_N;
    eph
}

#[test]
fn history_orders_by_time_then_priority() {
    let mut history = EphemerisHistory::new();

    history.add(fixture_at(72000.0, 0), 1);
    history.add(fixture_at(7200.0, 0), 1);
    history.add(fixture_at(43200.0, 0), 1);
    history.add(fixture_at(43200.0, 1), 2);
    history.add(fixture_at(43200.0, 2), 1);

    let entries = history.entries();
    for pair in entries[1..].windows(2) {
        assert!(pair[0].t_tag <= pair[1].t_tag, "time tags out of order");
        if pair[0].t_tag == pair[1].t_tag {
            assert!(pair[0].priority >= pair[1].priority, "priorities out of order");
        }
    }
}

#[test]
fn history_priority_wins_within_time_tag() {
    // two different records at the same reference time, priorities 1
    // then 2: iteration must yield the priority-2 one first
    let mut history = EphemerisHistory::new();
    let low = fixture_at(43200.0, 0);
    let high = fixture_at(43200.0, 1);
    history.add(low, 1);
    history.add(high, 2);

    let first = history.iter(IterMode::All).next().unwrap();
    assert_eq!(first.priority, 2);
    assert!(first.ephemeris.is_equivalent(&high));

    let inverted: Vec<_> = history.iter(IterMode::AllInverted).collect();
    assert_eq!(inverted[0].priority, 1);
    assert!(inverted[0].ephemeris.is_equivalent(&low));

    let unique: Vec<_> = history.iter(IterMode::NoRedundant).collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].priority, 2);
}

#[test]
fn history_accumulates_priority_of_equivalent_records() {
    let mut history = EphemerisHistory::new();
    let eph = fixture_at(43200.0, 0);
    history.add(eph, 1);
    history.add(eph, 1);
    history.add(eph, 1);

    assert_eq!(history.len(), 1);
    assert_eq!(history.iter(IterMode::All).next().unwrap().priority, 3);
}

#[test]
fn history_selection_follows_entries() {
    let mut history = EphemerisHistory::new();
    let early = fixture_at(7200.0, 0);
    let late = fixture_at(72000.0, 0);
    history.add(late, 1);

    let target = GpsTime::new(2048, 72600.0);
    let changed = history.select(&target, &|e, t| e.is_valid(t), None);
    assert!(changed);
    assert!(history.current().is_equivalent(&late));

    // adding an older record must not disturb the selection
    history.add(early, 1);
    assert!(history.current().is_equivalent(&late));

    // a competing record of the same tag and higher priority must not
    // disturb it either
    history.add(fixture_at(72000.0, 3), 5);
    assert!(history.current().is_equivalent(&late));
}

#[test]
fn history_selects_nearest_valid() {
    let mut history = EphemerisHistory::new();
    history.add(fixture_at(7200.0, 0), 1);
    history.add(fixture_at(72000.0, 0), 1);

    let target = GpsTime::new(2048, 8000.0);
    history.select(
        &target,
        &|e, t| e.is_valid(t),
        Some(&|e, t| e.period_from_first_valid_transmission(t)),
    );
    assert!((history.current().t_oc - 7200.0).abs() < 1E-9);

    let target = GpsTime::new(2048, 71000.0);
    history.select(
        &target,
        &|e, t| e.is_valid(t),
        Some(&|e, t| e.period_from_first_valid_transmission(t)),
    );
    assert!((history.current().t_oc - 72000.0).abs() < 1E-9);
}

#[test]
fn history_merge_keeps_union() {
    let mut left = EphemerisHistory::new();
    left.add(fixture_at(7200.0, 0), 1);
    left.add(fixture_at(43200.0, 0), 1);

    let mut right = EphemerisHistory::new();
    right.add(fixture_at(43200.0, 0), 1); // equivalent to one of ours
    right.add(fixture_at(72000.0, 0), 1);

    left.merge(&right, true);
    assert_eq!(left.len(), 3);

    let tags: Vec<_> = left.iter(IterMode::All).map(|e| e.t_tag).collect();
    let mut sorted = tags.clone();
    sorted.sort();
    assert_eq!(tags, sorted);
}

#[test]
fn space_node_merge_adopts_missing_pieces() {
    let mut left = SpaceNode::new();
    left.satellite_mut(1)
        .register_ephemeris(fixture_at(7200.0, 0), 1);

    let mut right = SpaceNode::new();
    right
        .satellite_mut(1)
        .register_ephemeris(fixture_at(72000.0, 0), 1);
    right
        .satellite_mut(2)
        .register_ephemeris(fixture_at(72000.0, 0), 1);
    right.update_iono_utc(IonoUtc::default(), true, true);

    left.merge(&right, true);

    assert!(left.has_satellite(2));
    let histories: Vec<_> = left
        .satellite(1)
        .unwrap()
        .iter_ephemeris(IterMode::All)
        .collect();
    assert_eq!(histories.len(), 2);
    // missing iono/UTC parameters are adopted from the other catalog
    assert!(left.is_valid_iono_utc());
}
