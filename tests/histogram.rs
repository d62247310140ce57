use approx::assert_abs_diff_eq;
use quickcheck::quickcheck;

use lazyarray::{
    integral_between_ranks, integral_between_values, precise_integral_between_ranks,
    precise_integral_between_values, CountOfValues, ErrorKind, SummingHistogram,
};

const BARS: [u64; 5] = [0, 2, 0, 5, 1];

fn hist() -> SummingHistogram
{
    SummingHistogram::from_bars(&BARS, true, &[2]).unwrap()
}

#[test]
fn totals_and_bars()
{
    let h = hist();
    assert_eq!(h.length(), 5);
    assert_eq!(h.total(), 8);
    assert_eq!(h.bar(3).unwrap(), 5);
    assert_eq!(h.bar(9).unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    assert_eq!(h.to_bars(), BARS.to_vec());
}

#[test]
fn include_and_exclude_maintain_the_invariants()
{
    let h = SummingHistogram::new(10, true, &[1, 3]).unwrap();
    h.include_all(&[1, 1, 3, 3, 3, 3, 3, 4]).unwrap();
    assert_eq!(h.total(), 8);
    assert_eq!(h.bar(3).unwrap(), 5);

    h.exclude(3).unwrap();
    assert_eq!(h.total(), 7);
    assert_eq!(h.exclude(2).unwrap_err().kind(), ErrorKind::UnderflowDisbalance);
}

#[test]
fn move_to_i_rank_walks_and_interpolates()
{
    let h = hist();
    h.move_to_i_rank(3);
    assert_eq!(h.current_i_value(), 3);
    assert_eq!(h.current_i_rank(), 2);
    assert_eq!(h.current_sum(), 2);
    assert_eq!(h.current_n_distinct(), 1);
    assert_abs_diff_eq!(h.current_value(), 3.2, epsilon = 1e-12);

    h.move_to_i_rank(0);
    assert_eq!(h.current_i_value(), 1);
    assert_eq!(h.current_i_rank(), 0);

    // out-of-range ranks clamp
    h.move_to_i_rank(-5);
    assert_eq!(h.current_i_rank(), 0);
    h.move_to_i_rank(100);
    assert_eq!(h.current_i_rank(), 8);
}

#[test]
fn rank_total_skips_trailing_zero_bars()
{
    let h = SummingHistogram::from_bars(&[0, 2, 0, 5, 1, 0, 0, 0], true, &[1, 2]).unwrap();
    h.move_to_i_rank(8);
    assert_eq!(h.current_i_value(), 5);
    assert_eq!(h.current_i_rank(), 8);
    assert_eq!(h.current_value(), 5.0);

    let empty = SummingHistogram::new(6, true, &[2]).unwrap();
    empty.move_to_i_rank(0);
    assert_eq!(empty.current_i_value(), 0);
}

#[test]
fn move_to_rank_interpolates_within_the_bar()
{
    let h = hist();
    h.move_to_rank(1.5);
    assert_eq!(h.current_i_value(), 1);
    assert_abs_diff_eq!(h.current_value(), 1.75, epsilon = 1e-12);
    assert_abs_diff_eq!(h.current_rank(), 1.5, epsilon = 1e-12);
}

#[test]
fn move_to_i_value_reports_prefix_statistics()
{
    let h = hist();
    h.move_to_i_value(4);
    assert_eq!(h.current_i_value(), 4);
    assert_eq!(h.current_i_rank(), 7);
    assert_eq!(h.current_sum(), 17);
    assert_eq!(h.current_n_distinct(), 2);

    h.move_to_i_value(2);
    assert_eq!(h.current_i_rank(), 2);
    assert_eq!(h.current_sum(), 2);
}

#[test]
fn simple_integral_matches_the_closed_form()
{
    // sum of b[k]·(k + 0.5) over the non-empty bars
    let expected: f64 = BARS
        .iter()
        .enumerate()
        .map(|(v, &b)| b as f64 * (v as f64 + 0.5))
        .sum();
    assert_abs_diff_eq!(integral_between_ranks(&BARS, 0.0, 8.0), expected, epsilon = 1e-12);
    assert_abs_diff_eq!(expected, 25.0, epsilon = 1e-12);
}

#[test]
fn incremental_and_static_integrals_agree()
{
    let h = hist();
    for r in [0.0, 0.5, 1.0, 2.0, 3.2, 4.9, 7.0, 8.0] {
        h.move_to_rank(r);
        let by_scan = integral_between_ranks(&BARS, 0.0, r);
        assert_abs_diff_eq!(h.current_integral(), by_scan, epsilon = 1e-2);
    }
}

#[test]
fn precise_integral_of_the_first_trapezoid()
{
    // the wide part of bar 1 (b = 2) climbs from value 1 with slope 1/2
    assert_abs_diff_eq!(precise_integral_between_ranks(&BARS, 0.0, 1.0), 1.25, epsilon = 1e-12);
    // the connector to the next non-empty bar spans ranks 1..2
    assert_abs_diff_eq!(
        precise_integral_between_ranks(&BARS, 1.0, 2.0),
        (1.5 + 3.0) / 2.0,
        epsilon = 1e-12
    );
}

#[test]
fn precise_moves_agree_with_the_precise_scan()
{
    let h = hist();
    for r in [0.0, 0.5, 1.0, 1.5, 2.0, 4.5, 6.9, 7.5, 8.0] {
        h.move_to_precise_rank(r);
        assert_abs_diff_eq!(h.current_precise_rank(), r, epsilon = 1e-9);
        let by_scan = precise_integral_between_ranks(&BARS, 0.0, r);
        assert_abs_diff_eq!(h.current_precise_integral(), by_scan, epsilon = 1e-2);
    }
}

#[test]
fn integrals_between_values_report_counts_and_bounds()
{
    let mut count = CountOfValues::default();
    let s = integral_between_values(&BARS, 1.0, 2.0, Some(&mut count));
    // bar 1 holds 2 elements at mean value 1.5
    assert_abs_diff_eq!(s, 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(count.count(), 2.0, epsilon = 1e-12);
    assert!(!count.is_left_bound());
    assert!(!count.is_right_bound());

    let mut count = CountOfValues::default();
    integral_between_values(&BARS, 0.0, 1.0, Some(&mut count));
    assert!(count.is_left_bound());

    let mut count = CountOfValues::default();
    precise_integral_between_values(&BARS, 5.0, 6.0, Some(&mut count));
    assert!(count.is_right_bound());
    assert_eq!(count.count(), 0.0);
}

#[test]
fn sharing_broadcasts_bar_changes()
{
    let h = hist();
    assert_eq!(h.share_count(), 1);
    let sibling = h.share();
    assert_eq!(h.share_count(), 2);

    sibling.move_to_i_rank(8);
    h.move_to_i_rank(0);

    h.include(0).unwrap();
    // the sibling sits above value 0, so its rank shifted up
    assert_eq!(sibling.current_i_rank(), 9);
    assert_eq!(sibling.total(), 9);
    // this instance sits at value 1, above the included bar as well
    assert_eq!(h.current_i_rank(), 1);

    h.exclude(0).unwrap();
    assert_eq!(sibling.current_i_rank(), 8);
    assert_eq!(h.current_i_rank(), 0);

    drop(sibling);
    assert_eq!(h.share_count(), 1);
}

#[test]
fn integral_between_sharing_matches_the_difference()
{
    let h = hist();
    let sibling = h.share();
    h.move_to_rank(1.5);
    sibling.move_to_rank(6.25);
    let between = h.integral_between_sharing(&sibling).unwrap();
    let difference = sibling.current_integral() - h.current_integral();
    assert_abs_diff_eq!(between, difference, epsilon = 1e-9);

    let unrelated = hist();
    assert_eq!(
        h.integral_between_sharing(&unrelated).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn u32_bars_and_overflow_guards()
{
    let h = SummingHistogram::from_bars_u32(&[1, 2, 3], false, &[1]).unwrap();
    assert_eq!(h.total(), 6);
    h.move_to_i_rank(3);
    assert_eq!(h.current_i_value(), 2);

    assert_eq!(
        SummingHistogram::new(1u64 << 31, true, &[2]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        SummingHistogram::new(4, true, &[0]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        SummingHistogram::new(4, true, &[3, 2]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

quickcheck! {
    fn rank_invariant_holds_after_walks(values: Vec<u8>, target: u8) -> bool {
        let h = SummingHistogram::new(256, true, &[2, 5]).unwrap();
        let wide: Vec<u64> = values.iter().map(|&v| v as u64).collect();
        h.include_all(&wide).unwrap();
        h.move_to_i_rank(target as i64);
        let bars = h.to_bars();
        let prefix: u64 = bars[..h.current_i_value() as usize].iter().sum();
        prefix == h.current_i_rank()
    }

    fn sum_and_distinct_track_the_prefix(values: Vec<u8>, target: u8) -> bool {
        let h = SummingHistogram::new(256, false, &[3]).unwrap();
        let wide: Vec<u64> = values.iter().map(|&v| v as u64).collect();
        h.include_all(&wide).unwrap();
        h.move_to_i_value(target as i64);
        let bars = h.to_bars();
        let prefix = &bars[..h.current_i_value() as usize];
        let sum: i64 = prefix.iter().enumerate().map(|(v, &b)| v as i64 * b as i64).sum();
        let distinct = prefix.iter().filter(|&&b| b != 0).count() as u64;
        sum == h.current_sum() && distinct == h.current_n_distinct()
    }
}
