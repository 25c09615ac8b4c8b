use soundr_audio::{level::SILENCE_LOUDNESS, smoothing::AngleSmoother};

use crate::Tester;

fn constant(value: f32) -> [f32; 256] {
    [value; 256]
}

#[test]
fn end_to_end_example() {
    let estimates = Tester::new(&[[1f32, 1., 1., 1.], [10., 10., 10., 10.]]).run();

    assert_eq!(estimates[0].loudness, 0.);
    assert!(!estimates[0].is_locking_on);

    assert!((estimates[1].loudness - 100.).abs() < 1e-9);
    assert!(estimates[1].is_locking_on);
    assert!((estimates[1].distance_meters - 10f64.powf(-99. / 200.)).abs() < 1e-12);
}

#[test]
fn fresh_coordinators_agree() {
    let frames: Vec<[f32; 256]> = [0.1, 0.1, 0.5, 0.02, 0.9, 0., 0.3]
        .into_iter()
        .map(constant)
        .collect();

    let first = Tester::new(&frames).run();
    let second = Tester::new(&frames).run();

    assert_eq!(first, second);
}

#[test]
fn running_twice_starts_over() {
    let frames = [constant(0.1), constant(0.8), constant(0.8)];
    let mut tester = Tester::new(&frames);

    let first = tester.run();
    let second = tester.run();

    assert_eq!(first, second);
    assert!(!second[0].is_locking_on);
}

#[test]
fn threshold_crossings() {
    // baseline at rms 0.1 => loudness -100, threshold -95
    let rms_values = [0.1, 0.1, 0.2, 0.05, 0.5, 0.1, 0.11];
    let frames: Vec<[f32; 256]> = rms_values.into_iter().map(constant).collect();

    let estimates = Tester::new(&frames).run();
    let baseline = estimates[0].loudness;

    assert!(!estimates[0].is_locking_on);
    for estimate in &estimates[1..] {
        assert_eq!(estimate.is_locking_on, estimate.loudness > baseline + 5.);
    }

    let locking_on: Vec<bool> = estimates.iter().map(|e| e.is_locking_on).collect();
    assert_eq!(locking_on, [false, false, true, false, true, false, false]);
}

#[test]
fn silence_stays_finite() {
    let estimates = Tester::new(&[constant(0.), constant(0.), constant(0.5)]).run();

    assert_eq!(estimates[0].loudness, SILENCE_LOUDNESS);
    for estimate in estimates.iter() {
        assert!(estimate.angle_degrees.is_finite());
        assert!(estimate.distance_meters.is_finite());
        assert!(estimate.distance_meters > 0.);
    }

    // anything is louder than silence
    assert!(estimates[2].is_locking_on);
}

#[test]
fn angle_converges_to_twice_the_loudness() {
    let frames = vec![constant(0.5); 120];
    let estimates = Tester::new(&frames).run();

    let target = AngleSmoother::raw_angle(estimates[0].loudness);
    let last = estimates.last().unwrap();

    assert!((last.angle_degrees - target).abs() < 1e-6);
}
