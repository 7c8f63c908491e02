mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use common::{make_interior_pair, make_shifted_pair, make_spots, render, roll, shift_error};
use phasereg_core::{
    Accuracy, BandpassKind, CalculateOptions, CentroidWindowKind, CorrelationMode, EstimateStage,
    InterpolationKind, RegistrationConfig, RegistrationError, Shift, WindowKind,
};

fn options(accuracy: Accuracy) -> CalculateOptions<'static> {
    CalculateOptions::default().with_accuracy(accuracy)
}

#[test]
fn test_identical_images_give_zero_shift() {
    let (image, _) = make_shifted_pair(64, 64, Shift::default(), 1);
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let shift = config.calculate(image.view(), image.view()).unwrap();
    assert_abs_diff_eq!(shift.dx, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(shift.dy, 0.0, epsilon = 1e-6);
}

#[test]
fn test_known_subpixel_shift() {
    let truth = Shift::new(3.3, -5.2);
    let (image1, image2) = make_shifted_pair(128, 128, truth, 7);
    let config = RegistrationConfig::<f64>::new(128, 128).unwrap();

    let estimate = config
        .estimate(image1.view(), image2.view(), &CalculateOptions::default())
        .unwrap();
    assert!(matches!(estimate.stage, EstimateStage::Iterative { .. }), "{}", estimate.stage);
    assert!(
        shift_error(estimate.shift, truth) < 0.2,
        "estimated {} for {}",
        estimate.shift,
        truth
    );
}

#[test]
fn test_large_shift() {
    let truth = Shift::new(38.6, -67.4);
    let (image1, image2) = make_shifted_pair(256, 256, truth, 11);
    let config = RegistrationConfig::<f64>::new(256, 256).unwrap();

    let shift = config.calculate(image1.view(), image2.view()).unwrap();
    assert!(shift_error(shift, truth) < 0.25, "estimated {shift} for {truth}");
}

#[test]
fn test_swapping_images_negates_shift() {
    let truth = Shift::new(-2.4, 1.7);
    let (image1, image2) = make_shifted_pair(64, 96, truth, 3);
    let config = RegistrationConfig::<f64>::new(64, 96).unwrap();

    let forward = config.calculate(image1.view(), image2.view()).unwrap();
    let backward = config.calculate(image2.view(), image1.view()).unwrap();
    assert!(shift_error(forward, truth) < 0.25, "forward {forward}");
    assert!(shift_error(backward, Shift::new(-truth.dx, -truth.dy)) < 0.25, "backward {backward}");
}

#[test]
fn test_pixel_accuracy_rounds_to_integer_peak() {
    let truth = Shift::new(3.3, -5.2);
    let (image1, image2) = make_shifted_pair(64, 64, truth, 5);
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let shift = config
        .calculate_with(image1.view(), image2.view(), &options(Accuracy::Pixel))
        .unwrap();
    assert_eq!(shift, Shift::new(3.0, -5.0));
}

#[test]
fn test_finer_accuracy_does_not_worsen_error() {
    let truths = [
        Shift::new(1.3, 2.35),
        Shift::new(-4.4, 0.3),
        Shift::new(6.35, -3.4),
        Shift::new(-0.3, -7.6),
    ];
    let config = RegistrationConfig::<f64>::new(96, 96).unwrap();

    let mut totals = [0.0f64; 3];
    for (seed, &truth) in truths.iter().enumerate() {
        let (image1, image2) = make_shifted_pair(96, 96, truth, 100 + seed as u64);
        for (total, accuracy) in totals
            .iter_mut()
            .zip([Accuracy::Pixel, Accuracy::Subpixel, Accuracy::SubpixelIterative])
        {
            let shift = config
                .calculate_with(image1.view(), image2.view(), &options(accuracy))
                .unwrap();
            *total += shift_error(shift, truth);
        }
    }
    let [pixel, subpixel, iterative] = totals.map(|t| t / truths.len() as f64);

    assert!(subpixel <= pixel + 0.05, "subpixel {subpixel} vs pixel {pixel}");
    assert!(iterative <= subpixel + 0.05, "iterative {iterative} vs subpixel {subpixel}");
    assert!(iterative < 0.2, "iterative {iterative}");
}

#[test]
fn test_repeated_calls_are_identical() {
    let truth = Shift::new(2.2, 4.7);
    let (image1, image2) = make_shifted_pair(64, 64, truth, 9);
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let first = config.calculate(image1.view(), image2.view()).unwrap();
    let parallel: Vec<Shift> = (0..8)
        .into_par_iter()
        .map(|_| config.calculate(image1.view(), image2.view()).unwrap())
        .collect();
    for shift in parallel {
        assert_eq!(shift, first);
    }
}

#[test]
fn test_intensity_scale_does_not_change_result() {
    let truth = Shift::new(-1.6, 2.9);
    let (image1, image2) = make_shifted_pair(64, 64, truth, 13);
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let reference = config.calculate(image1.view(), image2.view()).unwrap();
    let scaled1 = image1.mapv(|v| v * 37.5);
    let scaled2 = image2.mapv(|v| v * 0.02);
    let shift = config.calculate(scaled1.view(), scaled2.view()).unwrap();
    assert_abs_diff_eq!(shift.dx, reference.dx, epsilon = 1e-6);
    assert_abs_diff_eq!(shift.dy, reference.dy, epsilon = 1e-6);
}

#[test]
fn test_every_kind_combination_stays_within_half_pixel() {
    let truth = Shift::new(2.3, -1.6);
    let (image1, image2) = make_interior_pair(64, 64, truth, 19);
    let mut config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    for window in WindowKind::ALL {
        for bandpass in BandpassKind::ALL {
            for interpolation in InterpolationKind::ALL {
                for centroid in CentroidWindowKind::ALL {
                    config.set_window_kind(window);
                    config.set_bandpass_kind(bandpass);
                    config.set_interpolation_kind(interpolation);
                    config.set_centroid_window_kind(centroid);

                    let shift = config.calculate(image1.view(), image2.view()).unwrap();
                    assert!(
                        (shift.dx - truth.dx).abs() < 0.5 && (shift.dy - truth.dy).abs() < 0.5,
                        "{shift} with {config}"
                    );
                }
            }
        }
    }
}

#[test]
#[ignore = "slow in debug builds; run with --release -- --ignored"]
fn test_large_image_every_kind_combination() {
    let truth = Shift::new(38.6, -67.4);
    let spots = make_spots(300, 1000, 1000, 6.0, 41);
    let image1 = render(&spots, 1000, 1000, Shift::default());
    let image2 = render(&spots, 1000, 1000, truth);
    let mut config = RegistrationConfig::<f64>::new(1000, 1000).unwrap();
    config.set_neighborhood_size(7).unwrap();
    config.set_upsampled_size(223);

    for window in WindowKind::ALL {
        for bandpass in BandpassKind::ALL {
            for interpolation in InterpolationKind::ALL {
                for centroid in CentroidWindowKind::ALL {
                    config.set_window_kind(window);
                    config.set_bandpass_kind(bandpass);
                    config.set_interpolation_kind(interpolation);
                    config.set_centroid_window_kind(centroid);

                    let shift = config.calculate(image1.view(), image2.view()).unwrap();
                    assert!(shift_error(shift, truth) < 0.2, "{shift} with {config}");
                }
            }
        }
    }
}

#[test]
fn test_peak_on_border_falls_back_to_pixel_shift() {
    let (image, _) = make_shifted_pair(64, 64, Shift::default(), 17);
    let mut config = RegistrationConfig::<f64>::new(64, 64).unwrap();
    config.set_window_kind(WindowKind::None);

    // Peak lands on the last column and the first row of the surface.
    let rolled = roll(&image, -32, 31);
    let estimate = config
        .estimate(image.view(), rolled.view(), &CalculateOptions::default())
        .unwrap();
    assert_eq!(estimate.stage, EstimateStage::Pixel);
    assert_eq!(estimate.shift, Shift::new(31.0, -32.0));
}

#[test]
fn test_peak_near_border_uses_smaller_neighborhood() {
    let (image, _) = make_shifted_pair(64, 64, Shift::default(), 19);
    let mut config = RegistrationConfig::<f64>::new(64, 64).unwrap();
    config.set_window_kind(WindowKind::None);

    // Peak one pixel from the last column: only a 3x3 neighborhood fits.
    let rolled = roll(&image, 5, 30);
    let shift = config.calculate(image.view(), rolled.view()).unwrap();
    assert!(shift.is_finite());
    assert!(shift_error(shift, Shift::new(30.0, 5.0)) < 0.5, "{shift}");
}

#[test]
fn test_integer_types_are_accepted() {
    let truth = Shift::new(4.0, -3.0);
    let (image1, image2) = make_interior_pair(64, 64, truth, 23);
    let to_u8 = |a: &Array2<f64>| {
        let max = a.iter().cloned().fold(0.0, f64::max);
        a.mapv(|v| (v / max * 255.0).round() as u8)
    };
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let shift = config
        .calculate(to_u8(&image1).view(), to_u8(&image2).view())
        .unwrap();
    assert!(shift_error(shift, truth) < 0.25, "{shift}");
}

#[test]
fn test_single_precision_matches_double() {
    let truth = Shift::new(1.7, -2.2);
    let (image1, image2) = make_shifted_pair(64, 64, truth, 29);
    let config64 = RegistrationConfig::<f64>::new(64, 64).unwrap();
    let config32 = RegistrationConfig::<f32>::new(64, 64).unwrap();

    let shift64 = config64.calculate(image1.view(), image2.view()).unwrap();
    let image1 = image1.mapv(|v| v as f32);
    let image2 = image2.mapv(|v| v as f32);
    let shift32 = config32.calculate(image1.view(), image2.view()).unwrap();
    assert!(shift_error(shift32, shift64) < 0.05, "{shift32} vs {shift64}");
}

#[test]
fn test_cross_correlation_mode_finds_integer_shift() {
    let truth = Shift::new(-6.0, 3.0);
    let (image1, image2) = make_interior_pair(96, 96, truth, 31);
    let mut config = RegistrationConfig::<f64>::new(96, 96).unwrap();
    config.set_window_kind(WindowKind::None);

    let shift = config
        .calculate_with(
            image1.view(),
            image2.view(),
            &CalculateOptions::default()
                .with_mode(CorrelationMode::Cross)
                .with_accuracy(Accuracy::Pixel),
        )
        .unwrap();
    assert_eq!(shift, truth);
}

#[test]
fn test_minimal_shift_suppresses_zero_peak() {
    let truth = Shift::new(9.0, 0.0);
    let (image1, mut image2) = make_interior_pair(64, 64, truth, 37);
    // Mix in an unshifted copy so zero shift also correlates strongly.
    image2.zip_mut_with(&image1, |b, &a| *b += 2.0 * a);
    let mut config = RegistrationConfig::<f64>::new(64, 64).unwrap();
    config.set_minimal_shift(4.0).unwrap();

    let shift = config
        .calculate_with(image1.view(), image2.view(), &options(Accuracy::Pixel))
        .unwrap();
    assert!(shift.magnitude() > 4.0, "{shift}");
}

#[test]
fn test_mismatched_sizes_are_rejected() {
    let config = RegistrationConfig::<f64>::new(32, 32).unwrap();
    let a = Array2::<f64>::zeros((32, 32));
    let b = Array2::<f64>::zeros((32, 16));

    let err = config.calculate(a.view(), b.view()).unwrap_err();
    assert!(matches!(err, RegistrationError::SizeMismatch { .. }), "{err}");
    assert!(err.is_invalid_input());
}

#[test]
fn test_unexpected_size_is_rejected() {
    let config = RegistrationConfig::<f64>::new(32, 32).unwrap();
    let a = Array2::<f64>::zeros((16, 32));

    let err = config.calculate(a.view(), a.view()).unwrap_err();
    assert_eq!(
        err,
        RegistrationError::UnexpectedSize {
            rows: 16,
            cols: 32,
            expected_rows: 32,
            expected_cols: 32,
        }
    );
}

#[test]
fn test_multichannel_images_are_rejected() {
    let config = RegistrationConfig::<f64>::new(32, 32).unwrap();
    let rgb = Array3::<f64>::zeros((32, 32, 3));

    let err = config
        .calculate_channels(rgb.view(), rgb.view(), &CalculateOptions::default())
        .unwrap_err();
    assert_eq!(err, RegistrationError::Multichannel { channels: 3 });
}

#[test]
fn test_single_channel_stack_is_accepted() {
    let truth = Shift::new(2.3, 1.4);
    let (image1, image2) = make_shifted_pair(64, 64, truth, 41);
    let config = RegistrationConfig::<f64>::new(64, 64).unwrap();

    let stack1 = image1.clone().insert_axis(ndarray::Axis(2));
    let stack2 = image2.clone().insert_axis(ndarray::Axis(2));
    let shift = config
        .calculate_channels(stack1.view(), stack2.view(), &CalculateOptions::default())
        .unwrap();
    let plain = config.calculate(image1.view(), image2.view()).unwrap();
    assert_eq!(shift, plain);
}
