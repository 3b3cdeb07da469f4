//! Tests for registration mark search, plausibility limits and embark cropping

#[cfg(test)]
mod tests {
    use dfmap::MapError;
    use dfmap::algorithm::registration::{Plausibility, Registration, RegistrationAligner};
    use image::{Rgb, RgbImage};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| {
            Rgb([rng.random(), rng.random(), rng.random()])
        })
    }

    fn registration(x: u32, y: u32, width: u32, score: f64) -> Registration {
        Registration {
            top_left: (x, y),
            bottom_right: (x + width, y + width),
            score,
        }
    }

    // Tests tile size is half the mark width
    // Verified by dividing by three tiles
    #[test]
    fn test_tile_scale() {
        let found = registration(0, 0, 11, 1.0);
        assert_eq!(found.width(), 11);
        assert_eq!(found.tile_size(), 5);
        assert!((found.tile_scale() - 5.5).abs() < f64::EPSILON);
    }

    // Tests the crop spans 48 tiles per embark block from the mark's corner
    // Verified by starting the crop at the bottom-right corner
    #[test]
    fn test_embark_crop_size() {
        let found = registration(7, 9, 4, 1.0);
        let crop = found.embark_crop(2, 1000, 1000);

        assert_eq!((crop.x, crop.y), (7, 9));
        assert_eq!(crop.requested, 2 * 48 * 2);
        assert_eq!((crop.width, crop.height), (192, 192));
        assert!(!crop.is_clamped());
    }

    // Tests crops that overhang the panorama are clamped and flagged
    // Verified by keeping the requested width
    #[test]
    fn test_embark_crop_clamped() {
        let found = registration(50, 10, 4, 1.0);
        let crop = found.embark_crop(1, 120, 300);

        assert_eq!((crop.width, crop.height), (70, 96));
        assert!(crop.is_clamped());

        let image = noise(120, 300, 2);
        let cropped = crop.apply(&image);
        assert_eq!(cropped.dimensions(), (70, 96));
        assert_eq!(cropped.get_pixel(0, 0), image.get_pixel(50, 10));
    }

    // Tests weak matches and mis-scaled marks are rejected
    // Verified by comparing the absolute rather than relative deviation
    #[test]
    fn test_plausibility_check() {
        let limits = Plausibility {
            expected_tile_px: Some(8.0),
            tolerance: 0.1,
            min_score: Some(0.5),
        };

        assert!(limits.check("e1", &registration(0, 0, 16, 0.9)).is_ok());
        assert!(limits.check("e1", &registration(0, 0, 17, 0.9)).is_ok());

        let scaled = limits.check("e1", &registration(0, 0, 20, 0.9));
        assert!(matches!(scaled, Err(MapError::AlignmentImplausible { .. })));

        let weak = limits.check("e2", &registration(0, 0, 16, 0.2));
        let message = weak.expect_err("weak match should fail").to_string();
        assert!(message.contains("e2") && message.contains("score"));
    }

    // Tests defaults check only the score
    // Verified by defaulting the expected tile size
    #[test]
    fn test_default_plausibility() {
        let limits = Plausibility::default();
        assert_eq!(limits.expected_tile_px, None);
        assert!(limits.check("e", &registration(0, 0, 100, 0.8)).is_ok());
        assert!(limits.check("e", &registration(0, 0, 100, 0.1)).is_err());

        let unchecked = Plausibility {
            min_score: None,
            ..limits
        };
        assert!(unchecked.check("e", &registration(0, 0, 100, -1.0)).is_ok());
    }

    // Tests the scale check is reported as off until a tile size is given
    // Verified by reporting scale checks for the defaults
    #[test]
    fn test_checks_scale() {
        let limits = Plausibility::default();
        assert!(!limits.checks_scale());

        let scaled = Plausibility {
            expected_tile_px: Some(5.0),
            ..limits
        };
        assert!(scaled.checks_scale());
        assert!(scaled.check("e", &registration(0, 0, 10, 0.9)).is_ok());
        assert!(scaled.check("e", &registration(0, 0, 20, 0.9)).is_err());
    }

    // Tests the aligner locates a marker and reports its bounding box
    // Verified by returning the template size as bottom-right
    #[test]
    fn test_align_finds_marker() {
        let mut panorama = RgbImage::from_pixel(80, 60, Rgb([30, 120, 30]));
        let marker = noise(6, 6, 8);
        image::imageops::replace(&mut panorama, &marker, 41, 17);

        let aligner = RegistrationAligner::new(marker).expect("Failed to create aligner");
        let found = aligner.align("e", &panorama).expect("Failed to align");
        assert_eq!(found.top_left, (41, 17));
        assert_eq!(found.bottom_right, (47, 23));
        assert!(found.score > 0.99);
    }

    // Tests a marker absent from the panorama fails the score check
    // Verified by skipping the plausibility check in align
    #[test]
    fn test_align_rejects_missing_marker() {
        let panorama = noise(50, 50, 12);
        let aligner = RegistrationAligner::new(noise(8, 8, 13))
            .expect("Failed to create aligner")
            .with_plausibility(Plausibility {
                min_score: Some(0.9),
                ..Plausibility::default()
            });

        assert!(aligner.locate(&panorama).is_ok());
        assert!(matches!(
            aligner.align("e", &panorama),
            Err(MapError::AlignmentImplausible { .. })
        ));
    }

    // Tests markers too small to span two tiles are rejected
    // Verified by accepting any non-empty marker
    #[test]
    fn test_new_rejects_narrow_marker() {
        assert!(RegistrationAligner::new(RgbImage::new(1, 5)).is_err());
        assert!(RegistrationAligner::new(RgbImage::new(4, 0)).is_err());
        assert!(RegistrationAligner::from_path(std::path::Path::new("missing-marker.png")).is_err());
    }
}
