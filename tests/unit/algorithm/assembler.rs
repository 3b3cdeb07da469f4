//! Tests for the two-phase world pipeline, ordering and batch reports

#[cfg(test)]
mod tests {
    use dfmap::MapError;
    use dfmap::algorithm::assembler::{
        BatchReport, ClassificationPass, ClassifiedElevation, ElevationOrder,
        ElevationSetAssembler, PipelineConfig, WorldReport, cropped_path, run_text_world,
    };
    use dfmap::algorithm::registration::{Registration, RegistrationAligner};
    use dfmap::algorithm::resample::GridResampler;
    use dfmap::algorithm::stitching::Stitcher;
    use dfmap::io::discovery::{ElevationInput, WorldInput};
    use dfmap::io::error::ErrorScope;
    use dfmap::io::export::MemorySink;
    use dfmap::spatial::extent::{Extent, find_extent};
    use dfmap::spatial::mask::Mask;
    use dfmap::spatial::terrain::TileClass;
    use image::{Rgb, RgbImage};
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    const GRASS: Rgb<u8> = Rgb([70, 150, 50]);
    const CAVE: Rgb<u8> = Rgb([30, 30, 30]);

    fn marker() -> RgbImage {
        let mut rng = StdRng::seed_from_u64(77);
        RgbImage::from_fn(10, 10, |_, _| {
            Rgb([rng.random_range(100..=255), rng.random(), rng.random()])
        })
    }

    /// Panorama with the marker at (20, 30) and cave rows `rows` inside the embark crop
    fn panorama(rows: std::ops::Range<u32>) -> RgbImage {
        let mut image = RgbImage::from_pixel(300, 300, GRASS);
        for y in rows {
            for x in 0..240 {
                image.put_pixel(20 + x, 30 + y, CAVE);
            }
        }
        image::imageops::replace(&mut image, &marker(), 20, 30);
        image
    }

    struct FixedStitcher {
        panoramas: HashMap<String, RgbImage>,
    }

    impl Stitcher for FixedStitcher {
        fn stitch(&self, elevation: &str, _screenshots: &[RgbImage]) -> dfmap::Result<RgbImage> {
            self.panoramas
                .get(elevation)
                .cloned()
                .ok_or_else(|| MapError::Stitching {
                    elevation: elevation.to_string(),
                    reason: "no overlap".to_string(),
                })
        }
    }

    fn world_with(root: &Path, labels: &[&str]) -> WorldInput {
        let dir = root.join("world");
        for label in labels {
            let elevation = dir.join(label);
            std::fs::create_dir_all(&elevation).expect("Failed to create elevation dir");
            RgbImage::from_pixel(4, 4, GRASS)
                .save(elevation.join("shot.png"))
                .expect("Failed to save screenshot");
        }
        WorldInput {
            name: "world".to_string(),
            dir,
        }
    }

    fn classified(index: i32, mask: Mask) -> ClassifiedElevation {
        ClassifiedElevation {
            index,
            label: format!("elevation-{index}"),
            extent: find_extent(&mask, Default::default()),
            mask,
            registration: Registration {
                top_left: (0, 0),
                bottom_right: (2, 2),
                score: 1.0,
            },
        }
    }

    // Tests elevation ordering in both directions
    // Verified by sorting ascending for Descending
    #[test]
    fn test_elevation_order() {
        let mut indices = vec![3, -2, 10, 0];
        ElevationOrder::Descending.sort_by_index(&mut indices, |i| *i);
        assert_eq!(indices, vec![10, 3, 0, -2]);
        ElevationOrder::Ascending.sort_by_index(&mut indices, |i| *i);
        assert_eq!(indices, vec![-2, 0, 3, 10]);
        assert_eq!(ElevationOrder::default(), ElevationOrder::Descending);
    }

    // Tests each elevation is resampled against the shared overall extent
    // Verified by resampling each mask against its own extent
    #[test]
    fn test_two_phase_uses_overall_extent() {
        let upper = Mask::from_fn(100, 100, |row, col| row < 50 && col < 100);
        let lower = Mask::from_fn(100, 100, |row, col| (50..100).contains(&row) && col < 100);

        let mut pass = ClassificationPass::new();
        pass.admit(classified(1, upper));
        pass.admit(classified(0, lower));
        assert_eq!(pass.overall().contributions(), 2);

        let resampling = pass.finish();
        assert_eq!(resampling.overall(), Some(Extent::new(0, 0, 100, 100)));

        let mut sink = MemorySink::new();
        let resampler = GridResampler::binary(1).expect("Failed to create resampler");
        let report = resampling
            .emit("w", &resampler, ElevationOrder::Descending, &mut sink)
            .expect("Failed to emit");

        assert_eq!(report.emitted, vec![1, 0]);
        let world = sink.world("w").expect("world should be emitted");
        let (_, upper_grid) = &world.elevations[0];
        let (_, lower_grid) = &world.elevations[1];
        assert_eq!(upper_grid.get(0, 0), TileClass::UNDERGROUND);
        assert_eq!(upper_grid.get(47, 0), TileClass::Open);
        assert_eq!(lower_grid.get(0, 0), TileClass::Open);
        assert_eq!(lower_grid.get(47, 47), TileClass::UNDERGROUND);
    }

    // Tests a world without terrain emits empty grids and recorded failures survive
    // Verified by skipping elevations without an extent
    #[test]
    fn test_no_terrain_emits_empty_grids() {
        let mut pass = ClassificationPass::new();
        pass.admit(classified(4, Mask::new(20, 20)));
        pass.record_failure(
            5,
            "elevation-5",
            MapError::Stitching {
                elevation: "elevation-5".to_string(),
                reason: "no overlap".to_string(),
            },
        );

        let mut sink = MemorySink::new();
        let resampler = GridResampler::binary(1).expect("Failed to create resampler");
        let report = pass
            .finish()
            .emit("w", &resampler, ElevationOrder::Ascending, &mut sink)
            .expect("Failed to emit");

        assert_eq!(report.emitted, vec![4]);
        assert_eq!(report.overall, None);
        assert!(!report.is_complete());
        assert_eq!(report.failures[0].index, 5);
        assert!(sink.worlds()[0].elevations[0].1.is_empty());
    }

    // Tests the full screenshot pipeline with a failing elevation
    // Verified by aborting the world on the first elevation error
    #[test]
    fn test_run_world_end_to_end() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let world = world_with(dir.path(), &["elevation-2", "elevation-1", "elevation-0"]);

        let mut panoramas = HashMap::new();
        panoramas.insert("elevation-2".to_string(), panorama(60..120));
        panoramas.insert("elevation-1".to_string(), panorama(120..180));
        let config = PipelineConfig {
            embark_size: 1,
            ..PipelineConfig::default()
        };
        let assembler = ElevationSetAssembler::new(
            FixedStitcher { panoramas },
            RegistrationAligner::new(marker()).expect("Failed to create aligner"),
            config,
        )
        .expect("Failed to create assembler");

        let mut sink = MemorySink::new();
        let report = assembler.run_world(&world, &mut sink).expect("Failed to run world");

        assert_eq!(report.emitted, vec![2, 1]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "elevation-0");
        assert_eq!(report.overall, Some(Extent::new(0, 60, 240, 180)));

        let grids = &sink.world("world").expect("world should be emitted").elevations;
        let (_, upper) = &grids[0];
        let (_, lower) = &grids[1];
        assert_eq!(upper.get(0, 0), TileClass::UNDERGROUND);
        assert_eq!(upper.get(47, 47), TileClass::Open);
        assert_eq!(lower.get(0, 0), TileClass::Open);
        assert_eq!(lower.get(47, 47), TileClass::UNDERGROUND);

        assert!(world.dir.join("elevation-2.png").exists());
        assert!(world.dir.join("cropped-elevation-2.png").exists());
    }

    // Tests a cropped preview that cannot be written fails only its elevation
    // Verified by letting the export error abort the batch
    #[test]
    fn test_cropped_write_failure_is_elevation_scoped() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let world = world_with(dir.path(), &["elevation-2", "elevation-1"]);
        std::fs::create_dir_all(world.dir.join("cropped-elevation-1.png"))
            .expect("Failed to block cropped path");

        let mut panoramas = HashMap::new();
        panoramas.insert("elevation-2".to_string(), panorama(60..120));
        panoramas.insert("elevation-1".to_string(), panorama(120..180));
        let config = PipelineConfig {
            embark_size: 1,
            ..PipelineConfig::default()
        };
        let assembler = ElevationSetAssembler::new(
            FixedStitcher { panoramas },
            RegistrationAligner::new(marker()).expect("Failed to create aligner"),
            config,
        )
        .expect("Failed to create assembler");

        let mut sink = MemorySink::new();
        let mut batch = BatchReport::default();
        batch
            .record(&world.name, assembler.run_world(&world, &mut sink))
            .expect("an elevation write failure should not abort the batch");

        assert!(batch.world_failures.is_empty());
        let report = &batch.worlds[0];
        assert_eq!(report.emitted, vec![2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "elevation-1");
        assert_eq!(report.failures[0].error.scope(), ErrorScope::Elevation);
        assert!(matches!(
            &report.failures[0].error,
            MapError::InElevation { elevation, .. } if elevation == "elevation-1"
        ));
        assert_eq!(report.overall, Some(Extent::new(0, 60, 240, 120)));
    }

    // Tests a world without elevation directories is a world-level failure
    // Verified by treating an empty world as successful
    #[test]
    fn test_batch_report_records_world_failures() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let world = world_with(dir.path(), &[]);
        std::fs::create_dir_all(&world.dir).expect("Failed to create world dir");

        let assembler = ElevationSetAssembler::new(
            FixedStitcher {
                panoramas: HashMap::new(),
            },
            RegistrationAligner::new(marker()).expect("Failed to create aligner"),
            PipelineConfig::default(),
        )
        .expect("Failed to create assembler");

        let mut sink = MemorySink::new();
        let mut batch = BatchReport::default();
        batch
            .record(&world.name, assembler.run_world(&world, &mut sink))
            .expect("world errors should not abort the batch");

        assert!(batch.has_failures());
        assert!(matches!(
            batch.world_failures[0].1,
            MapError::NoElevations { .. }
        ));
        assert!(sink.worlds().is_empty());
    }

    // Tests batch-scoped errors are returned instead of recorded
    // Verified by recording every error
    #[test]
    fn test_batch_report_propagates_batch_errors() {
        let mut batch = BatchReport::default();
        let error = MapError::FileSystem {
            path: PathBuf::from("out"),
            operation: "write",
            source: std::io::Error::other("disk full"),
        };
        assert!(batch.record("w", Err(error)).is_err());

        let ok = WorldReport {
            world: "w".to_string(),
            emitted: vec![1, 2],
            failures: Vec::new(),
            overall: None,
        };
        assert!(batch.record("w", Ok(ok)).is_ok());
        assert_eq!(batch.emitted(), 2);
        assert!(!batch.has_failures());
    }

    // Tests text grids are emitted in order and must share dimensions
    // Verified by skipping the shape comparison
    #[test]
    fn test_run_text_world() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let world = WorldInput {
            name: "legacy".to_string(),
            dir: dir.path().to_path_buf(),
        };
        std::fs::write(dir.path().join("elevation--1.txt"), "r0\n0~\n").expect("write");
        std::fs::write(dir.path().join("elevation-3.txt"), "T \n  \n").expect("write");

        let mut sink = MemorySink::new();
        let report = run_text_world(&world, ElevationOrder::Descending, &mut sink)
            .expect("Failed to run text world");
        assert_eq!(report.emitted, vec![3, -1]);
        let grids = &sink.worlds()[0].elevations;
        assert_eq!(grids[0].1.get(0, 0), TileClass::Tree);
        assert_eq!(grids[1].1.get(1, 1), TileClass::Water);

        std::fs::write(dir.path().join("elevation-4.txt"), "000\n000\n").expect("write");
        let error = run_text_world(&world, ElevationOrder::Descending, &mut MemorySink::new())
            .expect_err("mismatched grids should fail");
        assert!(matches!(error, MapError::MalformedTextGrid { .. }));
    }

    // Tests the cropped preview sits beside the elevation directory
    // Verified by joining the file inside the elevation directory
    #[test]
    fn test_cropped_path() {
        let input = ElevationInput {
            index: 3,
            label: "elevation-3".to_string(),
            dir: PathBuf::from("shots/world/elevation-3"),
            screenshots: Vec::new(),
        };
        assert_eq!(
            cropped_path(&input),
            PathBuf::from("shots/world/cropped-elevation-3.png")
        );
    }
}
