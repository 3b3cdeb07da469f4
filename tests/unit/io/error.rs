//! Tests for error scopes, source chaining and message formatting

#[cfg(test)]
mod tests {
    use dfmap::MapError;
    use dfmap::io::error::{ErrorScope, WithContext, computation_error, invalid_parameter};
    use dfmap::spatial::terrain::TileClass;
    use std::error::Error;
    use std::path::{Path, PathBuf};

    // Tests each failure maps to the right propagation scope
    // Verified by moving stitching failures to world scope
    #[test]
    fn test_error_scopes() {
        let stitching = MapError::Stitching {
            elevation: "e".to_string(),
            reason: "r".to_string(),
        };
        let implausible = MapError::AlignmentImplausible {
            elevation: "e".to_string(),
            reason: "r".to_string(),
        };
        let no_elevations = MapError::NoElevations {
            world: PathBuf::from("w"),
        };
        let bad_glyph = MapError::UnknownTerrain {
            path: PathBuf::from("g.txt"),
            line: 1,
            column: 1,
            glyph: 'x',
        };

        assert_eq!(stitching.scope(), ErrorScope::Elevation);
        assert_eq!(implausible.scope(), ErrorScope::Elevation);
        assert_eq!(no_elevations.scope(), ErrorScope::World);
        assert_eq!(bad_glyph.scope(), ErrorScope::World);
        assert_eq!(
            invalid_parameter("p", &1, &"bad").scope(),
            ErrorScope::Batch
        );
    }

    // Tests error source chaining works correctly
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let error = MapError::FileSystem {
            path: "/tmp/grid.txt".into(),
            operation: "read",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert!(error.source().is_some());
        assert!(computation_error("spline", &"nan").source().is_none());
    }

    // Tests messages carry the relevant fields
    // Verified by omitting the line number from the message
    #[test]
    fn test_error_messages() {
        let malformed = MapError::MalformedTextGrid {
            path: PathBuf::from("elevation-1.txt"),
            line: 3,
            expected: 48,
            found: 47,
        };
        let message = malformed.to_string();
        assert!(message.contains("elevation-1.txt"));
        assert!(message.contains("line 3"));
        assert!(message.contains("48"));
        assert!(message.contains("47"));

        let glyph = MapError::UnknownTerrain {
            path: PathBuf::from("g.txt"),
            line: 2,
            column: 5,
            glyph: 'x',
        };
        assert!(glyph.to_string().contains("column 5"));

        let parameter = invalid_parameter("embark-size", &0, &"must be positive");
        let message = parameter.to_string();
        assert!(message.contains("embark-size"));
        assert!(message.contains('0'));
        assert!(message.contains("must be positive"));
    }

    // Tests converted errors receive their path and operation
    // Verified by leaving the placeholder path in place
    #[test]
    fn test_with_operation_fills_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("boom"));
        let error = result
            .with_operation(Path::new("maps/w"), "create directory")
            .expect_err("error should propagate");

        match error {
            MapError::FileSystem {
                path, operation, ..
            } => {
                assert_eq!(path, PathBuf::from("maps/w"));
                assert_eq!(operation, "create directory");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    // Tests explicit context is not overwritten
    // Verified by always replacing the path
    #[test]
    fn test_with_path_keeps_existing_path() {
        let result: dfmap::Result<()> = Err(MapError::FileSystem {
            path: PathBuf::from("original"),
            operation: "read",
            source: std::io::Error::other("boom"),
        });
        let error = result
            .with_path(Path::new("other"))
            .expect_err("error should propagate");
        assert!(error.to_string().contains("original"));
    }

    // Tests per-elevation and per-world I/O failures stop below batch scope
    // Verified by keeping every file system error batch-scoped
    #[test]
    fn test_scope_narrowing() {
        let write = || MapError::FileSystem {
            path: PathBuf::from("cropped-e.png"),
            operation: "write",
            source: std::io::Error::other("is a directory"),
        };
        assert_eq!(write().scope(), ErrorScope::Batch);

        let elevation = write().within_elevation("elevation-1");
        assert_eq!(elevation.scope(), ErrorScope::Elevation);
        assert!(elevation.to_string().contains("elevation-1"));
        assert!(elevation.to_string().contains("cropped-e.png"));
        assert!(elevation.source().is_some());

        let world = write().within_world(Path::new("maps/w"));
        assert_eq!(world.scope(), ErrorScope::World);
        assert!(world.to_string().contains("maps/w"));

        let narrowed = world.within_elevation("e");
        assert_eq!(narrowed.scope(), ErrorScope::Elevation);

        let stitching = MapError::Stitching {
            elevation: "e".to_string(),
            reason: "r".to_string(),
        };
        assert!(matches!(
            stitching.within_world(Path::new("w")),
            MapError::Stitching { .. }
        ));

        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let error = result
            .within_elevation("elevation-3")
            .expect_err("error should propagate");
        assert!(matches!(error, MapError::InElevation { .. }));
        assert!(ErrorScope::Elevation < ErrorScope::World);
        assert!(ErrorScope::World < ErrorScope::Batch);
    }

    // Tests palette gaps and index collisions fail a single world
    // Verified by aborting the batch on either
    #[test]
    fn test_world_scoped_output_errors() {
        let missing = MapError::MissingColor {
            class: TileClass::Soil,
            entries: 2,
        };
        assert_eq!(missing.scope(), ErrorScope::World);
        assert!(missing.to_string().contains("'s'"));

        let duplicate = MapError::DuplicateElevation {
            world: PathBuf::from("w"),
            index: 1,
            first: "elevation-1".to_string(),
            second: "1".to_string(),
        };
        assert_eq!(duplicate.scope(), ErrorScope::World);
        let message = duplicate.to_string();
        assert!(message.contains("elevation-1"));
        assert!(message.contains("index 1"));
    }
}
