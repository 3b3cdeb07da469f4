//! Tests for packed binary masks and square morphology

#[cfg(test)]
mod tests {
    use dfmap::spatial::extent::Extent;
    use dfmap::spatial::mask::Mask;

    // Tests reads and writes outside the mask are harmless
    // Verified by removing the bounds check in index
    #[test]
    fn test_out_of_bounds_access_is_ignored() {
        let mut mask = Mask::new(3, 4);
        mask.set(5, 5, true);
        mask.set(1, 2, true);

        assert!(!mask.get(5, 5));
        assert!(mask.get(1, 2));
        assert_eq!(mask.count(), 1);
        assert_eq!(mask.iter_set().collect::<Vec<_>>(), vec![(1, 2)]);
    }

    // Tests level conversion keeps row-major orientation
    // Verified by transposing the shape in to_levels
    #[test]
    fn test_to_levels_preserves_orientation() {
        let mask = Mask::from_fn(2, 3, |row, col| row == 0 && col == 2);
        let levels = mask.to_levels();

        assert_eq!(levels.dim(), (2, 3));
        assert!((levels[(0, 2)] - 1.0).abs() < f64::EPSILON);
        assert!(levels[(1, 2)].abs() < f64::EPSILON);
    }

    // Tests cropping copies the selected window and clamps overhang
    // Verified by offsetting the crop origin by one
    #[test]
    fn test_crop_selects_window_and_clamps() {
        let mask = Mask::from_fn(6, 6, |row, col| row == 2 && col == 3);

        let cropped = mask.crop(&Extent::new(2, 1, 5, 4));
        assert_eq!((cropped.height(), cropped.width()), (3, 3));
        assert!(cropped.get(1, 1));
        assert_eq!(cropped.count(), 1);

        let overhang = mask.crop(&Extent::new(4, 4, 10, 10));
        assert_eq!((overhang.height(), overhang.width()), (2, 2));

        let outside = mask.crop(&Extent::new(8, 8, 10, 10));
        assert_eq!((outside.height(), outside.width()), (0, 0));
    }

    // Tests dilation grows a pixel into a square and erosion undoes it
    // Verified by using a radius-0 window in dilate
    #[test]
    fn test_dilate_then_erode_restores_isolated_square() {
        let mut mask = Mask::new(9, 9);
        mask.set(4, 4, true);

        let grown = mask.dilate(1);
        assert_eq!(grown.count(), 9);
        assert!(grown.get(3, 3) && grown.get(5, 5));

        let shrunk = grown.erode(1);
        assert_eq!(shrunk, mask);
    }

    // Tests closing bridges a one-pixel gap without shrinking the regions
    // Verified by skipping the dilation step in close
    #[test]
    fn test_close_fills_small_gap() {
        let mask = Mask::from_fn(5, 11, |row, col| (1..4).contains(&row) && col != 5);
        let closed = mask.close(1, 1);

        assert!(closed.get(2, 5));
        for (row, col) in mask.iter_set() {
            assert!(closed.get(row, col), "closing removed ({row}, {col})");
        }
    }

    // Tests regions touching the border survive erosion
    // Verified by treating outside pixels as unset
    #[test]
    fn test_erode_keeps_full_mask() {
        let mask = Mask::filled(4, 4);
        assert_eq!(mask.erode(2), mask);
        assert!(Mask::new(0, 0).is_empty());
    }
}
