//! Tests for connected-component labeling and small-region removal

#[cfg(test)]
mod tests {
    use dfmap::analysis::components::{Connectivity, label_components, remove_small_regions};
    use dfmap::spatial::extent::Extent;
    use dfmap::spatial::mask::Mask;

    fn diagonal_pair() -> Mask {
        let mut mask = Mask::new(4, 4);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask
    }

    // Tests diagonal neighbours join only under eight-connectivity
    // Verified by using the four-neighbour offsets for Eight
    #[test]
    fn test_connectivity_changes_grouping() {
        let (_, four) = label_components(&diagonal_pair(), Connectivity::Four);
        let (_, eight) = label_components(&diagonal_pair(), Connectivity::Eight);

        assert_eq!(four.len(), 2);
        assert_eq!(eight.len(), 1);
        assert_eq!(eight[0].area, 2);
        assert_eq!(eight[0].bounds, Extent::new(1, 1, 3, 3));
    }

    // Tests labels follow row-major order of each region's first pixel
    // Verified by labeling from the last set pixel
    #[test]
    fn test_labels_in_row_major_order() {
        let mut mask = Mask::new(5, 5);
        mask.set(0, 4, true);
        mask.set(3, 0, true);
        mask.set(4, 0, true);

        let (labels, components) = label_components(&mask, Connectivity::Eight);
        assert_eq!(labels[(0, 4)], 1);
        assert_eq!(labels[(3, 0)], 2);
        assert_eq!(labels[(4, 0)], 2);
        assert_eq!(labels[(2, 2)], 0);
        assert_eq!(components[1].area, 2);
    }

    // Tests regions below the threshold are removed and others kept intact
    // Verified by comparing area with a strict greater-than
    #[test]
    fn test_remove_small_regions_threshold() {
        let mut mask = Mask::from_fn(10, 10, |row, col| row < 5 && col < 2);
        mask.set(8, 8, true);

        let cleaned = remove_small_regions(&mask, 10, Connectivity::Eight);
        assert_eq!(cleaned.count(), 10);
        assert!(!cleaned.get(8, 8));

        let stricter = remove_small_regions(&mask, 11, Connectivity::Eight);
        assert!(stricter.is_empty());
    }

    // Tests trivial thresholds return the mask unchanged
    // Verified by filtering with min_area of 2 for zero
    #[test]
    fn test_trivial_thresholds_are_identity() {
        let mask = diagonal_pair();
        assert_eq!(remove_small_regions(&mask, 0, Connectivity::Four), mask);
        assert_eq!(remove_small_regions(&mask, 1, Connectivity::Four), mask);
    }
}
