//! Tests for classification colour palettes

#[cfg(test)]
mod tests {
    use dfmap::io::palette::{Palette, PalettePolicy};
    use dfmap::spatial::terrain::TileClass;

    // Tests the binary palette colours every non-open glyph black
    // Verified by leaving terrain glyphs without a colour
    #[test]
    fn test_binary_palette() {
        let palette = Palette::binary();
        assert_eq!(palette.open_color(), [0xFE, 0xFE, 0xFE]);
        assert_eq!(palette.color(TileClass::Open), Some([0xFE, 0xFE, 0xFE]));
        for glyph in "1?srTB~gpM9".chars() {
            let class = TileClass::from_glyph(glyph).expect("glyph should be known");
            assert_eq!(palette.color(class), Some([0x01, 0x01, 0x01]), "glyph {glyph}");
        }
        assert_eq!(Palette::default(), palette);
    }

    // Tests the terrain palette colours every glyph class
    // Verified by removing a terrain entry
    #[test]
    fn test_terrain_palette_complete() {
        let palette = Palette::from_policy(PalettePolicy::Terrain);
        for glyph in "01?srTB~gpM".chars() {
            let class = TileClass::from_glyph(glyph).expect("glyph should be known");
            assert!(palette.color(class).is_some(), "no colour for {glyph}");
        }
    }

    // Tests custom entries override built-in colours
    // Verified by ignoring later insertions
    #[test]
    fn test_palette_with() {
        let palette = Palette::new([0, 0, 0])
            .with(TileClass::Marked(2), [9, 9, 9])
            .with(TileClass::Water, [1, 2, 3]);
        assert_eq!(palette.open_color(), [0, 0, 0]);
        assert_eq!(palette.color(TileClass::Marked(2)), Some([9, 9, 9]));
        assert_eq!(palette.color(TileClass::Marked(1)), None);
        assert_eq!(palette.color(TileClass::Water), Some([1, 2, 3]));
        assert!(
            palette
                .missing_color(TileClass::Tree)
                .to_string()
                .contains('T')
        );

        let palette = palette.with_fallback([7, 7, 7]);
        assert_eq!(palette.color(TileClass::Tree), Some([7, 7, 7]));
        assert_eq!(palette.color(TileClass::Water), Some([1, 2, 3]));
        assert_eq!(palette.color(TileClass::Open), Some([0, 0, 0]));
    }
}
