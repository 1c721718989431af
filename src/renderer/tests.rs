// src/renderer/tests.rs

#[cfg(test)]
mod render_tests {
    use crate::color::Rgb;
    use crate::decoder::{
        BlockDecoder, BlockStream, Channel, DecodeError, ImageInfo, JpegBlockDecoder, McuBlock,
    };
    use crate::glyph::{CellSize, FontTable};
    use crate::renderer::*;
    use crate::surface::{FrameSurface, SurfaceHandle, SurfaceSource};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor as IoCursor;
    use std::vec::IntoIter;
    use test_log::test; // For logging within tests

    const MARKER: Rgb = Rgb::new(1, 2, 3);

    // --- Single-MCU decoder ---
    //
    // Treats the first byte of the blob as the gray level of a 16x16 image
    // held in one 16x16 MCU. An empty blob fails to decode.
    struct SolidMcuDecoder;

    impl BlockDecoder for SolidMcuDecoder {
        type Blocks = IntoIter<McuBlock>;

        fn begin(
            &self,
            stream: &mut BlockStream<'_>,
        ) -> Result<(ImageInfo, Self::Blocks), DecodeError> {
            let mut level = [0u8; 1];
            if stream.next(&mut level) == 0 {
                return Err(DecodeError::Empty);
            }
            let mut block = McuBlock::new(0, 0, 16, 16);
            block.channel_mut(Channel::Green).fill(level[0]);
            Ok((ImageInfo::new(16, 16, 16, 16), vec![block].into_iter()))
        }
    }

    fn marked_surface(width: u32, height: u32) -> FrameSurface {
        let mut surface = SurfaceHandle::new(SurfaceSource::Memory { width, height })
            .init()
            .unwrap();
        surface.fill(MARKER);
        surface
    }

    fn untouched(surface: &FrameSurface) -> bool {
        (0..surface.height())
            .all(|y| (0..surface.width()).all(|x| surface.get_pixel(x, y) == Some(MARKER)))
    }

    fn cell16() -> CellSize {
        CellSize::new(16, 16)
    }

    // --- Cursor movement ---

    #[test]
    fn line_break_resets_x_and_advances_one_cell_height() {
        let font = FontTable::empty("t", CellSize::new(10, 20)).with_glyph('A', b"\x80");
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(64, 64);

        let summary = renderer.render("A\n", Cursor::new(5, 7), &mut surface);

        assert_eq!(summary.cursor, Cursor::new(5, 27));
        assert_eq!(summary.line_breaks, 1);
    }

    #[test]
    fn line_break_behaves_the_same_when_the_glyph_is_missing() {
        let font = FontTable::empty("t", CellSize::new(10, 20));
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(64, 64);

        let summary = renderer.render("A\n", Cursor::new(5, 7), &mut surface);

        assert_eq!(summary.cursor, Cursor::new(5, 27));
        assert_eq!(summary.missing, 1);
    }

    #[test]
    fn missing_glyph_advances_and_writes_nothing() {
        let font = FontTable::empty("t", CellSize::new(12, 16));
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(64, 32);

        let summary = renderer.render("Zé\t", Cursor::new(3, 4), &mut surface);

        assert_eq!(summary.cursor, Cursor::new(3 + 3 * 12, 4));
        assert_eq!(summary.missing, 3);
        assert_eq!(summary.drawn, 0);
        assert!(untouched(&surface));
    }

    #[test]
    fn multiple_lines_restart_at_the_start_column() {
        let font = FontTable::empty("t", CellSize::new(8, 10));
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(8, 8);

        let summary = renderer.render("abc\nde\n\nf", Cursor::new(2, 0), &mut surface);

        assert_eq!(summary.cursor, Cursor::new(2 + 8, 30));
        assert_eq!(summary.line_breaks, 3);
    }

    // --- Compositing onto the surface ---

    #[test]
    fn solid_gray_glyph_lands_on_the_surface() {
        let font = FontTable::empty("t", cell16()).with_glyph('#', b"\x80");
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(40, 30);

        let summary = renderer.render("#", Cursor::new(8, 4), &mut surface);

        assert_eq!(summary.drawn, 1);
        assert_eq!(summary.cursor, Cursor::new(24, 4));
        for y in 0..30 {
            for x in 0..40 {
                let inside = (8..24).contains(&x) && (4..20).contains(&y);
                let expected = if inside { Rgb::gray(0x80) } else { MARKER };
                assert_eq!(surface.get_pixel(x, y), Some(expected), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn raster_is_cleared_between_glyphs() {
        // 'b' decodes to a narrower image, so any stale pixels from 'a'
        // would show up at the cell edges.
        struct NarrowAfterFirst;
        impl BlockDecoder for NarrowAfterFirst {
            type Blocks = IntoIter<McuBlock>;
            fn begin(
                &self,
                stream: &mut BlockStream<'_>,
            ) -> Result<(ImageInfo, Self::Blocks), DecodeError> {
                let mut tag = [0u8; 1];
                stream.next(&mut tag);
                let width = if tag[0] == b'a' { 16 } else { 8 };
                let mut block = McuBlock::new(0, 0, 16, 16);
                block.green.fill(0xC0);
                Ok((ImageInfo::new(width, 16, 16, 16), vec![block].into_iter()))
            }
        }

        let font = FontTable::empty("t", cell16())
            .with_glyph('a', b"a")
            .with_glyph('b', b"b");
        let mut renderer = TextRenderer::new(&font, NarrowAfterFirst);
        let mut surface = marked_surface(32, 16);

        renderer.render("ab", Cursor::new(0, 0), &mut surface);

        // Second cell: columns [4, 12) gray, the rest cleared to black.
        assert_eq!(surface.get_pixel(16, 0), Some(Rgb::gray(0)));
        assert_eq!(surface.get_pixel(16 + 4, 0), Some(Rgb::gray(0xC0)));
        assert_eq!(surface.get_pixel(16 + 11, 15), Some(Rgb::gray(0xC0)));
        assert_eq!(surface.get_pixel(16 + 12, 15), Some(Rgb::gray(0)));
        assert_eq!(surface.get_pixel(15, 0), Some(Rgb::gray(0xC0)));
    }

    #[test]
    fn failed_decode_still_advances_and_blits_an_empty_cell() {
        let font = FontTable::empty("t", cell16())
            .with_glyph('x', b"\x00garbage")
            .with_glyph('y', b"\x00");
        let mut renderer = TextRenderer::new(&font, JpegBlockDecoder::new());
        let mut surface = marked_surface(48, 16);

        let summary = renderer.render("xy", Cursor::new(0, 0), &mut surface);

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.drawn, 0);
        assert_eq!(summary.cursor, Cursor::new(32, 0));
        assert_eq!(surface.get_pixel(0, 0), Some(Rgb::gray(0)));
        assert_eq!(surface.get_pixel(31, 15), Some(Rgb::gray(0)));
        assert_eq!(surface.get_pixel(32, 0), Some(MARKER));
    }

    #[test]
    fn glyph_past_the_surface_edge_is_clipped() {
        let font = FontTable::empty("t", cell16()).with_glyph('#', b"\xFF");
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(20, 20);

        let summary = renderer.render("##", Cursor::new(10, 10), &mut surface);

        assert_eq!(summary.drawn, 2);
        assert_eq!(surface.get_pixel(19, 19), Some(Rgb::gray(0xFF)));
        assert_eq!(surface.get_pixel(9, 9), Some(MARKER));
    }

    #[test]
    fn cursor_saturates_instead_of_wrapping() {
        let font = FontTable::empty("t", cell16());
        let mut renderer = TextRenderer::new(&font, SolidMcuDecoder);
        let mut surface = marked_surface(4, 4);

        let summary = renderer.render("ab\n", Cursor::new(u32::MAX - 20, u32::MAX - 4), &mut surface);

        assert_eq!(summary.cursor, Cursor::new(u32::MAX - 20, u32::MAX));
    }

    #[test]
    fn real_jpeg_glyph_renders_as_gray_triples() {
        let img = GrayImage::from_pixel(16, 16, Luma([128]));
        let mut data = Vec::new();
        img.write_to(&mut IoCursor::new(&mut data), ImageFormat::Jpeg)
            .unwrap();

        let font = FontTable::empty("t", cell16()).with_glyph('g', &data);
        let mut renderer = TextRenderer::new(&font, JpegBlockDecoder::new());
        let mut surface = marked_surface(16, 16);

        let summary = renderer.render("g", Cursor::new(0, 0), &mut surface);

        assert_eq!(summary.drawn, 1);
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(surface.get_pixel(x, y), Some(Rgb::new(128, 128, 128)));
            }
        }
    }

    #[test]
    fn display_glyph_maps_luma_to_gray() {
        let mut raster = crate::compositor::GlyphRaster::new(2, 2);
        let compositor = crate::compositor::McuCompositor::new(SolidMcuDecoder);
        compositor.decode_and_composite(b"\x22", &mut raster).unwrap();
        let mut surface = marked_surface(4, 4);

        display_glyph(&mut surface, &raster, Cursor::new(1, 1));

        assert_eq!(surface.get_pixel(1, 1), Some(Rgb::gray(0x22)));
        assert_eq!(surface.get_pixel(2, 2), Some(Rgb::gray(0x22)));
        assert_eq!(surface.get_pixel(3, 3), Some(MARKER));
        assert_eq!(surface.get_pixel(0, 0), Some(MARKER));
    }

    #[test]
    fn builtin_font_draws_real_glyphs() {
        let font = FontTable::builtin();
        let mut surface = SurfaceHandle::new(SurfaceSource::Memory {
            width: 24,
            height: 8,
        })
        .init()
        .unwrap();

        let mut renderer = TextRenderer::new(&font, JpegBlockDecoder::new());
        let summary = renderer.render("H!", Cursor::new(0, 0), &mut surface);
        assert_eq!((summary.drawn, summary.failed), (2, 0));
        assert_eq!(summary.cursor, Cursor::new(16, 0));

        let level = |x, y| surface.get_pixel(x, y).unwrap().g;
        // 'H': both stems lit, the gap between them dark above the bar.
        assert!(level(0, 0) > 200, "{}", level(0, 0));
        assert!(level(5, 1) > 200, "{}", level(5, 1));
        assert!(level(3, 0) < 50, "{}", level(3, 0));
        assert!(level(3, 3) > 200, "{}", level(3, 3));
        // '!': the dot below a gap.
        assert!(level(8 + 2, 6) > 200, "{}", level(8 + 2, 6));
        assert!(level(8 + 2, 5) < 50, "{}", level(8 + 2, 5));
        // Nothing drawn past the second cell.
        assert_eq!(surface.get_pixel(20, 4), Some(Rgb::gray(0)));
    }
}
