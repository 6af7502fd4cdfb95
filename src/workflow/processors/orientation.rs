//! EXIF orientation values and the geometric transform each one calls for.
//!
//! An explanation of Exif orientation:
//! https://web.archive.org/web/20200412005226/https://www.impulseadventure.com/photo/exif-orientation.html

use image::DynamicImage;

/// Value of EXIF tag 0x0112.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationTag {
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    Transpose = 5,
    Rotate90 = 6,
    Transverse = 7,
    Rotate270 = 8,
}

impl OrientationTag {
    /// Anything outside 1..=8 is not an orientation and reads as `None`.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// True for the tags whose correction exchanges width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Turn stored pixels into the upright image. Rotations grow the canvas
    /// (a W×H input becomes H×W), nothing is cropped.
    ///
    /// `rotate90` in the `image` crate is clockwise.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => image,
            Self::FlipHorizontal => image.fliph(),
            Self::Rotate180 => image.rotate180(),
            Self::FlipVertical => image.flipv(),
            Self::Transpose => image.fliph().rotate270(),
            Self::Rotate90 => image.rotate90(),
            Self::Transverse => image.fliph().rotate90(),
            Self::Rotate270 => image.rotate270(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};

    const ALL_TAGS: [OrientationTag; 8] = [
        OrientationTag::Normal,
        OrientationTag::FlipHorizontal,
        OrientationTag::Rotate180,
        OrientationTag::FlipVertical,
        OrientationTag::Transpose,
        OrientationTag::Rotate90,
        OrientationTag::Transverse,
        OrientationTag::Rotate270,
    ];

    // Every pixel carries its own source coordinates so a mapping mistake is visible.
    fn numbered(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([(y * width + x) as u8])
        }))
    }

    /// Source pixel that must land on output (u, v) for an input of `w`×`h`.
    fn source_of(tag: OrientationTag, u: u32, v: u32, w: u32, h: u32) -> (u32, u32) {
        match tag {
            OrientationTag::Normal => (u, v),
            OrientationTag::FlipHorizontal => (w - 1 - u, v),
            OrientationTag::Rotate180 => (w - 1 - u, h - 1 - v),
            OrientationTag::FlipVertical => (u, h - 1 - v),
            OrientationTag::Transpose => (v, u),
            OrientationTag::Rotate90 => (v, h - 1 - u),
            OrientationTag::Transverse => (w - 1 - v, h - 1 - u),
            OrientationTag::Rotate270 => (w - 1 - v, u),
        }
    }

    #[test]
    fn from_exif_accepts_only_one_through_eight() {
        for value in 1..=8u32 {
            assert_eq!(OrientationTag::from_exif(value).map(|t| t.value() as u32), Some(value));
        }
        assert_eq!(OrientationTag::from_exif(0), None);
        assert_eq!(OrientationTag::from_exif(9), None);
        assert_eq!(OrientationTag::from_exif(274), None);
    }

    #[test]
    fn every_tag_moves_pixels_to_the_exif_position() {
        let (w, h) = (3, 5);
        let source = numbered(w, h);
        for tag in ALL_TAGS {
            let out = tag.apply(source.clone());
            for (u, v, pixel) in out.pixels() {
                let (x, y) = source_of(tag, u, v, w, h);
                assert_eq!(
                    pixel,
                    source.get_pixel(x, y),
                    "tag {:?}: output ({}, {}) should come from ({}, {})",
                    tag,
                    u,
                    v,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let source = numbered(100, 200);
        for tag in ALL_TAGS {
            let out = tag.apply(source.clone());
            if tag.swaps_dimensions() {
                assert_eq!(out.dimensions(), (200, 100), "{:?}", tag);
            } else {
                assert_eq!(out.dimensions(), (100, 200), "{:?}", tag);
            }
        }
    }

    #[test]
    fn normal_is_identity() {
        let source = numbered(4, 2);
        assert_eq!(OrientationTag::Normal.apply(source.clone()), source);
    }
}
