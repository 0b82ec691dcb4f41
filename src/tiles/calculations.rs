//! Pure tile-pyramid arithmetic.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale factors for a tile pyramid: 1, 2, 4, … up to the first factor at
/// which a single tile covers the image's longer edge.
///
/// ```text
/// 3000×2000, tile 1024 → [1, 2, 4]
/// 1024×768,  tile 1024 → [1]
/// ```
pub fn scale_factors(width: u32, height: u32, tile_size: u32) -> Vec<u32> {
    let longest = width.max(height) as u64;
    let mut factors = vec![1u32];
    let mut sf = 1u32;
    while (tile_size as u64) * (sf as u64) < longest {
        sf *= 2;
        factors.push(sf);
    }
    factors
}

/// One rendered tile: a source region and the size it is scaled down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub region_width: u32,
    pub region_height: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    /// IIIF region segment: `full` when the tile covers the whole image,
    /// `x,y,w,h` otherwise.
    pub fn region(&self, image_width: u32, image_height: u32) -> String {
        if self.x == 0
            && self.y == 0
            && self.region_width == image_width
            && self.region_height == image_height
        {
            "full".to_string()
        } else {
            format!(
                "{},{},{},{}",
                self.x, self.y, self.region_width, self.region_height
            )
        }
    }

    /// Path of the tile relative to the tile-set root.
    pub fn path(&self, image_width: u32, image_height: u32) -> String {
        format!(
            "{}/{},/0/default.jpg",
            self.region(image_width, image_height),
            self.width
        )
    }
}

/// Tiles for one scale factor, row-major.
///
/// Each tile covers `tile_size * scale` source pixels (clipped at the right
/// and bottom edges) and is scaled down by `scale`.
pub fn tiles_at(width: u32, height: u32, tile_size: u32, scale: u32) -> Vec<Tile> {
    let step = tile_size.saturating_mul(scale);
    let mut tiles = Vec::new();
    let mut y = 0;
    while y < height {
        let region_height = step.min(height - y);
        let mut x = 0;
        while x < width {
            let region_width = step.min(width - x);
            tiles.push(Tile {
                x,
                y,
                region_width,
                region_height,
                width: region_width.div_ceil(scale),
                height: region_height.div_ceil(scale),
            });
            x += region_width;
        }
        y += region_height;
    }
    tiles
}

/// Whole-image sizes, one per scale factor, smallest first.
pub fn sizes(width: u32, height: u32, factors: &[u32]) -> Vec<(u32, u32)> {
    let mut out: Vec<(u32, u32)> = factors
        .iter()
        .rev()
        .map(|&sf| (width.div_ceil(sf), height.div_ceil(sf)))
        .collect();
    out.dedup();
    out
}

/// Path of a whole-image size relative to the tile-set root.
pub fn size_path(width: u32) -> String {
    format!("full/{},/0/default.jpg", width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factors_single_tile() {
        assert_eq!(scale_factors(1024, 768, 1024), vec![1]);
        assert_eq!(scale_factors(10, 10, 1024), vec![1]);
    }

    #[test]
    fn scale_factors_until_one_tile_covers() {
        assert_eq!(scale_factors(3000, 2000, 1024), vec![1, 2, 4]);
        assert_eq!(scale_factors(2048, 100, 1024), vec![1, 2]);
        assert_eq!(scale_factors(100, 2049, 1024), vec![1, 2, 4]);
    }

    #[test]
    fn tiles_at_full_resolution_clip_edges() {
        let tiles = tiles_at(300, 200, 128, 1);
        assert_eq!(tiles.len(), 6);
        assert_eq!(
            tiles[0],
            Tile {
                x: 0,
                y: 0,
                region_width: 128,
                region_height: 128,
                width: 128,
                height: 128
            }
        );
        let last = tiles[5];
        assert_eq!((last.x, last.y), (256, 128));
        assert_eq!((last.region_width, last.region_height), (44, 72));
        assert_eq!((last.width, last.height), (44, 72));
    }

    #[test]
    fn tiles_at_scale_round_up() {
        let tiles = tiles_at(300, 200, 128, 2);
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[1].x, tiles[1].region_width), (256, 44));
        assert_eq!((tiles[1].width, tiles[1].height), (22, 100));
    }

    #[test]
    fn tile_region_and_path() {
        let whole = tiles_at(300, 200, 128, 4)[0];
        assert_eq!(whole.region(300, 200), "full");
        assert_eq!(whole.path(300, 200), "full/75,/0/default.jpg");

        let part = tiles_at(300, 200, 128, 1)[1];
        assert_eq!(part.region(300, 200), "128,0,128,128");
        assert_eq!(part.path(300, 200), "128,0,128,128/128,/0/default.jpg");
    }

    #[test]
    fn sizes_smallest_first() {
        assert_eq!(
            sizes(3000, 2000, &[1, 2, 4]),
            vec![(750, 500), (1500, 1000), (3000, 2000)]
        );
    }

    #[test]
    fn sizes_round_up_odd_dimensions() {
        assert_eq!(sizes(301, 201, &[1, 2]), vec![(151, 101), (301, 201)]);
    }

    #[test]
    fn size_path_format() {
        assert_eq!(size_path(750), "full/750,/0/default.jpg");
    }
}
