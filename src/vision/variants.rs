//! Image variant generation
//!
//! Produces multiple preprocessed renderings of one image so that at
//! least one of them is legible to a brittle classifier or OCR call.
//! Ordering is fixed; downstream fusion relies on it for deterministic
//! tie-breaking.

use image::{imageops::FilterType, DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use tracing::debug;

use crate::config::VariantConfig;

/// One named rendering of a source image.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Stable name, e.g. "otsu" or "inverted-grayscale".
    pub name: String,
    pub image: DynamicImage,
}

/// Generate the full ordered variant list for an image.
///
/// Order: upscaled original, grayscale, Otsu binarization, adaptive
/// binarization, sharpened, locally equalized, then inverted copies of
/// each in the same order. A zero-area input yields an empty list.
pub fn generate_variants(image: &DynamicImage, config: &VariantConfig) -> Vec<Variant> {
    if image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }

    let upscaled = upscale(image, config.target_height, config.min_scale);
    let gray = upscaled.to_luma8();

    let mut variants = vec![
        Variant {
            name: "upscaled".to_string(),
            image: upscaled.clone(),
        },
        Variant {
            name: "grayscale".to_string(),
            image: DynamicImage::ImageLuma8(gray.clone()),
        },
    ];

    let level = otsu_level(&gray);
    variants.push(Variant {
        name: "otsu".to_string(),
        image: DynamicImage::ImageLuma8(threshold(&gray, level, ThresholdType::Binary)),
    });

    variants.push(Variant {
        name: "adaptive".to_string(),
        image: DynamicImage::ImageLuma8(adaptive_mean_threshold(
            &gray,
            config.adaptive_block_radius,
            config.adaptive_offset,
        )),
    });

    variants.push(Variant {
        name: "sharpened".to_string(),
        image: upscaled.unsharpen(1.0, 3),
    });

    variants.push(Variant {
        name: "equalized".to_string(),
        image: DynamicImage::ImageLuma8(equalize_tiles(
            &gray,
            config.equalize_tiles,
            config.equalize_clip_limit,
        )),
    });

    // Inverted copy of everything produced so far, in the same order.
    let inverted: Vec<Variant> = variants
        .iter()
        .map(|v| {
            let mut img = v.image.clone();
            img.invert();
            Variant {
                name: format!("inverted-{}", v.name),
                image: img,
            }
        })
        .collect();
    variants.extend(inverted);

    debug!(
        "generated {} variants at {}x{}",
        variants.len(),
        upscaled.width(),
        upscaled.height()
    );

    variants
}

/// Upscale to roughly `target_height`, never below `min_scale`.
pub(crate) fn upscale(image: &DynamicImage, target_height: u32, min_scale: f32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    let scale = (target_height as f32 / h as f32).max(min_scale);
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    image.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Adaptive mean thresholding with a constant offset, via integral image.
///
/// For each pixel, computes the mean over a `(2r+1) x (2r+1)` window
/// clamped to the image, then keeps the pixel white when its intensity
/// exceeds `mean - offset`.
pub(crate) fn adaptive_mean_threshold(gray: &GrayImage, block_radius: u32, offset: i16) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }

    // integral[y+1][x+1] = sum of gray[0..=y][0..=x]
    let iw = w + 1;
    let mut integral = vec![0i64; iw * (h + 1)];
    let data = gray.as_raw();

    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += data[y * w + x] as i64;
            integral[(y + 1) * iw + (x + 1)] = row_sum + integral[y * iw + (x + 1)];
        }
    }

    let r = block_radius as isize;
    let mut out = GrayImage::new(w as u32, h as u32);

    for y in 0..h {
        for x in 0..w {
            let y0 = (y as isize - r).max(0) as usize;
            let x0 = (x as isize - r).max(0) as usize;
            let y1 = ((y as isize + r).min(h as isize - 1) + 1) as usize;
            let x1 = ((x as isize + r).min(w as isize - 1) + 1) as usize;

            let area = ((y1 - y0) * (x1 - x0)) as f32;
            let sum = (integral[y1 * iw + x1] - integral[y0 * iw + x1] - integral[y1 * iw + x0]
                + integral[y0 * iw + x0]) as f32;

            let thresh = sum / area - offset as f32;
            let value = if (data[y * w + x] as f32) > thresh { 255 } else { 0 };
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    out
}

/// Tile-based local contrast equalization.
///
/// Splits the image into a `tiles x tiles` grid, builds a clipped
/// histogram-equalization mapping per tile, and bilinearly interpolates
/// between the four surrounding tile mappings at each pixel.
pub(crate) fn equalize_tiles(gray: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = (gray.width(), gray.height());
    if w == 0 || h == 0 {
        return gray.clone();
    }

    let tiles = tiles.max(1).min(w).min(h);
    let tile_w = (w + tiles - 1) / tiles;
    let tile_h = (h + tiles - 1) / tiles;

    // Per-tile clipped-CDF mappings.
    let mut mappings = vec![[0u8; 256]; (tiles * tiles) as usize];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y).0[0] as usize] += 1;
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }

            // Clip the histogram and hand the excess back evenly.
            let limit = ((clip_limit * count as f32 / 256.0).max(1.0)) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }
            let total: u32 = hist.iter().sum();

            let mapping = &mut mappings[(ty * tiles + tx) as usize];
            let mut cdf = 0u32;
            for (value, bin) in hist.iter().enumerate() {
                cdf += bin;
                mapping[value] = ((cdf as f32 / total as f32) * 255.0).round().min(255.0) as u8;
            }
        }
    }

    // Interpolate between the mappings of the four nearest tile centers.
    let mut out = GrayImage::new(w, h);
    let max_tile = (tiles - 1) as f32;
    for y in 0..h {
        let fy = (y as f32 / tile_h as f32 - 0.5).clamp(0.0, max_tile);
        let ty0 = fy.floor() as u32;
        let ty1 = (ty0 + 1).min(tiles - 1);
        let wy = fy - ty0 as f32;

        for x in 0..w {
            let fx = (x as f32 / tile_w as f32 - 0.5).clamp(0.0, max_tile);
            let tx0 = fx.floor() as u32;
            let tx1 = (tx0 + 1).min(tiles - 1);
            let wx = fx - tx0 as f32;

            let v = gray.get_pixel(x, y).0[0] as usize;
            let m00 = mappings[(ty0 * tiles + tx0) as usize][v] as f32;
            let m10 = mappings[(ty0 * tiles + tx1) as usize][v] as f32;
            let m01 = mappings[(ty1 * tiles + tx0) as usize][v] as f32;
            let m11 = mappings[(ty1 * tiles + tx1) as usize][v] as f32;

            let top = m00 * (1.0 - wx) + m10 * wx;
            let bottom = m01 * (1.0 - wx) + m11 * wx;
            let value = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x, y, image::Luma([value]));
        }
    }

    out
}
