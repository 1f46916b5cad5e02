use crate::capture_pipeline::frame::{Frame, PixelFormat};

/// Otsu's threshold: the level that maximises between-class variance of the
/// grayscale histogram. Pixels strictly above it are foreground.
///
/// A single-valued frame has no split; its only level is returned so that
/// nothing ends up in the foreground.
pub fn otsu_threshold(gray: &Frame) -> u8 {
    debug_assert_eq!(gray.format(), PixelFormat::Gray8);
    let mut histogram = [0u64; 256];
    for &v in gray.data() {
        histogram[v as usize] += 1;
    }

    let total = gray.data().len() as f64;
    if total == 0.0 {
        return 0;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = -1.0;
    let mut background_weight = 0.0;
    let mut background_sum = 0.0;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }
        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight;
        let between = background_weight
            * foreground_weight
            * (background_mean - foreground_mean)
            * (background_mean - foreground_mean);
        if between > best_variance {
            best_variance = between;
            best_level = level as u8;
        }
    }
    if best_variance < 0.0 {
        return histogram.iter().rposition(|&count| count > 0).unwrap_or(0) as u8;
    }
    best_level
}

/// Foreground mask: `true` where the pixel is strictly above `threshold`.
pub fn binarize_above(gray: &Frame, threshold: u8) -> Vec<bool> {
    gray.data().iter().map(|&v| v > threshold).collect()
}
