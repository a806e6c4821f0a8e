//! Median-cut colour quantization for indexed imports
//!
//! Divides the RGBA colour space by splitting the bucket with the largest
//! volume along its widest channel until the requested number of colours is
//! reached, then maps every pixel to its nearest palette entry.

use std::collections::HashMap;

/// Reduce `colors` to at most `max_colors` representative colours
pub fn median_cut(colors: &[[u8; 4]], max_colors: usize) -> Vec<[u8; 4]> {
    let max_colors = max_colors.max(1);
    if colors.is_empty() {
        return vec![[0, 0, 0, 0xFF]];
    }

    let mut unique = colors.to_vec();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() <= max_colors {
        return unique;
    }

    let mut buckets: Vec<Vec<[u8; 4]>> = vec![colors.to_vec()];

    while buckets.len() < max_colors {
        let Some((split_idx, volume)) = buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (i, bucket_volume(b)))
            .max_by_key(|(_, v)| *v)
        else {
            break;
        };

        if volume == 0 {
            break;
        }

        let mut bucket = buckets.swap_remove(split_idx);
        if bucket.len() <= 1 {
            buckets.push(bucket);
            break;
        }

        let ranges = bucket_ranges(&bucket);
        let axis = (0..4).max_by_key(|&c| ranges[c]).unwrap_or(0);

        bucket.sort_unstable_by_key(|c| c[axis]);
        let right = bucket.split_off(bucket.len() / 2);

        buckets.push(bucket);
        if !right.is_empty() {
            buckets.push(right);
        }
    }

    buckets.iter().map(|b| average_color(b)).collect()
}

fn bucket_ranges(colors: &[[u8; 4]]) -> [u8; 4] {
    let mut min = [0xFFu8; 4];
    let mut max = [0u8; 4];
    for c in colors {
        for i in 0..4 {
            min[i] = min[i].min(c[i]);
            max[i] = max[i].max(c[i]);
        }
    }
    [
        max[0].saturating_sub(min[0]),
        max[1].saturating_sub(min[1]),
        max[2].saturating_sub(min[2]),
        max[3].saturating_sub(min[3]),
    ]
}

fn bucket_volume(colors: &[[u8; 4]]) -> u64 {
    if colors.len() <= 1 {
        return 0;
    }
    bucket_ranges(colors)
        .iter()
        .map(|&r| r as u64 + 1)
        .product::<u64>()
        .saturating_sub(1)
}

fn average_color(colors: &[[u8; 4]]) -> [u8; 4] {
    if colors.is_empty() {
        return [0, 0, 0, 0xFF];
    }
    let mut sum = [0u64; 4];
    for c in colors {
        for i in 0..4 {
            sum[i] += c[i] as u64;
        }
    }
    let n = colors.len() as u64;
    [
        ((sum[0] + n / 2) / n) as u8,
        ((sum[1] + n / 2) / n) as u8,
        ((sum[2] + n / 2) / n) as u8,
        ((sum[3] + n / 2) / n) as u8,
    ]
}

/// Index of the palette entry closest to `color`
pub fn nearest(color: [u8; 4], palette: &[[u8; 4]]) -> usize {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| {
            (0..4)
                .map(|i| {
                    let d = color[i] as i32 - p[i] as i32;
                    (d * d) as u32
                })
                .sum::<u32>()
        })
        .map_or(0, |(i, _)| i)
}

/// Map every colour onto `palette`, caching repeated colours
pub fn map_to_palette(colors: &[[u8; 4]], palette: &[[u8; 4]]) -> Vec<u8> {
    let mut cache: HashMap<[u8; 4], u8> = HashMap::new();
    colors
        .iter()
        .map(|c| *cache.entry(*c).or_insert_with(|| nearest(*c, palette) as u8))
        .collect()
}
