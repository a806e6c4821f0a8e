//! Mipmap chain helpers.

/// Dimensions of mip `level`, never below 1x1
pub const fn level_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    let w = width >> level;
    let h = height >> level;
    (if w == 0 { 1 } else { w }, if h == 0 { 1 } else { h })
}

/// Byte size of one linearly stored level
pub const fn linear_size(width: u32, height: u32, bits_per_pixel: u8) -> usize {
    (width as usize * height as usize * bits_per_pixel as usize + 7) / 8
}

/// Halve an RGBA8888 image with a 2x2 box filter
pub fn downscale_half(rgba: &[u8], width: u32, height: u32) -> (Vec<u8>, u32, u32) {
    let (nw, nh) = level_dimensions(width, height, 1);
    let (w, h) = (width as usize, height as usize);
    let mut out = Vec::with_capacity(nw as usize * nh as usize * 4);

    for y in 0..nh as usize {
        for x in 0..nw as usize {
            let mut sum = [0u32; 4];
            let mut samples = 0;
            for sy in (y * 2)..(y * 2 + 2).min(h) {
                for sx in (x * 2)..(x * 2 + 2).min(w) {
                    let i = (sy * w + sx) * 4;
                    if let Some(px) = rgba.get(i..i + 4) {
                        for (acc, v) in sum.iter_mut().zip(px) {
                            *acc += *v as u32;
                        }
                        samples += 1;
                    }
                }
            }
            let samples = samples.max(1);
            out.extend(sum.iter().map(|v| ((v + samples / 2) / samples) as u8));
        }
    }
    (out, nw, nh)
}
