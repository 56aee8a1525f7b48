//! Color helpers.
//!
//! Colors are `Vec3` RGB triples in linear space, channels in `0.0..=1.0`.
//! Palette entries are written as sRGB hex strings and decoded to linear once,
//! at configuration time.

use glam::Vec3;

/// Parse a `#rrggbb` (or `rrggbb`) sRGB hex string into a linear RGB color.
///
/// Returns `None` when the string is not exactly six hex digits.
pub fn from_hex(hex: &str) -> Option<Vec3> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some(Vec3::new(
        srgb_to_linear(r as f32 / 255.0),
        srgb_to_linear(g as f32 / 255.0),
        srgb_to_linear(b as f32 / 255.0),
    ))
}

/// sRGB transfer function, encoded to linear.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// Convert RGB to HSL. All components in `0.0..=1.0`.
pub fn rgb_to_hsl(rgb: Vec3) -> Vec3 {
    let (r, g, b) = (rgb.x, rgb.y, rgb.z);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (min + max) / 2.0;

    if min == max {
        return Vec3::new(0.0, 0.0, lightness);
    }

    let delta = max - min;
    let saturation = if lightness <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let hue = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Vec3::new(hue / 6.0, saturation, lightness)
}

/// Convert HSL to RGB.
///
/// Hue wraps into `[0, 1)`; saturation and lightness are clamped to `[0, 1]`.
pub fn hsl_to_rgb(hsl: Vec3) -> Vec3 {
    let h = hsl.x.rem_euclid(1.0);
    let s = hsl.y.clamp(0.0, 1.0);
    let l = hsl.z.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let q = 2.0 * l - p;

    Vec3::new(
        hue_to_channel(q, p, h + 1.0 / 3.0),
        hue_to_channel(q, p, h),
        hue_to_channel(q, p, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * 6.0 * (2.0 / 3.0 - t);
    }
    p
}

/// Shift a color's HSL components by the given offsets.
pub fn offset_hsl(rgb: Vec3, dh: f32, ds: f32, dl: f32) -> Vec3 {
    let hsl = rgb_to_hsl(rgb);
    hsl_to_rgb(hsl + Vec3::new(dh, ds, dl))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(from_hex("#ffffff"), Some(Vec3::ONE));
        assert_eq!(from_hex("000000"), Some(Vec3::ZERO));
        assert!(from_hex("#fff").is_none());
        assert!(from_hex("#gg0000").is_none());
        assert!(from_hex("#ffd7001").is_none());
    }

    #[test]
    fn test_from_hex_is_linear() {
        // sRGB mid grey is ~0.214 in linear space.
        let grey = from_hex("#808080").unwrap();
        assert!((grey.x - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = rgb_to_hsl(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(red, Vec3::new(0.0, 1.0, 0.5)));

        let blue = hsl_to_rgb(Vec3::new(2.0 / 3.0, 1.0, 0.5));
        assert!(close(blue, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_hsl_round_trip_palette() {
        for hex in ["#FFD700", "#8a0303", "#008f51", "#011f10"] {
            let rgb = from_hex(hex).unwrap();
            assert!(close(hsl_to_rgb(rgb_to_hsl(rgb)), rgb), "{hex}");
        }
    }

    #[test]
    fn test_offset_lightness_clamps() {
        let white = offset_hsl(Vec3::ONE, 0.0, 0.0, 0.5);
        assert!(close(white, Vec3::ONE));

        let black = offset_hsl(Vec3::splat(0.1), 0.0, 0.0, -1.0);
        assert!(close(black, Vec3::ZERO));
    }

    #[test]
    fn test_offset_brightens() {
        let gold = from_hex("#FFD700").unwrap();
        let brighter = offset_hsl(gold, 0.0, 0.0, 0.1);
        assert!(rgb_to_hsl(brighter).z > rgb_to_hsl(gold).z);
    }
}
