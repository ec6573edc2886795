//! CIELAB and HCL conversions used by `interpolate-lab` / `interpolate-hcl`.
//!
//! Uses the D50 reference white with Bradford-adapted sRGB primaries.

use crate::color::Color;

const XN: f64 = 0.96422;
const YN: f64 = 1.0;
const ZN: f64 = 0.82521;
const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;
const T3: f64 = T1 * T1 * T1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
    pub alpha: f64,
}

/// Hue is NaN for achromatic colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hcl {
    pub h: f64,
    pub c: f64,
    pub l: f64,
    pub alpha: f64,
}

fn xyz_to_lab(t: f64) -> f64 {
    if t > T3 {
        t.cbrt()
    } else {
        t / T2 + T0
    }
}

fn lab_to_xyz(t: f64) -> f64 {
    if t > T1 {
        t * t * t
    } else {
        T2 * (t - T0)
    }
}

fn xyz_to_rgb(x: f64) -> f64 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

fn rgb_to_xyz(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

pub fn rgb_to_lab(color: &Color) -> Lab {
    let r = rgb_to_xyz(color.r);
    let g = rgb_to_xyz(color.g);
    let b = rgb_to_xyz(color.b);
    let y = xyz_to_lab((0.2225045 * r + 0.7168786 * g + 0.0606169 * b) / YN);
    let (x, z) = if r == g && g == b {
        (y, y)
    } else {
        (
            xyz_to_lab((0.4360747 * r + 0.3850649 * g + 0.1430804 * b) / XN),
            xyz_to_lab((0.0139322 * r + 0.0971045 * g + 0.7141733 * b) / ZN),
        )
    };
    Lab {
        l: 116.0 * y - 16.0,
        a: 500.0 * (x - y),
        b: 200.0 * (y - z),
        alpha: color.a,
    }
}

pub fn lab_to_rgb(lab: &Lab) -> Color {
    let y = (lab.l + 16.0) / 116.0;
    let x = if lab.a.is_nan() { y } else { y + lab.a / 500.0 };
    let z = if lab.b.is_nan() { y } else { y - lab.b / 200.0 };
    let y = YN * lab_to_xyz(y);
    let x = XN * lab_to_xyz(x);
    let z = ZN * lab_to_xyz(z);
    Color::new(
        xyz_to_rgb(3.1338561 * x - 1.6168667 * y - 0.4906146 * z).clamp(0.0, 1.0),
        xyz_to_rgb(-0.9787684 * x + 1.9161415 * y + 0.0334540 * z).clamp(0.0, 1.0),
        xyz_to_rgb(0.0719453 * x - 0.2289914 * y + 1.4052427 * z).clamp(0.0, 1.0),
        lab.alpha,
    )
}

pub fn rgb_to_hcl(color: &Color) -> Hcl {
    let lab = rgb_to_lab(color);
    let c = (lab.a * lab.a + lab.b * lab.b).sqrt();
    let h = if c < 1e-9 {
        f64::NAN
    } else {
        let h = lab.b.atan2(lab.a).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    };
    Hcl {
        h,
        c,
        l: lab.l,
        alpha: lab.alpha,
    }
}

pub fn hcl_to_rgb(hcl: &Hcl) -> Color {
    let h = if hcl.h.is_nan() { 0.0 } else { hcl.h.to_radians() };
    lab_to_rgb(&Lab {
        l: hcl.l,
        a: h.cos() * hcl.c,
        b: h.sin() * hcl.c,
        alpha: hcl.alpha,
    })
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn interpolate_hue(a: f64, b: f64, t: f64) -> f64 {
    let mut d = b - a;
    if b > a && d > 180.0 {
        d -= 360.0;
    } else if b < a && a - b > 180.0 {
        d += 360.0;
    }
    a + t * d
}

pub fn interpolate_lab(from: &Color, to: &Color, t: f64) -> Color {
    let a = rgb_to_lab(from);
    let b = rgb_to_lab(to);
    lab_to_rgb(&Lab {
        l: lerp(a.l, b.l, t),
        a: lerp(a.a, b.a, t),
        b: lerp(a.b, b.b, t),
        alpha: lerp(a.alpha, b.alpha, t),
    })
}

pub fn interpolate_hcl(from: &Color, to: &Color, t: f64) -> Color {
    let a = rgb_to_hcl(from);
    let b = rgb_to_hcl(to);
    let mut chroma = None;
    let hue = match (a.h.is_nan(), b.h.is_nan()) {
        (false, false) => interpolate_hue(a.h, b.h, t),
        (false, true) => {
            if b.l == 0.0 || b.l == 100.0 {
                chroma = Some(a.c);
            }
            a.h
        }
        (true, false) => {
            if a.l == 0.0 || a.l == 100.0 {
                chroma = Some(b.c);
            }
            b.h
        }
        (true, true) => f64::NAN,
    };
    hcl_to_rgb(&Hcl {
        h: hue,
        c: chroma.unwrap_or_else(|| lerp(a.c, b.c, t)),
        l: lerp(a.l, b.l, t),
        alpha: lerp(a.alpha, b.alpha, t),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Color, b: &Color) -> bool {
        (a.r - b.r).abs() < 5e-3
            && (a.g - b.g).abs() < 5e-3
            && (a.b - b.b).abs() < 5e-3
            && (a.a - b.a).abs() < 5e-3
    }

    #[test]
    fn lab_round_trips() {
        let c = Color::new(0.2, 0.4, 0.6, 0.8);
        assert!(close(&lab_to_rgb(&rgb_to_lab(&c)), &c));
    }

    #[test]
    fn white_has_full_lightness() {
        let lab = rgb_to_lab(&Color::WHITE);
        assert!((lab.l - 100.0).abs() < 5e-3);
        assert!(lab.a.abs() < 1e-9 && lab.b.abs() < 1e-9);
    }

    #[test]
    fn hcl_end_points_are_exact() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let blue = Color::new(0.0, 0.0, 1.0, 1.0);
        assert!(close(&interpolate_hcl(&red, &blue, 0.0), &red));
        assert!(close(&interpolate_hcl(&red, &blue, 1.0), &blue));
    }
}
