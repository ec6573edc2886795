//! RGBA colors and CSS color string parsing.

use crate::value::format_number;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// An RGBA color with every channel in `0..=1`. Channels are stored without
/// alpha premultiplication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color { r, g, b, a }
    }

    /// Builds a color from 0-255 channels and a 0-1 alpha.
    pub fn from_rgba8(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color::new(r / 255.0, g / 255.0, b / 255.0, a)
    }

    /// Parses a CSS color string: hex, `rgb()`, `rgba()`, `hsl()`, `hsla()`
    /// or a named color. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Color> {
        let s = input.trim().to_ascii_lowercase();
        if s == "transparent" {
            return Some(Color::TRANSPARENT);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(color) = parse_function(&s) {
            return Some(color);
        }
        named_color(&s).map(|rgb| {
            Color::from_rgba8(
                ((rgb >> 16) & 0xff) as f64,
                ((rgb >> 8) & 0xff) as f64,
                (rgb & 0xff) as f64,
                1.0,
            )
        })
    }

    /// `[r, g, b, a]` with 0-255 color channels, as returned by `to-rgba`.
    pub fn to_rgba_array(&self) -> [f64; 4] {
        [self.r * 255.0, self.g * 255.0, self.b * 255.0, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({},{},{},{})",
            (self.r * 255.0).round(),
            (self.g * 255.0).round(),
            (self.b * 255.0).round(),
            format_number(self.a)
        )
    }
}

/// Validates `rgb`/`rgba` operands, returning the diagnostic on failure.
pub fn validate_rgba(r: f64, g: f64, b: f64, a: Option<f64>) -> Result<(), String> {
    let channel_ok = |c: f64| (0.0..=255.0).contains(&c);
    if !(channel_ok(r) && channel_ok(g) && channel_ok(b)) {
        let mut parts = vec![r, g, b];
        parts.extend(a);
        return Err(format!(
            "Invalid rgba value [{}]: 'r', 'g', and 'b' must be between 0 and 255.",
            join_numbers(&parts)
        ));
    }
    if let Some(a) = a {
        if !(0.0..=1.0).contains(&a) {
            return Err(format!(
                "Invalid rgba value [{}]: 'a' must be between 0 and 1.",
                join_numbers(&[r, g, b, a])
            ));
        }
    }
    Ok(())
}

fn join_numbers(parts: &[f64]) -> String {
    parts
        .iter()
        .map(|n| format_number(*n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| (d * 17) as f64);
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|d| d as f64);
    match hex.len() {
        3 => Some(Color::from_rgba8(digit(0)?, digit(1)?, digit(2)?, 1.0)),
        4 => Some(Color::from_rgba8(
            digit(0)?,
            digit(1)?,
            digit(2)?,
            digit(3)? / 255.0,
        )),
        6 => Some(Color::from_rgba8(pair(0)?, pair(2)?, pair(4)?, 1.0)),
        8 => Some(Color::from_rgba8(
            pair(0)?,
            pair(2)?,
            pair(4)?,
            pair(6)? / 255.0,
        )),
        _ => None,
    }
}

fn function_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(rgba?|hsla?)\(\s*([^)]*?)\s*\)$").expect("color function pattern is valid")
    })
}

fn parse_function(s: &str) -> Option<Color> {
    let caps = function_regex().captures(s)?;
    let name = caps.get(1)?.as_str();
    let body = caps.get(2)?.as_str();
    let args: Vec<&str> = if body.contains(',') {
        body.split(',').map(str::trim).collect()
    } else {
        body.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|p| !p.is_empty())
            .collect()
    };
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let alpha = match args.get(3) {
        Some(a) => parse_alpha(a)?,
        None => 1.0,
    };
    if name.starts_with("rgb") {
        let r = parse_rgb_channel(args[0])?;
        let g = parse_rgb_channel(args[1])?;
        let b = parse_rgb_channel(args[2])?;
        Some(Color::new(r, g, b, alpha))
    } else {
        let h = args[0].trim_end_matches("deg").parse::<f64>().ok()?;
        let s = parse_percent(args[1])?;
        let l = parse_percent(args[2])?;
        let (r, g, b) = hsl_to_rgb(h, s, l);
        Some(Color::new(r, g, b, alpha))
    }
}

fn parse_rgb_channel(s: &str) -> Option<f64> {
    if s.ends_with('%') {
        parse_percent(s)
    } else {
        let v = s.parse::<f64>().ok()?;
        Some((v / 255.0).clamp(0.0, 1.0))
    }
}

fn parse_percent(s: &str) -> Option<f64> {
    let v = s.strip_suffix('%')?.parse::<f64>().ok()?;
    Some((v / 100.0).clamp(0.0, 1.0))
}

fn parse_alpha(s: &str) -> Option<f64> {
    if s.ends_with('%') {
        parse_percent(s)
    } else {
        s.parse::<f64>().ok().map(|a| a.clamp(0.0, 1.0))
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0) / 360.0;
    let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
    let m1 = l * 2.0 - m2;
    let hue = |mut h: f64| {
        if h < 0.0 {
            h += 1.0;
        } else if h > 1.0 {
            h -= 1.0;
        }
        if h * 6.0 < 1.0 {
            m1 + (m2 - m1) * h * 6.0
        } else if h * 2.0 < 1.0 {
            m2
        } else if h * 3.0 < 2.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
        } else {
            m1
        }
    };
    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

fn named_color(name: &str) -> Option<u32> {
    NAMED_COLORS
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| NAMED_COLORS[i].1)
}

// Sorted by name for binary search.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];
