//! Easing curves mapping normalized time to eased progress.
//!
//! - Linear plus Sine/Quad/Cubic/Quart/Quint in, out and in-out variants
//! - CSS-style cubic Bezier timing (x(s) inverted numerically)
//! - Name parsing for stored definitions; unimplemented families fail fast
//!
//! Polynomial curves do not clamp their input so callers may extrapolate.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AnimationError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Ease {
    #[default]
    Linear,
    SineIn,
    SineOut,
    SineInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    /// Control points (x1, y1, x2, y2); endpoints are fixed at (0,0) and (1,1).
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

#[derive(Clone, Copy)]
enum Family {
    Sine,
    Power(i32),
}

impl Family {
    fn ease_in(self, t: f32) -> f32 {
        match self {
            Family::Sine => 1.0 - (t * FRAC_PI_2).cos(),
            Family::Power(n) => t.powi(n),
        }
    }

    fn ease_out(self, t: f32) -> f32 {
        match self {
            Family::Sine => (t * FRAC_PI_2).sin(),
            Family::Power(n) => 1.0 - (1.0 - t).powi(n),
        }
    }

    fn ease_in_out(self, t: f32) -> f32 {
        if t < 0.5 {
            self.ease_in(2.0 * t) / 2.0
        } else {
            0.5 + self.ease_out(2.0 * t - 1.0) / 2.0
        }
    }
}

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const SOLVE_EPS: f32 = 1e-6;

/// Cubic Bezier basis with p0 = 0 and p3 = 1.
#[inline]
fn bezier_axis(p1: f32, p2: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

#[inline]
fn bezier_axis_derivative(p1: f32, p2: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * p1 + 6.0 * u * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Solve x(s) = t for the curve parameter s, then return y(s).
fn bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if x1 == y1 && x2 == y2 {
        return t;
    }

    let mut s = t;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier_axis(x1, x2, s) - t;
        if err.abs() < SOLVE_EPS {
            return bezier_axis(y1, y2, s);
        }
        let d = bezier_axis_derivative(x1, x2, s);
        if d.abs() < SOLVE_EPS {
            break;
        }
        s -= err / d;
    }

    // Newton stalled or left the unit interval; x(s) is monotonic for x1/x2 in [0,1].
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    s = t;
    for _ in 0..BISECTION_ITERATIONS {
        let x = bezier_axis(x1, x2, s);
        if (x - t).abs() < SOLVE_EPS {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    bezier_axis(y1, y2, s)
}

impl Ease {
    /// Every named curve, in declaration order (excludes Bezier).
    pub const NAMED: [Ease; 16] = [
        Ease::Linear,
        Ease::SineIn,
        Ease::SineOut,
        Ease::SineInOut,
        Ease::QuadIn,
        Ease::QuadOut,
        Ease::QuadInOut,
        Ease::CubicIn,
        Ease::CubicOut,
        Ease::CubicInOut,
        Ease::QuartIn,
        Ease::QuartOut,
        Ease::QuartInOut,
        Ease::QuintIn,
        Ease::QuintOut,
        Ease::QuintInOut,
    ];

    pub const fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Ease::CubicBezier { x1, y1, x2, y2 }
    }

    /// CSS `ease`.
    pub const CSS_EASE: Ease = Ease::cubic_bezier(0.25, 0.1, 0.25, 1.0);
    /// CSS `ease-in`.
    pub const CSS_EASE_IN: Ease = Ease::cubic_bezier(0.42, 0.0, 1.0, 1.0);
    /// CSS `ease-out`.
    pub const CSS_EASE_OUT: Ease = Ease::cubic_bezier(0.0, 0.0, 0.58, 1.0);
    /// CSS `ease-in-out`.
    pub const CSS_EASE_IN_OUT: Ease = Ease::cubic_bezier(0.42, 0.0, 0.58, 1.0);

    /// Evaluate the curve at normalized time `t`.
    pub fn apply(self, t: f32) -> f32 {
        use Family::{Power, Sine};
        match self {
            Self::Linear => t,
            Self::SineIn => Sine.ease_in(t),
            Self::SineOut => Sine.ease_out(t),
            Self::SineInOut => Sine.ease_in_out(t),
            Self::QuadIn => Power(2).ease_in(t),
            Self::QuadOut => Power(2).ease_out(t),
            Self::QuadInOut => Power(2).ease_in_out(t),
            Self::CubicIn => Power(3).ease_in(t),
            Self::CubicOut => Power(3).ease_out(t),
            Self::CubicInOut => Power(3).ease_in_out(t),
            Self::QuartIn => Power(4).ease_in(t),
            Self::QuartOut => Power(4).ease_out(t),
            Self::QuartInOut => Power(4).ease_in_out(t),
            Self::QuintIn => Power(5).ease_in(t),
            Self::QuintOut => Power(5).ease_out(t),
            Self::QuintInOut => Power(5).ease_in_out(t),
            Self::CubicBezier { x1, y1, x2, y2 } => bezier_ease(t, x1, y1, x2, y2),
        }
    }

    /// Canonical snake_case name, e.g. `quad_in_out` or `cubic_bezier(0.42,0,0.58,1)`.
    pub fn name(self) -> String {
        let fixed = match self {
            Self::Linear => "linear",
            Self::SineIn => "sine_in",
            Self::SineOut => "sine_out",
            Self::SineInOut => "sine_in_out",
            Self::QuadIn => "quad_in",
            Self::QuadOut => "quad_out",
            Self::QuadInOut => "quad_in_out",
            Self::CubicIn => "cubic_in",
            Self::CubicOut => "cubic_out",
            Self::CubicInOut => "cubic_in_out",
            Self::QuartIn => "quart_in",
            Self::QuartOut => "quart_out",
            Self::QuartInOut => "quart_in_out",
            Self::QuintIn => "quint_in",
            Self::QuintOut => "quint_out",
            Self::QuintInOut => "quint_in_out",
            Self::CubicBezier { x1, y1, x2, y2 } => {
                return format!("cubic_bezier({x1},{y1},{x2},{y2})");
            }
        };
        fixed.to_string()
    }

    /// Parse a curve name. Accepts snake, kebab, spaced and CamelCase spellings, either
    /// word order (`quad_in` / `in_quad`), CSS keywords and `cubic-bezier(x1,y1,x2,y2)`.
    pub fn from_name(name: &str) -> Result<Ease> {
        let unsupported = || AnimationError::UnsupportedEasing {
            name: name.to_string(),
        };

        let trimmed = name.trim();
        let lower = trimmed.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("cubic-bezier(")
            .or_else(|| lower.strip_prefix("cubic_bezier("))
        {
            let args = args.strip_suffix(')').ok_or_else(unsupported)?;
            let parts: Vec<f32> = args
                .split(',')
                .map(|p| p.trim().parse::<f32>())
                .collect::<core::result::Result<_, _>>()
                .map_err(|_| unsupported())?;
            return match parts.as_slice() {
                [x1, y1, x2, y2] => Ok(Ease::cubic_bezier(*x1, *y1, *x2, *y2)),
                _ => Err(unsupported()),
            };
        }

        let tokens = tokenize(trimmed);
        let has_in = tokens.iter().any(|t| t == "in");
        let has_out = tokens.iter().any(|t| t == "out");
        let has_ease = tokens.iter().any(|t| t == "ease");
        let family: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !matches!(*t, "in" | "out" | "ease"))
            .collect();

        let ease = match (family.as_slice(), has_in, has_out) {
            (["linear"], false, false) => Ease::Linear,
            ([], false, false) if has_ease => Ease::CSS_EASE,
            ([], true, false) if has_ease => Ease::CSS_EASE_IN,
            ([], false, true) if has_ease => Ease::CSS_EASE_OUT,
            ([], true, true) if has_ease => Ease::CSS_EASE_IN_OUT,
            ([fam], i, o) => {
                let [ein, eout, einout] = match *fam {
                    "sine" => [Ease::SineIn, Ease::SineOut, Ease::SineInOut],
                    "quad" => [Ease::QuadIn, Ease::QuadOut, Ease::QuadInOut],
                    "cubic" => [Ease::CubicIn, Ease::CubicOut, Ease::CubicInOut],
                    "quart" => [Ease::QuartIn, Ease::QuartOut, Ease::QuartInOut],
                    "quint" => [Ease::QuintIn, Ease::QuintOut, Ease::QuintInOut],
                    _ => return Err(unsupported()),
                };
                match (i, o) {
                    (true, false) => ein,
                    (false, true) => eout,
                    (true, true) => einout,
                    (false, false) => return Err(unsupported()),
                }
            }
            _ => return Err(unsupported()),
        };
        Ok(ease)
    }
}

/// Split on `_`, `-`, whitespace and lower/upper case boundaries, lowercasing each token.
fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        current.push(ch.to_ascii_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Ease {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Ease {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ease::from_name(&name).map_err(serde::de::Error::custom)
    }
}
