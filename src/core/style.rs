//! Colors, text attributes, and their escape-sequence rendering.

use std::fmt::Write as _;
use std::ops::BitOr;

use crate::core::capabilities::ColorTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's own default color.
    Default,
    /// One of the 16 basic palette entries; 8..=15 are the bright variants.
    Ansi(u8),
    /// An entry of the 256-color palette.
    Indexed(u8),
    Rgb(u8, u8, u8),
}

const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

const BASIC_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

impl Color {
    /// Parses `red`, `bright_red`, `default`, `#rgb`, `#rrggbb`, or a palette index.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim().to_ascii_lowercase();
        if spec == "default" || spec == "normal" {
            return Some(Self::Default);
        }
        if let Some(hex) = spec.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(name) = spec.strip_prefix("bright_") {
            let idx = BASIC_NAMES.iter().position(|candidate| *candidate == name)?;
            return Some(Self::Ansi(idx as u8 + 8));
        }
        if let Some(idx) = BASIC_NAMES.iter().position(|candidate| *candidate == spec) {
            return Some(Self::Ansi(idx as u8));
        }
        spec.parse::<u8>().ok().map(Self::Indexed)
    }

    pub fn to_rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Default => None,
            Self::Rgb(r, g, b) => Some((r, g, b)),
            Self::Ansi(idx) => Some(basic_rgb(idx)),
            Self::Indexed(idx) => Some(indexed_rgb(idx)),
        }
    }

    /// SGR parameters for this color as foreground or background at `tier`.
    fn sgr_params(self, background: bool, tier: ColorTier) -> String {
        let base = if background { 40 } else { 30 };
        match (self, tier) {
            (_, ColorTier::None) => String::new(),
            (Self::Default, _) => (base + 9).to_string(),
            (Self::Ansi(idx), _) => basic_param(base, idx),
            (Self::Indexed(idx), ColorTier::Ansi256 | ColorTier::TrueColor) => {
                format!("{};5;{idx}", base + 8)
            }
            (Self::Indexed(idx), ColorTier::Ansi16) if idx < 16 => basic_param(base, idx),
            (Self::Indexed(idx), ColorTier::Ansi16) => {
                let (r, g, b) = indexed_rgb(idx);
                basic_param(base, rgb_to_16(r, g, b))
            }
            (Self::Rgb(r, g, b), ColorTier::TrueColor) => {
                format!("{};2;{r};{g};{b}", base + 8)
            }
            (Self::Rgb(r, g, b), ColorTier::Ansi256) => {
                format!("{};5;{}", base + 8, rgb_to_256(r, g, b))
            }
            (Self::Rgb(r, g, b), ColorTier::Ansi16) => basic_param(base, rgb_to_16(r, g, b)),
        }
    }
}

fn basic_param(base: u8, idx: u8) -> String {
    if idx >= 8 {
        (base + 60 + (idx & 7)).to_string()
    } else {
        (base + idx).to_string()
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn basic_rgb(idx: u8) -> (u8, u8, u8) {
    let level = if idx >= 8 { 0xff } else { 0x80 };
    let idx = idx & 7;
    let pick = |bit: u8| if idx & bit != 0 { level } else { 0 };
    (pick(1), pick(2), pick(4))
}

fn indexed_rgb(idx: u8) -> (u8, u8, u8) {
    match idx {
        0..=15 => basic_rgb(idx),
        16..=231 => {
            let n = idx - 16;
            (
                CUBE_LEVELS[(n / 36) as usize],
                CUBE_LEVELS[((n / 6) % 6) as usize],
                CUBE_LEVELS[(n % 6) as usize],
            )
        }
        _ => {
            let level = 8 + (idx - 232) * 10;
            (level, level, level)
        }
    }
}

fn nearest_cube_index(channel: u8) -> u8 {
    let mut best = 0;
    let mut best_dist = u16::MAX;
    for (idx, level) in CUBE_LEVELS.iter().enumerate() {
        let dist = (i16::from(*level) - i16::from(channel)).unsigned_abs();
        if dist < best_dist {
            best = idx as u8;
            best_dist = dist;
        }
    }
    best
}

/// Nearest entry of the 256-color palette.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((u16::from(r) - 8) * 24 / 240) as u8;
    }
    16 + 36 * nearest_cube_index(r) + 6 * nearest_cube_index(g) + nearest_cube_index(b)
}

/// Nearest of the 8 basic colors, by per-channel threshold.
pub fn rgb_to_16(r: u8, g: u8, b: u8) -> u8 {
    u8::from(r >= 128) | (u8::from(g >= 128) << 1) | (u8::from(b >= 128) << 2)
}

/// Text attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Bold,
    Dim,
    Italic,
    Underline,
    Blink,
    Inverse,
}

impl Attr {
    pub const ALL: [Attr; 6] = [
        Attr::Bold,
        Attr::Dim,
        Attr::Italic,
        Attr::Underline,
        Attr::Blink,
        Attr::Inverse,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    fn sgr_on(self) -> u8 {
        match self {
            Attr::Bold => 1,
            Attr::Dim => 2,
            Attr::Italic => 3,
            Attr::Underline => 4,
            Attr::Blink => 5,
            Attr::Inverse => 7,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bold" => Some(Attr::Bold),
            "dim" => Some(Attr::Dim),
            "italic" => Some(Attr::Italic),
            "underline" => Some(Attr::Underline),
            "blink" => Some(Attr::Blink),
            "inverse" | "reverse" => Some(Attr::Inverse),
            _ => None,
        }
    }
}

/// Foreground, background and attributes, each of which may be left unset.
///
/// Unset fields inherit from whatever the style is merged over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    attrs_set: u8,
    attrs_on: u8,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs_set: 0,
            attrs_on: 0,
        }
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Sets `attr` explicitly on or off.
    pub fn with_attr(mut self, attr: Attr, on: bool) -> Self {
        self.attrs_set |= attr.bit();
        if on {
            self.attrs_on |= attr.bit();
        } else {
            self.attrs_on &= !attr.bit();
        }
        self
    }

    pub fn bold(self) -> Self {
        self.with_attr(Attr::Bold, true)
    }

    pub fn dim(self) -> Self {
        self.with_attr(Attr::Dim, true)
    }

    pub fn italic(self) -> Self {
        self.with_attr(Attr::Italic, true)
    }

    pub fn underline(self) -> Self {
        self.with_attr(Attr::Underline, true)
    }

    pub fn inverse(self) -> Self {
        self.with_attr(Attr::Inverse, true)
    }

    pub fn has(&self, attr: Attr) -> bool {
        self.attrs_on & attr.bit() != 0
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs_on == 0
    }

    /// Overlays `other` on top of `self`; fields set in `other` win.
    pub fn merge(&self, other: &Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attrs_set: self.attrs_set | other.attrs_set,
            attrs_on: (self.attrs_on & !other.attrs_set) | (other.attrs_on & other.attrs_set),
        }
    }

    /// Full SGR sequence that resets and then applies this style.
    ///
    /// Empty when `tier` is [`ColorTier::None`].
    pub fn to_sgr(&self, tier: ColorTier) -> String {
        if tier == ColorTier::None {
            return String::new();
        }
        let mut out = String::from("\x1b[0");
        for attr in Attr::ALL {
            if self.has(attr) {
                let _ = write!(out, ";{}", attr.sgr_on());
            }
        }
        if let Some(fg) = self.fg {
            let _ = write!(out, ";{}", fg.sgr_params(false, tier));
        }
        if let Some(bg) = self.bg {
            let _ = write!(out, ";{}", bg.sgr_params(true, tier));
        }
        out.push('m');
        out
    }
}

impl BitOr for Style {
    type Output = Style;

    fn bitor(self, rhs: Style) -> Style {
        self.merge(&rhs)
    }
}
