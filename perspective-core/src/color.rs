//! RGBA colours and hex parsing.

/// An 8-bit straight-alpha colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the export background.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Amber outline used for locked vanishing-point markers.
    pub const AMBER: Self = Self::rgb(0xfb, 0xbf, 0x24);

    /// Workspace clear colour behind the image.
    pub const WORKSPACE: Self = Self::rgb(0x02, 0x06, 0x17);

    /// Backdrop filled under the reference image.
    pub const IMAGE_BACKDROP: Self = Self::rgb(0x0f, 0x17, 0x2a);

    /// Fallback when a layer colour cannot be parsed.
    pub const FALLBACK: Self = Self::rgb(0x3b, 0x82, 0xf6);

    /// Create an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    #[must_use]
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)?;
                    #[allow(clippy::cast_possible_truncation)]
                    let v = v as u8;
                    *slot = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: channel(&hex[6..8])?,
            }),
            _ => None,
        }
    }

    /// Parse a layer colour, logging and falling back on failure.
    #[must_use]
    pub fn from_layer_color(input: &str) -> Self {
        Self::parse_hex(input).unwrap_or_else(|| {
            tracing::warn!("Unparseable layer colour {input:?}, using fallback");
            Self::FALLBACK
        })
    }
}
