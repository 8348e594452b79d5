use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stereoscopic frame layout, as understood by ffmpeg's `stereo3d` filter
///
/// The token is opaque: it is forwarded to ffmpeg as-is and never checked
/// locally, so an unsupported layout only fails once the engine runs.
/// See <https://ffmpeg.org/ffmpeg-filters.html#stereo3d> for the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StereoLayout(String);

impl StereoLayout {
    /// Side by side parallel, left eye first. Two views stacked horizontally
    /// always produce this layout.
    pub const SIDE_BY_SIDE_LEFT: &'static str = "sbsl";

    /// Layout tokens documented for ffmpeg's `stereo3d` filter, with a short
    /// description. Used for help output only.
    pub const KNOWN: &'static [(&'static str, &'static str)] = &[
        ("sbsl", "side by side parallel (left eye left, right eye right)"),
        ("sbsr", "side by side crosseye (right eye left, left eye right)"),
        ("sbs2l", "side by side parallel with half width resolution"),
        ("sbs2r", "side by side crosseye with half width resolution"),
        ("abl", "above-below (left eye above, right eye below)"),
        ("abr", "above-below (right eye above, left eye below)"),
        ("ab2l", "above-below with half height resolution (left eye above)"),
        ("ab2r", "above-below with half height resolution (right eye above)"),
        ("al", "alternating frames (left eye first)"),
        ("ar", "alternating frames (right eye first)"),
        ("irl", "interleaved rows (left eye top row)"),
        ("irr", "interleaved rows (right eye top row)"),
        ("icl", "interleaved columns (left eye first)"),
        ("icr", "interleaved columns (right eye first)"),
        ("arbg", "anaglyph red/blue gray"),
        ("argg", "anaglyph red/green gray"),
        ("arcg", "anaglyph red/cyan gray"),
        ("arch", "anaglyph red/cyan half colored"),
        ("arcc", "anaglyph red/cyan color"),
        ("arcd", "anaglyph red/cyan color optimized with the least squares projection of dubois"),
        ("agmg", "anaglyph green/magenta gray"),
        ("agmh", "anaglyph green/magenta half colored"),
        ("agmc", "anaglyph green/magenta colored"),
        ("agmd", "anaglyph green/magenta color optimized with the least squares projection of dubois"),
        ("aybg", "anaglyph yellow/blue gray"),
        ("aybh", "anaglyph yellow/blue half colored"),
        ("aybc", "anaglyph yellow/blue colored"),
        ("aybd", "anaglyph yellow/blue color optimized with the least squares projection of dubois"),
        ("ml", "mono output (left eye only)"),
        ("mr", "mono output (right eye only)"),
        ("chl", "checkerboard, left eye first"),
        ("chr", "checkerboard, right eye first"),
        ("hdmi", "HDMI frame pack"),
    ];

    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    /// The canonical layout produced by stacking two views
    pub fn side_by_side_left() -> Self {
        Self::new(Self::SIDE_BY_SIDE_LEFT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether ffmpeg documents this token. Informational only.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.iter().any(|(token, _)| *token == self.0)
    }
}

impl fmt::Display for StereoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StereoLayout {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for StereoLayout {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for StereoLayout {
    fn from(token: String) -> Self {
        Self(token)
    }
}
