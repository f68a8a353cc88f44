//! Node appearance records and the fallthrough merge.
//!
//! A [`NodeAppearance`] is *partial*: every field is optional, and unset
//! fields fall through to the layer below when merged. The bottom of every
//! merge chain is a [`ResolvedAppearance`], where all fields are concrete.

/// Outline color, a 3-bit palette packed into the texel flag byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutlineColor {
    /// No outline drawn.
    #[default]
    NoOutline = 0,
    White = 1,
    Black = 2,
    Cyan = 3,
    Blue = 4,
    Green = 5,
    Red = 6,
    Orange = 7,
}

impl OutlineColor {
    /// The palette index packed into texel flag bits 3..=5.
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// A fully resolved appearance with no unset fields.
///
/// This is what actually gets packed into a texel; see
/// [`flags`](Self::flags) for the bit layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedAppearance {
    /// Override color, RGB.
    pub color: [u8; 3],
    /// Whether the node is rendered at all.
    pub visible: bool,
    /// Whether the node is drawn in front of all regular geometry.
    pub render_in_front: bool,
    /// Whether the node is drawn ghosted (translucent, desaturated).
    pub render_ghosted: bool,
    /// Outline color, if any.
    pub outline: OutlineColor,
}

impl Default for ResolvedAppearance {
    /// Visible, un-styled, no outline. A zero color means "no color
    /// override" to the shading collaborator.
    fn default() -> Self {
        Self {
            color: [0, 0, 0],
            visible: true,
            render_in_front: false,
            render_ghosted: false,
            outline: OutlineColor::NoOutline,
        }
    }
}

impl ResolvedAppearance {
    /// Pack the boolean fields and outline into the texel flag byte:
    /// `visible(1) | in_front(2) | ghosted(4) | outline << 3`.
    pub fn flags(&self) -> u8 {
        u8::from(self.visible)
            | u8::from(self.render_in_front) << 1
            | u8::from(self.render_ghosted) << 2
            | self.outline.bits() << 3
    }
}

/// A partial appearance; unset fields fall through to the layer below.
///
/// # Example
///
/// ```
/// use stratum_style::{NodeAppearance, ResolvedAppearance};
///
/// let merged = NodeAppearance::GHOSTED.applied_over(&ResolvedAppearance::default());
/// assert!(merged.render_ghosted);
/// assert!(merged.visible); // fell through to the default
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeAppearance {
    /// Override color, RGB.
    pub color: Option<[u8; 3]>,
    /// Whether the node is rendered at all.
    pub visible: Option<bool>,
    /// Whether the node is drawn in front of all regular geometry.
    pub render_in_front: Option<bool>,
    /// Whether the node is drawn ghosted.
    pub render_ghosted: Option<bool>,
    /// Outline color.
    pub outline: Option<OutlineColor>,
}

impl NodeAppearance {
    /// No overrides; every field falls through.
    pub const DEFAULT: Self = Self {
        color: None,
        visible: None,
        render_in_front: None,
        render_ghosted: None,
        outline: None,
    };

    /// Tinted and drawn in front, the stock selection style.
    pub const HIGHLIGHTED: Self = Self {
        color: Some([100, 100, 255]),
        render_in_front: Some(true),
        ..Self::DEFAULT
    };

    /// Translucent and desaturated.
    pub const GHOSTED: Self = Self {
        render_ghosted: Some(true),
        ..Self::DEFAULT
    };

    /// Not rendered.
    pub const HIDDEN: Self = Self {
        visible: Some(false),
        ..Self::DEFAULT
    };

    /// Drawn in front of regular geometry without a tint.
    pub const IN_FRONT: Self = Self {
        render_in_front: Some(true),
        ..Self::DEFAULT
    };

    /// White outline.
    pub const OUTLINED: Self = Self {
        outline: Some(OutlineColor::White),
        ..Self::DEFAULT
    };

    /// Merge this appearance over `base`: set fields override, unset fields
    /// fall through.
    pub fn applied_over(&self, base: &ResolvedAppearance) -> ResolvedAppearance {
        ResolvedAppearance {
            color: self.color.unwrap_or(base.color),
            visible: self.visible.unwrap_or(base.visible),
            render_in_front: self.render_in_front.unwrap_or(base.render_in_front),
            render_ghosted: self.render_ghosted.unwrap_or(base.render_ghosted),
            outline: self.outline.unwrap_or(base.outline),
        }
    }
}
