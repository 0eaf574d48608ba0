/// Eye selector for stereo rendering.
///
/// `Left` is eye index 0 and is also the only eye rendered in mono.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Eyes in render order.
    pub const ALL: [Eye; 2] = [Eye::Left, Eye::Right];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }

    /// Horizontal sign of the eye relative to the view axis.
    #[inline]
    pub const fn sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    /// Active eyes for a frame: left only in mono, left then right in stereo.
    #[inline]
    pub fn active(stereo_enabled: bool) -> &'static [Eye] {
        if stereo_enabled {
            &Self::ALL
        } else {
            &Self::ALL[..1]
        }
    }
}
