//! Display colors for migrated groups and tags.

/// A random `#rrggbb` color. The legacy schema has no color data, so
/// migrated groups and tags each get an arbitrary one.
pub(crate) fn random_color() -> String {
    format!("#{:06x}", fastrand::u32(0..=0xFF_FFFF))
}
