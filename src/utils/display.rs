/// Renders a float the way the desktop view always has: the shortest
/// round-trip representation cut to `width` characters, never rounded.
pub fn truncate(value: f64, width: usize) -> String {
    format!("{value:?}").chars().take(width).collect()
}
