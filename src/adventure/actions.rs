//! Semantic action IDs for Relic Trail click targets.

// ── Location cards (0-based index into the catalog) ───────────
pub const LOCATION_BASE: u16 = 10;
/// Upper bound on clickable cards; later cards are keyboard-unreachable too.
pub const MAX_LOCATIONS: u16 = 9;

// ── Dialog ────────────────────────────────────────────────────
pub const SUBMIT_ANSWER: u16 = 100;
pub const ERASE_ANSWER: u16 = 101;

// ── Help bar ──────────────────────────────────────────────────
pub const TOGGLE_MUSIC: u16 = 110;
pub const RETRY_LOAD: u16 = 120;
