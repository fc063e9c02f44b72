/// Built-in text for every editable region of the site.
///
/// This table is the authoritative key set: rows are seeded from it on first
/// boot, `reset-all` writes it back verbatim, and `Set` rejects any key that
/// does not appear here.
pub const DEFAULT_TEXTS: &[(&str, &str)] = &[
    ("main_header", "SAY GUGNAG"),
    ("button_text", "CLICK TO SAY GUGNAG"),
    (
        "top_marquee",
        "⚠️ Warning: Screaming this word at the top of your lungs will result in PAIN ⚠️",
    ),
    ("spinning_text", "🌟 THE WORD YOUR TEACHER LOVES 🌟"),
    ("badge1", "⭐ FAVORITE WORD AMONGST YAHOO USERS ⭐"),
    ("badge2", "💯 100% APPROVED BY ZERO TEACHERS 💯"),
    ("badge3", "🔥 UNDER CONSTRUCTION 🔥"),
    ("footer_copyright", "© 2024 \"GUGNAG DANIALS\" ENTERPRISES™"),
    ("popup_checkbox", "turn off popups like a coward"),
];

/// True if `key` is one of the predefined editable regions.
pub fn is_known_key(key: &str) -> bool {
    DEFAULT_TEXTS.iter().any(|(k, _)| *k == key)
}

/// Default value for `key`, if it is a known key.
pub fn default_for(key: &str) -> Option<&'static str> {
    DEFAULT_TEXTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}
