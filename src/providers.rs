//! Shared provider catalogue.
//!
//! Single source of truth for the selectable inference providers, their
//! display names, and the storage keys their API keys persist under.  Used by
//! both the chat console and the session controller.

/// A provider definition with its display name and an input hint for the key.
pub struct ProviderDef {
    pub id: &'static str,
    pub display: &'static str,
    /// Example of what the key looks like (shown next to the prompt).
    /// `None` means the provider does not take a key (e.g. Ollama).
    pub key_hint: Option<&'static str>,
}

pub const PROVIDERS: &[ProviderDef] = &[
    ProviderDef {
        id: "groq",
        display: "Groq",
        key_hint: Some("gsk_…"),
    },
    ProviderDef {
        id: "gemini",
        display: "Google Gemini",
        key_hint: Some("AIza…"),
    },
    ProviderDef {
        id: "ollama",
        display: "Ollama (local)",
        key_hint: None,
    },
];

/// Prefix for per-provider credential storage keys.  Concatenated with the
/// provider id, so keys never collide across providers.
const STORAGE_KEY_PREFIX: &str = "api_key_";

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Look up a provider by ID.
pub fn provider_by_id(id: &str) -> Option<&'static ProviderDef> {
    PROVIDERS.iter().find(|p| p.id == id)
}

/// Whether the provider needs an API key before chatting.  By convention
/// `ollama` is the only provider that runs without one.
pub fn requires_credential(id: &str) -> bool {
    id != "ollama"
}

/// Storage key under which the provider's API key is persisted.
pub fn storage_key(id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{id}")
}

/// Return the display name for the given provider ID.
pub fn display_name_for_provider(id: &str) -> &str {
    provider_by_id(id).map(|p| p.display).unwrap_or(id)
}

/// Return all provider IDs.
pub fn provider_ids() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.id).collect()
}
