//! Store key constants.

/// Persisted keys used by the client.
pub struct StoreKeys;

impl StoreKeys {
    /// Bearer credential for API calls.
    pub const TOKEN: &'static str = "token";

    /// Learning goals (JSON array).
    pub const GOALS: &'static str = "skillexa_goals";

    /// Whether the onboarding tour has been completed.
    pub const TOUR_COMPLETED: &'static str = "skillexa_tour_completed";

    /// Key for a dismissible feature spotlight flag.
    pub fn spotlight(feature: &str) -> String {
        format!("spotlight_{feature}")
    }
}
