//! Status payloads pushed over the status channel.
//!
//! Each payload is a self-contained HTML fragment. The landing page swaps the
//! elements in place by id (`proxy-reachable`, `status-icon`, `status-text`),
//! so both variants carry all three.

use crate::health::Liveness;

const ICON_REACHABLE: &str = r##"<svg viewBox="0 0 24 24" fill="none" stroke="#16a34a" stroke-width="2" xmlns="http://www.w3.org/2000/svg"><rect x="3" y="3" width="9" height="7" rx="1.5"/><rect x="12" y="13" width="9" height="7" rx="1.5"/><path d="M7.5 10v4.5a1.5 1.5 0 0 0 1.5 1.5h3"/><path d="M15 17l1.5 1.5L19 16"/></svg>"##;

const ICON_UNREACHABLE: &str = r##"<svg viewBox="0 0 24 24" fill="none" stroke="#dc2626" stroke-width="2" xmlns="http://www.w3.org/2000/svg"><rect x="3" y="3" width="9" height="7" rx="1.5"/><rect x="12" y="13" width="9" height="7" rx="1.5"/><path d="M7.5 10v3"/><path d="M5.5 15l4 4M9.5 15l-4 4"/></svg>"##;

/// The two fixed status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPayload {
    Reachable,
    Unreachable,
}

impl StatusPayload {
    pub fn kind(self) -> &'static str {
        match self {
            StatusPayload::Reachable => "reachable",
            StatusPayload::Unreachable => "unreachable",
        }
    }

    pub fn is_reachable(self) -> bool {
        matches!(self, StatusPayload::Reachable)
    }

    /// Render the fragment sent to the browser.
    pub fn to_html(self) -> String {
        let (icon, text) = match self {
            StatusPayload::Reachable => (ICON_REACHABLE, "proxy reachable, now"),
            StatusPayload::Unreachable => (ICON_UNREACHABLE, "proxy destination not reachable"),
        };
        format!(
            concat!(
                r#"<div id="proxy-reachable">{reachable}</div>"#,
                r#"<div id="status-icon" class="w-24 h-24">{icon}</div>"#,
                r#"<span id="status-text">{text}</span>"#,
            ),
            reachable = self.is_reachable(),
            icon = icon,
            text = text,
        )
    }
}

impl From<Liveness> for StatusPayload {
    fn from(liveness: Liveness) -> Self {
        match liveness {
            Liveness::Reachable => StatusPayload::Reachable,
            Liveness::Unreachable => StatusPayload::Unreachable,
        }
    }
}
