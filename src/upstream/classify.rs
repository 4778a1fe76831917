//! Upstream error classification
//!
//! Maps an [`UpstreamFailure`] onto exactly one [`ServiceErrorKind`]. Rules
//! are checked in order and the first match wins; each rule matches either
//! the normalized status code or a case-insensitive pattern over the
//! failure's text. Anything unmatched is `Unavailable`.

use super::UpstreamFailure;
use crate::error::ServiceErrorKind;

struct Rule {
    code: u16,
    patterns: &'static [&'static str],
    kind: ServiceErrorKind,
}

const RULES: &[Rule] = &[
    Rule {
        code: 429,
        patterns: &["rate limit", "rate_limit", "too many requests"],
        kind: ServiceErrorKind::RateLimit,
    },
    Rule {
        code: 402,
        patterns: &[
            "quota",
            "billing",
            "insufficient funds",
            "insufficient_funds",
        ],
        kind: ServiceErrorKind::QuotaExceeded,
    },
    Rule {
        code: 401,
        patterns: &[
            "invalid api key",
            "invalid_api_key",
            "incorrect api key",
            "authentication",
            "unauthorized",
        ],
        kind: ServiceErrorKind::Authentication,
    },
    Rule {
        code: 400,
        patterns: &["bad request", "invalid_request_error", "invalid request"],
        kind: ServiceErrorKind::BadUpstreamRequest,
    },
];

/// Classify an upstream failure into a service error kind
///
/// Total over all inputs. Raw upstream text is logged here and never
/// carried into the returned kind.
pub fn classify(failure: &UpstreamFailure) -> ServiceErrorKind {
    let text = failure.searchable_text();
    let kind = RULES
        .iter()
        .find(|rule| {
            failure.code() == Some(rule.code)
                || rule.patterns.iter().any(|pattern| text.contains(pattern))
        })
        .map(|rule| rule.kind)
        .unwrap_or(ServiceErrorKind::Unavailable);

    tracing::warn!(
        upstream_status = ?failure.code(),
        upstream_error = %failure,
        classified_as = kind.as_str(),
        "Classified upstream failure"
    );

    kind
}
