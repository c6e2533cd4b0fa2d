//! Search-text derivation.
//!
//! The search text is a denormalized string stored on every record and
//! recomputed on each write. It is never derived at query time.

use crate::record::Record;

/// Default cap on the stored search text, in characters.
pub const DEFAULT_SEARCH_TEXT_MAX_LEN: usize = 512;

/// The fields of a record that contribute to its search text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFields<'a> {
    /// Alternative names.
    pub names: &'a [String],
    /// Email addresses.
    pub emails: &'a [String],
    /// Phone numbers.
    pub phones: &'a [String],
    /// Website.
    pub website: Option<&'a str>,
    /// Industry.
    pub industry: Option<&'a str>,
    /// Plan.
    pub plan: Option<&'a str>,
    /// Description.
    pub description: Option<&'a str>,
    /// Business code.
    pub code: Option<&'a str>,
}

impl<'a> From<&'a Record> for SearchFields<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            names: &record.names,
            emails: &record.emails,
            phones: &record.phones,
            website: record.website.as_deref(),
            industry: record.industry.as_deref(),
            plan: record.plan.as_deref(),
            description: record.description.as_deref(),
            code: record.code.as_deref(),
        }
    }
}

/// Builds the search text for `fields`.
///
/// Contributors are joined in a fixed order (names, emails, phones, website,
/// industry, plan, description, code), lowercased, whitespace-collapsed and
/// capped at `max_len` characters.
///
/// # Examples
///
/// ```
/// use crm_records::record::search_text::{fill_search_text, SearchFields};
///
/// let names = vec!["Acme".to_string()];
/// let emails = vec!["a@x".to_string()];
/// let fields = SearchFields {
///     names: &names,
///     emails: &emails,
///     code: Some("AC1"),
///     ..SearchFields::default()
/// };
/// assert_eq!(fill_search_text(&fields, 512), "acme a@x ac1");
/// ```
#[must_use]
pub fn fill_search_text(fields: &SearchFields<'_>, max_len: usize) -> String {
    let parts = [
        fields.names.join(" "),
        fields.emails.join(" "),
        fields.phones.join(" "),
        fields.website.unwrap_or_default().to_string(),
        fields.industry.unwrap_or_default().to_string(),
        fields.plan.unwrap_or_default().to_string(),
        fields.description.unwrap_or_default().to_string(),
        fields.code.unwrap_or_default().to_string(),
    ];
    normalize_search_text(&parts.join(" "), max_len)
}

/// Lowercases, collapses whitespace and truncates on a char boundary.
#[must_use]
pub fn normalize_search_text(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_len.saturating_mul(4)));
    let mut len = 0usize;

    for word in raw.split_whitespace() {
        if len >= max_len {
            break;
        }
        if len > 0 {
            out.push(' ');
            len += 1;
        }
        for ch in word.chars().flat_map(char::to_lowercase) {
            if len >= max_len {
                break;
            }
            out.push(ch);
            len += 1;
        }
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}
