//! WHOIS collaborator interface.
//!
//! No provider is wired: the record never carries a creation date, so
//! founded-year extraction falls back to page text. The interface stays
//! so the company profiler's inputs are explicit about where a creation
//! date would come from.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct WhoisRecord {
    pub domain: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub registrar: Option<String>,
}

/// Looks up registration data for a bare domain.
#[must_use]
pub fn lookup(domain: &str) -> Option<WhoisRecord> {
    let clean = domain
        .trim()
        .strip_prefix("https://")
        .or_else(|| domain.trim().strip_prefix("http://"))
        .unwrap_or_else(|| domain.trim());
    let clean = clean.strip_prefix("www.").unwrap_or(clean);
    let clean = clean.split('/').next().unwrap_or(clean);

    if clean.is_empty() {
        return None;
    }

    Some(WhoisRecord {
        domain: clean.to_owned(),
        creation_date: None,
        registrar: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_scheme_www_and_path() {
        let record = lookup("https://www.acme.io/about").expect("record");
        assert_eq!(record.domain, "acme.io");
        assert!(record.creation_date.is_none());
    }

    #[test]
    fn empty_domain_yields_nothing() {
        assert!(lookup("").is_none());
    }
}
