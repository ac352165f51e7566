//! Website-facing enrichment adapters: technology fingerprinting,
//! contact extraction, and company research, all built on one shared
//! page-fetch client and a regex-based HTML scanner.

pub mod company;
pub mod contact;
pub mod error;
mod html;
pub mod page;
pub mod technology;
pub mod whois;

pub use company::{research_company, CompanyHints};
pub use contact::{extract_contacts, ContactHints};
pub use error::WebscanError;
pub use page::{normalize_url, FetchedPage, PageClient};
pub use technology::detect_technologies;
