//! State tracked for every admitted URL and every domain
//!
//! # Components
//!
//! - `UrlStatus` / `Priority`: the per-URL lifecycle and scheduling class
//! - `UrlRecord`: one admitted URL and its retry accounting
//! - `DomainState`: per-domain spacing and failure-driven backoff

mod domain_state;
mod url_record;
mod url_status;

pub use domain_state::{backoff_duration, DomainState, BACKOFF_THRESHOLD};
pub use url_record::UrlRecord;
pub use url_status::{Priority, UrlStatus};
