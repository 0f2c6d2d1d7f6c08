pub mod ip_extractor;
pub mod pipeline;

pub use ip_extractor::extract_client_ip;
pub use pipeline::{Tracker, VisitContext, VisitOutcome};
