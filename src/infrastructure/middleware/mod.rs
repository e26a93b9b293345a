// Request-scoped identity for HTTP handlers

pub mod viewer_context_extractor;

pub use viewer_context_extractor::{AdminVc, Vc, USER_ID_HEADER, USER_ROLE_HEADER};
