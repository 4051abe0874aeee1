// src/services/mod.rs
//
// Shared services module: external collaborators (mail transport,
// OAuth provider) used by the auth handlers

pub mod email;
pub mod google;

// Re-export commonly used types for convenience
pub use email::MailService;
pub use google::GoogleService;
