// Application state shared across all modules

use std::sync::Arc;

use crate::auth::blacklist::Blacklist;
use crate::auth::store::CredentialStore;
use crate::common::config::Config;
use crate::services::{GoogleService, MailService};

/// Application state containing data access, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: CredentialStore,
    pub blacklist: Blacklist,
    pub mail_service: Arc<MailService>,
    pub google_service: Arc<GoogleService>,
}
