use crate::airtable::AirtableClient;
use crate::config::Config;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub airtable: AirtableClient,
    pub config: Config,
}

impl FromRef<AppState> for AirtableClient {
    fn from_ref(state: &AppState) -> Self {
        state.airtable.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
