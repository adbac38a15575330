use std::sync::Arc;

use chrono::NaiveDate;
use server_api::ApiContext;

pub(crate) type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    /// Date stamped on attendance records.
    pub(crate) today: Clock,
}

impl AppState {
    pub(crate) fn new(api: ApiContext) -> Self {
        Self {
            api,
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }
}
