use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid metric query: {0}")]
    InvalidQuery(String),

    /// The statistics call failed or returned a response we could not read.
    #[error("fetching {query} failed: {source:#}")]
    Fetch {
        query: String,
        /// JSON of the request as sent, window included.
        request: String,
        #[source]
        source: anyhow::Error,
    },

    /// The call succeeded but carried no datapoints.
    #[error("no datapoints returned for {query}")]
    NoData { query: String },
}

impl PollError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, PollError::NoData { .. })
    }

    pub fn request(&self) -> Option<&str> {
        match self {
            PollError::Fetch { request, .. } => Some(request),
            _ => None,
        }
    }
}
