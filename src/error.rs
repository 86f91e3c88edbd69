use thiserror::Error;

/// Failures while walking the catalog. Any of these aborts the whole
/// collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("unexpected page structure at {url}: {detail}")]
    StructureMismatch { url: String, detail: String },

    #[error("missing {field} on {url}")]
    MissingField { url: String, field: &'static str },

    #[error("could not parse {field} from {text:?} on {url}")]
    Parse {
        url: String,
        field: &'static str,
        text: String,
    },

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("invalid progress bar template: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type CollectResult<T> = Result<T, CollectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_error_does_not_claim_a_request() {
        let source = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        let err = CollectError::Client(source);
        assert_eq!(err.to_string(), "failed to build HTTP client");
    }
}
