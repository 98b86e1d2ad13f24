use http::header::{CONNECTION, CONTENT_TYPE};
use http::StatusCode;
use reqwest::Client;
use tracing::{debug, info};

use crate::cache::token::Token;
use crate::config::credentials::CredentialConfig;
use crate::config::settings::{HttpConfig, SettingsConfig};
use crate::error::TokenError;
use crate::helpers::time::{get_instant, now_i64};
use crate::observability::metrics::get_metrics;
use crate::parser::parser::token_from_access_token;
use crate::resilience::retry::{AttemptStatus, RetrySettings};
use crate::sources::exchange::{ExchangeRequest, IssuedToken};

/// HTTP side of token generation: one exchange per call, retried per
/// [`RetrySettings`], statuses mapped onto [`TokenError`].
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    retry: RetrySettings,
}

impl IdentityClient {
    pub fn new(iam_insecure: bool, settings: &SettingsConfig) -> Result<Self, TokenError> {
        Ok(Self {
            client: build_http_client(iam_insecure, &settings.http)?,
            retry: RetrySettings::from(&settings.retry),
        })
    }

    pub fn with_client(client: Client, retry: RetrySettings) -> Self {
        Self { client, retry }
    }

    /// Produce a token for `credentials`.
    ///
    /// A passed-in token is returned as is and never expires; otherwise the
    /// identity service is asked for a new one.
    pub async fn generate_token(&self, credentials: &CredentialConfig) -> Result<Token, TokenError> {
        if let Some(token) = credentials.static_token() {
            debug!("using passed-in token");
            return Ok(Token::never_expiring(token.to_owned()));
        }

        let issued = self.exchange(credentials).await?;
        Ok(token_from_access_token(issued.access_token, issued.expires_in, now_i64()))
    }

    /// One token exchange against the identity service, retries included.
    pub async fn exchange(&self, credentials: &CredentialConfig) -> Result<IssuedToken, TokenError> {
        let metrics = get_metrics().await;
        let request = ExchangeRequest::build(credentials).inspect_err(|e| {
            metrics.exchange_failures.with_label_values(&[e.kind()]).inc();
        })?;
        let strategy = request.strategy.name();
        let start = get_instant();
        metrics.exchange_requests.with_label_values(&[strategy]).inc();

        let result = self.send(&request, &credentials.client_id).await;

        metrics.exchange_duration.with_label_values(&[strategy]).observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => info!(strategy, client_id = %credentials.client_id, "token generated"),
            Err(e) => {
                metrics.exchange_failures.with_label_values(&[e.kind()]).inc();
            }
        }
        result
    }

    async fn send(&self, request: &ExchangeRequest, client_id: &str) -> Result<IssuedToken, TokenError> {
        let body = request.encoded_body()?;

        // the body is read inside the attempt so the attempt timeout covers it
        let reply = self
            .retry
            .run_with_retry(|| {
                let mut builder = self
                    .client
                    .post(&request.url)
                    .header(CONTENT_TYPE, request.content_type())
                    .body(body.clone());
                if request.close_connection() {
                    builder = builder.header(CONNECTION, "close");
                }
                async move {
                    let response = builder.send().await?;
                    let status = response.status();
                    let payload = response.bytes().await?.to_vec();
                    Ok::<_, reqwest::Error>(AttemptReply { status, payload })
                }
            })
            .await?;

        manage_http_error_codes(&reply, client_id)?;
        request.decode_response(&reply.payload)
    }
}

/// Status and body of one completed attempt.
#[derive(Debug)]
pub struct AttemptReply {
    pub status: StatusCode,
    pub payload: Vec<u8>,
}

impl AttemptStatus for AttemptReply {
    fn status(&self) -> StatusCode {
        self.status
    }
}

/// The insecure transport skips certificate verification and bounds dialing
/// and keep-alive explicitly; both share the overall client timeout.
fn build_http_client(iam_insecure: bool, http: &HttpConfig) -> Result<Client, TokenError> {
    let builder = Client::builder().timeout(http.timeout());
    let builder = if iam_insecure {
        builder
            .danger_accept_invalid_certs(true)
            .connect_timeout(http.insecure_dial_timeout())
            .tcp_keepalive(http.insecure_dial_timeout())
    } else {
        builder
    };
    Ok(builder.build()?)
}

/// Map a final (non-retried) reply onto the error taxonomy.
pub fn manage_http_error_codes(reply: &AttemptReply, client_id: &str) -> Result<(), TokenError> {
    match reply.status {
        StatusCode::OK => Ok(()),
        StatusCode::BAD_REQUEST => Err(TokenError::bad_request(&String::from_utf8_lossy(&reply.payload))),
        StatusCode::UNAUTHORIZED => Err(TokenError::Unauthorized {
            client_id: client_id.to_owned(),
        }),
        StatusCode::FORBIDDEN => Err(TokenError::Forbidden {
            client_id: client_id.to_owned(),
        }),
        status => Err(TokenError::unexpected_status(status)),
    }
}
