//! The single chokepoint every API call passes through.
//!
//! # Design
//! `Fetcher::fetch` owns the credential policy: whatever the caller put in
//! the request, it leaves with `CredentialsMode::SameOrigin`, caller-supplied
//! `Cookie` headers removed, and the session cookies attached only when the
//! target shares the session origin. A network failure is handed to the
//! injected `FailureReporter` exactly once and then returned as
//! `ApiError::Transport`. Responses of any status are returned untouched.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{CredentialsMode, HttpRequest, HttpResponse};
use crate::report::FailureReporter;
use crate::session::Session;
use crate::transport::Transport;

pub struct Fetcher<T> {
    transport: T,
    reporter: Box<dyn FailureReporter>,
    session: Arc<Session>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(
        transport: T,
        reporter: impl FailureReporter + 'static,
        session: Arc<Session>,
    ) -> Self {
        Self {
            transport,
            reporter: Box::new(reporter),
            session,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue exactly one request. No retries.
    pub fn fetch(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        request.credentials = CredentialsMode::SameOrigin;
        request
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("cookie"));

        let same_origin = self.session.is_same_origin(&request.path);
        if same_origin {
            if let Some(cookies) = self.session.cookie_header() {
                request.headers.push(("cookie".to_string(), cookies));
            }
        }

        debug!(method = request.method.as_str(), url = %request.path, "sending request");
        match self.transport.execute(&request) {
            Ok(response) => {
                debug!(status = response.status, url = %request.path, "received response");
                if same_origin {
                    self.session.store_set_cookies(&response.headers);
                }
                Ok(response)
            }
            Err(err) => {
                warn!(
                    method = request.method.as_str(),
                    url = %request.path,
                    error = %err,
                    "request failed"
                );
                self.reporter.report(&err);
                Err(ApiError::Transport(err))
            }
        }
    }
}
