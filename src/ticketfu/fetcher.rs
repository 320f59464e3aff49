use crate::error::{SummaryError, TransportError};
use crate::ticketfu::context::{ApiSettings, RequestContext};
use crate::ticketfu::parser::{
    OrganizationSummary, Summary, TicketSummary, parse_organization_summary, parse_ticket_summary,
};
use crate::ticketfu::transport::{AUTH_HEADER, HttpRequest, HttpResponse, HttpTransport};
use serde_json::json;
use std::thread;
use std::time::Duration;

/// Time the backend gets to generate a summary before the single re-fetch.
pub const GENERATION_DELAY: Duration = Duration::from_millis(5000);

pub struct SummaryFetcher<T> {
    transport: T,
    generation_delay: Duration,
}

impl<T: HttpTransport> SummaryFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            generation_delay: GENERATION_DELAY,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = delay;
        self
    }

    pub fn generation_delay(&self) -> Duration {
        self.generation_delay
    }

    fn send(
        &self,
        settings: &ApiSettings,
        req: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let req = req.header(AUTH_HEADER, &settings.api_token);
        tracing::debug!(method = %req.method, url = %req.url, "ticketfu request");
        let response = self.transport.request(&req)?;
        tracing::debug!(status = response.status, url = %req.url, "ticketfu response");
        Ok(response)
    }

    fn get_ticket_summary(&self, ctx: &RequestContext) -> Result<HttpResponse, TransportError> {
        let url = ctx
            .settings
            .endpoint(&format!("/api/v1/ticket/{}/summary", ctx.ticket_id));
        self.send(&ctx.settings, HttpRequest::get(url))
    }

    fn request_generation(&self, ctx: &RequestContext) -> Result<(), TransportError> {
        let url = ctx.settings.endpoint("/api/v1/ticket");
        let body = json!({ "ticket_url": ctx.ticket_url() });
        self.send(&ctx.settings, HttpRequest::post(url, body))?;
        Ok(())
    }

    /// Fetches a ticket summary. A first 404 triggers generation, one fixed wait,
    /// and exactly one re-fetch whose outcome is final.
    pub fn fetch_ticket_summary(
        &self,
        ctx: &RequestContext,
    ) -> Result<Summary<TicketSummary>, SummaryError> {
        let response = match self.get_ticket_summary(ctx) {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    ticket_id = %ctx.ticket_id,
                    "summary not found for ticket; requesting generation"
                );
                self.request_generation(ctx)?;
                tracing::info!(
                    ticket_id = %ctx.ticket_id,
                    delay_ms = self.generation_delay().as_millis() as u64,
                    "generation requested; waiting before re-fetch"
                );
                thread::sleep(self.generation_delay);
                self.get_ticket_summary(ctx)
                    .map_err(SummaryError::from_transport)?
            }
            Err(err) => return Err(SummaryError::Transport(err)),
        };
        parse_ticket_summary(&response.body)
    }

    /// Organizations have no generation path; a 404 here is final.
    pub fn fetch_organization_summary(
        &self,
        settings: &ApiSettings,
        organization_id: &str,
    ) -> Result<Summary<OrganizationSummary>, SummaryError> {
        let url = settings.endpoint(&format!("/api/v1/organization/{organization_id}/summary"));
        let response = self
            .send(settings, HttpRequest::get(url))
            .map_err(SummaryError::from_transport)?;
        parse_organization_summary(&response.body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted transport that records every request it receives.
    #[derive(Default)]
    pub struct FakeTransport {
        replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        pub seen: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        pub fn reply_ok(self, body: &str) -> Self {
            self.replies.borrow_mut().push_back(Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            }));
            self
        }

        pub fn reply_status(self, status: u16) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Err(TransportError::Status {
                    status,
                    url: "fake".to_string(),
                }));
            self
        }

        pub fn reply_network_error(self) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Err(TransportError::Network("connection refused".to_string())));
            self
        }

        pub fn requests(&self) -> Vec<(String, String)> {
            self.seen
                .borrow()
                .iter()
                .map(|req| (req.method.as_str().to_string(), req.url.clone()))
                .collect()
        }
    }

    impl HttpTransport for FakeTransport {
        fn request(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(req.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".to_string())))
        }
    }
}
