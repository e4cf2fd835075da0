use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, StatusClass},
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};

/// Response header carrying the request's ID, so clients can quote it in reports.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-request bookkeeping, created the first time anything asks for it.
#[derive(Debug, Clone, Copy)]
pub struct RequestTrace {
    pub id: u64,
    pub received_at: Instant,
}

impl RequestTrace {
    /// A trace with the next ID. IDs wrap around after `u64::MAX` requests.
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            received_at: Instant::now(),
        }
    }

    /// The trace for `req`, created on first use.
    pub fn of<'r>(req: &'r Request<'_>) -> &'r Self {
        req.local_cache(Self::next)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestTrace {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestTrace::of(req))
    }
}

/// Logs one line per request and one per response, with the time taken, and
/// tags each response with its request ID.
///
/// Bodies and headers are never logged, so neither are credentials nor ballots.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let scheme = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Accepting ballots on {scheme}://{}:{}",
            config.address, config.port
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = RequestTrace::of(req).id;
        let from = match req.client_ip() {
            Some(ip) => ip.to_string(),
            None => "?".to_string(),
        };
        info!("->req{id} {} {} from {from}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let trace = RequestTrace::of(req);
        res.set_header(Header::new(REQUEST_ID_HEADER, trace.id.to_string()));

        let route = req
            .route()
            .map(|route| match &route.name {
                Some(name) => format!("{name} ({})", route.uri),
                None => route.uri.to_string(),
            })
            .unwrap_or_else(|| "no route".to_string());
        let status = res.status();
        let elapsed = trace.received_at.elapsed().as_millis();
        let line = format!("<-rsp{} {status} {route} in {elapsed}ms", trace.id);
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutting down; no further ballots will be accepted");
    }
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;

    #[backend_test]
    async fn responses_carry_distinct_request_ids(client: Client) {
        let first = client.get("/elections").dispatch().await;
        assert_eq!(Status::Ok, first.status());
        let first_id = first.headers().get_one(REQUEST_ID_HEADER).unwrap().to_string();

        // Unrouted requests are tagged too.
        let second = client.get("/nowhere").dispatch().await;
        assert_eq!(Status::NotFound, second.status());
        let second_id = second.headers().get_one(REQUEST_ID_HEADER).unwrap();

        assert_ne!(first_id, second_id);
    }
}
