#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowcheck_exec::executor::{Event, EventSink, HttpClient, HttpError, HttpRequestParts, HttpResponseParts};

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    delay: Option<Duration>,
    error: Option<HttpError>,
}

/// Answers by `(method, path)`; unknown routes get a 404.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<HashMap<(String, String), Route>>,
    requests: Mutex<Vec<HttpRequestParts>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.set_route(method, path, status, body);
        self
    }

    pub fn route_delayed(self, method: &str, path: &str, status: u16, body: &str, delay: Duration) -> Self {
        self.insert(
            method,
            path,
            Route {
                status,
                body: body.to_string(),
                delay: Some(delay),
                error: None,
            },
        );
        self
    }

    pub fn route_error(self, method: &str, path: &str, error: HttpError) -> Self {
        self.insert(
            method,
            path,
            Route {
                status: 0,
                body: String::new(),
                delay: None,
                error: Some(error),
            },
        );
        self
    }

    /// Replaces a route in place, e.g. to simulate a backend change.
    pub fn set_route(&self, method: &str, path: &str, status: u16, body: &str) {
        self.insert(
            method,
            path,
            Route {
                status,
                body: body.to_string(),
                delay: None,
                error: None,
            },
        );
    }

    pub fn set_route_delayed(&self, method: &str, path: &str, status: u16, body: &str, delay: Duration) {
        self.insert(
            method,
            path,
            Route {
                status,
                body: body.to_string(),
                delay: Some(delay),
                error: None,
            },
        );
    }

    fn insert(&self, method: &str, path: &str, route: Route) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), route);
    }

    pub fn requests(&self) -> Vec<HttpRequestParts> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_to(&self, path: &str) -> Option<HttpRequestParts> {
        self.requests().into_iter().find(|r| r.url.path() == path)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Duration,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        let key = (req.method.clone(), req.url.path().to_string());
        self.requests.lock().unwrap().push(req);
        let route = self.routes.lock().unwrap().get(&key).cloned();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        let Some(route) = route else {
            return Ok(HttpResponseParts {
                status: 404,
                headers: BTreeMap::new(),
                body: Vec::new(),
            });
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = route.error {
            return Err(err);
        }
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Ok(HttpResponseParts {
            status: route.status,
            headers,
            body: route.body.into_bytes(),
        })
    }
}

/// Keeps every event it sees.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(Event::kind).collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}
