//! Outbound HTTP gateway (C9): every request the hub makes to a publisher or
//! a subscriber's callback flows through here, kept free of any store lock.
//!
//! Request-building idiom (`reqwest::Client` held on state, `.context(...)`
//! error wrapping) follows `src/rpc.rs::rpc_call`.

use reqwest::StatusCode;

use crate::error::HubError;

#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
}

/// Outcome of fetching a topic URL's content.
pub enum FetchOutcome {
    /// A response came back, any status. Per `pushhub/models/topic.py::fetch`,
    /// only a transport-level connection failure is distinguished here — an
    /// HTTP error response still gets handed to the parser, and a resulting
    /// parse failure surfaces as `InvalidContentError` rather than `failed`.
    Ok { body: Vec<u8> },
    /// The request never got a response at all (DNS, connect, timeout).
    Unreachable,
}

impl HttpGateway {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// `GET`s `url` for its current representation, identifying the hub via
    /// `User-Agent: "PuSH Hub (+<hub_url>; <subscriber_count>)"` per
    /// `pushhub/models/topic.py::Topic.fetch`.
    pub async fn fetch_topic(&self, url: &str, hub_url: &str, subscriber_count: usize) -> FetchOutcome {
        let user_agent = format!("PuSH Hub (+{hub_url}; {subscriber_count})");
        match self.client.get(url).header("User-Agent", user_agent).send().await {
            Ok(resp) => match resp.bytes().await {
                Ok(body) => FetchOutcome::Ok { body: body.to_vec() },
                Err(_) => FetchOutcome::Unreachable,
            },
            Err(_) => FetchOutcome::Unreachable,
        }
    }

    /// Performs the subscription-verification `GET` against a subscriber's
    /// callback URL, returning whether it echoed `challenge` back in its
    /// response body (per `pushhub/models/hub.py::verify_subscription`).
    pub async fn verify_subscription(
        &self,
        callback_url: &str,
        mode: &str,
        topic_url: &str,
        challenge: &str,
        lease_seconds: Option<u64>,
    ) -> Result<bool, HubError> {
        let mut query = vec![
            ("hub.mode", mode.to_string()),
            ("hub.topic", topic_url.to_string()),
            ("hub.challenge", challenge.to_string()),
        ];
        if let Some(lease) = lease_seconds {
            query.push(("hub.lease_seconds", lease.to_string()));
        }

        let resp = self
            .client
            .get(callback_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| HubError::BadRequest(format!("subscriber callback unreachable: {e}")))?;

        // Verified iff status is exactly 200 and the challenge appears
        // anywhere in the body, per `Hub.verify_subscription`'s
        // `challenge not in r.content` check — a substring test, not
        // equality.
        if resp.status() != StatusCode::OK {
            return Ok(false);
        }
        let body = resp
            .text()
            .await
            .map_err(|e| HubError::BadRequest(format!("subscriber callback body unreadable: {e}")))?;
        Ok(body.contains(challenge))
    }

    /// Delivers `body` to a subscriber's callback URL as a notification
    /// (`pushhub/worker.py::notify_subscribers`). The body is delivered
    /// inside a form field named `feed`; the job's own `Content-Type`
    /// header is sent verbatim alongside it (the source builds a
    /// `requests.post(..., headers=headers, data={'feed': body})` call,
    /// where the explicit header wins over the form-encoded default).
    /// Returns the response status so the caller can decide whether to retry.
    pub async fn deliver(&self, callback_url: &str, body: &[u8], content_type: &str) -> Option<u16> {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("feed", &String::from_utf8_lossy(body))
            .finish();
        self.client
            .post(callback_url)
            .header("Content-Type", content_type)
            .body(encoded)
            .send()
            .await
            .ok()
            .map(|r| r.status().as_u16())
    }

    /// Pings a registered listener that a topic changed
    /// (`pushhub/models/listener.py::Listener.notify`): a synchronous `GET`
    /// carrying the topic URL as the `topic` query parameter.
    pub async fn notify_listener(&self, callback_url: &str, topic_url: &str) -> Option<u16> {
        self.client
            .get(callback_url)
            .query(&[("topic", topic_url)])
            .send()
            .await
            .ok()
            .map(|r| r.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_is_cloneable() {
        let gw = HttpGateway::new(reqwest::Client::new());
        let _clone = gw.clone();
    }

    #[test]
    fn delivery_body_is_form_encoded_feed_field() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("feed", "<feed>hi</feed>")
            .finish();
        assert_eq!(encoded, "feed=%3Cfeed%3Ehi%3C%2Ffeed%3E");
    }

    #[tokio::test]
    async fn fetch_topic_sends_push_hub_user_agent() {
        use axum::extract::State as AxumState;
        use axum::routing::get;
        use axum::Router;
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route(
                "/feed",
                get(|AxumState(seen): AxumState<Arc<Mutex<Option<String>>>>, headers: axum::http::HeaderMap| async move {
                    *seen.lock().unwrap() = headers.get("user-agent").and_then(|v| v.to_str().ok()).map(str::to_string);
                    "<feed/>"
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gw = HttpGateway::new(reqwest::Client::new());
        let outcome = gw.fetch_topic(&format!("http://{addr}/feed"), "http://hub.example.com/", 3).await;
        assert!(matches!(outcome, FetchOutcome::Ok { .. }));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("PuSH Hub (+http://hub.example.com/; 3)"));
    }
}
