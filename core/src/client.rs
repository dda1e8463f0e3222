//! Typed operations of the ERCx API.
//!
//! # Design
//! `ErcxClient` is a thin layer over `RequestDispatcher`: each method formats
//! an endpoint from already-validated domain values, picks the method and
//! body, and returns the payload. Only token info and list creation are
//! decoded further; everything else is handed back as `serde_json::Value`.
//!
//! A business-level negative answer (`false`, an empty list) is `Ok` with
//! that payload. Anything that went wrong on the way is `Err`.

use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::dispatcher::{RequestDescriptor, RequestDispatcher};
use crate::error::{ApiError, Result};
use crate::http::Transport;
use crate::transport::UreqTransport;
use crate::types::{Network, Permission, TestLevel, TokenInfo};

/// Standard queried by `property_tests`; the service only publishes ERC-20
/// property tests.
const PROPERTY_TEST_STANDARD: &str = "ERC20";

/// Client for the ERCx token evaluation service.
#[derive(Debug, Clone)]
pub struct ErcxClient<T = UreqTransport> {
    dispatcher: RequestDispatcher<T>,
}

impl ErcxClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_dispatcher(RequestDispatcher::new(config))
    }

    /// Build a client from the `ERCX_API_URL` / `ERCX_API_KEY` environment.
    pub fn from_env() -> Result<Self> {
        ClientConfig::from_env().map(Self::new)
    }
}

impl<T: Transport> ErcxClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self::from_dispatcher(RequestDispatcher::with_transport(config, transport))
    }

    pub fn from_dispatcher(dispatcher: RequestDispatcher<T>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher<T> {
        &self.dispatcher
    }

    // --- tokens and their evaluations ---

    pub fn token_info(&self, network: Network, address: &str) -> Result<TokenInfo> {
        let payload = self
            .dispatcher
            .execute(&RequestDescriptor::get(format!("tokens/{network}/{address}")))?;
        TokenInfo::decode(&payload)
    }

    /// Latest full report on a token.
    pub fn token_report(&self, network: Network, address: &str) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get(format!("tokens/{network}/{address}/report")))
    }

    /// Latest evaluations of a token for one test level, optionally narrowed
    /// to an ERC standard number (`20`, `721`, ...).
    pub fn token_evaluations(
        &self,
        network: Network,
        address: &str,
        level: TestLevel,
        standard: Option<u32>,
    ) -> Result<Value> {
        let descriptor = with_standard(
            RequestDescriptor::get(format!("tokens/{network}/{address}/levels/{level}")),
            standard,
        );
        self.dispatcher.execute(&descriptor)
    }

    /// Latest evaluation of a token for a single named property test.
    pub fn token_test_evaluation(
        &self,
        network: Network,
        address: &str,
        test_name: &str,
        standard: Option<u32>,
    ) -> Result<Value> {
        let descriptor = with_standard(
            RequestDescriptor::get(format!("tokens/{network}/{address}/tests/{test_name}")),
            standard,
        );
        self.dispatcher.execute(&descriptor)
    }

    // --- property tests ---

    pub fn property_tests(&self, level: Option<TestLevel>) -> Result<Value> {
        let mut descriptor =
            RequestDescriptor::get("property-tests").with_query("standard", PROPERTY_TEST_STANDARD);
        if let Some(level) = level {
            descriptor = descriptor.with_query("level", level.as_str());
        }
        self.dispatcher.execute(&descriptor)
    }

    // --- authenticated user ---

    pub fn my_info(&self) -> Result<Value> {
        self.dispatcher.execute(&RequestDescriptor::get("user"))
    }

    pub fn my_token_lists(&self) -> Result<Value> {
        self.dispatcher.execute(&RequestDescriptor::get("user/token-lists"))
    }

    pub fn shared_token_lists(&self) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get("user/shared-token-lists"))
    }

    pub fn bookmarked_tokens(&self) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get("user/bookmarked-tokens"))
    }

    pub fn bookmarked_tokens_count(&self) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get("user/bookmarked-tokens-count"))
    }

    // --- token lists ---

    pub fn token_list_info(&self, list_id: &str) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get(format!("token-lists/{list_id}")))
    }

    pub fn tokens_of_list(&self, list_id: &str) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get(format!("token-lists/{list_id}/tokens")))
    }

    pub fn users_of_list(&self, list_id: &str) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get(format!("token-lists/{list_id}/users")))
    }

    pub fn tokens_count_of_list(&self, list_id: &str) -> Result<Value> {
        self.dispatcher
            .execute(&RequestDescriptor::get(format!("token-lists/{list_id}/tokens-count")))
    }

    /// Create a token list and return its id.
    pub fn create_token_list(&self, name: &str, description: &str) -> Result<String> {
        let descriptor = RequestDescriptor::post("token-lists")
            .with_body(json!({ "name": name, "description": description }));
        let payload = self.dispatcher.execute(&descriptor)?;
        match payload.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(other) => Err(ApiError::DecodeError(format!(
                "token list id must be a string, got {other}"
            ))),
            None => Err(ApiError::MissingField("id".to_string())),
        }
    }

    pub fn add_token_to_list(&self, list_id: &str, network: Network, address: &str) -> Result<Value> {
        let descriptor = RequestDescriptor::post(format!("token-lists/{list_id}/tokens"))
            .with_body(token_ref(network, address));
        self.dispatcher.execute(&descriptor)
    }

    pub fn remove_token_from_list(
        &self,
        list_id: &str,
        network: Network,
        address: &str,
    ) -> Result<Value> {
        let descriptor = RequestDescriptor::delete(format!("token-lists/{list_id}/tokens"))
            .with_body(token_ref(network, address));
        self.dispatcher.execute(&descriptor)
    }

    /// Grant `user_id` access to a list.
    pub fn share_token_list(&self, list_id: &str, user_id: &str, permission: Permission) -> Result<Value> {
        let descriptor = RequestDescriptor::post(format!("token-lists/{list_id}/users"))
            .with_body(json!({ "userId": user_id, "permission": permission }));
        self.dispatcher.execute(&descriptor)
    }

    pub fn unshare_token_list(&self, list_id: &str, user_id: &str) -> Result<Value> {
        self.dispatcher.execute(&RequestDescriptor::delete(format!(
            "token-lists/{list_id}/users/{user_id}"
        )))
    }
}

fn with_standard(descriptor: RequestDescriptor, standard: Option<u32>) -> RequestDescriptor {
    match standard {
        Some(n) => descriptor.with_query("standard", format!("ERC{n}")),
        None => descriptor,
    }
}

fn token_ref(network: Network, address: &str) -> Value {
    json!({ "address": address, "network": network })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};

    /// Replies 200 with a fixed body and keeps every request.
    struct Canned {
        body: &'static str,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> HttpRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }

        fn last_body(&self) -> Value {
            serde_json::from_str(self.last().body.as_deref().unwrap()).unwrap()
        }
    }

    impl Transport for Canned {
        fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    const BASE: &str = "https://ercx.example.org/api/v1/";
    const TETHER: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    fn client(transport: &Canned) -> ErcxClient<&Canned> {
        ErcxClient::with_transport(ClientConfig::new(BASE, "k").unwrap(), transport)
    }

    #[test]
    fn token_info_decodes_payload() {
        let transport = Canned::new(
            r#"{"id":"1","name":"Tether","address":"0xdAC17F958D2ee523a2206206994597C13D831ec7",
                "symbol":"USDT","decimals":"6","totalSupply":"1000","network":"1"}"#,
        );
        let info = client(&transport).token_info(Network::Mainnet, TETHER).unwrap();
        assert_eq!(info.symbol, "USDT");
        assert_eq!(transport.last().url, format!("{BASE}tokens/1/{TETHER}"));
    }

    #[test]
    fn token_info_missing_symbol_fails() {
        let transport = Canned::new(
            r#"{"id":"1","name":"Tether","address":"0x0","decimals":"6","totalSupply":"1","network":"1"}"#,
        );
        let err = client(&transport).token_info(Network::Mainnet, "0x0").unwrap_err();
        assert!(matches!(err, ApiError::MissingField(f) if f == "symbol"));
    }

    #[test]
    fn token_report_path() {
        let transport = Canned::new("{}");
        client(&transport).token_report(Network::Sepolia, "0xabc").unwrap();
        assert_eq!(transport.last().url, format!("{BASE}tokens/11155111/0xabc/report"));
    }

    #[test]
    fn token_evaluations_with_and_without_standard() {
        let transport = Canned::new("[]");
        let c = client(&transport);

        c.token_evaluations(Network::Mainnet, "0xabc", TestLevel::Minimal, None)
            .unwrap();
        assert_eq!(transport.last().url, format!("{BASE}tokens/1/0xabc/levels/minimal"));

        c.token_evaluations(Network::Mainnet, "0xabc", TestLevel::All, Some(20))
            .unwrap();
        assert_eq!(
            transport.last().url,
            format!("{BASE}tokens/1/0xabc/levels/all?standard=ERC20")
        );
    }

    #[test]
    fn token_test_evaluation_path() {
        let transport = Canned::new("{}");
        client(&transport)
            .token_test_evaluation(Network::Goerli, "0xabc", "testPositiveApprovalEventEmission", Some(721))
            .unwrap();
        assert_eq!(
            transport.last().url,
            format!("{BASE}tokens/5/0xabc/tests/testPositiveApprovalEventEmission?standard=ERC721")
        );
    }

    #[test]
    fn property_tests_always_ask_for_erc20() {
        let transport = Canned::new("[]");
        let c = client(&transport);

        c.property_tests(None).unwrap();
        assert_eq!(transport.last().url, format!("{BASE}property-tests?standard=ERC20"));

        c.property_tests(Some(TestLevel::Recommended)).unwrap();
        assert_eq!(
            transport.last().url,
            format!("{BASE}property-tests?level=recommended&standard=ERC20")
        );
    }

    #[test]
    fn user_endpoints() {
        let transport = Canned::new("{}");
        let c = client(&transport);
        let cases: [(&dyn Fn() -> Result<Value>, &str); 5] = [
            (&|| c.my_info(), "user"),
            (&|| c.my_token_lists(), "user/token-lists"),
            (&|| c.shared_token_lists(), "user/shared-token-lists"),
            (&|| c.bookmarked_tokens(), "user/bookmarked-tokens"),
            (&|| c.bookmarked_tokens_count(), "user/bookmarked-tokens-count"),
        ];
        for (call, endpoint) in cases {
            call().unwrap();
            let req = transport.last();
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.url, format!("{BASE}{endpoint}"));
        }
    }

    #[test]
    fn list_read_endpoints() {
        let transport = Canned::new("{}");
        let c = client(&transport);
        c.token_list_info("L1").unwrap();
        assert_eq!(transport.last().url, format!("{BASE}token-lists/L1"));
        c.tokens_of_list("L1").unwrap();
        assert_eq!(transport.last().url, format!("{BASE}token-lists/L1/tokens"));
        c.users_of_list("L1").unwrap();
        assert_eq!(transport.last().url, format!("{BASE}token-lists/L1/users"));
        c.tokens_count_of_list("L1").unwrap();
        assert_eq!(transport.last().url, format!("{BASE}token-lists/L1/tokens-count"));
    }

    #[test]
    fn create_token_list_returns_id() {
        let transport = Canned::new(r#"{"id":"228856f0","name":"mine"}"#);
        let id = client(&transport).create_token_list("mine", "desc").unwrap();
        assert_eq!(id, "228856f0");
        assert_eq!(transport.last().method, HttpMethod::Post);
        assert_eq!(
            transport.last_body(),
            json!({ "name": "mine", "description": "desc" })
        );
    }

    #[test]
    fn create_token_list_without_id_fails() {
        let transport = Canned::new(r#"{"name":"mine"}"#);
        let err = client(&transport).create_token_list("mine", "").unwrap_err();
        assert!(matches!(err, ApiError::MissingField(f) if f == "id"));
    }

    #[test]
    fn create_token_list_numeric_id_fails() {
        let transport = Canned::new(r#"{"id":42}"#);
        let err = client(&transport).create_token_list("mine", "").unwrap_err();
        assert!(matches!(err, ApiError::DecodeError(_)));
    }

    #[test]
    fn add_and_remove_token_send_numeric_network() {
        let transport = Canned::new("true");
        let c = client(&transport);

        let added = c.add_token_to_list("L1", Network::Mainnet, TETHER).unwrap();
        assert_eq!(added, json!(true));
        assert_eq!(transport.last().method, HttpMethod::Post);
        assert_eq!(transport.last_body(), json!({ "address": TETHER, "network": 1 }));

        c.remove_token_from_list("L1", Network::Mainnet, TETHER).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, format!("{BASE}token-lists/L1/tokens"));
        assert_eq!(transport.last_body(), json!({ "address": TETHER, "network": 1 }));
    }

    #[test]
    fn business_false_is_ok() {
        let transport = Canned::new("false");
        let removed = client(&transport)
            .remove_token_from_list("L1", Network::Mainnet, TETHER)
            .unwrap();
        assert_eq!(removed, json!(false));
    }

    #[test]
    fn share_and_unshare() {
        let transport = Canned::new("{}");
        let c = client(&transport);

        c.share_token_list("L1", "101185369", Permission::Write).unwrap();
        assert_eq!(transport.last().url, format!("{BASE}token-lists/L1/users"));
        assert_eq!(
            transport.last_body(),
            json!({ "userId": "101185369", "permission": "WRITE" })
        );

        c.unshare_token_list("L1", "101185369").unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, format!("{BASE}token-lists/L1/users/101185369"));
        assert!(req.body.is_none());
    }
}
