//! Verify request building and envelope normalization against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use mallu_core::{ApiClient, HttpMethod, HttpResponse};

const BASE_URL: &str = "http://localhost:3000/api";

fn client() -> ApiClient {
    ApiClient::new(BASE_URL)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method: HttpMethod = case["method"].as_str().unwrap().parse().unwrap();
        let path = case["path"].as_str().unwrap();
        let body = &case["body"];
        let expected = &case["expected_request"];

        let req = if body.is_null() {
            c.build_request::<serde_json::Value>(method, path, None).unwrap()
        } else {
            c.build_request(method, path, Some(body)).unwrap()
        };

        assert_eq!(req.method.as_str(), expected["method"].as_str().unwrap(), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match req.body.as_deref() {
            Some(raw_body) => {
                let req_body: serde_json::Value = serde_json::from_str(raw_body).unwrap();
                assert_eq!(req_body, expected["body"], "{name}: body");
            }
            None => assert!(expected["body"].is_null(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse::new(
            u16::try_from(sim["status"].as_u64().unwrap()).unwrap(),
            sim["body"].as_str().unwrap(),
        );
        let expected = &case["expected"];

        let result = c.parse_response::<serde_json::Value>(response);

        if expected["success"].as_bool().unwrap() {
            let data = result.unwrap_or_else(|e| panic!("{name}: unexpected failure {e}"));
            assert_eq!(data, expected["data"], "{name}: data");
            continue;
        }

        let err = result.err().unwrap_or_else(|| panic!("{name}: expected failure"));
        if let Some(message) = expected["error"].as_str() {
            assert_eq!(err.message(), message, "{name}: error");
        }
        if let Some(prefix) = expected["error_prefix"].as_str() {
            assert!(err.message().starts_with(prefix), "{name}: error prefix");
        }
        if let Some(status) = expected["status"].as_u64() {
            assert_eq!(err.status().map(u64::from), Some(status), "{name}: status");
        }
    }
}
