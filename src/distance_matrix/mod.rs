use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{fetch::FetchError, traffic_model::TrafficModel};

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

const STATUS_OK: &str = "OK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRequest {
    pub origins: String,
    pub destinations: String,
    pub mode: String,
    pub departure_time: i64,
    pub traffic_model: TrafficModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MatrixRequest {
    pub fn driving(
        origin: &str,
        destination: &str,
        departure_time: i64,
        traffic_model: TrafficModel,
        key: Option<String>,
    ) -> MatrixRequest {
        MatrixRequest {
            origins: origin.to_string(),
            destinations: destination.to_string(),
            mode: "driving".to_string(),
            departure_time,
            traffic_model,
            key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub origin_addresses: Vec<String>,
    #[serde(default)]
    pub destination_addresses: Vec<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    pub duration: Option<TextValue>,
    pub duration_in_traffic: Option<TextValue>,
    pub distance: Option<TextValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: u32,
}

impl MatrixResponse {
    pub fn duration_in_traffic(&self) -> Result<u32, FetchError> {
        if self.status != STATUS_OK {
            return Err(FetchError::ServiceStatus {
                status: self.status.clone(),
                message: self.error_message.clone(),
            });
        }
        let element = self
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or(FetchError::MissingDuration)?;
        if element.status != STATUS_OK {
            return Err(FetchError::ElementStatus(element.status.clone()));
        }
        element
            .duration_in_traffic
            .as_ref()
            .map(|duration| duration.value)
            .ok_or(FetchError::MissingDuration)
    }
}

pub async fn matrix_request(
    client: &Client,
    endpoint: &str,
    request: &MatrixRequest,
) -> Result<MatrixResponse, anyhow::Error> {
    // The key travels in the query string, keep the url out of errors.
    let body = client
        .get(endpoint)
        .query(request)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(reqwest::Error::without_url)?
        .text()
        .await
        .map_err(reqwest::Error::without_url)?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
pub(crate) mod test {
    use reqwest::Client;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::{matrix_request, MatrixRequest, MatrixResponse};
    use crate::{fetch::FetchError, traffic_model::TrafficModel};

    /// Answers a single request with `status_line` and `body`. The handle
    /// yields the request head that was received.
    pub(crate) async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/maps/api/distancematrix/json", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (endpoint, handle)
    }

    pub(crate) const OK_BODY: &str = r#"{
        "destination_addresses": ["2505 SE 11th Ave, Portland, OR 97202, USA"],
        "origin_addresses": ["400 S Andresen Rd, Vancouver, WA 98661, USA"],
        "rows": [{
            "elements": [{
                "distance": {"text": "19.6 km", "value": 19613},
                "duration": {"text": "18 mins", "value": 1090},
                "duration_in_traffic": {"text": "24 mins", "value": 1452},
                "status": "OK"
            }]
        }],
        "status": "OK"
    }"#;

    #[test]
    fn test_duration_in_traffic() {
        let response: MatrixResponse = serde_json::from_str(OK_BODY).unwrap();
        assert_eq!(response.duration_in_traffic().unwrap(), 1452);
    }

    #[test]
    fn test_missing_duration_in_traffic() {
        let body = r#"{
            "rows": [{"elements": [{"status": "OK", "duration": {"text": "18 mins", "value": 1090}}]}],
            "status": "OK"
        }"#;
        let response: MatrixResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.duration_in_traffic(),
            Err(FetchError::MissingDuration)
        ));
    }

    #[test]
    fn test_service_status() {
        let body = r#"{
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "rows": []
        }"#;
        let response: MatrixResponse = serde_json::from_str(body).unwrap();
        match response.duration_in_traffic() {
            Err(FetchError::ServiceStatus { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.is_some());
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_element_status() {
        let body = r#"{"rows": [{"elements": [{"status": "ZERO_RESULTS"}]}], "status": "OK"}"#;
        let response: MatrixResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.duration_in_traffic(),
            Err(FetchError::ElementStatus(status)) if status == "ZERO_RESULTS"
        ));
    }

    #[test]
    fn test_request_parameters() {
        let request = MatrixRequest::driving(
            "home",
            "work",
            1_790_000_000,
            TrafficModel::BestGuess,
            Some("secret".to_string()),
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mode"], "driving");
        assert_eq!(value["traffic_model"], "best_guess");
        assert_eq!(value["departure_time"], 1_790_000_000i64);

        let anonymous = MatrixRequest::driving("home", "work", 0, TrafficModel::Optimistic, None);
        assert!(serde_json::to_value(&anonymous).unwrap().get("key").is_none());
    }

    #[tokio::test]
    async fn test_matrix_request_over_http() {
        let (endpoint, server) = serve_once("200 OK", OK_BODY).await;
        let request = MatrixRequest::driving("home", "work", 1_790_000_000, TrafficModel::Pessimistic, None);
        let response = matrix_request(&Client::new(), &endpoint, &request).await.unwrap();
        assert_eq!(response.duration_in_traffic().unwrap(), 1452);

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /maps/api/distancematrix/json?"));
        assert!(head.contains("traffic_model=pessimistic"));
        assert!(head.contains("departure_time=1790000000"));
    }

    #[tokio::test]
    async fn test_error_does_not_leak_key() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;
        let request = MatrixRequest::driving(
            "home",
            "work",
            1_790_000_000,
            TrafficModel::Optimistic,
            Some("SECRETKEY123".to_string()),
        );
        let err = matrix_request(&Client::new(), &endpoint, &request)
            .await
            .unwrap_err();
        assert!(server.await.unwrap().contains("key=SECRETKEY123"));
        assert!(!format!("{err:#}").contains("SECRETKEY123"));
        assert!(!format!("{err:?}").contains("SECRETKEY123"));
    }
}
