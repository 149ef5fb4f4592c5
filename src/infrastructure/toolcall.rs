use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::booking::{
    BookingService, CancelReservation, CheckAvailability, CreateReservation, ListReservations,
};
use crate::domain::reservation::ReservationRepository;

/// Batch of tool calls as posted by the voice-agent platform.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolRequest {
    pub calls: Vec<ToolCall>,
}

/// One named-function invocation requiring exactly one correlated outcome.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolCall {
    #[serde(rename = "toolCallId", default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub function: FunctionCall,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArgs,
}

/// Argument bag: either a structured mapping, or a JSON-encoded string that
/// needs a second decode.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ToolArgs {
    Structured(Map<String, Value>),
    Raw(String),
}

impl Default for ToolArgs {
    fn default() -> Self {
        Self::Structured(Map::new())
    }
}

impl ToolArgs {
    /// Resolves to a structured mapping; a malformed raw string decodes to an
    /// empty one rather than failing the call.
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            Self::Structured(map) => map,
            Self::Raw(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        }
    }
}

/// Supported webhook functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateReservation,
    CheckAvailability,
    ListReservations,
    CancelReservation,
}

impl Operation {
    /// Name-to-operation table; unknown names fall through to `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "create_reservation" => Some(Self::CreateReservation),
            "check_availability" => Some(Self::CheckAvailability),
            "list_reservations" => Some(Self::ListReservations),
            "cancel_reservation" => Some(Self::CancelReservation),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolResponse {
    pub results: Vec<ToolResult>,
}

/// Exactly one of `result` or `error` is set, both single-line.
#[derive(Clone, Debug, Serialize)]
pub struct ToolResult {
    #[serde(rename = "toolCallId")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    fn ok(tool_call_id: Option<String>, result: String) -> Self {
        Self {
            tool_call_id,
            result: Some(single_line(&result)),
            error: None,
        }
    }

    fn err(tool_call_id: Option<String>, error: String) -> Self {
        Self {
            tool_call_id,
            result: None,
            error: Some(single_line(&error)),
        }
    }
}

/// The calling protocol forbids line breaks in result and error values.
fn single_line(value: &str) -> String {
    value.replace('\n', " ").replace('\r', "")
}

/// Runs every call in order; the results mirror the order of the calls.
pub async fn dispatch<R: ReservationRepository>(
    service: &BookingService<R>,
    request: ToolRequest,
) -> ToolResponse {
    let mut results = Vec::with_capacity(request.calls.len());
    for call in request.calls {
        results.push(dispatch_call(service, call).await);
    }
    ToolResponse { results }
}

async fn dispatch_call<R: ReservationRepository>(
    service: &BookingService<R>,
    call: ToolCall,
) -> ToolResult {
    let operation = match Operation::from_name(&call.function.name) {
        Some(operation) => operation,
        None => {
            let error = format!("Unknown function: {}", call.function.name);
            return ToolResult::err(call.tool_call_id, error);
        }
    };
    let arguments = Value::Object(call.function.arguments.into_map());
    match run_operation(service, operation, arguments).await {
        Ok(result) => ToolResult::ok(call.tool_call_id, result),
        Err(error) => ToolResult::err(call.tool_call_id, error),
    }
}

async fn run_operation<R: ReservationRepository>(
    service: &BookingService<R>,
    operation: Operation,
    arguments: Value,
) -> Result<String, String> {
    match operation {
        Operation::CreateReservation => {
            let args: CreateReservation = decode_args(arguments)?;
            let reservation = service.create(args).await.map_err(|e| e.to_string())?;
            Ok(format!(
                "Reservation created successfully. ID: {}, Start: {}, End: {}",
                reservation.id, reservation.start_time, reservation.end_time,
            ))
        }
        Operation::CheckAvailability => {
            let args: CheckAvailability = decode_args(arguments)?;
            let availability = service
                .check_availability(args)
                .await
                .map_err(|e| e.to_string())?;
            compact_json(&availability)
        }
        Operation::ListReservations => {
            let args: ListReservations = decode_args(arguments)?;
            let listing = service.list(args).await.map_err(|e| e.to_string())?;
            compact_json(&listing)
        }
        Operation::CancelReservation => {
            let args: CancelReservation = decode_args(arguments)?;
            service.cancel(args).await.map_err(|e| e.to_string())?;
            Ok("Reservation cancelled successfully".to_owned())
        }
    }
}

fn decode_args<T: DeserializeOwned>(arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {e}"))
}

fn compact_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::testing::MemoryRepository;

    fn service() -> BookingService<MemoryRepository> {
        BookingService::new(MemoryRepository::default())
    }

    fn request(value: Value) -> ToolRequest {
        serde_json::from_value(value).unwrap()
    }

    fn call(id: &str, name: &str, arguments: Value) -> Value {
        json!({
            "toolCallId": id,
            "function": { "name": name, "arguments": arguments },
        })
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({ "calls": [call("c1", "delete_everything", json!({}))] })),
        )
        .await;
        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.results[0].error.as_deref(),
            Some("Unknown function: delete_everything"),
        );
        assert!(response.results[0].result.is_none());
    }

    #[tokio::test]
    async fn test_create_returns_confirmation_with_id() {
        let service = service();
        let arguments = json!({
            "start_time": "2024-01-15T10:00:00Z",
            "end_time": "2024-01-15T11:00:00Z",
            "description": "haircut",
        });
        let response = dispatch(
            &service,
            request(json!({ "calls": [call("c1", "create_reservation", arguments)] })),
        )
        .await;
        let result = response.results[0].result.as_deref().unwrap();
        assert_eq!(
            result,
            "Reservation created successfully. ID: 1, \
             Start: 2024-01-15T10:00:00Z, End: 2024-01-15T11:00:00Z",
        );
        assert_eq!(response.results[0].tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_string_encoded_arguments_are_decoded() {
        let service = service();
        let arguments = json!(
            "{\"start_time\":\"2024-01-15T10:00:00Z\",\"end_time\":\"2024-01-15T11:00:00Z\"}"
        );
        let response = dispatch(
            &service,
            request(json!({ "calls": [call("c1", "create_reservation", arguments)] })),
        )
        .await;
        assert!(response.results[0].result.is_some());
    }

    #[tokio::test]
    async fn test_malformed_argument_string_becomes_empty_bag() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({ "calls": [call("c1", "create_reservation", json!("{not json"))] })),
        )
        .await;
        // Empty arguments fail presence validation, not JSON parsing.
        assert_eq!(
            response.results[0].error.as_deref(),
            Some("start_time and end_time are required"),
        );
    }

    #[tokio::test]
    async fn test_batch_results_keep_call_order() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({
                "calls": [
                    call("c1", "create_reservation", json!({
                        "start_time": "2024-01-15T10:00:00Z",
                        "end_time": "2024-01-15T11:00:00Z",
                    })),
                    call("c2", "create_reservation", json!({
                        "start_time": "2024-01-15T10:30:00Z",
                        "end_time": "2024-01-15T11:30:00Z",
                    })),
                    call("c3", "check_availability", json!({
                        "start_time": "2024-01-15T10:00:00Z",
                        "end_time": "2024-01-15T10:30:00Z",
                    })),
                    call("c4", "list_reservations", json!({})),
                ],
            })),
        )
        .await;

        let ids: Vec<&str> = response
            .results
            .iter()
            .map(|r| r.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);

        assert!(response.results[0].result.is_some());
        assert_eq!(
            response.results[1].error.as_deref(),
            Some("Time slot conflicts with existing reservation"),
        );

        let availability: Value =
            serde_json::from_str(response.results[2].result.as_deref().unwrap()).unwrap();
        assert_eq!(availability["available"], json!(false));
        assert_eq!(availability["conflicts"].as_array().unwrap().len(), 1);

        let listing: Value =
            serde_json::from_str(response.results[3].result.as_deref().unwrap()).unwrap();
        assert_eq!(listing["count"], json!(1));
    }

    #[tokio::test]
    async fn test_structured_results_are_single_line() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({ "calls": [call("c1", "list_reservations", json!({}))] })),
        )
        .await;
        let result = response.results[0].result.as_deref().unwrap();
        assert!(!result.contains('\n'));
        assert_eq!(result, "{\"reservations\":[],\"count\":0}");
    }

    #[test]
    fn test_single_line_strips_breaks() {
        assert_eq!(single_line("a\nb\r\nc"), "a b c");
    }

    #[test]
    fn test_missing_tool_call_id_serializes_as_null() {
        let result = ToolResult::err(None, "nope".to_owned());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({ "toolCallId": null, "error": "nope" }));
    }
}
