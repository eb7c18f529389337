//! Catalog-wide laws checked against a stub transport.

use std::sync::{Arc, Mutex};

use bdl_core::{
    Catalog, ClientConfig, Dispatcher, ErrorKind, HttpRequest, HttpResponse, ParamKind,
    ParameterSpec, Placement, QueryValue, ToolError, Transport, Translator,
};
use serde_json::{json, Map, Value};

/// Answers every request with a fixed status and body and keeps the URLs.
struct StubTransport {
    status: u16,
    body: String,
    urls: Mutex<Vec<String>>,
}

impl StubTransport {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ToolError> {
        self.urls.lock().unwrap().push(request.url.clone());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn sample(param: &ParameterSpec) -> Value {
    if let Some(values) = param.allowed_values {
        return json!(values[0]);
    }
    match param.kind {
        ParamKind::String => json!("1"),
        ParamKind::Integer => json!(1),
        ParamKind::IntegerArray => json!([2020, 2021]),
    }
}

fn required_arguments(params: &[ParameterSpec]) -> Map<String, Value> {
    params
        .iter()
        .filter(|p| p.required)
        .map(|p| (p.name.to_string(), sample(p)))
        .collect()
}

#[test]
fn schema_required_set_matches_translator() {
    let catalog = Catalog::builtin().unwrap();
    let translator = Translator::new("pl");

    for op in catalog.operations() {
        let full = required_arguments(op.parameters);
        translator
            .translate(op, &Value::Object(full.clone()))
            .unwrap_or_else(|e| panic!("{}: required arguments alone must translate: {e}", op.name));

        let schema_required: Vec<Value> = op
            .input_schema()
            .get("required")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for param in op.parameters {
            let mut args = full.clone();
            args.remove(param.name);
            let outcome = translator.translate(op, &Value::Object(args));
            let declared = schema_required.contains(&json!(param.name));
            match outcome {
                Err(err) => {
                    assert!(declared, "{}: {} rejected but not declared required", op.name, param.name);
                    assert_eq!(err.parameter(), Some(param.name));
                }
                Ok(_) => assert!(!declared, "{}: {} declared required but optional", op.name, param.name),
            }
        }
    }
}

#[test]
fn omitted_optional_parameters_never_appear() {
    let catalog = Catalog::builtin().unwrap();
    let translator = Translator::new("pl");

    for op in catalog.operations() {
        let shape = translator
            .translate(op, &Value::Object(required_arguments(op.parameters)))
            .unwrap();
        for param in op.parameters.iter().filter(|p| !p.required && p.placement == Placement::Query) {
            let key = bdl_core::translate::query_key(param.name);
            assert!(shape.get(&key).is_none(), "{}: {key} sent without a value", op.name);
        }
        assert!(shape.get("format").is_none());
    }
}

#[test]
fn array_parameters_repeat_in_order() {
    let catalog = Catalog::builtin().unwrap();
    let translator = Translator::new("pl");

    for op in catalog.operations() {
        for param in op.parameters.iter().filter(|p| p.kind == ParamKind::IntegerArray) {
            let mut args = required_arguments(op.parameters);
            args.insert(param.name.to_string(), json!([2020, 2021]));
            let shape = translator.translate(op, &Value::Object(args)).unwrap();
            let key = bdl_core::translate::query_key(param.name);
            assert_eq!(
                shape.get(&key),
                Some(&QueryValue::Repeated(vec!["2020".into(), "2021".into()])),
                "{}: {key}",
                op.name
            );
            let occurrences: Vec<&str> = shape
                .pairs()
                .into_iter()
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
                .collect();
            assert_eq!(occurrences, vec!["2020", "2021"]);
        }
    }
}

#[test]
fn bogus_sort_fails_before_transport() {
    let transport = StubTransport::new(200, "{}");
    let d = Dispatcher::new(&ClientConfig::default(), transport.clone()).unwrap();

    for op in d.list_operations().iter().filter(|op| op.parameter("sort").is_some()) {
        let mut args = required_arguments(op.parameters);
        args.insert("sort".into(), json!("Bogus"));
        let envelope = d.invoke(op.name, &Value::Object(args));
        assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError), "{}", op.name);
        assert_eq!(envelope.error.unwrap().parameter.as_deref(), Some("sort"));
    }
    assert!(transport.urls().is_empty());
}

#[test]
fn unit_detail_without_id_fails_before_transport() {
    let transport = StubTransport::new(200, "{}");
    let d = Dispatcher::new(&ClientConfig::default(), transport.clone()).unwrap();
    let envelope = d.invoke("get_unit_by_id", &json!({}));
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ValidationError);
    assert_eq!(error.parameter.as_deref(), Some("id"));
    assert!(error.message.contains("id"));
    assert!(transport.urls().is_empty());
}

#[test]
fn years_payload_is_returned_unmodified() {
    let body = r#"{"results":[{"id":2022},{"id":2021}],"totalRecords":2}"#;
    let transport = StubTransport::new(200, body);
    let d = Dispatcher::new(&ClientConfig::default(), transport.clone()).unwrap();

    let envelope = d.invoke("get_years", &json!({}));
    assert!(envelope.success);
    assert_eq!(envelope.payload, Some(serde_json::from_str::<Value>(body).unwrap()));
    assert_eq!(
        transport.urls(),
        vec!["https://bdl.stat.gov.pl/api/v1/years?lang=pl&format=json".to_string()]
    );
}

#[test]
fn search_units_request_and_upstream_failure() {
    let transport = StubTransport::new(500, "Internal Server Error");
    let d = Dispatcher::new(&ClientConfig::default(), transport.clone()).unwrap();
    let arguments = json!({ "name": "Warszawa" });

    let shape = d.translate("search_units", &arguments).unwrap();
    assert_eq!(shape.path(), "/units/search");
    assert_eq!(shape.pairs(), vec![("name", "Warszawa"), ("lang", "pl")]);

    let envelope = d.invoke("search_units", &arguments);
    assert!(!envelope.success);
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, ErrorKind::UpstreamHttpError);
    assert_eq!(error.status, Some(500));
    assert!(error.message.contains("Internal Server Error"));
}

#[test]
fn repeated_calls_render_identical_envelopes() {
    let transport = StubTransport::new(200, r#"{"results":[{"id":"011200000000","name":"MAŁOPOLSKIE"}],"totalRecords":1}"#);
    let d = Dispatcher::new(&ClientConfig::default(), transport).unwrap();
    let arguments = json!({ "level": 2, "year": [2021, 2020] });

    let first = d.invoke("get_units", &arguments).to_json();
    let second = d.invoke("get_units", &arguments).to_json();
    assert_eq!(first, second);

    let failure_a = d.invoke("get_units", &json!({ "sort": "Bogus" })).to_json();
    let failure_b = d.invoke("get_units", &json!({ "sort": "Bogus" })).to_json();
    assert_eq!(failure_a, failure_b);
}

#[test]
fn configured_default_language_is_used() {
    let transport = StubTransport::new(200, "{}");
    let config = ClientConfig::default().with_default_lang("en");
    let d = Dispatcher::new(&config, transport.clone()).unwrap();
    d.invoke("get_levels", &json!({}));
    d.invoke("get_levels", &json!({ "lang": "pl" }));
    let urls = transport.urls();
    assert!(urls[0].ends_with("/levels?lang=en&format=json"));
    assert!(urls[1].ends_with("/levels?lang=pl&format=json"));
}
