//! In-memory imitation of the statistical API used by integration tests.
//!
//! Serves a handful of fixed years, territorial units and one variable's
//! data with the upstream's conventions: hyphenated query keys, repeated
//! `year` keys, `results` + `totalRecords` list payloads, mandatory
//! `format=json`.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub level: u8,
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataValue {
    pub year: String,
    pub val: f64,
    #[serde(rename = "attrId")]
    pub attr_id: u32,
}

pub const YEARS: [u32; 4] = [2019, 2020, 2021, 2022];
pub const KNOWN_VARIABLE: u32 = 60559;
const DEFAULT_PAGE_SIZE: usize = 10;

pub fn units() -> Vec<Unit> {
    let unit = |id: &str, name: &str, parent: Option<&str>, level: u8, kind: &str| Unit {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        level,
        kind: kind.to_string(),
    };
    vec![
        unit("000000000000", "POLSKA", None, 0, "0"),
        unit("011200000000", "MAŁOPOLSKIE", Some("010000000000"), 2, "0"),
        unit("071400000000", "MAZOWIECKIE", Some("070000000000"), 2, "0"),
        unit("071412865000", "Powiat m.st. Warszawa", Some("071412800000"), 5, "0"),
        unit("071412865011", "Warszawa", Some("071412865000"), 6, "1"),
    ]
}

fn variable_values(unit_id: &str) -> Vec<DataValue> {
    let base = match unit_id {
        "000000000000" => 38_000_000.0,
        "011200000000" => 3_400_000.0,
        "071400000000" => 5_500_000.0,
        _ => 1_800_000.0,
    };
    YEARS
        .iter()
        .enumerate()
        .map(|(i, year)| DataValue {
            year: year.to_string(),
            val: base + i as f64 * 1_000.0,
            attr_id: 1,
        })
        .collect()
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "errors": [{ "message": message.into() }] })))
}

/// Raw query pairs, keeping repeated keys in order.
struct Params(Vec<(String, String)>);

impl Params {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    fn number(&self, key: &str) -> Result<Option<usize>, ApiError> {
        self.get(key)
            .map(|v| {
                v.parse()
                    .map_err(|_| error(StatusCode::BAD_REQUEST, format!("`{key}` must be a number")))
            })
            .transpose()
    }

    /// Reject requests without `format=json` or with an unsupported `lang`.
    fn check_common(&self) -> Result<(), ApiError> {
        if self.get("format") != Some("json") {
            return Err(error(StatusCode::BAD_REQUEST, "format=json is required"));
        }
        match self.get("lang") {
            None | Some("pl") | Some("en") => Ok(()),
            Some(other) => Err(error(StatusCode::BAD_REQUEST, format!("unsupported language `{other}`"))),
        }
    }
}

fn page<T: Serialize>(items: Vec<T>, params: &Params) -> ApiResult {
    let page = params.number("page")?.unwrap_or(0);
    let page_size = params.number("page-size")?.unwrap_or(DEFAULT_PAGE_SIZE);
    let total = items.len();
    let results: Vec<T> = items.into_iter().skip(page * page_size).take(page_size).collect();
    Ok(Json(json!({
        "totalRecords": total,
        "page": page,
        "pageSize": page_size,
        "results": results,
    })))
}

pub fn app() -> Router {
    Router::new()
        .route("/years", get(list_years))
        .route("/years/{id}", get(get_year))
        .route("/units", get(list_units))
        .route("/units/search", get(search_units))
        .route("/units/{id}", get(get_unit))
        .route("/data/by-variable/{var_id}", get(data_by_variable))
        .fallback(|| async { error(StatusCode::NOT_FOUND, "no such endpoint") })
}

/// Router that answers every request with `status`, for outage tests.
pub fn failing_app(status: StatusCode) -> Router {
    Router::new().fallback(move || async move { error(status, "service unavailable") })
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn list_years(Query(params): Query<Vec<(String, String)>>) -> ApiResult {
    let params = Params(params);
    params.check_common()?;
    let mut years: Vec<Value> = YEARS.iter().map(|y| json!({ "id": y })).collect();
    match params.get("sort") {
        None | Some("Id") => {}
        Some("-Id") => years.reverse(),
        Some(other) => return Err(error(StatusCode::BAD_REQUEST, format!("invalid sort `{other}`"))),
    }
    page(years, &params)
}

async fn get_year(Path(id): Path<u32>, Query(params): Query<Vec<(String, String)>>) -> ApiResult {
    Params(params).check_common()?;
    if !YEARS.contains(&id) {
        return Err(error(StatusCode::NOT_FOUND, format!("year {id} not found")));
    }
    Ok(Json(json!({ "id": id })))
}

async fn list_units(Query(params): Query<Vec<(String, String)>>) -> ApiResult {
    let params = Params(params);
    params.check_common()?;
    let level = params.number("level")?;
    let parent = params.get("parent-id");
    let units: Vec<Unit> = units()
        .into_iter()
        .filter(|u| level.map_or(true, |l| usize::from(u.level) == l))
        .filter(|u| parent.map_or(true, |p| u.parent_id.as_deref() == Some(p)))
        .collect();
    page(units, &params)
}

async fn search_units(Query(params): Query<Vec<(String, String)>>) -> ApiResult {
    let params = Params(params);
    params.check_common()?;
    let name = params
        .get("name")
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "`name` is required"))?
        .to_lowercase();
    let level = params.number("level")?;
    let units: Vec<Unit> = units()
        .into_iter()
        .filter(|u| u.name.to_lowercase().contains(&name))
        .filter(|u| level.map_or(true, |l| usize::from(u.level) == l))
        .collect();
    page(units, &params)
}

async fn get_unit(Path(id): Path<String>, Query(params): Query<Vec<(String, String)>>) -> ApiResult {
    Params(params).check_common()?;
    units()
        .into_iter()
        .find(|u| u.id == id)
        .map(|u| Json(json!(u)))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("unit {id} not found")))
}

async fn data_by_variable(
    Path(var_id): Path<u32>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult {
    let params = Params(params);
    params.check_common()?;
    if var_id != KNOWN_VARIABLE {
        return Err(error(StatusCode::NOT_FOUND, format!("variable {var_id} not found")));
    }
    let years = params.all("year");
    let unit_level = params.number("unit-level")?;
    let unit_id = params.get("unit-id");

    let results: Vec<Value> = units()
        .into_iter()
        .filter(|u| unit_level.map_or(true, |l| usize::from(u.level) == l))
        .filter(|u| unit_id.map_or(true, |id| u.id == id))
        .map(|u| {
            let values: Vec<DataValue> = variable_values(&u.id)
                .into_iter()
                .filter(|v| years.is_empty() || years.contains(&v.year.as_str()))
                .collect();
            json!({ "id": u.id, "name": u.name, "values": values })
        })
        .collect();

    let mut body = page(results, &params)?.0;
    body["variableId"] = json!(var_id);
    body["measureUnitId"] = json!(1);
    Ok(Json(body))
}
