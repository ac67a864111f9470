//! HTTP handler functions for the AQI API.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use aqi_history::HistoryError;
use aqi_models::{AqiAssessment, FeatureVector, Pollutant};
use aqi_predict::PredictionError;
use aqi_server_models::{
    ApiError, ApiHealth, ApiHistory, ApiMonthlyAqi, ApiPrediction, HistoryQueryParams,
    PredictRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /predict`
///
/// Accepts the pollutant form fields (`PM2.5`, `PM10`, `O3`, `NO2`, `SO2`,
/// `CO`) and renders the assessment as a small HTML page.
pub async fn predict_form(
    state: web::Data<AppState>,
    form: web::Form<BTreeMap<String, String>>,
) -> HttpResponse {
    let lookup = |pollutant: Pollutant| {
        let name: &str = pollutant.as_ref();
        form.get(name).map(String::as_str)
    };
    let features = match FeatureVector::parse_fields(lookup) {
        Ok(features) => features,
        Err(e) => return error_response(&PredictionError::InvalidInput(e)),
    };

    match state.predictor.assess(&features) {
        Ok(assessment) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_result(&assessment)),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/predict`
///
/// Accepts `{"features": [PM2.5, PM10, O3, NO2, SO2, CO]}`.
pub async fn api_predict(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: PredictRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::BadRequest().json(ApiError::new(format!(
                "Invalid request body: {e}"
            )));
        }
    };

    let result = request
        .to_features()
        .map_err(PredictionError::from)
        .and_then(|features| state.predictor.assess(&features));

    match result {
        Ok(assessment) => HttpResponse::Ok().json(ApiPrediction::from(assessment)),
        Err(e) => error_response(&e),
    }
}

/// `GET /cities`
///
/// Returns every city with historical readings.
pub async fn cities(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.history.cities())
}

/// `GET /aqi?city=<name>`
///
/// Returns the city's monthly mean AQI series.
pub async fn monthly_aqi(
    state: web::Data<AppState>,
    params: web::Query<HistoryQueryParams>,
) -> HttpResponse {
    let Some(city) = params.city.as_deref().filter(|c| !c.is_empty()) else {
        return HttpResponse::NotFound().json(ApiError::new("City not found"));
    };

    match state.history.monthly_average(city) {
        Ok(months) => HttpResponse::Ok().json(ApiHistory {
            data: months.into_iter().map(ApiMonthlyAqi::from).collect(),
        }),
        Err(e @ (HistoryError::CityNotFound(_) | HistoryError::NoData(_))) => {
            log::debug!("No monthly series for {city:?}: {e}");
            HttpResponse::NotFound().json(ApiError::new(e))
        }
        Err(e) => {
            log::error!("Failed to aggregate history for {city:?}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e))
        }
    }
}

fn error_response(e: &PredictionError) -> HttpResponse {
    match e {
        PredictionError::InvalidInput(_) => HttpResponse::BadRequest().json(ApiError::new(e)),
        PredictionError::ShapeMismatch(_) | PredictionError::NonFinite => {
            log::error!("Prediction failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e))
        }
    }
}

fn render_result(assessment: &AqiAssessment) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>AQI Prediction Result</title></head>\n\
         <body>\n\
         <h1>Predicted AQI: {aqi:.2}</h1>\n\
         <h2>Category: {category}</h2>\n\
         <p><strong>Health Implications:</strong> {health}</p>\n\
         <p><strong>Cautionary Statement:</strong> {caution}</p>\n\
         <p><a href=\"/\">Back</a></p>\n\
         </body>\n\
         </html>\n",
        aqi = assessment.aqi,
        category = assessment.category,
        health = assessment.health_implications,
        caution = assessment.cautionary_statement,
    )
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    use crate::{configure, test_support};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(actix_web::web::Data::new(test_support::state()))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn api_predict_returns_assessment() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({"features": [30, 35, 32, 34, 36, 38]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let aqi = body["aqi"].as_f64().unwrap();
        assert!(aqi.is_finite());
        assert_eq!(
            body["category"].as_str().unwrap(),
            aqi_models::categorize(aqi).to_string()
        );
        assert!(body["health_implications"].is_string());
        assert!(body["cautionary_statement"].is_string());
    }

    #[actix_web::test]
    async fn api_predict_rejects_wrong_length() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({"features": [1, 2, 3, 4, 5]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("expected 6"));
    }

    #[actix_web::test]
    async fn api_predict_rejects_malformed_body() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"feat")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn form_predict_renders_html() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([
                ("PM2.5", "30"),
                ("PM10", "35"),
                ("O3", "32"),
                ("NO2", "34"),
                ("SO2", "36"),
                ("CO", "38"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("Predicted AQI:"));
        assert!(html.contains("Cautionary Statement:"));
    }

    #[actix_web::test]
    async fn form_predict_rejects_non_numeric_field() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([
                ("PM2.5", "30"),
                ("PM10", "lots"),
                ("O3", "32"),
                ("NO2", "34"),
                ("SO2", "36"),
                ("CO", "38"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("PM10"));
    }

    #[actix_web::test]
    async fn cities_lists_known_cities() {
        let app = app!();
        let req = test::TestRequest::get().uri("/cities").to_request();
        let body: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, ["X", "Empty"]);
    }

    #[actix_web::test]
    async fn monthly_series_for_city() {
        let app = app!();
        let req = test::TestRequest::get().uri("/aqi?city=X").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            serde_json::json!({"data": [
                {"Date": "2023-01", "AQI": 15.0},
                {"Date": "2023-02", "AQI": 30.0},
            ]})
        );
    }

    #[actix_web::test]
    async fn unknown_city_is_404() {
        let app = app!();
        let req = test::TestRequest::get().uri("/aqi?city=Nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "City not found");
    }

    #[actix_web::test]
    async fn city_without_readings_is_404_no_data() {
        let app = app!();
        let req = test::TestRequest::get().uri("/aqi?city=Empty").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No data available for the selected city");
    }

    #[actix_web::test]
    async fn missing_city_param_is_404() {
        let app = app!();
        let req = test::TestRequest::get().uri("/aqi").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
