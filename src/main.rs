use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use student_pathway::config::Config;
use student_pathway::data;
use student_pathway::database::{Database, NewReport};
use student_pathway::features::StudentFeatures;
use student_pathway::model::{Oracle, RegressionModel};
use student_pathway::report::{self, ReportContext};
use student_pathway::simulation::{ScenarioCatalog, ScenarioOutcome, SimulationError};

struct AppState {
    model: RegressionModel,
    catalog: ScenarioCatalog,
    db: Database,
    dataset_path: PathBuf,
}

#[derive(Deserialize)]
struct PredictRequest {
    student_name: String,
    student_id: String,
    department: String,
    #[serde(flatten)]
    features: StudentFeatures,
}

#[derive(Serialize)]
struct PredictResponse {
    report_id: Option<i64>,
    prediction: f64,
    status: &'static str,
    scenarios: Vec<ScenarioOutcome>,
}

#[derive(Serialize)]
struct BatchRow {
    student_name: String,
    student_id: String,
    department: String,
    prediction: f64,
    status: &'static str,
    scenarios: Vec<ScenarioOutcome>,
}

#[derive(Serialize)]
struct BatchResult {
    total_students: usize,
    critical_count: usize,
    stable_count: usize,
    excellent_count: usize,
    avg_prediction: f64,
    rows: Vec<BatchRow>,
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn simulation_error_response(err: SimulationError) -> HttpResponse {
    match err {
        SimulationError::MissingField(e) => HttpResponse::BadRequest().json(error_body(e.to_string())),
        SimulationError::Oracle(e) => {
            log::error!("oracle failure during simulation: {}", e);
            HttpResponse::InternalServerError().json(error_body(e.to_string()))
        }
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student Pathway API is running!")
}

async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.model.info())
}

// Single-student analysis: predict, simulate, archive the report and
// silently accumulate the record into the dataset file.
async fn predict(req: web::Json<PredictRequest>, state: web::Data<AppState>) -> HttpResponse {
    let req = req.into_inner();

    let prediction = match state.model.predict(&req.features) {
        Ok(p) => p,
        Err(e) => {
            log::error!("prediction failed for {}: {}", req.student_id, e);
            return HttpResponse::InternalServerError().json(error_body(e.to_string()));
        }
    };

    let scenarios = match state.catalog.simulate(&req.features, prediction, &state.model) {
        Ok(s) => s,
        Err(e) => return simulation_error_response(e),
    };

    if let Err(e) = data::append_to_dataset(&state.dataset_path, &req.features, prediction) {
        log::warn!("dataset append failed: {}", e);
    }

    let roadmap: Vec<&str> = scenarios.iter().map(|s| s.narrative.as_str()).collect();
    let new_report = NewReport {
        student_name: req.student_name,
        student_id: req.student_id,
        department: req.department,
        prediction,
        roadmap: serde_json::to_string(&roadmap).unwrap_or_default(),
        attendance_rate: req.features.attendance_rate,
        study_hours: req.features.study_hours_per_week,
    };
    let report_id = match state.db.save_report(&new_report).await {
        Ok(id) => Some(id),
        Err(e) => {
            log::error!("failed to archive report: {}", e);
            None
        }
    };

    HttpResponse::Ok().json(PredictResponse {
        report_id,
        prediction,
        status: report::status_band(prediction),
        scenarios,
    })
}

// Batch import: the request body is the CSV template filled with one row
// per student. Rows are analyzed independently.
async fn batch_predict(body: String, state: web::Data<AppState>) -> HttpResponse {
    let rows = match data::read_students_csv(body.as_bytes()) {
        Ok(rows) => rows,
        Err(e) => return HttpResponse::BadRequest().json(error_body(format!("invalid CSV: {}", e))),
    };

    let mut results = Vec::with_capacity(rows.len());
    let mut critical_count = 0;
    let mut stable_count = 0;
    let mut excellent_count = 0;
    let mut total_prediction = 0.0;

    for row in rows {
        let features = row.features();
        let prediction = match state.model.predict(&features) {
            Ok(p) => p,
            Err(e) => {
                log::error!("prediction failed for {}: {}", row.student_id, e);
                return HttpResponse::InternalServerError()
                    .json(error_body(format!("{} ({})", e, row.student_name)));
            }
        };
        let scenarios = match state.catalog.simulate(&features, prediction, &state.model) {
            Ok(s) => s,
            Err(SimulationError::MissingField(e)) => {
                return HttpResponse::BadRequest()
                    .json(error_body(format!("{} ({})", e, row.student_name)));
            }
            Err(e) => return simulation_error_response(e),
        };

        let status = report::status_band(prediction);
        if prediction < 50.0 {
            critical_count += 1;
        } else if prediction < 80.0 {
            stable_count += 1;
        } else {
            excellent_count += 1;
        }
        total_prediction += prediction;

        results.push(BatchRow {
            student_name: row.student_name,
            student_id: row.student_id,
            department: row.department,
            prediction,
            status,
            scenarios,
        });
    }

    let total_students = results.len();
    HttpResponse::Ok().json(BatchResult {
        total_students,
        critical_count,
        stable_count,
        excellent_count,
        avg_prediction: if total_students > 0 {
            total_prediction / total_students as f64
        } else {
            0.0
        },
        rows: results,
    })
}

async fn list_reports(state: web::Data<AppState>) -> HttpResponse {
    match state.db.list_reports().await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => {
            log::error!("failed to list reports: {}", e);
            HttpResponse::InternalServerError().json(error_body(e.to_string()))
        }
    }
}

// Printable bilingual HTML version of an archived report.
async fn report_html(path: web::Path<i64>, state: web::Data<AppState>) -> HttpResponse {
    let id = path.into_inner();
    let record = match state.db.get_report(id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return HttpResponse::NotFound().json(error_body(format!("report {} not found", id)))
        }
        Err(e) => {
            log::error!("failed to load report {}: {}", id, e);
            return HttpResponse::InternalServerError().json(error_body(e.to_string()));
        }
    };

    let roadmap: Vec<String> = serde_json::from_str(&record.roadmap).unwrap_or_else(|e| {
        log::warn!("report {} has an unreadable roadmap: {}", id, e);
        Vec::new()
    });

    let html = report::render_printable_report(&ReportContext {
        student_name: &record.student_name,
        student_id: &record.student_id,
        department: &record.department,
        prediction: record.prediction,
        roadmap: &roadmap,
        attendance_rate: record.attendance_rate,
        study_hours: record.study_hours,
    });

    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env();

    let model = match RegressionModel::from_file(Path::new(&config.model_path)) {
        Ok(model) => {
            log::info!("loaded model artifact from {}", config.model_path);
            model
        }
        Err(e) => {
            log::warn!(
                "model artifact unavailable ({}); using built-in coefficients",
                e
            );
            RegressionModel::pretrained()
        }
    };

    let catalog = ScenarioCatalog::for_deployment(config.english_track);
    log::info!(
        "scenario catalog loaded: {} rules (english track: {})",
        catalog.len(),
        config.english_track
    );

    let dataset_path = PathBuf::from(&config.dataset_path);
    if let Some(parent) = dataset_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let state = web::Data::new(AppState {
        model,
        catalog,
        db,
        dataset_path,
    });

    log::info!("starting Student Pathway API on {}", config.bind_addr);
    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(health_check))
            .route("/health", web::get().to(health_check))
            .route("/predict", web::post().to(predict))
            .route("/batch-predict", web::post().to(batch_predict))
            .route("/reports", web::get().to(list_reports))
            .route("/reports/{id}/html", web::get().to(report_html))
            .route("/model/info", web::get().to(model_info))
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
