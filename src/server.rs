use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

use crate::algorithm::{aggregate, plan, PrereqResolver};
use crate::gateway::{DataGateway, SqliteGateway};

const DEFAULT_CORE_PROGRAM: &str = "University Core Requirements";
const DEFAULT_TERM: &str = "Fall 2025";
const DEFAULT_CREDIT_CAP: i64 = 18;

#[derive(Debug, Deserialize)]
struct RequirementsRequest {
    student_id: i64,
    major_program: String,
    core_program: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    student_id: i64,
    major_program: String,
    core_program: Option<String>,
    term: Option<String>,
    max_credits: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GraphQuery {
    course: String,
    all_levels: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SectionsQuery {
    course: String,
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

fn record_query(endpoint: &str, student_id: i64, request: &str, response: &str, started: Instant) {
    let duration_ms = started.elapsed().as_millis() as i64;
    if let Err(e) = crate::analytics::log_query(endpoint, student_id, request, response, duration_ms)
    {
        eprintln!("WARN: analytics logging failed: {}", e);
    }
}

/// POST /requirements
/// Aggregated core + major requirement progress for one student.
async fn requirements_handler(
    gateway: web::Data<SqliteGateway>,
    body: web::Json<RequirementsRequest>,
) -> impl Responder {
    let started = Instant::now();
    let req = body.into_inner();
    if req.student_id <= 0 {
        return HttpResponse::BadRequest().json(json!({"error": "student_id must be positive"}));
    }
    let core_program = req
        .core_program
        .clone()
        .unwrap_or_else(|| DEFAULT_CORE_PROGRAM.to_string());

    let gw: &dyn DataGateway = gateway.get_ref();
    match aggregate(gw, req.student_id, &req.major_program, &core_program) {
        Ok(result) => {
            let response = json!(result);
            record_query(
                "/requirements",
                req.student_id,
                &json!({"major_program": req.major_program, "core_program": core_program})
                    .to_string(),
                &response.to_string(),
                started,
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("aggregation failed: {}", e)})),
    }
}

/// POST /schedule/plan
/// Greedy credit-bounded schedule proposal for the next term.
async fn plan_handler(
    gateway: web::Data<SqliteGateway>,
    body: web::Json<PlanRequest>,
) -> impl Responder {
    let started = Instant::now();
    let req = body.into_inner();
    if req.student_id <= 0 {
        return HttpResponse::BadRequest().json(json!({"error": "student_id must be positive"}));
    }
    let core_program = req
        .core_program
        .clone()
        .unwrap_or_else(|| DEFAULT_CORE_PROGRAM.to_string());
    let term = req.term.clone().unwrap_or_else(|| DEFAULT_TERM.to_string());
    let max_credits = req.max_credits.unwrap_or(DEFAULT_CREDIT_CAP);
    if max_credits <= 0 {
        return HttpResponse::BadRequest().json(json!({"error": "max_credits must be positive"}));
    }

    let gw: &dyn DataGateway = gateway.get_ref();
    match plan(
        gw,
        req.student_id,
        &req.major_program,
        &core_program,
        &term,
        max_credits,
    ) {
        Ok(items) => {
            let total_credits: i64 = items.iter().map(|item| item.credits).sum();
            let response = json!({"plan": items, "total_credits": total_credits, "term": term});
            record_query(
                "/schedule/plan",
                req.student_id,
                &json!({
                    "major_program": req.major_program,
                    "core_program": core_program,
                    "term": term,
                    "max_credits": max_credits
                })
                .to_string(),
                &response.to_string(),
                started,
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("planning failed: {}", e)})),
    }
}

/// GET /prerequisites/graph?course=CPSC%20321&all_levels=true
async fn prereq_graph_handler(
    gateway: web::Data<SqliteGateway>,
    query: web::Query<GraphQuery>,
) -> impl Responder {
    let query = query.into_inner();
    if query.course.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "course query parameter is required"}));
    }
    let gw: &dyn DataGateway = gateway.get_ref();
    let resolver = PrereqResolver::new(gw);
    match resolver.build_graph(&query.course, query.all_levels.unwrap_or(false)) {
        Ok(graph) => HttpResponse::Ok().json(graph),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("graph build failed: {}", e)})),
    }
}

/// GET /sections?course=CPSC%20260&term=Fall%202025
async fn sections_handler(
    gateway: web::Data<SqliteGateway>,
    query: web::Query<SectionsQuery>,
) -> impl Responder {
    let query = query.into_inner();
    if query.course.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "course query parameter is required"}));
    }
    let term = query.term.unwrap_or_else(|| DEFAULT_TERM.to_string());
    match gateway.sections_by_course_and_term(&query.course, &term) {
        Ok(sections) => HttpResponse::Ok().json(json!({"sections": sections})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("section lookup failed: {}", e)})),
    }
}

/// GET /analytics/recent?limit=20
async fn analytics_recent_handler(query: web::Query<RecentQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(20).clamp(1, 500);
    match crate::analytics::fetch_recent(limit) {
        Ok(rows) => HttpResponse::Ok().json(json!({"queries": rows})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("failed to read analytics: {}", e)})),
    }
}

async fn help_handler() -> impl Responder {
    let help = json!({
        "description": "Degree requirement aggregation and semester planning API.",
        "endpoints": {
            "POST /requirements": {
                "body": {
                    "student_id": 1,
                    "major_program": "B.S. Computer Science - Data Science Concentration",
                    "core_program": DEFAULT_CORE_PROGRAM
                },
                "note": "core_program is optional and defaults to the university core."
            },
            "POST /schedule/plan": {
                "body": {
                    "student_id": 1,
                    "major_program": "B.S. Computer Science - Data Science Concentration",
                    "term": DEFAULT_TERM,
                    "max_credits": DEFAULT_CREDIT_CAP
                },
                "note": "term and max_credits are optional; placeholders appear for core attributes with no real offering."
            },
            "GET /prerequisites/graph": "query params: course (required), all_levels (optional bool)",
            "GET /sections": "query params: course (required), term (optional)",
            "GET /analytics/recent": "query params: limit (optional, default 20)"
        }
    });
    HttpResponse::Ok().json(help)
}

pub async fn run_server(bind_addr: &str, gateway: SqliteGateway) -> std::io::Result<()> {
    let data = web::Data::new(gateway);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(data.clone())
            .route("/requirements", web::post().to(requirements_handler))
            .route("/schedule/plan", web::post().to(plan_handler))
            .route("/prerequisites/graph", web::get().to(prereq_graph_handler))
            .route("/sections", web::get().to(sections_handler))
            .route("/analytics/recent", web::get().to(analytics_recent_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
