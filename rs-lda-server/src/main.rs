use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info};

use serde::{Deserialize, Serialize};
use rs_lda_core::{run_gibbs_sampling, Corpus, Estimates, LdaConfig, LdaError};

const DEFAULT_TOP_N: usize = 10;
/// Largest `num_topics` a request may ask for.
const MAX_TOPICS: usize = 10_000;
/// Largest `documents * num_topics`, the size of the document-topic table.
const MAX_DOC_TOPIC_CELLS: usize = 50_000_000;

/// JSON body of the `/v1/sample` endpoint.
#[derive(Deserialize)]
struct SampleRequest {
	/// Already tokenized documents.
	documents: Vec<Vec<String>>,
	/// Declared document count, defaults to `documents.len()`.
	num_documents: Option<usize>,
	config: LdaConfig,
	top_n: Option<usize>,
}

#[derive(Deserialize)]
struct TopicsQuery {
	top_n: Option<usize>
}

/// Estimates trimmed to the `top_n` terms of each topic.
#[derive(Serialize)]
struct SampleResponse<'a> {
	seed: u64,
	iterations: usize,
	theta: &'a [Vec<f64>],
	topics: Vec<&'a [(String, f64)]>,
}

impl<'a> SampleResponse<'a> {
	fn new(estimates: &'a Estimates, top_n: usize) -> Self {
		Self {
			seed: estimates.seed,
			iterations: estimates.iterations,
			theta: &estimates.theta,
			topics: (0..estimates.phi.len()).map(|k| estimates.top_terms(k, top_n)).collect(),
		}
	}
}

struct SharedData {
	last: Option<Estimates>
}

/// Rejects jobs whose count tables would not fit in memory.
///
/// An allocation failure aborts the whole process, so it must be caught
/// before the job reaches the sampler.
fn check_job_size(documents: usize, num_topics: usize) -> Result<(), String> {
	if num_topics > MAX_TOPICS {
		return Err(format!("num_topics is {}, at most {} is allowed", num_topics, MAX_TOPICS));
	}
	match documents.checked_mul(num_topics) {
		Some(cells) if cells <= MAX_DOC_TOPIC_CELLS => Ok(()),
		_ => Err(format!(
			"{} documents x {} topics exceeds {} document-topic counts",
			documents, num_topics, MAX_DOC_TOPIC_CELLS
		)),
	}
}

fn error_response(e: &LdaError) -> HttpResponse {
	match e {
		LdaError::Configuration(_) => HttpResponse::BadRequest().body(e.to_string()),
		_ => {
			error!("sampling failed: {}", e);
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP POST endpoint `/v1/sample`
///
/// Runs a full Gibbs sampling job on the posted corpus, keeps the estimates
/// as the latest run and returns them with `top_n` terms per topic.
#[post("/v1/sample")]
async fn post_sample(data: web::Data<Mutex<SharedData>>, body: web::Json<SampleRequest>) -> impl Responder {
	let request = body.into_inner();
	let top_n = request.top_n.unwrap_or(DEFAULT_TOP_N);
	let declared = request.num_documents.unwrap_or(request.documents.len());
	let config = request.config;
	let documents = request.documents;

	if let Err(message) = check_job_size(documents.len(), config.num_topics) {
		return HttpResponse::BadRequest().body(message);
	}

	// Sampling is CPU bound, keep it off the async workers
	let outcome = web::block(move || {
		let corpus = Corpus::new(documents);
		run_gibbs_sampling(&corpus, declared, &config)
	})
	.await;

	let estimates = match outcome {
		Ok(Ok(estimates)) => estimates,
		Ok(Err(e)) => return error_response(&e),
		Err(_) => return HttpResponse::InternalServerError().body("Sampling worker failed"),
	};

	let response = HttpResponse::Ok().json(SampleResponse::new(&estimates, top_n));

	match data.lock() {
		Ok(mut shared_data) => shared_data.last = Some(estimates),
		Err(_) => return HttpResponse::InternalServerError().body("State lock failed"),
	}

	response
}

/// HTTP GET endpoint `/v1/topics`
///
/// Top terms of every topic from the latest run.
#[get("/v1/topics")]
async fn get_topics(data: web::Data<Mutex<SharedData>>, query: web::Query<TopicsQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("State lock failed"),
	};
	let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N);

	match &shared_data.last {
		Some(estimates) => {
			let topics: Vec<_> = (0..estimates.phi.len()).map(|k| estimates.top_terms(k, top_n)).collect();
			HttpResponse::Ok().json(topics)
		}
		None => HttpResponse::NotFound().body("No sampling run yet"),
	}
}

/// HTTP GET endpoint `/v1/theta`
#[get("/v1/theta")]
async fn get_theta(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("State lock failed"),
	};

	match &shared_data.last {
		Some(estimates) => HttpResponse::Ok().json(&estimates.theta),
		None => HttpResponse::NotFound().body("No sampling run yet"),
	}
}

/// Main entry point for the server.
///
/// Starts an Actix-web HTTP server on 127.0.0.1:5000 holding the latest
/// estimates behind a `Mutex`.
///
/// # Notes
/// - `RUST_LOG=debug` shows per-sweep progress from the sampler.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let shared_data = SharedData {
		last: None,
	};
	let shared_state = web::Data::new(Mutex::new(shared_data));

	info!("listening on 127.0.0.1:5000");

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_state.clone())
			.service(post_sample)
			.service(get_topics)
			.service(get_theta)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
