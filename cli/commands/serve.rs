use std::io::Cursor;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Args;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use rmsnet::{Matrix, Trainer};

use super::{load_model, predict::classify_image};

#[derive(Args)]
pub struct ServeArgs {
    /// Saved model file
    #[arg(long)]
    pub model: String,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:7878")]
    pub addr: String,
}

#[derive(Deserialize)]
struct PredictRequest {
    inputs: Vec<Vec<f64>>,
}

pub fn run(args: ServeArgs) -> Result<()> {
    let trainer = Arc::new(load_model(&args.model)?);
    let server = Server::http(&args.addr)
        .map_err(|e| anyhow!("failed to bind {}: {}", args.addr, e))?;
    info!(
        "serving {} ({} inputs, {} classes) on http://{}",
        args.model,
        trainer.network().input_dim(),
        trainer.network().output_dim(),
        args.addr
    );

    for request in server.incoming_requests() {
        let trainer = Arc::clone(&trainer);
        std::thread::spawn(move || dispatch(request, &trainer));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

fn dispatch(mut request: Request, trainer: &Trainer) {
    let method = request.method().clone();
    let path = request.url().split('?').next().unwrap_or("").to_owned();

    let mut body = Vec::new();
    let (status, payload) = match request.as_reader().read_to_end(&mut body) {
        Ok(_) => route(&method, &path, &body, trainer),
        Err(e) => (400, error_body(format!("failed to read request body: {}", e))),
    };
    debug!("{} {} -> {}", method, path, status);

    if let Err(e) = request.respond(json_response(status, &payload)) {
        warn!("failed to send response: {}", e);
    }
}

/// Maps a request onto a status code and JSON body.
fn route(method: &Method, path: &str, body: &[u8], trainer: &Trainer) -> (u16, Value) {
    match (method, path) {
        (Method::Get, "/health") => (200, json!({ "status": "ok" })),
        (Method::Post, "/predict") => match predict_rows(body, trainer) {
            Ok(classes) => (200, json!({ "classes": classes })),
            Err(e) => (400, error_body(e.to_string())),
        },
        (Method::Post, "/predict/image") => match classify_image(trainer, body) {
            Ok(class) => (200, json!({ "class": class })),
            Err(e) => (400, error_body(e.to_string())),
        },
        _ => (404, error_body(format!("no route for {} {}", method, path))),
    }
}

fn predict_rows(body: &[u8], trainer: &Trainer) -> Result<Vec<usize>> {
    let request: PredictRequest = serde_json::from_slice(body)?;
    let inputs = Matrix::from_rows(request.inputs)?;
    Ok(trainer.predict(&inputs)?)
}

fn error_body(message: String) -> Value {
    json!({ "error": message })
}

fn json_response(status: u16, payload: &Value) -> Response<Cursor<Vec<u8>>> {
    let bytes = payload.to_string().into_bytes();
    let len = bytes.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .ok()
        .into_iter()
        .collect();
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}
