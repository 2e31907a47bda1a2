//! # reqflow-cli
//!
//! reqflow 바이너리 진입점.
//! 설정 로드, 로깅 초기화, 요청 큐 구성 후 요청 한 건을 실행하고 결과를 출력한다.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use reqflow_core::config::NetworkConfig;
use reqflow_core::config_manager::ConfigManager;
use reqflow_core::error::RequestError;
use reqflow_core::models::http::{Endpoint, HttpMethod, CONTENT_TYPE, CONTENT_TYPE_JSON};
use reqflow_network::error_handler::{ApplicationCodeHook, ErrorHandler};
use reqflow_network::http_client::ReqwestTransport;
use reqflow_network::queue::RequestQueue;
use reqflow_network::request::{JsonRequest, Request, RequestOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 세션 만료로 취급하는 애플리케이션 에러 코드
const SESSION_EXPIRED_CODE: i64 = 401;

/// reqflow HTTP 요청 실행기
///
/// 요청 큐와 응답 검증 파이프라인을 거쳐 JSON API를 호출한다.
#[derive(Parser, Debug)]
#[command(name = "reqflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP 메서드 (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)
    method: String,

    /// 절대 URL 또는 base URL 기준 경로
    target: String,

    /// 설정 파일 경로 (없으면 기본 설정, 파일을 만들지 않음)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// base URL 지정
    #[arg(long, short = 'b')]
    base_url: Option<String>,

    /// 요청 타임아웃 (밀리초)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// 동시 실행 상한
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// 성공으로 취급할 상태 코드
    #[arg(long)]
    success_status: Option<u16>,

    /// JSON 요청 본문
    #[arg(long, short = 'd')]
    data: Option<String>,

    /// 쿼리 파라미터 (key=value, 반복 가능)
    #[arg(long = "query", short = 'q')]
    queries: Vec<String>,

    /// 요청 헤더 (Name: value, 반복 가능)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// 디버그 로그 출력
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let log_filter = format!("reqflow={level},reqflow_core={level},reqflow_network={level}");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// 설정 로드 후 CLI 인자로 오버라이드
fn load_config(args: &Args) -> Result<NetworkConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())
            .with_context(|| format!("설정 로드 실패: {}", path.display()))?
            .get(),
        None => NetworkConfig::default_config(),
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if let Some(max) = args.max_concurrent {
        config.max_concurrent_requests = Some(max);
    }
    if let Some(status) = args.success_status {
        config.success_status = status;
    }

    config
        .validate()
        .map_err(|e| anyhow!("설정 검증 실패: {e}"))?;
    Ok(config)
}

/// 인자로부터 엔드포인트 구성
fn build_endpoint(args: &Args, config: &NetworkConfig) -> Result<Endpoint> {
    let method: HttpMethod = args.method.parse()?;

    let is_absolute = args.target.starts_with("http://") || args.target.starts_with("https://");
    let mut endpoint = match (&config.base_url, is_absolute) {
        (Some(base), false) => Endpoint::at(method, base, &args.target),
        _ => Endpoint::new(method, args.target.clone()),
    };

    for query in &args.queries {
        let (key, value) = query
            .split_once('=')
            .ok_or_else(|| anyhow!("쿼리 형식은 key=value: {query}"))?;
        endpoint = endpoint.with_query(key, value);
    }

    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("헤더 형식은 'Name: value': {header}"))?;
        endpoint = endpoint.with_header(name.trim(), value.trim());
    }

    if let Some(data) = &args.data {
        // 전송 전에 JSON 형식 확인
        let _: serde_json::Value =
            serde_json::from_str(data).context("요청 본문이 올바른 JSON이 아님")?;
        endpoint = endpoint
            .with_header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .with_body(data.as_bytes().to_vec());
    }

    Ok(endpoint)
}

fn print_failure(err: &RequestError) {
    eprintln!("요청 실패 [{}]: {err}", err.kind());
    if let Some(text) = err.response_text() {
        eprintln!("응답 본문:\n{text}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let endpoint = build_endpoint(&args, &config)?;

    let handler = ErrorHandler::new().with_hook(Arc::new(ApplicationCodeHook::new(
        SESSION_EXPIRED_CODE,
        |e| warn!("세션 만료 응답 수신: {}", e.description),
    )));
    let transport = ReqwestTransport::from_config(&config)?;
    let queue = RequestQueue::new(
        &config,
        Arc::new(transport),
        Arc::new(handler),
        reqflow_network::callback::CallbackContext::spawn(),
    );

    info!("요청 실행: {} {}", endpoint.method, endpoint.url);
    let handle = queue
        .submit(Request::new(JsonRequest::new(endpoint)))
        .ok_or_else(|| anyhow!("요청 큐 입장 거부"))?;

    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("중단 신호 수신");
            return Ok(ExitCode::from(130));
        }
    };

    match outcome {
        RequestOutcome::Completed(object) => {
            println!("{}", serde_json::to_string_pretty(&object)?);
            Ok(ExitCode::SUCCESS)
        }
        RequestOutcome::Failed(err) => {
            print_failure(&err);
            Ok(ExitCode::FAILURE)
        }
        RequestOutcome::Cancelled => {
            eprintln!("요청 취소됨");
            Ok(ExitCode::FAILURE)
        }
    }
}
