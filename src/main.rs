use anyhow::Result;
use clap::Parser;
use tumor_detect::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tumor-detect")]
#[command(about = "ONNX-powered brain tumor detection service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "TUMOR_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Path to the ONNX classifier
    #[arg(long, env = "TUMOR_MODEL_PATH", default_value = "models/tumor_classifier.onnx")]
    model_path: String,

    /// Probability at or above which a scan is reported as a tumor
    #[arg(long, env = "TUMOR_THRESHOLD", default_value_t = 0.5)]
    threshold: f32,

    /// Position of the tumor probability in the model output
    #[arg(long, env = "TUMOR_INDEX", default_value_t = 1)]
    tumor_index: usize,

    /// Number of worker threads
    #[arg(long, env = "TUMOR_WORKERS")]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Allowed CORS origin, repeatable; "*" allows any origin
    #[arg(
        long = "cors-origin",
        env = "TUMOR_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:3000", "http://localhost:5173"]
    )]
    cors_origins: Vec<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    // 创建配置
    let config = Config::new(args.bind, args.model_path, args.workers, args.dev)?
        .with_threshold(args.threshold)?
        .with_tumor_index(args.tumor_index)?
        .with_cors_origins(args.cors_origins);

    tracing::info!("Starting tumor detection service...");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Model path: {}", config.model_path.display());
    tracing::info!(
        "Threshold: {}, tumor index: {}, workers: {}",
        config.threshold,
        config.output_layout.tumor_index,
        config.workers
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    // 启动服务器
    runtime.block_on(serve(config))?;

    Ok(())
}
