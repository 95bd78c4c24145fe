use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::config::{
    GeneratorConfig, ServerConfig, DEFAULT_API_BASE, DEFAULT_DATABASE_PATH, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_LIMIT_MB,
};
use common::sql::{format_row, ExecutionPolicy, QueryOutcome};
use common::PipelineReport;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sqlgen")]
#[command(about = "ask questions about a sqlite database in plain english", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GeneratorArgs {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generative model name
    #[arg(long, env = "SQLGEN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base url of the generative language api
    #[arg(long, env = "SQLGEN_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Seconds to wait for the model before giving up
    #[arg(long, env = "SQLGEN_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl GeneratorArgs {
    fn into_config(self) -> GeneratorConfig {
        GeneratorConfig {
            api_key: self.api_key,
            model: self.model,
            api_base: self.api_base,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upload-and-ask web ui
    Serve {
        /// Host address to bind to
        #[arg(long, env = "SQLGEN_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port number to bind to
        #[arg(long, env = "SQLGEN_PORT", default_value = "8501")]
        port: u16,

        /// Path every uploaded database is written to
        #[arg(long, env = "SQLGEN_DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
        database_path: PathBuf,

        /// Maximum upload size in megabytes
        #[arg(long, default_value_t = DEFAULT_UPLOAD_LIMIT_MB)]
        upload_limit_mb: usize,

        /// Commit statements that modify the database
        #[arg(long, default_value = "false")]
        allow_writes: bool,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Ask one question about a database file and print the results
    Ask {
        /// SQLite database (.db) to ask about
        #[arg(short, long)]
        database: PathBuf,

        /// The question, in plain english
        question: String,

        /// Path the database is copied to before it is queried
        #[arg(long, env = "SQLGEN_DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
        database_path: PathBuf,

        /// Commit statements that modify the database
        #[arg(long, default_value = "false")]
        allow_writes: bool,

        #[command(flatten)]
        generator: GeneratorArgs,
    },
}

fn policy(allow_writes: bool) -> ExecutionPolicy {
    if allow_writes {
        ExecutionPolicy::AllowWrites
    } else {
        ExecutionPolicy::ReadOnly
    }
}

fn upload_limit_bytes(megabytes: usize) -> Result<usize> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("--upload-limit-mb {} is too large", megabytes))
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve {
                host,
                port,
                database_path,
                upload_limit_mb,
                allow_writes,
                generator,
            } => {
                let upload_limit_bytes = upload_limit_bytes(upload_limit_mb)?;
                let config = ServerConfig {
                    host,
                    port,
                    database_path,
                    upload_limit_bytes,
                    policy: policy(allow_writes),
                };
                serve(config, generator.into_config()).await
            }
            Commands::Ask {
                database,
                question,
                database_path,
                allow_writes,
                generator,
            } => {
                ask(
                    database,
                    question,
                    database_path,
                    policy(allow_writes),
                    generator.into_config(),
                )
                .await
            }
        }
    }
}

async fn serve(config: ServerConfig, generator: GeneratorConfig) -> Result<()> {
    use common::llm::GeminiClient;
    use common::tracing::init_tracing;
    use common::Pipeline;
    use std::sync::Arc;

    let _guard = init_tracing("sqlgen")?;

    let client = GeminiClient::new(generator)?;
    if client.config().api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set; submissions will fail until it is");
    }

    let pipeline = Pipeline::new(Arc::new(client), config.database_path.clone(), config.policy);

    common::web::serve(&config, pipeline).await?;
    Ok(())
}

async fn ask(
    database: PathBuf,
    question: String,
    database_path: PathBuf,
    policy: ExecutionPolicy,
    generator: GeneratorConfig,
) -> Result<()> {
    use common::llm::GeminiClient;
    use common::tracing::init_tracing;
    use common::{Pipeline, Upload};
    use std::sync::Arc;

    let _guard = init_tracing("sqlgen")?;

    let file_name = database
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = std::fs::read(&database)?;
    tracing::info!("loaded {} bytes from {}", bytes.len(), database.display());

    let client = Arc::new(GeminiClient::new(generator)?);
    let pipeline = Pipeline::new(client, database_path, policy);

    let report = match pipeline
        .run(&question, Some(&Upload { file_name, bytes }))
        .await
    {
        Ok(report) => report,
        Err(e) if e.is_user_input() => return Err(e.into()),
        Err(e) => return Err(anyhow::anyhow!("Error processing the query: {}", e)),
    };

    print!("{}", render_report(&report));

    Ok(())
}

/// the three result sections as printed by `ask`
fn render_report(report: &PipelineReport) -> String {
    let mut out = format!(
        "Generated SQL Query:\n{}\n\nCorrected SQL Query:\n{}\n\nQuery Results:\n",
        report.generated_sql, report.corrected_sql
    );
    match &report.outcome {
        QueryOutcome::Rows { rows, .. } => {
            for row in rows {
                out.push_str(&format_row(row));
                out.push('\n');
            }
        }
        QueryOutcome::Failed { message } => {
            out.push_str(&format!("Error: {}\n", message));
        }
    }
    out
}
