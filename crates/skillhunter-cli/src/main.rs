use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use skillhunter_core::{audit_and_write, force_plain_output, AuditOptions, OutputFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "skillhunter", version, about = "恶意 Skill 文档扫描器")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 递归审计目录下的 SKILL.md / README.md 并输出报告
    Audit {
        /// 输入目录（skill 仓库根目录）
        #[arg(long)]
        input: PathBuf,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        /// 报告格式：text（控制台报告）或 json（数组）
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节，例如 1048576 代表 1MB）
        #[arg(long)]
        max_file_size: Option<u64>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit { input, output, format, threads, max_file_size } => {
            if !input.is_dir() {
                bail!("input directory does not exist: {}", input.display());
            }
            info!(?input, ?output, "starting audit");

            let format = match format.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            };
            // 解析线程参数："auto" 表示自动（等于 CPU 核数）；其他为具体数值
            let threads_opt = parse_threads(&threads);

            // 输出进文件或 JSON 时关闭着色
            if output.is_some() || format == OutputFormat::Json {
                force_plain_output();
            }
            // 指定输出文件则以缓冲方式写入，否则写标准输出
            let mut out: Box<dyn Write> = match &output {
                Some(path) => {
                    Box::new(BufWriter::new(File::create(path).context("create output file")?))
                }
                None => Box::new(io::stdout().lock()),
            };

            let opts = AuditOptions { format, max_file_size, threads: threads_opt };
            let stats = audit_and_write(&input, &mut out, &opts).context("audit failed")?;
            out.flush().ok();

            info!(
                files_scanned = stats.files_scanned,
                critical_files = stats.critical_files,
                suspicious_files = stats.suspicious_files,
                "audit finished"
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    // 日志走 stderr，报告占用标准输出
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
