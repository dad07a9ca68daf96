//! 命令行入口:拉取一类财务报表并输出合并结果的路径

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use yky_fetcher::{AppConfig, Fetcher, Granularity, ReportCatalog, ReportQuery};

#[derive(Parser)]
#[command(name = "yky-fetcher", version, about = "拉取悦刻云影院财务报表")]
struct Cli {
    /// 报表类别编码,例如 C01
    #[arg(long)]
    category: String,

    /// 时间粒度,day 或 month
    #[arg(long, default_value = "day")]
    span: String,

    /// 查询日期,day 为 YYYY-MM-DD,month 为 YYYY-MM
    #[arg(long)]
    date: String,

    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 字段结构文件路径,缺省时使用内置目录
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// 合并完成后保留分片文件
    #[arg(long)]
    keep_shards: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config).context("加载配置失败")?;
    if cli.keep_shards {
        config.remove_shards = false;
    }

    let catalog = match &cli.schemas {
        Some(path) => ReportCatalog::load(path).context("加载字段结构失败")?,
        None => ReportCatalog::builtin(),
    };

    let granularity = Granularity::parse(&cli.span)?;
    let query = ReportQuery::new(&cli.category, granularity, &cli.date, &catalog)?;

    let fetcher = Fetcher::new(config, catalog)?;
    match fetcher.fetch(&query) {
        Ok(Some(path)) => {
            println!("{}", path.display());
            Ok(())
        }
        Ok(None) => {
            log::warn!("该查询没有返回任何数据");
            Ok(())
        }
        Err(err) => {
            err.log();
            Err(err.into())
        }
    }
}
