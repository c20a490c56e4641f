//! 程序入口：初始化日志、构建 NodeStore，并把树输出为缩进文本或 JSON

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::SubscriberBuilder;

use json_tree_nest::utils::fs::write_json_file;
use json_tree_nest::vm::bridge::{STATUS_ERROR_PREFIX, STATUS_LOADED, STATUS_READY};
use json_tree_nest::{NodeStore, TreeDataSource};

/// 把嵌套 JSON 显示为可折叠树的结构
#[derive(Parser, Debug)]
#[command(name = "json_tree_nest")]
#[command(version)]
struct Cli {
    /// JSON 文件路径（缺省时使用内嵌示例数据）
    path: Option<PathBuf>,

    /// 以 JSON 形式输出节点列表
    #[arg(long)]
    json: bool,

    /// 同时把节点列表保存到该文件
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn run(opts: Cli) -> Result<()> {
    tracing::info!("{}", STATUS_READY);
    let start = Instant::now();
    let store = match &opts.path {
        Some(p) => NodeStore::from_path(p).with_context(|| format!("加载文件失败: {}", p.display()))?,
        None => NodeStore::from_embedded().context("内嵌数据无效")?,
    };
    tracing::info!("{}，耗时: {:.2}ms", STATUS_LOADED, start.elapsed().as_secs_f64() * 1000.0);

    let source = TreeDataSource::bind(&store);
    let nodes = source.nodes();

    if let Some(out) = &opts.out {
        write_json_file(out, nodes.as_slice())
            .with_context(|| format!("写入文件失败: {}", out.display()))?;
        tracing::info!("已保存到 {}", out.display());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(nodes.as_slice())?);
    } else {
        print!("{}", source.render_text());
    }
    Ok(())
}

fn main() {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("{}{:#}", STATUS_ERROR_PREFIX, e);
        std::process::exit(1);
    }
}
