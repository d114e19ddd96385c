use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use contract_batch::models::{load_uploaded_documents, parse_document_arg};
use contract_batch::utils::logging;
use contract_batch::{App, ApprovalMode, Config, DocumentKind, OutputPolicyKind, Submission};

/// 契約関係書類の一括チェックとアーカイブ作成
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// 会社名（出力ファイル名に使用）
    #[arg(short, long)]
    company: String,

    /// 決裁種別（paper / electronic）
    #[arg(short, long, default_value = "paper")]
    approval: ApprovalMode,

    /// ① 契約書
    #[arg(long)]
    contract: Option<PathBuf>,

    /// ② 見積書
    #[arg(long)]
    estimate: Option<PathBuf>,

    /// ③ 誓約書
    #[arg(long)]
    oath: Option<PathBuf>,

    /// ④ チェックシート
    #[arg(long)]
    checklist: Option<PathBuf>,

    /// ⑤ 確認書
    #[arg(long)]
    confirmation: Option<PathBuf>,

    /// 種別キー付きの入力（例: --doc oath=誓約書.docx）。繰り返し指定可
    #[arg(long = "doc", value_name = "KIND=PATH", value_parser = parse_doc)]
    docs: Vec<(DocumentKind, PathBuf)>,

    /// 出力方針（passthrough / sanitize / fixed-page / validate-only）
    #[arg(short, long, env = "OUTPUT_POLICY")]
    policy: Option<OutputPolicyKind>,

    /// ルール定義ファイル（TOML）
    #[arg(long, env = "RULE_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// アーカイブの出力先
    #[arg(short, long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// 結果を JSON で出力
    #[arg(long)]
    json: bool,

    /// 詳細ログ
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn inputs(&self) -> Vec<(DocumentKind, PathBuf)> {
        [
            (DocumentKind::Contract, &self.contract),
            (DocumentKind::Estimate, &self.estimate),
            (DocumentKind::Oath, &self.oath),
            (DocumentKind::Checklist, &self.checklist),
            (DocumentKind::Confirmation, &self.confirmation),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.clone().map(|p| (kind, p)))
        .chain(self.docs.iter().cloned())
        .collect()
    }

    /// 環境変数の設定にコマンドラインの指定を重ねる
    fn apply(&self, mut config: Config) -> Config {
        if let Some(policy) = self.policy {
            config.output_policy = policy;
        }
        if let Some(catalog) = &self.catalog {
            config.rule_catalog_path = Some(catalog.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config.verbose_logging |= self.verbose;
        config
    }
}

fn parse_doc(arg: &str) -> std::result::Result<(DocumentKind, PathBuf), String> {
    parse_document_arg(arg).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 設定の読み込み
    let config = args.apply(Config::from_env());

    // ログの初期化
    logging::init(config.verbose_logging);

    let documents = load_uploaded_documents(&args.inputs()).await?;

    let app = App::initialize(config)
        .await
        .context("初期化に失敗しました")?;

    let summary = app
        .run(Submission {
            company_name: args.company.clone(),
            approval_mode: args.approval,
            documents,
        })
        .await?;

    if args.json {
        println!("{}", summary.report.to_json()?);
    } else {
        print!("{}", summary.report.render_text());
    }

    Ok(())
}
