use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use donate_bridge::api::AcrossApiClient;
use donate_bridge::api::across::{DonationActionParams, Quote, QuoteParams, build_donation_actions};
use donate_bridge::bridge::validation::is_native_token;
use donate_bridge::bridge::{
    AcrossService, BridgeError, DESTINATION_CHAIN_ID, DESTINATION_TOKEN, is_same_token_transfer,
};
use donate_bridge::config::{self, AppConfig, ConfigError, build_http_client, load_config};
use donate_bridge::monitoring;
use donate_bridge::wallet::{RpcWallet, WalletService};

#[derive(Parser, Debug)]
#[command(name = "donate-bridge", version, about = "跨链捐赠兑换客户端")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 donate-bridge.toml 或 config/donate-bridge.toml）"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 请求跨链兑换报价（目标固定为 Base 链 USDC）
    Quote(QuoteCmd),
    /// 列出支持的源链
    Chains,
    /// 列出支持的代币
    Tokens(TokensCmd),
    /// 查询充值/成交状态
    Status(StatusCmd),
    #[command(name = "same-token")]
    /// 判断两端是否为同链同币（无需跨链）
    SameToken(SameTokenCmd),
    /// 报价并通过 JSON-RPC 钱包提交授权与兑换交易
    Execute(QuoteCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug)]
struct QuoteCmd {
    #[arg(long, help = "源链 chainId")]
    origin_chain: u64,
    #[arg(long, help = "输入代币地址")]
    input_token: String,
    #[arg(long, help = "输入数量（最小单位整数）")]
    amount: String,
    #[arg(long, help = "付款地址（execute 时缺省取钱包当前账户）")]
    depositor: Option<String>,
    #[arg(long, help = "收款地址（缺省与付款地址相同）")]
    recipient: Option<String>,
    #[arg(
        long,
        value_name = "FILE",
        help = "捐赠动作参数 JSON 文件，提供时改为带附加动作的报价（收款方为 multicall handler）"
    )]
    donation_actions: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TokensCmd {
    #[arg(long, help = "仅列出指定链的代币（走缓存）")]
    chain: Option<u64>,
}

#[derive(Args, Debug)]
struct StatusCmd {
    #[arg(long, help = "报价返回的 depositId")]
    deposit_id: String,
    #[arg(long, help = "源链 chainId")]
    origin_chain: u64,
    #[arg(long, help = "持续轮询直到终态的最长秒数")]
    wait_secs: Option<u64>,
    #[arg(long, default_value_t = 5_000, help = "轮询间隔（毫秒）")]
    interval_ms: u64,
}

#[derive(Args, Debug)]
struct SameTokenCmd {
    #[arg(long)]
    chain_a: u64,
    #[arg(long)]
    token_a: String,
    #[arg(long)]
    chain_b: u64,
    #[arg(long)]
    token_b: String,
}

#[derive(Args, Debug)]
struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    force: bool,
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone())?;
    init_tracing(&config.global.logging)?;

    if let Some(addr) = monitoring::try_init_prometheus(&config.global.metrics.prometheus_listen)? {
        info!(target: "monitoring", %addr, "Prometheus 导出器已启动");
    }

    let http_client = build_http_client(&config.global)?;
    let api_client = AcrossApiClient::new(
        http_client.clone(),
        &config.bridge,
        &config.global.logging,
    );
    let service = AcrossService::new(api_client, &config.bridge);

    match cli.command {
        Command::Quote(args) => {
            let depositor = args
                .depositor
                .clone()
                .ok_or_else(|| anyhow!("quote 需要 --depositor"))?;
            let quote = request_quote(&service, args, depositor).await?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::Chains => {
            let chains = service
                .get_supported_chains()
                .await
                .map_err(describe_bridge_error)?;
            println!("{}", serde_json::to_string_pretty(chains.as_slice())?);
        }
        Command::Tokens(args) => {
            let tokens = match args.chain {
                Some(chain_id) => service
                    .get_supported_tokens(chain_id)
                    .await
                    .map(|tokens| tokens.to_vec()),
                None => service.get_all_supported_tokens().await,
            }
            .map_err(describe_bridge_error)?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Command::Status(args) => {
            let status = match args.wait_secs {
                Some(secs) => {
                    service
                        .wait_for_fill(
                            &args.deposit_id,
                            args.origin_chain,
                            Duration::from_millis(args.interval_ms.max(1)),
                            Duration::from_secs(secs),
                        )
                        .await
                }
                None => {
                    service
                        .get_deposit_status(&args.deposit_id, args.origin_chain)
                        .await
                }
            }
            .map_err(describe_bridge_error)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::SameToken(args) => {
            let same =
                is_same_token_transfer(args.chain_a, &args.token_a, args.chain_b, &args.token_b);
            println!("{same}");
        }
        Command::Execute(args) => {
            execute(service, &config, http_client, args).await?;
        }
        Command::Init(args) => {
            init_configs(args)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init();
    } else {
        fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn load_configuration(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_config(path)
}

fn describe_bridge_error(err: BridgeError) -> anyhow::Error {
    anyhow!("[{}] {}", err.kind().key(), err.detail())
}

/// 指定 `--donation-actions` 时走带附加动作的报价。
async fn request_quote(service: &AcrossService, args: QuoteCmd, depositor: String) -> Result<Quote> {
    let actions_path = args.donation_actions.clone();
    let params = quote_params(args, depositor);
    let quote = match actions_path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .map_err(|err| anyhow!("读取捐赠动作文件失败 {}: {err}", path.display()))?;
            let donation: DonationActionParams = serde_json::from_str(&raw)
                .map_err(|err| anyhow!("捐赠动作文件格式无效 {}: {err}", path.display()))?;
            let actions = build_donation_actions(&donation);
            service.get_quote_with_actions(&params, &actions).await
        }
        None => service.get_quote(&params).await,
    };
    quote.map_err(describe_bridge_error)
}

fn quote_params(args: QuoteCmd, depositor: String) -> QuoteParams {
    QuoteParams {
        origin_chain_id: args.origin_chain,
        input_token: args.input_token,
        amount: args.amount,
        recipient: args.recipient.unwrap_or_else(|| depositor.clone()),
        depositor,
    }
}

async fn execute(
    service: AcrossService,
    config: &AppConfig,
    http_client: reqwest::Client,
    args: QuoteCmd,
) -> Result<()> {
    let rpc_url = config.wallet.rpc_url.trim();
    if rpc_url.is_empty() {
        return Err(anyhow!("execute 需要在配置中设置 wallet.rpc_url"));
    }
    let wallet = Arc::new(
        RpcWallet::new(http_client, rpc_url)
            .with_timeout(Duration::from_millis(config.bridge.request_timeout_ms)),
    );

    if is_same_token_transfer(
        args.origin_chain,
        &args.input_token,
        DESTINATION_CHAIN_ID,
        DESTINATION_TOKEN,
    ) {
        warn!(
            target: "bridge",
            origin_chain_id = args.origin_chain,
            "源与目标为同链同币，无需跨链，请直接转账"
        );
        return Ok(());
    }

    let depositor = match args.depositor.clone() {
        Some(address) => address,
        None => wallet
            .get_account()
            .await?
            .ok_or_else(|| anyhow!("钱包未返回可用账户"))?,
    };

    if is_native_token(&args.input_token) {
        let balance = wallet.get_balance(Some(&depositor)).await?;
        let wanted: u128 = args
            .amount
            .parse()
            .map_err(|err| anyhow!("输入数量无效 {}: {err}", args.amount))?;
        if balance < wanted {
            warn!(
                target: "bridge",
                balance,
                wanted,
                "原生币余额不足，交易可能失败"
            );
        }
    }

    let service = service.with_wallet(wallet);
    let quote = request_quote(&service, args, depositor).await?;
    let tx_hash = service
        .execute_swap(&quote)
        .await
        .map_err(describe_bridge_error)?;
    info!(
        target: "bridge",
        tx_hash = %tx_hash,
        deposit_id = quote.deposit_id.as_deref().unwrap_or("-"),
        "兑换交易已提交"
    );
    println!("{tx_hash}");
    Ok(())
}

fn init_configs(args: InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let target_path = output_dir.join("donate-bridge.toml");
    if target_path.exists() && !args.force {
        println!(
            "跳过 {}（文件已存在，如需覆盖请加 --force）",
            target_path.display()
        );
        return Ok(());
    }

    fs::write(
        &target_path,
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/donate-bridge.toml")),
    )?;
    println!("已写入 {}", target_path.display());
    Ok(())
}
