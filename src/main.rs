use clap::{Parser, Subcommand};
use mcwire::{
    nbt, ping, Eras, McWireError, PingOptions, QueryClient, QueryOptions, RconClient, RconOptions,
    DEFAULT_GAME_PORT, DEFAULT_QUERY_PORT, DEFAULT_RCON_PORT,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// mcwire命令行工具 - 查询Minecraft服务器状态、执行远程命令与查看NBT文件
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 网络超时（秒）
    #[arg(long, global = true, default_value_t = 3.0)]
    timeout: f64,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 通过Query协议（UDP）查询服务器
    Query {
        /// 服务器地址
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_QUERY_PORT)]
        port: u16,

        /// 只获取基础状态
        #[arg(long)]
        basic: bool,
    },

    /// 通过RCON执行命令
    Rcon {
        /// 服务器地址
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_RCON_PORT)]
        port: u16,

        /// RCON密码
        #[arg(long)]
        password: String,

        /// 要执行的命令
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// 服务器列表Ping，自动回退到旧版协议
    Ping {
        /// 服务器地址，可带端口（host:port）
        address: String,

        /// 尝试的协议年代: modern, 1.6, 1.4, beta, all
        #[arg(long, default_value = "all")]
        eras: String,
    },

    /// 打印NBT文件的标签树
    Nbt {
        /// NBT文件路径
        file: PathBuf,

        /// 文件经过gzip压缩
        #[arg(short, long)]
        gzip: bool,
    },
}

fn main() -> Result<(), McWireError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let timeout = Duration::from_secs_f64(cli.timeout.max(0.001));

    let result = match &cli.command {
        Commands::Query { host, port, basic } => run_query(host, *port, *basic, timeout),
        Commands::Rcon {
            host,
            port,
            password,
            command,
        } => run_rcon(host, *port, password, &command.join(" "), timeout),
        Commands::Ping { address, eras } => run_ping(address, eras, timeout),
        Commands::Nbt { file, gzip } => run_nbt(file, *gzip),
    };

    if let Err(ref e) = result {
        eprintln!("执行失败: {}", e);
        if e.is_timeout() {
            eprintln!("连接超时，请检查服务器地址、端口以及是否开启了对应协议");
        }
    }
    result
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_query(host: &str, port: u16, basic: bool, timeout: Duration) -> Result<(), McWireError> {
    let options = QueryOptions::default().with_timeout(timeout);
    let mut client = QueryClient::connect((host, port), options)?;

    if basic {
        let stat = client.basic_stat()?;
        println!("=== 基础状态 ===");
        println!("MOTD: {}", stat.motd);
        println!("游戏类型: {}", stat.game_type);
        println!("地图: {}", stat.map);
        println!("玩家: {}/{}", stat.players.0, stat.players.1);
        println!("地址: {}:{}", stat.host_ip, stat.host_port);
        return Ok(());
    }

    let stat = client.full_stat()?;
    println!("=== 完整状态 ===");
    println!("MOTD: {}", stat.motd);
    println!("版本: {}", stat.version);
    println!("游戏类型: {} ({})", stat.game_type, stat.game_id);
    println!("地图: {}", stat.map);
    if !stat.plugins.is_empty() {
        println!("插件: {}", stat.plugins);
    }
    println!("玩家: {}/{}", stat.players.0, stat.players.1);
    for name in &stat.player_names {
        println!("  - {}", name);
    }
    println!("地址: {}:{}", stat.host_ip, stat.host_port);
    Ok(())
}

fn run_rcon(
    host: &str,
    port: u16,
    password: &str,
    command: &str,
    timeout: Duration,
) -> Result<(), McWireError> {
    let options = RconOptions::default().with_timeout(timeout);
    let mut client = RconClient::connect((host, port), options)?;
    client.authenticate(password)?;
    let output = client.command(command)?;
    println!("{}", output);
    client.close()
}

/// 拆分 `host[:port]`；IPv6地址需写成 `[::1]:25565`
fn split_address(address: &str) -> (String, u16) {
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_GAME_PORT);
            return (host.to_string(), port);
        }
    }
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (address.to_string(), DEFAULT_GAME_PORT),
        },
        _ => (address.to_string(), DEFAULT_GAME_PORT),
    }
}

fn run_ping(address: &str, eras: &str, timeout: Duration) -> Result<(), McWireError> {
    let eras: Eras = eras.parse()?;
    let (host, port) = split_address(address);
    let options = PingOptions::default().with_timeout(timeout).with_eras(eras);

    let Some(response) = ping(&host, port, &options) else {
        println!("{}:{} 无响应", host, port);
        return Ok(());
    };

    println!("=== {}:{} ===", host, port);
    println!("协议年代: {}", response.era);
    if let Some(version) = &response.version {
        match response.protocol {
            Some(protocol) => println!("版本: {} (协议 {})", version, protocol),
            None => println!("版本: {}", version),
        }
    }
    println!("MOTD: {}", mcwire::utils::strip_formatting(&response.motd));
    println!("玩家: {}/{}", response.online, response.max);
    if let Some(latency) = response.latency {
        println!("延迟: {} ms", latency.as_millis());
    }
    if let Some(sample) = response.status.as_ref().and_then(|s| s.players.as_ref()) {
        for player in &sample.sample {
            println!("  - {} ({})", player.name, player.id);
        }
    }
    Ok(())
}

fn run_nbt(file: &PathBuf, gzip: bool) -> Result<(), McWireError> {
    if !file.exists() {
        return Err(McWireError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("文件不存在: {}", file.display()),
        )));
    }

    let reader = BufReader::new(File::open(file)?);
    let tag = if gzip {
        nbt::read_compressed(reader)?
    } else {
        let mut reader = reader;
        nbt::read_tag(&mut reader)?
    };
    println!("{}", tag);
    Ok(())
}
