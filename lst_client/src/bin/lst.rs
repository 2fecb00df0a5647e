use std::path::PathBuf;
use std::time::Duration;

use actix::{Actor, Addr};
use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use lst_client::controller::message::{
    ActionDropped, ResetRequested, Subscribe, UsernameBlurred, UsernameFocused, UsernameInput,
};
use lst_client::dnd::{DragContext, DragMonitor};
use lst_client::lifecycle::Phase;
use lst_client::session::{CookieJar, IdentityStore};
use lst_client::{setup_logger, GameController, ViewSnapshot};
use lst_env::ClientConfig;

#[derive(Parser)]
#[command(
    name = "lst",
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Cli {
    /// 설정 파일 경로 (기본: $XDG_CONFIG_HOME/lst/client.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 백엔드 주소를 일시적으로 덮어씀
    #[arg(long)]
    api: Option<String>,

    /// 응답을 기다리는 최대 시간 (초)
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 초기 상태를 불러와 보드를 출력
    Show {
        #[arg(long)]
        json: bool,
    },
    /// 플레이어 카드(from)를 상대 카드(to) 위에 드롭
    Attack { from: usize, to: usize },
    /// 게임 초기화 요청
    Reset,
    /// 사용자 이름 변경
    Username { name: String },
    /// 저장된 세션 키와 이름 출력
    Session,
    /// 기본 설정 파일 생성
    InitConfig,
}

#[actix::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env 적용 후 전역 설정 로드
    lst_env::init()?;
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path.clone())?,
        None => ClientConfig::global().clone(),
    };
    if let Some(api) = &cli.api {
        config.api.base_url = api.clone();
    }
    let _guard = setup_logger(&config.logging);

    match cli.command {
        Command::InitConfig => {
            lst_env::create_default_config()?;
            println!(
                "Wrote {}",
                ClientConfig::get_config_dir().join("client.toml").display()
            );
            return Ok(());
        }
        Command::Session => {
            let jar = CookieJar::open(config.storage.cookie_path())?;
            let identity = IdentityStore::with_max_age(jar, config.storage.max_age());
            println!("session  {}", identity.get_or_set_session_key());
            println!("username {}", identity.get_or_set_username(None));
            return Ok(());
        }
        _ => {}
    }

    let wait = Duration::from_secs(cli.wait_secs);
    let controller = GameController::from_config(&config)?;
    let addr = controller.start();
    let mut rx = addr.send(Subscribe).await?;

    // 초기 로드가 끝날 때까지 대기
    let loaded = settle(&mut rx, wait, |s| s.phase != Phase::Uninitialized).await?;
    info!("Initial state ready (r{})", loaded.revision);

    let snapshot = match cli.command {
        Command::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.state)?);
                return Ok(());
            }
            loaded
        }
        Command::Attack { from, to } => attack(&addr, &mut rx, &loaded, from, to, wait).await?,
        Command::Reset => {
            addr.send(ResetRequested).await?;
            let snapshot = settle(&mut rx, wait, after(loaded.revision)).await?;
            println!("[{}]", snapshot.reset_class_names());
            snapshot
        }
        Command::Username { name } => {
            addr.send(UsernameFocused).await?;
            addr.send(UsernameInput(name)).await?;
            addr.send(UsernameBlurred).await?;
            let before = loaded.revision;
            settle(&mut rx, wait, move |s| {
                s.revision > before && !s.editing_username
            })
            .await?
        }
        // 컨트롤러 시작 전에 처리됨
        Command::Session | Command::InitConfig => loaded,
    };

    println!("{}", snapshot.render(&DragMonitor::idle()));
    Ok(())
}

fn after(revision: u64) -> impl Fn(&ViewSnapshot) -> bool {
    move |s| s.revision > revision
}

/// 조건을 만족하고 진행 중인 요청이 없는 첫 스냅샷을 기다립니다.
async fn settle<F>(
    rx: &mut watch::Receiver<ViewSnapshot>,
    wait: Duration,
    ready: F,
) -> Result<ViewSnapshot>
where
    F: Fn(&ViewSnapshot) -> bool,
{
    let snapshot = tokio::time::timeout(wait, rx.wait_for(|s| ready(s) && !s.busy))
        .await
        .map_err(|_| anyhow!("timed out after {:?} waiting for the backend", wait))?
        .context("controller stopped")?;
    Ok(snapshot.clone())
}

async fn attack(
    addr: &Addr<GameController>,
    rx: &mut watch::Receiver<ViewSnapshot>,
    loaded: &ViewSnapshot,
    from: usize,
    to: usize,
    wait: Duration,
) -> Result<ViewSnapshot> {
    let board = loaded.board();
    let Some(source) = board.source(from) else {
        bail!("no player card at position {}", from);
    };
    let Some(target) = board.target(to) else {
        bail!("no opponent card at position {}", to);
    };

    let mut drag = DragContext::new(addr.clone().recipient::<ActionDropped>());
    drag.begin_drag(source);
    if !drag.hover(target) {
        bail!("opponent card {} refused the drop", to);
    }
    eprintln!("{}", board.render(&drag.monitor()));

    if drag.drop().is_none() {
        warn!("Drop produced no action");
        return Ok(loaded.clone());
    }
    settle(rx, wait, after(loaded.revision)).await
}
