use std::sync::Arc;

use actix::{Actor, ActorFutureExt, Context, ContextFutureSpawner, WrapFuture};
use lst_env::{ClientConfig, ControllerSettings};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, Backend};
use crate::assets::{AssetCatalog, Backdrop};
use crate::dnd::DragMonitor;
use crate::errors::ClientResult;
use crate::lifecycle::{Lifecycle, Phase, Pulse, RequestKind, Settle, Ticket, UsernameEditor};
use crate::models::AppState;
use crate::session::{CookieJar, IdentityStore, SharedIdentity};
use crate::view::BoardView;

pub mod handler;
pub mod message;

/// 렌더러가 그리는 데 필요한 전부. 상태가 바뀔 때마다 새로 발행됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub revision: u64,
    pub phase: Phase,
    pub state: AppState,
    pub username: String,
    pub editing_username: bool,
    pub pulse_active: bool,
    pub busy: bool,
    pub backdrop: Backdrop,
}

impl ViewSnapshot {
    pub fn board(&self) -> BoardView {
        BoardView::layout(&self.state)
    }

    pub fn reset_class_names(&self) -> &'static str {
        if self.pulse_active {
            "reset pulse"
        } else {
            "reset"
        }
    }

    pub fn render(&self, monitor: &DragMonitor<'_>) -> String {
        let username = if self.username.is_empty() {
            "(anonymous)"
        } else {
            &self.username
        };
        format!(
            "{} | field {} | board {} | {:?}\n{}",
            username,
            self.backdrop.field.display(),
            self.backdrop.board.display(),
            self.phase,
            self.board().render(monitor)
        )
    }
}

/// 루트 화면. 유일한 상태 소유자이며 세션 → 초기 로드 → 렌더 흐름을 진행합니다.
pub struct GameController {
    backend: Arc<dyn Backend>,
    identity: SharedIdentity,
    lifecycle: Lifecycle,
    editor: UsernameEditor,
    pulse: Pulse,
    catalog: AssetCatalog,
    backdrop: Backdrop,
    revision: u64,
    snapshot_tx: watch::Sender<ViewSnapshot>,
}

impl GameController {
    pub fn new(
        backend: Arc<dyn Backend>,
        identity: SharedIdentity,
        catalog: AssetCatalog,
        settings: &ControllerSettings,
    ) -> Self {
        let lifecycle = Lifecycle::new(settings.fence_stale_responses);
        let editor = UsernameEditor::new(identity.get_or_set_username(None));
        let pulse = Pulse::new(settings.reset_pulse());
        let backdrop = Backdrop::select(lifecycle.state(), &catalog, &mut rand::thread_rng());

        let initial = ViewSnapshot {
            revision: 0,
            phase: lifecycle.phase(),
            state: lifecycle.state().clone(),
            username: editor.display().to_string(),
            editing_username: false,
            pulse_active: false,
            busy: false,
            backdrop: backdrop.clone(),
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            backend,
            identity,
            lifecycle,
            editor,
            pulse,
            catalog,
            backdrop,
            revision: 0,
            snapshot_tx,
        }
    }

    /// 설정만으로 쿠키 파일과 HTTP 클라이언트까지 구성합니다.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let jar = CookieJar::open(config.storage.cookie_path())?;
        let identity = IdentityStore::shared(jar, config.storage.max_age());
        let api = ApiClient::new(&config.api, identity.clone())?;

        Ok(Self::new(
            Arc::new(api),
            identity,
            AssetCatalog::from_settings(&config.assets),
            &config.controller,
        ))
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            revision: self.revision,
            phase: self.lifecycle.phase(),
            state: self.lifecycle.state().clone(),
            username: self.editor.display().to_string(),
            editing_username: self.editor.is_editing(),
            pulse_active: self.pulse.is_active(),
            busy: self.lifecycle.is_busy() || self.editor.is_submitting(),
            backdrop: self.backdrop.clone(),
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        let snapshot = self.snapshot();
        debug!(
            "Publishing snapshot r{} ({:?}, busy: {})",
            snapshot.revision, snapshot.phase, snapshot.busy
        );
        self.snapshot_tx.send_replace(snapshot);
    }

    fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// 응답이 실제로 적용되었을 때 이름과 배경을 새 상태에 맞춥니다.
    fn on_settled(&mut self, ticket: Ticket, settle: Settle) {
        match settle {
            Settle::Applied => {
                // 이름이 없는 응답은 확정된 이름을 지우지 않음
                let username = self.lifecycle.state().username().to_string();
                if !username.is_empty() {
                    self.editor.sync(&username);
                }
                // 배경은 새 게임(초기 로드, 리셋)에서만 다시 고름
                if matches!(ticket.kind, RequestKind::Init | RequestKind::Reset) {
                    self.backdrop = Backdrop::select(
                        self.lifecycle.state(),
                        &self.catalog,
                        &mut rand::thread_rng(),
                    );
                }
                info!(
                    "{:?} #{} applied: {} opponent / {} player cards",
                    ticket.kind,
                    ticket.generation,
                    self.lifecycle.state().opponent.len(),
                    self.lifecycle.state().player.len()
                );
            }
            Settle::Stale => {
                warn!(
                    "{:?} #{} arrived after a newer state; discarded",
                    ticket.kind, ticket.generation
                );
            }
            Settle::Failed => {
                debug!("{:?} #{} failed; state unchanged", ticket.kind, ticket.generation);
            }
        }
        self.publish();
    }

    fn start_initial_load(&mut self, ctx: &mut Context<Self>) {
        let Some((ticket, session_key)) = self.lifecycle.begin_load() else {
            warn!("Initial load requested before identification");
            return;
        };
        self.publish();

        let backend = self.backend.clone();
        async move { backend.fetch_initial_state(&session_key).await }
            .into_actor(self)
            .map(move |state, act, _ctx| {
                let settle = act.lifecycle.finish_load(ticket, state);
                act.on_settled(ticket, settle);
            })
            .spawn(ctx);
    }
}

impl Actor for GameController {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // 1. 세션 키 확보 (없으면 생성)
        let session_key = self.identity.get_or_set_session_key();
        self.lifecycle.identify(session_key);
        info!("GameController started ({:?})", self.lifecycle.phase());

        // 2. 초기 상태 로드
        self.start_initial_load(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("GameController stopped");
    }
}
