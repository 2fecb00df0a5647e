//! 루트 화면의 생명주기 상태 기계.
//!
//! Uninitialized → Identified → Loaded ⇄ ActionPending
//!
//! 상태를 바꾸는 요청(init / action / reset)은 모두 세대 번호가 붙은 [`Ticket`] 을 받습니다.
//! fencing 이 켜져 있으면 이미 적용된 것보다 오래된 응답은 버립니다.
//! 꺼져 있으면 나중에 도착한 응답이 이깁니다.

use std::time::Duration;

use tracing::{debug, warn};

use crate::models::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 세션 키 없음
    Uninitialized,
    /// 세션 키 확보, 상태는 아직 기본값
    Identified,
    /// 초기 상태 수신 완료 (성공 또는 기본값 대체)
    Loaded,
    /// 액션 전송 중
    ActionPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Init,
    Action,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub kind: RequestKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// 응답으로 상태를 교체함
    Applied,
    /// 더 최신 응답이 이미 적용되어 버림
    Stale,
    /// 요청 실패. 상태는 그대로
    Failed,
}

#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    session_key: Option<String>,
    state: AppState,
    loaded: bool,
    load_pending: bool,
    actions_in_flight: usize,
    resets_in_flight: usize,
    next_generation: u64,
    applied_generation: u64,
    fence: bool,
}

impl Lifecycle {
    pub fn new(fence: bool) -> Self {
        Self {
            phase: Phase::Uninitialized,
            session_key: None,
            state: AppState::default(),
            loaded: false,
            load_pending: false,
            actions_in_flight: 0,
            resets_in_flight: 0,
            next_generation: 1,
            applied_generation: 0,
            fence,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    pub fn actions_in_flight(&self) -> usize {
        self.actions_in_flight
    }

    /// 응답을 기다리는 요청이 하나라도 있는지
    pub fn is_busy(&self) -> bool {
        self.load_pending || self.actions_in_flight > 0 || self.resets_in_flight > 0
    }

    /// Uninitialized → Identified. 이미 식별된 경우 기존 키를 유지합니다.
    pub fn identify(&mut self, session_key: String) -> bool {
        if self.session_key.is_some() {
            warn!("Session already identified; ignoring new key");
            return false;
        }
        self.session_key = Some(session_key);
        self.recompute_phase();
        true
    }

    pub fn begin_load(&mut self) -> Option<(Ticket, String)> {
        let session_key = self.session_key.clone()?;
        self.load_pending = true;
        Some((self.issue(RequestKind::Init), session_key))
    }

    /// 초기 로드는 실패해도 기본 상태가 오므로 항상 Loaded 로 넘어갑니다.
    pub fn finish_load(&mut self, ticket: Ticket, state: AppState) -> Settle {
        self.load_pending = false;
        self.loaded = true;
        let settle = self.apply(ticket, Some(state));
        self.recompute_phase();
        settle
    }

    /// 세션 키가 있어야만 전송 가능합니다.
    pub fn submit_action(&mut self) -> Option<(Ticket, String)> {
        let session_key = self.session_key.clone()?;
        self.actions_in_flight += 1;
        let ticket = self.issue(RequestKind::Action);
        self.recompute_phase();
        Some((ticket, session_key))
    }

    /// 성공/실패와 관계없이 대기 중인 액션은 비워집니다.
    pub fn finish_action(&mut self, ticket: Ticket, result: Option<AppState>) -> Settle {
        self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
        let settle = self.apply(ticket, result);
        self.recompute_phase();
        settle
    }

    pub fn begin_reset(&mut self) -> Option<(Ticket, String)> {
        let session_key = self.session_key.clone()?;
        self.resets_in_flight += 1;
        Some((self.issue(RequestKind::Reset), session_key))
    }

    pub fn finish_reset(&mut self, ticket: Ticket, result: Option<AppState>) -> Settle {
        self.resets_in_flight = self.resets_in_flight.saturating_sub(1);
        let settle = self.apply(ticket, result);
        self.recompute_phase();
        settle
    }

    /// 사용자 이름 변경 성공 시 현재 상태에도 반영
    pub fn set_username(&mut self, username: &str) {
        self.state.username = Some(username.to_string());
    }

    fn issue(&mut self, kind: RequestKind) -> Ticket {
        let generation = self.next_generation;
        self.next_generation += 1;
        Ticket { generation, kind }
    }

    fn apply(&mut self, ticket: Ticket, result: Option<AppState>) -> Settle {
        let Some(state) = result else {
            return Settle::Failed;
        };

        if self.fence && ticket.generation <= self.applied_generation {
            debug!(
                "Discarding stale {:?} response (generation {} <= {})",
                ticket.kind, ticket.generation, self.applied_generation
            );
            return Settle::Stale;
        }

        self.state = state;
        self.loaded = true;
        self.applied_generation = self.applied_generation.max(ticket.generation);
        Settle::Applied
    }

    fn recompute_phase(&mut self) {
        self.phase = if self.session_key.is_none() {
            Phase::Uninitialized
        } else if self.actions_in_flight > 0 {
            Phase::ActionPending
        } else if self.loaded {
            Phase::Loaded
        } else {
            Phase::Identified
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameMode {
    ReadOnly,
    Editing { draft: String },
}

/// 사용자 이름 편집기: focus → 편집, blur → 제출 후 읽기 전용
#[derive(Debug, Clone)]
pub struct UsernameEditor {
    mode: UsernameMode,
    committed: String,
    submitting: usize,
}

impl UsernameEditor {
    pub fn new(committed: impl Into<String>) -> Self {
        Self {
            mode: UsernameMode::ReadOnly,
            committed: committed.into(),
            submitting: 0,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, UsernameMode::Editing { .. })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting > 0
    }

    pub fn display(&self) -> &str {
        match &self.mode {
            UsernameMode::Editing { draft } => draft,
            UsernameMode::ReadOnly => &self.committed,
        }
    }

    pub fn focus(&mut self) {
        if !self.is_editing() {
            self.mode = UsernameMode::Editing {
                draft: self.committed.clone(),
            };
        }
    }

    pub fn input(&mut self, text: impl Into<String>) -> bool {
        match &mut self.mode {
            UsernameMode::Editing { draft } => {
                *draft = text.into();
                true
            }
            UsernameMode::ReadOnly => false,
        }
    }

    /// 편집 중이었다면 읽기 전용으로 돌아가며 제출할 값을 돌려줍니다.
    pub fn blur(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.mode, UsernameMode::ReadOnly) {
            UsernameMode::Editing { draft } => {
                self.submitting += 1;
                Some(draft)
            }
            UsernameMode::ReadOnly => None,
        }
    }

    pub fn finish_submit(&mut self, username: &str, ok: bool) {
        self.submitting = self.submitting.saturating_sub(1);
        if ok {
            self.committed = username.to_string();
        }
    }

    /// 서버 상태가 바뀌면 확정된 이름을 맞춥니다. 편집 중인 초안은 건드리지 않습니다.
    pub fn sync(&mut self, username: &str) {
        self.committed = username.to_string();
    }
}

/// 리셋 버튼의 고정 길이 시각 효과
#[derive(Debug, Clone)]
pub struct Pulse {
    duration: Duration,
    active: bool,
    token: u64,
}

impl Pulse {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active: false,
            token: 0,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 다시 시작하면 이전 타이머의 clear 는 무시됩니다.
    pub fn start(&mut self) -> u64 {
        self.token += 1;
        self.active = true;
        self.token
    }

    pub fn clear(&mut self, token: u64) -> bool {
        if token != self.token || !self.active {
            return false;
        }
        self.active = false;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
