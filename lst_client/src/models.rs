use serde::{Deserialize, Serialize};

pub const DEFAULT_FIELD_ID: u32 = 38;
pub const DEFAULT_BOARD_ID: u32 = 34;

/// 한 장의 카드 스냅샷. 다음 상태 수신 시 통째로 교체됩니다.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub attack: i32,
    pub health: i32,
}

/// 카드 + 소속 열(opponent / player) 안에서의 인덱스.
/// 와이어 형식은 평탄화된 `{id, attack, health, position}` 입니다.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardWithPosition {
    #[serde(flatten)]
    pub card: Card,
    pub position: usize,
}

impl CardWithPosition {
    pub fn new(card: Card, position: usize) -> Self {
        Self { card, position }
    }
}

/// 공격자 → 대상. 드롭 시점에 만들어지고 전송 후 버려집니다.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub from: CardWithPosition,
    pub to: CardWithPosition,
}

/// 백엔드가 돌려주는 전체 화면 상태. 병합하지 않고 항상 교체합니다.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub field_id: u32,
    pub board_id: u32,
    #[serde(default)]
    pub opponent: Vec<Card>,
    #[serde(default)]
    pub player: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            field_id: DEFAULT_FIELD_ID,
            board_id: DEFAULT_BOARD_ID,
            opponent: Vec::new(),
            player: Vec::new(),
            username: None,
        }
    }
}

impl AppState {
    /// 기본 상태에 쿠키에 남아 있던 사용자 이름을 얹습니다.
    pub fn fallback(cached_username: &str) -> Self {
        let mut state = Self::default();
        if !cached_username.is_empty() {
            state.username = Some(cached_username.to_string());
        }
        state
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

// --- 요청 바디 (백엔드 프로토콜과 1:1 매핑) ---

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest<'a> {
    pub session_key: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest<'a> {
    pub last_action: &'a Action,
    pub session_key: &'a str,
    pub action_key: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UsernameRequest<'a> {
    pub username: &'a str,
    pub session_key: &'a str,
}
