//! 백엔드 HTTP 호출과 세션 관리.
//!
//! 네 개의 엔드포인트(`/init`, `/action`, `/username`, `/reset`)는 모두 JSON POST 입니다.
//! 실패는 전부 여기서 로그로 남기고 `None` / `false` / 기본 상태로 수렴시킵니다.
//! 재시도는 하지 않습니다.

use async_trait::async_trait;
use lst_env::ApiSettings;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::{ClientError, ClientResult};
use crate::models::{Action, ActionRequest, AppState, SessionRequest, UsernameRequest};
use crate::session::SharedIdentity;

pub const INIT_ENDPOINT: &str = "/init";
pub const ACTION_ENDPOINT: &str = "/action";
pub const USERNAME_ENDPOINT: &str = "/username";
pub const RESET_ENDPOINT: &str = "/reset";

/// 컨트롤러가 의존하는 백엔드 경계. 모든 메서드는 실패를 삼킵니다.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_initial_state(&self, session_key: &str) -> AppState;

    async fn send_action(&self, action: &Action, session_key: &str) -> Option<AppState>;

    async fn send_username(&self, username: &str, session_key: &str) -> bool;

    async fn send_reset(&self, session_key: &str) -> Option<AppState>;
}

/// 액션 무결성 토큰: sha256(compact_json(action) ++ session_key) 의 소문자 hex
pub fn hash_action(action: &Action, session_key: &str) -> ClientResult<String> {
    let action_str = serde_json::to_string(action)?;

    let mut hasher = Sha256::new();
    hasher.update(action_str.as_bytes());
    hasher.update(session_key.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    identity: SharedIdentity,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, identity: SharedIdentity) -> ClientResult<Self> {
        let base_url = Url::parse(&settings.base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            identity,
        })
    }

    /// base_url 의 경로 뒤에 엔드포인트를 이어 붙입니다.
    /// (`http://host/api` + `/init` → `http://host/api/init`)
    pub fn endpoint_url(&self, endpoint: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint);
        debug!("POST {}", url);

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response)
    }

    async fn post_for_state<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.post_json(endpoint, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn try_fetch_initial_state(&self, session_key: &str) -> ClientResult<AppState> {
        self.post_for_state(INIT_ENDPOINT, &SessionRequest { session_key })
            .await
    }

    async fn try_send_action(&self, action: &Action, session_key: &str) -> ClientResult<AppState> {
        let action_key = hash_action(action, session_key)?;
        let payload = ActionRequest {
            last_action: action,
            session_key,
            action_key,
        };
        self.post_for_state(ACTION_ENDPOINT, &payload).await
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_initial_state(&self, session_key: &str) -> AppState {
        match self.try_fetch_initial_state(session_key).await {
            Ok(mut state) => {
                // 서버가 이름을 주면 쿠키에 저장, 아니면 쿠키 값으로 채움
                match state.username.as_deref() {
                    Some(name) if !name.is_empty() => {
                        self.identity.get_or_set_username(Some(name));
                    }
                    _ => {
                        let cached = self.identity.get_or_set_username(None);
                        if !cached.is_empty() {
                            state.username = Some(cached);
                        }
                    }
                }
                info!(
                    "Initial state loaded: {} opponent / {} player cards",
                    state.opponent.len(),
                    state.player.len()
                );
                state
            }
            Err(e) => {
                error!("Error initializing state from server: {}", e);
                AppState::fallback(&self.identity.get_or_set_username(None))
            }
        }
    }

    async fn send_action(&self, action: &Action, session_key: &str) -> Option<AppState> {
        match self.try_send_action(action, session_key).await {
            Ok(state) => Some(state),
            Err(e) => {
                error!("Error sending action to server: {}", e);
                None
            }
        }
    }

    async fn send_username(&self, username: &str, session_key: &str) -> bool {
        let payload = UsernameRequest {
            username,
            session_key,
        };
        match self.post_json(USERNAME_ENDPOINT, &payload).await {
            Ok(_) => {
                self.identity.get_or_set_username(Some(username));
                true
            }
            Err(e) => {
                error!("Error sending username to server: {}", e);
                false
            }
        }
    }

    async fn send_reset(&self, session_key: &str) -> Option<AppState> {
        match self
            .post_for_state(RESET_ENDPOINT, &SessionRequest { session_key })
            .await
        {
            Ok(state) => Some(state),
            Err(e) => {
                error!("Error sending reset request to server: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, CardWithPosition};
    use crate::session::{IdentityStore, MemoryStore};

    fn sample_action() -> Action {
        Action {
            from: CardWithPosition::new(
                Card {
                    id: "CS2_231".to_string(),
                    attack: 1,
                    health: 1,
                },
                2,
            ),
            to: CardWithPosition::new(
                Card {
                    id: "EX1_116".to_string(),
                    attack: 6,
                    health: 2,
                },
                0,
            ),
        }
    }

    #[test]
    fn test_hash_action_is_deterministic() {
        let action = sample_action();
        let a = hash_action(&action, "key").unwrap();
        let b = hash_action(&action, "key").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_action_covers_both_inputs() {
        let action = sample_action();
        let base = hash_action(&action, "key").unwrap();

        assert_ne!(base, hash_action(&action, "other-key").unwrap());

        let mut changed = action.clone();
        changed.from.position = 3;
        assert_ne!(base, hash_action(&changed, "key").unwrap());
    }

    #[test]
    fn test_hash_action_matches_manual_digest() {
        let action = sample_action();
        let expected_input = format!(
            "{}{}",
            r#"{"from":{"id":"CS2_231","attack":1,"health":1,"position":2},"to":{"id":"EX1_116","attack":6,"health":2,"position":0}}"#,
            "abc"
        );
        let expected = hex::encode(Sha256::digest(expected_input.as_bytes()));
        assert_eq!(hash_action(&action, "abc").unwrap(), expected);
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let identity = IdentityStore::shared(MemoryStore::new(), crate::session::DEFAULT_MAX_AGE);
        let settings = ApiSettings {
            base_url: "http://example.com/LST-Front/".to_string(),
            request_timeout_ms: None,
        };
        let client = ApiClient::new(&settings, identity.clone()).unwrap();
        assert_eq!(
            client.endpoint_url(INIT_ENDPOINT).as_str(),
            "http://example.com/LST-Front/init"
        );

        let settings = ApiSettings {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: Some(100),
        };
        let client = ApiClient::new(&settings, identity).unwrap();
        assert_eq!(
            client.endpoint_url(RESET_ENDPOINT).as_str(),
            "http://127.0.0.1:8000/reset"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let identity = IdentityStore::shared(MemoryStore::new(), crate::session::DEFAULT_MAX_AGE);
        let settings = ApiSettings {
            base_url: "not a url".to_string(),
            request_timeout_ms: None,
        };
        assert!(matches!(
            ApiClient::new(&settings, identity),
            Err(ClientError::Url(_))
        ));
    }
}
