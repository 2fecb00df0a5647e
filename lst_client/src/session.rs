use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::StoreError;

pub const SESSION_COOKIE: &str = "lst_session";
pub const USERNAME_COOKIE: &str = "lst_username";
pub const COOKIE_PATH: &str = "/";
/// 약 1년
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(31_536_000);

/// 이름 붙은 문자열을 읽고 쓰는 영속화 경계.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        (**self).set(name, value, max_age)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        (**self).set(name, value, max_age)
    }
}

/// 컨트롤러와 API 클라이언트가 함께 쓰는 신원 저장소
pub type SharedIdentity = Arc<IdentityStore<Box<dyn KeyValueStore>>>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CookieEntry {
    pub value: String,
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl CookieEntry {
    fn new(value: &str, max_age: Duration) -> Self {
        // max-age 가 chrono 범위를 넘으면 사실상 만료 없음으로 취급
        let expires_at = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_add_signed(age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value: value.to_string(),
            path: COOKIE_PATH.to_string(),
            expires_at,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// 프로세스 메모리에만 존재하는 저장소 (테스트, 일회성 실행)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CookieEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(name)
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        self.entries
            .lock()
            .insert(name.to_string(), CookieEntry::new(value, max_age));
        Ok(())
    }
}

/// 디스크의 JSON 파일을 브라우저 쿠키처럼 사용하는 저장소.
/// 쓰기마다 파일 전체를 다시 씁니다.
#[derive(Debug)]
pub struct CookieJar {
    path: PathBuf,
    entries: Mutex<HashMap<String, CookieEntry>>,
}

impl CookieJar {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                // 깨진 쿠키는 브라우저처럼 무시하고 빈 상태로 시작
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("Ignoring malformed cookie jar {:?}: {}", path, e);
                    HashMap::new()
                })
            }
        } else {
            HashMap::new()
        };

        debug!("Cookie jar opened at {:?} ({} entries)", path, entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, CookieEntry>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(name)
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(name.to_string(), CookieEntry::new(value, max_age));
        self.flush(&entries)
    }
}

impl IdentityStore<Box<dyn KeyValueStore>> {
    pub fn shared(store: impl KeyValueStore + 'static, max_age: Duration) -> SharedIdentity {
        Arc::new(Self::with_max_age(Box::new(store), max_age))
    }
}

/// 16 바이트 난수를 hex 로 인코딩한 세션 키 (32 글자)
pub fn generate_session_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 세션 키와 사용자 이름, 두 개의 토큰을 관리합니다.
/// 저장 실패는 로그만 남기고 값은 그대로 돌려줍니다.
pub struct IdentityStore<S: KeyValueStore> {
    store: S,
    max_age: Duration,
}

impl<S: KeyValueStore> IdentityStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_max_age(store, DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(store: S, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_or_set_session_key(&self) -> String {
        if let Some(existing) = self.store.get(SESSION_COOKIE) {
            return existing;
        }

        let session_key = generate_session_key();
        if let Err(e) = self.store.set(SESSION_COOKIE, &session_key, self.max_age) {
            warn!("Failed to persist session key: {}", e);
        }
        info!("New session key issued");
        session_key
    }

    pub fn get_or_set_username(&self, new_username: Option<&str>) -> String {
        match new_username {
            Some(username) => {
                if let Err(e) = self.store.set(USERNAME_COOKIE, username, self.max_age) {
                    warn!("Failed to persist username: {}", e);
                }
                username.to_string()
            }
            None => self.store.get(USERNAME_COOKIE).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_is_created_once() {
        let identity = IdentityStore::new(MemoryStore::new());
        assert!(identity.store().get(SESSION_COOKIE).is_none());

        let first = identity.get_or_set_session_key();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(identity.store().get(SESSION_COOKIE), Some(first.clone()));

        for _ in 0..3 {
            assert_eq!(identity.get_or_set_session_key(), first);
        }
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_session_key(), generate_session_key());
    }

    #[test]
    fn test_username_roundtrip() {
        let identity = IdentityStore::new(MemoryStore::new());
        assert_eq!(identity.get_or_set_username(None), "");
        assert_eq!(identity.get_or_set_username(Some("thrall")), "thrall");
        assert_eq!(identity.get_or_set_username(None), "thrall");
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(SESSION_COOKIE, "stale", Duration::ZERO).unwrap();
        assert_eq!(store.get(SESSION_COOKIE), None);

        let identity = IdentityStore::new(store);
        let key = identity.get_or_set_session_key();
        assert_ne!(key, "stale");
    }

    #[test]
    fn test_huge_max_age_does_not_overflow() {
        let entry = CookieEntry::new("v", Duration::from_secs(u64::MAX));
        assert!(entry.is_live(Utc::now()));
        assert_eq!(entry.path, "/");
    }

    #[test]
    fn test_cookie_jar_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");

        let key = {
            let identity = IdentityStore::new(CookieJar::open(&path).unwrap());
            identity.get_or_set_username(Some("rexxar"));
            identity.get_or_set_session_key()
        };

        let identity = IdentityStore::new(CookieJar::open(&path).unwrap());
        assert_eq!(identity.get_or_set_session_key(), key);
        assert_eq!(identity.get_or_set_username(None), "rexxar");
    }

    #[test]
    fn test_cookie_jar_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "not json").unwrap();

        let identity = IdentityStore::new(CookieJar::open(&path).unwrap());
        assert_eq!(identity.get_or_set_username(None), "");
        let key = identity.get_or_set_session_key();
        assert_eq!(key.len(), 32);

        // 새로 쓴 내용으로 파일이 복구됨
        let reopened = IdentityStore::new(CookieJar::open(&path).unwrap());
        assert_eq!(reopened.get_or_set_session_key(), key);
    }
}
