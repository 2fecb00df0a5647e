use std::path::PathBuf;

use lst_env::AssetSettings;
use rand::Rng;

use crate::models::AppState;

/// 배경 이미지 풀 두 개 (field, board). 파일명은 번호입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCatalog {
    pub directory: PathBuf,
    pub field_count: u32,
    pub board_count: u32,
}

impl AssetCatalog {
    pub fn from_settings(settings: &AssetSettings) -> Self {
        Self {
            directory: PathBuf::from(&settings.directory),
            field_count: settings.field_count,
            board_count: settings.board_count,
        }
    }

    pub fn field_path(&self, id: u32) -> PathBuf {
        self.directory.join("field").join(format!("{}.png", id))
    }

    pub fn board_path(&self, id: u32) -> PathBuf {
        self.directory.join("board").join(format!("{}.png", id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub field_id: u32,
    pub board_id: u32,
    pub field: PathBuf,
    pub board: PathBuf,
}

impl Backdrop {
    /// 서버가 준 인덱스가 풀 안에 있으면 그대로, 아니면 무작위로 고릅니다.
    pub fn select<R: Rng>(state: &AppState, catalog: &AssetCatalog, rng: &mut R) -> Self {
        let field_id = pick(state.field_id, catalog.field_count, rng);
        let board_id = pick(state.board_id, catalog.board_count, rng);
        Self {
            field_id,
            board_id,
            field: catalog.field_path(field_id),
            board: catalog.board_path(board_id),
        }
    }
}

fn pick<R: Rng>(requested: u32, pool_size: u32, rng: &mut R) -> u32 {
    if requested < pool_size || pool_size == 0 {
        requested
    } else {
        rng.gen_range(0..pool_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> AssetCatalog {
        AssetCatalog {
            directory: PathBuf::from("assets"),
            field_count: 41,
            board_count: 51,
        }
    }

    #[test]
    fn test_server_index_is_used_when_in_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let backdrop = Backdrop::select(&AppState::default(), &catalog(), &mut rng);
        assert_eq!(backdrop.field_id, 38);
        assert_eq!(backdrop.board_id, 34);
        assert_eq!(backdrop.field, PathBuf::from("assets/field/38.png"));
        assert_eq!(backdrop.board, PathBuf::from("assets/board/34.png"));
    }

    #[test]
    fn test_out_of_range_index_is_replaced_randomly() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = AppState {
            field_id: 500,
            board_id: 51,
            ..AppState::default()
        };
        for _ in 0..32 {
            let backdrop = Backdrop::select(&state, &catalog(), &mut rng);
            assert!(backdrop.field_id < 41);
            assert!(backdrop.board_id < 51);
        }
    }
}
