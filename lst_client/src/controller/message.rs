use actix::Message;
use tokio::sync::watch;

use crate::controller::ViewSnapshot;
use crate::models::Action;

/// 드래그 컨텍스트 → 컨트롤러. 플레이어 카드가 상대 카드 위에 놓였음
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ActionDropped(pub Action);

#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct ResetRequested;

#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct UsernameFocused;

#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct UsernameInput(pub String);

#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct UsernameBlurred;

#[derive(Message, Debug)]
#[rtype(result = "ViewSnapshot")]
pub struct GetSnapshot;

/// 화면 갱신을 받을 watch 수신자를 요청
#[derive(Message, Debug)]
#[rtype(result = "watch::Receiver<ViewSnapshot>")]
pub struct Subscribe;
