use actix::Recipient;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::controller::message::ActionDropped;
use crate::models::{Action, CardWithPosition};
use crate::view::card::{DragSource, DropTarget};

/// 드롭으로 만들어진 Action 을 소유자(컨트롤러)에게 내보내는 곳
pub trait DropSink {
    fn emit(&self, action: Action);
}

impl DropSink for Recipient<ActionDropped> {
    fn emit(&self, action: Action) {
        self.do_send(ActionDropped(action));
    }
}

impl DropSink for UnboundedSender<Action> {
    fn emit(&self, action: Action) {
        if self.send(action).is_err() {
            warn!("Drop sink closed; action discarded");
        }
    }
}

/// 카드가 자신의 클래스를 계산할 때 보는 드래그 상태의 읽기 전용 뷰
#[derive(Debug, Clone, Copy, Default)]
pub struct DragMonitor<'a> {
    dragging: Option<&'a CardWithPosition>,
    hovered: Option<usize>,
}

impl<'a> DragMonitor<'a> {
    pub fn new(dragging: Option<&'a CardWithPosition>, hovered: Option<usize>) -> Self {
        Self { dragging, hovered }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<&'a CardWithPosition> {
        self.dragging
    }

    /// 현재 올라가 있는 상대 카드의 위치
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_active(&self) -> bool {
        self.dragging.is_some()
    }
}

/// 보드를 감싸는 드래그 앤 드롭 컨텍스트.
/// begin_drag → hover → drop 한 번이 하나의 제스처이며, 제스처당 최대 한 번 emit 합니다.
pub struct DragContext<S: DropSink> {
    sink: S,
    dragging: Option<CardWithPosition>,
    hovered: Option<DropTarget>,
}

impl<S: DropSink> DragContext<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            dragging: None,
            hovered: None,
        }
    }

    pub fn monitor(&self) -> DragMonitor<'_> {
        DragMonitor::new(
            self.dragging.as_ref(),
            self.hovered.as_ref().map(|target| target.card().position),
        )
    }

    pub fn is_active(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn begin_drag(&mut self, source: &DragSource) {
        debug!("Drag started from player slot {}", source.card().position);
        self.dragging = Some(source.item());
        self.hovered = None;
    }

    /// 드래그 중이고 대상이 받아줄 때만 hover 상태가 됩니다.
    pub fn hover(&mut self, target: &DropTarget) -> bool {
        match &self.dragging {
            Some(item) if target.accepts(item) => {
                self.hovered = Some(target.clone());
                true
            }
            _ => false,
        }
    }

    pub fn leave(&mut self) {
        self.hovered = None;
    }

    pub fn cancel(&mut self) {
        self.dragging = None;
        self.hovered = None;
    }

    pub fn drop(&mut self) -> Option<Action> {
        let item = self.dragging.take();
        let target = self.hovered.take();

        let (item, target) = match (item, target) {
            (Some(item), Some(target)) => (item, target),
            _ => {
                debug!("Drop ignored: no active drag over a target");
                return None;
            }
        };

        let action = target.drop(item);
        debug!(
            "Dropped player slot {} onto opponent slot {}",
            action.from.position, action.to.position
        );
        self.sink.emit(action.clone());
        Some(action)
    }
}
