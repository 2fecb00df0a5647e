use crate::dnd::DragMonitor;
use crate::models::{Action, Card, CardWithPosition};

pub const CARD_ART_BASE_URL: &str = "https://art.hearthstonejson.com/v1/render/latest/enUS/512x";

pub fn art_url(card_id: &str) -> String {
    format!("{}/{}.png", CARD_ART_BASE_URL, card_id)
}

/// 카드 한 장의 드래그 앤 드롭 역할.
/// 출발지(Source)이거나 대상(Target) 둘 중 하나이며 동시에 둘 다일 수 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub enum CardView {
    Source(DragSource),
    Target(DropTarget),
}

/// 플레이어 열의 카드. 드롭되기 전까지는 시각적 상태만 바뀝니다.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSource {
    card: CardWithPosition,
}

/// 상대 열의 카드. 출발지 카드를 받아 Action 을 만듭니다.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    card: CardWithPosition,
}

impl DragSource {
    pub fn new(card: Card, position: usize) -> Self {
        Self {
            card: CardWithPosition::new(card, position),
        }
    }

    pub fn card(&self) -> &CardWithPosition {
        &self.card
    }

    /// 드래그 중 들고 다니는 값 `{id, attack, health, position}`
    pub fn item(&self) -> CardWithPosition {
        self.card.clone()
    }

    pub fn is_dragging(&self, monitor: &DragMonitor<'_>) -> bool {
        monitor
            .dragging()
            .is_some_and(|item| item.position == self.card.position)
    }
}

impl DropTarget {
    pub fn new(card: Card, position: usize) -> Self {
        Self {
            card: CardWithPosition::new(card, position),
        }
    }

    pub fn card(&self) -> &CardWithPosition {
        &self.card
    }

    /// 출발지에서 온 아이템이면 무엇이든 받습니다. 규칙 검사는 백엔드 몫입니다.
    pub fn accepts(&self, _item: &CardWithPosition) -> bool {
        true
    }

    pub fn drop(&self, item: CardWithPosition) -> Action {
        Action {
            from: item,
            to: self.card.clone(),
        }
    }

    pub fn is_over(&self, monitor: &DragMonitor<'_>) -> bool {
        monitor.dragging().is_some_and(|item| self.accepts(item))
            && monitor.hovered() == Some(self.card.position)
    }

    pub fn can_drop(&self, monitor: &DragMonitor<'_>) -> bool {
        monitor.dragging().is_some_and(|item| self.accepts(item))
            && monitor.hovered() != Some(self.card.position)
    }
}

impl CardView {
    pub fn card(&self) -> &CardWithPosition {
        match self {
            CardView::Source(source) => source.card(),
            CardView::Target(target) => target.card(),
        }
    }

    pub fn position(&self) -> usize {
        self.card().position
    }

    pub fn art_url(&self) -> String {
        art_url(&self.card().card.id)
    }

    pub fn attack_label(&self) -> String {
        self.card().card.attack.to_string()
    }

    pub fn health_label(&self) -> String {
        self.card().card.health.to_string()
    }

    /// 프레임 이미지에 붙는 클래스 목록
    pub fn class_names(&self, monitor: &DragMonitor<'_>) -> String {
        let mut classes = vec!["frame"];
        match self {
            CardView::Source(source) => {
                if source.is_dragging(monitor) {
                    classes.push("dragging");
                }
                if !monitor.is_active() {
                    classes.push("draggable");
                }
            }
            CardView::Target(target) => {
                if target.is_over(monitor) {
                    classes.push("over");
                }
                if target.can_drop(monitor) {
                    classes.push("canDrop");
                }
            }
        }
        classes.join(" ")
    }

    /// 터미널용 한 칸 표현. 예: `2:CS2_231 1/1*`
    pub fn render_cell(&self, monitor: &DragMonitor<'_>) -> String {
        let card = self.card();
        let marker = match self {
            CardView::Source(source) if source.is_dragging(monitor) => "*",
            CardView::Target(target) if target.is_over(monitor) => "!",
            CardView::Target(target) if target.can_drop(monitor) => "?",
            _ => "",
        };
        format!(
            "{}:{} {}/{}{}",
            card.position, card.card.id, card.card.attack, card.card.health, marker
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str) -> Card {
        Card {
            id: id.to_string(),
            attack: 2,
            health: 3,
        }
    }

    #[test]
    fn test_art_url() {
        let view = CardView::Target(DropTarget::new(card("EX1_116"), 0));
        assert_eq!(
            view.art_url(),
            "https://art.hearthstonejson.com/v1/render/latest/enUS/512x/EX1_116.png"
        );
        assert_eq!(view.attack_label(), "2");
        assert_eq!(view.health_label(), "3");
    }

    #[test]
    fn test_idle_classes() {
        let monitor = DragMonitor::idle();
        let source = CardView::Source(DragSource::new(card("A"), 0));
        let target = CardView::Target(DropTarget::new(card("B"), 0));

        assert_eq!(source.class_names(&monitor), "frame draggable");
        assert_eq!(target.class_names(&monitor), "frame");
    }

    #[test]
    fn test_active_drag_classes() {
        let dragged = DragSource::new(card("A"), 1);
        let item = dragged.item();
        let monitor = DragMonitor::new(Some(&item), Some(0));

        let source = CardView::Source(dragged.clone());
        let other_source = CardView::Source(DragSource::new(card("C"), 0));
        let hovered = CardView::Target(DropTarget::new(card("B"), 0));
        let waiting = CardView::Target(DropTarget::new(card("D"), 1));

        assert_eq!(source.class_names(&monitor), "frame dragging");
        assert_eq!(other_source.class_names(&monitor), "frame");
        assert_eq!(hovered.class_names(&monitor), "frame over");
        assert_eq!(waiting.class_names(&monitor), "frame canDrop");
    }

    #[test]
    fn test_drop_builds_action_from_item_to_target() {
        let source = DragSource::new(card("A"), 2);
        let target = DropTarget::new(card("B"), 0);
        let action = target.drop(source.item());

        assert_eq!(action.from.position, 2);
        assert_eq!(action.from.card.id, "A");
        assert_eq!(action.to.position, 0);
        assert_eq!(action.to.card.id, "B");
    }
}
