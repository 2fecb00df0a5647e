use crate::dnd::DragMonitor;
use crate::models::AppState;
use crate::view::card::{CardView, DragSource, DropTarget};

/// 두 열의 배치만 담당합니다. 자체 상태는 없습니다.
/// 상대 열은 드롭 대상, 플레이어 열은 드래그 출발지입니다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardView {
    opponent: Vec<CardView>,
    player: Vec<CardView>,
}

impl BoardView {
    pub fn layout(state: &AppState) -> Self {
        let opponent = state
            .opponent
            .iter()
            .enumerate()
            .map(|(i, card)| CardView::Target(DropTarget::new(card.clone(), i)))
            .collect();
        let player = state
            .player
            .iter()
            .enumerate()
            .map(|(i, card)| CardView::Source(DragSource::new(card.clone(), i)))
            .collect();

        Self { opponent, player }
    }

    pub fn opponent(&self) -> &[CardView] {
        &self.opponent
    }

    pub fn player(&self) -> &[CardView] {
        &self.player
    }

    pub fn source(&self, position: usize) -> Option<&DragSource> {
        match self.player.get(position)? {
            CardView::Source(source) => Some(source),
            CardView::Target(_) => None,
        }
    }

    pub fn target(&self, position: usize) -> Option<&DropTarget> {
        match self.opponent.get(position)? {
            CardView::Target(target) => Some(target),
            CardView::Source(_) => None,
        }
    }

    pub fn render(&self, monitor: &DragMonitor<'_>) -> String {
        format!(
            "opponent | {}\nplayer   | {}",
            render_row(&self.opponent, monitor),
            render_row(&self.player, monitor)
        )
    }
}

fn render_row(row: &[CardView], monitor: &DragMonitor<'_>) -> String {
    if row.is_empty() {
        return "(empty)".to_string();
    }
    row.iter()
        .map(|view| view.render_cell(monitor))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Card;

    fn card(id: &str, attack: i32, health: i32) -> Card {
        Card {
            id: id.to_string(),
            attack,
            health,
        }
    }

    fn state() -> AppState {
        AppState {
            opponent: vec![card("EX1_116", 6, 2), card("CS2_182", 4, 5)],
            player: vec![
                card("CS2_231", 1, 1),
                card("CS2_120", 2, 3),
                card("CS2_172", 3, 2),
            ],
            ..AppState::default()
        }
    }

    #[test]
    fn test_layout_assigns_roles_by_row() {
        let board = BoardView::layout(&state());

        assert!(board
            .opponent()
            .iter()
            .all(|view| matches!(view, CardView::Target(_))));
        assert!(board
            .player()
            .iter()
            .all(|view| matches!(view, CardView::Source(_))));

        let positions: Vec<usize> = board.player().iter().map(CardView::position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_lookup_by_position() {
        let board = BoardView::layout(&state());
        assert_eq!(board.source(2).unwrap().card().card.id, "CS2_172");
        assert_eq!(board.target(1).unwrap().card().card.id, "CS2_182");
        assert!(board.source(3).is_none());
        assert!(board.target(2).is_none());
    }

    #[test]
    fn test_render_text_board() {
        let board = BoardView::layout(&state());
        let text = board.render(&DragMonitor::idle());
        assert_eq!(
            text,
            "opponent | 0:EX1_116 6/2  1:CS2_182 4/5\n\
             player   | 0:CS2_231 1/1  1:CS2_120 2/3  2:CS2_172 3/2"
        );

        let empty = BoardView::layout(&AppState::default());
        assert_eq!(
            empty.render(&DragMonitor::idle()),
            "opponent | (empty)\nplayer   | (empty)"
        );
    }
}
