//! The heuristic chain, in priority order. Each strategy reports whether it
//! changed the board.

use super::Robot;
use crate::action::Move;
use crate::board::{MoveError, TOTAL_TABLEAUS};
use crate::card::{Card, Suit};

use log::debug;
use smallvec::SmallVec;

type Candidates = SmallVec<[Move; 8]>;
type Strategy = fn(&mut Robot) -> Result<bool, MoveError>;

const STRATEGIES: [(&str, Strategy); 5] = [
    ("foundation", deal_piles),
    ("merge", merge_piles),
    ("uncover", uncover_piles),
    ("waste", deal_waste),
    ("draw", tune_card),
];

/// Runs the chain until a strategy makes progress.
pub(super) fn advance(robot: &mut Robot) -> Result<bool, MoveError> {
    for (name, strategy) in STRATEGIES {
        if strategy(robot)? {
            debug!("strategy {name} moved");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Sends the first tableau top that fits to its foundation. Never forks.
fn deal_piles(robot: &mut Robot) -> Result<bool, MoveError> {
    let board = &robot.board;
    let pile = (0..TOTAL_TABLEAUS).find(|&i| {
        board
            .tableau(i)
            .top()
            .is_some_and(|card| board.can_accept_on_foundation(card))
    });
    match pile {
        Some(pile) => {
            robot.board.pile_to_foundation(pile)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Whole-run merges between piles.
fn merge_piles(robot: &mut Robot) -> Result<bool, MoveError> {
    let board = &robot.board;
    let mut candidates = Candidates::new();
    for from in 0..TOTAL_TABLEAUS {
        let tableau = board.tableau(from);
        let Some(&bottom) = tableau.revealed().first() else {
            continue;
        };
        // A king already at the bottom of its pile gains nothing by moving.
        if bottom.is_king() && tableau.hidden().is_empty() {
            continue;
        }
        for to in 0..TOTAL_TABLEAUS {
            if from != to && board.can_accept_on_pile(bottom, to) {
                candidates.push(Move::PileToPile { to, from });
            }
        }
    }
    robot.commit_candidates(&candidates)
}

/// Moves the cards covering a card that a foundation needs next.
fn uncover_piles(robot: &mut Robot) -> Result<bool, MoveError> {
    let board = &robot.board;
    let mut candidates = Candidates::new();
    for suit in Suit::ALL {
        let needed = match board.foundation(suit) {
            None => Card::new(1, suit),
            Some(top) => match top.successor() {
                Some(card) => card,
                None => continue,
            },
        };
        let Some((from, idx)) = board.find_revealed(needed) else {
            continue;
        };
        let split = idx + 1;
        let Some(&above) = board.tableau(from).revealed().get(split) else {
            continue;
        };
        debug!("find uncoverable card {needed} in pile {from}");
        for to in 0..TOTAL_TABLEAUS {
            if from != to && board.can_accept_on_pile(above, to) {
                candidates.push(Move::PartialPileToPile { to, from, split });
            }
        }
    }
    robot.commit_candidates(&candidates)
}

fn deal_waste(robot: &mut Robot) -> Result<bool, MoveError> {
    let board = &robot.board;
    let Some(&card) = board.waste().last() else {
        return Ok(false);
    };
    if robot.config.waste_to_foundation && board.can_accept_on_foundation(card) {
        robot.board.waste_to_foundation()?;
        return Ok(true);
    }
    let candidates: Candidates = (0..TOTAL_TABLEAUS)
        .filter(|&pile| board.can_accept_on_pile(card, pile))
        .map(Move::WasteToPile)
        .collect();
    robot.commit_candidates(&candidates)
}

fn tune_card(robot: &mut Robot) -> Result<bool, MoveError> {
    Ok(robot.board.tune_card())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_with_rest_in_stock;

    fn card(s: &str) -> Card {
        Card::parse_many(s).unwrap()[0]
    }

    #[test]
    fn test_deal_piles_takes_lowest_pile() {
        let board = board_with_rest_in_stock("Tableau2: |A♥\nTableau4: |A♣");
        let mut robot = Robot::new(board);
        assert!(deal_piles(&mut robot).unwrap());
        assert_eq!(robot.board.moves(), &[Move::PileToFoundation(1)]);
        assert!(robot.step_backs.is_empty());
    }

    #[test]
    fn test_merge_skips_bare_king() {
        let board = board_with_rest_in_stock("Tableau1: |K♠Q♥\nTableau3: 2♣|K♦");
        let mut robot = Robot::new(board);
        // K♦ has a hidden card under it and may move to an empty pile.
        assert!(merge_piles(&mut robot).unwrap());
        assert_eq!(robot.board.moves(), &[Move::PileToPile { to: 1, from: 2 }]);
        // Piles 3..=6 are empty too.
        assert_eq!(robot.step_backs.len(), 4);
        assert!(robot.step_backs.iter().all(|b| b.tableau(0).len() == 2));
    }

    #[test]
    fn test_uncover_exposes_next_foundation_card() {
        let board = board_with_rest_in_stock(
            "Foundation1: 4♣\nTableau1: 3♦|6♥5♣4♥\nTableau2: |5♠",
        );
        let mut robot = Robot::new(board);
        assert!(!merge_piles(&mut robot).unwrap());
        assert!(uncover_piles(&mut robot).unwrap());
        assert_eq!(
            robot.board.moves(),
            &[Move::PartialPileToPile {
                to: 1,
                from: 0,
                split: 2
            }]
        );
        assert_eq!(robot.board.tableau(0).top(), Some(card("5♣")));
        assert!(deal_piles(&mut robot).unwrap());
    }

    #[test]
    fn test_uncover_ignores_needed_card_on_top() {
        let board = board_with_rest_in_stock("Tableau1: |2♠A♦\nTableau2: 3♣|Q♠\nTableau3: |8♣");
        let mut robot = Robot::new(board);
        assert!(!uncover_piles(&mut robot).unwrap());
        assert!(robot.board.moves().is_empty());
    }

    #[test]
    fn test_deal_waste_prefers_foundation() {
        let board = board_with_rest_in_stock("Waste: A♦\nTableau1: |2♠");
        let mut robot = Robot::new(board);
        assert!(deal_waste(&mut robot).unwrap());
        assert_eq!(robot.board.moves(), &[Move::WasteToFoundation]);

        let board = board_with_rest_in_stock("Waste: 7♦\nTableau1: |8♠\nTableau3: |8♣");
        let mut robot = Robot::new(board);
        assert!(deal_waste(&mut robot).unwrap());
        assert_eq!(robot.board.moves(), &[Move::WasteToPile(0)]);
        assert_eq!(robot.step_backs.len(), 1);
        assert_eq!(robot.step_backs[0].moves(), &[Move::WasteToPile(2)]);
    }

    #[test]
    fn test_deal_waste_without_target() {
        let board = board_with_rest_in_stock("Waste: 7♦\nTableau1: |8♥");
        let mut robot = Robot::new(board);
        assert!(!deal_waste(&mut robot).unwrap());
        assert!(robot.board.moves().is_empty());
    }
}
