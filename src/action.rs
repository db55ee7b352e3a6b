use crate::board::{Board, MoveError};
use crate::card::Card;

use std::fmt;
use std::str::FromStr;

/// One move of the game, with its short replay code:
///
/// | move                                | code        |
/// |-------------------------------------|-------------|
/// | `DealWaste`                         | `t`         |
/// | `PileToFoundation(n)`               | `f<n>`      |
/// | `WasteToFoundation`                 | `d`         |
/// | `WasteToPile(n)`                    | `w<n>`      |
/// | `PileToPile { to, from }`           | `p<to>,<from>` |
/// | `PartialPileToPile { to, from, split }` | `u<to>,<from>,<split>` |
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    DealWaste,
    PileToFoundation(usize),
    WasteToFoundation,
    WasteToPile(usize),
    PileToPile { to: usize, from: usize },
    PartialPileToPile { to: usize, from: usize, split: usize },
}

impl Move {
    pub fn is_deal(&self) -> bool {
        matches!(self, Move::DealWaste)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::DealWaste => write!(f, "t"),
            Move::PileToFoundation(pile) => write!(f, "f{pile}"),
            Move::WasteToFoundation => write!(f, "d"),
            Move::WasteToPile(pile) => write!(f, "w{pile}"),
            Move::PileToPile { to, from } => write!(f, "p{to},{from}"),
            Move::PartialPileToPile { to, from, split } => write!(f, "u{to},{from},{split}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid move code `{code}`")]
pub struct ParseMoveError {
    pub code: String,
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoveError {
            code: s.to_string(),
        };
        let numbers = |rest: &str, count: usize| -> Result<Vec<usize>, ParseMoveError> {
            let values = rest
                .split(',')
                .map(|v| v.trim().parse::<usize>().map_err(|_| err()))
                .collect::<Result<Vec<_>, _>>()?;
            if values.len() != count {
                return Err(err());
            }
            Ok(values)
        };

        let s = s.trim();
        let mut chars = s.chars();
        let kind = chars.next().ok_or_else(err)?;
        let rest = chars.as_str();
        let mv = match kind {
            't' if rest.is_empty() => Move::DealWaste,
            'd' if rest.is_empty() => Move::WasteToFoundation,
            'f' => Move::PileToFoundation(numbers(rest, 1)?[0]),
            'w' => Move::WasteToPile(numbers(rest, 1)?[0]),
            'p' => {
                let v = numbers(rest, 2)?;
                Move::PileToPile { to: v[0], from: v[1] }
            }
            'u' => {
                let v = numbers(rest, 3)?;
                Move::PartialPileToPile {
                    to: v[0],
                    from: v[1],
                    split: v[2],
                }
            }
            _ => return Err(err()),
        };
        Ok(mv)
    }
}

/// Joins move codes the way a finished run is reported: `t; f0; p3,1`.
pub fn format_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(Move::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parses move codes separated by `;` and/or whitespace.
pub fn parse_moves(s: &str) -> Result<Vec<Move>, ParseMoveError> {
    s.split(|c: char| c == ';' || c.is_whitespace())
        .filter(|code| !code.is_empty())
        .map(str::parse)
        .collect()
}

/// Applies `mv` through the matching board operation. The result is the
/// progress flag of `tune_card` for deals and `true` otherwise.
pub fn apply_move(board: &mut Board, mv: &Move) -> Result<bool, MoveError> {
    match *mv {
        Move::DealWaste => return Ok(board.tune_card()),
        Move::PileToFoundation(pile) => board.pile_to_foundation(pile)?,
        Move::WasteToFoundation => board.waste_to_foundation()?,
        Move::WasteToPile(pile) => board.waste_to_pile(pile)?,
        Move::PileToPile { to, from } => board.pile_to_pile(to, from)?,
        Move::PartialPileToPile { to, from, split } => {
            board.partial_pile_to_pile(to, from, split)?
        }
    }
    Ok(true)
}

/// Human readable form of `mv` as it would be played on `board`.
pub fn describe_move(board: &Board, mv: &Move) -> String {
    let format_card =
        |card: Option<Card>| -> String { card.map(|c| c.pretty_print()).unwrap_or_default() };
    let pile_top = |pile: usize| format_card(board.tableaus().get(pile).and_then(|t| t.top()));
    let foundation_top = |card: Option<Card>| {
        format_card(card.and_then(|c| board.foundation(c.suit())))
    };

    match *mv {
        Move::DealWaste => match board.stock().last() {
            Some(card) => format!("Draw {card}"),
            None => "Recycle waste".to_string(),
        },
        Move::PileToFoundation(pile) => {
            let card = board.tableaus().get(pile).and_then(|t| t.top());
            format!(
                "(Pile{pile}) {} -> (Foundation) {}",
                format_card(card),
                foundation_top(card)
            )
        }
        Move::WasteToFoundation => {
            let card = board.waste().last().copied();
            format!(
                "(Waste) {} -> (Foundation) {}",
                format_card(card),
                foundation_top(card)
            )
        }
        Move::WasteToPile(pile) => {
            let card = board.waste().last().copied();
            format!("(Waste) {} -> (Pile{pile}) {}", format_card(card), pile_top(pile))
        }
        Move::PileToPile { to, from } => {
            let run = board
                .tableaus()
                .get(from)
                .map(|t| t.revealed().iter().map(Card::pretty_print).collect::<String>())
                .unwrap_or_default();
            format!("(Pile{from}) {run} -> (Pile{to}) {}", pile_top(to))
        }
        Move::PartialPileToPile { to, from, split } => {
            let run = board
                .tableaus()
                .get(from)
                .map(|t| {
                    t.revealed()
                        .iter()
                        .skip(split)
                        .map(Card::pretty_print)
                        .collect::<String>()
                })
                .unwrap_or_default();
            format!("(Pile{from}) {run} -> (Pile{to}) {}", pile_top(to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_with_rest_in_stock;

    #[test]
    fn test_move_codes() {
        let moves = [
            Move::DealWaste,
            Move::PileToFoundation(3),
            Move::WasteToFoundation,
            Move::WasteToPile(6),
            Move::PileToPile { to: 2, from: 5 },
            Move::PartialPileToPile {
                to: 0,
                from: 4,
                split: 2,
            },
        ];
        let text = format_moves(&moves);
        assert_eq!(text, "t; f3; d; w6; p2,5; u0,4,2");
        assert_eq!(parse_moves(&text).unwrap(), moves);
        assert_eq!(parse_moves("t t\nf1").unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_move_codes() {
        for code in ["", "x", "f", "fa", "p1", "p1,2,3", "u1,2", "t1", "d0", "w-1"] {
            assert!(code.parse::<Move>().is_err(), "{code} should not parse");
        }
        let err = parse_moves("t; q9").unwrap_err();
        assert_eq!(err.code, "q9");
    }

    #[test]
    fn test_apply_move() {
        let mut board = board_with_rest_in_stock("Tableau1: |A♣\nTableau2: |K♦");
        assert!(apply_move(&mut board, &Move::PileToFoundation(0)).unwrap());
        assert!(apply_move(&mut board, &Move::PileToFoundation(1)).is_err());
        assert!(apply_move(&mut board, &Move::DealWaste).unwrap());
        assert_eq!(board.moves(), &[Move::PileToFoundation(0), Move::DealWaste]);
    }

    #[test]
    fn test_describe_move() {
        let board = board_with_rest_in_stock("Waste: 8♥\nTableau1: |9♠\nTableau2: |A♣");
        assert_eq!(
            describe_move(&board, &Move::WasteToPile(0)),
            "(Waste) 8♥ -> (Pile0) 9♠"
        );
        assert_eq!(
            describe_move(&board, &Move::PileToFoundation(1)),
            "(Pile1) A♣ -> (Foundation) "
        );
    }
}
