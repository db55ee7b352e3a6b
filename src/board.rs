use crate::action::Move;
use crate::card::{Card, MAX_CARD, MAX_RANK, MAX_SUIT, Suit};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub const TOTAL_FOUNDATIONS: usize = MAX_SUIT as usize;
pub const TOTAL_TABLEAUS: usize = 7;
pub const TALON_SIZE: usize = 24;
pub const FOUNDATION_SCORE: u32 = 10;
pub const REVEAL_SCORE: u32 = 5;
pub const WASTE_TO_PILE_SCORE: u32 = 5;
pub const RECYCLE_PENALTY: u32 = 100;

const TABLEAU_SIZE: usize = 19;
const DIGEST_PILE_END: u8 = 0xFF;
const DIGEST_HIDDEN_END: u8 = 0xFE;
const DIGEST_NO_CARD: u8 = 0xFD;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("illegal move `{mv}`: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },
}

fn illegal(mv: Move, reason: &'static str) -> MoveError {
    MoveError::IllegalMove { mv, reason }
}

/// Canonical, order-sensitive encoding of every pile on the board.
///
/// The encoding itself is the key: two boards share a digest only when every
/// pile holds the same cards in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The full state of one game: piles, score, step counter and the moves
/// applied since the deal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub(crate) stock: SmallVec<[Card; TALON_SIZE]>,
    pub(crate) waste: SmallVec<[Card; TALON_SIZE]>,
    /// Stock produced by the most recent recycle.
    pub(crate) last_recycle: SmallVec<[Card; TALON_SIZE]>,
    pub(crate) foundations: [Option<Card>; TOTAL_FOUNDATIONS],
    pub(crate) tableaus: [Tableau; TOTAL_TABLEAUS],
    pub(crate) score: u32,
    pub(crate) steps: u32,
    pub(crate) moves: Vec<Move>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_from_seed(seed: u64) -> Self {
        Self::deal(&mut StdRng::seed_from_u64(seed))
    }

    pub fn deal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Card::full_deck();
        deck.shuffle(rng);
        Self::from_deck(deck)
    }

    /// Deals `deck` with its last card on top of the stock. Pile `i` takes `i`
    /// hidden cards and one revealed card.
    pub fn from_deck(deck: [Card; MAX_CARD as usize]) -> Self {
        let mut board = Board::new();
        board.stock.extend_from_slice(&deck);
        for (i, tableau) in board.tableaus.iter_mut().enumerate() {
            let len = board.stock.len();
            tableau.cards.extend(board.stock.drain(len - (i + 1)..).rev());
            tableau.face_up_count = 1;
        }
        info!("initial deal");
        board
    }

    pub fn stock(&self) -> &[Card] {
        &self.stock
    }

    pub fn waste(&self) -> &[Card] {
        &self.waste
    }

    pub fn foundation(&self, suit: Suit) -> Option<Card> {
        self.foundations[suit.index()]
    }

    pub fn tableau(&self, idx: usize) -> &Tableau {
        &self.tableaus[idx]
    }

    pub fn tableaus(&self) -> &[Tableau; TOTAL_TABLEAUS] {
        &self.tableaus
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of cards on the foundations.
    pub fn foundation_count(&self) -> u8 {
        self.foundations
            .iter()
            .map(|card| card.map_or(0, |c| c.rank()))
            .sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.foundations
            .iter()
            .all(|card| card.is_some_and(|c| c.rank() == MAX_RANK))
    }

    pub fn can_accept_on_foundation(&self, card: Card) -> bool {
        match self.foundations[card.suit().index()] {
            None => card.rank() == 1,
            Some(top) => top.rank() + 1 == card.rank(),
        }
    }

    pub fn can_accept_on_pile(&self, card: Card, pile: usize) -> bool {
        let Some(tableau) = self.tableaus.get(pile) else {
            return false;
        };
        match tableau.top() {
            None => card.is_king(),
            Some(top) => top.is_red() != card.is_red() && top.rank() == card.rank() + 1,
        }
    }

    /// Location of `card` in the revealed tableau sections as
    /// `(pile, index into the revealed cards)`.
    pub fn find_revealed(&self, card: Card) -> Option<(usize, usize)> {
        self.tableaus.iter().enumerate().find_map(|(pile, tableau)| {
            tableau
                .revealed()
                .iter()
                .position(|&c| c == card)
                .map(|idx| (pile, idx))
        })
    }

    pub fn pile_to_foundation(&mut self, pile: usize) -> Result<(), MoveError> {
        let mv = Move::PileToFoundation(pile);
        let card = self
            .tableau_checked(mv, pile)?
            .top()
            .ok_or_else(|| illegal(mv, "pile is empty"))?;
        if !self.can_accept_on_foundation(card) {
            return Err(illegal(mv, "card does not fit its foundation"));
        }
        self.tableaus[pile].cards.pop();
        self.tableaus[pile].face_up_count -= 1;
        self.reveal(pile);
        self.foundations[card.suit().index()] = Some(card);
        self.score += FOUNDATION_SCORE;
        self.record(mv);
        debug!("{card} from pile {pile} to foundation");
        Ok(())
    }

    pub fn waste_to_foundation(&mut self) -> Result<(), MoveError> {
        let mv = Move::WasteToFoundation;
        let card = *self
            .waste
            .last()
            .ok_or_else(|| illegal(mv, "waste is empty"))?;
        if !self.can_accept_on_foundation(card) {
            return Err(illegal(mv, "card does not fit its foundation"));
        }
        self.waste.pop();
        self.foundations[card.suit().index()] = Some(card);
        self.score += FOUNDATION_SCORE;
        self.record(mv);
        debug!("{card} from waste to foundation");
        Ok(())
    }

    pub fn waste_to_pile(&mut self, pile: usize) -> Result<(), MoveError> {
        let mv = Move::WasteToPile(pile);
        self.tableau_checked(mv, pile)?;
        let card = *self
            .waste
            .last()
            .ok_or_else(|| illegal(mv, "waste is empty"))?;
        if !self.can_accept_on_pile(card, pile) {
            return Err(illegal(mv, "card does not fit the pile"));
        }
        self.waste.pop();
        self.tableaus[pile].push(card);
        self.score += WASTE_TO_PILE_SCORE;
        self.record(mv);
        debug!("{card} from waste to pile {pile}");
        Ok(())
    }

    /// Moves the whole revealed run of `from` onto `to`.
    pub fn pile_to_pile(&mut self, to: usize, from: usize) -> Result<(), MoveError> {
        let mv = Move::PileToPile { to, from };
        self.tableau_checked(mv, to)?;
        if to == from {
            return Err(illegal(mv, "source and target are the same pile"));
        }
        let bottom = *self
            .tableau_checked(mv, from)?
            .revealed()
            .first()
            .ok_or_else(|| illegal(mv, "pile is empty"))?;
        if !self.can_accept_on_pile(bottom, to) {
            return Err(illegal(mv, "run does not fit the target pile"));
        }
        let run = self.tableaus[from].split_off_revealed(0);
        self.tableaus[to].extend(&run);
        self.reveal(from);
        self.record(mv);
        debug!("pile {from} merge into pile {to}");
        Ok(())
    }

    /// Moves the revealed cards of `from` starting at revealed index `split`
    /// onto `to`. At least one revealed card must stay behind.
    pub fn partial_pile_to_pile(
        &mut self,
        to: usize,
        from: usize,
        split: usize,
    ) -> Result<(), MoveError> {
        let mv = Move::PartialPileToPile { to, from, split };
        self.tableau_checked(mv, to)?;
        if to == from {
            return Err(illegal(mv, "source and target are the same pile"));
        }
        let revealed = self.tableau_checked(mv, from)?.revealed();
        if split == 0 || split >= revealed.len() {
            return Err(illegal(mv, "split index outside the revealed run"));
        }
        if !self.can_accept_on_pile(revealed[split], to) {
            return Err(illegal(mv, "run does not fit the target pile"));
        }
        let run = self.tableaus[from].split_off_revealed(split);
        self.tableaus[to].extend(&run);
        self.record(mv);
        debug!(
            "partial {} from pile {from} to pile {to}",
            run.iter().map(Card::pretty_print).collect::<Vec<_>>().join(",")
        );
        Ok(())
    }

    /// Turns one stock card onto the waste, or recycles the waste into the
    /// stock once the stock runs out.
    ///
    /// Returns `false` when nothing can be drawn, or when a recycle yields the
    /// same stock as the previous recycle.
    pub fn tune_card(&mut self) -> bool {
        if let Some(card) = self.stock.pop() {
            self.waste.push(card);
            self.record(Move::DealWaste);
            debug!("tune card {card}");
            return true;
        }
        if self.waste.is_empty() {
            debug!("stock and waste are both empty");
            return false;
        }

        self.moves.push(Move::DealWaste);
        self.stock.extend(self.waste.drain(..).rev());
        self.score = self.score.saturating_sub(RECYCLE_PENALTY);
        info!("recycle waste");
        if self.stock == self.last_recycle {
            return false;
        }
        self.last_recycle.clone_from(&self.stock);
        self.steps += 1;
        true
    }

    pub fn digest(&self) -> Digest {
        let mut bytes = Vec::with_capacity(MAX_CARD as usize + 2 * TOTAL_TABLEAUS + 8);
        bytes.extend(self.stock.iter().map(Card::id));
        bytes.push(DIGEST_PILE_END);
        bytes.extend(self.waste.iter().map(Card::id));
        bytes.push(DIGEST_PILE_END);
        bytes.extend(
            self.foundations
                .iter()
                .map(|card| card.map_or(DIGEST_NO_CARD, |c| c.id())),
        );
        for tableau in &self.tableaus {
            bytes.extend(tableau.hidden().iter().map(Card::id));
            bytes.push(DIGEST_HIDDEN_END);
            bytes.extend(tableau.revealed().iter().map(Card::id));
            bytes.push(DIGEST_PILE_END);
        }
        Digest(bytes)
    }

    /// Every card on the board; a foundation contributes all ranks up to its top.
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        let foundation_cards = self.foundations.iter().flatten().flat_map(|top| {
            let suit = top.suit();
            (1..=top.rank()).map(move |rank| Card::new(rank, suit))
        });
        self.stock
            .iter()
            .copied()
            .chain(self.waste.iter().copied())
            .chain(foundation_cards)
            .chain(self.tableaus.iter().flat_map(|t| t.cards.iter().copied()))
    }

    /// Holds each of the 52 cards exactly once, and every tableau shows a
    /// proper run on top of its hidden cards.
    pub fn is_valid(&self) -> bool {
        let mut seen = [false; MAX_CARD as usize];
        let mut count = 0;
        for card in self.cards() {
            let id = card.id() as usize;
            if seen[id] {
                return false;
            }
            seen[id] = true;
            count += 1;
        }
        count == MAX_CARD as usize && self.tableaus.iter().all(Tableau::is_well_formed)
    }

    fn tableau_checked(&self, mv: Move, pile: usize) -> Result<&Tableau, MoveError> {
        self.tableaus
            .get(pile)
            .ok_or_else(|| illegal(mv, "pile index out of range"))
    }

    fn reveal(&mut self, pile: usize) {
        if self.tableaus[pile].reveal() {
            self.score += REVEAL_SCORE;
            debug!("tune over {pile}");
        }
    }

    fn record(&mut self, mv: Move) {
        self.steps += 1;
        self.moves.push(mv);
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut board = Board::new();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Failed to parse at '{line}'");
            if let Some(rest) = line.strip_prefix("Stock:") {
                board
                    .stock
                    .extend(Card::parse_many(rest).with_context(line_context)?);
            } else if let Some(rest) = line.strip_prefix("Waste:") {
                board
                    .waste
                    .extend(Card::parse_many(rest).with_context(line_context)?);
            } else if let Some(rest) = line.strip_prefix("Foundation") {
                let (_, cards) = rest
                    .split_once(':')
                    .context("Missing ':'")
                    .with_context(line_context)?;
                let cards = Card::parse_many(cards).with_context(line_context)?;
                if let Some(&card) = cards.last() {
                    board.foundations[card.suit().index()] = Some(card);
                }
            } else if let Some(rest) = line.strip_prefix("Tableau") {
                let (idx, cards) = rest
                    .split_once(':')
                    .context("Missing ':'")
                    .with_context(line_context)?;
                let idx = idx
                    .trim()
                    .parse::<usize>()
                    .context("Invalid tableau index")
                    .with_context(line_context)?;
                if !(1..=TOTAL_TABLEAUS).contains(&idx) {
                    bail!("Tableau index {idx} out of range");
                }
                let (hidden, revealed) = cards.split_once('|').unwrap_or(("", cards));
                let hidden = Card::parse_many(hidden).with_context(line_context)?;
                let revealed = Card::parse_many(revealed).with_context(line_context)?;
                let tableau = &mut board.tableaus[idx - 1];
                tableau.face_up_count = revealed.len();
                tableau.cards = hidden.into_iter().chain(revealed).collect();
            } else if let Some(rest) = line.strip_prefix("Score:") {
                board.score = rest
                    .trim()
                    .parse()
                    .context("Invalid score")
                    .with_context(line_context)?;
            } else if let Some(rest) = line.strip_prefix("Steps:") {
                board.steps = rest
                    .trim()
                    .parse()
                    .context("Invalid steps")
                    .with_context(line_context)?;
            } else {
                bail!("Unknown line '{line}'");
            }
        }

        Ok(board)
    }

    pub fn pretty_print(&self) -> String {
        let format_cards = |cards: &[Card]| -> String {
            cards.iter().map(Card::pretty_print).collect::<String>()
        };
        let mut output = String::new();

        if !self.stock.is_empty() {
            output.push_str(&format!("Stock: {}\n", format_cards(&self.stock)));
        }

        if !self.waste.is_empty() {
            output.push_str(&format!("Waste: {}\n", format_cards(&self.waste)));
        }

        for (i, card) in self.foundations.iter().enumerate() {
            if let Some(card) = card {
                output.push_str(&format!("Foundation{}: {}\n", i + 1, card.pretty_print()));
            }
        }

        for (i, tableau) in self.tableaus.iter().enumerate() {
            if tableau.is_empty() {
                continue;
            }
            output.push_str(&format!(
                "Tableau{}: {}|{}\n",
                i + 1,
                format_cards(tableau.hidden()),
                format_cards(tableau.revealed())
            ));
        }

        output.push_str(&format!("Score: {}\nSteps: {}", self.score, self.steps));

        output
    }
}

/// A tableau pile. The last `face_up_count` cards are revealed; the top of
/// the pile is the last card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tableau {
    pub(crate) cards: SmallVec<[Card; TABLEAU_SIZE]>,
    pub(crate) face_up_count: usize,
}

impl Tableau {
    pub fn new(hidden: &[Card], revealed: &[Card]) -> Self {
        Self {
            cards: hidden.iter().chain(revealed).copied().collect(),
            face_up_count: revealed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn top(&self) -> Option<Card> {
        self.revealed().last().copied()
    }

    pub fn hidden(&self) -> &[Card] {
        &self.cards[..self.cards.len() - self.face_up_count]
    }

    pub fn revealed(&self) -> &[Card] {
        &self.cards[self.cards.len() - self.face_up_count..]
    }

    /// Revealed cards alternate color and descend by one, and a non-empty
    /// pile shows at least one card.
    pub fn is_well_formed(&self) -> bool {
        if self.face_up_count > self.cards.len() {
            return false;
        }
        if !self.cards.is_empty() && self.face_up_count == 0 {
            return false;
        }
        self.revealed()
            .windows(2)
            .all(|w| w[0].is_red() != w[1].is_red() && w[0].rank() == w[1].rank() + 1)
    }

    fn push(&mut self, card: Card) {
        self.face_up_count += 1;
        self.cards.push(card);
    }

    fn extend(&mut self, run: &[Card]) {
        self.face_up_count += run.len();
        self.cards.extend_from_slice(run);
    }

    fn split_off_revealed(&mut self, split: usize) -> SmallVec<[Card; TABLEAU_SIZE]> {
        let start = self.cards.len() - self.face_up_count + split;
        self.face_up_count = split;
        self.cards.drain(start..).collect()
    }

    fn reveal(&mut self) -> bool {
        if self.face_up_count == 0 && !self.cards.is_empty() {
            self.face_up_count = 1;
            return true;
        }
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Parses a layout and puts every card it does not mention into the stock.
    pub(crate) fn board_with_rest_in_stock(layout: &str) -> Board {
        let mut board = Board::parse(layout).unwrap();
        let mut present = [false; MAX_CARD as usize];
        for card in board.cards() {
            present[card.id() as usize] = true;
        }
        for card in Card::full_deck() {
            if !present[card.id() as usize] {
                board.stock.push(card);
            }
        }
        assert!(board.is_valid(), "layout is not a valid board");
        board
    }

    fn card(s: &str) -> Card {
        Card::parse_many(s).unwrap()[0]
    }

    #[test]
    fn test_parse_board() {
        const BOARD_STR: &str = r#"Stock: 5♦2♥8♦K♣7♥J♣7♦Q♥K♥T♦6♣9♥K♦J♠T♣Q♣3♣2♦Q♦8♥6♥
Waste: 7♠8♠
Foundation1: 2♣
Foundation4: A♠
Tableau1: |5♣
Tableau2: J♥|6♠
Tableau3: T♠5♥|Q♠
Tableau4: 9♠T♥2♠|9♣
Tableau5: 7♣4♥3♠|A♦
Tableau6: 3♥3♦4♣5♠4♦|8♣
Tableau7: 6♦4♠A♥9♦K♠|J♦
Score: 15
Steps: 3"#;

        let board = Board::parse(BOARD_STR).unwrap();
        assert!(board.is_valid());
        assert_eq!(board.score(), 15);
        assert_eq!(board.foundation(Suit::Spades), Some(card("A♠")));
        assert_eq!(BOARD_STR, board.pretty_print());
    }

    #[test]
    fn test_new_from_seed() {
        let board = Board::new_from_seed(670334786);
        assert!(board.is_valid());
        assert_eq!(board.stock().len(), TALON_SIZE);
        assert!(board.waste().is_empty());
        for (i, tableau) in board.tableaus().iter().enumerate() {
            assert_eq!(tableau.hidden().len(), i);
            assert_eq!(tableau.revealed().len(), 1);
        }
        assert_eq!(board, Board::new_from_seed(670334786));
        assert_ne!(board.digest(), Board::new_from_seed(1).digest());
    }

    #[test]
    fn test_from_deck_order() {
        let deck = Card::full_deck();
        let board = Board::from_deck(deck);
        // The last card of the deck is dealt first, face up on pile 0.
        assert_eq!(board.tableau(0).revealed(), &[deck[51]]);
        assert_eq!(board.tableau(1).hidden(), &[deck[50]]);
        assert_eq!(board.tableau(1).revealed(), &[deck[49]]);
        assert_eq!(board.stock(), &deck[..24]);
    }

    #[test]
    fn test_foundation_scenario() {
        let mut board = board_with_rest_in_stock(
            "Foundation1: 5♣\nTableau1: K♦|7♣\nTableau2: Q♦|6♣",
        );
        let err = board.pile_to_foundation(0).unwrap_err();
        assert!(matches!(
            err,
            MoveError::IllegalMove {
                mv: Move::PileToFoundation(0),
                ..
            }
        ));
        assert_eq!(board.score(), 0);
        assert_eq!(board.steps(), 0);

        board.pile_to_foundation(1).unwrap();
        assert_eq!(board.foundation(Suit::Clubs), Some(card("6♣")));
        // 10 for the foundation, 5 for revealing Q♦.
        assert_eq!(board.score(), 15);
        assert_eq!(board.steps(), 1);
        assert_eq!(board.tableau(1).revealed(), &[card("Q♦")]);
        assert_eq!(board.moves(), &[Move::PileToFoundation(1)]);
        assert!(board.is_valid());
    }

    #[test]
    fn test_merge_scenario() {
        let mut board = board_with_rest_in_stock(
            "Tableau1: 2♦|9♠\nTableau2: 3♥|8♥7♣",
        );
        assert!(board.can_accept_on_pile(card("8♥"), 0));
        board.pile_to_pile(0, 1).unwrap();
        assert_eq!(board.tableau(0).revealed(), &[card("9♠"), card("8♥"), card("7♣")]);
        assert_eq!(board.tableau(0).top(), Some(card("7♣")));
        assert_eq!(board.tableau(1).revealed(), &[card("3♥")]);
        assert!(board.tableau(1).hidden().is_empty());
        assert_eq!(board.score(), REVEAL_SCORE);
        assert!(board.is_valid());

        // The run cannot go back.
        assert!(board.pile_to_pile(1, 0).is_err());
    }

    #[test]
    fn test_partial_pile_to_pile() {
        let mut board = board_with_rest_in_stock(
            "Tableau1: 2♦|T♠9♥8♣\nTableau2: 4♥|9♦",
        );
        board.partial_pile_to_pile(1, 0, 2).unwrap();
        assert_eq!(board.tableau(0).revealed(), &[card("T♠"), card("9♥")]);
        assert_eq!(board.tableau(1).revealed(), &[card("9♦"), card("8♣")]);
        assert_eq!(board.score(), 0);
        assert_eq!(board.steps(), 1);

        assert!(board.partial_pile_to_pile(1, 0, 0).is_err());
        assert!(board.partial_pile_to_pile(1, 0, 5).is_err());
        assert!(board.partial_pile_to_pile(1, 1, 1).is_err());
        assert!(board.is_valid());
    }

    #[test]
    fn test_waste_moves() {
        let mut board = board_with_rest_in_stock("Waste: A♥7♦\nTableau1: |8♠");
        assert!(board.waste_to_foundation().is_err());
        board.waste_to_pile(0).unwrap();
        assert_eq!(board.score(), WASTE_TO_PILE_SCORE);
        board.waste_to_foundation().unwrap();
        assert_eq!(board.foundation(Suit::Hearts), Some(card("A♥")));
        assert_eq!(board.score(), WASTE_TO_PILE_SCORE + FOUNDATION_SCORE);
        assert!(board.waste_to_pile(0).is_err());
        assert_eq!(board.moves(), &[Move::WasteToPile(0), Move::WasteToFoundation]);
        assert!(board.is_valid());
    }

    #[test]
    fn test_empty_pile_accepts_only_kings() {
        let board = board_with_rest_in_stock("Tableau1: |K♠");
        assert!(board.can_accept_on_pile(card("K♥"), 1));
        assert!(!board.can_accept_on_pile(card("Q♥"), 1));
        assert!(board.can_accept_on_pile(card("Q♥"), 0));
        assert!(!board.can_accept_on_pile(card("Q♠"), 0));
        assert!(!board.can_accept_on_pile(card("Q♥"), TOTAL_TABLEAUS));
    }

    #[test]
    fn test_tune_card_recycle_oscillation() {
        let mut board = Board::parse("Stock: 3♣4♦").unwrap();
        assert!(board.tune_card());
        assert!(board.tune_card());
        assert_eq!(board.waste(), &[card("4♦"), card("3♣")]);
        board.score = 150;

        // First recycle restores the stock and is progress.
        assert!(board.tune_card());
        assert_eq!(board.stock(), &[card("3♣"), card("4♦")]);
        assert!(board.waste().is_empty());
        assert_eq!(board.score(), 50);

        assert!(board.tune_card());
        assert!(board.tune_card());
        // Same stock as the last recycle: no progress.
        assert!(!board.tune_card());
        assert_eq!(board.score(), 0);
        assert_eq!(board.steps(), 5);
    }

    #[test]
    fn test_tune_card_nothing_to_draw() {
        let mut board = Board::new();
        assert!(!board.tune_card());
        assert!(board.moves().is_empty());
        assert_eq!(board.steps(), 0);
    }

    #[test]
    fn test_terminal() {
        let board = Board::parse("Foundation1: K♣\nFoundation2: K♦\nFoundation3: K♥\nFoundation4: K♠")
            .unwrap();
        assert!(board.is_valid());
        assert!(board.is_terminal());
        assert_eq!(board.foundation_count(), MAX_CARD);
        assert!(!Board::new_from_seed(7).is_terminal());
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let a = Board::parse("Stock: 3♣4♦").unwrap();
        let b = Board::parse("Stock: 4♦3♣").unwrap();
        let c = Board::parse("Waste: 3♣4♦").unwrap();
        let d = Board::parse("Tableau1: 3♣|4♦").unwrap();
        let e = Board::parse("Tableau1: |3♣4♦").unwrap();
        let digests = [a.digest(), b.digest(), c.digest(), d.digest(), e.digest()];
        for (i, x) in digests.iter().enumerate() {
            for y in &digests[i + 1..] {
                assert_ne!(x, y);
            }
        }
        // Score and history do not take part.
        let mut f = a.clone();
        f.score = 40;
        f.moves.push(Move::DealWaste);
        assert_eq!(a.digest(), f.digest());
    }

    #[test]
    fn test_is_valid_rejects_broken_runs() {
        let mut board = board_with_rest_in_stock("Tableau1: |9♠8♥");
        assert!(board.is_valid());
        board.tableaus[0].face_up_count = 0;
        assert!(!board.is_valid());
        board.tableaus[0] = Tableau::new(&[], &[card("9♠"), card("8♠")]);
        assert!(!board.is_valid());
        assert!(!Board::new().is_valid());
    }
}
