use anyhow::{Context, Result};

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;

const SUITS: [char; 4] = ['♣', '♦', '♥', '♠'];
const RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

/// Foundation order is fixed: clubs, diamonds, hearts, spades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; MAX_SUIT as usize] =
        [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn from_index(idx: u8) -> Self {
        Self::ALL[(idx % MAX_SUIT) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }

    pub fn symbol(self) -> char {
        SUITS[self.index()]
    }
}

/// A playing card packed into one byte: `suit * 13 + (rank - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    pub fn new(rank: u8, suit: Suit) -> Self {
        debug_assert!((1..=MAX_RANK).contains(&rank));
        Self(suit as u8 * MAX_RANK + rank - 1)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        (id < MAX_CARD).then_some(Self(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    /// Rank in `1..=13`.
    pub fn rank(&self) -> u8 {
        self.0 % MAX_RANK + 1
    }

    pub fn suit(&self) -> Suit {
        Suit::from_index(self.0 / MAX_RANK)
    }

    pub fn is_red(&self) -> bool {
        self.suit().is_red()
    }

    pub fn is_king(&self) -> bool {
        self.rank() == MAX_RANK
    }

    /// The card of the same suit one rank higher, if any.
    pub fn successor(&self) -> Option<Self> {
        (self.rank() < MAX_RANK).then(|| Self(self.0 + 1))
    }

    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANKS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank at card {rank}{suit}"))?;
        let suit_idx = SUITS
            .iter()
            .position(|&s| s == suit)
            .with_context(|| format!("Invalid suit at card {rank}{suit}"))?;
        Ok(Self(suit_idx as u8 * MAX_RANK + rank_idx as u8))
    }

    pub fn parse_many(s: &str) -> Result<Vec<Self>> {
        let mut cards = Vec::new();
        let mut chars = s.chars().filter(|c| !c.is_whitespace());
        while let Some(rank) = chars.next() {
            let suit = chars
                .next()
                .with_context(|| format!("Missing suit after rank {rank}"))?;
            cards.push(Card::parse(rank, suit)?);
        }
        Ok(cards)
    }

    pub fn pretty_print(&self) -> String {
        format!("{}{}", RANKS[(self.rank() - 1) as usize], self.suit().symbol())
    }

    /// Every card once, clubs first, aces first within a suit.
    pub fn full_deck() -> [Card; MAX_CARD as usize] {
        std::array::from_fn(|id| Card(id as u8))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pretty_print())
    }
}
