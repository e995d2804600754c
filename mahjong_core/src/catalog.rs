use crate::arrange::PlayerSet;
use crate::error::ScoringResult;
use crate::pattern::{Claim, IdentifiablePattern, PatternCatalog};
use crate::situation::{Group, WinType, Wind};
use crate::tile::Suit;

pub const REFERENCE_CATALOG: &str = "reference";

pub fn reference_catalog() -> ScoringResult<PatternCatalog> {
    use IdentifiablePattern as P;

    PatternCatalog::builder(REFERENCE_CATALOG)
        .pattern(P::new("Big Three Dragons", 88, big_three_dragons).tagged(&["three_dragons"]))
        .pattern(
            P::new("Little Three Dragons", 64, little_three_dragons).tagged(&["three_dragons"]),
        )
        .pattern(P::new("Full Flush", 24, full_flush).tagged(&["flush"]))
        .pattern(P::new("Pure Triple Chow", 24, pure_triple_chow))
        .pattern(P::new("Pure Straight", 16, pure_straight))
        .pattern(P::new("Three Concealed Pungs", 16, three_concealed_pungs))
        .pattern(P::new("Mixed Triple Chow", 8, mixed_triple_chow).exclusive_claims())
        .pattern(P::new("All Pungs", 6, all_pungs))
        .pattern(P::new("Half Flush", 6, half_flush).tagged(&["flush"]))
        .pattern(P::new("Outside Hand", 4, outside_hand))
        .pattern(P::new("All Chows", 2, all_chows))
        .pattern(P::new("All Simples", 2, all_simples))
        .pattern(P::new("Dragon Pung", 2, dragon_pung))
        .pattern(P::new("Prevalent Wind", 2, prevalent_wind))
        .pattern(P::new("Seat Wind", 2, seat_wind))
        .pattern(P::new("Fully Concealed", 2, fully_concealed))
        .pattern(P::new("Pure Double Chow", 1, pure_double_chow).exclusive_claims())
        .pattern(P::new("Self-Drawn", 1, self_drawn))
        .exclusive("Big Three Dragons", "Dragon Pung")
        .exclusive("Little Three Dragons", "Dragon Pung")
        .exclusive("Pure Triple Chow", "Pure Double Chow")
        .build()
}

/// The whole arrangement, when it is non-empty and `holds`.
fn whole(s: &PlayerSet, holds: bool) -> Vec<Claim> {
    if !s.is_empty() && holds {
        vec![Claim::all(s)]
    } else {
        vec![]
    }
}

fn chows(s: &PlayerSet) -> Vec<(usize, Group)> {
    s.sets()
        .filter(|(_, g)| g.is_chow())
        .map(|(i, g)| (i, *g))
        .collect()
}

fn triplets(s: &PlayerSet) -> impl Iterator<Item = (usize, &Group)> {
    s.sets().filter(|(_, g)| g.is_triplet())
}

fn dragon_triplets(s: &PlayerSet) -> Vec<usize> {
    triplets(s)
        .filter(|(_, g)| g.first.is_dragon())
        .map(|(i, _)| i)
        .collect()
}

/// Suits present among the arrangement's suited tiles, and whether honors appear.
fn suits(s: &PlayerSet) -> (Vec<Suit>, bool) {
    let mut seen = vec![];
    let mut honors = false;
    for g in s.groups() {
        if g.first.is_honor() {
            honors = true;
        } else if !seen.contains(&g.first.suit) {
            seen.push(g.first.suit);
        }
    }
    (seen, honors)
}

fn all_pungs(s: &PlayerSet) -> Vec<Claim> {
    whole(s, s.sets().next().is_some() && s.sets().all(|(_, g)| g.is_triplet()))
}

fn all_chows(s: &PlayerSet) -> Vec<Claim> {
    whole(s, s.sets().next().is_some() && s.sets().all(|(_, g)| g.is_chow()))
}

fn all_simples(s: &PlayerSet) -> Vec<Claim> {
    whole(s, s.tiles().iter().all(|t| t.is_simple()))
}

fn half_flush(s: &PlayerSet) -> Vec<Claim> {
    let (seen, honors) = suits(s);
    whole(s, seen.len() == 1 && honors)
}

fn full_flush(s: &PlayerSet) -> Vec<Claim> {
    let (seen, honors) = suits(s);
    whole(s, seen.len() == 1 && !honors)
}

fn outside_hand(s: &PlayerSet) -> Vec<Claim> {
    whole(s, s.groups().iter().all(Group::has_terminal_or_honor))
}

/// One match per pair of identical chows.
fn pure_double_chow(s: &PlayerSet) -> Vec<Claim> {
    let c = chows(s);
    let mut out = vec![];
    for (a, (i, gi)) in c.iter().enumerate() {
        for (j, gj) in &c[a + 1..] {
            if gi.first == gj.first {
                out.push(Claim::groups([*i, *j]));
            }
        }
    }
    out
}

fn pure_triple_chow(s: &PlayerSet) -> Vec<Claim> {
    let c = chows(s);
    for (a, (_, g)) in c.iter().enumerate() {
        let same: Vec<usize> = c[a..]
            .iter()
            .filter(|(_, o)| o.first == g.first)
            .map(|(i, _)| *i)
            .collect();
        if same.len() >= 3 {
            return vec![Claim::groups(same.into_iter().take(3))];
        }
    }
    vec![]
}

fn pure_straight(s: &PlayerSet) -> Vec<Claim> {
    let c = chows(s);
    for suit in [Suit::Man, Suit::Pin, Suit::Sou] {
        let start = |n: u8| {
            c.iter()
                .find(|(_, g)| g.first.suit == suit && g.first.num == n)
                .map(|(i, _)| *i)
        };
        if let (Some(a), Some(b), Some(d)) = (start(1), start(4), start(7)) {
            return vec![Claim::groups([a, b, d])];
        }
    }
    vec![]
}

/// Chows on the same numbers in all three suits; one match per distinct triple.
fn mixed_triple_chow(s: &PlayerSet) -> Vec<Claim> {
    let c = chows(s);
    let in_suit = |suit: Suit, num: u8| -> Vec<usize> {
        c.iter()
            .filter(|(_, g)| g.first.suit == suit && g.first.num == num)
            .map(|(i, _)| *i)
            .collect()
    };

    let mut out = vec![];
    for num in 1..=7 {
        for m in in_suit(Suit::Man, num) {
            for p in in_suit(Suit::Pin, num) {
                for so in in_suit(Suit::Sou, num) {
                    out.push(Claim::groups([m, p, so]));
                }
            }
        }
    }
    out
}

/// A pung finished with a claimed winning tile is not concealed, unless the tile
/// can be read as finishing a concealed chow or the pair instead.
fn three_concealed_pungs(s: &PlayerSet) -> Vec<Claim> {
    let ctx = s.context();
    let claimed = match (ctx.win_type, ctx.winning_tile) {
        (WinType::Claimed, Some(w)) => {
            let elsewhere = s
                .groups()
                .iter()
                .any(|g| g.concealed && !g.is_triplet() && g.contains(w));
            (!elsewhere).then_some(w)
        }
        _ => None,
    };

    let concealed: Vec<usize> = triplets(s)
        .filter(|(_, g)| g.concealed && Some(g.first) != claimed)
        .map(|(i, _)| i)
        .collect();

    if concealed.len() >= 3 {
        vec![Claim::groups(concealed)]
    } else {
        vec![]
    }
}

fn dragon_pung(s: &PlayerSet) -> Vec<Claim> {
    dragon_triplets(s).into_iter().map(Claim::group).collect()
}

fn little_three_dragons(s: &PlayerSet) -> Vec<Claim> {
    let pungs = dragon_triplets(s);
    match s.pair() {
        Some(pair) if pair.first.is_dragon() && pungs.len() == 2 => {
            let pair_idx = s.groups().iter().position(Group::is_pair);
            vec![Claim::groups(pungs.into_iter().chain(pair_idx))]
        }
        _ => vec![],
    }
}

fn big_three_dragons(s: &PlayerSet) -> Vec<Claim> {
    let pungs = dragon_triplets(s);
    if pungs.len() == 3 {
        vec![Claim::groups(pungs)]
    } else {
        vec![]
    }
}

fn wind_pung(s: &PlayerSet, wind: Wind) -> Vec<Claim> {
    triplets(s)
        .filter(|(_, g)| g.first.honor == Some(wind.honor()))
        .map(|(i, _)| Claim::group(i))
        .collect()
}

fn prevalent_wind(s: &PlayerSet) -> Vec<Claim> {
    wind_pung(s, s.context().round_wind)
}

fn seat_wind(s: &PlayerSet) -> Vec<Claim> {
    wind_pung(s, s.context().seat_wind)
}

fn fully_concealed(s: &PlayerSet) -> Vec<Claim> {
    whole(s, s.groups().iter().all(|g| g.concealed))
}

fn self_drawn(s: &PlayerSet) -> Vec<Claim> {
    if !s.is_empty() && s.context().win_type == WinType::Drawn {
        vec![Claim::none()]
    } else {
        vec![]
    }
}
