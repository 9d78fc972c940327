//! Interchange notation for single moves: `{from}/{to}{*}`.
//!
//! Points are written as absolute numbers 1-24 (board index + 1), the bar as
//! `bar` and a borne-off checker as `off`. A trailing `*` marks a hit.
//! Decoding is context-free, so a bear-off infers its die from the exact pip
//! distance; larger dice are reconciled when the move is committed.

use crate::error::NotationError;
use crate::types::{Destination, Move, POINTS, Player, Source};
use tracing::instrument;

/// Renders a move as `from/to`, with `*` appended on a hit.
pub fn encode(mv: &Move) -> String {
    let from = match mv.from {
        Source::Bar => "bar".to_string(),
        Source::Point(index) => (index + 1).to_string(),
    };
    let to = match mv.to {
        Destination::Off => "off".to_string(),
        Destination::Point(index) => (index + 1).to_string(),
    };
    let hit = if mv.is_hit { "*" } else { "" };
    format!("{from}/{to}{hit}")
}

/// Renders a move list separated by spaces.
pub fn encode_sequence(moves: &[Move]) -> String {
    moves.iter().map(encode).collect::<Vec<_>>().join(" ")
}

/// Parses one move token for `player`.
///
/// The die is inferred from the distance travelled. The hit flag is taken
/// from the token as written; the board decides at commit time.
#[instrument]
pub fn decode(token: &str, player: Player) -> Result<Move, NotationError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(NotationError::Empty);
    }
    let (body, is_hit) = match token.strip_suffix('*') {
        Some(body) => (body, true),
        None => (token, false),
    };
    let (from, to) = body
        .split_once('/')
        .ok_or_else(|| NotationError::MissingSeparator(token.to_string()))?;

    let from = parse_source(from)?;
    let to = parse_destination(to)?;
    let die = infer_die(from, to, player)?;
    Ok(Move::new(from, to, die, is_hit))
}

/// Parses a whitespace-separated move list.
pub fn decode_sequence(text: &str, player: Player) -> Result<Vec<Move>, NotationError> {
    text.split_whitespace()
        .map(|token| decode(token, player))
        .collect()
}

fn parse_point(text: &str) -> Result<usize, NotationError> {
    match text.parse::<usize>() {
        Ok(number) if (1..=POINTS).contains(&number) => Ok(number - 1),
        _ => Err(NotationError::InvalidPoint(text.to_string())),
    }
}

fn parse_source(text: &str) -> Result<Source, NotationError> {
    match text.to_ascii_lowercase().as_str() {
        "bar" => Ok(Source::Bar),
        "off" => Err(NotationError::OffAsSource),
        _ => parse_point(text).map(Source::Point),
    }
}

fn parse_destination(text: &str) -> Result<Destination, NotationError> {
    match text.to_ascii_lowercase().as_str() {
        "off" => Ok(Destination::Off),
        "bar" => Err(NotationError::BarAsDestination),
        _ => parse_point(text).map(Destination::Point),
    }
}

fn infer_die(from: Source, to: Destination, player: Player) -> Result<u8, NotationError> {
    match (from, to) {
        (Source::Bar, Destination::Point(index)) => (1..=6u8)
            .find(|&die| player.entry_point(die) == index)
            .ok_or(NotationError::BarEntryOutOfRange),
        (Source::Bar, Destination::Off) => Err(NotationError::BarEntryOutOfRange),
        (Source::Point(index), Destination::Off) => {
            if player.home().contains(&index) {
                Ok(player.pips_to_off(index))
            } else {
                Err(NotationError::NotInHomeBoard)
            }
        }
        (Source::Point(from), Destination::Point(to)) => {
            let forward = match player {
                Player::White => to.checked_sub(from),
                Player::Black => from.checked_sub(to),
            };
            match forward {
                None | Some(0) => Err(NotationError::WrongDirection),
                Some(distance @ 1..=6) => Ok(distance as u8),
                Some(distance) => Err(NotationError::DistanceOutOfRange(distance as u8)),
            }
        }
    }
}
