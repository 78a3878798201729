//! FEN parsing and generation.
//!
//! Parsing validates all six fields and rejects positions that violate the
//! one-king-per-side invariant, so the rest of the crate can assume a
//! structurally sound board.

use crate::board::position::Position;
use crate::board::types::{
    CastlingRights, Color, PieceKind, Square, CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE,
    CASTLE_WHITE_KINGSIDE, CASTLE_WHITE_QUEENSIDE,
};
use crate::errors::{EngineError, EngineResult};
use crate::tables::zobrist::compute_zobrist_key;
use crate::utils::notation::{algebraic_to_square, square_to_algebraic};

pub fn parse_fen(fen: &str) -> EngineResult<Position> {
    let mut parts = fen.split_whitespace();

    let board_part = next_field(&mut parts, "piece placement")?;
    let side_part = next_field(&mut parts, "side to move")?;
    let castling_part = next_field(&mut parts, "castling availability")?;
    let en_passant_part = next_field(&mut parts, "en-passant target")?;
    let halfmove_part = next_field(&mut parts, "halfmove clock")?;
    let fullmove_part = next_field(&mut parts, "fullmove number")?;

    if parts.next().is_some() {
        return Err(EngineError::ParseError("extra trailing fields".to_owned()));
    }

    let mut position = Position::empty();

    parse_board(board_part, &mut position)?;
    position.side_to_move = parse_side_to_move(side_part)?;
    position.castling_rights = parse_castling_rights(castling_part)?;
    position.en_passant_square = parse_en_passant_square(en_passant_part)?;
    position.halfmove_clock = halfmove_part
        .parse::<u16>()
        .map_err(|_| EngineError::ParseError(format!("invalid halfmove clock: {halfmove_part}")))?;
    position.fullmove_number = fullmove_part
        .parse::<u16>()
        .map_err(|_| EngineError::ParseError(format!("invalid fullmove number: {fullmove_part}")))?;
    if position.fullmove_number == 0 {
        return Err(EngineError::ParseError(
            "fullmove number must be at least 1".to_owned(),
        ));
    }

    for color in [Color::White, Color::Black] {
        let kings = position.pieces[color.index()][PieceKind::King.index()].count_ones();
        if kings != 1 {
            return Err(EngineError::ParseError(format!(
                "expected exactly one {color:?} king, found {kings}"
            )));
        }
    }

    position.recalc_occupancy();
    position.zobrist_key = compute_zobrist_key(&position);
    position.repetition_history.push(position.zobrist_key);

    Ok(position)
}

pub fn generate_fen(position: &Position) -> String {
    let mut out = String::with_capacity(80);

    for rank in (0..8).rev() {
        let mut empty_run = 0u8;
        for file in 0..8 {
            let sq = (rank * 8 + file) as Square;
            match position.piece_on(sq) {
                Some((color, piece)) => {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(piece_to_fen_char(color, piece));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            out.push((b'0' + empty_run) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match position.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    if position.castling_rights == 0 {
        out.push('-');
    } else {
        if position.castling_rights & CASTLE_WHITE_KINGSIDE != 0 {
            out.push('K');
        }
        if position.castling_rights & CASTLE_WHITE_QUEENSIDE != 0 {
            out.push('Q');
        }
        if position.castling_rights & CASTLE_BLACK_KINGSIDE != 0 {
            out.push('k');
        }
        if position.castling_rights & CASTLE_BLACK_QUEENSIDE != 0 {
            out.push('q');
        }
    }

    out.push(' ');
    match position.en_passant_square {
        Some(sq) => out.push_str(&square_to_algebraic(sq)),
        None => out.push('-'),
    }

    out.push_str(&format!(
        " {} {}",
        position.halfmove_clock, position.fullmove_number
    ));

    out
}

fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    name: &str,
) -> EngineResult<&'a str> {
    parts
        .next()
        .ok_or_else(|| EngineError::ParseError(format!("missing {name} field")))
}

fn parse_board(board_part: &str, position: &mut Position) -> EngineResult<()> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(EngineError::ParseError(
            "piece placement must contain 8 ranks".to_owned(),
        ));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx;
        let mut file = 0usize;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(EngineError::ParseError(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += empty_count as usize;
                continue;
            }

            let (color, piece) = piece_from_fen_char(ch).ok_or_else(|| {
                EngineError::ParseError(format!("invalid piece character '{ch}'"))
            })?;

            if file >= 8 {
                return Err(EngineError::ParseError(
                    "rank has too many files".to_owned(),
                ));
            }

            position.set_piece(color, piece, (board_rank * 8 + file) as Square);
            file += 1;
        }

        if file != 8 {
            return Err(EngineError::ParseError(
                "rank does not sum to 8 files".to_owned(),
            ));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> EngineResult<Color> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(EngineError::ParseError(format!(
            "invalid side-to-move field: {side_part}"
        ))),
    }
}

fn parse_castling_rights(castling_part: &str) -> EngineResult<CastlingRights> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_WHITE_KINGSIDE,
            'Q' => rights |= CASTLE_WHITE_QUEENSIDE,
            'k' => rights |= CASTLE_BLACK_KINGSIDE,
            'q' => rights |= CASTLE_BLACK_QUEENSIDE,
            _ => {
                return Err(EngineError::ParseError(format!(
                    "invalid castling rights character: {ch}"
                )))
            }
        }
    }
    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> EngineResult<Option<Square>> {
    if en_passant_part == "-" {
        return Ok(None);
    }
    let sq = algebraic_to_square(en_passant_part)
        .map_err(|msg| EngineError::ParseError(msg))?;
    let rank = sq / 8;
    if rank != 2 && rank != 5 {
        return Err(EngineError::ParseError(format!(
            "en-passant target {en_passant_part} is not on rank 3 or 6"
        )));
    }
    Ok(Some(sq))
}

fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else if ch.is_ascii_lowercase() {
        Color::Black
    } else {
        return None;
    };

    let piece = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some((color, piece))
}

fn piece_to_fen_char(color: Color, piece: PieceKind) -> char {
    let ch = match piece {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match color {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    }
}
