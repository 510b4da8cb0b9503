//! Plan files: one move token per line.
//!
//! A token is an upgrade index (`3`) for its next level, or an index followed
//! by a mode label (`3z`) for a production switch. Blank lines and `#`
//! comments are ignored, as is the `-1` end marker. Session exports from the
//! recorder, with their `upg #` column, are read the same way.
use std::fmt::Write as _;

use crate::definition::GameDefinition;
use crate::error::GameError;
use crate::prereq::Move;
use crate::recorder::MOVE_COLUMN;
use crate::state::GameState;
use crate::upgrade::ProductionMode;

const END_MARKER: &str = "-1";

/// Parse `text` into moves, numbering levels from the levels in `state`.
///
/// The text is read as CSV. When the first record has an `upg #` field it is
/// a header and tokens come from that column; otherwise from the first.
///
/// # Errors
///
/// Returns `GameError::Plan` naming the offending line.
pub fn parse_plan(text: &str, state: &GameState) -> Result<Vec<Move>, GameError> {
    let def = state.definition();
    let mut levels = state.levels().to_vec();
    let mut plan = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());
    let mut column = None;
    for record in reader.records() {
        let record = record.map_err(|err| GameError::Plan {
            line: err.position().map_or(0, line_of),
            message: err.to_string(),
        })?;
        let line = record.position().map_or(0, line_of);
        let index = match column {
            Some(index) => index,
            None => {
                let header = record.iter().position(|f| f.eq_ignore_ascii_case(MOVE_COLUMN));
                column = Some(header.unwrap_or(0));
                if header.is_some() {
                    continue;
                }
                0
            }
        };
        let token = record.get(index).unwrap_or_default();
        if token.is_empty() || token == END_MARKER {
            continue;
        }
        let item = parse_token(token, def, &mut levels)
            .map_err(|message| GameError::Plan { line, message })?;
        plan.push(item);
    }
    Ok(plan)
}

fn line_of(position: &csv::Position) -> usize {
    usize::try_from(position.line()).unwrap_or(usize::MAX)
}

fn parse_token(token: &str, def: &GameDefinition, levels: &mut [usize]) -> Result<Move, String> {
    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, label) = token.split_at(split);
    let upgrade: usize = digits
        .parse()
        .map_err(|_| format!("{token:?} is not an upgrade index"))?;
    let up = def.upgrade(upgrade).map_err(|err| err.to_string())?;
    if label.is_empty() {
        let level = levels[upgrade] + 1;
        if level > up.max_level() {
            return Err(format!("{} has only {} levels", up.name(), up.max_level()));
        }
        levels[upgrade] = level;
        return Ok(Move::level_up(upgrade, level));
    }
    let producer = up
        .as_producer()
        .filter(|p| p.is_switchable())
        .ok_or_else(|| format!("{} has no production switch", up.name()))?;
    [ProductionMode::Primary, ProductionMode::Alternate]
        .into_iter()
        .find(|&mode| producer.mode_label(mode).eq_ignore_ascii_case(label))
        .map(|mode| Move::switch(upgrade, mode))
        .ok_or_else(|| format!("{label:?} is not a production mode of {}", up.name()))
}

/// Write `plan` in the format [`parse_plan`] reads.
#[must_use]
pub fn format_plan(plan: &[Move], def: &GameDefinition) -> String {
    let mut out = String::new();
    for item in plan {
        let _ = writeln!(out, "{}", item.token(def));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::market;

    #[test]
    fn levels_count_from_the_start_state() {
        let state = GameState::new(market());
        let plan = parse_plan("1\n0\n# second stall level next\n\n0\n1z\n1a\n-1\n", &state).unwrap();
        assert_eq!(
            plan,
            vec![
                Move::level_up(1, 1),
                Move::level_up(0, 2),
                Move::level_up(0, 3),
                Move::switch(1, ProductionMode::Alternate),
                Move::switch(1, ProductionMode::Primary),
            ]
        );
    }

    #[test]
    fn recorder_exports_are_accepted() {
        let state = GameState::new(market());
        let csv = "upg #,time left,after (min)\n1,1:57:09,2.9\n0,1:55:00,2.1\n-1,0:00:00,115.0\n";
        let plan = parse_plan(csv, &state).unwrap();
        assert_eq!(plan, vec![Move::level_up(1, 1), Move::level_up(0, 2)]);
    }

    #[test]
    fn quoted_headers_and_moved_columns_are_found() {
        let state = GameState::new(market());
        let quoted = "\"upg #\",\"time left\",\"after (min)\"\n\"1\",\"3:57:00\",\"3.0\"\n";
        assert_eq!(parse_plan(quoted, &state).unwrap(), vec![Move::level_up(1, 1)]);
        let moved = "time left,after (min),upg #,upgrade,cost\n\
                     3:57:00,3.0,1,Sawmill -> 1,\"30 co, 5 wo\"\n\
                     3:50:00,7.0,1z,Sawmill: alternate,\n\
                     0:00:00,230.0,-1,end,\n";
        assert_eq!(
            parse_plan(moved, &state).unwrap(),
            vec![Move::level_up(1, 1), Move::switch(1, ProductionMode::Alternate)]
        );
    }

    #[test]
    fn errors_name_the_line() {
        let state = GameState::new(market());
        let err = parse_plan("1\n\n9\n", &state).unwrap_err();
        assert!(matches!(err, GameError::Plan { line: 3, .. }));
        let err = parse_plan("0\n0\n0\n", &state).unwrap_err();
        assert!(err.to_string().contains("only 3 levels"));
        assert!(parse_plan("0z\n", &state).is_err());
        assert!(parse_plan("1q\n", &state).is_err());
        assert!(parse_plan("stall\n", &state).is_err());
    }

    #[test]
    fn formatted_plans_parse_back() {
        let state = GameState::new(market());
        let plan = vec![
            Move::level_up(1, 1),
            Move::switch(1, ProductionMode::Alternate),
            Move::level_up(0, 2),
        ];
        let text = format_plan(&plan, state.definition());
        assert_eq!(text, "1\n1z\n0\n");
        assert_eq!(parse_plan(&text, &state).unwrap(), plan);
    }
}
