//! Free-text command grammar, case-insensitive:
//!
//! ```text
//! HEAT <temp>                               set temperature, keep mode
//! HEAT ON  [<temp>] [[<dd-mm>] <hh:mm>]     run program, optional temporary temperature
//! HEAT OFF [<temp>] [[<dd-mm>] <hh:mm>]     hold a constant temperature
//! ```

use crate::{
    error::CommandError,
    schedule::DueAt,
    types::{Temperature, ThermostatMode},
};

pub const KEYWORD: &str = "heat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// `None` leaves the device in whatever mode it is already in.
    pub mode: Option<ThermostatMode>,
    pub temperature: Option<Temperature>,
    pub due_at: Option<DueAt>,
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(line: &str) -> Result<ParsedInstruction, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Err(CommandError::Empty);
        };

        let (body, due_at) = split_due_at(&tokens)?;

        let keyword = body.first().unwrap_or(first).to_ascii_lowercase();
        if keyword != KEYWORD {
            return Err(CommandError::UnknownCommand(keyword));
        }

        let Some(param) = body.get(1) else {
            return Err(CommandError::MissingParameter);
        };
        let param = param.to_ascii_lowercase();

        let (mode, temperature) = if let Some(temp) = parse_temperature(&param) {
            (None, Some(temp))
        } else {
            let mode = match param.as_str() {
                "on" => ThermostatMode::RunProgram,
                "off" => ThermostatMode::HoldConstant,
                _ => return Err(CommandError::UnknownParameter(param)),
            };
            // A non-numeric third word is ignored.
            (Some(mode), body.get(2).and_then(|raw| parse_temperature(raw)))
        };

        Ok(ParsedInstruction {
            mode,
            temperature,
            due_at,
        })
    }
}

/// Peels a trailing `[dd-mm] hh:mm` off the token list.
fn split_due_at<'a, 'b>(
    tokens: &'a [&'b str],
) -> Result<(&'a [&'b str], Option<DueAt>), CommandError> {
    let Some((time, rest)) = tokens.split_last() else {
        return Ok((tokens, None));
    };
    if !time.contains(':') {
        return Ok((tokens, None));
    }

    match rest.split_last() {
        Some((date, rest)) if date.contains('-') => {
            Ok((rest, Some(DueAt::parse(Some(*date), time)?)))
        }
        _ => Ok((rest, Some(DueAt::parse(None, time)?))),
    }
}

fn parse_temperature(raw: &str) -> Option<Temperature> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Absurdly long digit strings still mean "as warm as allowed".
    Some(raw.parse().unwrap_or(Temperature::MAX))
}
