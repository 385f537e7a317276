//! Parsing of `type/subtype; name=value` media types into [`MediaType`].

use std::collections::BTreeMap;

use crate::rest_types::MediaType;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MediaTypeError {
    #[error("media type is empty")]
    Empty,
    #[error("media type {0:?} has no subtype")]
    MissingSubtype(String),
    #[error("invalid token {0:?} in media type")]
    InvalidToken(String),
    #[error("malformed media type parameter {0:?}")]
    InvalidParameter(String),
    #[error("duplicate media type parameter {0:?}")]
    DuplicateParameter(String),
}

/// Parses a media type such as `text/plain; charset="utf-8"`. Type, subtype
/// and parameter names are lower-cased; quoted parameter values are
/// unescaped.
pub fn parse_media_type(value: &str) -> Result<MediaType, MediaTypeError> {
    let (essence, mut rest) = match value.find(';') {
        Some(i) => (&value[..i], &value[i + 1..]),
        None => (value, ""),
    };
    let essence = essence.trim();
    if essence.is_empty() {
        return Err(MediaTypeError::Empty);
    }

    let (type_, subtype) = essence
        .split_once('/')
        .ok_or_else(|| MediaTypeError::MissingSubtype(essence.to_string()))?;
    let (type_, subtype) = (type_.trim(), subtype.trim());
    if subtype.is_empty() {
        return Err(MediaTypeError::MissingSubtype(essence.to_string()));
    }
    check_token(type_)?;
    check_token(subtype)?;

    let mut parameters = BTreeMap::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let (name, after) = rest
            .split_once('=')
            .ok_or_else(|| MediaTypeError::InvalidParameter(rest.to_string()))?;
        let name = name.trim();
        check_token(name).map_err(|_| MediaTypeError::InvalidParameter(name.to_string()))?;

        let (value, after) = parameter_value(after.trim_start())?;
        let name = name.to_ascii_lowercase();
        if parameters.contains_key(&name) {
            return Err(MediaTypeError::DuplicateParameter(name));
        }
        parameters.insert(name, value);

        let after = after.trim_start();
        rest = match after.strip_prefix(';') {
            Some(next) => next,
            None if after.is_empty() => after,
            None => return Err(MediaTypeError::InvalidParameter(after.to_string())),
        };
    }

    Ok(MediaType {
        r#type: Some(type_.to_ascii_lowercase()),
        subtype: Some(subtype.to_ascii_lowercase()),
        parameters,
    })
}

/// Reads one parameter value, returning it with the unconsumed input.
fn parameter_value(input: &str) -> Result<(String, &str), MediaTypeError> {
    let Some(quoted) = input.strip_prefix('"') else {
        let end = input.find(';').unwrap_or(input.len());
        let value = input[..end].trim_end();
        check_token(value).map_err(|_| MediaTypeError::InvalidParameter(value.to_string()))?;
        return Ok((value.to_string(), &input[end..]));
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &quoted[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }
    Err(MediaTypeError::InvalidParameter(input.to_string()))
}

fn check_token(token: &str) -> Result<(), MediaTypeError> {
    let valid = !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b));
    if valid {
        Ok(())
    } else {
        Err(MediaTypeError::InvalidToken(token.to_string()))
    }
}
