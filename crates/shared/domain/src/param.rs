//! Interpretation of list-typed parameter values.
//!
//! A list value is written `[v1, v2, ...]`. Every consumer goes through [`parse_list`], so
//! whitespace around elements is trimmed the same way everywhere.

use crate::error::DescriptionError;

/// Splits a bracketed list value into trimmed elements.
///
/// `[]` and `[ ]` are the empty list. Empty elements (`[a,,b]`) are rejected.
///
/// # Errors
/// Returns [`DescriptionError::Malformed`] if the value is not bracketed or holds an empty
/// element.
pub fn parse_list(value: &str) -> Result<Vec<String>, DescriptionError> {
    let trimmed = value.trim();
    let Some(inner) = trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return Err(DescriptionError::Malformed {
            message: format!("List value '{value}' must be enclosed in brackets").into(),
            context: None,
        });
    };
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|element| {
            let element = element.trim();
            if element.is_empty() {
                Err(DescriptionError::Malformed {
                    message: format!("List value '{value}' contains an empty element").into(),
                    context: None,
                })
            } else {
                Ok(element.to_owned())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_every_element() -> Result<(), DescriptionError> {
        assert_eq!(parse_list("[ 1 , 2 ]")?, vec!["1", "2"]);
        assert_eq!(parse_list("[a,b]")?, vec!["a", "b"]);
        assert_eq!(parse_list("  [x]  ")?, vec!["x"]);
        Ok(())
    }

    #[test]
    fn empty_lists() -> Result<(), DescriptionError> {
        assert!(parse_list("[]")?.is_empty());
        assert!(parse_list("[   ]")?.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_unbracketed_and_holes() {
        assert!(parse_list("a,b").is_err());
        assert!(parse_list("[a,b").is_err());
        assert!(parse_list("[a,,b]").is_err());
    }

    proptest! {
        #[test]
        fn padded_elements_are_trimmed(
            elements in prop::collection::vec("[a-z0-9.]{1,8}", 0..6),
            pad in " {0,3}",
        ) {
            let spaced: Vec<String> = elements.iter().map(|e| format!("{pad}{e}{pad}")).collect();
            let parsed = parse_list(&format!("[{}]", spaced.join(","))).expect("bracketed list parses");
            prop_assert_eq!(parsed, elements);
        }
    }
}
