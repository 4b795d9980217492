use crate::color::{hex_to_rgba, HexError, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum HexInput {
    Valid { rgba: Rgba },
    Invalid { reason: String },
}

impl HexInput {
    pub fn is_valid(&self) -> bool {
        matches!(self, HexInput::Valid { .. })
    }

    pub fn rgba(&self) -> Option<Rgba> {
        match self {
            HexInput::Valid { rgba } => Some(*rgba),
            HexInput::Invalid { .. } => None,
        }
    }
}

pub fn parse_and_validate(input: &str) -> HexInput {
    match hex_to_rgba(input) {
        Ok(rgba) => HexInput::Valid { rgba },
        Err(err) => HexInput::Invalid {
            reason: describe(&err),
        },
    }
}

fn describe(err: &HexError) -> String {
    let hint = "use #RGB, #RRGGBB or #RRGGBBAA";
    match err {
        HexError::Empty => format!("Enter a hex color ({})", hint),
        _ => format!("Invalid HEX: {} ({})", err, hint),
    }
}

pub fn canonical_hex(rgba: &Rgba) -> String {
    if rgba.is_opaque() {
        format!("#{}", crate::color::rgb_to_hex(rgba.r, rgba.g, rgba.b))
    } else {
        format!(
            "#{}",
            crate::color::with_alpha_to_hex8(rgba.r, rgba.g, rgba.b, rgba.a)
        )
    }
}

pub fn normalize(input: &str) -> Option<String> {
    hex_to_rgba(input).ok().map(|rgba| canonical_hex(&rgba))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_input_carries_rgba() {
        let parsed = parse_and_validate("#7C3AED80");
        let rgba = parsed.rgba().expect("should parse");
        assert_eq!((rgba.r, rgba.g, rgba.b), (0x7C, 0x3A, 0xED));
        assert!(parsed.is_valid());
    }

    #[test]
    fn invalid_inputs_report_a_reason_instead_of_failing() {
        for input in ["#12", "#1234567", "zzzzzz", "", "   "] {
            match parse_and_validate(input) {
                HexInput::Invalid { reason } => {
                    assert!(!reason.is_empty(), "empty reason for {input:?}")
                }
                HexInput::Valid { rgba } => panic!("{input:?} parsed as {rgba:?}"),
            }
        }
    }

    #[test]
    fn reason_mentions_the_offending_length() {
        let HexInput::Invalid { reason } = parse_and_validate("#12345") else {
            panic!("five digits should be rejected");
        };
        assert!(reason.contains('5'), "reason should mention length: {reason}");
    }

    #[test]
    fn canonical_form_drops_opaque_alpha() {
        assert_eq!(normalize("#ff6b6b").as_deref(), Some("#FF6B6B"));
        assert_eq!(normalize("ff6b6bff").as_deref(), Some("#FF6B6B"));
        assert_eq!(normalize("#abc8").as_deref(), Some("#AABBCC88"));
        assert_eq!(normalize("nope"), None);
    }
}
