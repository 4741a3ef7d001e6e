/// Decoders for the numeric payloads embedded in NOBIL text fields.
///
/// Both decoders scan from the right: the feed puts the number directly
/// before a closing marker (")" or "kW") and arbitrary prose may come first.
/// Neither decoder reports errors. A position that does not decode means the
/// station is dropped; a capacity that does not decode is 0, which callers
/// treat as "no reading".

use crate::model::GeoPoint;

/// Number of comma-separated components in a position field.
const POSITION_COMPONENTS: usize = 3;

fn digit_value(c: char) -> Option<f64> {
    c.to_digit(10).map(f64::from)
}

/// Decodes a position field of the form `"(lat, lon, x)"`.
///
/// Digits build up each component from its least significant end; a `.`
/// divides what was read so far by the running place value. The scan must
/// pass `)`, two `,` and end on `(`, with only whitespace outside the
/// parentheses. Whitespace inside may only pad a component; it never splits
/// one. The third component is parsed and then discarded.
pub fn decode_position(text: &str) -> Option<GeoPoint> {
    // values[0] is the rightmost component
    let mut values = [0.0f64; POSITION_COMPONENTS];
    let mut boundaries = 0usize;
    let mut factor = 1.0f64;
    // the current component has digits, and a space has followed them
    let mut started = false;
    let mut sealed = false;
    let mut chars = text.chars().rev();

    while let Some(c) = chars.next() {
        match c {
            ')' if boundaries == 0 => {
                boundaries += 1;
                factor = 1.0;
            }
            ',' if (1..POSITION_COMPONENTS).contains(&boundaries) => {
                boundaries += 1;
                factor = 1.0;
                started = false;
                sealed = false;
            }
            '(' if boundaries == POSITION_COMPONENTS => {
                return chars
                    .all(char::is_whitespace)
                    .then(|| GeoPoint { lat: values[2], lon: values[1] });
            }
            c if c.is_whitespace() => sealed = started,
            _ if sealed => return None,
            '.' if boundaries > 0 => {
                values[boundaries - 1] /= factor;
                factor = 1.0;
                started = true;
            }
            c => {
                let digit = digit_value(c)?;
                if boundaries == 0 {
                    return None;
                }
                values[boundaries - 1] += digit * factor;
                factor *= 10.0;
                started = true;
            }
        }
    }
    None
}

/// Decodes a charging capacity such as `"AC 22,5 kW"` into kW.
///
/// Only the text before the first `kW` is considered, scanned backwards.
/// A `,` is the decimal separator. Spaces directly before `kW` are skipped;
/// the first space after some digits ends the number. Any other character
/// stops the scan and whatever was accumulated is returned.
pub fn decode_capacity(text: &str) -> f64 {
    let Some(end) = text.find("kW") else {
        return 0.0;
    };

    let mut capacity = 0.0f64;
    let mut factor = 1.0f64;

    for c in text[..end].chars().rev() {
        match c {
            ' ' => {
                if capacity != 0.0 {
                    break;
                }
            }
            ',' => {
                capacity /= factor;
                factor = 1.0;
            }
            c => match digit_value(c) {
                Some(digit) => {
                    capacity += digit * factor;
                    factor *= 10.0;
                }
                None => break,
            },
        }
    }
    capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    // --- Position -------------------------------------------------------------

    #[test]
    fn test_position_decodes_lat_lon_and_drops_third_field() {
        let pos = decode_position("(59.911491, 10.757933, 0)").expect("well-formed triple");
        assert_close(pos.lat, 59.911491);
        assert_close(pos.lon, 10.757933);
    }

    #[test]
    fn test_position_roundtrips_fixed_precision_format() {
        for (lat, lon) in [(59.911491, 10.757933), (70.0, 25.5), (0.000001, 179.999999)] {
            let text = format!("({:.6}, {:.6}, 0)", lat, lon);
            let pos = decode_position(&text).expect("formatter output should decode");
            assert!((pos.lat - lat).abs() < 1e-6, "{}", text);
            assert!((pos.lon - lon).abs() < 1e-6, "{}", text);
        }
    }

    #[test]
    fn test_position_without_spaces_decodes() {
        let pos = decode_position("(63.4,10.4,1)").expect("compact triple");
        assert_close(pos.lat, 63.4);
        assert_close(pos.lon, 10.4);
    }

    #[test]
    fn test_position_missing_component_fails() {
        assert!(decode_position("(59.91, 10.75)").is_none());
    }

    #[test]
    fn test_position_trailing_garbage_fails() {
        assert!(decode_position("(59.91, 10.75, 0)x").is_none());
        assert!(decode_position("(59.91, 10.75, 0)1").is_none());
    }

    #[test]
    fn test_position_leading_text_fails() {
        assert!(decode_position("pos(59.91, 10.75, 0)").is_none());
    }

    #[test]
    fn test_position_extra_component_fails() {
        assert!(decode_position("(1, 59.91, 10.75, 0)").is_none());
    }

    #[test]
    fn test_position_unexpected_character_fails() {
        assert!(decode_position("(59.91N, 10.75E, 0)").is_none());
        assert!(decode_position("").is_none());
    }

    #[test]
    fn test_position_space_inside_number_fails() {
        assert!(decode_position("(5 9.9, 1 0.7, 0)").is_none());
        assert!(decode_position("(59. 9, 10.7, 0)").is_none());
        assert!(decode_position("(59.9, 10.7, 0 1)").is_none());
    }

    #[test]
    fn test_position_padding_around_components_is_allowed() {
        let pos = decode_position("  ( 59.9 ,  10.7 , 0 )  ").expect("padded triple");
        assert_close(pos.lat, 59.9);
        assert_close(pos.lon, 10.7);
    }

    #[test]
    fn test_degenerate_position_still_decodes() {
        let pos = decode_position("(, , )").expect("grammar allows empty components");
        assert_eq!(pos, GeoPoint { lat: 0.0, lon: 0.0 });
    }

    // --- Capacity -------------------------------------------------------------

    #[test]
    fn test_capacity_with_decimal_comma() {
        assert_close(decode_capacity("AC 22,5 kW"), 22.5);
    }

    #[test]
    fn test_capacity_integer() {
        assert_close(decode_capacity("DC 50 kW"), 50.0);
        assert_close(decode_capacity("150kW"), 150.0);
    }

    #[test]
    fn test_capacity_with_prefix_text() {
        assert_close(decode_capacity("7,4 kW - 230V 1-phase max 32A"), 7.4);
    }

    #[test]
    fn test_capacity_without_digits_is_absent() {
        assert_eq!(decode_capacity("Unknown kW"), 0.0);
        assert_eq!(decode_capacity("kW"), 0.0);
        assert_eq!(decode_capacity("50"), 0.0, "no kW marker");
        assert_eq!(decode_capacity(""), 0.0);
    }

    #[test]
    fn test_capacity_stops_at_first_kw() {
        assert_close(decode_capacity("50 kW fast, 22 kW slow kW"), 50.0);
    }

    #[test]
    fn test_capacity_stops_on_unexpected_character() {
        // The period is not a decimal separator here; only "5" is read.
        assert_close(decode_capacity("22.5 kW"), 5.0);
    }
}
