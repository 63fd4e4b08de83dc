//! Decoding for the `DAMAGE_PROPERTY` / `DAMAGE_CROPS` columns of the storm
//! event files, where dollar amounts are written as a magnitude with an
//! optional `K`/`M`/`B` suffix ("10.00K", "2.5M", "1B").

use polars::prelude::*;

/// Decodes a single damage string to a dollar amount.
///
/// Blank values decode to `None` (missing). A value ending in a recognized
/// thousands/millions/billions suffix has its magnitude parsed and scaled;
/// when the magnitude is unparsable the value decodes to `None`. A value
/// without a recognized suffix parses as a plain number and decodes to
/// `Some(0.0)` when unparsable.
///
/// The last two rules are asymmetric on purpose: malformed suffixed values
/// become missing while malformed plain values become zero. Downstream
/// damage totals bake in exactly this behavior, so it is pinned by a
/// regression test; change it only together with its consumers.
///
/// # Examples
///
/// ```
/// use stormdata::decode_damage_value;
///
/// assert_eq!(decode_damage_value("10K"), Some(10_000.0));
/// assert_eq!(decode_damage_value("2.5M"), Some(2_500_000.0));
/// assert_eq!(decode_damage_value("1B"), Some(1_000_000_000.0));
/// assert_eq!(decode_damage_value(""), None);
/// assert_eq!(decode_damage_value("garbageK"), None);
/// assert_eq!(decode_damage_value("garbage"), Some(0.0));
/// ```
pub fn decode_damage_value(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    // Suffixes appear in both cases in the published files.
    let multiplier = match value.as_bytes()[value.len() - 1].to_ascii_uppercase() {
        b'K' => Some(1_000.0),
        b'M' => Some(1_000_000.0),
        b'B' => Some(1_000_000_000.0),
        _ => None,
    };

    match multiplier {
        Some(factor) => value[..value.len() - 1]
            .parse::<f64>()
            .ok()
            .map(|magnitude| magnitude * factor),
        None => Some(value.parse::<f64>().unwrap_or(0.0)),
    }
}

/// Applies [`decode_damage_value`] element-wise to a string column,
/// returning a `Float64` series with the input's name. Null inputs stay
/// null.
pub fn decode_damage_series(series: &Series) -> PolarsResult<Series> {
    let values = series.str()?;
    let decoded: Float64Chunked = values
        .iter()
        .map(|raw| raw.and_then(decode_damage_value))
        .collect();
    Ok(decoded.with_name(series.name().clone()).into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_recognized_suffixes() {
        assert_eq!(decode_damage_value("10K"), Some(10_000.0));
        assert_eq!(decode_damage_value("10.00K"), Some(10_000.0));
        assert_eq!(decode_damage_value("2.5M"), Some(2_500_000.0));
        assert_eq!(decode_damage_value("1B"), Some(1_000_000_000.0));
        assert_eq!(decode_damage_value("0.00K"), Some(0.0));
    }

    #[test]
    fn decodes_plain_and_blank_values() {
        assert_eq!(decode_damage_value("1500"), Some(1500.0));
        assert_eq!(decode_damage_value("0"), Some(0.0));
        assert_eq!(decode_damage_value(""), None);
        assert_eq!(decode_damage_value("   "), None);
    }

    #[test]
    fn suffixes_match_case_insensitively() {
        assert_eq!(decode_damage_value("10k"), Some(10_000.0));
        assert_eq!(decode_damage_value("3m"), Some(3_000_000.0));
        assert_eq!(decode_damage_value("0.2b"), Some(200_000_000.0));
    }

    // The two malformed shapes deliberately decode differently; totals
    // computed downstream already depend on it.
    #[test]
    fn malformed_suffix_is_missing_but_malformed_plain_is_zero() {
        assert_eq!(decode_damage_value("garbageK"), None);
        assert_eq!(decode_damage_value("garbage"), Some(0.0));
        assert_eq!(decode_damage_value("K"), None);
    }

    #[test]
    fn series_decoding_keeps_nulls_and_name() {
        let series = Series::new(
            "DAMAGE_PROPERTY".into(),
            [Some("10K"), None, Some(""), Some("2.5M")],
        );

        let decoded = decode_damage_series(&series).unwrap();

        assert_eq!(decoded.name().as_str(), "DAMAGE_PROPERTY");
        let values: Vec<Option<f64>> = decoded.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10_000.0), None, None, Some(2_500_000.0)]);
    }

    #[test]
    fn series_decoding_rejects_non_string_columns() {
        let series = Series::new("DAMAGE_PROPERTY".into(), [1i64, 2]);
        assert!(decode_damage_series(&series).is_err());
    }
}
