use crate::error::{CountError, Result};

/// Parse a comma-separated list of 1-based channel indices, e.g. `"3,4"`.
pub fn parse_channels(list: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for item in list.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(CountError::Config(format!(
                "empty item in channel list \"{list}\""
            )));
        }
        let ch: u32 = item
            .parse()
            .map_err(|_| CountError::Config(format!("invalid channel index: {item}")))?;
        if ch == 0 {
            return Err(CountError::Config(
                "channel indices are 1-based; 0 is not a channel".into(),
            ));
        }
        if out.contains(&ch) {
            return Err(CountError::Config(format!("channel {ch} listed twice")));
        }
        out.push(ch);
    }
    Ok(out)
}

/// `[3, 4]` -> `"C3_C4"`
pub fn channel_tag(channels: &[u32]) -> String {
    channels
        .iter()
        .map(|c| format!("C{c}"))
        .collect::<Vec<_>>()
        .join("_")
}

pub fn report_file_name(channels: &[u32]) -> String {
    format!("Results_{}.csv", channel_tag(channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims() {
        assert_eq!(parse_channels("3").unwrap(), vec![3]);
        assert_eq!(parse_channels(" 3, 4 ").unwrap(), vec![3, 4]);
    }

    #[test]
    fn rejects_bad_items() {
        for bad in ["", "3,", "a", "0", "3,-1", "2,2"] {
            assert!(parse_channels(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn report_name_embeds_channels() {
        assert_eq!(report_file_name(&[3, 4]), "Results_C3_C4.csv");
        assert_eq!(report_file_name(&[1]), "Results_C1.csv");
    }
}
